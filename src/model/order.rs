use chrono::{DateTime, Utc};
use redb::TableDefinition;
use serde::{Deserialize, Serialize};

use super::require;
use crate::database::{Document, HardDeletable, Table};

pub const TABLE_ORDERS: Table = TableDefinition::new("orders_v1");
pub const TABLE_ORDERS_CREATED: Table = TableDefinition::new("orders_created_v1");

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

/// One product line of an order
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OrderItem {
    pub product_id: String,
    pub quantity: u32,
    /// Unit price at the time of purchase
    pub price: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub items: Vec<OrderItem>,
    pub total_amount: f64,
    #[serde(default)]
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Order {
    const NAME: &'static str = "Order";
    const TABLE: Table = TABLE_ORDERS;
    const CREATED_INDEX: Table = TABLE_ORDERS_CREATED;

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }

    fn validate(&self) -> Result<(), String> {
        require(&self.user_id, "user_id")?;
        if self.items.is_empty() {
            return Err("an order needs at least one item".to_string());
        }
        for item in &self.items {
            require(&item.product_id, "product_id")?;
            if item.quantity == 0 {
                return Err("quantity must be at least 1".to_string());
            }
            if !item.price.is_finite() || item.price < 0.0 {
                return Err("price must be a non-negative number".to_string());
            }
        }
        if !self.total_amount.is_finite() || self.total_amount < 0.0 {
            return Err("total_amount must be a non-negative number".to_string());
        }
        Ok(())
    }
}

impl HardDeletable for Order {}

/// Sum of `quantity * price` over the line items.
pub fn items_total(items: &[OrderItem]) -> f64 {
    items
        .iter()
        .map(|item| f64::from(item.quantity) * item.price)
        .sum()
}

/// Request payload for placing an order
///
/// `total_amount` is computed from the line items when omitted.
#[derive(Deserialize, Debug)]
pub struct CreateOrder {
    pub user_id: String,
    pub items: Vec<OrderItem>,
    pub total_amount: Option<f64>,
    pub status: Option<OrderStatus>,
}

impl CreateOrder {
    pub fn into_order(self, id: String, now: DateTime<Utc>) -> Order {
        let total_amount = self
            .total_amount
            .unwrap_or_else(|| items_total(&self.items));

        Order {
            id,
            user_id: self.user_id,
            items: self.items,
            total_amount,
            status: self.status.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Query parameters for listing orders
#[derive(Deserialize, Debug, Default)]
pub struct OrderFilter {
    pub user_id: Option<String>,
    pub status: Option<OrderStatus>,
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        self.user_id.as_ref().is_none_or(|id| *id == order.user_id)
            && self.status.is_none_or(|status| status == order.status)
    }
}
