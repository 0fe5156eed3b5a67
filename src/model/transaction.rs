use chrono::{DateTime, Utc};
use redb::TableDefinition;
use serde::{Deserialize, Serialize};

use super::require;
use crate::database::{Document, HardDeletable, Table};

pub const TABLE_TRANSACTIONS: Table = TableDefinition::new("transactions_v1");
pub const TABLE_TRANSACTIONS_CREATED: Table = TableDefinition::new("transactions_created_v1");

/// A payment made by a user for one or more products
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Transaction {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(rename = "userId")]
    pub user_id: String,

    /// Amount charged, kept as the decimal text it was entered with ("129.99")
    pub cost: String,

    /// Ids of the purchased products
    #[serde(default)]
    pub products: Vec<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Transaction {
    const NAME: &'static str = "Transaction";
    const TABLE: Table = TABLE_TRANSACTIONS;
    const CREATED_INDEX: Table = TABLE_TRANSACTIONS_CREATED;

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
        require(&self.user_id, "userId")?;
        require(&self.cost, "cost")?;
        match self.cost.trim().parse::<f64>() {
            Ok(cost) if cost.is_finite() && cost >= 0.0 => {}
            _ => return Err("cost must be a non-negative number".to_string()),
        }
        if self.products.iter().any(|product| product.trim().is_empty()) {
            return Err("product ids must not be blank".to_string());
        }
        Ok(())
    }
}

impl HardDeletable for Transaction {}

/// Request payload for recording a transaction
///
/// # Example
/// ```json
/// { "userId": "63701cc1f03239c72c00017f", "cost": "129.99", "products": ["..."] }
/// ```
#[derive(Deserialize, Debug)]
pub struct CreateTransaction {
    #[serde(rename = "userId", alias = "user_id")]
    pub user_id: String,
    pub cost: String,
    #[serde(default)]
    pub products: Vec<String>,
}

impl CreateTransaction {
    pub fn into_transaction(self, id: String, now: DateTime<Utc>) -> Transaction {
        Transaction {
            id,
            user_id: self.user_id,
            cost: self.cost.trim().to_string(),
            products: self.products,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Query parameters for listing transactions
#[derive(Deserialize, Debug, Default)]
pub struct TransactionFilter {
    /// Case-insensitive match on the cost or the user id
    pub search: Option<String>,
}

impl TransactionFilter {
    pub fn matches(&self, transaction: &Transaction) -> bool {
        match &self.search {
            Some(search) => {
                let search = search.to_lowercase();
                transaction.cost.to_lowercase().contains(&search)
                    || transaction.user_id.to_lowercase().contains(&search)
            }
            None => true,
        }
    }
}
