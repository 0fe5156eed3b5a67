use chrono::{DateTime, Utc};
use redb::TableDefinition;
use serde::{Deserialize, Serialize};

use super::require;
use crate::database::{Document, HardDeletable, Table};

pub const TABLE_PRODUCTS: Table = TableDefinition::new("products_v1");
pub const TABLE_PRODUCTS_CREATED: Table = TableDefinition::new("products_created_v1");

/// A catalogue product
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    pub price: f64,

    #[serde(default)]
    pub category: Option<String>,

    /// Average rating between 0 and 5
    #[serde(default)]
    pub rating: Option<f64>,

    /// Units in stock
    #[serde(default)]
    pub supply: u32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Product {
    const NAME: &'static str = "Product";
    const TABLE: Table = TABLE_PRODUCTS;
    const CREATED_INDEX: Table = TABLE_PRODUCTS_CREATED;

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
        require(&self.name, "name")?;
        if !self.price.is_finite() || self.price < 0.0 {
            return Err("price must be a non-negative number".to_string());
        }
        if let Some(rating) = self.rating {
            if !(0.0..=5.0).contains(&rating) {
                return Err("rating must be between 0 and 5".to_string());
            }
        }
        Ok(())
    }
}

impl HardDeletable for Product {}

/// Request payload for creating a product
///
/// # Example
/// ```json
/// { "name": "Test", "price": 99.99, "category": "Lamps", "supply": 100 }
/// ```
#[derive(Deserialize, Debug)]
pub struct CreateProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub category: Option<String>,
    pub rating: Option<f64>,
    #[serde(alias = "stock_quantity")]
    pub supply: Option<u32>,
}

impl CreateProduct {
    pub fn into_product(self, id: String, now: DateTime<Utc>) -> Product {
        Product {
            id,
            name: self.name,
            description: self.description.unwrap_or_default(),
            price: self.price,
            category: self.category,
            rating: self.rating,
            supply: self.supply.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Query parameters for listing products
#[derive(Deserialize, Debug, Default)]
pub struct ProductFilter {
    pub category: Option<String>,
    /// Case-insensitive match on the product name
    pub search: Option<String>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category) = &self.category {
            if product.category.as_deref() != Some(category.as_str()) {
                return false;
            }
        }
        if let Some(search) = &self.search {
            if !product
                .name
                .to_lowercase()
                .contains(&search.to_lowercase())
            {
                return false;
            }
        }
        true
    }
}
