use chrono::{DateTime, Utc};
use redb::TableDefinition;
use serde::{Deserialize, Serialize};

use super::require;
use crate::database::{Document, SoftDeletable, Table};

pub const TABLE_VISITORS: Table = TableDefinition::new("visitors_v1");
pub const TABLE_VISITORS_CREATED: Table = TableDefinition::new("visitors_created_v1");

/// Unique index on the IP address of live visitors
pub const TABLE_VISITORS_IP: Table = TableDefinition::new("visitors_ip_v1");

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct VisitorLocation {
    pub country: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// A site visitor, one document per IP address
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Visitor {
    #[serde(rename = "_id")]
    pub id: String,
    pub ip_address: String,
    #[serde(default)]
    pub location: Option<VisitorLocation>,
    pub visit_count: u64,
    pub last_visited_at: DateTime<Utc>,
    #[serde(default)]
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Visitor {
    pub fn country(&self) -> Option<&str> {
        self.location.as_ref().and_then(|l| l.country.as_deref())
    }

    /// Counts one more visit, refreshing the location when a new one is known.
    pub fn record_visit(&mut self, at: DateTime<Utc>, location: Option<VisitorLocation>) {
        self.visit_count += 1;
        self.last_visited_at = at;
        if location.is_some() {
            self.location = location;
        }
    }
}

impl Document for Visitor {
    const NAME: &'static str = "Visitor";
    const TABLE: Table = TABLE_VISITORS;
    const CREATED_INDEX: Table = TABLE_VISITORS_CREATED;
    const KEY_INDEX: Option<Table> = Some(TABLE_VISITORS_IP);

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    fn natural_key(&self) -> Option<&str> {
        Some(&self.ip_address)
    }

    fn validate(&self) -> Result<(), String> {
        require(&self.ip_address, "ip_address")
    }
}

impl SoftDeletable for Visitor {
    fn mark_deleted(&mut self) {
        self.is_deleted = true;
    }
}

/// Request payload for `POST /visitors`
#[derive(Deserialize, Debug)]
pub struct RecordVisit {
    pub ip_address: String,
    pub location: Option<VisitorLocation>,
}

impl RecordVisit {
    /// First visit from this address.
    pub fn into_visitor(self, id: String, now: DateTime<Utc>) -> Visitor {
        Visitor {
            id,
            ip_address: self.ip_address,
            location: self.location,
            visit_count: 1,
            last_visited_at: now,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Visitors sharing a country
#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CountryVisits {
    #[serde(rename = "_id")]
    pub country: Option<String>,
    pub count: usize,
    pub total_visits: u64,
}

/// Response of `GET /visitors/statistics`
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct VisitorStats {
    pub total_unique_visitors: usize,
    pub total_visits: u64,
    pub visitors_by_country: Vec<CountryVisits>,
}
