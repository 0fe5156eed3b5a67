use chrono::{DateTime, Utc};
use redb::TableDefinition;
use serde::{Deserialize, Serialize};

use super::require;
use crate::database::{Document, SoftDeletable, Table};

pub const TABLE_USER_STATISTICS: Table = TableDefinition::new("user_statistics_v1");
pub const TABLE_USER_STATISTICS_CREATED: Table =
    TableDefinition::new("user_statistics_created_v1");

/// Unique index on the user of live statistics documents
pub const TABLE_USER_STATISTICS_USER: Table = TableDefinition::new("user_statistics_user_v1");

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PageVisit {
    pub page_name: String,
    pub visit_count: u64,
}

/// Browsing statistics of one user
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserStatistics {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub pages_visited: Vec<PageVisit>,
    /// Seconds
    #[serde(default)]
    pub total_time_spent: f64,
    #[serde(default)]
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserStatistics {
    pub fn record_page_view(&mut self, page_name: &str, time_spent: Option<f64>) {
        match self
            .pages_visited
            .iter_mut()
            .find(|page| page.page_name == page_name)
        {
            Some(page) => page.visit_count += 1,
            None => self.pages_visited.push(PageVisit {
                page_name: page_name.to_string(),
                visit_count: 1,
            }),
        }
        if let Some(seconds) = time_spent {
            self.total_time_spent += seconds;
        }
    }
}

impl Document for UserStatistics {
    const NAME: &'static str = "Statistics";
    const TABLE: Table = TABLE_USER_STATISTICS;
    const CREATED_INDEX: Table = TABLE_USER_STATISTICS_CREATED;
    const KEY_INDEX: Option<Table> = Some(TABLE_USER_STATISTICS_USER);

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
        Some(&self.user_id)
    }

    fn validate(&self) -> Result<(), String> {
        require(&self.user_id, "user_id")?;
        if self.pages_visited.iter().any(|page| page.page_name.trim().is_empty()) {
            return Err("page_name is required".to_string());
        }
        if !self.total_time_spent.is_finite() || self.total_time_spent < 0.0 {
            return Err("total_time_spent must be a non-negative number".to_string());
        }
        Ok(())
    }
}

impl SoftDeletable for UserStatistics {
    fn mark_deleted(&mut self) {
        self.is_deleted = true;
    }
}

/// Request payload for `POST /user-statistics`: one page view
#[derive(Deserialize, Debug)]
pub struct RecordPageView {
    pub user_id: String,
    pub page_name: String,
    pub time_spent: Option<f64>,
}

impl RecordPageView {
    pub fn into_statistics(self, id: String, now: DateTime<Utc>) -> UserStatistics {
        let mut statistics = UserStatistics {
            id,
            user_id: self.user_id,
            pages_visited: Vec::new(),
            total_time_spent: 0.0,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        statistics.record_page_view(&self.page_name, self.time_spent);
        statistics
    }
}

/// Visits summed across users for one page
#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageTotal {
    #[serde(rename = "_id")]
    pub page_name: String,
    pub total_visits: u64,
}

/// Response of `GET /user-statistics/overall`
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct OverallStatistics {
    pub total_users: usize,
    pub most_visited_pages: Vec<PageTotal>,
    pub average_time_spent: f64,
}
