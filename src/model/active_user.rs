use chrono::{DateTime, Utc};
use redb::TableDefinition;
use serde::{Deserialize, Serialize};

use super::require;
use crate::database::{Document, SoftDeletable, Table};

pub const TABLE_ACTIVE_USERS: Table = TableDefinition::new("active_users_v1");
pub const TABLE_ACTIVE_USERS_CREATED: Table = TableDefinition::new("active_users_created_v1");

/// An open dashboard session
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ActiveUser {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    /// Seconds spent in the session so far
    #[serde(default)]
    pub session_duration: f64,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(default)]
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for ActiveUser {
    const NAME: &'static str = "Session";
    const TABLE: Table = TABLE_ACTIVE_USERS;
    const CREATED_INDEX: Table = TABLE_ACTIVE_USERS_CREATED;

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

    fn validate(&self) -> Result<(), String> {
        require(&self.user_id, "user_id")?;
        require(&self.location, "Location")?;
        if !self.session_duration.is_finite() || self.session_duration < 0.0 {
            return Err("session_duration must be a non-negative number".to_string());
        }
        Ok(())
    }
}

impl SoftDeletable for ActiveUser {
    fn mark_deleted(&mut self) {
        self.is_deleted = true;
    }
}

/// Request payload for opening a session
#[derive(Deserialize, Debug)]
pub struct CreateSession {
    pub user_id: String,
    pub session_duration: Option<f64>,
    #[serde(rename = "Location")]
    pub location: String,
}

impl CreateSession {
    pub fn into_session(self, id: String, now: DateTime<Utc>) -> ActiveUser {
        ActiveUser {
            id,
            user_id: self.user_id,
            session_duration: self.session_duration.unwrap_or_default(),
            location: self.location,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Request payload for `PATCH /active-users/{id}`; absent fields are left alone
#[derive(Deserialize, Debug, Default)]
pub struct UpdateSession {
    pub session_duration: Option<f64>,
    #[serde(rename = "Location")]
    pub location: Option<String>,
}

impl UpdateSession {
    pub fn apply(self, session: &mut ActiveUser) {
        if let Some(duration) = self.session_duration {
            session.session_duration = duration;
        }
        if let Some(location) = self.location {
            session.location = location;
        }
    }
}

/// Response of `GET /active-users/statistics`
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ActiveUserStats {
    pub total_active: usize,
    pub average_session_duration: f64,
}
