use chrono::{DateTime, Utc};
use redb::TableDefinition;
use serde::{Deserialize, Serialize};

use super::require;
use crate::database::{Document, SoftDeletable, Table};

pub const TABLE_NOTIFICATIONS: Table = TableDefinition::new("notifications_v1");
pub const TABLE_NOTIFICATIONS_CREATED: Table = TableDefinition::new("notifications_created_v1");

fn default_kind() -> String {
    "info".to_string()
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Notification {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub message: String,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Notification {
    const NAME: &'static str = "Notification";
    const TABLE: Table = TABLE_NOTIFICATIONS;
    const CREATED_INDEX: Table = TABLE_NOTIFICATIONS_CREATED;

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
        require(&self.message, "message")
    }
}

impl SoftDeletable for Notification {
    fn mark_deleted(&mut self) {
        self.is_deleted = true;
    }
}

/// Request payload for creating a notification, alone or inside a bulk request
#[derive(Deserialize, Debug)]
pub struct CreateNotification {
    pub user_id: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl CreateNotification {
    /// New notifications always start unread.
    pub fn into_notification(self, id: String, now: DateTime<Utc>) -> Notification {
        Notification {
            id,
            user_id: self.user_id,
            message: self.message,
            kind: self.kind.unwrap_or_else(default_kind),
            is_read: false,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Request payload for `POST /notifications/bulk`
#[derive(Deserialize, Debug)]
pub struct BulkNotifications {
    pub notifications: Vec<CreateNotification>,
}

/// Query parameters for listing notifications
#[derive(Deserialize, Debug, Default)]
pub struct NotificationFilter {
    pub user_id: Option<String>,
    pub is_read: Option<bool>,
}

impl NotificationFilter {
    pub fn matches(&self, notification: &Notification) -> bool {
        self.user_id
            .as_deref()
            .is_none_or(|id| id == notification.user_id)
            && self.is_read.is_none_or(|read| read == notification.is_read)
    }
}
