use chrono::{DateTime, Utc};
use redb::TableDefinition;
use serde::{Deserialize, Serialize};

use super::require;
use crate::database::{Document, SoftDeletable, Table};

pub const TABLE_ENQUIRIES: Table = TableDefinition::new("enquiries_v1");
pub const TABLE_ENQUIRIES_CREATED: Table = TableDefinition::new("enquiries_created_v1");

/// Workflow state of an enquiry
///
/// `new` and `open` both mean untriaged; new enquiries start as `open`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EnquiryStatus {
    New,
    #[default]
    Open,
    #[serde(rename = "in progress", alias = "in_progress")]
    InProgress,
    Resolved,
    Closed,
}

/// A customer enquiry, linked to a user or carrying free-text contact details
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Enquiry {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(default)]
    pub user_id: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub subject: Option<String>,

    pub message: String,

    #[serde(default)]
    pub status: EnquiryStatus,

    #[serde(default)]
    pub is_deleted: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Enquiry {
    const NAME: &'static str = "Enquiry";
    const TABLE: Table = TABLE_ENQUIRIES;
    const CREATED_INDEX: Table = TABLE_ENQUIRIES_CREATED;

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
        require(&self.message, "message")?;
        let has_user = self.user_id.as_deref().is_some_and(|id| !id.trim().is_empty());
        let has_email = self.email.as_deref().is_some_and(|email| !email.trim().is_empty());
        if !has_user && !has_email {
            return Err("either user_id or email is required".to_string());
        }
        Ok(())
    }
}

impl SoftDeletable for Enquiry {
    fn mark_deleted(&mut self) {
        self.is_deleted = true;
    }
}

/// Request payload for creating an enquiry
#[derive(Deserialize, Debug)]
pub struct CreateEnquiry {
    pub user_id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: String,
    pub status: Option<EnquiryStatus>,
}

impl CreateEnquiry {
    pub fn into_enquiry(self, id: String, now: DateTime<Utc>) -> Enquiry {
        Enquiry {
            id,
            user_id: self.user_id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            subject: self.subject,
            message: self.message,
            status: self.status.unwrap_or_default(),
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Query parameters for listing enquiries
#[derive(Deserialize, Debug, Default)]
pub struct EnquiryFilter {
    pub status: Option<EnquiryStatus>,
    pub user_id: Option<String>,
}

impl EnquiryFilter {
    pub fn matches(&self, enquiry: &Enquiry) -> bool {
        self.status.is_none_or(|status| status == enquiry.status)
            && self
                .user_id
                .as_deref()
                .is_none_or(|id| enquiry.user_id.as_deref() == Some(id))
    }
}
