//! Data models for the dashboard API
//!
//! Each submodule holds one collection: the stored document, its request
//! payloads, its validation rules and its table definitions. This module
//! holds the pieces shared by every list endpoint.

use serde::{Deserialize, Serialize};

mod active_user;
mod enquiry;
mod notification;
mod order;
mod product;
mod transaction;
mod user;
mod user_statistics;
mod visitor;

pub use active_user::*;
pub use enquiry::*;
pub use notification::*;
pub use order::*;
pub use product::*;
pub use transaction::*;
pub use user::*;
pub use user_statistics::*;
pub use visitor::*;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

/// Query parameters shared by every list endpoint
///
/// # Example
/// Query string: `?page=2&limit=20`
#[derive(Deserialize, Debug, Default)]
pub struct ListParams {
    /// Page number for pagination (starts from 1)
    pub page: Option<usize>,

    /// Number of items per page, defaults to 10, maximum is 100
    pub limit: Option<usize>,
}

/// Normalised pagination window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub limit: usize,
}

impl PageRequest {
    /// Number of matching documents before this page. Saturates on huge
    /// page numbers.
    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

impl From<&ListParams> for PageRequest {
    fn from(params: &ListParams) -> Self {
        Self {
            page: params.page.unwrap_or(1).max(1),
            limit: params
                .limit
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }
}

/// One page of a collection
///
/// ```json
/// { "items": [...], "totalPages": 3, "currentPage": 1 }
/// ```
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total_pages: usize,
    pub current_page: usize,
}

impl<T> Paged<T> {
    pub fn new(items: Vec<T>, total: usize, request: PageRequest) -> Self {
        Self {
            items,
            total_pages: total.div_ceil(request.limit),
            current_page: request.page,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paged<U> {
        Paged {
            items: self.items.into_iter().map(f).collect(),
            total_pages: self.total_pages,
            current_page: self.current_page,
        }
    }
}

/// A document returned with its referenced user resolved
#[derive(Serialize, Debug)]
pub struct WithUser<T> {
    #[serde(flatten)]
    pub doc: T,

    /// `null` when the referenced user no longer exists
    pub user: Option<UserRef>,
}

/// Plain confirmation body, e.g. `{"message": "Visitor deleted successfully"}`
#[derive(Serialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Rejects blank strings.
pub(crate) fn require(value: &str, field: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{field} is required"))
    } else {
        Ok(())
    }
}
