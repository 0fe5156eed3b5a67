//! Embedded document store
//!
//! Every collection lives in the embedded redb database as three tables:
//!
//! - the document table, `_id → JSON document`
//! - a creation index, `"{created_micros:020}:{_id}" → _id`, walked in reverse
//!   to list newest documents first
//! - for collections with a natural key, a key index `key → _id` holding
//!   live documents only
//!
//! Handlers never touch redb directly; they go through [`Store`], which is
//! handed to them inside [`AppState`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::Config;
use crate::model::{
    ActiveUser, Enquiry, Notification, Order, PageRequest, Paged, Product, Transaction, User,
    UserStatistics, Visitor,
};

/// Table layout shared by every collection: string key, string value.
pub type Table = TableDefinition<'static, &'static str, &'static str>;

/// Errors raised by the storage layer
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Invalid(String),

    #[error("{0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(#[from] redb::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<redb::DatabaseError> for StoreError {
    fn from(err: redb::DatabaseError) -> Self {
        Self::Database(err.into())
    }
}

impl From<redb::TransactionError> for StoreError {
    fn from(err: redb::TransactionError) -> Self {
        Self::Database(err.into())
    }
}

impl From<redb::TableError> for StoreError {
    fn from(err: redb::TableError) -> Self {
        Self::Database(err.into())
    }
}

impl From<redb::StorageError> for StoreError {
    fn from(err: redb::StorageError) -> Self {
        Self::Database(err.into())
    }
}

impl From<redb::CommitError> for StoreError {
    fn from(err: redb::CommitError) -> Self {
        Self::Database(err.into())
    }
}

/// A JSON document persisted in its own collection
///
/// Implementors describe where they live and how to identify them. The
/// delete capability is a separate trait: a collection is either
/// [`SoftDeletable`] or [`HardDeletable`], never both.
pub trait Document: Serialize + DeserializeOwned + Clone {
    /// Human readable entity name, used in error messages ("Product not found").
    const NAME: &'static str;

    /// `_id → document`
    const TABLE: Table;

    /// `"{created_micros}:{_id}" → _id`
    const CREATED_INDEX: Table;

    /// `natural key → _id` for live documents, when the collection has one.
    const KEY_INDEX: Option<Table> = None;

    fn id(&self) -> &str;

    fn created_at(&self) -> DateTime<Utc>;

    /// Records the time of a modification.
    fn touch(&mut self, at: DateTime<Utc>);

    fn is_deleted(&self) -> bool {
        false
    }

    fn natural_key(&self) -> Option<&str> {
        None
    }

    /// Schema-level checks run before every write.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Collections whose delete only flags the document as deleted.
pub trait SoftDeletable: Document {
    fn mark_deleted(&mut self);
}

/// Collections whose delete physically removes the document.
pub trait HardDeletable: Document {}

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub config: Arc<Config>,
}

/// Initializes the embedded database and creates every collection's tables
pub fn init_db(db_path: &str) -> Result<Database, redb::Error> {
    let db = Database::create(db_path)?;

    let write_txn = db.begin_write()?;
    {
        register::<Product>(&write_txn)?;
        register::<Order>(&write_txn)?;
        register::<Transaction>(&write_txn)?;
        register::<Enquiry>(&write_txn)?;
        register::<Notification>(&write_txn)?;
        register::<ActiveUser>(&write_txn)?;
        register::<Visitor>(&write_txn)?;
        register::<UserStatistics>(&write_txn)?;
        register::<User>(&write_txn)?;
    }
    write_txn.commit()?;

    Ok(db)
}

fn register<D: Document>(txn: &WriteTransaction) -> Result<(), redb::TableError> {
    txn.open_table(D::TABLE)?;
    txn.open_table(D::CREATED_INDEX)?;
    if let Some(keys) = D::KEY_INDEX {
        txn.open_table(keys)?;
    }
    Ok(())
}

/// Generates a 24 character hexadecimal document id.
pub fn new_id() -> String {
    format!("{:024x}", rand::rng().random::<u128>() >> 32)
}

fn created_key<D: Document>(doc: &D) -> String {
    format!("{:020}:{}", doc.created_at().timestamp_micros(), doc.id())
}

/// Handle to the document store
#[derive(Clone)]
pub struct Store {
    db: Arc<Database>,
    clock: Arc<AtomicI64>,
}

impl Store {
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(db),
            clock: Arc::new(AtomicI64::new(0)),
        }
    }

    /// Current time, strictly increasing across calls on this store.
    pub fn now(&self) -> DateTime<Utc> {
        let wall = Utc::now().timestamp_micros();
        let mut last = self.clock.load(Ordering::Relaxed);
        loop {
            let next = wall.max(last + 1);
            match self
                .clock
                .compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return DateTime::from_timestamp_micros(next).unwrap_or_else(Utc::now),
                Err(current) => last = current,
            }
        }
    }

    /// Persists a new document.
    ///
    /// # Arguments
    ///
    /// * `doc` - A fully built document; its `_id` must be fresh
    ///
    /// # Returns
    ///
    /// The stored document, `StoreError::Invalid` when it fails validation or
    /// `StoreError::Duplicate` when its natural key is already taken.
    pub fn insert<D: Document>(&self, doc: D) -> Result<D, StoreError> {
        doc.validate().map_err(StoreError::Invalid)?;

        let write_txn = self.db.begin_write()?;
        write_doc(&write_txn, None, &doc)?;
        write_txn.commit()?;

        debug!(collection = D::NAME, id = doc.id(), "inserted");
        Ok(doc)
    }

    /// Persists a batch of new documents in a single transaction: either all
    /// of them are stored or none is.
    pub fn insert_all<D: Document>(&self, docs: Vec<D>) -> Result<Vec<D>, StoreError> {
        for (position, doc) in docs.iter().enumerate() {
            doc.validate()
                .map_err(|msg| StoreError::Invalid(format!("item {position}: {msg}")))?;
        }

        let write_txn = self.db.begin_write()?;
        for doc in &docs {
            write_doc(&write_txn, None, doc)?;
        }
        write_txn.commit()?;

        debug!(collection = D::NAME, count = docs.len(), "inserted batch");
        Ok(docs)
    }

    /// Loads a live document by id.
    ///
    /// Soft-deleted documents are reported as `StoreError::NotFound`, the
    /// same as ids that were never stored.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let product = store.get::<Product>("63701cc1f03239c72c00017f")?;
    /// ```
    pub fn get<D: Document>(&self, id: &str) -> Result<D, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(D::TABLE)?;

        let doc = match table.get(id)? {
            Some(raw) => serde_json::from_str::<D>(raw.value())?,
            None => return Err(StoreError::NotFound(D::NAME)),
        };
        if doc.is_deleted() {
            return Err(StoreError::NotFound(D::NAME));
        }
        Ok(doc)
    }

    /// Loads the live documents among `ids`, keyed by id. Missing ids are skipped.
    pub fn get_many<D: Document>(&self, ids: &[&str]) -> Result<HashMap<String, D>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(D::TABLE)?;

        let mut found = HashMap::new();
        for id in ids {
            if found.contains_key(*id) {
                continue;
            }
            if let Some(raw) = table.get(*id)? {
                let doc = serde_json::from_str::<D>(raw.value())?;
                if !doc.is_deleted() {
                    found.insert(id.to_string(), doc);
                }
            }
        }
        Ok(found)
    }

    /// Loads the live document owning a natural key.
    pub fn find_by_key<D: Document>(&self, key: &str) -> Result<D, StoreError> {
        let Some(keys) = D::KEY_INDEX else {
            return Err(StoreError::NotFound(D::NAME));
        };

        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(keys)?;
        let table = read_txn.open_table(D::TABLE)?;

        let id = match index.get(key)? {
            Some(id) => id.value().to_string(),
            None => return Err(StoreError::NotFound(D::NAME)),
        };
        match table.get(id.as_str())? {
            Some(raw) => Ok(serde_json::from_str::<D>(raw.value())?),
            None => Err(StoreError::NotFound(D::NAME)),
        }
    }

    /// Lists live documents matching `filter`, newest first.
    ///
    /// The page and the total are computed in the same read transaction, so
    /// `totalPages` always agrees with the items returned.
    ///
    /// # Arguments
    ///
    /// * `request` - Page number and size, already clamped
    /// * `filter` - Predicate applied to every live document
    ///
    /// # Returns
    ///
    /// A [`Paged`] holding at most `request.limit` documents. Pages past the
    /// end come back empty with the real `totalPages`.
    pub fn list<D, F>(&self, request: PageRequest, filter: F) -> Result<Paged<D>, StoreError>
    where
        D: Document,
        F: Fn(&D) -> bool,
    {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(D::CREATED_INDEX)?;
        let table = read_txn.open_table(D::TABLE)?;

        let skip = request.offset();
        let mut total = 0;
        let mut items = Vec::new();

        for entry in index.iter()?.rev() {
            let (_, id) = entry?;
            let Some(raw) = table.get(id.value())? else {
                continue;
            };
            let doc = serde_json::from_str::<D>(raw.value())?;
            if doc.is_deleted() || !filter(&doc) {
                continue;
            }
            if total >= skip && items.len() < request.limit {
                items.push(doc);
            }
            total += 1;
        }

        Ok(Paged::new(items, total, request))
    }

    /// Every live document matching `filter`, newest first.
    pub fn all<D, F>(&self, filter: F) -> Result<Vec<D>, StoreError>
    where
        D: Document,
        F: Fn(&D) -> bool,
    {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(D::CREATED_INDEX)?;
        let table = read_txn.open_table(D::TABLE)?;

        let mut docs = Vec::new();
        for entry in index.iter()?.rev() {
            let (_, id) = entry?;
            let Some(raw) = table.get(id.value())? else {
                continue;
            };
            let doc = serde_json::from_str::<D>(raw.value())?;
            if !doc.is_deleted() && filter(&doc) {
                docs.push(doc);
            }
        }
        Ok(docs)
    }

    /// Loads a live document, lets `apply` modify it and writes it back in
    /// the same transaction.
    pub fn update<D, F>(&self, id: &str, apply: F) -> Result<D, StoreError>
    where
        D: Document,
        F: FnOnce(&mut D) -> Result<(), StoreError>,
    {
        let now = self.now();
        let write_txn = self.db.begin_write()?;

        let previous = load_live::<D>(&write_txn, id)?;
        let mut doc = previous.clone();
        apply(&mut doc)?;
        doc.touch(now);
        doc.validate().map_err(StoreError::Invalid)?;

        write_doc(&write_txn, Some(&previous), &doc)?;
        write_txn.commit()?;

        debug!(collection = D::NAME, id, "updated");
        Ok(doc)
    }

    /// Overwrites the given top-level fields of a live document (`$set`).
    ///
    /// `_id`, `created_at` and `is_deleted` cannot be set this way. The merged
    /// document must still deserialize and validate.
    pub fn set_fields<D: Document>(
        &self,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<D, StoreError> {
        self.update::<D, _>(id, |doc| {
            *doc = merge_fields(doc, fields)?;
            Ok(())
        })
    }

    /// Updates the live document owning `key`, or creates one when there is
    /// none. Look-up and write share one write transaction, and redb allows a
    /// single writer at a time, so concurrent upserts on the same key never
    /// produce two documents.
    pub fn upsert<D, C, U>(&self, key: &str, create: C, update: U) -> Result<D, StoreError>
    where
        D: Document,
        C: FnOnce() -> D,
        U: FnOnce(&mut D),
    {
        let Some(keys) = D::KEY_INDEX else {
            return Err(StoreError::Invalid(format!("{} has no natural key", D::NAME)));
        };

        let now = self.now();
        let write_txn = self.db.begin_write()?;

        let existing = {
            let index = write_txn.open_table(keys)?;
            let id = index.get(key)?.map(|id| id.value().to_string());
            match id {
                Some(id) => Some(load_live::<D>(&write_txn, &id)?),
                None => None,
            }
        };

        let doc = match existing {
            Some(previous) => {
                let mut doc = previous.clone();
                update(&mut doc);
                doc.touch(now);
                doc.validate().map_err(StoreError::Invalid)?;
                write_doc(&write_txn, Some(&previous), &doc)?;
                doc
            }
            None => {
                let doc = create();
                doc.validate().map_err(StoreError::Invalid)?;
                write_doc(&write_txn, None, &doc)?;
                doc
            }
        };
        write_txn.commit()?;

        debug!(collection = D::NAME, id = doc.id(), "upserted");
        Ok(doc)
    }

    /// Flags a live document as deleted. It stays in storage but is no longer
    /// visible to reads.
    pub fn soft_delete<D: SoftDeletable>(&self, id: &str) -> Result<(), StoreError> {
        self.update::<D, _>(id, |doc| {
            doc.mark_deleted();
            Ok(())
        })?;
        Ok(())
    }

    /// Physically removes a document and its index entries.
    ///
    /// # Returns
    ///
    /// The removed document, or `StoreError::NotFound` if it was already gone.
    pub fn hard_delete<D: HardDeletable>(&self, id: &str) -> Result<D, StoreError> {
        let write_txn = self.db.begin_write()?;
        let doc = load_live::<D>(&write_txn, id)?;
        {
            write_txn.open_table(D::TABLE)?.remove(id)?;
            write_txn
                .open_table(D::CREATED_INDEX)?
                .remove(created_key(&doc).as_str())?;
            if let (Some(keys), Some(key)) = (D::KEY_INDEX, doc.natural_key()) {
                write_txn.open_table(keys)?.remove(key)?;
            }
        }
        write_txn.commit()?;

        debug!(collection = D::NAME, id, "removed");
        Ok(doc)
    }
}

fn load_live<D: Document>(txn: &WriteTransaction, id: &str) -> Result<D, StoreError> {
    let table = txn.open_table(D::TABLE)?;
    let doc = match table.get(id)? {
        Some(raw) => serde_json::from_str::<D>(raw.value())?,
        None => return Err(StoreError::NotFound(D::NAME)),
    };
    if doc.is_deleted() {
        return Err(StoreError::NotFound(D::NAME));
    }
    Ok(doc)
}

/// Writes a document and keeps its indexes in step. `previous` is the stored
/// version when this is an update.
fn write_doc<D: Document>(
    txn: &WriteTransaction,
    previous: Option<&D>,
    doc: &D,
) -> Result<(), StoreError> {
    if let Some(keys) = D::KEY_INDEX {
        let mut index = txn.open_table(keys)?;

        if let Some(old_key) = previous.and_then(|p| p.natural_key()) {
            index.remove(old_key)?;
        }

        if !doc.is_deleted() {
            if let Some(key) = doc.natural_key() {
                let owner = index.get(key)?.map(|id| id.value().to_string());
                if owner.is_some_and(|owner| owner != doc.id()) {
                    return Err(StoreError::Duplicate(format!(
                        "{} with key '{}' already exists",
                        D::NAME,
                        key
                    )));
                }
                index.insert(key, doc.id())?;
            }
        }
    }

    if previous.is_none() {
        txn.open_table(D::CREATED_INDEX)?
            .insert(created_key(doc).as_str(), doc.id())?;
    }

    let raw = serde_json::to_string(doc)?;
    txn.open_table(D::TABLE)?.insert(doc.id(), raw.as_str())?;
    Ok(())
}

const PROTECTED_FIELDS: [&str; 3] = ["_id", "created_at", "is_deleted"];

/// Overlays `fields` onto the JSON form of `doc` and reads the result back.
pub fn merge_fields<D: Document>(doc: &D, fields: Map<String, Value>) -> Result<D, StoreError> {
    let mut merged = serde_json::to_value(doc)?;
    if let Value::Object(object) = &mut merged {
        for (name, value) in fields {
            if !PROTECTED_FIELDS.contains(&name.as_str()) {
                object.insert(name, value);
            }
        }
    }
    serde_json::from_value(merged).map_err(|e| StoreError::Invalid(e.to_string()))
}
