//! Document-store abstraction consumed by the managers.
//!
//! The core persists everything through [`DocumentStore`]: collections of
//! JSON documents keyed by IDs, equality-filtered queries ordered by a
//! field, and an atomic per-document conditional update. The concrete
//! backend is an adapter concern; [`MemoryStore`] is the reference
//! implementation used in tests and development.
//!
//! # Collections
//!
//! ```text
//! families                     one document per family
//! families/{id}/members        document ID = member UID
//! families/{id}/locations     append-only location pings
//! invites                      top-level: redeemed by code across families
//! alerts                       top-level: acknowledged by alert ID alone
//! ```

mod memory;

pub use memory::MemoryStore;

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::Value;
use thiserror::Error;

/// A stored document: a JSON object.
pub type Document = serde_json::Map<String, Value>;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend failed, timed out, or holds undecodable state.
    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for storage operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Sort direction for [`Query::order_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// An equality-filtered, optionally ordered and limited query.
///
/// # Example
///
/// ```
/// use faro_core::store::{Direction, Query};
///
/// let query = Query::new()
///     .filter("uid", "member-1")
///     .order_by("createdAt", Direction::Descending)
///     .limit(1);
/// assert_eq!(query.filters.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Query {
    /// Field/value pairs a matching document must all satisfy.
    pub filters: Vec<(String, Value)>,
    /// Field to order results by, with direction.
    pub order_by: Option<(String, Direction)>,
    /// Maximum number of results.
    pub limit: Option<usize>,
}

impl Query {
    /// Creates an empty query matching every document in a collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an equality filter.
    #[must_use]
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    /// Orders results by a field.
    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some((field.into(), direction));
        self
    }

    /// Limits the number of results.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Outcome of a [`DocumentStore::conditional_update`].
#[derive(Debug, Clone)]
pub enum UpdateOutcome {
    /// No document exists under the given ID.
    Missing,
    /// The predicate rejected the document; carries the current state so
    /// callers can classify the rejection without a second read.
    Rejected(Document),
    /// The mutation was applied; carries the updated document.
    Applied(Document),
}

/// Storage interface the managers are written against.
///
/// Implementations must be safe for many concurrent callers, and
/// `conditional_update` must evaluate predicate and mutation as one atomic
/// unit per document — it is the primitive behind single-use invite
/// redemption and idempotent alert acknowledgement.
pub trait DocumentStore: Send + Sync {
    /// Inserts a document under a generated ID and returns the ID.
    fn insert(&self, collection: &str, document: Document) -> StoreResult<String>;

    /// Creates a document under a caller-chosen ID if the ID is free.
    ///
    /// Returns `false`, without modifying anything, when a document with
    /// that ID already exists.
    fn create(&self, collection: &str, id: &str, document: Document) -> StoreResult<bool>;

    /// Fetches a document by ID.
    fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Runs an equality-filtered query over a collection.
    fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<(String, Document)>>;

    /// Atomically checks `predicate` against the current document and, if
    /// it holds, applies `mutation`.
    fn conditional_update(
        &self,
        collection: &str,
        id: &str,
        predicate: &dyn Fn(&Document) -> bool,
        mutation: &dyn Fn(&mut Document),
    ) -> StoreResult<UpdateOutcome>;
}

/// Length of generated document IDs.
const DOCUMENT_ID_LENGTH: usize = 20;

/// Generates a collision-resistant random document ID.
///
/// 20 alphanumeric characters, the shape of auto-assigned IDs in hosted
/// document databases. Not cryptographic.
#[must_use]
pub fn generate_document_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(DOCUMENT_ID_LENGTH)
        .map(char::from)
        .collect()
}

/// Serializes a domain record into a [`Document`].
pub(crate) fn encode_document<T: serde::Serialize>(value: &T) -> StoreResult<Document> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(StoreError::Unavailable(
            "record did not encode to a JSON object".to_string(),
        )),
        Err(e) => Err(StoreError::Unavailable(format!(
            "failed to encode record: {e}"
        ))),
    }
}

/// Deserializes a stored [`Document`] into a domain record.
///
/// A document that no longer decodes means the store holds corrupt or
/// incompatible state, so the failure is reported as the store's, not the
/// caller's.
pub(crate) fn decode_document<T: serde::de::DeserializeOwned>(
    collection: &str,
    document: Document,
) -> StoreResult<T> {
    serde_json::from_value(Value::Object(document)).map_err(|e| {
        StoreError::Unavailable(format!("malformed document in {collection}: {e}"))
    })
}
