//! In-memory document store.
//!
//! Reference [`DocumentStore`] backend used in tests and development.
//! Each collection lives behind its own mutex; the outer map lock is held
//! only long enough to fetch the collection handle, so operations on
//! unrelated collections (and therefore unrelated families) never
//! serialize behind a shared lock.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, RwLock};

use serde_json::Value;

use super::{Direction, Document, DocumentStore, Query, StoreError, StoreResult, UpdateOutcome};

type Collection = Arc<Mutex<BTreeMap<String, Document>>>;

/// Thread-safe in-memory [`DocumentStore`].
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
    #[cfg(any(test, feature = "test-utils"))]
    unavailable: std::sync::atomic::AtomicBool,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent operation fail with
    /// [`StoreError::Unavailable`] until reset.
    ///
    /// Only for exercising storage-failure paths in tests.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable
            .store(unavailable, std::sync::atomic::Ordering::SeqCst);
    }

    fn check_available(&self) -> StoreResult<()> {
        #[cfg(any(test, feature = "test-utils"))]
        if self.unavailable.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "simulated storage outage".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the handle for a collection, creating it if absent.
    fn collection(&self, name: &str) -> StoreResult<Collection> {
        {
            let map = self
                .collections
                .read()
                .map_err(|e| StoreError::Unavailable(format!("collection map poisoned: {e}")))?;
            if let Some(collection) = map.get(name) {
                return Ok(Arc::clone(collection));
            }
        }

        let mut map = self
            .collections
            .write()
            .map_err(|e| StoreError::Unavailable(format!("collection map poisoned: {e}")))?;
        Ok(Arc::clone(map.entry(name.to_string()).or_default()))
    }
}

impl DocumentStore for MemoryStore {
    fn insert(&self, collection: &str, document: Document) -> StoreResult<String> {
        self.check_available()?;
        let collection = self.collection(collection)?;
        let mut documents = lock(&collection)?;

        let mut id = super::generate_document_id();
        while documents.contains_key(&id) {
            id = super::generate_document_id();
        }
        documents.insert(id.clone(), document);
        Ok(id)
    }

    fn create(&self, collection: &str, id: &str, document: Document) -> StoreResult<bool> {
        self.check_available()?;
        let collection = self.collection(collection)?;
        let mut documents = lock(&collection)?;

        if documents.contains_key(id) {
            return Ok(false);
        }
        documents.insert(id.to_string(), document);
        Ok(true)
    }

    fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        self.check_available()?;
        let collection = self.collection(collection)?;
        let documents = lock(&collection)?;
        Ok(documents.get(id).cloned())
    }

    fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<(String, Document)>> {
        self.check_available()?;
        let collection = self.collection(collection)?;
        let documents = lock(&collection)?;

        let mut results: Vec<(String, Document)> = documents
            .iter()
            .filter(|(_, doc)| {
                query
                    .filters
                    .iter()
                    .all(|(field, value)| doc.get(field) == Some(value))
            })
            .map(|(id, doc)| (id.clone(), doc.clone()))
            .collect();

        if let Some((field, direction)) = &query.order_by {
            results.sort_by(|(_, a), (_, b)| {
                let ordering = compare_values(a.get(field), b.get(field));
                match direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }

        if let Some(limit) = query.limit {
            results.truncate(limit);
        }

        Ok(results)
    }

    fn conditional_update(
        &self,
        collection: &str,
        id: &str,
        predicate: &dyn Fn(&Document) -> bool,
        mutation: &dyn Fn(&mut Document),
    ) -> StoreResult<UpdateOutcome> {
        self.check_available()?;
        let collection = self.collection(collection)?;
        let mut documents = lock(&collection)?;

        let Some(document) = documents.get_mut(id) else {
            return Ok(UpdateOutcome::Missing);
        };

        if !predicate(document) {
            return Ok(UpdateOutcome::Rejected(document.clone()));
        }

        mutation(document);
        Ok(UpdateOutcome::Applied(document.clone()))
    }
}

fn lock(collection: &Collection) -> StoreResult<std::sync::MutexGuard<'_, BTreeMap<String, Document>>> {
    collection
        .lock()
        .map_err(|e| StoreError::Unavailable(format!("collection poisoned: {e}")))
}

/// Orders field values for `order_by`: numbers numerically, strings
/// lexicographically, missing values first.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    use std::cmp::Ordering;

    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => Ordering::Equal,
    }
}
