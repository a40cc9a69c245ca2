//! The document-database contract the rest of the application is written
//! against.
//!
//! The hosted backend is treated as an opaque collaborator: collections of
//! JSON documents addressed by id, predicate queries, standing live queries
//! that re-emit the full matching result set on every relevant change, and
//! partial updates whose increment / array operations are atomic on the
//! backend side.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::Result;

/// A raw document as stored by the backend.
pub type Document = Value;

// ---------------------------------------------------------------------------
// Query predicates and ordering
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// Field equals value.
    Eq,
    /// Field is an array containing value.
    ArrayContains,
}

/// A single query predicate on a (possibly dotted) field path.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self {
            field: field.to_string(),
            op: FilterOp::Eq,
            value: value.into(),
        }
    }

    pub fn array_contains(field: &str, value: impl Into<Value>) -> Self {
        Self {
            field: field.to_string(),
            op: FilterOp::ArrayContains,
            value: value.into(),
        }
    }

    /// Whether a document satisfies this predicate.
    pub fn matches(&self, doc: &Document) -> bool {
        match field_at(doc, &self.field) {
            Some(found) => match self.op {
                FilterOp::Eq => *found == self.value,
                FilterOp::ArrayContains => found
                    .as_array()
                    .map(|items| items.contains(&self.value))
                    .unwrap_or(false),
            },
            None => false,
        }
    }
}

/// Result ordering on one field.  Timestamps are stored as RFC 3339
/// strings, so lexicographic string order is chronological order.
#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub field: String,
    pub descending: bool,
}

impl SortKey {
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            descending: false,
        }
    }

    pub fn desc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            descending: true,
        }
    }

    /// Comparison between two documents under this key.  Missing fields
    /// sort last regardless of direction.
    pub fn compare(&self, a: &Document, b: &Document) -> std::cmp::Ordering {
        use std::cmp::Ordering;

        let (va, vb) = (field_at(a, &self.field), field_at(b, &self.field));
        let ord = match (va, vb) {
            (Some(a), Some(b)) => compare_values(a, b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        if self.descending {
            ord.reverse()
        } else {
            ord
        }
    }
}

fn compare_values(a: &Value, b: &Value) -> std::cmp::Ordering {
    use std::cmp::Ordering;

    match (a, b) {
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

/// Resolve a dotted field path (`"stats.totalPosts"`) inside a document.
pub fn field_at<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut current = doc;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

// ---------------------------------------------------------------------------
// Partial updates
// ---------------------------------------------------------------------------

/// One field mutation inside an update.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOp {
    /// Overwrite the field.
    Set(Value),
    /// Atomic signed increment of a numeric field.
    Increment(i64),
    /// Atomic add-to-set: the value is appended only if not already present.
    ArrayAdd(Value),
    /// Atomic remove-from-set: every equal element is removed.
    ArrayRemove(Value),
}

/// An ordered list of field mutations applied to one document as a unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    ops: Vec<(String, UpdateOp)>,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.ops.push((field.to_string(), UpdateOp::Set(value.into())));
        self
    }

    pub fn increment(mut self, field: &str, delta: i64) -> Self {
        self.ops
            .push((field.to_string(), UpdateOp::Increment(delta)));
        self
    }

    pub fn array_add(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.ops
            .push((field.to_string(), UpdateOp::ArrayAdd(value.into())));
        self
    }

    pub fn array_remove(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.ops
            .push((field.to_string(), UpdateOp::ArrayRemove(value.into())));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[(String, UpdateOp)] {
        &self.ops
    }
}

// ---------------------------------------------------------------------------
// Live queries
// ---------------------------------------------------------------------------

/// Receiving half of a standing live query.
///
/// Every snapshot is the **full** current result set of the query, in query
/// order.  Dropping the handle unregisters the subscription from the
/// backend exactly once; a leaked handle would keep the backend pushing
/// snapshots (and the consumer enriching them) indefinitely.
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<Vec<Document>>,
    unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(
        rx: mpsc::UnboundedReceiver<Vec<Document>>,
        unsubscribe: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            rx,
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// Wait for the next snapshot.  Returns `None` once the backend side
    /// has gone away.
    pub async fn recv(&mut self) -> Option<Vec<Document>> {
        self.rx.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Backend trait
// ---------------------------------------------------------------------------

/// The document store boundary.
///
/// Implementations must apply each [`Update`] atomically with respect to
/// other updates of the same document; increments and array add/remove
/// commute, which is what lets independent call sites bump shared counters
/// without cross-operation locking.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Point read.  `Ok(None)` when the document does not exist.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Point-in-time query.
    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
        order: Option<&SortKey>,
    ) -> Result<Vec<Document>>;

    /// Open a standing live query.  The first snapshot (the current result
    /// set) is delivered immediately; every subsequent mutation that could
    /// affect the result set re-emits the full set.
    async fn subscribe(
        &self,
        collection: &str,
        filters: &[Filter],
        order: Option<&SortKey>,
    ) -> Result<Subscription>;

    /// Create a document.  Fails with `AlreadyExists` on id collision.
    async fn create(&self, collection: &str, id: &str, doc: Document) -> Result<()>;

    /// Apply a partial update to an existing document.
    async fn update(&self, collection: &str, id: &str, update: Update) -> Result<()>;

    /// Delete a document.  Deleting a missing document is not an error.
    async fn delete(&self, collection: &str, id: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_eq_on_nested_path() {
        let doc = json!({"stats": {"totalPosts": 3}, "title": "Launch"});
        assert!(Filter::eq("stats.totalPosts", 3).matches(&doc));
        assert!(!Filter::eq("stats.totalPosts", 4).matches(&doc));
        assert!(!Filter::eq("stats.missing", 3).matches(&doc));
    }

    #[test]
    fn filter_array_contains() {
        let doc = json!({"tags": ["sunset", "beach"]});
        assert!(Filter::array_contains("tags", "beach").matches(&doc));
        assert!(!Filter::array_contains("tags", "city").matches(&doc));
        // Non-array field never matches
        assert!(!Filter::array_contains("tags.0", "sunset").matches(&doc));
    }

    #[test]
    fn sort_key_orders_rfc3339_strings() {
        let older = json!({"createdAt": "2026-08-01T10:00:00Z"});
        let newer = json!({"createdAt": "2026-08-02T10:00:00Z"});

        let desc = SortKey::desc("createdAt");
        assert_eq!(desc.compare(&newer, &older), std::cmp::Ordering::Less);

        let asc = SortKey::asc("createdAt");
        assert_eq!(asc.compare(&older, &newer), std::cmp::Ordering::Less);
    }
}
