//! In-memory [`Backend`] implementation.
//!
//! Serves tests and local development.  Collections live under a single
//! mutex; update operations are applied while the lock is held, which gives
//! them the same atomicity the hosted backend guarantees per document.
//! Every mutation pushes a fresh full snapshot to each live query whose
//! collection it touched.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

use crate::backend::{Backend, Document, Filter, SortKey, Subscription, Update, UpdateOp};
use crate::error::{Result, StoreError};

#[derive(Default)]
struct Shared {
    collections: HashMap<String, BTreeMap<String, Document>>,
    subscriptions: Vec<SubEntry>,
    next_subscription_id: u64,
}

struct SubEntry {
    id: u64,
    collection: String,
    filters: Vec<Filter>,
    order: Option<SortKey>,
    tx: mpsc::UnboundedSender<Vec<Document>>,
}

/// In-memory document backend.  Cloning shares the underlying data.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    shared: Arc<Mutex<Shared>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of currently registered live queries.  Used to verify that
    /// consumers tear their subscriptions down.
    pub fn subscription_count(&self) -> usize {
        self.lock().subscriptions.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Shared> {
        // A poisoning panic cannot leave the document maps half-mutated
        // badly enough to be worth propagating here.
        self.shared
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Shared {
    fn run_query(
        &self,
        collection: &str,
        filters: &[Filter],
        order: Option<&SortKey>,
    ) -> Vec<Document> {
        let mut results: Vec<Document> = self
            .collections
            .get(collection)
            .map(|docs| {
                docs.values()
                    .filter(|doc| filters.iter().all(|f| f.matches(doc)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(key) = order {
            results.sort_by(|a, b| key.compare(a, b));
        }
        results
    }

    /// Push a fresh snapshot to every live query on `collection`.
    /// Subscriptions whose receiver is gone are pruned.
    fn notify(&mut self, collection: &str) {
        let mut snapshots: Vec<(usize, Vec<Document>)> = Vec::new();
        for (index, sub) in self.subscriptions.iter().enumerate() {
            if sub.collection == collection {
                snapshots.push((
                    index,
                    self.run_query(&sub.collection, &sub.filters, sub.order.as_ref()),
                ));
            }
        }

        let mut dead: Vec<u64> = Vec::new();
        for (index, snapshot) in snapshots {
            let sub = &self.subscriptions[index];
            if sub.tx.send(snapshot).is_err() {
                dead.push(sub.id);
            }
        }
        if !dead.is_empty() {
            self.subscriptions.retain(|s| !dead.contains(&s.id));
        }
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        Ok(self
            .lock()
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
        order: Option<&SortKey>,
    ) -> Result<Vec<Document>> {
        Ok(self.lock().run_query(collection, filters, order))
    }

    async fn subscribe(
        &self,
        collection: &str,
        filters: &[Filter],
        order: Option<&SortKey>,
    ) -> Result<Subscription> {
        let (tx, rx) = mpsc::unbounded_channel();

        let subscription_id = {
            let mut shared = self.lock();
            let id = shared.next_subscription_id;
            shared.next_subscription_id += 1;

            // Initial snapshot before the entry is registered, so the
            // consumer always sees the current result set first.
            let initial = shared.run_query(collection, filters, order);
            let _ = tx.send(initial);

            shared.subscriptions.push(SubEntry {
                id,
                collection: collection.to_string(),
                filters: filters.to_vec(),
                order: order.cloned(),
                tx,
            });
            id
        };

        debug!(collection, subscription_id, "live query registered");

        let shared = Arc::clone(&self.shared);
        Ok(Subscription::new(rx, move || {
            let mut guard = shared
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            guard.subscriptions.retain(|s| s.id != subscription_id);
            debug!(subscription_id, "live query unregistered");
        }))
    }

    async fn create(&self, collection: &str, id: &str, doc: Document) -> Result<()> {
        let mut shared = self.lock();
        let docs = shared.collections.entry(collection.to_string()).or_default();
        if docs.contains_key(id) {
            return Err(StoreError::AlreadyExists(format!("{collection}/{id}")));
        }
        docs.insert(id.to_string(), doc);
        shared.notify(collection);
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, update: Update) -> Result<()> {
        let mut shared = self.lock();
        let doc = shared
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or(StoreError::NotFound)?;

        for (path, op) in update.ops() {
            apply_op(doc, path, op)?;
        }
        shared.notify(collection);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let mut shared = self.lock();
        let removed = shared
            .collections
            .get_mut(collection)
            .map(|docs| docs.remove(id).is_some())
            .unwrap_or(false);
        if removed {
            shared.notify(collection);
        }
        Ok(())
    }
}

/// Apply one update operation at a dotted field path, creating intermediate
/// objects as needed.
fn apply_op(doc: &mut Document, path: &str, op: &UpdateOp) -> Result<()> {
    let slot = slot_at(doc, path)?;
    match op {
        UpdateOp::Set(value) => {
            *slot = value.clone();
        }
        UpdateOp::Increment(delta) => {
            let current = slot.as_i64().unwrap_or(0);
            *slot = Value::from(current + delta);
        }
        UpdateOp::ArrayAdd(value) => match slot {
            Value::Array(items) => {
                if !items.contains(value) {
                    items.push(value.clone());
                }
            }
            Value::Null => {
                *slot = Value::Array(vec![value.clone()]);
            }
            other => {
                return Err(StoreError::Backend(format!(
                    "arrayAdd on non-array field '{path}' ({other})"
                )))
            }
        },
        UpdateOp::ArrayRemove(value) => match slot {
            Value::Array(items) => {
                items.retain(|item| item != value);
            }
            Value::Null => {}
            other => {
                return Err(StoreError::Backend(format!(
                    "arrayRemove on non-array field '{path}' ({other})"
                )))
            }
        },
    }
    Ok(())
}

/// Walk to the slot a dotted path names, inserting empty objects along the
/// way.  Missing leaves materialize as `Null` so the op decides their type.
fn slot_at<'a>(doc: &'a mut Document, path: &str) -> Result<&'a mut Value> {
    let mut current = doc;
    for segment in path.split('.') {
        let map = current.as_object_mut().ok_or_else(|| {
            StoreError::Backend(format!("path '{path}' traverses a non-object field"))
        })?;
        current = map.entry(segment.to_string()).or_insert(Value::Null);
    }
    Ok(current)
}
