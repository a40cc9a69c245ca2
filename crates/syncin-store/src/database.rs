//! Store handle shared by all typed CRUD helpers.
//!
//! [`Store`] wraps an `Arc<dyn Backend>` and is cheap to clone; the typed
//! helpers for each collection live in `events.rs`, `participants.rs`,
//! `posts.rs`, `comments.rs` and `users.rs` as `impl Store` blocks.  Every
//! document read through this handle passes through the normalizer before
//! it is decoded, so the serialization quirks of the hosted backend never
//! reach application code.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::backend::{Backend, Filter, SortKey};
use crate::error::{Result, StoreError};
use crate::memory::MemoryBackend;
use crate::normalize::normalize;

/// Handle to the document store.
#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn Backend>,
}

impl Store {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// A store over a fresh in-memory backend, for tests and local runs.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Direct access to the backend.
    ///
    /// Callers should prefer the typed CRUD helpers; the live feed uses
    /// this for its standing subscription.
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Fetch and decode one document, or `Ok(None)` when absent.
    pub(crate) async fn try_fetch<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<T>> {
        let Some(mut doc) = self.backend.get(collection, id).await? else {
            return Ok(None);
        };
        normalize(&mut doc);
        Ok(Some(serde_json::from_value(doc)?))
    }

    /// Fetch and decode one document, failing with `NotFound` when absent.
    pub(crate) async fn fetch<T: DeserializeOwned>(&self, collection: &str, id: &str) -> Result<T> {
        self.try_fetch(collection, id)
            .await?
            .ok_or(StoreError::NotFound)
    }

    /// Query and decode all matching documents.  A document that fails to
    /// decode is logged and skipped rather than failing the batch.
    pub(crate) async fn fetch_matching<T: DeserializeOwned>(
        &self,
        collection: &str,
        filters: &[Filter],
        order: Option<&SortKey>,
    ) -> Result<Vec<T>> {
        let docs = self.backend.query(collection, filters, order).await?;
        let mut decoded = Vec::with_capacity(docs.len());
        for mut doc in docs {
            normalize(&mut doc);
            match serde_json::from_value(doc) {
                Ok(value) => decoded.push(value),
                Err(e) => warn!(collection, error = %e, "skipping malformed document"),
            }
        }
        Ok(decoded)
    }

    /// Encode and create one document.
    pub(crate) async fn insert<T: Serialize>(
        &self,
        collection: &str,
        id: &str,
        value: &T,
    ) -> Result<()> {
        self.backend
            .create(collection, id, serde_json::to_value(value)?)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use syncin_shared::constants::COLLECTION_EVENTS;

    #[tokio::test]
    async fn fetch_normalizes_before_decoding() {
        let store = Store::in_memory();
        // A raw document with both backend quirks present.
        store
            .backend()
            .create(
                COLLECTION_EVENTS,
                "e1",
                json!({
                    "id": "5f3a1c1e-0000-0000-0000-000000000001",
                    "title": "Launch party",
                    "location": null,
                    "moderationEnabled": false,
                    "requiresApproval": false,
                    "prompts": {
                        "0": {
                            "id": "p1",
                            "question": "Favourite colour?",
                            "type": "multipleChoice",
                            "required": true,
                            "options": {"0": "Red", "1": "Blue"}
                        }
                    },
                    "createdAt": {"seconds": 1754388000, "nanos": 0}
                }),
            )
            .await
            .unwrap();

        let event: crate::models::Event = store.fetch(COLLECTION_EVENTS, "e1").await.unwrap();
        assert_eq!(event.prompts.len(), 1);
        assert_eq!(event.prompts[0].options, vec!["Red", "Blue"]);
        assert_eq!(event.created_at.timestamp(), 1754388000);
    }

    #[tokio::test]
    async fn fetch_missing_is_not_found() {
        let store = Store::in_memory();
        let result: Result<crate::models::Event> = store.fetch(COLLECTION_EVENTS, "nope").await;
        assert!(matches!(result, Err(StoreError::NotFound)));
    }
}
