//! The per-event live feed.
//!
//! [`LiveFeed::open`] establishes the standing "approved posts, newest
//! first" query and spawns a loop that re-runs enrichment over the full
//! result set on every snapshot, replacing the published list wholesale.
//! No incremental patching: repeated author and comment lookups for
//! unchanged posts are accepted, which is fine at single-event feed sizes.
//!
//! The feed owns its backend subscription.  Closing (or dropping) the
//! handle tears the loop down and unregisters the subscription exactly
//! once; repeated navigation in and out of a feed view must not accumulate
//! live queries.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use syncin_shared::{EventId, PostId, UserId};
use syncin_store::Store;

use crate::enrich::{enrich_posts, EnrichedPost};
use crate::error::Result;
use crate::likes::LikeController;

/// Handle to an open event feed.
pub struct LiveFeed {
    rx: watch::Receiver<Vec<EnrichedPost>>,
    likes: Arc<LikeController>,
    task: Option<JoinHandle<()>>,
}

impl LiveFeed {
    /// Open the feed for an event as seen by `viewer`.
    ///
    /// When the live query cannot be established the feed degrades to a
    /// one-shot unordered fetch sorted client-side; it then simply never
    /// updates.
    pub async fn open(store: Store, event_id: EventId, viewer: Option<UserId>) -> Result<Self> {
        let (tx, rx) = watch::channel(Vec::new());
        let likes = Arc::new(LikeController::new(store.clone(), viewer.clone(), tx));

        let task = match store.subscribe_approved_posts(&event_id).await {
            Ok(mut feed) => {
                let likes = Arc::clone(&likes);
                tokio::spawn(async move {
                    while let Some(posts) = feed.recv().await {
                        let enriched = enrich_posts(&store, &posts, viewer.as_ref()).await;
                        likes.set_authoritative(enriched).await;
                    }
                    debug!(event = %event_id, "feed subscription closed");
                })
            }
            Err(e) => {
                warn!(
                    event = %event_id,
                    error = %e,
                    "live query failed, falling back to one-shot fetch"
                );
                let likes = Arc::clone(&likes);
                tokio::spawn(async move {
                    match store.approved_posts_unordered(&event_id).await {
                        Ok(mut posts) => {
                            posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                            let enriched = enrich_posts(&store, &posts, viewer.as_ref()).await;
                            likes.set_authoritative(enriched).await;
                        }
                        Err(e) => {
                            warn!(event = %event_id, error = %e, "feed fallback failed, showing empty feed");
                        }
                    }
                })
            }
        };

        Ok(Self {
            rx,
            likes,
            task: Some(task),
        })
    }

    /// The currently published post list.
    pub fn posts(&self) -> Vec<EnrichedPost> {
        self.rx.borrow().clone()
    }

    /// Wait for the next published list.  Returns `None` once the feed
    /// task has gone away.
    pub async fn next(&mut self) -> Option<Vec<EnrichedPost>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// A receiver the view layer can watch independently.
    pub fn watch(&self) -> watch::Receiver<Vec<EnrichedPost>> {
        self.rx.clone()
    }

    /// Optimistically like a post (see [`LikeController`]).
    pub async fn like(&self, post_id: &PostId) -> Result<()> {
        self.likes.like(post_id).await
    }

    /// Optimistically unlike a post.
    pub async fn unlike(&self, post_id: &PostId) -> Result<()> {
        self.likes.unlike(post_id).await
    }

    /// Tear the feed down and wait until its subscription is released.
    pub async fn close(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
    }
}

impl Drop for LiveFeed {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use async_trait::async_trait;
    use syncin_shared::MediaKind;
    use syncin_store::backend::{Filter, SortKey, Subscription};
    use syncin_store::comments::NewComment;
    use syncin_store::participants::JoinEvent;
    use syncin_store::posts::NewPost;
    use syncin_store::{Backend, Document, MemoryBackend, StoreError, Update};

    async fn seed_post(store: &Store, event_id: &EventId, author: &UserId, caption: &str) {
        store
            .insert_post(NewPost {
                event_id: event_id.clone(),
                author_id: author.clone(),
                media_url: "/media/a.jpg".to_string(),
                media_kind: MediaKind::Image,
                caption: caption.to_string(),
                tags: Vec::new(),
                is_approved: true,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn publishes_enriched_snapshots_newest_first() {
        let store = Store::in_memory();
        let event_id = EventId::new();
        let author = UserId::new();
        store
            .join_event(JoinEvent {
                event_id: event_id.clone(),
                user_id: author.clone(),
                display_name: "Ana".to_string(),
                photo_url: None,
                answers: HashMap::new(),
            })
            .await
            .unwrap();

        seed_post(&store, &event_id, &author, "first").await;
        seed_post(&store, &event_id, &author, "second").await;

        let mut feed = LiveFeed::open(store.clone(), event_id.clone(), None)
            .await
            .unwrap();

        let initial = feed.next().await.unwrap();
        let captions: Vec<&str> = initial.iter().map(|p| p.caption.as_str()).collect();
        assert_eq!(captions, vec!["second", "first"]);
        assert_eq!(initial[0].author_display_name, "Ana");

        // A new post re-publishes the whole list.
        seed_post(&store, &event_id, &author, "third").await;
        let updated = feed.next().await.unwrap();
        assert_eq!(updated.len(), 3);
        assert_eq!(updated[0].caption, "third");

        feed.close().await;
    }

    #[tokio::test]
    async fn comment_activity_refreshes_the_feed() {
        let store = Store::in_memory();
        let event_id = EventId::new();
        let author = UserId::new();
        seed_post(&store, &event_id, &author, "photo").await;

        let mut feed = LiveFeed::open(store.clone(), event_id.clone(), None)
            .await
            .unwrap();
        let initial = feed.next().await.unwrap();
        let post_id = initial[0].id.clone();
        assert_eq!(initial[0].comments_count, 0);

        store
            .insert_comment(NewComment {
                post_id,
                event_id,
                author_id: UserId::new(),
                content: "nice".to_string(),
            })
            .await
            .unwrap();

        let refreshed = feed.next().await.unwrap();
        assert_eq!(refreshed[0].comments_count, 1);
        assert_eq!(refreshed[0].comments[0].content, "nice");

        feed.close().await;
    }

    #[tokio::test]
    async fn close_releases_the_subscription_exactly_once() {
        let backend = MemoryBackend::new();
        let store = Store::new(std::sync::Arc::new(backend.clone()));
        let event_id = EventId::new();

        let feed = LiveFeed::open(store.clone(), event_id.clone(), None)
            .await
            .unwrap();
        assert_eq!(backend.subscription_count(), 1);

        feed.close().await;
        assert_eq!(backend.subscription_count(), 0);

        // Re-opening after close registers a fresh subscription.
        let again = LiveFeed::open(store, event_id, None).await.unwrap();
        assert_eq!(backend.subscription_count(), 1);
        again.close().await;
        assert_eq!(backend.subscription_count(), 0);
    }

    /// Backend wrapper that cannot establish live queries, simulating a
    /// misconfigured index.
    struct NoLiveQueries {
        inner: MemoryBackend,
    }

    #[async_trait]
    impl Backend for NoLiveQueries {
        async fn get(&self, collection: &str, id: &str) -> syncin_store::Result<Option<Document>> {
            self.inner.get(collection, id).await
        }

        async fn query(
            &self,
            collection: &str,
            filters: &[Filter],
            _order: Option<&SortKey>,
        ) -> syncin_store::Result<Vec<Document>> {
            // Unordered queries only, like a backend missing its composite
            // index.
            self.inner.query(collection, filters, None).await
        }

        async fn subscribe(
            &self,
            _collection: &str,
            _filters: &[Filter],
            _order: Option<&SortKey>,
        ) -> syncin_store::Result<Subscription> {
            Err(StoreError::Backend("index misconfigured".to_string()))
        }

        async fn create(
            &self,
            collection: &str,
            id: &str,
            doc: Document,
        ) -> syncin_store::Result<()> {
            self.inner.create(collection, id, doc).await
        }

        async fn update(
            &self,
            collection: &str,
            id: &str,
            update: Update,
        ) -> syncin_store::Result<()> {
            self.inner.update(collection, id, update).await
        }

        async fn delete(&self, collection: &str, id: &str) -> syncin_store::Result<()> {
            self.inner.delete(collection, id).await
        }
    }

    #[tokio::test]
    async fn subscription_failure_falls_back_to_sorted_one_shot() {
        let backend = MemoryBackend::new();
        let healthy = Store::new(std::sync::Arc::new(backend.clone()));
        let event_id = EventId::new();
        let author = UserId::new();
        seed_post(&healthy, &event_id, &author, "first").await;
        seed_post(&healthy, &event_id, &author, "second").await;

        let store = Store::new(std::sync::Arc::new(NoLiveQueries { inner: backend }));
        let mut feed = LiveFeed::open(store, event_id, None).await.unwrap();

        let posts = feed.next().await.unwrap();
        let captions: Vec<&str> = posts.iter().map(|p| p.caption.as_str()).collect();
        assert_eq!(captions, vec!["second", "first"]);

        feed.close().await;
    }
}
