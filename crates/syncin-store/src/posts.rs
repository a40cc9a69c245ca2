//! CRUD operations for [`Post`] records, the approved-posts live query,
//! and the like/unlike mutations.

use chrono::Utc;
use serde_json::json;
use tracing::warn;

use syncin_shared::constants::COLLECTION_POSTS;
use syncin_shared::{EventId, MediaKind, PostId, UserId};

use crate::backend::{Filter, SortKey, Subscription, Update};
use crate::database::Store;
use crate::error::Result;
use crate::models::Post;
use crate::normalize::normalize;

/// Input for [`Store::insert_post`].
#[derive(Debug, Clone)]
pub struct NewPost {
    pub event_id: EventId,
    pub author_id: UserId,
    pub media_url: String,
    pub media_kind: MediaKind,
    pub caption: String,
    pub tags: Vec<String>,
    pub is_approved: bool,
}

/// Typed wrapper over the approved-posts live query.
///
/// Each snapshot is the full, newest-first list of approved posts for the
/// event.  Dropping the feed drops the underlying subscription.
pub struct PostFeed {
    subscription: Subscription,
}

impl PostFeed {
    /// Wait for the next snapshot.  Malformed documents are logged and
    /// skipped so one bad record never empties the feed.
    pub async fn recv(&mut self) -> Option<Vec<Post>> {
        let docs = self.subscription.recv().await?;
        let mut posts = Vec::with_capacity(docs.len());
        for mut doc in docs {
            normalize(&mut doc);
            match serde_json::from_value(doc) {
                Ok(post) => posts.push(post),
                Err(e) => warn!(error = %e, "skipping malformed post in feed snapshot"),
            }
        }
        Some(posts)
    }
}

fn approved_posts_filters(event_id: &EventId) -> [Filter; 2] {
    [
        Filter::eq("eventId", json!(event_id)),
        Filter::eq("isApproved", true),
    ]
}

impl Store {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new post.  Whether it is born approved is decided by the
    /// caller from the event's moderation settings.
    pub async fn insert_post(&self, new: NewPost) -> Result<Post> {
        let post = Post {
            id: PostId::new(),
            event_id: new.event_id,
            author_id: new.author_id,
            media_url: new.media_url,
            media_kind: new.media_kind,
            caption: new.caption,
            tags: new.tags,
            likes: Vec::new(),
            likes_count: 0,
            comments_count: 0,
            is_approved: new.is_approved,
            is_reported: false,
            created_at: Utc::now(),
        };
        self.insert(COLLECTION_POSTS, &post.id.to_string(), &post)
            .await?;
        Ok(post)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single post.
    pub async fn post(&self, id: &PostId) -> Result<Post> {
        self.fetch(COLLECTION_POSTS, &id.to_string()).await
    }

    /// Approved posts for an event, newest first.
    pub async fn approved_posts(&self, event_id: &EventId) -> Result<Vec<Post>> {
        self.fetch_matching(
            COLLECTION_POSTS,
            &approved_posts_filters(event_id),
            Some(&SortKey::desc("createdAt")),
        )
        .await
    }

    /// Approved posts without a backend-side order, for the fallback path
    /// when the ordered live query cannot be established.  The caller
    /// sorts client-side.
    pub async fn approved_posts_unordered(&self, event_id: &EventId) -> Result<Vec<Post>> {
        self.fetch_matching(COLLECTION_POSTS, &approved_posts_filters(event_id), None)
            .await
    }

    /// Open the standing "approved posts, newest first" live query.
    pub async fn subscribe_approved_posts(&self, event_id: &EventId) -> Result<PostFeed> {
        let subscription = self
            .backend()
            .subscribe(
                COLLECTION_POSTS,
                &approved_posts_filters(event_id),
                Some(&SortKey::desc("createdAt")),
            )
            .await?;
        Ok(PostFeed { subscription })
    }

    // ------------------------------------------------------------------
    // Moderation
    // ------------------------------------------------------------------

    /// One-way approval transition.  Returns `true` when the flag actually
    /// flipped, so the caller knows whether to bump the event's post count.
    pub async fn approve_post(&self, id: &PostId) -> Result<bool> {
        let post = self.post(id).await?;
        if post.is_approved {
            return Ok(false);
        }
        self.backend()
            .update(
                COLLECTION_POSTS,
                &id.to_string(),
                Update::new().set("isApproved", true),
            )
            .await?;
        Ok(true)
    }

    /// Flag a post for moderator attention.
    pub async fn report_post(&self, id: &PostId) -> Result<()> {
        self.backend()
            .update(
                COLLECTION_POSTS,
                &id.to_string(),
                Update::new().set("isReported", true),
            )
            .await
    }

    // ------------------------------------------------------------------
    // Likes
    // ------------------------------------------------------------------

    /// Add a user to the post's authoritative like set.  The cached
    /// `likesCount` mirror is bumped in the same update; readers derive
    /// the real count from the array.
    pub async fn add_like(&self, post_id: &PostId, user_id: &UserId) -> Result<()> {
        self.backend()
            .update(
                COLLECTION_POSTS,
                &post_id.to_string(),
                Update::new()
                    .array_add("likes", json!(user_id))
                    .increment("likesCount", 1),
            )
            .await
    }

    /// Mirror of [`Store::add_like`].
    pub async fn remove_like(&self, post_id: &PostId, user_id: &UserId) -> Result<()> {
        self.backend()
            .update(
                COLLECTION_POSTS,
                &post_id.to_string(),
                Update::new()
                    .array_remove("likes", json!(user_id))
                    .increment("likesCount", -1),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_post(event_id: &EventId, approved: bool) -> NewPost {
        NewPost {
            event_id: event_id.clone(),
            author_id: UserId::new(),
            media_url: "/media/a.jpg".to_string(),
            media_kind: MediaKind::Image,
            caption: "caption".to_string(),
            tags: vec!["sunset".to_string()],
            is_approved: approved,
        }
    }

    #[tokio::test]
    async fn approved_posts_are_newest_first_and_exclude_unapproved() {
        let store = Store::in_memory();
        let event_id = EventId::new();

        let first = store.insert_post(new_post(&event_id, true)).await.unwrap();
        let _hidden = store.insert_post(new_post(&event_id, false)).await.unwrap();
        let second = store.insert_post(new_post(&event_id, true)).await.unwrap();

        let posts = store.approved_posts(&event_id).await.unwrap();
        let ids: Vec<&PostId> = posts.iter().map(|p| &p.id).collect();
        assert_eq!(ids, vec![&second.id, &first.id]);
    }

    #[tokio::test]
    async fn approve_post_is_one_way_and_reports_the_flip() {
        let store = Store::in_memory();
        let event_id = EventId::new();
        let post = store.insert_post(new_post(&event_id, false)).await.unwrap();

        assert!(store.approve_post(&post.id).await.unwrap());
        // Second approval is a no-op.
        assert!(!store.approve_post(&post.id).await.unwrap());
        assert!(store.post(&post.id).await.unwrap().is_approved);
    }

    #[tokio::test]
    async fn likes_behave_as_a_set() {
        let store = Store::in_memory();
        let event_id = EventId::new();
        let post = store.insert_post(new_post(&event_id, true)).await.unwrap();
        let user = UserId::new();

        store.add_like(&post.id, &user).await.unwrap();
        store.add_like(&post.id, &user).await.unwrap();

        let reloaded = store.post(&post.id).await.unwrap();
        assert_eq!(reloaded.likes, vec![user.clone()]);

        store.remove_like(&post.id, &user).await.unwrap();
        let reloaded = store.post(&post.id).await.unwrap();
        assert!(reloaded.likes.is_empty());
    }

    #[tokio::test]
    async fn feed_subscription_sees_approval_flips() {
        let store = Store::in_memory();
        let event_id = EventId::new();
        let pending = store.insert_post(new_post(&event_id, false)).await.unwrap();

        let mut feed = store.subscribe_approved_posts(&event_id).await.unwrap();
        assert!(feed.recv().await.unwrap().is_empty());

        store.approve_post(&pending.id).await.unwrap();
        let snapshot = feed.recv().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, pending.id);
    }
}
