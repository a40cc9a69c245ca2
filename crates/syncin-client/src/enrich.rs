//! Post enrichment: attach resolved display metadata to raw records before
//! they reach the view layer.
//!
//! Author resolution is two dependent lookups: the participant record for
//! the event-scoped display name, then the global profile for the photo.
//! A failure anywhere degrades that one post (placeholder author, empty
//! comment list) and never aborts its siblings; the feed would rather show
//! "Event Attendee" than nothing.

use futures::future::join_all;
use serde::Serialize;
use tracing::warn;

use chrono::{DateTime, Utc};
use syncin_shared::constants::FALLBACK_AUTHOR_NAME;
use syncin_shared::{CommentId, EventId, MediaKind, PostId, UserId};
use syncin_store::{Comment, Post, Store};

/// A comment augmented with resolved author metadata.  View-layer only,
/// recomputed on every feed refresh, never persisted.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedComment {
    pub id: CommentId,
    pub post_id: PostId,
    pub author_id: UserId,
    pub author_display_name: String,
    pub author_photo_url: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A post augmented with author metadata, the viewer's like state, and its
/// comment list.  View-layer only; the next snapshot replaces it.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedPost {
    pub id: PostId,
    pub event_id: EventId,
    pub author_id: UserId,
    pub author_display_name: String,
    pub author_photo_url: String,
    pub media_url: String,
    pub media_kind: MediaKind,
    pub caption: String,
    pub tags: Vec<String>,
    /// Authoritative like set as of this refresh.
    pub likes: Vec<UserId>,
    /// Derived from `likes`, not the stored mirror.
    pub likes_count: i64,
    pub user_has_liked: bool,
    pub comments: Vec<EnrichedComment>,
    /// Derived from `comments`, not the stored mirror.
    pub comments_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Resolve a user's display name and photo within an event.
///
/// The name comes from the event-scoped participant record, the photo from
/// the global profile.  Each half falls back independently; a hard lookup
/// failure is logged and degrades to the placeholder.
async fn resolve_author(store: &Store, event_id: &EventId, user_id: &UserId) -> (String, String) {
    let display_name = match store.participant_for(event_id, user_id).await {
        Ok(Some(participant)) => participant.display_name,
        Ok(None) => FALLBACK_AUTHOR_NAME.to_string(),
        Err(e) => {
            warn!(event = %event_id, user = %user_id, error = %e, "participant lookup failed");
            FALLBACK_AUTHOR_NAME.to_string()
        }
    };

    let photo_url = match store.profile(user_id).await {
        Ok(Some(profile)) => profile.photo_url.unwrap_or_default(),
        Ok(None) => String::new(),
        Err(e) => {
            warn!(user = %user_id, error = %e, "profile lookup failed");
            String::new()
        }
    };

    (display_name, photo_url)
}

async fn enrich_comment(store: &Store, comment: Comment) -> EnrichedComment {
    let (author_display_name, author_photo_url) =
        resolve_author(store, &comment.event_id, &comment.author_id).await;
    EnrichedComment {
        id: comment.id,
        post_id: comment.post_id,
        author_id: comment.author_id,
        author_display_name,
        author_photo_url,
        content: comment.content,
        created_at: comment.created_at,
    }
}

/// Produce the view-layer representation of one post.
pub async fn enrich_post(store: &Store, post: &Post, viewer: Option<&UserId>) -> EnrichedPost {
    let (author_display_name, author_photo_url) =
        resolve_author(store, &post.event_id, &post.author_id).await;

    let comments = match store.comments_for_post(&post.id).await {
        Ok(comments) => {
            join_all(comments.into_iter().map(|c| enrich_comment(store, c))).await
        }
        Err(e) => {
            warn!(post = %post.id, error = %e, "comment fetch failed, showing none");
            Vec::new()
        }
    };

    let user_has_liked = viewer.map(|v| post.likes.contains(v)).unwrap_or(false);

    EnrichedPost {
        id: post.id.clone(),
        event_id: post.event_id.clone(),
        author_id: post.author_id.clone(),
        author_display_name,
        author_photo_url,
        media_url: post.media_url.clone(),
        media_kind: post.media_kind,
        caption: post.caption.clone(),
        tags: post.tags.clone(),
        likes_count: post.likes.len() as i64,
        likes: post.likes.clone(),
        user_has_liked,
        comments_count: comments.len() as i64,
        comments,
        created_at: post.created_at,
    }
}

/// Enrich a whole snapshot, preserving its order.
pub async fn enrich_posts(
    store: &Store,
    posts: &[Post],
    viewer: Option<&UserId>,
) -> Vec<EnrichedPost> {
    join_all(posts.iter().map(|post| enrich_post(store, post, viewer))).await
}
