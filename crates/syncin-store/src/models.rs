//! Domain model structs persisted in the document backend.
//!
//! Every struct derives `Serialize` and `Deserialize` with camelCase field
//! names, matching the documents the hosted backend stores, so a model can
//! be handed directly to the view layer as JSON.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use syncin_shared::{CommentId, EventId, MediaKind, ParticipantId, PostId, UserId};

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// Denormalized per-event counters.
///
/// These are eventually consistent approximations maintained by delta
/// application from independent call sites; they can drift when a delta
/// write fails and are never recomputed.  Readers that need an exact
/// number derive it from the underlying arrays instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EventStats {
    pub total_participants: i64,
    pub total_posts: i64,
    pub total_likes: i64,
    pub total_comments: i64,
}

/// Signed counter deltas applied to an event's [`EventStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsDelta {
    pub participants: i64,
    pub posts: i64,
    pub likes: i64,
    pub comments: i64,
}

impl StatsDelta {
    pub fn is_empty(&self) -> bool {
        self.participants == 0 && self.posts == 0 && self.likes == 0 && self.comments == 0
    }
}

/// The top-level organizing entity attendees join.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub location: Option<String>,
    /// Whether post moderation is enabled at all for this event.
    pub moderation_enabled: bool,
    /// Whether new posts start unapproved and need an explicit approval.
    pub requires_approval: bool,
    #[serde(default)]
    pub stats: EventStats,
    /// Ordered onboarding prompts answered at join time.
    #[serde(default)]
    pub prompts: Vec<Prompt>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Prompt
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PromptKind {
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "multipleChoice")]
    MultipleChoice,
}

/// An onboarding question attached to an event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    pub id: String,
    pub question: String,
    #[serde(rename = "type")]
    pub kind: PromptKind,
    #[serde(default)]
    pub required: bool,
    /// Ordered option strings; only meaningful for multiple choice.
    #[serde(default)]
    pub options: Vec<String>,
}

// ---------------------------------------------------------------------------
// User profile
// ---------------------------------------------------------------------------

/// Global account record mirrored from the auth directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub display_name: String,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Participant
// ---------------------------------------------------------------------------

/// A user's membership record within one specific event.  Created once per
/// (event, user) pair at join time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: ParticipantId,
    pub event_id: EventId,
    pub user_id: UserId,
    /// Event-scoped display name; may differ from the global profile.
    pub display_name: String,
    pub photo_url: Option<String>,
    /// Prompt id -> answer.
    #[serde(default)]
    pub answers: HashMap<String, String>,
    #[serde(default)]
    pub has_posted: bool,
    pub is_approved: bool,
    pub joined_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Post
// ---------------------------------------------------------------------------

/// A photo or short video shared into an event's feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub event_id: EventId,
    pub author_id: UserId,
    pub media_url: String,
    pub media_kind: MediaKind,
    pub caption: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Authoritative set of liking user ids.
    #[serde(default)]
    pub likes: Vec<UserId>,
    /// Cached mirror of `likes.len()`; can transiently disagree with the
    /// array between an increment and the next snapshot.
    #[serde(default)]
    pub likes_count: i64,
    /// Cached comment count mirror, same caveat as `likes_count`.
    #[serde(default)]
    pub comments_count: i64,
    pub is_approved: bool,
    #[serde(default)]
    pub is_reported: bool,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Comment
// ---------------------------------------------------------------------------

/// An append-only text comment on a post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub event_id: EventId,
    pub author_id: UserId,
    pub content: String,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}
