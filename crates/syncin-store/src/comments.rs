//! CRUD operations for [`Comment`] records.

use chrono::Utc;
use serde_json::json;
use tracing::warn;

use syncin_shared::constants::{COLLECTION_COMMENTS, COLLECTION_POSTS};
use syncin_shared::{CommentId, EventId, PostId, UserId};

use crate::backend::{Filter, SortKey, Update};
use crate::database::Store;
use crate::error::Result;
use crate::models::Comment;

/// Input for [`Store::insert_comment`].
#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: PostId,
    pub event_id: EventId,
    pub author_id: UserId,
    pub content: String,
}

impl Store {
    /// Append a comment to a post.  Comments are append-only and created
    /// approved; the post's cached `commentsCount` mirror is bumped
    /// best-effort (readers derive the real count from the comment list).
    pub async fn insert_comment(&self, new: NewComment) -> Result<Comment> {
        let comment = Comment {
            id: CommentId::new(),
            post_id: new.post_id,
            event_id: new.event_id,
            author_id: new.author_id,
            content: new.content,
            is_approved: true,
            created_at: Utc::now(),
        };
        self.insert(COLLECTION_COMMENTS, &comment.id.to_string(), &comment)
            .await?;

        if let Err(e) = self
            .backend()
            .update(
                COLLECTION_POSTS,
                &comment.post_id.to_string(),
                Update::new().increment("commentsCount", 1),
            )
            .await
        {
            warn!(post = %comment.post_id, error = %e, "comment count mirror update failed");
        }

        Ok(comment)
    }

    /// Approved comments for a post, oldest first.
    pub async fn comments_for_post(&self, post_id: &PostId) -> Result<Vec<Comment>> {
        let filters = [
            Filter::eq("postId", json!(post_id)),
            Filter::eq("isApproved", true),
        ];
        self.fetch_matching(
            COLLECTION_COMMENTS,
            &filters,
            Some(&SortKey::asc("createdAt")),
        )
        .await
    }
}
