//! Commenting on posts.

use tracing::info;

use syncin_shared::PostId;
use syncin_store::comments::NewComment;
use syncin_store::{Comment, StatsDelta};

use crate::error::{ClientError, Result};
use crate::events::AppEvent;
use crate::state::AppState;

/// Append a comment to a post as the signed-in user.
pub async fn add_comment(state: &AppState, post_id: &PostId, content: &str) -> Result<Comment> {
    let session = state.require_session()?;

    let content = content.trim();
    if content.is_empty() {
        return Err(ClientError::Validation("comment text is required".to_string()));
    }

    let post = state.store.post(post_id).await?;
    let comment = state
        .store
        .insert_comment(NewComment {
            post_id: post_id.clone(),
            event_id: post.event_id.clone(),
            author_id: session.user_id,
            content: content.to_string(),
        })
        .await?;

    state.store.bump_stats(
        post.event_id,
        StatsDelta {
            comments: 1,
            ..Default::default()
        },
    );

    info!(comment = %comment.id, post = %post_id, "comment added");
    state.emit(AppEvent::CommentAdded {
        post_id: post_id.clone(),
        comment_id: comment.id.clone(),
    });
    Ok(comment)
}
