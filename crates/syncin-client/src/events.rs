//! Application-level events broadcast to interested views.
//!
//! Commands announce state changes over a `tokio::sync::broadcast`
//! channel; views that care (navigation, badges, toasts) subscribe through
//! [`crate::state::AppState::subscribe_events`].

use tokio::sync::broadcast;

use syncin_shared::{CommentId, EventId, PostId, UserId};

#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The signed-in user changed (`None` on sign-out).
    SessionChanged { user_id: Option<UserId> },
    EventCreated {
        event_id: EventId,
    },
    ParticipantJoined {
        event_id: EventId,
        user_id: UserId,
    },
    PostCreated {
        event_id: EventId,
        post_id: PostId,
        approved: bool,
    },
    PostApproved {
        event_id: EventId,
        post_id: PostId,
    },
    CommentAdded {
        post_id: PostId,
        comment_id: CommentId,
    },
}

/// Broadcast an event.  Having no subscribers is normal and not an error.
pub fn emit(tx: &broadcast::Sender<AppEvent>, event: AppEvent) {
    if tx.send(event).is_err() {
        tracing::debug!("app event dropped, no subscribers");
    }
}
