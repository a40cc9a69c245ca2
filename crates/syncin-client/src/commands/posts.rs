//! Capturing posts and moderating them.

use tracing::{info, warn};

use syncin_shared::{EventId, MediaKind, PostId};
use syncin_store::posts::NewPost;
use syncin_store::{Post, StatsDelta};

use crate::error::{ClientError, Result};
use crate::events::AppEvent;
use crate::state::AppState;

/// Input for [`create_post`].
#[derive(Debug, Clone)]
pub struct CreatePost {
    pub event_id: EventId,
    /// Original upload file name; only its extension matters.
    pub file_name: String,
    pub data: Vec<u8>,
    pub caption: String,
    pub tags: Vec<String>,
}

/// Upload the media and create the post.
///
/// Whether the post is born approved follows the event's moderation
/// settings; an unapproved post stays out of the feed (and out of the
/// event's post count) until [`approve_post`] flips it.
pub async fn create_post(state: &AppState, input: CreatePost) -> Result<Post> {
    let session = state.require_session()?;
    let event = state.store.event(&input.event_id).await?;

    let participant = state
        .store
        .participant_for(&input.event_id, &session.user_id)
        .await?
        .ok_or_else(|| {
            ClientError::Validation("join the event before posting".to_string())
        })?;

    let extension = std::path::Path::new(&input.file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    let media_kind = MediaKind::from_extension(extension).ok_or_else(|| {
        ClientError::Validation(format!("unsupported media type '{}'", input.file_name))
    })?;

    let stored = state.media.upload(&input.file_name, &input.data).await?;

    let approved = !(event.moderation_enabled && event.requires_approval);
    let post = state
        .store
        .insert_post(NewPost {
            event_id: input.event_id.clone(),
            author_id: session.user_id.clone(),
            media_url: stored.url,
            media_kind,
            caption: input.caption,
            tags: input.tags,
            is_approved: approved,
        })
        .await?;

    if !participant.has_posted {
        if let Err(e) = state.store.mark_has_posted(&participant.id).await {
            warn!(participant = %participant.id, error = %e, "hasPosted flip failed");
        }
    }

    if approved {
        state.store.bump_stats(
            input.event_id.clone(),
            StatsDelta {
                posts: 1,
                ..Default::default()
            },
        );
    }

    info!(post = %post.id, event = %input.event_id, approved, "post created");
    state.emit(AppEvent::PostCreated {
        event_id: input.event_id,
        post_id: post.id.clone(),
        approved,
    });
    Ok(post)
}

/// Approve a pending post.  Returns `true` when the flag actually flipped;
/// only that first flip bumps the event's post count.
pub async fn approve_post(state: &AppState, post_id: &PostId) -> Result<bool> {
    state.require_session()?;
    let post = state.store.post(post_id).await?;

    let flipped = state.store.approve_post(post_id).await?;
    if flipped {
        state.store.bump_stats(
            post.event_id.clone(),
            StatsDelta {
                posts: 1,
                ..Default::default()
            },
        );
        info!(post = %post_id, event = %post.event_id, "post approved");
        state.emit(AppEvent::PostApproved {
            event_id: post.event_id,
            post_id: post_id.clone(),
        });
    }
    Ok(flipped)
}

/// Flag a post for the organizer's attention.
pub async fn report_post(state: &AppState, post_id: &PostId) -> Result<()> {
    state.require_session()?;
    state.store.report_post(post_id).await?;
    info!(post = %post_id, "post reported");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::commands::events::tests::signed_in_state;
    use crate::commands::events::{create_event, CreateEvent};
    use crate::commands::participants::{join_event, JoinEventInput};
    use crate::state::AppState;

    async fn moderated_event(state: &AppState) -> syncin_store::Event {
        let event = create_event(
            state,
            CreateEvent {
                title: "Gala".to_string(),
                location: None,
                moderation_enabled: true,
                requires_approval: true,
                prompts: Vec::new(),
            },
        )
        .await
        .unwrap();
        join_event(state, &event.id, JoinEventInput::default())
            .await
            .unwrap();
        event
    }

    fn photo_input(event_id: &EventId) -> CreatePost {
        CreatePost {
            event_id: event_id.clone(),
            file_name: "sunset.jpg".to_string(),
            data: b"jpeg-bytes".to_vec(),
            caption: "golden hour".to_string(),
            tags: vec!["sunset".to_string()],
        }
    }

    async fn wait_for_post_count(state: &AppState, event_id: &EventId, expected: i64) {
        for _ in 0..50 {
            let stats = state.store.event(event_id).await.unwrap().stats;
            if stats.total_posts == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("post count never reached {expected}");
    }

    #[tokio::test]
    async fn moderated_posts_start_unapproved_and_count_only_on_approval() {
        let (state, _dir) = signed_in_state().await;
        let event = moderated_event(&state).await;

        let post = create_post(&state, photo_input(&event.id)).await.unwrap();
        assert!(!post.is_approved);

        // The unapproved post must not have bumped the counter.
        tokio::time::sleep(Duration::from_millis(30)).await;
        let stats = state.store.event(&event.id).await.unwrap().stats;
        assert_eq!(stats.total_posts, 0);

        assert!(approve_post(&state, &post.id).await.unwrap());
        assert!(state.store.post(&post.id).await.unwrap().is_approved);
        wait_for_post_count(&state, &event.id, 1).await;

        // Approving again neither flips nor counts.
        assert!(!approve_post(&state, &post.id).await.unwrap());
        tokio::time::sleep(Duration::from_millis(30)).await;
        let stats = state.store.event(&event.id).await.unwrap().stats;
        assert_eq!(stats.total_posts, 1);
    }

    #[tokio::test]
    async fn unmoderated_posts_are_live_immediately() {
        let (state, _dir) = signed_in_state().await;
        let event = create_event(
            &state,
            CreateEvent {
                title: "Open mic".to_string(),
                location: None,
                moderation_enabled: false,
                requires_approval: false,
                prompts: Vec::new(),
            },
        )
        .await
        .unwrap();
        join_event(&state, &event.id, JoinEventInput::default())
            .await
            .unwrap();

        let post = create_post(&state, photo_input(&event.id)).await.unwrap();
        assert!(post.is_approved);
        assert!(post.media_url.starts_with("/media/"));
        wait_for_post_count(&state, &event.id, 1).await;

        // The upload really landed in the media store.
        let file_name = post.media_url.strip_prefix("/media/").unwrap();
        assert_eq!(state.media.read(file_name).await.unwrap(), b"jpeg-bytes");
    }

    #[tokio::test]
    async fn first_post_flips_has_posted() {
        let (state, _dir) = signed_in_state().await;
        let event = moderated_event(&state).await;
        let user_id = state.require_session().unwrap().user_id;

        create_post(&state, photo_input(&event.id)).await.unwrap();

        let participant = state
            .store
            .participant_for(&event.id, &user_id)
            .await
            .unwrap()
            .unwrap();
        assert!(participant.has_posted);
    }

    #[tokio::test]
    async fn posting_requires_membership_and_known_media_type() {
        let (state, _dir) = signed_in_state().await;
        let event = create_event(
            &state,
            CreateEvent {
                title: "Gala".to_string(),
                location: None,
                moderation_enabled: false,
                requires_approval: false,
                prompts: Vec::new(),
            },
        )
        .await
        .unwrap();

        // Not joined yet.
        assert!(matches!(
            create_post(&state, photo_input(&event.id)).await,
            Err(ClientError::Validation(_))
        ));

        join_event(&state, &event.id, JoinEventInput::default())
            .await
            .unwrap();
        let mut input = photo_input(&event.id);
        input.file_name = "notes.txt".to_string();
        assert!(matches!(
            create_post(&state, input).await,
            Err(ClientError::Validation(_))
        ));
    }
}
