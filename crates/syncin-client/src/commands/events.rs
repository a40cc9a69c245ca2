//! Event creation and lookup.

use tracing::info;
use uuid::Uuid;

use syncin_shared::EventId;
use syncin_store::events::NewEvent;
use syncin_store::{Event, Prompt, PromptKind};

use crate::error::{ClientError, Result};
use crate::events::AppEvent;
use crate::state::AppState;

/// An onboarding prompt as specified by the organizer; the stored prompt
/// id is generated here.
#[derive(Debug, Clone)]
pub struct PromptSpec {
    pub question: String,
    pub kind: PromptKind,
    pub required: bool,
    pub options: Vec<String>,
}

/// Input for [`create_event`].
#[derive(Debug, Clone)]
pub struct CreateEvent {
    pub title: String,
    pub location: Option<String>,
    pub moderation_enabled: bool,
    pub requires_approval: bool,
    pub prompts: Vec<PromptSpec>,
}

/// Create a new event owned by the signed-in organizer.
pub async fn create_event(state: &AppState, input: CreateEvent) -> Result<Event> {
    let session = state.require_session()?;

    if input.title.trim().is_empty() {
        return Err(ClientError::Validation("event title is required".to_string()));
    }

    let mut prompts = Vec::with_capacity(input.prompts.len());
    for spec in input.prompts {
        if spec.question.trim().is_empty() {
            return Err(ClientError::Validation(
                "prompt question is required".to_string(),
            ));
        }

        let options: Vec<String> = spec
            .options
            .into_iter()
            .filter(|o| !o.trim().is_empty())
            .collect();
        match spec.kind {
            PromptKind::MultipleChoice if options.len() < 2 => {
                return Err(ClientError::Validation(format!(
                    "prompt '{}' needs at least two options",
                    spec.question
                )));
            }
            PromptKind::Text if !options.is_empty() => {
                return Err(ClientError::Validation(format!(
                    "prompt '{}' is free-text and cannot carry options",
                    spec.question
                )));
            }
            _ => {}
        }

        prompts.push(Prompt {
            id: Uuid::new_v4().to_string(),
            question: spec.question,
            kind: spec.kind,
            required: spec.required,
            options,
        });
    }

    let event = state
        .store
        .create_event(NewEvent {
            title: input.title,
            location: input.location,
            moderation_enabled: input.moderation_enabled,
            requires_approval: input.requires_approval,
            prompts,
        })
        .await?;

    info!(event = %event.id, organizer = %session.user_id, "event created");
    state.emit(AppEvent::EventCreated {
        event_id: event.id.clone(),
    });
    Ok(event)
}

/// Fetch an event, e.g. after scanning its QR code.
pub async fn get_event(state: &AppState, event_id: &EventId) -> Result<Event> {
    Ok(state.store.event(event_id).await?)
}
