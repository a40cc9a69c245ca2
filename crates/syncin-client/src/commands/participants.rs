//! Joining events and answering onboarding prompts.

use std::collections::HashMap;

use tracing::info;

use syncin_shared::EventId;
use syncin_store::participants::JoinEvent;
use syncin_store::{Participant, Prompt, PromptKind, StatsDelta};

use crate::error::{ClientError, Result};
use crate::events::AppEvent;
use crate::state::AppState;

/// Input for [`join_event`].
#[derive(Debug, Clone, Default)]
pub struct JoinEventInput {
    /// Event-scoped display name; defaults to the session's global name.
    pub display_name: Option<String>,
    /// Event-scoped photo; defaults to the session's global photo.
    pub photo_url: Option<String>,
    /// Prompt id -> answer.
    pub answers: HashMap<String, String>,
}

fn validate_answer(prompt: &Prompt, answer: Option<&String>) -> Result<()> {
    let answer = answer.map(|a| a.trim()).filter(|a| !a.is_empty());

    match answer {
        None if prompt.required => Err(ClientError::Validation(format!(
            "prompt '{}' requires an answer",
            prompt.question
        ))),
        Some(value)
            if prompt.kind == PromptKind::MultipleChoice
                && !prompt.options.iter().any(|o| o == value) =>
        {
            Err(ClientError::Validation(format!(
                "'{value}' is not an option of prompt '{}'",
                prompt.question
            )))
        }
        _ => Ok(()),
    }
}

/// Join an event as the signed-in user.  Joining an already-joined event
/// returns the existing participant record unchanged.
pub async fn join_event(
    state: &AppState,
    event_id: &EventId,
    input: JoinEventInput,
) -> Result<Participant> {
    let session = state.require_session()?;
    let event = state.store.event(event_id).await?;

    for prompt in &event.prompts {
        validate_answer(prompt, input.answers.get(&prompt.id))?;
    }
    // Keep only answers that belong to one of the event's prompts.
    let known: Vec<&str> = event.prompts.iter().map(|p| p.id.as_str()).collect();
    let answers: HashMap<String, String> = input
        .answers
        .into_iter()
        .filter(|(id, _)| known.contains(&id.as_str()))
        .collect();

    let (participant, newly_joined) = state
        .store
        .join_event(JoinEvent {
            event_id: event_id.clone(),
            user_id: session.user_id.clone(),
            display_name: input.display_name.unwrap_or(session.display_name),
            photo_url: input.photo_url.or(session.photo_url),
            answers,
        })
        .await?;

    if newly_joined {
        state.store.bump_stats(
            event_id.clone(),
            StatsDelta {
                participants: 1,
                ..Default::default()
            },
        );
        info!(event = %event_id, user = %participant.user_id, "joined event");
        state.emit(AppEvent::ParticipantJoined {
            event_id: event_id.clone(),
            user_id: participant.user_id.clone(),
        });
    }
    Ok(participant)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::commands::events::tests::signed_in_state;
    use crate::commands::events::{create_event, CreateEvent, PromptSpec};

    async fn event_with_prompt(state: &crate::state::AppState) -> syncin_store::Event {
        create_event(
            state,
            CreateEvent {
                title: "Launch".to_string(),
                location: None,
                moderation_enabled: false,
                requires_approval: false,
                prompts: vec![PromptSpec {
                    question: "Favourite colour?".to_string(),
                    kind: PromptKind::MultipleChoice,
                    required: true,
                    options: vec!["Red".to_string(), "Blue".to_string()],
                }],
            },
        )
        .await
        .unwrap()
    }

    async fn wait_for_participant_count(
        state: &crate::state::AppState,
        event_id: &EventId,
        expected: i64,
    ) {
        for _ in 0..50 {
            let stats = state.store.event(event_id).await.unwrap().stats;
            if stats.total_participants == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("participant count never reached {expected}");
    }

    #[tokio::test]
    async fn join_records_answers_and_bumps_participants() {
        let (state, _dir) = signed_in_state().await;
        let event = event_with_prompt(&state).await;
        let prompt_id = event.prompts[0].id.clone();

        let participant = join_event(
            &state,
            &event.id,
            JoinEventInput {
                answers: HashMap::from([(prompt_id.clone(), "Red".to_string())]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(participant.answers.get(&prompt_id).unwrap(), "Red");
        assert_eq!(participant.display_name, "Organizer");
        wait_for_participant_count(&state, &event.id, 1).await;
    }

    #[tokio::test]
    async fn rejoin_does_not_double_count() {
        let (state, _dir) = signed_in_state().await;
        let event = event_with_prompt(&state).await;
        let prompt_id = event.prompts[0].id.clone();
        let answers = HashMap::from([(prompt_id, "Blue".to_string())]);

        let first = join_event(
            &state,
            &event.id,
            JoinEventInput {
                answers: answers.clone(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        wait_for_participant_count(&state, &event.id, 1).await;

        let second = join_event(
            &state,
            &event.id,
            JoinEventInput {
                answers,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(first.id, second.id);

        // Give a hypothetical stray delta a chance to land, then confirm
        // the count is still 1.
        tokio::time::sleep(Duration::from_millis(30)).await;
        let stats = state.store.event(&event.id).await.unwrap().stats;
        assert_eq!(stats.total_participants, 1);
    }

    #[tokio::test]
    async fn required_prompt_must_be_answered() {
        let (state, _dir) = signed_in_state().await;
        let event = event_with_prompt(&state).await;

        let missing = join_event(&state, &event.id, JoinEventInput::default()).await;
        assert!(matches!(missing, Err(ClientError::Validation(_))));

        let off_menu = join_event(
            &state,
            &event.id,
            JoinEventInput {
                answers: HashMap::from([(event.prompts[0].id.clone(), "Green".to_string())]),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(off_menu, Err(ClientError::Validation(_))));
    }
}
