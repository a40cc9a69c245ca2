//! CRUD operations for [`Participant`] records.

use std::collections::HashMap;

use chrono::Utc;
use serde_json::json;

use syncin_shared::constants::COLLECTION_PARTICIPANTS;
use syncin_shared::{EventId, ParticipantId, UserId};

use crate::backend::{Filter, Update};
use crate::database::Store;
use crate::error::Result;
use crate::models::Participant;

/// Input for [`Store::join_event`].
#[derive(Debug, Clone)]
pub struct JoinEvent {
    pub event_id: EventId,
    pub user_id: UserId,
    pub display_name: String,
    pub photo_url: Option<String>,
    pub answers: HashMap<String, String>,
}

impl Store {
    /// Create the participant record for a (event, user) pair, or return
    /// the existing one.  The boolean is `true` when a record was created.
    pub async fn join_event(&self, join: JoinEvent) -> Result<(Participant, bool)> {
        if let Some(existing) = self
            .participant_for(&join.event_id, &join.user_id)
            .await?
        {
            return Ok((existing, false));
        }

        let participant = Participant {
            id: ParticipantId::new(),
            event_id: join.event_id,
            user_id: join.user_id,
            display_name: join.display_name,
            photo_url: join.photo_url,
            answers: join.answers,
            has_posted: false,
            is_approved: true,
            joined_at: Utc::now(),
        };
        self.insert(
            COLLECTION_PARTICIPANTS,
            &participant.id.to_string(),
            &participant,
        )
        .await?;
        Ok((participant, true))
    }

    /// Fetch the participant record a user holds within an event, if any.
    pub async fn participant_for(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<Option<Participant>> {
        let filters = [
            Filter::eq("eventId", json!(event_id)),
            Filter::eq("userId", json!(user_id)),
        ];
        let mut matches: Vec<Participant> = self
            .fetch_matching(COLLECTION_PARTICIPANTS, &filters, None)
            .await?;
        Ok(matches.pop())
    }

    /// Flip the `hasPosted` flag after the user's first post.
    pub async fn mark_has_posted(&self, participant_id: &ParticipantId) -> Result<()> {
        self.backend()
            .update(
                COLLECTION_PARTICIPANTS,
                &participant_id.to_string(),
                Update::new().set("hasPosted", true),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn join_input(event_id: EventId, user_id: UserId) -> JoinEvent {
        JoinEvent {
            event_id,
            user_id,
            display_name: "Ana".to_string(),
            photo_url: None,
            answers: HashMap::from([("p1".to_string(), "Red".to_string())]),
        }
    }

    #[tokio::test]
    async fn join_is_idempotent_per_event_and_user() {
        let store = Store::in_memory();
        let event_id = EventId::new();
        let user_id = UserId::new();

        let (first, created) = store
            .join_event(join_input(event_id.clone(), user_id.clone()))
            .await
            .unwrap();
        assert!(created);

        let (second, created_again) = store
            .join_event(join_input(event_id.clone(), user_id.clone()))
            .await
            .unwrap();
        assert!(!created_again);
        assert_eq!(first.id, second.id);

        // A different event gets its own record.
        let (_, created_elsewhere) = store
            .join_event(join_input(EventId::new(), user_id))
            .await
            .unwrap();
        assert!(created_elsewhere);
    }

    #[tokio::test]
    async fn mark_has_posted_flips_flag() {
        let store = Store::in_memory();
        let (participant, _) = store
            .join_event(join_input(EventId::new(), UserId::new()))
            .await
            .unwrap();
        assert!(!participant.has_posted);

        store.mark_has_posted(&participant.id).await.unwrap();

        let reloaded = store
            .participant_for(&participant.event_id, &participant.user_id)
            .await
            .unwrap()
            .unwrap();
        assert!(reloaded.has_posted);
    }
}
