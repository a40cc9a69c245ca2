//! CRUD operations for [`Event`] records and the denormalized stats block.

use chrono::Utc;
use tracing::warn;

use syncin_shared::constants::COLLECTION_EVENTS;
use syncin_shared::EventId;

use crate::backend::Update;
use crate::database::Store;
use crate::error::Result;
use crate::models::{Event, EventStats, Prompt, StatsDelta};

/// Input for [`Store::create_event`].
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub location: Option<String>,
    pub moderation_enabled: bool,
    pub requires_approval: bool,
    pub prompts: Vec<Prompt>,
}

impl Store {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new event with zeroed stats.
    pub async fn create_event(&self, new: NewEvent) -> Result<Event> {
        let event = Event {
            id: EventId::new(),
            title: new.title,
            location: new.location,
            moderation_enabled: new.moderation_enabled,
            requires_approval: new.requires_approval,
            stats: EventStats::default(),
            prompts: new.prompts,
            created_at: Utc::now(),
        };
        self.insert(COLLECTION_EVENTS, &event.id.to_string(), &event)
            .await?;
        Ok(event)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single event.
    pub async fn event(&self, id: &EventId) -> Result<Event> {
        self.fetch(COLLECTION_EVENTS, &id.to_string()).await
    }

    // ------------------------------------------------------------------
    // Stats
    // ------------------------------------------------------------------

    /// Apply the non-zero parts of a delta to the event's counters as
    /// atomic increments.  An all-zero delta issues no backend call.
    pub async fn apply_stats_delta(&self, event_id: &EventId, delta: &StatsDelta) -> Result<()> {
        let mut update = Update::new();
        if delta.participants != 0 {
            update = update.increment("stats.totalParticipants", delta.participants);
        }
        if delta.posts != 0 {
            update = update.increment("stats.totalPosts", delta.posts);
        }
        if delta.likes != 0 {
            update = update.increment("stats.totalLikes", delta.likes);
        }
        if delta.comments != 0 {
            update = update.increment("stats.totalComments", delta.comments);
        }
        if update.is_empty() {
            return Ok(());
        }
        self.backend()
            .update(COLLECTION_EVENTS, &event_id.to_string(), update)
            .await
    }

    /// Fire-and-forget stats update.  The counters are best-effort
    /// approximations: a failed increment is logged and swallowed, and the
    /// triggering operation remains successful.  The counters may
    /// undercount permanently as a result.
    pub fn bump_stats(&self, event_id: EventId, delta: StatsDelta) {
        if delta.is_empty() {
            return;
        }
        let store = self.clone();
        tokio::spawn(async move {
            if let Err(e) = store.apply_stats_delta(&event_id, &delta).await {
                warn!(event = %event_id, error = %e, "stats delta failed, counters may undercount");
            }
        });
    }
}
