//! Application state shared across all client operations.
//!
//! Holds the store and media handles, the current session, and the app
//! event channel.  The session is an explicit value: commands that act on
//! behalf of a user read it through [`AppState::require_session`] and fail
//! with [`ClientError::Unauthenticated`] when nobody is signed in.

use std::sync::RwLock;

use tokio::sync::broadcast;
use tracing::info;

use syncin_shared::constants::APP_EVENT_CAPACITY;
use syncin_shared::Session;
use syncin_store::{MediaStore, Store, UserProfile};

use crate::config::AppConfig;
use crate::error::{ClientError, Result};
use crate::events::{emit, AppEvent};

/// Central application state.
pub struct AppState {
    /// Handle to the document store.
    pub store: Store,

    /// Handle to media storage.
    pub media: MediaStore,

    /// The signed-in user, if any.
    session: RwLock<Option<Session>>,

    /// Sender half of the app event broadcast channel.
    events: broadcast::Sender<AppEvent>,
}

impl AppState {
    /// Create application state with no active session.
    pub fn new(store: Store, media: MediaStore) -> Self {
        let (events, _) = broadcast::channel(APP_EVENT_CAPACITY);
        Self {
            store,
            media,
            session: RwLock::new(None),
            events,
        }
    }

    /// Create application state from configuration, initializing the
    /// media directory it points at.
    pub async fn from_config(store: Store, config: &AppConfig) -> Result<Self> {
        let media = MediaStore::new(config.media_path.clone(), config.max_media_size).await?;
        Ok(Self::new(store, media))
    }

    /// The current session, if a user is signed in.
    pub fn session(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// The current session, or `Unauthenticated`.
    pub fn require_session(&self) -> Result<Session> {
        self.session().ok_or(ClientError::Unauthenticated)
    }

    /// Record a sign-in transition from the auth service and mirror the
    /// user's display attributes into the profile directory.
    pub async fn sign_in(&self, session: Session) -> Result<UserProfile> {
        let profile = self.store.upsert_profile(&session).await?;

        {
            let mut guard = self
                .session
                .write()
                .map_err(|_| ClientError::Internal("session lock poisoned".to_string()))?;
            *guard = Some(session.clone());
        }

        info!(user = %session.user_id, "signed in");
        emit(
            &self.events,
            AppEvent::SessionChanged {
                user_id: Some(session.user_id),
            },
        );
        Ok(profile)
    }

    /// Record a sign-out transition.
    pub fn sign_out(&self) {
        let previous = {
            let mut guard = self
                .session
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            guard.take()
        };

        if let Some(session) = previous {
            info!(user = %session.user_id, "signed out");
            emit(&self.events, AppEvent::SessionChanged { user_id: None });
        }
    }

    /// Subscribe to application events.
    pub fn subscribe_events(&self) -> broadcast::Receiver<AppEvent> {
        self.events.subscribe()
    }

    pub(crate) fn emit(&self, event: AppEvent) {
        emit(&self.events, event);
    }
}
