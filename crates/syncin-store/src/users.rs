//! Global user profile records mirrored from the auth directory.

use chrono::Utc;
use serde_json::json;

use syncin_shared::constants::COLLECTION_USERS;
use syncin_shared::{Session, UserId};

use crate::backend::Update;
use crate::database::Store;
use crate::error::{Result, StoreError};
use crate::models::UserProfile;

impl Store {
    /// Create or refresh the profile document for a signed-in session.
    pub async fn upsert_profile(&self, session: &Session) -> Result<UserProfile> {
        let id = session.user_id.to_string();

        if self.try_fetch::<UserProfile>(COLLECTION_USERS, &id).await?.is_some() {
            self.backend()
                .update(
                    COLLECTION_USERS,
                    &id,
                    Update::new()
                        .set("displayName", session.display_name.clone())
                        .set("photoUrl", json!(session.photo_url)),
                )
                .await?;
            return self.fetch(COLLECTION_USERS, &id).await;
        }

        let profile = UserProfile {
            id: session.user_id.clone(),
            display_name: session.display_name.clone(),
            photo_url: session.photo_url.clone(),
            created_at: Utc::now(),
        };
        match self.insert(COLLECTION_USERS, &id, &profile).await {
            Ok(()) => Ok(profile),
            // Lost a race with a concurrent sign-in; the other write wins.
            Err(StoreError::AlreadyExists(_)) => self.fetch(COLLECTION_USERS, &id).await,
            Err(e) => Err(e),
        }
    }

    /// Fetch a user's global profile, if one exists.
    pub async fn profile(&self, user_id: &UserId) -> Result<Option<UserProfile>> {
        self.try_fetch(COLLECTION_USERS, &user_id.to_string()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upsert_creates_then_refreshes() {
        let store = Store::in_memory();
        let user_id = UserId::new();

        let session = Session::new(user_id.clone(), "Ana");
        let created = store.upsert_profile(&session).await.unwrap();
        assert_eq!(created.display_name, "Ana");
        assert_eq!(created.photo_url, None);

        let renamed = Session::new(user_id.clone(), "Ana B.").with_photo("/media/ana.jpg");
        store.upsert_profile(&renamed).await.unwrap();

        let profile = store.profile(&user_id).await.unwrap().unwrap();
        assert_eq!(profile.display_name, "Ana B.");
        assert_eq!(profile.photo_url.as_deref(), Some("/media/ana.jpg"));
        // Creation time survives the refresh.
        assert_eq!(profile.created_at, created.created_at);
    }

    #[tokio::test]
    async fn missing_profile_is_none() {
        let store = Store::in_memory();
        assert!(store.profile(&UserId::new()).await.unwrap().is_none());
    }
}
