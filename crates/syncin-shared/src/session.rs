//! Viewer session context.
//!
//! The auth service hands the application an opaque user handle after
//! sign-in.  That handle is carried through the app as an explicit
//! [`Session`] value; "not signed in" is always an explicit `Option::None`,
//! never an ambient singleton read behind the caller's back.

use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// The signed-in user's identity and global display attributes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    /// Stable user identifier issued by the auth service.
    pub user_id: UserId,
    /// Global profile display name (events may override it per participant).
    pub display_name: String,
    /// Global profile photo URL, if the user has one.
    pub photo_url: Option<String>,
}

impl Session {
    pub fn new(user_id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
            photo_url: None,
        }
    }

    pub fn with_photo(mut self, url: impl Into<String>) -> Self {
        self.photo_url = Some(url.into());
        self
    }
}
