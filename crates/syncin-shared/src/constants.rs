/// Application name
pub const APP_NAME: &str = "SyncIn";

/// Document collection holding events
pub const COLLECTION_EVENTS: &str = "events";

/// Document collection holding per-event participant records
pub const COLLECTION_PARTICIPANTS: &str = "participants";

/// Document collection holding posts
pub const COLLECTION_POSTS: &str = "posts";

/// Document collection holding comments
pub const COLLECTION_COMMENTS: &str = "comments";

/// Document collection holding global user profiles
pub const COLLECTION_USERS: &str = "users";

/// Display name substituted when a post or comment author cannot be resolved
pub const FALLBACK_AUTHOR_NAME: &str = "Event Attendee";

/// Maximum media upload size in bytes (50 MiB)
pub const MAX_MEDIA_SIZE: usize = 50 * 1024 * 1024;

/// Capacity of the application event broadcast channel
pub const APP_EVENT_CAPACITY: usize = 64;
