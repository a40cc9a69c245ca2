//! # syncin-shared
//!
//! Types shared across the SyncIn crates: identifier newtypes, the session
//! context handed to every operation that acts on behalf of a signed-in
//! user, and application-wide constants.

pub mod constants;
pub mod session;
pub mod types;

pub use session::Session;
pub use types::*;
