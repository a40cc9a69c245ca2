//! Application command functions.
//!
//! Each sub-module groups related operations by domain.  Every function
//! takes the shared [`crate::state::AppState`] and reads the viewer from
//! its explicit session; none of them touch ambient globals.

pub mod comments;
pub mod events;
pub mod participants;
pub mod posts;
