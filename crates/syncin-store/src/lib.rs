//! # syncin-store
//!
//! Storage boundary for the SyncIn application.
//!
//! Persistence is a hosted document database consumed through the
//! [`Backend`] trait: point reads, predicate queries, standing live
//! queries, and atomic partial updates (counter increments, array
//! add/remove).  The [`Store`] handle layers typed CRUD helpers for every
//! domain model on top of a backend, and runs every document leaving the
//! backend through a single normalization pass that repairs known
//! serialization quirks before application code sees it.

pub mod backend;
pub mod comments;
pub mod database;
pub mod events;
pub mod media;
pub mod memory;
pub mod models;
pub mod normalize;
pub mod participants;
pub mod posts;
pub mod users;

mod error;

pub use backend::{Backend, Document, Filter, SortKey, Subscription, Update, UpdateOp};
pub use database::Store;
pub use error::{Result, StoreError};
pub use media::{MediaStore, StoredMedia};
pub use memory::MemoryBackend;
pub use models::*;
