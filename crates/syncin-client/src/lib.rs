//! # syncin-client
//!
//! Application layer of SyncIn: app state and session handling, the post
//! enrichment step, the per-event live feed, optimistic like handling, and
//! the command functions the view layer calls.

pub mod commands;
pub mod config;
pub mod enrich;
pub mod events;
pub mod feed;
pub mod likes;
pub mod state;

mod error;

use tracing_subscriber::{fmt, EnvFilter};

pub use config::AppConfig;
pub use enrich::{enrich_post, enrich_posts, EnrichedComment, EnrichedPost};
pub use error::{ClientError, Result};
pub use events::AppEvent;
pub use feed::LiveFeed;
pub use likes::LikeController;
pub use state::AppState;

/// Initialize logging for an application embedding this crate.
///
/// Honors `RUST_LOG` when set.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("syncin_client=debug,syncin_store=info,warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    tracing::info!("SyncIn client logging initialized");
}
