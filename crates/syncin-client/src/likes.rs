//! Optimistic like/unlike handling.
//!
//! State is two layers: the authoritative list (the last enriched snapshot
//! from the live feed) and a pending-edit overlay keyed by post id.  Each
//! overlay entry records the target like state, which is enough to invert
//! the edit precisely if the backend rejects it; a rollback restores the
//! entry's exact prior value rather than waiting for a server refresh.
//! What views render is always the composition of both layers.
//!
//! Snapshots reconcile the overlay: an entry the authoritative state
//! already reflects is cleared, the rest are re-applied on top.  A
//! snapshot racing a pending edit is therefore safe in either order.

use std::collections::HashMap;

use tokio::sync::{watch, Mutex};
use tracing::warn;

use syncin_shared::{PostId, UserId};
use syncin_store::Store;

use crate::enrich::EnrichedPost;
use crate::error::{ClientError, Result};

struct Inner {
    authoritative: Vec<EnrichedPost>,
    /// Pending optimistic edits: post id -> target like state.
    overlay: HashMap<PostId, bool>,
}

/// Per-feed controller for the viewer's like interactions.
pub struct LikeController {
    store: Store,
    viewer: Option<UserId>,
    inner: Mutex<Inner>,
    tx: watch::Sender<Vec<EnrichedPost>>,
}

impl LikeController {
    pub(crate) fn new(
        store: Store,
        viewer: Option<UserId>,
        tx: watch::Sender<Vec<EnrichedPost>>,
    ) -> Self {
        Self {
            store,
            viewer,
            inner: Mutex::new(Inner {
                authoritative: Vec::new(),
                overlay: HashMap::new(),
            }),
            tx,
        }
    }

    /// Accept a freshly enriched snapshot as the authoritative state,
    /// clear overlay entries it already reflects, and republish.
    pub(crate) async fn set_authoritative(&self, posts: Vec<EnrichedPost>) {
        let mut inner = self.inner.lock().await;

        if let Some(viewer) = &self.viewer {
            inner.overlay.retain(|post_id, target| {
                match posts.iter().find(|p| &p.id == post_id) {
                    // Keep the edit only while the snapshot disagrees.
                    Some(post) => post.likes.contains(viewer) != *target,
                    // The post left the feed; the edit has nothing to
                    // apply to.
                    None => false,
                }
            });
        }

        inner.authoritative = posts;
        self.publish(&inner);
    }

    /// Like a post.  No-op when the composed state already shows it liked.
    pub async fn like(&self, post_id: &PostId) -> Result<()> {
        self.transition(post_id, true).await
    }

    /// Unlike a post.  Mirror of [`LikeController::like`].
    pub async fn unlike(&self, post_id: &PostId) -> Result<()> {
        self.transition(post_id, false).await
    }

    async fn transition(&self, post_id: &PostId, target: bool) -> Result<()> {
        let viewer = self
            .viewer
            .clone()
            .ok_or(ClientError::Unauthenticated)?;

        // Apply the optimistic edit and publish before any backend
        // round-trip, remembering the exact prior overlay value.
        let previous = {
            let mut inner = self.inner.lock().await;
            if composed_like_state(&inner, post_id, &viewer) == target {
                return Ok(());
            }
            let previous = inner.overlay.insert(post_id.clone(), target);
            self.publish(&inner);
            previous
        };

        let outcome = if target {
            self.store.add_like(post_id, &viewer).await
        } else {
            self.store.remove_like(post_id, &viewer).await
        };

        if let Err(e) = outcome {
            warn!(post = %post_id, error = %e, "like mutation rejected, rolling back");
            let mut inner = self.inner.lock().await;
            match previous {
                Some(value) => {
                    inner.overlay.insert(post_id.clone(), value);
                }
                None => {
                    inner.overlay.remove(post_id);
                }
            }
            self.publish(&inner);
            return Err(e.into());
        }
        Ok(())
    }

    fn publish(&self, inner: &Inner) {
        self.tx
            .send_replace(compose(&inner.authoritative, &inner.overlay, self.viewer.as_ref()));
    }
}

/// Like state of one post under the composed view.
fn composed_like_state(inner: &Inner, post_id: &PostId, viewer: &UserId) -> bool {
    if let Some(target) = inner.overlay.get(post_id) {
        return *target;
    }
    inner
        .authoritative
        .iter()
        .find(|p| &p.id == post_id)
        .map(|p| p.likes.contains(viewer))
        .unwrap_or(false)
}

/// Render the authoritative list with the pending edits applied on top.
fn compose(
    authoritative: &[EnrichedPost],
    overlay: &HashMap<PostId, bool>,
    viewer: Option<&UserId>,
) -> Vec<EnrichedPost> {
    let mut posts = authoritative.to_vec();
    let Some(viewer) = viewer else {
        return posts;
    };

    for post in &mut posts {
        let Some(&target) = overlay.get(&post.id) else {
            continue;
        };
        let present = post.likes.contains(viewer);
        if target && !present {
            post.likes.push(viewer.clone());
            post.likes_count += 1;
        } else if !target && present {
            post.likes.retain(|u| u != viewer);
            post.likes_count -= 1;
        }
        post.user_has_liked = target;
    }
    posts
}
