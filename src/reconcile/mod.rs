//! Cross-run reconciliation
//!
//! Every run re-scrapes every page, so on its own each entry would look brand
//! new every time. Reconciliation carries the `retrieved` timestamp of entries
//! seen by a previous run over to the fresh data, keyed by entry id.

mod cache;
mod store;

pub use cache::SnapshotCache;
pub use store::{
    root_url_from_env, with_trailing_slash, FsSnapshotStore, HttpSnapshotStore,
    MemorySnapshotStore, SnapshotStore,
};

use crate::feed::FeedData;
use std::collections::HashMap;

/// Reconciles `fresh` with the previous snapshot of `feed_id`
///
/// Entries whose id appears in the previous snapshot keep its `retrieved`
/// timestamp; everything else keeps the fresh one. Without a previous
/// snapshot `fresh` is returned unchanged.
pub async fn reconcile(cache: &SnapshotCache, feed_id: &str, fresh: FeedData) -> FeedData {
    match cache.get(feed_id).await {
        Some(previous) => {
            tracing::info!(
                "Found previously generated feed for {}; preserving publication dates of previously-published entries",
                feed_id
            );
            carry_over_timestamps(&previous, fresh)
        }
        None => fresh,
    }
}

/// Copies `retrieved` from `previous` onto the matching entries of `fresh`
pub fn carry_over_timestamps(previous: &FeedData, mut fresh: FeedData) -> FeedData {
    let first_seen: HashMap<&str, _> = previous
        .entries
        .iter()
        .filter(|entry| !entry.id.is_empty())
        .map(|entry| (entry.id.as_str(), entry.retrieved))
        .collect();

    let mut carried = 0;
    for entry in &mut fresh.entries {
        if let Some(retrieved) = first_seen.get(entry.id.as_str()) {
            entry.retrieved = *retrieved;
            carried += 1;
        }
    }
    tracing::debug!(
        "Carried over {} of {} timestamps",
        carried,
        fresh.entries.len()
    );

    fresh
}
