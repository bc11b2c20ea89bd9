use crate::feed::FeedData;
use crate::reconcile::store::SnapshotStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

/// Per-batch cache of previous snapshots
///
/// Each feed id is looked up in the store at most once per batch; misses and
/// failed lookups are cached as `None` too. Retrieval failures are logged and
/// never propagated. Lookups of different ids run independently.
pub struct SnapshotCache {
    store: Option<Box<dyn SnapshotStore>>,
    entries: Mutex<HashMap<String, Arc<Slot>>>,
}

type Slot = OnceCell<Option<Arc<FeedData>>>;

impl SnapshotCache {
    pub fn new(store: impl SnapshotStore + 'static) -> Self {
        Self {
            store: Some(Box::new(store)),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// A cache without a store: no feed has a previous snapshot
    pub fn disabled() -> Self {
        Self {
            store: None,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the previous snapshot of `feed_id`, if there is one
    pub async fn get(&self, feed_id: &str) -> Option<Arc<FeedData>> {
        let store = self.store.as_ref()?;

        let slot = {
            let mut entries = self.entries.lock().await;
            Arc::clone(entries.entry(feed_id.to_string()).or_default())
        };

        // Concurrent callers for the same id wait on the first lookup
        slot.get_or_init(|| async {
            match store.load(feed_id).await {
                Ok(snapshot) => snapshot.map(Arc::new),
                Err(e) => {
                    tracing::warn!("Encountered error fetching existing feed for {}: {}", feed_id, e);
                    None
                }
            }
        })
        .await
        .clone()
    }

    /// Number of feed ids looked up so far
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl std::fmt::Debug for SnapshotCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotCache")
            .field("enabled", &self.store.is_some())
            .finish_non_exhaustive()
    }
}
