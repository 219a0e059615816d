//! Published snapshot storage
//!
//! Holds exactly one immutable [`Snapshot`] behind an atomically swapped
//! pointer. Readers never block on a publish and always see one whole
//! snapshot.

use crate::models::PodRecord;
use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// One complete result of a refresh cycle
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Increases by one on every publish; zero means nothing was published
    pub generation: u64,
    pub published_at: Option<DateTime<Utc>>,
    records: Arc<Vec<PodRecord>>,
}

impl Snapshot {
    pub fn records(&self) -> &[PodRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether this snapshot came from a refresh rather than startup
    pub fn is_published(&self) -> bool {
        self.generation > 0
    }
}

/// Shared handle to the current snapshot
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    current: Arc<ArcSwap<Snapshot>>,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStore {
    /// A store holding the empty, never-published snapshot
    pub fn new() -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(Snapshot::default())),
        }
    }

    /// Replace the current snapshot with `records` in one step
    pub fn publish(&self, records: Vec<PodRecord>) -> Arc<Snapshot> {
        let records = Arc::new(records);
        let published_at = Utc::now();

        // rcu may retry the closure, so keep whichever candidate was stored last
        let mut stored = Arc::new(Snapshot::default());
        self.current.rcu(|current| {
            stored = Arc::new(Snapshot {
                generation: current.generation + 1,
                published_at: Some(published_at),
                records: records.clone(),
            });
            stored.clone()
        });
        stored
    }

    /// The latest published snapshot, or the empty one
    pub fn current(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }
}
