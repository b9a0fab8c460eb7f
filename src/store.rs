//! Snapshot store
//!
//! Single-writer (the collector), multi-reader (metrics scrape, digest
//! scheduler) slot holding the latest published snapshot. Publication
//! is an atomic `Arc` swap, so `current()` is wait-free and readers can
//! never observe a torn or mid-update snapshot.

use crate::collector::snapshot::Snapshot;
use arc_swap::ArcSwapOption;
use std::sync::Arc;

/// What a reader sees when asking for the latest snapshot
#[derive(Debug, Clone)]
pub enum Current {
    /// A complete snapshot backed by at least one successful primary fetch
    Ready(Arc<Snapshot>),
    /// No primary-backed snapshot has been published yet
    NotReady,
}

impl Current {
    pub fn is_ready(&self) -> bool {
        matches!(self, Current::Ready(_))
    }
}

/// Thread-safe holder for the latest snapshot
#[derive(Default)]
pub struct SnapshotStore {
    latest: ArcSwapOption<Snapshot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self {
            latest: ArcSwapOption::empty(),
        }
    }

    /// Atomically replace the published snapshot.
    ///
    /// The previous snapshot is dropped once its last reader releases
    /// it; no history is retained.
    pub fn publish(&self, snapshot: Snapshot) {
        self.latest.store(Some(Arc::new(snapshot)));
    }

    /// Latest complete snapshot, or NotReady before the first
    /// primary-backed publish. Never blocks.
    pub fn current(&self) -> Current {
        match self.latest.load_full() {
            Some(snapshot) if snapshot.ready => Current::Ready(snapshot),
            _ => Current::NotReady,
        }
    }
}
