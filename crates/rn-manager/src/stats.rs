//! Usage statistics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Snapshot returned by [`crate::RoadNetworkManager::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NetworkStats {
    pub maps_loaded:      usize,
    pub total_nodes:      usize,
    pub total_edges:      usize,
    pub road_paths_used:  u64,
    pub direct_fallbacks: u64,
}

/// Increment-only request counters, safe to bump from any query thread.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    road_paths_used:  AtomicU64,
    direct_fallbacks: AtomicU64,
}

impl Counters {
    #[inline]
    pub(crate) fn record_road_path(&self) {
        self.road_paths_used.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_fallback(&self) {
        self.direct_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn road_paths_used(&self) -> u64 {
        self.road_paths_used.load(Ordering::Relaxed)
    }

    pub(crate) fn direct_fallbacks(&self) -> u64 {
        self.direct_fallbacks.load(Ordering::Relaxed)
    }
}
