//! `rn-manager`: per-map road networks and road-aware path decisions.
//!
//! The public face of the road-network subsystem.  Movement and behaviour
//! code asks [`RoadNetworkManager::calculate_road_aware_path`] for a route
//! and gets back either waypoints along surveyed roads or a reason to walk
//! straight.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                     |
//! |-------------|--------------------------------------------------------------|
//! | [`manager`] | `RoadNetworkManager`, `PathDecision`, `FallbackReason`       |
//! | [`config`]  | `RoadNetworkConfig` (TOML-loadable)                          |
//! | [`stats`]   | `NetworkStats`                                               |
//! | [`error`]   | `ManagerError`, `ManagerResult<T>`                           |
//!
//! # Sharing
//!
//! Build and load a manager once at startup, then hand out a
//! [`SharedRoadNetworks`] to every consumer.  There is no global instance.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod manager;
pub mod stats;

#[cfg(test)]
mod tests;

pub use config::RoadNetworkConfig;
pub use error::{ManagerError, ManagerResult};
pub use manager::{FallbackReason, PathDecision, RoadNetworkManager, MAX_ENTRY_FRACTION, NETWORK_FILE_EXTENSION};
pub use stats::NetworkStats;

/// Read-only handle passed to query call sites after initialization.
pub type SharedRoadNetworks = Arc<RoadNetworkManager>;
