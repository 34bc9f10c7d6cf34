//! `rn-core`: foundational types for the road-network navigation crates.
//!
//! This crate is a dependency of every other `rn-*` crate.  It intentionally
//! has no `rn-*` dependencies and no required external ones (only optional
//! `serde`).
//!
//! # What lives here
//!
//! | Module  | Contents                                   |
//! |---------|--------------------------------------------|
//! | [`ids`] | `NodeId`, `EdgeId`, `MapId`                |
//! | [`geo`] | `Position` (world coordinates), distances  |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                              |
//! |---------|-----------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types. |

pub mod geo;
pub mod ids;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use geo::Position;
pub use ids::{EdgeId, MapId, NodeId};
