//! `rn-spatial`: road network graph, file codec, spatial index, pathfinding.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                  |
//! |----------------|-----------------------------------------------------------|
//! | [`network`]    | `NetworkData` (CSR graph), `NetworkBuilder`, `NodeFlags`  |
//! | [`codec`]      | `RNET` binary file decode/encode                          |
//! | [`grid`]       | `SpatialIndex` (uniform grid, ring search)                |
//! | [`pathfinder`] | `Pathfinder` trait, `Path`, `AStarPathfinder`, waypoints  |
//! | [`error`]      | `SpatialError`, `SpatialResult<T>`                        |
//!
//! Everything here is synchronous and, once built, read-only: a
//! `NetworkData` and its `SpatialIndex` can be queried from any number of
//! threads without locking.
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                  |
//! |---------|---------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on `rn-core` types.   |

pub mod codec;
pub mod error;
pub mod grid;
pub mod network;
pub mod pathfinder;


pub use codec::{decode_network, encode_network, load_network_file, save_network_file};
pub use error::{SpatialError, SpatialResult};
pub use grid::SpatialIndex;
pub use network::{Edge, NetworkBuilder, NetworkData, Node, NodeFlags};
pub use pathfinder::{expand_path_to_waypoints, AStarPathfinder, Path, Pathfinder};
