//! Per-map network registry and the road-vs-direct decision layer.
//!
//! # Lifecycle
//!
//! ```text
//! new(config) ─► set_*(…) ─► initialize(dir) ─► Arc::new(manager) ─► queries…
//!                                                           shutdown() ◄─┘ (needs &mut)
//! ```
//!
//! Everything that mutates takes `&mut self` and happens before the manager
//! is shared.  Queries take `&self`; the only state they touch is the pair of
//! atomic request counters behind [`NetworkStats`].

use std::fmt;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use rn_core::{MapId, NodeId, Position};
use rn_spatial::{
    load_network_file, AStarPathfinder, NetworkData, Pathfinder, SpatialError, SpatialIndex,
    SpatialResult,
};

use crate::config::RoadNetworkConfig;
use crate::stats::{Counters, NetworkStats};

/// Extension of per-map network files: `<map id>.rnet`.
pub const NETWORK_FILE_EXTENSION: &str = "rnet";

/// Walking onto and off the road may use at most this share of the
/// straight-line distance.
pub const MAX_ENTRY_FRACTION: f32 = 0.8;

// ── Decision types ────────────────────────────────────────────────────────────

/// Why a request fell back to direct movement.  Listed in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FallbackReason {
    /// Road routing is switched off.
    Disabled,
    /// No network is loaded for the map.
    NoNetwork,
    /// Straight-line distance is below `min_distance`.
    TooShort,
    /// No road node within `max_entry_distance` of the start or the end.
    NoNearbyRoad,
    /// Start and end snap to the same road node.
    SameRoadNode,
    /// Getting on and off the road costs more than 80 % of the trip.
    EntryTooFar,
    /// The pathfinder found no route (or hit its expansion cap).
    NoRoute,
    /// Road trip exceeds `max_detour_ratio` × straight-line distance.
    DetourTooLong,
    /// The route expanded to zero waypoints.
    NoWaypoints,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disabled      => "road routing disabled",
            Self::NoNetwork     => "no road network for map",
            Self::TooShort      => "trip shorter than minimum distance",
            Self::NoNearbyRoad  => "no road node within entry distance",
            Self::SameRoadNode  => "start and end share a road node",
            Self::EntryTooFar   => "road entry distance too large",
            Self::NoRoute       => "no road route",
            Self::DetourTooLong => "road detour too long",
            Self::NoWaypoints   => "route expanded to no waypoints",
        };
        f.write_str(s)
    }
}

/// Outcome of [`RoadNetworkManager::calculate_road_aware_path`].
#[derive(Debug, Clone, PartialEq)]
pub enum PathDecision {
    /// Follow these waypoints, road node to road node.  Never empty.
    Road(Vec<Position>),
    /// Move straight to the destination instead.
    Direct(FallbackReason),
}

impl PathDecision {
    pub fn is_road(&self) -> bool {
        matches!(self, Self::Road(_))
    }

    pub fn waypoints(&self) -> Option<&[Position]> {
        match self {
            Self::Road(w) => Some(w.as_slice()),
            Self::Direct(_) => None,
        }
    }

    pub fn fallback_reason(&self) -> Option<FallbackReason> {
        match self {
            Self::Road(_) => None,
            Self::Direct(r) => Some(*r),
        }
    }
}

// ── RoadNetworkManager ────────────────────────────────────────────────────────

struct MapEntry {
    network: NetworkData,
    index:   SpatialIndex,
}

/// Owns every loaded map's graph and spatial index and decides, per request,
/// whether a road route beats walking straight.
///
/// # Type parameter
///
/// `P` is the search strategy, [`AStarPathfinder`] unless replaced with
/// [`with_pathfinder`](Self::with_pathfinder).
///
/// # Thread safety
///
/// `RoadNetworkManager` is `Sync`.  Share it behind an `Arc` once loading is
/// done; all query methods take `&self` and never block.
pub struct RoadNetworkManager<P: Pathfinder = AStarPathfinder> {
    config:      RoadNetworkConfig,
    pathfinder:  P,
    maps:        FxHashMap<MapId, MapEntry>,
    counters:    Counters,
    initialized: bool,
}

impl RoadNetworkManager {
    /// Create an empty manager using A* capped at `config.max_expansions`.
    pub fn new(config: RoadNetworkConfig) -> Self {
        let pathfinder = AStarPathfinder::new(config.max_expansions);
        Self::with_pathfinder(config, pathfinder)
    }
}

impl Default for RoadNetworkManager {
    fn default() -> Self {
        Self::new(RoadNetworkConfig::default())
    }
}

impl<P: Pathfinder> RoadNetworkManager<P> {
    pub fn with_pathfinder(config: RoadNetworkConfig, pathfinder: P) -> Self {
        Self {
            config,
            pathfinder,
            maps: FxHashMap::default(),
            counters: Counters::default(),
            initialized: false,
        }
    }

    // ── Configuration ─────────────────────────────────────────────────────

    pub fn config(&self) -> &RoadNetworkConfig {
        &self.config
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
    }

    pub fn set_min_distance(&mut self, distance: f32) {
        self.config.min_distance = distance;
    }

    pub fn set_max_detour_ratio(&mut self, ratio: f32) {
        self.config.max_detour_ratio = ratio;
    }

    pub fn set_max_entry_distance(&mut self, distance: f32) {
        self.config.max_entry_distance = distance;
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Load every `<map id>.rnet` file in `dir` and index it.
    ///
    /// A file that fails to load is logged and skipped; it never prevents
    /// other maps from loading.  Returns the number of maps available
    /// afterwards.  Calling this again before [`shutdown`](Self::shutdown)
    /// only logs a warning.
    pub fn initialize(&mut self, dir: &Path) -> usize {
        if self.initialized {
            log::warn!("road networks already initialized; ignoring {}", dir.display());
            return self.maps.len();
        }
        self.initialized = true;

        let mut files: Vec<(MapId, PathBuf)> = match std::fs::read_dir(dir) {
            Ok(entries) => entries
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter_map(|path| parse_map_file_name(&path).map(|id| (id, path)))
                .collect(),
            Err(e) => {
                log::error!("cannot read road network directory {}: {e}", dir.display());
                return self.maps.len();
            }
        };
        files.sort_unstable_by_key(|(id, _)| *id);

        for (map_id, path) in files {
            if let Err(e) = self.load_map_file(map_id, &path) {
                log::warn!("{map_id}: failed to load road network {}: {e}", path.display());
            }
        }

        let stats = self.stats();
        log::info!(
            "road networks initialized from {}: {} maps, {} nodes, {} edges",
            dir.display(),
            stats.maps_loaded,
            stats.total_nodes,
            stats.total_edges
        );
        stats.maps_loaded
    }

    /// Load one network file and register it under `map_id`.
    ///
    /// The file name is authoritative: a header carrying a different map id
    /// is logged and re-keyed.
    pub fn load_map_file(&mut self, map_id: MapId, path: &Path) -> SpatialResult<()> {
        let mut network = load_network_file(path)?;
        if network.map_id() != map_id {
            log::warn!(
                "{}: header says {}, using id from file name",
                path.display(),
                network.map_id()
            );
            network = network.with_map_id(map_id);
        }
        self.register_network(network)
    }

    /// Add an already-built network and index it, replacing any network
    /// previously registered for the same map.
    pub fn register_network(&mut self, network: NetworkData) -> SpatialResult<()> {
        if !network.is_valid() {
            return Err(SpatialError::EmptyNetwork);
        }
        let map_id = network.map_id();
        let index = SpatialIndex::from_network(&network);
        log::info!(
            "{map_id}: road network loaded ({} nodes, {} edges, {} shape points)",
            network.node_count(),
            network.edge_count(),
            network.shape_point_count()
        );
        if self.maps.insert(map_id, MapEntry { network, index }).is_some() {
            log::warn!("{map_id}: replaced previously loaded road network");
        }
        Ok(())
    }

    /// Drop every map and reset counters.  `initialize` may be called again.
    pub fn shutdown(&mut self) {
        for entry in self.maps.values_mut() {
            entry.index.clear();
        }
        self.maps.clear();
        self.counters = Counters::default();
        self.initialized = false;
        log::info!("road networks shut down");
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// `true` iff road routing is enabled and `map_id` has a loaded network.
    pub fn has_road_network(&self, map_id: MapId) -> bool {
        self.config.enabled && self.maps.contains_key(&map_id)
    }

    pub fn network(&self, map_id: MapId) -> Option<&NetworkData> {
        self.maps.get(&map_id).map(|e| &e.network)
    }

    /// Ids of every loaded map, ascending.
    pub fn map_ids(&self) -> Vec<MapId> {
        let mut ids: Vec<MapId> = self.maps.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Nearest road node to `(x, y)` within `max_range`.
    pub fn find_nearest_road_node(&self, map_id: MapId, x: f32, y: f32, max_range: f32) -> Option<NodeId> {
        let entry = self.maps.get(&map_id)?;
        entry.index.find_nearest_node(&entry.network, x, y, max_range)
    }

    pub fn road_node_position(&self, map_id: MapId, node: NodeId) -> Option<Position> {
        self.maps.get(&map_id)?.network.node_position(node)
    }

    pub fn stats(&self) -> NetworkStats {
        NetworkStats {
            maps_loaded:      self.maps.len(),
            total_nodes:      self.maps.values().map(|e| e.network.node_count()).sum(),
            total_edges:      self.maps.values().map(|e| e.network.edge_count()).sum(),
            road_paths_used:  self.counters.road_paths_used(),
            direct_fallbacks: self.counters.direct_fallbacks(),
        }
    }

    /// Decide between a road route and direct movement from `start` to `end`.
    ///
    /// Checks run in a fixed order and the first failure wins; see
    /// [`FallbackReason`].  Every `Direct` result bumps `direct_fallbacks`,
    /// every `Road` result bumps `road_paths_used`.
    pub fn calculate_road_aware_path(&self, map_id: MapId, start: Position, end: Position) -> PathDecision {
        match self.road_waypoints(map_id, start, end) {
            Ok(waypoints) => {
                self.counters.record_road_path();
                PathDecision::Road(waypoints)
            }
            Err(reason) => {
                self.counters.record_fallback();
                log::trace!("{map_id}: direct path {start} → {end}: {reason}");
                PathDecision::Direct(reason)
            }
        }
    }

    /// Out-parameter form of [`calculate_road_aware_path`](Self::calculate_road_aware_path).
    ///
    /// Returns `true` and fills `out` (after clearing it) when a road route
    /// should be used; returns `false` and leaves `out` empty otherwise.
    pub fn calculate_road_aware_path_into(
        &self,
        map_id: MapId,
        start: Position,
        end: Position,
        out: &mut Vec<Position>,
    ) -> bool {
        out.clear();
        match self.calculate_road_aware_path(map_id, start, end) {
            PathDecision::Road(waypoints) => {
                out.extend(waypoints);
                true
            }
            PathDecision::Direct(_) => false,
        }
    }

    fn road_waypoints(&self, map_id: MapId, start: Position, end: Position) -> Result<Vec<Position>, FallbackReason> {
        let cfg = &self.config;
        if !cfg.enabled {
            return Err(FallbackReason::Disabled);
        }
        let entry = self.maps.get(&map_id).ok_or(FallbackReason::NoNetwork)?;
        let network = &entry.network;

        let direct = start.distance_2d(end);
        if direct < cfg.min_distance {
            return Err(FallbackReason::TooShort);
        }

        let snap = |p: Position| {
            entry
                .index
                .find_nearest_node(network, p.x, p.y, cfg.max_entry_distance)
                .ok_or(FallbackReason::NoNearbyRoad)
        };
        let start_node = snap(start)?;
        let end_node = snap(end)?;
        if start_node == end_node {
            return Err(FallbackReason::SameRoadNode);
        }

        let on_ramp = start.distance_2d(network.nodes()[start_node.index()].pos);
        let off_ramp = end.distance_2d(network.nodes()[end_node.index()].pos);
        let entry_distance = on_ramp + off_ramp;
        if entry_distance > direct * MAX_ENTRY_FRACTION {
            return Err(FallbackReason::EntryTooFar);
        }

        let path = self
            .pathfinder
            .find_path(network, start_node, end_node)
            .map_err(|_| FallbackReason::NoRoute)?;

        if path.cost + entry_distance > direct * cfg.max_detour_ratio {
            return Err(FallbackReason::DetourTooLong);
        }

        let waypoints = path.waypoints(network);
        if waypoints.is_empty() {
            return Err(FallbackReason::NoWaypoints);
        }
        Ok(waypoints)
    }
}

/// `Some(id)` for a path named `<u32>.rnet`.
fn parse_map_file_name(path: &Path) -> Option<MapId> {
    if path.extension()? != NETWORK_FILE_EXTENSION {
        return None;
    }
    path.file_stem()?.to_str()?.parse::<u32>().ok().map(MapId)
}
