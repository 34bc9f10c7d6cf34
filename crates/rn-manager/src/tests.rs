//! Unit tests for rn-manager.

#[cfg(test)]
mod helpers {
    use rn_core::{MapId, NodeId, Position};
    use rn_spatial::{NetworkBuilder, NetworkData, NodeFlags};

    use crate::{RoadNetworkConfig, RoadNetworkManager};

    pub fn p(x: f32, y: f32) -> Position {
        Position::new(x, y, 0.0)
    }

    /// Straight east-west road: 11 nodes at x = 0, 100, …, 1000 on y = 0.
    pub fn straight_road(map: u32) -> NetworkData {
        let mut b = NetworkBuilder::new();
        let ids: Vec<NodeId> = (0..=10)
            .map(|i| b.add_node(p(i as f32 * 100.0, 0.0), NodeFlags::empty()))
            .collect();
        for w in ids.windows(2) {
            b.add_road(w[0], w[1], []);
        }
        b.build(MapId(map))
    }

    /// U-shaped road from A (0,0) up to (0,250), across to (500,250) and down
    /// to D (500,0).  Road cost A→D is just over 1000, about twice the straight line.
    pub fn u_road(map: u32) -> NetworkData {
        let mut b = NetworkBuilder::new();
        let a = b.add_node(p(0.0, 0.0), NodeFlags::ENDPOINT);
        let up = b.add_node(p(0.0, 250.0), NodeFlags::empty());
        let across = b.add_node(p(500.0, 250.0), NodeFlags::empty());
        let d = b.add_node(p(500.0, 0.0), NodeFlags::ENDPOINT);
        b.add_road(a, up, []);
        b.add_road(up, across, [p(250.0, 260.0)]);
        b.add_road(across, d, []);
        b.build(MapId(map))
    }

    /// Two unconnected road stubs far apart.
    pub fn split_road(map: u32) -> NetworkData {
        let mut b = NetworkBuilder::new();
        let a = b.add_node(p(0.0, 0.0), NodeFlags::ENDPOINT);
        let c = b.add_node(p(100.0, 0.0), NodeFlags::ENDPOINT);
        let e = b.add_node(p(1000.0, 0.0), NodeFlags::ENDPOINT);
        let g = b.add_node(p(1100.0, 0.0), NodeFlags::ENDPOINT);
        b.add_road(a, c, []);
        b.add_road(e, g, []);
        b.build(MapId(map))
    }

    /// Manager with default config and the three test maps (1, 2, 3).
    pub fn manager() -> RoadNetworkManager {
        let mut m = RoadNetworkManager::new(RoadNetworkConfig::default());
        m.register_network(straight_road(1)).unwrap();
        m.register_network(u_road(2)).unwrap();
        m.register_network(split_road(3)).unwrap();
        m
    }
}

// ── Configuration ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod config {
    use crate::{ManagerError, RoadNetworkConfig};

    #[test]
    fn defaults() {
        let c = RoadNetworkConfig::default();
        assert!(c.enabled);
        assert_eq!(c.min_distance, 200.0);
        assert_eq!(c.max_detour_ratio, 1.5);
        assert_eq!(c.max_entry_distance, 150.0);
        assert_eq!(c.max_expansions, 20_000);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = RoadNetworkConfig::from_toml_str("max_detour_ratio = 2.0\nenabled = false\n").unwrap();
        assert!(!c.enabled);
        assert_eq!(c.max_detour_ratio, 2.0);
        assert_eq!(c.min_distance, 200.0);
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(RoadNetworkConfig::from_toml_str("").unwrap(), RoadNetworkConfig::default());
    }

    #[test]
    fn invalid_values_rejected() {
        for text in [
            "max_detour_ratio = 0.0",
            "min_distance = -5.0",
            "max_entry_distance = -1.0",
            "max_expansions = 0",
        ] {
            assert!(
                matches!(RoadNetworkConfig::from_toml_str(text), Err(ManagerError::Config(_))),
                "{text}"
            );
        }
    }

    #[test]
    fn malformed_toml_rejected() {
        assert!(matches!(
            RoadNetworkConfig::from_toml_str("min_distance = \"far\""),
            Err(ManagerError::Toml(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("roads.toml");
        std::fs::write(&path, "min_distance = 50.0\nmax_expansions = 500\n").unwrap();
        let c = RoadNetworkConfig::load(&path).unwrap();
        assert_eq!(c.min_distance, 50.0);
        assert_eq!(c.max_expansions, 500);

        let missing = RoadNetworkConfig::load(&dir.path().join("absent.toml"));
        assert!(matches!(missing, Err(ManagerError::Io(_))));
    }
}

// ── Road-vs-direct decisions ──────────────────────────────────────────────────

#[cfg(test)]
mod decisions {
    use rn_core::{MapId, NodeId};
    use rn_spatial::{NetworkData, Path, Pathfinder, SpatialResult};

    use crate::{FallbackReason, PathDecision, RoadNetworkConfig, RoadNetworkManager};
    use super::helpers::{manager, p, straight_road};

    fn reason(d: PathDecision) -> FallbackReason {
        d.fallback_reason().expect("expected a direct fallback")
    }

    #[test]
    fn road_used_along_straight_road() {
        let m = manager();
        let d = m.calculate_road_aware_path(MapId(1), p(0.0, 20.0), p(1000.0, 20.0));
        let wps = d.waypoints().expect("road path");
        assert_eq!(wps.len(), 11);
        assert_eq!(wps[0], p(0.0, 0.0));
        assert_eq!(wps[10], p(1000.0, 0.0));
        assert!(d.is_road());
    }

    #[test]
    fn disabled_falls_back() {
        let mut m = manager();
        m.set_enabled(false);
        assert!(!m.has_road_network(MapId(1)));
        let d = m.calculate_road_aware_path(MapId(1), p(0.0, 0.0), p(1000.0, 0.0));
        assert_eq!(reason(d), FallbackReason::Disabled);
    }

    #[test]
    fn unknown_map_falls_back() {
        let m = manager();
        assert!(!m.has_road_network(MapId(99)));
        let d = m.calculate_road_aware_path(MapId(99), p(0.0, 0.0), p(1000.0, 0.0));
        assert_eq!(reason(d), FallbackReason::NoNetwork);
    }

    #[test]
    fn short_trip_falls_back() {
        let mut m = manager();
        m.set_min_distance(200.0);
        let d = m.calculate_road_aware_path(MapId(1), p(0.0, 10.0), p(50.0, 10.0));
        assert_eq!(reason(d), FallbackReason::TooShort);

        m.set_min_distance(40.0);
        let d = m.calculate_road_aware_path(MapId(1), p(0.0, 10.0), p(50.0, 10.0));
        assert_ne!(d.fallback_reason(), Some(FallbackReason::TooShort));
    }

    #[test]
    fn far_from_road_falls_back() {
        let m = manager();
        let d = m.calculate_road_aware_path(MapId(1), p(500.0, 400.0), p(900.0, 400.0));
        assert_eq!(reason(d), FallbackReason::NoNearbyRoad);
        // Only the end is off-road.
        let d = m.calculate_road_aware_path(MapId(1), p(0.0, 0.0), p(900.0, 400.0));
        assert_eq!(reason(d), FallbackReason::NoNearbyRoad);
    }

    #[test]
    fn same_road_node_falls_back() {
        let m = manager();
        let d = m.calculate_road_aware_path(MapId(1), p(490.0, 100.0), p(510.0, -100.0));
        assert_eq!(reason(d), FallbackReason::SameRoadNode);
    }

    #[test]
    fn long_entry_falls_back() {
        let m = manager();
        // Direct 300; 140 on + 140 off = 280 > 0.8 × 300.
        let d = m.calculate_road_aware_path(MapId(1), p(0.0, 140.0), p(300.0, 140.0));
        assert_eq!(reason(d), FallbackReason::EntryTooFar);
    }

    #[test]
    fn disconnected_roads_fall_back() {
        let m = manager();
        let d = m.calculate_road_aware_path(MapId(3), p(0.0, 0.0), p(1100.0, 0.0));
        assert_eq!(reason(d), FallbackReason::NoRoute);
    }

    #[test]
    fn detour_ratio_enforced() {
        let mut m = manager();
        // U road: road trip ~1000.4 vs direct 500, ratio ~2.0.
        m.set_max_detour_ratio(1.5);
        let d = m.calculate_road_aware_path(MapId(2), p(0.0, 0.0), p(500.0, 0.0));
        assert_eq!(reason(d), FallbackReason::DetourTooLong);

        m.set_max_detour_ratio(2.5);
        let d = m.calculate_road_aware_path(MapId(2), p(0.0, 0.0), p(500.0, 0.0));
        let wps = d.waypoints().expect("road path");
        // 4 nodes + 1 shape point on the top edge.
        assert_eq!(wps.len(), 5);
        assert_eq!(wps[2], p(250.0, 260.0));
    }

    #[test]
    fn expansion_cap_falls_back() {
        let mut config = RoadNetworkConfig::default();
        config.max_expansions = 3;
        let mut m = RoadNetworkManager::new(config);
        m.register_network(straight_road(1)).unwrap();
        let d = m.calculate_road_aware_path(MapId(1), p(0.0, 0.0), p(1000.0, 0.0));
        assert_eq!(reason(d), FallbackReason::NoRoute);
    }

    /// Claims every pair of nodes is directly connected.
    struct Teleporter;

    impl Pathfinder for Teleporter {
        fn find_path(&self, _: &NetworkData, start: NodeId, end: NodeId) -> SpatialResult<Path> {
            Ok(Path { nodes: vec![start, end], cost: 0.0 })
        }
    }

    #[test]
    fn unexpandable_path_falls_back() {
        let mut m = RoadNetworkManager::with_pathfinder(RoadNetworkConfig::default(), Teleporter);
        m.register_network(straight_road(1)).unwrap();
        let d = m.calculate_road_aware_path(MapId(1), p(0.0, 0.0), p(1000.0, 0.0));
        assert_eq!(reason(d), FallbackReason::NoWaypoints);
    }

    #[test]
    fn counters_track_outcomes() {
        let m = manager();
        m.calculate_road_aware_path(MapId(1), p(0.0, 0.0), p(1000.0, 0.0));
        m.calculate_road_aware_path(MapId(1), p(0.0, 0.0), p(10.0, 0.0));
        m.calculate_road_aware_path(MapId(99), p(0.0, 0.0), p(1000.0, 0.0));
        let s = m.stats();
        assert_eq!(s.road_paths_used, 1);
        assert_eq!(s.direct_fallbacks, 2);
    }

    #[test]
    fn out_parameter_form() {
        let m = manager();
        let mut out = vec![p(9.0, 9.0)];
        assert!(m.calculate_road_aware_path_into(MapId(1), p(0.0, 0.0), p(1000.0, 0.0), &mut out));
        assert_eq!(out.len(), 11);
        assert!(!m.calculate_road_aware_path_into(MapId(1), p(0.0, 0.0), p(10.0, 0.0), &mut out));
        assert!(out.is_empty());
    }

    #[test]
    fn reasons_display() {
        assert_eq!(FallbackReason::DetourTooLong.to_string(), "road detour too long");
    }
}

// ── Pass-through queries ──────────────────────────────────────────────────────

#[cfg(test)]
mod queries {
    use rn_core::{MapId, NodeId};

    use super::helpers::{manager, p};

    #[test]
    fn nearest_node_and_position() {
        let m = manager();
        let n = m.find_nearest_road_node(MapId(1), 310.0, 20.0, 50.0).unwrap();
        assert_eq!(n, NodeId(3));
        assert_eq!(m.road_node_position(MapId(1), n), Some(p(300.0, 0.0)));

        assert_eq!(m.find_nearest_road_node(MapId(1), 350.0, 300.0, 50.0), None);
        assert_eq!(m.find_nearest_road_node(MapId(42), 0.0, 0.0, 1e4), None);
        assert_eq!(m.road_node_position(MapId(1), NodeId(11)), None);
        assert_eq!(m.road_node_position(MapId(42), NodeId(0)), None);
    }

    #[test]
    fn stats_sum_over_maps() {
        let m = manager();
        let s = m.stats();
        assert_eq!(s.maps_loaded, 3);
        assert_eq!(s.total_nodes, 11 + 4 + 4);
        assert_eq!(s.total_edges, 10 + 3 + 2);
        assert_eq!(m.network(MapId(2)).unwrap().node_count(), 4);
        assert_eq!(m.map_ids(), vec![MapId(1), MapId(2), MapId(3)]);
    }
}

// ── Loading & lifecycle ───────────────────────────────────────────────────────

#[cfg(test)]
mod lifecycle {
    use std::path::Path;

    use rn_core::MapId;
    use rn_spatial::{encode_network, save_network_file, NetworkBuilder, SpatialError};

    use crate::{RoadNetworkConfig, RoadNetworkManager};
    use super::helpers::{p, split_road, straight_road, u_road};

    fn write_maps(dir: &Path) {
        save_network_file(&straight_road(1), &dir.join("1.rnet")).unwrap();
        save_network_file(&u_road(3), &dir.join("3.rnet")).unwrap();

        // Map 2: corrupted magic.
        let mut bytes = encode_network(&split_road(2)).unwrap();
        bytes[0..4].copy_from_slice(b"JUNK");
        std::fs::write(dir.join("2.rnet"), bytes).unwrap();

        // Map 4: truncated inside the node table.
        let bytes = encode_network(&straight_road(4)).unwrap();
        std::fs::write(dir.join("4.rnet"), &bytes[..100]).unwrap();

        // Not map files.
        std::fs::write(dir.join("notes.txt"), "hello").unwrap();
        std::fs::write(dir.join("town.rnet"), "hello").unwrap();
    }

    #[test]
    fn bad_files_are_skipped() {
        let dir = tempfile::tempdir().expect("create temp dir");
        write_maps(dir.path());

        let mut m = RoadNetworkManager::default();
        assert_eq!(m.initialize(dir.path()), 2);
        assert!(m.is_initialized());
        assert!(m.has_road_network(MapId(1)));
        assert!(!m.has_road_network(MapId(2)));
        assert!(m.has_road_network(MapId(3)));
        assert!(!m.has_road_network(MapId(4)));

        let s = m.stats();
        assert_eq!(s.maps_loaded, 2);
        assert_eq!(s.total_nodes, 11 + 4);

        // Loaded maps answer queries normally.
        assert!(m.calculate_road_aware_path(MapId(1), p(0.0, 0.0), p(1000.0, 0.0)).is_road());
    }

    #[test]
    fn second_initialize_is_a_no_op() {
        let dir = tempfile::tempdir().expect("create temp dir");
        write_maps(dir.path());
        let mut m = RoadNetworkManager::default();
        m.initialize(dir.path());

        save_network_file(&straight_road(5), &dir.path().join("5.rnet")).unwrap();
        assert_eq!(m.initialize(dir.path()), 2);
        assert!(!m.has_road_network(MapId(5)));
    }

    #[test]
    fn shutdown_then_reinitialize() {
        let dir = tempfile::tempdir().expect("create temp dir");
        write_maps(dir.path());
        let mut m = RoadNetworkManager::default();
        m.initialize(dir.path());
        m.calculate_road_aware_path(MapId(1), p(0.0, 0.0), p(1000.0, 0.0));

        m.shutdown();
        assert!(!m.is_initialized());
        assert!(!m.has_road_network(MapId(1)));
        assert_eq!(m.stats(), Default::default());
        assert_eq!(m.find_nearest_road_node(MapId(1), 0.0, 0.0, 10.0), None);

        assert_eq!(m.initialize(dir.path()), 2);
        assert!(m.has_road_network(MapId(1)));
    }

    #[test]
    fn missing_directory_loads_nothing() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let mut m = RoadNetworkManager::new(RoadNetworkConfig::default());
        assert_eq!(m.initialize(&dir.path().join("nope")), 0);
        assert_eq!(m.stats().maps_loaded, 0);
    }

    #[test]
    fn file_name_overrides_header_map_id() {
        let dir = tempfile::tempdir().expect("create temp dir");
        save_network_file(&straight_road(7), &dir.path().join("8.rnet")).unwrap();
        let mut m = RoadNetworkManager::default();
        assert_eq!(m.initialize(dir.path()), 1);
        assert!(m.has_road_network(MapId(8)));
        assert!(!m.has_road_network(MapId(7)));
        assert_eq!(m.network(MapId(8)).unwrap().map_id(), MapId(8));
    }

    #[test]
    fn empty_network_not_registered() {
        let mut m = RoadNetworkManager::default();
        let empty = NetworkBuilder::new().build(MapId(1));
        assert!(matches!(m.register_network(empty), Err(SpatialError::EmptyNetwork)));
        assert!(!m.has_road_network(MapId(1)));
    }
}

// ── Concurrent queries ────────────────────────────────────────────────────────

#[cfg(test)]
mod concurrency {
    use std::sync::Arc;
    use std::thread;

    use rn_core::{MapId, Position};

    use crate::{PathDecision, SharedRoadNetworks};
    use super::helpers::{manager, p};

    fn requests() -> Vec<(MapId, Position, Position)> {
        vec![
            (MapId(1), p(0.0, 20.0), p(1000.0, 20.0)),
            (MapId(1), p(0.0, 140.0), p(300.0, 140.0)),
            (MapId(2), p(0.0, 0.0), p(500.0, 0.0)),
            (MapId(3), p(0.0, 0.0), p(1100.0, 0.0)),
            (MapId(3), p(0.0, 0.0), p(10.0, 0.0)),
            (MapId(9), p(0.0, 0.0), p(1000.0, 0.0)),
        ]
    }

    #[test]
    fn parallel_queries_are_deterministic() {
        let shared: SharedRoadNetworks = Arc::new(manager());
        let reqs = requests();
        let expected: Vec<PathDecision> = reqs
            .iter()
            .map(|&(map, a, b)| shared.calculate_road_aware_path(map, a, b))
            .collect();

        const THREADS: usize = 8;
        const ROUNDS: usize = 50;
        thread::scope(|s| {
            for _ in 0..THREADS {
                let shared = Arc::clone(&shared);
                let (reqs, expected) = (&reqs, &expected);
                s.spawn(move || {
                    for _ in 0..ROUNDS {
                        for (req, want) in reqs.iter().zip(expected) {
                            let got = shared.calculate_road_aware_path(req.0, req.1, req.2);
                            assert_eq!(&got, want);
                        }
                    }
                });
            }
        });

        let roads = expected.iter().filter(|d| d.is_road()).count() as u64;
        let total_calls = (THREADS * ROUNDS + 1) as u64;
        let stats = shared.stats();
        assert_eq!(stats.road_paths_used, roads * total_calls);
        assert_eq!(
            stats.road_paths_used + stats.direct_fallbacks,
            reqs.len() as u64 * total_calls
        );
    }
}
