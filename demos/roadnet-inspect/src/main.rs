//! roadnet-inspect: load a directory of `.rnet` road networks and probe it.
//!
//! ```text
//! roadnet-inspect [DIR] [CONFIG.toml]
//! ```
//!
//! Without `DIR` a scratch directory is filled with two synthetic maps and
//! one corrupted file, so the skip-on-error path is visible in the log.
//! Set `RUST_LOG=debug` (or `trace`) for per-request detail.

mod network;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};

use rn_core::{MapId, Position};
use rn_manager::{PathDecision, RoadNetworkConfig, RoadNetworkManager};
use rn_spatial::{encode_network, save_network_file};

use network::{build_pass, build_town};

// ── Constants ─────────────────────────────────────────────────────────────────

const TOWN_MAP:    MapId = MapId(1);
const PASS_MAP:    MapId = MapId(2);
const BROKEN_MAP:  MapId = MapId(3);
const MISSING_MAP: MapId = MapId(99);

/// Offset applied to probe endpoints so they sit beside, not on, the road.
const KERB: f32 = 30.0;

// ── Sample data ───────────────────────────────────────────────────────────────

fn write_sample_maps(dir: &Path) -> Result<()> {
    save_network_file(&build_town(TOWN_MAP), &dir.join(format!("{}.rnet", TOWN_MAP.0)))?;

    let (pass, _) = build_pass(PASS_MAP);
    save_network_file(&pass, &dir.join(format!("{}.rnet", PASS_MAP.0)))?;

    // Valid body, wrong magic.
    let mut bytes = encode_network(&build_town(BROKEN_MAP))?;
    bytes[..4].copy_from_slice(b"NOPE");
    std::fs::write(dir.join(format!("{}.rnet", BROKEN_MAP.0)), bytes)?;

    std::fs::write(dir.join("README.txt"), "not a network")?;
    Ok(())
}

// ── Probes ────────────────────────────────────────────────────────────────────

/// A handful of requests per map: end to end, middle to start, and a hop
/// too short to bother with roads.
fn probes(manager: &RoadNetworkManager, map_id: MapId) -> Vec<(Position, Position)> {
    let Some(net) = manager.network(map_id) else {
        return Vec::new();
    };
    let nodes = net.nodes();
    let (Some(first), Some(last)) = (nodes.first(), nodes.last()) else {
        return Vec::new();
    };
    let mid = nodes[nodes.len() / 2].pos;
    let beside = |p: Position| Position::new(p.x + KERB, p.y + KERB, p.z);

    vec![
        (beside(first.pos), beside(last.pos)),
        (beside(mid), first.pos),
        (first.pos, beside(first.pos)),
    ]
}

fn describe(decision: &PathDecision) -> String {
    match decision {
        PathDecision::Road(waypoints) => format!("road, {} waypoints", waypoints.len()),
        PathDecision::Direct(reason) => format!("direct ({reason})"),
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let dir_arg = args.next().map(PathBuf::from);
    let config = match args.next() {
        Some(path) => RoadNetworkConfig::load(Path::new(&path))
            .with_context(|| format!("loading config {path}"))?,
        None => RoadNetworkConfig::default(),
    };

    // Keep the scratch directory alive until the end of main.
    let scratch;
    let dir = match dir_arg {
        Some(dir) => dir,
        None => {
            scratch = tempfile::tempdir().context("creating scratch directory")?;
            write_sample_maps(scratch.path())?;
            log::info!("wrote sample maps to {}", scratch.path().display());
            scratch.path().to_path_buf()
        }
    };

    let mut manager = RoadNetworkManager::new(config);
    let t0 = Instant::now();
    let loaded = manager.initialize(&dir);
    println!("Loaded {loaded} road networks in {:.3} ms", t0.elapsed().as_secs_f64() * 1e3);
    println!();

    let mut map_ids = manager.map_ids();
    map_ids.push(MISSING_MAP);

    println!("{:<6} {:<28} {:<28} {}", "Map", "From", "To", "Decision");
    println!("{}", "-".repeat(90));
    for map_id in map_ids {
        let requests = match probes(&manager, map_id) {
            v if v.is_empty() => vec![(Position::new(0.0, 0.0, 0.0), Position::new(1_000.0, 0.0, 0.0))],
            v => v,
        };
        for (from, to) in requests {
            let decision = manager.calculate_road_aware_path(map_id, from, to);
            println!("{:<6} {:<28} {:<28} {}", map_id.0, from.to_string(), to.to_string(), describe(&decision));
        }

        if let Some(node) = manager.find_nearest_road_node(map_id, 0.0, 0.0, 500.0) {
            if let Some(pos) = manager.road_node_position(map_id, node) {
                println!("{:<6} nearest road node to origin: {node} at {pos}", map_id.0);
            }
        }
    }
    println!();

    println!("{}", serde_json::to_string_pretty(&manager.stats())?);

    manager.shutdown();
    Ok(())
}
