//! Pathfinder trait, default A* implementation, and waypoint expansion.
//!
//! # Pluggability
//!
//! `rn-manager` calls the search via the [`Pathfinder`] trait, so embedding
//! applications can swap in a different strategy without touching the
//! decision layer.  The default [`AStarPathfinder`] is a plain A* bounded by
//! a node-expansion cap.
//!
//! # Cost units
//!
//! Costs are the edge `cost` values from the network file, summed as `f32`.
//! The heuristic is the planar distance to the goal, which is admissible as
//! long as no edge is cheaper than the straight line between its endpoints.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rustc_hash::FxHashMap;

use rn_core::{NodeId, Position};

use crate::network::NetworkData;
use crate::{SpatialError, SpatialResult};

/// Default node-expansion cap for [`AStarPathfinder`].
pub const DEFAULT_MAX_EXPANSIONS: usize = 20_000;

// ── Path ──────────────────────────────────────────────────────────────────────

/// The result of a path query: node sequence from start to end inclusive and
/// the total accumulated edge cost.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub nodes: Vec<NodeId>,
    pub cost:  f32,
}

impl Path {
    /// `true` if the start and end are the same node.
    pub fn is_trivial(&self) -> bool {
        self.nodes.len() == 1
    }

    /// World positions along the path, shape points included.
    pub fn waypoints(&self, network: &NetworkData) -> Vec<Position> {
        expand_path_to_waypoints(network, &self.nodes)
    }
}

// ── Pathfinder trait ──────────────────────────────────────────────────────────

/// Pluggable shortest-path search over one map's graph.
///
/// # Thread safety
///
/// Implementations must be `Send + Sync`: a single instance serves concurrent
/// queries from every caller thread.
pub trait Pathfinder: Send + Sync {
    /// Compute a path from `start` to `end`.
    ///
    /// `start == end` yields a single-node path of cost 0.  Returns
    /// [`SpatialError::NodeNotFound`] for out-of-range endpoints and
    /// [`SpatialError::NoRoute`] when no path is found.
    fn find_path(&self, network: &NetworkData, start: NodeId, end: NodeId) -> SpatialResult<Path>;
}

// ── AStarPathfinder ───────────────────────────────────────────────────────────

/// A* over the undirected CSR graph.
///
/// The search gives up after `max_expansions` nodes have been expanded and
/// reports [`SpatialError::NoRoute`], exactly as for a disconnected graph.
/// This bounds worst-case latency; there is no other cancellation.
#[derive(Debug, Clone, Copy)]
pub struct AStarPathfinder {
    pub max_expansions: usize,
}

impl AStarPathfinder {
    pub fn new(max_expansions: usize) -> Self {
        Self { max_expansions }
    }
}

impl Default for AStarPathfinder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_EXPANSIONS)
    }
}

impl Pathfinder for AStarPathfinder {
    fn find_path(&self, network: &NetworkData, start: NodeId, end: NodeId) -> SpatialResult<Path> {
        astar(network, start, end, self.max_expansions)
    }
}

// ── A* internals ──────────────────────────────────────────────────────────────

/// Open-set entry.  Ordered so that `BinaryHeap` (a max-heap) pops the lowest
/// `f` first; ties break on `NodeId` for determinism.
#[derive(Copy, Clone, Debug)]
struct Frontier {
    f:    f32,
    g:    f32,
    node: NodeId,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.node.cmp(&self.node))
    }
}

fn astar(
    network: &NetworkData,
    start: NodeId,
    end: NodeId,
    max_expansions: usize,
) -> SpatialResult<Path> {
    let goal = network.node_position(end).ok_or(SpatialError::NodeNotFound(end))?;
    let origin = network.node_position(start).ok_or(SpatialError::NodeNotFound(start))?;

    if start == end {
        return Ok(Path { nodes: vec![start], cost: 0.0 });
    }

    // g_score[v] = best known cost to reach v; came_from[v] = predecessor.
    let mut g_score: FxHashMap<NodeId, f32> = FxHashMap::default();
    let mut came_from: FxHashMap<NodeId, NodeId> = FxHashMap::default();
    let mut open = BinaryHeap::new();

    g_score.insert(start, 0.0);
    open.push(Frontier { f: origin.distance_2d(goal), g: 0.0, node: start });

    let mut expansions = 0usize;

    while let Some(Frontier { g, node, .. }) = open.pop() {
        if node == end {
            return Ok(reconstruct(&came_from, start, end, g));
        }

        // Stale entry: a cheaper route to `node` was found after this push.
        if g > g_score.get(&node).copied().unwrap_or(f32::INFINITY) {
            continue;
        }

        if expansions >= max_expansions {
            log::debug!(
                "{}: A* {start} → {end} hit the {max_expansions}-node expansion cap",
                network.map_id()
            );
            break;
        }
        expansions += 1;

        for &edge_id in network.adjacent_edges(node) {
            let edge = &network.edges()[edge_id.index()];
            let Some(neighbor) = edge.opposite(node) else { continue };
            let tentative = g + edge.cost;

            if tentative < g_score.get(&neighbor).copied().unwrap_or(f32::INFINITY) {
                g_score.insert(neighbor, tentative);
                came_from.insert(neighbor, node);
                let h = network.nodes()[neighbor.index()].pos.distance_2d(goal);
                open.push(Frontier { f: tentative + h, g: tentative, node: neighbor });
            }
        }
    }

    Err(SpatialError::NoRoute { from: start, to: end })
}

fn reconstruct(
    came_from: &FxHashMap<NodeId, NodeId>,
    start: NodeId,
    end: NodeId,
    cost: f32,
) -> Path {
    let mut nodes = vec![end];
    let mut cur = end;
    while cur != start {
        match came_from.get(&cur) {
            Some(&prev) => {
                nodes.push(prev);
                cur = prev;
            }
            None => break,
        }
    }
    nodes.reverse();
    Path { nodes, cost }
}

// ── Waypoint expansion ────────────────────────────────────────────────────────

/// Convert a node path into world positions.
///
/// Emits the first node's position, then for each hop the connecting edge's
/// shape points (reversed when the edge is walked `node_b → node_a`) followed
/// by the next node's position.  A single node yields one waypoint.  An empty
/// path, an out-of-range node, or a hop with no connecting edge yields an
/// empty list.
pub fn expand_path_to_waypoints(network: &NetworkData, path: &[NodeId]) -> Vec<Position> {
    let Some(&first) = path.first() else {
        return Vec::new();
    };
    let Some(first_pos) = network.node_position(first) else {
        return Vec::new();
    };

    let mut waypoints = vec![first_pos];
    for hop in path.windows(2) {
        let (from, to) = (hop[0], hop[1]);
        let (Some(edge_id), Some(to_pos)) = (network.edge_between(from, to), network.node_position(to))
        else {
            return Vec::new();
        };

        let shape = network.edge_shape(edge_id);
        if network.edges()[edge_id.index()].node_a == from {
            waypoints.extend_from_slice(shape);
        } else {
            waypoints.extend(shape.iter().rev());
        }
        waypoints.push(to_pos);
    }
    waypoints
}
