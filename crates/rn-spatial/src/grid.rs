//! Uniform-grid spatial index for nearest-node queries.
//!
//! # Layout
//!
//! The world's `x`/`y` extent (±[`WORLD_HALF_EXTENT`]) is split into
//! [`GRID_DIM`] × [`GRID_DIM`] square cells of [`CELL_SIZE`] units.  Cell
//! contents use the same CSR trick as the graph adjacency: one flat
//! `cell_nodes` array plus a `cell_start` row pointer, so an empty cell costs
//! four bytes and a query never allocates.
//!
//! Positions outside the world extent are clamped into the border cells.
//!
//! # Query
//!
//! [`SpatialIndex::find_nearest_node`] scans rings of cells around the query
//! cell, radius 0, 1, 2, …  Ring `r` is only visited while the closest point
//! of its cells can still beat the best candidate and lies within `max_range`.

use rn_core::{NodeId, Position};

use crate::network::NetworkData;

/// Half the side length of the square world, in world units.
pub const WORLD_HALF_EXTENT: f32 = 17_066.666;

/// Side length of one grid cell, in world units.
pub const CELL_SIZE: f32 = 100.0;

/// Cells per grid side: `ceil(2 * WORLD_HALF_EXTENT / CELL_SIZE)`.
pub const GRID_DIM: usize = 342;

const CELL_COUNT: usize = GRID_DIM * GRID_DIM;

/// Bucketed node positions of one map.
///
/// Built once from a [`NetworkData`] snapshot; holds only `NodeId`s, so every
/// query also takes the network to read positions from.
#[derive(Debug, Clone, Default)]
pub struct SpatialIndex {
    /// Length `CELL_COUNT + 1` once built, empty otherwise.
    cell_start: Vec<u32>,
    cell_nodes: Vec<NodeId>,
}

impl SpatialIndex {
    /// An empty, unbuilt index.  Every query returns `None`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience: `new()` followed by [`build`](Self::build).
    pub fn from_network(network: &NetworkData) -> Self {
        let mut index = Self::new();
        index.build(network);
        index
    }

    /// Bucket every node of `network`, replacing any previous contents.
    pub fn build(&mut self, network: &NetworkData) {
        let cells: Vec<usize> = network
            .nodes()
            .iter()
            .map(|n| cell_index(cell_coord(n.pos.x), cell_coord(n.pos.y)))
            .collect();

        let mut start = vec![0u32; CELL_COUNT + 1];
        for &c in &cells {
            start[c + 1] += 1;
        }
        for i in 1..=CELL_COUNT {
            start[i] += start[i - 1];
        }

        let mut cursor: Vec<u32> = start[..CELL_COUNT].to_vec();
        let mut nodes = vec![NodeId::INVALID; cells.len()];
        for (i, &c) in cells.iter().enumerate() {
            nodes[cursor[c] as usize] = NodeId(i as u32);
            cursor[c] += 1;
        }

        self.cell_start = start;
        self.cell_nodes = nodes;
    }

    /// Drop all buckets.  The index answers `None` until rebuilt.
    pub fn clear(&mut self) {
        self.cell_start = Vec::new();
        self.cell_nodes = Vec::new();
    }

    pub fn is_built(&self) -> bool {
        !self.cell_start.is_empty()
    }

    /// Number of nodes bucketed by the last [`build`](Self::build).
    pub fn len(&self) -> usize {
        self.cell_nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cell_nodes.is_empty()
    }

    /// Nodes bucketed in the cell containing `(x, y)`.
    pub fn nodes_in_cell(&self, x: f32, y: f32) -> &[NodeId] {
        if !self.is_built() {
            return &[];
        }
        self.cell(cell_coord(x), cell_coord(y))
    }

    /// The node nearest to `(x, y)` in the plane, or `None` if no node lies
    /// within `max_range`.
    ///
    /// `network` must be the snapshot this index was built from.
    pub fn find_nearest_node(
        &self,
        network: &NetworkData,
        x: f32,
        y: f32,
        max_range: f32,
    ) -> Option<NodeId> {
        if !self.is_built() || !(max_range >= 0.0) {
            return None;
        }

        let query = Position::new(x, y, 0.0);
        let (cx, cy) = (cell_coord(x), cell_coord(y));
        let max_range_sq = max_range * max_range;
        let mut best: Option<(NodeId, f32)> = None;

        for r in 0..GRID_DIM {
            if r > 0 {
                let Some(ring_min) = ring_min_distance(x, y, cx, cy, r) else {
                    break;
                };
                if ring_min > max_range {
                    break;
                }
                if let Some((_, best_sq)) = best {
                    if ring_min * ring_min > best_sq {
                        break;
                    }
                }
            }

            self.for_each_ring_cell(cx, cy, r, |cell| {
                for &id in cell {
                    let d = network.nodes()[id.index()].pos.distance_2d_sq(query);
                    if best.map_or(true, |(_, b)| d < b) {
                        best = Some((id, d));
                    }
                }
            });
        }

        best.filter(|&(_, d)| d <= max_range_sq).map(|(id, _)| id)
    }

    // ── Internals ─────────────────────────────────────────────────────────

    #[inline]
    fn cell(&self, gx: usize, gy: usize) -> &[NodeId] {
        let c = cell_index(gx, gy);
        let start = self.cell_start[c] as usize;
        let end = self.cell_start[c + 1] as usize;
        &self.cell_nodes[start..end]
    }

    /// Visit the in-grid cells on the border of the ring of Chebyshev radius
    /// `r` around `(cx, cy)`.
    fn for_each_ring_cell<'a>(
        &'a self,
        cx: usize,
        cy: usize,
        r: usize,
        mut visit: impl FnMut(&'a [NodeId]),
    ) {
        let (cx, cy, r) = (cx as isize, cy as isize, r as isize);
        let dim = GRID_DIM as isize;
        let in_grid = |v: isize| (0..dim).contains(&v);

        if r == 0 {
            visit(self.cell(cx as usize, cy as usize));
            return;
        }

        // Top and bottom rows, corners included.
        for gy in [cy - r, cy + r] {
            if !in_grid(gy) {
                continue;
            }
            for gx in (cx - r).max(0)..=(cx + r).min(dim - 1) {
                visit(self.cell(gx as usize, gy as usize));
            }
        }
        // Left and right columns, corners excluded.
        for gx in [cx - r, cx + r] {
            if !in_grid(gx) {
                continue;
            }
            for gy in (cy - r + 1).max(0)..=(cy + r - 1).min(dim - 1) {
                visit(self.cell(gx as usize, gy as usize));
            }
        }
    }
}

// ── Cell geometry ─────────────────────────────────────────────────────────────

#[inline]
fn cell_coord(v: f32) -> usize {
    // `as` saturates: NaN and negatives land in cell 0.
    let c = ((v + WORLD_HALF_EXTENT) / CELL_SIZE).floor() as usize;
    c.min(GRID_DIM - 1)
}

#[inline]
fn cell_index(gx: usize, gy: usize) -> usize {
    gy * GRID_DIM + gx
}

/// World coordinate of the low edge of grid line `g`.
#[inline]
fn cell_edge(g: isize) -> f32 {
    g as f32 * CELL_SIZE - WORLD_HALF_EXTENT
}

/// Lower bound on the planar distance from `(x, y)` to any node bucketed in
/// ring `r`, or `None` once the ring has no cell inside the grid.
///
/// Only sides of the ring that exist in the grid count: a clamped node in a
/// border cell still lies beyond that cell's inner edge.
fn ring_min_distance(x: f32, y: f32, cx: usize, cy: usize, r: usize) -> Option<f32> {
    let (cx, cy, r) = (cx as isize, cy as isize, r as isize);
    let dim = GRID_DIM as isize;
    let mut min = f32::INFINITY;
    if cx - r >= 0 {
        min = min.min(x - cell_edge(cx - r + 1));
    }
    if cx + r < dim {
        min = min.min(cell_edge(cx + r) - x);
    }
    if cy - r >= 0 {
        min = min.min(y - cell_edge(cy - r + 1));
    }
    if cy + r < dim {
        min = min.min(cell_edge(cy + r) - y);
    }
    min.is_finite().then(|| min.max(0.0))
}
