//! Road network representation and builder.
//!
//! # Data layout
//!
//! One map's graph is four flat arrays plus the map id:
//!
//! ```text
//! nodes         [Node]        position, flags, (first_edge, edge_count)
//! edges         [Edge]        node_a, node_b, cost, (shape_offset, shape_count)
//! shape_points  [Position]    edge polylines, stored node_a → node_b
//! adjacency     [EdgeId]      per-node contiguous slices (CSR)
//! ```
//!
//! Given a node `n`, the edges touching it are
//! `adjacency[n.first_edge .. n.first_edge + n.edge_count]`.  Edges are
//! undirected: each one appears in the adjacency slice of both endpoints.
//!
//! `NetworkData` has no mutation API.  Once built (by [`NetworkBuilder`] or
//! the binary loader) it can be shared freely across threads.

use bitflags::bitflags;

use rn_core::{EdgeId, MapId, NodeId, Position};

use crate::{SpatialError, SpatialResult};

// ── Node flags ────────────────────────────────────────────────────────────────

bitflags! {
    /// Survey classification bits stored with every node.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        const JUNCTION = 0x01;
        const ENDPOINT = 0x02;
        const BRIDGE   = 0x04;
        const TOWN     = 0x08;

        // Bits written by newer survey tools are carried through untouched.
        const _ = !0;
    }
}

// ── Records ───────────────────────────────────────────────────────────────────

/// A road node: position, flags, and its slice of the adjacency array.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Node {
    pub pos:        Position,
    pub flags:      NodeFlags,
    pub first_edge: u32,
    pub edge_count: u32,
}

impl Node {
    /// Range of this node's entries in [`NetworkData::adjacency`].
    #[inline]
    pub fn adjacency_range(&self) -> std::ops::Range<usize> {
        let start = self.first_edge as usize;
        start..start + self.edge_count as usize
    }
}

/// An undirected road segment.
///
/// Shape points describe the polyline strictly between the two endpoints and
/// are stored in the `node_a → node_b` direction.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Edge {
    pub node_a:       NodeId,
    pub node_b:       NodeId,
    pub cost:         f32,
    pub shape_offset: u32,
    pub shape_count:  u32,
}

impl Edge {
    /// The endpoint on the other side of `from`, or `None` if `from` is not an
    /// endpoint of this edge.
    #[inline]
    pub fn opposite(&self, from: NodeId) -> Option<NodeId> {
        if self.node_a == from {
            Some(self.node_b)
        } else if self.node_b == from {
            Some(self.node_a)
        } else {
            None
        }
    }

    #[inline]
    pub fn shape_range(&self) -> std::ops::Range<usize> {
        let start = self.shape_offset as usize;
        start..start + self.shape_count as usize
    }
}

// ── NetworkData ───────────────────────────────────────────────────────────────

/// Immutable road graph of a single map.
///
/// Construct with [`NetworkBuilder`], [`crate::codec::read_network`], or
/// [`NetworkData::from_parts`]; all three guarantee the structural
/// invariants checked by [`validate`](Self::validate).
#[derive(Debug, Clone)]
pub struct NetworkData {
    map_id:       MapId,
    nodes:        Vec<Node>,
    edges:        Vec<Edge>,
    shape_points: Vec<Position>,
    adjacency:    Vec<EdgeId>,
}

impl NetworkData {
    /// Assemble a network from raw arrays, rejecting any structural
    /// inconsistency with [`SpatialError::Invalid`].
    pub fn from_parts(
        map_id:       MapId,
        nodes:        Vec<Node>,
        edges:        Vec<Edge>,
        shape_points: Vec<Position>,
        adjacency:    Vec<EdgeId>,
    ) -> SpatialResult<Self> {
        let network = Self { map_id, nodes, edges, shape_points, adjacency };
        network.validate()?;
        Ok(network)
    }

    pub fn map_id(&self) -> MapId {
        self.map_id
    }

    /// Re-key the network before it is shared, e.g. when a file's header
    /// disagrees with its file name.
    pub fn with_map_id(mut self, map_id: MapId) -> Self {
        self.map_id = map_id;
        self
    }

    /// `true` iff the network has at least one node.
    pub fn is_valid(&self) -> bool {
        !self.nodes.is_empty()
    }

    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn shape_point_count(&self) -> usize {
        self.shape_points.len()
    }

    // ── Raw arrays ────────────────────────────────────────────────────────

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn shape_points(&self) -> &[Position] {
        &self.shape_points
    }

    pub fn adjacency(&self) -> &[EdgeId] {
        &self.adjacency
    }

    // ── Lookups ───────────────────────────────────────────────────────────

    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    #[inline]
    pub fn node_position(&self, id: NodeId) -> Option<Position> {
        self.node(id).map(|n| n.pos)
    }

    #[inline]
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.index())
    }

    /// Edges touching `node`.  Empty for an out-of-range node.
    ///
    /// This is a contiguous slice of the adjacency array; no allocation.
    #[inline]
    pub fn adjacent_edges(&self, node: NodeId) -> &[EdgeId] {
        match self.node(node) {
            Some(n) => &self.adjacency[n.adjacency_range()],
            None => &[],
        }
    }

    /// Interior polyline of `edge` in stored (`node_a → node_b`) order.
    #[inline]
    pub fn edge_shape(&self, edge: EdgeId) -> &[Position] {
        match self.edge(edge) {
            Some(e) => &self.shape_points[e.shape_range()],
            None => &[],
        }
    }

    /// The cheapest edge joining `from` and `to`, found by scanning `from`'s
    /// adjacency slice.
    pub fn edge_between(&self, from: NodeId, to: NodeId) -> Option<EdgeId> {
        self.adjacent_edges(from)
            .iter()
            .copied()
            .filter(|&e| self.edges[e.index()].opposite(from) == Some(to))
            .min_by(|&a, &b| {
                self.edges[a.index()].cost.total_cmp(&self.edges[b.index()].cost)
            })
    }

    // ── Validation ────────────────────────────────────────────────────────

    /// Check every structural invariant the pathfinder and spatial index rely
    /// on.  Does not reject an empty network; see [`is_valid`](Self::is_valid).
    pub fn validate(&self) -> SpatialResult<()> {
        let node_count = self.nodes.len();
        let edge_count = self.edges.len();

        for (i, e) in self.edges.iter().enumerate() {
            if e.node_a.index() >= node_count || e.node_b.index() >= node_count {
                return Err(SpatialError::Invalid(format!(
                    "edge {i} references node outside 0..{node_count}"
                )));
            }
            if !e.cost.is_finite() || e.cost < 0.0 {
                return Err(SpatialError::Invalid(format!(
                    "edge {i} has invalid cost {}",
                    e.cost
                )));
            }
            if e.shape_offset as usize + e.shape_count as usize > self.shape_points.len() {
                return Err(SpatialError::Invalid(format!(
                    "edge {i} shape slice exceeds {} shape points",
                    self.shape_points.len()
                )));
            }
        }

        for (i, n) in self.nodes.iter().enumerate() {
            if n.first_edge as usize + n.edge_count as usize > self.adjacency.len() {
                return Err(SpatialError::Invalid(format!(
                    "node {i} adjacency slice exceeds {} entries",
                    self.adjacency.len()
                )));
            }
            let id = NodeId(i as u32);
            for &e in &self.adjacency[n.adjacency_range()] {
                if e.index() >= edge_count {
                    return Err(SpatialError::Invalid(format!(
                        "node {i} lists edge {} outside 0..{edge_count}",
                        e.0
                    )));
                }
                if self.edges[e.index()].opposite(id).is_none() {
                    return Err(SpatialError::Invalid(format!(
                        "node {i} lists edge {} that does not touch it",
                        e.0
                    )));
                }
            }
        }

        Ok(())
    }
}

// ── NetworkBuilder ────────────────────────────────────────────────────────────

/// Construct a [`NetworkData`] incrementally, then call [`build`](Self::build).
///
/// This is the in-process counterpart of the offline survey tool: nodes and
/// edges may be added in any order; `build()` lays out shape points and the
/// CSR adjacency array.
///
/// # Example
///
/// ```
/// use rn_core::{MapId, Position};
/// use rn_spatial::{NetworkBuilder, NodeFlags};
///
/// let mut b = NetworkBuilder::new();
/// let a = b.add_node(Position::new(0.0, 0.0, 0.0), NodeFlags::ENDPOINT);
/// let c = b.add_node(Position::new(100.0, 0.0, 0.0), NodeFlags::ENDPOINT);
/// b.add_road(a, c, [Position::new(50.0, 10.0, 0.0)]);
/// let net = b.build(MapId(0));
/// assert_eq!(net.node_count(), 2);
/// assert_eq!(net.adjacency().len(), 2); // listed under both endpoints
/// ```
pub struct NetworkBuilder {
    nodes:     Vec<(Position, NodeFlags)>,
    raw_edges: Vec<RawEdge>,
}

struct RawEdge {
    a:     NodeId,
    b:     NodeId,
    cost:  f32,
    shape: Vec<Position>,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self { nodes: Vec::new(), raw_edges: Vec::new() }
    }

    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            nodes:     Vec::with_capacity(nodes),
            raw_edges: Vec::with_capacity(edges),
        }
    }

    /// Add a road node and return its `NodeId` (sequential from 0).
    pub fn add_node(&mut self, pos: Position, flags: NodeFlags) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push((pos, flags));
        id
    }

    /// Add an edge with an explicit traversal cost.
    ///
    /// `shape` lists the interior points walked from `a` to `b`.
    pub fn add_edge<I>(&mut self, a: NodeId, b: NodeId, cost: f32, shape: I) -> EdgeId
    where
        I: IntoIterator<Item = Position>,
    {
        let id = EdgeId(self.raw_edges.len() as u32);
        self.raw_edges.push(RawEdge { a, b, cost, shape: shape.into_iter().collect() });
        id
    }

    /// Add an edge whose cost is the planar length of its polyline
    /// `a → shape… → b`.
    pub fn add_road<I>(&mut self, a: NodeId, b: NodeId, shape: I) -> EdgeId
    where
        I: IntoIterator<Item = Position>,
    {
        let shape: Vec<Position> = shape.into_iter().collect();
        let mut cost = 0.0;
        let mut prev = self.node_pos(a);
        for &p in shape.iter().chain(std::iter::once(&self.node_pos(b))) {
            cost += prev.distance_2d(p);
            prev = p;
        }
        self.add_edge(a, b, cost, shape)
    }

    /// Look up the position of a node added earlier.
    pub fn node_pos(&self, id: NodeId) -> Position {
        self.nodes[id.index()].0
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn edge_count(&self) -> usize { self.raw_edges.len() }

    /// Consume the builder and produce a [`NetworkData`] for `map_id`.
    ///
    /// `EdgeId`s are assigned in insertion order.  Each node's adjacency slice
    /// lists its edges in ascending `EdgeId` order; a self-loop is listed once.
    ///
    /// # Panics
    ///
    /// Panics if an edge references a node that was never added.
    pub fn build(self, map_id: MapId) -> NetworkData {
        let node_count = self.nodes.len();

        // Degree count, then prefix sum into first_edge offsets.
        let mut degree = vec![0u32; node_count];
        for e in &self.raw_edges {
            degree[e.a.index()] += 1;
            if e.b != e.a {
                degree[e.b.index()] += 1;
            }
        }
        let mut first = vec![0u32; node_count + 1];
        for i in 0..node_count {
            first[i + 1] = first[i] + degree[i];
        }

        let mut adjacency = vec![EdgeId::INVALID; first[node_count] as usize];
        let mut cursor: Vec<u32> = first[..node_count].to_vec();
        let mut edges = Vec::with_capacity(self.raw_edges.len());
        let mut shape_points = Vec::new();

        for (i, raw) in self.raw_edges.into_iter().enumerate() {
            let id = EdgeId(i as u32);
            adjacency[cursor[raw.a.index()] as usize] = id;
            cursor[raw.a.index()] += 1;
            if raw.b != raw.a {
                adjacency[cursor[raw.b.index()] as usize] = id;
                cursor[raw.b.index()] += 1;
            }

            edges.push(Edge {
                node_a:       raw.a,
                node_b:       raw.b,
                cost:         raw.cost,
                shape_offset: shape_points.len() as u32,
                shape_count:  raw.shape.len() as u32,
            });
            shape_points.extend(raw.shape);
        }

        let nodes = self
            .nodes
            .into_iter()
            .enumerate()
            .map(|(i, (pos, flags))| Node {
                pos,
                flags,
                first_edge: first[i],
                edge_count: degree[i],
            })
            .collect();

        NetworkData { map_id, nodes, edges, shape_points, adjacency }
    }
}

impl Default for NetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}
