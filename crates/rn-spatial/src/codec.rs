//! Binary `RNET` network file codec.
//!
//! # File layout (version 1, little-endian, packed)
//!
//! ```text
//! header        magic "RNET" | version u32 | map_id u32 | node_count u32
//!               | edge_count u32 | shape_point_count u32 | reserved u32 ×2
//! nodes         x f32 | y f32 | z f32 | flags u8 | edge_count u8 | first_edge u16
//! edges         node_a u32 | node_b u32 | cost f32 | shape_offset u16 | shape_count u16
//! shape points  x f32 | y f32 | z f32
//! adjacency     edge u32   × Σ node.edge_count, in node order
//! ```
//!
//! Every field is decoded individually from the byte buffer; nothing relies
//! on in-memory struct layout.  Decoding is all-or-nothing: any short read,
//! bad magic, unsupported version, empty network or structural
//! inconsistency yields an error and no partial network.

use std::io::{Read, Write};
use std::path::Path;

use rn_core::{EdgeId, MapId, NodeId, Position};

use crate::network::{Edge, NetworkData, Node, NodeFlags};
use crate::{SpatialError, SpatialResult};

pub const MAGIC: [u8; 4] = *b"RNET";
pub const VERSION: u32 = 1;

pub const HEADER_SIZE:       usize = 32;
pub const NODE_RECORD_SIZE:  usize = 16;
pub const EDGE_RECORD_SIZE:  usize = 16;
pub const SHAPE_RECORD_SIZE: usize = 12;
pub const ADJ_RECORD_SIZE:   usize = 4;

// ── Header ────────────────────────────────────────────────────────────────────

/// Decoded file header.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub map_id:            MapId,
    pub node_count:        u32,
    pub edge_count:        u32,
    pub shape_point_count: u32,
}

/// Decode and check the 32-byte header at the start of `bytes`.
pub fn read_header(bytes: &[u8]) -> SpatialResult<Header> {
    let mut r = ByteReader::new(bytes);
    header(&mut r)
}

fn header(r: &mut ByteReader<'_>) -> SpatialResult<Header> {
    let magic: [u8; 4] = r.array("header")?;
    if magic != MAGIC {
        return Err(SpatialError::BadMagic(magic));
    }
    let version = r.u32("header")?;
    if version != VERSION {
        return Err(SpatialError::UnsupportedVersion(version));
    }
    let map_id            = MapId(r.u32("header")?);
    let node_count        = r.u32("header")?;
    let edge_count        = r.u32("header")?;
    let shape_point_count = r.u32("header")?;
    let _reserved         = (r.u32("header")?, r.u32("header")?);

    Ok(Header { map_id, node_count, edge_count, shape_point_count })
}

// ── Decoding ──────────────────────────────────────────────────────────────────

/// Load a network from an `RNET` file on disk.
pub fn load_network_file(path: &Path) -> SpatialResult<NetworkData> {
    let bytes = std::fs::read(path)?;
    decode_network(&bytes)
}

/// Like [`load_network_file`] but accepts any `Read` source.
pub fn read_network<R: Read>(mut reader: R) -> SpatialResult<NetworkData> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    decode_network(&bytes)
}

/// Decode a complete network from an in-memory `RNET` image.
pub fn decode_network(bytes: &[u8]) -> SpatialResult<NetworkData> {
    let mut r = ByteReader::new(bytes);
    let h = header(&mut r)?;
    if h.node_count == 0 {
        return Err(SpatialError::EmptyNetwork);
    }

    // Size-check each section before allocating for it.
    r.ensure(h.node_count as usize, NODE_RECORD_SIZE, "nodes")?;
    let mut nodes = Vec::with_capacity(h.node_count as usize);
    let mut adjacency_len = 0usize;
    for _ in 0..h.node_count {
        let pos        = r.position("nodes")?;
        let flags      = NodeFlags::from_bits_retain(r.u8("nodes")?);
        let edge_count = r.u8("nodes")? as u32;
        let first_edge = r.u16("nodes")? as u32;
        adjacency_len += edge_count as usize;
        nodes.push(Node { pos, flags, first_edge, edge_count });
    }

    r.ensure(h.edge_count as usize, EDGE_RECORD_SIZE, "edges")?;
    let mut edges = Vec::with_capacity(h.edge_count as usize);
    for _ in 0..h.edge_count {
        edges.push(Edge {
            node_a:       NodeId(r.u32("edges")?),
            node_b:       NodeId(r.u32("edges")?),
            cost:         r.f32("edges")?,
            shape_offset: r.u16("edges")? as u32,
            shape_count:  r.u16("edges")? as u32,
        });
    }

    r.ensure(h.shape_point_count as usize, SHAPE_RECORD_SIZE, "shape points")?;
    let mut shape_points = Vec::with_capacity(h.shape_point_count as usize);
    for _ in 0..h.shape_point_count {
        shape_points.push(r.position("shape points")?);
    }

    r.ensure(adjacency_len, ADJ_RECORD_SIZE, "adjacency")?;
    let mut adjacency = Vec::with_capacity(adjacency_len);
    for _ in 0..adjacency_len {
        adjacency.push(EdgeId(r.u32("adjacency")?));
    }

    if r.remaining() > 0 {
        log::debug!(
            "{}: ignoring {} trailing bytes after adjacency list",
            h.map_id,
            r.remaining()
        );
    }

    NetworkData::from_parts(h.map_id, nodes, edges, shape_points, adjacency)
}

// ── Encoding ──────────────────────────────────────────────────────────────────

/// Write `network` to `path` in `RNET` format, replacing any existing file.
pub fn save_network_file(network: &NetworkData, path: &Path) -> SpatialResult<()> {
    let bytes = encode_network(network)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Like [`save_network_file`] but accepts any `Write` sink.
pub fn write_network<W: Write>(network: &NetworkData, mut writer: W) -> SpatialResult<()> {
    let bytes = encode_network(network)?;
    writer.write_all(&bytes)?;
    Ok(())
}

/// Encode `network` into an `RNET` image.
///
/// Fails with [`SpatialError::FieldOverflow`] if any in-memory value exceeds
/// its on-disk width (e.g. a node with more than 255 edges).
pub fn encode_network(network: &NetworkData) -> SpatialResult<Vec<u8>> {
    let size = HEADER_SIZE
        + network.node_count() * NODE_RECORD_SIZE
        + network.edge_count() * EDGE_RECORD_SIZE
        + network.shape_point_count() * SHAPE_RECORD_SIZE
        + network.adjacency().len() * ADJ_RECORD_SIZE;
    let mut out = Vec::with_capacity(size);

    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&VERSION.to_le_bytes());
    out.extend_from_slice(&network.map_id().0.to_le_bytes());
    out.extend_from_slice(&narrow_u32("node_count", network.node_count())?.to_le_bytes());
    out.extend_from_slice(&narrow_u32("edge_count", network.edge_count())?.to_le_bytes());
    out.extend_from_slice(
        &narrow_u32("shape_point_count", network.shape_point_count())?.to_le_bytes(),
    );
    out.extend_from_slice(&[0u8; 8]);

    // first_edge is re-derived as a running offset so it always matches the
    // node-ordered adjacency section written below.
    let mut first_edge = 0u32;
    for n in network.nodes() {
        put_position(&mut out, n.pos);
        out.push(n.flags.bits());
        out.push(narrow("node.edge_count", n.edge_count)?);
        out.extend_from_slice(&narrow::<u16>("node.first_edge", first_edge)?.to_le_bytes());
        first_edge += n.edge_count;
    }

    for e in network.edges() {
        out.extend_from_slice(&e.node_a.0.to_le_bytes());
        out.extend_from_slice(&e.node_b.0.to_le_bytes());
        out.extend_from_slice(&e.cost.to_le_bytes());
        out.extend_from_slice(&narrow::<u16>("edge.shape_offset", e.shape_offset)?.to_le_bytes());
        out.extend_from_slice(&narrow::<u16>("edge.shape_count", e.shape_count)?.to_le_bytes());
    }

    for &p in network.shape_points() {
        put_position(&mut out, p);
    }

    for n in network.nodes() {
        for e in &network.adjacency()[n.adjacency_range()] {
            out.extend_from_slice(&e.0.to_le_bytes());
        }
    }

    Ok(out)
}

fn put_position(out: &mut Vec<u8>, p: Position) {
    out.extend_from_slice(&p.x.to_le_bytes());
    out.extend_from_slice(&p.y.to_le_bytes());
    out.extend_from_slice(&p.z.to_le_bytes());
}

fn narrow<T: TryFrom<u32>>(field: &'static str, value: u32) -> SpatialResult<T> {
    T::try_from(value).map_err(|_| SpatialError::FieldOverflow { field, value: value as u64 })
}

fn narrow_u32(field: &'static str, value: usize) -> SpatialResult<u32> {
    u32::try_from(value).map_err(|_| SpatialError::FieldOverflow { field, value: value as u64 })
}

// ── ByteReader ────────────────────────────────────────────────────────────────

/// Bounds-checked little-endian cursor over a byte slice.
struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Fail early if fewer than `count` records of `size` bytes remain.
    fn ensure(&self, count: usize, size: usize, section: &'static str) -> SpatialResult<()> {
        match count.checked_mul(size) {
            Some(needed) if needed <= self.remaining() => Ok(()),
            _ => Err(SpatialError::Truncated { section }),
        }
    }

    fn take(&mut self, n: usize, section: &'static str) -> SpatialResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(SpatialError::Truncated { section });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self, section: &'static str) -> SpatialResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, section)?);
        Ok(out)
    }

    fn u8(&mut self, section: &'static str) -> SpatialResult<u8> {
        Ok(self.take(1, section)?[0])
    }

    fn u16(&mut self, section: &'static str) -> SpatialResult<u16> {
        self.array(section).map(u16::from_le_bytes)
    }

    fn u32(&mut self, section: &'static str) -> SpatialResult<u32> {
        self.array(section).map(u32::from_le_bytes)
    }

    fn f32(&mut self, section: &'static str) -> SpatialResult<f32> {
        self.array(section).map(f32::from_le_bytes)
    }

    fn position(&mut self, section: &'static str) -> SpatialResult<Position> {
        Ok(Position::new(self.f32(section)?, self.f32(section)?, self.f32(section)?))
    }
}
