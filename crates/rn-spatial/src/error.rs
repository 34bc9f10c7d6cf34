//! Spatial-subsystem error type.

use thiserror::Error;

use rn_core::NodeId;

/// Errors produced by `rn-spatial`.
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("no route from {from} to {to}")]
    NoRoute { from: NodeId, to: NodeId },

    #[error("node {0} not found in network")]
    NodeNotFound(NodeId),

    #[error("bad magic {0:?}: expected \"RNET\"")]
    BadMagic([u8; 4]),

    #[error("unsupported network file version {0}")]
    UnsupportedVersion(u32),

    #[error("network contains no nodes")]
    EmptyNetwork,

    #[error("truncated network data while reading {section}")]
    Truncated { section: &'static str },

    #[error("invalid network: {0}")]
    Invalid(String),

    #[error("{field} value {value} does not fit its on-disk width")]
    FieldOverflow { field: &'static str, value: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SpatialResult<T> = Result<T, SpatialError>;
