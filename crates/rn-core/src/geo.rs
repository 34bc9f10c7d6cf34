//! World-space position type.
//!
//! `Position` uses `f32` components, matching the on-disk network format.
//! Road routing is planar: all distance heuristics use the `(x, y)` plane and
//! ignore `z`, which only matters once an agent walks the waypoints.

/// A point in world space.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Squared planar distance.  Cheaper than [`distance_2d`](Self::distance_2d)
    /// when only comparing.
    #[inline]
    pub fn distance_2d_sq(self, other: Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Planar (x, y) Euclidean distance.
    #[inline]
    pub fn distance_2d(self, other: Position) -> f32 {
        self.distance_2d_sq(other).sqrt()
    }

    #[inline]
    pub fn distance_3d(self, other: Position) -> f32 {
        let dz = self.z - other.z;
        (self.distance_2d_sq(other) + dz * dz).sqrt()
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}
