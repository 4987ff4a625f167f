//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Simulation interval counter (one interval = `interval_years` of galactic time)
pub type Interval = u32;

/// Continuous position inside the galaxy, in light-years
///
/// The disk is centred on the origin with its mid-plane at `z = 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn distance_squared(&self, other: &Vec3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    /// Squared distance from the disk axis
    #[inline]
    pub fn cylindrical_radius_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y
    }
}

/// Integer coordinates of one grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellIndex {
    pub i: usize,
    pub j: usize,
    pub k: usize,
}

impl CellIndex {
    pub const fn new(i: usize, j: usize, k: usize) -> Self {
        Self { i, j, k }
    }
}
