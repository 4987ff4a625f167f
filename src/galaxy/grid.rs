//! Discretized galaxy disk
//!
//! The lattice covers the bounding box `[-R, R] x [-R, R] x [-h/2, h/2]` with
//! `ngrid_xy x ngrid_xy x ngrid_z` cells of uniform size per axis. Cells are
//! addressed by their centre; a cell belongs to the disk when its centre lies
//! within cylindrical radius `R`. The mask is computed once and never changes.

use tracing::info;

use crate::core::config::SimulationConfig;
use crate::core::error::Result;
use crate::core::types::{CellIndex, Vec3};

/// Hit-count lattice over the galaxy disk
#[derive(Debug, Clone)]
pub struct GalaxyGrid {
    pub radius: f64,
    pub thickness: f64,
    pub ngrid_xy: usize,
    pub ngrid_z: usize,
    /// Cell edge length along x, y and z
    pub cell_size: Vec3,
    /// Corner of the bounding box (`-R, -R, -h/2`)
    pub origin: Vec3,
    mask: Vec<bool>,
    hits: Vec<u64>,
    masked_cells: usize,
}

impl GalaxyGrid {
    /// Build the lattice and its disk mask from a validated configuration
    pub fn new(config: &SimulationConfig) -> Result<Self> {
        config.validate()?;

        let n_xy = config.ngrid_xy;
        let n_z = config.ngrid_z;
        let radius = config.radius;
        let thickness = config.thickness;

        let cell_size = Vec3::new(
            2.0 * radius / n_xy as f64,
            2.0 * radius / n_xy as f64,
            thickness / n_z as f64,
        );
        let origin = Vec3::new(-radius, -radius, -thickness / 2.0);

        let total = n_xy * n_xy * n_z;
        let mut mask = vec![false; total];
        let mut masked_cells = 0;
        let r2 = radius * radius;

        for i in 0..n_xy {
            let x = origin.x + (i as f64 + 0.5) * cell_size.x;
            for j in 0..n_xy {
                let y = origin.y + (j as f64 + 0.5) * cell_size.y;
                if x * x + y * y > r2 {
                    continue;
                }
                let column = (i * n_xy + j) * n_z;
                mask[column..column + n_z].fill(true);
                masked_cells += n_z;
            }
        }

        info!(
            "Galaxy grid {}x{}x{} ({} cells, {} inside disk), cell size {:.2} x {:.2} x {:.2} ly",
            n_xy, n_xy, n_z, total, masked_cells, cell_size.x, cell_size.y, cell_size.z
        );

        Ok(Self {
            radius,
            thickness,
            ngrid_xy: n_xy,
            ngrid_z: n_z,
            cell_size,
            origin,
            mask,
            hits: vec![0; total],
            masked_cells,
        })
    }

    /// Lattice dimensions as `(nx, ny, nz)`
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.ngrid_xy, self.ngrid_xy, self.ngrid_z)
    }

    pub fn total_cells(&self) -> usize {
        self.hits.len()
    }

    /// Number of cells inside the disk
    pub fn masked_cells(&self) -> usize {
        self.masked_cells
    }

    /// Flat storage offset of a cell (x-major, z fastest)
    #[inline]
    pub fn offset(&self, cell: CellIndex) -> usize {
        (cell.i * self.ngrid_xy + cell.j) * self.ngrid_z + cell.k
    }

    #[inline]
    pub fn contains_index(&self, cell: CellIndex) -> bool {
        cell.i < self.ngrid_xy && cell.j < self.ngrid_xy && cell.k < self.ngrid_z
    }

    #[inline]
    pub fn is_masked(&self, cell: CellIndex) -> bool {
        self.contains_index(cell) && self.mask[self.offset(cell)]
    }

    #[inline]
    pub fn hits(&self, cell: CellIndex) -> Option<u64> {
        if self.contains_index(cell) {
            Some(self.hits[self.offset(cell)])
        } else {
            None
        }
    }

    /// Centre of a cell in galaxy coordinates
    #[inline]
    pub fn cell_center(&self, cell: CellIndex) -> Vec3 {
        Vec3::new(
            self.origin.x + (cell.i as f64 + 0.5) * self.cell_size.x,
            self.origin.y + (cell.j as f64 + 0.5) * self.cell_size.y,
            self.origin.z + (cell.k as f64 + 0.5) * self.cell_size.z,
        )
    }

    /// Map a continuous position to the cell containing it
    ///
    /// Points on the closed upper face of the box fall into the last cell;
    /// anything outside the box (or NaN) yields `None`.
    #[inline]
    pub fn cell_of(&self, pos: Vec3) -> Option<CellIndex> {
        Some(CellIndex::new(
            axis_cell(pos.x, self.origin.x, self.cell_size.x, self.ngrid_xy)?,
            axis_cell(pos.y, self.origin.y, self.cell_size.y, self.ngrid_xy)?,
            axis_cell(pos.z, self.origin.z, self.cell_size.z, self.ngrid_z)?,
        ))
    }

    /// Whether a continuous position is inside the physical disk
    #[inline]
    pub fn in_disk(&self, pos: Vec3) -> bool {
        pos.cylindrical_radius_squared() <= self.radius * self.radius
            && pos.z.abs() <= self.thickness / 2.0
    }

    /// Index of the mid-plane layer used for heat-map slices
    pub fn mid_plane(&self) -> usize {
        self.ngrid_z / 2
    }

    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    pub fn hit_counts(&self) -> &[u64] {
        &self.hits
    }

    /// Split borrow of the counters alongside the immutable mask
    pub(crate) fn counters_mut(&mut self) -> (&mut [u64], &[bool]) {
        (&mut self.hits, &self.mask)
    }
}

#[inline]
fn axis_cell(value: f64, origin: f64, size: f64, n: usize) -> Option<usize> {
    let t = (value - origin) / size;
    if !(t >= 0.0) || t > n as f64 {
        return None;
    }
    Some((t.floor() as usize).min(n - 1))
}
