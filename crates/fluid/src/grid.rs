//! Uniform spatial grid for neighbour search.
//!
//! Cell size equals the smoothing radius, so a particle's neighbours are
//! always found within the 3x3 block of cells around its own. The full
//! bounding-box extent is allocated once; each tick the buckets are cleared
//! and refilled without releasing their capacity.

use glam::Vec2;

use crate::options::Aabb;

/// Integer cell coordinates `(i, j)` inside the grid.
pub type GridKey = (i32, i32);

/// Uniform grid mapping cells to the particles binned in them.
pub struct SpatialGrid {
    cell_size: f32,
    origin: Vec2,
    dims: (i32, i32),
    /// Row-major buckets of particle indices; one per cell.
    cells: Vec<Vec<usize>>,
}

impl SpatialGrid {
    /// Create a grid covering `bounds` with `cell_size`-sized cells.
    pub fn new(bounds: &Aabb, cell_size: f32) -> Self {
        let dims = Self::dims_for(bounds, cell_size);
        let total = (dims.0 as usize) * (dims.1 as usize);
        Self {
            cell_size,
            origin: bounds.min,
            dims,
            cells: vec![Vec::new(); total],
        }
    }

    fn dims_for(bounds: &Aabb, cell_size: f32) -> (i32, i32) {
        let extent = bounds.max - bounds.min;
        let nx = (extent.x / cell_size).ceil().max(1.0) as i32;
        let ny = (extent.y / cell_size).ceil().max(1.0) as i32;
        (nx, ny)
    }

    /// Re-derive the grid geometry if the bounds or cell size changed since
    /// construction. A no-op in the steady state, so bucket capacity is
    /// preserved across ticks.
    pub fn reconfigure(&mut self, bounds: &Aabb, cell_size: f32) {
        let dims = Self::dims_for(bounds, cell_size);
        if dims == self.dims && self.origin == bounds.min && self.cell_size == cell_size {
            return;
        }
        let total = (dims.0 as usize) * (dims.1 as usize);
        self.cell_size = cell_size;
        self.origin = bounds.min;
        self.dims = dims;
        self.cells = vec![Vec::new(); total];
    }

    /// Number of cells along each axis.
    pub fn dims(&self) -> (i32, i32) {
        self.dims
    }

    /// Cell key for a position: `floor((p - min) / cell_size)`, clamped to
    /// the grid so out-of-box predicted positions still bin to an edge cell.
    pub fn key_for(&self, position: Vec2) -> GridKey {
        let local = position - self.origin;
        let i = (local.x / self.cell_size)
            .floor()
            .clamp(0.0, (self.dims.0 - 1) as f32) as i32;
        let j = (local.y / self.cell_size)
            .floor()
            .clamp(0.0, (self.dims.1 - 1) as f32) as i32;
        (i, j)
    }

    fn flat_index(&self, key: GridKey) -> Option<usize> {
        let (i, j) = key;
        if i < 0 || j < 0 || i >= self.dims.0 || j >= self.dims.1 {
            return None;
        }
        Some(j as usize * self.dims.0 as usize + i as usize)
    }

    /// Empty every bucket, keeping allocated capacity.
    pub fn clear(&mut self) {
        for bucket in &mut self.cells {
            bucket.clear();
        }
    }

    /// Bin a particle index into the bucket for `key`.
    pub fn insert(&mut self, key: GridKey, particle: usize) {
        if let Some(idx) = self.flat_index(key) {
            self.cells[idx].push(particle);
        }
    }

    /// Particle indices currently binned in `key`; empty for keys outside
    /// the grid.
    pub fn cell(&self, key: GridKey) -> &[usize] {
        match self.flat_index(key) {
            Some(idx) => &self.cells[idx],
            None => &[],
        }
    }

    /// Iterate all cells as `(key, particle indices)` pairs, including the
    /// empty ones, for visualization overlays.
    pub fn iter(&self) -> impl Iterator<Item = (GridKey, &[usize])> + '_ {
        let nx = self.dims.0;
        self.cells.iter().enumerate().map(move |(idx, bucket)| {
            let key = ((idx as i32) % nx, (idx as i32) / nx);
            (key, bucket.as_slice())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> Aabb {
        Aabb {
            min: Vec2::ZERO,
            max: Vec2::new(500.0, 300.0),
        }
    }

    #[test]
    fn covers_full_extent() {
        let grid = SpatialGrid::new(&bounds(), 50.0);
        assert_eq!(grid.dims(), (10, 6));
    }

    #[test]
    fn key_mapping_floors() {
        let grid = SpatialGrid::new(&bounds(), 50.0);
        assert_eq!(grid.key_for(Vec2::new(0.0, 0.0)), (0, 0));
        assert_eq!(grid.key_for(Vec2::new(49.9, 49.9)), (0, 0));
        assert_eq!(grid.key_for(Vec2::new(50.0, 0.0)), (1, 0));
        assert_eq!(grid.key_for(Vec2::new(120.0, 260.0)), (2, 5));
    }

    #[test]
    fn out_of_box_positions_clamp_to_edge_cells() {
        let grid = SpatialGrid::new(&bounds(), 50.0);
        assert_eq!(grid.key_for(Vec2::new(-10.0, -10.0)), (0, 0));
        assert_eq!(grid.key_for(Vec2::new(1.0e6, 1.0e6)), (9, 5));
    }

    #[test]
    fn insert_and_lookup() {
        let mut grid = SpatialGrid::new(&bounds(), 50.0);
        grid.insert((2, 3), 7);
        grid.insert((2, 3), 9);
        assert_eq!(grid.cell((2, 3)), &[7, 9]);
        assert!(grid.cell((0, 0)).is_empty());
        assert!(grid.cell((-1, 0)).is_empty());
        assert!(grid.cell((10, 0)).is_empty());
    }

    #[test]
    fn clear_retains_bucket_capacity() {
        let mut grid = SpatialGrid::new(&bounds(), 50.0);
        for i in 0..32 {
            grid.insert((1, 1), i);
        }
        let cap_before = {
            let idx = 1 + grid.dims().0 as usize;
            grid.cells[idx].capacity()
        };
        grid.clear();
        let idx = 1 + grid.dims().0 as usize;
        assert!(grid.cell((1, 1)).is_empty());
        assert_eq!(grid.cells[idx].capacity(), cap_before);
    }

    #[test]
    fn reconfigure_is_noop_for_same_geometry() {
        let mut grid = SpatialGrid::new(&bounds(), 50.0);
        grid.insert((0, 0), 1);
        grid.reconfigure(&bounds(), 50.0);
        assert_eq!(grid.cell((0, 0)), &[1]);

        grid.reconfigure(&bounds(), 25.0);
        assert_eq!(grid.dims(), (20, 12));
        assert!(grid.cell((0, 0)).is_empty());
    }

    #[test]
    fn iter_yields_every_cell() {
        let mut grid = SpatialGrid::new(&bounds(), 100.0);
        grid.insert((1, 2), 4);
        let cells: Vec<_> = grid.iter().collect();
        assert_eq!(cells.len(), 5 * 3);
        let populated: Vec<_> = cells.iter().filter(|(_, b)| !b.is_empty()).collect();
        assert_eq!(populated.len(), 1);
        assert_eq!(populated[0].0, (1, 2));
        assert_eq!(populated[0].1, &[4]);
    }
}
