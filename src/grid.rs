//! Read-only heightmap grid that feeds cells to the mesher.
//!
//! Heights and paint are stored per vertex. Neighbouring cells read the same
//! vertex for their shared corner, so seams line up without any
//! cross-cell bookkeeping.

use glam::{IVec2, Vec2, Vec3};
use rayon::prelude::*;
use thiserror::Error;

use crate::config::TerrainConfig;
use crate::marching_squares::{generate_cell, CellContext, CellGeometry, CornerPaint};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GridError {
    #[error("grid needs at least 2x2 vertices, got {0}x{1}")]
    TooSmall(usize, usize),
    #[error("expected {expected} heights for the grid, got {actual}")]
    HeightCount { expected: usize, actual: usize },
}

/// Per-vertex heights and paint, row-major: index = `z * dim_x + x`.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightField {
    dim_x: usize,
    dim_z: usize,
    heights: Vec<f32>,
    paint: Vec<CornerPaint>,
    /// World position of the chunk this field belongs to.
    pub position: Vec3,
}

impl HeightField {
    /// Flat field of `dim_x * dim_z` vertices at height 0.
    pub fn new(dim_x: usize, dim_z: usize) -> Result<Self, GridError> {
        Self::from_heights(dim_x, dim_z, vec![0.0; dim_x * dim_z])
    }

    pub fn from_heights(dim_x: usize, dim_z: usize, heights: Vec<f32>) -> Result<Self, GridError> {
        if dim_x < 2 || dim_z < 2 {
            return Err(GridError::TooSmall(dim_x, dim_z));
        }
        let expected = dim_x * dim_z;
        if heights.len() != expected {
            return Err(GridError::HeightCount {
                expected,
                actual: heights.len(),
            });
        }
        Ok(Self {
            dim_x,
            dim_z,
            heights,
            paint: vec![CornerPaint::default(); expected],
            position: Vec3::ZERO,
        })
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Vertex counts along x and z.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.dim_x, self.dim_z)
    }

    /// Cell counts along x and z.
    pub fn cell_dimensions(&self) -> (usize, usize) {
        (self.dim_x - 1, self.dim_z - 1)
    }

    pub fn cell_count(&self) -> usize {
        let (cx, cz) = self.cell_dimensions();
        cx * cz
    }

    fn index(&self, x: usize, z: usize) -> Option<usize> {
        (x < self.dim_x && z < self.dim_z).then(|| z * self.dim_x + x)
    }

    pub fn height(&self, x: usize, z: usize) -> Option<f32> {
        self.index(x, z).map(|i| self.heights[i])
    }

    /// Set one vertex height. Out-of-range coordinates are ignored.
    pub fn set_height(&mut self, x: usize, z: usize, h: f32) {
        if let Some(i) = self.index(x, z) {
            self.heights[i] = h;
        }
    }

    pub fn paint(&self, x: usize, z: usize) -> Option<&CornerPaint> {
        self.index(x, z).map(|i| &self.paint[i])
    }

    pub fn set_paint(&mut self, x: usize, z: usize, paint: CornerPaint) {
        if let Some(i) = self.index(x, z) {
            self.paint[i] = paint;
        }
    }

    /// Context for the cell whose A corner is vertex `(x, z)`.
    ///
    /// Corners are read as A=(x,z), B=(x+1,z), D=(x+1,z+1), C=(x,z+1).
    pub fn cell_context(&self, x: usize, z: usize, config: TerrainConfig) -> Option<CellContext> {
        let a = self.index(x, z)?;
        let b = self.index(x + 1, z)?;
        let d = self.index(x + 1, z + 1)?;
        let c = self.index(x, z + 1)?;

        let heights = [self.heights[a], self.heights[b], self.heights[d], self.heights[c]];
        let paint = [self.paint[a], self.paint[b], self.paint[d], self.paint[c]];
        let mut ctx = CellContext::new(config, IVec2::new(x as i32, z as i32), heights)
            .with_paint(paint);
        ctx.chunk_position = self.position;
        Some(ctx)
    }

    /// Generate every cell in parallel. Results are in cell order,
    /// index = `z * (dim_x - 1) + x`.
    pub fn generate_all(&self, config: TerrainConfig) -> Vec<CellGeometry> {
        let config = config.sanitized();
        let (cells_x, _) = self.cell_dimensions();

        log::debug!(
            "generating {} cells on {} threads",
            self.cell_count(),
            rayon::current_num_threads()
        );

        (0..self.cell_count())
            .into_par_iter()
            .map(|i| {
                let (x, z) = (i % cells_x, i / cells_x);
                self.cell_context(x, z, config)
                    .map(|ctx| generate_cell(&ctx))
                    .unwrap_or_default()
            })
            .collect()
    }

    /// All cells merged into one triangle soup.
    pub fn generate_merged(&self, config: TerrainConfig) -> CellGeometry {
        let mut merged = CellGeometry::default();
        for cell in self.generate_all(config) {
            merged.append(&cell);
        }
        merged
    }

    /// World-space `(x, z)` rectangle covered by the cells, relative to `position`.
    pub fn bounds(&self, config: &TerrainConfig) -> (Vec2, Vec2) {
        let (cx, cz) = self.cell_dimensions();
        (Vec2::ZERO, Vec2::new(cx as f32, cz as f32) * config.cell_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marching_squares::{validate_with_bounds, MergeMode, TextureIndex};

    fn terraced(dim: usize) -> HeightField {
        let mut heights = Vec::with_capacity(dim * dim);
        for z in 0..dim {
            for x in 0..dim {
                // Mix of steps, ramps and pits.
                let h = ((x * 7 + z * 3) % 5) as f32 * 0.9 + if (x + z) % 4 == 0 { 2.5 } else { 0.0 };
                heights.push(h);
            }
        }
        HeightField::from_heights(dim, dim, heights).unwrap()
    }

    #[test]
    fn rejects_bad_dimensions() {
        assert_eq!(HeightField::new(1, 4), Err(GridError::TooSmall(1, 4)));
        assert_eq!(
            HeightField::from_heights(3, 3, vec![0.0; 8]),
            Err(GridError::HeightCount {
                expected: 9,
                actual: 8
            })
        );
    }

    #[test]
    fn cell_context_reads_corners_in_cell_order() {
        let field = HeightField::from_heights(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let ctx = field.cell_context(0, 0, TerrainConfig::default()).unwrap();
        // Row-major [A, B, C, D] becomes [A, B, D, C].
        assert_eq!(ctx.heights, [1.0, 2.0, 4.0, 3.0]);
        assert!(field.cell_context(1, 0, TerrainConfig::default()).is_none());
    }

    #[test]
    fn cell_context_carries_paint_and_position() {
        let mut field = HeightField::new(3, 3)
            .unwrap()
            .with_position(Vec3::new(10.0, 0.0, 20.0));
        let painted = CornerPaint::default().with_texture(TextureIndex(5));
        field.set_paint(2, 2, painted);

        let ctx = field.cell_context(1, 1, TerrainConfig::default()).unwrap();
        assert_eq!(ctx.cell_coords, IVec2::new(1, 1));
        assert_eq!(ctx.paint[2].texture(), TextureIndex(5));
        assert_eq!(ctx.paint[0], CornerPaint::default());
        assert_eq!(ctx.chunk_position, Vec3::new(10.0, 0.0, 20.0));
    }

    #[test]
    fn set_height_ignores_out_of_range() {
        let mut field = HeightField::new(2, 2).unwrap();
        field.set_height(5, 0, 9.0);
        field.set_height(1, 1, 9.0);
        assert_eq!(field.height(1, 1), Some(9.0));
        assert_eq!(field.height(5, 0), None);
    }

    #[test]
    fn parallel_matches_sequential() {
        let field = terraced(9);
        let config = TerrainConfig::default();
        let parallel = field.generate_all(config);

        let (cx, cz) = field.cell_dimensions();
        let mut sequential = Vec::new();
        for z in 0..cz {
            for x in 0..cx {
                sequential.push(generate_cell(&field.cell_context(x, z, config).unwrap()));
            }
        }
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn whole_grid_is_watertight() {
        for mode in MergeMode::ALL {
            let config = TerrainConfig::default().with_merge_mode(mode);
            let field = terraced(12);
            let merged = field.generate_merged(config);
            let (min, max) = field.bounds(&config);
            let result = validate_with_bounds(&merged, min, max);
            assert!(
                result.is_watertight,
                "{mode:?}: {} open edges, first {:?}",
                result.open_edges.len(),
                result.open_edges.first()
            );
            assert_eq!(merged.verts.len() % 3, 0);
        }
    }

    #[test]
    fn invalid_config_is_sanitized() {
        let field = terraced(4);
        let bad = TerrainConfig::default().with_merge_threshold(f32::NAN);
        assert_eq!(field.generate_all(bad), field.generate_all(TerrainConfig::default()));
    }
}
