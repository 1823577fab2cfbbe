//! Terraced marching-squares terrain meshing.
//!
//! Converts a per-vertex heightmap into watertight floor and wall geometry,
//! one cell at a time. See [`marching_squares::generate_cell`].

pub mod config;
pub mod grid;
pub mod marching_squares;

pub use config::{ConfigError, TerrainConfig};
pub use grid::{GridError, HeightField};
pub use marching_squares::{
    compute_boundary_profile, generate_cell, generate_cell_traced, match_case, validate,
    validate_with_bounds, BlendMode, BoundaryProfile, CaseId, CellContext, CellGeometry,
    CellOutcome, Color, CornerPaint, MergeMode, TextureIndex, ValidationResult,
};
