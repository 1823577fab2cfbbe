//! Terrain-wide meshing parameters.
//!
//! Selected once per terrain or chunk and copied into every [`CellContext`].
//!
//! [`CellContext`]: crate::marching_squares::CellContext

use glam::Vec2;
use thiserror::Error;

use crate::marching_squares::{BlendMode, MergeMode};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("merge threshold must be a positive finite number, got {0}")]
    InvalidMergeThreshold(f32),
    #[error("cell size must be positive and finite, got ({0}, {1})")]
    InvalidCellSize(f32, f32),
    #[error("blend thresholds must satisfy 0 <= lower < upper <= 1, got {0}..{1}")]
    InvalidBlendThresholds(f32, f32),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainConfig {
    pub merge_threshold: f32,
    pub cell_size: Vec2,
    pub blend_mode: BlendMode,
    pub use_ridge_texture: bool,
    pub ridge_threshold: f32,
    // Boundary cells switch from the lower to the upper corner color between these
    // normalized heights.
    pub lower_threshold: f32,
    pub upper_threshold: f32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            merge_threshold: MergeMode::default().threshold(),
            cell_size: Vec2::new(2.0, 2.0),
            blend_mode: BlendMode::default(),
            use_ridge_texture: false,
            ridge_threshold: 1.0,
            lower_threshold: 0.3,
            upper_threshold: 0.7,
        }
    }
}

impl TerrainConfig {
    pub fn with_merge_mode(mut self, mode: MergeMode) -> Self {
        self.merge_threshold = mode.threshold();
        self
    }

    pub fn with_merge_threshold(mut self, threshold: f32) -> Self {
        self.merge_threshold = threshold;
        self
    }

    pub fn with_cell_size(mut self, cell_size: Vec2) -> Self {
        self.cell_size = cell_size;
        self
    }

    pub fn with_blend_mode(mut self, blend_mode: BlendMode) -> Self {
        self.blend_mode = blend_mode;
        self
    }

    pub fn with_ridge_texture(mut self, enabled: bool, threshold: f32) -> Self {
        self.use_ridge_texture = enabled;
        self.ridge_threshold = threshold;
        self
    }

    /// Threshold actually used for classification. Non-positive or non-finite
    /// values fall back to the Polyhedron default.
    #[inline]
    pub fn effective_merge_threshold(&self) -> f32 {
        if self.merge_threshold.is_finite() && self.merge_threshold > 0.0 {
            self.merge_threshold
        } else {
            MergeMode::default().threshold()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.merge_threshold.is_finite() && self.merge_threshold > 0.0) {
            return Err(ConfigError::InvalidMergeThreshold(self.merge_threshold));
        }
        let size = self.cell_size;
        if !(size.is_finite() && size.x > 0.0 && size.y > 0.0) {
            return Err(ConfigError::InvalidCellSize(size.x, size.y));
        }
        let (lower, upper) = (self.lower_threshold, self.upper_threshold);
        if !(0.0..=1.0).contains(&lower) || !(0.0..=1.0).contains(&upper) || lower >= upper {
            return Err(ConfigError::InvalidBlendThresholds(lower, upper));
        }
        Ok(())
    }

    /// Replace every invalid field with its default, logging what changed.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let mut config = self;
        while let Err(err) = config.validate() {
            log::warn!("TerrainConfig: {err}. Using default.");
            match err {
                ConfigError::InvalidMergeThreshold(_) => {
                    config.merge_threshold = defaults.merge_threshold
                }
                ConfigError::InvalidCellSize(..) => config.cell_size = defaults.cell_size,
                ConfigError::InvalidBlendThresholds(..) => {
                    config.lower_threshold = defaults.lower_threshold;
                    config.upper_threshold = defaults.upper_threshold;
                }
            }
        }
        config
    }
}
