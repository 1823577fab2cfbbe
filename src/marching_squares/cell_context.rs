use glam::{IVec2, Vec3};

use super::boundary::{compute_boundary_profile, BoundaryProfile};
use super::types::*;
use crate::config::TerrainConfig;

// Corner slots in `heights` and `paint`. The order walks around the cell, so
// C and D are swapped relative to row-major order.
pub const CORNER_A: usize = 0;
pub const CORNER_B: usize = 1;
pub const CORNER_D: usize = 2;
pub const CORNER_C: usize = 3;

/// Paint data sampled at one heightmap vertex.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CornerPaint {
    pub color_0: Color,
    pub color_1: Color,
    pub wall_color_0: Color,
    pub wall_color_1: Color,
    /// R = grass density seed.
    pub grass_mask: Color,
}

impl Default for CornerPaint {
    fn default() -> Self {
        Self {
            color_0: DEFAULT_TEXTURE_COLOR,
            color_1: DEFAULT_TEXTURE_COLOR,
            wall_color_0: DEFAULT_TEXTURE_COLOR,
            wall_color_1: DEFAULT_TEXTURE_COLOR,
            grass_mask: Color::from_rgba(1.0, 1.0, 1.0, 1.0),
        }
    }
}

impl CornerPaint {
    pub fn with_texture(mut self, texture: TextureIndex) -> Self {
        let (c0, c1) = texture.to_color_pair();
        self.color_0 = c0;
        self.color_1 = c1;
        self
    }

    pub fn with_wall_texture(mut self, texture: TextureIndex) -> Self {
        let (c0, c1) = texture.to_color_pair();
        self.wall_color_0 = c0;
        self.wall_color_1 = c1;
        self
    }

    pub fn texture(&self) -> TextureIndex {
        TextureIndex::from_color_pair(self.color_0, self.color_1)
    }
}

/// Everything needed to mesh one cell.
#[derive(Clone, Debug, PartialEq)]
pub struct CellContext {
    pub config: TerrainConfig,
    pub cell_coords: IVec2,
    /// Corner heights in `[A, B, D, C]` order.
    pub heights: [f32; 4],
    /// Corner paint in `[A, B, D, C]` order.
    pub paint: [CornerPaint; 4],
    /// World position of the owning chunk, used for wall UV2.
    pub chunk_position: Vec3,
}

impl CellContext {
    pub fn new(config: TerrainConfig, cell_coords: IVec2, heights: [f32; 4]) -> Self {
        Self {
            config,
            cell_coords,
            heights,
            paint: [CornerPaint::default(); 4],
            chunk_position: Vec3::ZERO,
        }
    }

    pub fn with_paint(mut self, paint: [CornerPaint; 4]) -> Self {
        self.paint = paint;
        self
    }

    #[cfg(test)]
    pub(crate) fn test_default(heights: [f32; 4]) -> Self {
        Self::new(TerrainConfig::default(), IVec2::ZERO, heights)
    }

    pub fn merge_threshold(&self) -> f32 {
        self.config.effective_merge_threshold()
    }

    /// Edge profiles in cyclic order `[AB, BD, DC, CA]`.
    ///
    /// Heights are passed in world order (A before B, B before D, C before D,
    /// A before C) so the neighbor sharing an edge passes the same pair.
    pub fn profiles(&self) -> [BoundaryProfile; 4] {
        let h = &self.heights;
        let t = self.merge_threshold();
        [
            compute_boundary_profile(h[CORNER_A], h[CORNER_B], t),
            compute_boundary_profile(h[CORNER_B], h[CORNER_D], t),
            compute_boundary_profile(h[CORNER_C], h[CORNER_D], t),
            compute_boundary_profile(h[CORNER_A], h[CORNER_C], t),
        ]
    }
}

/// Rotated view of a cell used while searching and building cases.
#[derive(Clone, Copy, Debug)]
pub(super) struct CellFrame<'a> {
    pub(super) heights: &'a [f32; 4],
    pub(super) profiles: &'a [BoundaryProfile; 4],
    pub(super) merge_threshold: f32,
    pub(super) rotation: usize,
}

impl<'a> CellFrame<'a> {
    pub(super) fn new(
        heights: &'a [f32; 4],
        profiles: &'a [BoundaryProfile; 4],
        merge_threshold: f32,
    ) -> Self {
        Self {
            heights,
            profiles,
            merge_threshold,
            rotation: 0,
        }
    }

    /// World slot of rotated corner (or edge) `k`.
    #[inline]
    pub(super) fn world(&self, k: usize) -> usize {
        (k + self.rotation) % 4
    }

    pub(super) fn rotated(&self, rotations: usize) -> Self {
        Self {
            rotation: (self.rotation + rotations) % 4,
            ..*self
        }
    }

    pub(super) fn height(&self, k: usize) -> f32 {
        self.heights[self.world(k)]
    }
    pub(super) fn profile(&self, edge: usize) -> &BoundaryProfile {
        &self.profiles[self.world(edge)]
    }

    pub(super) fn ay(&self) -> f32 {
        self.height(0)
    }
    pub(super) fn by(&self) -> f32 {
        self.height(1)
    }
    pub(super) fn dy(&self) -> f32 {
        self.height(2)
    }
    pub(super) fn cy(&self) -> f32 {
        self.height(3)
    }
    pub(super) fn ab(&self) -> bool {
        self.profile(0).is_merged()
    }
    pub(super) fn bd(&self) -> bool {
        self.profile(1).is_merged()
    }
    pub(super) fn cd(&self) -> bool {
        self.profile(2).is_merged()
    }
    pub(super) fn ac(&self) -> bool {
        self.profile(3).is_merged()
    }
    pub(super) fn is_higher(&self, a: f32, b: f32) -> bool {
        a - b >= self.merge_threshold
    }
    pub(super) fn is_merged(&self, a: f32, b: f32) -> bool {
        (a - b).abs() < self.merge_threshold
    }
}

/// Per-cell color data derived once before any vertex is emitted.
#[derive(Clone, Debug, Default)]
pub(super) struct CellColorState {
    // Boundaries
    pub min_height: f32,
    pub max_height: f32,
    pub is_boundary: bool,
    pub all_edges_blend_merged: bool,

    // Floor and wall colors at the lowest and highest corner
    pub floor_lower_color_0: Color,
    pub floor_upper_color_0: Color,
    pub floor_lower_color_1: Color,
    pub floor_upper_color_1: Color,
    pub wall_lower_color_0: Color,
    pub wall_upper_color_0: Color,
    pub wall_lower_color_1: Color,
    pub wall_upper_color_1: Color,

    // Textures
    pub material_a: TextureIndex,
    pub material_b: TextureIndex,
    pub material_c: TextureIndex,
}

impl CellColorState {
    pub(super) fn new(ctx: &CellContext, profiles: &[BoundaryProfile; 4]) -> Self {
        let mut state = Self {
            is_boundary: profiles.iter().any(BoundaryProfile::is_walled),
            ..Self::default()
        };
        state.calculate_boundary_colors(ctx);
        state.calculate_cell_material_pair(ctx);

        let blend_threshold = ctx.merge_threshold() * BLEND_EDGE_SENSITIVITY;
        let h = &ctx.heights;
        state.all_edges_blend_merged = (0..4).all(|i| (h[i] - h[(i + 1) % 4]).abs() < blend_threshold);
        state
    }

    fn calculate_boundary_colors(&mut self, ctx: &CellContext) {
        // Scan in row-major order so ties resolve A, B, C, D.
        let scan = [CORNER_A, CORNER_B, CORNER_C, CORNER_D];
        let mut min_idx = scan[0];
        let mut max_idx = scan[0];
        for &i in &scan[1..] {
            if ctx.heights[i] < ctx.heights[min_idx] {
                min_idx = i;
            }
            if ctx.heights[i] > ctx.heights[max_idx] {
                max_idx = i;
            }
        }
        self.min_height = ctx.heights[min_idx];
        self.max_height = ctx.heights[max_idx];

        let low = &ctx.paint[min_idx];
        let high = &ctx.paint[max_idx];

        // Floor boundary colors
        self.floor_lower_color_0 = low.color_0;
        self.floor_upper_color_0 = high.color_0;
        self.floor_lower_color_1 = low.color_1;
        self.floor_upper_color_1 = high.color_1;

        // Wall boundary colors
        self.wall_lower_color_0 = low.wall_color_0;
        self.wall_upper_color_0 = high.wall_color_0;
        self.wall_lower_color_1 = low.wall_color_1;
        self.wall_upper_color_1 = high.wall_color_1;
    }

    fn calculate_cell_material_pair(&mut self, ctx: &CellContext) {
        let mut counts = [0u8; TextureIndex::COUNT as usize];
        for i in [CORNER_A, CORNER_B, CORNER_C, CORNER_D] {
            counts[ctx.paint[i].texture().0 as usize] += 1;
        }

        // Find top 3 by linear scan
        let mut first = (0u8, 0u8); // (index, count)
        let mut second = (0u8, 0u8);
        let mut third = (0u8, 0u8);
        for (i, &count) in counts.iter().enumerate() {
            if count > first.1 {
                third = second;
                second = first;
                first = (i as u8, count);
            } else if count > second.1 {
                third = second;
                second = (i as u8, count);
            } else if count > third.1 {
                third = (i as u8, count);
            }
        }

        self.material_a = TextureIndex(first.0);
        self.material_b = if second.1 > 0 {
            TextureIndex(second.0)
        } else {
            self.material_a
        };
        self.material_c = if third.1 > 0 {
            TextureIndex(third.0)
        } else {
            self.material_b
        };
    }

    /// Pack the cell's three dominant materials and this vertex's weights.
    ///
    /// R = `(mat_a + mat_b * 16) / 255`, G = `mat_c / 15`, B/A = weights of
    /// mat_a and mat_b.
    pub(super) fn material_blend_data(
        &self,
        ctx: &CellContext,
        vertex_x: f32,
        vertex_z: f32,
        use_wall_colors: bool,
    ) -> Color {
        let texture_at = |corner: usize| {
            let paint = &ctx.paint[corner];
            if use_wall_colors {
                TextureIndex::from_color_pair(paint.wall_color_0, paint.wall_color_1)
            } else {
                TextureIndex::from_color_pair(paint.color_0, paint.color_1)
            }
        };

        // Bilinear interpolation weights
        let weight_a = (1.0 - vertex_x) * (1.0 - vertex_z);
        let weight_b = vertex_x * (1.0 - vertex_z);
        let weight_c = (1.0 - vertex_x) * vertex_z;
        let weight_d = vertex_x * vertex_z;

        let mut weight_material_a = 0.0f32;
        let mut weight_material_b = 0.0f32;
        let mut weight_material_c = 0.0f32;

        for (texture, weight) in [
            (texture_at(CORNER_A), weight_a),
            (texture_at(CORNER_B), weight_b),
            (texture_at(CORNER_C), weight_c),
            (texture_at(CORNER_D), weight_d),
        ] {
            if texture == self.material_a {
                weight_material_a += weight;
            } else if texture == self.material_b {
                weight_material_b += weight;
            } else if texture == self.material_c {
                weight_material_c += weight;
            }
        }

        let total_weight = weight_material_a + weight_material_b + weight_material_c;
        if total_weight > MIN_WEIGHT_THRESHOLD {
            weight_material_a /= total_weight;
            weight_material_b /= total_weight;
        }

        let packed_materials = (self.material_a.as_f32()
            + self.material_b.as_f32() * MATERIAL_PACK_SCALE)
            / MATERIAL_PACK_NORMALIZE;

        Color::from_rgba(
            packed_materials,
            self.material_c.as_f32() / MATERIAL_INDEX_SCALE,
            weight_material_a,
            weight_material_b,
        )
    }
}
