use glam::{IVec2, Vec2, Vec3};

use crate::config::TerrainConfig;

use super::boundary::BoundaryProfile;
use super::cell_context::*;
use super::types::*;

struct ColorSampleParams {
    /// Corner colors in row-major order `[A, B, C, D]`.
    source: [Color; 4],
    lower_color: Color,
    upper_color: Color,
    lower_threshold: f32,
    upper_threshold: f32,
}

// ================================
// ===== Color Helpers ============
// ================================

pub fn get_dominant_color(c: Color) -> Color {
    ColorChannel::dominant(c).to_one_hot()
}

#[inline]
fn sanitize_float(value: f32, fallback: f32, label: &str, cell: IVec2) -> f32 {
    if value.is_finite() {
        value
    } else {
        log::warn!(
            "NaN/Inf {} at cell ({}, {}). Using {} fallback.",
            label,
            cell.x,
            cell.y,
            fallback
        );
        fallback
    }
}

#[inline]
fn preserve_high_channels(mut color: Color, a: Color, b: Color) -> Color {
    if a.r > DOMINANT_CHANNEL_THRESHOLD || b.r > DOMINANT_CHANNEL_THRESHOLD {
        color.r = 1.0;
    }
    if a.g > DOMINANT_CHANNEL_THRESHOLD || b.g > DOMINANT_CHANNEL_THRESHOLD {
        color.g = 1.0;
    }
    if a.b > DOMINANT_CHANNEL_THRESHOLD || b.b > DOMINANT_CHANNEL_THRESHOLD {
        color.b = 1.0;
    }
    if a.a > DOMINANT_CHANNEL_THRESHOLD || b.a > DOMINANT_CHANNEL_THRESHOLD {
        color.a = 1.0;
    }
    color
}

fn row_major(paint: &[CornerPaint; 4], pick: impl Fn(&CornerPaint) -> Color) -> [Color; 4] {
    [
        pick(&paint[CORNER_A]),
        pick(&paint[CORNER_B]),
        pick(&paint[CORNER_C]),
        pick(&paint[CORNER_D]),
    ]
}

// ================================
// ===== Vertex Generation ========
// ================================

/// Turns plan vertices into fully attributed mesh vertices for one cell.
pub(super) struct VertexEncoder<'a> {
    ctx: &'a CellContext,
    state: CellColorState,
    cell_size: Vec2,
}

impl<'a> VertexEncoder<'a> {
    pub(super) fn new(ctx: &'a CellContext, profiles: &[BoundaryProfile; 4]) -> Self {
        let mut cell_size = ctx.config.cell_size;
        if !(cell_size.is_finite() && cell_size.x > 0.0 && cell_size.y > 0.0) {
            log::warn!(
                "Invalid cell size {} at cell ({}, {}). Using default.",
                cell_size,
                ctx.cell_coords.x,
                ctx.cell_coords.y
            );
            cell_size = TerrainConfig::default().cell_size;
        }
        Self {
            ctx,
            state: CellColorState::new(ctx, profiles),
            cell_size,
        }
    }

    fn compute_vertex_color(
        &self,
        params: &ColorSampleParams,
        x: f32,
        y: f32,
        z: f32,
        diagonal_midpoint: bool,
    ) -> Color {
        let [a, b, c, d] = params.source;
        let blend_mode = self.ctx.config.blend_mode;

        if diagonal_midpoint {
            if blend_mode == BlendMode::Direct {
                return a;
            }
            let ad_color = a.lerp(d, 0.5);
            let bc_color = b.lerp(c, 0.5);
            let min = Color::from_rgba(
                ad_color.r.min(bc_color.r),
                ad_color.g.min(bc_color.g),
                ad_color.b.min(bc_color.b),
                ad_color.a.min(bc_color.a),
            );
            return preserve_high_channels(min, ad_color, bc_color);
        }

        if self.state.is_boundary {
            if blend_mode == BlendMode::Direct {
                return a;
            }
            let height_range = self.state.max_height - self.state.min_height;
            let height_factor = if height_range > MIN_HEIGHT_RANGE {
                ((y - self.state.min_height) / height_range).clamp(0.0, 1.0)
            } else {
                0.5
            };

            let c = if height_factor < params.lower_threshold {
                params.lower_color
            } else if height_factor > params.upper_threshold {
                params.upper_color
            } else {
                let blend_zone = params.upper_threshold - params.lower_threshold;
                let blend_factor = (height_factor - params.lower_threshold) / blend_zone;
                params.lower_color.lerp(params.upper_color, blend_factor)
            };
            return get_dominant_color(c);
        }

        match blend_mode {
            BlendMode::Direct => a,
            BlendMode::Interpolated => {
                let ab_color = a.lerp(b, x);
                let cd_color = c.lerp(d, x);
                get_dominant_color(ab_color.lerp(cd_color, z))
            }
        }
    }

    /// Encode one vertex at cell-local `local = (x, z)` and append it.
    ///
    /// `uv` is only used for floors; walls always get `(1, 1)`.
    pub(super) fn add_point(
        &self,
        geometry: &mut CellGeometry,
        local: Vec2,
        height: f32,
        uv: Vec2,
        floor: bool,
        diagonal_midpoint: bool,
    ) {
        let ctx = self.ctx;
        let config = &ctx.config;
        let cell = ctx.cell_coords;
        let x = sanitize_float(local.x, 0.5, "x", cell);
        let safe_height = sanitize_float(height, 0.0, "y", cell);
        let z = sanitize_float(local.y, 0.5, "z", cell);

        let uv = if floor { uv } else { Vec2::ONE };
        let near_cliff_top = uv.y > 1.0 - config.ridge_threshold;
        let is_ridge = floor && config.use_ridge_texture && near_cliff_top;
        let use_wall_colors = !floor || is_ridge;

        let state = &self.state;
        let params_0 = if use_wall_colors {
            ColorSampleParams {
                source: row_major(&ctx.paint, |p| p.wall_color_0),
                lower_color: state.wall_lower_color_0,
                upper_color: state.wall_upper_color_0,
                lower_threshold: config.lower_threshold,
                upper_threshold: config.upper_threshold,
            }
        } else {
            ColorSampleParams {
                source: row_major(&ctx.paint, |p| p.color_0),
                lower_color: state.floor_lower_color_0,
                upper_color: state.floor_upper_color_0,
                lower_threshold: config.lower_threshold,
                upper_threshold: config.upper_threshold,
            }
        };
        let params_1 = if use_wall_colors {
            ColorSampleParams {
                source: row_major(&ctx.paint, |p| p.wall_color_1),
                lower_color: state.wall_lower_color_1,
                upper_color: state.wall_upper_color_1,
                lower_threshold: COLOR_1_LOWER_THRESHOLD,
                upper_threshold: COLOR_1_UPPER_THRESHOLD,
            }
        } else {
            ColorSampleParams {
                source: row_major(&ctx.paint, |p| p.color_1),
                lower_color: state.floor_lower_color_1,
                upper_color: state.floor_upper_color_1,
                lower_threshold: COLOR_1_LOWER_THRESHOLD,
                upper_threshold: COLOR_1_UPPER_THRESHOLD,
            }
        };

        let color_0 = self.compute_vertex_color(&params_0, x, safe_height, z, diagonal_midpoint);
        let color_1 = self.compute_vertex_color(&params_1, x, safe_height, z, diagonal_midpoint);

        // Grass mask
        let mut grass_mask = ctx.paint[CORNER_A].grass_mask;
        grass_mask.g = if is_ridge { 1.0 } else { 0.0 };
        grass_mask.b = if floor { 1.0 } else { 0.0 };

        // Material blend
        let mut material_blend = state.material_blend_data(ctx, x, z, use_wall_colors);
        if floor && !state.all_edges_blend_merged {
            material_blend.a = WALL_BLEND_SENTINEL;
        }

        // Vertex position
        let cell_size = self.cell_size;
        let vertex = Vec3::new(
            (cell.x as f32 + x) * cell_size.x,
            safe_height,
            (cell.y as f32 + z) * cell_size.y,
        );

        // UV2
        let uv2 = if floor {
            Vec2::new(vertex.x, vertex.z) / cell_size
        } else {
            let global_position = vertex + ctx.chunk_position;
            Vec2::new(global_position.x, global_position.y)
                + Vec2::new(global_position.z, global_position.y)
        };

        geometry.verts.push(vertex);
        geometry.uvs.push(uv);
        geometry.uv2s.push(uv2);
        geometry.colors_0.push(color_0);
        geometry.colors_1.push(color_1);
        geometry.grass_mask.push(grass_mask);
        geometry.material_blend.push(material_blend);
        geometry.is_floor.push(floor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(ctx: &CellContext, local: Vec2, height: f32, uv: Vec2, floor: bool) -> CellGeometry {
        let encoder = VertexEncoder::new(ctx, &ctx.profiles());
        let mut geometry = CellGeometry::default();
        encoder.add_point(&mut geometry, local, height, uv, floor, false);
        geometry
    }

    fn painted(ctx: CellContext, textures: [u8; 4]) -> CellContext {
        ctx.with_paint(textures.map(|t| CornerPaint::default().with_texture(TextureIndex(t))))
    }

    #[test]
    fn position_uses_cell_coords_and_size() {
        let mut ctx = CellContext::test_default([0.0; 4]);
        ctx.cell_coords = IVec2::new(3, 1);
        let g = encode(&ctx, Vec2::new(0.5, 1.0), 2.5, Vec2::ZERO, true);
        assert_eq!(g.verts[0], Vec3::new(7.0, 2.5, 4.0));
        assert_eq!(g.uv2s[0], Vec2::new(3.5, 2.0));
    }

    #[test]
    fn non_finite_input_is_replaced() {
        let ctx = CellContext::test_default([0.0; 4]);
        let g = encode(&ctx, Vec2::new(f32::NAN, 0.0), f32::INFINITY, Vec2::ZERO, true);
        assert!(g.verts[0].is_finite());
        assert_eq!(g.verts[0], Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn invalid_cell_size_uses_default_spacing() {
        let mut ctx = CellContext::test_default([0.0; 4]);
        ctx.cell_coords = IVec2::new(3, 1);
        for bad in [Vec2::new(f32::NAN, 2.0), Vec2::new(0.0, 2.0), Vec2::splat(f32::INFINITY)] {
            ctx.config = ctx.config.with_cell_size(bad);
            let g = encode(&ctx, Vec2::new(0.5, 1.0), 2.5, Vec2::ZERO, true);
            assert_eq!(g.verts[0], Vec3::new(7.0, 2.5, 4.0), "{bad}");
            assert_eq!(g.uv2s[0], Vec2::new(3.5, 2.0));
        }
    }

    #[test]
    fn walls_get_unit_uv_and_chunk_uv2() {
        let mut ctx = CellContext::test_default([0.0; 4]);
        ctx.chunk_position = Vec3::new(10.0, 0.0, 20.0);
        let g = encode(&ctx, Vec2::new(0.0, 0.0), 1.0, Vec2::ZERO, false);
        assert_eq!(g.uvs[0], Vec2::ONE);
        assert_eq!(g.uv2s[0], Vec2::new(10.0 + 20.0, 2.0));
        assert!(!g.is_floor[0]);
        assert_eq!(g.grass_mask[0].b, 0.0);
    }

    #[test]
    fn direct_blend_uses_corner_a() {
        let ctx = painted(CellContext::test_default([0.0; 4]), [6, 1, 1, 1]);
        let (c0, c1) = TextureIndex(6).to_color_pair();
        let g = encode(&ctx, Vec2::new(1.0, 1.0), 0.0, Vec2::ZERO, true);
        assert_eq!(g.colors_0[0], c0);
        assert_eq!(g.colors_1[0], c1);
    }

    #[test]
    fn interpolated_blend_picks_nearest_corner() {
        let config = TerrainConfig::default().with_blend_mode(BlendMode::Interpolated);
        let mut ctx = painted(CellContext::test_default([0.0; 4]), [0, 5, 10, 15]);
        ctx.config = config;
        // Slot D sits at local (1, 1).
        let g = encode(&ctx, Vec2::new(0.9, 0.9), 0.0, Vec2::ZERO, true);
        let (c0, c1) = TextureIndex(10).to_color_pair();
        assert_eq!(g.colors_0[0], c0);
        assert_eq!(g.colors_1[0], c1);
    }

    #[test]
    fn boundary_cells_blend_by_height() {
        let config = TerrainConfig::default().with_blend_mode(BlendMode::Interpolated);
        let mut ctx = painted(CellContext::test_default([0.0, 0.0, 0.0, 5.0]), [2, 2, 2, 7]);
        ctx.config = config;
        let low = encode(&ctx, Vec2::new(0.5, 0.5), 0.0, Vec2::ZERO, true);
        let high = encode(&ctx, Vec2::new(0.5, 0.5), 5.0, Vec2::ZERO, true);
        assert_eq!(low.colors_0[0], TextureIndex(2).to_color_pair().0);
        assert_eq!(high.colors_0[0], TextureIndex(7).to_color_pair().0);
    }

    #[test]
    fn walled_cells_mark_floor_blend_sentinel() {
        let walled = CellContext::test_default([0.0, 0.0, 0.0, 5.0]);
        let g = encode(&walled, Vec2::ZERO, 0.0, Vec2::ZERO, true);
        assert_eq!(g.material_blend[0].a, WALL_BLEND_SENTINEL);
        let wall = encode(&walled, Vec2::ZERO, 0.0, Vec2::ZERO, false);
        assert_ne!(wall.material_blend[0].a, WALL_BLEND_SENTINEL);

        let flat = CellContext::test_default([0.0; 4]);
        let g = encode(&flat, Vec2::ZERO, 0.0, Vec2::ZERO, true);
        assert_ne!(g.material_blend[0].a, WALL_BLEND_SENTINEL);
    }

    #[test]
    fn ridge_flag_uses_wall_colors() {
        let mut ctx = CellContext::test_default([0.0; 4]);
        ctx.config = ctx.config.with_ridge_texture(true, 0.5);
        let wall_paint = CornerPaint::default().with_wall_texture(TextureIndex(9));
        ctx.paint = [wall_paint; 4];
        let top = encode(&ctx, Vec2::ZERO, 0.0, Vec2::new(0.0, 1.0), true);
        assert_eq!(top.grass_mask[0].g, 1.0);
        assert_eq!(top.colors_0[0], TextureIndex(9).to_color_pair().0);
        let plain = encode(&ctx, Vec2::ZERO, 0.0, Vec2::ZERO, true);
        assert_eq!(plain.grass_mask[0].g, 0.0);
        assert_eq!(plain.colors_0[0], DEFAULT_TEXTURE_COLOR);
    }

    #[test]
    fn diagonal_midpoint_keeps_saturated_channels() {
        let a = Color::from_rgba(1.0, 0.0, 0.0, 0.0);
        let b = Color::from_rgba(0.0, 1.0, 0.0, 0.0);
        let min = Color::from_rgba(0.0, 0.0, 0.0, 0.0);
        assert_eq!(
            preserve_high_channels(min, a, b),
            Color::from_rgba(1.0, 1.0, 0.0, 0.0)
        );
    }
}
