//! Cell plans: floor regions over the nine cell points, turned into triangles.
//!
//! Builders describe a cell as a tiling of convex polygons whose vertices are
//! corners, edge midpoints or the cell center, each carrying its own height.
//! [`CellPlan::emit`] fans every region into floor triangles and raises a
//! wall strip along each plan edge where two regions meet at different
//! heights. A strip is split at every height used at its end points, so all
//! vertical seams are shared by exactly two triangles.

use glam::Vec2;

use super::boundary::BoundaryProfile;
use super::cell_context::CellFrame;
use super::types::CellGeometry;
use super::vertex::VertexEncoder;

/// One of the nine points of a cell, in world (unrotated) slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum PlanPoint {
    /// Corner slot in `[A, B, D, C]` order.
    Corner(u8),
    /// Midpoint of edge `i`, between `Corner(i)` and `Corner(i + 1)`.
    Mid(u8),
    Center,
}

const POINT_COUNT: usize = 9;

impl PlanPoint {
    /// Cell-local `(x, z)` position.
    pub(super) fn local(self) -> Vec2 {
        match self {
            PlanPoint::Corner(k) => match k % 4 {
                0 => Vec2::new(0.0, 0.0),
                1 => Vec2::new(1.0, 0.0),
                2 => Vec2::new(1.0, 1.0),
                _ => Vec2::new(0.0, 1.0),
            },
            PlanPoint::Mid(k) => match k % 4 {
                0 => Vec2::new(0.5, 0.0),
                1 => Vec2::new(1.0, 0.5),
                2 => Vec2::new(0.5, 1.0),
                _ => Vec2::new(0.0, 0.5),
            },
            PlanPoint::Center => Vec2::new(0.5, 0.5),
        }
    }

    fn slot(self) -> usize {
        match self {
            PlanPoint::Corner(k) => (k % 4) as usize,
            PlanPoint::Mid(k) => 4 + (k % 4) as usize,
            PlanPoint::Center => 8,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct FloorVertex {
    pub point: PlanPoint,
    pub height: f32,
}

impl<'a> CellFrame<'a> {
    /// Rotated corner `k` at its own height.
    pub(super) fn corner_vertex(&self, k: usize) -> FloorVertex {
        FloorVertex {
            point: PlanPoint::Corner(self.world(k) as u8),
            height: self.height(k),
        }
    }

    /// Midpoint of rotated edge `edge` on the side of rotated corner `toward`.
    pub(super) fn mid_vertex(&self, edge: usize, toward: usize) -> FloorVertex {
        FloorVertex {
            point: PlanPoint::Mid(self.world(edge) as u8),
            height: self.profile(edge).height_toward(self.height(toward)),
        }
    }

    /// Midpoint of rotated edge `edge` at whichever side lies closer to
    /// `level`. Ties go to the edge's first corner.
    pub(super) fn mid_vertex_near(&self, edge: usize, level: f32) -> FloorVertex {
        let first = self.mid_vertex(edge, edge);
        let second = self.mid_vertex(edge, (edge + 1) % 4);
        if (second.height - level).abs() < (first.height - level).abs() {
            second
        } else {
            first
        }
    }

    pub(super) fn center_vertex(&self, height: f32) -> FloorVertex {
        FloorVertex {
            point: PlanPoint::Center,
            height,
        }
    }
}

/// Convex floor polygon, counter-clockwise in `(x, z)`.
#[derive(Clone, Debug, PartialEq)]
pub(super) struct Region {
    pub vertices: Vec<FloorVertex>,
}

#[inline]
fn cross(o: Vec2, a: Vec2, b: Vec2) -> f32 {
    (a - o).perp_dot(b - o)
}

impl Region {
    pub(super) fn new(vertices: Vec<FloorVertex>) -> Self {
        Self { vertices }
    }

    fn signed_area(&self) -> f32 {
        let n = self.vertices.len();
        let mut twice = 0.0;
        for i in 0..n {
            let a = self.vertices[i].point.local();
            let b = self.vertices[(i + 1) % n].point.local();
            twice += a.perp_dot(b);
        }
        twice * 0.5
    }

    /// First vertex that fans the polygon without degenerate triangles.
    fn fan_apex(&self) -> Option<usize> {
        let n = self.vertices.len();
        if n < 3 {
            return None;
        }
        (0..n).find(|&apex| {
            let o = self.vertices[apex].point.local();
            (1..n - 1).all(|j| {
                let a = self.vertices[(apex + j) % n].point.local();
                let b = self.vertices[(apex + j + 1) % n].point.local();
                cross(o, a, b) > 0.0
            })
        })
    }

    fn edges(&self) -> impl Iterator<Item = (PlanPoint, PlanPoint)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i].point, self.vertices[(i + 1) % n].point))
    }

    fn height_at(&self, point: PlanPoint) -> Option<f32> {
        self.vertices
            .iter()
            .find(|v| v.point == point)
            .map(|v| v.height)
    }
}

#[derive(Clone, Debug, Default)]
pub(super) struct CellPlan {
    regions: Vec<Region>,
}

impl CellPlan {
    pub(super) fn new() -> Self {
        Self::default()
    }

    pub(super) fn push(&mut self, region: Region) {
        self.regions.push(region);
    }

    pub(super) fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Check that the plan tiles the cell and agrees with the edge profiles.
    ///
    /// Corners must sit at their corner height, and a midpoint next to a
    /// corner must sit at the profile height on that corner's side, so both
    /// cells sharing an edge produce the same seam. Regions must also meet
    /// edge to edge, see [`CellPlan::edges_pair_up`].
    pub(super) fn is_consistent(&self, heights: &[f32; 4], profiles: &[BoundaryProfile; 4]) -> bool {
        if self.regions.is_empty() {
            return false;
        }

        let mut area = 0.0;
        for region in &self.regions {
            let n = region.vertices.len();
            if n < 3 {
                return false;
            }
            let region_area = region.signed_area();
            if region_area <= 0.0 || region.fan_apex().is_none() {
                return false;
            }
            area += region_area;

            for i in 0..n {
                let v = region.vertices[i];
                if !v.height.is_finite() {
                    return false;
                }
                match v.point {
                    PlanPoint::Corner(k) => {
                        if v.height != heights[k as usize] {
                            return false;
                        }
                    }
                    PlanPoint::Mid(e) => {
                        let e = e as usize;
                        let ends = [e, (e + 1) % 4];
                        let profile = &profiles[e];
                        let toward = ends.map(|k| profile.height_toward(heights[k]));
                        if !toward.contains(&v.height) {
                            return false;
                        }
                        let prev = region.vertices[(i + n - 1) % n].point;
                        let next = region.vertices[(i + 1) % n].point;
                        for (k, expected) in ends.iter().zip(toward) {
                            let corner = PlanPoint::Corner(*k as u8);
                            if (prev == corner || next == corner) && v.height != expected {
                                return false;
                            }
                        }
                    }
                    PlanPoint::Center => {}
                }
            }
        }
        area == 1.0 && self.edges_pair_up()
    }

    /// Every interior plan edge is walked once in each direction, and no
    /// region runs along the cell border from corner to corner past a
    /// midpoint the neighbouring cell may split at.
    fn edges_pair_up(&self) -> bool {
        let edges: Vec<(PlanPoint, PlanPoint)> =
            self.regions.iter().flat_map(Region::edges).collect();
        let count = |edge: (PlanPoint, PlanPoint)| edges.iter().filter(|&&e| e == edge).count();

        edges.iter().all(|&(p, q)| {
            if count((p, q)) != 1 {
                return false;
            }
            if on_cell_border(p, q) {
                !matches!((p, q), (PlanPoint::Corner(_), PlanPoint::Corner(_)))
            } else {
                count((q, p)) == 1
            }
        })
    }

    /// Triangulate the plan into `geometry`.
    pub(super) fn emit(&self, encoder: &VertexEncoder, geometry: &mut CellGeometry) {
        let regions: Vec<Region> = self
            .regions
            .iter()
            .map(|r| Region {
                vertices: r
                    .vertices
                    .iter()
                    .map(|v| FloorVertex {
                        point: v.point,
                        // Drop negative zero so equal heights compare bit-exact.
                        height: v.height + 0.0,
                    })
                    .collect(),
            })
            .collect();

        let levels = collect_levels(&regions);

        for region in &regions {
            emit_floor(region, &levels, encoder, geometry);
        }
        for (i, first) in regions.iter().enumerate() {
            let n = first.vertices.len();
            for j in 0..n {
                let p = first.vertices[j];
                let q = first.vertices[(j + 1) % n];
                let Some(second) = regions[i + 1..]
                    .iter()
                    .find(|r| has_directed_edge(r, q.point, p.point))
                else {
                    continue;
                };
                let (Some(p_other), Some(q_other)) =
                    (second.height_at(p.point), second.height_at(q.point))
                else {
                    continue;
                };
                if p.height == p_other && q.height == q_other {
                    continue;
                }
                let p_chain = chain(&levels[p.point.slot()], p.height, p_other);
                let q_chain = chain(&levels[q.point.slot()], q.height, q_other);
                emit_wall(p.point, &p_chain, q.point, &q_chain, encoder, geometry);
            }
        }
    }
}

fn on_cell_border(p: PlanPoint, q: PlanPoint) -> bool {
    let (a, b) = (p.local(), q.local());
    (a.x == b.x && (a.x == 0.0 || a.x == 1.0)) || (a.y == b.y && (a.y == 0.0 || a.y == 1.0))
}

fn has_directed_edge(region: &Region, from: PlanPoint, to: PlanPoint) -> bool {
    let n = region.vertices.len();
    (0..n).any(|i| region.vertices[i].point == from && region.vertices[(i + 1) % n].point == to)
}

/// Distinct heights used at each plan point, ascending.
fn collect_levels(regions: &[Region]) -> [Vec<f32>; POINT_COUNT] {
    let mut levels: [Vec<f32>; POINT_COUNT] = Default::default();
    for v in regions.iter().flat_map(|r| r.vertices.iter()) {
        levels[v.point.slot()].push(v.height);
    }
    for list in &mut levels {
        list.sort_by(f32::total_cmp);
        list.dedup_by(|a, b| a.to_bits() == b.to_bits());
    }
    levels
}

/// Heights from `from` to `to`, passing through every level strictly between.
fn chain(levels: &[f32], from: f32, to: f32) -> Vec<f32> {
    let (lo, hi) = if from <= to { (from, to) } else { (to, from) };
    let mut out = Vec::with_capacity(levels.len() + 2);
    out.push(from);
    if from <= to {
        out.extend(levels.iter().copied().filter(|&h| h > lo && h < hi));
    } else {
        out.extend(levels.iter().rev().copied().filter(|&h| h > lo && h < hi));
    }
    if to != from {
        out.push(to);
    }
    out
}

fn floor_uv(levels: &[f32], height: f32) -> Vec2 {
    let wall_foot = levels.last().is_some_and(|&top| height < top);
    let cliff_top = levels.first().is_some_and(|&bottom| height > bottom);
    Vec2::new(
        if wall_foot { 1.0 } else { 0.0 },
        if cliff_top { 1.0 } else { 0.0 },
    )
}

fn emit_floor(
    region: &Region,
    levels: &[Vec<f32>; POINT_COUNT],
    encoder: &VertexEncoder,
    geometry: &mut CellGeometry,
) {
    let Some(apex) = region.fan_apex() else {
        return;
    };
    let n = region.vertices.len();
    let mut add = |v: FloorVertex| {
        let uv = floor_uv(&levels[v.point.slot()], v.height);
        encoder.add_point(
            geometry,
            v.point.local(),
            v.height,
            uv,
            true,
            v.point == PlanPoint::Center,
        );
    };
    for j in 1..n - 1 {
        add(region.vertices[apex]);
        add(region.vertices[(apex + j) % n]);
        add(region.vertices[(apex + j + 1) % n]);
    }
}

/// Vertical strip between chains at `p` and `q`, facing the higher side.
fn emit_wall(
    p: PlanPoint,
    p_chain: &[f32],
    q: PlanPoint,
    q_chain: &[f32],
    encoder: &VertexEncoder,
    geometry: &mut CellGeometry,
) {
    let (p_local, q_local) = (p.local(), q.local());
    let mut add = |local: Vec2, height: f32| {
        encoder.add_point(geometry, local, height, Vec2::ONE, false, false);
    };
    let p0 = p_chain[0];
    for k in 0..q_chain.len() - 1 {
        add(p_local, p0);
        add(q_local, q_chain[k + 1]);
        add(q_local, q_chain[k]);
    }
    let q_last = q_chain[q_chain.len() - 1];
    for k in 0..p_chain.len() - 1 {
        add(q_local, q_last);
        add(p_local, p_chain[k]);
        add(p_local, p_chain[k + 1]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marching_squares::cell_context::CellContext;

    fn corner(k: u8, height: f32) -> FloorVertex {
        FloorVertex {
            point: PlanPoint::Corner(k),
            height,
        }
    }

    fn mid(k: u8, height: f32) -> FloorVertex {
        FloorVertex {
            point: PlanPoint::Mid(k),
            height,
        }
    }

    fn center(height: f32) -> FloorVertex {
        FloorVertex {
            point: PlanPoint::Center,
            height,
        }
    }

    fn quadrants(ctx: &CellContext, centers: [f32; 4]) -> CellPlan {
        let profiles = ctx.profiles();
        let frame = CellFrame::new(&ctx.heights, &profiles, ctx.merge_threshold());
        let mut plan = CellPlan::new();
        for k in 0..4 {
            plan.push(Region::new(vec![
                frame.corner_vertex(k),
                frame.mid_vertex(k, k),
                frame.center_vertex(centers[k]),
                frame.mid_vertex((k + 3) % 4, k),
            ]));
        }
        plan
    }

    #[test]
    fn chain_includes_levels_between() {
        let levels = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(chain(&levels, 0.0, 3.0), vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(chain(&levels, 3.0, 1.0), vec![3.0, 2.0, 1.0]);
        assert_eq!(chain(&levels, 2.0, 2.0), vec![2.0]);
    }

    #[test]
    fn fan_skips_collinear_apex() {
        let upper_half = Region::new(vec![
            corner(0, 0.0),
            mid(0, 0.0),
            corner(1, 0.0),
            mid(1, 0.0),
            mid(3, 0.0),
        ]);
        assert_eq!(upper_half.fan_apex(), Some(1));
        assert_eq!(upper_half.signed_area(), 0.5);
    }

    #[test]
    fn quadrants_tile_the_cell() {
        let ctx = CellContext::test_default([0.0, 0.5, 1.0, 0.5]);
        let plan = quadrants(&ctx, [0.5; 4]);
        assert!(plan.is_consistent(&ctx.heights, &ctx.profiles()));
    }

    #[test]
    fn wrong_midpoint_height_is_rejected() {
        let ctx = CellContext::test_default([5.0, 0.0, 0.0, 0.0]);
        let profiles = ctx.profiles();
        let mut plan = CellPlan::new();
        // Corner triangle at A using the lower side of both walls.
        plan.push(Region::new(vec![corner(0, 5.0), mid(0, 0.0), mid(3, 0.0)]));
        plan.push(Region::new(vec![
            mid(0, 0.0),
            corner(1, 0.0),
            mid(1, 0.0),
            corner(2, 0.0),
            mid(2, 0.0),
            corner(3, 0.0),
            mid(3, 0.0),
        ]));
        assert!(!plan.is_consistent(&ctx.heights, &profiles));
    }

    #[test]
    fn partial_tiling_is_rejected() {
        let ctx = CellContext::test_default([0.0; 4]);
        let mut plan = CellPlan::new();
        plan.push(Region::new(vec![corner(0, 0.0), mid(0, 0.0), mid(3, 0.0)]));
        assert!(!plan.is_consistent(&ctx.heights, &ctx.profiles()));
    }

    #[test]
    fn border_edge_must_stop_at_midpoint() {
        let ctx = CellContext::test_default([0.0; 4]);
        let mut plan = CellPlan::new();
        plan.push(Region::new(vec![
            corner(0, 0.0),
            mid(0, 0.0),
            corner(1, 0.0),
            mid(1, 0.0),
            mid(3, 0.0),
        ]));
        // Runs D to C directly, skipping the DC midpoint.
        plan.push(Region::new(vec![mid(3, 0.0), mid(1, 0.0), corner(2, 0.0), corner(3, 0.0)]));
        assert!(!plan.is_consistent(&ctx.heights, &ctx.profiles()));
    }

    #[test]
    fn interior_t_junction_is_rejected() {
        let ctx = CellContext::test_default([0.0; 4]);
        let mut plan = CellPlan::new();
        plan.push(Region::new(vec![
            corner(0, 0.0),
            mid(0, 0.0),
            corner(1, 0.0),
            mid(1, 0.0),
            mid(3, 0.0),
        ]));
        // The lower half split at the center leaves mCA..mBD without a twin.
        plan.push(Region::new(vec![mid(3, 0.0), center(0.0), mid(2, 0.0), corner(3, 0.0)]));
        plan.push(Region::new(vec![center(0.0), mid(1, 0.0), corner(2, 0.0), mid(2, 0.0)]));
        assert!(!plan.is_consistent(&ctx.heights, &ctx.profiles()));
    }

    #[test]
    fn nearest_midpoint_side() {
        // CA is a wall from 0 up to 4.
        let ctx = CellContext::test_default([0.0, 0.0, 0.0, 4.0]);
        let profiles = ctx.profiles();
        let frame = CellFrame::new(&ctx.heights, &profiles, ctx.merge_threshold());
        assert_eq!(frame.mid_vertex_near(3, 3.0).height, 4.0);
        assert_eq!(frame.mid_vertex_near(3, 1.0).height, 0.0);
        // Equal distance keeps the side of corner 3 (C).
        assert_eq!(frame.mid_vertex_near(3, 2.0).height, 4.0);
    }

    #[test]
    fn stepped_quadrants_raise_walls() {
        let ctx = CellContext::test_default([4.0, 0.0, 0.0, 0.0]);
        let plan = quadrants(&ctx, [4.0, 0.0, 0.0, 0.0]);
        assert!(plan.is_consistent(&ctx.heights, &ctx.profiles()));

        let encoder = VertexEncoder::new(&ctx, &ctx.profiles());
        let mut geometry = CellGeometry::default();
        plan.emit(&encoder, &mut geometry);

        let floors = (0..geometry.triangle_count())
            .filter(|&t| geometry.is_floor_triangle(t))
            .count();
        assert_eq!(floors, 8);
        // Two rectangular walls from the raised quadrant, two triangles each.
        assert_eq!(geometry.triangle_count() - floors, 4);
        assert!(crate::marching_squares::validate(&geometry).is_watertight);
    }

    #[test]
    fn wall_feet_and_cliff_tops_get_uvs() {
        let ctx = CellContext::test_default([4.0, 0.0, 0.0, 0.0]);
        let plan = quadrants(&ctx, [4.0, 0.0, 0.0, 0.0]);
        let encoder = VertexEncoder::new(&ctx, &ctx.profiles());
        let mut geometry = CellGeometry::default();
        plan.emit(&encoder, &mut geometry);

        for (i, v) in geometry.verts.iter().enumerate() {
            if !geometry.is_floor[i] {
                assert_eq!(geometry.uvs[i], Vec2::ONE);
            } else if v.x == 1.0 && v.z == 0.0 {
                // Midpoint of AB, world cell size 2.
                let expected = if v.y > 0.0 { Vec2::new(0.0, 1.0) } else { Vec2::new(1.0, 0.0) };
                assert_eq!(geometry.uvs[i], expected);
            }
        }
    }

    #[test]
    fn emitted_triangles_face_up() {
        let ctx = CellContext::test_default([0.0, 0.3, 0.6, 0.3]);
        let plan = quadrants(&ctx, [0.3; 4]);
        let encoder = VertexEncoder::new(&ctx, &ctx.profiles());
        let mut geometry = CellGeometry::default();
        plan.emit(&encoder, &mut geometry);
        for t in 0..geometry.triangle_count() {
            let [a, b, c] = geometry.triangle(t);
            let ab = Vec2::new(b.x - a.x, b.z - a.z);
            let ac = Vec2::new(c.x - a.x, c.z - a.z);
            assert!(ab.perp_dot(ac) > 0.0);
        }
    }

    #[test]
    fn center_levels_split_walls() {
        let mut plan = CellPlan::new();
        let heights = [0.0, 0.0, 0.0, 0.0];
        let ctx = CellContext::test_default(heights);
        // Three distinct center heights meeting at E.
        let centers = [0.0, 1.0, 2.0, 1.0];
        for k in 0..4u8 {
            plan.push(Region::new(vec![
                corner(k, 0.0),
                mid(k, 0.0),
                center(centers[k as usize]),
                mid((k + 3) % 4, 0.0),
            ]));
        }
        let encoder = VertexEncoder::new(&ctx, &ctx.profiles());
        let mut geometry = CellGeometry::default();
        plan.emit(&encoder, &mut geometry);
        assert!(crate::marching_squares::validate(&geometry).is_watertight);
    }
}
