use std::borrow::Cow;

use super::boundary::compute_boundary_profile;
use super::cell_context::{CellContext, CellFrame};
use super::plan::CellPlan;
use super::primitives::*;
use super::types::{CellGeometry, MergeMode};
use super::vertex::VertexEncoder;

/// Geometric case of a cell, named from the rotated frame's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaseId {
    FullFloor,
    OuterCorner,
    Edge,
    EdgeOuterA,
    EdgeOuterB,
    DoubleInner,
    InnerCorner,
    InnerStepBD,
    InnerStepCD,
    InnerDiagonalOuter,
    InnerEdgeBD,
    InnerEdgeCD,
    SpiralClockwise,
    SpiralCounter,
    StaircaseABCD,
    StaircaseACBD,
    FadingEdge,
    OuterDiagonalInner,
    OuterDiagonalOuter,
    OuterStepB,
    OuterStepC,
    OuterInnerComposite,
    SingleWallAC,
    SingleWallBD,
}

impl CaseId {
    /// Patterns in priority order. The first match in the first rotation wins.
    pub const PATTERNS: [CaseId; 23] = [
        CaseId::OuterCorner,
        CaseId::Edge,
        CaseId::EdgeOuterA,
        CaseId::EdgeOuterB,
        CaseId::DoubleInner,
        CaseId::InnerCorner,
        CaseId::InnerStepBD,
        CaseId::InnerStepCD,
        CaseId::InnerDiagonalOuter,
        CaseId::InnerEdgeBD,
        CaseId::InnerEdgeCD,
        CaseId::SpiralClockwise,
        CaseId::SpiralCounter,
        CaseId::StaircaseABCD,
        CaseId::StaircaseACBD,
        CaseId::FadingEdge,
        CaseId::OuterDiagonalInner,
        CaseId::OuterDiagonalOuter,
        CaseId::OuterStepB,
        CaseId::OuterStepC,
        CaseId::OuterInnerComposite,
        CaseId::SingleWallAC,
        CaseId::SingleWallBD,
    ];

    /// Catalogue number, 0 for the all-merged floor.
    pub fn number(self) -> u8 {
        match self {
            CaseId::FullFloor => 0,
            other => {
                let index = Self::PATTERNS.iter().position(|&c| c == other).unwrap_or(0);
                index as u8 + 1
            }
        }
    }

    fn matches(self, f: &CellFrame) -> bool {
        let (a, b, c, d) = (f.ay(), f.by(), f.cy(), f.dy());
        let h = |x: f32, y: f32| f.is_higher(x, y);
        let m = |x: f32, y: f32| f.is_merged(x, y);
        match self {
            CaseId::FullFloor => f.ab() && f.bd() && f.cd() && f.ac(),
            CaseId::OuterCorner => h(a, b) && h(a, c) && f.bd() && f.cd(),
            CaseId::Edge => h(a, c) && h(b, d) && f.ab() && f.cd(),
            CaseId::EdgeOuterA => h(a, b) && h(a, c) && h(b, d) && f.cd(),
            CaseId::EdgeOuterB => h(b, a) && h(a, c) && h(b, d) && f.cd(),
            CaseId::DoubleInner => h(b, a) && h(c, a) && h(b, d) && h(c, d),
            CaseId::InnerCorner => h(b, a) && h(c, a) && f.bd() && f.cd(),
            CaseId::InnerStepBD => h(b, a) && h(c, a) && f.bd() && h(c, d),
            CaseId::InnerStepCD => h(b, a) && h(c, a) && f.cd() && h(b, d),
            CaseId::InnerDiagonalOuter => {
                h(b, a) && h(c, a) && h(b, d) && h(c, d) && m(b, c)
            }
            CaseId::InnerEdgeBD => h(b, a) && h(c, a) && h(d, c) && f.bd(),
            CaseId::InnerEdgeCD => h(b, a) && h(c, a) && h(d, b) && f.cd(),
            CaseId::SpiralClockwise => h(b, a) && h(d, b) && h(c, d) && h(c, a),
            CaseId::SpiralCounter => h(c, a) && h(d, c) && h(b, d) && h(b, a),
            CaseId::StaircaseABCD => h(b, a) && h(c, b) && h(d, c),
            CaseId::StaircaseACBD => h(c, a) && h(b, c) && h(d, b),
            CaseId::FadingEdge => h(a, c) && f.ab() && f.cd(),
            CaseId::OuterDiagonalInner => h(a, b) && h(a, c) && h(b, d) && h(c, d),
            CaseId::OuterDiagonalOuter => {
                h(a, b) && h(a, c) && m(b, c) && h(b, d) && h(c, d)
            }
            CaseId::OuterStepB => h(a, b) && h(a, c) && h(b, c) && !f.cd(),
            CaseId::OuterStepC => h(a, b) && h(a, c) && h(c, b) && !f.bd(),
            CaseId::OuterInnerComposite => h(a, b) && m(b, c) && !f.bd() && h(b, d),
            CaseId::SingleWallAC => f.ab() && f.bd() && f.cd() && h(a, c),
            CaseId::SingleWallBD => f.ab() && f.ac() && f.cd() && h(b, d),
        }
    }

    /// Append this case's regions for the rotated `frame`.
    fn build(self, frame: &CellFrame, plan: &mut CellPlan) {
        match self {
            CaseId::FullFloor => add_full_floor(frame, plan),
            CaseId::OuterCorner | CaseId::SingleWallAC => add_outer_corner(frame, plan, true),
            CaseId::Edge | CaseId::FadingEdge => add_edge(frame, plan, true, true, false, false),
            CaseId::EdgeOuterA => {
                add_outer_corner(frame, plan, false);
                add_edge(frame, plan, true, true, true, false);
            }
            CaseId::EdgeOuterB => {
                add_outer_corner(&frame.rotated(1), plan, false);
                add_edge(frame, plan, true, true, false, true);
            }
            CaseId::DoubleInner | CaseId::InnerDiagonalOuter => {
                add_inner_corner(frame, plan, UpperFloor::None);
                add_inner_corner(&frame.rotated(2), plan, UpperFloor::None);
                add_diagonal_floor(frame, plan);
            }
            CaseId::InnerCorner => add_inner_corner(frame, plan, UpperFloor::Full),
            CaseId::InnerStepBD => {
                // C peak over the B-D plateau.
                add_inner_corner(frame, plan, UpperFloor::None);
                add_outer_corner(&frame.rotated(3), plan, false);
                add_floor_around(frame, plan, [true, false, false, true]);
            }
            CaseId::InnerStepCD => {
                // B peak over the C-D plateau.
                add_inner_corner(frame, plan, UpperFloor::None);
                add_outer_corner(&frame.rotated(1), plan, false);
                add_floor_around(frame, plan, [true, true, false, false]);
            }
            CaseId::InnerEdgeBD => {
                add_inner_corner(frame, plan, UpperFloor::AlongC);
                add_edge(&frame.rotated(1), plan, false, true, false, false);
            }
            CaseId::InnerEdgeCD => {
                add_inner_corner(frame, plan, UpperFloor::AlongB);
                add_edge(frame, plan, true, false, false, false);
            }
            CaseId::SpiralClockwise => {
                add_inner_corner(frame, plan, UpperFloor::AlongB);
                add_outer_corner(&frame.rotated(3), plan, false);
                add_edge(&frame.rotated(2), plan, false, true, false, true);
            }
            CaseId::SpiralCounter => {
                add_inner_corner(frame, plan, UpperFloor::AlongC);
                add_outer_corner(&frame.rotated(1), plan, false);
                add_edge(&frame.rotated(1), plan, false, true, true, false);
            }
            CaseId::StaircaseABCD => {
                add_inner_corner(frame, plan, UpperFloor::AlongC);
                add_outer_corner(&frame.rotated(2), plan, false);
                add_edge(&frame.rotated(1), plan, false, true, false, true);
            }
            CaseId::StaircaseACBD => {
                add_inner_corner(frame, plan, UpperFloor::AlongB);
                add_outer_corner(&frame.rotated(2), plan, false);
                add_edge(&frame.rotated(2), plan, false, true, true, false);
            }
            CaseId::OuterDiagonalInner
            | CaseId::OuterDiagonalOuter
            | CaseId::OuterInnerComposite => {
                add_outer_corner(frame, plan, false);
                add_inner_corner(&frame.rotated(2), plan, UpperFloor::None);
                add_diagonal_floor(frame, plan);
            }
            CaseId::OuterStepB => {
                add_outer_corner(frame, plan, false);
                add_edge(frame, plan, false, true, true, false);
                add_edge(&frame.rotated(2), plan, false, true, false, true);
                add_outer_corner(&frame.rotated(3), plan, false);
            }
            CaseId::OuterStepC => {
                add_outer_corner(frame, plan, false);
                add_edge(&frame.rotated(3), plan, false, true, false, true);
                add_edge(&frame.rotated(1), plan, false, true, true, false);
                add_outer_corner(&frame.rotated(1), plan, false);
            }
            CaseId::SingleWallBD => add_outer_corner(&frame.rotated(1), plan, true),
        }
    }
}

/// How a cell's geometry was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellOutcome {
    Matched { case: CaseId, rotation: u8 },
    FlatFallback,
}

fn find_case(frame: &CellFrame) -> Option<(CaseId, u8)> {
    if CaseId::FullFloor.matches(frame) {
        return Some((CaseId::FullFloor, 0));
    }
    for rotation in 0..4u8 {
        let rotated = frame.rotated(rotation as usize);
        if let Some(&case) = CaseId::PATTERNS.iter().find(|case| case.matches(&rotated)) {
            return Some((case, rotation));
        }
    }
    None
}

/// Select the case and rotation for corner `heights` in `[A, B, D, C]` order.
///
/// Non-positive or non-finite thresholds fall back to the Polyhedron default.
pub fn match_case(heights: [f32; 4], merge_threshold: f32) -> Option<(CaseId, u8)> {
    let merge_threshold = if merge_threshold.is_finite() && merge_threshold > 0.0 {
        merge_threshold
    } else {
        MergeMode::default().threshold()
    };
    let profiles = [
        compute_boundary_profile(heights[0], heights[1], merge_threshold),
        compute_boundary_profile(heights[1], heights[2], merge_threshold),
        compute_boundary_profile(heights[3], heights[2], merge_threshold),
        compute_boundary_profile(heights[0], heights[3], merge_threshold),
    ];
    find_case(&CellFrame::new(&heights, &profiles, merge_threshold))
}

/// Full floor with every quadrant meeting at the average height. Corners and
/// edge midpoints still follow the edge profiles, so seams stay shared.
fn fallback_plan(frame: &CellFrame) -> CellPlan {
    let mut plan = CellPlan::new();
    add_full_floor(frame, &mut plan);
    plan
}

fn sanitized_heights(ctx: &CellContext) -> Cow<'_, CellContext> {
    if ctx.heights.iter().all(|h| h.is_finite()) {
        return Cow::Borrowed(ctx);
    }
    let cell = ctx.cell_coords;
    let mut owned = ctx.clone();
    for h in &mut owned.heights {
        if !h.is_finite() {
            log::warn!(
                "NaN/Inf corner height at cell ({}, {}). Using 0 fallback.",
                cell.x,
                cell.y
            );
            *h = 0.0;
        }
    }
    Cow::Owned(owned)
}

/// Generate geometry for a single cell.
pub fn generate_cell(ctx: &CellContext) -> CellGeometry {
    generate_cell_traced(ctx).0
}

/// Generate geometry for a single cell and report which case produced it.
pub fn generate_cell_traced(ctx: &CellContext) -> (CellGeometry, CellOutcome) {
    let ctx = sanitized_heights(ctx);
    let ctx = ctx.as_ref();
    let cell = ctx.cell_coords;
    let profiles = ctx.profiles();
    let frame = CellFrame::new(&ctx.heights, &profiles, ctx.merge_threshold());

    let mut plan = CellPlan::new();
    let mut outcome = match find_case(&frame) {
        Some((case, rotation)) => {
            case.build(&frame.rotated(rotation as usize), &mut plan);
            log::trace!(
                "cell ({}, {}): case {} ({:?}) rotation {}, {} regions",
                cell.x,
                cell.y,
                case.number(),
                case,
                rotation,
                plan.regions().len()
            );
            CellOutcome::Matched { case, rotation }
        }
        None => {
            log::debug!(
                "cell ({}, {}): no case matched heights {:?}. Using flat fallback.",
                cell.x,
                cell.y,
                ctx.heights
            );
            CellOutcome::FlatFallback
        }
    };

    if outcome != CellOutcome::FlatFallback && !plan.is_consistent(&ctx.heights, &profiles) {
        log::debug!(
            "cell ({}, {}): {:?} produced an inconsistent plan. Using flat fallback.",
            cell.x,
            cell.y,
            outcome
        );
        outcome = CellOutcome::FlatFallback;
    }
    if outcome == CellOutcome::FlatFallback {
        plan = fallback_plan(&frame);
    }

    let encoder = VertexEncoder::new(ctx, &profiles);
    let mut geometry = CellGeometry::default();
    plan.emit(&encoder, &mut geometry);

    if geometry.verts.len() % 3 != 0 || geometry.is_empty() {
        log::debug!(
            "cell ({}, {}): invalid vertex count {}. Using flat fallback.",
            cell.x,
            cell.y,
            geometry.verts.len()
        );
        geometry.clear();
        fallback_plan(&frame).emit(&encoder, &mut geometry);
        outcome = CellOutcome::FlatFallback;
    }

    (geometry, outcome)
}
