use super::cell_context::CellFrame;
use super::plan::{CellPlan, Region};

// Corners and edges of the rotated frame.
const A: usize = 0;
const B: usize = 1;
const D: usize = 2;
const C: usize = 3;
const AB: usize = 0;
const BD: usize = 1;
const DC: usize = 2;
const CA: usize = 3;

/// Floor an inner corner adds next to its lowered triangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum UpperFloor {
    /// Triangle only; other builders cover the rest.
    None,
    /// The whole cell beyond the triangle. Requires BD and DC merged.
    Full,
    /// The AB half beyond the triangle, at B's level.
    AlongB,
    /// The CA half beyond the triangle, at C's level.
    AlongC,
}

/// Triangle cut off corner A by the AB and CA midpoints.
fn add_corner_triangle(frame: &CellFrame, plan: &mut CellPlan) {
    plan.push(Region::new(vec![
        frame.corner_vertex(A),
        frame.mid_vertex(AB, A),
        frame.mid_vertex(CA, A),
    ]));
}

/// Half of the cell along AB, up to the CA-BD midline.
///
/// Trimming a corner leaves its triangle for another builder. A midpoint
/// with no corner beside it takes the side of the half it lies in, so
/// heights around it only ever step one way.
fn upper_half(frame: &CellFrame, trim_a: bool, trim_b: bool) -> Region {
    let mut vertices = Vec::with_capacity(5);
    if !trim_a {
        vertices.push(frame.corner_vertex(A));
    }
    vertices.push(match (trim_a, trim_b) {
        (true, true) => frame.mid_vertex_near(AB, (frame.ay() + frame.by()) * 0.5),
        (true, false) => frame.mid_vertex(AB, B),
        _ => frame.mid_vertex(AB, A),
    });
    if !trim_b {
        vertices.push(frame.corner_vertex(B));
    }
    vertices.push(frame.mid_vertex(BD, B));
    vertices.push(frame.mid_vertex(CA, A));
    Region::new(vertices)
}

/// Half of the cell along DC. Requires DC merged.
fn lower_half(frame: &CellFrame) -> Region {
    Region::new(vec![
        frame.mid_vertex(CA, C),
        frame.mid_vertex(BD, D),
        frame.corner_vertex(D),
        frame.mid_vertex(DC, D),
        frame.corner_vertex(C),
    ])
}

/// Floor over the cell minus the triangles of every corner in `cut`.
///
/// Kept corners joined by an edge must share a merged profile. A midpoint
/// between two cut corners sits on the side nearest the kept corners'
/// average height.
pub(super) fn add_floor_around(frame: &CellFrame, plan: &mut CellPlan, cut: [bool; 4]) {
    let kept: Vec<f32> = (0..4).filter(|&k| !cut[k]).map(|k| frame.height(k)).collect();
    if kept.is_empty() {
        return;
    }
    let level = kept.iter().sum::<f32>() / kept.len() as f32;

    let mut vertices = Vec::with_capacity(8);
    for k in [A, B, D, C] {
        let next = (k + 1) % 4;
        if !cut[k] {
            vertices.push(frame.corner_vertex(k));
        }
        vertices.push(match (cut[k], cut[next]) {
            (false, _) => frame.mid_vertex(k, k),
            (true, false) => frame.mid_vertex(k, next),
            (true, true) => frame.mid_vertex_near(k, level),
        });
    }
    plan.push(Region::new(vertices));
}

/// Case 0: Four quadrants meeting at the average height in the center.
///
/// Only used where every edge is merged, and for the fallback floor.
pub(super) fn add_full_floor(frame: &CellFrame, plan: &mut CellPlan) {
    let center = (0..4).map(|k| frame.height(k)).sum::<f32>() / 4.0;
    for k in [A, B, D, C] {
        plan.push(Region::new(vec![
            frame.corner_vertex(k),
            frame.mid_vertex(k, k),
            frame.center_vertex(center),
            frame.mid_vertex((k + 3) % 4, k),
        ]));
    }
}

/// Case 1: Outer corner where A is the raised corner.
///
/// `floor_below` adds the lower floor around it; without it the raised
/// triangle stands alone for composite cases.
pub(super) fn add_outer_corner(frame: &CellFrame, plan: &mut CellPlan, floor_below: bool) {
    add_corner_triangle(frame, plan);
    if floor_below {
        add_floor_around(frame, plan, [true, false, false, false]);
    }
}

/// Case 6: Inner corner where A is the lowered corner, with `upper` choosing
/// how much of the raised floor around it this builder covers.
pub(super) fn add_inner_corner(frame: &CellFrame, plan: &mut CellPlan, upper: UpperFloor) {
    add_corner_triangle(frame, plan);
    match upper {
        UpperFloor::None => {}
        UpperFloor::Full => add_floor_around(frame, plan, [true, false, false, false]),
        UpperFloor::AlongB => plan.push(upper_half(frame, true, false)),
        UpperFloor::AlongC => plan.push(upper_half(&frame.rotated(3), false, true)),
    }
}

/// Case 2: Edge where AB is one level and DC the other, wall along the
/// CA-BD midline.
///
/// `trim_a`/`trim_b` shorten the upper half so a corner builder can own
/// that corner's triangle.
pub(super) fn add_edge(
    frame: &CellFrame,
    plan: &mut CellPlan,
    floor_below: bool,
    floor_above: bool,
    trim_a: bool,
    trim_b: bool,
) {
    if floor_above {
        plan.push(upper_half(frame, trim_a, trim_b));
    }
    if floor_below {
        plan.push(lower_half(frame));
    }
}

/// Band along the B-C diagonal between the A and D corner triangles.
pub(super) fn add_diagonal_floor(frame: &CellFrame, plan: &mut CellPlan) {
    add_floor_around(frame, plan, [true, false, true, false]);
}
