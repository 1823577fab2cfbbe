use std::collections::HashMap;

use glam::{Vec2, Vec3};

use super::types::CellGeometry;

pub type Edge = (Vec3, Vec3);

/// Result of checking geometry for open edges.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub open_edges: Vec<Edge>,
    pub is_watertight: bool,
}

/// Canonical edge key using bit-exact float hashing.
/// Edges are ordered so (A,B) == (B,A).
#[derive(Hash, Eq, PartialEq)]
struct EdgeKey([u32; 6]); // [x1,y1,z1, x2,y2,z2] with v1 < v2 lexicographically

fn vertex_to_bits(v: Vec3) -> [u32; 3] {
    // Fold -0.0 into 0.0 so both compare equal.
    let v = v + Vec3::ZERO;
    [v.x.to_bits(), v.y.to_bits(), v.z.to_bits()]
}

fn make_edge_key(a: Vec3, b: Vec3) -> EdgeKey {
    let ba = vertex_to_bits(a);
    let bb = vertex_to_bits(b);
    // Lexicographic ordering on bit representations
    if ba < bb {
        EdgeKey([ba[0], ba[1], ba[2], bb[0], bb[1], bb[2]])
    } else {
        EdgeKey([bb[0], bb[1], bb[2], ba[0], ba[1], ba[2]])
    }
}

/// Both vertices on the same side of the `(x, z)` rectangle `min..max`.
fn is_boundary_edge(a: Vec3, b: Vec3, min: Vec2, max: Vec2) -> bool {
    let eps = 1e-5;
    let on = |v: f32, side: f32| (v - side).abs() < eps;

    (on(a.x, min.x) && on(b.x, min.x))
        || (on(a.x, max.x) && on(b.x, max.x))
        || (on(a.z, min.y) && on(b.z, min.y))
        || (on(a.z, max.y) && on(b.z, max.y))
}

/// Validate that geometry is watertight inside its own `(x, z)` bounding rectangle.
///
/// Edges on the rectangle's perimeter are left for neighboring cells to close.
pub fn validate(geo: &CellGeometry) -> ValidationResult {
    let Some(first) = geo.verts.first() else {
        return ValidationResult {
            open_edges: Vec::new(),
            is_watertight: true,
        };
    };
    let mut min = Vec2::new(first.x, first.z);
    let mut max = min;
    for v in &geo.verts {
        min = min.min(Vec2::new(v.x, v.z));
        max = max.max(Vec2::new(v.x, v.z));
    }
    validate_with_bounds(geo, min, max)
}

/// Validate against an explicit `(x, z)` perimeter, e.g. a block of cells.
///
/// Counts the triangles on every undirected edge. Internal edges must be
/// shared an even number of times.
pub fn validate_with_bounds(geo: &CellGeometry, min: Vec2, max: Vec2) -> ValidationResult {
    // Count edge occurrences, keeping first-seen order for stable reports.
    let mut index: HashMap<EdgeKey, usize> = HashMap::new();
    let mut edges: Vec<(Vec3, Vec3, u32)> = Vec::new();

    for tri in 0..geo.triangle_count() {
        let [v0, v1, v2] = geo.triangle(tri);
        for (a, b) in [(v0, v1), (v1, v2), (v2, v0)] {
            let slot = *index.entry(make_edge_key(a, b)).or_insert_with(|| {
                edges.push((a, b, 0));
                edges.len() - 1
            });
            edges[slot].2 += 1;
        }
    }

    // Find open internal edges
    let open_edges: Vec<Edge> = edges
        .into_iter()
        .filter(|&(a, b, count)| count % 2 == 1 && !is_boundary_edge(a, b, min, max))
        .map(|(a, b, _)| (a, b))
        .collect();

    ValidationResult {
        is_watertight: open_edges.is_empty(),
        open_edges,
    }
}
