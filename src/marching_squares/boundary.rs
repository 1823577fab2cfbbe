//! Canonical description of one cell edge.
//!
//! A profile depends only on the two corner heights of the edge and the merge
//! threshold. Both cells sharing an edge pass the heights in world order
//! (smaller x first along x, smaller z first along z), so they derive the same
//! profile bit for bit and place identical vertices on the seam.

/// Geometry of one cell edge: either a continuous slope or a wall at the midpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryProfile {
    h1: f32,
    h2: f32,
    merged: bool,
}

/// Classify the edge between `h1` and `h2`.
#[must_use]
pub fn compute_boundary_profile(h1: f32, h2: f32, merge_threshold: f32) -> BoundaryProfile {
    BoundaryProfile {
        h1,
        h2,
        merged: (h1 - h2).abs() < merge_threshold,
    }
}

impl BoundaryProfile {
    pub fn is_merged(&self) -> bool {
        self.merged
    }

    pub fn is_walled(&self) -> bool {
        !self.merged
    }

    pub fn start(&self) -> f32 {
        self.h1
    }

    pub fn end(&self) -> f32 {
        self.h2
    }

    /// Wall top, or the higher corner of a slope.
    pub fn upper(&self) -> f32 {
        self.h1.max(self.h2)
    }

    /// Wall bottom, or the lower corner of a slope.
    pub fn lower(&self) -> f32 {
        self.h1.min(self.h2)
    }

    /// Surface height at parameter `t` along the edge.
    ///
    /// Merged edges interpolate between the corners. Walled edges are flat on
    /// either side of the wall, so the result is the wall top when `is_upper`
    /// and the wall bottom otherwise.
    #[must_use]
    pub fn height_at(&self, t: f32, is_upper: bool) -> f32 {
        if self.merged {
            self.h1 + (self.h2 - self.h1) * t
        } else if is_upper {
            self.upper()
        } else {
            self.lower()
        }
    }

    /// Midpoint height on the side of the corner whose height is `corner`.
    ///
    /// `corner` must be one of the two edge heights.
    #[must_use]
    pub fn height_toward(&self, corner: f32) -> f32 {
        self.height_at(0.5, corner >= self.upper())
    }
}
