use glam::{Vec2, Vec3};

// Boundary color blending.
pub(super) const BLEND_EDGE_SENSITIVITY: f32 = 1.25;
pub(super) const COLOR_1_LOWER_THRESHOLD: f32 = 0.3;
pub(super) const COLOR_1_UPPER_THRESHOLD: f32 = 0.7;
pub(super) const MIN_HEIGHT_RANGE: f32 = 0.001;
pub(super) const MIN_WEIGHT_THRESHOLD: f32 = 0.001;
// A channel above this counts as fully painted.
pub(super) const DOMINANT_CHANNEL_THRESHOLD: f32 = 0.99;

// Material pair packing: two 4-bit texture ids in one 8-bit channel.
pub(super) const MATERIAL_PACK_SCALE: f32 = 16.0;
pub(super) const MATERIAL_PACK_NORMALIZE: f32 = 255.0;
pub(super) const MATERIAL_INDEX_SCALE: f32 = 15.0;
// Alpha written on floor vertices of cells whose edges are not all merged.
pub(super) const WALL_BLEND_SENTINEL: f32 = 2.0;

/// Linear RGBA color used for vertex attributes and paint data.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn from_rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    fn channels(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    #[must_use]
    #[inline]
    pub fn lerp(self, to: Color, t: f32) -> Color {
        Color::from_rgba(
            self.r + (to.r - self.r) * t,
            self.g + (to.g - self.g) * t,
            self.b + (to.b - self.b) * t,
            self.a + (to.a - self.a) * t,
        )
    }
}

pub const DEFAULT_TEXTURE_COLOR: Color = Color::from_rgba(1.0, 0.0, 0.0, 0.0);

/// How far apart two corner heights may be and still share a floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum MergeMode {
    Cubic = 0,
    #[default]
    Polyhedron = 1,
    RoundedPolyhedron = 2,
    SemiRound = 3,
    Spherical = 4,
}

impl MergeMode {
    pub const ALL: [MergeMode; 5] = [
        MergeMode::Cubic,
        MergeMode::Polyhedron,
        MergeMode::RoundedPolyhedron,
        MergeMode::SemiRound,
        MergeMode::Spherical,
    ];

    pub fn threshold(self) -> f32 {
        [0.6, 1.3, 2.1, 5.0, 20.0][self as usize]
    }

    /// Unknown indices map to the default mode.
    pub fn from_index(idx: i32) -> Self {
        usize::try_from(idx)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .unwrap_or_default()
    }

    pub fn to_index(self) -> i32 {
        self as i32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Bilinear blend of the four corner colors.
    Interpolated,
    /// Corner A's color for the whole cell.
    #[default]
    Direct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorChannel {
    Red = 0,
    Green = 1,
    Blue = 2,
    Alpha = 3,
}

impl ColorChannel {
    const ALL: [ColorChannel; 4] = [
        ColorChannel::Red,
        ColorChannel::Green,
        ColorChannel::Blue,
        ColorChannel::Alpha,
    ];

    /// Strongest channel. Ties go to the earlier channel.
    #[must_use]
    pub fn dominant(c: Color) -> Self {
        let channels = c.channels();
        let mut best = 0;
        for i in 1..4 {
            if channels[i] > channels[best] {
                best = i;
            }
        }
        Self::ALL[best]
    }

    #[must_use]
    pub fn from_index(idx: u8) -> Self {
        Self::ALL.get(idx as usize).copied().unwrap_or(ColorChannel::Red)
    }

    #[must_use]
    pub fn to_one_hot(self) -> Color {
        let mut channels = [0.0; 4];
        channels[self as usize] = 1.0;
        let [r, g, b, a] = channels;
        Color::from_rgba(r, g, b, a)
    }
}

/// One of 16 texture slots, encoded on the GPU as two one-hot colors.
/// The first color picks the group of four, the second the slot within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct TextureIndex(pub u8);

impl TextureIndex {
    pub const COUNT: u8 = 16;

    #[must_use]
    pub fn from_color_pair(c0: Color, c1: Color) -> Self {
        let group = ColorChannel::dominant(c0) as u8;
        let slot = ColorChannel::dominant(c1) as u8;
        Self(group * 4 + slot)
    }

    #[must_use]
    pub fn to_color_pair(self) -> (Color, Color) {
        (
            ColorChannel::from_index(self.0 / 4).to_one_hot(),
            ColorChannel::from_index(self.0 % 4).to_one_hot(),
        )
    }

    #[must_use]
    pub fn as_f32(self) -> f32 {
        f32::from(self.0)
    }
}

/// Triangle soup for one cell. Every three consecutive vertices form a
/// triangle; all attribute vectors have the same length.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CellGeometry {
    pub verts: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub uv2s: Vec<Vec2>,
    pub colors_0: Vec<Color>,
    pub colors_1: Vec<Color>,
    pub grass_mask: Vec<Color>,
    pub material_blend: Vec<Color>,
    pub is_floor: Vec<bool>,
}

impl CellGeometry {
    pub fn triangle_count(&self) -> usize {
        self.verts.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.verts.is_empty()
    }

    /// Floor flag of triangle `tri`. All three vertices share it.
    pub fn is_floor_triangle(&self, tri: usize) -> bool {
        self.is_floor[tri * 3]
    }

    pub fn triangle(&self, tri: usize) -> [Vec3; 3] {
        let i = tri * 3;
        [self.verts[i], self.verts[i + 1], self.verts[i + 2]]
    }

    pub fn clear(&mut self) {
        self.verts.clear();
        self.uvs.clear();
        self.uv2s.clear();
        self.colors_0.clear();
        self.colors_1.clear();
        self.grass_mask.clear();
        self.material_blend.clear();
        self.is_floor.clear();
    }

    /// Append another cell's triangles, e.g. to validate seams between cells.
    pub fn append(&mut self, other: &CellGeometry) {
        self.verts.extend_from_slice(&other.verts);
        self.uvs.extend_from_slice(&other.uvs);
        self.uv2s.extend_from_slice(&other.uv2s);
        self.colors_0.extend_from_slice(&other.colors_0);
        self.colors_1.extend_from_slice(&other.colors_1);
        self.grass_mask.extend_from_slice(&other.grass_mask);
        self.material_blend.extend_from_slice(&other.material_blend);
        self.is_floor.extend_from_slice(&other.is_floor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_index_round_trips_all_slots() {
        for i in 0..TextureIndex::COUNT {
            let (c0, c1) = TextureIndex(i).to_color_pair();
            assert_eq!(TextureIndex::from_color_pair(c0, c1), TextureIndex(i));
        }
    }

    #[test]
    fn dominant_channel_prefers_first_on_ties() {
        let c = Color::from_rgba(0.0, 0.0, 0.0, 0.0);
        assert_eq!(ColorChannel::dominant(c), ColorChannel::Red);
        let c = Color::from_rgba(0.2, 0.5, 0.5, 0.1);
        assert_eq!(ColorChannel::dominant(c), ColorChannel::Green);
    }

    #[test]
    fn merge_mode_index_round_trip_and_default() {
        for mode in MergeMode::ALL {
            assert_eq!(MergeMode::from_index(mode.to_index()), mode);
        }
        assert_eq!(MergeMode::from_index(42), MergeMode::Polyhedron);
        assert_eq!(MergeMode::default().threshold(), 1.3);
    }
}
