//! Texture layer descriptions and the placement of a chunk's blend maps in cell space.

use glam::{I64Vec2, Vec2};

/// One texture layer of a chunk, as supplied by the heightfield storage.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextureLayer {
    /// Diffuse texture name; also the input to material classification.
    pub diffuse_map: String,
    /// Optional normal map texture name.
    pub normal_map: Option<String>,
    /// Whether the normal map carries a parallax height channel.
    pub parallax: bool,
    /// Whether the diffuse alpha channel is a specular mask.
    pub specular: bool,
}

impl TextureLayer {
    /// A layer with only a diffuse map.
    pub fn diffuse(name: impl Into<String>) -> Self {
        Self {
            diffuse_map: name.into(),
            ..Default::default()
        }
    }
}

/// Where a chunk's blend-map images lie in cell space.
///
/// Texel `(x, y)` sits at `origin + (x, y) / texels_per_cell`, with `y` growing north.
/// Images are `chunk_size × texels_per_cell + 1` texels wide so that both chunks of a
/// shared edge hold the edge texel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlendMapSpace {
    /// Chunk center in cells.
    pub center: Vec2,
    /// Chunk edge length in cells.
    pub chunk_size: f32,
    /// Blend-map resolution.
    pub texels_per_cell: f32,
}

impl BlendMapSpace {
    /// Describe the blend maps of the chunk at `center`.
    pub fn new(center: Vec2, chunk_size: f32, texels_per_cell: f32) -> Self {
        Self {
            center,
            chunk_size,
            texels_per_cell,
        }
    }

    /// Cell coordinate of the chunk's south-west corner.
    pub fn origin(&self) -> Vec2 {
        self.center - Vec2::splat(self.chunk_size * 0.5)
    }

    /// Expected image edge length in texels.
    pub fn image_size(&self) -> u32 {
        (self.chunk_size * self.texels_per_cell).round() as u32 + 1
    }

    /// Snap a cell coordinate to the global texel lattice.
    ///
    /// Rounding happens in world texel space, so every chunk maps the same cell
    /// coordinate to the same global texel regardless of its own origin.
    pub fn global_texel(&self, cells: Vec2) -> I64Vec2 {
        let scaled = cells.as_dvec2() * self.texels_per_cell as f64;
        I64Vec2::new(scaled.x.round() as i64, scaled.y.round() as i64)
    }

    /// Texel of this chunk's images that holds the global texel nearest `cells`.
    pub fn local_texel(&self, cells: Vec2) -> I64Vec2 {
        self.global_texel(cells) - self.global_texel(self.origin())
    }
}
