//! Collaborators the chunk cache depends on but does not implement.
//!
//! Heightfield storage, material-pass creation and texture baking belong to the
//! embedding renderer. Handles returned by these traits are opaque here: they are stored
//! on the chunk and never interpreted.

use std::sync::Arc;

use glam::{Vec2, Vec3};
use image::GrayImage;
use tundra_materials::TextureLayer;

/// Opaque handle of a render pass created by a [`MaterialPassBuilder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PassHandle(pub u64);

/// Opaque handle of a texture owned by a renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// Per-vertex heightfield data for one chunk, in grid order (`index = col * N + row`).
///
/// Positions are in world units relative to the chunk center, z-up.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeightfieldSample {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub colors: Vec<[u8; 4]>,
}

/// Texture layers of a chunk and the blend maps of every layer after the first.
#[derive(Clone, Debug, Default)]
pub struct LayerData {
    pub layers: Vec<TextureLayer>,
    /// `blendmaps[i]` belongs to `layers[i + 1]`.
    pub blendmaps: Vec<Arc<GrayImage>>,
}

/// Source of terrain data. Chunk sizes are in cells and centers in cell coordinates.
pub trait HeightfieldStorage: Send + Sync {
    /// Sample a `N × N` vertex grid for the chunk, where `N` follows from the LOD.
    fn fill_vertex_buffers(
        &self,
        lod: u8,
        chunk_size: f32,
        center: Vec2,
        worldspace: &str,
    ) -> HeightfieldSample;

    /// Texture layers and blend maps covering the chunk.
    fn blendmaps(&self, chunk_size: f32, center: Vec2, worldspace: &str) -> LayerData;

    /// Number of times the layer textures repeat across a chunk of this size.
    fn texture_tile_count(&self, chunk_size: f32, worldspace: &str) -> u32;

    /// World units per cell edge.
    fn cell_world_size(&self, worldspace: &str) -> f32;

    /// Vertices along one cell edge at full detail.
    fn cell_vertices(&self, worldspace: &str) -> u32;

    /// Blend-map texels per cell edge.
    fn blendmap_texels_per_cell(&self, _worldspace: &str) -> f32 {
        16.0
    }
}

/// How a set of material passes should be built.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PassMode {
    /// The chunk is drawn as tessellated quad patches.
    pub tessellation: bool,
    /// Blend-map repeats across the chunk, from [`HeightfieldStorage::texture_tile_count`].
    pub blend_map_scale: f32,
    /// Layer texture repeats across the chunk.
    pub layer_tile_size: f32,
}

/// Creates render passes from layer data.
pub trait MaterialPassBuilder: Send + Sync {
    /// Ordered passes blending `layers` with `blendmaps`.
    fn create_passes(
        &self,
        layers: &[TextureLayer],
        blendmaps: &[Arc<GrayImage>],
        mode: PassMode,
    ) -> Vec<PassHandle>;

    /// A single pass drawing a baked composite texture.
    fn composite_pass(&self, texture: TextureHandle) -> PassHandle;
}

/// A request to bake a chunk's layers into one texture.
#[derive(Clone, Debug)]
pub struct CompositeMapRequest {
    pub center: Vec2,
    pub chunk_size: f32,
    pub layers: Vec<TextureLayer>,
    pub blendmaps: Vec<Arc<GrayImage>>,
    /// Render before the chunk is first drawn rather than when the frame budget allows.
    pub immediate: bool,
}

/// A request to render a displacement map for a tessellated chunk.
#[derive(Clone, Debug)]
pub struct DisplacementMapRequest {
    pub center: Vec2,
    pub chunk_size: f32,
    pub layers: Vec<TextureLayer>,
    pub blendmaps: Vec<Arc<GrayImage>>,
    pub immediate: bool,
}

/// Bakes composite maps. `submit` queues the work and returns at once.
pub trait CompositeMapRenderer: Send + Sync {
    /// Queue a bake and return the handle of the texture it will fill.
    fn submit(&self, request: CompositeMapRequest) -> TextureHandle;
}

/// Renders displacement maps. `submit` queues the work and returns at once.
pub trait DisplacementMapRenderer: Send + Sync {
    fn submit(&self, request: DisplacementMapRequest) -> TextureHandle;
}
