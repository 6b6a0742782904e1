//! Cached chunk geometry.

use std::sync::{Arc, OnceLock};

use glam::{Vec2, Vec3};
use tundra_materials::WeightVector;
use tundra_mesh::{IndexBuffer, PrimitiveMode};

use crate::ChunkKey;
use crate::storage::{PassHandle, TextureHandle};

/// Heightfield arrays shared between every variant of one template.
#[derive(Clone, Debug)]
pub struct SourceArrays {
    pub positions: Arc<Vec<Vec3>>,
    pub normals: Arc<Vec<Vec3>>,
    pub colors: Arc<Vec<[u8; 4]>>,
    /// Vertices along one side of the grid.
    pub vertices_per_side: u32,
}

impl SourceArrays {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Whether `other` shares every array with `self`.
    pub fn shares_arrays(&self, other: &SourceArrays) -> bool {
        Arc::ptr_eq(&self.positions, &other.positions)
            && Arc::ptr_eq(&self.normals, &other.normals)
            && Arc::ptr_eq(&self.colors, &other.colors)
    }
}

/// How the vertex arrays of a chunk are drawn.
#[derive(Clone, Debug)]
pub enum ChunkPrimitive {
    /// Indexed triangles over the source grid.
    Indexed(Arc<IndexBuffer>),
    /// Indexed quad patches over the source grid.
    Patches(Arc<IndexBuffer>),
    /// A flat triangle list produced by subdivision.
    TriangleList {
        /// Indices the list was subdivided from.
        source_indices: Arc<IndexBuffer>,
        level: u8,
    },
}

impl ChunkPrimitive {
    pub fn mode(&self) -> PrimitiveMode {
        match self {
            ChunkPrimitive::Patches(_) => PrimitiveMode::Patches,
            _ => PrimitiveMode::Triangles,
        }
    }
}

/// Renderable data of one chunk variant.
///
/// Immutable once cached, except that material weights may be attached once after the
/// fact when the chunk comes into weight range.
#[derive(Debug)]
pub struct ChunkGeometry {
    pub(crate) key: ChunkKey,
    pub(crate) source: SourceArrays,
    pub(crate) positions: Arc<Vec<Vec3>>,
    pub(crate) normals: Arc<Vec<Vec3>>,
    pub(crate) colors: Arc<Vec<[u8; 4]>>,
    pub(crate) uvs: Arc<Vec<Vec2>>,
    pub(crate) primitive: ChunkPrimitive,
    pub(crate) weights: OnceLock<Vec<WeightVector>>,
    pub(crate) passes: Vec<PassHandle>,
    pub(crate) composite_map: Option<TextureHandle>,
    pub(crate) displacement_map: Option<TextureHandle>,
}

impl ChunkGeometry {
    pub fn key(&self) -> &ChunkKey {
        &self.key
    }

    /// The pre-subdivision heightfield sample.
    pub fn source(&self) -> &SourceArrays {
        &self.source
    }

    pub fn positions(&self) -> &Arc<Vec<Vec3>> {
        &self.positions
    }

    pub fn normals(&self) -> &Arc<Vec<Vec3>> {
        &self.normals
    }

    pub fn colors(&self) -> &Arc<Vec<[u8; 4]>> {
        &self.colors
    }

    pub fn uvs(&self) -> &Arc<Vec<Vec2>> {
        &self.uvs
    }

    pub fn primitive(&self) -> &ChunkPrimitive {
        &self.primitive
    }

    /// Per-vertex material weights, if attached.
    pub fn weights(&self) -> Option<&[WeightVector]> {
        self.weights.get().map(Vec::as_slice)
    }

    pub fn has_weights(&self) -> bool {
        self.weights.get().is_some()
    }

    /// Render passes in draw order.
    pub fn passes(&self) -> &[PassHandle] {
        &self.passes
    }

    /// The baked composite texture of a distant chunk.
    pub fn composite_map(&self) -> Option<TextureHandle> {
        self.composite_map
    }

    pub fn displacement_map(&self) -> Option<TextureHandle> {
        self.displacement_map
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of primitives drawn.
    pub fn primitive_count(&self) -> usize {
        match &self.primitive {
            ChunkPrimitive::Indexed(indices) => indices.len() / 3,
            ChunkPrimitive::Patches(indices) => indices.len() / 4,
            ChunkPrimitive::TriangleList { .. } => self.positions.len() / 3,
        }
    }

    /// Attach weights. Returns `false` if weights were already attached.
    pub(crate) fn attach_weights(&self, weights: Vec<WeightVector>) -> bool {
        debug_assert_eq!(weights.len(), self.vertex_count());
        self.weights.set(weights).is_ok()
    }
}
