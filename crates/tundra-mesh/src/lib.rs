//! Terrain chunk meshing: seam-stitched index buffers, UV grids, and runtime triangle subdivision.

mod buffer_cache;
mod index_buffer;
mod lod_flags;
mod stitching;
mod subdivide;

pub use buffer_cache::{BufferCacheStats, IndexBufferCache, IndexBufferKey, uv_grid};
pub use index_buffer::{IndexBuffer, PrimitiveMode};
pub use lod_flags::{Edge, LodFlags};
pub use stitching::{grid_vertex, patch_indices, triangle_indices};
pub use subdivide::{MAX_SUBDIVISION_LEVEL, SubdividedMesh, TriangleSubdivider, VertexStreams};
