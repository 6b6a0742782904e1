//! Terrain chunk cache: turns heightfield sampling requests into cached, crack-free chunk
//! geometry, with sticky near-player subdivision and material weights for deformation.
//!
//! [`ChunkManager`] is the entry point. It owns the chunk cache, the shared
//! [`IndexBufferCache`](tundra_mesh::IndexBufferCache) and the
//! [`SubdivisionTracker`](tundra_lod::SubdivisionTracker), and talks to the outside world
//! only through the collaborator traits in [`storage`].

mod geometry;
mod key;
mod manager;
mod stats;

pub mod storage;

pub use geometry::{ChunkGeometry, ChunkPrimitive, SourceArrays};
pub use key::{ChunkKey, ChunkRequest, TemplateKey};
pub use manager::{CacheLookup, ChunkManager};
pub use stats::CacheStats;
