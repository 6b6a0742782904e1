//! Shared cache of chunk index and UV buffers.
//!
//! Index buffers depend only on the grid size and the stitching flags, never on chunk
//! contents, so every chunk with the same configuration shares one buffer. Triangle
//! indices, patch indices and UVs live behind separate locks: builders working on
//! different categories never wait on each other.

use std::sync::{Arc, Mutex, PoisonError};

use glam::Vec2;
use rustc_hash::FxHashMap;
use static_assertions::assert_impl_all;

use crate::index_buffer::IndexBuffer;
use crate::stitching::{patch_indices, triangle_indices};
use crate::{LodFlags, PrimitiveMode};

/// Cache key of an index buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexBufferKey {
    /// Vertices along one side of the grid.
    pub vertices_per_side: u32,
    /// Per-edge stitching flags.
    pub lod_flags: LodFlags,
}

/// Occupancy of an [`IndexBufferCache`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BufferCacheStats {
    /// Cached triangle index buffers.
    pub triangle_buffers: usize,
    /// Cached quad-patch index buffers.
    pub patch_buffers: usize,
    /// Cached UV buffers.
    pub uv_buffers: usize,
}

type IndexMap = FxHashMap<IndexBufferKey, Arc<IndexBuffer>>;
type BuildFn = fn(u32, LodFlags) -> Vec<u32>;

/// Builds each distinct index/UV buffer once and hands out shared references.
#[derive(Default)]
pub struct IndexBufferCache {
    triangles: Mutex<IndexMap>,
    patches: Mutex<IndexMap>,
    uvs: Mutex<FxHashMap<u32, Arc<Vec<Vec2>>>>,
}

assert_impl_all!(IndexBufferCache: Send, Sync);

impl IndexBufferCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Triangle indices for a `verts × verts` grid stitched according to `flags`.
    pub fn get_index_buffer(&self, verts: u32, flags: LodFlags) -> Arc<IndexBuffer> {
        self.get(PrimitiveMode::Triangles, verts, flags)
    }

    /// Quad-patch indices for a `verts × verts` grid stitched according to `flags`.
    pub fn get_patch_buffer(&self, verts: u32, flags: LodFlags) -> Arc<IndexBuffer> {
        self.get(PrimitiveMode::Patches, verts, flags)
    }

    /// Indices of either primitive mode.
    pub fn get(&self, mode: PrimitiveMode, verts: u32, flags: LodFlags) -> Arc<IndexBuffer> {
        let key = IndexBufferKey {
            vertices_per_side: verts,
            lod_flags: flags,
        };
        let (lock, build) = match mode {
            PrimitiveMode::Triangles => (&self.triangles, triangle_indices as BuildFn),
            PrimitiveMode::Patches => (&self.patches, patch_indices as BuildFn),
        };

        // The lock is held while building so each key is built exactly once.
        let mut map = lock.lock().unwrap_or_else(PoisonError::into_inner);
        map.entry(key)
            .or_insert_with(|| {
                tracing::trace!(verts, ?flags, ?mode, "building index buffer");
                Arc::new(IndexBuffer::for_grid(verts, build(verts, flags)))
            })
            .clone()
    }

    /// Texture coordinates matching the vertex order of a `verts × verts` grid.
    pub fn get_uv_buffer(&self, verts: u32) -> Arc<Vec<Vec2>> {
        let mut map = self.uvs.lock().unwrap_or_else(PoisonError::into_inner);
        map.entry(verts)
            .or_insert_with(|| Arc::new(uv_grid(verts)))
            .clone()
    }

    /// Drop every cached buffer. Buffers already handed out stay alive with their owners.
    pub fn clear(&self) {
        self.triangles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.patches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.uvs.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Current occupancy.
    pub fn stats(&self) -> BufferCacheStats {
        BufferCacheStats {
            triangle_buffers: self
                .triangles
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .len(),
            patch_buffers: self
                .patches
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .len(),
            uv_buffers: self.uvs.lock().unwrap_or_else(PoisonError::into_inner).len(),
        }
    }
}

/// UVs for a `verts × verts` grid: `u` grows east with the column, `v` grows south.
pub fn uv_grid(verts: u32) -> Vec<Vec2> {
    let span = (verts.max(2) - 1) as f32;
    let mut uvs = Vec::with_capacity((verts * verts) as usize);
    for col in 0..verts {
        for row in 0..verts {
            uvs.push(Vec2::new(col as f32 / span, (verts - 1 - row) as f32 / span));
        }
    }
    uvs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Edge, grid_vertex};

    #[test]
    fn test_repeated_requests_share_instance() {
        let cache = IndexBufferCache::new();
        let flags = LodFlags::NONE.with_delta(Edge::East, 1);
        let a = cache.get_index_buffer(17, flags);
        let b = cache.get_index_buffer(17, flags);
        assert!(Arc::ptr_eq(&a, &b));

        let uv_a = cache.get_uv_buffer(17);
        let uv_b = cache.get_uv_buffer(17);
        assert!(Arc::ptr_eq(&uv_a, &uv_b));
    }

    #[test]
    fn test_distinct_keys_are_distinct_buffers() {
        let cache = IndexBufferCache::new();
        let plain = cache.get_index_buffer(9, LodFlags::NONE);
        let stitched = cache.get_index_buffer(9, LodFlags::NONE.with_delta(Edge::South, 1));
        let patches = cache.get_patch_buffer(9, LodFlags::NONE);
        assert!(!Arc::ptr_eq(&plain, &stitched));
        assert_ne!(plain.len(), patches.len());
        assert_eq!(
            cache.stats(),
            BufferCacheStats {
                triangle_buffers: 2,
                patch_buffers: 1,
                uv_buffers: 0
            }
        );
    }

    #[test]
    fn test_uniform_buffer_contents() {
        let cache = IndexBufferCache::new();
        let verts = 65;
        let buffer = cache.get_index_buffer(verts, LodFlags::NONE);
        assert!(matches!(*buffer, IndexBuffer::U16(_)));
        assert_eq!(buffer.len() / 3, (2 * (verts - 1) * (verts - 1)) as usize);
        assert!(buffer.iter().all(|i| i < verts * verts));
    }

    #[test]
    fn test_clear_rebuilds() {
        let cache = IndexBufferCache::new();
        let before = cache.get_index_buffer(5, LodFlags::NONE);
        cache.clear();
        assert_eq!(cache.stats(), BufferCacheStats::default());
        let after = cache.get_index_buffer(5, LodFlags::NONE);
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(*before, *after);
    }

    #[test]
    fn test_uv_grid_corners() {
        let uvs = uv_grid(3);
        assert_eq!(uvs[grid_vertex(3, 0, 0) as usize], Vec2::new(0.0, 1.0));
        assert_eq!(uvs[grid_vertex(3, 2, 2) as usize], Vec2::new(1.0, 0.0));
        assert_eq!(uvs[grid_vertex(3, 1, 1) as usize], Vec2::new(0.5, 0.5));
    }

    #[test]
    fn test_concurrent_builders_agree() {
        let cache = Arc::new(IndexBufferCache::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    let flags = LodFlags::NONE.with_delta(Edge::North, (i % 2) as u8);
                    let _ = cache.get_uv_buffer(33);
                    cache.get_index_buffer(33, flags)
                })
            })
            .collect();
        let buffers: Vec<Arc<IndexBuffer>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();
        for pair in buffers.chunks(2).collect::<Vec<_>>().windows(2) {
            assert!(Arc::ptr_eq(&pair[0][0], &pair[1][0]));
            assert!(Arc::ptr_eq(&pair[0][1], &pair[1][1]));
        }
        assert_eq!(cache.stats().triangle_buffers, 2);
    }
}
