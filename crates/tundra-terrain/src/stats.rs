//! Cache occupancy and hit-rate diagnostics.

use std::fmt;

use tundra_mesh::BufferCacheStats;

/// Snapshot returned by [`ChunkManager::report_stats`](crate::ChunkManager::report_stats).
///
/// Counters accumulate since the manager was created or last cleared.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Frame number the snapshot was taken in.
    pub frame: u64,
    pub chunks: usize,
    pub templates: usize,
    /// Chunks with a sticky subdivision record.
    pub tracked_subdivisions: usize,
    pub buffers: BufferCacheStats,
    pub hits: u64,
    pub misses: u64,
    /// Misses served from an existing template's arrays.
    pub template_reuses: u64,
    /// Weights attached to an already cached chunk.
    pub retrofits: u64,
    pub evictions: u64,
}

impl CacheStats {
    /// Fraction of lookups served from the cache, `0.0` when there were none.
    pub fn hit_rate(&self) -> f32 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f32 / total as f32
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "frame {}: {} chunks, {} templates, {} trails, {}/{}/{} tri/patch/uv buffers, \
             hit rate {:.1}% ({} reused, {} retrofitted, {} evicted)",
            self.frame,
            self.chunks,
            self.templates,
            self.tracked_subdivisions,
            self.buffers.triangle_buffers,
            self.buffers.patch_buffers,
            self.buffers.uv_buffers,
            self.hit_rate() * 100.0,
            self.template_reuses,
            self.retrofits,
            self.evictions
        )
    }
}
