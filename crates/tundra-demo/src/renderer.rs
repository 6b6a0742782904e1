//! Stand-in render collaborators that hand out handles and count submissions.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use image::GrayImage;
use tundra_materials::TextureLayer;
use tundra_terrain::storage::{
    CompositeMapRenderer, CompositeMapRequest, DisplacementMapRenderer, DisplacementMapRequest,
    MaterialPassBuilder, PassHandle, PassMode, TextureHandle,
};

/// Counts everything the chunk cache asks of the renderer.
#[derive(Debug, Default)]
pub struct CountingRenderer {
    next_handle: AtomicU64,
    pass_sets: AtomicU64,
    composites: AtomicU64,
    displacements: AtomicU64,
}

impl CountingRenderer {
    fn handle(&self) -> u64 {
        self.next_handle.fetch_add(1, Ordering::Relaxed)
    }

    /// `(pass sets, composite bakes, displacement renders)` so far.
    pub fn totals(&self) -> (u64, u64, u64) {
        (
            self.pass_sets.load(Ordering::Relaxed),
            self.composites.load(Ordering::Relaxed),
            self.displacements.load(Ordering::Relaxed),
        )
    }
}

impl MaterialPassBuilder for CountingRenderer {
    fn create_passes(
        &self,
        layers: &[TextureLayer],
        blendmaps: &[Arc<GrayImage>],
        mode: PassMode,
    ) -> Vec<PassHandle> {
        self.pass_sets.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(layers = layers.len(), blendmaps = blendmaps.len(), ?mode, "created passes");
        layers.iter().map(|_| PassHandle(self.handle())).collect()
    }

    fn composite_pass(&self, _texture: TextureHandle) -> PassHandle {
        PassHandle(self.handle())
    }
}

impl CompositeMapRenderer for CountingRenderer {
    fn submit(&self, request: CompositeMapRequest) -> TextureHandle {
        self.composites.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(
            center = ?request.center,
            size = request.chunk_size,
            immediate = request.immediate,
            "queued composite map"
        );
        TextureHandle(self.handle())
    }
}

impl DisplacementMapRenderer for CountingRenderer {
    fn submit(&self, request: DisplacementMapRequest) -> TextureHandle {
        self.displacements.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(center = ?request.center, "queued displacement map");
        TextureHandle(self.handle())
    }
}
