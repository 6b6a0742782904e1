//! The chunk cache.
//!
//! A request is served in fixed steps:
//!
//! 1. [`resolve_key`](ChunkManager::resolve_key) asks the subdivision tracker for the
//!    chunk's level and forms the full [`ChunkKey`].
//! 2. [`get`](ChunkManager::get) looks the key up without side effects and reports
//!    whether the cached chunk is missing weights it should now have.
//! 3. [`refresh`](ChunkManager::refresh) attaches those weights, once.
//! 4. On a miss the chunk is built: heightfield arrays come from storage or from a
//!    cached chunk with the same [`TemplateKey`], index and UV buffers from the shared
//!    [`IndexBufferCache`], and near active-grid chunks are subdivided.
//!
//! [`get_chunk`](ChunkManager::get_chunk) runs all of it.

use std::sync::{Arc, OnceLock};

use glam::{Vec2, Vec3};
use rustc_hash::FxHashMap;
use static_assertions::assert_impl_all;
use tundra_config::TerrainConfig;
use tundra_coords::{ChunkCenter, grid_distance, world_to_cells};
use tundra_lod::SubdivisionTracker;
use tundra_materials::{
    BlendMapSpace, MaterialClassifier, WeightQuality, WeightSampler, WeightVector,
};
use tundra_mesh::{IndexBufferCache, TriangleSubdivider, VertexStreams};

use crate::storage::{
    CompositeMapRenderer, CompositeMapRequest, DisplacementMapRenderer, DisplacementMapRequest,
    HeightfieldSample, HeightfieldStorage, LayerData, MaterialPassBuilder, PassHandle, PassMode,
    TextureHandle,
};
use crate::{CacheStats, ChunkGeometry, ChunkKey, ChunkPrimitive, ChunkRequest, SourceArrays, TemplateKey};

/// Result of a read-only cache lookup.
#[derive(Clone, Debug)]
pub struct CacheLookup {
    pub geometry: Arc<ChunkGeometry>,
    /// The chunk has no weights but is now within weight range; pass it to
    /// [`ChunkManager::refresh`].
    pub stale: bool,
}

struct CacheEntry {
    geometry: Arc<ChunkGeometry>,
    /// Last time the entry was handed out or seen referenced.
    last_used: f64,
}

#[derive(Default)]
struct Counters {
    hits: u64,
    misses: u64,
    template_reuses: u64,
    retrofits: u64,
    evictions: u64,
}

/// Owns every cached chunk of the current worldspace.
///
/// Driven by one thread. Per frame, call [`update_cache`](Self::update_cache),
/// [`set_player_position`](Self::set_player_position) and
/// [`update_subdivision_tracker`](Self::update_subdivision_tracker) before any
/// [`get_chunk`](Self::get_chunk), so every request of the frame sees the same state.
pub struct ChunkManager {
    storage: Arc<dyn HeightfieldStorage>,
    pass_builder: Arc<dyn MaterialPassBuilder>,
    composite_renderer: Option<Arc<dyn CompositeMapRenderer>>,
    displacement_renderer: Option<Arc<dyn DisplacementMapRenderer>>,
    buffers: Arc<IndexBufferCache>,
    tracker: SubdivisionTracker,
    classifier: MaterialClassifier,
    config: TerrainConfig,
    worldspace: String,
    chunks: FxHashMap<ChunkKey, CacheEntry>,
    templates: FxHashMap<TemplateKey, Vec<ChunkKey>>,
    player_position: Option<Vec3>,
    last_viewpoint: Option<Vec3>,
    now: f64,
    counters: Counters,
}

assert_impl_all!(ChunkManager: Send);
assert_impl_all!(ChunkGeometry: Send, Sync);

impl ChunkManager {
    /// Create an empty cache over `storage`.
    pub fn new(
        storage: Arc<dyn HeightfieldStorage>,
        pass_builder: Arc<dyn MaterialPassBuilder>,
        config: &TerrainConfig,
    ) -> Self {
        Self {
            storage,
            pass_builder,
            composite_renderer: None,
            displacement_renderer: None,
            buffers: Arc::new(IndexBufferCache::new()),
            tracker: SubdivisionTracker::new(&config.subdivision),
            classifier: MaterialClassifier::new(&config.materials),
            config: config.clone(),
            worldspace: String::new(),
            chunks: FxHashMap::default(),
            templates: FxHashMap::default(),
            player_position: None,
            last_viewpoint: None,
            now: 0.0,
            counters: Counters::default(),
        }
    }

    /// Bake distant chunks into composite maps. Without a renderer they blend layers directly.
    pub fn with_composite_renderer(mut self, renderer: Arc<dyn CompositeMapRenderer>) -> Self {
        self.composite_renderer = Some(renderer);
        self
    }

    /// Enable the tessellated path. Without a renderer, chunks are drawn as triangles.
    pub fn with_displacement_renderer(mut self, renderer: Arc<dyn DisplacementMapRenderer>) -> Self {
        self.displacement_renderer = Some(renderer);
        self
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    /// The index/UV buffer cache, shareable with other builder threads.
    pub fn buffer_cache(&self) -> &Arc<IndexBufferCache> {
        &self.buffers
    }

    pub fn subdivision_tracker(&self) -> &SubdivisionTracker {
        &self.tracker
    }

    pub fn worldspace(&self) -> &str {
        &self.worldspace
    }

    /// Number of cached chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Switch worldspace. Everything cached for the previous one is dropped.
    pub fn set_worldspace(&mut self, worldspace: &str) {
        if self.worldspace == worldspace {
            return;
        }
        tracing::info!(from = %self.worldspace, to = %worldspace, "changing worldspace");
        self.clear_cache();
        self.worldspace = worldspace.to_string();
    }

    /// Player position in world units, used for subdivision and weight distances.
    pub fn set_player_position(&mut self, position: Vec3) {
        self.player_position = Some(position);
    }

    /// Advance subdivision trails by `dt` seconds.
    ///
    /// Uses the player position, or the last request's viewpoint if none was set.
    pub fn update_subdivision_tracker(&mut self, dt: f32) {
        let Some(position) = self.player_position.or(self.last_viewpoint) else {
            return;
        };
        let player = world_to_cells(position, self.storage.cell_world_size(&self.worldspace));
        self.tracker.update(dt, player);
    }

    /// Return the geometry for `request`, building it on a miss.
    pub fn get_chunk(&mut self, request: &ChunkRequest) -> Arc<ChunkGeometry> {
        let key = self.resolve_key(request);

        if let Some(lookup) = self.get(request, &key) {
            self.counters.hits += 1;
            if lookup.stale {
                self.refresh(request, &lookup.geometry);
            }
            if let Some(entry) = self.chunks.get_mut(&key) {
                entry.last_used = self.now;
            }
            return lookup.geometry;
        }

        self.counters.misses += 1;
        let (geometry, reused) = self.build(request, key);
        if reused {
            self.counters.template_reuses += 1;
        }
        let geometry = Arc::new(geometry);
        self.insert(key, Arc::clone(&geometry));
        geometry
    }

    /// Form the full cache key, consulting the subdivision tracker for active-grid chunks.
    pub fn resolve_key(&mut self, request: &ChunkRequest) -> ChunkKey {
        self.last_viewpoint = Some(request.viewpoint);
        let center = ChunkCenter::from_cells(request.center);
        let subdivision_level = if request.active_grid {
            let player = self.player_cells(request.viewpoint);
            self.tracker.level_for(center, request.chunk_size, player)
        } else {
            0
        };
        ChunkKey {
            center,
            lod: request.lod,
            lod_flags: request.lod_flags,
            subdivision_level,
        }
    }

    /// Look up a cached chunk. Never builds or mutates anything.
    pub fn get(&self, request: &ChunkRequest, key: &ChunkKey) -> Option<CacheLookup> {
        let entry = self.chunks.get(key)?;
        let stale = !entry.geometry.has_weights() && self.weight_quality(request).in_range();
        Some(CacheLookup {
            geometry: Arc::clone(&entry.geometry),
            stale,
        })
    }

    /// Attach weights to a cached chunk that came into weight range.
    ///
    /// Returns whether weights were attached. Weights are attached at most once.
    pub fn refresh(&mut self, request: &ChunkRequest, geometry: &ChunkGeometry) -> bool {
        if geometry.has_weights() {
            return false;
        }
        let quality = self.weight_quality(request);
        if !quality.in_range() {
            return false;
        }

        let layer_data =
            self.storage
                .blendmaps(request.chunk_size, request.center, &self.worldspace);
        let source_weights =
            self.sample_weights(request, &geometry.source.positions, &layer_data, quality);
        let weights = match &geometry.primitive {
            ChunkPrimitive::TriangleList {
                source_indices,
                level,
            } => {
                let uvs = self.buffers.get_uv_buffer(geometry.source.vertices_per_side);
                let streams = VertexStreams {
                    positions: &geometry.source.positions,
                    normals: &geometry.source.normals,
                    colors: &geometry.source.colors,
                    uvs: &uvs,
                    weights: Some(&source_weights),
                };
                TriangleSubdivider::new(*level)
                    .subdivide(&streams, source_indices)
                    .weights
                    .unwrap_or_default()
            }
            ChunkPrimitive::Indexed(_) | ChunkPrimitive::Patches(_) => source_weights,
        };

        let attached = geometry.attach_weights(weights);
        if attached {
            self.counters.retrofits += 1;
            tracing::debug!(key = %geometry.key, ?quality, "attached weights to cached chunk");
        }
        attached
    }

    /// Drop every cached chunk, template, buffer and subdivision record.
    ///
    /// Geometry already handed out stays valid for its holders but is no longer cached.
    pub fn clear_cache(&mut self) {
        tracing::debug!(chunks = self.chunks.len(), "clearing chunk cache");
        self.chunks.clear();
        self.templates.clear();
        self.buffers.clear();
        self.tracker.clear();
        self.counters = Counters::default();
    }

    /// Set the cache clock to `now` (seconds) and evict chunks unused for `expiry_delay`.
    ///
    /// Chunks still referenced outside the cache are never evicted.
    pub fn update_cache(&mut self, now: f64) {
        self.now = now;
        let expiry = self.config.cache.expiry_delay;
        let before = self.chunks.len();

        self.chunks.retain(|_, entry| {
            if Arc::strong_count(&entry.geometry) > 1 {
                entry.last_used = now;
                return true;
            }
            now - entry.last_used < expiry
        });

        let evicted = before - self.chunks.len();
        if evicted == 0 {
            return;
        }
        let chunks = &self.chunks;
        self.templates.retain(|_, keys| {
            keys.retain(|key| chunks.contains_key(key));
            !keys.is_empty()
        });
        self.counters.evictions += evicted as u64;
        tracing::debug!(evicted, remaining = self.chunks.len(), "expired chunks");
    }

    /// Occupancy and hit-rate snapshot, also logged at debug level.
    pub fn report_stats(&self, frame: u64) -> CacheStats {
        let stats = CacheStats {
            frame,
            chunks: self.chunks.len(),
            templates: self.templates.len(),
            tracked_subdivisions: self.tracker.len(),
            buffers: self.buffers.stats(),
            hits: self.counters.hits,
            misses: self.counters.misses,
            template_reuses: self.counters.template_reuses,
            retrofits: self.counters.retrofits,
            evictions: self.counters.evictions,
        };
        tracing::debug!(%stats, "terrain cache");
        stats
    }

    // --- Building ---

    fn insert(&mut self, key: ChunkKey, geometry: Arc<ChunkGeometry>) {
        self.chunks.insert(
            key,
            CacheEntry {
                geometry,
                last_used: self.now,
            },
        );
        let variants = self.templates.entry(key.template()).or_default();
        if !variants.contains(&key) {
            variants.push(key);
        }
    }

    /// Returns the geometry and whether its arrays came from a template.
    fn build(&self, request: &ChunkRequest, key: ChunkKey) -> (ChunkGeometry, bool) {
        let cache = &self.config.cache;
        let verts = self.vertices_per_side(request.chunk_size, key.lod);
        let (source, reused) = match self.find_template(&key) {
            Some(source) => (source, true),
            None => (self.sample_source(request, key.lod, verts), false),
        };

        let use_composite = request.chunk_size >= cache.composite_map_level;
        let mut tessellate = !use_composite
            && key.subdivision_level == 0
            && cache.tessellation
            && request.chunk_size <= cache.tessellation_max_chunk_size;
        if tessellate && self.displacement_renderer.is_none() {
            tracing::debug!(%key, "no displacement renderer, drawing triangles");
            tessellate = false;
        }

        let uvs = self.buffers.get_uv_buffer(verts);
        let layer_data = self
            .storage
            .blendmaps(request.chunk_size, request.center, &self.worldspace);
        let quality = self.weight_quality(request);
        let weights = quality
            .in_range()
            .then(|| self.sample_weights(request, &source.positions, &layer_data, quality));

        let (positions, normals, colors, uvs, primitive, weights) = if key.subdivision_level > 0 {
            let indices = self.buffers.get_index_buffer(verts, key.lod_flags);
            let streams = VertexStreams {
                positions: &source.positions,
                normals: &source.normals,
                colors: &source.colors,
                uvs: &uvs,
                weights: weights.as_deref(),
            };
            let mesh = TriangleSubdivider::new(key.subdivision_level).subdivide(&streams, &indices);
            let primitive = ChunkPrimitive::TriangleList {
                source_indices: indices,
                level: key.subdivision_level,
            };
            (
                Arc::new(mesh.positions),
                Arc::new(mesh.normals),
                Arc::new(mesh.colors),
                Arc::new(mesh.uvs),
                primitive,
                mesh.weights,
            )
        } else {
            let primitive = if tessellate {
                ChunkPrimitive::Patches(self.buffers.get_patch_buffer(verts, key.lod_flags))
            } else {
                ChunkPrimitive::Indexed(self.buffers.get_index_buffer(verts, key.lod_flags))
            };
            (
                Arc::clone(&source.positions),
                Arc::clone(&source.normals),
                Arc::clone(&source.colors),
                uvs,
                primitive,
                weights,
            )
        };

        let (passes, composite_map) =
            self.create_passes(request, &layer_data, use_composite, tessellate);
        let displacement_map = match &self.displacement_renderer {
            Some(renderer) if tessellate => Some(renderer.submit(DisplacementMapRequest {
                center: request.center,
                chunk_size: request.chunk_size,
                layers: layer_data.layers.clone(),
                blendmaps: layer_data.blendmaps.clone(),
                immediate: request.compile,
            })),
            _ => None,
        };

        tracing::debug!(
            %key,
            verts,
            reused,
            composite = composite_map.is_some(),
            tessellate,
            weights = weights.is_some(),
            "built chunk"
        );

        let geometry = ChunkGeometry {
            key,
            source,
            positions,
            normals,
            colors,
            uvs,
            primitive,
            weights: weights.map_or_else(OnceLock::new, OnceLock::from),
            passes,
            composite_map,
            displacement_map,
        };
        (geometry, reused)
    }

    fn create_passes(
        &self,
        request: &ChunkRequest,
        layer_data: &LayerData,
        use_composite: bool,
        tessellate: bool,
    ) -> (Vec<PassHandle>, Option<TextureHandle>) {
        if layer_data.layers.is_empty() {
            tracing::warn!(center = ?request.center, "chunk has no texture layers, no passes created");
            return (Vec::new(), None);
        }

        if use_composite {
            if let Some(renderer) = &self.composite_renderer {
                let texture = renderer.submit(CompositeMapRequest {
                    center: request.center,
                    chunk_size: request.chunk_size,
                    layers: layer_data.layers.clone(),
                    blendmaps: layer_data.blendmaps.clone(),
                    immediate: request.compile,
                });
                return (vec![self.pass_builder.composite_pass(texture)], Some(texture));
            }
            tracing::debug!(
                center = ?request.center,
                "no composite renderer, blending layers directly"
            );
        }

        let mode = PassMode {
            tessellation: tessellate,
            blend_map_scale: self
                .storage
                .texture_tile_count(request.chunk_size, &self.worldspace)
                as f32,
            layer_tile_size: request.chunk_size,
        };
        let passes =
            self.pass_builder
                .create_passes(&layer_data.layers, &layer_data.blendmaps, mode);
        (passes, None)
    }

    /// Heightfield arrays of any cached variant of the same template.
    fn find_template(&self, key: &ChunkKey) -> Option<SourceArrays> {
        self.templates
            .get(&key.template())?
            .iter()
            .find_map(|variant| self.chunks.get(variant))
            .map(|entry| entry.geometry.source.clone())
    }

    fn sample_source(&self, request: &ChunkRequest, lod: u8, verts: u32) -> SourceArrays {
        let sample = self.storage.fill_vertex_buffers(
            lod,
            request.chunk_size,
            request.center,
            &self.worldspace,
        );
        let sample = self.complete_sample(request, sample, verts);
        SourceArrays {
            positions: Arc::new(sample.positions),
            normals: Arc::new(sample.normals),
            colors: Arc::new(sample.colors),
            vertices_per_side: verts,
        }
    }

    /// Replace or pad an incomplete heightfield sample with a flat grid.
    fn complete_sample(
        &self,
        request: &ChunkRequest,
        mut sample: HeightfieldSample,
        verts: u32,
    ) -> HeightfieldSample {
        let count = (verts * verts) as usize;
        if sample.positions.len() != count {
            tracing::warn!(
                center = ?request.center,
                got = sample.positions.len(),
                expected = count,
                "heightfield sample has the wrong size, using a flat chunk"
            );
            let chunk_world = request.chunk_size * self.storage.cell_world_size(&self.worldspace);
            return HeightfieldSample {
                positions: flat_grid(verts, chunk_world),
                normals: vec![Vec3::Z; count],
                colors: vec![[255; 4]; count],
            };
        }
        if sample.normals.len() != count || sample.colors.len() != count {
            tracing::warn!(center = ?request.center, "heightfield sample is missing normals or colors");
            sample.normals.resize(count, Vec3::Z);
            sample.colors.resize(count, [255; 4]);
        }
        sample
    }

    /// `(cell_vertices - 1) × chunk_size / 2^lod + 1`.
    fn vertices_per_side(&self, chunk_size: f32, lod: u8) -> u32 {
        let cell_vertices = self.storage.cell_vertices(&self.worldspace);
        let spans = cell_vertices.saturating_sub(1) as f32 * chunk_size / 2f32.powi(lod as i32);
        (spans.round() as u32).max(1) + 1
    }

    fn player_cells(&self, viewpoint: Vec3) -> Vec2 {
        let position = self.player_position.unwrap_or(viewpoint);
        world_to_cells(position, self.storage.cell_world_size(&self.worldspace))
    }

    fn weight_quality(&self, request: &ChunkRequest) -> WeightQuality {
        let player = self.player_cells(request.viewpoint);
        let distance = grid_distance(request.center, request.chunk_size, player);
        WeightQuality::for_distance(distance, &self.config.weights)
    }

    fn sample_weights(
        &self,
        request: &ChunkRequest,
        positions: &[Vec3],
        layer_data: &LayerData,
        quality: WeightQuality,
    ) -> Vec<WeightVector> {
        let space = BlendMapSpace::new(
            request.center,
            request.chunk_size,
            self.storage.blendmap_texels_per_cell(&self.worldspace),
        );
        WeightSampler::new(&self.classifier).sample_vertices(
            positions,
            self.storage.cell_world_size(&self.worldspace),
            &space,
            &layer_data.layers,
            &layer_data.blendmaps,
            quality,
        )
    }
}

/// A flat `verts × verts` grid of edge `chunk_world`, centered on the origin.
fn flat_grid(verts: u32, chunk_world: f32) -> Vec<Vec3> {
    let step = chunk_world / (verts - 1) as f32;
    let half = chunk_world * 0.5;
    (0..verts)
        .flat_map(|col| {
            (0..verts).map(move |row| Vec3::new(col as f32 * step - half, row as f32 * step - half, 0.0))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    use image::{GrayImage, Luma};
    use tundra_config::{SubdivisionConfig, WeightConfig};
    use tundra_materials::TextureLayer;
    use tundra_mesh::{Edge, LodFlags, PrimitiveMode};

    use super::*;

    const CELL_WORLD: f32 = 4096.0;
    const CELL_VERTICES: u32 = 33;

    #[derive(Default)]
    struct TestStorage {
        samples: AtomicUsize,
        no_layers: bool,
        short_sample: bool,
    }

    impl HeightfieldStorage for TestStorage {
        fn fill_vertex_buffers(
            &self,
            lod: u8,
            chunk_size: f32,
            _center: Vec2,
            _worldspace: &str,
        ) -> HeightfieldSample {
            self.samples.fetch_add(1, Ordering::SeqCst);
            let spans = ((CELL_VERTICES - 1) as f32 * chunk_size / 2f32.powi(lod as i32)) as u32;
            let verts = if self.short_sample { spans } else { spans + 1 };
            let count = (verts * verts) as usize;
            HeightfieldSample {
                positions: flat_grid(verts, chunk_size * CELL_WORLD)
                    .into_iter()
                    .map(|p| p + Vec3::Z * (p.x * 0.01).sin())
                    .collect(),
                normals: vec![Vec3::Z; count],
                colors: vec![[200, 200, 200, 255]; count],
            }
        }

        fn blendmaps(&self, chunk_size: f32, center: Vec2, worldspace: &str) -> LayerData {
            if self.no_layers {
                return LayerData::default();
            }
            let space = BlendMapSpace::new(
                center,
                chunk_size,
                self.blendmap_texels_per_cell(worldspace),
            );
            let size = space.image_size();
            LayerData {
                layers: vec![
                    TextureLayer::diffuse("tx_rock_01"),
                    TextureLayer::diffuse("tx_snow_01"),
                ],
                blendmaps: vec![Arc::new(GrayImage::from_fn(size, size, |x, _| {
                    Luma([(x * 16).min(255) as u8])
                }))],
            }
        }

        fn texture_tile_count(&self, chunk_size: f32, _worldspace: &str) -> u32 {
            (chunk_size * 8.0).max(1.0) as u32
        }

        fn cell_world_size(&self, _worldspace: &str) -> f32 {
            CELL_WORLD
        }

        fn cell_vertices(&self, _worldspace: &str) -> u32 {
            CELL_VERTICES
        }
    }

    #[derive(Default)]
    struct TestPasses {
        modes: Mutex<Vec<PassMode>>,
    }

    impl MaterialPassBuilder for TestPasses {
        fn create_passes(
            &self,
            layers: &[TextureLayer],
            _blendmaps: &[Arc<GrayImage>],
            mode: PassMode,
        ) -> Vec<PassHandle> {
            self.modes.lock().unwrap().push(mode);
            (0..layers.len() as u64).map(PassHandle).collect()
        }

        fn composite_pass(&self, texture: TextureHandle) -> PassHandle {
            PassHandle(1000 + texture.0)
        }
    }

    #[derive(Default)]
    struct TestRenderer {
        submitted: AtomicU64,
    }

    impl CompositeMapRenderer for TestRenderer {
        fn submit(&self, _request: CompositeMapRequest) -> TextureHandle {
            TextureHandle(self.submitted.fetch_add(1, Ordering::SeqCst))
        }
    }

    impl DisplacementMapRenderer for TestRenderer {
        fn submit(&self, _request: DisplacementMapRequest) -> TextureHandle {
            TextureHandle(self.submitted.fetch_add(1, Ordering::SeqCst))
        }
    }

    fn config() -> TerrainConfig {
        TerrainConfig {
            subdivision: SubdivisionConfig {
                level_distances: vec![0.25],
                pre_subdivision_buffer: 0.0,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn manager_with(storage: TestStorage, config: &TerrainConfig) -> ChunkManager {
        ChunkManager::new(Arc::new(storage), Arc::new(TestPasses::default()), config)
    }

    fn manager() -> ChunkManager {
        manager_with(TestStorage::default(), &config())
    }

    /// A quarter-cell chunk next to the origin, viewed from inside it.
    fn near_request() -> ChunkRequest {
        ChunkRequest::new(0.25, Vec2::splat(0.125), 0).with_viewpoint(Vec3::new(100.0, 100.0, 0.0))
    }

    /// Same chunk viewed from far away.
    fn far_request() -> ChunkRequest {
        near_request().with_viewpoint(Vec3::new(10.0 * CELL_WORLD, 10.0 * CELL_WORLD, 0.0))
    }

    #[test]
    fn test_repeat_request_hits() {
        let mut manager = manager();
        let a = manager.get_chunk(&near_request());
        let b = manager.get_chunk(&near_request());
        assert!(Arc::ptr_eq(&a, &b));
        let stats = manager.report_stats(1);
        assert_eq!((stats.hits, stats.misses, stats.chunks), (1, 1, 1));
    }

    #[test]
    fn test_vertex_count_follows_lod() {
        let mut manager = manager();
        let lod0 = manager.get_chunk(&near_request());
        assert_eq!(lod0.source().vertices_per_side, 9);
        let lod1 = manager.get_chunk(&ChunkRequest::new(1.0, Vec2::new(2.5, 0.5), 1));
        assert_eq!(lod1.source().vertices_per_side, 17);
        assert_eq!(lod1.vertex_count(), 17 * 17);
        assert_eq!(lod1.primitive_count(), 2 * 16 * 16);
    }

    #[test]
    fn test_variants_share_template_arrays() {
        let storage = Arc::new(TestStorage::default());
        let mut manager =
            ChunkManager::new(storage.clone(), Arc::new(TestPasses::default()), &config());
        let plain = manager.get_chunk(&far_request());
        let stitched = manager
            .get_chunk(&far_request().with_lod_flags(LodFlags::NONE.with_delta(Edge::North, 1)));

        assert!(!Arc::ptr_eq(&plain, &stitched));
        assert_ne!(plain.key(), stitched.key());
        assert!(plain.source().shares_arrays(stitched.source()));
        assert!(Arc::ptr_eq(plain.positions(), stitched.positions()));
        assert_eq!(storage.samples.load(Ordering::SeqCst), 1);
        assert_eq!(manager.report_stats(0).template_reuses, 1);
    }

    #[test]
    fn test_active_grid_near_player_subdivides() {
        let mut manager = manager();
        let plain = manager.get_chunk(&near_request());
        let request = near_request().with_active_grid(true);
        let subdivided = manager.get_chunk(&request);

        assert_eq!(subdivided.key().subdivision_level, 1);
        assert!(matches!(
            subdivided.primitive(),
            ChunkPrimitive::TriangleList { level: 1, .. }
        ));
        assert_eq!(subdivided.primitive_count(), plain.primitive_count() * 4);
        assert!(plain.source().shares_arrays(subdivided.source()));

        let weights = subdivided.weights().unwrap();
        assert_eq!(weights.len(), subdivided.vertex_count());
        assert!(weights.iter().all(|w| w.is_normalized(1e-3)));
        assert_eq!(manager.subdivision_tracker().len(), 1);
    }

    #[test]
    fn test_far_active_chunk_does_not_subdivide() {
        let mut manager = manager();
        let chunk = manager.get_chunk(&far_request().with_active_grid(true));
        assert_eq!(chunk.key().subdivision_level, 0);
        assert!(matches!(chunk.primitive(), ChunkPrimitive::Indexed(_)));
        assert!(!chunk.has_weights());
    }

    #[test]
    fn test_weight_retrofit_two_phase() {
        let mut manager = manager();
        let far = far_request();
        let chunk = manager.get_chunk(&far);
        assert!(!chunk.has_weights());

        manager.set_player_position(Vec3::new(100.0, 100.0, 0.0));
        let key = manager.resolve_key(&far);
        let lookup = manager.get(&far, &key).unwrap();
        assert!(lookup.stale);
        assert!(Arc::ptr_eq(&lookup.geometry, &chunk));
        assert!(!chunk.has_weights());

        assert!(manager.refresh(&far, &lookup.geometry));
        assert!(chunk.has_weights());
        assert!(!manager.get(&far, &key).unwrap().stale);
        assert!(!manager.refresh(&far, &chunk));
        assert_eq!(manager.report_stats(0).retrofits, 1);
    }

    #[test]
    fn test_subdivided_retrofit_matches_build() {
        let mut built = manager();
        let near = near_request().with_active_grid(true);
        let expected = built.get_chunk(&near);

        // Same chunk and level, but no weights because weight sampling starts disabled.
        let mut config = config();
        config.weights = WeightConfig {
            full_distance: -1.0,
            simplified_distance: -1.0,
            ..Default::default()
        };
        let mut retro = manager_with(TestStorage::default(), &config);
        let chunk = retro.get_chunk(&near);
        assert!(!chunk.has_weights());
        retro.config.weights = WeightConfig::default();
        assert!(retro.refresh(&near, &chunk));
        assert_eq!(chunk.weights(), expected.weights());
    }

    #[test]
    fn test_composite_threshold() {
        let renderer = Arc::new(TestRenderer::default());
        let mut manager = manager().with_composite_renderer(renderer.clone());
        let big = manager.get_chunk(&ChunkRequest::new(4.0, Vec2::new(2.0, 2.0), 3));
        assert!(big.composite_map().is_some());
        assert_eq!(big.passes().len(), 1);

        let small = manager.get_chunk(&ChunkRequest::new(2.0, Vec2::new(5.0, 1.0), 2));
        assert!(small.composite_map().is_none());
        assert_eq!(small.passes().len(), 2);
        assert_eq!(renderer.submitted.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_composite_without_renderer_falls_back() {
        let mut manager = manager();
        let big = manager.get_chunk(&ChunkRequest::new(4.0, Vec2::new(2.0, 2.0), 3));
        assert!(big.composite_map().is_none());
        assert_eq!(big.passes().len(), 2);
    }

    #[test]
    fn test_tessellation_uses_patches() {
        let mut config = config();
        config.cache.tessellation = true;
        let renderer = Arc::new(TestRenderer::default());
        let passes = Arc::new(TestPasses::default());
        let mut manager =
            ChunkManager::new(Arc::new(TestStorage::default()), passes.clone(), &config)
                .with_displacement_renderer(renderer);
        let chunk = manager.get_chunk(&far_request());
        assert_eq!(chunk.primitive().mode(), PrimitiveMode::Patches);
        assert!(chunk.displacement_map().is_some());

        let fallback_passes = Arc::new(TestPasses::default());
        let mut fallback =
            ChunkManager::new(Arc::new(TestStorage::default()), fallback_passes.clone(), &config);
        let chunk = fallback.get_chunk(&far_request());
        assert_eq!(chunk.primitive().mode(), PrimitiveMode::Triangles);
        assert!(chunk.displacement_map().is_none());

        let modes = passes.modes.lock().unwrap();
        assert_eq!(modes.len(), 1);
        assert!(modes[0].tessellation);
        assert_eq!(modes[0].layer_tile_size, 0.25);
        assert_eq!(modes[0].blend_map_scale, 2.0);
        let fallback_modes = fallback_passes.modes.lock().unwrap();
        assert_eq!(fallback_modes.len(), 1);
        assert!(!fallback_modes[0].tessellation);
    }

    #[test]
    fn test_missing_layers_degrade() {
        let storage = TestStorage {
            no_layers: true,
            ..Default::default()
        };
        let mut manager = manager_with(storage, &config());
        let chunk = manager.get_chunk(&near_request());
        assert!(chunk.passes().is_empty());
        assert!(chunk.weights().unwrap().iter().all(|&w| w == WeightVector::ROCK));
    }

    #[test]
    fn test_wrong_sample_size_becomes_flat() {
        let storage = TestStorage {
            short_sample: true,
            ..Default::default()
        };
        let mut manager = manager_with(storage, &config());
        let chunk = manager.get_chunk(&far_request());
        assert_eq!(chunk.vertex_count(), 81);
        assert!(chunk.positions().iter().all(|p| p.z == 0.0));
    }

    #[test]
    fn test_expiry_spares_referenced_chunks() {
        let mut manager = manager();
        manager.update_cache(0.0);
        let held = manager.get_chunk(&far_request());
        drop(manager.get_chunk(&ChunkRequest::new(0.25, Vec2::new(3.125, 3.125), 0)));
        assert_eq!(manager.len(), 2);

        manager.update_cache(1.0);
        assert_eq!(manager.len(), 2);
        manager.update_cache(10.0);
        assert_eq!(manager.len(), 1);
        assert!(manager.get(&far_request(), held.key()).is_some());
        let stats = manager.report_stats(0);
        assert_eq!((stats.evictions, stats.templates), (1, 1));
    }

    #[test]
    fn test_worldspace_change_clears() {
        let mut manager = manager();
        manager.get_chunk(&near_request().with_active_grid(true));
        manager.set_worldspace("");
        assert_eq!(manager.len(), 1);
        manager.set_worldspace("sheogorad");
        assert!(manager.is_empty());
        assert!(manager.subdivision_tracker().is_empty());
        assert_eq!(manager.buffer_cache().stats().triangle_buffers, 0);
        assert_eq!(manager.report_stats(0), CacheStats::default());
    }

    #[test]
    fn test_tracker_uses_last_viewpoint() {
        let mut manager = manager();
        manager.update_subdivision_tracker(1.0);
        manager.get_chunk(&near_request().with_active_grid(true));
        manager.update_subdivision_tracker(1.0);
        let center = ChunkCenter::from_cells(Vec2::splat(0.125));
        let record = manager.subdivision_tracker().record(center).unwrap();
        assert_eq!(record.time_tracked, 1.0);
    }
}
