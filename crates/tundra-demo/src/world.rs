//! Procedural heightfield storage: fBm simplex heights and noise-driven blend maps.
//!
//! Every value is a function of world position, so neighbouring chunks sample
//! identical edges and blend maps line up on the global texel lattice.

use std::sync::Arc;

use glam::{DVec2, Vec2, Vec3};
use image::{GrayImage, Luma};
use noise::{NoiseFn, Simplex};
use tundra_materials::{BlendMapSpace, TextureLayer};
use tundra_terrain::storage::{HeightfieldSample, HeightfieldStorage, LayerData};

/// Heightfield parameters of the demo world.
#[derive(Clone, Debug)]
pub struct WorldParams {
    pub seed: u32,
    pub octaves: u32,
    pub base_frequency: f64,
    pub amplitude: f64,
    pub cell_world_size: f32,
    pub cell_vertices: u32,
    pub texels_per_cell: f32,
}

impl Default for WorldParams {
    fn default() -> Self {
        Self {
            seed: 7,
            octaves: 5,
            base_frequency: 1.0 / 6000.0,
            amplitude: 900.0,
            cell_world_size: 8192.0,
            cell_vertices: 65,
            texels_per_cell: 16.0,
        }
    }
}

/// In-memory terrain generated on demand.
pub struct ProceduralWorld {
    params: WorldParams,
    heights: Simplex,
    snow: Simplex,
    mud: Simplex,
}

impl ProceduralWorld {
    pub fn new(params: WorldParams) -> Self {
        Self {
            heights: Simplex::new(params.seed),
            snow: Simplex::new(params.seed.wrapping_add(1)),
            mud: Simplex::new(params.seed.wrapping_add(2)),
            params,
        }
    }

    /// Height in world units at a world position.
    pub fn height(&self, world: DVec2) -> f64 {
        let mut total = 0.0;
        let mut frequency = self.params.base_frequency;
        let mut amplitude = self.params.amplitude;
        for _ in 0..self.params.octaves {
            total += self.heights.get([world.x * frequency, world.y * frequency]) * amplitude;
            frequency *= 2.0;
            amplitude *= 0.5;
        }
        total
    }

    fn normal(&self, world: DVec2, step: f64) -> Vec3 {
        let dx = self.height(world + DVec2::X * step) - self.height(world - DVec2::X * step);
        let dy = self.height(world + DVec2::Y * step) - self.height(world - DVec2::Y * step);
        Vec3::new(-dx as f32, -dy as f32, (2.0 * step) as f32).normalize_or_zero()
    }

    fn blend_map(&self, space: &BlendMapSpace, noise: &Simplex, frequency: f64) -> Arc<GrayImage> {
        let size = space.image_size();
        let origin = space.global_texel(space.origin());
        Arc::new(GrayImage::from_fn(size, size, |x, row| {
            let gx = (origin.x + x as i64) as f64;
            let gy = (origin.y + (size - 1 - row) as i64) as f64;
            let value = noise.get([gx * frequency, gy * frequency]) * 0.5 + 0.5;
            Luma([(value.clamp(0.0, 1.0) * 255.0).round() as u8])
        }))
    }
}

impl HeightfieldStorage for ProceduralWorld {
    fn fill_vertex_buffers(
        &self,
        lod: u8,
        chunk_size: f32,
        center: Vec2,
        _worldspace: &str,
    ) -> HeightfieldSample {
        let spans =
            (self.params.cell_vertices - 1) as f32 * chunk_size / 2f32.powi(lod as i32);
        let verts = (spans.round() as u32).max(1) + 1;
        let chunk_world = (chunk_size * self.params.cell_world_size) as f64;
        let step = chunk_world / (verts - 1) as f64;
        let origin = center.as_dvec2() * self.params.cell_world_size as f64;

        let mut sample = HeightfieldSample::default();
        for col in 0..verts {
            for row in 0..verts {
                let local = DVec2::new(col as f64, row as f64) * step - chunk_world * 0.5;
                let world = origin + local;
                let height = self.height(world);
                sample
                    .positions
                    .push(Vec3::new(local.x as f32, local.y as f32, height as f32));
                sample.normals.push(self.normal(world, step));
                let shade = (160.0 + height * 0.05).clamp(0.0, 255.0) as u8;
                sample.colors.push([shade, shade, shade, 255]);
            }
        }
        sample
    }

    fn blendmaps(&self, chunk_size: f32, center: Vec2, _worldspace: &str) -> LayerData {
        let space = BlendMapSpace::new(center, chunk_size, self.params.texels_per_cell);
        LayerData {
            layers: vec![
                TextureLayer::diffuse("textures/tx_rock_cliff_01.dds"),
                TextureLayer::diffuse("textures/tx_snow_field_01.dds"),
                TextureLayer::diffuse("textures/tx_mud_track_01.dds"),
            ],
            blendmaps: vec![
                self.blend_map(&space, &self.snow, 1.0 / 40.0),
                self.blend_map(&space, &self.mud, 1.0 / 25.0),
            ],
        }
    }

    fn texture_tile_count(&self, chunk_size: f32, _worldspace: &str) -> u32 {
        (chunk_size * self.params.texels_per_cell).max(1.0) as u32
    }

    fn cell_world_size(&self, _worldspace: &str) -> f32 {
        self.params.cell_world_size
    }

    fn cell_vertices(&self, _worldspace: &str) -> u32 {
        self.params.cell_vertices
    }

    fn blendmap_texels_per_cell(&self, _worldspace: &str) -> f32 {
        self.params.texels_per_cell
    }
}
