//! Per-vertex material weights from a chunk's layer stack and blend maps.
//!
//! The base layer starts at full weight; each further layer pulls the running weight
//! toward its own class by the value of its blend map:
//!
//! ```text
//! result = class(layer 0)
//! result = result * (1 - b_i) + class(layer i) * b_i    for i = 1..n
//! ```
//!
//! and the result is normalized. Blend maps are sampled at texels snapped to the global
//! texel lattice (see [`BlendMapSpace`]), so two chunks sharing an edge produce the same
//! weight for the shared vertices.

use std::sync::Arc;

use glam::{Vec2, Vec3};
use image::GrayImage;
use tundra_config::WeightConfig;

use crate::{BlendMapSpace, MaterialClassifier, TextureLayer, WeightVector};

/// Cost tier of weight sampling, chosen by distance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WeightQuality {
    /// One blend-map lookup per vertex.
    Full,
    /// One lookup at the chunk center, reused for every vertex.
    Simplified,
    /// No lookups; every vertex is pure rock.
    None,
}

impl WeightQuality {
    /// Select the tier for a grid distance (in cells).
    pub fn for_distance(distance: f32, config: &WeightConfig) -> Self {
        if !config.enabled {
            WeightQuality::None
        } else if distance <= config.full_distance {
            WeightQuality::Full
        } else if distance <= config.simplified_distance {
            WeightQuality::Simplified
        } else {
            WeightQuality::None
        }
    }

    /// Whether this tier produces a weight attribute at all.
    pub fn in_range(self) -> bool {
        self != WeightQuality::None
    }
}

/// Computes normalized material weights for chunk vertices.
#[derive(Clone, Copy, Debug)]
pub struct WeightSampler<'a> {
    classifier: &'a MaterialClassifier,
}

impl<'a> WeightSampler<'a> {
    /// Create a sampler that classifies layers with `classifier`.
    pub fn new(classifier: &'a MaterialClassifier) -> Self {
        Self { classifier }
    }

    /// Compute one weight per vertex.
    ///
    /// `positions` are chunk-local, in world units relative to the chunk center, z-up.
    /// `blendmaps[i]` belongs to `layers[i + 1]`; the base layer has none.
    pub fn sample_vertices(
        &self,
        positions: &[Vec3],
        cell_world_size: f32,
        space: &BlendMapSpace,
        layers: &[TextureLayer],
        blendmaps: &[Arc<GrayImage>],
        quality: WeightQuality,
    ) -> Vec<WeightVector> {
        if layers.is_empty() {
            if quality.in_range() {
                tracing::warn!(
                    center = ?space.center,
                    "chunk has no texture layers, using rock weights"
                );
            }
            return vec![WeightVector::ROCK; positions.len()];
        }
        if blendmaps.len() + 1 < layers.len() {
            tracing::warn!(
                layers = layers.len(),
                blendmaps = blendmaps.len(),
                "missing blend maps, affected layers contribute nothing"
            );
        }

        let classes: Vec<WeightVector> = layers
            .iter()
            .map(|layer| self.classifier.classify(&layer.diffuse_map).weight())
            .collect();

        match quality {
            WeightQuality::None => vec![WeightVector::ROCK; positions.len()],
            WeightQuality::Simplified => {
                let w = blend_at(space.center, space, &classes, blendmaps);
                vec![w; positions.len()]
            }
            WeightQuality::Full => positions
                .iter()
                .map(|p| {
                    let cells = space.center + Vec2::new(p.x, p.y) / cell_world_size;
                    blend_at(cells, space, &classes, blendmaps)
                })
                .collect(),
        }
    }

    /// Weight at a single cell-space coordinate.
    pub fn sample_at(
        &self,
        cells: Vec2,
        space: &BlendMapSpace,
        layers: &[TextureLayer],
        blendmaps: &[Arc<GrayImage>],
    ) -> WeightVector {
        let classes: Vec<WeightVector> = layers
            .iter()
            .map(|layer| self.classifier.classify(&layer.diffuse_map).weight())
            .collect();
        blend_at(cells, space, &classes, blendmaps)
    }
}

fn blend_at(
    cells: Vec2,
    space: &BlendMapSpace,
    classes: &[WeightVector],
    blendmaps: &[Arc<GrayImage>],
) -> WeightVector {
    let Some((&base, rest)) = classes.split_first() else {
        return WeightVector::ROCK;
    };
    let texel = space.local_texel(cells);
    let mut result = base;
    for (i, &class) in rest.iter().enumerate() {
        let b = blendmaps
            .get(i)
            .map(|map| texel_value(map, texel.x, texel.y))
            .unwrap_or(0.0);
        result = result.lerp(class, b);
    }
    result.normalized()
}

/// Blend value in `[0, 1]` at a texel, clamped to the image. Image row 0 is the north edge.
fn texel_value(map: &GrayImage, x: i64, y: i64) -> f32 {
    let (w, h) = map.dimensions();
    if w == 0 || h == 0 {
        return 0.0;
    }
    let x = x.clamp(0, w as i64 - 1) as u32;
    let y = y.clamp(0, h as i64 - 1) as u32;
    map.get_pixel(x, h - 1 - y).0[0] as f32 / 255.0
}
