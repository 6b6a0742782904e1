//! Terrain material weights: layer classification, normalized weight vectors, and
//! boundary-consistent per-vertex blend-map sampling.

mod classifier;
mod layer;
mod sampler;
mod weight;

pub use classifier::{MaterialClass, MaterialClassifier};
pub use layer::{BlendMapSpace, TextureLayer};
pub use sampler::{WeightQuality, WeightSampler};
pub use weight::WeightVector;
