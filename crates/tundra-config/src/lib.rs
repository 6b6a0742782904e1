//! Configuration system for the Tundra terrain engine.
//!
//! Provides runtime-configurable terrain settings that persist to disk as RON files.
//! Supports CLI overrides via clap, hot-reload detection, validation, and
//! forward/backward compatible serialization.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CacheConfig, DebugConfig, MaterialKeywordConfig, MaterialKeywords, SubdivisionConfig,
    TerrainConfig, WeightConfig,
};
pub use error::ConfigError;
