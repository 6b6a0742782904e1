//! Command-line argument parsing for Tundra tools.

use std::path::PathBuf;

use clap::Parser;

use crate::TerrainConfig;

/// Tundra command-line arguments.
///
/// CLI values override settings loaded from `terrain.ron`.
#[derive(Parser, Debug)]
#[command(name = "tundra", about = "Tundra terrain chunk engine")]
pub struct CliArgs {
    /// Chunk size (in cells) from which composite maps are used.
    #[arg(long)]
    pub composite_map_level: Option<f32>,

    /// Enable or disable quad-patch tessellation buffers.
    #[arg(long)]
    pub tessellation: Option<bool>,

    /// Enable or disable runtime subdivision.
    #[arg(long)]
    pub subdivision: Option<bool>,

    /// Seconds until a subdivision trail has fully decayed.
    #[arg(long)]
    pub max_trail_time: Option<f32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Number of frames to simulate.
    #[arg(long, default_value_t = 600)]
    pub frames: u64,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl TerrainConfig {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(level) = args.composite_map_level {
            self.cache.composite_map_level = level;
        }
        if let Some(tess) = args.tessellation {
            self.cache.tessellation = tess;
        }
        if let Some(enabled) = args.subdivision {
            self.subdivision.enabled = enabled;
        }
        if let Some(t) = args.max_trail_time {
            self.subdivision.max_trail_time = t;
            if self.subdivision.decay_start_time > t {
                self.subdivision.decay_start_time = t;
            }
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
