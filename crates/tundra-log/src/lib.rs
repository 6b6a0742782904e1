//! Structured logging for Tundra.
//!
//! Sets up span-based, filterable logging via the `tracing` ecosystem: console output
//! with uptime timestamps and module paths, plus JSON file logging in debug builds for
//! post-mortem analysis of cache behaviour. The level comes from `RUST_LOG` when set,
//! otherwise from the terrain config.

use std::path::Path;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use tundra_config::TerrainConfig;

/// Filter used when neither `RUST_LOG` nor a config level is available.
pub const DEFAULT_FILTER: &str = "info";

/// Build the filter string for the given config.
///
/// The config's `debug.log_level` applies to every target; an empty level falls
/// back to [`DEFAULT_FILTER`].
pub fn filter_for(config: Option<&TerrainConfig>) -> String {
    match config {
        Some(config) if !config.debug.log_level.is_empty() => config.debug.log_level.clone(),
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Initialize the global tracing subscriber.
///
/// * `log_dir` - Optional directory for the JSON log file (debug builds only)
/// * `debug_build` - Whether file logging should be enabled
/// * `config` - Optional configuration supplying the log level
///
/// Returns `false` if a global subscriber was already installed.
///
/// ```no_run
/// use tundra_log::init_logging;
/// use tundra_config::TerrainConfig;
///
/// let config = TerrainConfig::default();
/// init_logging(None, false, Some(&config));
/// ```
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&TerrainConfig>) -> bool {
    let filter_str = filter_for(config);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if debug_build
        && let Some(log_dir) = log_dir
        && std::fs::create_dir_all(log_dir).is_ok()
        && let Ok(log_file) = std::fs::File::create(log_dir.join("tundra.log"))
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        return subscriber.with(file_layer).try_init().is_ok();
    }

    subscriber.try_init().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_without_config() {
        assert_eq!(filter_for(None), "info");
    }

    #[test]
    fn test_config_level_is_used() {
        let mut config = TerrainConfig::default();
        config.debug.log_level = "warn,tundra_terrain=debug".to_string();
        let filter = EnvFilter::new(filter_for(Some(&config)));
        let filter_str = format!("{}", filter);
        assert!(filter_str.contains("tundra_terrain=debug"));
        assert!(filter_str.contains("warn"));
    }

    #[test]
    fn test_empty_config_level_falls_back() {
        let mut config = TerrainConfig::default();
        config.debug.log_level.clear();
        assert_eq!(filter_for(Some(&config)), DEFAULT_FILTER);
    }

    #[test]
    fn test_env_filter_parsing() {
        let valid_filters = [
            "info",
            "debug,tundra_mesh=trace",
            "warn,tundra_lod=debug,tundra_materials=trace",
            "error",
        ];

        for filter_str in &valid_filters {
            let result = EnvFilter::try_from(*filter_str);
            assert!(result.is_ok(), "Failed to parse filter: {}", filter_str);
        }
    }

    #[test]
    fn test_second_init_reports_existing_subscriber() {
        let dir = tempfile::tempdir().unwrap();
        let first = init_logging(Some(dir.path()), true, None);
        let second = init_logging(None, false, None);
        assert!(!second || !first);
        if first {
            assert!(dir.path().join("tundra.log").exists());
        }
    }
}
