//! Configuration structs with sensible defaults and RON persistence.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level terrain configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    /// Chunk cache and render-path settings.
    pub cache: CacheConfig,
    /// Sticky subdivision trail settings.
    pub subdivision: SubdivisionConfig,
    /// Material weight sampling settings.
    pub weights: WeightConfig,
    /// Keyword lists used to classify texture layers.
    pub materials: MaterialKeywordConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Chunk cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// Chunks at least this large (in cells) bake their material into a composite map.
    pub composite_map_level: f32,
    /// Request quad-patch buffers for near, non-composite chunks.
    pub tessellation: bool,
    /// Largest chunk size (in cells) that may use quad patches.
    pub tessellation_max_chunk_size: f32,
    /// Seconds an unreferenced chunk stays cached before `update_cache` evicts it.
    pub expiry_delay: f64,
}

/// Subdivision trail configuration. Distances are in cells, times in seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SubdivisionConfig {
    /// Enable runtime triangle subdivision.
    pub enabled: bool,
    /// `level_distances[i]` is the largest grid distance that still grants level `i + 1`.
    /// Must be non-increasing; its length is the maximum level (at most 4).
    pub level_distances: Vec<f32>,
    /// Distance subtracted before the baseline lookup, so chunks subdivide just
    /// before the player reaches them.
    pub pre_subdivision_buffer: f32,
    /// Beyond this distance a record may be pruned.
    pub max_trail_distance: f32,
    /// Grace window after the player leaves during which the level is held.
    pub decay_start_time: f32,
    /// Time after the player leaves at which the trail has fully decayed.
    pub max_trail_time: f32,
}

/// Weight sampling tiers. Distances are grid distances in cells.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WeightConfig {
    /// Attach per-vertex material weights at all.
    pub enabled: bool,
    /// Per-vertex sampling up to this distance.
    pub full_distance: f32,
    /// A single center sample up to this distance; fixed rock weight beyond.
    pub simplified_distance: f32,
}

/// Include/exclude keyword pair for one material class.
///
/// A texture name belongs to the class when it contains any `include` keyword
/// and no `exclude` keyword, compared case-insensitively.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MaterialKeywords {
    /// Substrings that mark a texture as this class.
    pub include: Vec<String>,
    /// Substrings that veto the class even when an include keyword matched.
    pub exclude: Vec<String>,
}

/// Keyword lists for the deformable material classes. Anything unmatched is rock.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MaterialKeywordConfig {
    /// Snow and ice textures.
    pub snow: MaterialKeywords,
    /// Ash and volcanic soil textures.
    pub ash: MaterialKeywords,
    /// Mud, dirt and swamp textures.
    pub mud: MaterialKeywords,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Log cache statistics every this many frames (0 = never).
    pub stats_interval: u64,
}

// --- Default implementations ---

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            composite_map_level: 4.0,
            tessellation: false,
            tessellation_max_chunk_size: 0.5,
            expiry_delay: 5.0,
        }
    }
}

impl Default for SubdivisionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level_distances: vec![0.25, 0.125, 0.0],
            pre_subdivision_buffer: 0.0625,
            max_trail_distance: 0.5,
            decay_start_time: 10.0,
            max_trail_time: 30.0,
        }
    }
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            full_distance: 0.25,
            simplified_distance: 1.0,
        }
    }
}

fn keywords(include: &[&str], exclude: &[&str]) -> MaterialKeywords {
    MaterialKeywords {
        include: include.iter().map(|s| s.to_string()).collect(),
        exclude: exclude.iter().map(|s| s.to_string()).collect(),
    }
}

impl Default for MaterialKeywordConfig {
    fn default() -> Self {
        Self {
            snow: keywords(
                &["snow", "ice", "frost", "glacier"],
                &["grass", "rock", "dirt", "mud", "stone"],
            ),
            ash: keywords(
                &["ash", "volcanic", "scorched", "cinder"],
                &["grass", "rock", "stone", "ashtree"],
            ),
            mud: keywords(
                &["mud", "dirt", "swamp", "bog", "mire", "soil"],
                &["rock", "stone", "snow", "road"],
            ),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            stats_interval: 0,
        }
    }
}

impl SubdivisionConfig {
    /// Highest subdivision level this configuration can grant.
    pub fn max_level(&self) -> u8 {
        if self.enabled {
            self.level_distances.len() as u8
        } else {
            0
        }
    }
}

// --- Validation ---

impl TerrainConfig {
    /// Check cross-field invariants that `serde` cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sub = &self.subdivision;
        if sub.level_distances.len() > 4 {
            return Err(ConfigError::Invalid(format!(
                "at most 4 subdivision levels are supported, got {}",
                sub.level_distances.len()
            )));
        }
        if sub.level_distances.windows(2).any(|w| w[1] > w[0]) {
            return Err(ConfigError::Invalid(
                "subdivision level_distances must be non-increasing".to_string(),
            ));
        }
        if sub.decay_start_time < 0.0 || sub.decay_start_time > sub.max_trail_time {
            return Err(ConfigError::Invalid(format!(
                "decay_start_time ({}) must lie within [0, max_trail_time ({})]",
                sub.decay_start_time, sub.max_trail_time
            )));
        }
        if self.weights.full_distance > self.weights.simplified_distance {
            return Err(ConfigError::Invalid(
                "weights.full_distance must not exceed weights.simplified_distance".to_string(),
            ));
        }
        if self.cache.composite_map_level <= 0.0 {
            return Err(ConfigError::Invalid(
                "cache.composite_map_level must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

// --- Load / Save / Reload ---

impl TerrainConfig {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("terrain.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: TerrainConfig = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            config.validate()?;
            log::info!("Loaded terrain config from {}", config_path.display());
            Ok(config)
        } else {
            let config = TerrainConfig::default();
            config.save(config_dir)?;
            log::info!("Created default terrain config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `terrain.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("terrain.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("terrain.ron");
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: TerrainConfig =
            ron::from_str(&contents).map_err(ConfigError::ParseError)?;
        new_config.validate()?;

        if &new_config != self {
            log::info!("Terrain config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = TerrainConfig::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(3))
                .unwrap();
        assert!(ron_str.contains("composite_map_level: 4.0"));
        assert!(ron_str.contains("max_trail_time: 30.0"));
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(TerrainConfig::default().validate().is_ok());
        assert_eq!(TerrainConfig::default().subdivision.max_level(), 3);
    }

    #[test]
    fn test_config_roundtrip() {
        let config = TerrainConfig::default();
        let ron_str = ron::to_string(&config).unwrap();
        let deserialized: TerrainConfig = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_section_uses_default() {
        let ron_str = "(cache: (tessellation: true))";
        let config: TerrainConfig = ron::from_str(ron_str).unwrap();
        assert!(config.cache.tessellation);
        assert_eq!(config.cache.composite_map_level, 4.0);
        assert_eq!(config.subdivision, SubdivisionConfig::default());
    }

    #[test]
    fn test_increasing_level_distances_rejected() {
        let mut config = TerrainConfig::default();
        config.subdivision.level_distances = vec![0.1, 0.2];
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_too_many_levels_rejected() {
        let mut config = TerrainConfig::default();
        config.subdivision.level_distances = vec![1.0, 0.8, 0.6, 0.4, 0.2];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_decay_window_must_fit_trail_time() {
        let mut config = TerrainConfig::default();
        config.subdivision.decay_start_time = 40.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_disabled_subdivision_has_no_levels() {
        let mut config = TerrainConfig::default();
        config.subdivision.enabled = false;
        assert_eq!(config.subdivision.max_level(), 0);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = TerrainConfig::default();
        config.cache.tessellation = true;
        config.weights.full_distance = 0.5;

        config.save(dir.path()).unwrap();
        let loaded = TerrainConfig::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = TerrainConfig::load_or_create(dir.path()).unwrap();
        assert_eq!(config, TerrainConfig::default());
        assert!(dir.path().join("terrain.ron").exists());
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = TerrainConfig::default();
        config.save(dir.path()).unwrap();

        let mut modified = config.clone();
        modified.subdivision.max_trail_time = 60.0;
        modified.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert_eq!(result.unwrap().subdivision.max_trail_time, 60.0);
        assert!(config.reload(dir.path()).unwrap().is_some());
    }

    #[test]
    fn test_reload_no_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = TerrainConfig::default();
        config.save(dir.path()).unwrap();
        assert!(config.reload(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let result: Result<TerrainConfig, _> = ron::from_str("{{not valid}}");
        assert!(result.is_err());
    }
}
