//! Distance thresholds for the baseline subdivision level.

use tundra_config::SubdivisionConfig;

/// Maps a grid distance to the subdivision level proximity alone would grant.
#[derive(Clone, Debug, PartialEq)]
pub struct SubdivisionThresholds {
    /// `distances[i]` is the largest effective distance granting level `i + 1`.
    distances: Vec<f32>,
    /// Subtracted from the distance before lookup.
    pre_subdivision_buffer: f32,
}

impl SubdivisionThresholds {
    /// Thresholds from configuration. A disabled configuration grants nothing.
    pub fn from_config(config: &SubdivisionConfig) -> Self {
        if !config.enabled {
            return Self::custom(Vec::new(), config.pre_subdivision_buffer);
        }
        Self::custom(config.level_distances.clone(), config.pre_subdivision_buffer)
    }

    /// Create custom thresholds.
    ///
    /// # Panics
    ///
    /// Panics if there are more than four levels, the distances increase, or the buffer
    /// is negative.
    pub fn custom(distances: Vec<f32>, pre_subdivision_buffer: f32) -> Self {
        assert!(distances.len() <= 4, "at most 4 subdivision levels");
        assert!(
            distances.windows(2).all(|w| w[1] <= w[0]),
            "subdivision distances must be non-increasing"
        );
        assert!(pre_subdivision_buffer >= 0.0, "buffer must be non-negative");
        Self {
            distances,
            pre_subdivision_buffer,
        }
    }

    /// Highest level these thresholds can grant.
    pub fn max_level(&self) -> u8 {
        self.distances.len() as u8
    }

    /// The level granted at grid distance `distance` (cells).
    pub fn baseline_level(&self, distance: f32) -> u8 {
        let effective = (distance - self.pre_subdivision_buffer).max(0.0);
        self.distances
            .iter()
            .take_while(|&&limit| effective <= limit)
            .count() as u8
    }

    /// Distance beyond which no level is granted.
    pub fn reach(&self) -> f32 {
        self.distances
            .first()
            .map_or(0.0, |&d| d + self.pre_subdivision_buffer)
    }
}

impl Default for SubdivisionThresholds {
    fn default() -> Self {
        Self::from_config(&SubdivisionConfig::default())
    }
}
