//! Sticky per-chunk subdivision levels that decay after the player leaves.
//!
//! A chunk near the player gets a baseline level from [`SubdivisionThresholds`]. Once
//! granted, the level is remembered: it is held for `decay_start_time` seconds after the
//! player moves away, then falls linearly to zero at `max_trail_time`. The level handed
//! to the cache is the maximum of the remembered (decayed) level and the fresh baseline,
//! so proximity is always honored and the trail never snaps down.

use glam::Vec2;
use rustc_hash::FxHashMap;
use tundra_config::SubdivisionConfig;
use tundra_coords::{ChunkCenter, grid_distance};

use crate::SubdivisionThresholds;

/// Trail state of one chunk.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubdivisionRecord {
    /// Level at the moment the player left, before decay.
    pub level: u8,
    /// Seconds since the record was created.
    pub time_tracked: f32,
    /// Seconds since the player was last within subdivision range.
    pub time_since_player_left: f32,
    /// Chunk center in cells.
    pub world_center: Vec2,
    /// Chunk size in cells.
    pub chunk_size: f32,
}

/// Tracks sticky subdivision levels for active-grid chunks.
///
/// Call [`update`](Self::update) once per frame before querying levels so every query of
/// that frame sees the same state.
#[derive(Debug)]
pub struct SubdivisionTracker {
    thresholds: SubdivisionThresholds,
    max_trail_distance: f32,
    decay_start_time: f32,
    max_trail_time: f32,
    records: FxHashMap<ChunkCenter, SubdivisionRecord>,
}

impl SubdivisionTracker {
    /// Create a tracker from configuration.
    pub fn new(config: &SubdivisionConfig) -> Self {
        Self {
            thresholds: SubdivisionThresholds::from_config(config),
            max_trail_distance: config.max_trail_distance,
            decay_start_time: config.decay_start_time.max(0.0),
            max_trail_time: config.max_trail_time.max(config.decay_start_time),
            records: FxHashMap::default(),
        }
    }

    /// The baseline thresholds.
    pub fn thresholds(&self) -> &SubdivisionThresholds {
        &self.thresholds
    }

    /// Level of `record` after decay.
    pub fn decayed_level(&self, record: &SubdivisionRecord) -> u8 {
        decayed(record, self.decay_start_time, self.max_trail_time)
    }

    /// Advance every record by `dt` seconds with the player at `player_cells`.
    pub fn update(&mut self, dt: f32, player_cells: Vec2) {
        let before = self.records.len();
        let (decay_start, max_time) = (self.decay_start_time, self.max_trail_time);
        let thresholds = &self.thresholds;
        let max_distance = self.max_trail_distance;

        self.records.retain(|_, record| {
            record.time_tracked += dt;
            let distance = grid_distance(record.world_center, record.chunk_size, player_cells);
            let baseline = thresholds.baseline_level(distance);
            if baseline > 0 {
                record.level = decayed(record, decay_start, max_time).max(baseline);
                record.time_since_player_left = 0.0;
            } else {
                record.time_since_player_left += dt;
            }
            distance <= max_distance || record.time_since_player_left < max_time
        });

        let pruned = before - self.records.len();
        if pruned > 0 {
            tracing::debug!(pruned, remaining = self.records.len(), "pruned subdivision trail");
        }
    }

    /// Subdivision level for the chunk at `center` with the player at `player_cells`.
    ///
    /// Creates or raises the chunk's record when proximity grants a level.
    pub fn level_for(&mut self, center: ChunkCenter, chunk_size: f32, player_cells: Vec2) -> u8 {
        let world_center = center.to_cells();
        let distance = grid_distance(world_center, chunk_size, player_cells);
        let baseline = self.thresholds.baseline_level(distance);
        let (decay_start, max_time) = (self.decay_start_time, self.max_trail_time);

        match self.records.get_mut(&center) {
            Some(record) => {
                let held = decayed(record, decay_start, max_time);
                if baseline > 0 {
                    record.level = held.max(baseline);
                    record.time_since_player_left = 0.0;
                }
                held.max(baseline)
            }
            None if baseline > 0 => {
                tracing::trace!(%center, level = baseline, "tracking subdivision");
                self.records.insert(
                    center,
                    SubdivisionRecord {
                        level: baseline,
                        time_tracked: 0.0,
                        time_since_player_left: 0.0,
                        world_center,
                        chunk_size,
                    },
                );
                baseline
            }
            None => 0,
        }
    }

    /// The record of one chunk, if tracked.
    pub fn record(&self, center: ChunkCenter) -> Option<&SubdivisionRecord> {
        self.records.get(&center)
    }

    /// Number of tracked chunks.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Forget every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

/// Held through `decay_start`, then linear toward zero at `max_time`, floored.
fn decayed(record: &SubdivisionRecord, decay_start: f32, max_time: f32) -> u8 {
    let t = record.time_since_player_left;
    if t <= decay_start {
        record.level
    } else if t >= max_time {
        0
    } else {
        let remaining = 1.0 - (t - decay_start) / (max_time - decay_start);
        (record.level as f32 * remaining).floor() as u8
    }
}
