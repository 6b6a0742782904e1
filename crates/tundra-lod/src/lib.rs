//! Distance-driven subdivision levels with a sticky, time-decaying trail.

mod thresholds;
mod tracker;

pub use thresholds::SubdivisionThresholds;
pub use tracker::{SubdivisionRecord, SubdivisionTracker};
