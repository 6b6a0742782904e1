//! Fixed-point chunk centers used as hashable, totally ordered cache keys.

use std::fmt;

use glam::Vec2;

/// Fractional bits of a [`ChunkCenter`] component.
pub const SUBCELL_BITS: u32 = 12;

/// Raw units per cell (`2^SUBCELL_BITS`).
pub const SUBCELL_SCALE: i64 = 1i64 << SUBCELL_BITS;

/// A chunk center in cell space, stored as fixed point with [`SUBCELL_BITS`] fractional bits.
///
/// The raw value equals `cells × 4096`. Centers of chunks down to 1/2048 of a cell are
/// represented exactly; anything finer is rounded to the nearest raw unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChunkCenter {
    x: i64,
    y: i64,
}

impl ChunkCenter {
    /// Create from raw fixed-point components.
    pub const fn from_raw(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Quantize a floating-point cell coordinate.
    pub fn from_cells(cells: Vec2) -> Self {
        Self {
            x: (cells.x as f64 * SUBCELL_SCALE as f64).round() as i64,
            y: (cells.y as f64 * SUBCELL_SCALE as f64).round() as i64,
        }
    }

    /// The center as a floating-point cell coordinate.
    pub fn to_cells(self) -> Vec2 {
        Vec2::new(
            (self.x as f64 / SUBCELL_SCALE as f64) as f32,
            (self.y as f64 / SUBCELL_SCALE as f64) as f32,
        )
    }

    /// Raw fixed-point components `(x, y)`.
    pub const fn raw(self) -> (i64, i64) {
        (self.x, self.y)
    }
}

impl From<Vec2> for ChunkCenter {
    fn from(cells: Vec2) -> Self {
        Self::from_cells(cells)
    }
}

impl fmt::Display for ChunkCenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = self.to_cells();
        write!(f, "({:.4}, {:.4})", c.x, c.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_fractions_are_exact() {
        let center = ChunkCenter::from_cells(Vec2::new(0.0625, -3.5));
        assert_eq!(center.raw(), (256, -14336));
        assert_eq!(center.to_cells(), Vec2::new(0.0625, -3.5));
    }

    #[test]
    fn test_nearby_floats_quantize_to_same_center() {
        let a = ChunkCenter::from_cells(Vec2::new(1.25, 2.75));
        let b = ChunkCenter::from_cells(Vec2::new(1.25 + 1e-6, 2.75 - 1e-6));
        assert_eq!(a, b);
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let a = ChunkCenter::from_cells(Vec2::new(0.0, 5.0));
        let b = ChunkCenter::from_cells(Vec2::new(0.5, -5.0));
        assert!(a < b);
    }

    #[test]
    fn test_display() {
        let center = ChunkCenter::from_cells(Vec2::new(0.5, 1.0));
        assert_eq!(center.to_string(), "(0.5000, 1.0000)");
    }
}
