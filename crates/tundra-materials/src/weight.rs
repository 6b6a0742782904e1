//! The four-channel material weight carried per terrain vertex.

use std::ops::{Add, Mul};

/// Sum below which a weight is treated as empty and replaced by pure rock.
const EMPTY_SUM: f32 = 1e-6;

/// Per-vertex material weight `(snow, ash, mud, rock)`.
///
/// Every weight handed out by this crate sums to 1 within 1e-3. A weight with no
/// information falls back to [`WeightVector::ROCK`].
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct WeightVector {
    /// Snow and ice.
    pub snow: f32,
    /// Ash and volcanic soil.
    pub ash: f32,
    /// Mud and dirt.
    pub mud: f32,
    /// Rock, the default class.
    pub rock: f32,
}

impl WeightVector {
    /// Pure snow.
    pub const SNOW: Self = Self::new(1.0, 0.0, 0.0, 0.0);
    /// Pure ash.
    pub const ASH: Self = Self::new(0.0, 1.0, 0.0, 0.0);
    /// Pure mud.
    pub const MUD: Self = Self::new(0.0, 0.0, 1.0, 0.0);
    /// Pure rock.
    pub const ROCK: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Create a weight from raw components. The result is not normalized.
    pub const fn new(snow: f32, ash: f32, mud: f32, rock: f32) -> Self {
        Self {
            snow,
            ash,
            mud,
            rock,
        }
    }

    /// Sum of all four components.
    pub fn sum(self) -> f32 {
        self.snow + self.ash + self.mud + self.rock
    }

    /// Scale the components to sum to 1, or return pure rock if the sum is ~0.
    pub fn normalized(self) -> Self {
        let sum = self.sum();
        if sum.abs() < EMPTY_SUM || !sum.is_finite() {
            return Self::ROCK;
        }
        self * (1.0 / sum)
    }

    /// Interpolate toward `target` by `t` (`0.0` keeps `self`). Not normalized.
    pub fn lerp(self, target: Self, t: f32) -> Self {
        self * (1.0 - t) + target * t
    }

    /// Normalized average of two weights, used when splitting an edge.
    pub fn midpoint(a: Self, b: Self) -> Self {
        ((a + b) * 0.5).normalized()
    }

    /// Components as an array in `(snow, ash, mud, rock)` order.
    pub fn to_array(self) -> [f32; 4] {
        [self.snow, self.ash, self.mud, self.rock]
    }

    /// Whether the components sum to 1 within `tolerance`.
    pub fn is_normalized(self, tolerance: f32) -> bool {
        (self.sum() - 1.0).abs() < tolerance
    }
}

impl Default for WeightVector {
    fn default() -> Self {
        Self::ROCK
    }
}

impl Add for WeightVector {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(
            self.snow + rhs.snow,
            self.ash + rhs.ash,
            self.mud + rhs.mud,
            self.rock + rhs.rock,
        )
    }
}

impl Mul<f32> for WeightVector {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.snow * rhs, self.ash * rhs, self.mud * rhs, self.rock * rhs)
    }
}
