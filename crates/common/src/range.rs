use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed interval `[min, max]`.
///
/// Construction normalizes the bounds: passing them in the wrong order swaps
/// them, so `min <= max` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "RawRange<T>",
    bound(deserialize = "T: Deserialize<'de> + PartialOrd + Copy")
)]
pub struct ValueRange<T> {
    min: T,
    max: T,
}

pub type IntRange = ValueRange<i32>;
pub type LongRange = ValueRange<i64>;
pub type FloatRange = ValueRange<f32>;
pub type DoubleRange = ValueRange<f64>;

impl<T: PartialOrd + Copy> ValueRange<T> {
    pub fn new(a: T, b: T) -> Self {
        if a <= b {
            Self { min: a, max: b }
        } else {
            Self { min: b, max: a }
        }
    }

    pub fn min(&self) -> T {
        self.min
    }

    pub fn max(&self) -> T {
        self.max
    }

    /// Inclusive on both ends.
    pub fn contains(&self, value: T) -> bool {
        self.min <= value && value <= self.max
    }
}

impl FloatRange {
    /// Linear interpolation; `t` is clamped to `[0, 1]`.
    pub fn lerp(&self, t: f32) -> f32 {
        self.min + (self.max - self.min) * t.clamp(0.0, 1.0)
    }
}

impl<T: fmt::Display> fmt::Display for ValueRange<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} - {}]", self.min, self.max)
    }
}

/// Integer pair `(x, y)` read as the inclusive span `x..=y`.
///
/// Unlike [`ValueRange`] the bounds are kept as given, so an inverted pair
/// contains nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn contains_value(&self, value: i32) -> bool {
        self.x <= value && value <= self.y
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} - {}]", self.x, self.y)
    }
}

// Deserialized bounds go through `new` so files cannot produce an inverted range.
#[derive(Deserialize)]
struct RawRange<T> {
    min: T,
    max: T,
}

impl<T: PartialOrd + Copy> From<RawRange<T>> for ValueRange<T> {
    fn from(raw: RawRange<T>) -> Self {
        Self::new(raw.min, raw.max)
    }
}
