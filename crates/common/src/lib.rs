//! Shared types used across the tickpool crates.

mod range;
mod types;

pub use range::{DoubleRange, FloatRange, IntRange, LongRange, Position, ValueRange};
pub use types::{InstanceId, TemplateKey, Transform};

pub fn crate_info() -> &'static str {
    "tickpool-common v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("common"));
    }
}
