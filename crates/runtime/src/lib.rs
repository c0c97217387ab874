//! Runtime: the explicitly owned context tying the instance pool to the scheduler.
//!
//! # Invariants
//! - Every successful spawn and despawn, and every tick, appends exactly one event.
//! - Scheduler callbacks reach the pool only through the [`World`] they are handed.

pub mod world;

pub use world::{Runtime, RuntimeEvent, SceneHost, World};

pub fn crate_info() -> &'static str {
    "tickpool-runtime v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("runtime"));
    }
}
