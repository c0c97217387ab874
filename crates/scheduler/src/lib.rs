//! Deferred Scheduler: frame, duration and predicate waits resolved once per tick.
//!
//! # Invariants
//! - Registration never evaluates a condition; the first check happens on the next tick.
//! - Every pending wait is checked at most once per tick and fires at most once.
//! - Waits satisfied in the same tick fire in registration order.
//!
//! Scene transitions are built on the same tick loop as a staged state
//! machine over a host-provided [`SceneLoader`].

mod scene;
mod scheduler;
mod simulated;
mod wait;

pub use scene::{LoadMode, LoadOperation, READY_TO_ACTIVATE, SceneId, SceneLoadRequest, SceneLoader};
pub use scheduler::{Callback, Frame, Predicate, Scheduler, WaitId};
pub use simulated::SimulatedLoader;

pub fn crate_info() -> &'static str {
    "tickpool-scheduler v0.1.0"
}
