use std::time::Duration;

use crate::scheduler::{Callback, Frame, Poll, Predicate, Scheduler, Task};

/// Wake condition of a [`PendingWait`].
pub(crate) enum Condition<C> {
    /// Fires on the tick where `remaining` reaches one.
    Frames { remaining: u64 },
    /// Fires once the deltas of the ticks seen so far add up to `target`.
    Elapsed {
        target: Duration,
        accumulated: Duration,
    },
    Until(Predicate<C>),
    While(Predicate<C>),
}

/// A single continuation: one condition, one callback.
pub(crate) struct PendingWait<C> {
    condition: Condition<C>,
    callback: Option<Callback<C>>,
}

impl<C> PendingWait<C> {
    pub(crate) fn new(condition: Condition<C>, callback: Callback<C>) -> Self {
        Self {
            condition,
            callback: Some(callback),
        }
    }

    fn satisfied(&mut self, frame: &Frame, ctx: &C) -> bool {
        match &mut self.condition {
            Condition::Frames { remaining } => {
                if *remaining <= 1 {
                    true
                } else {
                    *remaining -= 1;
                    false
                }
            }
            Condition::Elapsed {
                target,
                accumulated,
            } => {
                *accumulated = accumulated.saturating_add(frame.delta);
                *accumulated >= *target
            }
            Condition::Until(predicate) => predicate(ctx),
            Condition::While(predicate) => !predicate(ctx),
        }
    }
}

impl<C> Task<C> for PendingWait<C> {
    fn poll(&mut self, frame: &Frame, scheduler: &mut Scheduler<C>, ctx: &mut C) -> Poll {
        if !self.satisfied(frame, ctx) {
            return Poll::Pending;
        }
        if let Some(callback) = self.callback.take() {
            callback(scheduler, ctx);
        }
        Poll::Ready
    }

    fn label(&self) -> &'static str {
        match self.condition {
            Condition::Frames { .. } => "frames",
            Condition::Elapsed { .. } => "duration",
            Condition::Until(_) => "until",
            Condition::While(_) => "while",
        }
    }
}
