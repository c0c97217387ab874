use std::collections::HashSet;
use std::time::Duration;

use crate::scene::{
    LoadOperation, SceneId, SceneLoadRequest, SceneLoader, SceneTransition, SceneUnload,
};
use crate::wait::{Condition, PendingWait};

/// Completion callback. Receives the scheduler, so it can chain further
/// waits, and the host context.
pub type Callback<C> = Box<dyn FnOnce(&mut Scheduler<C>, &mut C)>;

/// Condition evaluated once per tick against the host context.
pub type Predicate<C> = Box<dyn FnMut(&C) -> bool>;

/// Handle to a registered wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WaitId(pub u64);

/// Clock state as of the most recent tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Frame {
    /// Ticks advanced since the scheduler was created.
    pub tick: u64,
    /// Time supplied with the most recent tick.
    pub delta: Duration,
    /// Sum of every delta supplied so far.
    pub elapsed: Duration,
}

pub(crate) enum Poll {
    Pending,
    Ready,
}

/// A continuation advanced once per tick until it reports [`Poll::Ready`].
pub(crate) trait Task<C> {
    fn poll(&mut self, frame: &Frame, scheduler: &mut Scheduler<C>, ctx: &mut C) -> Poll;

    fn label(&self) -> &'static str;
}

struct Entry<C> {
    id: WaitId,
    task: Box<dyn Task<C>>,
}

/// Registry of pending continuations resolved against a discrete clock.
///
/// Registration never evaluates anything: every wait is first polled on the
/// next call to [`tick`](Scheduler::tick). Each tick polls every task exactly
/// once, in registration order, and a satisfied task fires its callback in
/// that same tick before being discarded. Waits registered from inside a
/// callback are first polled on the following tick.
///
/// `C` is the host context handed to predicates and callbacks.
pub struct Scheduler<C = ()> {
    frame: Frame,
    next_id: u64,
    tasks: Vec<Entry<C>>,
    // Ids of the tasks taken out for the tick in progress.
    in_flight: HashSet<WaitId>,
    cancelled: HashSet<WaitId>,
    // Task being polled right now; its own callback cannot cancel it.
    polling: Option<WaitId>,
}

impl<C> Default for Scheduler<C> {
    fn default() -> Self {
        Self {
            frame: Frame::default(),
            next_id: 0,
            tasks: Vec::new(),
            in_flight: HashSet::new(),
            cancelled: HashSet::new(),
            polling: None,
        }
    }
}

impl<C: 'static> Scheduler<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock state after the latest tick.
    pub fn frame(&self) -> Frame {
        self.frame
    }

    /// Number of waits that have not fired or been cancelled.
    pub fn pending(&self) -> usize {
        self.tasks.len() + self.in_flight.len()
    }

    pub fn is_pending(&self, id: WaitId) -> bool {
        self.in_flight.contains(&id) || self.tasks.iter().any(|e| e.id == id)
    }

    /// Fire `callback` once `frames` ticks have passed. Zero behaves like one:
    /// the callback runs on the next tick.
    pub fn after_frames(
        &mut self,
        frames: u64,
        callback: impl FnOnce(&mut Scheduler<C>, &mut C) + 'static,
    ) -> WaitId {
        self.wait(Condition::Frames { remaining: frames }, Box::new(callback))
    }

    pub fn next_frame(
        &mut self,
        callback: impl FnOnce(&mut Scheduler<C>, &mut C) + 'static,
    ) -> WaitId {
        self.after_frames(1, callback)
    }

    /// Fire `callback` on the first tick where the deltas seen since
    /// registration add up to at least `duration`.
    pub fn after_duration(
        &mut self,
        duration: Duration,
        callback: impl FnOnce(&mut Scheduler<C>, &mut C) + 'static,
    ) -> WaitId {
        self.wait(
            Condition::Elapsed {
                target: duration,
                accumulated: Duration::ZERO,
            },
            Box::new(callback),
        )
    }

    /// Fire `callback` on the first tick where `predicate` holds.
    pub fn wait_until(
        &mut self,
        predicate: impl FnMut(&C) -> bool + 'static,
        callback: impl FnOnce(&mut Scheduler<C>, &mut C) + 'static,
    ) -> WaitId {
        self.wait(Condition::Until(Box::new(predicate)), Box::new(callback))
    }

    /// Fire `callback` on the first tick where `predicate` no longer holds.
    pub fn wait_while(
        &mut self,
        predicate: impl FnMut(&C) -> bool + 'static,
        callback: impl FnOnce(&mut Scheduler<C>, &mut C) + 'static,
    ) -> WaitId {
        self.wait(Condition::While(Box::new(predicate)), Box::new(callback))
    }

    /// Start a staged scene load. The load begins immediately with activation
    /// withheld; the stages run on subsequent ticks.
    pub fn load_scene(
        &mut self,
        loader: &mut (impl SceneLoader + ?Sized),
        request: SceneLoadRequest<C>,
    ) -> WaitId {
        let mut operation = loader.begin_load(&request.target, request.mode);
        operation.set_allow_activation(false);
        tracing::info!(scene = %request.target, mode = ?request.mode, "scene load requested");
        self.register(Box::new(SceneTransition::new(request, operation)))
    }

    /// Start unloading `target`; `callback` fires on the tick the unload is done.
    pub fn unload_scene(
        &mut self,
        loader: &mut (impl SceneLoader + ?Sized),
        target: impl Into<SceneId>,
        callback: impl FnOnce(&mut Scheduler<C>, &mut C) + 'static,
    ) -> WaitId {
        let target = target.into();
        let operation: Box<dyn LoadOperation> = loader.begin_unload(&target);
        tracing::info!(scene = %target, "scene unload requested");
        self.register(Box::new(SceneUnload::new(target, operation, Box::new(callback))))
    }

    /// Drop a pending wait without firing it. Returns `false` if it already
    /// fired, is firing right now, or was never registered.
    pub fn cancel(&mut self, id: WaitId) -> bool {
        if self.polling == Some(id) {
            tracing::debug!(?id, "cancel ignored: wait is being polled");
            return false;
        }
        if let Some(pos) = self.tasks.iter().position(|e| e.id == id) {
            self.tasks.remove(pos);
            tracing::debug!(?id, "wait cancelled");
            return true;
        }
        if self.in_flight.remove(&id) {
            self.cancelled.insert(id);
            tracing::debug!(?id, "wait cancelled mid-tick");
            return true;
        }
        false
    }

    /// Advance the clock by one tick of length `delta` and poll every task once.
    pub fn tick(&mut self, ctx: &mut C, delta: Duration) {
        self.frame.tick += 1;
        self.frame.delta = delta;
        self.frame.elapsed = self.frame.elapsed.saturating_add(delta);
        let frame = self.frame;

        let entries = std::mem::take(&mut self.tasks);
        self.in_flight = entries.iter().map(|e| e.id).collect();
        let mut retained = Vec::with_capacity(entries.len());
        let mut fired = 0usize;

        for mut entry in entries {
            if self.cancelled.contains(&entry.id) {
                continue;
            }
            self.polling = Some(entry.id);
            let poll = entry.task.poll(&frame, self, ctx);
            self.polling = None;
            match poll {
                Poll::Ready => {
                    self.in_flight.remove(&entry.id);
                    fired += 1;
                    tracing::trace!(
                        id = ?entry.id,
                        kind = entry.task.label(),
                        tick = frame.tick,
                        "wait fired"
                    );
                }
                Poll::Pending => retained.push(entry),
            }
        }

        retained.retain(|e| !self.cancelled.contains(&e.id));
        self.cancelled.clear();
        self.in_flight.clear();

        // Tasks registered during this tick go after the survivors.
        retained.append(&mut self.tasks);
        self.tasks = retained;

        if fired > 0 {
            tracing::debug!(
                tick = frame.tick,
                fired,
                pending = self.tasks.len(),
                "tick resolved waits"
            );
        }
    }

    fn wait(&mut self, condition: Condition<C>, callback: Callback<C>) -> WaitId {
        self.register(Box::new(PendingWait::new(condition, callback)))
    }

    fn register(&mut self, task: Box<dyn Task<C>>) -> WaitId {
        self.next_id += 1;
        let id = WaitId(self.next_id);
        tracing::trace!(?id, kind = task.label(), "wait registered");
        self.tasks.push(Entry { id, task });
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    const DT: Duration = Duration::from_millis(100);

    fn ticks(s: &mut Scheduler, n: usize) {
        for _ in 0..n {
            s.tick(&mut (), DT);
        }
    }

    /// Records the tick on which the callback fired.
    fn record(at: Rc<Cell<Option<u64>>>) -> impl FnOnce(&mut Scheduler, &mut ()) + 'static {
        move |s: &mut Scheduler, _: &mut ()| at.set(Some(s.frame().tick))
    }

    #[test]
    fn registration_does_not_fire() {
        let mut s: Scheduler = Scheduler::new();
        let at = Rc::new(Cell::new(None));
        s.after_frames(0, record(at.clone()));
        s.wait_until(|_| true, record(at.clone()));
        assert_eq!(at.get(), None);
        assert_eq!(s.pending(), 2);
    }

    #[test]
    fn zero_frames_fires_next_tick() {
        let mut s: Scheduler = Scheduler::new();
        let at = Rc::new(Cell::new(None));
        s.after_frames(0, record(at.clone()));
        ticks(&mut s, 1);
        assert_eq!(at.get(), Some(1));
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn frames_fire_on_exact_tick() {
        for k in 1..6u64 {
            let mut s: Scheduler = Scheduler::new();
            ticks(&mut s, 3);
            let at = Rc::new(Cell::new(None));
            s.after_frames(k, record(at.clone()));
            for i in 1..k {
                ticks(&mut s, 1);
                assert_eq!(at.get(), None, "k={k} fired early at {i}");
            }
            ticks(&mut s, 1);
            assert_eq!(at.get(), Some(3 + k));
        }
    }

    #[test]
    fn next_frame_is_one_frame() {
        let mut s: Scheduler = Scheduler::new();
        let at = Rc::new(Cell::new(None));
        s.next_frame(record(at.clone()));
        ticks(&mut s, 1);
        assert_eq!(at.get(), Some(1));
    }

    #[test]
    fn duration_accumulates_deltas() {
        let mut s: Scheduler = Scheduler::new();
        let at = Rc::new(Cell::new(None));
        s.after_duration(Duration::from_millis(250), record(at.clone()));
        ticks(&mut s, 2);
        assert_eq!(at.get(), None);
        ticks(&mut s, 1);
        assert_eq!(at.get(), Some(3));
    }

    #[test]
    fn duration_uses_variable_deltas() {
        let mut s: Scheduler = Scheduler::new();
        let at = Rc::new(Cell::new(None));
        s.after_duration(Duration::from_secs(1), record(at.clone()));
        s.tick(&mut (), Duration::from_millis(900));
        assert_eq!(at.get(), None);
        s.tick(&mut (), Duration::from_millis(100));
        assert_eq!(at.get(), Some(2));
        assert_eq!(s.frame().elapsed, Duration::from_secs(1));
    }

    #[test]
    fn until_and_while_fire_on_disjoint_ticks() {
        let flag = Rc::new(Cell::new(false));
        let mut s: Scheduler = Scheduler::new();
        let until_at = Rc::new(Cell::new(None));
        let while_at = Rc::new(Cell::new(None));

        let f = flag.clone();
        s.wait_until(move |_| f.get(), record(until_at.clone()));
        let f = flag.clone();
        s.wait_while(move |_| f.get(), record(while_at.clone()));

        // flag is false: the while-wait fires, the until-wait keeps waiting.
        ticks(&mut s, 1);
        assert_eq!(while_at.get(), Some(1));
        assert_eq!(until_at.get(), None);

        ticks(&mut s, 2);
        flag.set(true);
        ticks(&mut s, 1);
        assert_eq!(until_at.get(), Some(4));
        assert_ne!(until_at.get(), while_at.get());
    }

    #[test]
    fn predicate_evaluated_once_per_tick() {
        let calls = Rc::new(Cell::new(0));
        let mut s: Scheduler = Scheduler::new();
        let c = calls.clone();
        s.wait_until(
            move |_| {
                c.set(c.get() + 1);
                c.get() == 3
            },
            |_, _| {},
        );
        assert_eq!(calls.get(), 0);
        ticks(&mut s, 5);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn same_tick_waits_fire_in_registration_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut s: Scheduler = Scheduler::new();
        for label in ["a", "b", "c"] {
            let o = order.clone();
            s.after_frames(1, move |_, _| o.borrow_mut().push(label));
        }
        let o = order.clone();
        s.wait_until(|_| true, move |_, _| o.borrow_mut().push("until"));
        ticks(&mut s, 1);
        assert_eq!(*order.borrow(), vec!["a", "b", "c", "until"]);
    }

    #[test]
    fn callbacks_fire_exactly_once() {
        let count = Rc::new(Cell::new(0));
        let mut s: Scheduler = Scheduler::new();
        let c = count.clone();
        s.wait_until(|_| true, move |_, _| c.set(c.get() + 1));
        ticks(&mut s, 10);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn waits_registered_in_callback_start_next_tick() {
        let at = Rc::new(Cell::new(None));
        let mut s: Scheduler = Scheduler::new();
        let inner = at.clone();
        s.after_frames(1, move |s, _| {
            s.after_frames(0, move |s, _| inner.set(Some(s.frame().tick)));
        });
        ticks(&mut s, 1);
        assert_eq!(at.get(), None);
        assert_eq!(s.pending(), 1);
        ticks(&mut s, 1);
        assert_eq!(at.get(), Some(2));
    }

    #[test]
    fn cancel_prevents_firing() {
        let at = Rc::new(Cell::new(None));
        let mut s: Scheduler = Scheduler::new();
        let id = s.after_frames(2, record(at.clone()));
        assert!(s.is_pending(id));
        assert!(s.cancel(id));
        assert!(!s.is_pending(id));
        assert!(!s.cancel(id));
        ticks(&mut s, 5);
        assert_eq!(at.get(), None);
    }

    #[test]
    fn cancel_from_callback_within_same_tick() {
        let at = Rc::new(Cell::new(None));
        let mut s: Scheduler = Scheduler::new();
        let victim = Rc::new(Cell::new(None));

        let v = victim.clone();
        s.after_frames(1, move |s, _| {
            if let Some(id) = v.get() {
                assert!(s.cancel(id));
            }
        });
        let id = s.after_frames(1, record(at.clone()));
        victim.set(Some(id));

        ticks(&mut s, 3);
        assert_eq!(at.get(), None);
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn callback_cannot_cancel_its_own_wait() {
        let outcome = Rc::new(Cell::new(None));
        let mut s: Scheduler = Scheduler::new();
        let own = Rc::new(Cell::new(None));

        let (o, w) = (outcome.clone(), own.clone());
        let id = s.after_frames(1, move |s, _| {
            if let Some(id) = w.get() {
                o.set(Some(s.cancel(id)));
            }
        });
        own.set(Some(id));

        ticks(&mut s, 1);
        assert_eq!(outcome.get(), Some(false));
        assert!(!s.is_pending(id));
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn unsatisfied_predicate_waits_forever() {
        let mut s: Scheduler = Scheduler::new();
        s.wait_until(|_| false, |_, _| {});
        ticks(&mut s, 100);
        assert_eq!(s.pending(), 1);
    }

    #[derive(Default)]
    struct Hud {
        fading: bool,
        shown: u32,
    }

    #[test]
    fn predicates_and_callbacks_see_host_context() {
        let mut hud = Hud {
            fading: true,
            ..Hud::default()
        };
        let mut s: Scheduler<Hud> = Scheduler::new();
        s.wait_while(|hud: &Hud| hud.fading, |_, hud: &mut Hud| hud.shown += 1);

        s.tick(&mut hud, DT);
        assert_eq!(hud.shown, 0);
        hud.fading = false;
        s.tick(&mut hud, DT);
        assert_eq!(hud.shown, 1);
    }
}
