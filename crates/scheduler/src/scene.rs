use std::fmt;
use std::time::Duration;

use crate::scheduler::{Callback, Frame, Poll, Predicate, Scheduler, Task};

/// Load progress at which a scene is staged and only waits for activation.
pub const READY_TO_ACTIVATE: f32 = 0.9;

/// Scene addressed by name or by build index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SceneId {
    Name(String),
    Index(u32),
}

impl From<&str> for SceneId {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for SceneId {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<u32> for SceneId {
    fn from(index: u32) -> Self {
        Self::Index(index)
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Index(index) => write!(f, "#{index}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadMode {
    /// Replace the loaded scenes.
    #[default]
    Single,
    /// Load next to the scenes already loaded.
    Additive,
}

/// Handle to an asynchronous load or unload owned by the host engine.
pub trait LoadOperation {
    /// Progress in `0.0..=1.0`. Loads stop at [`READY_TO_ACTIVATE`] until
    /// activation is allowed.
    fn progress(&self) -> f32;

    fn set_allow_activation(&mut self, allow: bool);

    fn is_done(&self) -> bool;
}

/// Host engine primitive that starts scene loads and unloads.
pub trait SceneLoader {
    fn begin_load(&mut self, target: &SceneId, mode: LoadMode) -> Box<dyn LoadOperation>;

    fn begin_unload(&mut self, target: &SceneId) -> Box<dyn LoadOperation>;
}

/// Parameters of a staged scene load.
///
/// ```ignore
/// let request = SceneLoadRequest::new("Game", LoadMode::Single)
///     .hold_while_before_start(|hud: &Hud| hud.fading_in)
///     .on_start(|_, hud| hud.show_logo())
///     .min_duration(Duration::from_secs(1))
///     .hold_while_before_complete(|hud: &Hud| hud.fading_out)
///     .on_complete(|_, hud| hud.hide_logo());
/// scheduler.load_scene(&mut loader, request);
/// ```
pub struct SceneLoadRequest<C> {
    pub(crate) target: SceneId,
    pub(crate) mode: LoadMode,
    hold_before_start: Option<Predicate<C>>,
    on_start: Option<Callback<C>>,
    min_duration: Duration,
    hold_before_complete: Option<Predicate<C>>,
    on_complete: Option<Callback<C>>,
}

impl<C> SceneLoadRequest<C> {
    pub fn new(target: impl Into<SceneId>, mode: LoadMode) -> Self {
        Self {
            target: target.into(),
            mode,
            hold_before_start: None,
            on_start: None,
            min_duration: Duration::ZERO,
            hold_before_complete: None,
            on_complete: None,
        }
    }

    /// Delay `on_start` (and the minimum-duration clock) while `gate` holds.
    pub fn hold_while_before_start(mut self, gate: impl FnMut(&C) -> bool + 'static) -> Self {
        self.hold_before_start = Some(Box::new(gate));
        self
    }

    pub fn on_start(mut self, callback: impl FnOnce(&mut Scheduler<C>, &mut C) + 'static) -> Self {
        self.on_start = Some(Box::new(callback));
        self
    }

    /// Shortest time between `on_start` and `on_complete`.
    pub fn min_duration(mut self, duration: Duration) -> Self {
        self.min_duration = duration;
        self
    }

    /// Delay `on_complete` while `gate` holds.
    pub fn hold_while_before_complete(mut self, gate: impl FnMut(&C) -> bool + 'static) -> Self {
        self.hold_before_complete = Some(Box::new(gate));
        self
    }

    pub fn on_complete(
        mut self,
        callback: impl FnOnce(&mut Scheduler<C>, &mut C) + 'static,
    ) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    AwaitStart,
    Loading,
    Activating,
    Holding { until: Duration },
    AwaitComplete,
}

/// Staged scene load driven one tick at a time.
///
/// Several stages may complete in one tick when their conditions already
/// hold, but no stage condition is checked twice in the same tick.
pub(crate) struct SceneTransition<C> {
    target: SceneId,
    operation: Box<dyn LoadOperation>,
    stage: Stage,
    started_at: Duration,
    min_duration: Duration,
    hold_before_start: Option<Predicate<C>>,
    on_start: Option<Callback<C>>,
    hold_before_complete: Option<Predicate<C>>,
    on_complete: Option<Callback<C>>,
}

impl<C> SceneTransition<C> {
    pub(crate) fn new(request: SceneLoadRequest<C>, operation: Box<dyn LoadOperation>) -> Self {
        Self {
            target: request.target,
            operation,
            stage: Stage::AwaitStart,
            started_at: Duration::ZERO,
            min_duration: request.min_duration,
            hold_before_start: request.hold_before_start,
            on_start: request.on_start,
            hold_before_complete: request.hold_before_complete,
            on_complete: request.on_complete,
        }
    }
}

impl<C> Task<C> for SceneTransition<C> {
    fn poll(&mut self, frame: &Frame, scheduler: &mut Scheduler<C>, ctx: &mut C) -> Poll {
        loop {
            match self.stage {
                Stage::AwaitStart => {
                    if self.hold_before_start.as_mut().is_some_and(|gate| gate(&*ctx)) {
                        return Poll::Pending;
                    }
                    if let Some(on_start) = self.on_start.take() {
                        on_start(scheduler, ctx);
                    }
                    self.started_at = frame.elapsed;
                    tracing::debug!(
                        scene = %self.target,
                        tick = frame.tick,
                        "scene transition started"
                    );
                    self.stage = Stage::Loading;
                }
                Stage::Loading => {
                    if self.operation.progress() < READY_TO_ACTIVATE {
                        return Poll::Pending;
                    }
                    self.operation.set_allow_activation(true);
                    self.stage = Stage::Activating;
                }
                Stage::Activating => {
                    if !self.operation.is_done() {
                        return Poll::Pending;
                    }
                    let loaded_in = frame.elapsed.saturating_sub(self.started_at);
                    tracing::debug!(scene = %self.target, ?loaded_in, "scene loaded");
                    self.stage = if loaded_in < self.min_duration {
                        Stage::Holding {
                            until: self.started_at.saturating_add(self.min_duration),
                        }
                    } else {
                        Stage::AwaitComplete
                    };
                }
                Stage::Holding { until } => {
                    if frame.elapsed < until {
                        return Poll::Pending;
                    }
                    self.stage = Stage::AwaitComplete;
                }
                Stage::AwaitComplete => {
                    if self.hold_before_complete.as_mut().is_some_and(|gate| gate(&*ctx)) {
                        return Poll::Pending;
                    }
                    if let Some(on_complete) = self.on_complete.take() {
                        on_complete(scheduler, ctx);
                    }
                    tracing::info!(
                        scene = %self.target,
                        tick = frame.tick,
                        "scene transition complete"
                    );
                    return Poll::Ready;
                }
            }
        }
    }

    fn label(&self) -> &'static str {
        "scene-load"
    }
}

pub(crate) struct SceneUnload<C> {
    target: SceneId,
    operation: Box<dyn LoadOperation>,
    callback: Option<Callback<C>>,
}

impl<C> SceneUnload<C> {
    pub(crate) fn new(
        target: SceneId,
        operation: Box<dyn LoadOperation>,
        callback: Callback<C>,
    ) -> Self {
        Self {
            target,
            operation,
            callback: Some(callback),
        }
    }
}

impl<C> Task<C> for SceneUnload<C> {
    fn poll(&mut self, frame: &Frame, scheduler: &mut Scheduler<C>, ctx: &mut C) -> Poll {
        if !self.operation.is_done() {
            return Poll::Pending;
        }
        tracing::debug!(scene = %self.target, tick = frame.tick, "scene unloaded");
        if let Some(callback) = self.callback.take() {
            callback(scheduler, ctx);
        }
        Poll::Ready
    }

    fn label(&self) -> &'static str {
        "scene-unload"
    }
}
