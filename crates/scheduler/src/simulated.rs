use std::cell::RefCell;
use std::rc::Rc;

use crate::scene::{LoadMode, LoadOperation, READY_TO_ACTIVATE, SceneId, SceneLoader};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpKind {
    Load(LoadMode),
    Unload,
}

#[derive(Debug)]
struct OpState {
    scene: SceneId,
    kind: OpKind,
    advanced: u32,
    allow_activation: bool,
    done: bool,
}

/// In-process [`SceneLoader`] that makes progress only when told to.
///
/// A load reaches [`READY_TO_ACTIVATE`] after `load_ticks` calls to
/// [`advance`](SimulatedLoader::advance) and finishes on the first advance
/// after activation is allowed. An unload finishes after `load_ticks`
/// advances (at least one).
pub struct SimulatedLoader {
    load_ticks: u32,
    operations: Vec<Rc<RefCell<OpState>>>,
    loaded: Vec<SceneId>,
}

impl SimulatedLoader {
    pub fn new(load_ticks: u32) -> Self {
        Self {
            load_ticks,
            operations: Vec::new(),
            loaded: Vec::new(),
        }
    }

    /// Scenes whose load completed and that were not unloaded since, in load order.
    pub fn loaded(&self) -> &[SceneId] {
        &self.loaded
    }

    /// Operations started and not finished yet.
    pub fn in_progress(&self) -> usize {
        self.operations.len()
    }

    /// Advance every running operation by one step.
    pub fn advance(&mut self) {
        let load_ticks = self.load_ticks;
        let mut finished = Vec::new();

        self.operations.retain(|op| {
            let mut op = op.borrow_mut();
            match op.kind {
                OpKind::Load(_) => {
                    if op.advanced < load_ticks {
                        op.advanced += 1;
                    } else if op.allow_activation {
                        op.done = true;
                    }
                }
                OpKind::Unload => {
                    op.advanced += 1;
                    op.done = op.advanced >= load_ticks.max(1);
                }
            }
            if op.done {
                finished.push((op.scene.clone(), op.kind));
            }
            !op.done
        });

        for (scene, kind) in finished {
            match kind {
                OpKind::Load(LoadMode::Single) => {
                    tracing::debug!(%scene, "simulated load done, replacing scenes");
                    self.loaded.clear();
                    self.loaded.push(scene);
                }
                OpKind::Load(LoadMode::Additive) => {
                    tracing::debug!(%scene, "simulated load done");
                    self.loaded.push(scene);
                }
                OpKind::Unload => {
                    tracing::debug!(%scene, "simulated unload done");
                    self.loaded.retain(|s| *s != scene);
                }
            }
        }
    }

    fn start(&mut self, scene: &SceneId, kind: OpKind) -> Box<dyn LoadOperation> {
        let state = Rc::new(RefCell::new(OpState {
            scene: scene.clone(),
            kind,
            advanced: 0,
            allow_activation: true,
            done: false,
        }));
        self.operations.push(state.clone());
        Box::new(SimulatedOperation {
            state,
            load_ticks: self.load_ticks,
        })
    }
}

impl SceneLoader for SimulatedLoader {
    fn begin_load(&mut self, target: &SceneId, mode: LoadMode) -> Box<dyn LoadOperation> {
        self.start(target, OpKind::Load(mode))
    }

    fn begin_unload(&mut self, target: &SceneId) -> Box<dyn LoadOperation> {
        self.start(target, OpKind::Unload)
    }
}

struct SimulatedOperation {
    state: Rc<RefCell<OpState>>,
    load_ticks: u32,
}

impl LoadOperation for SimulatedOperation {
    fn progress(&self) -> f32 {
        let op = self.state.borrow();
        if op.done {
            return 1.0;
        }
        let ceiling = match op.kind {
            OpKind::Load(_) => READY_TO_ACTIVATE,
            OpKind::Unload => 1.0,
        };
        if self.load_ticks == 0 {
            return ceiling;
        }
        ceiling * (op.advanced.min(self.load_ticks) as f32 / self.load_ticks as f32)
    }

    fn set_allow_activation(&mut self, allow: bool) {
        self.state.borrow_mut().allow_activation = allow;
    }

    fn is_done(&self) -> bool {
        self.state.borrow().done
    }
}
