use ledgefall_engine::{ActionStates, ControlFrame, ControlSource, EdgeTracker, InputSnapshot};

use crate::app::config::{ControlKind, ScriptStep};

/// Reads one local keyboard slot from the per-tick snapshot.
#[derive(Debug, Clone, Copy)]
pub(crate) struct KeyboardSlot {
    slot: usize,
}

impl KeyboardSlot {
    pub(crate) fn new(slot: usize) -> Self {
        Self { slot }
    }
}

impl ControlSource for KeyboardSlot {
    fn sample(&mut self, input: &InputSnapshot) -> ActionStates {
        input.slot(self.slot)
    }
}

/// Training dummy.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct IdleControl;

impl ControlSource for IdleControl {
    fn sample(&mut self, _input: &InputSnapshot) -> ActionStates {
        ActionStates::default()
    }
}

/// Replays a fixed timeline of held actions, one step after another. A
/// finished, non-looping script holds nothing.
#[derive(Debug, Clone)]
pub(crate) struct ScriptedControl {
    steps: Vec<ScriptStep>,
    looping: bool,
    step_index: usize,
    frames_into_step: u32,
}

impl ScriptedControl {
    pub(crate) fn new(steps: Vec<ScriptStep>, looping: bool) -> Self {
        Self {
            steps,
            looping,
            step_index: 0,
            frames_into_step: 0,
        }
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.step_index >= self.steps.len()
    }
}

impl ControlSource for ScriptedControl {
    fn sample(&mut self, _input: &InputSnapshot) -> ActionStates {
        let Some(step) = self.steps.get(self.step_index) else {
            return ActionStates::default();
        };
        let held = ActionStates::from_actions(&step.actions);

        self.frames_into_step += 1;
        if self.frames_into_step >= step.frames {
            self.frames_into_step = 0;
            self.step_index += 1;
            if self.looping && self.is_finished() {
                self.step_index = 0;
            }
        }
        held
    }
}

/// A control source plus the edge state that turns its levels into presses.
pub(crate) struct PlayerControls {
    source: Box<dyn ControlSource>,
    edges: EdgeTracker,
}

impl PlayerControls {
    pub(crate) fn new(source: Box<dyn ControlSource>) -> Self {
        Self {
            source,
            edges: EdgeTracker::default(),
        }
    }

    pub(crate) fn from_kind(kind: &ControlKind) -> Self {
        let source: Box<dyn ControlSource> = match kind {
            ControlKind::Keyboard { slot } => Box::new(KeyboardSlot::new(*slot)),
            ControlKind::Idle => Box::new(IdleControl),
            ControlKind::Scripted { steps, looping } => {
                Box::new(ScriptedControl::new(steps.clone(), *looping))
            }
        };
        Self::new(source)
    }

    pub(crate) fn sample(&mut self, input: &InputSnapshot) -> ControlFrame {
        let held = self.source.sample(input);
        self.edges.advance(held)
    }
}
