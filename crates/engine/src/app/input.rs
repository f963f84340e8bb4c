use serde::{Deserialize, Serialize};

use super::scene::InputSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FighterAction {
    Left,
    Right,
    Up,
    Down,
    Shield,
}

const ACTION_COUNT: usize = 5;

pub const ALL_FIGHTER_ACTIONS: [FighterAction; ACTION_COUNT] = [
    FighterAction::Left,
    FighterAction::Right,
    FighterAction::Up,
    FighterAction::Down,
    FighterAction::Shield,
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub fn set(&mut self, action: FighterAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub fn is_down(&self, action: FighterAction) -> bool {
        self.down[action.index()]
    }

    pub fn with(mut self, action: FighterAction, is_down: bool) -> Self {
        self.set(action, is_down);
        self
    }

    pub fn from_actions(actions: &[FighterAction]) -> Self {
        let mut states = Self::default();
        for action in actions {
            states.set(*action, true);
        }
        states
    }
}

impl FighterAction {
    const fn index(self) -> usize {
        match self {
            FighterAction::Left => 0,
            FighterAction::Right => 1,
            FighterAction::Up => 2,
            FighterAction::Down => 3,
            FighterAction::Shield => 4,
        }
    }
}

/// Level and edge view of one fighter's controls for a single tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlFrame {
    held: ActionStates,
    pressed: ActionStates,
}

impl ControlFrame {
    pub fn new(held: ActionStates, pressed: ActionStates) -> Self {
        let mut pressed_and_held = ActionStates::default();
        for action in ALL_FIGHTER_ACTIONS {
            pressed_and_held.set(action, pressed.is_down(action) && held.is_down(action));
        }
        Self {
            held,
            pressed: pressed_and_held,
        }
    }

    pub fn held(&self, action: FighterAction) -> bool {
        self.held.is_down(action)
    }

    pub fn pressed(&self, action: FighterAction) -> bool {
        self.pressed.is_down(action)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeTracker {
    previous: ActionStates,
}

impl EdgeTracker {
    pub fn advance(&mut self, held: ActionStates) -> ControlFrame {
        let mut pressed = ActionStates::default();
        for action in ALL_FIGHTER_ACTIONS {
            pressed.set(action, held.is_down(action) && !self.previous.is_down(action));
        }
        self.previous = held;
        ControlFrame::new(held, pressed)
    }

    pub fn reset(&mut self) {
        self.previous = ActionStates::default();
    }
}

/// Anything that can drive a fighter: a keyboard slot, a scripted timeline or
/// an AI policy. Sources only report levels; edges come from `EdgeTracker`.
pub trait ControlSource {
    fn sample(&mut self, input: &InputSnapshot) -> ActionStates;
}
