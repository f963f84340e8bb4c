use ledgefall_engine::{SpriteDraw, Vec2};

use super::{Fighter, MachineState};

const BODY_FALLBACK_HALF_EXTENTS: Vec2 = Vec2::new(40.0, 70.0);
const SHIELD_FALLBACK_HALF_EXTENTS: Vec2 = Vec2::new(75.0, 75.0);
const DODGE_ALPHA: f64 = 0.2;
const SHIELD_ALPHA: f64 = 0.6;

/// Which body sprite a fighter shows this frame and how opaque it is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct FighterVisual {
    pub(crate) key: &'static str,
    pub(crate) alpha: f64,
    pub(crate) shield_bubble: bool,
}

impl FighterVisual {
    pub(crate) fn select(fighter: &Fighter) -> Self {
        let frame = fighter.animation_frame();
        let tuning = fighter.tuning();
        let air_key = if fighter.velocity().y >= 0.0 {
            "fighter/air_up"
        } else {
            "fighter/air_down"
        };
        let (key, alpha) = match fighter.state() {
            MachineState::Airborne => (air_key, 1.0),
            MachineState::Idle | MachineState::Shielding | MachineState::Stunned => {
                ("fighter/idle", 1.0)
            }
            MachineState::Running => {
                if frame >= tuning.running_cycle / 2 {
                    ("fighter/run_1", 1.0)
                } else {
                    ("fighter/run_2", 1.0)
                }
            }
            MachineState::Rolling => {
                if frame < tuning.roll_frames / 2 {
                    ("fighter/roll_1", 1.0)
                } else {
                    ("fighter/roll_2", 1.0)
                }
            }
            MachineState::SpotDodging => ("fighter/idle", DODGE_ALPHA),
            MachineState::AirDodging => (air_key, DODGE_ALPHA),
            MachineState::Hanging { .. } => {
                let alpha = if frame >= tuning.hang_immunity_frames {
                    1.0
                } else {
                    DODGE_ALPHA
                };
                ("fighter/hang", alpha)
            }
        };
        Self {
            key,
            alpha,
            shield_bubble: fighter.state() == MachineState::Shielding,
        }
    }

    pub(crate) fn body_sprite(&self, fighter: &Fighter) -> SpriteDraw {
        SpriteDraw::new(self.key, fighter.position(), BODY_FALLBACK_HALF_EXTENTS)
            .facing(fighter.facing_right())
            .with_alpha(self.alpha)
    }

    /// Bubble shrinks with the remaining shield.
    pub(crate) fn shield_sprite(&self, fighter: &Fighter) -> Option<SpriteDraw> {
        if !self.shield_bubble {
            return None;
        }
        let tuning = fighter.tuning();
        let fraction = fighter.shield() as f64 / tuning.max_shield.max(1) as f64;
        Some(
            SpriteDraw::new(
                "fighter/shield",
                fighter.position(),
                SHIELD_FALLBACK_HALF_EXTENTS,
            )
            .facing(fighter.facing_right())
            .with_alpha(SHIELD_ALPHA)
            .with_scale(tuning.max_shield_draw_scale * fraction),
        )
    }
}
