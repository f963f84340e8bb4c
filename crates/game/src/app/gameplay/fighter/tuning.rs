use serde::{Deserialize, Serialize};

/// Movement and timing constants for one fighter. Values are per tick and in
/// world units; defaults reproduce the stick-figure feel at 120 ticks/s.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct FighterTuning {
    pub(crate) gravity: f64,
    pub(crate) fast_fall_multiplier: f64,
    pub(crate) ground_accel: f64,
    pub(crate) air_accel: f64,
    pub(crate) jump_power: f64,
    pub(crate) double_jump_power: f64,
    pub(crate) friction_x_grounded: f64,
    pub(crate) friction_x_air: f64,
    pub(crate) friction_y: f64,
    pub(crate) run_threshold: f64,
    pub(crate) jump_hold_frames: u32,
    pub(crate) max_shield: u32,
    pub(crate) shield_drain: u32,
    pub(crate) shield_regen: u32,
    pub(crate) shield_break_stun: u32,
    pub(crate) stun_effect_interval: u32,
    pub(crate) roll_speed: f64,
    pub(crate) running_cycle: u32,
    pub(crate) roll_frames: u32,
    pub(crate) spot_dodge_frames: u32,
    pub(crate) air_dodge_frames: u32,
    pub(crate) hang_immunity_frames: u32,
    pub(crate) frames_between_hangs: u32,
    pub(crate) sub_step: f64,
    pub(crate) ground_probe: f64,
    pub(crate) ledge_drop_push: f64,
    pub(crate) ledge_jump_inward_speed: f64,
    pub(crate) ledge_jump_clearance: f64,
    pub(crate) climb_inset: f64,
    pub(crate) climb_lift: f64,
    pub(crate) max_shield_draw_scale: f64,
}

impl Default for FighterTuning {
    fn default() -> Self {
        Self {
            gravity: 0.2,
            fast_fall_multiplier: 2.0,
            ground_accel: 1.0,
            air_accel: 0.2,
            jump_power: 10.0,
            double_jump_power: 15.0,
            friction_x_grounded: 0.8,
            friction_x_air: 0.95,
            friction_y: 0.98,
            run_threshold: 0.1,
            jump_hold_frames: 30,
            max_shield: 1440,
            shield_drain: 3,
            shield_regen: 1,
            shield_break_stun: 240,
            stun_effect_interval: 10,
            roll_speed: 6.0,
            running_cycle: 40,
            roll_frames: 50,
            spot_dodge_frames: 50,
            air_dodge_frames: 50,
            hang_immunity_frames: 50,
            frames_between_hangs: 60,
            sub_step: 0.05,
            ground_probe: 0.1,
            ledge_drop_push: 3.5,
            ledge_jump_inward_speed: 6.0,
            ledge_jump_clearance: 30.0,
            climb_inset: 50.0,
            climb_lift: 0.1,
            max_shield_draw_scale: 0.8,
        }
    }
}

/// Largest per-iteration move during sub-stepped integration.
const MAX_SUB_STEP: f64 = 0.05;
/// Smallest sub-step that keeps the per-tick iteration count bounded.
const MIN_SUB_STEP: f64 = 0.001;

impl FighterTuning {
    /// Returns the first field that would make the simulation misbehave.
    pub(crate) fn first_invalid_field(&self) -> Option<&'static str> {
        if !(MIN_SUB_STEP..=MAX_SUB_STEP).contains(&self.sub_step) {
            return Some("sub_step");
        }
        let positive_reals = [
            ("gravity", self.gravity),
            ("fast_fall_multiplier", self.fast_fall_multiplier),
            ("ground_accel", self.ground_accel),
            ("air_accel", self.air_accel),
            ("jump_power", self.jump_power),
            ("double_jump_power", self.double_jump_power),
            ("run_threshold", self.run_threshold),
            ("roll_speed", self.roll_speed),
            ("ground_probe", self.ground_probe),
            ("ledge_drop_push", self.ledge_drop_push),
            ("ledge_jump_inward_speed", self.ledge_jump_inward_speed),
            ("ledge_jump_clearance", self.ledge_jump_clearance),
            ("climb_inset", self.climb_inset),
            ("climb_lift", self.climb_lift),
            ("max_shield_draw_scale", self.max_shield_draw_scale),
        ];
        for (name, value) in positive_reals {
            if !value.is_finite() || value <= 0.0 {
                return Some(name);
            }
        }
        let frictions = [
            ("friction_x_grounded", self.friction_x_grounded),
            ("friction_x_air", self.friction_x_air),
            ("friction_y", self.friction_y),
        ];
        for (name, value) in frictions {
            // NaN fails the range check too.
            if !(value > 0.0 && value <= 1.0) {
                return Some(name);
            }
        }
        let frame_windows = [
            ("jump_hold_frames", self.jump_hold_frames),
            ("max_shield", self.max_shield),
            ("shield_drain", self.shield_drain),
            ("shield_regen", self.shield_regen),
            ("shield_break_stun", self.shield_break_stun),
            ("stun_effect_interval", self.stun_effect_interval),
            ("running_cycle", self.running_cycle),
            ("roll_frames", self.roll_frames),
            ("spot_dodge_frames", self.spot_dodge_frames),
            ("air_dodge_frames", self.air_dodge_frames),
            ("hang_immunity_frames", self.hang_immunity_frames),
            ("frames_between_hangs", self.frames_between_hangs),
        ];
        frame_windows
            .into_iter()
            .find(|(_, value)| *value == 0)
            .map(|(name, _)| name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(FighterTuning::default().first_invalid_field(), None);
    }

    #[test]
    fn sub_step_must_stay_within_bounds() {
        for value in [0.0, -0.05, 1e-300, 0.0009, 0.051, 5.0, f64::NAN, f64::INFINITY] {
            let tuning = FighterTuning {
                sub_step: value,
                ..FighterTuning::default()
            };
            assert_eq!(tuning.first_invalid_field(), Some("sub_step"), "sub_step {value}");
        }
        let tuning = FighterTuning {
            sub_step: MIN_SUB_STEP,
            ..FighterTuning::default()
        };
        assert_eq!(tuning.first_invalid_field(), None);
    }

    #[test]
    fn negative_or_zero_magnitudes_are_rejected() {
        let gravity = FighterTuning {
            gravity: -1.0,
            ..FighterTuning::default()
        };
        assert_eq!(gravity.first_invalid_field(), Some("gravity"));

        let roll = FighterTuning {
            roll_speed: -6.0,
            ..FighterTuning::default()
        };
        assert_eq!(roll.first_invalid_field(), Some("roll_speed"));

        let threshold = FighterTuning {
            run_threshold: 0.0,
            ..FighterTuning::default()
        };
        assert_eq!(threshold.first_invalid_field(), Some("run_threshold"));
    }

    #[test]
    fn frictions_must_lie_in_unit_interval() {
        for value in [-0.5, 0.0, 1.01, f64::NAN] {
            let tuning = FighterTuning {
                friction_x_air: value,
                ..FighterTuning::default()
            };
            assert_eq!(tuning.first_invalid_field(), Some("friction_x_air"), "friction {value}");
        }
        let frictionless = FighterTuning {
            friction_y: 1.0,
            ..FighterTuning::default()
        };
        assert_eq!(frictionless.first_invalid_field(), None);
    }

    #[test]
    fn empty_frame_windows_are_rejected() {
        let tuning = FighterTuning {
            roll_frames: 0,
            ..FighterTuning::default()
        };
        assert_eq!(tuning.first_invalid_field(), Some("roll_frames"));
    }
}
