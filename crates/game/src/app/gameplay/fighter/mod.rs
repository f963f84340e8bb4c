mod state;
mod tuning;
mod visuals;


use ledgefall_engine::{
    Aabb, ControlFrame, DebugColor, DrawLayer, FighterAction, LedgeId, LedgeRegistry,
    RenderTarget, StageGeometry, Vec2, EPSILON,
};
use rand::rngs::StdRng;
use rand::Rng;
use tracing::debug;

use super::effects::{EffectKind, EffectQueue};

pub(crate) use state::MachineState;
pub(crate) use tuning::FighterTuning;
pub(crate) use visuals::FighterVisual;

pub(crate) const FIGHTER_RENDER_ORDER: i32 = 0;

const COLLISION_HALF_WIDTH: f64 = 40.0;
const COLLISION_HALF_HEIGHT: f64 = 70.0;
const GRAB_NEAR_X: f64 = 20.0;
const GRAB_FAR_X: f64 = 105.0;
const GRAB_LOW_Y: f64 = 30.0;
const GRAB_HIGH_Y: f64 = 110.0;
const RUN_TURN_DROP: f64 = 45.0;
const RUN_TURN_TRAIL: f64 = 10.0;
const STUN_SPREAD_X: f64 = 40.0;
const STUN_SPREAD_Y: f64 = 50.0;
const STUN_LIFT_Y: f64 = 15.0;

/// Everything a fighter touches outside itself during one tick. Geometry is
/// read-only; ledge occupancy is shared and written in roster order.
pub(crate) struct FighterContext<'a> {
    pub(crate) geometry: &'a StageGeometry,
    pub(crate) ledges: &'a mut LedgeRegistry,
    pub(crate) effects: &'a mut EffectQueue,
    pub(crate) rng: &'a mut StdRng,
}

#[derive(Debug, Clone)]
pub(crate) struct Fighter {
    tag: usize,
    team: u32,
    tuning: FighterTuning,
    collision_box: Aabb,
    grab_box_left: Aabb,
    grab_box_right: Aabb,
    position: Vec2,
    velocity: Vec2,
    grounded: bool,
    facing_right: bool,
    has_double_jump: bool,
    state: MachineState,
    animation_frame: u32,
    jump_frames_left: u32,
    shield: u32,
    stun_frames: u32,
    hang_cooldown: u32,
    alive: bool,
}

impl Fighter {
    pub(crate) fn new(tag: usize, team: u32, spawn: Vec2, tuning: FighterTuning) -> Self {
        Self {
            tag,
            team,
            tuning,
            collision_box: Aabb::from_corners(
                Vec2::new(-COLLISION_HALF_WIDTH, -COLLISION_HALF_HEIGHT),
                Vec2::new(COLLISION_HALF_WIDTH, COLLISION_HALF_HEIGHT),
            ),
            grab_box_left: Aabb::from_corners(
                Vec2::new(-GRAB_FAR_X, GRAB_LOW_Y),
                Vec2::new(-GRAB_NEAR_X, GRAB_HIGH_Y),
            ),
            grab_box_right: Aabb::from_corners(
                Vec2::new(GRAB_NEAR_X, GRAB_LOW_Y),
                Vec2::new(GRAB_FAR_X, GRAB_HIGH_Y),
            ),
            position: spawn,
            velocity: Vec2::ZERO,
            grounded: false,
            facing_right: true,
            has_double_jump: false,
            state: MachineState::Airborne,
            animation_frame: 0,
            jump_frames_left: 0,
            shield: tuning.max_shield,
            stun_frames: 0,
            hang_cooldown: 0,
            alive: true,
        }
    }

    pub(crate) fn tag(&self) -> usize {
        self.tag
    }

    pub(crate) fn team(&self) -> u32 {
        self.team
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.alive
    }

    pub(crate) fn tuning(&self) -> &FighterTuning {
        &self.tuning
    }

    pub(crate) fn position(&self) -> Vec2 {
        self.position
    }

    pub(crate) fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub(crate) fn state(&self) -> MachineState {
        self.state
    }

    pub(crate) fn facing_right(&self) -> bool {
        self.facing_right
    }

    pub(crate) fn shield(&self) -> u32 {
        self.shield
    }

    pub(crate) fn animation_frame(&self) -> u32 {
        self.animation_frame
    }

    pub(crate) fn hanging_on(&self) -> Option<LedgeId> {
        self.state.hanging_on()
    }

    pub(crate) fn collision_box_world(&self) -> Aabb {
        self.collision_box.offset_by(self.position)
    }

    pub(crate) fn grab_box_world(&self, facing_right: bool) -> Aabb {
        self.grab_box(facing_right).offset_by(self.position)
    }

    #[cfg(test)]
    pub(crate) fn place(&mut self, position: Vec2, velocity: Vec2) {
        self.position = position;
        self.velocity = velocity;
    }

    /// Removes the fighter from play. A held ledge is released so it never
    /// stays occupied by a fighter that no longer updates.
    pub(crate) fn knock_out(&mut self, ledges: &mut LedgeRegistry) {
        if !self.alive {
            return;
        }
        if let Some(ledge) = self.state.hanging_on() {
            self.release_ledge(ledges, ledge);
            self.set_state(MachineState::Airborne);
        }
        self.alive = false;
        debug!(fighter = self.tag, team = self.team, "fighter_knocked_out");
    }

    /// Advances one tick: gravity, friction, input and state, sub-stepped
    /// movement, then grounded re-detection.
    pub(crate) fn update(&mut self, controls: &ControlFrame, ctx: &mut FighterContext<'_>) {
        if !self.alive {
            return;
        }
        self.apply_gravity(controls);
        self.apply_friction();
        self.apply_input_and_state(controls, ctx);
        self.move_with_collision(controls, ctx.geometry);
        self.update_grounded(controls, ctx.geometry);
    }

    fn apply_gravity(&mut self, controls: &ControlFrame) {
        if self.grounded {
            return;
        }
        let mut gravity = self.tuning.gravity;
        if controls.held(FighterAction::Down) {
            gravity *= self.tuning.fast_fall_multiplier;
        }
        self.velocity = self.velocity + Vec2::DOWN * gravity;
    }

    fn apply_friction(&mut self) {
        let friction_x = if self.grounded {
            self.tuning.friction_x_grounded
        } else {
            self.tuning.friction_x_air
        };
        self.velocity = Vec2::new(
            self.velocity.x * friction_x,
            self.velocity.y * self.tuning.friction_y,
        );
    }

    fn apply_input_and_state(&mut self, controls: &ControlFrame, ctx: &mut FighterContext<'_>) {
        let hanging = self.state.hanging_on().is_some();
        let tuning = self.tuning;

        if !self.state.blocks_ground_jump() && controls.pressed(FighterAction::Up) && self.grounded
        {
            self.velocity = self.velocity.with_y(tuning.jump_power);
            self.jump_frames_left = tuning.jump_hold_frames;
        }
        if !hanging && controls.held(FighterAction::Up) {
            if !self.grounded && self.jump_frames_left > 0 {
                self.jump_frames_left -= 1;
                self.velocity = self.velocity.with_y(tuning.jump_power);
            }
        } else {
            self.jump_frames_left = 0;
        }

        if self.state != MachineState::AirDodging
            && !self.grounded
            && !hanging
            && controls.pressed(FighterAction::Up)
            && self.has_double_jump
        {
            self.has_double_jump = false;
            self.velocity = self.velocity.with_y(tuning.double_jump_power);
            ctx.effects
                .emit(EffectKind::DoubleJump, self.position, self.facing_right);
        }

        if !self.state.blocks_movement() {
            for (action, direction) in [
                (FighterAction::Left, Vec2::LEFT),
                (FighterAction::Right, Vec2::RIGHT),
            ] {
                if !controls.held(action) {
                    continue;
                }
                if !self.grounded {
                    self.velocity = self.velocity + direction * tuning.air_accel;
                } else if self.state != MachineState::SpotDodging {
                    self.velocity = self.velocity + direction * tuning.ground_accel;
                }
            }
        }

        self.animation_frame = self.animation_frame.saturating_add(1);
        if self.state != MachineState::Shielding {
            self.shield = self
                .shield
                .saturating_add(tuning.shield_regen)
                .min(tuning.max_shield);
        }
        self.hang_cooldown = self.hang_cooldown.saturating_sub(1);

        match self.state {
            MachineState::Airborne => {
                if self.grounded {
                    self.land(ctx.effects);
                } else if controls.held(FighterAction::Shield) {
                    self.set_state(MachineState::AirDodging);
                } else if self.hang_cooldown == 0 {
                    self.try_grab_ledge(ctx.ledges);
                }
            }
            MachineState::Idle => {
                if !self.grounded {
                    self.set_state(MachineState::Airborne);
                } else if self.velocity.x.abs() >= tuning.run_threshold {
                    self.set_state(MachineState::Running);
                } else if controls.held(FighterAction::Shield) {
                    self.set_state(MachineState::Shielding);
                }
            }
            MachineState::Running => {
                if self.animation_frame >= tuning.running_cycle {
                    self.animation_frame = 0;
                }
                if self.velocity.x.abs() < tuning.run_threshold {
                    self.set_state(MachineState::Idle);
                } else if !self.grounded {
                    self.set_state(MachineState::Airborne);
                } else {
                    let was_facing_right = self.facing_right;
                    self.facing_right = self.velocity.x > 0.0;
                    if was_facing_right != self.facing_right {
                        self.emit_run_turn(ctx.effects, self.facing_right);
                    }
                }
            }
            MachineState::Shielding => self.update_shielding(controls),
            MachineState::Stunned => {
                self.stun_frames = self.stun_frames.saturating_sub(1);
                if self.stun_frames == 0 {
                    self.set_state(MachineState::Idle);
                } else if self.stun_frames % tuning.stun_effect_interval.max(1) == 0 {
                    let offset = Vec2::new(
                        symmetric_unit(ctx.rng) * STUN_SPREAD_X,
                        symmetric_unit(ctx.rng) * STUN_SPREAD_Y + STUN_LIFT_Y,
                    );
                    ctx.effects
                        .emit(EffectKind::Stun, self.position + offset, self.facing_right);
                }
            }
            MachineState::Rolling => {
                self.velocity = self.facing_direction() * tuning.roll_speed;
                if self.animation_frame > tuning.roll_frames {
                    self.set_state(MachineState::Idle);
                }
            }
            MachineState::SpotDodging => {
                if self.animation_frame >= tuning.spot_dodge_frames {
                    self.set_state(MachineState::Idle);
                }
            }
            MachineState::AirDodging => {
                if self.grounded {
                    self.land(ctx.effects);
                } else if self.animation_frame >= tuning.air_dodge_frames {
                    self.set_state(MachineState::Airborne);
                }
            }
            MachineState::Hanging { ledge } => self.update_hanging(controls, ctx.ledges, ledge),
        }
    }

    fn update_shielding(&mut self, controls: &ControlFrame) {
        if !self.grounded {
            self.set_state(MachineState::Airborne);
            return;
        }
        self.shield = self.shield.saturating_sub(self.tuning.shield_drain);
        if self.shield == 0 {
            self.set_state(MachineState::Stunned);
            self.stun_frames = self.tuning.shield_break_stun;
            debug!(
                fighter = self.tag,
                stun_frames = self.stun_frames,
                "shield_broken"
            );
        } else if !controls.held(FighterAction::Shield) {
            self.set_state(MachineState::Idle);
        } else if controls.held(FighterAction::Left) {
            self.facing_right = false;
            self.set_state(MachineState::Rolling);
        } else if controls.held(FighterAction::Right) {
            self.facing_right = true;
            self.set_state(MachineState::Rolling);
        } else if controls.held(FighterAction::Down) {
            self.set_state(MachineState::SpotDodging);
        }
    }

    fn update_hanging(&mut self, controls: &ControlFrame, ledges: &mut LedgeRegistry, ledge: LedgeId) {
        let tuning = self.tuning;
        self.velocity = Vec2::ZERO;
        self.hang_cooldown = tuning.frames_between_hangs;

        let Some(ledge_position) = ledges.get(ledge).map(|held| held.position) else {
            self.set_state(MachineState::Airborne);
            return;
        };

        let away_from_wall = if self.facing_right {
            Vec2::LEFT
        } else {
            Vec2::RIGHT
        };
        let pressing_away = (controls.held(FighterAction::Left) && self.facing_right)
            || (controls.held(FighterAction::Right) && !self.facing_right);

        if controls.held(FighterAction::Down) || pressing_away {
            self.has_double_jump = true;
            self.release_ledge(ledges, ledge);
            self.set_state(MachineState::Airborne);
            self.velocity = away_from_wall * tuning.ledge_drop_push;
        } else if controls.held(FighterAction::Up) {
            self.has_double_jump = true;
            self.release_ledge(ledges, ledge);
            self.set_state(MachineState::Airborne);
            self.position = self.position + away_from_wall * tuning.ledge_jump_clearance;
            self.velocity = Vec2::UP * (tuning.jump_power * 2.0)
                + (-away_from_wall) * tuning.ledge_jump_inward_speed;
        } else if controls.held(FighterAction::Shield) {
            self.set_state(MachineState::Rolling);
            self.position = self.climb_position(ledge_position);
            self.release_ledge(ledges, ledge);
        } else if self.animation_frame >= tuning.hang_immunity_frames
            && (controls.held(FighterAction::Left) || controls.held(FighterAction::Right))
        {
            self.set_state(MachineState::Idle);
            self.position = self.climb_position(ledge_position);
            self.release_ledge(ledges, ledge);
        } else {
            self.position = ledge_position - self.grab_box(self.facing_right).center();
        }
    }

    /// Standing spot on top of the stage next to the ledge.
    fn climb_position(&self, ledge_position: Vec2) -> Vec2 {
        let min = self.collision_box.min();
        let max = self.collision_box.max();
        if self.facing_right {
            ledge_position - min + Vec2::new(self.tuning.climb_inset, self.tuning.climb_lift)
        } else {
            ledge_position - Vec2::new(max.x, min.y)
                + Vec2::new(-self.tuning.climb_inset, self.tuning.climb_lift)
        }
    }

    /// First free ledge in registration order wins.
    fn try_grab_ledge(&mut self, ledges: &mut LedgeRegistry) {
        let right = self.grab_box_world(true);
        let left = self.grab_box_world(false);
        let candidate = ledges
            .iter()
            .filter(|(_, ledge)| !ledge.occupied)
            .find_map(|(id, ledge)| {
                if right.contains(ledge.position) {
                    Some((id, ledge.position, true))
                } else if left.contains(ledge.position) {
                    Some((id, ledge.position, false))
                } else {
                    None
                }
            });
        let Some((id, ledge_position, facing_right)) = candidate else {
            return;
        };
        if !ledges.try_claim(id) {
            return;
        }
        self.facing_right = facing_right;
        self.position = ledge_position - self.grab_box(facing_right).center();
        self.set_state(MachineState::Hanging { ledge: id });
        debug!(fighter = self.tag, ledge = id.0, facing_right, "ledge_grabbed");
    }

    fn release_ledge(&self, ledges: &mut LedgeRegistry, ledge: LedgeId) {
        ledges.release(ledge);
        debug!(fighter = self.tag, ledge = ledge.0, "ledge_released");
    }

    fn land(&mut self, effects: &mut EffectQueue) {
        self.has_double_jump = true;
        if self.velocity.x.abs() >= self.tuning.run_threshold {
            self.set_state(MachineState::Running);
        } else {
            self.set_state(MachineState::Idle);
        }
        self.facing_right = self.velocity.x > 0.0;
        self.emit_run_turn(effects, self.facing_right);
        self.emit_run_turn(effects, !self.facing_right);
    }

    fn emit_run_turn(&self, effects: &mut EffectQueue, facing_right: bool) {
        let trail = if facing_right { Vec2::LEFT } else { Vec2::RIGHT };
        let position = self.position + Vec2::DOWN * RUN_TURN_DROP + trail * RUN_TURN_TRAIL;
        effects.emit(EffectKind::RunTurn, position, facing_right);
    }

    fn set_state(&mut self, next: MachineState) {
        debug!(
            fighter = self.tag,
            from = self.state.name(),
            to = next.name(),
            "fighter_state_changed"
        );
        self.state = next;
        self.animation_frame = 0;
    }

    fn move_with_collision(&mut self, controls: &ControlFrame, geometry: &StageGeometry) {
        let step_len = self.tuning.sub_step;

        let mut remaining = self.velocity.y;
        while remaining.abs() > EPSILON {
            let step = if remaining.abs() > step_len {
                step_len.copysign(remaining)
            } else {
                remaining
            };
            let next = self.position + Vec2::new(0.0, step);
            let blocked = self.overlaps_solid_at(geometry, next)
                || (remaining < 0.0
                    && !self.on_platform_at(geometry, controls, self.position)
                    && self.on_platform_at(geometry, controls, next));
            if blocked {
                self.velocity = self.velocity.with_y(0.0);
                break;
            }
            self.position = next;
            remaining -= step;
        }

        let mut remaining = self.velocity.x;
        while remaining.abs() > EPSILON {
            let step = if remaining.abs() > step_len {
                step_len.copysign(remaining)
            } else {
                remaining
            };
            let next = self.position + Vec2::new(step, 0.0);
            if self.overlaps_solid_at(geometry, next) {
                self.velocity = self.velocity.with_x(0.0);
                break;
            }
            self.position = next;
            remaining -= step;
        }
    }

    fn update_grounded(&mut self, controls: &ControlFrame, geometry: &StageGeometry) {
        let probe = self.position + Vec2::DOWN * self.tuning.ground_probe;
        self.grounded = self.overlaps_solid_at(geometry, probe)
            || (!self.on_platform_at(geometry, controls, self.position)
                && self.on_platform_at(geometry, controls, probe));
    }

    fn overlaps_solid_at(&self, geometry: &StageGeometry, position: Vec2) -> bool {
        geometry.overlaps_solid(&self.collision_box.offset_by(position))
    }

    /// Holding down makes every platform passable.
    fn on_platform_at(&self, geometry: &StageGeometry, controls: &ControlFrame, position: Vec2) -> bool {
        if controls.held(FighterAction::Down) {
            return false;
        }
        geometry.overlaps_platform(&self.collision_box.offset_by(position))
    }

    fn grab_box(&self, facing_right: bool) -> Aabb {
        if facing_right {
            self.grab_box_right
        } else {
            self.grab_box_left
        }
    }

    fn facing_direction(&self) -> Vec2 {
        if self.facing_right {
            Vec2::RIGHT
        } else {
            Vec2::LEFT
        }
    }

    pub(crate) fn render(&self, target: &mut dyn RenderTarget) {
        let visual = FighterVisual::select(self);
        target.draw_sprite(visual.body_sprite(self));
        if let Some(bubble) = visual.shield_sprite(self) {
            target.draw_sprite(bubble);
        }

        target.set_layer(DrawLayer::Overlay);
        target.draw_box(self.collision_box_world(), DebugColor::COLLISION_BOX, false);
        target.draw_box(self.grab_box_world(false), DebugColor::GRAB_BOX, false);
        target.draw_box(self.grab_box_world(true), DebugColor::GRAB_BOX, false);
        target.set_layer(DrawLayer::World);
    }
}

#[cfg(test)]
impl Fighter {
    pub(crate) fn grounded(&self) -> bool {
        self.grounded
    }

    pub(crate) fn has_double_jump(&self) -> bool {
        self.has_double_jump
    }

    pub(crate) fn stun_frames(&self) -> u32 {
        self.stun_frames
    }

    pub(crate) fn hang_cooldown(&self) -> u32 {
        self.hang_cooldown
    }

    pub(crate) fn jump_frames_left(&self) -> u32 {
        self.jump_frames_left
    }
}

/// Uniform sample in `[-1, 1)`.
fn symmetric_unit(rng: &mut StdRng) -> f64 {
    rng.gen::<f64>() * 2.0 - 1.0
}
