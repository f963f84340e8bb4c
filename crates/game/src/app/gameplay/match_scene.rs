use std::collections::BTreeSet;

use ledgefall_engine::{
    sort_by_render_order, Aabb, Camera2D, DebugColor, DrawLayer, EntityId, EntityList,
    InputSnapshot, RenderTarget, Scene, SceneCommand, SceneKey, SceneWorld, SpriteDraw, Vec2,
    CAMERA_WORLD_WIDTH_DEFAULT,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use super::controls::PlayerControls;
use super::effects::{EffectQueue, Particle, PARTICLE_RENDER_ORDER};
use super::fighter::{Fighter, FighterContext, FIGHTER_RENDER_ORDER};
use super::stage::{MainStage, STAGE_RENDER_ORDER};
use crate::app::config::MatchConfig;

const GAME_OVER_BANNER_SCALE: f64 = 1.5;
const HUD_BAR_HALF_WIDTH: f64 = 110.0;
const HUD_BAR_HALF_HEIGHT: f64 = 14.0;
const HUD_BAR_MARGIN: f64 = 90.0;
const HIGHLIGHT_LIFT: f64 = 100.0;

/// A lone fighter's bar sits centered; otherwise bars spread edge to edge.
fn hud_fraction(index: usize, roster_len: usize) -> f64 {
    if roster_len <= 1 {
        0.5
    } else {
        index as f64 / (roster_len - 1) as f64
    }
}

pub(crate) struct FighterEntity {
    pub(crate) fighter: Fighter,
    controls: PlayerControls,
    show_highlight: bool,
    /// Horizontal HUD anchor across the inset bar strip, 0 = left, 1 = right.
    hud_fraction: f64,
}

pub(crate) enum MatchEntity {
    Stage(MainStage),
    Fighter(Box<FighterEntity>),
    Particle(Particle),
}

impl MatchEntity {
    fn render_order(&self) -> i32 {
        match self {
            Self::Stage(_) => STAGE_RENDER_ORDER,
            Self::Fighter(_) => FIGHTER_RENDER_ORDER,
            Self::Particle(_) => PARTICLE_RENDER_ORDER,
        }
    }

    fn render(&self, target: &mut dyn RenderTarget) {
        match self {
            Self::Stage(stage) => stage.render(target),
            Self::Fighter(entity) => entity.fighter.render(target),
            Self::Particle(particle) => particle.render(target),
        }
    }

    fn render_ui(&self, camera: &Camera2D, target: &mut dyn RenderTarget) {
        let Self::Fighter(entity) = self else {
            return;
        };
        let fighter = &entity.fighter;
        let view_height = camera.world_width * 9.0 / 16.0;
        let inset = HUD_BAR_HALF_WIDTH + HUD_BAR_MARGIN;
        let usable_width = (camera.world_width - 2.0 * inset).max(0.0);
        let strip_left = camera.position.x - camera.world_width / 2.0 + inset;
        let anchor = Vec2::new(
            strip_left + usable_width * entity.hud_fraction,
            camera.position.y - view_height / 2.0 + HUD_BAR_MARGIN,
        );
        let back = Aabb::from_corners(
            anchor - Vec2::new(HUD_BAR_HALF_WIDTH, HUD_BAR_HALF_HEIGHT),
            anchor + Vec2::new(HUD_BAR_HALF_WIDTH, HUD_BAR_HALF_HEIGHT),
        );
        target.draw_box(back, DebugColor::BAR_BACK, true);

        let max_shield = fighter.tuning().max_shield.max(1) as f64;
        let fraction = fighter.shield() as f64 / max_shield;
        if fraction > 0.0 {
            let fill = Aabb::from_corners(
                back.min(),
                Vec2::new(
                    back.min().x + back.half_extents().x * 2.0 * fraction,
                    back.max().y,
                ),
            );
            target.draw_box(fill, DebugColor::BAR_FILL, true);
        }

        if entity.show_highlight && fighter.is_alive() {
            target.draw_sprite(
                SpriteDraw::new(
                    "ui/player_marker",
                    fighter.position() + Vec2::UP * HIGHLIGHT_LIFT,
                    Vec2::new(12.0, 12.0),
                )
                .facing(fighter.facing_right()),
            );
        }
    }
}

/// One round: stage, fighters and their particles. Ends once the number of
/// teams with a living fighter drops to the threshold, slows the clock for a
/// short countdown and hands control back to the lobby.
pub(crate) struct MatchScene {
    config: MatchConfig,
    stage: MainStage,
    entities: EntityList<MatchEntity>,
    effects: EffectQueue,
    rng: StdRng,
    teams_alive_to_end: usize,
    game_over: bool,
    game_over_ticks: u32,
    previous_tick_rate: Option<u32>,
    tick: u64,
}

impl MatchScene {
    pub(crate) fn new(config: MatchConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.rng_seed);
        Self {
            config,
            stage: MainStage::default(),
            entities: EntityList::default(),
            effects: EffectQueue::default(),
            rng,
            teams_alive_to_end: 1,
            game_over: false,
            game_over_ticks: 0,
            previous_tick_rate: None,
            tick: 0,
        }
    }

    pub(crate) fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub(crate) fn fighters(&self) -> impl Iterator<Item = (EntityId, &Fighter)> + '_ {
        self.entities.iter().filter_map(|(id, entity)| match entity {
            MatchEntity::Fighter(slot) => Some((id, &slot.fighter)),
            _ => None,
        })
    }

    pub(crate) fn particle_count(&self) -> usize {
        self.entities
            .iter()
            .filter(|(_, entity)| matches!(entity, MatchEntity::Particle(_)))
            .count()
    }

    #[cfg(test)]
    pub(crate) fn fighter_mut(&mut self, id: EntityId) -> Option<&mut Fighter> {
        match self.entities.get_mut(id) {
            Some(MatchEntity::Fighter(slot)) => Some(&mut slot.fighter),
            _ => None,
        }
    }

    fn alive_team_count(&self) -> usize {
        self.fighters()
            .filter(|(_, fighter)| fighter.is_alive())
            .map(|(_, fighter)| fighter.team())
            .collect::<BTreeSet<_>>()
            .len()
    }

    fn reset_round(&mut self) {
        self.entities.clear();
        self.effects.clear();
        self.rng = StdRng::seed_from_u64(self.config.rng_seed);
        self.game_over = false;
        self.game_over_ticks = 0;
        self.previous_tick_rate = None;
        self.tick = 0;
    }

    fn simulate_entities(&mut self, input: &InputSnapshot, world: &mut SceneWorld) {
        let (geometry, ledges) = world.arena_mut();
        let mut ctx = FighterContext {
            geometry,
            ledges,
            effects: &mut self.effects,
            rng: &mut self.rng,
        };
        let mut finished = Vec::new();
        for (id, entity) in self.entities.iter_mut() {
            match entity {
                MatchEntity::Stage(_) => {}
                MatchEntity::Fighter(slot) => {
                    let controls = slot.controls.sample(input);
                    slot.fighter.update(&controls, &mut ctx);
                }
                MatchEntity::Particle(particle) => {
                    particle.update();
                    if particle.is_expired() {
                        finished.push(id);
                    }
                }
            }
        }

        for id in finished {
            self.entities.despawn(id);
        }
        for request in self.effects.drain() {
            self.entities
                .spawn(MatchEntity::Particle(Particle::from_request(request)));
        }
    }

    fn knock_out_escaped_fighters(&mut self, world: &mut SceneWorld) {
        let mut knocked_out = Vec::new();
        for (id, entity) in self.entities.iter_mut() {
            let MatchEntity::Fighter(slot) = entity else {
                continue;
            };
            let fighter = &mut slot.fighter;
            if fighter.is_alive()
                && self
                    .stage
                    .is_outside_blast_zone(&fighter.collision_box_world())
            {
                fighter.knock_out(world.ledges_mut());
                info!(
                    fighter = fighter.tag(),
                    team = fighter.team(),
                    x = fighter.position().x,
                    y = fighter.position().y,
                    "fighter_left_blast_zone"
                );
                knocked_out.push(id);
            }
        }
        for id in knocked_out {
            self.entities.despawn(id);
        }
    }
}

impl Scene for MatchScene {
    fn load(&mut self, world: &mut SceneWorld) {
        self.reset_round();
        self.stage.install(world);
        *world.camera_mut() = Camera2D {
            position: Vec2::ZERO,
            world_width: CAMERA_WORLD_WIDTH_DEFAULT,
        };
        world.set_tick_rate(Some(self.config.normal_tick_rate));

        self.entities.spawn(MatchEntity::Stage(self.stage.clone()));
        let roster_len = self.config.roster.len();
        for (index, entry) in self.config.roster.iter().enumerate() {
            let fighter = Fighter::new(
                index,
                entry.team,
                self.stage.spawn_point(index),
                self.config.tuning,
            );
            self.entities
                .spawn(MatchEntity::Fighter(Box::new(FighterEntity {
                    fighter,
                    controls: PlayerControls::from_kind(&entry.control),
                    show_highlight: entry.show_highlight,
                    hud_fraction: hud_fraction(index, roster_len),
                })));
        }
        self.entities.apply_pending();
        self.teams_alive_to_end = if roster_len == 1 { 0 } else { 1 };

        info!(
            fighters = roster_len,
            teams_alive_to_end = self.teams_alive_to_end,
            tick_rate = self.config.normal_tick_rate,
            "match_loaded"
        );
    }

    fn update(&mut self, input: &InputSnapshot, world: &mut SceneWorld) -> SceneCommand {
        self.tick += 1;
        self.simulate_entities(input, world);
        self.knock_out_escaped_fighters(world);
        self.entities.apply_pending();

        if !self.game_over {
            let alive_teams = self.alive_team_count();
            if alive_teams <= self.teams_alive_to_end {
                self.game_over = true;
                self.previous_tick_rate = world.tick_rate();
                world.set_tick_rate(Some(self.config.slowed_tick_rate));
                info!(
                    alive_teams,
                    tick = self.tick,
                    slowed_tick_rate = self.config.slowed_tick_rate,
                    "match_game_over"
                );
            }
        } else {
            self.game_over_ticks += 1;
            if self.game_over_ticks >= self.config.game_over_frames {
                world.set_tick_rate(self.previous_tick_rate);
                info!(tick = self.tick, "match_finished");
                return SceneCommand::SwitchTo(SceneKey::Lobby);
            }
        }

        SceneCommand::None
    }

    fn render(&mut self, world: &SceneWorld, target: &mut dyn RenderTarget) {
        let mut ordered: Vec<&MatchEntity> = self.entities.iter().map(|(_, entity)| entity).collect();
        sort_by_render_order(&mut ordered, |entity| entity.render_order());

        target.set_layer(DrawLayer::World);
        for entity in &ordered {
            entity.render(target);
        }

        target.set_layer(DrawLayer::Overlay);
        for solid in world.geometry().solids() {
            target.draw_box(*solid, DebugColor::SOLID, false);
        }
        for platform in world.geometry().platforms() {
            target.draw_segment(*platform, DebugColor::PLATFORM);
        }
        for (_, ledge) in world.ledges().iter() {
            let color = if ledge.occupied {
                DebugColor::LEDGE_OCCUPIED
            } else {
                DebugColor::LEDGE_FREE
            };
            target.draw_point(ledge.position, color);
        }

        target.set_layer(DrawLayer::Ui);
        for entity in &ordered {
            entity.render_ui(world.camera(), target);
        }
        if self.game_over {
            target.draw_sprite(
                SpriteDraw::new("ui/game_over", world.camera().position, Vec2::new(300.0, 60.0))
                    .with_scale(GAME_OVER_BANNER_SCALE),
            );
        }
        target.set_layer(DrawLayer::World);
    }

    fn unload(&mut self, _world: &mut SceneWorld) {
        debug!(
            entity_count = self.entities.len(),
            tick = self.tick,
            "match_unloaded"
        );
        self.reset_round();
    }

    fn debug_title(&self, world: &SceneWorld) -> Option<String> {
        let total = self.fighters().count();
        let alive = self
            .fighters()
            .filter(|(_, fighter)| fighter.is_alive())
            .count();
        let roster = self
            .fighters()
            .map(|(_, fighter)| {
                let ledge = fighter
                    .hanging_on()
                    .map(|ledge| format!("@{}", ledge.0))
                    .unwrap_or_default();
                format!(
                    "P{} {}{} {}",
                    fighter.tag() + 1,
                    fighter.state().name(),
                    ledge,
                    fighter.shield()
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        Some(format!(
            "Ledgefall | match | fighters {alive}/{total} [{roster}] | particles {} | ledges held {} | tick {}{}",
            self.particle_count(),
            world.ledges().occupied_count(),
            self.tick,
            if self.game_over { " | game over" } else { "" },
        ))
    }
}
