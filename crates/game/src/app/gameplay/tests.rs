use ledgefall_engine::{
    ActionStates, DebugColor, DrawKind, DrawLayer, DrawList, EntityId, FighterAction,
    InputSnapshot, Scene, SceneCommand, SceneKey, SceneWorld, Vec2,
};

use super::lobby_scene::LobbyScene;
use super::match_scene::MatchScene;
use crate::app::config::{ControlKind, MatchConfig, RosterEntry};

fn idle_roster(teams: &[u32]) -> MatchConfig {
    MatchConfig {
        roster: teams
            .iter()
            .map(|team| RosterEntry {
                team: *team,
                control: ControlKind::Idle,
                show_highlight: false,
            })
            .collect(),
        ..MatchConfig::default()
    }
}

fn loaded(config: MatchConfig) -> (MatchScene, SceneWorld) {
    let mut scene = MatchScene::new(config);
    let mut world = SceneWorld::default();
    scene.load(&mut world);
    (scene, world)
}

fn fighter_ids(scene: &MatchScene) -> Vec<EntityId> {
    scene.fighters().map(|(id, _)| id).collect()
}

fn eject(scene: &mut MatchScene, id: EntityId) {
    scene
        .fighter_mut(id)
        .expect("fighter entity")
        .place(Vec2::new(0.0, -2000.0), Vec2::ZERO);
}

#[test]
fn load_builds_stage_and_roster() {
    let (scene, world) = loaded(MatchConfig::default());

    assert_eq!(world.geometry().solids().len(), 1);
    assert_eq!(world.geometry().platforms().len(), 3);
    assert_eq!(world.ledges().len(), 2);
    assert_eq!(world.tick_rate(), Some(120));
    assert_eq!(world.camera().world_width, 3000.0);

    let spawns: Vec<Vec2> = scene.fighters().map(|(_, f)| f.position()).collect();
    assert_eq!(spawns, vec![Vec2::new(-400.0, 300.0), Vec2::new(400.0, 300.0)]);
    assert!(!scene.is_game_over());
}

#[test]
fn idle_match_keeps_running() {
    let (mut scene, mut world) = loaded(idle_roster(&[0, 1]));
    let input = InputSnapshot::empty();

    for _ in 0..300 {
        assert_eq!(scene.update(&input, &mut world), SceneCommand::None);
    }
    assert!(!scene.is_game_over());
    assert!(scene.fighters().all(|(_, fighter)| fighter.grounded()));
}

#[test]
fn landing_dust_spawns_particles_that_expire() {
    let (mut scene, mut world) = loaded(idle_roster(&[0, 1]));
    let input = InputSnapshot::empty();

    let mut ticks = 0;
    while scene.particle_count() == 0 {
        scene.update(&input, &mut world);
        ticks += 1;
        assert!(ticks < 300, "fighters never landed");
    }
    assert_eq!(scene.particle_count(), 4);

    for _ in 0..14 {
        scene.update(&input, &mut world);
    }
    assert_eq!(scene.particle_count(), 4);
    scene.update(&input, &mut world);
    assert_eq!(scene.particle_count(), 0);
}

#[test]
fn keyboard_slot_drives_only_its_fighter() {
    let (mut scene, mut world) = loaded(MatchConfig::default());
    let input =
        InputSnapshot::empty().with_slot(0, ActionStates::from_actions(&[FighterAction::Right]));

    for _ in 0..100 {
        scene.update(&input, &mut world);
    }

    let positions: Vec<Vec2> = scene.fighters().map(|(_, f)| f.position()).collect();
    assert!(positions[0].x > -300.0);
    assert_eq!(positions[1].x, 400.0);
}

#[test]
fn last_team_standing_slows_clock_then_returns_to_lobby() {
    let (mut scene, mut world) = loaded(idle_roster(&[0, 1]));
    let input = InputSnapshot::empty();
    let ids = fighter_ids(&scene);

    eject(&mut scene, ids[1]);
    assert_eq!(scene.update(&input, &mut world), SceneCommand::None);

    assert!(scene.is_game_over());
    assert_eq!(world.tick_rate(), Some(20));
    assert_eq!(fighter_ids(&scene), vec![ids[0]]);

    let mut ticks_after_game_over = 0;
    let command = loop {
        let command = scene.update(&input, &mut world);
        ticks_after_game_over += 1;
        if command != SceneCommand::None || ticks_after_game_over > 100 {
            break command;
        }
        assert_eq!(world.tick_rate(), Some(20));
    };
    assert_eq!(command, SceneCommand::SwitchTo(SceneKey::Lobby));
    assert_eq!(ticks_after_game_over, 60);
    assert_eq!(world.tick_rate(), Some(120));
}

#[test]
fn shield_bars_spread_across_the_view() {
    let (mut scene, world) = loaded(idle_roster(&[0, 1, 2]));
    let mut list = DrawList::default();
    scene.render(&world, &mut list);

    let camera = world.camera();
    let half_width = camera.world_width / 2.0;
    let bar_centers: Vec<f64> = list
        .in_layer(DrawLayer::Ui)
        .filter_map(|command| match &command.kind {
            DrawKind::Box { aabb, color, .. } if *color == DebugColor::BAR_BACK => {
                assert!(aabb.min().x >= camera.position.x - half_width);
                assert!(aabb.max().x <= camera.position.x + half_width);
                Some(aabb.center().x - camera.position.x)
            }
            _ => None,
        })
        .collect();

    assert_eq!(bar_centers.len(), 3);
    assert!(bar_centers[0] < 0.0);
    assert_eq!(bar_centers[1], 0.0);
    assert_eq!(bar_centers[2], -bar_centers[0]);
}

#[test]
fn solo_shield_bar_is_centered() {
    let (mut scene, world) = loaded(idle_roster(&[0]));
    let mut list = DrawList::default();
    scene.render(&world, &mut list);

    let center = list
        .in_layer(DrawLayer::Ui)
        .find_map(|command| match &command.kind {
            DrawKind::Box { aabb, color, .. } if *color == DebugColor::BAR_BACK => {
                Some(aabb.center().x)
            }
            _ => None,
        })
        .expect("shield bar");
    assert_eq!(center, world.camera().position.x);
}

#[test]
fn solo_match_ends_only_when_the_last_fighter_falls() {
    let (mut scene, mut world) = loaded(idle_roster(&[0]));
    let input = InputSnapshot::empty();

    for _ in 0..200 {
        scene.update(&input, &mut world);
    }
    assert!(!scene.is_game_over());

    let ids = fighter_ids(&scene);
    eject(&mut scene, ids[0]);
    scene.update(&input, &mut world);
    assert!(scene.is_game_over());
    assert_eq!(scene.fighters().count(), 0);
}

#[test]
fn teammates_do_not_keep_a_match_alive() {
    let (mut scene, mut world) = loaded(idle_roster(&[4, 4, 5]));
    let input = InputSnapshot::empty();
    let ids = fighter_ids(&scene);

    eject(&mut scene, ids[2]);
    scene.update(&input, &mut world);

    assert!(scene.is_game_over());
    assert_eq!(scene.fighters().count(), 2);
}

#[test]
fn render_orders_stage_first_and_layers_overlays() {
    let (mut scene, world) = loaded(MatchConfig::default());
    let mut list = DrawList::default();

    scene.render(&world, &mut list);

    let world_sprites: Vec<&str> = list
        .in_layer(DrawLayer::World)
        .filter_map(|command| match &command.kind {
            DrawKind::Sprite(sprite) => Some(sprite.key),
            _ => None,
        })
        .collect();
    assert_eq!(world_sprites.first(), Some(&"stage/main"));
    assert_eq!(world_sprites.len(), 3);

    // One solid, three platforms, two ledges, three boxes per fighter.
    assert_eq!(list.in_layer(DrawLayer::Overlay).count(), 12);
    // Shield bar back, fill and marker per fighter.
    assert_eq!(list.in_layer(DrawLayer::Ui).count(), 6);
}

#[test]
fn particles_draw_above_fighters() {
    let (mut scene, mut world) = loaded(idle_roster(&[0, 1]));
    let input = InputSnapshot::empty();
    while scene.particle_count() == 0 {
        scene.update(&input, &mut world);
    }

    let mut list = DrawList::default();
    scene.render(&world, &mut list);

    let keys: Vec<&str> = list.sprites().map(|sprite| sprite.key).collect();
    let last_fighter = keys
        .iter()
        .rposition(|key| key.starts_with("fighter/"))
        .expect("fighter sprite");
    let first_effect = keys
        .iter()
        .position(|key| key.starts_with("fx/"))
        .expect("effect sprite");
    assert!(first_effect > last_fighter);
}

#[test]
fn game_over_banner_is_drawn_on_ui_layer() {
    let (mut scene, mut world) = loaded(idle_roster(&[0, 1]));
    let ids = fighter_ids(&scene);
    eject(&mut scene, ids[0]);
    scene.update(&InputSnapshot::empty(), &mut world);

    let mut list = DrawList::default();
    scene.render(&world, &mut list);

    let banner = list
        .in_layer(DrawLayer::Ui)
        .find_map(|command| match &command.kind {
            DrawKind::Sprite(sprite) if sprite.key == "ui/game_over" => Some(*sprite),
            _ => None,
        })
        .expect("banner");
    assert_eq!(banner.scale, 1.5);
    assert_eq!(banner.position, world.camera().position);
}

#[test]
fn reload_starts_a_fresh_round() {
    let (mut scene, mut world) = loaded(idle_roster(&[0, 1]));
    let ids = fighter_ids(&scene);
    eject(&mut scene, ids[0]);
    scene.update(&InputSnapshot::empty(), &mut world);
    assert!(scene.is_game_over());

    scene.unload(&mut world);
    world.clear();
    scene.load(&mut world);

    assert!(!scene.is_game_over());
    assert_eq!(scene.fighters().count(), 2);
    assert_eq!(scene.particle_count(), 0);
    assert_eq!(world.ledges().occupied_count(), 0);
    assert_eq!(world.tick_rate(), Some(120));
}

#[test]
fn lobby_waits_for_confirm_then_hard_resets_match() {
    let mut lobby = LobbyScene::default();
    let mut world = SceneWorld::default();
    lobby.load(&mut world);

    assert_eq!(
        lobby.update(&InputSnapshot::empty(), &mut world),
        SceneCommand::None
    );
    assert_eq!(
        lobby.update(&InputSnapshot::empty().with_confirm_pressed(true), &mut world),
        SceneCommand::HardResetTo(SceneKey::Match)
    );
    assert!(lobby.debug_title(&world).is_some());
}
