use super::input::ActionStates;
use super::render::RenderTarget;
use crate::geometry::Vec2;
use crate::world::{LedgeRegistry, StageGeometry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneKey {
    Lobby,
    Match,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    SwitchTo(SceneKey),
    HardResetTo(SceneKey),
}

pub const MAX_LOCAL_SLOTS: usize = 2;

#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    confirm_pressed: bool,
    overlay_toggle_pressed: bool,
    slots: [ActionStates; MAX_LOCAL_SLOTS],
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(
        quit_requested: bool,
        confirm_pressed: bool,
        overlay_toggle_pressed: bool,
        slots: [ActionStates; MAX_LOCAL_SLOTS],
    ) -> Self {
        Self {
            quit_requested,
            confirm_pressed,
            overlay_toggle_pressed,
            slots,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn confirm_pressed(&self) -> bool {
        self.confirm_pressed
    }

    pub fn overlay_toggle_pressed(&self) -> bool {
        self.overlay_toggle_pressed
    }

    /// Out-of-range slots read as nothing held.
    pub fn slot(&self, slot: usize) -> ActionStates {
        self.slots.get(slot).copied().unwrap_or_default()
    }

    pub fn with_slot(mut self, slot: usize, states: ActionStates) -> Self {
        if let Some(entry) = self.slots.get_mut(slot) {
            *entry = states;
        }
        self
    }

    pub fn with_confirm_pressed(mut self, confirm_pressed: bool) -> Self {
        self.confirm_pressed = confirm_pressed;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// Entities in insertion order with spawns and despawns deferred to
/// `apply_pending`, so a tick never observes half-applied changes.
#[derive(Debug)]
pub struct EntityList<T> {
    allocator: EntityIdAllocator,
    entries: Vec<(EntityId, T)>,
    pending_spawns: Vec<(EntityId, T)>,
    pending_despawns: Vec<EntityId>,
}

impl<T> Default for EntityList<T> {
    fn default() -> Self {
        Self {
            allocator: EntityIdAllocator::default(),
            entries: Vec::new(),
            pending_spawns: Vec::new(),
            pending_despawns: Vec::new(),
        }
    }
}

impl<T> EntityList<T> {
    pub fn spawn(&mut self, entity: T) -> EntityId {
        let id = self.allocator.allocate();
        self.pending_spawns.push((id, entity));
        id
    }

    pub fn despawn(&mut self, id: EntityId) -> bool {
        let exists_now = self.entries.iter().any(|(entry_id, _)| *entry_id == id);
        let pending_spawn = self
            .pending_spawns
            .iter()
            .any(|(entry_id, _)| *entry_id == id);
        if !exists_now && !pending_spawn {
            return false;
        }
        self.pending_despawns.push(id);
        true
    }

    pub fn apply_pending(&mut self) {
        if !self.pending_despawns.is_empty() {
            self.pending_despawns.sort_unstable();
            self.pending_despawns.dedup();
            let pending = &self.pending_despawns;
            self.entries
                .retain(|(id, _)| pending.binary_search(id).is_err());
            self.pending_spawns
                .retain(|(id, _)| pending.binary_search(id).is_err());
            self.pending_despawns.clear();
        }

        self.entries.append(&mut self.pending_spawns);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.pending_spawns.clear();
        self.pending_despawns.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> + '_ {
        self.entries.iter().map(|(id, entity)| (*id, entity))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> + '_ {
        self.entries.iter_mut().map(|(id, entity)| (*id, entity))
    }

    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.entries
            .iter()
            .find(|(entry_id, _)| *entry_id == id)
            .map(|(_, entity)| entity)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        self.entries
            .iter_mut()
            .find(|(entry_id, _)| *entry_id == id)
            .map(|(_, entity)| entity)
    }
}

pub const CAMERA_WORLD_WIDTH_DEFAULT: f64 = 3000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera2D {
    pub position: Vec2,
    /// Horizontal span of world units that fills the viewport width.
    pub world_width: f64,
}

impl Default for Camera2D {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            world_width: CAMERA_WORLD_WIDTH_DEFAULT,
        }
    }
}

#[derive(Debug, Default)]
pub struct SceneWorld {
    geometry: StageGeometry,
    ledges: LedgeRegistry,
    camera: Camera2D,
    tick_rate: Option<u32>,
}

impl SceneWorld {
    pub fn geometry(&self) -> &StageGeometry {
        &self.geometry
    }

    pub fn geometry_mut(&mut self) -> &mut StageGeometry {
        &mut self.geometry
    }

    pub fn ledges(&self) -> &LedgeRegistry {
        &self.ledges
    }

    pub fn ledges_mut(&mut self) -> &mut LedgeRegistry {
        &mut self.ledges
    }

    /// Split borrow for the simulation step: geometry is read-only while
    /// ledge occupancy is written by whichever fighter is updating.
    pub fn arena_mut(&mut self) -> (&StageGeometry, &mut LedgeRegistry) {
        (&self.geometry, &mut self.ledges)
    }

    pub fn camera(&self) -> &Camera2D {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera2D {
        &mut self.camera
    }

    pub fn tick_rate(&self) -> Option<u32> {
        self.tick_rate
    }

    pub fn set_tick_rate(&mut self, tick_rate: Option<u32>) {
        self.tick_rate = tick_rate.filter(|value| *value > 0);
    }

    pub fn clear(&mut self) {
        self.geometry.clear();
        self.ledges.clear();
        self.camera = Camera2D::default();
        self.tick_rate = None;
    }
}

pub trait Scene {
    fn load(&mut self, world: &mut SceneWorld);
    fn update(&mut self, input: &InputSnapshot, world: &mut SceneWorld) -> SceneCommand;
    fn render(&mut self, world: &SceneWorld, target: &mut dyn RenderTarget);
    fn unload(&mut self, world: &mut SceneWorld);
    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        None
    }
}

struct SceneRuntime {
    scene: Box<dyn Scene>,
    world: SceneWorld,
    is_loaded: bool,
}

impl SceneRuntime {
    fn new(scene: Box<dyn Scene>) -> Self {
        Self {
            scene,
            world: SceneWorld::default(),
            is_loaded: false,
        }
    }
}

pub struct SceneMachine {
    lobby: SceneRuntime,
    arena: SceneRuntime,
    active_scene: SceneKey,
}

impl SceneMachine {
    pub fn new(lobby: Box<dyn Scene>, arena: Box<dyn Scene>, active_scene: SceneKey) -> Self {
        Self {
            lobby: SceneRuntime::new(lobby),
            arena: SceneRuntime::new(arena),
            active_scene,
        }
    }

    pub fn active_scene(&self) -> SceneKey {
        self.active_scene
    }

    pub fn load_active(&mut self) {
        self.load_scene_if_needed(self.active_scene);
    }

    pub fn update_active(&mut self, input: &InputSnapshot) -> SceneCommand {
        let runtime = self.active_runtime_mut();
        let (scene, world) = (&mut runtime.scene, &mut runtime.world);
        scene.update(input, world)
    }

    /// Applies a command returned by `update_active`; true if the active
    /// scene changed or was rebuilt.
    pub fn apply_command(&mut self, command: SceneCommand) -> bool {
        match command {
            SceneCommand::None => false,
            SceneCommand::SwitchTo(next_scene) => self.switch_to(next_scene),
            SceneCommand::HardResetTo(next_scene) => {
                self.hard_reset_to(next_scene);
                true
            }
        }
    }

    pub fn render_active(&mut self, target: &mut dyn RenderTarget) {
        let runtime = self.active_runtime_mut();
        runtime.scene.render(&runtime.world, target);
    }

    pub fn active_world(&self) -> &SceneWorld {
        &self.active_runtime_ref().world
    }

    #[cfg(test)]
    pub(crate) fn active_world_mut(&mut self) -> &mut SceneWorld {
        &mut self.active_runtime_mut().world
    }

    pub fn debug_title_active(&self) -> Option<String> {
        let runtime = self.active_runtime_ref();
        runtime.scene.debug_title(&runtime.world)
    }

    pub fn switch_to(&mut self, next_scene: SceneKey) -> bool {
        if self.active_scene == next_scene {
            return false;
        }

        self.load_scene_if_needed(next_scene);
        self.active_scene = next_scene;
        true
    }

    pub fn hard_reset_to(&mut self, next_scene: SceneKey) -> bool {
        let runtime = self.runtime_mut(next_scene);
        if runtime.is_loaded {
            let (scene, world) = (&mut runtime.scene, &mut runtime.world);
            scene.unload(world);
        }
        runtime.world.clear();
        {
            let (scene, world) = (&mut runtime.scene, &mut runtime.world);
            scene.load(world);
        }
        runtime.is_loaded = true;
        let changed = self.active_scene != next_scene;
        self.active_scene = next_scene;
        changed
    }

    pub fn shutdown_all(&mut self) {
        for runtime in [&mut self.lobby, &mut self.arena] {
            if runtime.is_loaded {
                let (scene, world) = (&mut runtime.scene, &mut runtime.world);
                scene.unload(world);
                runtime.world.clear();
                runtime.is_loaded = false;
            }
        }
    }

    fn load_scene_if_needed(&mut self, key: SceneKey) {
        if self.runtime_ref(key).is_loaded {
            return;
        }
        let runtime = self.runtime_mut(key);
        {
            let (scene, world) = (&mut runtime.scene, &mut runtime.world);
            scene.load(world);
        }
        runtime.is_loaded = true;
    }

    fn active_runtime_mut(&mut self) -> &mut SceneRuntime {
        self.runtime_mut(self.active_scene)
    }

    fn active_runtime_ref(&self) -> &SceneRuntime {
        self.runtime_ref(self.active_scene)
    }

    fn runtime_mut(&mut self, key: SceneKey) -> &mut SceneRuntime {
        match key {
            SceneKey::Lobby => &mut self.lobby,
            SceneKey::Match => &mut self.arena,
        }
    }

    fn runtime_ref(&self, key: SceneKey) -> &SceneRuntime {
        match key {
            SceneKey::Lobby => &self.lobby,
            SceneKey::Match => &self.arena,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::render::DrawList;
    use crate::geometry::Aabb;

    struct TestScene {
        solid_count: usize,
        loads: usize,
        unloads: usize,
    }

    impl TestScene {
        fn new(solid_count: usize) -> Self {
            Self {
                solid_count,
                loads: 0,
                unloads: 0,
            }
        }
    }

    impl Scene for TestScene {
        fn load(&mut self, world: &mut SceneWorld) {
            self.loads += 1;
            for index in 0..self.solid_count {
                let offset = Vec2::new(index as f64 * 10.0, 0.0);
                world.geometry_mut().add_solid(
                    Aabb::from_corners(Vec2::ZERO, Vec2::new(1.0, 1.0)).offset_by(offset),
                );
            }
            world.ledges_mut().register(Vec2::new(0.0, 1.0));
        }

        fn update(&mut self, _input: &InputSnapshot, _world: &mut SceneWorld) -> SceneCommand {
            SceneCommand::None
        }

        fn render(&mut self, _world: &SceneWorld, _target: &mut dyn RenderTarget) {}

        fn unload(&mut self, _world: &mut SceneWorld) {
            self.unloads += 1;
        }
    }

    struct CameraPanScene {
        step_x: f64,
    }

    impl Scene for CameraPanScene {
        fn load(&mut self, _world: &mut SceneWorld) {}

        fn update(&mut self, _input: &InputSnapshot, world: &mut SceneWorld) -> SceneCommand {
            world.camera_mut().position.x += self.step_x;
            SceneCommand::None
        }

        fn render(&mut self, _world: &SceneWorld, _target: &mut dyn RenderTarget) {}

        fn unload(&mut self, _world: &mut SceneWorld) {}
    }

    struct HandOffScene {
        after_ticks: u32,
        ticks: u32,
        next: SceneKey,
    }

    impl Scene for HandOffScene {
        fn load(&mut self, _world: &mut SceneWorld) {
            self.ticks = 0;
        }

        fn update(&mut self, _input: &InputSnapshot, _world: &mut SceneWorld) -> SceneCommand {
            self.ticks += 1;
            if self.ticks >= self.after_ticks {
                SceneCommand::SwitchTo(self.next)
            } else {
                SceneCommand::None
            }
        }

        fn render(&mut self, _world: &SceneWorld, _target: &mut dyn RenderTarget) {}

        fn unload(&mut self, _world: &mut SceneWorld) {}
    }

    #[test]
    fn allocator_never_reuses_ids() {
        let mut allocator = EntityIdAllocator::default();
        let first = allocator.allocate();
        let second = allocator.allocate();
        let third = allocator.allocate();

        assert_eq!(first.0, 0);
        assert_eq!(second.0, 1);
        assert_eq!(third.0, 2);
    }

    #[test]
    fn entity_list_spawn_is_deferred_until_apply() {
        let mut list = EntityList::default();
        let id = list.spawn("stage");
        assert_eq!(list.len(), 0);
        assert!(list.get(id).is_none());

        list.apply_pending();
        assert_eq!(list.len(), 1);
        assert_eq!(list.get(id), Some(&"stage"));
    }

    #[test]
    fn entity_list_duplicate_despawns_are_idempotent() {
        let mut list = EntityList::default();
        let doomed = list.spawn(1);
        let survivor = list.spawn(2);
        list.apply_pending();

        assert!(list.despawn(doomed));
        assert!(list.despawn(doomed));
        list.apply_pending();

        assert_eq!(list.len(), 1);
        assert!(list.get(doomed).is_none());
        assert_eq!(list.get(survivor), Some(&2));
        assert!(!list.despawn(doomed));
    }

    #[test]
    fn entity_list_despawn_of_pending_spawn_cancels_it() {
        let mut list = EntityList::default();
        let id = list.spawn(7);
        assert!(list.despawn(id));
        list.apply_pending();
        assert!(list.is_empty());
    }

    #[test]
    fn entity_list_preserves_insertion_order() {
        let mut list = EntityList::default();
        list.spawn("a");
        let middle = list.spawn("b");
        list.spawn("c");
        list.apply_pending();
        list.despawn(middle);
        list.spawn("d");
        list.apply_pending();

        let order: Vec<&str> = list.iter().map(|(_, name)| *name).collect();
        assert_eq!(order, vec!["a", "c", "d"]);
    }

    #[test]
    fn switch_away_and_back_keeps_scene_world() {
        let mut machine = SceneMachine::new(
            Box::new(TestScene::new(2)),
            Box::new(TestScene::new(1)),
            SceneKey::Lobby,
        );
        machine.load_active();
        machine.active_world_mut().camera_mut().position = Vec2::new(2.5, -1.0);

        assert!(machine.switch_to(SceneKey::Match));
        assert_eq!(machine.active_world().geometry().solids().len(), 1);
        assert!(machine.switch_to(SceneKey::Lobby));

        assert_eq!(machine.active_world().geometry().solids().len(), 2);
        assert_eq!(
            machine.active_world().camera().position,
            Vec2::new(2.5, -1.0)
        );
    }

    #[test]
    fn switch_to_active_scene_is_noop() {
        let mut machine = SceneMachine::new(
            Box::new(TestScene::new(0)),
            Box::new(TestScene::new(0)),
            SceneKey::Lobby,
        );
        machine.load_active();
        assert!(!machine.switch_to(SceneKey::Lobby));
        assert!(!machine.apply_command(SceneCommand::None));
    }

    #[test]
    fn inactive_scene_world_does_not_advance() {
        let mut machine = SceneMachine::new(
            Box::new(CameraPanScene { step_x: 1.0 }),
            Box::new(CameraPanScene { step_x: 3.0 }),
            SceneKey::Lobby,
        );
        machine.load_active();

        let _ = machine.update_active(&InputSnapshot::empty());
        let before_switch = machine.active_world().camera().position.x;

        assert!(machine.switch_to(SceneKey::Match));
        for _ in 0..10 {
            let _ = machine.update_active(&InputSnapshot::empty());
        }

        assert!(machine.switch_to(SceneKey::Lobby));
        assert_eq!(machine.active_world().camera().position.x, before_switch);
    }

    #[test]
    fn hard_reset_rebuilds_world_without_duplicating_geometry() {
        let mut machine = SceneMachine::new(
            Box::new(TestScene::new(0)),
            Box::new(TestScene::new(3)),
            SceneKey::Lobby,
        );
        machine.load_active();

        assert!(machine.apply_command(SceneCommand::HardResetTo(SceneKey::Match)));
        machine.active_world_mut().ledges_mut().try_claim(crate::world::LedgeId(0));
        machine.active_world_mut().set_tick_rate(Some(20));

        machine.hard_reset_to(SceneKey::Match);
        let world = machine.active_world();
        assert_eq!(world.geometry().solids().len(), 3);
        assert_eq!(world.ledges().len(), 1);
        assert_eq!(world.ledges().occupied_count(), 0);
        assert_eq!(world.tick_rate(), None);
    }

    #[test]
    fn scene_can_hand_control_back() {
        let mut machine = SceneMachine::new(
            Box::new(TestScene::new(0)),
            Box::new(HandOffScene {
                after_ticks: 3,
                ticks: 0,
                next: SceneKey::Lobby,
            }),
            SceneKey::Match,
        );
        machine.load_active();

        let mut switched_at = None;
        for tick in 1..=5 {
            let command = machine.update_active(&InputSnapshot::empty());
            if machine.apply_command(command) {
                switched_at = Some(tick);
                break;
            }
        }
        assert_eq!(switched_at, Some(3));
        assert_eq!(machine.active_scene(), SceneKey::Lobby);
    }

    #[test]
    fn set_tick_rate_ignores_zero() {
        let mut world = SceneWorld::default();
        world.set_tick_rate(Some(0));
        assert_eq!(world.tick_rate(), None);
        world.set_tick_rate(Some(20));
        assert_eq!(world.tick_rate(), Some(20));
    }

    #[test]
    fn input_snapshot_out_of_range_slot_is_empty() {
        let held = ActionStates::default().with(crate::app::FighterAction::Left, true);
        let snapshot = InputSnapshot::empty().with_slot(1, held).with_slot(9, held);
        assert_eq!(snapshot.slot(1), held);
        assert_eq!(snapshot.slot(9), ActionStates::default());
    }

    #[test]
    fn render_active_forwards_target() {
        let mut machine = SceneMachine::new(
            Box::new(TestScene::new(0)),
            Box::new(TestScene::new(0)),
            SceneKey::Lobby,
        );
        machine.load_active();
        let mut draw_list = DrawList::default();
        machine.render_active(&mut draw_list);
        assert!(draw_list.commands().is_empty());
    }

    #[test]
    fn shutdown_unloads_loaded_scenes_once() {
        let mut machine = SceneMachine::new(
            Box::new(TestScene::new(1)),
            Box::new(TestScene::new(1)),
            SceneKey::Lobby,
        );
        machine.load_active();
        machine.shutdown_all();
        machine.shutdown_all();
        assert_eq!(machine.active_world().geometry().solids().len(), 0);
    }
}
