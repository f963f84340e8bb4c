use ledgefall_engine::{
    DrawLayer, InputSnapshot, RenderTarget, Scene, SceneCommand, SceneKey, SceneWorld, SpriteDraw,
    Vec2,
};
use tracing::info;

/// Holding screen between rounds. Confirm starts a fresh match.
#[derive(Debug, Default)]
pub(crate) struct LobbyScene {
    ticks_waiting: u64,
}

impl Scene for LobbyScene {
    fn load(&mut self, _world: &mut SceneWorld) {
        self.ticks_waiting = 0;
        info!("lobby_loaded");
    }

    fn update(&mut self, input: &InputSnapshot, _world: &mut SceneWorld) -> SceneCommand {
        if input.confirm_pressed() {
            info!(ticks_waiting = self.ticks_waiting, "lobby_confirmed");
            self.ticks_waiting = 0;
            return SceneCommand::HardResetTo(SceneKey::Match);
        }
        self.ticks_waiting += 1;
        SceneCommand::None
    }

    fn render(&mut self, world: &SceneWorld, target: &mut dyn RenderTarget) {
        target.set_layer(DrawLayer::Ui);
        target.draw_sprite(SpriteDraw::new(
            "ui/title",
            world.camera().position,
            Vec2::new(400.0, 120.0),
        ));
        target.set_layer(DrawLayer::World);
    }

    fn unload(&mut self, _world: &mut SceneWorld) {}

    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        Some("Ledgefall | lobby | press Enter to fight".to_string())
    }
}
