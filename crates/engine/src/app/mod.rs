mod input;
mod loop_runner;
mod metrics;
mod render;
mod rendering;
mod scene;

pub use input::{
    ActionStates, ControlFrame, ControlSource, EdgeTracker, FighterAction, ALL_FIGHTER_ACTIONS,
};
pub use loop_runner::{run_app, AppError, LoopConfig, ASSETS_ENV_VAR, SLOW_FRAME_ENV_VAR};
pub use metrics::LoopMetricsSnapshot;
pub use render::{
    sort_by_render_order, DebugColor, DrawCommand, DrawKind, DrawLayer, DrawList, RenderTarget,
    SpriteDraw,
};
pub use rendering::{
    pixels_per_world, world_to_screen, Renderer, Viewport, PLACEHOLDER_HALF_SIZE_PX,
};
pub use scene::{
    Camera2D, EntityId, EntityIdAllocator, EntityList, InputSnapshot, Scene, SceneCommand,
    SceneKey, SceneMachine, SceneWorld, CAMERA_WORLD_WIDTH_DEFAULT, MAX_LOCAL_SLOTS,
};
