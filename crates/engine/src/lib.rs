pub mod app;
pub mod geometry;
mod sprite_keys;
pub mod world;

pub use app::{
    run_app, sort_by_render_order, ActionStates, AppError, Camera2D, ControlFrame, ControlSource,
    DebugColor, DrawCommand, DrawKind, DrawLayer, DrawList, EdgeTracker, EntityId,
    EntityIdAllocator, EntityList, FighterAction, InputSnapshot, LoopConfig, LoopMetricsSnapshot,
    RenderTarget, Scene, SceneCommand, SceneKey, SceneMachine, SceneWorld, SpriteDraw,
    ALL_FIGHTER_ACTIONS, ASSETS_ENV_VAR, CAMERA_WORLD_WIDTH_DEFAULT, MAX_LOCAL_SLOTS,
    SLOW_FRAME_ENV_VAR,
};
pub use geometry::{Aabb, Segment, Vec2, EPSILON};
pub use sprite_keys::{validate_sprite_key, SpriteKeyError, MAX_SPRITE_KEY_LEN};
pub use world::{Ledge, LedgeId, LedgeRegistry, StageGeometry};
