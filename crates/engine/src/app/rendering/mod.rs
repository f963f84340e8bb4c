mod renderer;
mod transform;

pub use renderer::Renderer;
pub use transform::{pixels_per_world, world_to_screen, Viewport};

pub const PLACEHOLDER_HALF_SIZE_PX: i32 = 5;
