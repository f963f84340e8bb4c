use crate::geometry::{Aabb, Segment, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawLayer {
    #[default]
    World,
    /// Debug geometry, hidden unless the overlay is toggled on.
    Overlay,
    Ui,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugColor(pub [u8; 4]);

impl DebugColor {
    pub const SOLID: DebugColor = DebugColor([90, 200, 120, 255]);
    pub const PLATFORM: DebugColor = DebugColor([120, 170, 255, 255]);
    pub const LEDGE_FREE: DebugColor = DebugColor([255, 230, 90, 255]);
    pub const LEDGE_OCCUPIED: DebugColor = DebugColor([255, 90, 90, 255]);
    pub const COLLISION_BOX: DebugColor = DebugColor([230, 230, 230, 255]);
    pub const GRAB_BOX: DebugColor = DebugColor([255, 150, 60, 255]);
    pub const BAR_BACK: DebugColor = DebugColor([40, 44, 52, 255]);
    pub const BAR_FILL: DebugColor = DebugColor([110, 200, 255, 255]);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteDraw {
    pub key: &'static str,
    pub position: Vec2,
    pub facing_right: bool,
    pub alpha: f64,
    pub scale: f64,
    /// World-space size used when the sprite image is unavailable.
    pub fallback_half_extents: Vec2,
}

impl SpriteDraw {
    pub fn new(key: &'static str, position: Vec2, fallback_half_extents: Vec2) -> Self {
        Self {
            key,
            position,
            facing_right: true,
            alpha: 1.0,
            scale: 1.0,
            fallback_half_extents,
        }
    }

    pub fn facing(mut self, facing_right: bool) -> Self {
        self.facing_right = facing_right;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha.clamp(0.0, 1.0);
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawKind {
    Sprite(SpriteDraw),
    Box { aabb: Aabb, color: DebugColor, filled: bool },
    Segment { segment: Segment, color: DebugColor },
    Point { point: Vec2, color: DebugColor },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCommand {
    pub layer: DrawLayer,
    pub kind: DrawKind,
}

/// Sink for draw requests. Scenes pick what to draw; rasterization happens
/// elsewhere.
pub trait RenderTarget {
    fn set_layer(&mut self, layer: DrawLayer);
    fn draw_sprite(&mut self, sprite: SpriteDraw);
    fn draw_box(&mut self, aabb: Aabb, color: DebugColor, filled: bool);
    fn draw_segment(&mut self, segment: Segment, color: DebugColor);
    fn draw_point(&mut self, point: Vec2, color: DebugColor);
}

#[derive(Debug, Default)]
pub struct DrawList {
    layer: DrawLayer,
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn clear(&mut self) {
        self.layer = DrawLayer::World;
        self.commands.clear();
    }

    pub fn in_layer(&self, layer: DrawLayer) -> impl Iterator<Item = &DrawCommand> + '_ {
        self.commands
            .iter()
            .filter(move |command| command.layer == layer)
    }

    pub fn sprites(&self) -> impl Iterator<Item = &SpriteDraw> + '_ {
        self.commands.iter().filter_map(|command| match &command.kind {
            DrawKind::Sprite(sprite) => Some(sprite),
            _ => None,
        })
    }

    fn push(&mut self, kind: DrawKind) {
        self.commands.push(DrawCommand {
            layer: self.layer,
            kind,
        });
    }
}

impl RenderTarget for DrawList {
    fn set_layer(&mut self, layer: DrawLayer) {
        self.layer = layer;
    }

    fn draw_sprite(&mut self, sprite: SpriteDraw) {
        self.push(DrawKind::Sprite(sprite));
    }

    fn draw_box(&mut self, aabb: Aabb, color: DebugColor, filled: bool) {
        self.push(DrawKind::Box {
            aabb,
            color,
            filled,
        });
    }

    fn draw_segment(&mut self, segment: Segment, color: DebugColor) {
        self.push(DrawKind::Segment { segment, color });
    }

    fn draw_point(&mut self, point: Vec2, color: DebugColor) {
        self.push(DrawKind::Point { point, color });
    }
}

/// Stable: entries with equal keys keep their relative order.
pub fn sort_by_render_order<T, F>(items: &mut [T], mut render_order: F)
where
    F: FnMut(&T) -> i32,
{
    items.sort_by_key(|item| render_order(item));
}
