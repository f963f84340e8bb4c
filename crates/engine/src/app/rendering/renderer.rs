use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageReader;
use pixels::{Error, Pixels, SurfaceTexture};
use tracing::warn;
use winit::window::Window;

use crate::app::render::{DebugColor, DrawKind, DrawLayer, DrawList, SpriteDraw};
use crate::app::Camera2D;
use crate::geometry::{Aabb, Segment, Vec2};
use crate::sprite_keys::validate_sprite_key;

use super::transform::{pixels_per_world, world_to_screen};
use super::{Viewport, PLACEHOLDER_HALF_SIZE_PX};

const CLEAR_COLOR: [u8; 4] = [20, 22, 28, 255];
const PLACEHOLDER_FACING_NOTCH_PX: i32 = 4;

struct LoadedSprite {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScreenRectPx {
    left: i32,
    right: i32,
    top: i32,
    bottom: i32,
}

struct FrameTarget<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
}

pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
    asset_root: PathBuf,
    sprite_cache: HashMap<&'static str, Option<LoadedSprite>>,
    warned_sprite_keys: HashSet<&'static str>,
}

impl Renderer {
    pub fn new(window: Arc<Window>, asset_root: PathBuf) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
            asset_root,
            sprite_cache: HashMap::new(),
            warned_sprite_keys: HashSet::new(),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub(crate) fn render_draw_list(
        &mut self,
        draw_list: &DrawList,
        camera: &Camera2D,
        show_overlay: bool,
    ) -> Result<(), Error> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Ok(());
        }

        let viewport = self.viewport;
        let asset_root = self.asset_root.as_path();
        let sprite_cache = &mut self.sprite_cache;
        let warned_sprite_keys = &mut self.warned_sprite_keys;
        let mut target = FrameTarget {
            frame: self.pixels.frame_mut(),
            width: viewport.width,
            height: viewport.height,
        };
        for chunk in target.frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&CLEAR_COLOR);
        }

        let ppw = pixels_per_world(camera, viewport);
        for layer in [DrawLayer::World, DrawLayer::Overlay, DrawLayer::Ui] {
            if layer == DrawLayer::Overlay && !show_overlay {
                continue;
            }
            for command in draw_list.in_layer(layer) {
                match &command.kind {
                    DrawKind::Sprite(sprite) => {
                        let center = world_to_screen(sprite.position, camera, viewport);
                        match resolve_cached_sprite(
                            sprite_cache,
                            warned_sprite_keys,
                            asset_root,
                            sprite.key,
                        ) {
                            Some(loaded) => {
                                draw_sprite_centered(&mut target, center, loaded, sprite, ppw)
                            }
                            None => draw_placeholder(&mut target, center, sprite, ppw),
                        }
                    }
                    DrawKind::Box {
                        aabb,
                        color,
                        filled,
                    } => {
                        let rect = screen_rect_for_box(aabb, camera, viewport);
                        if *filled {
                            fill_rect(&mut target, rect, color.0, 1.0);
                        } else {
                            outline_rect(&mut target, rect, color.0);
                        }
                    }
                    DrawKind::Segment { segment, color } => {
                        draw_segment(&mut target, segment, camera, viewport, *color);
                    }
                    DrawKind::Point { point, color } => {
                        let (cx, cy) = world_to_screen(*point, camera, viewport);
                        draw_cross(&mut target, cx, cy, PLACEHOLDER_HALF_SIZE_PX, color.0);
                    }
                }
            }
        }

        self.pixels.render()
    }
}

fn resolve_cached_sprite<'a>(
    cache: &'a mut HashMap<&'static str, Option<LoadedSprite>>,
    warned_sprite_keys: &mut HashSet<&'static str>,
    asset_root: &Path,
    key: &'static str,
) -> Option<&'a LoadedSprite> {
    if !cache.contains_key(key) {
        let sprite = match resolve_sprite_image_path(asset_root, key) {
            Ok(path) => match load_sprite_rgba(&path) {
                Ok(sprite) => Some(sprite),
                Err(reason) => {
                    warn_sprite_load_once(warned_sprite_keys, key, Some(&path), &reason);
                    None
                }
            },
            Err(reason) => {
                warn_sprite_load_once(warned_sprite_keys, key, None, &reason);
                None
            }
        };
        cache.insert(key, sprite);
    }
    cache.get(key).and_then(Option::as_ref)
}

fn resolve_sprite_image_path(asset_root: &Path, key: &str) -> Result<PathBuf, String> {
    validate_sprite_key(key).map_err(|error| format!("invalid_key:{error}"))?;
    Ok(asset_root.join("sprites").join(format!("{key}.png")))
}

fn load_sprite_rgba(path: &Path) -> Result<LoadedSprite, String> {
    let reader = ImageReader::open(path).map_err(|error| format!("file_open_failed:{error}"))?;
    let decoded = reader
        .decode()
        .map_err(|error| format!("decode_failed:{error}"))?;
    let image = decoded.to_rgba8();
    Ok(LoadedSprite {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}

fn warn_sprite_load_once(
    warned_keys: &mut HashSet<&'static str>,
    key: &'static str,
    resolved_path: Option<&Path>,
    reason: &str,
) {
    if !warned_keys.insert(key) {
        return;
    }
    let path_display = resolved_path
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<unresolved>".to_string());
    warn!(
        sprite_key = key,
        path = %path_display,
        reason = reason,
        "renderer_sprite_load_failed_using_placeholder"
    );
}

fn normalized_scale(scale: f64) -> f64 {
    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    }
}

fn scaled_sprite_dimensions(sprite: &LoadedSprite, scale: f64, ppw: f64) -> (u32, u32) {
    let factor = normalized_scale(scale) * normalized_scale(ppw);
    let width = (sprite.width as f64 * factor).round().max(1.0) as u32;
    let height = (sprite.height as f64 * factor).round().max(1.0) as u32;
    (width, height)
}

fn draw_sprite_centered(
    target: &mut FrameTarget<'_>,
    (center_x, center_y): (i32, i32),
    sprite: &LoadedSprite,
    draw: &SpriteDraw,
    ppw: f64,
) {
    if sprite.width == 0 || sprite.height == 0 {
        return;
    }
    let expected_rgba_len = sprite.width as usize * sprite.height as usize * 4;
    if sprite.rgba.len() < expected_rgba_len {
        return;
    }

    let (scaled_w, scaled_h) = scaled_sprite_dimensions(sprite, draw.scale, ppw);
    let left = center_x - (scaled_w as i32 / 2);
    let top = center_y - (scaled_h as i32 / 2);
    let rect = ScreenRectPx {
        left,
        right: left + scaled_w as i32,
        top,
        bottom: top + scaled_h as i32,
    };
    let Some(clipped) = clip_rect(rect, target.width, target.height) else {
        return;
    };

    let x_ratio = sprite.width as f64 / scaled_w as f64;
    let y_ratio = sprite.height as f64 / scaled_h as f64;
    let sprite_width = sprite.width as usize;
    for out_y in clipped.top..clipped.bottom {
        let src_y = (((out_y - top) as f64) * y_ratio).floor() as u32;
        let src_y = src_y.min(sprite.height - 1) as usize;
        for out_x in clipped.left..clipped.right {
            let dx = out_x - left;
            let dx = if draw.facing_right {
                dx
            } else {
                scaled_w as i32 - 1 - dx
            };
            let src_x = ((dx as f64) * x_ratio).floor() as u32;
            let src_x = src_x.min(sprite.width - 1) as usize;
            let src_offset = (src_y * sprite_width + src_x) * 4;
            let texel = &sprite.rgba[src_offset..src_offset + 4];
            if texel[3] == 0 {
                continue;
            }
            let alpha = (texel[3] as f64 / 255.0) * draw.alpha;
            blend_pixel(
                target,
                out_x,
                out_y,
                [texel[0], texel[1], texel[2], 255],
                alpha,
            );
        }
    }
}

fn draw_placeholder(
    target: &mut FrameTarget<'_>,
    (center_x, center_y): (i32, i32),
    draw: &SpriteDraw,
    ppw: f64,
) {
    let factor = normalized_scale(draw.scale) * normalized_scale(ppw);
    let half_w = ((draw.fallback_half_extents.x * factor).round() as i32).max(PLACEHOLDER_HALF_SIZE_PX);
    let half_h = ((draw.fallback_half_extents.y * factor).round() as i32).max(PLACEHOLDER_HALF_SIZE_PX);
    let rect = ScreenRectPx {
        left: center_x - half_w,
        right: center_x + half_w,
        top: center_y - half_h,
        bottom: center_y + half_h,
    };
    let color = placeholder_color(draw.key);
    fill_rect(target, rect, color, draw.alpha);

    let notch_x = if draw.facing_right {
        rect.right - PLACEHOLDER_FACING_NOTCH_PX
    } else {
        rect.left
    };
    let notch = ScreenRectPx {
        left: notch_x,
        right: notch_x + PLACEHOLDER_FACING_NOTCH_PX,
        top: center_y - PLACEHOLDER_FACING_NOTCH_PX,
        bottom: center_y + PLACEHOLDER_FACING_NOTCH_PX,
    };
    fill_rect(target, notch, [255, 255, 255, 255], draw.alpha);
}

/// Stable colour per key so distinct sprites stay distinguishable without art.
fn placeholder_color(key: &str) -> [u8; 4] {
    let mut hash: u32 = 0x811c_9dc5;
    for byte in key.bytes() {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(0x0100_0193);
    }
    [
        96 + (hash & 0x7f) as u8,
        96 + ((hash >> 8) & 0x7f) as u8,
        96 + ((hash >> 16) & 0x7f) as u8,
        255,
    ]
}

fn screen_rect_for_box(aabb: &Aabb, camera: &Camera2D, viewport: Viewport) -> ScreenRectPx {
    let (left, top) = world_to_screen(Vec2::new(aabb.min().x, aabb.max().y), camera, viewport);
    let (right, bottom) = world_to_screen(Vec2::new(aabb.max().x, aabb.min().y), camera, viewport);
    ScreenRectPx {
        left,
        right,
        top,
        bottom,
    }
}

fn clip_rect(rect: ScreenRectPx, width: u32, height: u32) -> Option<ScreenRectPx> {
    let clipped = ScreenRectPx {
        left: rect.left.max(0),
        right: rect.right.min(width as i32),
        top: rect.top.max(0),
        bottom: rect.bottom.min(height as i32),
    };
    (clipped.left < clipped.right && clipped.top < clipped.bottom).then_some(clipped)
}

fn fill_rect(target: &mut FrameTarget<'_>, rect: ScreenRectPx, color: [u8; 4], alpha: f64) {
    let Some(clipped) = clip_rect(rect, target.width, target.height) else {
        return;
    };
    for y in clipped.top..clipped.bottom {
        for x in clipped.left..clipped.right {
            blend_pixel(target, x, y, color, alpha);
        }
    }
}

fn outline_rect(target: &mut FrameTarget<'_>, rect: ScreenRectPx, color: [u8; 4]) {
    for x in rect.left..=rect.right {
        blend_pixel(target, x, rect.top, color, 1.0);
        blend_pixel(target, x, rect.bottom, color, 1.0);
    }
    for y in rect.top..=rect.bottom {
        blend_pixel(target, rect.left, y, color, 1.0);
        blend_pixel(target, rect.right, y, color, 1.0);
    }
}

fn draw_cross(target: &mut FrameTarget<'_>, cx: i32, cy: i32, half_size: i32, color: [u8; 4]) {
    for x in (cx - half_size)..=(cx + half_size) {
        blend_pixel(target, x, cy, color, 1.0);
    }
    for y in (cy - half_size)..=(cy + half_size) {
        blend_pixel(target, cx, y, color, 1.0);
    }
}

fn draw_segment(
    target: &mut FrameTarget<'_>,
    segment: &Segment,
    camera: &Camera2D,
    viewport: Viewport,
    color: DebugColor,
) {
    let (mut x0, mut y0) = world_to_screen(segment.a, camera, viewport);
    let (x1, y1) = world_to_screen(segment.b, camera, viewport);
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut error = dx + dy;
    loop {
        blend_pixel(target, x0, y0, color.0, 1.0);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let doubled = 2 * error;
        if doubled >= dy {
            error += dy;
            x0 += sx;
        }
        if doubled <= dx {
            error += dx;
            y0 += sy;
        }
    }
}

fn blend_pixel(target: &mut FrameTarget<'_>, x: i32, y: i32, color: [u8; 4], alpha: f64) {
    if x < 0 || y < 0 || x >= target.width as i32 || y >= target.height as i32 {
        return;
    }
    let alpha = alpha.clamp(0.0, 1.0);
    if alpha <= 0.0 {
        return;
    }
    let offset = (y as usize * target.width as usize + x as usize) * 4;
    let Some(dst) = target.frame.get_mut(offset..offset + 4) else {
        return;
    };
    for channel in 0..3 {
        let blended = dst[channel] as f64 * (1.0 - alpha) + color[channel] as f64 * alpha;
        dst[channel] = blended.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = 255;
}
