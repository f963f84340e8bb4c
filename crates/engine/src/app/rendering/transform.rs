use crate::app::Camera2D;
use crate::geometry::Vec2;

#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// The camera frames `world_width` units across the full viewport width.
pub fn pixels_per_world(camera: &Camera2D, viewport: Viewport) -> f64 {
    if camera.world_width.is_finite() && camera.world_width > 0.0 {
        viewport.width as f64 / camera.world_width
    } else {
        1.0
    }
}

/// World space is y-up; screen space is y-down with the camera at the
/// viewport centre.
pub fn world_to_screen(world: Vec2, camera: &Camera2D, viewport: Viewport) -> (i32, i32) {
    let scale = pixels_per_world(camera, viewport);
    let x = (world.x - camera.position.x) * scale + viewport.width as f64 * 0.5;
    let y = viewport.height as f64 * 0.5 - (world.y - camera.position.y) * scale;
    (x.round() as i32, y.round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_maps_to_viewport_center() {
        let viewport = Viewport {
            width: 800,
            height: 600,
        };
        let camera = Camera2D::default();
        let (x, y) = world_to_screen(Vec2::ZERO, &camera, viewport);
        assert_eq!(x, 400);
        assert_eq!(y, 300);
    }

    #[test]
    fn camera_offset_shifts_screen_position() {
        let viewport = Viewport {
            width: 800,
            height: 600,
        };
        let camera = Camera2D {
            position: Vec2::new(10.0, -5.0),
            world_width: 80.0,
        };
        let (x, y) = world_to_screen(Vec2::new(12.0, -4.0), &camera, viewport);
        assert_eq!(x, 420);
        assert_eq!(y, 290);
    }

    #[test]
    fn degenerate_world_width_falls_back_to_unit_scale() {
        let viewport = Viewport {
            width: 640,
            height: 480,
        };
        let camera = Camera2D {
            position: Vec2::ZERO,
            world_width: 0.0,
        };
        assert_eq!(pixels_per_world(&camera, viewport), 1.0);
    }
}
