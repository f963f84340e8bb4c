use ledgefall_engine::{Aabb, RenderTarget, SceneWorld, Segment, SpriteDraw, Vec2};
use tracing::info;

pub(crate) const STAGE_RENDER_ORDER: i32 = -100;

const STAGE_SPRITE_KEY: &str = "stage/main";

/// The single battlefield: one solid block with a grabbable ledge at each
/// top corner and three pass-through platforms above it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MainStage {
    solid: Aabb,
    platforms: [Segment; 3],
    ledges: [Vec2; 2],
    blast_zone: Aabb,
    spawn_points: [Vec2; 4],
}

impl Default for MainStage {
    fn default() -> Self {
        Self {
            solid: Aabb::from_corners(Vec2::new(-860.0, -300.0), Vec2::new(860.0, -10.0)),
            platforms: [
                Segment::new(Vec2::new(-180.0, 455.0), Vec2::new(140.0, 455.0)),
                Segment::new(Vec2::new(-600.0, 200.0), Vec2::new(-340.0, 200.0)),
                Segment::new(Vec2::new(365.0, 200.0), Vec2::new(625.0, 200.0)),
            ],
            ledges: [Vec2::new(-860.0, -10.0), Vec2::new(860.0, -10.0)],
            blast_zone: Aabb::from_corners(Vec2::new(-1500.0, -1000.0), Vec2::new(1500.0, 1400.0)),
            spawn_points: [
                Vec2::new(-400.0, 300.0),
                Vec2::new(400.0, 300.0),
                Vec2::new(0.0, 500.0),
                Vec2::new(0.0, 100.0),
            ],
        }
    }
}

impl MainStage {
    /// Contributes geometry and ledges to a freshly cleared world.
    pub(crate) fn install(&self, world: &mut SceneWorld) {
        let geometry = world.geometry_mut();
        geometry.add_solid(self.solid);
        for platform in self.platforms {
            geometry.add_platform(platform);
        }
        let ledges = world.ledges_mut();
        for position in self.ledges {
            ledges.register(position);
        }
        info!(
            solids = 1,
            platforms = self.platforms.len(),
            ledges = self.ledges.len(),
            "stage_installed"
        );
    }

    /// Spawn points repeat when the roster outgrows them.
    pub(crate) fn spawn_point(&self, roster_index: usize) -> Vec2 {
        self.spawn_points[roster_index % self.spawn_points.len()]
    }

    /// A fighter is out once its collision box no longer overlaps the zone.
    pub(crate) fn is_outside_blast_zone(&self, collision_box: &Aabb) -> bool {
        !self.blast_zone.intersects(collision_box)
    }

    pub(crate) fn render(&self, target: &mut dyn RenderTarget) {
        let center = Vec2::new(self.solid.center().x, self.solid.max().y);
        target.draw_sprite(SpriteDraw::new(
            STAGE_SPRITE_KEY,
            center,
            Vec2::new(self.solid.half_extents().x, 40.0),
        ));
    }
}
