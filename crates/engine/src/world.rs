use crate::geometry::{Aabb, Segment, Vec2};

/// Static collision geometry contributed by the stage at load time.
#[derive(Debug, Clone, Default)]
pub struct StageGeometry {
    solids: Vec<Aabb>,
    platforms: Vec<Segment>,
}

impl StageGeometry {
    pub fn add_solid(&mut self, solid: Aabb) {
        self.solids.push(solid);
    }

    pub fn add_platform(&mut self, platform: Segment) {
        self.platforms.push(platform);
    }

    pub fn solids(&self) -> &[Aabb] {
        &self.solids
    }

    pub fn platforms(&self) -> &[Segment] {
        &self.platforms
    }

    pub fn overlaps_solid(&self, probe: &Aabb) -> bool {
        self.solids.iter().any(|solid| probe.intersects(solid))
    }

    pub fn overlaps_platform(&self, probe: &Aabb) -> bool {
        self.platforms
            .iter()
            .any(|platform| probe.intersects_segment(platform))
    }

    pub fn clear(&mut self) {
        self.solids.clear();
        self.platforms.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LedgeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ledge {
    pub position: Vec2,
    pub occupied: bool,
}

/// Grabbable points in registration order. Occupancy is check-then-set and
/// relies on fighters being updated one after another within a tick.
#[derive(Debug, Clone, Default)]
pub struct LedgeRegistry {
    ledges: Vec<Ledge>,
}

impl LedgeRegistry {
    pub fn register(&mut self, position: Vec2) -> LedgeId {
        let id = LedgeId(self.ledges.len());
        self.ledges.push(Ledge {
            position,
            occupied: false,
        });
        id
    }

    pub fn get(&self, id: LedgeId) -> Option<&Ledge> {
        self.ledges.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (LedgeId, &Ledge)> + '_ {
        self.ledges
            .iter()
            .enumerate()
            .map(|(index, ledge)| (LedgeId(index), ledge))
    }

    pub fn len(&self) -> usize {
        self.ledges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ledges.is_empty()
    }

    pub fn try_claim(&mut self, id: LedgeId) -> bool {
        match self.ledges.get_mut(id.0) {
            Some(ledge) if !ledge.occupied => {
                ledge.occupied = true;
                true
            }
            _ => false,
        }
    }

    pub fn release(&mut self, id: LedgeId) {
        if let Some(ledge) = self.ledges.get_mut(id.0) {
            ledge.occupied = false;
        }
    }

    pub fn occupied_count(&self) -> usize {
        self.ledges.iter().filter(|ledge| ledge.occupied).count()
    }

    pub fn clear(&mut self) {
        self.ledges.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor() -> Aabb {
        Aabb::from_corners(Vec2::new(-10.0, -5.0), Vec2::new(10.0, 0.0))
    }

    #[test]
    fn overlaps_solid_reports_any_hit() {
        let mut geometry = StageGeometry::default();
        geometry.add_solid(floor());

        let resting = Aabb::from_corners(Vec2::new(-1.0, 0.0), Vec2::new(1.0, 2.0));
        let sunk = resting.offset_by(Vec2::new(0.0, -0.1));
        assert!(!geometry.overlaps_solid(&resting));
        assert!(geometry.overlaps_solid(&sunk));
    }

    #[test]
    fn overlaps_platform_uses_segment_test() {
        let mut geometry = StageGeometry::default();
        geometry.add_platform(Segment::new(Vec2::new(-5.0, 3.0), Vec2::new(5.0, 3.0)));

        let straddling = Aabb::from_corners(Vec2::new(-1.0, 2.0), Vec2::new(1.0, 4.0));
        let above = straddling.offset_by(Vec2::new(0.0, 1.0));
        assert!(geometry.overlaps_platform(&straddling));
        assert!(!geometry.overlaps_platform(&above));
    }

    #[test]
    fn clear_drops_all_geometry() {
        let mut geometry = StageGeometry::default();
        geometry.add_solid(floor());
        geometry.add_platform(Segment::new(Vec2::ZERO, Vec2::new(1.0, 0.0)));
        geometry.clear();
        assert!(geometry.solids().is_empty());
        assert!(geometry.platforms().is_empty());
    }

    #[test]
    fn ledge_ids_follow_registration_order() {
        let mut ledges = LedgeRegistry::default();
        let first = ledges.register(Vec2::new(-3.0, 0.0));
        let second = ledges.register(Vec2::new(3.0, 0.0));

        assert_eq!(first, LedgeId(0));
        assert_eq!(second, LedgeId(1));
        let order: Vec<LedgeId> = ledges.iter().map(|(id, _)| id).collect();
        assert_eq!(order, vec![first, second]);
    }

    #[test]
    fn second_claim_on_same_ledge_fails_until_released() {
        let mut ledges = LedgeRegistry::default();
        let id = ledges.register(Vec2::ZERO);

        assert!(ledges.try_claim(id));
        assert!(!ledges.try_claim(id));
        assert_eq!(ledges.occupied_count(), 1);

        ledges.release(id);
        assert!(!ledges.get(id).expect("ledge").occupied);
        assert!(ledges.try_claim(id));
    }

    #[test]
    fn claiming_unknown_ledge_is_rejected() {
        let mut ledges = LedgeRegistry::default();
        assert!(!ledges.try_claim(LedgeId(4)));
        ledges.release(LedgeId(4));
        assert_eq!(ledges.occupied_count(), 0);
    }
}
