use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

pub const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };
    pub const LEFT: Vec2 = Vec2 { x: -1.0, y: 0.0 };
    pub const RIGHT: Vec2 = Vec2 { x: 1.0, y: 0.0 };
    pub const UP: Vec2 = Vec2 { x: 0.0, y: 1.0 };
    pub const DOWN: Vec2 = Vec2 { x: 0.0, y: -1.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn scale(self, factor: f64) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn magnitude(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Zero-length input yields `Vec2::ZERO` instead of NaN components.
    pub fn unit(self) -> Self {
        let magnitude = self.magnitude();
        if magnitude <= EPSILON {
            return Self::ZERO;
        }
        self.scale(magnitude.recip())
    }

    pub fn with_x(self, x: f64) -> Self {
        Self { x, y: self.y }
    }

    pub fn with_y(self, y: f64) -> Self {
        Self { x: self.x, y }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;

    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f64) -> Vec2 {
        self.scale(rhs)
    }
}

/// Axis-aligned box. Corners are normalised on construction so `min <= max`
/// holds componentwise for every instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "AabbCorners")]
pub struct Aabb {
    min: Vec2,
    max: Vec2,
}

#[derive(Deserialize)]
struct AabbCorners {
    min: Vec2,
    max: Vec2,
}

impl From<AabbCorners> for Aabb {
    fn from(corners: AabbCorners) -> Self {
        Aabb::from_corners(corners.min, corners.max)
    }
}

impl Aabb {
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            min: Vec2::new(a.x.min(b.x), a.y.min(b.y)),
            max: Vec2::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    pub fn min(&self) -> Vec2 {
        self.min
    }

    pub fn max(&self) -> Vec2 {
        self.max
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max).scale(0.5)
    }

    pub fn half_extents(&self) -> Vec2 {
        (self.max - self.min).scale(0.5)
    }

    pub fn offset_by(&self, position: Vec2) -> Self {
        Self {
            min: self.min + position,
            max: self.max + position,
        }
    }

    /// Separating-axis test on open intervals: boxes that only share an edge
    /// do not intersect.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Clips the segment against the box slabs. A segment lying along an edge
    /// or touching a single corner does not count.
    pub fn intersects_segment(&self, segment: &Segment) -> bool {
        let d = segment.b - segment.a;
        let slabs = [
            (-d.x, segment.a.x - self.min.x),
            (d.x, self.max.x - segment.a.x),
            (-d.y, segment.a.y - self.min.y),
            (d.y, self.max.y - segment.a.y),
        ];

        let mut t_enter = 0.0f64;
        let mut t_exit = 1.0f64;
        for (p, q) in slabs {
            if p == 0.0 {
                if q <= 0.0 {
                    return false;
                }
                continue;
            }
            let t = q / p;
            if p < 0.0 {
                if t >= t_exit {
                    return false;
                }
                t_enter = t_enter.max(t);
            } else {
                if t <= t_enter {
                    return false;
                }
                t_exit = t_exit.min(t);
            }
        }

        t_enter < t_exit
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub a: Vec2,
    pub b: Vec2,
}

impl Segment {
    pub const fn new(a: Vec2, b: Vec2) -> Self {
        Self { a, b }
    }

    pub fn length(&self) -> f64 {
        (self.b - self.a).magnitude()
    }

    pub fn midpoint(&self) -> Vec2 {
        (self.a + self.b).scale(0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Aabb {
        Aabb::from_corners(Vec2::new(-1.0, -1.0), Vec2::new(1.0, 1.0))
    }

    #[test]
    fn unit_of_zero_vector_is_zero() {
        let unit = Vec2::ZERO.unit();
        assert_eq!(unit, Vec2::ZERO);
        assert!(unit.is_finite());
    }

    #[test]
    fn unit_has_magnitude_one() {
        let unit = Vec2::new(3.0, -4.0).unit();
        assert!((unit.magnitude() - 1.0).abs() < 1e-12);
        assert!((unit.x - 0.6).abs() < 1e-12);
    }

    #[test]
    fn operators_match_named_methods() {
        let a = Vec2::new(1.5, -2.0);
        let b = Vec2::new(0.5, 4.0);
        assert_eq!(a + b, Vec2::new(2.0, 2.0));
        assert_eq!(a - b, Vec2::new(1.0, -6.0));
        assert_eq!(-a, Vec2::new(-1.5, 2.0));
        assert_eq!(a * 2.0, a.scale(2.0));
        assert_eq!(a.dot(b), 0.75 - 8.0);
    }

    #[test]
    fn from_corners_normalises_min_and_max() {
        let aabb = Aabb::from_corners(Vec2::new(5.0, -2.0), Vec2::new(-3.0, 7.0));
        assert_eq!(aabb.min(), Vec2::new(-3.0, -2.0));
        assert_eq!(aabb.max(), Vec2::new(5.0, 7.0));
        assert_eq!(aabb.center(), Vec2::new(1.0, 2.5));
        assert_eq!(aabb.half_extents(), Vec2::new(4.0, 4.5));
    }

    #[test]
    fn offset_by_translates_both_corners() {
        let moved = unit_box().offset_by(Vec2::new(10.0, -5.0));
        assert_eq!(moved.min(), Vec2::new(9.0, -6.0));
        assert_eq!(moved.max(), Vec2::new(11.0, -4.0));
    }

    #[test]
    fn boxes_sharing_an_edge_do_not_intersect() {
        let left = unit_box();
        let right = unit_box().offset_by(Vec2::new(2.0, 0.0));
        assert!(!left.intersects(&right));

        let overlapping = unit_box().offset_by(Vec2::new(1.99, 0.0));
        assert!(left.intersects(&overlapping));
        assert!(overlapping.intersects(&left));
    }

    #[test]
    fn contains_is_inclusive_of_edges() {
        let aabb = unit_box();
        assert!(aabb.contains(Vec2::new(1.0, 1.0)));
        assert!(aabb.contains(Vec2::ZERO));
        assert!(!aabb.contains(Vec2::new(1.01, 0.0)));
    }

    #[test]
    fn horizontal_segment_through_box_intersects() {
        let segment = Segment::new(Vec2::new(-5.0, 0.5), Vec2::new(5.0, 0.5));
        assert!(unit_box().intersects_segment(&segment));
    }

    #[test]
    fn segment_on_box_edge_does_not_intersect() {
        let along_top = Segment::new(Vec2::new(-5.0, 1.0), Vec2::new(5.0, 1.0));
        assert!(!unit_box().intersects_segment(&along_top));
    }

    #[test]
    fn segment_outside_box_does_not_intersect() {
        let above = Segment::new(Vec2::new(-5.0, 1.5), Vec2::new(5.0, 1.5));
        let beside = Segment::new(Vec2::new(2.0, -5.0), Vec2::new(2.0, 5.0));
        let short = Segment::new(Vec2::new(-5.0, 0.0), Vec2::new(-1.5, 0.0));
        assert!(!unit_box().intersects_segment(&above));
        assert!(!unit_box().intersects_segment(&beside));
        assert!(!unit_box().intersects_segment(&short));
    }

    #[test]
    fn segment_with_endpoint_inside_intersects() {
        let poking = Segment::new(Vec2::new(-5.0, 0.0), Vec2::new(0.0, 0.0));
        assert!(unit_box().intersects_segment(&poking));
    }

    #[test]
    fn diagonal_segment_crossing_corner_region_intersects() {
        let diagonal = Segment::new(Vec2::new(-1.5, 0.0), Vec2::new(0.0, 1.5));
        assert!(unit_box().intersects_segment(&diagonal));

        let corner_touch = Segment::new(Vec2::new(-2.0, 0.0), Vec2::new(0.0, 2.0));
        assert!(!unit_box().intersects_segment(&corner_touch));

        let miss = Segment::new(Vec2::new(-3.0, 0.0), Vec2::new(0.0, 3.0));
        assert!(!unit_box().intersects_segment(&miss));
    }

    #[test]
    fn degenerate_segment_strictly_inside_intersects() {
        let point = Segment::new(Vec2::new(0.2, 0.2), Vec2::new(0.2, 0.2));
        assert!(unit_box().intersects_segment(&point));
        let on_edge = Segment::new(Vec2::new(1.0, 0.0), Vec2::new(1.0, 0.0));
        assert!(!unit_box().intersects_segment(&on_edge));
    }

    #[test]
    fn segment_length_and_midpoint() {
        let segment = Segment::new(Vec2::new(0.0, 0.0), Vec2::new(6.0, 8.0));
        assert_eq!(segment.length(), 10.0);
        assert_eq!(segment.midpoint(), Vec2::new(3.0, 4.0));
    }
}
