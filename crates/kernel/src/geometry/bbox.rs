use serde::{Deserialize, Serialize};

use super::point::Point3d;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point3d,
    pub max: Point3d,
}

impl BoundingBox {
    /// An inverted box that absorbs the first point added to it.
    pub fn empty() -> Self {
        Self {
            min: Point3d::new(f64::MAX, f64::MAX, f64::MAX),
            max: Point3d::new(f64::MIN, f64::MIN, f64::MIN),
        }
    }

    pub fn new(min: Point3d, max: Point3d) -> Self {
        Self { min, max }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x
    }

    pub fn add_point(&mut self, p: Point3d) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    pub fn merge(&mut self, other: &BoundingBox) {
        if other.is_empty() {
            return;
        }
        self.add_point(other.min);
        self.add_point(other.max);
    }

    pub fn extents(&self) -> [f64; 3] {
        [
            self.max.x - self.min.x,
            self.max.y - self.min.y,
            self.max.z - self.min.z,
        ]
    }

    pub fn max_extent(&self) -> f64 {
        let e = self.extents();
        e[0].max(e[1]).max(e[2])
    }

    pub fn center(&self) -> Point3d {
        self.min.midpoint(&self.max)
    }

    /// Box grown by `pad` on every side.
    pub fn padded(&self, pad: f64) -> Self {
        Self {
            min: Point3d::new(self.min.x - pad, self.min.y - pad, self.min.z - pad),
            max: Point3d::new(self.max.x + pad, self.max.y + pad, self.max.z + pad),
        }
    }

    /// Gap between two boxes, zero when they overlap.
    pub fn distance_to(&self, other: &BoundingBox) -> f64 {
        let dx = (self.min.x - other.max.x).max(other.min.x - self.max.x).max(0.0);
        let dy = (self.min.y - other.max.y).max(other.min.y - self.max.y).max(0.0);
        let dz = (self.min.z - other.max.z).max(other.min.z - self.max.z).max(0.0);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_extents() {
        let mut bb = BoundingBox::empty();
        bb.add_point(Point3d::new(-1.0, 0.0, 2.0));
        bb.add_point(Point3d::new(3.0, 5.0, 2.5));
        assert_eq!(bb.extents(), [4.0, 5.0, 0.5]);
        assert!((bb.max_extent() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_distance_between_boxes() {
        let a = BoundingBox::new(Point3d::ORIGIN, Point3d::new(1.0, 1.0, 1.0));
        let b = BoundingBox::new(Point3d::new(4.0, 0.0, 0.0), Point3d::new(5.0, 1.0, 1.0));
        assert!((a.distance_to(&b) - 3.0).abs() < 1e-12);
        let c = BoundingBox::new(Point3d::new(0.5, 0.5, 0.5), Point3d::new(2.0, 2.0, 2.0));
        assert_eq!(a.distance_to(&c), 0.0);
    }
}
