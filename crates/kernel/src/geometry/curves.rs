use serde::{Deserialize, Serialize};

use super::point::Point3d;
use super::vector::Vec3;

/// Analytic curve carried by an edge. Parameters are arc length for lines
/// and radians for circles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Curve {
    Line(Line3d),
    Circle(Circle3d),
}

impl Curve {
    pub fn evaluate(&self, t: f64) -> Point3d {
        match self {
            Curve::Line(l) => l.evaluate(t),
            Curve::Circle(c) => c.evaluate(t),
        }
    }

    pub fn derivative(&self, t: f64) -> Vec3 {
        match self {
            Curve::Line(l) => l.direction,
            Curve::Circle(c) => c.derivative(t),
        }
    }

    pub fn is_circle(&self) -> bool {
        matches!(self, Curve::Circle(_))
    }

    pub fn is_line(&self) -> bool {
        matches!(self, Curve::Line(_))
    }
}

/// A line through `origin` with unit `direction`; parameter is distance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Line3d {
    pub origin: Point3d,
    pub direction: Vec3,
}

impl Line3d {
    pub fn new(origin: Point3d, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    pub fn from_points(a: Point3d, b: Point3d) -> Self {
        Self::new(a, b - a)
    }

    pub fn evaluate(&self, t: f64) -> Point3d {
        self.origin + self.direction * t
    }

    /// Perpendicular distance from a point to the infinite line.
    pub fn distance_to_point(&self, p: &Point3d) -> f64 {
        let v = *p - self.origin;
        (v - self.direction * v.dot(&self.direction)).length()
    }
}

/// A circle in 3D; parameter is the angle from `x_axis` about `normal`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Circle3d {
    pub center: Point3d,
    pub normal: Vec3,
    pub x_axis: Vec3,
    pub radius: f64,
}

impl Circle3d {
    pub fn new(center: Point3d, normal: Vec3, radius: f64) -> Self {
        let normal = normal.normalize();
        Self {
            center,
            normal,
            x_axis: normal.any_perpendicular(),
            radius,
        }
    }

    pub fn with_x_axis(center: Point3d, normal: Vec3, x_axis: Vec3, radius: f64) -> Self {
        Self {
            center,
            normal: normal.normalize(),
            x_axis: x_axis.normalize(),
            radius,
        }
    }

    fn y_axis(&self) -> Vec3 {
        self.normal.cross(&self.x_axis)
    }

    pub fn evaluate(&self, t: f64) -> Point3d {
        let y = self.y_axis();
        self.center + self.x_axis * (self.radius * t.cos()) + y * (self.radius * t.sin())
    }

    pub fn derivative(&self, t: f64) -> Vec3 {
        let y = self.y_axis();
        self.x_axis * (-self.radius * t.sin()) + y * (self.radius * t.cos())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_line_distance() {
        let l = Line3d::new(Point3d::ORIGIN, Vec3::Z);
        assert!((l.distance_to_point(&Point3d::new(3.0, 4.0, 7.0)) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_circle_evaluate() {
        let c = Circle3d::with_x_axis(Point3d::ORIGIN, Vec3::Z, Vec3::X, 2.0);
        let p = c.evaluate(FRAC_PI_2);
        assert!(p.x.abs() < 1e-12);
        assert!((p.y - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_circle_tangent_is_perpendicular_to_radius() {
        let c = Circle3d::with_x_axis(Point3d::ORIGIN, Vec3::Z, Vec3::X, 5.0);
        for t in [0.0, 0.7, PI, 4.2] {
            let r = c.evaluate(t) - c.center;
            assert!(r.dot(&c.derivative(t)).abs() < 1e-9);
        }
    }
}
