use serde::{Deserialize, Serialize};

use super::point::Point3d;
use super::vector::Vec3;

const TAU: f64 = std::f64::consts::TAU;

/// Analytic surface types the kernel evaluates directly.
///
/// Faces backed by free-form geometry classify as `SurfaceKind::Bspline` or
/// `SurfaceKind::Other` and carry no `Surface` record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Surface {
    Plane(Plane),
    Cylinder(Cylinder),
    Cone(Cone),
    Sphere(Sphere),
    Torus(Torus),
}

impl Surface {
    pub fn evaluate(&self, u: f64, v: f64) -> Point3d {
        match self {
            Surface::Plane(s) => s.evaluate(u, v),
            Surface::Cylinder(s) => s.evaluate(u, v),
            Surface::Cone(s) => s.evaluate(u, v),
            Surface::Sphere(s) => s.evaluate(u, v),
            Surface::Torus(s) => s.evaluate(u, v),
        }
    }

    /// Surface normal at (u, v), before any face-orientation correction.
    pub fn normal_at(&self, u: f64, v: f64) -> Vec3 {
        match self {
            Surface::Plane(s) => s.normal,
            Surface::Cylinder(s) => s.normal_at(u),
            Surface::Cone(s) => s.normal_at(u),
            Surface::Sphere(s) => s.normal_at(u, v),
            Surface::Torus(s) => s.normal_at(u, v),
        }
    }

    /// Closest-parameter inverse evaluation.
    pub fn project(&self, p: &Point3d) -> (f64, f64) {
        match self {
            Surface::Plane(s) => s.project(p),
            Surface::Cylinder(s) => s.project(p),
            Surface::Cone(s) => s.project(p),
            Surface::Sphere(s) => s.project(p),
            Surface::Torus(s) => s.project(p),
        }
    }
}

/// Wrap an angle into [0, 2*PI).
fn wrap_angle(a: f64) -> f64 {
    let r = a % TAU;
    if r < 0.0 {
        r + TAU
    } else {
        r
    }
}

/// An infinite plane with an in-plane frame; u along `u_axis`, v along
/// `v_axis`, both in length units.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Plane {
    pub origin: Point3d,
    pub normal: Vec3,
    pub u_axis: Vec3,
    pub v_axis: Vec3,
}

impl Plane {
    pub fn new(origin: Point3d, normal: Vec3) -> Self {
        let normal = normal.normalize();
        let u_axis = normal.any_perpendicular();
        let v_axis = normal.cross(&u_axis);
        Self { origin, normal, u_axis, v_axis }
    }

    pub fn with_axes(origin: Point3d, normal: Vec3, u_axis: Vec3) -> Self {
        let normal = normal.normalize();
        let u_axis = u_axis.normalize();
        let v_axis = normal.cross(&u_axis);
        Self { origin, normal, u_axis, v_axis }
    }

    pub fn evaluate(&self, u: f64, v: f64) -> Point3d {
        self.origin + self.u_axis * u + self.v_axis * v
    }

    pub fn project(&self, p: &Point3d) -> (f64, f64) {
        let d = *p - self.origin;
        (d.dot(&self.u_axis), d.dot(&self.v_axis))
    }

    /// Signed distance, positive on the normal side.
    pub fn signed_distance(&self, p: &Point3d) -> f64 {
        (*p - self.origin).dot(&self.normal)
    }
}

/// A cylinder; u is the angle about the axis, v the height along it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Cylinder {
    pub origin: Point3d,
    pub axis: Vec3,
    pub ref_dir: Vec3,
    pub radius: f64,
}

impl Cylinder {
    pub fn new(origin: Point3d, axis: Vec3, radius: f64) -> Self {
        let axis = axis.normalize();
        Self {
            origin,
            axis,
            ref_dir: axis.any_perpendicular(),
            radius,
        }
    }

    fn y_dir(&self) -> Vec3 {
        self.axis.cross(&self.ref_dir)
    }

    pub fn evaluate(&self, u: f64, v: f64) -> Point3d {
        self.origin
            + self.ref_dir * (self.radius * u.cos())
            + self.y_dir() * (self.radius * u.sin())
            + self.axis * v
    }

    pub fn normal_at(&self, u: f64) -> Vec3 {
        self.ref_dir * u.cos() + self.y_dir() * u.sin()
    }

    pub fn project(&self, p: &Point3d) -> (f64, f64) {
        let d = *p - self.origin;
        let v = d.dot(&self.axis);
        let radial = d - self.axis * v;
        let u = radial.dot(&self.y_dir()).atan2(radial.dot(&self.ref_dir));
        (wrap_angle(u), v)
    }

    /// Perpendicular distance from a point to the axis line.
    pub fn axis_distance(&self, p: &Point3d) -> f64 {
        let d = *p - self.origin;
        (d - self.axis * d.dot(&self.axis)).length()
    }
}

/// A cone; u is the angle about the axis, v the distance from apex along it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Cone {
    pub apex: Point3d,
    pub axis: Vec3,
    pub ref_dir: Vec3,
    pub half_angle: f64,
}

impl Cone {
    pub fn new(apex: Point3d, axis: Vec3, half_angle: f64) -> Self {
        let axis = axis.normalize();
        Self {
            apex,
            axis,
            ref_dir: axis.any_perpendicular(),
            half_angle,
        }
    }

    fn y_dir(&self) -> Vec3 {
        self.axis.cross(&self.ref_dir)
    }

    pub fn evaluate(&self, u: f64, v: f64) -> Point3d {
        let r = v * self.half_angle.tan();
        self.apex + self.axis * v + self.ref_dir * (r * u.cos()) + self.y_dir() * (r * u.sin())
    }

    pub fn normal_at(&self, u: f64) -> Vec3 {
        let radial = self.ref_dir * u.cos() + self.y_dir() * u.sin();
        (radial * self.half_angle.cos() - self.axis * self.half_angle.sin()).normalize()
    }

    pub fn project(&self, p: &Point3d) -> (f64, f64) {
        let d = *p - self.apex;
        let v = d.dot(&self.axis);
        let radial = d - self.axis * v;
        let u = radial.dot(&self.y_dir()).atan2(radial.dot(&self.ref_dir));
        (wrap_angle(u), v)
    }
}

/// A sphere; u is longitude, v latitude in [-PI/2, PI/2].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Sphere {
    pub center: Point3d,
    pub radius: f64,
}

impl Sphere {
    pub fn new(center: Point3d, radius: f64) -> Self {
        Self { center, radius }
    }

    pub fn evaluate(&self, u: f64, v: f64) -> Point3d {
        let cv = v.cos();
        Point3d::new(
            self.center.x + self.radius * cv * u.cos(),
            self.center.y + self.radius * cv * u.sin(),
            self.center.z + self.radius * v.sin(),
        )
    }

    pub fn normal_at(&self, u: f64, v: f64) -> Vec3 {
        (self.evaluate(u, v) - self.center).normalize()
    }

    pub fn project(&self, p: &Point3d) -> (f64, f64) {
        let d = *p - self.center;
        let u = d.y.atan2(d.x);
        let v = (d.z / d.length().max(1e-12)).clamp(-1.0, 1.0).asin();
        (wrap_angle(u), v)
    }
}

/// A torus; u is the angle about the main axis, v the angle around the tube.
/// v = 0 points away from the axis, v = PI/2 along the axis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Torus {
    pub center: Point3d,
    pub axis: Vec3,
    pub ref_dir: Vec3,
    pub major_radius: f64,
    pub minor_radius: f64,
}

impl Torus {
    pub fn new(center: Point3d, axis: Vec3, major_radius: f64, minor_radius: f64) -> Self {
        let axis = axis.normalize();
        Self {
            center,
            axis,
            ref_dir: axis.any_perpendicular(),
            major_radius,
            minor_radius,
        }
    }

    fn y_dir(&self) -> Vec3 {
        self.axis.cross(&self.ref_dir)
    }

    fn radial(&self, u: f64) -> Vec3 {
        self.ref_dir * u.cos() + self.y_dir() * u.sin()
    }

    pub fn evaluate(&self, u: f64, v: f64) -> Point3d {
        let radial = self.radial(u);
        self.center
            + radial * (self.major_radius + self.minor_radius * v.cos())
            + self.axis * (self.minor_radius * v.sin())
    }

    pub fn normal_at(&self, u: f64, v: f64) -> Vec3 {
        self.radial(u) * v.cos() + self.axis * v.sin()
    }

    pub fn project(&self, p: &Point3d) -> (f64, f64) {
        let d = *p - self.center;
        let h = d.dot(&self.axis);
        let radial = d - self.axis * h;
        let u = radial.dot(&self.y_dir()).atan2(radial.dot(&self.ref_dir));
        let rho = radial.length() - self.major_radius;
        let v = h.atan2(rho);
        (wrap_angle(u), wrap_angle(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_plane_project_roundtrip() {
        let pl = Plane::with_axes(Point3d::new(1.0, 2.0, 3.0), Vec3::Z, Vec3::X);
        let (u, v) = pl.project(&Point3d::new(4.0, 7.0, 3.0));
        assert!((u - 3.0).abs() < 1e-12);
        assert!((v - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_cylinder_project_roundtrip() {
        let cy = Cylinder::new(Point3d::ORIGIN, Vec3::Z, 5.0);
        for (u, v) in [(0.3, 1.0), (2.0, -4.0), (5.5, 0.0)] {
            let p = cy.evaluate(u, v);
            let (pu, pv) = cy.project(&p);
            assert!((pu - u).abs() < 1e-9, "u {} vs {}", pu, u);
            assert!((pv - v).abs() < 1e-9);
        }
    }

    #[test]
    fn test_cylinder_normal_points_outward() {
        let cy = Cylinder::new(Point3d::ORIGIN, Vec3::Z, 2.0);
        let n = cy.normal_at(0.0);
        let p = cy.evaluate(0.0, 0.0);
        assert!((p + n).to_vec3().length() > p.to_vec3().length());
    }

    #[test]
    fn test_torus_evaluate_extremes() {
        let to = Torus::new(Point3d::ORIGIN, Vec3::Z, 10.0, 2.0);
        // v = 0: outer equator at major + minor radius.
        let outer = to.evaluate(0.0, 0.0);
        assert!((outer.to_vec3().length() - 12.0).abs() < 1e-12);
        // v = PI: inner equator.
        let inner = to.evaluate(0.0, PI);
        assert!((inner.to_vec3().length() - 8.0).abs() < 1e-12);
        // v = PI/2: top of tube.
        let top = to.evaluate(0.0, FRAC_PI_2);
        assert!((top.z - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_torus_project_roundtrip() {
        let to = Torus::new(Point3d::new(0.0, 0.0, 5.0), Vec3::Z, 8.0, 1.5);
        for (u, v) in [(0.5, 1.0), (3.0, 2.5), (6.0, 4.5)] {
            let p = to.evaluate(u, v);
            let (pu, pv) = to.project(&p);
            assert!((pu - u).abs() < 1e-9);
            assert!((pv - v).abs() < 1e-9);
        }
    }
}
