//! Face tessellation with a per-triangle face map.
//!
//! Planar faces are ear-clipped from their boundary loops (inner loops
//! become holes); curved faces are sampled on a parametric grid sized from
//! the linear and angular deflection. All vertices of a face share the
//! face's midpoint normal, giving flat shading per face.

use crate::geometry::{Point3d, Surface, Vec3};
use crate::topology::{EntityStore, Face, FaceKey, LoopStep, SurfaceKind};

/// Indexed triangle mesh with one face id per triangle.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    /// [x, y, z, ...] vertex positions.
    pub positions: Vec<f32>,
    /// [nx, ny, nz, ...] vertex normals.
    pub normals: Vec<f32>,
    /// Triangle vertex indices.
    pub indices: Vec<u32>,
    /// Originating face id per triangle.
    pub tri_face: Vec<u32>,
}

impl TriangleMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn add_vertex(&mut self, p: Point3d, n: Vec3) -> u32 {
        let idx = self.vertex_count() as u32;
        self.positions.push(p.x as f32);
        self.positions.push(p.y as f32);
        self.positions.push(p.z as f32);
        self.normals.push(n.x as f32);
        self.normals.push(n.y as f32);
        self.normals.push(n.z as f32);
        idx
    }

    pub fn add_triangle(&mut self, i0: u32, i1: u32, i2: u32, face: u32) {
        self.indices.push(i0);
        self.indices.push(i1);
        self.indices.push(i2);
        self.tri_face.push(face);
    }

    pub fn vertex(&self, i: usize) -> Point3d {
        Point3d::new(
            self.positions[3 * i] as f64,
            self.positions[3 * i + 1] as f64,
            self.positions[3 * i + 2] as f64,
        )
    }

    /// Corner points of triangle `t`.
    pub fn triangle(&self, t: usize) -> [Point3d; 3] {
        let i0 = self.indices[3 * t] as usize;
        let i1 = self.indices[3 * t + 1] as usize;
        let i2 = self.indices[3 * t + 2] as usize;
        [self.vertex(i0), self.vertex(i1), self.vertex(i2)]
    }
}

/// Angular step (radians) that keeps the chord sagitta under `deflection`
/// on a circle of the given radius, further capped by the angular
/// deflection.
pub fn angular_step(radius: f64, linear_deflection: f64, angular_deflection: f64) -> f64 {
    let ratio = (1.0 - linear_deflection / radius.max(1e-9)).clamp(-1.0, 1.0);
    let from_sagitta = 2.0 * ratio.acos();
    let step = from_sagitta.min(angular_deflection.max(1e-3));
    step.clamp(std::f64::consts::TAU / 256.0, std::f64::consts::TAU / 8.0)
}

/// Discretize one loop step into points ordered along the loop direction,
/// excluding the final point (the next step supplies it).
fn step_points(
    store: &EntityStore,
    step: &LoopStep,
    linear_deflection: f64,
    angular_deflection: f64,
) -> Vec<Point3d> {
    let edge = &store.edges[step.edge];
    let mut pts = Vec::new();
    let segments = match &edge.curve {
        crate::geometry::Curve::Line(_) => 1,
        crate::geometry::Curve::Circle(c) => {
            let step_angle = angular_step(c.radius, linear_deflection, angular_deflection);
            ((edge.param_range() / step_angle).ceil() as usize).max(1)
        }
    };
    for i in 0..segments {
        let f = i as f64 / segments as f64;
        let t = if step.forward {
            edge.t_start + f * edge.param_range()
        } else {
            edge.t_end - f * edge.param_range()
        };
        pts.push(edge.curve.evaluate(t));
    }
    pts
}

/// Flat-shaded normal for a face: surface normal at the parametric
/// midpoint, orientation corrected. Zero when undefined.
fn face_flat_normal(face: &Face) -> Vec3 {
    let Some(surface) = &face.geom else {
        return Vec3::ZERO;
    };
    let (u, v) = face.uv_mid();
    match surface.normal_at(u, v).normalized() {
        Some(n) => {
            if face.reversed {
                -n
            } else {
                n
            }
        }
        None => Vec3::ZERO,
    }
}

/// Ear-clip a planar face, treating inner loops as holes.
pub fn tessellate_planar_face(
    store: &EntityStore,
    face: &Face,
    face_id: u32,
    linear_deflection: f64,
    angular_deflection: f64,
    mesh: &mut TriangleMesh,
) {
    let Some(Surface::Plane(plane)) = face.geom.as_ref() else {
        return;
    };
    let normal = face_flat_normal(face);

    let mut coords_2d: Vec<f64> = Vec::new();
    let mut points_3d: Vec<Point3d> = Vec::new();
    let mut hole_starts: Vec<usize> = Vec::new();

    for (li, lp) in face.loops().enumerate() {
        if li > 0 {
            hole_starts.push(points_3d.len());
        }
        for step in &lp.steps {
            for p in step_points(store, step, linear_deflection, angular_deflection) {
                let (u, v) = plane.project(&p);
                coords_2d.push(u);
                coords_2d.push(v);
                points_3d.push(p);
            }
        }
    }

    if points_3d.len() < 3 {
        return;
    }

    let triangles = earcutr::earcut(&coords_2d, &hole_starts, 2).unwrap_or_default();

    let base: Vec<u32> = points_3d.iter().map(|p| mesh.add_vertex(*p, normal)).collect();
    for tri in triangles.chunks_exact(3) {
        mesh.add_triangle(base[tri[0]], base[tri[1]], base[tri[2]], face_id);
    }
}

/// Sample a curved face on a parametric grid over its UV domain.
pub fn tessellate_grid_face(
    face: &Face,
    face_id: u32,
    linear_deflection: f64,
    angular_deflection: f64,
    mesh: &mut TriangleMesh,
) {
    let Some(surface) = face.geom.as_ref() else {
        return;
    };
    let normal = face_flat_normal(face);
    let (u0, u1) = face.u_range;
    let (v0, v1) = face.v_range;

    let (nu, nv) = match surface {
        Surface::Cylinder(c) => {
            let step = angular_step(c.radius, linear_deflection, angular_deflection);
            let nu = (((u1 - u0) / step).ceil() as usize).max(1);
            // Keep grid cells roughly square along the axis.
            let cell = (c.radius * step).max(1e-6);
            let nv = (((v1 - v0).abs() / cell).ceil() as usize).clamp(1, 256);
            (nu, nv)
        }
        Surface::Cone(c) => {
            let r = (v1.abs().max(v0.abs()) * c.half_angle.tan()).max(1e-3);
            let step = angular_step(r, linear_deflection, angular_deflection);
            let nu = (((u1 - u0) / step).ceil() as usize).max(1);
            let cell = (r * step).max(1e-6);
            let nv = (((v1 - v0).abs() / cell).ceil() as usize).clamp(1, 256);
            (nu, nv)
        }
        Surface::Sphere(s) => {
            let step = angular_step(s.radius, linear_deflection, angular_deflection);
            (
                (((u1 - u0) / step).ceil() as usize).max(1),
                (((v1 - v0) / step).ceil() as usize).max(1),
            )
        }
        Surface::Torus(t) => {
            let major_step =
                angular_step(t.major_radius + t.minor_radius, linear_deflection, angular_deflection);
            let minor_step = angular_step(t.minor_radius, linear_deflection, angular_deflection);
            (
                (((u1 - u0) / major_step).ceil() as usize).max(1),
                (((v1 - v0) / minor_step).ceil() as usize).max(1),
            )
        }
        Surface::Plane(_) => (1, 1),
    };

    let mut grid = vec![0u32; (nu + 1) * (nv + 1)];
    for i in 0..=nu {
        let u = u0 + (u1 - u0) * i as f64 / nu as f64;
        for j in 0..=nv {
            let v = v0 + (v1 - v0) * j as f64 / nv as f64;
            grid[i * (nv + 1) + j] = mesh.add_vertex(surface.evaluate(u, v), normal);
        }
    }
    for i in 0..nu {
        for j in 0..nv {
            let i00 = grid[i * (nv + 1) + j];
            let i10 = grid[(i + 1) * (nv + 1) + j];
            let i01 = grid[i * (nv + 1) + j + 1];
            let i11 = grid[(i + 1) * (nv + 1) + j + 1];
            mesh.add_triangle(i00, i10, i11, face_id);
            mesh.add_triangle(i00, i11, i01, face_id);
        }
    }
}

/// Triangulate one face into `mesh`, routing by surface kind.
pub fn tessellate_face(
    store: &EntityStore,
    key: FaceKey,
    face_id: u32,
    linear_deflection: f64,
    angular_deflection: f64,
    mesh: &mut TriangleMesh,
) {
    let face = &store.faces[key];
    match face.kind {
        SurfaceKind::Plane => {
            tessellate_planar_face(store, face, face_id, linear_deflection, angular_deflection, mesh)
        }
        _ => tessellate_grid_face(face, face_id, linear_deflection, angular_deflection, mesh),
    }
}
