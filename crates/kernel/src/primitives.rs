//! Deterministic synthetic solids.
//!
//! These builders double as test doubles and demo shapes: boxes, plates
//! with (filleted / counterbored) holes, pocketed blocks, and extruded
//! profiles. Loop orientation is load-bearing: outer loops run
//! counter-clockwise seen from the outward normal, inner loops clockwise,
//! and every face records the sense in which it traverses each edge. The
//! dihedral computation derives its sign from those senses.
//!
//! Rim circles are emitted as pairs of semicircular arcs and fillet seams
//! as quarter arcs, the way closed faces arrive from STEP processors.

use std::collections::HashMap;
use std::f64::consts::{FRAC_PI_2, PI, TAU};

use crate::geometry::{Circle3d, Curve, Cylinder, Line3d, Plane, Point3d, Surface, Torus, Vec3};
use crate::shape::Shape;
use crate::topology::{
    BoundaryLoop, Edge, EdgeKey, EntityStore, Face, LoopStep, ShellKey, SurfaceKind, VertexKey,
};

/// Incremental solid assembler with vertex/edge deduplication.
struct ShapeBuilder {
    store: EntityStore,
    shell: ShellKey,
    vertex_lookup: HashMap<[i64; 3], VertexKey>,
    line_lookup: HashMap<(VertexKey, VertexKey), EdgeKey>,
    arc_lookup: HashMap<(VertexKey, VertexKey, [i64; 3]), EdgeKey>,
}

fn quantize(p: &Point3d) -> [i64; 3] {
    [
        (p.x * 1e6).round() as i64,
        (p.y * 1e6).round() as i64,
        (p.z * 1e6).round() as i64,
    ]
}

impl ShapeBuilder {
    fn new() -> Self {
        let mut store = EntityStore::new();
        let shell = store.add_shell();
        Self {
            store,
            shell,
            vertex_lookup: HashMap::new(),
            line_lookup: HashMap::new(),
            arc_lookup: HashMap::new(),
        }
    }

    fn vertex(&mut self, p: Point3d) -> VertexKey {
        let key = quantize(&p);
        if let Some(&v) = self.vertex_lookup.get(&key) {
            return v;
        }
        let v = self.store.add_vertex(p);
        self.vertex_lookup.insert(key, v);
        v
    }

    /// Line edge between two vertices, walked a -> b. Returns the step
    /// with the correct sense for the stored edge.
    fn line(&mut self, a: VertexKey, b: VertexKey) -> LoopStep {
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        if let Some(&edge) = self.line_lookup.get(&(lo, hi)) {
            let forward = self.store.edges[edge].start == a;
            return LoopStep { edge, forward };
        }
        let pa = self.store.vertices[a].point;
        let pb = self.store.vertices[b].point;
        let edge = self.store.add_edge(Edge {
            curve: Curve::Line(Line3d::from_points(pa, pb)),
            t_start: 0.0,
            t_end: pa.distance_to(&pb),
            start: a,
            end: b,
        });
        self.line_lookup.insert((lo, hi), edge);
        LoopStep { edge, forward: true }
    }

    /// Circular arc walked from the point at `t0` to the point at `t1`
    /// (increasing parameter). `forward=false` on the returned step means
    /// the caller wants to traverse it the other way.
    fn arc(&mut self, circle: Circle3d, t0: f64, t1: f64, walk_forward: bool) -> LoopStep {
        let a = self.vertex(circle.evaluate(t0));
        let b = self.vertex(circle.evaluate(t1));
        let mid = circle.evaluate((t0 + t1) * 0.5);
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let key = (lo, hi, quantize(&mid));
        let edge = match self.arc_lookup.get(&key) {
            Some(&edge) => edge,
            None => {
                let edge = self.store.add_edge(Edge {
                    curve: Curve::Circle(circle),
                    t_start: t0,
                    t_end: t1,
                    start: a,
                    end: b,
                });
                self.arc_lookup.insert(key, edge);
                edge
            }
        };
        LoopStep { edge, forward: walk_forward }
    }

    fn add_face(&mut self, face: Face) {
        let key = self.store.add_face(face);
        self.store.push_face(self.shell, key);
    }

    /// Planar face from corner points listed counter-clockwise as seen
    /// from the outward normal, with optional pre-built inner loops.
    fn polygon_face(&mut self, corners: &[Point3d], normal: Vec3, inners: Vec<BoundaryLoop>) {
        let verts: Vec<VertexKey> = corners.iter().map(|p| self.vertex(*p)).collect();
        let mut steps = Vec::with_capacity(verts.len());
        for i in 0..verts.len() {
            let a = verts[i];
            let b = verts[(i + 1) % verts.len()];
            steps.push(self.line(a, b));
        }
        let plane = Plane::with_axes(corners[0], normal, corners[1] - corners[0]);
        let mut u_range = (f64::MAX, f64::MIN);
        let mut v_range = (f64::MAX, f64::MIN);
        for p in corners {
            let (u, v) = plane.project(p);
            u_range = (u_range.0.min(u), u_range.1.max(u));
            v_range = (v_range.0.min(v), v_range.1.max(v));
        }
        self.add_face(Face {
            kind: SurfaceKind::Plane,
            geom: Some(Surface::Plane(plane)),
            u_range,
            v_range,
            outer: BoundaryLoop { steps },
            inners,
            reversed: false,
        });
    }

    /// A rim circle as two semicircular arcs. `ccw=true` walks the rim
    /// with increasing angle.
    fn rim_loop(&mut self, circle: Circle3d, ccw: bool) -> BoundaryLoop {
        let first = self.arc(circle, 0.0, PI, ccw);
        let second = self.arc(circle, PI, TAU, ccw);
        let steps = if ccw { vec![first, second] } else { vec![second, first] };
        BoundaryLoop { steps }
    }

    fn finish(self) -> Shape {
        Shape::from_store(self.store)
    }
}

/// Horizontal circle around the +Z axis with the frame used by every
/// vertical-hole builder (u = 0 along +X).
fn z_circle(cx: f64, cy: f64, z: f64, r: f64) -> Circle3d {
    Circle3d::with_x_axis(Point3d::new(cx, cy, z), Vec3::Z, Vec3::X, r)
}

fn vertical_cylinder(cx: f64, cy: f64, r: f64) -> Cylinder {
    Cylinder {
        origin: Point3d::new(cx, cy, 0.0),
        axis: Vec3::Z,
        ref_dir: Vec3::X,
        radius: r,
    }
}

/// Right prism from a profile polygon in the XZ plane, extruded along +Y.
/// The profile must wind counter-clockwise in (x, z).
pub fn extrude_polygon(profile: &[(f64, f64)], y0: f64, y1: f64) -> Shape {
    let mut b = ShapeBuilder::new();
    let n = profile.len();

    let at = |i: usize, y: f64| {
        let (x, z) = profile[i % n];
        Point3d::new(x, y, z)
    };

    // Cap at y0 faces -Y: profile order is counter-clockwise from there.
    let cap0: Vec<Point3d> = (0..n).map(|i| at(i, y0)).collect();
    b.polygon_face(&cap0, -Vec3::Y, Vec::new());
    let cap1: Vec<Point3d> = (0..n).rev().map(|i| at(i, y1)).collect();
    b.polygon_face(&cap1, Vec3::Y, Vec::new());

    for i in 0..n {
        let (x0, z0) = profile[i];
        let (x1, z1) = profile[(i + 1) % n];
        let (dx, dz) = (x1 - x0, z1 - z0);
        let len = (dx * dx + dz * dz).sqrt();
        if len < 1e-12 {
            continue;
        }
        let normal = Vec3::new(dz / len, 0.0, -dx / len);
        let corners = [at(i, y0), at(i, y1), at(i + 1, y1), at(i + 1, y0)];
        b.polygon_face(&corners, normal, Vec::new());
    }

    b.finish()
}

/// Axis-aligned box spanning [0,dx] x [0,dy] x [0,dz].
pub fn make_box(dx: f64, dy: f64, dz: f64) -> Shape {
    extrude_polygon(&[(0.0, 0.0), (dx, 0.0), (dx, dz), (0.0, dz)], 0.0, dy)
}

/// Rectangular plate with a circular through hole along Z.
/// Produces 7 faces: bottom, top, four sides, and one cylindrical wall.
pub fn plate_with_hole(w: f64, d: f64, t: f64, r: f64, cx: f64, cy: f64) -> Shape {
    let mut b = ShapeBuilder::new();

    let p = |x: f64, y: f64, z: f64| Point3d::new(x, y, z);

    // Bottom (z=0, outward -Z): inner rim is clockwise seen from below,
    // i.e. counter-clockwise in increasing angle.
    let bottom_rim = z_circle(cx, cy, 0.0, r);
    let bottom_inner = b.rim_loop(bottom_rim, true);
    b.polygon_face(
        &[p(0.0, 0.0, 0.0), p(0.0, d, 0.0), p(w, d, 0.0), p(w, 0.0, 0.0)],
        -Vec3::Z,
        vec![bottom_inner],
    );

    // Top (z=t, outward +Z): inner rim clockwise seen from above.
    let top_rim = z_circle(cx, cy, t, r);
    let top_inner = b.rim_loop(top_rim, false);
    b.polygon_face(
        &[p(0.0, 0.0, t), p(w, 0.0, t), p(w, d, t), p(0.0, d, t)],
        Vec3::Z,
        vec![top_inner],
    );

    add_box_sides(&mut b, w, d, 0.0, t);
    add_hole_wall(&mut b, cx, cy, r, 0.0, t);

    b.finish()
}

/// Plate with a through hole whose top rim carries a toroidal fillet.
/// Produces 8 faces: bottom, top, four sides, cylinder, torus.
pub fn plate_with_filleted_hole(
    w: f64,
    d: f64,
    t: f64,
    r: f64,
    fillet_r: f64,
    cx: f64,
    cy: f64,
) -> Shape {
    let mut b = ShapeBuilder::new();
    let p = |x: f64, y: f64, z: f64| Point3d::new(x, y, z);
    let big_r = r + fillet_r;
    let z_ring = t - fillet_r;

    let bottom_rim = z_circle(cx, cy, 0.0, r);
    let bottom_inner = b.rim_loop(bottom_rim, true);
    b.polygon_face(
        &[p(0.0, 0.0, 0.0), p(0.0, d, 0.0), p(w, d, 0.0), p(w, 0.0, 0.0)],
        -Vec3::Z,
        vec![bottom_inner],
    );

    let top_rim = z_circle(cx, cy, t, big_r);
    let top_inner = b.rim_loop(top_rim, false);
    b.polygon_face(
        &[p(0.0, 0.0, t), p(w, 0.0, t), p(w, d, t), p(0.0, d, t)],
        Vec3::Z,
        vec![top_inner],
    );

    add_box_sides(&mut b, w, d, 0.0, t);
    add_hole_wall(&mut b, cx, cy, r, 0.0, z_ring);

    // Fillet ring: quarter-torus from the cylinder top rim up to the top
    // face. v = PI touches the cylinder, v = PI/2 the plate top.
    let torus = Torus {
        center: Point3d::new(cx, cy, z_ring),
        axis: Vec3::Z,
        ref_dir: Vec3::X,
        major_radius: big_r,
        minor_radius: fillet_r,
    };
    let upper_rim = z_circle(cx, cy, t, big_r);
    let lower_rim = z_circle(cx, cy, z_ring, r);
    let mut steps = Vec::new();
    // Upper rim walked with increasing angle, lower rim against it.
    steps.extend(b.rim_loop(upper_rim, true).steps);
    steps.extend(b.rim_loop(lower_rim, false).steps);
    // Seam: the quarter profile arc at u = 0.
    let seam_circle = Circle3d::with_x_axis(
        Point3d::new(cx + big_r, cy, z_ring),
        -Vec3::Y,
        Vec3::X,
        fillet_r,
    );
    steps.push(b.arc(seam_circle, FRAC_PI_2, PI, true));
    b.add_face(Face {
        kind: SurfaceKind::Torus,
        geom: Some(Surface::Torus(torus)),
        u_range: (0.0, TAU),
        v_range: (FRAC_PI_2, PI),
        outer: BoundaryLoop { steps },
        inners: Vec::new(),
        reversed: false,
    });

    b.finish()
}

/// Plate with a counterbored hole: a narrow bore from the bottom opening
/// into a wider bore at the top, with an annular shoulder between them.
pub fn counterbored_plate(
    w: f64,
    d: f64,
    t: f64,
    bore_r: f64,
    counterbore_r: f64,
    shoulder_z: f64,
    cx: f64,
    cy: f64,
) -> Shape {
    let mut b = ShapeBuilder::new();
    let p = |x: f64, y: f64, z: f64| Point3d::new(x, y, z);

    let bottom_rim = z_circle(cx, cy, 0.0, bore_r);
    let bottom_inner = b.rim_loop(bottom_rim, true);
    b.polygon_face(
        &[p(0.0, 0.0, 0.0), p(0.0, d, 0.0), p(w, d, 0.0), p(w, 0.0, 0.0)],
        -Vec3::Z,
        vec![bottom_inner],
    );

    let top_rim = z_circle(cx, cy, t, counterbore_r);
    let top_inner = b.rim_loop(top_rim, false);
    b.polygon_face(
        &[p(0.0, 0.0, t), p(w, 0.0, t), p(w, d, t), p(0.0, d, t)],
        Vec3::Z,
        vec![top_inner],
    );

    add_box_sides(&mut b, w, d, 0.0, t);
    add_hole_wall(&mut b, cx, cy, bore_r, 0.0, shoulder_z);

    // Shoulder annulus at the step, facing up into the counterbore.
    let outer_rim = z_circle(cx, cy, shoulder_z, counterbore_r);
    let inner_rim = z_circle(cx, cy, shoulder_z, bore_r);
    let outer_loop = b.rim_loop(outer_rim, true);
    let inner_loop = b.rim_loop(inner_rim, false);
    let plane = Plane::with_axes(Point3d::new(cx, cy, shoulder_z), Vec3::Z, Vec3::X);
    b.add_face(Face {
        kind: SurfaceKind::Plane,
        geom: Some(Surface::Plane(plane)),
        u_range: (-counterbore_r, counterbore_r),
        v_range: (-counterbore_r, counterbore_r),
        outer: outer_loop,
        inners: vec![inner_loop],
        reversed: false,
    });

    add_hole_wall(&mut b, cx, cy, counterbore_r, shoulder_z, t);

    b.finish()
}

/// Plate with a through hole whose cylindrical wall is split at `z_split`
/// into two stacked coaxial faces, the way imported models often arrive.
pub fn plate_with_split_bore(
    w: f64,
    d: f64,
    t: f64,
    r: f64,
    z_split: f64,
    cx: f64,
    cy: f64,
) -> Shape {
    let mut b = ShapeBuilder::new();
    let p = |x: f64, y: f64, z: f64| Point3d::new(x, y, z);

    let bottom_rim = z_circle(cx, cy, 0.0, r);
    let bottom_inner = b.rim_loop(bottom_rim, true);
    b.polygon_face(
        &[p(0.0, 0.0, 0.0), p(0.0, d, 0.0), p(w, d, 0.0), p(w, 0.0, 0.0)],
        -Vec3::Z,
        vec![bottom_inner],
    );

    let top_rim = z_circle(cx, cy, t, r);
    let top_inner = b.rim_loop(top_rim, false);
    b.polygon_face(
        &[p(0.0, 0.0, t), p(w, 0.0, t), p(w, d, t), p(0.0, d, t)],
        Vec3::Z,
        vec![top_inner],
    );

    add_box_sides(&mut b, w, d, 0.0, t);
    add_hole_wall(&mut b, cx, cy, r, 0.0, z_split);
    add_hole_wall(&mut b, cx, cy, r, z_split, t);

    b.finish()
}

/// Block with rectangular pockets sunk into the top face.
/// Each pocket is (x0, y0, x1, y1, depth).
pub fn block_with_pockets(w: f64, d: f64, h: f64, pockets: &[(f64, f64, f64, f64, f64)]) -> Shape {
    let mut b = ShapeBuilder::new();
    let p = |x: f64, y: f64, z: f64| Point3d::new(x, y, z);

    b.polygon_face(
        &[p(0.0, 0.0, 0.0), p(0.0, d, 0.0), p(w, d, 0.0), p(w, 0.0, 0.0)],
        -Vec3::Z,
        Vec::new(),
    );

    // Top face: one clockwise inner loop per pocket rim.
    let mut inners = Vec::new();
    for &(x0, y0, x1, y1, _) in pockets {
        let rim = [p(x0, y0, h), p(x0, y1, h), p(x1, y1, h), p(x1, y0, h)];
        let verts: Vec<VertexKey> = rim.iter().map(|q| b.vertex(*q)).collect();
        let mut steps = Vec::new();
        for i in 0..4 {
            steps.push(b.line(verts[i], verts[(i + 1) % 4]));
        }
        inners.push(BoundaryLoop { steps });
    }
    b.polygon_face(
        &[p(0.0, 0.0, h), p(w, 0.0, h), p(w, d, h), p(0.0, d, h)],
        Vec3::Z,
        inners,
    );

    add_box_sides(&mut b, w, d, 0.0, h);

    for &(x0, y0, x1, y1, depth) in pockets {
        let zf = h - depth;
        // Walls face into the pocket.
        b.polygon_face(
            &[p(x0, y0, zf), p(x0, y1, zf), p(x0, y1, h), p(x0, y0, h)],
            Vec3::X,
            Vec::new(),
        );
        b.polygon_face(
            &[p(x1, y1, zf), p(x1, y0, zf), p(x1, y0, h), p(x1, y1, h)],
            -Vec3::X,
            Vec::new(),
        );
        b.polygon_face(
            &[p(x1, y0, zf), p(x0, y0, zf), p(x0, y0, h), p(x1, y0, h)],
            Vec3::Y,
            Vec::new(),
        );
        b.polygon_face(
            &[p(x0, y1, zf), p(x1, y1, zf), p(x1, y1, h), p(x0, y1, h)],
            -Vec3::Y,
            Vec::new(),
        );
        // Floor.
        b.polygon_face(
            &[p(x0, y0, zf), p(x1, y0, zf), p(x1, y1, zf), p(x0, y1, zf)],
            Vec3::Z,
            Vec::new(),
        );
    }

    b.finish()
}

/// Block with a single 45-degree chamfer along one top edge.
pub fn chamfered_block(w: f64, d: f64, h: f64, c: f64) -> Shape {
    extrude_polygon(
        &[(0.0, 0.0), (w, 0.0), (w, h - c), (w - c, h), (0.0, h)],
        0.0,
        d,
    )
}

/// L-bracket whose top arm overhangs the base: the arm underside cannot be
/// reached by a straight pull along -Z.
pub fn l_bracket() -> Shape {
    extrude_polygon(
        &[
            (0.0, 0.0),
            (60.0, 0.0),
            (60.0, 10.0),
            (10.0, 10.0),
            (10.0, 40.0),
            (30.0, 40.0),
            (30.0, 50.0),
            (0.0, 50.0),
        ],
        0.0,
        20.0,
    )
}

/// The four vertical outer walls of a rectangular block.
fn add_box_sides(b: &mut ShapeBuilder, w: f64, d: f64, z0: f64, z1: f64) {
    let p = |x: f64, y: f64, z: f64| Point3d::new(x, y, z);
    // Front (y=0), outward -Y.
    b.polygon_face(
        &[p(0.0, 0.0, z0), p(w, 0.0, z0), p(w, 0.0, z1), p(0.0, 0.0, z1)],
        -Vec3::Y,
        Vec::new(),
    );
    // Back (y=d), outward +Y.
    b.polygon_face(
        &[p(w, d, z0), p(0.0, d, z0), p(0.0, d, z1), p(w, d, z1)],
        Vec3::Y,
        Vec::new(),
    );
    // Left (x=0), outward -X.
    b.polygon_face(
        &[p(0.0, d, z0), p(0.0, 0.0, z0), p(0.0, 0.0, z1), p(0.0, d, z1)],
        -Vec3::X,
        Vec::new(),
    );
    // Right (x=w), outward +X.
    b.polygon_face(
        &[p(w, 0.0, z0), p(w, d, z0), p(w, d, z1), p(w, 0.0, z1)],
        Vec3::X,
        Vec::new(),
    );
}

/// Internal cylindrical wall of a vertical bore between z0 and z1.
/// The face is reversed: its outward normal points at the axis.
fn add_hole_wall(b: &mut ShapeBuilder, cx: f64, cy: f64, r: f64, z0: f64, z1: f64) {
    let mut cylinder = vertical_cylinder(cx, cy, r);
    cylinder.origin.z = z0;
    let top_rim = z_circle(cx, cy, z1, r);
    let bottom_rim = z_circle(cx, cy, z0, r);
    let mut steps = Vec::new();
    // The wall traverses its top rim with increasing angle and the bottom
    // rim against it (outward normal points at the axis).
    steps.extend(b.rim_loop(top_rim, true).steps);
    steps.extend(b.rim_loop(bottom_rim, false).steps);
    // Vertical seam line at u = 0.
    let seam_a = b.vertex(Point3d::new(cx + r, cy, z0));
    let seam_b = b.vertex(Point3d::new(cx + r, cy, z1));
    steps.push(b.line(seam_a, seam_b));
    b.add_face(Face {
        kind: SurfaceKind::Cylinder,
        geom: Some(Surface::Cylinder(cylinder)),
        u_range: (0.0, TAU),
        v_range: (0.0, z1 - z0),
        outer: BoundaryLoop { steps },
        inners: Vec::new(),
        reversed: true,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::SolidModel;

    #[test]
    fn test_box_counts() {
        let shape = make_box(100.0, 100.0, 100.0);
        assert_eq!(shape.face_count(), 6);
        assert_eq!(shape.edge_count(), 12);
        assert_eq!(shape.vertex_count(), 8);
    }

    #[test]
    fn test_box_face_areas() {
        let shape = make_box(100.0, 100.0, 100.0);
        for f in 0..6 {
            assert!((shape.face_area(f) - 10_000.0).abs() < 1.0);
        }
    }

    #[test]
    fn test_box_is_inside() {
        let shape = make_box(10.0, 10.0, 10.0);
        assert!(shape.is_inside(&Point3d::new(5.0, 5.0, 5.0)));
        assert!(!shape.is_inside(&Point3d::new(15.0, 5.0, 5.0)));
        assert!(!shape.is_inside(&Point3d::new(-0.5, 5.0, 5.0)));
    }

    #[test]
    fn test_plate_with_hole_counts() {
        let shape = plate_with_hole(50.0, 50.0, 10.0, 5.0, 25.0, 25.0);
        assert_eq!(shape.face_count(), 7);
        let cylinders: Vec<usize> = (0..7)
            .filter(|&f| shape.surface_kind(f) == SurfaceKind::Cylinder)
            .collect();
        assert_eq!(cylinders.len(), 1);
        assert!(shape.is_reversed(cylinders[0]));
    }

    #[test]
    fn test_plate_hole_semicircular_edges() {
        let shape = plate_with_hole(50.0, 50.0, 10.0, 5.0, 25.0, 25.0);
        let cyl = (0..7)
            .find(|&f| shape.surface_kind(f) == SurfaceKind::Cylinder)
            .unwrap();
        let semis = shape
            .face_edges(cyl)
            .iter()
            .filter(|oe| {
                shape
                    .edge(oe.edge)
                    .arc_angle_deg()
                    .map(|a| (a - 180.0).abs() < 5.0)
                    .unwrap_or(false)
            })
            .count();
        assert_eq!(semis, 4);
    }

    #[test]
    fn test_filleted_plate_counts() {
        let shape = plate_with_filleted_hole(50.0, 50.0, 10.0, 5.0, 1.0, 25.0, 25.0);
        assert_eq!(shape.face_count(), 8);
        let torus = (0..8)
            .find(|&f| shape.surface_kind(f) == SurfaceKind::Torus)
            .unwrap();
        let quarters = shape
            .face_edges(torus)
            .iter()
            .filter(|oe| {
                shape
                    .edge(oe.edge)
                    .arc_angle_deg()
                    .map(|a| (a - 90.0).abs() < 5.0)
                    .unwrap_or(false)
            })
            .count();
        assert_eq!(quarters, 1);
    }

    #[test]
    fn test_pocket_block_counts() {
        let shape = block_with_pockets(50.0, 50.0, 50.0, &[(15.0, 15.0, 35.0, 35.0, 10.0)]);
        // 6 block faces + 4 walls + floor.
        assert_eq!(shape.face_count(), 11);
    }

    #[test]
    fn test_edge_faces_pairing() {
        let shape = make_box(10.0, 10.0, 10.0);
        for e in 0..shape.edge_count() {
            assert_eq!(shape.edge_faces(e).len(), 2, "box edge {} should pair two faces", e);
        }
    }

    #[test]
    fn test_shared_edges_have_opposite_senses() {
        let shape = make_box(10.0, 10.0, 10.0);
        for e in 0..shape.edge_count() {
            let faces = shape.edge_faces(e);
            let senses: Vec<bool> = faces
                .iter()
                .flat_map(|&f| {
                    shape
                        .face_edges(f)
                        .into_iter()
                        .filter(|oe| oe.edge == e)
                        .map(|oe| oe.forward)
                })
                .collect();
            assert_eq!(senses.len(), 2);
            assert_ne!(senses[0], senses[1], "edge {} traversed twice in the same sense", e);
        }
    }

    #[test]
    fn test_l_bracket_has_downward_overhang_face() {
        let shape = l_bracket();
        let down = (0..shape.face_count()).find(|&f| {
            let n = crate::traits::midpoint_normal(&shape, f).unwrap();
            let c = shape.face_centroid(f);
            n.z < -0.99 && c.z > 35.0
        });
        assert!(down.is_some(), "expected the arm underside facing -Z");
    }
}
