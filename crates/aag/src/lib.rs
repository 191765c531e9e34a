//! Attributed Adjacency Graph.
//!
//! Faces become nodes decorated with surface attributes; every B-rep edge
//! shared by exactly two faces becomes an arc carrying a signed dihedral
//! angle in degrees. Negative angles are convex, positive concave, and
//! magnitudes above 177 degrees flag the edge as smooth.

pub mod blend;

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, instrument};

use camber_kernel::{Point3d, SolidModel, Surface, SurfaceKind, Vec3};

/// Edges with |dihedral| above this are smooth.
pub const SMOOTH_DIHEDRAL_DEG: f64 = 177.0;

/// Plane record on a planar face.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PlaneAttr {
    pub location: Point3d,
    /// Orientation-corrected unit normal.
    pub normal: Vec3,
}

/// Cylinder record on a cylindrical face.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CylinderAttr {
    pub axis_origin: Point3d,
    pub axis_dir: Vec3,
    pub radius: f64,
}

/// Torus record on a toroidal face.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TorusAttr {
    pub axis_origin: Point3d,
    pub axis_dir: Vec3,
    /// Tube radius; the blend radius of fillet rings.
    pub minor_radius: f64,
    pub major_radius: f64,
}

/// Per-face attributes.
#[derive(Debug, Clone, Serialize)]
pub struct FaceAttributes {
    pub surface_kind: SurfaceKind,
    pub area: f64,
    /// Orientation-corrected normal at the parametric midpoint; zero when
    /// the surface could not be evaluated there.
    pub normal: Vec3,
    pub plane: Option<PlaneAttr>,
    pub cylinder: Option<CylinderAttr>,
    pub torus: Option<TorusAttr>,
}

impl FaceAttributes {
    pub fn is_planar(&self) -> bool {
        self.plane.is_some()
    }

    pub fn is_cylinder(&self) -> bool {
        self.cylinder.is_some()
    }

    pub fn is_torus(&self) -> bool {
        self.torus.is_some()
    }

    fn sentinel(kind: SurfaceKind) -> Self {
        Self {
            surface_kind: kind,
            area: 0.0,
            normal: Vec3::ZERO,
            plane: None,
            cylinder: None,
            torus: None,
        }
    }
}

/// One adjacency arc: an underlying B-rep edge shared by two faces.
#[derive(Debug, Clone, Serialize)]
pub struct AagEdge {
    pub face1: usize,
    pub face2: usize,
    /// Dense kernel edge id.
    pub edge_id: usize,
    /// Signed dihedral angle in degrees, [-180, 180].
    pub dihedral_angle: f64,
    pub is_convex: bool,
    pub is_concave: bool,
    pub is_smooth: bool,
}

/// The attributed adjacency graph. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct Aag {
    attrs: Vec<FaceAttributes>,
    edges: Vec<AagEdge>,
    /// (i, j) and (j, i) -> index of the first arc between the pair.
    pair_index: HashMap<(usize, usize), usize>,
    /// Neighbor face ids per face, one entry per shared arc (duplicates
    /// preserved: two faces sharing two arcs neighbor each other twice).
    neighbors: Vec<Vec<usize>>,
}

impl Aag {
    /// Build the graph. Per-entity geometric failures degrade to sentinel
    /// attributes or a zero dihedral; they never abort the build.
    #[instrument(skip(model), fields(faces = model.face_count()))]
    pub fn build(model: &dyn SolidModel) -> Self {
        let face_count = model.face_count();
        let attrs: Vec<FaceAttributes> = (0..face_count)
            .map(|f| compute_face_attributes(model, f))
            .collect();

        let mut edges = Vec::new();
        let mut pair_index = HashMap::new();
        let mut neighbors = vec![Vec::new(); face_count];

        for edge_id in 0..model.edge_count() {
            let incident = model.edge_faces(edge_id);
            if incident.len() != 2 {
                continue;
            }
            let (f1, f2) = (incident[0], incident[1]);
            let angle = compute_dihedral(model, f1, f2, edge_id);
            let abs = angle.abs();
            let is_smooth = abs > SMOOTH_DIHEDRAL_DEG;
            let arc = AagEdge {
                face1: f1,
                face2: f2,
                edge_id,
                dihedral_angle: angle,
                is_convex: !is_smooth && angle < 0.0,
                is_concave: !is_smooth && angle >= 0.0,
                is_smooth,
            };
            let idx = edges.len();
            pair_index.entry((f1, f2)).or_insert(idx);
            pair_index.entry((f2, f1)).or_insert(idx);
            neighbors[f1].push(f2);
            neighbors[f2].push(f1);
            edges.push(arc);
        }

        debug!(arcs = edges.len(), "built adjacency graph");
        Self {
            attrs,
            edges,
            pair_index,
            neighbors,
        }
    }

    pub fn face_count(&self) -> usize {
        self.attrs.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn attributes(&self, face: usize) -> &FaceAttributes {
        &self.attrs[face]
    }

    pub fn edges(&self) -> &[AagEdge] {
        &self.edges
    }

    /// Adjacent face ids; one entry per shared arc.
    pub fn neighbors(&self, face: usize) -> &[usize] {
        &self.neighbors[face]
    }

    /// The arc between two faces, in either order.
    pub fn edge_between(&self, f1: usize, f2: usize) -> Option<&AagEdge> {
        self.pair_index.get(&(f1, f2)).map(|&i| &self.edges[i])
    }

    /// Signed dihedral between two faces; 0 when not adjacent.
    pub fn dihedral_angle(&self, f1: usize, f2: usize) -> f64 {
        self.edge_between(f1, f2).map_or(0.0, |e| e.dihedral_angle)
    }

    pub fn cylindrical_faces(&self) -> Vec<usize> {
        (0..self.attrs.len()).filter(|&f| self.attrs[f].is_cylinder()).collect()
    }

    pub fn toroidal_faces(&self) -> Vec<usize> {
        (0..self.attrs.len()).filter(|&f| self.attrs[f].is_torus()).collect()
    }
}

fn compute_face_attributes(model: &dyn SolidModel, face: usize) -> FaceAttributes {
    let kind = model.surface_kind(face);
    let mut attrs = FaceAttributes::sentinel(kind);
    attrs.area = model.face_area(face);
    attrs.normal = camber_kernel::midpoint_normal(model, face).unwrap_or(Vec3::ZERO);

    match model.surface(face) {
        Some(Surface::Plane(p)) => {
            attrs.plane = Some(PlaneAttr {
                location: p.origin,
                normal: if attrs.normal.length() > 0.5 { attrs.normal } else { p.normal },
            });
        }
        Some(Surface::Cylinder(c)) => {
            attrs.cylinder = Some(CylinderAttr {
                axis_origin: c.origin,
                axis_dir: c.axis,
                radius: c.radius,
            });
        }
        Some(Surface::Torus(t)) => {
            attrs.torus = Some(TorusAttr {
                axis_origin: t.center,
                axis_dir: t.axis,
                minor_radius: t.minor_radius,
                major_radius: t.major_radius,
            });
        }
        _ => {}
    }
    attrs
}

/// Signed dihedral angle across a shared edge, in degrees.
///
/// The reference axis is the edge tangent at the edge midpoint, oriented
/// against the first face's traversal sense; each face contributes the
/// in-plane tangent `normalize(N x Vx)` with its orientation-corrected
/// normal at the projected midpoint. Any evaluation failure yields 0.
fn compute_dihedral(model: &dyn SolidModel, f1: usize, f2: usize, edge_id: usize) -> f64 {
    let edge = model.edge(edge_id);
    let mid = edge.midpoint_param();
    let step = edge.param_range() * 0.01;
    let a = edge.curve.evaluate(mid - step);
    let b = edge.curve.evaluate(mid + step);
    let m = edge.curve.evaluate(mid);

    let mut vx = b - a;
    if vx.length() < 1e-10 {
        return 0.0;
    }
    if let Some(oe) = model.face_edges(f1).iter().find(|oe| oe.edge == edge_id) {
        if oe.forward {
            vx = -vx;
        }
    }
    let vx = match vx.normalized() {
        Some(v) => v,
        None => return 0.0,
    };

    let (Some(tf), Some(tg)) = (
        in_plane_tangent(model, f1, &m, &vx),
        in_plane_tangent(model, f2, &m, &vx),
    ) else {
        return 0.0;
    };

    tf.signed_angle_around(&tg, &vx).to_degrees()
}

fn in_plane_tangent(model: &dyn SolidModel, face: usize, m: &Point3d, vx: &Vec3) -> Option<Vec3> {
    let (u, v) = model.project_onto_face(face, m)?;
    let sample = model.evaluate(face, u, v)?;
    let n = if model.is_reversed(face) {
        -sample.normal
    } else {
        sample.normal
    };
    n.cross(vx).normalized()
}

#[cfg(test)]
mod tests {
    use super::*;
    use camber_kernel::primitives::{make_box, plate_with_filleted_hole, plate_with_hole};

    #[test]
    fn test_cube_all_edges_convex_90() {
        let shape = make_box(100.0, 100.0, 100.0);
        let aag = Aag::build(&shape);
        assert_eq!(aag.face_count(), 6);
        assert_eq!(aag.edge_count(), 12);
        for arc in aag.edges() {
            assert!(
                (arc.dihedral_angle + 90.0).abs() < 1e-6,
                "expected -90, got {} between {} and {}",
                arc.dihedral_angle,
                arc.face1,
                arc.face2
            );
            assert!(arc.is_convex);
            assert!(!arc.is_concave && !arc.is_smooth);
        }
    }

    #[test]
    fn test_dihedral_symmetry() {
        let shape = plate_with_hole(50.0, 50.0, 10.0, 5.0, 25.0, 25.0);
        let aag = Aag::build(&shape);
        for arc in aag.edges() {
            let a = aag.dihedral_angle(arc.face1, arc.face2);
            let b = aag.dihedral_angle(arc.face2, arc.face1);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        let shape = plate_with_filleted_hole(50.0, 50.0, 10.0, 5.0, 1.0, 25.0, 25.0);
        let a = Aag::build(&shape);
        let b = Aag::build(&shape);
        assert_eq!(a.face_count(), b.face_count());
        assert_eq!(a.edge_count(), b.edge_count());
        for (ea, eb) in a.edges().iter().zip(b.edges().iter()) {
            assert_eq!((ea.face1, ea.face2), (eb.face1, eb.face2));
            assert!((ea.dihedral_angle - eb.dihedral_angle).abs() < 1e-6);
        }
    }

    #[test]
    fn test_hole_rim_edges_are_convex() {
        let shape = plate_with_hole(50.0, 50.0, 10.0, 5.0, 25.0, 25.0);
        let aag = Aag::build(&shape);
        let cyl = aag.cylindrical_faces()[0];
        for &n in aag.neighbors(cyl) {
            let d = aag.dihedral_angle(cyl, n);
            assert!(
                (d + 90.0).abs() < 1.0,
                "hole rim against face {} should be convex, got {}",
                n,
                d
            );
        }
    }

    #[test]
    fn test_fillet_junctions_read_tangent() {
        let shape = plate_with_filleted_hole(50.0, 50.0, 10.0, 5.0, 1.0, 25.0, 25.0);
        let aag = Aag::build(&shape);
        let torus = aag.toroidal_faces()[0];
        let cyl = aag.cylindrical_faces()[0];
        // Tangent continuity: in-plane tangents agree, dihedral near 0.
        let d = aag.dihedral_angle(torus, cyl);
        assert!(d.abs() < 1.0, "cylinder/torus junction should be near 0, got {}", d);
    }

    #[test]
    fn test_cylinder_attributes() {
        let shape = plate_with_hole(50.0, 50.0, 10.0, 5.0, 25.0, 25.0);
        let aag = Aag::build(&shape);
        let cyl = aag.cylindrical_faces()[0];
        let rec = aag.attributes(cyl).cylinder.unwrap();
        assert!((rec.radius - 5.0).abs() < 1e-9);
        assert!((rec.axis_dir.z.abs() - 1.0).abs() < 1e-9);
        // Internal wall: midpoint normal points at the axis.
        let n = aag.attributes(cyl).normal;
        let sample_to_axis = Point3d::new(25.0, 25.0, 5.0) - Point3d::new(25.0 - 5.0, 25.0, 5.0);
        assert!(n.dot(&sample_to_axis.normalized().unwrap()) > 0.9);
    }

    #[test]
    fn test_pair_lookup_both_orders() {
        let shape = make_box(10.0, 10.0, 10.0);
        let aag = Aag::build(&shape);
        let arc = &aag.edges()[0];
        assert!(aag.edge_between(arc.face1, arc.face2).is_some());
        assert!(aag.edge_between(arc.face2, arc.face1).is_some());
        assert!(aag.edge_between(arc.face1, arc.face1).is_none());
    }
}
