use crate::geometry::{BoundingBox, Point3d, Surface, Vec3};
use crate::tessellation::TriangleMesh;
use crate::topology::{Edge, SurfaceKind};

/// Errors from kernel operations.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("STEP parse error: {reason}")]
    StepParse { reason: String },

    #[error("STEP entity #{id} references missing entity #{missing}")]
    DanglingReference { id: usize, missing: usize },

    #[error("shape has no faces")]
    EmptyShape,

    #[error("entity out of range: {kind} {index}")]
    EntityOutOfRange { kind: &'static str, index: usize },
}

/// A point and the raw surface normal sampled at some (u, v).
#[derive(Debug, Clone, Copy)]
pub struct SurfaceSample {
    pub point: Point3d,
    /// Surface normal before face-orientation correction.
    pub normal: Vec3,
}

/// An edge reference as seen from one face's boundary, with the sense in
/// which that face traverses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrientedEdge {
    pub edge: usize,
    pub forward: bool,
}

/// Read-only capability interface over a B-rep solid.
///
/// Entities are addressed by dense indices assigned in deterministic
/// traversal order; two walks over the same shape observe identical ids.
/// Implemented by the bundled [`crate::shape::Shape`]; an adapter over an
/// external kernel only has to reproduce these queries and the numeric
/// tolerances documented on each recognizer.
pub trait SolidModel {
    fn face_count(&self) -> usize;
    fn edge_count(&self) -> usize;
    fn vertex_count(&self) -> usize;
    fn shell_count(&self) -> usize;

    /// Index of the shell owning a face.
    fn face_shell(&self, face: usize) -> usize;

    fn surface_kind(&self, face: usize) -> SurfaceKind;

    /// Analytic surface record, when the face has one.
    fn surface(&self, face: usize) -> Option<&Surface>;

    /// True when the face's outward normal opposes its surface normal.
    fn is_reversed(&self, face: usize) -> bool;

    fn uv_domain(&self, face: usize) -> ((f64, f64), (f64, f64));

    /// Evaluate the surface; None when the face has no analytic record or
    /// the normal is undefined at the sample.
    fn evaluate(&self, face: usize, u: f64, v: f64) -> Option<SurfaceSample>;

    /// Closest surface parameters to an arbitrary point.
    fn project_onto_face(&self, face: usize, p: &Point3d) -> Option<(f64, f64)>;

    /// Boundary edges of a face (outer loop first), each with the sense in
    /// which the face traverses it.
    fn face_edges(&self, face: usize) -> Vec<OrientedEdge>;

    /// Distinct faces incident to an edge, ascending by id. A seam edge
    /// reports its single owning face once.
    fn edge_faces(&self, edge: usize) -> Vec<usize>;

    fn edge(&self, edge: usize) -> &Edge;

    fn vertex_point(&self, vertex: usize) -> Point3d;

    /// Dense vertex ids of an edge's endpoints.
    fn edge_vertices(&self, edge: usize) -> (usize, usize);

    fn face_area(&self, face: usize) -> f64;
    fn face_centroid(&self, face: usize) -> Point3d;
    fn face_bounding_box(&self, face: usize) -> BoundingBox;
    fn bounding_box(&self) -> BoundingBox;

    /// Odd-even point containment (three axis rays, majority vote).
    fn is_inside(&self, p: &Point3d) -> bool;

    /// Triangulate with the given linear deflection (absolute sagitta) and
    /// angular deflection (radians). Every triangle is tagged with its
    /// originating face id.
    fn tessellate(&self, linear_deflection: f64, angular_deflection: f64) -> TriangleMesh;

    /// Edge discretized at roughly 1-unit spacing, clamped to [10, 100]
    /// points.
    fn edge_polyline(&self, edge: usize) -> Vec<Point3d>;
}

/// Orientation-corrected normal at the parametric midpoint of a face.
/// Returns None when the surface cannot be evaluated there.
pub fn midpoint_normal(model: &dyn SolidModel, face: usize) -> Option<Vec3> {
    let ((u0, u1), (v0, v1)) = model.uv_domain(face);
    let sample = model.evaluate(face, (u0 + u1) * 0.5, (v0 + v1) * 0.5)?;
    let n = sample.normal.normalized()?;
    Some(if model.is_reversed(face) { -n } else { n })
}
