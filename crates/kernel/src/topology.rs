//! B-rep topology store.
//!
//! Entities live in slotmap arenas; insertion order is preserved per shell
//! so a shape can hand out dense, deterministic analysis indices on top of
//! the arena keys.

use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};

use crate::geometry::{Curve, Point3d, Surface};

new_key_type! {
    pub struct VertexKey;
    pub struct EdgeKey;
    pub struct FaceKey;
    pub struct ShellKey;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vertex {
    pub point: Point3d,
}

/// A bounded edge: a curve restricted to [t_start, t_end].
///
/// For circles the parameter is the angle in radians, so `t_end - t_start`
/// is the arc angle; a seam edge of a closed face references that face on
/// both sides and is stored once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub curve: Curve,
    pub t_start: f64,
    pub t_end: f64,
    pub start: VertexKey,
    pub end: VertexKey,
}

impl Edge {
    pub fn midpoint_param(&self) -> f64 {
        (self.t_start + self.t_end) * 0.5
    }

    pub fn param_range(&self) -> f64 {
        self.t_end - self.t_start
    }

    /// Arc angle in degrees for circular edges, None otherwise.
    pub fn arc_angle_deg(&self) -> Option<f64> {
        if self.curve.is_circle() {
            Some(self.param_range().to_degrees())
        } else {
            None
        }
    }

    pub fn is_full_circle(&self) -> bool {
        self.curve.is_circle() && (self.param_range() - std::f64::consts::TAU).abs() < 1e-6
    }
}

/// Classification of a face's underlying surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceKind {
    Plane,
    Cylinder,
    Cone,
    Sphere,
    Torus,
    Bspline,
    Other,
}

impl SurfaceKind {
    pub fn label(&self) -> &'static str {
        match self {
            SurfaceKind::Plane => "plane",
            SurfaceKind::Cylinder => "cylinder",
            SurfaceKind::Cone => "cone",
            SurfaceKind::Sphere => "sphere",
            SurfaceKind::Torus => "torus",
            SurfaceKind::Bspline => "bspline",
            SurfaceKind::Other => "other",
        }
    }
}

/// One step of a boundary loop: an edge and the sense in which this face
/// traverses it (`forward` = with increasing curve parameter).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LoopStep {
    pub edge: EdgeKey,
    pub forward: bool,
}

/// A closed boundary loop. Outer loops run counter-clockwise seen from the
/// outward-normal side, inner loops clockwise.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoundaryLoop {
    pub steps: Vec<LoopStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Face {
    pub kind: SurfaceKind,
    /// Analytic record; absent for bspline/other kinds.
    pub geom: Option<Surface>,
    pub u_range: (f64, f64),
    pub v_range: (f64, f64),
    pub outer: BoundaryLoop,
    pub inners: Vec<BoundaryLoop>,
    /// True when the face's outward normal opposes the surface normal.
    pub reversed: bool,
}

impl Face {
    pub fn uv_mid(&self) -> (f64, f64) {
        (
            (self.u_range.0 + self.u_range.1) * 0.5,
            (self.v_range.0 + self.v_range.1) * 0.5,
        )
    }

    pub fn loops(&self) -> impl Iterator<Item = &BoundaryLoop> {
        std::iter::once(&self.outer).chain(self.inners.iter())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Shell {
    /// Faces in insertion order; this order defines the dense face ids.
    pub faces: Vec<FaceKey>,
}

/// Arena storage for one solid's topology.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityStore {
    pub vertices: SlotMap<VertexKey, Vertex>,
    pub edges: SlotMap<EdgeKey, Edge>,
    pub faces: SlotMap<FaceKey, Face>,
    pub shells: SlotMap<ShellKey, Shell>,
    /// Shell traversal order.
    pub shell_order: Vec<ShellKey>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vertex(&mut self, point: Point3d) -> VertexKey {
        self.vertices.insert(Vertex { point })
    }

    pub fn add_edge(&mut self, edge: Edge) -> EdgeKey {
        self.edges.insert(edge)
    }

    pub fn add_face(&mut self, face: Face) -> FaceKey {
        self.faces.insert(face)
    }

    pub fn add_shell(&mut self) -> ShellKey {
        let key = self.shells.insert(Shell::default());
        self.shell_order.push(key);
        key
    }

    pub fn push_face(&mut self, shell: ShellKey, face: FaceKey) {
        self.shells[shell].faces.push(face);
    }
}
