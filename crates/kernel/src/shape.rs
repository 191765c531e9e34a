//! The bundled analytic solid and its dense entity indexing.

use std::sync::OnceLock;

use slotmap::SecondaryMap;
use tracing::debug;

use crate::geometry::{BoundingBox, Point3d, Surface, Vec3};
use crate::tessellation::{tessellate_face, TriangleMesh};
use crate::topology::{Edge, EdgeKey, EntityStore, FaceKey, SurfaceKind, VertexKey};
use crate::traits::{OrientedEdge, SolidModel, SurfaceSample};

/// Deflections used for the internal property/classification mesh.
const PROPS_LINEAR_DEFLECTION: f64 = 0.01;
const PROPS_ANGULAR_DEFLECTION: f64 = 0.3;

#[derive(Debug, Clone)]
struct FaceProps {
    area: f64,
    centroid: Point3d,
    bbox: BoundingBox,
}

/// An indexed B-rep solid.
///
/// Dense ids are assigned once at construction: faces in shell insertion
/// order, edges and vertices in first-encounter order while walking face
/// boundaries. The same store always yields the same ids.
pub struct Shape {
    store: EntityStore,
    faces: Vec<FaceKey>,
    edges: Vec<EdgeKey>,
    vertices: Vec<VertexKey>,
    face_ids: SecondaryMap<FaceKey, usize>,
    edge_ids: SecondaryMap<EdgeKey, usize>,
    vertex_ids: SecondaryMap<VertexKey, usize>,
    /// Incident face ids per edge id, ascending, deduplicated.
    edge_face_map: Vec<Vec<usize>>,
    props: OnceLock<Vec<FaceProps>>,
    props_mesh: OnceLock<TriangleMesh>,
}

impl Shape {
    pub fn from_store(store: EntityStore) -> Self {
        let mut faces = Vec::new();
        let mut face_ids = SecondaryMap::new();
        for &shell in &store.shell_order {
            for &fk in &store.shells[shell].faces {
                face_ids.insert(fk, faces.len());
                faces.push(fk);
            }
        }

        let mut edges = Vec::new();
        let mut edge_ids: SecondaryMap<EdgeKey, usize> = SecondaryMap::new();
        let mut vertices = Vec::new();
        let mut vertex_ids: SecondaryMap<VertexKey, usize> = SecondaryMap::new();
        for &fk in &faces {
            for lp in store.faces[fk].loops() {
                for step in &lp.steps {
                    if !edge_ids.contains_key(step.edge) {
                        edge_ids.insert(step.edge, edges.len());
                        edges.push(step.edge);
                        let e = &store.edges[step.edge];
                        for vk in [e.start, e.end] {
                            if !vertex_ids.contains_key(vk) {
                                vertex_ids.insert(vk, vertices.len());
                                vertices.push(vk);
                            }
                        }
                    }
                }
            }
        }

        let mut edge_face_map = vec![Vec::new(); edges.len()];
        for &fk in &faces {
            let fid = face_ids[fk];
            for lp in store.faces[fk].loops() {
                for step in &lp.steps {
                    let eid = edge_ids[step.edge];
                    if !edge_face_map[eid].contains(&fid) {
                        edge_face_map[eid].push(fid);
                    }
                }
            }
        }
        for list in &mut edge_face_map {
            list.sort_unstable();
        }

        debug!(
            faces = faces.len(),
            edges = edges.len(),
            vertices = vertices.len(),
            "indexed shape"
        );

        Self {
            store,
            faces,
            edges,
            vertices,
            face_ids,
            edge_ids,
            vertex_ids,
            edge_face_map,
            props: OnceLock::new(),
            props_mesh: OnceLock::new(),
        }
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn face_key(&self, face: usize) -> FaceKey {
        self.faces[face]
    }

    fn props_mesh(&self) -> &TriangleMesh {
        self.props_mesh.get_or_init(|| {
            let mut mesh = TriangleMesh::new();
            for (fid, &fk) in self.faces.iter().enumerate() {
                tessellate_face(
                    &self.store,
                    fk,
                    fid as u32,
                    PROPS_LINEAR_DEFLECTION,
                    PROPS_ANGULAR_DEFLECTION,
                    &mut mesh,
                );
            }
            mesh
        })
    }

    fn props(&self) -> &Vec<FaceProps> {
        self.props.get_or_init(|| {
            let mesh = self.props_mesh();
            let mut acc: Vec<(f64, Vec3, BoundingBox)> = self
                .faces
                .iter()
                .map(|_| (0.0, Vec3::ZERO, BoundingBox::empty()))
                .collect();
            for t in 0..mesh.triangle_count() {
                let fid = mesh.tri_face[t] as usize;
                let [a, b, c] = mesh.triangle(t);
                let area = (b - a).cross(&(c - a)).length() * 0.5;
                let centroid = Vec3::new(
                    (a.x + b.x + c.x) / 3.0,
                    (a.y + b.y + c.y) / 3.0,
                    (a.z + b.z + c.z) / 3.0,
                );
                let slot = &mut acc[fid];
                slot.0 += area;
                slot.1 = slot.1 + centroid * area;
                slot.2.add_point(a);
                slot.2.add_point(b);
                slot.2.add_point(c);
            }
            acc.into_iter()
                .map(|(area, weighted, bbox)| {
                    let centroid = if area > 1e-12 {
                        Point3d::new(weighted.x / area, weighted.y / area, weighted.z / area)
                    } else if bbox.is_empty() {
                        Point3d::ORIGIN
                    } else {
                        bbox.center()
                    };
                    FaceProps { area, centroid, bbox }
                })
                .collect()
        })
    }

    /// Parity of ray/mesh crossings along one axis direction. The origin
    /// is nudged off-axis so rays do not graze shared triangle edges.
    fn crossings_are_odd(&self, origin: &Point3d, dir: &Vec3) -> bool {
        let lateral = dir.any_perpendicular();
        let lateral2 = dir.cross(&lateral);
        let origin = *origin + lateral * 3.1e-4 + lateral2 * 1.7e-4;
        let mesh = self.props_mesh();
        let mut count = 0usize;
        for t in 0..mesh.triangle_count() {
            let tri = mesh.triangle(t);
            if let Some(hit) = ray_triangle(&origin, dir, &tri) {
                if hit > 1e-9 {
                    count += 1;
                }
            }
        }
        count % 2 == 1
    }
}

impl SolidModel for Shape {
    fn face_count(&self) -> usize {
        self.faces.len()
    }

    fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    fn shell_count(&self) -> usize {
        self.store.shell_order.len()
    }

    fn face_shell(&self, face: usize) -> usize {
        let key = self.faces[face];
        self.store
            .shell_order
            .iter()
            .position(|&s| self.store.shells[s].faces.contains(&key))
            .unwrap_or(0)
    }

    fn surface_kind(&self, face: usize) -> SurfaceKind {
        self.store.faces[self.faces[face]].kind
    }

    fn surface(&self, face: usize) -> Option<&Surface> {
        self.store.faces[self.faces[face]].geom.as_ref()
    }

    fn is_reversed(&self, face: usize) -> bool {
        self.store.faces[self.faces[face]].reversed
    }

    fn uv_domain(&self, face: usize) -> ((f64, f64), (f64, f64)) {
        let f = &self.store.faces[self.faces[face]];
        (f.u_range, f.v_range)
    }

    fn evaluate(&self, face: usize, u: f64, v: f64) -> Option<SurfaceSample> {
        let f = &self.store.faces[self.faces[face]];
        let surface = f.geom.as_ref()?;
        let normal = surface.normal_at(u, v).normalized()?;
        Some(SurfaceSample {
            point: surface.evaluate(u, v),
            normal,
        })
    }

    fn project_onto_face(&self, face: usize, p: &Point3d) -> Option<(f64, f64)> {
        let f = &self.store.faces[self.faces[face]];
        f.geom.as_ref().map(|s| s.project(p))
    }

    fn face_edges(&self, face: usize) -> Vec<OrientedEdge> {
        let f = &self.store.faces[self.faces[face]];
        f.loops()
            .flat_map(|lp| lp.steps.iter())
            .map(|s| OrientedEdge {
                edge: self.edge_ids[s.edge],
                forward: s.forward,
            })
            .collect()
    }

    fn edge_faces(&self, edge: usize) -> Vec<usize> {
        self.edge_face_map[edge].clone()
    }

    fn edge(&self, edge: usize) -> &Edge {
        &self.store.edges[self.edges[edge]]
    }

    fn vertex_point(&self, vertex: usize) -> Point3d {
        self.store.vertices[self.vertices[vertex]].point
    }

    fn edge_vertices(&self, edge: usize) -> (usize, usize) {
        let e = &self.store.edges[self.edges[edge]];
        (self.vertex_ids[e.start], self.vertex_ids[e.end])
    }

    fn face_area(&self, face: usize) -> f64 {
        self.props()[face].area
    }

    fn face_centroid(&self, face: usize) -> Point3d {
        self.props()[face].centroid
    }

    fn face_bounding_box(&self, face: usize) -> BoundingBox {
        self.props()[face].bbox
    }

    fn bounding_box(&self) -> BoundingBox {
        let mut bb = BoundingBox::empty();
        for p in self.props() {
            bb.merge(&p.bbox);
        }
        bb
    }

    fn is_inside(&self, p: &Point3d) -> bool {
        let votes = [Vec3::X, Vec3::Y, Vec3::Z]
            .iter()
            .filter(|dir| self.crossings_are_odd(p, dir))
            .count();
        votes >= 2
    }

    fn tessellate(&self, linear_deflection: f64, angular_deflection: f64) -> TriangleMesh {
        let mut mesh = TriangleMesh::new();
        for (fid, &fk) in self.faces.iter().enumerate() {
            tessellate_face(
                &self.store,
                fk,
                fid as u32,
                linear_deflection,
                angular_deflection,
                &mut mesh,
            );
        }
        mesh
    }

    fn edge_polyline(&self, edge: usize) -> Vec<Point3d> {
        let e = &self.store.edges[self.edges[edge]];
        let length = match &e.curve {
            crate::geometry::Curve::Line(_) => e.param_range().abs(),
            crate::geometry::Curve::Circle(c) => c.radius * e.param_range().abs(),
        };
        let count = ((length / 1.0).ceil() as usize).clamp(10, 100);
        (0..count)
            .map(|i| {
                let t = e.t_start + e.param_range() * i as f64 / (count - 1) as f64;
                e.curve.evaluate(t)
            })
            .collect()
    }
}

/// Möller-Trumbore ray/triangle intersection; returns the hit parameter.
fn ray_triangle(origin: &Point3d, dir: &Vec3, tri: &[Point3d; 3]) -> Option<f64> {
    let e1 = tri[1] - tri[0];
    let e2 = tri[2] - tri[0];
    let h = dir.cross(&e2);
    let det = e1.dot(&h);
    if det.abs() < 1e-14 {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = *origin - tri[0];
    let u = inv_det * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(&e1);
    let v = inv_det * dir.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = inv_det * e2.dot(&q);
    (t > 0.0).then_some(t)
}
