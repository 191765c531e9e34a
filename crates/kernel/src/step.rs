//! ISO-10303-21 (STEP) subset reader.
//!
//! Parses the entity subset needed to rebuild an analytic B-rep: points,
//! directions, placements, lines, circles, the five analytic surfaces,
//! edges, loops, faces, shells, and manifold solids. Free-form surfaces
//! classify as `Bspline`/`Other` and keep sentinel attributes. Files
//! without a recognizable solid are reported as fatal errors.

use std::collections::HashMap;
use std::f64::consts::TAU;
use std::path::Path;

use tracing::{debug, warn};

use crate::geometry::{Circle3d, Cone, Curve, Cylinder, Line3d, Plane, Point3d, Sphere, Surface, Torus, Vec3};
use crate::shape::Shape;
use crate::topology::{
    BoundaryLoop, Edge, EdgeKey, EntityStore, Face, LoopStep, SurfaceKind, VertexKey,
};
use crate::traits::KernelError;

/// Parsed STEP entity, after reference resolution.
#[derive(Debug, Clone)]
enum StepEntity {
    CartesianPoint(Point3d),
    Direction(Vec3),
    Axis2Placement {
        location: usize,
        axis: Option<usize>,
        ref_direction: Option<usize>,
    },
    Vector {
        direction: usize,
    },
    VertexPoint {
        point: usize,
    },
    Line {
        point: usize,
        vector: usize,
    },
    Circle {
        placement: usize,
        radius: f64,
    },
    EdgeCurve {
        start: usize,
        end: usize,
        curve: usize,
        same_sense: bool,
    },
    OrientedEdge {
        edge: usize,
        orientation: bool,
    },
    EdgeLoop {
        edges: Vec<usize>,
    },
    FaceBound {
        bound_loop: usize,
        outer: bool,
    },
    Plane {
        placement: usize,
    },
    CylindricalSurface {
        placement: usize,
        radius: f64,
    },
    ConicalSurface {
        placement: usize,
        radius: f64,
        semi_angle: f64,
    },
    SphericalSurface {
        placement: usize,
        radius: f64,
    },
    ToroidalSurface {
        placement: usize,
        major_radius: f64,
        minor_radius: f64,
    },
    FreeFormSurface {
        kind: SurfaceKind,
    },
    AdvancedFace {
        bounds: Vec<usize>,
        surface: usize,
        same_sense: bool,
    },
    ClosedShell {
        faces: Vec<usize>,
    },
    ManifoldSolidBrep {
        shell: usize,
    },
}

/// Read a STEP file into an indexed shape.
pub fn load_step(path: &Path) -> Result<Shape, KernelError> {
    let contents = std::fs::read_to_string(path).map_err(|source| KernelError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_step(&contents)
}

/// Parse STEP file contents.
pub fn parse_step(contents: &str) -> Result<Shape, KernelError> {
    let raw = collect_raw_entities(contents)?;
    let mut entities: HashMap<usize, StepEntity> = HashMap::new();
    for (&id, line) in &raw {
        match parse_entity(line) {
            Some(e) => {
                entities.insert(id, e);
            }
            None => debug!(id, "skipping unsupported STEP entity"),
        }
    }
    build_shape(&entities)
}

/// Split the DATA section into `id -> "TYPE(args)"` strings, joining
/// multi-line statements.
fn collect_raw_entities(contents: &str) -> Result<HashMap<usize, String>, KernelError> {
    let data_start = contents.find("DATA;").ok_or_else(|| KernelError::StepParse {
        reason: "no DATA section".into(),
    })?;
    let after = data_start + 5;
    let data_end = contents[after..]
        .find("ENDSEC;")
        .map(|i| i + after)
        .ok_or_else(|| KernelError::StepParse {
            reason: "DATA section not terminated".into(),
        })?;

    let mut raw = HashMap::new();
    let mut statement = String::new();
    for line in contents[after..data_end].lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        statement.push(' ');
        statement.push_str(line);
        if !line.ends_with(';') {
            continue;
        }
        let stmt = statement.trim().trim_end_matches(';');
        if let Some((id_part, body)) = stmt.split_once('=') {
            if let Some(id) = id_part.trim().strip_prefix('#').and_then(|s| s.parse().ok()) {
                raw.insert(id, body.trim().to_string());
            }
        }
        statement.clear();
    }
    Ok(raw)
}

/// Split an argument list at the top parenthesis level.
fn split_args(args: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    let mut in_string = false;
    for c in args.chars() {
        match c {
            '\'' => in_string = !in_string,
            '(' if !in_string => depth += 1,
            ')' if !in_string => depth = depth.saturating_sub(1),
            ',' if depth == 0 && !in_string => {
                parts.push(current.trim().to_string());
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

fn parse_ref(arg: &str) -> Option<usize> {
    arg.trim().strip_prefix('#')?.parse().ok()
}

fn parse_num(arg: &str) -> Option<f64> {
    arg.trim().parse().ok()
}

fn parse_bool(arg: &str) -> bool {
    arg.trim() == ".T."
}

fn parse_ref_list(arg: &str) -> Vec<usize> {
    let inner = arg.trim().trim_start_matches('(').trim_end_matches(')');
    split_args(inner).iter().filter_map(|a| parse_ref(a)).collect()
}

fn parse_num_triplet(arg: &str) -> Option<[f64; 3]> {
    let inner = arg.trim().trim_start_matches('(').trim_end_matches(')');
    let nums: Vec<f64> = split_args(inner).iter().filter_map(|a| parse_num(a)).collect();
    if nums.len() == 3 {
        Some([nums[0], nums[1], nums[2]])
    } else {
        None
    }
}

fn parse_entity(body: &str) -> Option<StepEntity> {
    let paren = body.find('(')?;
    let kind = body[..paren].trim();
    let close = body.rfind(')')?;
    let args = split_args(&body[paren + 1..close]);
    // The first argument of most entities is the name string.
    let a = |i: usize| args.get(i).map(|s| s.as_str()).unwrap_or("");

    match kind {
        "CARTESIAN_POINT" => {
            let c = parse_num_triplet(a(1))?;
            Some(StepEntity::CartesianPoint(Point3d::from_array(c)))
        }
        "DIRECTION" => {
            let c = parse_num_triplet(a(1))?;
            Some(StepEntity::Direction(Vec3::from_array(c)))
        }
        "AXIS2_PLACEMENT_3D" => Some(StepEntity::Axis2Placement {
            location: parse_ref(a(1))?,
            axis: parse_ref(a(2)),
            ref_direction: parse_ref(a(3)),
        }),
        "VECTOR" => Some(StepEntity::Vector {
            direction: parse_ref(a(1))?,
        }),
        "VERTEX_POINT" => Some(StepEntity::VertexPoint {
            point: parse_ref(a(1))?,
        }),
        "LINE" => Some(StepEntity::Line {
            point: parse_ref(a(1))?,
            vector: parse_ref(a(2))?,
        }),
        "CIRCLE" => Some(StepEntity::Circle {
            placement: parse_ref(a(1))?,
            radius: parse_num(a(2))?,
        }),
        "EDGE_CURVE" => Some(StepEntity::EdgeCurve {
            start: parse_ref(a(1))?,
            end: parse_ref(a(2))?,
            curve: parse_ref(a(3))?,
            same_sense: parse_bool(a(4)),
        }),
        "ORIENTED_EDGE" => Some(StepEntity::OrientedEdge {
            edge: parse_ref(a(3))?,
            orientation: parse_bool(a(4)),
        }),
        "EDGE_LOOP" => Some(StepEntity::EdgeLoop {
            edges: parse_ref_list(a(1)),
        }),
        "FACE_OUTER_BOUND" => Some(StepEntity::FaceBound {
            bound_loop: parse_ref(a(1))?,
            outer: true,
        }),
        "FACE_BOUND" => Some(StepEntity::FaceBound {
            bound_loop: parse_ref(a(1))?,
            outer: false,
        }),
        "PLANE" => Some(StepEntity::Plane {
            placement: parse_ref(a(1))?,
        }),
        "CYLINDRICAL_SURFACE" => Some(StepEntity::CylindricalSurface {
            placement: parse_ref(a(1))?,
            radius: parse_num(a(2))?,
        }),
        "CONICAL_SURFACE" => Some(StepEntity::ConicalSurface {
            placement: parse_ref(a(1))?,
            radius: parse_num(a(2))?,
            semi_angle: parse_num(a(3))?,
        }),
        "SPHERICAL_SURFACE" => Some(StepEntity::SphericalSurface {
            placement: parse_ref(a(1))?,
            radius: parse_num(a(2))?,
        }),
        "TOROIDAL_SURFACE" => Some(StepEntity::ToroidalSurface {
            placement: parse_ref(a(1))?,
            major_radius: parse_num(a(2))?,
            minor_radius: parse_num(a(3))?,
        }),
        "B_SPLINE_SURFACE" | "B_SPLINE_SURFACE_WITH_KNOTS" | "RATIONAL_B_SPLINE_SURFACE" => {
            Some(StepEntity::FreeFormSurface {
                kind: SurfaceKind::Bspline,
            })
        }
        "SURFACE_OF_LINEAR_EXTRUSION" | "SURFACE_OF_REVOLUTION" | "OFFSET_SURFACE" => {
            Some(StepEntity::FreeFormSurface {
                kind: SurfaceKind::Other,
            })
        }
        "ADVANCED_FACE" | "FACE_SURFACE" => Some(StepEntity::AdvancedFace {
            bounds: parse_ref_list(a(1)),
            surface: parse_ref(a(2))?,
            same_sense: parse_bool(a(3)),
        }),
        "CLOSED_SHELL" | "OPEN_SHELL" => Some(StepEntity::ClosedShell {
            faces: parse_ref_list(a(1)),
        }),
        "MANIFOLD_SOLID_BREP" | "BREP_WITH_VOIDS" => Some(StepEntity::ManifoldSolidBrep {
            shell: parse_ref(a(1))?,
        }),
        _ => None,
    }
}

struct ShapeAssembler<'a> {
    entities: &'a HashMap<usize, StepEntity>,
    store: EntityStore,
    vertex_map: HashMap<usize, VertexKey>,
    edge_map: HashMap<usize, EdgeKey>,
}

impl<'a> ShapeAssembler<'a> {
    fn get(&self, id: usize) -> Option<&StepEntity> {
        self.entities.get(&id)
    }

    fn point(&self, id: usize) -> Option<Point3d> {
        match self.get(id)? {
            StepEntity::CartesianPoint(p) => Some(*p),
            _ => None,
        }
    }

    fn direction(&self, id: usize) -> Option<Vec3> {
        match self.get(id)? {
            StepEntity::Direction(d) => d.normalized(),
            _ => None,
        }
    }

    /// Resolve a placement into (location, axis, ref_direction).
    fn placement(&self, id: usize) -> Option<(Point3d, Vec3, Vec3)> {
        let StepEntity::Axis2Placement { location, axis, ref_direction } = self.get(id)? else {
            return None;
        };
        let location = self.point(*location)?;
        let axis = axis.and_then(|a| self.direction(a)).unwrap_or(Vec3::Z);
        let ref_dir = ref_direction
            .and_then(|r| self.direction(r))
            .unwrap_or_else(|| axis.any_perpendicular());
        // Re-orthogonalize the reference direction against the axis.
        let ref_dir = (ref_dir - axis * ref_dir.dot(&axis))
            .normalized()
            .unwrap_or_else(|| axis.any_perpendicular());
        Some((location, axis, ref_dir))
    }

    fn curve(&self, id: usize) -> Option<Curve> {
        match self.get(id)? {
            StepEntity::Line { point, vector } => {
                let origin = self.point(*point)?;
                let StepEntity::Vector { direction } = self.get(*vector)? else {
                    return None;
                };
                Some(Curve::Line(Line3d::new(origin, self.direction(*direction)?)))
            }
            StepEntity::Circle { placement, radius } => {
                let (center, axis, ref_dir) = self.placement(*placement)?;
                Some(Curve::Circle(Circle3d::with_x_axis(center, axis, ref_dir, *radius)))
            }
            _ => None,
        }
    }

    fn surface(&self, id: usize) -> Option<(SurfaceKind, Option<Surface>)> {
        match self.get(id)? {
            StepEntity::Plane { placement } => {
                let (origin, normal, ref_dir) = self.placement(*placement)?;
                Some((
                    SurfaceKind::Plane,
                    Some(Surface::Plane(Plane::with_axes(origin, normal, ref_dir))),
                ))
            }
            StepEntity::CylindricalSurface { placement, radius } => {
                let (origin, axis, ref_dir) = self.placement(*placement)?;
                Some((
                    SurfaceKind::Cylinder,
                    Some(Surface::Cylinder(Cylinder {
                        origin,
                        axis,
                        ref_dir,
                        radius: *radius,
                    })),
                ))
            }
            StepEntity::ConicalSurface { placement, radius, semi_angle } => {
                let (origin, axis, ref_dir) = self.placement(*placement)?;
                let apex_offset = if semi_angle.tan().abs() > 1e-9 {
                    radius / semi_angle.tan()
                } else {
                    0.0
                };
                Some((
                    SurfaceKind::Cone,
                    Some(Surface::Cone(Cone {
                        apex: origin - axis * apex_offset,
                        axis,
                        ref_dir,
                        half_angle: *semi_angle,
                    })),
                ))
            }
            StepEntity::SphericalSurface { placement, radius } => {
                let (center, _, _) = self.placement(*placement)?;
                Some((SurfaceKind::Sphere, Some(Surface::Sphere(Sphere::new(center, *radius)))))
            }
            StepEntity::ToroidalSurface { placement, major_radius, minor_radius } => {
                let (center, axis, ref_dir) = self.placement(*placement)?;
                Some((
                    SurfaceKind::Torus,
                    Some(Surface::Torus(Torus {
                        center,
                        axis,
                        ref_dir,
                        major_radius: *major_radius,
                        minor_radius: *minor_radius,
                    })),
                ))
            }
            StepEntity::FreeFormSurface { kind } => Some((*kind, None)),
            _ => None,
        }
    }

    fn vertex(&mut self, id: usize) -> Option<VertexKey> {
        if let Some(&v) = self.vertex_map.get(&id) {
            return Some(v);
        }
        let StepEntity::VertexPoint { point } = self.get(id)? else {
            return None;
        };
        let p = self.point(*point)?;
        let v = self.store.add_vertex(p);
        self.vertex_map.insert(id, v);
        Some(v)
    }

    /// Curve parameter of a point, for edge trimming.
    fn curve_param(curve: &Curve, p: &Point3d) -> f64 {
        match curve {
            Curve::Line(l) => (*p - l.origin).dot(&l.direction),
            Curve::Circle(c) => {
                let d = *p - c.center;
                let y_axis = c.normal.cross(&c.x_axis);
                let t = d.dot(&y_axis).atan2(d.dot(&c.x_axis));
                if t < 0.0 {
                    t + TAU
                } else {
                    t
                }
            }
        }
    }

    fn edge(&mut self, id: usize) -> Option<EdgeKey> {
        if let Some(&e) = self.edge_map.get(&id) {
            return Some(e);
        }
        let StepEntity::EdgeCurve { start, end, curve, same_sense } = self.get(id)?.clone() else {
            return None;
        };
        let v_start = self.vertex(start)?;
        let v_end = self.vertex(end)?;
        let curve = self.curve(curve)?;
        let p_start = self.store.vertices[v_start].point;
        let p_end = self.store.vertices[v_end].point;

        let (t0, t1, kv0, kv1) = if start == end {
            // Closed edge over the full period.
            let t = Self::curve_param(&curve, &p_start);
            (t, t + TAU, v_start, v_end)
        } else {
            let ta = Self::curve_param(&curve, &p_start);
            let mut tb = Self::curve_param(&curve, &p_end);
            if curve.is_circle() {
                // Walk the arc in the direction the edge declares.
                if same_sense && tb <= ta {
                    tb += TAU;
                }
                if !same_sense && tb >= ta {
                    tb -= TAU;
                }
            }
            if ta <= tb {
                (ta, tb, v_start, v_end)
            } else {
                (tb, ta, v_end, v_start)
            }
        };

        let e = self.store.add_edge(Edge {
            curve,
            t_start: t0,
            t_end: t1,
            start: kv0,
            end: kv1,
        });
        self.edge_map.insert(id, e);
        Some(e)
    }

    fn boundary_loop(&mut self, loop_id: usize) -> Option<BoundaryLoop> {
        let StepEntity::EdgeLoop { edges } = self.get(loop_id)?.clone() else {
            return None;
        };
        let mut steps = Vec::new();
        for oe_id in edges {
            let StepEntity::OrientedEdge { edge, orientation } = self.get(oe_id)?.clone() else {
                continue;
            };
            let StepEntity::EdgeCurve { start, .. } = self.get(edge)?.clone() else {
                continue;
            };
            let key = self.edge(edge)?;
            // The loop walks the edge start->end when the oriented edge
            // says so; `forward` is relative to the stored parameter
            // direction.
            let stored_start_is_v1 = self
                .vertex_map
                .get(&start)
                .map(|&v| self.store.edges[key].start == v)
                .unwrap_or(true);
            let forward = orientation == stored_start_is_v1;
            steps.push(LoopStep { edge: key, forward });
        }
        Some(BoundaryLoop { steps })
    }

    fn face(&mut self, id: usize) -> Option<Face> {
        let StepEntity::AdvancedFace { bounds, surface, same_sense } = self.get(id)?.clone() else {
            return None;
        };
        let (kind, geom) = self.surface(surface).unwrap_or((SurfaceKind::Other, None));

        let mut outer = BoundaryLoop::default();
        let mut inners = Vec::new();
        for bound_id in bounds {
            let StepEntity::FaceBound { bound_loop, outer: is_outer } = self.get(bound_id)?.clone()
            else {
                continue;
            };
            if let Some(lp) = self.boundary_loop(bound_loop) {
                if is_outer && outer.steps.is_empty() {
                    outer = lp;
                } else {
                    inners.push(lp);
                }
            }
        }
        if outer.steps.is_empty() && !inners.is_empty() {
            outer = inners.remove(0);
        }

        let (u_range, v_range) = self.uv_domain_from_loops(geom.as_ref(), &outer, &inners);
        Some(Face {
            kind,
            geom,
            u_range,
            v_range,
            outer,
            inners,
            reversed: !same_sense,
        })
    }

    /// Derive a face's UV domain from its boundary vertices. Periodic
    /// directions span the full turn.
    fn uv_domain_from_loops(
        &self,
        geom: Option<&Surface>,
        outer: &BoundaryLoop,
        inners: &[BoundaryLoop],
    ) -> ((f64, f64), (f64, f64)) {
        let Some(surface) = geom else {
            return ((0.0, 1.0), (0.0, 1.0));
        };
        let mut v_min = f64::MAX;
        let mut v_max = f64::MIN;
        let mut u_min = f64::MAX;
        let mut u_max = f64::MIN;
        for lp in std::iter::once(outer).chain(inners.iter()) {
            for step in &lp.steps {
                let edge = &self.store.edges[step.edge];
                for t in [edge.t_start, edge.midpoint_param(), edge.t_end] {
                    let p = edge.curve.evaluate(t);
                    let (u, v) = surface.project(&p);
                    u_min = u_min.min(u);
                    u_max = u_max.max(u);
                    v_min = v_min.min(v);
                    v_max = v_max.max(v);
                }
            }
        }
        if u_min > u_max {
            u_min = 0.0;
            u_max = 1.0;
            v_min = 0.0;
            v_max = 1.0;
        }
        match surface {
            Surface::Plane(_) => ((u_min, u_max), (v_min, v_max)),
            Surface::Cylinder(_) | Surface::Cone(_) => ((0.0, TAU), (v_min, v_max)),
            Surface::Sphere(_) => ((0.0, TAU), (v_min.max(-1.55), v_max.min(1.55))),
            Surface::Torus(_) => ((0.0, TAU), (v_min, v_max)),
        }
    }
}

fn build_shape(entities: &HashMap<usize, StepEntity>) -> Result<Shape, KernelError> {
    let mut assembler = ShapeAssembler {
        entities,
        store: EntityStore::new(),
        vertex_map: HashMap::new(),
        edge_map: HashMap::new(),
    };

    // Prefer explicit solids; fall back to bare shells, then loose faces.
    let mut shell_face_lists: Vec<Vec<usize>> = Vec::new();
    let mut solid_ids: Vec<usize> = entities
        .iter()
        .filter_map(|(&id, e)| matches!(e, StepEntity::ManifoldSolidBrep { .. }).then_some(id))
        .collect();
    solid_ids.sort_unstable();
    for id in &solid_ids {
        if let Some(StepEntity::ManifoldSolidBrep { shell }) = entities.get(id) {
            if let Some(StepEntity::ClosedShell { faces }) = entities.get(shell) {
                shell_face_lists.push(faces.clone());
            }
        }
    }
    if shell_face_lists.is_empty() {
        let mut shell_ids: Vec<usize> = entities
            .iter()
            .filter_map(|(&id, e)| matches!(e, StepEntity::ClosedShell { .. }).then_some(id))
            .collect();
        shell_ids.sort_unstable();
        for id in shell_ids {
            if let Some(StepEntity::ClosedShell { faces }) = entities.get(&id) {
                shell_face_lists.push(faces.clone());
            }
        }
    }
    if shell_face_lists.is_empty() {
        let mut face_ids: Vec<usize> = entities
            .iter()
            .filter_map(|(&id, e)| matches!(e, StepEntity::AdvancedFace { .. }).then_some(id))
            .collect();
        face_ids.sort_unstable();
        if !face_ids.is_empty() {
            shell_face_lists.push(face_ids);
        }
    }

    let mut total_faces = 0usize;
    for face_ids in shell_face_lists {
        let shell = assembler.store.add_shell();
        for face_id in face_ids {
            match assembler.face(face_id) {
                Some(face) => {
                    let key = assembler.store.add_face(face);
                    assembler.store.push_face(shell, key);
                    total_faces += 1;
                }
                None => warn!(face_id, "dropping unparsable STEP face"),
            }
        }
    }

    if total_faces == 0 {
        return Err(KernelError::EmptyShape);
    }
    debug!(faces = total_faces, "assembled STEP shape");
    Ok(Shape::from_store(assembler.store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::SolidModel;

    const TRIANGLE_FACE: &str = r#"
ISO-10303-21;
HEADER;
ENDSEC;
DATA;
#1 = CARTESIAN_POINT('',(0.,0.,0.));
#2 = CARTESIAN_POINT('',(10.,0.,0.));
#3 = CARTESIAN_POINT('',(0.,10.,0.));
#4 = VERTEX_POINT('',#1);
#5 = VERTEX_POINT('',#2);
#6 = VERTEX_POINT('',#3);
#10 = DIRECTION('',(1.,0.,0.));
#11 = DIRECTION('',(0.,0.,1.));
#12 = VECTOR('',#10,1.);
#13 = DIRECTION('',(-0.7071,0.7071,0.));
#14 = VECTOR('',#13,1.);
#15 = DIRECTION('',(0.,-1.,0.));
#16 = VECTOR('',#15,1.);
#20 = LINE('',#1,#12);
#21 = LINE('',#2,#14);
#22 = LINE('',#3,#16);
#30 = EDGE_CURVE('',#4,#5,#20,.T.);
#31 = EDGE_CURVE('',#5,#6,#21,.T.);
#32 = EDGE_CURVE('',#6,#4,#22,.T.);
#40 = ORIENTED_EDGE('',*,*,#30,.T.);
#41 = ORIENTED_EDGE('',*,*,#31,.T.);
#42 = ORIENTED_EDGE('',*,*,#32,.T.);
#50 = EDGE_LOOP('',(#40,#41,#42));
#51 = FACE_OUTER_BOUND('',#50,.T.);
#60 = CARTESIAN_POINT('',(0.,0.,0.));
#61 = AXIS2_PLACEMENT_3D('',#60,#11,#10);
#62 = PLANE('',#61);
#70 = ADVANCED_FACE('',(#51),#62,.T.);
#80 = CLOSED_SHELL('',(#70));
#90 = MANIFOLD_SOLID_BREP('',#80);
ENDSEC;
END-ISO-10303-21;
"#;

    #[test]
    fn test_parse_triangle_face() {
        let shape = parse_step(TRIANGLE_FACE).unwrap();
        assert_eq!(shape.face_count(), 1);
        assert_eq!(shape.edge_count(), 3);
        assert_eq!(shape.vertex_count(), 3);
        assert_eq!(shape.surface_kind(0), SurfaceKind::Plane);
        assert!(!shape.is_reversed(0));
        assert!((shape.face_area(0) - 50.0).abs() < 1e-6);
    }

    #[test]
    fn test_missing_data_section() {
        assert!(matches!(
            parse_step("HEADER; nothing here"),
            Err(KernelError::StepParse { .. })
        ));
    }

    #[test]
    fn test_empty_data_is_empty_shape() {
        let contents = "DATA;\nENDSEC;";
        assert!(matches!(parse_step(contents), Err(KernelError::EmptyShape)));
    }
}
