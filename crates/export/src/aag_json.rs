//! aag.json writer: a force-graph document over the shape topology.
//!
//! Nodes cover vertices, edges, faces, and shells; links connect
//! vertex-edge, edge-face, face-face (decorated with the dihedral angle
//! and its flags), and face-shell. Face nodes carry surface attributes,
//! edge-shape statistics, blend decoration, and recognizer flags so a
//! graph viewer can color by feature membership.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::{json, Map, Value};
use tracing::info;

use camber_aag::blend::{BlendAnalysis, Vexity};
use camber_aag::Aag;
use camber_features::Feature;
use camber_kernel::SolidModel;
use camber_thickness::ThicknessResult;

use crate::{write_file, ExportError};

const ARC_TOL_DEG: f64 = 5.0;

pub struct AagExport<'a> {
    pub model: &'a dyn SolidModel,
    pub aag: &'a Aag,
    pub blends: &'a BlendAnalysis,
    pub features: &'a [Feature],
    pub thickness: Option<&'a BTreeMap<usize, ThicknessResult>>,
}

pub fn export_aag(input: &AagExport<'_>, path: &Path) -> Result<(), ExportError> {
    let doc = build_document(input);
    let json = serde_json::to_string_pretty(&doc)?;
    write_file(path, json.as_bytes())?;
    info!(path = %path.display(), "wrote adjacency graph");
    Ok(())
}

fn build_document(input: &AagExport<'_>) -> Value {
    let model = input.model;
    let mut nodes = Vec::new();

    for v in 0..model.vertex_count() {
        let p = model.vertex_point(v);
        nodes.push(json!({
            "id": format!("vertex_{}", v),
            "name": format!("V{}", v),
            "group": "vertex",
            "color": "#4a90e2",
            "val": 3,
            "attributes": { "x": p.x, "y": p.y, "z": p.z },
        }));
    }

    for e in 0..model.edge_count() {
        nodes.push(edge_node(model, e));
    }

    for f in 0..model.face_count() {
        nodes.push(face_node(input, f));
    }

    for s in 0..model.shell_count() {
        nodes.push(json!({
            "id": format!("shell_{}", s),
            "name": format!("S{}", s),
            "group": "shell",
            "color": "#bd10e0",
            "val": 6,
            "attributes": { "type": "shell" },
        }));
    }

    let mut links = Vec::new();
    for e in 0..model.edge_count() {
        let (a, b) = model.edge_vertices(e);
        for v in [a, b] {
            links.push(json!({
                "source": format!("vertex_{}", v),
                "target": format!("edge_{}", e),
                "type": "vertex_edge",
            }));
        }
        for f in model.edge_faces(e) {
            links.push(json!({
                "source": format!("edge_{}", e),
                "target": format!("face_{}", f),
                "type": "edge_face",
            }));
        }
    }
    for arc in input.aag.edges() {
        links.push(json!({
            "source": format!("face_{}", arc.face1),
            "target": format!("face_{}", arc.face2),
            "type": "face_adjacency",
            "dihedral_angle": arc.dihedral_angle,
            "convex": arc.is_convex,
            "concave": arc.is_concave,
            "smooth": arc.is_smooth,
        }));
    }
    for f in 0..model.face_count() {
        links.push(json!({
            "source": format!("face_{}", f),
            "target": format!("shell_{}", model.face_shell(f)),
            "type": "face_shell",
        }));
    }

    let chains: Vec<Value> = input
        .blends
        .chains
        .iter()
        .map(|chain| {
            json!({
                "chain_id": chain.chain_id,
                "vexity": chain.vexity.label(),
                "face_count": chain.face_ids.len(),
                "max_radius": chain.max_radius,
                "min_radius": chain.min_radius,
                "face_ids": chain
                    .face_ids
                    .iter()
                    .map(|f| format!("face_{}", f))
                    .collect::<Vec<_>>(),
            })
        })
        .collect();

    json!({
        "nodes": nodes,
        "links": links,
        "blend_chains": chains,
        "stats": {
            "vertex": model.vertex_count(),
            "edge": model.edge_count(),
            "face": model.face_count(),
            "shell": model.shell_count(),
            "blend_chains": input.blends.chains.len(),
        },
    })
}

fn edge_node(model: &dyn SolidModel, e: usize) -> Value {
    let edge = model.edge(e);
    let mut attrs = Map::new();

    let (curve_type, length) = match &edge.curve {
        camber_kernel::Curve::Line(_) => ("line", edge.param_range().abs()),
        camber_kernel::Curve::Circle(c) => ("circle", c.radius * edge.param_range().abs()),
    };
    attrs.insert("curve_type".into(), json!(curve_type));
    attrs.insert("length".into(), json!(length));

    if let camber_kernel::Curve::Circle(circle) = &edge.curve {
        let arc_angle = edge.arc_angle_deg().unwrap_or(0.0);
        let full = edge.is_full_circle();
        attrs.insert("radius".into(), json!(circle.radius));
        attrs.insert("is_full_circle".into(), json!(full));
        attrs.insert("is_arc".into(), json!(!full));
        if !full {
            attrs.insert("arc_angle".into(), json!(arc_angle));
            attrs.insert(
                "is_semicircle".into(),
                json!((arc_angle - 180.0).abs() < 1.0),
            );
            attrs.insert(
                "is_quarter_circle".into(),
                json!((arc_angle - 90.0).abs() < 1.0),
            );
        }
        attrs.insert("center".into(), json!(circle.center.to_array()));
    }

    let start = edge.curve.evaluate(edge.t_start);
    let end = edge.curve.evaluate(edge.t_end);
    attrs.insert("start_point".into(), json!(start.to_array()));
    attrs.insert("end_point".into(), json!(end.to_array()));

    json!({
        "id": format!("edge_{}", e),
        "name": format!("E{}", e),
        "group": "edge",
        "color": "#50c878",
        "val": 4,
        "attributes": attrs,
    })
}

fn face_node(input: &AagExport<'_>, f: usize) -> Value {
    let model = input.model;
    let attrs_in = input.aag.attributes(f);
    let mut attrs = Map::new();

    attrs.insert("area".into(), json!(attrs_in.area));
    attrs.insert("surface_type".into(), json!(attrs_in.surface_kind.label()));

    if let Some(cyl) = &attrs_in.cylinder {
        attrs.insert("radius".into(), json!(cyl.radius));
        if let Some(candidate) = input.blends.candidates.get(&f) {
            attrs.insert(
                "is_internal_cylinder".into(),
                json!(candidate.vexity == Vexity::Concave),
            );
        }
    }
    if attrs_in.normal.length() > 0.5 {
        attrs.insert("normal".into(), json!(attrs_in.normal.to_array()));
    }

    // Edge-shape statistics distinguishing fillets from holes.
    let mut edge_count = 0usize;
    let mut full_circles = 0usize;
    let mut arcs = 0usize;
    let mut quarters = 0usize;
    let mut semis = 0usize;
    for oe in model.face_edges(f) {
        edge_count += 1;
        let edge = model.edge(oe.edge);
        if !edge.curve.is_circle() {
            continue;
        }
        if edge.is_full_circle() {
            full_circles += 1;
        } else if let Some(angle) = edge.arc_angle_deg() {
            arcs += 1;
            if (angle - 90.0).abs() < ARC_TOL_DEG {
                quarters += 1;
            } else if (angle - 180.0).abs() < ARC_TOL_DEG {
                semis += 1;
            }
        }
    }
    attrs.insert("edge_count".into(), json!(edge_count));
    attrs.insert("has_full_circle_edges".into(), json!(full_circles > 0));
    attrs.insert("has_arc_edges".into(), json!(arcs > 0));
    if arcs > 0 {
        attrs.insert("arc_edge_count".into(), json!(arcs));
    }
    if quarters > 0 {
        attrs.insert("quarter_circle_edge_count".into(), json!(quarters));
    }
    if semis > 0 {
        attrs.insert("semicircle_edge_count".into(), json!(semis));
    }

    for feature in input.features {
        if !feature.faces.contains(&f) {
            continue;
        }
        match feature.feature_type.as_str() {
            "cavity" => {
                attrs.insert("is_cavity_face".into(), json!(true));
            }
            "thin_wall" => {
                attrs.insert("is_thin_wall_face".into(), json!(true));
                attrs.insert("thin_wall_id".into(), json!(feature.id));
                attrs.insert("thin_wall_subtype".into(), json!(feature.subtype));
                if let Some(t) = feature.params.get("avg_thickness") {
                    attrs.insert("wall_thickness".into(), json!(t));
                }
            }
            _ => {}
        }
    }

    if let Some(candidate) = input.blends.candidates.get(&f) {
        attrs.insert("is_blend_candidate".into(), json!(true));
        attrs.insert("blend_chain_id".into(), json!(candidate.chain_id));
        attrs.insert("blend_vexity".into(), json!(candidate.vexity.label()));
        if !candidate.smooth_edges.is_empty() {
            attrs.insert("smooth_edge_count".into(), json!(candidate.smooth_edges.len()));
        }
        if !candidate.spring_edges.is_empty() {
            attrs.insert("spring_edge_count".into(), json!(candidate.spring_edges.len()));
        }
        if !candidate.cross_edges.is_empty() {
            attrs.insert("cross_edge_count".into(), json!(candidate.cross_edges.len()));
        }
        if !candidate.term_edges.is_empty() {
            attrs.insert("term_edge_count".into(), json!(candidate.term_edges.len()));
        }
    }

    if let Some(results) = input.thickness {
        if let Some(r) = results.get(&f) {
            if r.has_measurement {
                attrs.insert("local_thickness".into(), json!(r.thickness));
            }
        }
    }

    json!({
        "id": format!("face_{}", f),
        "name": format!("F{}", f),
        "group": "face",
        "color": "#f5a623",
        "val": 5,
        "attributes": attrs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use camber_aag::blend::classify_blends;
    use camber_kernel::primitives::plate_with_hole;

    #[test]
    fn test_graph_document_structure() {
        let shape = plate_with_hole(50.0, 50.0, 10.0, 5.0, 25.0, 25.0);
        let aag = Aag::build(&shape);
        let blends = classify_blends(&shape, &aag);
        let doc = build_document(&AagExport {
            model: &shape,
            aag: &aag,
            blends: &blends,
            features: &[],
            thickness: None,
        });

        let stats = &doc["stats"];
        assert_eq!(stats["face"], 7);
        let nodes = doc["nodes"].as_array().unwrap();
        let total = shape.vertex_count() + shape.edge_count() + 7 + shape.shell_count();
        assert_eq!(nodes.len(), total);

        // Face-face links carry the dihedral decoration.
        let links = doc["links"].as_array().unwrap();
        let adjacency: Vec<&Value> = links
            .iter()
            .filter(|l| l["type"] == "face_adjacency")
            .collect();
        assert_eq!(adjacency.len(), aag.edge_count());
        for l in &adjacency {
            assert!(l["dihedral_angle"].is_number());
            assert!(l["convex"].is_boolean());
        }

        // The hole wall is flagged internal.
        let cyl_node = nodes
            .iter()
            .find(|n| n["attributes"]["surface_type"] == "cylinder")
            .unwrap();
        assert_eq!(cyl_node["attributes"]["is_internal_cylinder"], true);
        assert_eq!(cyl_node["attributes"]["semicircle_edge_count"], 4);
    }

    #[test]
    fn test_feature_flags_decorate_faces() {
        let shape = plate_with_hole(50.0, 50.0, 10.0, 5.0, 25.0, 25.0);
        let aag = Aag::build(&shape);
        let blends = classify_blends(&shape, &aag);
        let feature = Feature {
            id: "cavity_0000".into(),
            feature_type: "cavity".into(),
            subtype: "pocket".into(),
            faces: vec![0, 1],
            edges: vec![],
            params: Default::default(),
            source: "cavity_recognizer".into(),
            confidence: 0.7,
        };
        let doc = build_document(&AagExport {
            model: &shape,
            aag: &aag,
            blends: &blends,
            features: &[feature],
            thickness: None,
        });
        let nodes = doc["nodes"].as_array().unwrap();
        let face0 = nodes.iter().find(|n| n["id"] == "face_0").unwrap();
        assert_eq!(face0["attributes"]["is_cavity_face"], true);
    }
}
