//! Chamfer (bevel) recognition.
//!
//! Chamfers are small planar faces whose normals sit between the primary
//! axes: not axis-aligned (that would be a primary surface) and not
//! steeper than about 70 degrees from every axis (that would be a wall or
//! a shallow draft face). They carry linear edges and meet their support
//! faces at sharp angles.

use camber_aag::Aag;
use camber_kernel::SolidModel;

use crate::{Feature, FeatureIds};

/// Deviation from a 180-degree dihedral above which an adjacency is sharp.
const SHARP_DEVIATION_DEG: f64 = 20.0;
/// Normal component above this marks a principal-axis face.
const AXIS_ALIGNED: f64 = 0.99;
const AXIS_OFF: f64 = 0.1;
/// sin(~70 deg): larger components mean the face is too shallow.
const MAX_COMPONENT: f64 = 0.94;

pub fn recognize_chamfers(
    model: &dyn SolidModel,
    aag: &Aag,
    max_width: f64,
    ids: &mut FeatureIds,
) -> Vec<Feature> {
    let mut chamfers = Vec::new();
    for face in 0..aag.face_count() {
        if !aag.attributes(face).is_planar() {
            continue;
        }
        if is_chamfer_candidate(model, aag, face, max_width) {
            let width = chamfer_width(model, face);
            chamfers.push(make_chamfer(aag, face, width, ids));
        }
    }
    chamfers
}

fn is_chamfer_candidate(model: &dyn SolidModel, aag: &Aag, face: usize, max_width: f64) -> bool {
    let attrs = aag.attributes(face);
    let Some(plane) = &attrs.plane else {
        return false;
    };

    let nx = plane.normal.x.abs();
    let ny = plane.normal.y.abs();
    let nz = plane.normal.z.abs();
    let aligned_x = nx > AXIS_ALIGNED && ny < AXIS_OFF && nz < AXIS_OFF;
    let aligned_y = ny > AXIS_ALIGNED && nx < AXIS_OFF && nz < AXIS_OFF;
    let aligned_z = nz > AXIS_ALIGNED && nx < AXIS_OFF && ny < AXIS_OFF;
    if aligned_x || aligned_y || aligned_z {
        return false;
    }
    if nx.max(ny).max(nz) > MAX_COMPONENT {
        return false;
    }

    if attrs.area > max_width * max_width * 10.0 {
        return false;
    }

    let linear_edges = model
        .face_edges(face)
        .iter()
        .filter(|oe| model.edge(oe.edge).curve.is_line())
        .count();
    if linear_edges < 2 {
        return false;
    }

    let sharp_edges = aag
        .neighbors(face)
        .iter()
        .filter(|&&n| {
            let d = aag.dihedral_angle(face, n);
            (d - 180.0).abs() > SHARP_DEVIATION_DEG
        })
        .count();
    sharp_edges >= 2
}

/// Width estimate: the largest face bounding-box extent.
fn chamfer_width(model: &dyn SolidModel, face: usize) -> f64 {
    let e = model.face_bounding_box(face).extents();
    e[0].max(e[1]).max(e[2])
}

fn make_chamfer(aag: &Aag, face: usize, width: f64, ids: &mut FeatureIds) -> Feature {
    let attrs = aag.attributes(face);
    let normal = attrs.plane.map(|p| p.normal).unwrap_or(attrs.normal);
    let mut feature = Feature {
        id: ids.next("chamfer"),
        feature_type: "chamfer".into(),
        subtype: "bevel".into(),
        faces: vec![face],
        edges: Vec::new(),
        params: Default::default(),
        source: "chamfer_recognizer".into(),
        confidence: 0.80,
    };
    feature.params.insert("width_mm".into(), width);
    feature.params.insert("area_mm2".into(), attrs.area);
    feature.params.insert("normal_x".into(), normal.x);
    feature.params.insert("normal_y".into(), normal.y);
    feature.params.insert("normal_z".into(), normal.z);
    feature
}
