//! Drilled-hole recognition.
//!
//! A cylindrical face is a hole candidate when it is internal (the
//! corrected normal points at the axis), carries semicircular concentric
//! rim arcs, and has no quarter-circle arcs (those belong to fillet
//! caps). Coaxial internal neighbors group into counterbored holes.

use std::collections::BTreeSet;

use tracing::debug;

use camber_aag::{Aag, CylinderAttr};
use camber_kernel::{Line3d, SolidModel};

use crate::{Feature, FeatureIds};

/// Center-to-axis distance below which a rim arc counts as concentric.
const CONCENTRIC_TOL: f64 = 1e-3;
/// Arc-angle tolerance for semicircle / quarter-circle classification.
const ARC_TOL_DEG: f64 = 5.0;
/// Axis coincidence: 1 degree angular, 1e-6 lateral.
const AXIS_ANG_TOL_DEG: f64 = 1.0;
const AXIS_LIN_TOL: f64 = 1e-6;

pub fn recognize_holes(
    model: &dyn SolidModel,
    aag: &Aag,
    excluded_faces: &BTreeSet<usize>,
    ids: &mut FeatureIds,
) -> Vec<Feature> {
    let mut holes = Vec::new();
    let mut traversed: BTreeSet<usize> = BTreeSet::new();

    for face in aag.cylindrical_faces() {
        if traversed.contains(&face) {
            continue;
        }
        if excluded_faces.contains(&face) {
            debug!(face, "skipping excluded face");
            continue;
        }
        let Some(cyl) = aag.attributes(face).cylinder else {
            continue;
        };
        if !is_internal(model, aag, face) {
            continue;
        }
        if !has_semicircular_rim(model, aag, face) {
            continue;
        }

        let group = collect_coaxial(model, aag, face, &traversed);
        for &f in &group {
            traversed.insert(f);
        }
        if group.len() > 1 {
            holes.push(counterbored_hole(aag, &group, ids));
        } else {
            holes.push(simple_hole(face, &cyl, ids));
        }
    }

    holes
}

/// Internal iff the corrected midpoint normal opposes the radial direction
/// from the axis to the sample point.
pub(crate) fn is_internal(model: &dyn SolidModel, aag: &Aag, face: usize) -> bool {
    let Some(cyl) = aag.attributes(face).cylinder else {
        return false;
    };
    let ((u0, u1), (v0, v1)) = model.uv_domain(face);
    let Some(sample) = model.evaluate(face, (u0 + u1) * 0.5, (v0 + v1) * 0.5) else {
        return false;
    };
    let Some(normal) = sample.normal.normalized() else {
        return false;
    };
    let normal = if model.is_reversed(face) { -normal } else { normal };

    let to_point = sample.point - cyl.axis_origin;
    let radial = to_point - cyl.axis_dir * to_point.dot(&cyl.axis_dir);
    match radial.normalized() {
        Some(radial) => normal.dot(&radial) < 0.0,
        None => false,
    }
}

/// Semicircular concentric arcs present, quarter arcs absent.
fn has_semicircular_rim(model: &dyn SolidModel, aag: &Aag, face: usize) -> bool {
    let Some(cyl) = aag.attributes(face).cylinder else {
        return false;
    };
    let axis = Line3d::new(cyl.axis_origin, cyl.axis_dir);

    let mut semicircles = 0;
    let mut quarters = 0;
    for oe in model.face_edges(face) {
        let edge = model.edge(oe.edge);
        let camber_kernel::Curve::Circle(circle) = &edge.curve else {
            continue;
        };
        if axis.distance_to_point(&circle.center) >= CONCENTRIC_TOL {
            continue;
        }
        if edge.is_full_circle() {
            continue;
        }
        let Some(angle) = edge.arc_angle_deg() else {
            continue;
        };
        if (angle - 180.0).abs() < ARC_TOL_DEG {
            semicircles += 1;
        } else if (angle - 90.0).abs() < ARC_TOL_DEG {
            quarters += 1;
        }
    }
    semicircles > 0 && quarters == 0
}

pub(crate) fn axes_coincident(a: &CylinderAttr, b: &CylinderAttr) -> bool {
    let dot = a.axis_dir.dot(&b.axis_dir).abs();
    if (dot - 1.0).abs() > AXIS_ANG_TOL_DEG.to_radians().sin() {
        return false;
    }
    let between = b.axis_origin - a.axis_origin;
    if between.length() < AXIS_LIN_TOL {
        return true;
    }
    between.cross(&a.axis_dir).length() < AXIS_LIN_TOL
}

/// Recursively collect unvisited internal cylindrical neighbors whose axes
/// coincide with the seed's.
fn collect_coaxial(
    model: &dyn SolidModel,
    aag: &Aag,
    seed: usize,
    traversed: &BTreeSet<usize>,
) -> Vec<usize> {
    let Some(seed_cyl) = aag.attributes(seed).cylinder else {
        return vec![seed];
    };
    let mut collected = vec![seed];
    let mut stack = vec![seed];

    while let Some(current) = stack.pop() {
        for &neighbor in aag.neighbors(current) {
            if traversed.contains(&neighbor) || collected.contains(&neighbor) {
                continue;
            }
            let Some(cyl) = aag.attributes(neighbor).cylinder else {
                continue;
            };
            if !axes_coincident(&seed_cyl, &cyl) {
                continue;
            }
            if !is_internal(model, aag, neighbor) {
                continue;
            }
            collected.push(neighbor);
            stack.push(neighbor);
        }
    }
    collected
}

fn simple_hole(face: usize, cyl: &CylinderAttr, ids: &mut FeatureIds) -> Feature {
    let mut feature = Feature {
        id: ids.next("hole"),
        feature_type: "hole".into(),
        subtype: "simple".into(),
        faces: vec![face],
        edges: Vec::new(),
        params: Default::default(),
        source: "hole_recognizer".into(),
        confidence: 0.95,
    };
    feature.params.insert("diameter_mm".into(), 2.0 * cyl.radius);
    feature.params.insert("radius_mm".into(), cyl.radius);
    feature.params.insert("axis_x".into(), cyl.axis_dir.x);
    feature.params.insert("axis_y".into(), cyl.axis_dir.y);
    feature.params.insert("axis_z".into(), cyl.axis_dir.z);
    feature
}

fn counterbored_hole(aag: &Aag, faces: &[usize], ids: &mut FeatureIds) -> Feature {
    let min_radius = faces
        .iter()
        .filter_map(|&f| aag.attributes(f).cylinder.map(|c| c.radius))
        .fold(f64::MAX, f64::min);
    let mut feature = Feature {
        id: ids.next("hole"),
        feature_type: "hole".into(),
        subtype: "counterbored".into(),
        faces: faces.to_vec(),
        edges: Vec::new(),
        params: Default::default(),
        source: "hole_recognizer".into(),
        confidence: 0.95,
    };
    feature.params.insert("diameter_mm".into(), 2.0 * min_radius);
    feature.params.insert("radius_mm".into(), min_radius);
    feature.params.insert("bore_count".into(), faces.len() as f64);
    feature
}

#[cfg(test)]
mod tests {
    use super::*;
    use camber_kernel::primitives::{
        counterbored_plate, make_box, plate_with_hole, plate_with_split_bore,
    };

    #[test]
    fn test_simple_through_hole() {
        let shape = plate_with_hole(50.0, 50.0, 10.0, 5.0, 25.0, 25.0);
        let aag = Aag::build(&shape);
        let mut ids = FeatureIds::new();
        let holes = recognize_holes(&shape, &aag, &BTreeSet::new(), &mut ids);
        assert_eq!(holes.len(), 1);
        let hole = &holes[0];
        assert_eq!(hole.subtype, "simple");
        assert!((hole.params["diameter_mm"] - 10.0).abs() < 1e-9);
        assert_eq!(hole.id, "hole_0000");
    }

    #[test]
    fn test_no_holes_in_plain_box() {
        let shape = make_box(100.0, 100.0, 100.0);
        let aag = Aag::build(&shape);
        let mut ids = FeatureIds::new();
        assert!(recognize_holes(&shape, &aag, &BTreeSet::new(), &mut ids).is_empty());
    }

    #[test]
    fn test_split_bore_groups_into_counterbored() {
        let shape = plate_with_split_bore(60.0, 60.0, 30.0, 5.0, 12.0, 30.0, 30.0);
        let aag = Aag::build(&shape);
        let mut ids = FeatureIds::new();
        let holes = recognize_holes(&shape, &aag, &BTreeSet::new(), &mut ids);
        assert_eq!(holes.len(), 1);
        let hole = &holes[0];
        assert_eq!(hole.subtype, "counterbored");
        assert_eq!(hole.faces.len(), 2);
        assert!((hole.params["diameter_mm"] - 10.0).abs() < 1e-9);
        assert!((hole.params["bore_count"] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_shouldered_counterbore_reports_each_bore() {
        // The shoulder annulus separates the two bores, so the coaxial
        // walk (which only crosses shared edges) reports them separately.
        let shape = counterbored_plate(60.0, 60.0, 30.0, 5.0, 10.0, 18.0, 30.0, 30.0);
        let aag = Aag::build(&shape);
        let mut ids = FeatureIds::new();
        let holes = recognize_holes(&shape, &aag, &BTreeSet::new(), &mut ids);
        assert_eq!(holes.len(), 2);
        assert!(holes.iter().all(|h| h.subtype == "simple"));
    }

    #[test]
    fn test_excluded_face_is_skipped() {
        let shape = plate_with_hole(50.0, 50.0, 10.0, 5.0, 25.0, 25.0);
        let aag = Aag::build(&shape);
        let excluded: BTreeSet<usize> = aag.cylindrical_faces().into_iter().collect();
        let mut ids = FeatureIds::new();
        assert!(recognize_holes(&shape, &aag, &excluded, &mut ids).is_empty());
    }
}
