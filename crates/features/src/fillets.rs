//! Fillet (blend) recognition.
//!
//! Cylindrical and toroidal faces with a small radius qualify when their
//! boundary carries quarter-circle arcs and no full circles; the quarter
//! arcs are the blend's profile caps and separate fillets from holes,
//! whose rims are semicircular.

use camber_aag::Aag;
use camber_kernel::SolidModel;

use crate::{Feature, FeatureIds};

const ARC_TOL_DEG: f64 = 5.0;

pub fn recognize_fillets(
    model: &dyn SolidModel,
    aag: &Aag,
    max_radius: f64,
    ids: &mut FeatureIds,
) -> Vec<Feature> {
    let mut fillets = Vec::new();

    let mut candidates = aag.cylindrical_faces();
    candidates.extend(aag.toroidal_faces());
    candidates.sort_unstable();

    for face in candidates {
        let attrs = aag.attributes(face);
        let radius = if let Some(c) = &attrs.cylinder {
            c.radius
        } else if let Some(t) = &attrs.torus {
            t.minor_radius
        } else {
            continue;
        };
        if radius > max_radius {
            continue;
        }
        if !has_quarter_circle_profile(model, face) {
            continue;
        }
        fillets.push(make_fillet(aag, face, radius, ids));
    }

    fillets
}

/// At least one quarter arc and no full circles among the face's edges.
fn has_quarter_circle_profile(model: &dyn SolidModel, face: usize) -> bool {
    let mut quarters = 0;
    for oe in model.face_edges(face) {
        let edge = model.edge(oe.edge);
        if !edge.curve.is_circle() {
            continue;
        }
        if edge.is_full_circle() {
            return false;
        }
        if let Some(angle) = edge.arc_angle_deg() {
            if (angle - 90.0).abs() < ARC_TOL_DEG {
                quarters += 1;
            }
        }
    }
    quarters > 0
}

fn make_fillet(aag: &Aag, face: usize, radius: f64, ids: &mut FeatureIds) -> Feature {
    let attrs = aag.attributes(face);
    let mut feature = Feature {
        id: ids.next("fillet"),
        feature_type: "fillet".into(),
        subtype: String::new(),
        faces: vec![face],
        edges: Vec::new(),
        params: Default::default(),
        source: "fillet_recognizer".into(),
        confidence: 0.85,
    };
    feature.params.insert("radius_mm".into(), radius);

    if let Some(c) = &attrs.cylinder {
        feature.subtype = "blend".into();
        feature.params.insert("axis_x".into(), c.axis_dir.x);
        feature.params.insert("axis_y".into(), c.axis_dir.y);
        feature.params.insert("axis_z".into(), c.axis_dir.z);
    } else if let Some(t) = &attrs.torus {
        feature.subtype = "curved_blend".into();
        feature.params.insert("axis_x".into(), t.axis_dir.x);
        feature.params.insert("axis_y".into(), t.axis_dir.y);
        feature.params.insert("axis_z".into(), t.axis_dir.z);
        feature.params.insert("major_radius_mm".into(), t.major_radius);
    }
    feature
}

#[cfg(test)]
mod tests {
    use super::*;
    use camber_kernel::primitives::{plate_with_filleted_hole, plate_with_hole};

    #[test]
    fn test_torus_ring_is_curved_blend() {
        let shape = plate_with_filleted_hole(50.0, 50.0, 10.0, 5.0, 1.0, 25.0, 25.0);
        let aag = Aag::build(&shape);
        let mut ids = FeatureIds::new();
        let fillets = recognize_fillets(&shape, &aag, 10.0, &mut ids);
        assert_eq!(fillets.len(), 1);
        let f = &fillets[0];
        assert_eq!(f.subtype, "curved_blend");
        assert!((f.params["radius_mm"] - 1.0).abs() < 1e-9);
        assert!((f.params["major_radius_mm"] - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_hole_wall_is_not_a_fillet() {
        // The hole wall has semicircular rims, not quarter arcs.
        let shape = plate_with_hole(50.0, 50.0, 10.0, 5.0, 25.0, 25.0);
        let aag = Aag::build(&shape);
        let mut ids = FeatureIds::new();
        assert!(recognize_fillets(&shape, &aag, 10.0, &mut ids).is_empty());
    }

    #[test]
    fn test_radius_cap_filters_large_blends() {
        let shape = plate_with_filleted_hole(80.0, 80.0, 30.0, 5.0, 12.0, 40.0, 40.0);
        let aag = Aag::build(&shape);
        let mut ids = FeatureIds::new();
        assert!(recognize_fillets(&shape, &aag, 10.0, &mut ids).is_empty());
    }
}
