//! Face accessibility for molding and machining.
//!
//! Molding combines three undercut signals: negative draft angle, shadow
//! from geometry ahead of the face along the pull direction, and a
//! blocked escape ray. CNC accessibility tests the six axis directions;
//! exposure scores sample all 26 lattice directions.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info};

use camber_kernel::{midpoint_normal, Point3d, SolidModel, Vec3};
use camber_ray::RayScene;

/// Offset applied along the face normal before casting escape rays.
const RAY_OFFSET: f64 = 0.1;
/// Escape rays search this far; reaching it without a hit means clear.
const MAX_RAY: f64 = 1000.0;
/// Shadow test: minimum projection ahead along the pull direction.
const SHADOW_AHEAD: f64 = 0.5;
/// Shadow test: maximum lateral offset.
const SHADOW_LATERAL: f64 = 10.0;
/// Draft angles below this mark a side-action candidate.
const SIDE_ACTION_DRAFT_DEG: f64 = -2.0;
/// Side actions only matter on faces above this area.
const SIDE_ACTION_MIN_AREA: f64 = 10.0;

/// Per-face accessibility verdicts.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AccessibilityResult {
    pub face_id: usize,
    pub is_accessible_molding: bool,
    pub is_accessible_cnc: bool,
    pub requires_side_action: bool,
    /// Fraction of probe directions that reach the face.
    pub accessibility_score: f64,
    /// Verdicts keyed by direction label ("+X" .. "-Z", "draft").
    pub accessible_from_direction: BTreeMap<String, bool>,
}

/// Signed draft angle of one face against the pull direction, degrees.
/// Positive drafts demold; negative drafts undercut.
pub fn draft_angle(model: &dyn SolidModel, face: usize, draft_dir: &Vec3) -> f64 {
    let Some(normal) = midpoint_normal(model, face) else {
        return 0.0;
    };
    let angle = normal.dot(draft_dir).clamp(-1.0, 1.0).acos().to_degrees();
    90.0 - angle
}

/// Draft angles for every face.
pub fn analyze_draft_angles(model: &dyn SolidModel, draft_dir: &Vec3) -> BTreeMap<usize, f64> {
    (0..model.face_count())
        .map(|f| (f, draft_angle(model, f, draft_dir)))
        .collect()
}

/// Overhang angle from the +Z build direction, degrees; 0 is the worst
/// (horizontal downward-facing), 90 is vertical.
pub fn analyze_overhangs(model: &dyn SolidModel) -> BTreeMap<usize, f64> {
    (0..model.face_count())
        .map(|f| {
            let angle = match midpoint_normal(model, f) {
                Some(n) => n.dot(&Vec3::Z).clamp(-1.0, 1.0).acos().to_degrees(),
                None => 90.0,
            };
            (f, angle)
        })
        .collect()
}

/// A face sees a direction when it faces it and an offset escape ray
/// leaves the part without hitting anything.
fn face_accessible_from(
    model: &dyn SolidModel,
    scene: &RayScene,
    face: usize,
    direction: &Vec3,
) -> bool {
    let Some(normal) = midpoint_normal(model, face) else {
        return false;
    };
    if normal.dot(direction) > 0.0 {
        return false;
    }
    let start = model.face_centroid(face) + normal * RAY_OFFSET;
    scene.cast_ray(&start, &(-*direction), MAX_RAY).is_none()
}

/// Faces with other geometry ahead of them along the pull direction and
/// laterally close: candidates blocked by overhanging material.
fn shadow_set(model: &dyn SolidModel, draft_dir: &Vec3) -> Vec<bool> {
    let count = model.face_count();
    let centroids: Vec<Point3d> = (0..count).map(|f| model.face_centroid(f)).collect();
    let mut shadowed = vec![false; count];
    for i in 0..count {
        for j in 0..count {
            if i == j {
                continue;
            }
            let between = centroids[j] - centroids[i];
            let ahead = between.dot(draft_dir);
            if ahead <= SHADOW_AHEAD {
                continue;
            }
            let lateral = between - *draft_dir * ahead;
            if lateral.length() < SHADOW_LATERAL {
                shadowed[i] = true;
                break;
            }
        }
    }
    shadowed
}

/// Molding accessibility against a pull direction.
pub fn analyze_molding_accessibility(
    model: &dyn SolidModel,
    scene: &RayScene,
    draft_dir: &Vec3,
) -> BTreeMap<usize, AccessibilityResult> {
    let shadowed = shadow_set(model, draft_dir);
    let mut results = BTreeMap::new();
    let mut undercuts = 0usize;
    let mut side_actions = 0usize;

    for face in 0..model.face_count() {
        let draft = draft_angle(model, face, draft_dir);
        let accessible = face_accessible_from(model, scene, face, &(-*draft_dir));
        let is_undercut = draft < 0.0 || shadowed[face] || !accessible;

        let requires_side_action = draft < SIDE_ACTION_DRAFT_DEG
            && !accessible
            && model.face_area(face) > SIDE_ACTION_MIN_AREA;

        if is_undercut {
            undercuts += 1;
        }
        if requires_side_action {
            side_actions += 1;
        }

        let mut result = AccessibilityResult {
            face_id: face,
            is_accessible_molding: !is_undercut,
            is_accessible_cnc: true,
            requires_side_action,
            accessibility_score: if is_undercut { 0.0 } else { 1.0 },
            accessible_from_direction: BTreeMap::new(),
        };
        result
            .accessible_from_direction
            .insert("draft".into(), accessible);
        results.insert(face, result);
    }

    info!(undercuts, side_actions, "molding accessibility");
    results
}

const CNC_DIRECTIONS: [(&str, Vec3); 6] = [
    ("+X", Vec3 { x: 1.0, y: 0.0, z: 0.0 }),
    ("-X", Vec3 { x: -1.0, y: 0.0, z: 0.0 }),
    ("+Y", Vec3 { x: 0.0, y: 1.0, z: 0.0 }),
    ("-Y", Vec3 { x: 0.0, y: -1.0, z: 0.0 }),
    ("+Z", Vec3 { x: 0.0, y: 0.0, z: 1.0 }),
    ("-Z", Vec3 { x: 0.0, y: 0.0, z: -1.0 }),
];

/// Three-axis machining accessibility: the six tool directions per face.
pub fn analyze_cnc_accessibility(
    model: &dyn SolidModel,
    scene: &RayScene,
) -> BTreeMap<usize, AccessibilityResult> {
    let mut results = BTreeMap::new();
    let mut inaccessible = 0usize;

    for face in 0..model.face_count() {
        let mut result = AccessibilityResult {
            face_id: face,
            ..Default::default()
        };
        let mut reachable = 0usize;
        for (label, dir) in &CNC_DIRECTIONS {
            let ok = face_accessible_from(model, scene, face, dir);
            result.accessible_from_direction.insert((*label).into(), ok);
            if ok {
                reachable += 1;
            }
        }
        result.is_accessible_cnc = reachable > 0;
        result.is_accessible_molding = true;
        result.accessibility_score = reachable as f64 / CNC_DIRECTIONS.len() as f64;
        if !result.is_accessible_cnc {
            inaccessible += 1;
        }
        results.insert(face, result);
    }

    debug!(inaccessible, "cnc accessibility");
    results
}

/// Exposure score per face over the 26 lattice directions.
pub fn compute_accessibility_scores(
    model: &dyn SolidModel,
    scene: &RayScene,
) -> BTreeMap<usize, f64> {
    let mut directions = Vec::with_capacity(26);
    for dx in -1i32..=1 {
        for dy in -1i32..=1 {
            for dz in -1i32..=1 {
                if dx == 0 && dy == 0 && dz == 0 {
                    continue;
                }
                directions
                    .push(Vec3::new(dx as f64, dy as f64, dz as f64).normalize());
            }
        }
    }

    (0..model.face_count())
        .map(|face| {
            let reachable = directions
                .iter()
                .filter(|d| face_accessible_from(model, scene, face, d))
                .count();
            (face, reachable as f64 / directions.len() as f64)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use camber_kernel::primitives::{l_bracket, make_box};

    fn scene_for(shape: &camber_kernel::Shape) -> RayScene {
        RayScene::build(&shape.tessellate(0.05, 0.4)).unwrap()
    }

    #[test]
    fn test_cnc_score_is_direction_fraction() {
        let shape = make_box(30.0, 30.0, 30.0);
        let scene = scene_for(&shape);
        let results = analyze_cnc_accessibility(&shape, &scene);
        for r in results.values() {
            assert!((0.0..=1.0).contains(&r.accessibility_score));
            let reachable = r
                .accessible_from_direction
                .values()
                .filter(|&&ok| ok)
                .count();
            assert!((r.accessibility_score - reachable as f64 / 6.0).abs() < 1e-12);
            // Every face of a free-standing box is reachable.
            assert!(r.is_accessible_cnc);
        }
    }

    #[test]
    fn test_box_faces_have_positive_draft_or_neutral() {
        let shape = make_box(30.0, 30.0, 30.0);
        let drafts = analyze_draft_angles(&shape, &Vec3::Z);
        // Top face: +90, bottom: -90, sides: 0.
        let values: Vec<i64> = drafts.values().map(|d| d.round() as i64).collect();
        assert!(values.contains(&90));
        assert!(values.contains(&-90));
        assert_eq!(values.iter().filter(|&&v| v == 0).count(), 4);
    }

    #[test]
    fn test_l_bracket_overhang_is_undercut_with_side_action() {
        let shape = l_bracket();
        let scene = scene_for(&shape);
        let results = analyze_molding_accessibility(&shape, &scene, &Vec3::Z);

        // The arm underside: downward normal, high up, blocked below.
        let overhang = (0..shape.face_count())
            .find(|&f| {
                let n = midpoint_normal(&shape, f).unwrap();
                n.z < -0.99 && shape.face_centroid(f).z > 35.0
            })
            .expect("arm underside");
        let r = &results[&overhang];
        assert!(!r.is_accessible_molding, "overhang must be an undercut");
        assert!(r.requires_side_action);

        // The top of the arm demolds freely.
        let top = (0..shape.face_count())
            .find(|&f| {
                let n = midpoint_normal(&shape, f).unwrap();
                n.z > 0.99 && shape.face_centroid(f).z > 45.0
            })
            .expect("arm top");
        assert!(results[&top].is_accessible_molding);
    }

    #[test]
    fn test_overhang_angles() {
        let shape = make_box(20.0, 20.0, 20.0);
        let overhangs = analyze_overhangs(&shape);
        let values: Vec<i64> = overhangs.values().map(|d| d.round() as i64).collect();
        // Top face 0 degrees from +Z, bottom 180, sides 90.
        assert!(values.contains(&0));
        assert!(values.contains(&180));
        assert_eq!(values.iter().filter(|&&v| v == 90).count(), 4);
    }

    #[test]
    fn test_exposure_scores_in_unit_range() {
        let shape = make_box(20.0, 20.0, 20.0);
        let scene = scene_for(&shape);
        for (_, score) in compute_accessibility_scores(&shape, &scene) {
            assert!((0.0..=1.0).contains(&score));
        }
    }
}
