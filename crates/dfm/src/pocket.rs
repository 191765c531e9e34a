//! Pocket depth and classification for recognized cavities.
//!
//! The opening is found from adjacency: cavity faces whose share of
//! out-of-set neighbors approaches the maximum form the entrance. Depth
//! is measured from the opening plane; the aspect ratio against the
//! opening diameter drives the classification.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, info};

use camber_aag::Aag;
use camber_kernel::{midpoint_normal, BoundingBox, Plane, Point3d, SolidModel, Vec3};

/// Opening membership: faces at or above this share of the maximum
/// external-adjacency ratio.
const OPENING_RATIO_FRACTION: f64 = 0.8;
/// Cavity AABB span fraction that marks a through-hole.
const THROUGH_SPAN: f64 = 0.8;
/// Aspect ratios above this make a pocket deep.
const DEEP_ASPECT: f64 = 2.0;
/// Openings narrower than this are narrow.
const NARROW_OPENING: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PocketType {
    ThroughHole,
    BlindPocket,
    ShallowRecess,
    DeepCavity,
}

impl PocketType {
    pub fn label(&self) -> &'static str {
        match self {
            PocketType::ThroughHole => "THROUGH_HOLE",
            PocketType::BlindPocket => "BLIND_POCKET",
            PocketType::ShallowRecess => "SHALLOW_RECESS",
            PocketType::DeepCavity => "DEEP_CAVITY",
        }
    }
}

/// Depth metrics for one pocket.
#[derive(Debug, Clone, Serialize)]
pub struct PocketDepthResult {
    pub pocket_id: usize,
    pub face_ids: Vec<usize>,
    pub depth: f64,
    pub opening_diameter: f64,
    pub aspect_ratio: f64,
    pub volume: f64,
    pub pocket_type: PocketType,
    pub is_through_hole: bool,
    pub is_deep: bool,
    pub is_narrow: bool,
    pub opening_faces: Vec<usize>,
    pub opening_centroid: Point3d,
    pub opening_normal: Vec3,
    pub accessibility_score: f64,
}

/// Analyze each cavity face set.
pub fn analyze_pockets(
    model: &dyn SolidModel,
    aag: &Aag,
    cavity_face_sets: &[BTreeSet<usize>],
) -> BTreeMap<usize, PocketDepthResult> {
    let mut results = BTreeMap::new();
    for (id, faces) in cavity_face_sets.iter().enumerate() {
        let mut result = analyze_single_pocket(model, aag, faces);
        result.pocket_id = id;
        info!(
            pocket = id,
            depth = result.depth,
            opening = result.opening_diameter,
            kind = result.pocket_type.label(),
            "pocket analyzed"
        );
        results.insert(id, result);
    }
    results
}

pub fn analyze_single_pocket(
    model: &dyn SolidModel,
    aag: &Aag,
    faces: &BTreeSet<usize>,
) -> PocketDepthResult {
    let mut result = PocketDepthResult {
        pocket_id: 0,
        face_ids: faces.iter().copied().collect(),
        depth: 0.0,
        opening_diameter: 0.0,
        aspect_ratio: 0.0,
        volume: 0.0,
        pocket_type: PocketType::ShallowRecess,
        is_through_hole: false,
        is_deep: false,
        is_narrow: false,
        opening_faces: Vec::new(),
        opening_centroid: Point3d::ORIGIN,
        opening_normal: Vec3::Z,
        accessibility_score: 0.5,
    };
    if faces.is_empty() {
        return result;
    }

    let opening = find_opening_faces(aag, faces);
    if opening.is_empty() {
        debug!("pocket has no opening faces");
        return result;
    }
    result.opening_faces = opening.iter().copied().collect();

    let plane = opening_plane(model, &opening);
    result.opening_normal = plane.normal;
    result.opening_centroid = plane.origin;

    result.depth = faces
        .iter()
        .map(|&f| plane.signed_distance(&model.face_centroid(f)).abs())
        .fold(0.0, f64::max);

    result.opening_diameter = opening_diameter(model, &opening);
    result.is_through_hole = is_through_hole(model, faces);
    result.aspect_ratio = if result.opening_diameter > 0.1 {
        result.depth / result.opening_diameter
    } else {
        0.0
    };
    result.pocket_type = classify(result.depth, result.opening_diameter, result.is_through_hole);
    result.is_deep = result.aspect_ratio > DEEP_ASPECT;
    result.is_narrow = result.opening_diameter < NARROW_OPENING;
    result.accessibility_score =
        accessibility_score(result.depth, result.opening_diameter);
    result.volume = estimate_volume(model, faces);
    result
}

/// Faces whose external-adjacency share approaches the maximum form the
/// opening.
fn find_opening_faces(aag: &Aag, faces: &BTreeSet<usize>) -> BTreeSet<usize> {
    let ratios: BTreeMap<usize, f64> = faces
        .iter()
        .filter_map(|&f| {
            let neighbors = aag.neighbors(f);
            if neighbors.is_empty() {
                return None;
            }
            let external = neighbors.iter().filter(|n| !faces.contains(n)).count();
            Some((f, external as f64 / neighbors.len() as f64))
        })
        .collect();

    let max_ratio = ratios.values().fold(0.0f64, |a, &b| a.max(b));
    if max_ratio <= 0.0 {
        return BTreeSet::new();
    }
    let threshold = max_ratio * OPENING_RATIO_FRACTION;
    ratios
        .into_iter()
        .filter(|&(_, r)| r >= threshold)
        .map(|(f, _)| f)
        .collect()
}

/// Mean centroid and mean normal of the opening faces; +Z when the
/// normals cancel out.
fn opening_plane(model: &dyn SolidModel, opening: &BTreeSet<usize>) -> Plane {
    let n = opening.len() as f64;
    let mut centroid = Vec3::ZERO;
    let mut normal_sum = Vec3::ZERO;
    for &f in opening {
        centroid = centroid + model.face_centroid(f).to_vec3();
        normal_sum = normal_sum + midpoint_normal(model, f).unwrap_or(Vec3::ZERO);
    }
    let centroid = Point3d::new(centroid.x / n, centroid.y / n, centroid.z / n);
    let normal = (normal_sum / n).normalized().unwrap_or(Vec3::Z);
    Plane::new(centroid, normal)
}

/// Mean of the two largest extents of the opening faces' combined box.
fn opening_diameter(model: &dyn SolidModel, opening: &BTreeSet<usize>) -> f64 {
    let mut bbox = BoundingBox::empty();
    for &f in opening {
        bbox.merge(&model.face_bounding_box(f));
    }
    if bbox.is_empty() {
        return 0.0;
    }
    let mut e = bbox.extents();
    e.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    (e[1] + e[2]) / 2.0
}

/// The cavity box spanning most of the part box on any axis means the
/// cavity pierces through.
fn is_through_hole(model: &dyn SolidModel, faces: &BTreeSet<usize>) -> bool {
    let mut cavity = BoundingBox::empty();
    for &f in faces {
        cavity.merge(&model.face_bounding_box(f));
    }
    let part = model.bounding_box();
    let ce = cavity.extents();
    let pe = part.extents();
    (0..3).any(|i| pe[i] > 1e-9 && ce[i] / pe[i] > THROUGH_SPAN)
}

fn classify(depth: f64, opening_diameter: f64, through: bool) -> PocketType {
    if through {
        return PocketType::ThroughHole;
    }
    let aspect = if opening_diameter > 0.1 {
        depth / opening_diameter
    } else {
        0.0
    };
    if aspect < 0.5 {
        PocketType::ShallowRecess
    } else if aspect < 2.0 {
        PocketType::BlindPocket
    } else {
        PocketType::DeepCavity
    }
}

/// 1.0 means easy to machine (wide and shallow), 0.0 hopeless.
fn accessibility_score(depth: f64, opening_diameter: f64) -> f64 {
    let aspect = if opening_diameter > 0.1 {
        depth / opening_diameter
    } else {
        10.0
    };
    let aspect_score = 1.0 / (1.0 + aspect / 2.0);
    let opening_score = (opening_diameter / 10.0).min(1.0);
    (aspect_score + opening_score) / 2.0
}

/// Face area times the smallest box extent, halved for the non-prismatic
/// shape; an estimate only.
fn estimate_volume(model: &dyn SolidModel, faces: &BTreeSet<usize>) -> f64 {
    let total_area: f64 = faces.iter().map(|&f| model.face_area(f)).sum();
    let mut bbox = BoundingBox::empty();
    for &f in faces {
        bbox.merge(&model.face_bounding_box(f));
    }
    let e = bbox.extents();
    let depth = e[0].min(e[1]).min(e[2]);
    total_area * depth * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;
    use camber_kernel::primitives::{block_with_pockets, plate_with_hole};

    /// 20x20x10 pocket in a 50 cube: walls form the opening, the floor
    /// sits 10 deep.
    fn pocket_faces(shape: &camber_kernel::Shape) -> BTreeSet<usize> {
        // Builder order: the last five faces are the pocket walls + floor.
        let n = shape.face_count();
        (n - 5..n).collect()
    }

    #[test]
    fn test_blind_pocket_metrics() {
        let shape = block_with_pockets(50.0, 50.0, 50.0, &[(15.0, 15.0, 35.0, 35.0, 10.0)]);
        let aag = Aag::build(&shape);
        let faces = pocket_faces(&shape);
        let result = analyze_single_pocket(&shape, &aag, &faces);

        // The four walls touch the top face; the floor has no external
        // neighbors.
        assert_eq!(result.opening_faces.len(), 4);
        // The opening plane passes through the wall centroids at
        // mid-depth, so the floor centroid sits half the pocket depth
        // below it.
        assert!((result.depth - 5.0).abs() < 0.5, "depth {}", result.depth);
        assert!((result.opening_diameter - 20.0).abs() < 1.0);
        assert!(!result.is_through_hole);
        assert!(matches!(
            result.pocket_type,
            PocketType::ShallowRecess | PocketType::BlindPocket
        ));
        assert!(!result.is_deep);
        assert!(!result.is_narrow);
        assert!(result.accessibility_score > 0.0 && result.accessibility_score <= 1.0);
    }

    #[test]
    fn test_through_hole_classification() {
        let shape = plate_with_hole(50.0, 50.0, 10.0, 5.0, 25.0, 25.0);
        let aag = Aag::build(&shape);
        // The hole wall spans the full plate thickness.
        let faces: BTreeSet<usize> = (0..shape.face_count())
            .filter(|&f| shape.surface_kind(f) == camber_kernel::SurfaceKind::Cylinder)
            .collect();
        let result = analyze_single_pocket(&shape, &aag, &faces);
        assert!(result.is_through_hole);
        assert_eq!(result.pocket_type, PocketType::ThroughHole);
    }

    #[test]
    fn test_span_rule_for_through_holes() {
        // A pocket reaching only 20% through the block is not a through
        // hole.
        let shape = block_with_pockets(50.0, 50.0, 50.0, &[(15.0, 15.0, 35.0, 35.0, 10.0)]);
        let aag = Aag::build(&shape);
        let result = analyze_single_pocket(&shape, &aag, &pocket_faces(&shape));
        assert!(!result.is_through_hole);

        // One reaching 90% through qualifies.
        let deep = block_with_pockets(50.0, 50.0, 50.0, &[(15.0, 15.0, 35.0, 35.0, 45.0)]);
        let aag_deep = Aag::build(&deep);
        let result_deep = analyze_single_pocket(&deep, &aag_deep, &pocket_faces(&deep));
        assert!(result_deep.is_through_hole);
    }
}
