//! Thickness analysis: per-face ray thickness and voxel-grid SDFs.

pub mod gradient;
pub mod sdf;

use std::collections::BTreeMap;

use tracing::{debug, info};

use camber_kernel::{midpoint_normal, SolidModel};
use camber_ray::RayScene;

pub use gradient::stress_concentration;
pub use sdf::{generate_adaptive_sdf, generate_sdf, Sdf};

/// Hits closer than this to the origin are the face itself.
pub const MIN_SELF_DISTANCE: f64 = 0.1;

/// Local thickness at one face.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct ThicknessResult {
    pub face_id: usize,
    /// Thickness in mm; -1 when no measurement succeeded.
    pub thickness: f64,
    pub has_measurement: bool,
}

impl ThicknessResult {
    fn new(face_id: usize, thickness: f64) -> Self {
        Self {
            face_id,
            thickness,
            has_measurement: thickness > 0.0,
        }
    }
}

/// Per-face thickness: cast rays both ways along the face normal from the
/// centroid and keep the nearest wall.
pub fn analyze_all_faces(
    model: &dyn SolidModel,
    scene: &RayScene,
    max_search_distance: f64,
) -> BTreeMap<usize, ThicknessResult> {
    let mut results = BTreeMap::new();
    let mut measured = 0usize;
    for face in 0..model.face_count() {
        let result = analyze_face(model, scene, face, max_search_distance);
        if result.has_measurement {
            measured += 1;
        }
        results.insert(face, result);
    }
    info!(
        faces = model.face_count(),
        measured,
        failed = model.face_count() - measured,
        "thickness analysis complete"
    );
    results
}

/// Thickness at a single face; -1 on failure.
pub fn analyze_face(
    model: &dyn SolidModel,
    scene: &RayScene,
    face: usize,
    max_search_distance: f64,
) -> ThicknessResult {
    let Some(normal) = midpoint_normal(model, face) else {
        return ThicknessResult::new(face, -1.0);
    };
    let centroid = model.face_centroid(face);

    let forward = scene
        .cast_ray_min(&centroid, &normal, max_search_distance, MIN_SELF_DISTANCE)
        .map(|h| h.distance);
    let backward = scene
        .cast_ray_min(&centroid, &(-normal), max_search_distance, MIN_SELF_DISTANCE)
        .map(|h| h.distance);

    let thickness = match (forward, backward) {
        (Some(a), Some(b)) => a.min(b),
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => -1.0,
    };
    ThicknessResult::new(face, thickness)
}

/// Distribution summary over the per-face results.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ThicknessStats {
    pub total: usize,
    pub measured: usize,
    pub failed: usize,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub median: f64,
    /// Counts for the bins 0-1, 1-2, 2-3, 3-5, 5-10, >10 mm.
    pub histogram: [usize; 6],
}

pub fn summarize(results: &BTreeMap<usize, ThicknessResult>) -> ThicknessStats {
    let mut values: Vec<f64> = results
        .values()
        .filter(|r| r.has_measurement)
        .map(|r| r.thickness)
        .collect();
    let mut stats = ThicknessStats {
        total: results.len(),
        measured: values.len(),
        failed: results.len() - values.len(),
        ..Default::default()
    };
    if values.is_empty() {
        return stats;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    stats.min = values[0];
    stats.max = values[values.len() - 1];
    stats.avg = values.iter().sum::<f64>() / values.len() as f64;
    stats.median = values[values.len() / 2];
    for &t in &values {
        let bin = match t {
            t if t < 1.0 => 0,
            t if t < 2.0 => 1,
            t if t < 3.0 => 2,
            t if t < 5.0 => 3,
            t if t < 10.0 => 4,
            _ => 5,
        };
        stats.histogram[bin] += 1;
    }
    debug!(
        min = stats.min,
        max = stats.max,
        avg = stats.avg,
        "thickness distribution"
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use camber_kernel::primitives::make_box;

    #[test]
    fn test_cube_thickness_is_edge_length() {
        let shape = make_box(100.0, 100.0, 100.0);
        let scene = RayScene::build(&shape.tessellate(0.1, 0.5)).unwrap();
        let results = analyze_all_faces(&shape, &scene, 200.0);
        assert_eq!(results.len(), 6);
        for r in results.values() {
            assert!(r.has_measurement);
            assert!((r.thickness - 100.0).abs() < 1e-6, "got {}", r.thickness);
        }
    }

    #[test]
    fn test_search_distance_limits_measurement() {
        let shape = make_box(100.0, 100.0, 100.0);
        let scene = RayScene::build(&shape.tessellate(0.1, 0.5)).unwrap();
        let results = analyze_all_faces(&shape, &scene, 50.0);
        for r in results.values() {
            assert!(!r.has_measurement);
            assert_eq!(r.thickness, -1.0);
        }
    }

    #[test]
    fn test_stats_summary() {
        let shape = make_box(100.0, 100.0, 2.0);
        let scene = RayScene::build(&shape.tessellate(0.1, 0.5)).unwrap();
        let results = analyze_all_faces(&shape, &scene, 300.0);
        let stats = summarize(&results);
        assert_eq!(stats.total, 6);
        assert_eq!(stats.measured, 6);
        // The two large faces measure the 2 mm gap.
        assert!((stats.min - 2.0).abs() < 1e-6);
    }
}
