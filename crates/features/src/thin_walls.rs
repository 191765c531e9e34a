//! Pair-based thin-wall recognition (first variant).
//!
//! Kept alongside the graph-aware variant: it pairs opposing faces by
//! normal anti-parallelism and bounding-box distance, samples thickness
//! on a parametric grid, and classifies by a planar/cylindrical/aspect
//! decision tree. The coordinator runs the graph-aware variant; this one
//! remains available for direct use.

use std::collections::BTreeSet;

use tracing::debug;

use camber_aag::Aag;
use camber_kernel::{BoundingBox, SolidModel};
use camber_ray::RayScene;

use crate::{Feature, FeatureIds};

const ANTIPARALLEL_DOT: f64 = -0.80;
const CV_LIMIT: f64 = 0.35;
const OVERLAP_MIN: f64 = 0.20;
const MIN_FACE_AREA: f64 = 10.0;
/// Parametric sampling grid resolution.
const GRID: usize = 5;
/// Axis parallelism tolerance, radians (about one degree).
const AXIS_TOL: f64 = 0.017;

#[derive(Debug, Clone, Copy)]
struct FacePair {
    face1: usize,
    face2: usize,
}

#[derive(Debug, Default)]
struct Measurement {
    avg: f64,
    min: f64,
    max: f64,
    variance: f64,
    overlap_ratio: f64,
}

pub fn recognize_thin_walls_v1(
    model: &dyn SolidModel,
    aag: &Aag,
    scene: &RayScene,
    threshold: f64,
    ids: &mut FeatureIds,
) -> Vec<Feature> {
    let mut walls = Vec::new();
    let pairs = find_opposing_pairs(model, aag, threshold * 10.0);
    debug!(pairs = pairs.len(), "opposing face pairs");

    let mut processed: BTreeSet<usize> = BTreeSet::new();
    for pair in pairs {
        if processed.contains(&pair.face1) || processed.contains(&pair.face2) {
            continue;
        }
        let m = measure_pair(model, aag, scene, &pair, threshold);
        if !validate(&m, threshold) {
            continue;
        }
        let faces = vec![pair.face1, pair.face2];
        let subtype = classify_subtype(model, aag, &faces, threshold);
        processed.insert(pair.face1);
        processed.insert(pair.face2);
        walls.push(make_feature(aag, &faces, &m, subtype, ids));
    }
    walls
}

fn find_opposing_pairs(model: &dyn SolidModel, aag: &Aag, max_distance: f64) -> Vec<FacePair> {
    let count = aag.face_count();
    let boxes: Vec<BoundingBox> = (0..count).map(|f| model.face_bounding_box(f)).collect();

    let mut pairs = Vec::new();
    for i in 0..count {
        if aag.attributes(i).area < MIN_FACE_AREA {
            continue;
        }
        for j in (i + 1)..count {
            if aag.attributes(j).area < MIN_FACE_AREA {
                continue;
            }
            if boxes[i].distance_to(&boxes[j]) > max_distance {
                continue;
            }
            let dot = aag.attributes(i).normal.dot(&aag.attributes(j).normal);
            if dot <= ANTIPARALLEL_DOT {
                pairs.push(FacePair { face1: i, face2: j });
            }
        }
    }
    pairs
}

fn measure_pair(
    model: &dyn SolidModel,
    aag: &Aag,
    scene: &RayScene,
    pair: &FacePair,
    threshold: f64,
) -> Measurement {
    // Concentric cylinders measure by radial difference.
    if let (Some(c1), Some(c2)) = (
        aag.attributes(pair.face1).cylinder,
        aag.attributes(pair.face2).cylinder,
    ) {
        if c1.axis_dir.angle_to(&c2.axis_dir).min(
            std::f64::consts::PI - c1.axis_dir.angle_to(&c2.axis_dir),
        ) < AXIS_TOL
        {
            let radial = (c1.radius - c2.radius).abs();
            return Measurement {
                avg: radial,
                min: radial,
                max: radial,
                variance: 0.0,
                overlap_ratio: 1.0,
            };
        }
    }

    let ((u0, u1), (v0, v1)) = model.uv_domain(pair.face1);
    let reversed = model.is_reversed(pair.face1);

    let mut samples = Vec::new();
    for i in 0..GRID {
        for j in 0..GRID {
            let u = u0 + (u1 - u0) * i as f64 / (GRID - 1) as f64;
            let v = v0 + (v1 - v0) * j as f64 / (GRID - 1) as f64;
            let Some(sample) = model.evaluate(pair.face1, u, v) else {
                continue;
            };
            let Some(n) = sample.normal.normalized() else {
                continue;
            };
            // Measure into the material: against the outward normal.
            let n = if reversed { n } else { -n };
            if let Some(hit) = scene.cast_ray(&sample.point, &n, threshold * 2.0) {
                if hit.distance > 0.01 && hit.distance < threshold * 2.0 {
                    samples.push(hit.distance);
                }
            }
        }
    }

    if samples.is_empty() {
        return Measurement::default();
    }
    let n = samples.len() as f64;
    let sum: f64 = samples.iter().sum();
    let sum_sq: f64 = samples.iter().map(|t| t * t).sum();
    let avg = sum / n;
    Measurement {
        avg,
        min: samples.iter().fold(f64::MAX, |a, &b| a.min(b)),
        max: samples.iter().fold(0.0, |a: f64, &b| a.max(b)),
        variance: (sum_sq / n - avg * avg).max(0.0),
        overlap_ratio: n / (GRID * GRID) as f64,
    }
}

fn validate(m: &Measurement, threshold: f64) -> bool {
    if m.avg <= 0.0 || m.avg > threshold {
        return false;
    }
    if m.variance.sqrt() / m.avg > CV_LIMIT {
        return false;
    }
    m.overlap_ratio >= OVERLAP_MIN
}

/// Decision tree: concentric, sheet, web, shell; sheet is the default.
fn classify_subtype(
    model: &dyn SolidModel,
    aag: &Aag,
    faces: &[usize],
    threshold: f64,
) -> &'static str {
    let mut total_area = 0.0;
    let mut planar_area = 0.0;
    let mut cylindrical_area = 0.0;
    let mut cylinders = Vec::new();
    let mut bbox = BoundingBox::empty();

    for &f in faces {
        let attrs = aag.attributes(f);
        total_area += attrs.area;
        if attrs.is_planar() {
            planar_area += attrs.area;
        }
        if let Some(c) = attrs.cylinder {
            cylindrical_area += attrs.area;
            cylinders.push(c);
        }
        bbox.merge(&model.face_bounding_box(f));
    }

    if cylinders.len() >= 2 {
        for i in 0..cylinders.len() {
            for j in (i + 1)..cylinders.len() {
                if crate::holes::axes_coincident(&cylinders[i], &cylinders[j])
                    && (cylinders[i].radius - cylinders[j].radius).abs() < threshold * 2.0
                {
                    return "concentric";
                }
            }
        }
    }

    let e = bbox.extents();
    let length = e[0].max(e[1]).max(e[2]);
    let width = e[0].min(e[1]).min(e[2]);
    let aspect = if width > 0.01 { length / width } else { 1.0 };
    let planar_ratio = if total_area > 0.0 { planar_area / total_area } else { 0.0 };
    let curved_ratio = if total_area > 0.0 { cylindrical_area / total_area } else { 0.0 };

    if planar_ratio > 0.80 && total_area > 500.0 && aspect < 5.0 {
        return "sheet";
    }
    if planar_ratio > 0.60 && aspect > 5.0 {
        return "web";
    }
    if curved_ratio > 0.50 || !cylinders.is_empty() {
        return "shell";
    }
    "sheet"
}

fn make_feature(
    aag: &Aag,
    faces: &[usize],
    m: &Measurement,
    subtype: &str,
    ids: &mut FeatureIds,
) -> Feature {
    let total_area: f64 = faces.iter().map(|&f| aag.attributes(f).area).sum();
    let mut feature = Feature {
        id: ids.next("thin_wall"),
        feature_type: "thin_wall".into(),
        subtype: subtype.into(),
        faces: faces.to_vec(),
        edges: Vec::new(),
        params: Default::default(),
        source: "thin_wall_recognizer".into(),
        confidence: 0.80,
    };
    feature.params.insert("avg_thickness".into(), m.avg);
    feature.params.insert("min_thickness".into(), m.min);
    feature.params.insert("max_thickness".into(), m.max);
    feature.params.insert("variance".into(), m.variance);
    feature.params.insert("overlap_ratio".into(), m.overlap_ratio);
    feature.params.insert("total_area".into(), total_area);
    feature
}
