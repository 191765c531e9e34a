//! Graph-aware thin-wall recognition (the canonical variant).
//!
//! Planar regions grow across non-smooth edges; smooth edges (|dihedral|
//! near 180) represent the thin gap between the two sides of a wall and
//! are never crossed. Thickness is sampled by casting rays from face
//! centroids along the region's dominant normal, restricted to faces
//! whose own normal is parallel or anti-parallel to it.

use std::collections::{BTreeSet, VecDeque};

use tracing::debug;

use camber_aag::Aag;
use camber_kernel::{SolidModel, Vec3};
use camber_ray::RayScene;

use crate::{Feature, FeatureIds};

const SMOOTH_EDGE_DEG: f64 = 177.0;
/// Minimum total region area and seed face area.
const MIN_REGION_AREA: f64 = 50.0;
/// Faces this parallel (or anti-parallel) to the dominant normal
/// participate in thickness sampling.
const PARALLEL_NORMAL_DOT: f64 = 0.80;
/// Coefficient-of-variation cap for region thickness.
const CV_LIMIT: f64 = 0.60;
/// Ray hits closer than this are the face itself.
const SELF_HIT_MIN: f64 = 0.1;

#[derive(Debug, Default)]
struct Region {
    faces: BTreeSet<usize>,
    dominant_normal: Vec3,
}

#[derive(Debug, Default)]
struct Measurement {
    avg: f64,
    min: f64,
    max: f64,
    variance: f64,
}

pub fn recognize_thin_walls(
    model: &dyn SolidModel,
    aag: &Aag,
    scene: &RayScene,
    threshold: f64,
    ids: &mut FeatureIds,
) -> Vec<Feature> {
    let mut walls = Vec::new();
    let seeds = find_seed_faces(aag);
    debug!(seeds = seeds.len(), threshold, "thin wall seeds");

    let mut global_traversed: BTreeSet<usize> = BTreeSet::new();
    for seed in seeds {
        if global_traversed.contains(&seed) {
            continue;
        }
        let region = grow_region(aag, seed, &mut global_traversed);
        if region.faces.len() < 2 {
            continue;
        }
        let Some(m) = measure_region(model, aag, scene, &region, threshold) else {
            continue;
        };
        if !validate(aag, &region, &m, threshold) {
            continue;
        }
        walls.push(make_feature(aag, &region, &m, ids));
    }
    walls
}

/// Planar faces with enough area whose adjacencies look like a sheet:
/// either a noticeable share of smooth edges, or not cavity-like.
fn find_seed_faces(aag: &Aag) -> Vec<usize> {
    let mut seeds = Vec::new();
    for face in 0..aag.face_count() {
        let attrs = aag.attributes(face);
        if !attrs.is_planar() || attrs.area < MIN_REGION_AREA {
            continue;
        }
        let neighbors = aag.neighbors(face);
        if neighbors.is_empty() {
            continue;
        }
        let mut smooth = 0usize;
        let mut concave = 0usize;
        for &n in neighbors {
            let d = aag.dihedral_angle(face, n);
            if d.abs() > SMOOTH_EDGE_DEG {
                smooth += 1;
            } else if d >= 0.0 {
                concave += 1;
            }
        }
        let smooth_ratio = smooth as f64 / neighbors.len() as f64;
        let concave_ratio = concave as f64 / neighbors.len() as f64;
        if smooth_ratio >= 0.25 || concave_ratio < 0.70 {
            seeds.push(face);
        }
    }
    seeds
}

fn grow_region(aag: &Aag, seed: usize, traversed: &mut BTreeSet<usize>) -> Region {
    let mut region = Region::default();
    let mut queue = VecDeque::new();
    queue.push_back(seed);
    traversed.insert(seed);
    region.faces.insert(seed);

    while let Some(current) = queue.pop_front() {
        for &neighbor in aag.neighbors(current) {
            if traversed.contains(&neighbor) {
                continue;
            }
            let attrs = aag.attributes(neighbor);
            if !attrs.is_planar() || attrs.area < MIN_REGION_AREA * 0.5 {
                continue;
            }
            // Smooth edges are the wall gap itself.
            if aag.dihedral_angle(current, neighbor).abs() >= SMOOTH_EDGE_DEG {
                continue;
            }
            traversed.insert(neighbor);
            region.faces.insert(neighbor);
            queue.push_back(neighbor);
        }
    }

    region.dominant_normal = dominant_normal(aag, &region.faces);
    region
}

/// Arithmetic mean of the face normals. A wall's two sides cancel the
/// mean out; degenerate means fall back to the largest face's normal.
fn dominant_normal(aag: &Aag, faces: &BTreeSet<usize>) -> Vec3 {
    let mut sum = Vec3::ZERO;
    for &f in faces {
        sum = sum + aag.attributes(f).normal;
    }
    let mean = sum / faces.len().max(1) as f64;
    if let Some(n) = mean.normalized() {
        return n;
    }
    faces
        .iter()
        .max_by(|a, b| {
            aag.attributes(**a)
                .area
                .partial_cmp(&aag.attributes(**b).area)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|&f| aag.attributes(f).normal)
        .unwrap_or(Vec3::ZERO)
}

fn measure_region(
    model: &dyn SolidModel,
    aag: &Aag,
    scene: &RayScene,
    region: &Region,
    threshold: f64,
) -> Option<Measurement> {
    let dir = region.dominant_normal.normalized()?;
    let t_max = threshold * 10.0;

    let mut samples = Vec::new();
    for &face in &region.faces {
        let attrs = aag.attributes(face);
        if attrs.normal.dot(&dir).abs() < PARALLEL_NORMAL_DOT {
            continue;
        }
        let centroid = model.face_centroid(face);
        let forward = scene
            .cast_ray_min(&centroid, &dir, t_max, SELF_HIT_MIN)
            .map(|h| h.distance);
        let backward = scene
            .cast_ray_min(&centroid, &(-dir), t_max, SELF_HIT_MIN)
            .map(|h| h.distance);
        let thickness = match (forward, backward) {
            (Some(a), Some(b)) => a.min(b),
            (Some(a), None) => a,
            (None, Some(b)) => b,
            (None, None) => continue,
        };
        if thickness > 0.01 && thickness < threshold * 2.0 {
            samples.push(thickness);
        }
    }
    if samples.is_empty() {
        return None;
    }

    let n = samples.len() as f64;
    let sum: f64 = samples.iter().sum();
    let sum_sq: f64 = samples.iter().map(|t| t * t).sum();
    let avg = sum / n;
    Some(Measurement {
        avg,
        min: samples.iter().fold(f64::MAX, |a, &b| a.min(b)),
        max: samples.iter().fold(0.0, |a: f64, &b| a.max(b)),
        variance: (sum_sq / n - avg * avg).max(0.0),
    })
}

fn validate(aag: &Aag, region: &Region, m: &Measurement, threshold: f64) -> bool {
    if m.avg <= 0.0 || m.avg > threshold {
        return false;
    }
    if m.avg > 0.0 && m.variance.sqrt() / m.avg > CV_LIMIT {
        return false;
    }
    let total_area: f64 = region.faces.iter().map(|&f| aag.attributes(f).area).sum();
    total_area >= MIN_REGION_AREA
}

fn make_feature(aag: &Aag, region: &Region, m: &Measurement, ids: &mut FeatureIds) -> Feature {
    let total_area: f64 = region.faces.iter().map(|&f| aag.attributes(f).area).sum();
    let subtype = if region.faces.len() >= 4 {
        "sheet"
    } else if region.faces.len() == 2 {
        "web"
    } else {
        "wall"
    };
    let mut feature = Feature {
        id: ids.next("thin_wall"),
        feature_type: "thin_wall".into(),
        subtype: subtype.into(),
        faces: region.faces.iter().copied().collect(),
        edges: Vec::new(),
        params: Default::default(),
        source: "thin_wall_recognizer_v2".into(),
        confidence: 0.85,
    };
    feature.params.insert("avg_thickness".into(), m.avg);
    feature.params.insert("min_thickness".into(), m.min);
    feature.params.insert("max_thickness".into(), m.max);
    feature.params.insert("variance".into(), m.variance);
    feature.params.insert("total_area".into(), total_area);
    feature
}
