//! Cavity (pocket) recognition.
//!
//! Seeds are faces dominated by concave adjacencies; regions grow across
//! smooth and concave edges only, so convex edges bound each cavity.
//! Validation rejects degenerate, oversized, or weakly bounded regions.

use std::collections::{BTreeSet, VecDeque};

use tracing::debug;

use camber_aag::Aag;

use crate::{Feature, FeatureIds};

/// Dihedral magnitude below this is treated as neither convex nor concave.
const ANGLE_THRESHOLD_DEG: f64 = 5.0;
const SMOOTH_DEG: f64 = 177.0;
/// Seeds need at least this fraction of concave adjacencies.
const SEED_CONCAVE_RATIO: f64 = 0.6;
/// A cavity must stay below this fraction of the face count.
const MAX_FACE_FRACTION: f64 = 0.25;

pub fn recognize_cavities(aag: &Aag, max_volume: f64, ids: &mut FeatureIds) -> Vec<Feature> {
    let mut cavities = Vec::new();
    let seeds = find_seed_faces(aag);
    debug!(seeds = seeds.len(), "cavity seeds");

    let mut global_traversed: BTreeSet<usize> = BTreeSet::new();
    for seed in seeds {
        if global_traversed.contains(&seed) {
            continue;
        }
        let faces = propagate(aag, seed, &mut global_traversed);
        if validate_cavity(aag, &faces, max_volume) {
            cavities.push(make_cavity(aag, &faces, ids));
        }
    }
    cavities
}

fn is_concave(dihedral: f64) -> bool {
    dihedral > ANGLE_THRESHOLD_DEG && dihedral.abs() < SMOOTH_DEG
}

fn is_convex(dihedral: f64) -> bool {
    dihedral < -ANGLE_THRESHOLD_DEG && dihedral.abs() < SMOOTH_DEG
}

fn find_seed_faces(aag: &Aag) -> Vec<usize> {
    let mut seeds = Vec::new();
    for face in 0..aag.face_count() {
        let neighbors = aag.neighbors(face);
        if neighbors.is_empty() {
            continue;
        }
        let concave = neighbors
            .iter()
            .filter(|&&n| is_concave(aag.dihedral_angle(face, n)))
            .count();
        let ratio = concave as f64 / neighbors.len() as f64;
        if ratio >= SEED_CONCAVE_RATIO && concave >= 2 {
            seeds.push(face);
        }
    }
    seeds
}

/// BFS across smooth or concave edges; convex edges are cavity boundaries.
fn propagate(aag: &Aag, seed: usize, traversed: &mut BTreeSet<usize>) -> BTreeSet<usize> {
    let mut faces = BTreeSet::new();
    let mut queue = VecDeque::new();
    queue.push_back(seed);
    traversed.insert(seed);

    while let Some(current) = queue.pop_front() {
        faces.insert(current);
        for &neighbor in aag.neighbors(current) {
            if traversed.contains(&neighbor) {
                continue;
            }
            let d = aag.dihedral_angle(current, neighbor);
            if d.abs() > SMOOTH_DEG || is_concave(d) {
                traversed.insert(neighbor);
                queue.push_back(neighbor);
            }
        }
    }
    faces
}

fn validate_cavity(aag: &Aag, faces: &BTreeSet<usize>, max_volume: f64) -> bool {
    if faces.len() < 3 {
        return false;
    }
    if (faces.len() as f64) >= aag.face_count() as f64 * MAX_FACE_FRACTION {
        return false;
    }

    // Fraction of cavity faces with a convex edge out of the set.
    let boundary_faces = faces
        .iter()
        .filter(|&&face| {
            aag.neighbors(face).iter().any(|&n| {
                !faces.contains(&n) && is_convex(aag.dihedral_angle(face, n))
            })
        })
        .count();
    let boundary_ratio = boundary_faces as f64 / faces.len() as f64;
    let required = if faces.len() > 15 { 0.25 } else { 0.20 };
    if boundary_ratio < required {
        return false;
    }

    estimate_volume(aag, faces) <= max_volume
}

/// Area-based volume heuristic; an estimate, never a measurement.
fn estimate_volume(aag: &Aag, faces: &BTreeSet<usize>) -> f64 {
    let total_area: f64 = faces.iter().map(|&f| aag.attributes(f).area).sum();
    total_area * total_area.sqrt() * 0.1
}

fn make_cavity(aag: &Aag, faces: &BTreeSet<usize>, ids: &mut FeatureIds) -> Feature {
    let total_area: f64 = faces.iter().map(|&f| aag.attributes(f).area).sum();
    let mut feature = Feature {
        id: ids.next("cavity"),
        feature_type: "cavity".into(),
        subtype: "pocket".into(),
        faces: faces.iter().copied().collect(),
        edges: Vec::new(),
        params: Default::default(),
        source: "cavity_recognizer".into(),
        confidence: 0.70,
    };
    feature.params.insert("face_count".into(), faces.len() as f64);
    feature.params.insert("total_area_mm2".into(), total_area);
    feature
        .params
        .insert("estimated_volume_mm3".into(), estimate_volume(aag, faces));
    feature
}
