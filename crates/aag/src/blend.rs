//! Blend-chain classification.
//!
//! Four passes over the graph: collect cylindrical/toroidal candidates,
//! type their edges (smooth / spring / cross / term), determine vexity,
//! then grow chains across smooth edges.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::Serialize;
use tracing::debug;

use camber_kernel::{SolidModel, Surface};

use crate::Aag;

/// Tangency tolerance for smooth edges: |dot| above cos(5 deg).
const TANGENT_DOT: f64 = 0.996194698;
/// Unsigned face-normal angle window for spring edges, degrees.
const SPRING_MIN_DEG: f64 = 30.0;
const SPRING_MAX_DEG: f64 = 150.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Vexity {
    Concave,
    Convex,
    Uncertain,
}

impl Vexity {
    pub fn label(&self) -> &'static str {
        match self {
            Vexity::Concave => "concave",
            Vexity::Convex => "convex",
            Vexity::Uncertain => "uncertain",
        }
    }
}

/// A cylindrical or toroidal face considered part of a blend.
#[derive(Debug, Clone, Serialize)]
pub struct BlendCandidate {
    pub face_id: usize,
    /// Cylinder radius or torus minor radius.
    pub radius: f64,
    pub vexity: Vexity,
    pub smooth_edges: BTreeSet<usize>,
    pub spring_edges: BTreeSet<usize>,
    pub cross_edges: BTreeSet<usize>,
    pub term_edges: BTreeSet<usize>,
    /// Chain id, -1 before chain assignment.
    pub chain_id: i32,
}

/// A maximal set of candidates connected through smooth edges.
#[derive(Debug, Clone, Serialize)]
pub struct BlendChain {
    pub chain_id: i32,
    pub face_ids: Vec<usize>,
    pub vexity: Vexity,
    pub min_radius: f64,
    pub max_radius: f64,
}

enum EdgeSlot {
    Smooth,
    Spring,
    Cross,
    Term,
}

/// Classifier output: candidates keyed by face id, plus the chains.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BlendAnalysis {
    pub candidates: BTreeMap<usize, BlendCandidate>,
    pub chains: Vec<BlendChain>,
}

impl BlendAnalysis {
    pub fn is_candidate(&self, face: usize) -> bool {
        self.candidates.contains_key(&face)
    }
}

/// Run the four classification passes.
pub fn classify_blends(model: &dyn SolidModel, aag: &Aag) -> BlendAnalysis {
    let mut analysis = BlendAnalysis::default();

    // Pass 1: local candidates.
    for face in 0..aag.face_count() {
        let attrs = aag.attributes(face);
        let radius = if let Some(c) = &attrs.cylinder {
            c.radius
        } else if let Some(t) = &attrs.torus {
            t.minor_radius
        } else {
            continue;
        };
        analysis.candidates.insert(
            face,
            BlendCandidate {
                face_id: face,
                radius,
                vexity: Vexity::Uncertain,
                smooth_edges: BTreeSet::new(),
                spring_edges: BTreeSet::new(),
                cross_edges: BTreeSet::new(),
                term_edges: BTreeSet::new(),
                chain_id: -1,
            },
        );
    }

    // Pass 2: edge typing.
    let face_ids: Vec<usize> = analysis.candidates.keys().copied().collect();
    for &face in &face_ids {
        for oe in model.face_edges(face) {
            let incident = model.edge_faces(oe.edge);
            let edge_type = if incident.len() != 2 {
                Some(EdgeSlot::Term)
            } else {
                let other = if incident[0] == face { incident[1] } else { incident[0] };
                if other == face {
                    None
                } else {
                    let other_is_candidate = analysis.candidates.contains_key(&other);
                    let n1 = aag.attributes(face).normal;
                    let n2 = aag.attributes(other).normal;
                    if other_is_candidate {
                        (n1.dot(&n2).abs() > TANGENT_DOT).then_some(EdgeSlot::Smooth)
                    } else {
                        let angle = n1.dot(&n2).clamp(-1.0, 1.0).acos().to_degrees();
                        if angle > SPRING_MIN_DEG && angle < SPRING_MAX_DEG {
                            Some(EdgeSlot::Spring)
                        } else {
                            Some(EdgeSlot::Cross)
                        }
                    }
                }
            };
            if let (Some(slot), Some(cand)) = (edge_type, analysis.candidates.get_mut(&face)) {
                match slot {
                    EdgeSlot::Smooth => cand.smooth_edges.insert(oe.edge),
                    EdgeSlot::Spring => cand.spring_edges.insert(oe.edge),
                    EdgeSlot::Cross => cand.cross_edges.insert(oe.edge),
                    EdgeSlot::Term => cand.term_edges.insert(oe.edge),
                };
            }
        }
    }

    // Pass 3: vexity.
    for &face in &face_ids {
        let vexity = test_vexity(model, face);
        if let Some(cand) = analysis.candidates.get_mut(&face) {
            cand.vexity = vexity;
        }
    }

    // Pass 4: chains across smooth edges, in ascending face-id order.
    let mut next_chain = 0i32;
    for &seed in &face_ids {
        if analysis.candidates[&seed].chain_id != -1 {
            continue;
        }
        let chain = grow_chain(model, &mut analysis, seed, next_chain);
        analysis.chains.push(chain);
        next_chain += 1;
    }

    debug!(
        candidates = analysis.candidates.len(),
        chains = analysis.chains.len(),
        "classified blends"
    );
    analysis
}

/// Concavity probe: step off the surface along the corrected normal and
/// compare axis distances. Internal surfaces (the probe moves toward the
/// axis) are concave. Toroidal faces use the face orientation directly.
fn test_vexity(model: &dyn SolidModel, face: usize) -> Vexity {
    match model.surface(face) {
        Some(Surface::Cylinder(cyl)) => {
            let ((u0, u1), (v0, v1)) = model.uv_domain(face);
            let Some(sample) = model.evaluate(face, (u0 + u1) * 0.5, (v0 + v1) * 0.5) else {
                return Vexity::Uncertain;
            };
            let Some(n) = sample.normal.normalized() else {
                return Vexity::Uncertain;
            };
            let n = if model.is_reversed(face) { -n } else { n };
            let probe = sample.point + n * (2.0 * cyl.radius * 0.05);
            if cyl.axis_distance(&probe) < cyl.axis_distance(&sample.point) {
                Vexity::Concave
            } else {
                Vexity::Convex
            }
        }
        Some(Surface::Torus(_)) => {
            if model.is_reversed(face) {
                Vexity::Concave
            } else {
                Vexity::Convex
            }
        }
        _ => Vexity::Uncertain,
    }
}

fn grow_chain(
    model: &dyn SolidModel,
    analysis: &mut BlendAnalysis,
    seed: usize,
    chain_id: i32,
) -> BlendChain {
    let mut chain = BlendChain {
        chain_id,
        face_ids: Vec::new(),
        vexity: Vexity::Uncertain,
        min_radius: f64::MAX,
        max_radius: 0.0,
    };

    let mut queue = VecDeque::new();
    let mut visited = BTreeSet::new();
    queue.push_back(seed);
    visited.insert(seed);

    while let Some(current) = queue.pop_front() {
        let Some(cand) = analysis.candidates.get_mut(&current) else {
            continue;
        };
        cand.chain_id = chain_id;
        let (radius, vexity, smooth): (f64, Vexity, Vec<usize>) = (
            cand.radius,
            cand.vexity,
            cand.smooth_edges.iter().copied().collect(),
        );
        chain.face_ids.push(current);
        chain.min_radius = chain.min_radius.min(radius);
        chain.max_radius = chain.max_radius.max(radius);
        if chain.vexity == Vexity::Uncertain && vexity != Vexity::Uncertain {
            chain.vexity = vexity;
        }

        for edge in smooth {
            for adj in model.edge_faces(edge) {
                if adj == current || visited.contains(&adj) {
                    continue;
                }
                if analysis.candidates.contains_key(&adj) {
                    visited.insert(adj);
                    queue.push_back(adj);
                }
            }
        }
    }

    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use camber_kernel::primitives::{plate_with_filleted_hole, plate_with_hole};

    #[test]
    fn test_hole_wall_is_concave_candidate() {
        let shape = plate_with_hole(50.0, 50.0, 10.0, 5.0, 25.0, 25.0);
        let aag = Aag::build(&shape);
        let analysis = classify_blends(&shape, &aag);
        assert_eq!(analysis.candidates.len(), 1);
        let cand = analysis.candidates.values().next().unwrap();
        assert_eq!(cand.vexity, Vexity::Concave);
        assert!((cand.radius - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_filleted_hole_candidates_and_chains() {
        let shape = plate_with_filleted_hole(50.0, 50.0, 10.0, 5.0, 1.0, 25.0, 25.0);
        let aag = Aag::build(&shape);
        let analysis = classify_blends(&shape, &aag);
        assert_eq!(analysis.candidates.len(), 2);

        let torus_id = aag.toroidal_faces()[0];
        let torus = &analysis.candidates[&torus_id];
        assert_eq!(torus.vexity, Vexity::Convex);
        assert!((torus.radius - 1.0).abs() < 1e-9);
        // The ring meets the plate top at 45 degrees at its center: a
        // spring edge.
        assert!(!torus.spring_edges.is_empty());

        let cyl_id = aag.cylindrical_faces()[0];
        let cyl = &analysis.candidates[&cyl_id];
        assert_eq!(cyl.vexity, Vexity::Concave);

        // Chain ids assigned to every candidate.
        for cand in analysis.candidates.values() {
            assert!(cand.chain_id >= 0);
        }
        assert_eq!(analysis.chains.len(), 2);
        for chain in &analysis.chains {
            assert!(chain.min_radius <= chain.max_radius);
        }
    }

    #[test]
    fn test_spring_edge_on_plain_hole() {
        let shape = plate_with_hole(50.0, 50.0, 10.0, 5.0, 25.0, 25.0);
        let aag = Aag::build(&shape);
        let analysis = classify_blends(&shape, &aag);
        let cand = analysis.candidates.values().next().unwrap();
        // Wall centre normal vs top/bottom plane normals sit at 90 deg:
        // spring edges on the rims.
        assert!(!cand.spring_edges.is_empty());
        assert!(cand.smooth_edges.is_empty());
        // The seam is single-incident: a terminating edge.
        assert_eq!(cand.term_edges.len(), 1);
    }
}
