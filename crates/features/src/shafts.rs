//! Shaft/boss recognition placeholder.
//!
//! External cylinders are the mirror image of holes (convex rims instead
//! of concave). Detection is not implemented yet; the pass reports its
//! candidate count and yields nothing so it never produces false
//! positives.

use tracing::debug;

use camber_aag::Aag;

use crate::{Feature, FeatureIds};

pub fn recognize_shafts(aag: &Aag, _ids: &mut FeatureIds) -> Vec<Feature> {
    let candidates = aag.cylindrical_faces();
    debug!(candidates = candidates.len(), "shaft candidates (detection stubbed)");
    Vec::new()
}
