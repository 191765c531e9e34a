//! Rule-based feature recognition.
//!
//! Recognizers consume a read-only AAG (plus the kernel shape and, for
//! thin walls, a ray scene) and append [`Feature`] records. The
//! coordinator runs them in a fixed order and threads the fillet face set
//! into the hole recognizer so a face classified as a fillet is never
//! also reported as a hole.

pub mod cavities;
pub mod chamfers;
pub mod fillets;
pub mod holes;
pub mod shafts;
pub mod thin_walls;
pub mod thin_walls_v2;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use camber_aag::Aag;
use camber_kernel::SolidModel;
use camber_ray::RayScene;

/// A recognized manufacturing feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// `<type>_NNNN`, unique per session.
    pub id: String,
    #[serde(rename = "type")]
    pub feature_type: String,
    pub subtype: String,
    /// Face ids, in recognizer-defined order.
    pub faces: Vec<usize>,
    pub edges: Vec<usize>,
    /// Numeric parameters; `BTreeMap` keeps key order canonical.
    pub params: BTreeMap<String, f64>,
    /// Recognizer that produced the feature.
    pub source: String,
    pub confidence: f64,
}

/// Session-scoped feature id allocator: a monotonically increasing counter
/// per feature type.
#[derive(Debug, Default)]
pub struct FeatureIds {
    counters: HashMap<String, u32>,
}

impl FeatureIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self, feature_type: &str) -> String {
        let counter = self.counters.entry(feature_type.to_string()).or_insert(0);
        let id = format!("{}_{:04}", feature_type, counter);
        *counter += 1;
        id
    }
}

/// Which recognizers run, plus their tuning knobs.
#[derive(Debug, Clone)]
pub struct RecognizerConfig {
    pub fillets: bool,
    pub chamfers: bool,
    pub thin_walls: bool,
    pub holes: bool,
    pub shafts: bool,
    pub cavities: bool,
    /// Maximum blend radius considered a fillet.
    pub fillet_max_radius: f64,
    /// Maximum chamfer width.
    pub chamfer_max_width: f64,
    /// Thin-wall thickness threshold.
    pub thin_wall_threshold: f64,
    /// Cavity estimated-volume cap.
    pub cavity_max_volume: f64,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            fillets: true,
            chamfers: true,
            thin_walls: true,
            holes: true,
            shafts: true,
            cavities: true,
            fillet_max_radius: 10.0,
            chamfer_max_width: 5.0,
            thin_wall_threshold: 5.0,
            cavity_max_volume: 1e9,
        }
    }
}

/// Run the enabled recognizers in the fixed order.
///
/// Fillets run first so their face ids can be excluded from hole
/// recognition; holes, shafts, and cavities follow. A recognizer failure
/// is logged and skipped; it never aborts the run.
pub fn recognize(
    model: &dyn SolidModel,
    aag: &Aag,
    scene: Option<&RayScene>,
    config: &RecognizerConfig,
) -> Vec<Feature> {
    let mut ids = FeatureIds::new();
    let mut features = Vec::new();
    let mut fillet_faces: BTreeSet<usize> = BTreeSet::new();

    if config.fillets {
        let found = fillets::recognize_fillets(model, aag, config.fillet_max_radius, &mut ids);
        for f in &found {
            fillet_faces.extend(f.faces.iter().copied());
        }
        info!(count = found.len(), "fillet recognizer done");
        features.extend(found);
    }

    if config.chamfers {
        let found = chamfers::recognize_chamfers(model, aag, config.chamfer_max_width, &mut ids);
        info!(count = found.len(), "chamfer recognizer done");
        features.extend(found);
    }

    if config.thin_walls {
        match scene {
            Some(scene) => {
                let found = thin_walls_v2::recognize_thin_walls(
                    model,
                    aag,
                    scene,
                    config.thin_wall_threshold,
                    &mut ids,
                );
                info!(count = found.len(), "thin wall recognizer done");
                features.extend(found);
            }
            None => warn!("thin wall recognizer needs a ray scene; skipped"),
        }
    }

    if config.holes {
        let found = holes::recognize_holes(model, aag, &fillet_faces, &mut ids);
        info!(count = found.len(), "hole recognizer done");
        features.extend(found);
    }

    if config.shafts {
        let found = shafts::recognize_shafts(aag, &mut ids);
        info!(count = found.len(), "shaft recognizer done");
        features.extend(found);
    }

    if config.cavities {
        let found = cavities::recognize_cavities(aag, config.cavity_max_volume, &mut ids);
        info!(count = found.len(), "cavity recognizer done");
        features.extend(found);
    }

    features
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_ids_are_padded_and_monotonic() {
        let mut ids = FeatureIds::new();
        assert_eq!(ids.next("hole"), "hole_0000");
        assert_eq!(ids.next("hole"), "hole_0001");
        assert_eq!(ids.next("fillet"), "fillet_0000");
        assert_eq!(ids.next("hole"), "hole_0002");
    }
}
