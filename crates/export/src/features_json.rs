//! features.json writer.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use camber_features::Feature;

use crate::{write_file, ExportError};

/// Top-level feature document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureFile {
    pub model_id: String,
    pub units: String,
    pub features: Vec<Feature>,
}

impl FeatureFile {
    pub fn new(units: &str, features: Vec<Feature>) -> Self {
        Self {
            model_id: Uuid::new_v4().to_string(),
            units: units.to_string(),
            features,
        }
    }
}

/// Serialize with canonical key order (struct order plus sorted params).
pub fn to_json(file: &FeatureFile) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(file)?)
}

pub fn export_features(file: &FeatureFile, path: &Path) -> Result<(), ExportError> {
    let json = to_json(file)?;
    write_file(path, json.as_bytes())?;
    info!(path = %path.display(), count = file.features.len(), "wrote features");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sample() -> FeatureFile {
        let mut params = BTreeMap::new();
        params.insert("diameter_mm".to_string(), 10.0);
        params.insert("axis_z".to_string(), 1.0);
        FeatureFile {
            model_id: "fixed".into(),
            units: "mm".into(),
            features: vec![Feature {
                id: "hole_0000".into(),
                feature_type: "hole".into(),
                subtype: "simple".into(),
                faces: vec![6],
                edges: vec![],
                params,
                source: "hole_recognizer".into(),
                confidence: 0.95,
            }],
        }
    }

    #[test]
    fn test_round_trip_is_byte_identical() {
        let first = to_json(&sample()).unwrap();
        let parsed: FeatureFile = serde_json::from_str(&first).unwrap();
        let second = to_json(&parsed).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_field_names_match_schema() {
        let json = to_json(&sample()).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&json).unwrap();
        let feat = &doc["features"][0];
        for key in ["id", "type", "subtype", "faces", "edges", "params", "source", "confidence"] {
            assert!(feat.get(key).is_some(), "missing key {}", key);
        }
    }
}
