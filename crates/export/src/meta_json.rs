//! meta.json writer: entity counts, timings, warnings, bounding box.

use std::path::Path;

use serde::Serialize;
use tracing::info;

use camber_kernel::BoundingBox;

use crate::{write_file, ExportError};

#[derive(Debug, Clone, Default, Serialize)]
pub struct Counts {
    pub faces: usize,
    pub edges: usize,
    pub triangles: usize,
    pub features: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Timings {
    pub total_ms: u128,
}

#[derive(Debug, Clone, Serialize)]
pub struct Metadata {
    pub counts: Counts,
    pub timings: Timings,
    pub warnings: Vec<String>,
    pub units: String,
    pub bbox: Bbox,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Bbox {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl From<&BoundingBox> for Bbox {
    fn from(bb: &BoundingBox) -> Self {
        if bb.is_empty() {
            return Self::default();
        }
        Self {
            min: bb.min.to_array(),
            max: bb.max.to_array(),
        }
    }
}

pub fn export_metadata(meta: &Metadata, path: &Path) -> Result<(), ExportError> {
    let json = serde_json::to_string_pretty(meta)?;
    write_file(path, json.as_bytes())?;
    info!(path = %path.display(), "wrote metadata");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_schema() {
        let meta = Metadata {
            counts: Counts {
                faces: 7,
                edges: 16,
                triangles: 420,
                features: 1,
            },
            timings: Timings { total_ms: 12 },
            warnings: vec!["thickness analysis skipped".into()],
            units: "mm".into(),
            bbox: Bbox {
                min: [0.0; 3],
                max: [50.0, 50.0, 10.0],
            },
        };
        let json = serde_json::to_string_pretty(&meta).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(doc["counts"]["faces"], 7);
        assert_eq!(doc["timings"]["total_ms"], 12);
        assert_eq!(doc["units"], "mm");
        assert_eq!(doc["warnings"].as_array().unwrap().len(), 1);
        assert_eq!(doc["bbox"]["max"][0], 50.0);
    }
}
