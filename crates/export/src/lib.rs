//! Output artifact writers: glTF binary meshes, the triangle-to-face map,
//! and the JSON documents describing features, topology, and metadata.

pub mod aag_json;
pub mod features_json;
pub mod gltf;
pub mod meta_json;
pub mod sdf_json;
pub mod topology_json;
pub mod tri_map;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("nothing to export: {reason}")]
    Empty { reason: String },
}

pub(crate) fn write_file(path: &std::path::Path, bytes: &[u8]) -> Result<(), ExportError> {
    std::fs::write(path, bytes).map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })
}
