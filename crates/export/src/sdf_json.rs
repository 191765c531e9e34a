//! thickness_sdf.json writer.

use std::path::Path;

use serde_json::json;
use tracing::info;

use camber_thickness::Sdf;

use crate::{write_file, ExportError};

pub fn export_sdf(sdf: &Sdf, path: &Path) -> Result<(), ExportError> {
    let doc = json!({
        "version": "1.0",
        "type": "thickness_sdf",
        "metadata": {
            "nx": sdf.nx,
            "ny": sdf.ny,
            "nz": sdf.nz,
            "voxel_count": sdf.voxel_count(),
            "voxel_size": sdf.voxel_size,
            "valid_voxels": sdf.valid_count,
            "thickness_range": [sdf.min_thickness, sdf.max_thickness],
            "bbox": { "min": sdf.min, "max": sdf.max },
        },
        "thickness": sdf.thickness,
    });
    let bytes = serde_json::to_vec(&doc)?;
    write_file(path, &bytes)?;
    info!(path = %path.display(), voxels = sdf.voxel_count(), "wrote thickness SDF");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camber_kernel::primitives::make_box;
    use camber_kernel::SolidModel;
    use camber_ray::RayScene;

    #[test]
    fn test_sdf_json_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thickness_sdf.json");
        let shape = make_box(10.0, 10.0, 10.0);
        let scene = RayScene::build(&shape.tessellate(0.1, 0.5)).unwrap();
        let sdf = camber_thickness::generate_sdf(&scene, &shape.bounding_box(), 6, 20.0);
        export_sdf(&sdf, &path).unwrap();

        let doc: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["type"], "thickness_sdf");
        let meta = &doc["metadata"];
        let count = meta["voxel_count"].as_u64().unwrap() as usize;
        assert_eq!(doc["thickness"].as_array().unwrap().len(), count);
        assert_eq!(
            meta["nx"].as_u64().unwrap() * meta["ny"].as_u64().unwrap()
                * meta["nz"].as_u64().unwrap(),
            count as u64
        );
    }
}
