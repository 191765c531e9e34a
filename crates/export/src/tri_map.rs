//! tri_face_map.bin writer: one little-endian u32 face id per triangle.

use std::path::Path;

use tracing::info;

use camber_kernel::TriangleMesh;

use crate::{write_file, ExportError};

pub fn export_tri_face_map(mesh: &TriangleMesh, path: &Path) -> Result<(), ExportError> {
    let mut bytes = Vec::with_capacity(mesh.tri_face.len() * 4);
    for &face in &mesh.tri_face {
        bytes.extend_from_slice(&face.to_le_bytes());
    }
    write_file(path, &bytes)?;
    info!(path = %path.display(), triangles = mesh.tri_face.len(), "wrote face map");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camber_kernel::primitives::make_box;
    use camber_kernel::SolidModel;

    #[test]
    fn test_map_is_one_u32_per_triangle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tri_face_map.bin");
        let shape = make_box(10.0, 10.0, 10.0);
        let mesh = shape.tessellate(0.1, 0.5);
        export_tri_face_map(&mesh, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), mesh.triangle_count() * 4);
        let first = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
        assert_eq!(first, mesh.tri_face[0]);
        // Ids stay within the face range.
        for chunk in bytes.chunks_exact(4) {
            let id = u32::from_le_bytes(chunk.try_into().unwrap());
            assert!((id as usize) < shape.face_count());
        }
    }
}
