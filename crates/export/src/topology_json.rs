//! topology.json writer: vertex positions and discretized edge polylines.

use std::path::Path;

use serde::Serialize;
use tracing::info;

use camber_kernel::SolidModel;

use crate::{write_file, ExportError};

#[derive(Debug, Serialize)]
struct TopoVertex {
    id: usize,
    position: [f64; 3],
}

#[derive(Debug, Serialize)]
struct TopoEdge {
    id: usize,
    vertices: [usize; 2],
    points: Vec<[f64; 3]>,
}

#[derive(Debug, Serialize)]
struct TopologyFile {
    vertices: Vec<TopoVertex>,
    edges: Vec<TopoEdge>,
}

pub fn export_topology(model: &dyn SolidModel, path: &Path) -> Result<(), ExportError> {
    let vertices: Vec<TopoVertex> = (0..model.vertex_count())
        .map(|v| TopoVertex {
            id: v,
            position: model.vertex_point(v).to_array(),
        })
        .collect();

    let edges: Vec<TopoEdge> = (0..model.edge_count())
        .map(|e| {
            let (a, b) = model.edge_vertices(e);
            TopoEdge {
                id: e,
                vertices: [a, b],
                points: model
                    .edge_polyline(e)
                    .into_iter()
                    .map(|p| p.to_array())
                    .collect(),
            }
        })
        .collect();

    let file = TopologyFile { vertices, edges };
    let json = serde_json::to_string_pretty(&file)?;
    write_file(path, json.as_bytes())?;
    info!(
        path = %path.display(),
        vertices = file.vertices.len(),
        edges = file.edges.len(),
        "wrote topology"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camber_kernel::primitives::make_box;

    #[test]
    fn test_topology_counts_and_polyline_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("topology.json");
        let shape = make_box(100.0, 50.0, 20.0);
        export_topology(&shape, &path).unwrap();

        let doc: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["vertices"].as_array().unwrap().len(), 8);
        let edges = doc["edges"].as_array().unwrap();
        assert_eq!(edges.len(), 12);
        for e in edges {
            let n = e["points"].as_array().unwrap().len();
            assert!((10..=100).contains(&n), "polyline size {}", n);
        }
    }
}
