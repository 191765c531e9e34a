//! glTF-2.0 binary (GLB) mesh export.
//!
//! The render mesh carries POSITION, NORMAL, and indices with flat
//! per-face normals. The analysis variant adds COLOR_0 vertex colors from
//! a thickness heatmap (blue through red, thick to thin; gray where no
//! measurement succeeded) and a double-sided unlit-ish material.

use std::path::Path;

use serde_json::json;
use tracing::info;

use camber_kernel::{TriangleMesh, Vec3};
use camber_ray::RayScene;

use crate::{write_file, ExportError};

const GLB_MAGIC: u32 = 0x4654_6C67;
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;
const ARRAY_BUFFER: u32 = 34962;
const ELEMENT_ARRAY_BUFFER: u32 = 34963;
const FLOAT: u32 = 5126;
const UNSIGNED_INT: u32 = 5125;
const TRIANGLES: u32 = 4;

/// Write the render mesh as a GLB file.
pub fn export_mesh(mesh: &TriangleMesh, path: &Path) -> Result<(), ExportError> {
    if mesh.triangle_count() == 0 {
        return Err(ExportError::Empty {
            reason: "empty tessellation".into(),
        });
    }
    let glb = build_glb(mesh, None)?;
    write_file(path, &glb)?;
    info!(
        path = %path.display(),
        triangles = mesh.triangle_count(),
        "wrote mesh"
    );
    Ok(())
}

/// Write the dense analysis mesh with a per-vertex thickness heatmap.
pub fn export_analysis_mesh(
    mesh: &TriangleMesh,
    scene: &RayScene,
    max_search_distance: f64,
    path: &Path,
) -> Result<(), ExportError> {
    if mesh.triangle_count() == 0 {
        return Err(ExportError::Empty {
            reason: "empty tessellation".into(),
        });
    }
    let thicknesses = vertex_thicknesses(mesh, scene, max_search_distance);
    let colors = heatmap_colors(&thicknesses);
    let glb = build_glb(mesh, Some(&colors))?;
    write_file(path, &glb)?;
    info!(
        path = %path.display(),
        vertices = mesh.vertex_count(),
        "wrote analysis mesh"
    );
    Ok(())
}

/// Two-sided normal thickness at every mesh vertex; -1 when unmeasured.
fn vertex_thicknesses(mesh: &TriangleMesh, scene: &RayScene, max_search: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(mesh.vertex_count());
    for v in 0..mesh.vertex_count() {
        let p = mesh.vertex(v);
        let n = Vec3::new(
            mesh.normals[3 * v] as f64,
            mesh.normals[3 * v + 1] as f64,
            mesh.normals[3 * v + 2] as f64,
        );
        let thickness = match n.normalized() {
            Some(n) => {
                let fwd = scene
                    .cast_ray_min(&p, &n, max_search, camber_thickness::MIN_SELF_DISTANCE)
                    .map(|h| h.distance);
                let back = scene
                    .cast_ray_min(&p, &(-n), max_search, camber_thickness::MIN_SELF_DISTANCE)
                    .map(|h| h.distance);
                match (fwd, back) {
                    (Some(a), Some(b)) => a.min(b),
                    (Some(a), None) => a,
                    (None, Some(b)) => b,
                    (None, None) => -1.0,
                }
            }
            None => -1.0,
        };
        out.push(thickness);
    }
    out
}

/// Blue (thick) through cyan, green, yellow to red (thin); gray for
/// unmeasured vertices.
fn heatmap_colors(thicknesses: &[f64]) -> Vec<f32> {
    let measured: Vec<f64> = thicknesses.iter().copied().filter(|&t| t > 0.0).collect();
    let min = measured.iter().fold(f64::MAX, |a, &b| a.min(b));
    let max = measured.iter().fold(0.0f64, |a, &b| a.max(b));

    let mut colors = Vec::with_capacity(thicknesses.len() * 3);
    for &t in thicknesses {
        let (r, g, b) = if t < 0.0 {
            (0.5, 0.5, 0.5)
        } else {
            let normalized = if max > min {
                ((t - min) / (max - min)) as f32
            } else {
                0.5
            };
            ramp(1.0 - normalized)
        };
        colors.push(r);
        colors.push(g);
        colors.push(b);
    }
    colors
}

fn ramp(x: f32) -> (f32, f32, f32) {
    if x < 0.25 {
        (0.0, x * 4.0, 1.0)
    } else if x < 0.5 {
        (0.0, 1.0, 1.0 - (x - 0.25) * 4.0)
    } else if x < 0.75 {
        ((x - 0.5) * 4.0, 1.0, 0.0)
    } else {
        (1.0, 1.0 - (x - 0.75) * 4.0, 0.0)
    }
}

fn push_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn build_glb(mesh: &TriangleMesh, colors: Option<&[f32]>) -> Result<Vec<u8>, ExportError> {
    // Pack positions, normals, optional colors, then indices.
    let mut bin = Vec::new();
    for &f in &mesh.positions {
        bin.extend_from_slice(&f.to_le_bytes());
    }
    let normals_offset = bin.len();
    for &f in &mesh.normals {
        bin.extend_from_slice(&f.to_le_bytes());
    }
    let colors_offset = bin.len();
    if let Some(colors) = colors {
        for &f in colors {
            bin.extend_from_slice(&f.to_le_bytes());
        }
    }
    let indices_offset = bin.len();
    for &i in &mesh.indices {
        bin.extend_from_slice(&i.to_le_bytes());
    }

    let (mut min_p, mut max_p) = ([f32::MAX; 3], [f32::MIN; 3]);
    for chunk in mesh.positions.chunks_exact(3) {
        for i in 0..3 {
            min_p[i] = min_p[i].min(chunk[i]);
            max_p[i] = max_p[i].max(chunk[i]);
        }
    }

    let mut buffer_views = vec![
        json!({
            "buffer": 0,
            "byteOffset": 0,
            "byteLength": normals_offset,
            "target": ARRAY_BUFFER,
        }),
        json!({
            "buffer": 0,
            "byteOffset": normals_offset,
            "byteLength": colors_offset - normals_offset,
            "target": ARRAY_BUFFER,
        }),
    ];
    let mut accessors = vec![
        json!({
            "bufferView": 0,
            "byteOffset": 0,
            "componentType": FLOAT,
            "count": mesh.vertex_count(),
            "type": "VEC3",
            "min": min_p,
            "max": max_p,
        }),
        json!({
            "bufferView": 1,
            "byteOffset": 0,
            "componentType": FLOAT,
            "count": mesh.vertex_count(),
            "type": "VEC3",
        }),
    ];
    let mut attributes = json!({ "POSITION": 0, "NORMAL": 1 });

    if colors.is_some() {
        buffer_views.push(json!({
            "buffer": 0,
            "byteOffset": colors_offset,
            "byteLength": indices_offset - colors_offset,
            "target": ARRAY_BUFFER,
        }));
        accessors.push(json!({
            "bufferView": 2,
            "byteOffset": 0,
            "componentType": FLOAT,
            "count": mesh.vertex_count(),
            "type": "VEC3",
        }));
        attributes["COLOR_0"] = json!(2);
    }

    let indices_view = buffer_views.len();
    buffer_views.push(json!({
        "buffer": 0,
        "byteOffset": indices_offset,
        "byteLength": bin.len() - indices_offset,
        "target": ELEMENT_ARRAY_BUFFER,
    }));
    let indices_accessor = accessors.len();
    accessors.push(json!({
        "bufferView": indices_view,
        "byteOffset": 0,
        "componentType": UNSIGNED_INT,
        "count": mesh.indices.len(),
        "type": "SCALAR",
    }));

    let mut primitive = json!({
        "attributes": attributes,
        "indices": indices_accessor,
        "mode": TRIANGLES,
    });

    let mut root = json!({
        "asset": { "version": "2.0", "generator": "camber-engine" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "mesh": 0 }],
        "buffers": [{ "byteLength": bin.len() }],
        "bufferViews": buffer_views,
        "accessors": accessors,
    });
    if colors.is_some() {
        root["materials"] = json!([{
            "name": "ThicknessHeatmap",
            "pbrMetallicRoughness": {
                "baseColorFactor": [1.0, 1.0, 1.0, 1.0],
                "metallicFactor": 0.0,
                "roughnessFactor": 1.0,
            },
            "doubleSided": true,
        }]);
        primitive["material"] = json!(0);
    }
    root["meshes"] = json!([{ "primitives": [primitive] }]);

    let mut json_bytes = serde_json::to_vec(&root)?;
    while json_bytes.len() % 4 != 0 {
        json_bytes.push(b' ');
    }
    let mut bin_bytes = bin;
    while bin_bytes.len() % 4 != 0 {
        bin_bytes.push(0);
    }

    let total = 12 + 8 + json_bytes.len() + 8 + bin_bytes.len();
    let mut glb = Vec::with_capacity(total);
    push_u32(&mut glb, GLB_MAGIC);
    push_u32(&mut glb, 2);
    push_u32(&mut glb, total as u32);
    push_u32(&mut glb, json_bytes.len() as u32);
    push_u32(&mut glb, CHUNK_JSON);
    glb.extend_from_slice(&json_bytes);
    push_u32(&mut glb, bin_bytes.len() as u32);
    push_u32(&mut glb, CHUNK_BIN);
    glb.extend_from_slice(&bin_bytes);
    Ok(glb)
}
