//! Thickness-gradient analysis.
//!
//! Central differences over the dense grid give a gradient magnitude per
//! voxel; sharp thickness changes indicate stress concentration. Face
//! scores average the magnitudes around each face centroid and normalize
//! by the global maximum.

use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::debug;

use camber_kernel::SolidModel;

use crate::sdf::Sdf;

/// Gradient magnitude per voxel; zero where the voxel or any 6-neighbor
/// is invalid.
pub fn compute_gradients(sdf: &Sdf) -> Vec<f64> {
    let (nx, ny, nz) = (sdf.nx, sdf.ny, sdf.nz);
    let mut gradients = vec![0.0; sdf.voxel_count()];
    if nx < 3 || ny < 3 || nz < 3 {
        return gradients;
    }

    let t = &sdf.thickness;
    let voxel_size = sdf.voxel_size;
    gradients
        .par_iter_mut()
        .enumerate()
        .for_each(|(idx, out)| {
            let i = idx % nx;
            let j = (idx / nx) % ny;
            let k = idx / (nx * ny);
            if i == 0 || j == 0 || k == 0 || i == nx - 1 || j == ny - 1 || k == nz - 1 {
                return;
            }
            if t[idx] < 0.0 {
                return;
            }
            let xp = t[idx + 1];
            let xm = t[idx - 1];
            let yp = t[idx + nx];
            let ym = t[idx - nx];
            let zp = t[idx + nx * ny];
            let zm = t[idx - nx * ny];
            if xp < 0.0 || xm < 0.0 || yp < 0.0 || ym < 0.0 || zp < 0.0 || zm < 0.0 {
                return;
            }
            let gx = (xp - xm) / (2.0 * voxel_size);
            let gy = (yp - ym) / (2.0 * voxel_size);
            let gz = (zp - zm) / (2.0 * voxel_size);
            *out = (gx * gx + gy * gy + gz * gz).sqrt();
        });
    gradients
}

/// Per-face stress-concentration index in [0, 1]: average gradient
/// magnitude in the 3x3x3 neighborhood of the voxel containing each face
/// centroid, normalized by the global maximum.
pub fn stress_concentration(model: &dyn SolidModel, sdf: &Sdf) -> BTreeMap<usize, f64> {
    let gradients = compute_gradients(sdf);
    let mut scores = BTreeMap::new();

    for face in 0..model.face_count() {
        let c = model.face_centroid(face);
        let i = ((c.x - sdf.min[0]) / sdf.voxel_size) as i64;
        let j = ((c.y - sdf.min[1]) / sdf.voxel_size) as i64;
        let k = ((c.z - sdf.min[2]) / sdf.voxel_size) as i64;
        if !valid_voxel(sdf, i, j, k) {
            continue;
        }

        let mut total = 0.0;
        let mut samples = 0usize;
        for dk in -1..=1 {
            for dj in -1..=1 {
                for di in -1..=1 {
                    let (ni, nj, nk) = (i + di, j + dj, k + dk);
                    if !valid_voxel(sdf, ni, nj, nk) {
                        continue;
                    }
                    let idx = sdf.index(ni as usize, nj as usize, nk as usize);
                    if sdf.thickness[idx] >= 0.0 && gradients[idx] > 0.0 {
                        total += gradients[idx];
                        samples += 1;
                    }
                }
            }
        }
        if samples > 0 {
            scores.insert(face, total / samples as f64);
        }
    }

    let max = scores.values().fold(0.0f64, |a, &b| a.max(b));
    if max > 0.0 {
        for v in scores.values_mut() {
            *v /= max;
        }
    }
    debug!(faces = scores.len(), "stress concentration scores");
    scores
}

fn valid_voxel(sdf: &Sdf, i: i64, j: i64, k: i64) -> bool {
    i >= 0 && j >= 0 && k >= 0 && (i as usize) < sdf.nx && (j as usize) < sdf.ny && (k as usize) < sdf.nz
}

#[cfg(test)]
mod tests {
    use super::*;
    use camber_kernel::primitives::{block_with_pockets, make_box};
    use camber_ray::RayScene;

    #[test]
    fn test_uniform_block_has_flat_gradients_inside() {
        let shape = make_box(20.0, 20.0, 20.0);
        let scene = RayScene::build(&shape.tessellate(0.1, 0.5)).unwrap();
        let sdf = crate::sdf::generate_sdf(&scene, &shape.bounding_box(), 10, 50.0);
        let gradients = compute_gradients(&sdf);
        assert_eq!(gradients.len(), sdf.voxel_count());
        assert!(gradients.iter().all(|g| g.is_finite()));
    }

    #[test]
    fn test_scores_normalized_to_unit_range() {
        let shape = block_with_pockets(40.0, 40.0, 20.0, &[(10.0, 10.0, 30.0, 30.0, 12.0)]);
        let scene = RayScene::build(&shape.tessellate(0.1, 0.5)).unwrap();
        let sdf = crate::sdf::generate_sdf(&scene, &shape.bounding_box(), 16, 50.0);
        let scores = stress_concentration(&shape, &sdf);
        for (&face, &score) in &scores {
            assert!((0.0..=1.0).contains(&score), "face {} score {}", face, score);
        }
    }
}
