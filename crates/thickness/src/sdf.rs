//! Voxel-grid thickness fields.
//!
//! A uniform grid over the padded bounding box stores local thickness
//! (twice the distance to the nearest wall) at interior voxel centers and
//! -1 elsewhere. The dense generator visits every voxel; the adaptive
//! variant first marks near-surface regions on a coarse grid and only
//! refines inside the narrow band. Both are data-parallel over voxels
//! with statistics folded per thread and merged associatively.

use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use camber_kernel::{BoundingBox, Point3d, Vec3};
use camber_ray::RayScene;

/// Bounding-box padding applied before gridding.
const PADDING: f64 = 0.1;
/// Early-termination fraction: a running minimum above this share of the
/// search distance after three rays means deep interior.
const EARLY_TERM_FRACTION: f64 = 0.8;
/// Coarse-to-fine refinement factor of the adaptive variant.
const COARSE_FACTOR: usize = 4;

const AXIS_DIRECTIONS: [Vec3; 6] = [
    Vec3 { x: 1.0, y: 0.0, z: 0.0 },
    Vec3 { x: -1.0, y: 0.0, z: 0.0 },
    Vec3 { x: 0.0, y: 1.0, z: 0.0 },
    Vec3 { x: 0.0, y: -1.0, z: 0.0 },
    Vec3 { x: 0.0, y: 0.0, z: 1.0 },
    Vec3 { x: 0.0, y: 0.0, z: -1.0 },
];

/// A computed thickness field.
#[derive(Debug, Clone, Serialize)]
pub struct Sdf {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
    pub min: [f64; 3],
    pub max: [f64; 3],
    pub voxel_size: f64,
    /// Row-major: `thickness[k*nx*ny + j*nx + i]`; -1 marks outside or
    /// unmeasured voxels.
    pub thickness: Vec<f64>,
    pub min_thickness: f64,
    pub max_thickness: f64,
    pub valid_count: usize,
    pub invalid_count: usize,
}

impl Sdf {
    fn layout(bbox: &BoundingBox, resolution: usize) -> Self {
        let padded = bbox.padded(PADDING);
        let extents = padded.extents();
        let voxel_size = padded.max_extent() / resolution as f64;
        let nx = (extents[0] / voxel_size).ceil() as usize + 1;
        let ny = (extents[1] / voxel_size).ceil() as usize + 1;
        let nz = (extents[2] / voxel_size).ceil() as usize + 1;
        Self {
            nx,
            ny,
            nz,
            min: padded.min.to_array(),
            max: padded.max.to_array(),
            voxel_size,
            thickness: vec![-1.0; nx * ny * nz],
            min_thickness: f64::MAX,
            max_thickness: 0.0,
            valid_count: 0,
            invalid_count: 0,
        }
    }

    pub fn voxel_count(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    pub fn index(&self, i: usize, j: usize, k: usize) -> usize {
        k * self.nx * self.ny + j * self.nx + i
    }

    pub fn voxel_center(&self, i: usize, j: usize, k: usize) -> Point3d {
        Point3d::new(
            self.min[0] + i as f64 * self.voxel_size,
            self.min[1] + j as f64 * self.voxel_size,
            self.min[2] + k as f64 * self.voxel_size,
        )
    }

    fn apply_stats(&mut self, stats: Stats) {
        self.min_thickness = stats.min;
        self.max_thickness = stats.max;
        self.valid_count = stats.valid;
        self.invalid_count = stats.invalid;
    }
}

/// Per-thread accumulator merged associatively at the end.
#[derive(Debug, Clone, Copy)]
struct Stats {
    min: f64,
    max: f64,
    valid: usize,
    invalid: usize,
}

impl Stats {
    fn empty() -> Self {
        Self {
            min: f64::MAX,
            max: 0.0,
            valid: 0,
            invalid: 0,
        }
    }

    fn record(mut self, thickness: f64) -> Self {
        if thickness >= 0.0 {
            self.valid += 1;
            self.min = self.min.min(thickness);
            self.max = self.max.max(thickness);
        } else {
            self.invalid += 1;
        }
        self
    }

    fn merge(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
            valid: self.valid + other.valid,
            invalid: self.invalid + other.invalid,
        }
    }
}

/// Six axis rays from an interior point; the minimum hit distance doubles
/// into the local thickness. Stops after three rays when the running
/// minimum already exceeds the deep-interior fraction of the search
/// distance.
fn voxel_thickness(scene: &RayScene, center: &Point3d, max_search: f64) -> f64 {
    if !scene.is_inside(center) {
        return -1.0;
    }
    let mut min_distance = max_search;
    let mut found = false;
    for (i, dir) in AXIS_DIRECTIONS.iter().enumerate() {
        if let Some(hit) = scene.cast_ray(center, dir, max_search) {
            if hit.distance < min_distance {
                min_distance = hit.distance;
                found = true;
            }
        }
        if i >= 2 && min_distance > max_search * EARLY_TERM_FRACTION {
            break;
        }
    }
    if found && min_distance < max_search {
        2.0 * min_distance
    } else {
        -1.0
    }
}

/// Dense thickness field over the whole grid.
pub fn generate_sdf(
    scene: &RayScene,
    bbox: &BoundingBox,
    resolution: usize,
    max_search_distance: f64,
) -> Sdf {
    let mut sdf = Sdf::layout(bbox, resolution);
    info!(
        nx = sdf.nx,
        ny = sdf.ny,
        nz = sdf.nz,
        voxel_size = sdf.voxel_size,
        "dense SDF grid"
    );

    let (nx, ny) = (sdf.nx, sdf.ny);
    let min = sdf.min;
    let voxel_size = sdf.voxel_size;

    let stats = sdf
        .thickness
        .par_iter_mut()
        .enumerate()
        .fold(Stats::empty, |acc, (idx, slot)| {
            let i = idx % nx;
            let j = (idx / nx) % ny;
            let k = idx / (nx * ny);
            let center = Point3d::new(
                min[0] + i as f64 * voxel_size,
                min[1] + j as f64 * voxel_size,
                min[2] + k as f64 * voxel_size,
            );
            *slot = voxel_thickness(scene, &center, max_search_distance);
            acc.record(*slot)
        })
        .reduce(Stats::empty, Stats::merge);

    sdf.apply_stats(stats);
    info!(
        valid = sdf.valid_count,
        invalid = sdf.invalid_count,
        "dense SDF complete"
    );
    sdf
}

/// Two-pass narrow-band thickness field: a coarse boundary mask at a
/// quarter of the resolution, then full-resolution thickness only for
/// voxels whose coarse parent sits within the band.
pub fn generate_adaptive_sdf(
    scene: &RayScene,
    bbox: &BoundingBox,
    resolution: usize,
    narrow_band_width: f64,
) -> Sdf {
    let mut sdf = Sdf::layout(bbox, resolution);
    let coarse_nx = (sdf.nx / COARSE_FACTOR).max(1);
    let coarse_ny = (sdf.ny / COARSE_FACTOR).max(1);
    let coarse_nz = (sdf.nz / COARSE_FACTOR).max(1);
    let coarse_voxel = sdf.voxel_size * COARSE_FACTOR as f64;
    info!(
        nx = sdf.nx,
        ny = sdf.ny,
        nz = sdf.nz,
        coarse_nx,
        coarse_ny,
        coarse_nz,
        narrow_band_width,
        "adaptive SDF grid"
    );

    let min = sdf.min;

    // Pass 1: coarse boundary mask from surface distance at cell centers.
    let boundary: Vec<bool> = (0..coarse_nx * coarse_ny * coarse_nz)
        .into_par_iter()
        .map(|idx| {
            let i = idx % coarse_nx;
            let j = (idx / coarse_nx) % coarse_ny;
            let k = idx / (coarse_nx * coarse_ny);
            let center = Point3d::new(
                min[0] + (i as f64 + 0.5) * coarse_voxel,
                min[1] + (j as f64 + 0.5) * coarse_voxel,
                min[2] + (k as f64 + 0.5) * coarse_voxel,
            );
            scene.distance_to_surface(&center) <= narrow_band_width
        })
        .collect();
    let marked = boundary.iter().filter(|&&b| b).count();
    info!(
        marked,
        total = boundary.len(),
        "coarse boundary mask"
    );

    // Pass 2: fine thickness inside the band, with the band width as the
    // search distance.
    let (nx, ny) = (sdf.nx, sdf.ny);
    let voxel_size = sdf.voxel_size;
    let stats = sdf
        .thickness
        .par_iter_mut()
        .enumerate()
        .fold(Stats::empty, |acc, (idx, slot)| {
            let i = idx % nx;
            let j = (idx / nx) % ny;
            let k = idx / (nx * ny);
            let ci = (i / COARSE_FACTOR).min(coarse_nx - 1);
            let cj = (j / COARSE_FACTOR).min(coarse_ny - 1);
            let ck = (k / COARSE_FACTOR).min(coarse_nz - 1);
            if !boundary[ck * coarse_nx * coarse_ny + cj * coarse_nx + ci] {
                return acc;
            }
            let center = Point3d::new(
                min[0] + i as f64 * voxel_size,
                min[1] + j as f64 * voxel_size,
                min[2] + k as f64 * voxel_size,
            );
            *slot = voxel_thickness(scene, &center, narrow_band_width);
            acc.record(*slot)
        })
        .reduce(Stats::empty, Stats::merge);

    sdf.apply_stats(stats);
    info!(
        valid = sdf.valid_count,
        invalid = sdf.invalid_count,
        "adaptive SDF complete"
    );
    sdf
}

#[cfg(test)]
mod tests {
    use super::*;
    use camber_kernel::primitives::make_box;
    use camber_kernel::SolidModel;

    fn box_scene(d: f64) -> (camber_kernel::Shape, RayScene) {
        let shape = make_box(d, d, d);
        let scene = RayScene::build(&shape.tessellate(0.1, 0.5)).unwrap();
        (shape, scene)
    }

    #[test]
    fn test_grid_dimensions_follow_resolution() {
        let (shape, scene) = box_scene(20.0);
        let sdf = generate_sdf(&scene, &shape.bounding_box(), 10, 50.0);
        // 20.2 padded extent at voxel 2.02: 11 samples per axis.
        assert_eq!((sdf.nx, sdf.ny, sdf.nz), (11, 11, 11));
        assert!((sdf.voxel_size - 2.02).abs() < 1e-9);
        assert_eq!(sdf.thickness.len(), sdf.voxel_count());
    }

    #[test]
    fn test_interior_voxels_measure_thickness() {
        let (shape, scene) = box_scene(20.0);
        let sdf = generate_sdf(&scene, &shape.bounding_box(), 10, 50.0);
        // Center voxel: 10 mm to every wall, thickness 20.
        let idx = sdf.index(5, 5, 5);
        assert!((sdf.thickness[idx] - 20.0).abs() < 0.2);
        // Grid corner lies outside the solid.
        assert_eq!(sdf.thickness[sdf.index(0, 0, 0)], -1.0);
        assert!(sdf.valid_count > 0);
        assert!(sdf.min_thickness <= sdf.max_thickness);
    }

    #[test]
    fn test_search_distance_monotonicity() {
        // Growing the search distance never invalidates a voxel and never
        // increases a reported value.
        let (shape, scene) = box_scene(20.0);
        let small = generate_sdf(&scene, &shape.bounding_box(), 8, 6.0);
        let large = generate_sdf(&scene, &shape.bounding_box(), 8, 12.0);
        assert!(large.valid_count >= small.valid_count);
        for (s, l) in small.thickness.iter().zip(large.thickness.iter()) {
            if *s >= 0.0 {
                assert!(*l >= 0.0, "valid voxel lost at larger search distance");
                assert!(*l <= *s + 1e-6, "value grew: {} -> {}", s, l);
            }
        }
    }

    #[test]
    fn test_adaptive_band_skips_deep_interior() {
        let (shape, scene) = box_scene(40.0);
        let sdf = generate_adaptive_sdf(&scene, &shape.bounding_box(), 20, 5.0);
        // A voxel near the wall is measured...
        let near_wall = sdf.index(1, sdf.ny / 2, sdf.nz / 2);
        assert!(sdf.thickness[near_wall] >= 0.0);
        // ...while the deep center stays unmeasured.
        let center = sdf.index(sdf.nx / 2, sdf.ny / 2, sdf.nz / 2);
        assert_eq!(sdf.thickness[center], -1.0);
    }
}
