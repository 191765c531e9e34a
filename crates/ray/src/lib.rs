//! Ray-tracer interface over a tessellated shape.
//!
//! A binary BVH over the triangle soup answers nearest-hit queries with a
//! small positive near clip (0.01) so rays started on a surface do not
//! report their own triangle. The inside test casts three axis rays,
//! takes the odd-even parity of each, and majority-votes.

use rayon::prelude::*;
use tracing::debug;

use camber_kernel::{Point3d, TriangleMesh, Vec3};

/// Self-hit rejection clip for every cast.
pub const T_NEAR: f64 = 0.01;

const MAX_LEAF_TRIANGLES: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum RayError {
    #[error("cannot build a ray scene from an empty mesh")]
    EmptyMesh,
}

#[derive(Debug, Clone, Copy)]
struct Aabb {
    min: [f64; 3],
    max: [f64; 3],
}

impl Aabb {
    fn empty() -> Self {
        Self {
            min: [f64::MAX; 3],
            max: [f64::MIN; 3],
        }
    }

    fn add(&mut self, p: &[f64; 3]) {
        for i in 0..3 {
            self.min[i] = self.min[i].min(p[i]);
            self.max[i] = self.max[i].max(p[i]);
        }
    }

    fn merge(&mut self, other: &Aabb) {
        for i in 0..3 {
            self.min[i] = self.min[i].min(other.min[i]);
            self.max[i] = self.max[i].max(other.max[i]);
        }
    }

    fn longest_axis(&self) -> usize {
        let e = [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ];
        if e[0] >= e[1] && e[0] >= e[2] {
            0
        } else if e[1] >= e[2] {
            1
        } else {
            2
        }
    }

    /// Distance from a point to the box, zero inside.
    fn distance_to_point(&self, p: &[f64; 3]) -> f64 {
        let mut d2 = 0.0;
        for i in 0..3 {
            let d = (self.min[i] - p[i]).max(p[i] - self.max[i]).max(0.0);
            d2 += d * d;
        }
        d2.sqrt()
    }

    /// Slab test; returns true when the ray can hit within [t_near, t_far].
    fn hit(&self, origin: &[f64; 3], inv_dir: &[f64; 3], t_far: f64) -> bool {
        let mut t0 = T_NEAR * 0.1;
        let mut t1 = t_far;
        for i in 0..3 {
            let lo = (self.min[i] - origin[i]) * inv_dir[i];
            let hi = (self.max[i] - origin[i]) * inv_dir[i];
            let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
            t0 = t0.max(lo);
            t1 = t1.min(hi);
            if t0 > t1 {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy)]
struct BvhNode {
    bounds: Aabb,
    /// Left child index for internal nodes, first triangle slot for leaves.
    left_or_start: u32,
    /// Right child index for internal nodes, triangle count for leaves.
    right_or_count: u32,
    is_leaf: bool,
}

#[derive(Debug, Clone, Copy)]
struct Triangle {
    v0: [f64; 3],
    v1: [f64; 3],
    v2: [f64; 3],
}

impl Triangle {
    fn centroid(&self) -> [f64; 3] {
        [
            (self.v0[0] + self.v1[0] + self.v2[0]) / 3.0,
            (self.v0[1] + self.v1[1] + self.v2[1]) / 3.0,
            (self.v0[2] + self.v1[2] + self.v2[2]) / 3.0,
        ]
    }

    fn aabb(&self) -> Aabb {
        let mut bb = Aabb::empty();
        bb.add(&self.v0);
        bb.add(&self.v1);
        bb.add(&self.v2);
        bb
    }
}

/// A hit: distance along the ray and the face id of the triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub distance: f64,
    pub face_id: u32,
}

/// BVH-accelerated ray scene over an immutable triangle mesh.
///
/// All queries take `&self`; concurrent use from multiple threads is fine.
pub struct RayScene {
    nodes: Vec<BvhNode>,
    triangles: Vec<Triangle>,
    tri_face: Vec<u32>,
    order: Vec<u32>,
}

impl RayScene {
    /// Build a scene from a tessellation.
    pub fn build(mesh: &TriangleMesh) -> Result<Self, RayError> {
        let n = mesh.triangle_count();
        if n == 0 {
            return Err(RayError::EmptyMesh);
        }

        let triangles: Vec<Triangle> = (0..n)
            .map(|t| {
                let [a, b, c] = mesh.triangle(t);
                Triangle {
                    v0: a.to_array(),
                    v1: b.to_array(),
                    v2: c.to_array(),
                }
            })
            .collect();
        let tri_face = mesh.tri_face.clone();

        let centroids: Vec<[f64; 3]> = triangles.iter().map(|t| t.centroid()).collect();
        let boxes: Vec<Aabb> = triangles.iter().map(|t| t.aabb()).collect();

        let mut order: Vec<u32> = (0..n as u32).collect();
        let mut nodes = Vec::with_capacity(2 * n);
        build_node(&mut nodes, &mut order, &centroids, &boxes, 0, n);

        debug!(triangles = n, nodes = nodes.len(), "built ray scene");
        Ok(Self {
            nodes,
            triangles,
            tri_face,
            order,
        })
    }

    /// Nearest hit along a ray within (T_NEAR, t_max], or None.
    pub fn cast_ray(&self, origin: &Point3d, dir: &Vec3, t_max: f64) -> Option<Hit> {
        let dir = dir.normalized()?;
        let o = origin.to_array();
        let d = dir.to_array();
        let inv = [
            1.0 / non_zero(d[0]),
            1.0 / non_zero(d[1]),
            1.0 / non_zero(d[2]),
        ];

        let mut best: Option<Hit> = None;
        let mut t_limit = t_max;
        let mut stack = [0u32; 64];
        let mut sp = 0usize;
        stack[sp] = 0;
        sp += 1;

        while sp > 0 {
            sp -= 1;
            let node = self.nodes[stack[sp] as usize];
            if !node.bounds.hit(&o, &inv, t_limit) {
                continue;
            }
            if node.is_leaf {
                let start = node.left_or_start;
                for slot in start..start + node.right_or_count {
                    let ti = self.order[slot as usize] as usize;
                    if let Some(t) = ray_triangle(&o, &d, &self.triangles[ti]) {
                        if t > T_NEAR && t <= t_limit {
                            t_limit = t;
                            best = Some(Hit {
                                distance: t,
                                face_id: self.tri_face[ti],
                            });
                        }
                    }
                }
            } else {
                stack[sp] = node.left_or_start;
                stack[sp + 1] = node.right_or_count;
                sp += 2;
            }
        }
        best
    }

    /// Nearest hit farther than `min_dist`, advancing past closer hits.
    /// Callers use this to apply a self-hit filter wider than the near
    /// clip (e.g. the 0.1 thickness filter).
    pub fn cast_ray_min(
        &self,
        origin: &Point3d,
        dir: &Vec3,
        t_max: f64,
        min_dist: f64,
    ) -> Option<Hit> {
        let dir_n = dir.normalized()?;
        let mut offset = 0.0;
        for _ in 0..16 {
            let start = *origin + dir_n * offset;
            let hit = self.cast_ray(&start, &dir_n, t_max - offset)?;
            let total = offset + hit.distance;
            if total > min_dist {
                return Some(Hit {
                    distance: total,
                    face_id: hit.face_id,
                });
            }
            offset = total + T_NEAR * 0.5;
        }
        None
    }

    /// Batch variant of [`cast_ray`]; one slot per input ray.
    pub fn cast_rays(&self, origins: &[Point3d], dirs: &[Vec3], t_max: f64) -> Vec<Option<Hit>> {
        origins
            .par_iter()
            .zip(dirs.par_iter())
            .map(|(o, d)| self.cast_ray(o, d, t_max))
            .collect()
    }

    /// Number of crossings along an unbounded ray. The origin is nudged
    /// off-axis so the ray does not graze shared triangle edges.
    fn crossing_count(&self, origin: &Point3d, dir: &Vec3) -> usize {
        let lateral = dir.any_perpendicular();
        let lateral2 = dir.cross(&lateral);
        let origin = *origin + lateral * 2.3e-4 + lateral2 * 1.1e-4;
        let o = origin.to_array();
        let d = dir.to_array();
        let inv = [
            1.0 / non_zero(d[0]),
            1.0 / non_zero(d[1]),
            1.0 / non_zero(d[2]),
        ];

        let mut count = 0usize;
        let mut stack = [0u32; 64];
        let mut sp = 0usize;
        stack[sp] = 0;
        sp += 1;
        while sp > 0 {
            sp -= 1;
            let node = self.nodes[stack[sp] as usize];
            if !node.bounds.hit(&o, &inv, f64::MAX) {
                continue;
            }
            if node.is_leaf {
                let start = node.left_or_start;
                for slot in start..start + node.right_or_count {
                    let ti = self.order[slot as usize] as usize;
                    if let Some(t) = ray_triangle(&o, &d, &self.triangles[ti]) {
                        if t > 1e-9 {
                            count += 1;
                        }
                    }
                }
            } else {
                stack[sp] = node.left_or_start;
                stack[sp + 1] = node.right_or_count;
                sp += 2;
            }
        }
        count
    }

    /// Unsigned distance from a point to the nearest triangle.
    pub fn distance_to_surface(&self, p: &Point3d) -> f64 {
        let q = p.to_array();
        let mut best = f64::MAX;
        let mut stack = [0u32; 64];
        let mut sp = 0usize;
        stack[sp] = 0;
        sp += 1;
        while sp > 0 {
            sp -= 1;
            let node = self.nodes[stack[sp] as usize];
            if node.bounds.distance_to_point(&q) >= best {
                continue;
            }
            if node.is_leaf {
                let start = node.left_or_start;
                for slot in start..start + node.right_or_count {
                    let ti = self.order[slot as usize] as usize;
                    let d = point_triangle_distance(&q, &self.triangles[ti]);
                    best = best.min(d);
                }
            } else {
                // Visit the nearer child first for tighter pruning.
                let l = node.left_or_start;
                let r = node.right_or_count;
                let dl = self.nodes[l as usize].bounds.distance_to_point(&q);
                let dr = self.nodes[r as usize].bounds.distance_to_point(&q);
                let (near, far) = if dl <= dr { (l, r) } else { (r, l) };
                stack[sp] = far;
                stack[sp + 1] = near;
                sp += 2;
            }
        }
        best
    }

    /// Odd-even containment with a majority vote over the three axes.
    pub fn is_inside(&self, p: &Point3d) -> bool {
        let votes = [Vec3::X, Vec3::Y, Vec3::Z]
            .iter()
            .filter(|dir| self.crossing_count(p, dir) % 2 == 1)
            .count();
        votes >= 2
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }
}

fn non_zero(x: f64) -> f64 {
    if x.abs() < 1e-300 {
        1e-300_f64.copysign(x)
    } else {
        x
    }
}

/// Recursive median-split build over the longest axis.
fn build_node(
    nodes: &mut Vec<BvhNode>,
    order: &mut [u32],
    centroids: &[[f64; 3]],
    boxes: &[Aabb],
    start: usize,
    end: usize,
) -> u32 {
    let mut bounds = Aabb::empty();
    for &ti in &order[start..end] {
        bounds.merge(&boxes[ti as usize]);
    }

    let count = end - start;
    if count <= MAX_LEAF_TRIANGLES {
        let idx = nodes.len() as u32;
        nodes.push(BvhNode {
            bounds,
            left_or_start: start as u32,
            right_or_count: count as u32,
            is_leaf: true,
        });
        return idx;
    }

    let axis = bounds.longest_axis();
    order[start..end].sort_unstable_by(|&a, &b| {
        centroids[a as usize][axis]
            .partial_cmp(&centroids[b as usize][axis])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let mid = start + count / 2;

    let idx = nodes.len();
    nodes.push(BvhNode {
        bounds,
        left_or_start: 0,
        right_or_count: 0,
        is_leaf: false,
    });
    let left = build_node(nodes, order, centroids, boxes, start, mid);
    let right = build_node(nodes, order, centroids, boxes, mid, end);
    nodes[idx].left_or_start = left;
    nodes[idx].right_or_count = right;
    idx as u32
}

/// Möller-Trumbore intersection; returns the hit parameter.
fn ray_triangle(origin: &[f64; 3], dir: &[f64; 3], tri: &Triangle) -> Option<f64> {
    let e1 = sub(&tri.v1, &tri.v0);
    let e2 = sub(&tri.v2, &tri.v0);
    let h = cross(dir, &e2);
    let det = dot(&e1, &h);
    if det.abs() < 1e-14 {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = sub(origin, &tri.v0);
    let u = inv_det * dot(&s, &h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = cross(&s, &e1);
    let v = inv_det * dot(dir, &q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = inv_det * dot(&e2, &q);
    (t > 0.0).then_some(t)
}

/// Distance from a point to a triangle (closest point on the triangle,
/// including edges and vertices).
fn point_triangle_distance(p: &[f64; 3], tri: &Triangle) -> f64 {
    let ab = sub(&tri.v1, &tri.v0);
    let ac = sub(&tri.v2, &tri.v0);
    let ap = sub(p, &tri.v0);

    let d1 = dot(&ab, &ap);
    let d2 = dot(&ac, &ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return norm(&ap);
    }

    let bp = sub(p, &tri.v1);
    let d3 = dot(&ab, &bp);
    let d4 = dot(&ac, &bp);
    if d3 >= 0.0 && d4 <= d3 {
        return norm(&bp);
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return dist_to(p, &lerp3(&tri.v0, &ab, v));
    }

    let cp = sub(p, &tri.v2);
    let d5 = dot(&ab, &cp);
    let d6 = dot(&ac, &cp);
    if d6 >= 0.0 && d5 <= d6 {
        return norm(&cp);
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return dist_to(p, &lerp3(&tri.v0, &ac, w));
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        let bc = sub(&tri.v2, &tri.v1);
        return dist_to(p, &lerp3(&tri.v1, &bc, w));
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    let closest = [
        tri.v0[0] + ab[0] * v + ac[0] * w,
        tri.v0[1] + ab[1] * v + ac[1] * w,
        tri.v0[2] + ab[2] * v + ac[2] * w,
    ];
    dist_to(p, &closest)
}

fn norm(a: &[f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

fn dist_to(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    norm(&sub(a, b))
}

fn lerp3(origin: &[f64; 3], dir: &[f64; 3], t: f64) -> [f64; 3] {
    [
        origin[0] + dir[0] * t,
        origin[1] + dir[1] * t,
        origin[2] + dir[2] * t,
    ]
}

fn sub(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use camber_kernel::primitives::make_box;
    use camber_kernel::SolidModel;

    fn box_scene(dx: f64, dy: f64, dz: f64) -> RayScene {
        let shape = make_box(dx, dy, dz);
        RayScene::build(&shape.tessellate(0.1, 0.5)).unwrap()
    }

    #[test]
    fn test_cast_hits_opposite_wall() {
        let scene = box_scene(100.0, 100.0, 100.0);
        let hit = scene
            .cast_ray(&Point3d::new(50.0, 50.0, 50.0), &Vec3::X, 1000.0)
            .unwrap();
        assert!((hit.distance - 50.0).abs() < 1e-6);
    }

    #[test]
    fn test_cast_miss_returns_none() {
        let scene = box_scene(10.0, 10.0, 10.0);
        assert!(scene
            .cast_ray(&Point3d::new(5.0, 5.0, 20.0), &Vec3::Z, 1000.0)
            .is_none());
    }

    #[test]
    fn test_near_clip_rejects_surface_self_hit() {
        let scene = box_scene(10.0, 10.0, 10.0);
        // From a point on the top face looking up: the own-surface hit at
        // t ~ 0 must not be reported.
        assert!(scene
            .cast_ray(&Point3d::new(5.0, 5.0, 10.0), &Vec3::Z, 1000.0)
            .is_none());
    }

    #[test]
    fn test_t_max_bounds_search() {
        let scene = box_scene(100.0, 100.0, 100.0);
        assert!(scene
            .cast_ray(&Point3d::new(50.0, 50.0, 50.0), &Vec3::X, 10.0)
            .is_none());
    }

    #[test]
    fn test_is_inside() {
        let scene = box_scene(10.0, 10.0, 10.0);
        assert!(scene.is_inside(&Point3d::new(5.0, 5.0, 5.0)));
        assert!(!scene.is_inside(&Point3d::new(5.0, 5.0, 11.0)));
        assert!(!scene.is_inside(&Point3d::new(-1.0, -1.0, -1.0)));
    }

    #[test]
    fn test_distance_to_surface() {
        let scene = box_scene(10.0, 10.0, 10.0);
        assert!((scene.distance_to_surface(&Point3d::new(5.0, 5.0, 5.0)) - 5.0).abs() < 1e-9);
        assert!((scene.distance_to_surface(&Point3d::new(5.0, 5.0, 13.0)) - 3.0).abs() < 1e-9);
        assert!(scene.distance_to_surface(&Point3d::new(5.0, 5.0, 10.0)) < 1e-9);
    }

    #[test]
    fn test_batch_matches_single() {
        let scene = box_scene(100.0, 100.0, 100.0);
        let origins = vec![Point3d::new(50.0, 50.0, 50.0); 6];
        let dirs = vec![Vec3::X, -Vec3::X, Vec3::Y, -Vec3::Y, Vec3::Z, -Vec3::Z];
        let hits = scene.cast_rays(&origins, &dirs, 1000.0);
        for (hit, dir) in hits.iter().zip(dirs.iter()) {
            let single = scene.cast_ray(&origins[0], dir, 1000.0);
            assert_eq!(hit.map(|h| h.face_id), single.map(|h| h.face_id));
        }
    }

    #[test]
    fn test_hit_face_id_matches_direction() {
        let shape = make_box(10.0, 20.0, 30.0);
        let scene = RayScene::build(&shape.tessellate(0.1, 0.5)).unwrap();
        let hit = scene
            .cast_ray(&Point3d::new(5.0, 10.0, 15.0), &Vec3::Z, 100.0)
            .unwrap();
        // The face hit upward must have its centroid on the top plane.
        let c = shape.face_centroid(hit.face_id as usize);
        assert!((c.z - 30.0).abs() < 1e-6);
    }
}
