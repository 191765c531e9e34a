//! Property-based checks on the analytic kernel using `proptest`.

use proptest::prelude::*;

use camber_kernel::primitives::{make_box, plate_with_hole};
use camber_kernel::{Point3d, SolidModel};

fn arb_dim() -> impl Strategy<Value = f64> {
    1.0f64..200.0
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// A box always indexes to the same entity counts.
    #[test]
    fn box_topology_counts(dx in arb_dim(), dy in arb_dim(), dz in arb_dim()) {
        let shape = make_box(dx, dy, dz);
        prop_assert_eq!(shape.face_count(), 6);
        prop_assert_eq!(shape.edge_count(), 12);
        prop_assert_eq!(shape.vertex_count(), 8);
    }

    /// Face areas of a box match the analytic products.
    #[test]
    fn box_face_areas(dx in arb_dim(), dy in arb_dim(), dz in arb_dim()) {
        let shape = make_box(dx, dy, dz);
        let mut areas: Vec<f64> = (0..6).map(|f| shape.face_area(f)).collect();
        areas.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let mut expected = vec![dx * dy, dx * dy, dy * dz, dy * dz, dx * dz, dx * dz];
        expected.sort_by(|a, b| a.partial_cmp(b).unwrap());
        for (got, want) in areas.iter().zip(expected.iter()) {
            prop_assert!((got - want).abs() < 1e-6 * want.max(1.0));
        }
    }

    /// The box center classifies inside; a point beyond +X classifies
    /// outside.
    #[test]
    fn box_containment(dx in arb_dim(), dy in arb_dim(), dz in arb_dim()) {
        let shape = make_box(dx, dy, dz);
        prop_assert!(shape.is_inside(&Point3d::new(dx / 2.0, dy / 2.0, dz / 2.0)));
        prop_assert!(!shape.is_inside(&Point3d::new(dx * 2.0 + 1.0, dy / 2.0, dz / 2.0)));
    }

    /// Dense ids are deterministic: two builds of the same plate agree on
    /// every face kind and area.
    #[test]
    fn rebuild_determinism(r in 2.0f64..8.0) {
        let a = plate_with_hole(50.0, 50.0, 10.0, r, 25.0, 25.0);
        let b = plate_with_hole(50.0, 50.0, 10.0, r, 25.0, 25.0);
        prop_assert_eq!(a.face_count(), b.face_count());
        for f in 0..a.face_count() {
            prop_assert_eq!(a.surface_kind(f), b.surface_kind(f));
            prop_assert!((a.face_area(f) - b.face_area(f)).abs() < 1e-9);
        }
    }
}
