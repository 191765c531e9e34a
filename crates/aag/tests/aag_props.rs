//! Property-based checks: graph determinism and dihedral symmetry.

use proptest::prelude::*;

use camber_aag::Aag;
use camber_kernel::primitives::{make_box, plate_with_hole};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Two builds over the same shape agree on every id and angle.
    #[test]
    fn build_is_deterministic(dx in 5.0f64..150.0, dy in 5.0f64..150.0, dz in 5.0f64..150.0) {
        let shape = make_box(dx, dy, dz);
        let a = Aag::build(&shape);
        let b = Aag::build(&shape);
        prop_assert_eq!(a.face_count(), b.face_count());
        prop_assert_eq!(a.edge_count(), b.edge_count());
        for (ea, eb) in a.edges().iter().zip(b.edges().iter()) {
            prop_assert_eq!((ea.face1, ea.face2, ea.edge_id), (eb.face1, eb.face2, eb.edge_id));
            prop_assert!((ea.dihedral_angle - eb.dihedral_angle).abs() < 1e-6);
        }
    }

    /// The pair lookup answers identically in both orders.
    #[test]
    fn dihedral_is_symmetric(r in 2.0f64..10.0) {
        let shape = plate_with_hole(60.0, 60.0, 12.0, r, 30.0, 30.0);
        let aag = Aag::build(&shape);
        for arc in aag.edges() {
            let forward = aag.dihedral_angle(arc.face1, arc.face2);
            let reverse = aag.dihedral_angle(arc.face2, arc.face1);
            prop_assert_eq!(forward, reverse);
        }
    }

    /// Box edges always read as convex right angles whatever the size.
    #[test]
    fn box_edges_stay_convex(dx in 5.0f64..150.0, dy in 5.0f64..150.0, dz in 5.0f64..150.0) {
        let shape = make_box(dx, dy, dz);
        let aag = Aag::build(&shape);
        for arc in aag.edges() {
            prop_assert!((arc.dihedral_angle + 90.0).abs() < 1e-6);
            prop_assert!(arc.is_convex);
        }
    }
}
