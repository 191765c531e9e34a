//! End-to-end recognizer scenarios on synthetic shapes.

use std::collections::BTreeSet;

use camber_aag::Aag;
use camber_features::{recognize, FeatureIds, RecognizerConfig};
use camber_kernel::primitives::{
    block_with_pockets, make_box, plate_with_filleted_hole, plate_with_hole,
};
use camber_kernel::SolidModel;
use camber_ray::RayScene;

fn scene_for(shape: &camber_kernel::Shape) -> RayScene {
    RayScene::build(&shape.tessellate(0.05, 0.4)).unwrap()
}

#[test]
fn plain_cube_yields_no_features() {
    let shape = make_box(100.0, 100.0, 100.0);
    let aag = Aag::build(&shape);
    let scene = scene_for(&shape);
    let features = recognize(&shape, &aag, Some(&scene), &RecognizerConfig::default());
    assert!(features.is_empty(), "unexpected: {:?}", features);
}

#[test]
fn through_hole_plate_yields_single_simple_hole() {
    let shape = plate_with_hole(50.0, 50.0, 10.0, 5.0, 25.0, 25.0);
    let aag = Aag::build(&shape);
    let scene = scene_for(&shape);
    let features = recognize(&shape, &aag, Some(&scene), &RecognizerConfig::default());

    let holes: Vec<_> = features.iter().filter(|f| f.feature_type == "hole").collect();
    assert_eq!(holes.len(), 1);
    assert_eq!(holes[0].subtype, "simple");
    assert!((holes[0].params["diameter_mm"] - 10.0).abs() < 1e-9);
    assert!(features.iter().all(|f| f.feature_type != "fillet"));
}

#[test]
fn filleted_hole_yields_one_hole_and_one_fillet() {
    let shape = plate_with_filleted_hole(50.0, 50.0, 10.0, 5.0, 1.0, 25.0, 25.0);
    let aag = Aag::build(&shape);
    let scene = scene_for(&shape);
    let features = recognize(&shape, &aag, Some(&scene), &RecognizerConfig::default());

    let holes: Vec<_> = features.iter().filter(|f| f.feature_type == "hole").collect();
    let fillets: Vec<_> = features.iter().filter(|f| f.feature_type == "fillet").collect();
    assert_eq!(holes.len(), 1, "features: {:?}", features);
    assert_eq!(fillets.len(), 1);
    assert_eq!(fillets[0].subtype, "curved_blend");

    // Hole/fillet exclusion: no face id in both.
    let hole_faces: BTreeSet<usize> = holes[0].faces.iter().copied().collect();
    let fillet_faces: BTreeSet<usize> = fillets[0].faces.iter().copied().collect();
    assert!(hole_faces.is_disjoint(&fillet_faces));
}

#[test]
fn flat_plate_is_a_thin_wall_at_threshold_3() {
    let shape = make_box(100.0, 100.0, 2.0);
    let aag = Aag::build(&shape);
    let scene = scene_for(&shape);

    let mut config = RecognizerConfig {
        thin_wall_threshold: 3.0,
        ..Default::default()
    };
    let features = recognize(&shape, &aag, Some(&scene), &config);
    let walls: Vec<_> = features.iter().filter(|f| f.feature_type == "thin_wall").collect();
    assert_eq!(walls.len(), 1, "features: {:?}", features);
    let wall = walls[0];
    assert_eq!(wall.subtype, "sheet");
    assert!((wall.params["avg_thickness"] - 2.0).abs() < 0.1);
    // The two large faces participate.
    let large: Vec<usize> = (0..shape.face_count())
        .filter(|&f| shape.face_area(f) > 5000.0)
        .collect();
    for f in large {
        assert!(wall.faces.contains(&f));
    }

    config.thin_wall_threshold = 1.0;
    let features = recognize(&shape, &aag, Some(&scene), &config);
    assert!(features.iter().all(|f| f.feature_type != "thin_wall"));
}

#[test]
fn thin_wall_statistics_are_consistent() {
    let shape = make_box(100.0, 100.0, 2.0);
    let aag = Aag::build(&shape);
    let scene = scene_for(&shape);
    let config = RecognizerConfig {
        thin_wall_threshold: 3.0,
        ..Default::default()
    };
    for f in recognize(&shape, &aag, Some(&scene), &config) {
        if f.feature_type != "thin_wall" {
            continue;
        }
        let avg = f.params["avg_thickness"];
        let min = f.params["min_thickness"];
        let max = f.params["max_thickness"];
        let var = f.params["variance"];
        assert!(min <= avg && avg <= max);
        assert!(max <= config.thin_wall_threshold * 2.0);
        assert!(var.sqrt() / avg <= 0.60 + 1e-9);
    }
}

#[test]
fn pocketed_plate_reports_cavities() {
    let shape = block_with_pockets(
        120.0,
        60.0,
        30.0,
        &[
            (10.0, 15.0, 30.0, 45.0, 10.0),
            (50.0, 15.0, 70.0, 45.0, 12.0),
            (90.0, 15.0, 110.0, 45.0, 8.0),
        ],
    );
    let aag = Aag::build(&shape);
    let scene = scene_for(&shape);
    let features = recognize(&shape, &aag, Some(&scene), &RecognizerConfig::default());
    let cavities: Vec<_> = features.iter().filter(|f| f.feature_type == "cavity").collect();
    assert_eq!(cavities.len(), 3);
}

#[test]
fn feature_ids_are_stable_across_identical_runs() {
    let shape = plate_with_filleted_hole(50.0, 50.0, 10.0, 5.0, 1.0, 25.0, 25.0);
    let aag = Aag::build(&shape);
    let scene = scene_for(&shape);
    let a = recognize(&shape, &aag, Some(&scene), &RecognizerConfig::default());
    let b = recognize(&shape, &aag, Some(&scene), &RecognizerConfig::default());
    assert_eq!(a, b);
}

#[test]
fn pair_based_variant_detects_the_plate() {
    let shape = make_box(100.0, 100.0, 2.0);
    let aag = Aag::build(&shape);
    let scene = scene_for(&shape);
    let mut ids = FeatureIds::new();
    let walls =
        camber_features::thin_walls::recognize_thin_walls_v1(&shape, &aag, &scene, 3.0, &mut ids);
    assert!(!walls.is_empty());
    let wall = &walls[0];
    assert_eq!(wall.faces.len(), 2);
    assert!((wall.params["avg_thickness"] - 2.0).abs() < 0.1);
}
