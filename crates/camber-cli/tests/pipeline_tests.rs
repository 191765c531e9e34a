//! End-to-end pipeline runs against synthetic shapes and a STEP fixture.

use std::path::Path;

use camber_cli::pipeline::{run, run_with_shape, PipelineOptions};
use camber_kernel::primitives::{block_with_pockets, plate_with_filleted_hole};

fn options_into(dir: &Path) -> PipelineOptions {
    PipelineOptions {
        outdir: dir.to_path_buf(),
        ..Default::default()
    }
}

#[test]
fn full_pipeline_writes_mandatory_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let shape = plate_with_filleted_hole(50.0, 50.0, 10.0, 5.0, 1.0, 25.0, 25.0);
    let summary = run_with_shape(&shape, &options_into(dir.path())).unwrap();

    assert_eq!(summary.faces, 8);
    assert!(summary.features >= 2, "hole and fillet expected");
    for name in [
        "mesh.glb",
        "tri_face_map.bin",
        "features.json",
        "aag.json",
        "topology.json",
        "meta.json",
    ] {
        assert!(dir.path().join(name).exists(), "missing {}", name);
    }

    let meta: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("meta.json")).unwrap())
            .unwrap();
    assert_eq!(meta["counts"]["faces"], 8);
    assert_eq!(meta["units"], "mm");
    assert_eq!(meta["bbox"]["max"][0], 50.0);

    let features: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("features.json")).unwrap())
            .unwrap();
    let kinds: Vec<&str> = features["features"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["type"].as_str().unwrap())
        .collect();
    assert!(kinds.contains(&"hole"));
    assert!(kinds.contains(&"fillet"));
}

#[test]
fn optional_analyses_write_their_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let shape = block_with_pockets(40.0, 40.0, 20.0, &[(10.0, 10.0, 30.0, 30.0, 8.0)]);
    let options = PipelineOptions {
        outdir: dir.path().to_path_buf(),
        analyze_thickness: Some(100.0),
        enable_sdf: true,
        sdf_resolution: 12,
        analyze_dfm_geometry: true,
        enable_thickness_heatmap: true,
        heatmap_quality: 0.2,
        ..Default::default()
    };
    run_with_shape(&shape, &options).unwrap();

    for name in ["thickness_sdf.json", "dfm.json", "mesh_analysis.glb"] {
        assert!(dir.path().join(name).exists(), "missing {}", name);
    }

    let dfm: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("dfm.json")).unwrap())
            .unwrap();
    assert_eq!(dfm["draft_direction"][2], 1.0);
    assert!(dfm["cnc"].as_object().unwrap().len() > 0);
}

#[test]
fn module_selection_restricts_recognizers() {
    let dir = tempfile::tempdir().unwrap();
    let shape = plate_with_filleted_hole(50.0, 50.0, 10.0, 5.0, 1.0, 25.0, 25.0);
    let options = PipelineOptions {
        outdir: dir.path().to_path_buf(),
        modules: "recognize_fillets".into(),
        ..Default::default()
    };
    run_with_shape(&shape, &options).unwrap();

    let features: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("features.json")).unwrap())
            .unwrap();
    for f in features["features"].as_array().unwrap() {
        assert_eq!(f["type"], "fillet");
    }
}

#[test]
fn unknown_module_token_warns_in_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let shape = plate_with_filleted_hole(50.0, 50.0, 10.0, 5.0, 1.0, 25.0, 25.0);
    let options = PipelineOptions {
        outdir: dir.path().to_path_buf(),
        modules: "holes,frobnicate".into(),
        ..Default::default()
    };
    let summary = run_with_shape(&shape, &options).unwrap();
    assert!(summary
        .warnings
        .iter()
        .any(|w| w.contains("frobnicate")));
}

#[test]
fn step_cube_runs_through_the_load_path() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/cube.step");
    let options = PipelineOptions {
        input: fixture,
        outdir: dir.path().to_path_buf(),
        ..Default::default()
    };
    let summary = run(&options).unwrap();
    assert_eq!(summary.faces, 6);
    assert_eq!(summary.edges, 12);
    assert_eq!(summary.features, 0, "a cube has no features");

    // Dihedral angles in the exported graph are all convex right angles.
    let aag: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("aag.json")).unwrap())
            .unwrap();
    let adjacency: Vec<&serde_json::Value> = aag["links"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|l| l["type"] == "face_adjacency")
        .collect();
    assert_eq!(adjacency.len(), 12);
    for link in adjacency {
        let angle = link["dihedral_angle"].as_f64().unwrap();
        assert!((angle + 90.0).abs() < 1e-6, "dihedral {}", angle);
        assert_eq!(link["convex"], true);
    }
}

#[test]
fn missing_input_is_a_fatal_error() {
    let dir = tempfile::tempdir().unwrap();
    let options = PipelineOptions {
        input: dir.path().join("does_not_exist.step"),
        outdir: dir.path().to_path_buf(),
        ..Default::default()
    };
    assert!(run(&options).is_err());
}
