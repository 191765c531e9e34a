//! The analysis pipeline: load, index, recognize, analyze, export.
//!
//! Mandatory artifacts (mesh, mapping, features, aag, topology, meta)
//! abort the run on failure; optional analyses log a warning, record it
//! in the metadata, and continue.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use serde_json::json;
use tracing::{info, warn};

use camber_aag::blend::classify_blends;
use camber_aag::Aag;
use camber_dfm::{analyze_cnc_accessibility, analyze_molding_accessibility, analyze_pockets};
use camber_export::aag_json::AagExport;
use camber_export::features_json::FeatureFile;
use camber_export::meta_json::{Bbox, Counts, Metadata, Timings};
use camber_features::{recognize, Feature};
use camber_kernel::{load_step, Shape, SolidModel, Vec3};
use camber_ray::RayScene;
use camber_thickness::{analyze_all_faces, generate_adaptive_sdf, generate_sdf, summarize};

/// Everything the CLI front-end collects.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub input: PathBuf,
    pub outdir: PathBuf,
    pub modules: String,
    pub mesh_quality: f64,
    pub units: String,
    pub thin_wall_threshold: f64,
    /// Maximum thickness search distance; None disables the analysis.
    pub analyze_thickness: Option<f64>,
    pub enable_thickness_heatmap: bool,
    pub heatmap_quality: f64,
    pub enable_sdf: bool,
    pub sdf_resolution: usize,
    pub adaptive_sdf: bool,
    pub narrow_band_width: f64,
    pub analyze_dfm_geometry: bool,
    pub draft_direction: Vec3,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            outdir: PathBuf::new(),
            modules: "all".into(),
            mesh_quality: 0.35,
            units: "mm".into(),
            thin_wall_threshold: 5.0,
            analyze_thickness: None,
            enable_thickness_heatmap: false,
            heatmap_quality: 0.05,
            enable_sdf: false,
            sdf_resolution: 100,
            adaptive_sdf: false,
            narrow_band_width: 10.0,
            analyze_dfm_geometry: false,
            draft_direction: Vec3::Z,
        }
    }
}

/// Counters reported back to the front-end.
#[derive(Debug, Clone, Default)]
pub struct PipelineSummary {
    pub faces: usize,
    pub edges: usize,
    pub triangles: usize,
    pub features: usize,
    pub warnings: Vec<String>,
}

/// Load the input and run the full pipeline.
pub fn run(options: &PipelineOptions) -> Result<PipelineSummary> {
    let shape = load_step(&options.input)
        .with_context(|| format!("loading {}", options.input.display()))?;
    run_with_shape(&shape, options)
}

/// Run the pipeline on an already-loaded shape.
pub fn run_with_shape(shape: &Shape, options: &PipelineOptions) -> Result<PipelineSummary> {
    let start = Instant::now();
    std::fs::create_dir_all(&options.outdir)
        .with_context(|| format!("creating {}", options.outdir.display()))?;

    let mut warnings = Vec::new();

    info!(faces = shape.face_count(), "building adjacency graph");
    let aag = Aag::build(shape);
    let blends = classify_blends(shape, &aag);

    info!(quality = options.mesh_quality, "tessellating");
    let mesh = shape.tessellate(options.mesh_quality, 0.5);
    let scene = RayScene::build(&mesh).context("building ray scene")?;

    let (mut config, unmatched) = crate::modules::resolve_modules(&options.modules);
    for token in unmatched {
        warn!(token, "module token matched nothing");
        warnings.push(format!("unknown module token: {}", token));
    }
    config.thin_wall_threshold = options.thin_wall_threshold;

    info!("running recognizers");
    let features = recognize(shape, &aag, Some(&scene), &config);

    // Optional per-face thickness.
    let thickness = options.analyze_thickness.map(|max_distance| {
        let results = analyze_all_faces(shape, &scene, max_distance);
        let stats = summarize(&results);
        info!(
            measured = stats.measured,
            min = stats.min,
            max = stats.max,
            "face thickness"
        );
        results
    });

    // Mandatory exports.
    camber_export::gltf::export_mesh(&mesh, &options.outdir.join("mesh.glb"))
        .context("exporting mesh.glb")?;
    camber_export::tri_map::export_tri_face_map(&mesh, &options.outdir.join("tri_face_map.bin"))
        .context("exporting tri_face_map.bin")?;

    let feature_file = FeatureFile::new(&options.units, features.clone());
    camber_export::features_json::export_features(
        &feature_file,
        &options.outdir.join("features.json"),
    )
    .context("exporting features.json")?;

    camber_export::aag_json::export_aag(
        &AagExport {
            model: shape,
            aag: &aag,
            blends: &blends,
            features: &features,
            thickness: thickness.as_ref(),
        },
        &options.outdir.join("aag.json"),
    )
    .context("exporting aag.json")?;

    camber_export::topology_json::export_topology(shape, &options.outdir.join("topology.json"))
        .context("exporting topology.json")?;

    // Optional analyses: warn and continue.
    if options.enable_thickness_heatmap {
        let dense = shape.tessellate(options.heatmap_quality, 0.3);
        let max_distance = options.analyze_thickness.unwrap_or(50.0);
        if let Err(err) = camber_export::gltf::export_analysis_mesh(
            &dense,
            &scene,
            max_distance,
            &options.outdir.join("mesh_analysis.glb"),
        ) {
            warn!(%err, "heatmap export failed");
            warnings.push(format!("heatmap export failed: {}", err));
        }
    }

    if options.enable_sdf {
        let bbox = shape.bounding_box();
        let sdf = if options.adaptive_sdf {
            generate_adaptive_sdf(&scene, &bbox, options.sdf_resolution, options.narrow_band_width)
        } else {
            let max_distance = options.analyze_thickness.unwrap_or(50.0);
            generate_sdf(&scene, &bbox, options.sdf_resolution, max_distance)
        };
        if let Err(err) =
            camber_export::sdf_json::export_sdf(&sdf, &options.outdir.join("thickness_sdf.json"))
        {
            warn!(%err, "SDF export failed");
            warnings.push(format!("SDF export failed: {}", err));
        }
    }

    if options.analyze_dfm_geometry {
        if let Err(err) = export_dfm(shape, &aag, &scene, &features, options) {
            warn!(%err, "DFM analysis failed");
            warnings.push(format!("DFM analysis failed: {}", err));
        }
    }

    let meta = Metadata {
        counts: Counts {
            faces: shape.face_count(),
            edges: shape.edge_count(),
            triangles: mesh.triangle_count(),
            features: features.len(),
        },
        timings: Timings {
            total_ms: start.elapsed().as_millis(),
        },
        warnings: warnings.clone(),
        units: options.units.clone(),
        bbox: Bbox::from(&shape.bounding_box()),
    };
    camber_export::meta_json::export_metadata(&meta, &options.outdir.join("meta.json"))
        .context("exporting meta.json")?;

    Ok(PipelineSummary {
        faces: shape.face_count(),
        edges: shape.edge_count(),
        triangles: mesh.triangle_count(),
        features: features.len(),
        warnings,
    })
}

/// Molding + CNC accessibility and pocket metrics for recognized
/// cavities, written as dfm.json.
fn export_dfm(
    shape: &Shape,
    aag: &Aag,
    scene: &RayScene,
    features: &[Feature],
    options: &PipelineOptions,
) -> Result<()> {
    let molding = analyze_molding_accessibility(shape, scene, &options.draft_direction);
    let cnc = analyze_cnc_accessibility(shape, scene);

    let cavity_sets: Vec<BTreeSet<usize>> = features
        .iter()
        .filter(|f| f.feature_type == "cavity")
        .map(|f| f.faces.iter().copied().collect())
        .collect();
    let pockets = analyze_pockets(shape, aag, &cavity_sets);

    let doc = json!({
        "draft_direction": options.draft_direction.to_array(),
        "molding": molding,
        "cnc": cnc,
        "pockets": pockets
            .values()
            .map(|p| {
                json!({
                    "pocket_id": p.pocket_id,
                    "faces": p.face_ids,
                    "depth": p.depth,
                    "opening_diameter": p.opening_diameter,
                    "aspect_ratio": p.aspect_ratio,
                    "volume": p.volume,
                    "type": p.pocket_type.label(),
                    "is_through_hole": p.is_through_hole,
                    "is_deep": p.is_deep,
                    "is_narrow": p.is_narrow,
                    "opening_faces": p.opening_faces,
                    "accessibility_score": p.accessibility_score,
                })
            })
            .collect::<Vec<_>>(),
    });

    let path = options.outdir.join("dfm.json");
    std::fs::write(&path, serde_json::to_string_pretty(&doc)?)
        .with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), "wrote DFM analysis");
    Ok(())
}
