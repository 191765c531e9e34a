//! Headless feature-recognition engine front-end.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use camber_cli::modules::registry_json;
use camber_cli::pipeline::{self, PipelineOptions};
use camber_kernel::Vec3;

#[derive(Parser, Debug)]
#[command(
    name = "camber-engine",
    version,
    about = "Headless CAD feature recognition and DFM analysis engine"
)]
struct Cli {
    /// Input STEP file.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Output directory.
    #[arg(long)]
    outdir: Option<PathBuf>,

    /// Comma-separated module list or "all".
    #[arg(long, default_value = "all")]
    modules: String,

    /// Mesh quality (linear deflection), 0.0-1.0.
    #[arg(long, default_value_t = 0.35)]
    mesh_quality: f64,

    /// Output units label: mm, cm, in.
    #[arg(long, default_value = "mm")]
    units: String,

    /// Thin wall thickness threshold in mm.
    #[arg(long, default_value_t = 5.0)]
    thin_wall_threshold: f64,

    /// Analyze per-face thickness with this maximum search distance (mm).
    #[arg(long)]
    analyze_thickness: Option<f64>,

    /// Generate the dense thickness heatmap mesh (mesh_analysis.glb).
    #[arg(long)]
    enable_thickness_heatmap: bool,

    /// Analysis mesh quality, denser = smaller.
    #[arg(long, default_value_t = 0.05)]
    heatmap_quality: f64,

    /// Generate the voxel thickness field (thickness_sdf.json).
    #[arg(long)]
    enable_sdf: bool,

    /// Voxels along the longest axis.
    #[arg(long, default_value_t = 100)]
    sdf_resolution: usize,

    /// Use the two-pass narrow-band SDF.
    #[arg(long)]
    adaptive_sdf: bool,

    /// Narrow band width in mm.
    #[arg(long, default_value_t = 10.0)]
    narrow_band_width: f64,

    /// Run draft/accessibility/pocket analysis (dfm.json).
    #[arg(long)]
    analyze_dfm_geometry: bool,

    /// Mold pull direction as x,y,z.
    #[arg(long, value_parser = parse_direction, default_value = "0,0,1")]
    draft_direction: Vec3,

    /// List available recognition modules and exit.
    #[arg(long)]
    list_modules: bool,
}

fn parse_direction(s: &str) -> Result<Vec3, String> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid direction {:?}: {}", s, e))?;
    if parts.len() != 3 {
        return Err(format!("expected x,y,z, got {:?}", s));
    }
    Vec3::new(parts[0], parts[1], parts[2])
        .normalized()
        .ok_or_else(|| "direction must be non-zero".to_string())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    if cli.list_modules {
        println!("{}", serde_json::to_string_pretty(&registry_json()).unwrap_or_default());
        return ExitCode::SUCCESS;
    }

    let (Some(input), Some(outdir)) = (cli.input.clone(), cli.outdir.clone()) else {
        eprintln!("ERROR: --input and --outdir are required");
        return ExitCode::FAILURE;
    };
    if !input.exists() {
        eprintln!("ERROR: input file not found: {}", input.display());
        return ExitCode::FAILURE;
    }

    let options = PipelineOptions {
        input,
        outdir,
        modules: cli.modules,
        mesh_quality: cli.mesh_quality,
        units: cli.units,
        thin_wall_threshold: cli.thin_wall_threshold,
        analyze_thickness: cli.analyze_thickness,
        enable_thickness_heatmap: cli.enable_thickness_heatmap,
        heatmap_quality: cli.heatmap_quality,
        enable_sdf: cli.enable_sdf,
        sdf_resolution: cli.sdf_resolution,
        adaptive_sdf: cli.adaptive_sdf,
        narrow_band_width: cli.narrow_band_width,
        analyze_dfm_geometry: cli.analyze_dfm_geometry,
        draft_direction: cli.draft_direction,
    };

    match pipeline::run(&options) {
        Ok(summary) => {
            println!("Processing complete");
            println!("  Features recognized: {}", summary.features);
            println!("  Triangles generated: {}", summary.triangles);
            for warning in &summary.warnings {
                println!("  WARNING: {}", warning);
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("ERROR: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
