use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use faceclust_core::clustering::domain::cluster_engine::ConvergenceRule;
use faceclust_core::clustering::domain::face_clusterer::FaceClusterer;
use faceclust_core::clustering::infrastructure::engine_factory::{create_engine, EngineKind};
use faceclust_core::detection::infrastructure::fixture_face_source::FixtureFaceSource;
use faceclust_core::pipeline::cluster_faces_use_case::{ClusterFacesUseCase, ClusterReport};
use faceclust_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use faceclust_core::rendering::domain::palette::Color;
use faceclust_core::rendering::infrastructure::frame_box_renderer::FrameBoxRenderer;
use faceclust_core::rendering::infrastructure::image_file_reader::ImageFileReader;
use faceclust_core::rendering::infrastructure::image_file_writer::ImageFileWriter;
use faceclust_core::shared::constants::{DEFAULT_OUTPUT_PATH, IMAGE_EXTENSIONS};
use faceclust_core::shared::settings::{ClusterSettings, PaletteKind};

/// Group the faces in an image by identity and outline each person in
/// their own color.
#[derive(Parser)]
#[command(name = "faceclust")]
struct Cli {
    /// Input image file.
    input: PathBuf,

    /// Output image file.
    #[arg(default_value = DEFAULT_OUTPUT_PATH)]
    output: PathBuf,

    /// JSON file with the detected face boxes and their 128-d embeddings.
    #[arg(long)]
    faces: PathBuf,

    /// Settings file (defaults to the user config directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Faces closer than this distance in embedding space are linked.
    #[arg(long)]
    threshold: Option<f64>,

    /// Maximum label propagation passes.
    #[arg(long)]
    max_iterations: Option<u32>,

    /// Seed for visitation order and tie-breaks (random when omitted).
    #[arg(long)]
    seed: Option<u64>,

    /// When a pass counts as converged: settled or unchanged.
    #[arg(long)]
    convergence: Option<ConvergenceRule>,

    /// Propagate labels on this many threads (0 = all cores).
    #[arg(long)]
    threads: Option<usize>,

    /// Palette policy: random or fixed.
    #[arg(long)]
    palette: Option<String>,

    /// Number of colors in the random palette.
    #[arg(long)]
    palette_size: Option<usize>,

    /// Seed for the random palette.
    #[arg(long)]
    palette_seed: Option<u64>,

    /// Fixed palette colors as #rrggbb (comma-separated); implies --palette fixed.
    #[arg(long, value_delimiter = ',')]
    colors: Option<Vec<Color>>,

    /// Rectangle outline thickness in pixels.
    #[arg(long)]
    thickness: Option<u32>,

    /// Renumber cluster labels to 0..K.
    #[arg(long)]
    compact_labels: bool,

    /// Write a JSON report of every face's cluster and color.
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let settings = resolve_settings(&cli)?;
    settings.validate()?;

    let source = FixtureFaceSource::load(&cli.faces)?;
    let engine = create_engine(
        settings.engine.kind,
        settings.engine.threads,
        settings.convergence,
    );
    let clusterer = FaceClusterer::new(engine, settings.threshold, settings.max_iterations)?;

    log::info!(
        "Clustering with threshold {} and up to {} passes",
        settings.threshold,
        settings.max_iterations
    );
    let mut use_case = ClusterFacesUseCase::new(
        Box::new(ImageFileReader::new()),
        Box::new(source.detector()),
        Box::new(source.embedder()),
        clusterer,
        Box::new(FrameBoxRenderer::new()),
        Box::new(ImageFileWriter::new()),
        settings,
    )
    .with_logger(Box::new(StdoutPipelineLogger::default()));

    let report = use_case.execute(&cli.input, &cli.output)?;
    log::info!("Output written to {}", cli.output.display());

    if let Some(report_path) = &cli.report {
        write_report(report_path, &report)?;
        log::info!("Report written to {}", report_path.display());
    }
    Ok(())
}

/// Settings file values, overridden by any flags given on the command line.
fn resolve_settings(cli: &Cli) -> Result<ClusterSettings, Box<dyn std::error::Error>> {
    let mut settings = match &cli.config {
        Some(path) => ClusterSettings::load_from(path)?,
        None => ClusterSettings::load(),
    };

    if let Some(threshold) = cli.threshold {
        settings.threshold = threshold;
    }
    if let Some(max_iterations) = cli.max_iterations {
        settings.max_iterations = max_iterations;
    }
    if cli.seed.is_some() {
        settings.seed = cli.seed;
    }
    if let Some(convergence) = cli.convergence {
        settings.convergence = convergence;
    }
    if let Some(threads) = cli.threads {
        settings.engine.kind = if threads == 1 {
            EngineKind::Sequential
        } else {
            EngineKind::Snapshot
        };
        settings.engine.threads = threads;
    }
    if let Some(palette) = &cli.palette {
        settings.palette.kind = parse_palette_kind(palette);
    }
    if let Some(size) = cli.palette_size {
        settings.palette.size = size;
    }
    if cli.palette_seed.is_some() {
        settings.palette_seed = cli.palette_seed;
    }
    if let Some(colors) = &cli.colors {
        settings.palette.kind = PaletteKind::Fixed;
        settings.palette.colors = colors.clone();
    }
    if let Some(thickness) = cli.thickness {
        settings.box_thickness = thickness;
    }
    if cli.compact_labels {
        settings.compact_labels = true;
    }
    Ok(settings)
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    if !cli.faces.exists() {
        return Err(format!("Face file not found: {}", cli.faces.display()).into());
    }
    if !is_image(&cli.input) {
        return Err(format!(
            "Input must be an image ({}), got {}",
            IMAGE_EXTENSIONS.join(", "),
            cli.input.display()
        )
        .into());
    }
    if let Some(threshold) = cli.threshold {
        if threshold.is_nan() || threshold < 0.0 {
            return Err(format!("Threshold must be a non-negative number, got {threshold}").into());
        }
    }
    if let Some(palette) = &cli.palette {
        if palette != "random" && palette != "fixed" {
            return Err(format!("Palette must be 'random' or 'fixed', got '{palette}'").into());
        }
        if palette == "random" && cli.colors.is_some() {
            return Err("--colors requires the fixed palette".into());
        }
    }
    if cli.palette_size == Some(0) {
        return Err("Palette size must be at least 1".into());
    }
    if cli.thickness == Some(0) {
        return Err("Thickness must be at least 1".into());
    }
    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn parse_palette_kind(palette: &str) -> PaletteKind {
    if palette == "fixed" {
        PaletteKind::Fixed
    } else {
        PaletteKind::Random
    }
}

fn write_report(path: &Path, report: &ClusterReport) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(report)?)?;
    Ok(())
}
