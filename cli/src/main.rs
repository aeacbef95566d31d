use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use pixelpress::export;
use pixelpress::units::{self, Unit};
use pixelpress::{
    CropRegion, EngineError, ExportError, FillMode, HttpProcessor, OutputFormat, ParameterChange, PreviewEngine,
    ProcessError, ProcessorConfig, ResolutionMode, SourceError, SourceImage, TransformParameters,
};
use tracing::info;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] pixelpress::ConfigError),
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: std::io::Error },
    #[error("width and height must be positive")]
    InvalidDimensions,
    #[error("preview failed: {0}")]
    Preview(String),
    #[error("timed out waiting for preview")]
    Timeout,
}

#[derive(Parser, Debug)]
#[command(name = "pixelpress", about = "Preview and export image transforms")]
struct Cli {
    #[arg(long, env = "PIXELPRESS_API_URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a low-cost preview of the transform.
    Preview(PreviewArgs),
    /// Run the full export, including crop and rotation.
    Export(ExportArgs),
    /// Convert a width/height pair between units.
    Convert(ConvertArgs),
}

#[derive(Args, Debug)]
struct TransformArgs {
    /// Source image (JPEG, PNG, WebP or GIF).
    input: PathBuf,

    #[arg(long)]
    width: Option<f64>,

    #[arg(long)]
    height: Option<f64>,

    #[arg(long, help = "px, in, cm or mm")]
    unit: Option<Unit>,

    #[arg(long, help = "stretch, blur or color")]
    mode: Option<FillMode>,

    #[arg(long, help = "jpeg, png, webp or pdf")]
    format: Option<OutputFormat>,

    #[arg(long)]
    quality: Option<u8>,

    #[arg(long)]
    background_color: Option<String>,

    #[arg(long, help = "Target size budget; the service picks quality")]
    max_size_kb: Option<u32>,

    #[arg(long, help = "auto or fixed")]
    resolution_mode: Option<ResolutionMode>,

    #[arg(long)]
    dpi: Option<u32>,

    #[arg(long, default_value_t = false, help = "Start from the source's natural size")]
    fit: bool,
}

#[derive(Args, Debug)]
struct PreviewArgs {
    #[command(flatten)]
    transform: TransformArgs,

    #[arg(long, help = "Output file; defaults to preview.<ext>")]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[command(flatten)]
    transform: TransformArgs,

    #[arg(long, help = "Crop region in percent: x,y,width,height")]
    crop: Option<CropRegion>,

    #[arg(long, allow_negative_numbers = true)]
    rotate: Option<i32>,

    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    width: String,

    height: Option<String>,

    #[arg(long)]
    from: Unit,

    #[arg(long)]
    to: Unit,

    #[arg(long, default_value = "auto")]
    resolution_mode: ResolutionMode,

    #[arg(long, default_value_t = units::PRINT_DPI)]
    dpi: u32,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut config = ProcessorConfig::from_env()?;
    if let Some(url) = &cli.api_url {
        config = config.with_api_url(url)?;
    }

    match cli.command {
        Command::Preview(args) => run_preview(&config, args).await,
        Command::Export(args) => run_export(&config, args).await,
        Command::Convert(args) => {
            run_convert(&args);
            Ok(())
        }
    }
}

async fn start_engine(config: &ProcessorConfig, args: &TransformArgs) -> Result<PreviewEngine, CliError> {
    let processor = HttpProcessor::new(config)?;
    let source = SourceImage::from_path(&args.input, config.max_source_bytes).await?;
    let engine = PreviewEngine::spawn(Arc::new(processor), config.debounce);
    info!(session_id = %engine.session_id(), url = %config.process_url(), "engine ready");
    engine.load_source(source).await?;

    for change in transform_changes(args) {
        engine.update_parameter(change).await?;
    }
    if args.fit {
        engine.fit_to_source().await?;
    }

    let params = engine.parameters().await?.unwrap_or_default();
    if !params.has_positive_dimensions() {
        return Err(CliError::InvalidDimensions);
    }
    Ok(engine)
}

/// Edits in the order a user would make them: resolution first, then unit,
/// then sizes expressed in that unit.
fn transform_changes(args: &TransformArgs) -> Vec<ParameterChange> {
    let mut changes = Vec::new();
    changes.extend(args.resolution_mode.map(ParameterChange::ResolutionMode));
    changes.extend(args.dpi.map(ParameterChange::Dpi));
    changes.extend(args.unit.map(ParameterChange::Unit));
    if !args.fit {
        changes.extend(args.width.map(|w| ParameterChange::Width(Some(w))));
        changes.extend(args.height.map(|h| ParameterChange::Height(Some(h))));
    }
    changes.extend(args.mode.map(ParameterChange::Mode));
    changes.extend(args.format.map(ParameterChange::Format));
    changes.extend(args.quality.map(ParameterChange::Quality));
    changes.extend(args.background_color.clone().map(ParameterChange::BackgroundColor));
    changes.extend(args.max_size_kb.map(|kb| ParameterChange::MaxSizeKb(Some(kb))));
    changes
}

async fn run_preview(config: &ProcessorConfig, args: PreviewArgs) -> Result<(), CliError> {
    let engine = start_engine(config, &args.transform).await?;
    let budget = engine.parameters().await?.and_then(|p| p.max_size_kb);

    let wait = config.debounce + Duration::from_secs(config.timeouts.request_secs);
    let mut status = engine.subscribe();
    let status = tokio::time::timeout(
        wait,
        status.wait_for(|s| !s.in_flight && (s.preview.is_some() || s.last_error.is_some())),
    )
    .await
    .map_err(|_| CliError::Timeout)?
    .map_err(|_| EngineError::Closed)?
    .clone();

    let Some(preview) = status.preview else {
        return Err(CliError::Preview(status.last_error.unwrap_or_default()));
    };

    let path = args
        .out
        .unwrap_or_else(|| PathBuf::from(format!("preview.{}", preview.format.extension())));
    tokio::fs::write(&path, &preview.image)
        .await
        .map_err(|source| CliError::Write { path: path.clone(), source })?;

    println!("{} ({})", path.display(), preview.size_label());
    match preview.within_budget(budget) {
        Some(true) => println!("within {} KB budget", budget.unwrap_or_default()),
        Some(false) => println!("over {} KB budget", budget.unwrap_or_default()),
        None => {}
    }
    Ok(())
}

/// Parameters for a one-shot export: the transform edits, then crop and rotation.
fn export_parameters(args: &ExportArgs, source: &SourceImage) -> Result<TransformParameters, CliError> {
    let mut params = TransformParameters::default();
    for change in transform_changes(&args.transform) {
        params.apply(change);
    }
    if args.transform.fit {
        params.apply(ParameterChange::FitToSource {
            natural_width: source.natural_width(),
            natural_height: source.natural_height(),
        });
    }
    if let Some(crop) = args.crop {
        params.apply(ParameterChange::Crop(Some(crop)));
    }
    if let Some(degrees) = args.rotate {
        params.apply(ParameterChange::Rotation(degrees));
    }

    if !params.has_positive_dimensions() {
        return Err(CliError::InvalidDimensions);
    }
    Ok(params)
}

async fn run_export(config: &ProcessorConfig, args: ExportArgs) -> Result<(), CliError> {
    let processor = HttpProcessor::new(config)?;
    let source = Arc::new(SourceImage::from_path(&args.transform.input, config.max_source_bytes).await?);
    let params = export_parameters(&args, &source)?;
    info!(url = %config.process_url(), name = source.name(), "exporting");

    let artifact = export::export_image(&processor, &params, Some(&source)).await?;
    let path = artifact
        .write_to(&args.out_dir)
        .await
        .map_err(|source| CliError::Write { path: args.out_dir.join(artifact.file_name()), source })?;

    #[allow(clippy::cast_precision_loss)]
    let kb = artifact.byte_size as f64 / 1024.0;
    println!("{} ({kb:.1} KB in {:.2}s)", path.display(), artifact.elapsed.as_secs_f64());
    Ok(())
}

fn run_convert(args: &ConvertArgs) {
    let width = units::parse_number(&args.width);
    let height = args.height.as_deref().map(units::parse_number);
    let (w, h) =
        units::convert_dimensions(Some(width), height, args.from, args.to, args.resolution_mode, args.dpi);
    let dpi = units::effective_dpi(args.resolution_mode, args.dpi, args.to);
    match height {
        Some(_) => println!("{w} x {h} {} @ {dpi} dpi", args.to),
        None => println!("{w} {} @ {dpi} dpi", args.to),
    }
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
