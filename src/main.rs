use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cardscan::detection::ocr::{self, OcrService, OcrsService};
use cardscan::loader::load_image;
use cardscan::{build_standard_pipeline, CardRectifier, PipelineData};

#[derive(Parser)]
#[command(name = "cardscan")]
#[command(about = "Locate, straighten and crop business cards in photos")]
struct Cli {
    /// Input image files
    #[arg(value_name = "IMAGE", required = true)]
    images: Vec<PathBuf>,

    /// Directory the rectified cards are written to (same file names as the inputs)
    #[arg(short, long, value_name = "DIR", default_value = "rectified")]
    output_dir: PathBuf,

    /// Fail when no card is found instead of keeping the original frame
    #[arg(long)]
    strict: bool,

    /// Run OCR on the rectified card and print the text
    #[arg(long)]
    ocr: bool,

    /// Laplacian variance below which the crop is sharpened
    #[arg(long, value_name = "VARIANCE", default_value_t = 100.0)]
    blur_threshold: f64,

    /// Save per-step images to directory (must be empty, single input only)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("cardscan={}", default_level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn process_image(
    path: &Path,
    args: &Cli,
    ocr_service: Option<Arc<dyn OcrService>>,
) -> anyhow::Result<PipelineData> {
    let img = load_image(path)?;

    let rectifier = CardRectifier::new().with_blur_threshold(args.blur_threshold);
    let mut pipeline = build_standard_pipeline(rectifier, !args.strict, ocr_service);
    if let Some(debug_dir) = &args.debug_out {
        pipeline = pipeline.with_debug(debug_dir.clone())?;
    }

    let item = pipeline
        .run(img)?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("Pipeline produced no output"))?;

    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Input has no file name: {}", path.display()))?;
    std::fs::create_dir_all(&args.output_dir)?;
    let output_path = args.output_dir.join(file_name);
    item.image.save(&output_path)
        .map_err(|e| anyhow::anyhow!("Failed to save {}: {}", output_path.display(), e))?;
    info!(input = %path.display(), output = %output_path.display(), "Card written");

    Ok(item)
}

fn report(path: &Path, item: &PipelineData, show_text: bool) {
    println!("\n=== {} ===", path.display());
    if item.is_fallback() {
        println!("No card detected, original frame kept");
    } else {
        let angle = item.get_float("rotation_angle").unwrap_or(0.0);
        let sharpness = item.get_float("sharpness").unwrap_or(0.0);
        let sharpened = item.get_bool("sharpened").unwrap_or(false);
        println!("Rotation: {:.1} degrees", angle);
        if let Some(bbox) = &item.bbox {
            println!("Card: {}x{} at ({}, {})", bbox.width, bbox.height, bbox.x, bbox.y);
        }
        println!("Sharpness: {:.1}{}", sharpness, if sharpened { " (sharpened)" } else { "" });
    }

    if show_text {
        if item.tokens.is_empty() {
            println!("No text recognised.");
        } else {
            println!("{}", ocr::tokens_to_text(&item.tokens));
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_logging(args.verbose);

    if args.debug_out.is_some() && args.images.len() > 1 {
        anyhow::bail!("--debug-out takes a single input image");
    }

    let ocr_service: Option<Arc<dyn OcrService>> = if args.ocr {
        Some(Arc::new(OcrsService::new()?))
    } else {
        None
    };

    // Each image gets its own thread; the rectifier shares nothing mutable
    let results: Vec<(PathBuf, anyhow::Result<PipelineData>)> = std::thread::scope(|scope| {
        let handles: Vec<_> = args
            .images
            .iter()
            .map(|path| {
                let service = ocr_service.clone();
                let args = &args;
                scope.spawn(move || (path.clone(), process_image(path, args, service)))
            })
            .collect();

        handles
            .into_iter()
            .zip(&args.images)
            .map(|(handle, path)| {
                handle
                    .join()
                    .unwrap_or_else(|_| (path.clone(), Err(anyhow::anyhow!("Worker thread panicked"))))
            })
            .collect()
    });

    let mut failures = 0;
    for (path, result) in &results {
        match result {
            Ok(item) => report(path, item, args.ocr),
            Err(e) => {
                error!(input = %path.display(), "{:#}", e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} images failed", failures, results.len());
    }

    Ok(())
}
