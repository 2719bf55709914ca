use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use image::RgbImage;
use rayon::prelude::*;
use tracing::{debug, info, Level};

use motion_blur::{
    config::Config,
    filter::{CancelToken, MotionBlurFilter},
    playback::PlaybackEngine,
    video::{frame_to_rgb, Chroma, Frame, FrameGeometry, SyntheticSource},
};

#[derive(Parser)]
#[command(
    name = "motion-blur",
    version,
    about = "Apply a temporal motion blur to a sequence of frames",
    long_about = "Feeds still images (or a synthetic moving square) through the motion blur filter one frame at a time and writes every displayed frame as a PNG."
)]
struct Cli {
    /// Directory of input frames (PNG, JPEG, BMP), played in file name order
    #[arg(short, long, required_unless_present = "synthetic", conflicts_with = "synthetic")]
    input: Option<PathBuf>,

    /// Generate this many synthetic frames instead of reading images
    #[arg(long)]
    synthetic: Option<usize>,

    /// Output directory for the blurred frames
    #[arg(short, long)]
    output: PathBuf,

    /// Blur factor from 1 to 127 (overrides the configuration file)
    #[arg(short, long)]
    factor: Option<i32>,

    /// Planar format frames are converted to (i420, iyuv, yv12, i422)
    #[arg(long)]
    chroma: Option<Chroma>,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .init();

    info!("Starting motion-blur v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    };
    if let Some(factor) = cli.factor {
        config.filter.blur_factor = factor;
    }
    if let Some(chroma) = cli.chroma {
        config.io.chroma = chroma;
    }
    config.validate()?;

    std::fs::create_dir_all(&cli.output)
        .with_context(|| format!("creating output directory {:?}", cli.output))?;

    let cancel = CancelToken::new();
    let filter = MotionBlurFilter::new(&config, cancel.clone());
    info!("Blur factor: {}", filter.factor().value());

    let output_dir = cli.output.clone();
    let mut written = 0usize;
    let write_frame = |frame: &Frame| -> motion_blur::Result<()> {
        let path = output_dir.join(format!("frame_{:05}.png", written));
        frame_to_rgb(frame)?.save(&path)?;
        debug!("Wrote {:?}", path);
        written += 1;
        Ok(())
    };

    let report = match (&cli.input, cli.synthetic) {
        (Some(input_dir), _) => {
            let images = load_images(input_dir, config.io.decode_threads)?;
            let first = &images[0];
            let geometry = FrameGeometry::new(first.width(), first.height(), config.io.chroma);
            let mut engine = PlaybackEngine::new(&config, Box::new(filter), geometry, cancel)?;
            let report = engine.play_images(&images, write_frame)?;
            engine.finish();
            report
        }
        (None, Some(count)) => {
            let geometry = FrameGeometry::new(320, 240, config.io.chroma);
            let source = SyntheticSource::new(geometry, config.io.frame_interval_us).with_noise(6, 1);
            let mut engine = PlaybackEngine::new(&config, Box::new(filter), geometry, cancel)?;
            let report = engine.play_frames(source.take(count), write_frame)?;
            engine.finish();
            report
        }
        (None, None) => bail!("either --input or --synthetic is required"),
    };

    info!(
        "Done: {} frames in, {} displayed, {} dropped. Output in {:?}",
        report.frames_in, report.frames_displayed, report.frames_dropped, cli.output
    );
    Ok(())
}

/// Decode every image in `dir` in parallel, sorted by file name
fn load_images(dir: &Path, threads: usize) -> Result<Vec<RgbImage>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("reading input directory {:?}", dir))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| is_image_file(path))
        .collect();
    paths.sort();

    if paths.is_empty() {
        bail!("no images found in {:?}", dir);
    }
    info!("Decoding {} frames on {} threads", paths.len(), threads);

    let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
    let images = pool.install(|| {
        paths
            .par_iter()
            .map(|path| {
                image::open(path)
                    .map(|image| image.to_rgb8())
                    .with_context(|| format!("decoding {:?}", path))
            })
            .collect::<Result<Vec<_>>>()
    })?;

    let (width, height) = images[0].dimensions();
    if let Some((path, image)) = paths.iter().zip(&images).find(|(_, i)| i.dimensions() != (width, height)) {
        bail!(
            "{:?} is {}x{}, expected {}x{} like the first frame",
            path,
            image.width(),
            image.height(),
            width,
            height
        );
    }
    Ok(images)
}

fn is_image_file(path: &Path) -> bool {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => matches!(ext.to_lowercase().as_str(), "png" | "jpg" | "jpeg" | "bmp"),
        None => false,
    }
}
