use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Parser;
use edge_overlay::{gray_to_rgba, process_frame, CannyParams, GrayFrame, RgbaFrameMut};
use log::{info, warn};

/// Replays still frames through the edge overlay pipeline.
#[derive(Parser, Debug)]
#[command(name = "edge-overlay")]
#[command(version)]
struct Cli {
    /// Gradient magnitude below which nothing is an edge
    #[arg(long, default_value_t = 50.0)]
    low: f32,
    /// Gradient magnitude at or above which a pixel always seeds an edge
    #[arg(long, default_value_t = 150.0)]
    high: f32,
    /// Smoothing and Sobel aperture (3, 5 or 7)
    #[arg(long, default_value_t = 3)]
    aperture: u32,
    /// Use the Euclidean gradient norm
    #[arg(long)]
    l2: bool,
    /// Show the grayscale frame instead of its edges
    #[arg(long)]
    passthrough: bool,
    /// Directory the RGBA frames are written to
    #[arg(long, short)]
    out: PathBuf,
    /// Frames to process, in order
    #[arg(required = true)]
    frames: Vec<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();
    let params = CannyParams::new(cli.low, cli.high, cli.aperture)?.with_l2_gradient(cli.l2);
    fs::create_dir_all(&cli.out)?;

    let mut processed = 0u32;
    let mut busy = Duration::default();
    for path in &cli.frames {
        // A bad frame is dropped and the replay moves on to the next one.
        match render(path, &cli.out, &params, cli.passthrough) {
            Ok((width, height, elapsed)) => {
                processed += 1;
                busy += elapsed;
                println!(
                    "{}: {}x{} {:.1} fps",
                    path.display(),
                    width,
                    height,
                    1.0 / elapsed.as_secs_f64().max(1e-9)
                );
            }
            Err(err) => warn!("skipping {}: {}", path.display(), err),
        }
    }

    if processed > 0 {
        println!(
            "{} of {} frames, {:.1} fps average",
            processed,
            cli.frames.len(),
            f64::from(processed) / busy.as_secs_f64().max(1e-9)
        );
    }
    Ok(())
}

/// Loads one frame, runs it through the pipeline and saves the RGBA result.
fn render(
    path: &Path,
    out_dir: &Path,
    params: &CannyParams,
    passthrough: bool,
) -> Result<(u32, u32, Duration), Box<dyn Error>> {
    let gray = image::open(path)?.to_luma8();
    let (width, height) = gray.dimensions();
    let mut rgba = image::RgbaImage::new(width, height);

    let start = Instant::now();
    {
        let input = GrayFrame::from_image(&gray)?;
        let mut output = RgbaFrameMut::from_image(&mut rgba)?;
        if passthrough {
            gray_to_rgba(&input, &mut output)?;
        } else {
            process_frame(&input, &mut output, params)?;
        }
    }
    let elapsed = start.elapsed();

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame".to_string());
    let target = out_dir.join(format!("{}.png", name));
    rgba.save(&target)?;
    info!("wrote {}", target.display());
    Ok((width, height, elapsed))
}
