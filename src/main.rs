//! ASCII Metablobs - three orbiting metablobs ray-marched to the terminal
//!
//! Usage:
//!   ascii-metablobs                 - Animate until interrupted
//!   ascii-metablobs --frames 300    - Render a bounded number of frames
//!   ascii-metablobs --dump out/     - Write frames to text files instead

use anyhow::Context;
use ascii_metablobs::renderer::{Frames, Renderer};
use ascii_metablobs::terminal::TerminalDisplay;
use ascii_metablobs::{BASE_HEIGHT, BASE_WIDTH};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "ascii-metablobs")]
#[command(version)]
#[command(about = "Animated metablobs rendered to the terminal with ray marching")]
struct Args {
    /// Render this many frames, then exit (default: run until interrupted)
    #[arg(long)]
    frames: Option<u64>,

    /// Target frame rate
    #[arg(long, default_value_t = 30.0)]
    fps: f64,

    /// Override the detected terminal width
    #[arg(long)]
    width: Option<usize>,

    /// Override the detected terminal height
    #[arg(long)]
    height: Option<usize>,

    /// Write frames to text files in DIR instead of drawing to the terminal
    #[arg(long, value_name = "DIR")]
    dump: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    if let Some(dir) = args.dump.clone() {
        return run_dump(&args, &dir);
    }

    let mut terminal = TerminalDisplay::new().context("failed to initialize terminal")?;
    let (term_width, term_height) = terminal.size();
    let width = args.width.unwrap_or(term_width).max(1);
    let height = args.height.unwrap_or(term_height).max(1);

    let renderer = Renderer::new(width, height);
    log::info!(
        "rendering at {}x{} (terminal {}x{}), k1 = {:?}",
        width,
        height,
        term_width,
        term_height,
        renderer.viewport().k1()
    );

    let frame_time = Duration::from_secs_f64(1.0 / args.fps.max(0.001));
    let mut count = 0u64;
    let mut last = Instant::now();

    for frame in Frames::new(renderer) {
        terminal
            .present(&frame)
            .context("failed to write frame to terminal")?;

        count += 1;
        if args.frames.is_some_and(|limit| count >= limit) {
            break;
        }

        // Hold the target frame rate
        let elapsed = last.elapsed();
        if elapsed < frame_time {
            std::thread::sleep(frame_time - elapsed);
        }
        last = Instant::now();
    }

    Ok(())
}

/// Render frames to numbered text files for inspection
fn run_dump(args: &Args, dir: &PathBuf) -> anyhow::Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create dump directory {}", dir.display()))?;

    let width = args.width.unwrap_or(BASE_WIDTH as usize);
    let height = args.height.unwrap_or(BASE_HEIGHT as usize);
    let count = args.frames.unwrap_or(10) as usize;
    log::info!("dumping {} frames at {}x{}", count, width, height);

    let frames = Frames::new(Renderer::new(width.max(1), height.max(1)));
    for (i, frame) in frames.take(count).enumerate() {
        let path = dir.join(format!("frame_{:03}.txt", i));
        fs::write(&path, &frame).with_context(|| format!("failed to write {}", path.display()))?;
        println!("Wrote {}", path.display());
    }

    Ok(())
}
