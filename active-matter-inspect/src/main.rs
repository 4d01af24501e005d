use active_matter_common::{read_frames, Frame, Snapshot};
use anyhow::{anyhow, Context, Result};
use clap::Parser;
use env_logger::Builder;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn, LevelFilter};
use plotters::prelude::*;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Command-line arguments for the trajectory inspector
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input trajectory file (.bin)
    #[arg(short, long)]
    input: PathBuf,

    /// Per-frame statistics as CSV
    #[arg(long, default_value = "trajectory_stats.csv")]
    csv: PathBuf,

    /// Optional MSD curve (.png)
    #[arg(long)]
    plot: Option<PathBuf>,

    /// Frames per parallel work unit
    #[arg(long, default_value_t = 10)]
    chunk_size: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();

    Builder::from_default_env()
        .filter(None, LevelFilter::Info)
        .init();

    info!("Opening trajectory file: {}", args.input.display());
    let bytes = std::fs::read(&args.input)
        .with_context(|| format!("Failed to open input file: {}", args.input.display()))?;
    let frames = read_frames(&bytes)
        .with_context(|| format!("Failed to parse trajectory: {}", args.input.display()))?;

    if frames.is_empty() {
        warn!("Input file contains no frames. Exiting.");
        return Ok(());
    }
    info!(
        "Found {} frames of {} particles in {}D",
        frames.len(),
        frames[0].particle_count(),
        frames[0].dimension
    );

    let start_time = Instant::now();
    let snapshots = frame_statistics(&frames, args.chunk_size)?;
    info!(
        "Computed statistics for {} frames in {:.2} s",
        snapshots.len(),
        start_time.elapsed().as_secs_f64()
    );

    write_csv(&args.csv, &snapshots)?;
    info!("Statistics saved to {}", args.csv.display());

    if let Some(plot) = &args.plot {
        plot_msd(plot, &snapshots)?;
        info!("MSD curve saved to {}", plot.display());
    }

    if let (Some(first), Some(last)) = (snapshots.first(), snapshots.last()) {
        info!(
            "MSD {:.3} -> {:.3}, polarization {:.3} -> {:.3}",
            first.msd, last.msd, first.polarization, last.polarization
        );
    }
    Ok(())
}

/// One snapshot per frame, computed chunk by chunk on the rayon pool.
fn frame_statistics(frames: &[Frame], chunk_size: usize) -> Result<Vec<Snapshot>> {
    let chunk_size = chunk_size.max(1);

    let progress_bar = ProgressBar::new(frames.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} frames ({percent}%) [{eta}]")?
            .progress_chars("#>-"),
    );

    let chunks: Vec<Vec<Snapshot>> = frames
        .par_chunks(chunk_size)
        .enumerate()
        .map(|(chunk_idx, chunk)| {
            let stats = chunk
                .iter()
                .enumerate()
                .map(|(k, frame)| Snapshot {
                    step: (chunk_idx * chunk_size + k) as u32,
                    msd: frame.msd(),
                    polarization: frame.polarization(),
                    frozen_count: None,
                })
                .collect();
            progress_bar.inc(chunk.len() as u64);
            stats
        })
        .collect();

    progress_bar.finish_and_clear();
    Ok(chunks.into_iter().flatten().collect())
}

fn write_csv(path: &Path, snapshots: &[Snapshot]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Error creating CSV file '{}'", path.display()))?;
    writer.write_record(["frame", "msd", "polarization"])?;
    for snapshot in snapshots {
        writer.write_record(&[
            snapshot.step.to_string(),
            format!("{:.6}", snapshot.msd),
            format!("{:.6}", snapshot.polarization),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn plot_msd(path: &Path, snapshots: &[Snapshot]) -> Result<()> {
    let max_frame = snapshots.len().saturating_sub(1).max(1) as f32;
    let max_msd = snapshots
        .iter()
        .map(|s| s.msd)
        .fold(0.0f32, f32::max)
        .max(1.0);

    let root = BitMapBackend::new(path, (1024, 768)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| anyhow!("{e}"))?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Mean squared displacement", ("sans-serif", 28))
        .margin(16)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(0f32..max_frame, 0f32..max_msd * 1.05)
        .map_err(|e| anyhow!("{e}"))?;

    chart
        .configure_mesh()
        .x_desc("frame")
        .y_desc("MSD")
        .draw()
        .map_err(|e| anyhow!("{e}"))?;

    chart
        .draw_series(LineSeries::new(
            snapshots.iter().map(|s| (s.step as f32, s.msd)),
            &BLUE,
        ))
        .map_err(|e| anyhow!("{e}"))?;

    root.present().map_err(|e| anyhow!("{e}"))?;
    Ok(())
}
