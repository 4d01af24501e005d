use crate::simulation::Simulation;
use active_matter_common::{Heading, Snapshot, Vector};
use anyhow::{Context, Result};
use log::{error, info};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Streams trajectory frames to `<base>_trajectory.bin` as they are recorded.
pub struct TrajectoryWriter<W: Write> {
    out: W,
    scratch: Vec<u8>,
    frames: usize,
}

impl TrajectoryWriter<BufWriter<File>> {
    pub fn create(base_filename: &str) -> Result<Self> {
        let path = trajectory_path(base_filename);
        let file = File::create(&path)
            .with_context(|| format!("Failed to create trajectory file '{}'", path.display()))?;
        info!("Writing trajectory frames to {}", path.display());
        Ok(TrajectoryWriter::new(BufWriter::new(file)))
    }
}

impl<W: Write> TrajectoryWriter<W> {
    pub fn new(out: W) -> Self {
        TrajectoryWriter {
            out,
            scratch: Vec::new(),
            frames: 0,
        }
    }

    /// Appends the simulation's current state as one frame.
    pub fn record<const D: usize>(&mut self, sim: &Simulation<D>) -> Result<()>
    where
        Vector<D>: Heading,
    {
        self.scratch.clear();
        sim.write_frame(&mut self.scratch);
        self.out
            .write_all(&self.scratch)
            .context("Failed to write trajectory frame")?;
        self.frames += 1;
        Ok(())
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Flushes buffered frames and hands back the sink.
    pub fn finish(mut self) -> Result<W> {
        self.out.flush().context("Failed to flush trajectory")?;
        Ok(self.out)
    }
}

pub fn trajectory_path(base_filename: &str) -> PathBuf {
    PathBuf::from(format!("{}_trajectory.bin", base_filename))
}

/// Stats encodings understood by [`save_snapshots`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsFormat {
    Json,
    Bincode,
    MessagePack,
}

impl StatsFormat {
    /// Unknown names fall back to JSON.
    pub fn parse(name: Option<&str>) -> Self {
        match name.unwrap_or("json") {
            "json" => StatsFormat::Json,
            "bincode" => StatsFormat::Bincode,
            "messagepack" => StatsFormat::MessagePack,
            other => {
                error!("Unknown output format: {}. Using JSON instead.", other);
                StatsFormat::Json
            }
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            StatsFormat::Json => "json",
            StatsFormat::Bincode => "bin",
            StatsFormat::MessagePack => "msgpack",
        }
    }
}

/// Encodes the recorded snapshots into `out`.
pub fn write_snapshots<W: Write>(out: W, snapshots: &[Snapshot], format: StatsFormat) -> Result<()> {
    match format {
        StatsFormat::Json => {
            serde_json::to_writer(out, snapshots).context("Error serializing snapshots to JSON")?
        }
        StatsFormat::Bincode => {
            bincode::serialize_into(out, snapshots).context("Error serializing snapshots to bincode")?
        }
        StatsFormat::MessagePack => {
            let mut out = out;
            rmp_serde::encode::write(&mut out, snapshots)
                .context("Error serializing snapshots to MessagePack")?
        }
    }
    Ok(())
}

/// Writes `<base>_stats.<ext>` and returns its path.
pub fn save_snapshots(base_filename: &str, snapshots: &[Snapshot], format: StatsFormat) -> Result<PathBuf> {
    let path = PathBuf::from(format!("{}_stats.{}", base_filename, format.extension()));
    let file = File::create(&path)
        .with_context(|| format!("Error creating snapshot file '{}'", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_snapshots(&mut writer, snapshots, format)?;
    writer.flush()?;
    info!("{} snapshots saved to {} ({:?})", snapshots.len(), path.display(), format);
    Ok(path)
}

/// Final particle state as CSV: `x,y[,z],frozen`.
pub fn write_final_positions<W: Write, const D: usize>(out: W, sim: &Simulation<D>) -> Result<()>
where
    Vector<D>: Heading,
{
    let mut writer = csv::Writer::from_writer(out);

    let mut header: Vec<&str> = ["x", "y", "z"][..D].to_vec();
    header.push("frozen");
    writer.write_record(&header)?;

    for particle in sim.particles() {
        let mut record: Vec<String> = particle.pos.0.iter().map(|c| format!("{:.4}", c)).collect();
        record.push(particle.frozen.to_string());
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_final_positions<const D: usize>(base_filename: &str, sim: &Simulation<D>) -> Result<PathBuf>
where
    Vector<D>: Heading,
{
    let path = PathBuf::from(format!("{}_final_positions.csv", base_filename));
    let file = File::create(&path)
        .with_context(|| format!("Error saving CSV file '{}'", path.display()))?;
    write_final_positions(file, sim)?;
    info!("Final positions saved to {}", path.display());
    Ok(path)
}
