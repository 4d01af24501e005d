use active_matter_common::{Heading, ModelKind, SimulationConfig, Vector};
use active_matter_engine::output::{self, StatsFormat, TrajectoryWriter};
use active_matter_engine::Simulation;
use anyhow::{bail, Result};
use clap::Parser;
use log::{debug, error, info, trace, warn};
use std::path::PathBuf;
use std::time::Instant;

/// Seconds between progress lines when no snapshot is due.
const PRINT_INTERVAL_SECS: f64 = 5.0;

/// Runs an active matter model and records its trajectory and statistics.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Optional TOML config; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// random-walk, run-and-tumble, active-brownian, vicsek or boids
    #[arg(short, long)]
    model: Option<ModelKind>,

    /// Spatial dimension (2 or 3)
    #[arg(short, long)]
    dimension: Option<u32>,

    #[arg(short = 'n', long)]
    particles: Option<usize>,

    /// Half-width of the periodic domain; zero or negative disables it
    #[arg(long, allow_negative_numbers = true)]
    periodic_size: Option<f32>,

    /// Radius of the absorbing boundary; zero disables it
    #[arg(long)]
    boundary: Option<f32>,

    /// Start every particle at the origin instead of scattering them
    #[arg(long)]
    non_uniform_start: bool,

    #[arg(long)]
    seed: Option<u32>,

    /// Number of timesteps
    #[arg(long)]
    iter: Option<u32>,

    /// Work units per step (0 = one per rayon thread)
    #[arg(long)]
    workers: Option<usize>,

    /// Run & tumble flip probability
    #[arg(long)]
    flip_prob: Option<f32>,

    #[arg(long)]
    angular_diffusion: Option<f32>,

    /// Vicsek and boids neighbourhood radius
    #[arg(long)]
    detection_radius: Option<f32>,

    #[arg(long)]
    separation_radius: Option<f32>,

    /// Boids separation coefficient
    #[arg(long)]
    separation: Option<f32>,

    /// Boids alignment coefficient
    #[arg(long)]
    alignment: Option<f32>,

    /// Boids cohesion coefficient
    #[arg(long)]
    cohesion: Option<f32>,

    /// Boids adoption rate
    #[arg(long)]
    rate: Option<f32>,

    /// Record a frame and a snapshot every N steps
    #[arg(long)]
    record_interval: Option<u32>,

    /// Base filename for every output
    #[arg(short, long)]
    output: Option<String>,
}

impl Args {
    /// Layers the command line over the config file (or the defaults).
    fn into_config(self) -> Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                SimulationConfig::load(path)?
            }
            None => SimulationConfig::default(),
        };

        let sim = &mut config.simulation;
        if let Some(v) = self.dimension {
            sim.dimension = v;
        }
        if let Some(v) = self.particles {
            sim.particles = v;
        }
        if let Some(v) = self.periodic_size {
            sim.periodic_size = v;
        }
        if let Some(v) = self.boundary {
            sim.boundary = v;
        }
        if self.non_uniform_start {
            sim.uniform_start = false;
        }
        if let Some(v) = self.seed {
            sim.seed = v;
        }
        if let Some(v) = self.iter {
            sim.iterations = v;
        }
        if let Some(v) = self.workers {
            sim.workers = v;
        }

        let model = &mut config.model;
        if self.model.is_some() {
            model.kind = self.model;
        }
        if let Some(v) = self.flip_prob {
            model.flip_prob = v;
        }
        if let Some(v) = self.angular_diffusion {
            model.angular_diffusion = v;
        }
        if let Some(v) = self.detection_radius {
            model.detection_radius = v;
        }
        if let Some(v) = self.separation_radius {
            model.separation_radius = v;
        }
        if let Some(v) = self.separation {
            model.separation = v;
        }
        if let Some(v) = self.alignment {
            model.alignment = v;
        }
        if let Some(v) = self.cohesion {
            model.cohesion = v;
        }
        if let Some(v) = self.rate {
            model.rate = v;
        }

        if let Some(v) = self.record_interval {
            config.output.record_interval = v;
        }
        if let Some(v) = self.output {
            config.output.base_filename = v;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let config = Args::parse().into_config()?;
    info!("Starting Active Matter Engine...");
    info!("Using {} Rayon threads.", rayon::current_num_threads());

    match config.simulation.dimension {
        2 => run::<2>(&config),
        3 => run::<3>(&config),
        other => bail!("Unsupported dimension {}.", other),
    }
}

fn run<const D: usize>(config: &SimulationConfig) -> Result<()>
where
    Vector<D>: Heading,
{
    // --- Initialize Simulation ---
    let model = config.model_params()?;
    info!("Initializing {} in {}D...", model.name(), D);
    let mut sim = Simulation::<D>::new(config.sim_params(), model);
    info!("Initialized with {} particles.", sim.particle_count());
    debug!("Simulation parameters: {:#?}", sim.params());
    debug!("Model parameters: {:#?}", sim.model());

    // --- Recording Setup ---
    let output = &config.output;
    let total_steps = config.simulation.iterations;
    let mut record_interval = output.record_interval;
    if record_interval == 0 {
        warn!("Record interval of 0 steps requested. Recording every step.");
        record_interval = 1;
    }
    info!("Recording every {} steps.", record_interval);

    let mut trajectory = if output.save_trajectory {
        Some(TrajectoryWriter::create(&output.base_filename)?)
    } else {
        info!("Skipping trajectory output as per config (save_trajectory is false).");
        None
    };

    // --- Initial Snapshot (step 0) ---
    info!("Recording initial state (step 0)...");
    sim.record_snapshot();
    if let Some(writer) = trajectory.as_mut() {
        writer.record(&sim)?;
    }

    // --- Simulation Loop ---
    info!("Starting simulation loop for {} steps...", total_steps);
    let start_time = Instant::now();
    let mut previous_print_time = start_time;

    for step in 1..=total_steps {
        let step_start_time = Instant::now();
        sim.update();
        let step_duration = step_start_time.elapsed();

        let now = Instant::now();
        let should_print_status = now.duration_since(previous_print_time).as_secs_f64() >= PRINT_INTERVAL_SECS;
        // the last step is always recorded, even off the interval
        let is_record_step = step % record_interval == 0 || step == total_steps;

        if is_record_step {
            sim.record_snapshot();
            if let Some(writer) = trajectory.as_mut() {
                writer.record(&sim)?;
            }
        }

        if should_print_status || is_record_step {
            info!(
                "Step [{}/{}] | MSD: {:.3} | Frozen: {} | Step Time: {:6.2} ms | Elapsed: {:.2} s",
                step,
                total_steps,
                sim.msd(),
                sim.frozen_count(),
                step_duration.as_secs_f64() * 1000.0,
                start_time.elapsed().as_secs_f64()
            );
            previous_print_time = now;
        } else {
            trace!(
                "Step [{}/{}] completed in {:.2} ms",
                step,
                total_steps,
                step_duration.as_secs_f64() * 1000.0
            );
        }
    }

    let total_duration = start_time.elapsed();
    info!(
        "Simulation finished in {:.3} seconds ({:.3} ms per step).",
        total_duration.as_secs_f64(),
        total_duration.as_secs_f64() * 1000.0 / total_steps.max(1) as f64
    );

    // --- Save Recorded Data ---
    if let Some(writer) = trajectory {
        let frames = writer.frames();
        writer.finish()?;
        info!(
            "Trajectory saved to {} ({} frames)",
            output::trajectory_path(&output.base_filename).display(),
            frames
        );
    }

    // Stats and final positions are optional; failures are logged, not fatal
    if output.save_stats {
        let format = StatsFormat::parse(output.format.as_deref());
        if let Err(e) = output::save_snapshots(&output.base_filename, sim.recorded_snapshots(), format) {
            error!("Error saving snapshots: {:#}", e);
        }
    } else {
        info!("Skipping saving snapshots as per config (save_stats is false).");
    }

    if output.save_positions {
        if let Err(e) = output::save_final_positions(&output.base_filename, &sim) {
            error!("Error saving final positions: {:#}", e);
        }
    } else {
        info!("Skipping saving final positions as per config.");
    }

    info!("{}", sim.summary());
    info!("Simulation Complete.");
    Ok(())
}
