use crate::sim_params::{BoidsParams, ModelParams, SimParams};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Which update strategy to run, as spelled on the command line and in config files.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    RandomWalk,
    RunAndTumble,
    ActiveBrownian,
    Vicsek,
    Boids,
}

impl ModelKind {
    pub const ALL: [ModelKind; 5] = [
        ModelKind::RandomWalk,
        ModelKind::RunAndTumble,
        ModelKind::ActiveBrownian,
        ModelKind::Vicsek,
        ModelKind::Boids,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::RandomWalk => "random-walk",
            ModelKind::RunAndTumble => "run-and-tumble",
            ModelKind::ActiveBrownian => "active-brownian",
            ModelKind::Vicsek => "vicsek",
            ModelKind::Boids => "boids",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        ModelKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("Invalid model name '{}'.", s))
    }
}

// Run-wide settings
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct RunConfig {
    pub dimension: u32,
    pub particles: usize,
    /// Negative (or zero) disables the periodic domain.
    pub periodic_size: f32,
    /// Zero disables the absorbing boundary.
    pub boundary: f32,
    pub uniform_start: bool,
    pub seed: u32,
    pub iterations: u32,
    pub workers: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            dimension: 2,
            particles: 512,
            periodic_size: 500.0,
            boundary: 0.0,
            uniform_start: true,
            seed: 0,
            iterations: 1000,
            workers: 0,
        }
    }
}

// Strategy selection and per-strategy parameters; unused ones are ignored
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct ModelConfig {
    pub kind: Option<ModelKind>,
    pub flip_prob: f32,
    pub angular_diffusion: f32,
    pub detection_radius: f32,
    pub separation_radius: f32,
    pub separation: f32,
    pub alignment: f32,
    pub cohesion: f32,
    pub rate: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        let boids = BoidsParams::default();
        ModelConfig {
            kind: None,
            flip_prob: 0.1,
            angular_diffusion: boids.angular_diffusion,
            detection_radius: boids.detection_radius,
            separation_radius: boids.separation_radius,
            separation: boids.separation_coeff,
            alignment: boids.alignment_coeff,
            cohesion: boids.cohesion_coeff,
            rate: boids.adoption_rate,
        }
    }
}

// Configuration for output settings
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub base_filename: String,
    /// Record a trajectory frame and a stats snapshot every N steps.
    pub record_interval: u32,
    pub save_trajectory: bool,
    pub save_stats: bool,
    pub format: Option<String>, // Stats format: "json", "bincode", "messagepack"
    pub save_positions: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            base_filename: "active_matter".to_string(),
            record_interval: 10,
            save_trajectory: true,
            save_stats: true,
            format: None,
            save_positions: true,
        }
    }
}

/// Main simulation configuration structure, loaded from a TOML file.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(default)]
pub struct SimulationConfig {
    pub simulation: RunConfig,
    pub model: ModelConfig,
    pub output: OutputConfig,
}

impl SimulationConfig {
    /// Loads and validates the simulation configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        let config: SimulationConfig = toml::from_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML from '{}': {}", path_ref.display(), e))?;

        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations no model can be built from.
    pub fn validate(&self) -> Result<()> {
        let sim = &self.simulation;
        let model = &self.model;

        if sim.dimension != 2 && sim.dimension != 3 {
            anyhow::bail!("Unsupported dimension {} (only 2 and 3 are available).", sim.dimension);
        }
        if model.kind.is_none() {
            anyhow::bail!("No model selected; expected one of: random-walk, run-and-tumble, active-brownian, vicsek, boids.");
        }
        // The frame header stores the count as a signed 32-bit integer.
        if sim.particles > i32::MAX as usize {
            anyhow::bail!("particles must not exceed {}.", i32::MAX);
        }
        if !(0.0..=1.0).contains(&model.flip_prob) {
            anyhow::bail!("flip_prob must lie in [0, 1].");
        }
        if !(0.0..=1.0).contains(&model.rate) {
            anyhow::bail!("rate must lie in [0, 1].");
        }
        if model.angular_diffusion < 0.0 {
            anyhow::bail!("angular_diffusion must be non-negative.");
        }
        if model.detection_radius < 0.0 || model.separation_radius < 0.0 {
            anyhow::bail!("detection_radius and separation_radius must be non-negative.");
        }
        Ok(())
    }

    /// Parameters shared by every model.
    pub fn sim_params(&self) -> SimParams {
        let sim = &self.simulation;
        SimParams {
            particle_count: sim.particles,
            periodicity: sim.periodic_size,
            boundary: sim.boundary,
            start_uniformly: sim.uniform_start,
            seed: sim.seed,
            workers: sim.workers,
        }
    }

    /// Strategy parameters for the selected model.
    pub fn model_params(&self) -> Result<ModelParams> {
        let model = &self.model;
        let kind = model
            .kind
            .ok_or_else(|| anyhow::anyhow!("No model selected."))?;

        Ok(match kind {
            ModelKind::RandomWalk => ModelParams::RandomWalk,
            ModelKind::RunAndTumble => ModelParams::RunAndTumble {
                flip_probability: model.flip_prob,
            },
            ModelKind::ActiveBrownian => ModelParams::ActiveBrownian {
                angular_diffusion: model.angular_diffusion,
            },
            ModelKind::Vicsek => ModelParams::Vicsek {
                detection_radius: model.detection_radius,
                angular_diffusion: model.angular_diffusion,
            },
            ModelKind::Boids => ModelParams::Boids(BoidsParams {
                detection_radius: model.detection_radius,
                separation_radius: model.separation_radius,
                angular_diffusion: model.angular_diffusion,
                separation_coeff: model.separation,
                alignment_coeff: model.alignment,
                cohesion_coeff: model.cohesion,
                adoption_rate: model.rate,
            }),
        })
    }
}
