use serde::{Deserialize, Serialize};

/// Immutable parameters shared by every model, derived from the configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimParams {
    pub particle_count: usize,
    /// Half-extent of the periodic domain; `<= 0` disables wrapping.
    pub periodicity: f32,
    /// Radius of the absorbing sphere; `<= 0` disables it.
    pub boundary: f32,
    /// Scatter particles over the domain instead of starting at the origin.
    pub start_uniformly: bool,
    pub seed: u32,
    /// Number of independent sampler streams (0 = size of the rayon pool).
    pub workers: usize,
}

impl Default for SimParams {
    fn default() -> Self {
        SimParams {
            particle_count: 512,
            periodicity: 500.0,
            boundary: 0.0,
            start_uniformly: true,
            seed: 0,
            workers: 0,
        }
    }
}

impl SimParams {
    /// Half-side of the square/cube particles are scattered over at start.
    pub fn placement_extent(&self) -> f32 {
        if self.boundary > 0.0 {
            self.boundary
        } else if self.periodicity > 0.0 {
            self.periodicity
        } else {
            500.0
        }
    }
}

/// Boids weights and radii.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoidsParams {
    pub detection_radius: f32,
    pub separation_radius: f32,
    pub angular_diffusion: f32,
    pub separation_coeff: f32,
    pub alignment_coeff: f32,
    pub cohesion_coeff: f32,
    /// How much of the target direction is adopted per step, 0..1.
    pub adoption_rate: f32,
}

impl Default for BoidsParams {
    fn default() -> Self {
        BoidsParams {
            detection_radius: 25.0,
            separation_radius: 5.0,
            angular_diffusion: 0.02,
            separation_coeff: 1.0,
            alignment_coeff: 0.2,
            cohesion_coeff: 0.2,
            adoption_rate: 0.25,
        }
    }
}

/// Model selection together with its scalar parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ModelParams {
    RandomWalk,
    RunAndTumble { flip_probability: f32 },
    ActiveBrownian { angular_diffusion: f32 },
    Vicsek { detection_radius: f32, angular_diffusion: f32 },
    Boids(BoidsParams),
}

impl ModelParams {
    pub fn name(&self) -> &'static str {
        match self {
            ModelParams::RandomWalk => "Random Walk",
            ModelParams::RunAndTumble { .. } => "Run & Tumble",
            ModelParams::ActiveBrownian { .. } => "Active Brownian Motion",
            ModelParams::Vicsek { .. } => "Vicsek model",
            ModelParams::Boids(_) => "Boids",
        }
    }
}
