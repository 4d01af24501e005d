use serde::{Deserialize, Serialize};

/// Summary statistics of the particle population at one recorded step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Number of completed timesteps when the snapshot was taken.
    pub step: u32,
    /// Mean squared distance of the particles from the origin.
    pub msd: f32,
    /// Length of the mean heading vector (0 = disordered, 1 = fully aligned).
    pub polarization: f32,
    /// Absorbed particles. Unknown when the snapshot is rebuilt from a trajectory file.
    #[serde(default)]
    pub frozen_count: Option<u32>,
}
