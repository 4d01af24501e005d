use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Stream identity reserved for host-side work such as initial placement.
pub const HOST_STREAM: u32 = u32::MAX;

/// Independent random stream owned by exactly one unit of work.
///
/// Streams are keyed by `(seed, worker)`, so a run is reproducible for a fixed
/// seed and worker count. Nothing is shared, so no locking is involved.
#[derive(Debug, Clone)]
pub struct Sampler {
    rng: StdRng,
}

impl Sampler {
    pub fn for_worker(seed: u32, worker: u32) -> Self {
        let key = ((seed as u64) << 32) | worker as u64;
        Sampler {
            rng: StdRng::seed_from_u64(key),
        }
    }

    /// The stream used for serial, host-side draws.
    pub fn host(seed: u32) -> Self {
        Self::for_worker(seed, HOST_STREAM)
    }

    /// One stream per worker, identities `0..workers`.
    pub fn pool(seed: u32, workers: usize) -> Vec<Self> {
        (0..workers as u32).map(|w| Self::for_worker(seed, w)).collect()
    }

    /// Uniform sample in `[0, 1)`.
    #[inline]
    pub fn uniform01(&mut self) -> f32 {
        self.rng.random::<f32>()
    }

    #[inline]
    pub fn normal(&mut self, mean: f32, std_dev: f32) -> f32 {
        let z: f32 = self.rng.sample(StandardNormal);
        mean + std_dev * z
    }
}
