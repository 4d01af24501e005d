use crate::particle_store::{Particle, ParticleStore};
use crate::post_process::PostProcessor;
use crate::sampler::Sampler;
use crate::strategy::{Discipline, Strategy};
use active_matter_common::{FrameWriter, Heading, ModelParams, SimParams, Snapshot, Vector};
use log::{debug, trace};
use rayon::prelude::*;
use std::fmt;

/// How many particles the textual summary lists.
const SUMMARY_PARTICLES: usize = 10;

/// One run of an active matter model in `D` dimensions.
///
/// Owns the particles and is their only mutator. Each call to [`update`](Self::update)
/// advances every non-frozen particle by one timestep.
pub struct Simulation<const D: usize>
where
    Vector<D>: Heading,
{
    params: SimParams,
    model: ModelParams,
    strategy: Strategy,
    post: PostProcessor,
    store: ParticleStore<D>,
    /// One stream per work unit; stream `k` always handles chunk `k` of the particle range.
    samplers: Vec<Sampler>,
    chunk_len: usize,
    current_time_step: u32,
    recorded_snapshots: Vec<Snapshot>,
}

impl<const D: usize> Simulation<D>
where
    Vector<D>: Heading,
{
    /// Creates a new simulation, placing the particles and drawing their initial headings.
    pub fn new(params: SimParams, model: ModelParams) -> Self {
        let strategy = Strategy::from(&model);
        let post = PostProcessor::new(&params);
        let particles = place_initial_particles::<D>(&params);

        // --- Work Units ---
        // one sampler per chunk, kept for the whole run
        let workers = if params.workers == 0 {
            rayon::current_num_threads()
        } else {
            params.workers
        }
        .max(1);
        let chunk_len = particles.len().div_ceil(workers).max(1);
        let samplers = Sampler::pool(params.seed, workers);

        // --- Storage ---
        let double_buffered = strategy.discipline() == Discipline::DoubleBuffered;
        let store = ParticleStore::new(particles, double_buffered);

        debug!(
            "{} in {}D: {} particles, {} workers ({} particles each), periodicity {}, boundary {}, double-buffered: {}",
            model.name(),
            D,
            store.len(),
            workers,
            chunk_len,
            params.periodicity,
            params.boundary,
            double_buffered
        );

        Simulation {
            params,
            model,
            strategy,
            post,
            store,
            samplers,
            chunk_len,
            current_time_step: 0,
            recorded_snapshots: Vec::new(),
        }
    }

    /// Advances the simulation by one timestep.
    pub fn update(&mut self) {
        match self.strategy.discipline() {
            Discipline::InPlace => self.update_in_place(),
            Discipline::DoubleBuffered => self.update_double_buffered(),
        }
        self.current_time_step += 1;
        trace!("Completed step {}", self.current_time_step);
    }

    /// Every particle depends only on its own previous state, so it is overwritten directly.
    fn update_in_place(&mut self) {
        let strategy = self.strategy;
        let post = self.post;
        let chunk_len = self.chunk_len;

        self.store
            .front_mut()
            .par_chunks_mut(chunk_len)
            .zip(self.samplers.par_iter_mut())
            .enumerate()
            .for_each(|(chunk_idx, (chunk, sampler))| {
                for (k, particle) in chunk.iter_mut().enumerate() {
                    if particle.frozen {
                        continue;
                    }
                    let i = chunk_idx * chunk_len + k;
                    *particle = strategy.next_state(i, particle, &[], sampler);
                    post.apply(particle);
                }
            });
    }

    /// Reads the front generation, writes the back one, then swaps them.
    fn update_double_buffered(&mut self) {
        let strategy = self.strategy;
        let post = self.post;
        let chunk_len = self.chunk_len;

        let (front, back) = self.store.split();
        back.par_chunks_mut(chunk_len)
            .zip(self.samplers.par_iter_mut())
            .enumerate()
            .for_each(|(chunk_idx, (chunk, sampler))| {
                for (k, slot) in chunk.iter_mut().enumerate() {
                    let i = chunk_idx * chunk_len + k;
                    let previous = &front[i];
                    if previous.frozen {
                        *slot = *previous;
                        continue;
                    }
                    *slot = strategy.next_state(i, previous, front, sampler);
                    post.apply(slot);
                }
            });

        // every chunk has been written once the parallel pass returns
        self.store.swap_buffers();
    }

    /// Mean squared distance of the particles from the origin.
    pub fn msd(&self) -> f32 {
        let particles = self.store.front();
        if particles.is_empty() {
            return 0.0;
        }
        let sum: f32 = particles.par_iter().map(|p| p.pos.length_squared()).sum();
        sum / particles.len() as f32
    }

    /// Length of the mean heading vector.
    pub fn polarization(&self) -> f32 {
        let particles = self.store.front();
        if particles.is_empty() {
            return 0.0;
        }
        let total = particles
            .par_iter()
            .map(|p| p.heading())
            .reduce(Vector::<D>::zero, |a, b| a + b);
        total.length() / particles.len() as f32
    }

    pub fn frozen_count(&self) -> usize {
        self.store.front().par_iter().filter(|p| p.frozen).count()
    }

    /// The latest generation of particles.
    pub fn particles(&self) -> &[Particle<D>] {
        self.store.front()
    }

    pub fn particle_count(&self) -> usize {
        self.store.len()
    }

    /// Number of completed timesteps.
    pub fn steps(&self) -> u32 {
        self.current_time_step
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn model(&self) -> &ModelParams {
        &self.model
    }

    pub fn name(&self) -> &'static str {
        self.model.name()
    }

    /// Appends the current particle state as one binary trajectory frame.
    pub fn write_frame(&self, out: &mut Vec<u8>) {
        let particles = self.store.front();
        let mut writer = FrameWriter::begin(out, particles.len(), D);
        for particle in particles {
            writer.particle(particle.pos.as_ref(), particle.heading().as_ref());
        }
        writer.finish();
    }

    /// Records the current statistics.
    pub fn record_snapshot(&mut self) -> &Snapshot {
        let snapshot = Snapshot {
            step: self.current_time_step,
            msd: self.msd(),
            polarization: self.polarization(),
            frozen_count: Some(self.frozen_count() as u32),
        };
        debug!(
            "Recording snapshot at step {}: MSD {:.3}, polarization {:.3}",
            snapshot.step, snapshot.msd, snapshot.polarization
        );
        self.recorded_snapshots.push(snapshot);
        &self.recorded_snapshots[self.recorded_snapshots.len() - 1]
    }

    pub fn recorded_snapshots(&self) -> &[Snapshot] {
        &self.recorded_snapshots
    }

    /// Read-only overview of the current state.
    pub fn summary(&self) -> Summary {
        Summary {
            model: self.name(),
            dimension: D,
            particle_count: self.particle_count(),
            steps: self.current_time_step,
            leading_positions: self
                .store
                .front()
                .iter()
                .take(SUMMARY_PARTICLES)
                .map(|p| p.pos.0.to_vec())
                .collect(),
            msd: self.msd(),
            polarization: self.polarization(),
            frozen_count: self.frozen_count(),
        }
    }
}

/// Scatters particles over the placement cube (or stacks them at the origin)
/// with random headings, drawing from the host stream.
fn place_initial_particles<const D: usize>(params: &SimParams) -> Vec<Particle<D>>
where
    Vector<D>: Heading,
{
    let mut host = Sampler::host(params.seed);
    let extent = params.placement_extent();

    (0..params.particle_count)
        .map(|_| {
            let pos = if params.start_uniformly {
                Vector(std::array::from_fn(|_| (host.uniform01() * 2.0 - 1.0) * extent))
            } else {
                Vector::zero()
            };
            let rotation = Vector::<D>::random_angles(|| host.uniform01());
            Particle::new(pos, rotation)
        })
        .collect()
}

/// Textual overview of a model: name, count, the first few positions and the MSD.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub model: &'static str,
    pub dimension: usize,
    pub particle_count: usize,
    pub steps: u32,
    pub leading_positions: Vec<Vec<f32>>,
    pub msd: f32,
    pub polarization: f32,
    pub frozen_count: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} ({}D), {} particles after {} steps:",
            self.model, self.dimension, self.particle_count, self.steps
        )?;
        for (i, pos) in self.leading_positions.iter().enumerate() {
            let coords: Vec<String> = pos.iter().map(|c| format!("{:.6}", c)).collect();
            writeln!(f, "\t- ({}) [ {} ]", i, coords.join(", "))?;
        }
        if self.particle_count > self.leading_positions.len() {
            writeln!(f, "\t- ... (only first {} shown)", self.leading_positions.len())?;
        }
        writeln!(f, "MSD: {:.6}", self.msd)?;
        writeln!(f, "Polarization: {:.6}", self.polarization)?;
        write!(f, "Frozen: {}", self.frozen_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use active_matter_common::BoidsParams;

    fn params(count: usize) -> SimParams {
        SimParams {
            particle_count: count,
            workers: 4,
            seed: 11,
            ..SimParams::default()
        }
    }

    #[test]
    fn uniform_start_fills_the_placement_cube() {
        let sim = Simulation::<3>::new(params(200), ModelParams::RandomWalk);
        assert_eq!(sim.particle_count(), 200);
        for p in sim.particles() {
            assert!(p.pos.0.iter().all(|c| c.abs() <= 500.0));
            assert!(!p.frozen);
        }
        // spread out, not stacked
        assert!(sim.msd() > 1000.0);
    }

    #[test]
    fn non_uniform_start_stacks_at_origin() {
        let sim = Simulation::<2>::new(
            SimParams {
                start_uniformly: false,
                ..params(16)
            },
            ModelParams::RandomWalk,
        );
        assert_eq!(sim.msd(), 0.0);
    }

    #[test]
    fn update_counts_steps_and_records() {
        let mut sim = Simulation::<2>::new(params(32), ModelParams::ActiveBrownian { angular_diffusion: 0.1 });
        sim.record_snapshot();
        sim.update();
        sim.update();
        let snapshot = sim.record_snapshot().clone();
        assert_eq!(sim.steps(), 2);
        assert_eq!(snapshot.step, 2);
        assert_eq!(snapshot.frozen_count, Some(0));
        assert_eq!(sim.recorded_snapshots().len(), 2);
    }

    #[test]
    fn more_workers_than_particles() {
        let mut sim = Simulation::<2>::new(
            SimParams {
                workers: 64,
                ..params(3)
            },
            ModelParams::Boids(BoidsParams::default()),
        );
        sim.update();
        assert_eq!(sim.particle_count(), 3);
        assert!(sim.particles().iter().all(|p| p.pos.0.iter().all(|c| c.is_finite())));
    }

    #[test]
    fn empty_population_is_harmless() {
        let mut sim = Simulation::<3>::new(params(0), ModelParams::Vicsek {
            detection_radius: 5.0,
            angular_diffusion: 0.1,
        });
        sim.update();
        assert_eq!(sim.msd(), 0.0);
        assert_eq!(sim.polarization(), 0.0);
        let mut bytes = Vec::new();
        sim.write_frame(&mut bytes);
        assert_eq!(bytes.len(), active_matter_common::frame_len(0, 3));
    }

    #[test]
    fn summary_lists_first_ten() {
        let sim = Simulation::<2>::new(params(25), ModelParams::RunAndTumble { flip_probability: 0.1 });
        let summary = sim.summary();
        assert_eq!(summary.leading_positions.len(), 10);
        assert_eq!(summary.model, "Run & Tumble");
        assert_eq!(sim.params().particle_count, 25);
        assert_eq!(*sim.model(), ModelParams::RunAndTumble { flip_probability: 0.1 });
        let text = summary.to_string();
        assert!(text.starts_with("Run & Tumble (2D), 25 particles after 0 steps:"));
        assert!(text.contains("only first 10 shown"));
        assert!(text.contains("MSD:"));
    }
}
