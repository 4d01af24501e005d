//! Parallel simulation of self-propelled particle models in two and three dimensions.

pub mod output;
pub mod particle_store;
pub mod post_process;
pub mod sampler;
pub mod simulation;
pub mod strategy;

pub use particle_store::{Generation, Particle, ParticleStore};
pub use post_process::PostProcessor;
pub use sampler::Sampler;
pub use simulation::{Simulation, Summary};
pub use strategy::{Discipline, Strategy};
