use crate::particle_store::Particle;
use crate::sampler::Sampler;
use active_matter_common::{BoidsParams, Heading, ModelParams, Vector};

/// How a strategy may touch particle storage during one update pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discipline {
    /// The step reads nothing but the particle's own previous state, so it can
    /// overwrite that state directly. A strategy that needs neighbour data
    /// must never be in-place.
    InPlace,
    /// The step reads the whole previous generation and writes a separate one.
    DoubleBuffered,
}

/// Per-particle kinematic rule with its precomputed scalar parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Strategy {
    RandomWalk,
    RunAndTumble {
        flip_probability: f32,
    },
    ActiveBrownian {
        /// sqrt(2 * angular diffusion)
        noise: f32,
    },
    Vicsek {
        detection_radius_sq: f32,
        noise: f32,
    },
    Boids {
        detection_radius_sq: f32,
        separation_radius_sq: f32,
        noise: f32,
        separation_coeff: f32,
        alignment_coeff: f32,
        cohesion_coeff: f32,
        adoption_rate: f32,
    },
}

fn angular_noise(angular_diffusion: f32) -> f32 {
    (2.0 * angular_diffusion).sqrt()
}

impl From<&ModelParams> for Strategy {
    fn from(params: &ModelParams) -> Self {
        match *params {
            ModelParams::RandomWalk => Strategy::RandomWalk,
            ModelParams::RunAndTumble { flip_probability } => Strategy::RunAndTumble { flip_probability },
            ModelParams::ActiveBrownian { angular_diffusion } => Strategy::ActiveBrownian {
                noise: angular_noise(angular_diffusion),
            },
            ModelParams::Vicsek {
                detection_radius,
                angular_diffusion,
            } => Strategy::Vicsek {
                detection_radius_sq: detection_radius * detection_radius,
                noise: angular_noise(angular_diffusion),
            },
            ModelParams::Boids(BoidsParams {
                detection_radius,
                separation_radius,
                angular_diffusion,
                separation_coeff,
                alignment_coeff,
                cohesion_coeff,
                adoption_rate,
            }) => Strategy::Boids {
                detection_radius_sq: detection_radius * detection_radius,
                separation_radius_sq: separation_radius * separation_radius,
                noise: angular_noise(angular_diffusion),
                separation_coeff,
                alignment_coeff,
                cohesion_coeff,
                adoption_rate,
            },
        }
    }
}

impl Strategy {
    pub fn discipline(&self) -> Discipline {
        match self {
            Strategy::RandomWalk | Strategy::RunAndTumble { .. } | Strategy::ActiveBrownian { .. } => {
                Discipline::InPlace
            }
            Strategy::Vicsek { .. } | Strategy::Boids { .. } => Discipline::DoubleBuffered,
        }
    }

    /// Computes the next state of particle `i` before post-processing.
    ///
    /// `front` is the previous generation and is only read by double-buffered
    /// strategies; in-place callers may pass an empty slice.
    pub fn next_state<const D: usize>(
        &self,
        i: usize,
        own: &Particle<D>,
        front: &[Particle<D>],
        sampler: &mut Sampler,
    ) -> Particle<D>
    where
        Vector<D>: Heading,
    {
        let rotation = match *self {
            Strategy::RandomWalk => Vector::<D>::random_angles(|| sampler.uniform01()),
            Strategy::RunAndTumble { flip_probability } => {
                if sampler.uniform01() < flip_probability {
                    Vector::<D>::random_angles(|| sampler.uniform01())
                } else {
                    own.rotation
                }
            }
            Strategy::ActiveBrownian { noise } => perturb::<D>(own.rotation, noise, sampler),
            Strategy::Vicsek {
                detection_radius_sq,
                noise,
            } => {
                let aligned = vicsek_rotation(i, own, front, detection_radius_sq);
                perturb::<D>(aligned, noise, sampler)
            }
            Strategy::Boids {
                detection_radius_sq,
                separation_radius_sq,
                noise,
                separation_coeff,
                alignment_coeff,
                cohesion_coeff,
                adoption_rate,
            } => {
                let forces = boids_forces(i, own, front, detection_radius_sq, separation_radius_sq);
                let target = forces.separation * separation_coeff
                    + forces.alignment * alignment_coeff
                    + forces.cohesion * cohesion_coeff;
                let mut direction = Vector::lerp(own.heading(), target, adoption_rate);
                let steered = if direction.normalize() {
                    direction.to_angles()
                } else {
                    own.rotation
                };
                perturb::<D>(steered, noise, sampler)
            }
        };

        // unit speed along the new heading
        let pos = own.pos + Vector::<D>::from_angles(rotation);
        Particle {
            pos,
            rotation,
            frozen: own.frozen,
        }
    }
}

/// White noise on every angular component.
fn perturb<const D: usize>(
    mut rotation: <Vector<D> as Heading>::Angles,
    noise: f32,
    sampler: &mut Sampler,
) -> <Vector<D> as Heading>::Angles
where
    Vector<D>: Heading,
{
    for angle in rotation.as_mut() {
        *angle += sampler.normal(0.0, noise);
    }
    rotation
}

/// Mean direction of the particle and every neighbour within the detection radius.
/// Keeps the previous rotation when the headings cancel exactly.
/// Coincident particles are neighbours even at radius 0.
fn vicsek_rotation<const D: usize>(
    i: usize,
    own: &Particle<D>,
    front: &[Particle<D>],
    detection_radius_sq: f32,
) -> <Vector<D> as Heading>::Angles
where
    Vector<D>: Heading,
{
    let mut direction = own.heading();
    for (j, other) in front.iter().enumerate() {
        if j == i {
            continue;
        }
        if (own.pos - other.pos).length_squared() <= detection_radius_sq {
            direction += other.heading();
        }
    }

    if direction.normalize() {
        direction.to_angles()
    } else {
        own.rotation
    }
}

/// Normalized Boids contributions; a contribution with nothing to act on is zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoidsForces<const D: usize> {
    pub separation: Vector<D>,
    pub alignment: Vector<D>,
    pub cohesion: Vector<D>,
}

pub fn boids_forces<const D: usize>(
    i: usize,
    own: &Particle<D>,
    front: &[Particle<D>],
    detection_radius_sq: f32,
    separation_radius_sq: f32,
) -> BoidsForces<D>
where
    Vector<D>: Heading,
{
    let pos = own.pos;
    let mut separation = Vector::<D>::zero();
    let mut alignment = own.heading();
    let mut centroid = Vector::<D>::zero();
    let mut neighbours = 0usize;

    for (j, other) in front.iter().enumerate() {
        if j == i {
            continue;
        }
        let away = pos - other.pos;
        let distance_sq = away.length_squared();

        if distance_sq <= separation_radius_sq {
            separation += away.normalize_or_zero() * distance_sq.sqrt();
        }
        if distance_sq <= detection_radius_sq {
            alignment += other.heading();
            centroid += other.pos;
            neighbours += 1;
        }
    }

    let cohesion = if neighbours > 0 {
        (centroid * (1.0 / neighbours as f32) - pos).normalize_or_zero()
    } else {
        Vector::zero()
    };

    BoidsForces {
        separation: separation.normalize_or_zero(),
        alignment: alignment.normalize_or_zero(),
        cohesion,
    }
}
