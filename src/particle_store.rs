use active_matter_common::{Heading, Vector};

/// A single self-propelled particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle<const D: usize>
where
    Vector<D>: Heading,
{
    pub pos: Vector<D>,
    /// Angular form of the heading: one angle in 2D, azimuth and polar angle in 3D.
    pub rotation: <Vector<D> as Heading>::Angles,
    /// Absorbed by the boundary; frozen particles are never updated again.
    pub frozen: bool,
}

impl<const D: usize> Particle<D>
where
    Vector<D>: Heading,
{
    pub fn new(pos: Vector<D>, rotation: <Vector<D> as Heading>::Angles) -> Self {
        Particle {
            pos,
            rotation,
            frozen: false,
        }
    }

    /// Unit direction vector in cartesian form.
    #[inline(always)]
    pub fn heading(&self) -> Vector<D> {
        Vector::<D>::from_angles(self.rotation)
    }
}

/// Selects which of the two buffers currently holds the latest generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generation {
    A,
    B,
}

impl Generation {
    fn index(self) -> usize {
        match self {
            Generation::A => 0,
            Generation::B => 1,
        }
    }

    fn flipped(self) -> Self {
        match self {
            Generation::A => Generation::B,
            Generation::B => Generation::A,
        }
    }
}

/// Particle storage with an optional shadow buffer.
///
/// In-place models only ever touch the front buffer. Double-buffered models
/// read the front generation while writing the back one, then flip the
/// selector once the whole pass has completed.
#[derive(Debug)]
pub struct ParticleStore<const D: usize>
where
    Vector<D>: Heading,
{
    buffers: [Vec<Particle<D>>; 2],
    front: Generation,
    double_buffered: bool,
}

impl<const D: usize> ParticleStore<D>
where
    Vector<D>: Heading,
{
    pub fn new(particles: Vec<Particle<D>>, double_buffered: bool) -> Self {
        let shadow = if double_buffered {
            particles.clone()
        } else {
            Vec::new()
        };
        ParticleStore {
            buffers: [particles, shadow],
            front: Generation::A,
            double_buffered,
        }
    }

    pub fn len(&self) -> usize {
        self.buffers[self.front.index()].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_double_buffered(&self) -> bool {
        self.double_buffered
    }

    pub fn generation(&self) -> Generation {
        self.front
    }

    /// The latest generation.
    pub fn front(&self) -> &[Particle<D>] {
        &self.buffers[self.front.index()]
    }

    pub fn front_mut(&mut self) -> &mut [Particle<D>] {
        &mut self.buffers[self.front.index()]
    }

    /// Read-only front generation alongside the writable back generation.
    pub fn split(&mut self) -> (&[Particle<D>], &mut [Particle<D>]) {
        debug_assert!(self.double_buffered, "split() on a single-buffered store");
        let (a, b) = self.buffers.split_at_mut(1);
        match self.front {
            Generation::A => (&a[0][..], &mut b[0][..]),
            Generation::B => (&b[0][..], &mut a[0][..]),
        }
    }

    /// Makes the just-written back generation the front one.
    pub fn swap_buffers(&mut self) {
        debug_assert!(self.double_buffered, "swap_buffers() on a single-buffered store");
        self.front = self.front.flipped();
    }
}
