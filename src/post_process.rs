use crate::particle_store::Particle;
use active_matter_common::{Heading, SimParams, Vector};

/// Fraction of the boundary radius past which a clamped particle escapes down +X.
pub const ESCAPE_FRACTION: f32 = 0.999;

/// Periodic wrap and absorbing-boundary handling applied after every raw update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostProcessor {
    periodicity: f32,
    boundary: f32,
}

impl PostProcessor {
    pub fn new(params: &SimParams) -> Self {
        PostProcessor {
            periodicity: params.periodicity,
            boundary: params.boundary,
        }
    }

    pub fn is_periodic(&self) -> bool {
        self.periodicity > 0.0
    }

    pub fn is_bounded(&self) -> bool {
        self.boundary > 0.0
    }

    /// Applies the domain rules to a freshly written particle.
    ///
    /// The periodic domain takes precedence over the boundary. A particle pushed
    /// past the boundary is pulled back onto it and turned towards the origin;
    /// if it lands in the escape window on the +X side it becomes frozen.
    pub fn apply<const D: usize>(&self, particle: &mut Particle<D>)
    where
        Vector<D>: Heading,
    {
        if self.is_periodic() {
            particle.pos.wrap_periodic(self.periodicity);
        } else if self.is_bounded() && particle.pos.clamp_length(self.boundary) {
            particle.rotation = (-particle.pos.normalize_or_zero()).to_angles();
            if particle.pos.x() >= ESCAPE_FRACTION * self.boundary {
                particle.frozen = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use active_matter_common::{Vec1, Vec2, Vec3};

    fn processor(periodicity: f32, boundary: f32) -> PostProcessor {
        PostProcessor::new(&SimParams {
            periodicity,
            boundary,
            ..SimParams::default()
        })
    }

    #[test]
    fn wraps_into_periodic_domain() {
        let mut p = Particle::<2>::new(Vec2::new([10.5, -10.25]), Vec1::new([0.3]));
        processor(10.0, 0.0).apply(&mut p);
        assert!((p.pos[0] + 9.5).abs() < 1e-5);
        assert!((p.pos[1] - 9.75).abs() < 1e-5);
        assert_eq!(p.rotation, Vec1::new([0.3]));
        assert!(!p.frozen);
    }

    #[test]
    fn periodic_domain_takes_precedence_over_boundary() {
        let mut p = Particle::<2>::new(Vec2::new([0.0, 30.0]), Vec1::new([0.3]));
        processor(50.0, 20.0).apply(&mut p);
        assert_eq!(p.pos, Vec2::new([0.0, 30.0]));
    }

    #[test]
    fn boundary_clamps_and_turns_towards_origin() {
        let mut p = Particle::<2>::new(Vec2::new([0.0, 25.0]), Vec1::new([0.0]));
        processor(-1.0, 20.0).apply(&mut p);

        assert!((p.pos.length() - 20.0).abs() < 1e-4);
        let heading = p.heading();
        assert!(heading[0].abs() < 1e-5);
        assert!((heading[1] + 1.0).abs() < 1e-5);
        assert!(!p.frozen);
    }

    #[test]
    fn escape_window_freezes_particle() {
        let mut p = Particle::<3>::new(Vec3::new([30.0, 0.1, -0.1]), Vec2::new([0.0, 1.0]));
        processor(0.0, 20.0).apply(&mut p);
        assert!(p.frozen);
        assert!(p.pos.x() >= ESCAPE_FRACTION * 20.0);

        // same radius, but on the -X side: reflected, not absorbed
        let mut q = Particle::<3>::new(Vec3::new([-30.0, 0.0, 0.0]), Vec2::new([0.0, 1.0]));
        processor(0.0, 20.0).apply(&mut q);
        assert!(!q.frozen);
        assert!((q.heading()[0] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn inside_boundary_is_untouched() {
        let mut p = Particle::<2>::new(Vec2::new([19.0, 0.0]), Vec1::new([1.0]));
        processor(0.0, 20.0).apply(&mut p);
        assert_eq!(p.pos, Vec2::new([19.0, 0.0]));
        assert_eq!(p.rotation, Vec1::new([1.0]));
        assert!(!p.frozen);
    }
}
