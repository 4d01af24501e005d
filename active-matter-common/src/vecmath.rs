use std::f32::consts::TAU;
use std::fmt;
use std::ops::{Add, AddAssign, Index, IndexMut, Mul, Neg, Sub, SubAssign};

/// A small fixed-size float vector.
///
/// Positions and cartesian headings use `N = D`; the angular form of a heading
/// uses `N = D - 1` (one angle in 2D, azimuth and polar angle in 3D).
#[derive(Copy, Clone, PartialEq)]
pub struct Vector<const N: usize>(pub [f32; N]);

pub type Vec1 = Vector<1>;
pub type Vec2 = Vector<2>;
pub type Vec3 = Vector<3>;

impl<const N: usize> Vector<N> {
    #[inline(always)]
    pub fn new(components: [f32; N]) -> Self {
        Self(components)
    }

    #[inline(always)]
    pub fn zero() -> Self {
        Self([0.0; N])
    }

    /// First component. Panics for `N == 0`.
    #[inline(always)]
    pub fn x(&self) -> f32 {
        self.0[0]
    }

    #[inline(always)]
    pub fn dot(&self, other: Self) -> f32 {
        self.0.iter().zip(other.0.iter()).map(|(a, b)| a * b).sum()
    }

    #[inline(always)]
    pub fn length_squared(&self) -> f32 {
        self.dot(*self)
    }

    #[inline(always)]
    pub fn length(&self) -> f32 {
        self.length_squared().sqrt()
    }

    #[inline(always)]
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|c| *c == 0.0)
    }

    /// Normalizes in place. Returns `false` and leaves the vector untouched
    /// when its length is zero.
    pub fn normalize(&mut self) -> bool {
        let len = self.length();
        if len > 0.0 {
            for c in self.0.iter_mut() {
                *c /= len;
            }
            true
        } else {
            false
        }
    }

    /// Returns the unit vector, or the zero vector if the length is zero.
    pub fn normalize_or_zero(mut self) -> Self {
        if self.normalize() {
            self
        } else {
            Self::zero()
        }
    }

    /// `a * (1 - t) + b * t`
    #[inline(always)]
    pub fn lerp(a: Self, b: Self, t: f32) -> Self {
        a * (1.0 - t) + b * t
    }

    /// Wraps every component into `[-half_extent, half_extent]`.
    pub fn wrap_periodic(&mut self, half_extent: f32) {
        let extent = 2.0 * half_extent;
        for c in self.0.iter_mut() {
            *c -= extent * ((*c + half_extent) / extent).floor();
        }
    }

    /// Scales the vector down to `max_length` if it is longer.
    /// Returns `true` if the vector was clamped.
    pub fn clamp_length(&mut self, max_length: f32) -> bool {
        let len_sq = self.length_squared();
        if len_sq > max_length * max_length {
            let scale = max_length / len_sq.sqrt();
            for c in self.0.iter_mut() {
                *c *= scale;
            }
            true
        } else {
            false
        }
    }
}

impl<const N: usize> Default for Vector<N> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<const N: usize> fmt::Debug for Vector<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl<const N: usize> fmt::Display for Vector<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ ")?;
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:.6}", c)?;
        }
        write!(f, " ]")
    }
}

impl<const N: usize> From<[f32; N]> for Vector<N> {
    fn from(components: [f32; N]) -> Self {
        Self(components)
    }
}

impl<const N: usize> AsRef<[f32]> for Vector<N> {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}

impl<const N: usize> AsMut<[f32]> for Vector<N> {
    fn as_mut(&mut self) -> &mut [f32] {
        &mut self.0
    }
}

impl<const N: usize> Index<usize> for Vector<N> {
    type Output = f32;
    fn index(&self, i: usize) -> &f32 {
        &self.0[i]
    }
}

impl<const N: usize> IndexMut<usize> for Vector<N> {
    fn index_mut(&mut self, i: usize) -> &mut f32 {
        &mut self.0[i]
    }
}

impl<const N: usize> Add for Vector<N> {
    type Output = Self;
    fn add(mut self, other: Self) -> Self {
        self += other;
        self
    }
}

impl<const N: usize> AddAssign for Vector<N> {
    fn add_assign(&mut self, other: Self) {
        for (a, b) in self.0.iter_mut().zip(other.0) {
            *a += b;
        }
    }
}

impl<const N: usize> Sub for Vector<N> {
    type Output = Self;
    fn sub(mut self, other: Self) -> Self {
        self -= other;
        self
    }
}

impl<const N: usize> SubAssign for Vector<N> {
    fn sub_assign(&mut self, other: Self) {
        for (a, b) in self.0.iter_mut().zip(other.0) {
            *a -= b;
        }
    }
}

impl<const N: usize> Mul<f32> for Vector<N> {
    type Output = Self;
    fn mul(mut self, scalar: f32) -> Self {
        for c in self.0.iter_mut() {
            *c *= scalar;
        }
        self
    }
}

impl<const N: usize> Neg for Vector<N> {
    type Output = Self;
    fn neg(self) -> Self {
        self * -1.0
    }
}

/// Conversion between a cartesian unit direction and its angular form.
///
/// Implemented separately for 2D and 3D since the formulas differ.
pub trait Heading: Copy {
    type Angles: Copy + Default + PartialEq + fmt::Debug + Send + Sync + AsRef<[f32]> + AsMut<[f32]>;

    /// Angles to a unit direction vector.
    fn from_angles(angles: Self::Angles) -> Self;

    /// Direction (assumed normalized) to angles.
    fn to_angles(self) -> Self::Angles;

    /// Draws an isotropically distributed heading from uniform [0, 1) samples.
    fn random_angles(uniform: impl FnMut() -> f32) -> Self::Angles;
}

impl Heading for Vec2 {
    type Angles = Vec1;

    #[inline(always)]
    fn from_angles(angles: Vec1) -> Self {
        let theta = angles.0[0];
        Vector([theta.cos(), theta.sin()])
    }

    #[inline(always)]
    fn to_angles(self) -> Vec1 {
        Vector([self.0[1].atan2(self.0[0])])
    }

    fn random_angles(mut uniform: impl FnMut() -> f32) -> Vec1 {
        Vector([uniform() * TAU])
    }
}

impl Heading for Vec3 {
    type Angles = Vec2;

    /// `theta` is the azimuth in the xy plane, `phi` the polar angle from +z.
    #[inline(always)]
    fn from_angles(angles: Vec2) -> Self {
        let [theta, phi] = angles.0;
        let sin_phi = phi.sin();
        Vector([theta.cos() * sin_phi, theta.sin() * sin_phi, phi.cos()])
    }

    #[inline(always)]
    fn to_angles(self) -> Vec2 {
        // acos is NaN outside [-1, 1]; rounding can push a unit z slightly past it
        let z = self.0[2].clamp(-1.0, 1.0);
        Vector([self.0[1].atan2(self.0[0]), z.acos()])
    }

    fn random_angles(mut uniform: impl FnMut() -> f32) -> Vec2 {
        let theta = uniform() * TAU;
        let phi = (1.0 - 2.0 * uniform()).clamp(-1.0, 1.0).acos();
        Vector([theta, phi])
    }
}
