//! Classic (improved) Perlin gradient noise over 3D space.
//!
//! A sample point is located in its unit lattice cube; the eight cube corners
//! are hashed through the permutation table to pick a gradient each, the
//! gradient is dotted with the offset from that corner, and the eight dot
//! products are blended with the quintic fade curve:
//!
//!   A  = p[X] + Y,   AA = p[A] + Z,   AB = p[A + 1] + Z
//!   B  = p[X + 1] + Y, BA = p[B] + Z, BB = p[B + 1] + Z
//!
//! Interpolation runs along x first, then y, then z.

use noise::NoiseFn;

use crate::{
    math::{fade, grad, lerp},
    permutation::PermutationTable,
};

/// Perlin gradient noise generator backed by one [`PermutationTable`].
///
/// [`get`](Self::get) is a pure function of the table and the coordinates,
/// so a shared `&GradientNoise` can be sampled from many threads at once.
/// [`reseed`](Self::reseed) takes `&mut self`, which rules out reseeding
/// while any sample is in flight.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GradientNoise {
    permutation: PermutationTable,
}

impl GradientNoise {
    /// Generator using Ken Perlin's reference permutation.
    pub fn reference() -> Self {
        Self {
            permutation: PermutationTable::from_reference(),
        }
    }

    /// Generator using a permutation shuffled from `seed`.
    pub fn new(seed: u32) -> Self {
        Self {
            permutation: PermutationTable::from_seed(seed),
        }
    }

    /// Replace the permutation with one shuffled from `seed`.
    pub fn reseed(&mut self, seed: u32) {
        tracing::trace!(seed, "reseeding gradient noise");
        self.permutation = PermutationTable::from_seed(seed);
    }

    /// The permutation this generator hashes with.
    pub fn permutation(&self) -> &PermutationTable {
        &self.permutation
    }

    /// Sample the noise field at `(x, y, z)`.
    ///
    /// Returns a value in `[-1, 1]` for any finite input. Lattice points
    /// (all-integer coordinates) always sample to zero.
    pub fn get(&self, x: f64, y: f64, z: f64) -> f64 {
        let p = &self.permutation;

        let (fx, fy, fz) = (x.floor(), y.floor(), z.floor());

        // Two's-complement floor-mod: -1 wraps to 255.
        let cx = (fx as i64 & 255) as usize;
        let cy = (fy as i64 & 255) as usize;
        let cz = (fz as i64 & 255) as usize;

        let x = x - fx;
        let y = y - fy;
        let z = z - fz;

        let u = fade(x);
        let v = fade(y);
        let w = fade(z);

        let a = p[cx] as usize + cy;
        let aa = p[a] as usize + cz;
        let ab = p[a + 1] as usize + cz;
        let b = p[cx + 1] as usize + cy;
        let ba = p[b] as usize + cz;
        let bb = p[b + 1] as usize + cz;

        lerp(
            w,
            lerp(
                v,
                lerp(u, grad(p[aa], x, y, z), grad(p[ba], x - 1.0, y, z)),
                lerp(
                    u,
                    grad(p[ab], x, y - 1.0, z),
                    grad(p[bb], x - 1.0, y - 1.0, z),
                ),
            ),
            lerp(
                v,
                lerp(
                    u,
                    grad(p[aa + 1], x, y, z - 1.0),
                    grad(p[ba + 1], x - 1.0, y, z - 1.0),
                ),
                lerp(
                    u,
                    grad(p[ab + 1], x, y - 1.0, z - 1.0),
                    grad(p[bb + 1], x - 1.0, y - 1.0, z - 1.0),
                ),
            ),
        )
    }
}

impl From<PermutationTable> for GradientNoise {
    fn from(permutation: PermutationTable) -> Self {
        Self { permutation }
    }
}

impl NoiseFn<f64, 3> for GradientNoise {
    fn get(&self, point: [f64; 3]) -> f64 {
        GradientNoise::get(self, point[0], point[1], point[2])
    }
}

/// Samples the `z = 0` plane.
impl NoiseFn<f64, 2> for GradientNoise {
    fn get(&self, point: [f64; 2]) -> f64 {
        GradientNoise::get(self, point[0], point[1], 0.0)
    }
}
