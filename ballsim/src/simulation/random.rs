//! Xorshift-multiply pseudo-random generator
//!
//! A 64-bit xorshift64* stream: three xorshifts on the state followed by a
//! multiply on the output. Seeded once per session, it places bodies, draws
//! their initial velocities and shuffles the visiting permutation.
//!
//! The generator implements `rand_core::RngCore`, so `rand` helpers such as
//! `SliceRandom::shuffle` run directly on it.

use rand_core::{impls, Error, RngCore, SeedableRng};

use super::states::NVec3;

const MULTIPLIER: u64 = 0x2545_F491_4F6C_DD1D;

// xorshift never leaves the all-zero state
const ZERO_SEED_REPLACEMENT: u64 = 0x9E37_79B9_7F4A_7C15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XorShiftRng {
    state: u64,
}

impl XorShiftRng {
    pub fn new(seed: u64) -> Self {
        let state = if seed == 0 { ZERO_SEED_REPLACEMENT } else { seed };
        Self { state }
    }

    /// Next raw 64-bit output.
    #[inline]
    pub fn step(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(MULTIPLIER)
    }

    /// Uniform float in `[0, 1)` with 53 bits of precision.
    pub fn unit(&mut self) -> f64 {
        (self.step() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Uniform float in `[lo, hi)`.
    pub fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.unit()
    }

    /// Uniform point in the axis-aligned box `[lo, hi)`.
    pub fn in_box(&mut self, lo: &NVec3, hi: &NVec3) -> NVec3 {
        NVec3::new(
            self.range(lo.x, hi.x),
            self.range(lo.y, hi.y),
            self.range(lo.z, hi.z),
        )
    }

    /// Uniform point inside the unit ball (rejection from the enclosing cube).
    pub fn in_unit_ball(&mut self) -> NVec3 {
        loop {
            let p = NVec3::new(
                self.range(-1.0, 1.0),
                self.range(-1.0, 1.0),
                self.range(-1.0, 1.0),
            );
            if p.norm_squared() <= 1.0 {
                return p;
            }
        }
    }

    /// Uniform direction on the unit sphere.
    pub fn direction(&mut self) -> NVec3 {
        loop {
            let p = self.in_unit_ball();
            let n2 = p.norm_squared();
            if n2 > 1e-12 {
                return p / n2.sqrt();
            }
        }
    }
}

impl RngCore for XorShiftRng {
    fn next_u32(&mut self) -> u32 {
        (self.step() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.step()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        impls::fill_bytes_via_next(self, dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for XorShiftRng {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u64::from_le_bytes(seed))
    }

    fn seed_from_u64(state: u64) -> Self {
        Self::new(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::seq::SliceRandom;

    #[test]
    fn same_seed_same_stream() {
        let mut a = XorShiftRng::new(7);
        let mut b = XorShiftRng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(a.step(), b.step());
        }
    }

    #[test]
    fn zero_seed_does_not_stick() {
        let mut rng = XorShiftRng::new(0);
        assert_ne!(rng.step(), 0);
        assert_ne!(rng.step(), rng.step());
    }

    #[test]
    fn unit_stays_in_range() {
        let mut rng = XorShiftRng::new(12345);
        for _ in 0..10_000 {
            let f = rng.unit();
            assert!((0.0..1.0).contains(&f));
        }
    }

    #[test]
    fn directions_are_unit_length() {
        let mut rng = XorShiftRng::new(99);
        for _ in 0..1000 {
            assert!((rng.direction().norm() - 1.0).abs() < 1e-12);
            assert!(rng.in_unit_ball().norm() <= 1.0);
        }
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut rng = XorShiftRng::new(3);
        let mut v: Vec<usize> = (0..64).collect();
        v.shuffle(&mut rng);
        let mut sorted = v.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..64).collect::<Vec<_>>());
        assert_ne!(v, sorted);
    }
}
