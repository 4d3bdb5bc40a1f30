use crate::error::{SteerError, SteerResult};
use crate::math::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform randomness for the simulation. Everything random an
/// agent does is derived from `next_unit`, so a scripted implementation makes
/// a run fully deterministic.
pub trait RandomSource {
    /// Uniform sample in `[0, 1)`.
    fn next_unit(&mut self) -> f32;

    /// Uniform sample in `[-1, 1)`.
    fn next_signed(&mut self) -> f32 {
        self.next_unit() * 2.0 - 1.0
    }

    /// Uniformly distributed point inside the unit disk on the XZ plane.
    fn vector_in_xz_disk(&mut self) -> Vec3 {
        loop {
            let v = Vec3::new(self.next_signed(), 0.0, self.next_signed());
            if v.length_squared() < 1.0 {
                return v;
            }
        }
    }

    fn unit_vector_on_xz_plane(&mut self) -> Vec3 {
        loop {
            let v = self.vector_in_xz_disk().normalize();
            if !v.is_zero() {
                return v;
            }
        }
    }

    /// One bounded step of a scalar random walk.
    fn scalar_random_walk(&mut self, initial: f32, walk_speed: f32, min: f32, max: f32) -> f32 {
        let next = initial + self.next_signed() * walk_speed;
        next.clamp(min, max)
    }
}

pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> SteerResult<Self> {
        let seed = getrandom::u64().map_err(|e| SteerError::EntropyUnavailable(e.to_string()))?;
        log::debug!("seeding simulation rng from entropy: {seed}");
        Ok(Self::from_seed(seed))
    }
}

impl RandomSource for SeededRandom {
    fn next_unit(&mut self) -> f32 {
        self.rng.gen::<f32>()
    }
}
