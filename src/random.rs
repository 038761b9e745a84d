//! Helpers over the injected pseudo-random source.
//!
//! The engine never reaches for `thread_rng`; every sample comes from the
//! `StdRng` the simulation was seeded with, so a fixed seed replays a run.

use cgmath::prelude::*;
use rand::distributions::Standard;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::space::Space;

pub fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Uniform sample in `[-radius, radius)`; zero for a non-positive radius.
///
/// Scales a unit sample instead of building a `-radius..radius` range, which
/// overflows once `2 * radius` exceeds `f32::MAX`.
pub fn symmetric<R: Rng + ?Sized>(rng: &mut R, radius: f32) -> f32 {
    if radius > 0.0 {
        let unit: f32 = rng.sample(Standard);
        (unit * 2.0 - 1.0) * radius
    } else {
        0.0
    }
}

/// Uniform offset inside the axis-aligned cube of half-width `radius`.
pub fn jitter<V: Space, R: Rng + ?Sized>(rng: &mut R, radius: f32) -> V {
    let mut offset = V::zero();
    for i in 0..V::DIMENSION {
        offset[i] = symmetric(rng, radius);
    }
    offset
}

/// A 1-in-`n` event. `n == 0` never fires.
pub fn one_in<R: Rng + ?Sized>(rng: &mut R, n: u32) -> bool {
    n > 0 && rng.gen_ratio(1, n)
}
