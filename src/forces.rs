//! Acceleration models and the per-frame integrator.
//!
//! An [`Integrator`] owns one [`Propulsion`] strategy, picked at configuration
//! time, and advances every particle of a pool with semi-implicit Euler:
//!
//! ```text
//! velocity += acceleration * dt
//! velocity *= drag            // per frame, not scaled by dt
//! position += velocity * dt
//! ```

use cgmath::prelude::*;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;

use crate::pool::{Particle, ParticlePool};
use crate::random::jitter;
use crate::space::{Bounds, Space, cap_speed};

/// Particles per rayon task. Each task draws from its own RNG seeded off the
/// simulation's source, so results do not depend on thread scheduling.
const CHUNK: usize = 256;

/// Velocity update strategy applied before drag.
pub trait Propulsion<V: Space>: Send + Sync {
    fn accelerate(&self, particle: &mut Particle<V>, attractors: &[V], dt: f32, rng: &mut StdRng);

    /// Runs after the position update.
    fn confine(&self, _particle: &mut Particle<V>) {}
}

/// Softened pull towards every attractor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldAttraction {
    pub gravity_constant: f32,
    pub softening_squared: f32,
}

impl FieldAttraction {
    /// Net acceleration at `position`. Each attractor contributes
    /// `-d / r * G / r^2` with `r^2` floored at `softening_squared`, giving
    /// a `1/r^3` magnitude that tops out at `G / softening_squared^1.5`.
    pub fn acceleration<V: Space>(&self, position: V, attractors: &[V]) -> V {
        attractors.iter().fold(V::zero(), |acc, &attractor| {
            let d = position - attractor;
            let r2 = d.magnitude2().max(self.softening_squared);
            if r2 <= 0.0 {
                return acc;
            }
            let r = r2.sqrt();
            acc - d * (self.gravity_constant / r2 / r / r)
        })
    }
}

impl<V: Space> Propulsion<V> for FieldAttraction {
    fn accelerate(&self, particle: &mut Particle<V>, attractors: &[V], dt: f32, _rng: &mut StdRng) {
        let a = self.acceleration(particle.position, attractors);
        particle.velocity = particle.velocity + a * dt;
    }
}

/// Attractor-free random walk with a speed cap and reflecting walls.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SelfPropelled<V> {
    /// Per-frame bound on each velocity component's random kick.
    pub perturbation: f32,
    pub max_speed: f32,
    pub bounds: Bounds<V>,
}

impl<V: Space> Propulsion<V> for SelfPropelled<V> {
    fn accelerate(
        &self,
        particle: &mut Particle<V>,
        _attractors: &[V],
        _dt: f32,
        rng: &mut StdRng,
    ) {
        let kick: V = jitter(rng, self.perturbation);
        particle.velocity = cap_speed(particle.velocity + kick, self.max_speed);
    }

    fn confine(&self, particle: &mut Particle<V>) {
        self.bounds.reflect(&mut particle.position, &mut particle.velocity);
    }
}

pub struct Integrator<V: Space> {
    pub drag: f32,
    model: Box<dyn Propulsion<V>>,
}

impl<V: Space> Integrator<V> {
    pub fn new<P>(drag: f32, model: P) -> Self
    where
        P: Propulsion<V> + 'static,
    {
        Self {
            drag,
            model: Box::new(model),
        }
    }

    pub fn from_boxed(drag: f32, model: Box<dyn Propulsion<V>>) -> Self {
        Self { drag, model }
    }

    pub fn advance(&self, particle: &mut Particle<V>, attractors: &[V], dt: f32, rng: &mut StdRng) {
        self.model.accelerate(particle, attractors, dt, rng);
        particle.velocity = particle.velocity * self.drag;
        particle.position = particle.position + particle.velocity * dt;
        self.model.confine(particle);
    }

    /// Advances every occupied slot of `pool` by `dt` seconds. A non-positive
    /// or non-finite `dt` leaves the pool untouched.
    pub fn step(&self, pool: &mut ParticlePool<V>, attractors: &[V], dt: f32, rng: &mut StdRng) {
        if !(dt > 0.0 && dt.is_finite()) {
            return;
        }

        let particles = pool.as_mut_slice();
        let seeds: Vec<u64> = (0..particles.len().div_ceil(CHUNK))
            .map(|_| rng.next_u64())
            .collect();

        particles
            .par_chunks_mut(CHUNK)
            .zip(seeds)
            .for_each(|(chunk, seed)| {
                let mut local = StdRng::seed_from_u64(seed);
                for particle in chunk {
                    self.advance(particle, attractors, dt, &mut local);
                }
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::seeded;
    use cgmath::{Vector2, vec2};

    fn at(position: Vector2<f32>, velocity: Vector2<f32>) -> Particle<Vector2<f32>> {
        Particle {
            position,
            velocity,
            birth_time: 0.0,
        }
    }

    const FIELD: FieldAttraction = FieldAttraction {
        gravity_constant: 500_000.0,
        softening_squared: 2500.0,
    };

    #[test]
    fn field_points_at_attractor_with_inverse_cube_magnitude() {
        let a = FIELD.acceleration(vec2(100.0f32, 0.0), &[vec2(0.0, 0.0)]);
        assert!((a.x + 0.5).abs() < 1e-5, "got {:?}", a);
        assert!(a.y.abs() < 1e-6);

        let far = FIELD.acceleration(vec2(200.0f32, 0.0), &[vec2(0.0, 0.0)]);
        assert!((a.magnitude() / far.magnitude() - 8.0).abs() < 1e-3);
    }

    #[test]
    fn field_is_finite_on_top_of_attractor() {
        let a = FIELD.acceleration(vec2(5.0f32, 5.0), &[vec2(5.0, 5.0)]);
        assert!(a.x.is_finite() && a.y.is_finite());
        let bound = FIELD.gravity_constant / FIELD.softening_squared.powf(1.5);
        let near = FIELD.acceleration(vec2(5.0f32 + 1e-3, 5.0), &[vec2(5.0, 5.0)]);
        assert!(near.magnitude() <= bound + 1e-6);
    }

    #[test]
    fn field_sums_attractors() {
        let a = FIELD.acceleration(vec2(0.0f32, 0.0), &[vec2(100.0, 0.0), vec2(-100.0, 0.0)]);
        assert!(a.magnitude() < 1e-6);
    }

    #[test]
    fn drag_applies_after_force_and_before_position() {
        let integrator = Integrator::new(0.5, FIELD);
        let mut p = at(vec2(100.0, 0.0), vec2(0.0, 0.0));
        integrator.advance(&mut p, &[vec2(0.0, 0.0)], 1.0, &mut seeded(0));
        assert!((p.velocity.x + 0.25).abs() < 1e-5);
        assert!((p.position.x - 99.75).abs() < 1e-4);
    }

    #[test]
    fn zero_dt_is_a_no_op() {
        let integrator = Integrator::new(0.9, FIELD);
        let mut pool = ParticlePool::new(4);
        pool.spawn(at(vec2(10.0, 0.0), vec2(3.0, 0.0)));
        let before = *pool.get(0).unwrap();
        integrator.step(&mut pool, &[vec2(0.0, 0.0)], 0.0, &mut seeded(0));
        integrator.step(&mut pool, &[vec2(0.0, 0.0)], -1.0, &mut seeded(0));
        assert_eq!(*pool.get(0).unwrap(), before);
    }

    #[test]
    fn self_propelled_respects_cap_and_walls() {
        let bounds = Bounds::new(vec2(0.0f32, 0.0), vec2(10.0, 10.0));
        let model = SelfPropelled {
            perturbation: 50.0,
            max_speed: 20.0,
            bounds,
        };
        let integrator = Integrator::new(1.0, model);
        let mut pool = ParticlePool::new(64);
        for _ in 0..64 {
            pool.spawn(at(vec2(5.0, 5.0), vec2(0.0, 0.0)));
        }
        let mut rng = seeded(9);
        for _ in 0..200 {
            integrator.step(&mut pool, &[], 0.1, &mut rng);
            for p in pool.iter() {
                assert!(p.velocity.magnitude() <= 20.0 + 1e-3);
                assert!(bounds.contains(p.position));
            }
        }
    }

    #[test]
    fn step_is_reproducible_for_a_seed() {
        let model = SelfPropelled {
            perturbation: 5.0,
            max_speed: 10.0,
            bounds: Bounds::new(vec2(-100.0f32, -100.0), vec2(100.0, 100.0)),
        };
        let integrator = Integrator::new(0.98, model);
        let run = |seed| {
            let mut pool = ParticlePool::new(600);
            for _ in 0..600 {
                pool.spawn(at(vec2(0.0, 0.0), vec2(0.0, 0.0)));
            }
            let mut rng = seeded(seed);
            for _ in 0..10 {
                integrator.step(&mut pool, &[], 1.0 / 60.0, &mut rng);
            }
            pool.iter().map(|p| p.position).collect::<Vec<_>>()
        };
        assert_eq!(run(11), run(11));
    }
}
