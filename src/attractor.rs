//! Moving attractors ("magnets" / flurry centers).
//!
//! Closed-form motions are pure functions of the clock; the wander motion is
//! integrated state driven by the simulation's random source.

use cgmath::prelude::*;
use rand::rngs::StdRng;

use crate::random::{jitter, one_in, symmetric};
use crate::space::{Bounds, Space, cap_speed};

/// Slow depth oscillation for the pseudo-3D orbit: `z = sin(angle / 2) * amplitude + base`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DepthWave {
    pub amplitude: f32,
    pub base: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Orbit {
    pub center: [f32; 2],
    pub radius: f32,
    pub angular_speed: f32,
    pub phase: f32,
    pub depth: Option<DepthWave>,
}

impl Orbit {
    pub fn angle(&self, now: f32) -> f32 {
        now * self.angular_speed + self.phase
    }

    pub fn position<V: Space>(&self, now: f32) -> V {
        let angle = self.angle(now);
        let depth = self
            .depth
            .map_or(0.0, |wave| (angle * 0.5).sin() * wave.amplitude + wave.base);
        V::planar(
            self.center[0] + angle.cos() * self.radius,
            self.center[1] + angle.sin() * self.radius,
            depth,
        )
    }
}

/// `x = cx + ax * sin(now * fx)`, `y = cy + ay * cos(now * fy)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lissajous {
    pub center: [f32; 2],
    pub amplitude: [f32; 2],
    pub frequency: [f32; 2],
    /// Fixed depth in 3D, ignored in 2D.
    pub depth: f32,
}

impl Lissajous {
    pub fn position<V: Space>(&self, now: f32) -> V {
        V::planar(
            self.center[0] + self.amplitude[0] * (now * self.frequency[0]).sin(),
            self.center[1] + self.amplitude[1] * (now * self.frequency[1]).cos(),
            self.depth,
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Wander<V> {
    /// Per-frame bound on each velocity component's random kick.
    pub acceleration: f32,
    pub max_speed: f32,
    /// 1-in-N chance per frame of a small heading change.
    pub turn_chance: u32,
    /// Largest heading change, radians.
    pub max_turn: f32,
    /// 1-in-N chance per frame of a full reversal.
    pub reverse_chance: u32,
    pub bounds: Bounds<V>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Motion<V> {
    Orbit(Orbit),
    Lissajous(Lissajous),
    Wander(Wander<V>),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Attractor<V> {
    pub position: V,
    pub velocity: V,
    pub motion: Motion<V>,
}

impl<V: Space> Attractor<V> {
    /// Places the attractor at its `now = 0` position. `start` seeds wander
    /// motion and is ignored by closed-form motions.
    pub fn new(motion: Motion<V>, start: V) -> Self {
        let position = match &motion {
            Motion::Orbit(orbit) => orbit.position(0.0),
            Motion::Lissajous(path) => path.position(0.0),
            Motion::Wander(_) => start,
        };
        Self {
            position,
            velocity: V::zero(),
            motion,
        }
    }

    pub fn update(&mut self, now: f32, dt: f32, rng: &mut StdRng) {
        match self.motion {
            Motion::Orbit(orbit) => self.follow(orbit.position(now), dt),
            Motion::Lissajous(path) => self.follow(path.position(now), dt),
            Motion::Wander(wander) => {
                if dt > 0.0 {
                    self.wander(&wander, dt, rng);
                }
            }
        }
    }

    // Closed-form motions report their finite-difference velocity so spawns
    // can inherit it.
    fn follow(&mut self, next: V, dt: f32) {
        if dt > 0.0 {
            self.velocity = (next - self.position) / dt;
        }
        self.position = next;
    }

    fn wander(&mut self, wander: &Wander<V>, dt: f32, rng: &mut StdRng) {
        let kick: V = jitter(rng, wander.acceleration);
        let mut velocity = self.velocity + kick;
        if one_in(rng, wander.turn_chance) {
            velocity = velocity.rotate_planar(symmetric(rng, wander.max_turn));
        }
        if one_in(rng, wander.reverse_chance) {
            velocity = velocity * -1.0;
        }
        self.velocity = cap_speed(velocity, wander.max_speed);
        self.position = self.position + self.velocity * dt;
        wander.bounds.reflect(&mut self.position, &mut self.velocity);
    }
}
