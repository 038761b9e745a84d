//! Boundary to the windowing and drawing collaborators.
//!
//! The engine never owns a window. Each frame it produces a [`FrameSnapshot`],
//! and the snapshot replays itself onto whatever [`Surface`] the frontend
//! provides: one clear, one draw per visible particle and marker, one present.

use std::time::Instant;

use crate::lifetime::Rgba;

/// Monotonic time source, read once per frame.
pub trait Clock {
    fn now_seconds(&mut self) -> f64;
}

/// Wall clock measured from construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_seconds(&mut self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Virtual clock that moves forward by a fixed step on every reading.
#[derive(Debug, Clone, Copy)]
pub struct FixedStepClock {
    step: f64,
    readings: u64,
}

impl FixedStepClock {
    pub fn new(step: f64) -> Self {
        Self { step, readings: 0 }
    }

    pub fn at_rate(frames_per_second: f64) -> Self {
        Self::new(1.0 / frames_per_second)
    }
}

impl Clock for FixedStepClock {
    fn now_seconds(&mut self) -> f64 {
        let now = self.readings as f64 * self.step;
        self.readings += 1;
        now
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    /// Axis-aligned square centered on `center` with side `size`.
    Square { center: [f32; 2], size: f32 },
    Disc { center: [f32; 2], radius: f32 },
}

pub trait Surface {
    fn clear(&mut self, color: Rgba);
    fn draw_filled(&mut self, shape: Shape, color: Rgba);
    fn present(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sprite {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub color: Rgba,
}

/// Everything one frame draws, in paint order.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameSnapshot {
    pub background: Rgba,
    /// Particles, oldest first so newer ones land on top.
    pub particles: Vec<Sprite>,
    /// Attractor discs, drawn after the particles.
    pub markers: Vec<Sprite>,
}

impl FrameSnapshot {
    pub fn draw<S: Surface + ?Sized>(&self, surface: &mut S) {
        surface.clear(self.background);
        for sprite in &self.particles {
            surface.draw_filled(
                Shape::Square {
                    center: [sprite.x, sprite.y],
                    size: sprite.size,
                },
                sprite.color,
            );
        }
        for marker in &self.markers {
            surface.draw_filled(
                Shape::Disc {
                    center: [marker.x, marker.y],
                    radius: marker.size,
                },
                marker.color,
            );
        }
        surface.present();
    }
}

/// Surface that only counts calls, for headless runs and tests.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CountingSurface {
    pub clears: u64,
    pub draws: u64,
    pub presents: u64,
    pub last_clear: Option<Rgba>,
}

impl Surface for CountingSurface {
    fn clear(&mut self, color: Rgba) {
        self.clears += 1;
        self.last_clear = Some(color);
    }

    fn draw_filled(&mut self, _shape: Shape, _color: Rgba) {
        self.draws += 1;
    }

    fn present(&mut self) {
        self.presents += 1;
    }
}
