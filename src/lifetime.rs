//! Age-based fade and the shared color oscillator.
//!
//! Neither depends on attractor state: alpha is a function of a particle's
//! age alone, color a function of the clock alone.

use std::f32::consts::TAU;

use crate::pool::Particle;
use crate::space::Space;

/// Linear fade from `scale` at birth to zero at `lifetime` seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fade {
    pub lifetime: f32,
    /// Peak opacity.
    pub scale: f32,
}

impl Fade {
    pub fn alpha_at(&self, age: f32) -> f32 {
        (self.scale * (1.0 - age / self.lifetime)).clamp(0.0, self.scale)
    }

    pub fn alpha<V: Space>(&self, particle: &Particle<V>, now: f32) -> f32 {
        self.alpha_at(particle.age(now))
    }

    /// Retired particles are skipped by the renderer; their slots stay put
    /// until the ring buffer comes back around.
    pub fn is_visible<V: Space>(&self, particle: &Particle<V>, now: f32) -> bool {
        self.alpha(particle, now) > 0.0
    }
}

/// Normalized RGBA, every channel in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba(pub [f32; 4]);

impl Rgba {
    pub const BLACK: Rgba = Rgba([0.0, 0.0, 0.0, 1.0]);

    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Rgba([r, g, b, 1.0])
    }

    pub fn with_alpha(self, alpha: f32) -> Self {
        let [r, g, b, _] = self.0;
        Rgba([r, g, b, alpha])
    }

    pub fn alpha(&self) -> f32 {
        self.0[3]
    }
}

/// Three sine waves a third of a turn apart, each mapped to `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette {
    /// Radians per second of the shared oscillator.
    pub rate: f32,
    /// Phase added per stream index so streams drift apart in hue.
    pub stream_offset: f32,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            rate: 1.0,
            stream_offset: 0.0,
        }
    }
}

impl Palette {
    pub fn color(&self, now: f32, stream: usize) -> Rgba {
        let t = now * self.rate + stream as f32 * self.stream_offset;
        let channel = |shift: f32| 0.5 + 0.5 * (t + shift).sin();
        Rgba::rgb(channel(0.0), channel(TAU / 3.0), channel(TAU * 2.0 / 3.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FADE: Fade = Fade {
        lifetime: 5.0,
        scale: 0.4,
    };

    #[test]
    fn alpha_halfway_and_after_death() {
        assert!((FADE.alpha_at(2.5) - 0.2).abs() < 1e-6);
        assert_eq!(FADE.alpha_at(6.0), 0.0);
        assert_eq!(FADE.alpha_at(0.0), 0.4);
    }

    #[test]
    fn alpha_never_exceeds_scale_for_future_births() {
        assert_eq!(FADE.alpha_at(-3.0), 0.4);
    }

    #[test]
    fn palette_channels_are_normalized_and_phase_shifted() {
        let palette = Palette::default();
        let Rgba([r, g, b, a]) = palette.color(0.0, 0);
        assert!((r - 0.5).abs() < 1e-6);
        assert!((g - (0.5 + 0.5 * (TAU / 3.0).sin())).abs() < 1e-6);
        assert!((b - (0.5 + 0.5 * (TAU * 2.0 / 3.0).sin())).abs() < 1e-6);
        assert_eq!(a, 1.0);

        for i in 0..100 {
            let Rgba(c) = palette.color(i as f32 * 0.37, i);
            assert!(c.iter().all(|v| (0.0..=1.0).contains(v)));
        }
    }

    #[test]
    fn stream_offset_shifts_phase() {
        let palette = Palette {
            rate: 2.0,
            stream_offset: 1.0,
        };
        assert_eq!(palette.color(0.5, 1), palette.color(1.0, 0));
    }
}
