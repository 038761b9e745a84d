//! Perspective divide for the pseudo-3D variant.

use cgmath::Vector3;

/// Drawing coordinate and size of one particle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
    pub size: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    pub width: f32,
    pub height: f32,
    /// Depths below this are raised to it before dividing, so a point that
    /// crosses the camera plane lands far off-screen instead of flipping sign.
    pub min_depth: f32,
}

impl Projection {
    pub const DEFAULT_MIN_DEPTH: f32 = 0.05;

    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            min_depth: Self::DEFAULT_MIN_DEPTH,
        }
    }

    pub fn project(&self, position: Vector3<f32>, size: f32) -> ScreenPoint {
        let z = position.z.max(self.min_depth);
        ScreenPoint {
            x: position.x * self.width / z + self.width * 0.5,
            y: position.y * self.height / z + self.height * 0.5,
            size: (size / z).max(1.0),
        }
    }
}
