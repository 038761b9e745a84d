//! Dimension abstraction shared by the 2D and pseudo-3D variants.
//!
//! Every simulated quantity is a `cgmath` vector. [`Space`] adds the few
//! operations the engine needs on top of `InnerSpace` and `Array`: building a
//! point from orbit coordinates, rotating inside the drawing plane, and mapping
//! to the screen.

use std::fmt::Debug;

use cgmath::prelude::*;
use cgmath::{Vector2, Vector3};

use crate::projection::{Projection, ScreenPoint};

pub trait Space:
    InnerSpace<Scalar = f32>
    + Array<Element = f32>
    + Copy
    + Debug
    + PartialEq
    + Send
    + Sync
    + 'static
{
    const DIMENSION: usize;

    /// Reads a vector from a config slice; `None` when the length is wrong.
    fn from_slice(values: &[f32]) -> Option<Self>;

    /// Builds a point in the drawing plane. 2D ignores `depth`.
    fn planar(x: f32, y: f32, depth: f32) -> Self;

    /// Rotates the x/y components by `angle` radians, leaving depth untouched.
    fn rotate_planar(self, angle: f32) -> Self;

    /// Maps a world position to a drawing coordinate and size.
    fn to_screen(self, projection: &Projection, size: f32) -> ScreenPoint;
}

fn rotate(x: f32, y: f32, angle: f32) -> (f32, f32) {
    let (sin, cos) = angle.sin_cos();
    (x * cos - y * sin, x * sin + y * cos)
}

impl Space for Vector2<f32> {
    const DIMENSION: usize = 2;

    fn from_slice(values: &[f32]) -> Option<Self> {
        match values {
            [x, y] => Some(cgmath::vec2(*x, *y)),
            _ => None,
        }
    }

    fn planar(x: f32, y: f32, _depth: f32) -> Self {
        cgmath::vec2(x, y)
    }

    fn rotate_planar(self, angle: f32) -> Self {
        let (x, y) = rotate(self.x, self.y, angle);
        cgmath::vec2(x, y)
    }

    fn to_screen(self, _projection: &Projection, size: f32) -> ScreenPoint {
        ScreenPoint {
            x: self.x,
            y: self.y,
            size,
        }
    }
}

impl Space for Vector3<f32> {
    const DIMENSION: usize = 3;

    fn from_slice(values: &[f32]) -> Option<Self> {
        match values {
            [x, y, z] => Some(cgmath::vec3(*x, *y, *z)),
            _ => None,
        }
    }

    fn planar(x: f32, y: f32, depth: f32) -> Self {
        cgmath::vec3(x, y, depth)
    }

    fn rotate_planar(self, angle: f32) -> Self {
        let (x, y) = rotate(self.x, self.y, angle);
        cgmath::vec3(x, y, self.z)
    }

    fn to_screen(self, projection: &Projection, size: f32) -> ScreenPoint {
        projection.project(self, size)
    }
}

/// Rescales `velocity` onto the `max_speed` sphere when it lies outside it.
pub fn cap_speed<V: Space>(velocity: V, max_speed: f32) -> V {
    let speed2 = velocity.magnitude2();
    if speed2 > max_speed * max_speed && speed2 > 0.0 {
        velocity * (max_speed / speed2.sqrt())
    } else {
        velocity
    }
}

/// Axis-aligned rectangular (or box) domain used for boundary reflection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds<V> {
    pub min: V,
    pub max: V,
}

impl<V: Space> Bounds<V> {
    pub fn new(min: V, max: V) -> Self {
        Self { min, max }
    }

    /// True when every axis has a strictly positive extent.
    pub fn is_valid(&self) -> bool {
        (0..V::DIMENSION).all(|i| self.min[i] < self.max[i])
    }

    pub fn center(&self) -> V {
        (self.min + self.max) * 0.5
    }

    pub fn contains(&self, position: V) -> bool {
        (0..V::DIMENSION).all(|i| position[i] >= self.min[i] && position[i] <= self.max[i])
    }

    /// Clamps `position` onto the domain and turns the outward velocity
    /// component of every violated axis inward. Returns whether any axis hit.
    pub fn reflect(&self, position: &mut V, velocity: &mut V) -> bool {
        let mut hit = false;
        for i in 0..V::DIMENSION {
            if position[i] < self.min[i] {
                position[i] = self.min[i];
                velocity[i] = velocity[i].abs();
                hit = true;
            } else if position[i] > self.max[i] {
                position[i] = self.max[i];
                velocity[i] = -velocity[i].abs();
                hit = true;
            }
        }
        hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{vec2, vec3};

    #[test]
    fn cap_speed_rescales_to_limit() {
        let v = cap_speed(vec2(30.0f32, 40.0), 10.0);
        assert!((v.magnitude() - 10.0).abs() < 1e-4);
        assert!((v.x / v.y - 0.75).abs() < 1e-5, "direction must be preserved");
    }

    #[test]
    fn cap_speed_leaves_slow_vectors_alone() {
        assert_eq!(cap_speed(vec2(1.0f32, 1.0), 10.0), vec2(1.0, 1.0));
        assert_eq!(cap_speed(vec2(0.0f32, 0.0), 0.0), vec2(0.0, 0.0));
    }

    #[test]
    fn reflect_clamps_and_negates_outward_component() {
        let bounds = Bounds::new(vec2(0.0f32, 0.0), vec2(100.0, 50.0));
        let mut p = vec2(104.0f32, 20.0);
        let mut v = vec2(8.0f32, -3.0);
        assert!(bounds.reflect(&mut p, &mut v));
        assert_eq!(p, vec2(100.0, 20.0));
        assert_eq!(v, vec2(-8.0, -3.0));
    }

    #[test]
    fn reflect_handles_corners_in_3d() {
        let bounds = Bounds::new(vec3(-1.0f32, -1.0, 1.0), vec3(1.0, 1.0, 10.0));
        let mut p = vec3(-3.0f32, 2.0, 0.5);
        let mut v = vec3(-1.0f32, 1.0, -2.0);
        bounds.reflect(&mut p, &mut v);
        assert_eq!(p, vec3(-1.0, 1.0, 1.0));
        assert_eq!(v, vec3(1.0, -1.0, 2.0));
        assert!(bounds.contains(p));
    }

    #[test]
    fn rotate_planar_keeps_depth() {
        let v = vec3(1.0f32, 0.0, 7.0).rotate_planar(std::f32::consts::FRAC_PI_2);
        assert!(v.x.abs() < 1e-6);
        assert!((v.y - 1.0).abs() < 1e-6);
        assert_eq!(v.z, 7.0);
    }

    #[test]
    fn from_slice_checks_dimension() {
        assert!(Vector2::<f32>::from_slice(&[1.0, 2.0, 3.0]).is_none());
        assert_eq!(Vector3::<f32>::from_slice(&[1.0, 2.0, 3.0]), Some(vec3(1.0, 2.0, 3.0)));
    }
}
