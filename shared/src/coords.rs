//! Mapping between the fixed logical world and an arbitrary render surface
//!
//! Both axes scale independently, so a surface with a different aspect ratio
//! stretches the world instead of letterboxing it. Scalar lengths (radii, line
//! widths, distances) use the horizontal factor.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn scale(self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Rescales to exactly `max` when longer than `max`, otherwise unchanged
    pub fn clamp_length(self, max: f32) -> Self {
        let length = self.length();
        if length > max && length > 0.0 {
            self.scale(max / length)
        } else {
            self
        }
    }

    /// Same direction with the given magnitude, `None` for the zero vector
    pub fn with_length(self, length: f32) -> Option<Self> {
        let current = self.length();
        if current > 0.0 {
            Some(self.scale(length / current))
        } else {
            None
        }
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x - other.x, self.y - other.y)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// A surface with no area cannot be mapped to or from
    pub fn is_degenerate(self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

pub fn to_world(point: Vec2, render: Size, world: Size) -> Vec2 {
    Vec2::new(
        point.x * world.width / render.width,
        point.y * world.height / render.height,
    )
}

pub fn to_render(point: Vec2, render: Size, world: Size) -> Vec2 {
    Vec2::new(
        point.x * render.width / world.width,
        point.y * render.height / world.height,
    )
}

pub fn length_to_render(length: f32, render: Size, world: Size) -> f32 {
    length * render.width / world.width
}

pub fn length_to_world(length: f32, render: Size, world: Size) -> f32 {
    length * world.width / render.width
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    const WORLD: Size = Size {
        width: 1920.0,
        height: 1080.0,
    };

    #[test]
    fn test_identity_when_sizes_match() {
        let p = Vec2::new(123.0, 456.0);
        assert_eq!(to_world(p, WORLD, WORLD), p);
        assert_eq!(to_render(p, WORLD, WORLD), p);
    }

    #[test]
    fn test_half_size_surface() {
        let render = Size::new(960.0, 540.0);
        let world = to_world(Vec2::new(700.0, 250.0), render, WORLD);
        assert_approx_eq!(world.x, 1400.0);
        assert_approx_eq!(world.y, 500.0);
    }

    #[test]
    fn test_non_square_surface_stretches() {
        let render = Size::new(1000.0, 1000.0);
        let mapped = to_render(Vec2::new(1920.0, 1080.0), render, WORLD);
        assert_approx_eq!(mapped.x, 1000.0);
        assert_approx_eq!(mapped.y, 1000.0);
    }

    #[test]
    fn test_round_trip_across_sizes() {
        let surfaces = [
            Size::new(800.0, 600.0),
            Size::new(1280.0, 720.0),
            Size::new(333.0, 1777.0),
            Size::new(3840.0, 2160.0),
        ];
        let points = [
            Vec2::new(0.0, 0.0),
            Vec2::new(500.0, 500.0),
            Vec2::new(1919.5, 1079.25),
            Vec2::new(-40.0, 2000.0),
        ];

        for render in surfaces {
            for p in points {
                let back = to_world(to_render(p, render, WORLD), render, WORLD);
                assert_approx_eq!(back.x, p.x, 1e-2);
                assert_approx_eq!(back.y, p.y, 1e-2);
            }
        }
    }

    #[test]
    fn test_length_scaling_uses_horizontal_factor() {
        let render = Size::new(960.0, 1080.0);
        assert_approx_eq!(length_to_render(30.0, render, WORLD), 15.0);
        assert_approx_eq!(length_to_world(15.0, render, WORLD), 30.0);
    }

    #[test]
    fn test_clamp_length() {
        let v = Vec2::new(900.0, 0.0).clamp_length(800.0);
        assert_approx_eq!(v.x, 800.0);
        assert_approx_eq!(v.y, 0.0);

        let short = Vec2::new(3.0, 4.0);
        assert_eq!(short.clamp_length(800.0), short);
    }

    #[test]
    fn test_with_length() {
        let v = Vec2::new(3.0, 4.0).with_length(10.0).unwrap();
        assert_approx_eq!(v.x, 6.0);
        assert_approx_eq!(v.y, 8.0);
        assert!(Vec2::ZERO.with_length(10.0).is_none());
    }

    #[test]
    fn test_degenerate_size() {
        assert!(Size::new(0.0, 100.0).is_degenerate());
        assert!(Size::new(100.0, -1.0).is_degenerate());
        assert!(!Size::new(1.0, 1.0).is_degenerate());
    }
}
