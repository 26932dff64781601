//! Spatial and common types

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// An axis-aligned 2D rectangle, stored as min/max corners.
///
/// Serialized as `[min_x, min_y, max_x, max_y]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub const ZERO: Self = Self {
        min: Vec2::ZERO,
        max: Vec2::ZERO,
    };

    pub const fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min: Vec2::new(min_x, min_y),
            max: Vec2::new(max_x, max_y),
        }
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// True if the rectangle covers no area (all points collapse to `min`)
    pub fn is_empty(&self) -> bool {
        self.max.x <= self.min.x && self.max.y <= self.min.y
    }

    /// Inclusive containment test
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

impl From<[f32; 4]> for Rect {
    fn from(v: [f32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<Rect> for [f32; 4] {
    fn from(r: Rect) -> Self {
        [r.min.x, r.min.y, r.max.x, r.max.y]
    }
}

/// One of the 8 grid directions. Screen space: +y points down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dir {
    #[default]
    N,
    S,
    E,
    W,
    NE,
    NW,
    SE,
    SW,
}

impl Dir {
    pub const ALL: [Dir; 8] = [
        Dir::N,
        Dir::S,
        Dir::E,
        Dir::W,
        Dir::NE,
        Dir::NW,
        Dir::SE,
        Dir::SW,
    ];

    /// Unnormalized grid offset (diagonals have length sqrt(2))
    pub fn to_vec(self) -> Vec2 {
        match self {
            Dir::N => Vec2::new(0.0, -1.0),
            Dir::S => Vec2::new(0.0, 1.0),
            Dir::E => Vec2::new(1.0, 0.0),
            Dir::W => Vec2::new(-1.0, 0.0),
            Dir::NE => Vec2::new(1.0, -1.0),
            Dir::NW => Vec2::new(-1.0, -1.0),
            Dir::SE => Vec2::new(1.0, 1.0),
            Dir::SW => Vec2::new(-1.0, 1.0),
        }
    }
}

/// Color from 8-bit channels, as linear `[0, 1]` rgb
pub fn rgb8(r: u8, g: u8, b: u8) -> Vec3 {
    Vec3::new(r as f32, g as f32, b as f32) / 255.0
}

/// Unit vector for an angle in radians (0 = +x, pi/2 = +y)
pub fn angle_to_vector(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Inverse of [`angle_to_vector`]; zero vector maps to 0
pub fn vector_to_angle(v: Vec2) -> f32 {
    if v == Vec2::ZERO {
        0.0
    } else {
        v.y.atan2(v.x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_array_roundtrip() {
        let r = Rect::new(-3.0, 3.0, 3.0, 4.0);
        let arr: [f32; 4] = r.into();
        assert_eq!(arr, [-3.0, 3.0, 3.0, 4.0]);
        assert_eq!(Rect::from(arr), r);
        assert_eq!(r.size(), Vec2::new(6.0, 1.0));
    }

    #[test]
    fn test_rect_empty_and_contains() {
        assert!(Rect::ZERO.is_empty());
        let r = Rect::new(-5.0, -5.0, 5.0, 5.0);
        assert!(!r.is_empty());
        assert!(r.contains(Vec2::ZERO));
        assert!(!r.contains(Vec2::new(6.0, 0.0)));
    }

    #[test]
    fn test_rect_from_toml() {
        #[derive(Deserialize)]
        struct Holder {
            source: Rect,
        }
        let h: Holder = toml::from_str("source = [-2.0, -8.0, 2.0, -5.0]").unwrap();
        assert_eq!(h.source, Rect::new(-2.0, -8.0, 2.0, -5.0));
    }

    #[test]
    fn test_dir_vectors() {
        assert_eq!(Dir::N.to_vec(), Vec2::new(0.0, -1.0));
        assert_eq!(Dir::SW.to_vec(), Vec2::new(-1.0, 1.0));
        for d in Dir::ALL {
            assert!(d.to_vec().length() >= 1.0);
        }
    }

    #[test]
    fn test_color_helpers() {
        let c = rgb8(255, 136, 68);
        assert!((c.y - 0.533).abs() < 0.01);
        assert!((c.z - 0.267).abs() < 0.01);
        assert_eq!(rgb8(255, 0, 0), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_angle_helpers() {
        let v = angle_to_vector(std::f32::consts::FRAC_PI_2);
        assert!(v.x.abs() < 1e-6);
        assert!((v.y - 1.0).abs() < 1e-6);
        let a = vector_to_angle(Vec2::new(-1.0, 0.0));
        assert!((a - std::f32::consts::PI).abs() < 1e-6);
        assert_eq!(vector_to_angle(Vec2::ZERO), 0.0);
    }
}
