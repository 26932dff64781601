//! Lightweight seedable xorshift32 PRNG, so whole simulations replay exactly

use ember_core::{Rect, Vec2};

#[derive(Debug, Clone)]
pub struct ParticleRng {
    state: u32,
}

impl ParticleRng {
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Returns a float in [0, 1)
    pub fn next_f32(&mut self) -> f32 {
        // 24 mantissa bits keep the result strictly below 1.0
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }

    /// Returns a float in [min, max); `min` when the range is empty
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }

    /// Returns a float in [-spread, spread)
    pub fn spread(&mut self, spread: f32) -> f32 {
        self.range(-spread, spread)
    }

    /// Returns an integer in [0, count); 0 when `count` is 0
    pub fn below(&mut self, count: u32) -> u32 {
        if count == 0 {
            return 0;
        }
        self.next_u32() % count
    }

    /// Uniform point inside `rect`; degenerate rects return their corner
    pub fn point_in(&mut self, rect: &Rect) -> Vec2 {
        Vec2::new(
            self.range(rect.min.x, rect.max.x),
            self.range(rect.min.y, rect.max.y),
        )
    }
}

impl Default for ParticleRng {
    fn default() -> Self {
        Self::new(0xDEAD_BEEF)
    }
}
