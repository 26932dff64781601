//! Key-framed value-over-time curves with selectable interpolation kernels
//!
//! A curve maps a normalized time `t` in [0, 1] (usually a particle's
//! life-fraction or an emitter's window-fraction) to a value. Keys are sorted
//! time-fractions; values outside the key range clamp to the first/last value.

use ember_core::{EmberError, Result, Vec2, Vec3};
use serde::Deserialize;
use std::f32::consts::PI;
use std::fmt;

/// How to blend between two neighbouring keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpKind {
    /// Straight blend
    #[default]
    Linear,
    /// Half-cosine ease in/out of the blend factor
    Cosine,
    /// Blend factor squared (slow start)
    Quadratic,
}

impl InterpKind {
    /// Remap a segment-local blend factor in [0, 1]
    pub fn remap(self, t: f32) -> f32 {
        match self {
            InterpKind::Linear => t,
            InterpKind::Cosine => (1.0 - (t * PI).cos()) * 0.5,
            InterpKind::Quadratic => t * t,
        }
    }
}

/// Values a curve can carry: scalars, 2D vectors and rgb colors
pub trait CurveValue: Copy + Default + PartialEq + fmt::Debug {
    fn lerp(a: Self, b: Self, t: f32) -> Self;
}

impl CurveValue for f32 {
    fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }
}

impl CurveValue for Vec2 {
    fn lerp(a: Vec2, b: Vec2, t: f32) -> Vec2 {
        a + (b - a) * t
    }
}

impl CurveValue for Vec3 {
    fn lerp(a: Vec3, b: Vec3, t: f32) -> Vec3 {
        a + (b - a) * t
    }
}

/// A sampled value-over-time curve.
///
/// In TOML a curve is either a bare value (constant), an array of values
/// (evenly spaced linear keys), or a table `{ keys = [..], values = [..], interp = ".." }`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(
    try_from = "CurveRepr<T>",
    bound(deserialize = "T: CurveValue + Deserialize<'de>")
)]
pub struct Curve<T> {
    keys: Vec<f32>,
    values: Vec<T>,
    interp: InterpKind,
}

impl<T: CurveValue> Curve<T> {
    /// A curve that returns `value` for every `t`
    pub fn constant(value: T) -> Self {
        Self {
            keys: vec![0.0],
            values: vec![value],
            interp: InterpKind::Linear,
        }
    }

    /// Values placed at evenly spaced keys over [0, 1]
    pub fn new(values: Vec<T>, interp: InterpKind) -> Self {
        let keys = even_keys(values.len());
        Self {
            keys,
            values,
            interp,
        }
    }

    /// Explicit key positions.
    ///
    /// # Panics
    ///
    /// Panics if `keys` and `values` differ in length or keys are unsorted;
    /// use [`Curve::try_with_keys`] for data that has not been checked.
    pub fn with_keys(keys: Vec<f32>, values: Vec<T>, interp: InterpKind) -> Self {
        match Self::try_with_keys(keys, values, interp) {
            Ok(curve) => curve,
            Err(err) => panic!("{err}"),
        }
    }

    pub fn try_with_keys(keys: Vec<f32>, values: Vec<T>, interp: InterpKind) -> Result<Self> {
        let curve = Self {
            keys,
            values,
            interp,
        };
        curve.validate()?;
        Ok(curve)
    }

    /// Check key/value pairing and key ordering
    pub fn validate(&self) -> Result<()> {
        if self.keys.len() != self.values.len() {
            return Err(EmberError::InvalidCurve(format!(
                "{} keys for {} values",
                self.keys.len(),
                self.values.len()
            )));
        }
        if self.keys.iter().any(|k| !k.is_finite()) {
            return Err(EmberError::InvalidCurve("non-finite key".into()));
        }
        if self.keys.windows(2).any(|w| w[1] < w[0]) {
            return Err(EmberError::InvalidCurve(format!(
                "keys are not sorted: {:?}",
                self.keys
            )));
        }
        Ok(())
    }

    pub fn keys(&self) -> &[f32] {
        &self.keys
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn interp(&self) -> InterpKind {
        self.interp
    }

    pub fn is_constant(&self) -> bool {
        self.values.len() <= 1
    }

    /// Evaluate at `t`. Out-of-range (and NaN) times clamp to the end keys;
    /// an empty curve yields `T::default()`.
    pub fn sample(&self, t: f32) -> T {
        match self.values.len() {
            0 => return T::default(),
            1 => return self.values[0],
            _ => {}
        }

        let keys = &self.keys;
        let last = keys.len() - 1;
        if !(t > keys[0]) {
            return self.values[0];
        }
        if t >= keys[last] {
            return self.values[last];
        }

        // First key strictly after t; keys[idx - 1] <= t < keys[idx]
        let idx = keys.partition_point(|&k| k <= t);
        let (k0, k1) = (keys[idx - 1], keys[idx]);
        let f = self.interp.remap((t - k0) / (k1 - k0));
        T::lerp(self.values[idx - 1], self.values[idx], f)
    }
}

impl<T: CurveValue> Default for Curve<T> {
    fn default() -> Self {
        Self::constant(T::default())
    }
}

impl<T: CurveValue> From<T> for Curve<T> {
    fn from(value: T) -> Self {
        Self::constant(value)
    }
}

impl<T: CurveValue> From<Vec<T>> for Curve<T> {
    fn from(values: Vec<T>) -> Self {
        Self::new(values, InterpKind::Linear)
    }
}

fn even_keys(count: usize) -> Vec<f32> {
    match count {
        0 => Vec::new(),
        1 => vec![0.0],
        n => (0..n).map(|i| i as f32 / (n - 1) as f32).collect(),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CurveRepr<T> {
    Constant(T),
    Values(Vec<T>),
    Keyed {
        #[serde(default)]
        keys: Vec<f32>,
        values: Vec<T>,
        #[serde(default)]
        interp: InterpKind,
    },
}

impl<T: CurveValue> TryFrom<CurveRepr<T>> for Curve<T> {
    type Error = EmberError;

    fn try_from(repr: CurveRepr<T>) -> Result<Self> {
        match repr {
            CurveRepr::Constant(v) => Ok(Self::constant(v)),
            CurveRepr::Values(values) => Ok(Self::new(values, InterpKind::Linear)),
            CurveRepr::Keyed {
                keys,
                values,
                interp,
            } => {
                if keys.is_empty() {
                    Ok(Self::new(values, interp))
                } else {
                    Self::try_with_keys(keys, values, interp)
                }
            }
        }
    }
}
