//! Effect templates: particle appearance, emitters and composite systems
//!
//! Templates are plain data. They are registered once in an
//! [`FxRegistry`](crate::FxRegistry) and never change afterwards.

use crate::behavior::Behavior;
use crate::curves::Curve;
use crate::texture::TextureName;
use ember_core::{EmberError, Rect, Result, UVec2, Vec3};
use serde::Deserialize;
use std::f32::consts::PI;

/// Handle of a registered [`ParticleDef`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticleDefId(pub(crate) u32);

/// Handle of a registered [`EmitterDef`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EmitterDefId(pub(crate) u32);

impl ParticleDefId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl EmitterDefId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// How a particle looks over its life. All curves are sampled at the
/// particle's life-fraction.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParticleDef {
    /// Life span in seconds
    pub life: f32,
    pub size: Curve<f32>,
    pub alpha: Curve<f32>,
    /// Linear rgb
    pub color: Curve<Vec3>,
    /// Movement damping; velocity decays by `1 / (1 + slowdown)` per second
    pub slowdown: Curve<f32>,
    pub texture: TextureName,
    /// Sprite-sheet grid (columns, rows); `1x1` for plain textures
    pub texture_tiles: UVec2,
    /// Step through all tiles over the particle's life instead of keeping
    /// the tile chosen at emission
    pub animate_tiles: bool,
}

impl Default for ParticleDef {
    fn default() -> Self {
        Self {
            life: 1.0,
            size: Curve::constant(1.0),
            alpha: Curve::constant(1.0),
            color: Curve::constant(Vec3::ONE),
            slowdown: Curve::constant(0.0),
            texture: TextureName::Circular,
            texture_tiles: UVec2::ONE,
            animate_tiles: false,
        }
    }
}

/// How and where particles are spawned
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmitterDef {
    /// Region (relative to the system position) new particles start in
    pub source: Rect,
    pub strength_min: f32,
    pub strength_max: f32,
    /// Emission direction in radians; +y points down
    pub angle: f32,
    /// Particles leave within `angle ± angle_spread`
    pub angle_spread: f32,
    pub rotation_speed_min: f32,
    pub rotation_speed_max: f32,
    /// Particles per second, sampled over the sub-system's emission window.
    /// Values at or above [`EmitterDef::INSTANT_FREQUENCY`] emit all
    /// remaining capacity at once.
    pub frequency: Curve<f32>,
    /// Added to the emission accumulator when the emission window opens
    pub initial_spawn_count: f32,
}

impl EmitterDef {
    pub const INSTANT_FREQUENCY: f32 = 999.0;
}

impl Default for EmitterDef {
    fn default() -> Self {
        Self {
            source: Rect::ZERO,
            strength_min: 0.0,
            strength_max: 0.0,
            angle: 0.0,
            angle_spread: PI,
            rotation_speed_min: 0.0,
            rotation_speed_max: 0.0,
            frequency: Curve::constant(0.0),
            initial_spawn_count: 0.0,
        }
    }
}

/// One particle+emitter pairing inside a composite system
#[derive(Debug, Clone)]
pub struct SubSystemDef {
    pub particle_id: ParticleDefId,
    pub emitter_id: EmitterDefId,
    /// Emission window `[start, end)` on the system's timeline, in seconds
    pub emission_start: f32,
    pub emission_end: f32,
    pub max_total_particles: usize,
    pub max_active_particles: usize,
    pub behavior: Behavior,
}

impl SubSystemDef {
    pub const DEFAULT_MAX_ACTIVE_PARTICLES: usize = 256;

    pub fn new(
        particle_id: ParticleDefId,
        emitter_id: EmitterDefId,
        emission_start: f32,
        emission_end: f32,
    ) -> Self {
        Self {
            particle_id,
            emitter_id,
            emission_start,
            emission_end,
            max_total_particles: usize::MAX,
            max_active_particles: Self::DEFAULT_MAX_ACTIVE_PARTICLES,
            behavior: Behavior::default(),
        }
    }

    pub fn with_max_total(mut self, count: usize) -> Self {
        self.max_total_particles = count;
        self
    }

    pub fn with_max_active(mut self, count: usize) -> Self {
        self.max_active_particles = count;
        self
    }

    pub fn with_behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = behavior;
        self
    }

    /// Window length in seconds (zero for an empty or inverted window)
    pub fn emission_length(&self) -> f32 {
        (self.emission_end - self.emission_start).max(0.0)
    }

    /// Whether `anim_time` lies inside the emission window.
    ///
    /// Times are compared with a small tolerance so that accumulated
    /// fixed steps landing a hair below a boundary count as reaching it.
    pub fn is_emitting(&self, anim_time: f32) -> bool {
        let t = anim_time + TIME_EPSILON;
        t >= self.emission_start && t < self.emission_end
    }
}

pub(crate) const TIME_EPSILON: f32 = 1e-4;

/// A named, spawnable effect made of one or more sub-systems.
///
/// Sub-systems are stepped in declaration order, so hooks of a later
/// sub-system can read the current-step state of an earlier one.
#[derive(Debug, Clone, Default)]
pub struct ParticleSystemDef {
    pub name: String,
    pub sub_systems: Vec<SubSystemDef>,
    /// Declared length in seconds; `None` means "until the last emission window closes"
    pub anim_length: Option<f32>,
    pub is_looped: bool,
}

impl ParticleSystemDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_sub_system(mut self, ssdef: SubSystemDef) -> Self {
        self.sub_systems.push(ssdef);
        self
    }

    pub fn looped(mut self, anim_length: f32) -> Self {
        self.is_looped = true;
        self.anim_length = Some(anim_length);
        self
    }

    pub fn effective_length(&self) -> f32 {
        self.anim_length.unwrap_or_else(|| {
            self.sub_systems
                .iter()
                .map(|ss| ss.emission_end)
                .fold(0.0, f32::max)
        })
    }

    /// Structural checks; handle validity is checked by the registry
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| EmberError::InvalidDefinition {
            name: self.name.clone(),
            reason,
        };
        if self.name.is_empty() {
            return Err(invalid("empty name".into()));
        }
        if self.sub_systems.is_empty() {
            return Err(invalid("no sub-systems".into()));
        }
        for (i, ss) in self.sub_systems.iter().enumerate() {
            if !(ss.emission_start.is_finite() && ss.emission_end.is_finite()) {
                return Err(invalid(format!("sub-system {i} has a non-finite window")));
            }
            if ss.emission_end < ss.emission_start {
                return Err(invalid(format!(
                    "sub-system {i} window ends before it starts ({} > {})",
                    ss.emission_start, ss.emission_end
                )));
            }
        }
        if let Some(len) = self.anim_length {
            if !(len.is_finite() && len >= 0.0) {
                return Err(invalid(format!("bad anim_length {len}")));
            }
        }
        if self.is_looped && self.effective_length() <= 0.0 {
            return Err(invalid("looped effect needs a positive length".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ss(start: f32, end: f32) -> SubSystemDef {
        SubSystemDef::new(ParticleDefId(0), EmitterDefId(0), start, end)
    }

    #[test]
    fn default_defs_are_sane() {
        let p = ParticleDef::default();
        assert!(p.life > 0.0);
        assert_eq!(p.texture_tiles, UVec2::ONE);
        let e = EmitterDef::default();
        assert!(e.strength_max >= e.strength_min);
        assert_eq!(e.frequency.sample(0.5), 0.0);
        let s = ss(0.0, 1.0);
        assert_eq!(s.max_total_particles, usize::MAX);
        assert_eq!(s.max_active_particles, SubSystemDef::DEFAULT_MAX_ACTIVE_PARTICLES);
    }

    #[test]
    fn emission_window_is_half_open() {
        let s = ss(0.5, 1.0);
        assert!(!s.is_emitting(0.3));
        assert!(s.is_emitting(0.5));
        assert!(s.is_emitting(0.49999));
        assert!(s.is_emitting(0.9));
        assert!(!s.is_emitting(1.0));
        assert!(!s.is_emitting(0.99999));
    }

    #[test]
    fn effective_length_defaults_to_last_window() {
        let def = ParticleSystemDef::new("multi")
            .with_sub_system(ss(0.0, 2.0))
            .with_sub_system(ss(1.5, 6.5));
        assert_eq!(def.effective_length(), 6.5);
        let looped = ParticleSystemDef::new("loop")
            .with_sub_system(ss(0.0, 1.0))
            .looped(3.0);
        assert_eq!(looped.effective_length(), 3.0);
    }

    #[test]
    fn validate_catches_structural_errors() {
        assert!(ParticleSystemDef::new("empty").validate().is_err());
        assert!(ParticleSystemDef::new("").with_sub_system(ss(0.0, 1.0)).validate().is_err());
        assert!(ParticleSystemDef::new("inverted")
            .with_sub_system(ss(1.0, 0.5))
            .validate()
            .is_err());
        assert!(ParticleSystemDef::new("ok")
            .with_sub_system(ss(0.0, 0.1))
            .validate()
            .is_ok());
    }

    #[test]
    fn parse_emitter_from_toml() {
        let toml_str = r#"
source = [-5.0, -5.0, 5.0, 5.0]
strength_min = 5.0
strength_max = 8.0
frequency = 60.0
"#;
        let e: EmitterDef = toml::from_str(toml_str).unwrap();
        assert_eq!(e.source, Rect::new(-5.0, -5.0, 5.0, 5.0));
        assert_eq!(e.frequency.sample(0.2), 60.0);
        assert_eq!(e.angle_spread, PI);
    }

    #[test]
    fn parse_particle_rejects_unknown_fields() {
        assert!(toml::from_str::<ParticleDef>("lief = 2.0").is_err());
        let p: ParticleDef = toml::from_str("life = 2.0\ntexture_tiles = [4, 1]").unwrap();
        assert_eq!(p.life, 2.0);
        assert_eq!(p.texture_tiles, UVec2::new(4, 1));
    }
}
