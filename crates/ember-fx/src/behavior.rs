//! Per-sub-system behavior hooks and the default stepping behavior
//!
//! Every sub-system is stepped by the same generic algorithm, which calls out
//! to four extension points:
//! - prepare: compute the emission frequency and per-step emitter parameters
//! - emit: initialize one new particle
//! - animate: advance one particle by a sub-step
//! - draw: turn one particle into a quad record
//!
//! A [`Behavior`] carries an optional override for each. Overrides replace the
//! default for that sub-system only; they may call the `default_*` functions
//! to augment rather than replace.

use crate::defs::{EmitterDef, ParticleDef, SubSystemDef};
use crate::quads::DrawParticle;
use crate::rand::ParticleRng;
use crate::system::{Particle, ParticleSystem, SubSystem};
use ember_core::{angle_to_vector, UVec2, Vec2};
use std::collections::HashMap;
use std::f32::consts::TAU;
use std::fmt;
use std::sync::Arc;

/// Read view of a system while one of its sub-systems is being stepped.
///
/// The stepped sub-system's own particle list is detached for the duration
/// of the step; counters such as `total_particles` remain readable via [`AnimationContext::ss`].
pub struct AnimationContext<'a> {
    pub ps: &'a ParticleSystem,
    pub ssid: usize,
    pub ssdef: &'a SubSystemDef,
    pub pdef: &'a ParticleDef,
    pub edef: &'a EmitterDef,
    /// Length of the current fixed sub-step, in seconds
    pub time_delta: f32,
    pub rand: &'a mut ParticleRng,
}

impl<'a> AnimationContext<'a> {
    pub fn ss(&self) -> &'a SubSystem {
        &self.ps.sub_systems[self.ssid]
    }

    /// Uniform float in [min, max)
    pub fn uniform(&mut self, min: f32, max: f32) -> f32 {
        self.rand.range(min, max)
    }
}

/// Read view of a system while its quads are generated
pub struct DrawContext<'a> {
    pub ps: &'a ParticleSystem,
    pub ssid: usize,
    pub pdef: &'a ParticleDef,
}

/// Emitter parameters for one sub-step, filled by the prepare stage and
/// consumed by the emit stage
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EmissionState {
    pub strength_min: f32,
    pub strength_max: f32,
    pub angle: f32,
    pub angle_spread: f32,
    pub rotation_speed_min: f32,
    pub rotation_speed_max: f32,
    /// Life assigned to new particles
    pub max_life: f32,
}

pub type PrepareFn = dyn Fn(&mut AnimationContext<'_>, &mut EmissionState) -> f32 + Send + Sync;
pub type EmitFn = dyn Fn(&mut AnimationContext<'_>, &EmissionState, &mut Particle) + Send + Sync;
pub type AnimateFn = dyn Fn(&mut AnimationContext<'_>, &mut Particle) + Send + Sync;
pub type DrawFn = dyn Fn(&DrawContext<'_>, &Particle, &mut DrawParticle) + Send + Sync;

/// Optional overrides for the four stepping stages of one sub-system
#[derive(Clone, Default)]
pub struct Behavior {
    pub prepare: Option<Arc<PrepareFn>>,
    pub emit: Option<Arc<EmitFn>>,
    pub animate: Option<Arc<AnimateFn>>,
    pub draw: Option<Arc<DrawFn>>,
}

impl Behavior {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_prepare(
        mut self,
        f: impl Fn(&mut AnimationContext<'_>, &mut EmissionState) -> f32 + Send + Sync + 'static,
    ) -> Self {
        self.prepare = Some(Arc::new(f));
        self
    }

    pub fn on_emit(
        mut self,
        f: impl Fn(&mut AnimationContext<'_>, &EmissionState, &mut Particle) + Send + Sync + 'static,
    ) -> Self {
        self.emit = Some(Arc::new(f));
        self
    }

    pub fn on_animate(
        mut self,
        f: impl Fn(&mut AnimationContext<'_>, &mut Particle) + Send + Sync + 'static,
    ) -> Self {
        self.animate = Some(Arc::new(f));
        self
    }

    pub fn on_draw(
        mut self,
        f: impl Fn(&DrawContext<'_>, &Particle, &mut DrawParticle) + Send + Sync + 'static,
    ) -> Self {
        self.draw = Some(Arc::new(f));
        self
    }

    pub fn is_default(&self) -> bool {
        self.prepare.is_none() && self.emit.is_none() && self.animate.is_none() && self.draw.is_none()
    }

    pub(crate) fn prepare_emission(
        &self,
        ctx: &mut AnimationContext<'_>,
        em: &mut EmissionState,
    ) -> f32 {
        match &self.prepare {
            Some(f) => f(ctx, em),
            None => default_prepare_emission(ctx, em),
        }
    }

    pub(crate) fn emit_particle(
        &self,
        ctx: &mut AnimationContext<'_>,
        em: &EmissionState,
        p: &mut Particle,
    ) {
        match &self.emit {
            Some(f) => f(ctx, em, p),
            None => default_emit_particle(ctx, em, p),
        }
    }

    pub(crate) fn animate_particle(&self, ctx: &mut AnimationContext<'_>, p: &mut Particle) {
        match &self.animate {
            Some(f) => f(ctx, p),
            None => default_animate_particle(ctx, p),
        }
    }

    pub(crate) fn draw_particle(&self, ctx: &DrawContext<'_>, p: &Particle, out: &mut DrawParticle) {
        match &self.draw {
            Some(f) => f(ctx, p, out),
            None => default_draw_particle(ctx, p, out),
        }
    }
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Behavior")
            .field("prepare", &self.prepare.is_some())
            .field("emit", &self.emit.is_some())
            .field("animate", &self.animate.is_some())
            .field("draw", &self.draw.is_some())
            .finish()
    }
}

/// Copies the emitter's parameters into `em` and returns the emitter
/// frequency sampled at the current position inside the emission window.
pub fn default_prepare_emission(ctx: &mut AnimationContext<'_>, em: &mut EmissionState) -> f32 {
    let edef = ctx.edef;
    let window = ctx.ssdef.emission_length();
    let em_time = if window > 0.0 {
        ((ctx.ps.anim_time - ctx.ssdef.emission_start) / window).clamp(0.0, 1.0)
    } else {
        0.0
    };

    *em = EmissionState {
        strength_min: edef.strength_min,
        strength_max: edef.strength_max,
        angle: edef.angle,
        angle_spread: edef.angle_spread,
        rotation_speed_min: edef.rotation_speed_min,
        rotation_speed_max: edef.rotation_speed_max,
        max_life: ctx.pdef.life,
    };
    edef.frequency.sample(em_time)
}

/// Random position inside the emitter's source rect, random direction within
/// the spread, random strength, rotation and tile.
pub fn default_emit_particle(ctx: &mut AnimationContext<'_>, em: &EmissionState, p: &mut Particle) {
    let source = ctx.edef.source;
    let tiles = ctx.pdef.texture_tiles;
    let rand = &mut *ctx.rand;

    let pos = rand.point_in(&source);
    let angle = em.angle + rand.spread(em.angle_spread);
    let strength = rand.range(em.strength_min, em.strength_max);
    let rot = rand.range(0.0, TAU);
    let rot_speed = rand.range(em.rotation_speed_min, em.rotation_speed_max);
    let tex_tile = UVec2::new(rand.below(tiles.x), rand.below(tiles.y));

    *p = Particle {
        pos,
        movement: angle_to_vector(angle) * strength,
        size: Vec2::ONE,
        rot,
        rot_speed,
        life: 0.0,
        max_life: em.max_life,
        tex_tile,
    };
}

/// Integrates position and rotation, applies slowdown damping and ages the particle.
pub fn default_animate_particle(ctx: &mut AnimationContext<'_>, p: &mut Particle) {
    let dt = ctx.time_delta;
    let slowdown = 1.0 / (1.0 + ctx.pdef.slowdown.sample(p.particle_time()).max(0.0));

    p.pos += p.movement * dt;
    p.movement *= slowdown.powf(dt);
    p.rot += p.rot_speed * dt;
    p.life += dt;
}

/// Samples the appearance curves at the particle's life-fraction.
pub fn default_draw_particle(ctx: &DrawContext<'_>, p: &Particle, out: &mut DrawParticle) {
    let pdef = ctx.pdef;
    let ptime = p.particle_time();
    let tiles = pdef.texture_tiles.max(UVec2::ONE);

    let tex_tile = if pdef.animate_tiles {
        let count = tiles.x.saturating_mul(tiles.y);
        let idx = ((ptime * count as f32) as u32).min(count - 1);
        UVec2::new(idx % tiles.x, idx / tiles.x)
    } else {
        p.tex_tile.min(tiles - UVec2::ONE)
    };

    *out = DrawParticle {
        position: ctx.ps.pos + p.pos,
        size: p.size * pdef.size.sample(ptime),
        rotation: p.rot,
        color: pdef.color.sample(ptime).extend(pdef.alpha.sample(ptime)),
        texture: pdef.texture,
        tex_tile,
        tex_tiles: tiles,
    };
}

/// Named behaviors that data-driven effect files can refer to
#[derive(Debug, Clone, Default)]
pub struct BehaviorLibrary {
    behaviors: HashMap<String, Behavior>,
}

impl BehaviorLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// The behaviors used by the built-in effects
    pub fn builtin() -> Self {
        crate::catalog::builtin_behaviors()
    }

    pub fn insert(&mut self, name: impl Into<String>, behavior: Behavior) {
        self.behaviors.insert(name.into(), behavior);
    }

    pub fn get(&self, name: &str) -> Option<&Behavior> {
        self.behaviors.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.behaviors.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.behaviors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
