//! Live effect instances: particles, sub-system runtimes and system handles

use crate::defs::ParticleSystemDef;
use ember_core::{Dir, UVec2, Vec2};
use std::sync::Arc;

/// Simulation state of one particle. Positions are relative to the owning
/// system's spawn position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    pub movement: Vec2,
    /// Per-particle scale applied on top of the size curve
    pub size: Vec2,
    pub rot: f32,
    pub rot_speed: f32,
    pub life: f32,
    pub max_life: f32,
    pub tex_tile: UVec2,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            movement: Vec2::ZERO,
            size: Vec2::ONE,
            rot: 0.0,
            rot_speed: 0.0,
            life: 0.0,
            max_life: 1.0,
            tex_tile: UVec2::ZERO,
        }
    }
}

impl Particle {
    /// Life-fraction in [0, 1]
    pub fn particle_time(&self) -> f32 {
        if self.max_life <= 0.0 {
            1.0
        } else {
            (self.life / self.max_life).clamp(0.0, 1.0)
        }
    }

    pub fn is_expired(&self) -> bool {
        self.life >= self.max_life
    }
}

/// Runtime state of one sub-system of a live effect
#[derive(Debug, Clone, Default)]
pub struct SubSystem {
    pub particles: Vec<Particle>,
    /// Particles emitted since the system was spawned
    pub total_particles: usize,
    /// Fractional particles carried between sub-steps
    pub emission_accum: f32,
    /// Set once the emission window has opened in the current loop
    pub(crate) activated: bool,
}

/// Number of free scalar/direction parameters per system
pub const MAX_SCALAR_PARAMS: usize = 2;
pub const MAX_DIR_PARAMS: usize = 2;

/// Free parameters that behavior hooks may read, set by gameplay code
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SystemParams {
    pub scalar: [f32; MAX_SCALAR_PARAMS],
    pub dir: [Dir; MAX_DIR_PARAMS],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemState {
    Active,
    /// Killed without `immediate`: no more emission, live particles age out
    Dying,
    Dead,
}

/// One spawned effect
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    pub pos: Vec2,
    /// Offset from `pos` to the target, for effects that travel
    pub target_off: Vec2,
    pub params: SystemParams,
    /// One runtime per sub-system of the definition, in declaration order
    pub sub_systems: Vec<SubSystem>,
    /// Seconds since spawn (wraps for looped systems)
    pub anim_time: f32,
    pub(crate) state: SystemState,
    def: Arc<ParticleSystemDef>,
}

impl ParticleSystem {
    pub(crate) fn new(def: Arc<ParticleSystemDef>, pos: Vec2, target_off: Vec2) -> Self {
        Self {
            pos,
            target_off,
            params: SystemParams::default(),
            sub_systems: vec![SubSystem::default(); def.sub_systems.len()],
            anim_time: 0.0,
            state: SystemState::Active,
            def,
        }
    }

    pub fn def(&self) -> &ParticleSystemDef {
        &self.def
    }

    pub(crate) fn def_arc(&self) -> Arc<ParticleSystemDef> {
        Arc::clone(&self.def)
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn state(&self) -> SystemState {
        self.state
    }

    pub fn num_particles(&self) -> usize {
        self.sub_systems.iter().map(|ss| ss.particles.len()).sum()
    }

    pub fn has_particles(&self) -> bool {
        self.sub_systems.iter().any(|ss| !ss.particles.is_empty())
    }

    pub fn is_alive(&self) -> bool {
        match self.state {
            SystemState::Active => true,
            SystemState::Dying => self.has_particles(),
            SystemState::Dead => false,
        }
    }

    pub fn is_dead(&self) -> bool {
        !self.is_alive()
    }

    /// Immediate kill drops all particles now; otherwise emission stops and
    /// live particles are left to age out. Dead systems are unaffected.
    pub fn kill(&mut self, immediate: bool) {
        if self.state == SystemState::Dead {
            return;
        }
        if immediate {
            for ss in &mut self.sub_systems {
                ss.particles.clear();
            }
            self.state = SystemState::Dead;
        } else {
            self.state = SystemState::Dying;
        }
    }
}

/// Generation-tagged handle of a spawned system.
///
/// Handles stay valid until their slot is reclaimed; afterwards every query
/// reports the system as dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParticleSystemId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl ParticleSystemId {
    pub const INVALID: Self = Self {
        index: u32::MAX,
        generation: 0,
    };

    pub fn is_invalid(self) -> bool {
        self == Self::INVALID
    }

    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl Default for ParticleSystemId {
    fn default() -> Self {
        Self::INVALID
    }
}
