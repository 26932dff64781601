//! The effects manager: owns live systems and drives the simulation
//!
//! Simulation is frame-rate independent. `simulate_stable` slices arbitrary
//! frame deltas into fixed sub-steps of `1 / fps` seconds and carries the
//! remainder to the next call, so identical total time gives identical
//! particle counts regardless of how it was split into frames.

use crate::config::FxConfig;
use crate::quads::{self, DrawParticle};
use crate::rand::ParticleRng;
use crate::registry::FxRegistry;
use crate::stepper;
use crate::system::{ParticleSystem, ParticleSystemId, SystemParams};
use ember_core::Vec2;
use std::sync::Arc;

/// Accumulated time within this much of a full sub-step fires the sub-step
const STEP_EPSILON: f64 = 1e-9;

#[derive(Debug)]
struct Slot {
    generation: u32,
    system: Option<ParticleSystem>,
}

/// Instance and particle counts, for HUDs and logging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FxStats {
    pub systems: usize,
    pub particles: usize,
}

pub struct FxManager {
    registry: Arc<FxRegistry>,
    slots: Vec<Slot>,
    free_slots: Vec<u32>,
    rng: ParticleRng,
    accum_frame_time: f64,
    old_time: Option<f64>,
}

impl FxManager {
    pub fn new(registry: Arc<FxRegistry>, config: &FxConfig) -> Self {
        Self::with_seed(registry, config.random_seed)
    }

    pub fn with_seed(registry: Arc<FxRegistry>, seed: u32) -> Self {
        Self {
            registry,
            slots: Vec::new(),
            free_slots: Vec::new(),
            rng: ParticleRng::new(seed),
            accum_frame_time: 0.0,
            old_time: None,
        }
    }

    pub fn registry(&self) -> &FxRegistry {
        &self.registry
    }

    /// Spawn the named effect at `pos`. Unknown names are ignored and yield
    /// [`ParticleSystemId::INVALID`].
    pub fn spawn(&mut self, name: &str, pos: Vec2) -> ParticleSystemId {
        self.spawn_with_target(name, pos, Vec2::ZERO)
    }

    /// Spawn an effect that travels towards `pos + target_off`
    pub fn spawn_with_target(&mut self, name: &str, pos: Vec2, target_off: Vec2) -> ParticleSystemId {
        let Some(def) = self.registry.system_def(name) else {
            log::debug!("Ignoring spawn of unknown effect '{name}'");
            return ParticleSystemId::INVALID;
        };
        let system = ParticleSystem::new(Arc::clone(def), pos, target_off);

        match self.free_slots.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.system = Some(system);
                ParticleSystemId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    system: Some(system),
                });
                ParticleSystemId {
                    index,
                    generation: 0,
                }
            }
        }
    }

    fn slot(&self, id: ParticleSystemId) -> Option<&Slot> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
    }

    /// Whether the handle still refers to a live instance slot
    pub fn valid(&self, id: ParticleSystemId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: ParticleSystemId) -> Option<&ParticleSystem> {
        self.slot(id)?.system.as_ref()
    }

    pub fn get_mut(&mut self, id: ParticleSystemId) -> Option<&mut ParticleSystem> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.system.as_mut()
    }

    pub fn alive(&self, id: ParticleSystemId) -> bool {
        self.get(id).is_some_and(ParticleSystem::is_alive)
    }

    /// Stale and invalid handles report dead
    pub fn dead(&self, id: ParticleSystemId) -> bool {
        !self.alive(id)
    }

    /// No-op for stale or invalid handles
    pub fn kill(&mut self, id: ParticleSystemId, immediate: bool) {
        if let Some(ps) = self.get_mut(id) {
            ps.kill(immediate);
        }
    }

    pub fn params_mut(&mut self, id: ParticleSystemId) -> Option<&mut SystemParams> {
        self.get_mut(id).map(|ps| &mut ps.params)
    }

    pub fn set_params(&mut self, id: ParticleSystemId, params: SystemParams) {
        if let Some(p) = self.params_mut(id) {
            *p = params;
        }
    }

    /// Handles of every live instance, in slot order
    pub fn alive_systems(&self) -> Vec<ParticleSystemId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.system.as_ref().is_some_and(ParticleSystem::is_alive))
            .map(|(i, slot)| ParticleSystemId {
                index: i as u32,
                generation: slot.generation,
            })
            .collect()
    }

    /// Every instance that has not been reclaimed yet, in slot order
    pub fn systems(&self) -> impl Iterator<Item = &ParticleSystem> {
        self.slots.iter().filter_map(|slot| slot.system.as_ref())
    }

    pub fn stats(&self) -> FxStats {
        self.systems()
            .filter(|ps| ps.is_alive())
            .fold(FxStats::default(), |acc, ps| FxStats {
                systems: acc.systems + 1,
                particles: acc.particles + ps.num_particles(),
            })
    }

    /// Advance every live system by exactly `dt` seconds, then reclaim the
    /// slots of dead ones. Negative deltas count as zero.
    pub fn simulate(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        let registry = Arc::clone(&self.registry);
        for slot in &mut self.slots {
            if let Some(ps) = slot.system.as_mut() {
                stepper::simulate_system(&registry, &mut self.rng, ps, dt);
            }
        }
        self.reclaim_dead();
    }

    fn reclaim_dead(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.system.as_ref().is_some_and(ParticleSystem::is_dead) {
                if let Some(ps) = slot.system.take() {
                    log::debug!("Reclaiming slot {index} of finished effect '{}'", ps.name());
                }
                slot.generation = slot.generation.wrapping_add(1);
                self.free_slots.push(index as u32);
            }
        }
    }

    /// Advance by `delta` seconds in fixed sub-steps of `1 / fps`.
    /// The remainder below one sub-step is carried to the next call.
    /// `fps == 0` disables resampling and runs a single raw step.
    pub fn simulate_stable(&mut self, delta: f64, fps: u32) {
        let delta = delta.max(0.0);
        if fps == 0 {
            self.simulate(delta as f32);
            return;
        }
        let step = 1.0 / fps as f64;
        self.accum_frame_time += delta;

        let mut steps = 0u32;
        while self.accum_frame_time + STEP_EPSILON >= step {
            self.simulate(step as f32);
            self.accum_frame_time -= step;
            steps += 1;
        }
        self.accum_frame_time = self.accum_frame_time.max(0.0);
        log::trace!(
            "simulate_stable: {steps} sub-steps, {:.6}s carried",
            self.accum_frame_time
        );
    }

    /// Like [`simulate_stable`](Self::simulate_stable) but driven by an absolute
    /// clock. The first call only establishes the time base.
    pub fn simulate_stable_time(&mut self, time: f64, fps: u32) {
        let Some(old) = self.old_time.replace(time) else {
            return;
        };
        self.simulate_stable((time - old).max(0.0), fps);
    }

    /// Quad records for every particle of every live system
    pub fn gen_quads(&self) -> Vec<DrawParticle> {
        quads::gen_quads(&self.registry, self.systems())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::Curve;
    use crate::defs::{EmitterDef, ParticleDef, ParticleSystemDef, SubSystemDef};
    use crate::system::SystemState;

    fn registry() -> Arc<FxRegistry> {
        let mut reg = FxRegistry::new();
        let p = reg.add_particle_def(ParticleDef {
            life: 0.5,
            ..Default::default()
        });
        let e = reg.add_emitter_def(EmitterDef {
            frequency: Curve::constant(60.0),
            ..Default::default()
        });
        reg.add_system_def(
            ParticleSystemDef::new("burst")
                .with_sub_system(SubSystemDef::new(p, e, 0.0, 0.1).with_max_total(3)),
        );
        reg.add_system_def(
            ParticleSystemDef::new("loop")
                .with_sub_system(SubSystemDef::new(p, e, 0.0, 1.0))
                .looped(1.0),
        );
        Arc::new(reg)
    }

    fn manager() -> FxManager {
        FxManager::with_seed(registry(), 42)
    }

    #[test]
    fn unknown_effect_yields_invalid_handle() {
        let mut fx = manager();
        let id = fx.spawn("nope", Vec2::ZERO);
        assert!(id.is_invalid());
        assert!(fx.dead(id));
        assert!(!fx.valid(id));
        fx.kill(id, true);
        assert_eq!(fx.stats(), FxStats::default());
    }

    #[test]
    fn six_substeps_in_a_tenth_of_a_second() {
        let mut fx = manager();
        let id = fx.spawn("burst", Vec2::ZERO);
        fx.simulate_stable(0.1, 60);
        let ps = fx.get(id).unwrap();
        assert_eq!(ps.sub_systems[0].total_particles, 3);
        assert!((ps.anim_time - 0.1).abs() < 1e-4);
        assert!(fx.accum_frame_time.abs() < 1e-6);
    }

    #[test]
    fn remainder_carries_between_calls() {
        let mut fx = manager();
        let id = fx.spawn("loop", Vec2::ZERO);
        // 0.01s per frame is less than one sub-step
        fx.simulate_stable(0.01, 60);
        assert_eq!(fx.get(id).unwrap().anim_time, 0.0);
        fx.simulate_stable(0.01, 60);
        assert!((fx.get(id).unwrap().anim_time - 1.0 / 60.0).abs() < 1e-6);
    }

    #[test]
    fn zero_fps_runs_a_raw_step() {
        let mut fx = manager();
        let id = fx.spawn("loop", Vec2::ZERO);
        fx.simulate_stable(0.25, 0);
        assert!((fx.get(id).unwrap().anim_time - 0.25).abs() < 1e-6);
    }

    #[test]
    fn negative_delta_does_not_rewind() {
        let mut fx = manager();
        let id = fx.spawn("loop", Vec2::ZERO);
        fx.simulate_stable(-0.5, 0);
        assert_eq!(fx.get(id).unwrap().anim_time, 0.0);
        fx.simulate_stable(-0.5, 60);
        assert_eq!(fx.get(id).unwrap().anim_time, 0.0);
        fx.simulate(-0.1);
        assert_eq!(fx.get(id).unwrap().anim_time, 0.0);
    }

    #[test]
    fn first_absolute_time_sets_base() {
        let mut fx = manager();
        let id = fx.spawn("loop", Vec2::ZERO);
        fx.simulate_stable_time(100.0, 60);
        assert_eq!(fx.get(id).unwrap().anim_time, 0.0);
        fx.simulate_stable_time(100.5, 60);
        assert!((fx.get(id).unwrap().anim_time - 0.5).abs() < 1e-3);
        // Clock going backwards is treated as no time passing
        fx.simulate_stable_time(99.0, 60);
        assert!((fx.get(id).unwrap().anim_time - 0.5).abs() < 1e-3);
    }

    #[test]
    fn dead_slots_are_reused_with_new_generation() {
        let mut fx = manager();
        let first = fx.spawn("loop", Vec2::ZERO);
        fx.kill(first, true);
        fx.simulate(0.01);
        assert!(!fx.valid(first));
        assert!(fx.get(first).is_none());

        let second = fx.spawn("loop", Vec2::ZERO);
        assert_eq!(second.index(), first.index());
        assert_ne!(second.generation(), first.generation());
        assert!(fx.alive(second));
        // The stale handle must not reach the new instance
        fx.kill(first, true);
        assert!(fx.alive(second));
    }

    #[test]
    fn deferred_kill_drains_particles() {
        let mut fx = manager();
        let id = fx.spawn("loop", Vec2::ZERO);
        fx.simulate_stable(0.2, 60);
        assert!(fx.stats().particles > 0);
        fx.kill(id, false);
        assert_eq!(fx.get(id).unwrap().state(), SystemState::Dying);
        assert!(fx.alive(id));
        fx.simulate_stable(1.0, 60);
        assert!(fx.dead(id));
        assert_eq!(fx.stats(), FxStats::default());
    }

    #[test]
    fn params_are_settable_through_handle() {
        let mut fx = manager();
        let id = fx.spawn("loop", Vec2::ZERO);
        let mut params = SystemParams::default();
        params.scalar[0] = 2.0;
        fx.set_params(id, params);
        assert_eq!(fx.get(id).unwrap().params.scalar[0], 2.0);
        fx.params_mut(id).unwrap().scalar[1] = 3.0;
        assert_eq!(fx.get(id).unwrap().params.scalar, [2.0, 3.0]);
    }

    #[test]
    fn alive_systems_lists_handles() {
        let mut fx = manager();
        let a = fx.spawn("loop", Vec2::ZERO);
        let b = fx.spawn("burst", Vec2::new(5.0, 5.0));
        assert_eq!(fx.alive_systems(), vec![a, b]);
        fx.kill(a, true);
        assert_eq!(fx.alive_systems(), vec![b]);
    }
}
