//! One fixed sub-step of a single system
//!
//! Per sub-system, in declaration order:
//! 1. aging: every existing particle is animated (default integration or
//!    animate hook), then expired particles are swap-removed
//! 2. emission: prepare hook → leaky-bucket accumulation → emit hook per new
//!    particle; new particles keep `life = 0` until the next sub-step
//!
//! Afterwards the system clock advances and the lifecycle state is updated.

use crate::behavior::{AnimationContext, EmissionState};
use crate::defs::{EmitterDef, SubSystemDef, TIME_EPSILON};
use crate::rand::ParticleRng;
use crate::registry::FxRegistry;
use crate::system::{Particle, ParticleSystem, SystemState};

/// Slack when taking whole particles out of the accumulator, so that
/// `frequency * step` landing just under an integer still emits.
const EMISSION_EPSILON: f32 = 1e-4;

pub(crate) fn simulate_system(
    registry: &FxRegistry,
    rng: &mut ParticleRng,
    ps: &mut ParticleSystem,
    time_delta: f32,
) {
    if ps.state == SystemState::Dead {
        return;
    }

    let def = ps.def_arc();
    let anim_length = def.effective_length();
    let within_length = def.is_looped || ps.anim_time + TIME_EPSILON < anim_length;

    for (ssid, ssdef) in def.sub_systems.iter().enumerate() {
        let pdef = &registry[ssdef.particle_id];
        let edef = &registry[ssdef.emitter_id];

        // Detach the particle list so hooks can read the whole system
        let mut particles = std::mem::take(&mut ps.sub_systems[ssid].particles);

        {
            let mut ctx = AnimationContext {
                ps: &*ps,
                ssid,
                ssdef,
                pdef,
                edef,
                time_delta,
                rand: &mut *rng,
            };
            for p in particles.iter_mut() {
                ssdef.behavior.animate_particle(&mut ctx, p);
            }
        }
        remove_expired(&mut particles);

        if ps.state == SystemState::Active && within_length && ssdef.is_emitting(ps.anim_time) {
            emit_particles(registry, ps, ssid, ssdef, rng, time_delta, &mut particles);
        }

        ps.sub_systems[ssid].particles = particles;
    }

    ps.anim_time += time_delta;
    if def.is_looped && anim_length > 0.0 && ps.anim_time + TIME_EPSILON >= anim_length {
        ps.anim_time = (ps.anim_time - anim_length).max(0.0);
        for ss in &mut ps.sub_systems {
            ss.activated = false;
        }
    }

    let finished = match ps.state {
        SystemState::Active => !def.is_looped && ps.anim_time + TIME_EPSILON >= anim_length,
        SystemState::Dying => true,
        SystemState::Dead => false,
    };
    if finished && !ps.has_particles() {
        ps.state = SystemState::Dead;
    }
}

fn emit_particles(
    registry: &FxRegistry,
    ps: &mut ParticleSystem,
    ssid: usize,
    ssdef: &SubSystemDef,
    rng: &mut ParticleRng,
    time_delta: f32,
    particles: &mut Vec<Particle>,
) {
    let pdef = &registry[ssdef.particle_id];
    let edef = &registry[ssdef.emitter_id];
    let mut em = EmissionState::default();
    let freq = {
        let mut ctx = AnimationContext {
            ps: &*ps,
            ssid,
            ssdef,
            pdef,
            edef,
            time_delta,
            rand: &mut *rng,
        };
        ssdef.behavior.prepare_emission(&mut ctx, &mut em)
    };

    let ss = &mut ps.sub_systems[ssid];
    if !ss.activated {
        ss.activated = true;
        ss.emission_accum += edef.initial_spawn_count.max(0.0);
    }

    let remaining_total = ssdef.max_total_particles.saturating_sub(ss.total_particles);
    let free_slots = ssdef.max_active_particles.saturating_sub(particles.len());
    let capacity = remaining_total.min(free_slots);

    let count = if freq >= EmitterDef::INSTANT_FREQUENCY {
        ss.emission_accum = 0.0;
        capacity
    } else {
        if freq.is_finite() && freq > 0.0 {
            ss.emission_accum += freq * time_delta;
        }
        let whole = (ss.emission_accum + EMISSION_EPSILON).floor().max(0.0);
        ss.emission_accum = (ss.emission_accum - whole).max(0.0);
        // Particles beyond capacity are dropped, not deferred
        (whole as usize).min(capacity)
    };

    for _ in 0..count {
        let mut p = Particle::default();
        {
            let mut ctx = AnimationContext {
                ps: &*ps,
                ssid,
                ssdef,
                pdef,
                edef,
                time_delta,
                rand: &mut *rng,
            };
            ssdef.behavior.emit_particle(&mut ctx, &em, &mut p);
        }
        particles.push(p);
        ps.sub_systems[ssid].total_particles += 1;
    }
}

/// Swap-remove expired particles; order is not preserved.
fn remove_expired(particles: &mut Vec<Particle>) {
    let mut i = 0;
    while i < particles.len() {
        if particles[i].is_expired() {
            particles.swap_remove(i);
            // The swapped-in particle still needs checking
        } else {
            i += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::{Curve, InterpKind};
    use crate::defs::{ParticleDef, ParticleSystemDef};
    use crate::quads::gen_quads;
    use ember_core::Vec2;
    use std::sync::Arc;

    fn registry(life: f32, freq: f32) -> (FxRegistry, crate::defs::ParticleDefId, crate::defs::EmitterDefId) {
        let mut reg = FxRegistry::new();
        let p = reg.add_particle_def(ParticleDef {
            life,
            ..Default::default()
        });
        let e = reg.add_emitter_def(EmitterDef {
            frequency: Curve::constant(freq),
            ..Default::default()
        });
        (reg, p, e)
    }

    fn run(reg: &FxRegistry, ps: &mut ParticleSystem, steps: usize, dt: f32) {
        let mut rng = ParticleRng::new(1);
        for _ in 0..steps {
            simulate_system(reg, &mut rng, ps, dt);
        }
    }

    #[test]
    fn accumulator_emits_whole_particles() {
        let (reg, p, e) = registry(10.0, 30.0);
        let def = ParticleSystemDef::new("trickle").with_sub_system(SubSystemDef::new(p, e, 0.0, 5.0));
        let mut ps = ParticleSystem::new(Arc::new(def), Vec2::ZERO, Vec2::ZERO);
        // 30/s at 60 steps/s: one particle every other step
        run(&reg, &mut ps, 10, 1.0 / 60.0);
        assert_eq!(ps.sub_systems[0].total_particles, 5);
        assert!(ps.sub_systems[0].emission_accum < 1.0);
    }

    #[test]
    fn instant_frequency_fills_capacity() {
        let (reg, p, e) = registry(10.0, EmitterDef::INSTANT_FREQUENCY);
        let def = ParticleSystemDef::new("burst")
            .with_sub_system(SubSystemDef::new(p, e, 0.0, 0.05).with_max_total(40).with_max_active(25));
        let mut ps = ParticleSystem::new(Arc::new(def), Vec2::ZERO, Vec2::ZERO);
        run(&reg, &mut ps, 1, 1.0 / 60.0);
        assert_eq!(ps.num_particles(), 25);
        run(&reg, &mut ps, 10, 1.0 / 60.0);
        assert_eq!(ps.num_particles(), 25);
        assert_eq!(ps.sub_systems[0].total_particles, 25);
    }

    #[test]
    fn initial_spawn_count_is_added_once() {
        let (mut reg, p, _) = registry(10.0, 0.0);
        let e = reg.add_emitter_def(EmitterDef {
            initial_spawn_count: 7.0,
            ..Default::default()
        });
        let def = ParticleSystemDef::new("pop").with_sub_system(SubSystemDef::new(p, e, 0.0, 1.0));
        let mut ps = ParticleSystem::new(Arc::new(def), Vec2::ZERO, Vec2::ZERO);
        run(&reg, &mut ps, 30, 1.0 / 60.0);
        assert_eq!(ps.sub_systems[0].total_particles, 7);
    }

    #[test]
    fn expired_particles_are_removed_and_system_dies() {
        let (reg, p, e) = registry(0.1, EmitterDef::INSTANT_FREQUENCY);
        let def = ParticleSystemDef::new("flash")
            .with_sub_system(SubSystemDef::new(p, e, 0.0, 0.02).with_max_total(4));
        let mut ps = ParticleSystem::new(Arc::new(def), Vec2::ZERO, Vec2::ZERO);
        run(&reg, &mut ps, 1, 0.05);
        assert_eq!(ps.num_particles(), 4);
        assert_eq!(ps.state(), SystemState::Active);
        run(&reg, &mut ps, 2, 0.05);
        assert_eq!(ps.num_particles(), 0);
        assert_eq!(ps.state(), SystemState::Dead);
    }

    #[test]
    fn new_particles_are_drawn_at_life_start() {
        let mut reg = FxRegistry::new();
        let p = reg.add_particle_def(ParticleDef {
            life: 0.5,
            size: Curve::new(vec![2.0, 8.0], InterpKind::Linear),
            alpha: Curve::new(vec![0.25, 1.0], InterpKind::Linear),
            ..Default::default()
        });
        let e = reg.add_emitter_def(EmitterDef {
            frequency: Curve::constant(EmitterDef::INSTANT_FREQUENCY),
            ..Default::default()
        });
        let def = ParticleSystemDef::new("fade_in")
            .with_sub_system(SubSystemDef::new(p, e, 0.0, 0.05).with_max_total(3));
        let mut ps = ParticleSystem::new(Arc::new(def), Vec2::ZERO, Vec2::ZERO);
        run(&reg, &mut ps, 1, 1.0 / 60.0);

        assert!(ps.sub_systems[0].particles.iter().all(|p| p.life == 0.0));
        let quads = gen_quads(&reg, std::iter::once(&ps));
        assert_eq!(quads.len(), 3);
        for q in quads {
            assert_eq!(q.size, Vec2::splat(2.0));
            assert_eq!(q.color.w, 0.25);
        }
    }

    #[test]
    fn short_lived_particles_are_drawn_once() {
        let (reg, p, e) = registry(0.01, EmitterDef::INSTANT_FREQUENCY);
        let def = ParticleSystemDef::new("spark")
            .with_sub_system(SubSystemDef::new(p, e, 0.0, 0.02).with_max_total(5));
        let mut ps = ParticleSystem::new(Arc::new(def), Vec2::ZERO, Vec2::ZERO);
        run(&reg, &mut ps, 1, 1.0 / 60.0);
        assert_eq!(ps.sub_systems[0].total_particles, 5);
        assert_eq!(gen_quads(&reg, std::iter::once(&ps)).len(), 5);

        run(&reg, &mut ps, 1, 1.0 / 60.0);
        assert_eq!(ps.num_particles(), 0);
        assert_eq!(ps.state(), SystemState::Dead);
    }

    #[test]
    fn expired_particles_free_capacity_before_emission() {
        let (reg, p, e) = registry(1.0 / 60.0, EmitterDef::INSTANT_FREQUENCY);
        let def = ParticleSystemDef::new("flicker")
            .with_sub_system(SubSystemDef::new(p, e, 0.0, 1.0).with_max_active(4));
        let mut ps = ParticleSystem::new(Arc::new(def), Vec2::ZERO, Vec2::ZERO);
        run(&reg, &mut ps, 1, 1.0 / 60.0);
        assert_eq!(ps.num_particles(), 4);
        // the first batch ages out and a full batch replaces it in the same step
        run(&reg, &mut ps, 1, 1.0 / 60.0);
        assert_eq!(ps.num_particles(), 4);
        assert_eq!(ps.sub_systems[0].total_particles, 8);
    }

    #[test]
    fn dying_system_stops_emitting() {
        let (reg, p, e) = registry(0.2, 60.0);
        let def = ParticleSystemDef::new("stream").with_sub_system(SubSystemDef::new(p, e, 0.0, 10.0));
        let mut ps = ParticleSystem::new(Arc::new(def), Vec2::ZERO, Vec2::ZERO);
        run(&reg, &mut ps, 6, 1.0 / 60.0);
        let emitted = ps.sub_systems[0].total_particles;
        assert!(emitted > 0);
        ps.kill(false);
        run(&reg, &mut ps, 6, 1.0 / 60.0);
        assert_eq!(ps.sub_systems[0].total_particles, emitted);
        run(&reg, &mut ps, 20, 1.0 / 60.0);
        assert_eq!(ps.state(), SystemState::Dead);
    }

    #[test]
    fn looped_system_wraps_clock() {
        let (reg, p, e) = registry(0.1, 20.0);
        let def = ParticleSystemDef::new("pulse")
            .with_sub_system(SubSystemDef::new(p, e, 0.0, 0.5))
            .looped(1.0);
        let mut ps = ParticleSystem::new(Arc::new(def), Vec2::ZERO, Vec2::ZERO);
        run(&reg, &mut ps, 150, 0.01);
        assert!(ps.anim_time < 1.0);
        assert!((ps.anim_time - 0.5).abs() < 0.02, "anim_time {}", ps.anim_time);
        assert_eq!(ps.state(), SystemState::Active);
        // two windows of 0.5s at 20/s
        assert!((19..=21).contains(&ps.sub_systems[0].total_particles));
    }
}
