//! End-to-end scenarios driving the manager the way a game loop would

use std::sync::Arc;

use ember_core::Vec2;
use ember_fx::*;

/// Registry with a handful of small effects exercising the stepper's edge cases
fn test_registry() -> Arc<FxRegistry> {
    let mut reg = FxRegistry::with_default_effects();

    let short = reg.add_particle_def(ParticleDef {
        life: 0.5,
        ..Default::default()
    });
    let long = reg.add_particle_def(ParticleDef {
        life: 100.0,
        ..Default::default()
    });
    let steady = reg.add_emitter_def(EmitterDef {
        frequency: Curve::constant(60.0),
        strength_min: 10.0,
        strength_max: 20.0,
        ..Default::default()
    });
    let fast = reg.add_emitter_def(EmitterDef {
        frequency: Curve::constant(1000.0 - 1.5),
        ..Default::default()
    });

    reg.add_system_def(
        ParticleSystemDef::new("three_shots")
            .with_sub_system(SubSystemDef::new(short, steady, 0.0, 0.1).with_max_total(3)),
    );
    reg.add_system_def(
        ParticleSystemDef::new("pulse")
            .with_sub_system(SubSystemDef::new(short, steady, 0.0, 0.5))
            .looped(1.0),
    );
    reg.add_system_def(
        ParticleSystemDef::new("brief")
            .with_sub_system(SubSystemDef::new(short, steady, 0.0, 0.1)),
    );
    reg.add_system_def(
        ParticleSystemDef::new("capped")
            .with_sub_system(SubSystemDef::new(long, fast, 0.0, 5.0).with_max_active(16)),
    );
    reg.add_system_def(
        ParticleSystemDef::new("budget")
            .with_sub_system(SubSystemDef::new(long, steady, 0.0, 2.0).with_max_total(50)),
    );
    Arc::new(reg)
}

fn manager(seed: u32) -> FxManager {
    FxManager::with_seed(test_registry(), seed)
}

#[test]
fn max_total_stops_emission_within_window() {
    let mut fx = manager(1);
    let id = fx.spawn("three_shots", Vec2::ZERO);
    fx.simulate_stable(0.1, 60);
    let ps = fx.get(id).unwrap();
    assert_eq!(ps.sub_systems[0].total_particles, 3);
    assert_eq!(ps.num_particles(), 3);
    assert_eq!(fx.gen_quads().len(), 3);
}

#[test]
fn looped_effect_stays_alive() {
    let mut fx = manager(2);
    let id = fx.spawn("pulse", Vec2::new(10.0, 10.0));
    for _ in 0..25 {
        fx.simulate_stable(0.1, 60);
    }
    assert!(fx.alive(id));
    assert!(fx.get(id).unwrap().anim_time < 1.0);
}

#[test]
fn finished_effect_dies_and_draws_nothing() {
    let mut fx = manager(3);
    let id = fx.spawn("brief", Vec2::ZERO);
    fx.simulate_stable(0.05, 60);
    assert!(fx.alive(id));
    fx.simulate_stable(0.95, 60);
    assert!(fx.dead(id));
    assert!(fx.gen_quads().is_empty());
    assert_eq!(fx.stats(), FxStats::default());
}

#[test]
fn immediate_kill_drops_particles() {
    let mut fx = manager(4);
    let id = fx.spawn("pulse", Vec2::ZERO);
    fx.simulate_stable(5.0 / 60.0, 60);
    assert_eq!(fx.get(id).unwrap().num_particles(), 5);

    fx.kill(id, true);
    assert!(fx.dead(id));
    assert!(fx.gen_quads().is_empty());
    // Killing again, or through a stale handle after reclamation, is harmless
    fx.kill(id, true);
    fx.simulate(0.01);
    fx.kill(id, false);
    assert!(fx.dead(id));
}

#[test]
fn same_seed_same_quads() {
    let run = |seed| {
        let mut fx = manager(seed);
        fx.spawn("explosion", Vec2::new(100.0, 100.0));
        fx.spawn_with_target("magic_missile", Vec2::ZERO, Vec2::new(300.0, -50.0));
        fx.spawn("rock_clouds", Vec2::new(-20.0, 5.0));
        let mut frames = Vec::new();
        for frame in 0..30 {
            // Uneven frame times, like a real game loop
            fx.simulate_stable(if frame % 3 == 0 { 0.021 } else { 0.013 }, 60);
            frames.push(fx.gen_quads());
        }
        frames
    };
    assert_eq!(run(77), run(77));
    assert_ne!(run(77), run(78));
}

#[test]
fn emitted_count_is_independent_of_frame_split() {
    let totals: Vec<usize> = [1.0 / 60.0, 0.05, 0.25, 2.0]
        .into_iter()
        .map(|frame| {
            let mut fx = manager(5);
            let id = fx.spawn("budget", Vec2::ZERO);
            let mut elapsed = 0.0;
            while elapsed < 3.0 - 1e-9 {
                fx.simulate_stable(frame, 60);
                elapsed += frame;
            }
            fx.get(id).unwrap().sub_systems[0].total_particles
        })
        .collect();
    assert!(totals.iter().all(|&t| t == 50), "{totals:?}");
}

#[test]
fn active_cap_is_never_exceeded() {
    let mut fx = manager(6);
    let id = fx.spawn("capped", Vec2::ZERO);
    for _ in 0..120 {
        fx.simulate_stable(1.0 / 60.0, 60);
        assert!(fx.get(id).unwrap().num_particles() <= 16);
    }
    assert_eq!(fx.get(id).unwrap().num_particles(), 16);
}

#[test]
fn unknown_effect_is_ignored() {
    let mut fx = manager(7);
    let id = fx.spawn("does_not_exist", Vec2::ZERO);
    assert_eq!(id, ParticleSystemId::INVALID);
    assert!(fx.dead(id));
    fx.kill(id, false);
    fx.simulate_stable(1.0, 60);
    assert!(fx.alive_systems().is_empty());
}

#[test]
fn quads_pack_for_upload() {
    let mut fx = manager(8);
    fx.spawn("explosion", Vec2::new(40.0, 40.0));
    fx.simulate_stable(0.2, 60);
    let quads = fx.gen_quads();
    let instances = pack_instances(&quads);
    assert_eq!(instances.len(), quads.len());
    assert_eq!(
        bytemuck::cast_slice::<QuadInstance, u8>(&instances).len(),
        48 * quads.len()
    );
    for (q, inst) in quads.iter().zip(&instances) {
        assert_eq!(inst.pos_size[0], q.position.x);
        assert_eq!(inst.color[3], q.color.w);
        assert_eq!(q.texture, TextureName::CloudsSoftBorders);
    }
}

#[test]
fn absolute_clock_matches_deltas() {
    let mut by_delta = manager(9);
    let mut by_time = manager(9);
    let a = by_delta.spawn("pulse", Vec2::ZERO);
    let b = by_time.spawn("pulse", Vec2::ZERO);

    by_time.simulate_stable_time(10.0, 60);
    let mut t = 10.0;
    for _ in 0..40 {
        t += 0.02;
        by_delta.simulate_stable(0.02, 60);
        by_time.simulate_stable_time(t, 60);
    }
    assert_eq!(
        by_delta.get(a).unwrap().sub_systems[0].total_particles,
        by_time.get(b).unwrap().sub_systems[0].total_particles
    );
}

#[test]
fn catalog_effects_load_from_toml() {
    let mut reg = FxRegistry::with_default_effects();
    let names = load_catalog_str(
        &mut reg,
        &BehaviorLibrary::builtin(),
        r#"
[[effect]]
name = "puff"

[[effect.sub_system]]
window = [0.0, 0.2]
max_total = 4

[effect.sub_system.particle]
life = 0.3

[effect.sub_system.emitter]
frequency = 999.0
"#,
    )
    .unwrap();
    assert_eq!(names, vec!["puff"]);

    let mut fx = FxManager::new(Arc::new(reg), &FxConfig::default());
    let id = fx.spawn("puff", Vec2::ZERO);
    fx.simulate_stable(1.0 / 60.0, 60);
    assert_eq!(fx.gen_quads().len(), 4);
    fx.simulate_stable(1.0, 60);
    assert!(fx.dead(id));
}
