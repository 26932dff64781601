//! Built-in effects and the behaviors they use
//!
//! Effects are registered by name into an [`FxRegistry`]; the behaviors are
//! also exposed through [`builtin_behaviors`] so TOML catalogs can reuse them.

use crate::behavior::{
    default_animate_particle, default_draw_particle, default_emit_particle,
    default_prepare_emission, Behavior, BehaviorLibrary,
};
use crate::curves::{Curve, InterpKind};
use crate::defs::{EmitterDef, ParticleDef, ParticleSystemDef, SubSystemDef};
use crate::registry::FxRegistry;
use crate::texture::TextureName;
use ember_core::{rgb8, vector_to_angle, Rect, UVec2, Vec2, Vec3};
use std::f32::consts::PI;

pub fn add_default_defs(registry: &mut FxRegistry) {
    add_test_simple(registry);
    add_test_multi(registry);
    add_wood_splinters(registry);
    add_rock_splinters(registry);
    add_rock_clouds(registry);
    add_explosion(registry);
    add_ripple(registry);
    add_circular_blast(registry);
    add_feet_dust(registry);
    add_magic_missile(registry);
    add_sleep(registry);
    log::debug!("Registered {} built-in effects", registry.num_systems());
}

pub fn builtin_behaviors() -> BehaviorLibrary {
    let mut lib = BehaviorLibrary::new();
    lib.insert("splinter_fall", splinter_fall());
    lib.insert("ripple", ripple());
    lib.insert("circular_blast", circular_blast());
    lib.insert("feet_dust", feet_dust());
    lib.insert("missile_guide", missile_guide());
    lib.insert("missile_trail", missile_trail());
    lib.insert("sleep_icon", sleep_icon());
    lib
}

/// Effects are tuned for a 60 Hz step; velocity kicks applied once per step
/// are scaled by `dt * REFERENCE_FPS` to stay rate independent.
const REFERENCE_FPS: f32 = 60.0;

fn linear(values: Vec<f32>) -> Curve<f32> {
    Curve::new(values, InterpKind::Linear)
}

fn keyed(keys: &[f32], values: &[f32], interp: InterpKind) -> Curve<f32> {
    Curve::with_keys(keys.to_vec(), values.to_vec(), interp)
}

fn fade(keys: &[f32], values: &[f32]) -> Curve<f32> {
    keyed(keys, values, InterpKind::Linear)
}

fn test_frequency() -> Curve<f32> {
    Curve::new(vec![10.0, 55.0, 0.0, 0.0], InterpKind::Cosine)
}

fn add_test_simple(registry: &mut FxRegistry) {
    let edef = EmitterDef {
        strength_min: 30.0,
        strength_max: 30.0,
        frequency: test_frequency(),
        ..Default::default()
    };
    let pdef = ParticleDef {
        life: 1.0,
        size: Curve::constant(32.0),
        alpha: fade(&[0.0, 0.1, 0.8, 1.0], &[0.0, 1.0, 1.0, 0.0]),
        color: Curve::new(
            vec![
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.5, 1.0, 0.5),
                Vec3::new(0.2, 0.5, 1.0),
            ],
            InterpKind::Linear,
        ),
        texture: TextureName::Circular,
        ..Default::default()
    };

    let ss = SubSystemDef::new(
        registry.add_particle_def(pdef),
        registry.add_emitter_def(edef),
        0.0,
        5.0,
    );
    registry.add_system_def(ParticleSystemDef::new("test_simple").with_sub_system(ss));
}

fn add_test_multi(registry: &mut FxRegistry) {
    const COLORS: [Vec3; 5] = [
        Vec3::new(0.7, 0.2, 0.2),
        Vec3::new(0.2, 0.7, 0.2),
        Vec3::new(0.2, 0.2, 0.7),
        Vec3::new(0.9, 0.2, 0.9),
        Vec3::new(0.3, 0.9, 0.4),
    ];

    let mut def = ParticleSystemDef::new("test_multi");
    for (n, color) in COLORS.into_iter().enumerate() {
        let pdef = ParticleDef {
            life: 1.0,
            size: Curve::constant(32.0),
            alpha: fade(&[0.0, 0.1, 0.8, 1.0], &[0.0, 1.0, 1.0, 0.0]),
            color: Curve::constant(color),
            texture: TextureName::Circular,
            ..Default::default()
        };
        let edef = EmitterDef {
            strength_min: 30.0,
            strength_max: 30.0,
            frequency: test_frequency(),
            ..Default::default()
        };
        let n = n as f32;
        def = def.with_sub_system(SubSystemDef::new(
            registry.add_particle_def(pdef),
            registry.add_emitter_def(edef),
            n * 0.5,
            n * 1.5 + 2.0,
        ));
    }
    registry.add_system_def(def);
}

fn splinter_emitter() -> EmitterDef {
    EmitterDef {
        strength_min: 20.0,
        strength_max: 60.0,
        rotation_speed_min: -0.5,
        rotation_speed_max: 0.5,
        frequency: Curve::constant(EmitterDef::INSTANT_FREQUENCY),
        ..Default::default()
    }
}

fn add_wood_splinters(registry: &mut FxRegistry) {
    let brown = rgb8(120, 87, 46);
    let pdef = ParticleDef {
        life: 1.0,
        size: Curve::constant(4.0),
        slowdown: keyed(&[0.0, 0.1], &[5.0, 1000.0], InterpKind::Linear),
        alpha: keyed(&[0.0, 0.3, 1.0], &[1.0, 1.0, 0.0], InterpKind::Cosine),
        // Darkens as the splinters fall into the tree's shadow
        color: Curve::with_keys(
            vec![0.0, 0.15, 0.17],
            vec![brown, brown, brown * 0.6],
            InterpKind::Linear,
        ),
        texture: TextureName::FlakesBorders,
        texture_tiles: TextureName::FlakesBorders.tiles(),
        ..Default::default()
    };

    let ss = SubSystemDef::new(
        registry.add_particle_def(pdef),
        registry.add_emitter_def(splinter_emitter()),
        0.0,
        0.1,
    )
    .with_max_total(7)
    .with_behavior(splinter_fall());
    registry.add_system_def(ParticleSystemDef::new("wood_splinters").with_sub_system(ss));
}

fn add_rock_splinters(registry: &mut FxRegistry) {
    let pdef = ParticleDef {
        life: 1.0,
        size: Curve::constant(4.0),
        slowdown: keyed(&[0.0, 0.1], &[5.0, 1000.0], InterpKind::Linear),
        alpha: keyed(&[0.0, 0.4, 1.0], &[1.0, 1.0, 0.0], InterpKind::Cosine),
        color: Curve::constant(Vec3::splat(0.4)),
        texture: TextureName::FlakesBorders,
        texture_tiles: TextureName::FlakesBorders.tiles(),
        ..Default::default()
    };

    let ss = SubSystemDef::new(
        registry.add_particle_def(pdef),
        registry.add_emitter_def(splinter_emitter()),
        0.0,
        0.1,
    )
    .with_max_total(5);
    registry.add_system_def(ParticleSystemDef::new("rock_splinters").with_sub_system(ss));
}

fn add_rock_clouds(registry: &mut FxRegistry) {
    let edef = EmitterDef {
        source: Rect::new(-5.0, -5.0, 5.0, 5.0),
        strength_min: 5.0,
        strength_max: 8.0,
        frequency: Curve::constant(60.0),
        ..Default::default()
    };
    let pdef = ParticleDef {
        life: 3.5,
        size: fade(&[0.0, 0.1, 1.0], &[15.0, 30.0, 38.0]),
        alpha: fade(&[0.0, 0.05, 0.2, 1.0], &[0.0, 0.3, 0.4, 0.0]),
        slowdown: fade(&[0.0, 0.2], &[0.0, 10.0]),
        color: Curve::new(vec![Vec3::splat(0.6), Vec3::splat(0.4)], InterpKind::Linear),
        texture: TextureName::CloudsSoft,
        texture_tiles: TextureName::CloudsSoft.tiles(),
        ..Default::default()
    };

    let ss = SubSystemDef::new(
        registry.add_particle_def(pdef),
        registry.add_emitter_def(edef),
        0.0,
        0.1,
    )
    .with_max_total(5);
    registry.add_system_def(ParticleSystemDef::new("rock_clouds").with_sub_system(ss));
}

fn add_explosion(registry: &mut FxRegistry) {
    let edef = EmitterDef {
        strength_min: 15.0,
        strength_max: 15.0,
        frequency: Curve::constant(60.0),
        ..Default::default()
    };
    let pdef = ParticleDef {
        life: 0.5,
        size: linear(vec![5.0, 30.0]),
        alpha: fade(&[0.0, 0.5, 1.0], &[0.3, 0.4, 0.0]),
        color: Curve::new(vec![rgb8(255, 244, 88), rgb8(225, 92, 19)], InterpKind::Linear),
        texture: TextureName::CloudsSoftBorders,
        texture_tiles: TextureName::CloudsSoftBorders.tiles(),
        ..Default::default()
    };

    let ss = SubSystemDef::new(
        registry.add_particle_def(pdef),
        registry.add_emitter_def(edef),
        0.0,
        0.5,
    )
    .with_max_total(20);
    registry.add_system_def(ParticleSystemDef::new("explosion").with_sub_system(ss));
}

fn add_ripple(registry: &mut FxRegistry) {
    let edef = EmitterDef {
        frequency: Curve::constant(1.5),
        initial_spawn_count: 1.0,
        ..Default::default()
    };
    let pdef = ParticleDef {
        life: 1.5,
        size: linear(vec![10.0, 50.0]),
        alpha: fade(&[0.0, 0.3, 0.6, 1.0], &[0.0, 0.3, 0.5, 0.0]),
        color: Curve::constant(Vec3::ONE),
        texture: TextureName::Torus,
        ..Default::default()
    };

    let ss = SubSystemDef::new(
        registry.add_particle_def(pdef),
        registry.add_emitter_def(edef),
        0.0,
        1.0,
    )
    .with_max_active(10)
    .with_behavior(ripple());
    registry.add_system_def(
        ParticleSystemDef::new("ripple")
            .with_sub_system(ss)
            .looped(1.0),
    );
}

fn add_circular_blast(registry: &mut FxRegistry) {
    let edef = EmitterDef {
        frequency: Curve::constant(50.0),
        initial_spawn_count: 10.0,
        ..Default::default()
    };
    let pdef = ParticleDef {
        life: 0.5,
        size: Curve::new(vec![10.0, 80.0], InterpKind::Cosine),
        alpha: keyed(&[0.0, 0.03, 0.2, 1.0], &[0.0, 0.15, 0.15, 0.0], InterpKind::Cosine),
        color: Curve::with_keys(
            vec![0.5, 0.8],
            vec![Vec3::ONE, Vec3::new(0.5, 0.5, 1.0)],
            InterpKind::Linear,
        ),
        texture: TextureName::Torus,
        ..Default::default()
    };

    let ss = SubSystemDef::new(
        registry.add_particle_def(pdef),
        registry.add_emitter_def(edef),
        0.0,
        0.1,
    )
    .with_max_active(20)
    .with_behavior(circular_blast());
    registry.add_system_def(ParticleSystemDef::new("circular_blast").with_sub_system(ss));
}

fn add_feet_dust(registry: &mut FxRegistry) {
    let edef = EmitterDef {
        source: Rect::new(-3.0, 3.0, 3.0, 4.0),
        strength_min: 15.0,
        strength_max: 20.0,
        frequency: Curve::constant(60.0),
        ..Default::default()
    };
    let pdef = ParticleDef {
        life: 1.25,
        size: keyed(&[0.0, 0.1, 1.0], &[5.0, 14.0, 20.0], InterpKind::Quadratic),
        alpha: fade(&[0.0, 0.05, 0.2, 1.0], &[0.0, 0.2, 0.3, 0.0]),
        slowdown: fade(&[0.0, 0.2], &[0.0, 10.0]),
        color: Curve::new(vec![Vec3::splat(0.9), Vec3::splat(0.7)], InterpKind::Linear),
        texture: TextureName::CloudsSoft,
        texture_tiles: TextureName::CloudsSoft.tiles(),
        ..Default::default()
    };

    let ss = SubSystemDef::new(
        registry.add_particle_def(pdef),
        registry.add_emitter_def(edef),
        0.0,
        0.2,
    )
    .with_max_total(3)
    .with_behavior(feet_dust());
    registry.add_system_def(ParticleSystemDef::new("feet_dust").with_sub_system(ss));
}

fn add_magic_missile(registry: &mut FxRegistry) {
    // Invisible guide particle travelling from the source to the target
    let guide_edef = EmitterDef {
        strength_min: 100.0,
        strength_max: 100.0,
        frequency: Curve::constant(60.0),
        angle_spread: PI,
        ..Default::default()
    };
    let guide_pdef = ParticleDef {
        life: 0.45,
        size: linear(vec![15.0, 20.0]),
        alpha: Curve::constant(0.0),
        slowdown: Curve::constant(1.0),
        ..Default::default()
    };
    let guide = SubSystemDef::new(
        registry.add_particle_def(guide_pdef),
        registry.add_emitter_def(guide_edef),
        0.0,
        0.5,
    )
    .with_max_total(1)
    .with_behavior(missile_guide());

    // Trail emitted from wherever the guide currently is
    let trail_edef = EmitterDef {
        strength_min: 40.0,
        strength_max: 40.0,
        frequency: Curve::constant(50.0),
        angle_spread: PI,
        ..Default::default()
    };
    let trail_pdef = ParticleDef {
        life: 0.3,
        size: linear(vec![20.0, 25.0]),
        alpha: fade(&[0.0, 0.5, 1.0], &[0.0, 1.0, 0.0]),
        slowdown: Curve::constant(1.0),
        color: Curve::new(
            vec![rgb8(155, 244, 228), Vec3::new(0.2, 0.2, 0.8)],
            InterpKind::Linear,
        ),
        texture: TextureName::Circular,
        ..Default::default()
    };
    let trail = SubSystemDef::new(
        registry.add_particle_def(trail_pdef),
        registry.add_emitter_def(trail_edef),
        0.0,
        0.5,
    )
    .with_behavior(missile_trail());

    registry.add_system_def(
        ParticleSystemDef::new("magic_missile")
            .with_sub_system(guide)
            .with_sub_system(trail),
    );
}

fn add_sleep(registry: &mut FxRegistry) {
    let edef = EmitterDef {
        source: Rect::new(-2.0, -8.0, 2.0, -5.0),
        strength_min: 20.0,
        strength_max: 20.0,
        angle: -PI * 0.5,
        angle_spread: 0.2,
        frequency: Curve::constant(3.0),
        ..Default::default()
    };
    let pdef = ParticleDef {
        life: 2.0,
        size: Curve::constant(10.0),
        alpha: keyed(&[0.0, 0.5, 1.0], &[0.0, 1.0, 0.0], InterpKind::Cosine),
        color: Curve::constant(Vec3::ONE),
        texture: TextureName::Special,
        texture_tiles: TextureName::Special.tiles(),
        ..Default::default()
    };

    let ss = SubSystemDef::new(
        registry.add_particle_def(pdef),
        registry.add_emitter_def(edef),
        0.0,
        1.0,
    )
    .with_behavior(sleep_icon());
    registry.add_system_def(
        ParticleSystemDef::new("sleep")
            .with_sub_system(ss)
            .looped(1.0),
    );
}

/// Splinters fall back down to a floor band below the emitter
fn splinter_fall() -> Behavior {
    const SHADOW_MIN: f32 = 5.0;
    const SHADOW_MAX: f32 = 10.0;

    Behavior::new().on_animate(|ctx, p| {
        default_animate_particle(ctx, p);
        if p.pos.y < SHADOW_MIN {
            p.movement.y += (SHADOW_MIN - p.pos.y) * ctx.time_delta * REFERENCE_FPS;
        }
        p.pos.y = p.pos.y.min(SHADOW_MAX);
    })
}

/// Expanding rings; `scalar[0]` speeds up both emission and aging
fn ripple() -> Behavior {
    Behavior::new()
        .on_prepare(|ctx, em| {
            let freq = default_prepare_emission(ctx, em);
            freq * (1.0 + ctx.ps.params.scalar[0])
        })
        .on_animate(|ctx, p| {
            let dt = ctx.time_delta * (1.0 + ctx.ps.params.scalar[0]);
            p.pos += p.movement * dt;
            p.rot += p.rot_speed * dt;
            p.life += dt;
        })
}

/// Rings born with staggered ages, from the initial burst only
fn circular_blast() -> Behavior {
    Behavior::new()
        .on_prepare(|ctx, em| {
            default_prepare_emission(ctx, em);
            0.0
        })
        .on_emit(|ctx, em, p| {
            p.life = em.max_life.min(ctx.ss().total_particles as f32 * 0.01);
            p.max_life = em.max_life;
        })
        .on_animate(|ctx, p| {
            let dt = ctx.time_delta * (1.0 + ctx.ps.params.scalar[0]);
            p.life += p.movement.x;
            p.movement.x = 0.0;
            p.life += dt;
        })
}

/// Dust kicked up behind a walking character; `dir[0]` is the walk direction
fn feet_dust() -> Behavior {
    Behavior::new()
        .on_prepare(|ctx, em| {
            let freq = default_prepare_emission(ctx, em);
            em.angle = vector_to_angle(ctx.ps.params.dir[0].to_vec().normalize_or_zero());
            em.angle_spread = 0.0;
            freq
        })
        .on_emit(|ctx, em, p| {
            let dvec = ctx.ps.params.dir[0].to_vec();
            default_emit_particle(ctx, em, p);
            p.pos -= dvec * 4.0;
            p.rot = 0.0;
            p.size = Vec2::new(1.2, 0.6);
        })
}

/// Pulls the guide back to the origin while drawing it lerped towards the target
fn missile_guide() -> Behavior {
    Behavior::new()
        .on_animate(|ctx, p| {
            default_animate_particle(ctx, p);
            let attract = (1.0 - p.particle_time()).min(1.0).powi(5).max(0.0001);
            p.pos *= (0.001 * attract).powf(ctx.time_delta);
        })
        .on_draw(|ctx, p, out| {
            let mut moved = *p;
            moved.pos += p.particle_time() * ctx.ps.target_off;
            default_draw_particle(ctx, &moved, out);
        })
}

/// Trail following the first sub-system's guide particle
fn missile_trail() -> Behavior {
    Behavior::new()
        .on_prepare(|ctx, em| {
            let freq = default_prepare_emission(ctx, em);
            let Some(guide) = ctx.ps.sub_systems[0].particles.first() else {
                return 0.0;
            };
            let strength = em.strength_max * (1.2 - guide.particle_time());
            em.strength_min = strength;
            em.strength_max = strength;
            freq
        })
        .on_emit(|ctx, em, p| {
            default_emit_particle(ctx, em, p);
            if let Some(guide) = ctx.ps.sub_systems[0].particles.first() {
                p.pos += guide.pos + guide.particle_time() * ctx.ps.target_off;
            }
        })
}

/// "Zzz" icons: always the first tile, slightly tilted
fn sleep_icon() -> Behavior {
    Behavior::new().on_emit(|ctx, em, p| {
        default_emit_particle(ctx, em, p);
        p.tex_tile = UVec2::ZERO;
        p.rot = ctx.uniform(-0.2, 0.2);
    })
}
