//! Headless simulation command

use super::build_registry;
use anyhow::{bail, Context, Result};
use ember_core::Vec2;
use ember_fx::{DrawParticle, FxConfig, FxManager};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

pub struct SimulateArgs {
    pub effect: String,
    pub seconds: f64,
    pub fps: Option<u32>,
    pub seed: Option<u32>,
    pub target: Option<[f32; 2]>,
    pub param: Option<f32>,
    pub catalog: Vec<PathBuf>,
    pub json: bool,
}

#[derive(Serialize)]
struct SimulationReport<'a> {
    effect: &'a str,
    seconds: f64,
    fps: u32,
    seed: u32,
    alive: bool,
    quads: Vec<DrawParticle>,
}

pub fn run(config: &FxConfig, args: SimulateArgs) -> Result<()> {
    let fps = args.fps.unwrap_or(config.desired_fps);
    if fps == 0 {
        bail!("--fps must be positive");
    }
    if !(args.seconds.is_finite() && args.seconds >= 0.0) {
        bail!("--seconds must be a non-negative number");
    }
    let seed = args.seed.unwrap_or(config.random_seed);

    let registry = build_registry(config, &args.catalog)?;
    registry
        .require_system(&args.effect)
        .with_context(|| format!("Available: {}", registry.system_names().join(", ")))?;

    log::info!(
        "Simulating '{}' for {:.2}s at {} fps (seed {})",
        args.effect,
        args.seconds,
        fps,
        seed
    );
    let mut manager = FxManager::with_seed(Arc::new(registry), seed);
    let target = args.target.map(Vec2::from).unwrap_or(Vec2::ZERO);
    let id = manager.spawn_with_target(&args.effect, Vec2::ZERO, target);
    if let (Some(value), Some(params)) = (args.param, manager.params_mut(id)) {
        params.scalar[0] = value;
    }

    let frame_time = 1.0 / fps as f64;
    let frames = (args.seconds * fps as f64).round() as u64;
    if !args.json {
        println!("{:>6} {:>8} {:>8} {:>10}", "frame", "time", "systems", "particles");
    }
    for frame in 1..=frames {
        manager.simulate_stable(frame_time, fps);
        if !args.json {
            let stats = manager.stats();
            println!(
                "{:>6} {:>8.3} {:>8} {:>10}",
                frame,
                frame as f64 * frame_time,
                stats.systems,
                stats.particles
            );
        }
    }

    if args.json {
        let report = SimulationReport {
            effect: &args.effect,
            seconds: args.seconds,
            fps,
            seed,
            alive: manager.alive(id),
            quads: manager.gen_quads(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if manager.dead(id) {
        println!("Effect finished");
    }

    Ok(())
}
