//! Effect listing command

use super::build_registry;
use anyhow::Result;
use ember_fx::FxConfig;
use std::path::PathBuf;

pub fn run(config: &FxConfig, catalogs: &[PathBuf], verbose: bool) -> Result<()> {
    let registry = build_registry(config, catalogs)?;

    for name in registry.system_names() {
        let Some(def) = registry.system_def(name) else {
            continue;
        };
        let looped = if def.is_looped { " (looped)" } else { "" };
        println!(
            "{:<16} {} sub-system(s), {:.2}s{}",
            name,
            def.sub_systems.len(),
            def.effective_length(),
            looped
        );

        if verbose {
            for (i, ss) in def.sub_systems.iter().enumerate() {
                let pdef = &registry[ss.particle_id];
                let max_total = if ss.max_total_particles == usize::MAX {
                    "-".to_string()
                } else {
                    ss.max_total_particles.to_string()
                };
                println!(
                    "  [{}] window {:.2}..{:.2}  life {:.2}s  texture {}  max total {}  max active {}{}",
                    i,
                    ss.emission_start,
                    ss.emission_end,
                    pdef.life,
                    pdef.texture.file_name(),
                    max_total,
                    ss.max_active_particles,
                    if ss.behavior.is_default() { "" } else { "  (custom behavior)" }
                );
            }
        }
    }

    println!();
    println!("{} effect(s)", registry.num_systems());
    Ok(())
}
