//! TOML effect catalogs
//!
//! A catalog file lists effects whose sub-systems carry their particle and
//! emitter definitions inline:
//! ```toml
//! [[effect]]
//! name = "sparks"
//!
//! [[effect.sub_system]]
//! window = [0.0, 0.3]
//! max_total = 12
//! behavior = "splinter_fall"
//!
//! [effect.sub_system.particle]
//! life = 0.8
//! size = [4.0, 1.0]
//! color = { keys = [0.0, 1.0], values = [[1.0, 0.9, 0.3], [0.8, 0.2, 0.0]] }
//!
//! [effect.sub_system.emitter]
//! strength_min = 40.0
//! strength_max = 80.0
//! frequency = 999.0
//! ```

use crate::behavior::{Behavior, BehaviorLibrary};
use crate::defs::{EmitterDef, EmitterDefId, ParticleDef, ParticleDefId, ParticleSystemDef, SubSystemDef};
use crate::registry::FxRegistry;
use ember_core::{EmberError, Result};
use serde::Deserialize;
use std::path::Path;

/// Upper bound on sprite-sheet columns and rows accepted from data files
const MAX_GRID_TILES: u32 = 256;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    #[serde(default)]
    effect: Vec<EffectEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EffectEntry {
    name: String,
    #[serde(default)]
    looped: bool,
    #[serde(default)]
    anim_length: Option<f32>,
    #[serde(default)]
    sub_system: Vec<SubSystemEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SubSystemEntry {
    #[serde(default)]
    particle: ParticleDef,
    #[serde(default)]
    emitter: EmitterDef,
    /// Emission window `[start, end]` in seconds
    window: [f32; 2],
    max_total: Option<usize>,
    max_active: Option<usize>,
    behavior: Option<String>,
}

/// Load a catalog file into `registry`. Returns the names of the effects
/// it defined.
pub fn load_catalog_file(
    registry: &mut FxRegistry,
    behaviors: &BehaviorLibrary,
    path: &Path,
) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    let names = load_catalog_str(registry, behaviors, &content).map_err(|e| match e {
        EmberError::TomlParseError(msg) => {
            EmberError::TomlParseError(format!("{}: {}", path.display(), msg))
        }
        other => other,
    })?;
    log::info!("Loaded {} effects from {}", names.len(), path.display());
    Ok(names)
}

/// Parse a catalog and register its effects.
///
/// Every effect is validated before anything is registered, so a failing
/// catalog leaves `registry` untouched.
pub fn load_catalog_str(
    registry: &mut FxRegistry,
    behaviors: &BehaviorLibrary,
    content: &str,
) -> Result<Vec<String>> {
    let file: CatalogFile = toml::from_str(content)?;

    // Handles are sequential, so the ones registration will hand out are
    // known up front and every definition can be validated first.
    let mut next_particle = registry.particle_defs().len();
    let mut next_emitter = registry.emitter_defs().len();
    let mut pending = Vec::with_capacity(file.effect.len());

    for effect in file.effect {
        check_entry(&effect)?;
        let mut def = ParticleSystemDef {
            name: effect.name,
            anim_length: effect.anim_length,
            is_looped: effect.looped,
            sub_systems: Vec::with_capacity(effect.sub_system.len()),
        };
        let mut inline_defs = Vec::with_capacity(effect.sub_system.len());
        for entry in effect.sub_system {
            let behavior = match &entry.behavior {
                Some(name) => behaviors.get(name).cloned().ok_or_else(|| {
                    EmberError::UnknownBehavior(format!("{name} (effect '{}')", def.name))
                })?,
                None => Behavior::default(),
            };
            let [start, end] = entry.window;
            let mut ssdef = SubSystemDef::new(
                ParticleDefId(next_particle as u32),
                EmitterDefId(next_emitter as u32),
                start,
                end,
            )
            .with_behavior(behavior);
            if let Some(count) = entry.max_total {
                ssdef = ssdef.with_max_total(count);
            }
            if let Some(count) = entry.max_active {
                ssdef = ssdef.with_max_active(count);
            }
            def.sub_systems.push(ssdef);
            inline_defs.push((entry.particle, entry.emitter));
            next_particle += 1;
            next_emitter += 1;
        }
        def.validate()?;
        pending.push((def, inline_defs));
    }

    let mut names = Vec::with_capacity(pending.len());
    for (def, inline_defs) in pending {
        for (ssdef, (pdef, edef)) in def.sub_systems.iter().zip(inline_defs) {
            let particle_id = registry.add_particle_def(pdef);
            let emitter_id = registry.add_emitter_def(edef);
            debug_assert_eq!((particle_id, emitter_id), (ssdef.particle_id, ssdef.emitter_id));
        }
        names.push(def.name.clone());
        registry.add_system_def(def);
    }
    Ok(names)
}

/// Checks the inline definitions that `ParticleSystemDef::validate` can't see
fn check_entry(effect: &EffectEntry) -> Result<()> {
    let invalid = |reason: String| EmberError::InvalidDefinition {
        name: effect.name.clone(),
        reason,
    };
    for (i, ss) in effect.sub_system.iter().enumerate() {
        let p = &ss.particle;
        if !(p.life.is_finite() && p.life > 0.0) {
            return Err(invalid(format!("sub-system {i}: life must be positive")));
        }
        let tiles = p.texture_tiles;
        if tiles.x == 0 || tiles.y == 0 {
            return Err(invalid(format!("sub-system {i}: texture_tiles must be non-zero")));
        }
        if tiles.x > MAX_GRID_TILES || tiles.y > MAX_GRID_TILES {
            return Err(invalid(format!(
                "sub-system {i}: texture_tiles {}x{} exceeds {MAX_GRID_TILES} per axis",
                tiles.x, tiles.y
            )));
        }
        let e = &ss.emitter;
        if e.strength_max < e.strength_min {
            return Err(invalid(format!("sub-system {i}: strength_max < strength_min")));
        }
        if e.rotation_speed_max < e.rotation_speed_min {
            return Err(invalid(format!(
                "sub-system {i}: rotation_speed_max < rotation_speed_min"
            )));
        }
    }
    Ok(())
}
