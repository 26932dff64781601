//! CLI command implementations

pub mod list;
pub mod simulate;

use anyhow::{Context, Result};
use ember_fx::{load_catalog_file, BehaviorLibrary, FxConfig, FxRegistry};
use std::path::{Path, PathBuf};

pub fn load_config(path: Option<&Path>) -> Result<FxConfig> {
    match path {
        Some(path) => FxConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(FxConfig::default()),
    }
}

/// Registry from the config plus any catalogs given on the command line
pub fn build_registry(config: &FxConfig, extra_catalogs: &[PathBuf]) -> Result<FxRegistry> {
    let mut registry = config.build_registry().context("Failed to build effect registry")?;
    let behaviors = BehaviorLibrary::builtin();
    for path in extra_catalogs {
        load_catalog_file(&mut registry, &behaviors, path)
            .with_context(|| format!("Failed to load catalog {}", path.display()))?;
    }
    Ok(registry)
}
