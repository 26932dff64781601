//! Effects configuration
//!
//! ```toml
//! desired_fps = 60
//! random_seed = 1234
//! catalogs = ["fx/spells.toml", "fx/weather.toml"]
//! ```

use crate::behavior::BehaviorLibrary;
use crate::loader;
use crate::registry::FxRegistry;
use ember_core::{EmberError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FxConfig {
    /// Fixed simulation rate used by `simulate_stable`
    pub desired_fps: u32,
    pub random_seed: u32,
    /// Extra TOML effect catalogs, loaded after the built-in effects
    pub catalogs: Vec<PathBuf>,
}

impl Default for FxConfig {
    fn default() -> Self {
        Self {
            desired_fps: 60,
            random_seed: 0xDEAD_BEEF,
            catalogs: Vec::new(),
        }
    }
}

impl FxConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: FxConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a file. Relative catalog paths are resolved against
    /// the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content).map_err(|e| {
            EmberError::InvalidConfig(format!("{}: {}", path.display(), e))
        })?;
        if let Some(dir) = path.parent() {
            for catalog in &mut config.catalogs {
                if catalog.is_relative() {
                    *catalog = dir.join(&*catalog);
                }
            }
        }
        log::info!(
            "Loaded effects config {} ({} fps, {} catalogs)",
            path.display(),
            config.desired_fps,
            config.catalogs.len()
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.desired_fps == 0 {
            return Err(EmberError::InvalidConfig("desired_fps must be positive".into()));
        }
        Ok(())
    }

    /// Built-in effects plus every configured catalog, resolving behavior
    /// names against the built-in behavior library.
    pub fn build_registry(&self) -> Result<FxRegistry> {
        let mut registry = FxRegistry::with_default_effects();
        let behaviors = BehaviorLibrary::builtin();
        for path in &self.catalogs {
            loader::load_catalog_file(&mut registry, &behaviors, path)?;
        }
        Ok(registry)
    }
}
