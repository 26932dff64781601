//! Definition registry: append-only tables of effect templates
//!
//! The registry is filled once during startup and then shared read-only
//! (`Arc<FxRegistry>`) with every [`FxManager`](crate::FxManager). Once it is
//! shared there is no `&mut` path left, so nothing can be registered after
//! simulation has begun.

use crate::catalog;
use crate::defs::{EmitterDef, EmitterDefId, ParticleDef, ParticleDefId, ParticleSystemDef};
use ember_core::{EmberError, Result};
use std::collections::HashMap;
use std::ops::Index;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct FxRegistry {
    particle_defs: Vec<ParticleDef>,
    emitter_defs: Vec<EmitterDef>,
    system_defs: HashMap<String, Arc<ParticleSystemDef>>,
}

impl FxRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in effect catalog
    pub fn with_default_effects() -> Self {
        let mut registry = Self::new();
        catalog::add_default_defs(&mut registry);
        registry
    }

    pub fn add_particle_def(&mut self, def: ParticleDef) -> ParticleDefId {
        self.particle_defs.push(def);
        ParticleDefId((self.particle_defs.len() - 1) as u32)
    }

    pub fn add_emitter_def(&mut self, def: EmitterDef) -> EmitterDefId {
        self.emitter_defs.push(def);
        EmitterDefId((self.emitter_defs.len() - 1) as u32)
    }

    /// Insert a composite system under its name, replacing any earlier one.
    ///
    /// # Panics
    ///
    /// Panics if a sub-system refers to a particle or emitter handle that was
    /// not returned by this registry.
    pub fn add_system_def(&mut self, def: ParticleSystemDef) {
        for (i, ss) in def.sub_systems.iter().enumerate() {
            assert!(
                self.valid_particle(ss.particle_id),
                "system '{}' sub-system {i}: unknown {:?}",
                def.name,
                ss.particle_id
            );
            assert!(
                self.valid_emitter(ss.emitter_id),
                "system '{}' sub-system {i}: unknown {:?}",
                def.name,
                ss.emitter_id
            );
        }
        if self.system_defs.contains_key(&def.name) {
            log::debug!("Replacing effect definition '{}'", def.name);
        }
        self.system_defs.insert(def.name.clone(), Arc::new(def));
    }

    pub fn valid_particle(&self, id: ParticleDefId) -> bool {
        id.index() < self.particle_defs.len()
    }

    pub fn valid_emitter(&self, id: EmitterDefId) -> bool {
        id.index() < self.emitter_defs.len()
    }

    pub fn particle_defs(&self) -> &[ParticleDef] {
        &self.particle_defs
    }

    pub fn emitter_defs(&self) -> &[EmitterDef] {
        &self.emitter_defs
    }

    pub fn system_def(&self, name: &str) -> Option<&Arc<ParticleSystemDef>> {
        self.system_defs.get(name)
    }

    /// Like [`system_def`](Self::system_def), but a missing name is an error
    pub fn require_system(&self, name: &str) -> Result<&Arc<ParticleSystemDef>> {
        self.system_defs
            .get(name)
            .ok_or_else(|| EmberError::UnknownEffect(name.to_string()))
    }

    pub fn contains_system(&self, name: &str) -> bool {
        self.system_defs.contains_key(name)
    }

    /// Registered effect names, sorted
    pub fn system_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.system_defs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn num_systems(&self) -> usize {
        self.system_defs.len()
    }
}

impl Index<ParticleDefId> for FxRegistry {
    type Output = ParticleDef;

    fn index(&self, id: ParticleDefId) -> &ParticleDef {
        &self.particle_defs[id.index()]
    }
}

impl Index<EmitterDefId> for FxRegistry {
    type Output = EmitterDef;

    fn index(&self, id: EmitterDefId) -> &EmitterDef {
        &self.emitter_defs[id.index()]
    }
}
