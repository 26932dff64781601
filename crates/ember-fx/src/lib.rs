//! Ember FX - Data-driven 2D particle effects
//!
//! Provides the effects core that a game drives once per frame:
//! - Key-framed curves with linear, cosine and quadratic interpolation
//! - An append-only registry of particle, emitter and composite effect definitions
//! - Live effect instances behind generation-tagged handles
//! - Frame-rate independent simulation in fixed sub-steps with leaky-bucket emission
//! - Per-sub-system behavior hooks for custom emission, motion and drawing
//! - Quad generation plus a GPU-ready instance packing
//! - A built-in effect catalog and TOML catalog loading

pub mod behavior;
pub mod catalog;
pub mod config;
pub mod curves;
pub mod defs;
pub mod loader;
pub mod manager;
pub mod quads;
pub mod rand;
pub mod registry;
pub mod system;
pub mod texture;

mod stepper;

pub use behavior::{AnimationContext, Behavior, BehaviorLibrary, DrawContext, EmissionState};
pub use config::FxConfig;
pub use curves::{Curve, CurveValue, InterpKind};
pub use defs::{EmitterDef, EmitterDefId, ParticleDef, ParticleDefId, ParticleSystemDef, SubSystemDef};
pub use loader::{load_catalog_file, load_catalog_str};
pub use manager::{FxManager, FxStats};
pub use quads::{pack_instances, DrawParticle, QuadInstance};
pub use registry::FxRegistry;
pub use system::{Particle, ParticleSystem, ParticleSystemId, SubSystem, SystemParams, SystemState};
pub use texture::TextureName;
