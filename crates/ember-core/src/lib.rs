//! Ember Core - Foundational types for the Ember effects engine
//!
//! This crate provides the types that the other Ember crates depend on:
//! - `Rect` - axis-aligned 2D rectangle used for spawn regions
//! - `Dir` - 8-way direction used as a free effect parameter
//! - Color helpers, angle helpers and re-exported `glam` vectors
//! - Error types and Result alias

mod error;
mod types;

pub use error::{EmberError, Result};
pub use glam::{UVec2, Vec2, Vec3, Vec4};
pub use types::{angle_to_vector, rgb8, vector_to_angle, Dir, Rect};
