//! Quad generation: one textured, rotated quad per live particle

use crate::behavior::DrawContext;
use crate::registry::FxRegistry;
use crate::system::ParticleSystem;
use crate::texture::TextureName;
use bytemuck::{Pod, Zeroable};
use ember_core::{UVec2, Vec2, Vec4};
use serde::Serialize;

/// Render record for one particle, in world space
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DrawParticle {
    /// Quad center
    pub position: Vec2,
    /// Full width and height
    pub size: Vec2,
    /// Radians, clockwise with +y down
    pub rotation: f32,
    /// Linear rgba
    pub color: Vec4,
    pub texture: TextureName,
    /// Selected tile (column, row) of the texture grid
    pub tex_tile: UVec2,
    /// Grid dimensions (columns, rows)
    pub tex_tiles: UVec2,
}

impl Default for DrawParticle {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            size: Vec2::ONE,
            rotation: 0.0,
            color: Vec4::ONE,
            texture: TextureName::default(),
            tex_tile: UVec2::ZERO,
            tex_tiles: UVec2::ONE,
        }
    }
}

impl DrawParticle {
    /// Corners in order top-left, top-right, bottom-right, bottom-left
    /// (before rotation)
    pub fn corners(&self) -> [Vec2; 4] {
        let half = self.size * 0.5;
        let rot = Vec2::from_angle(self.rotation);
        [
            Vec2::new(-half.x, -half.y),
            Vec2::new(half.x, -half.y),
            Vec2::new(half.x, half.y),
            Vec2::new(-half.x, half.y),
        ]
        .map(|c| self.position + rot.rotate(c))
    }

    /// Normalized texture rect `(min, max)` of the selected tile
    pub fn tex_coords(&self) -> (Vec2, Vec2) {
        let tiles = self.tex_tiles.max(UVec2::ONE).as_vec2();
        let min = self.tex_tile.as_vec2() / tiles;
        (min, min + Vec2::ONE / tiles)
    }

    /// Row-major index of the selected tile
    pub fn tile_index(&self) -> u32 {
        self.tex_tile
            .y
            .saturating_mul(self.tex_tiles.x.max(1))
            .saturating_add(self.tex_tile.x)
    }
}

/// GPU instance data for instanced quad drawing.
/// 48 bytes, 16-byte aligned (3 rows of vec4).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct QuadInstance {
    pub pos_size: [f32; 4],      // xy = position, zw = size
    pub color: [f32; 4],         // rgba
    pub rotation_tile: [f32; 4], // x = rotation, y = tile index, z = tiles_x, w = tiles_y
}

impl QuadInstance {
    pub fn from_draw(d: &DrawParticle) -> Self {
        Self {
            pos_size: [d.position.x, d.position.y, d.size.x, d.size.y],
            color: d.color.to_array(),
            rotation_tile: [
                d.rotation,
                d.tile_index() as f32,
                d.tex_tiles.x as f32,
                d.tex_tiles.y as f32,
            ],
        }
    }
}

/// Pack draw records into a vertex-buffer-ready instance array
pub fn pack_instances(quads: &[DrawParticle]) -> Vec<QuadInstance> {
    quads.iter().map(QuadInstance::from_draw).collect()
}

/// Draw records for every live particle of `systems`, in system, sub-system
/// and particle order. Dead systems contribute nothing.
pub(crate) fn gen_quads<'a>(
    registry: &FxRegistry,
    systems: impl Iterator<Item = &'a ParticleSystem>,
) -> Vec<DrawParticle> {
    let mut quads = Vec::new();
    for ps in systems.filter(|ps| ps.is_alive()) {
        for (ssid, (ssdef, ss)) in ps.def().sub_systems.iter().zip(&ps.sub_systems).enumerate() {
            let ctx = DrawContext {
                ps,
                ssid,
                pdef: &registry[ssdef.particle_id],
            };
            quads.reserve(ss.particles.len());
            for p in &ss.particles {
                let mut out = DrawParticle::default();
                ssdef.behavior.draw_particle(&ctx, p, &mut out);
                quads.push(out);
            }
        }
    }
    quads
}
