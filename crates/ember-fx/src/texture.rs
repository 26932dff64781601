//! Texture atlas references. Effects name textures; loading them is the renderer's job.

use ember_core::UVec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureName {
    #[default]
    Circular,
    CircularStrong,
    FlakesBorders,
    WaterDrops,
    CloudsSoft,
    CloudsSoftBorders,
    CloudsAdd,
    Torus,
    TorusBottom,
    TorusBottomBlurred,
    MagicMissile,
    Flames,
    FlamesBlurred,
    AirBlast,
    Special,
}

impl TextureName {
    pub const ALL: [TextureName; 15] = [
        TextureName::Circular,
        TextureName::CircularStrong,
        TextureName::FlakesBorders,
        TextureName::WaterDrops,
        TextureName::CloudsSoft,
        TextureName::CloudsSoftBorders,
        TextureName::CloudsAdd,
        TextureName::Torus,
        TextureName::TorusBottom,
        TextureName::TorusBottomBlurred,
        TextureName::MagicMissile,
        TextureName::Flames,
        TextureName::FlamesBlurred,
        TextureName::AirBlast,
        TextureName::Special,
    ];

    /// Atlas file the renderer should bind for this texture
    pub fn file_name(self) -> &'static str {
        match self {
            TextureName::Circular => "circular.png",
            TextureName::CircularStrong => "circular_strong.png",
            TextureName::FlakesBorders => "flakes_4x4_borders.png",
            TextureName::WaterDrops => "water_drops_4x4.png",
            TextureName::CloudsSoft => "clouds_soft_4x4.png",
            TextureName::CloudsSoftBorders => "clouds_soft_borders_4x4.png",
            TextureName::CloudsAdd => "clouds_add_4x4.png",
            TextureName::Torus => "torus.png",
            TextureName::TorusBottom => "torus_bottom.png",
            TextureName::TorusBottomBlurred => "torus_bottom_blurred.png",
            TextureName::MagicMissile => "magic_missile_4x4.png",
            TextureName::Flames => "flames_4x4.png",
            TextureName::FlamesBlurred => "flames_blurred_4x4.png",
            TextureName::AirBlast => "air_blast_4x4.png",
            TextureName::Special => "special_4x1.png",
        }
    }

    /// Tile grid of the atlas (columns, rows)
    pub fn tiles(self) -> UVec2 {
        match self {
            TextureName::Circular
            | TextureName::CircularStrong
            | TextureName::Torus
            | TextureName::TorusBottom
            | TextureName::TorusBottomBlurred => UVec2::ONE,
            TextureName::Special => UVec2::new(4, 1),
            _ => UVec2::new(4, 4),
        }
    }
}
