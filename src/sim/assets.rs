//! Sprite size lookup
//!
//! The simulation never touches textures; it only needs frame sizes to build
//! collision boxes. The renderer side can provide real sizes, everything
//! else uses the stock ones.

use glam::Vec2;

use crate::consts::SPRITE_FRAME_SIZE;

/// Provides the frame size of a sprite sheet
pub trait SpriteMetrics {
    fn frame_size(&self, sprite: &str) -> Vec2;
}

/// Every stock sprite sheet uses 64x64 frames
#[derive(Debug, Clone, Copy, Default)]
pub struct StockSprites;

impl SpriteMetrics for StockSprites {
    fn frame_size(&self, _sprite: &str) -> Vec2 {
        Vec2::splat(SPRITE_FRAME_SIZE)
    }
}
