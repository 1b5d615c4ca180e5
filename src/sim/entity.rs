//! Shared entity record and the simple entity kinds
//!
//! Every collidable thing carries a `Body`. What differs between kinds lives
//! in the owning struct (`Player`, `Enemy`, `Collectible`, `Bullet`,
//! `ExitMarker`), and the collision layer tells them apart through
//! `ColliderRole`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Collidable, ColliderRole};
use super::rect::Rect;
use super::tiles::TileGrid;
use crate::consts::{BULLET_SIZE, TILE_HEIGHT, TILE_WIDTH};

/// Stable identity of a collidable; allocated by the level, never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Facing/moving direction along X
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Facing {
    #[default]
    Left,
    Right,
}

impl Facing {
    /// -1 for left, +1 for right
    #[inline]
    pub fn sign(self) -> i32 {
        match self {
            Facing::Left => -1,
            Facing::Right => 1,
        }
    }

    #[inline]
    pub fn signf(self) -> f32 {
        self.sign() as f32
    }

    pub fn reversed(self) -> Self {
        match self {
            Facing::Left => Facing::Right,
            Facing::Right => Facing::Left,
        }
    }

    /// Direction pointing from `from_x` toward `to_x` (right when equal)
    pub fn toward(from_x: f32, to_x: f32) -> Self {
        if to_x < from_x { Facing::Left } else { Facing::Right }
    }
}

/// State every collidable shares
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub id: EntityId,
    pub bounds: Rect,
    /// Terminal: once set the entity takes no further part in collisions or
    /// movement and is dropped from its owning list at the next purge
    pub flagged_for_removal: bool,
}

impl Body {
    pub fn new(id: EntityId, bounds: Rect) -> Self {
        Self {
            id,
            bounds,
            flagged_for_removal: false,
        }
    }

    /// Flag for removal. Returns false if it was already flagged.
    pub fn flag_for_removal(&mut self) -> bool {
        !std::mem::replace(&mut self.flagged_for_removal, true)
    }

    #[inline]
    pub fn is_live(&self) -> bool {
        !self.flagged_for_removal
    }
}

/// Powerup variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectibleKind {
    /// Worth points
    Gem,
    /// Unlocks the exit (when the level requires it)
    Key,
    /// Adds bullets
    Ammo,
}

/// A powerup sitting in the level, waiting for the player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collectible {
    pub body: Body,
    pub kind: CollectibleKind,
    /// Centre of the cell it was placed in
    pub position: Vec2,
}

impl Collectible {
    /// A tile-sized collectible centred on `position`
    pub fn new(id: EntityId, kind: CollectibleKind, position: Vec2) -> Self {
        let bounds = Rect::from_center(position, Vec2::new(TILE_WIDTH, TILE_HEIGHT));
        Self {
            body: Body::new(id, bounds),
            kind,
            position,
        }
    }

    pub fn at_cell(id: EntityId, kind: CollectibleKind, col: i32, row: i32) -> Self {
        Self::new(id, kind, TileGrid::center_of(col, row))
    }
}

/// A bullet in flight: straight horizontal line, no gravity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub body: Body,
    /// Centre of the bullet
    pub position: Vec2,
    pub direction: Facing,
    pub speed: f32,
}

impl Bullet {
    pub fn new(id: EntityId, position: Vec2, direction: Facing, speed: f32) -> Self {
        Self {
            body: Body::new(id, Self::bounds_at(position)),
            position,
            direction,
            speed,
        }
    }

    fn bounds_at(position: Vec2) -> Rect {
        Rect::from_center(position, Vec2::splat(BULLET_SIZE))
    }

    pub fn update(&mut self, dt: f32) {
        if self.body.flagged_for_removal {
            return;
        }
        self.position.x += self.direction.signf() * self.speed * dt;
        self.body.bounds = Self::bounds_at(self.position);
    }

    /// True once the bullet has left the level horizontally
    pub fn is_outside(&self, grid: &TileGrid) -> bool {
        self.body.bounds.right() <= 0.0 || self.body.bounds.left() >= grid.pixel_width()
    }
}

/// The exit tile as a collidable. Its anchor is the exit cell's centre; the
/// player is "at" the exit while its box contains that point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitMarker {
    pub body: Body,
    pub anchor: Vec2,
}

impl ExitMarker {
    pub fn at_cell(id: EntityId, col: i32, row: i32) -> Self {
        let bounds = TileGrid::bounds_of(col, row);
        Self {
            body: Body::new(id, bounds),
            anchor: bounds.center(),
        }
    }
}

impl Collidable for Collectible {
    fn body(&self) -> &Body {
        &self.body
    }

    fn role(&self) -> ColliderRole {
        ColliderRole::Collectible(self.kind)
    }
}

impl Collidable for Bullet {
    fn body(&self) -> &Body {
        &self.body
    }

    fn role(&self) -> ColliderRole {
        ColliderRole::Bullet
    }
}

impl Collidable for ExitMarker {
    fn body(&self) -> &Body {
        &self.body
    }

    fn role(&self) -> ColliderRole {
        ColliderRole::Exit { anchor: self.anchor }
    }
}
