//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Caller-supplied timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod assets;
pub mod collision;
pub mod enemy;
pub mod entity;
pub mod loader;
pub mod physics;
pub mod player;
pub mod rect;
pub mod state;
pub mod tick;
pub mod tiles;

pub use assets::{SpriteMetrics, StockSprites};
pub use collision::{Collidable, Collider, ColliderRole, CollisionHandler, CollisionManager, Pair};
pub use enemy::{Enemy, EnemyKind, EnemyState};
pub use entity::{Body, Bullet, Collectible, CollectibleKind, EntityId, ExitMarker, Facing};
pub use loader::{LevelLayout, LoadError, parse_level};
pub use player::{MotionState, Player};
pub use rect::Rect;
pub use state::{GameEvent, LevelState};
pub use tick::{Level, TickInput, tick};
pub use tiles::{Tile, TileCollision, TileGrid};
