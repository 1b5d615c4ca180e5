//! Enemy behaviours
//!
//! All enemies share one record and one terrain probe; what they do with it
//! depends on `EnemyKind`:
//!
//! - `Patrol`: walks back and forth, pausing at walls and ledges before
//!   turning around.
//! - `Sentry`: stands still until the player comes level with it, then runs
//!   at the player and stops dead at the first wall or ledge.
//! - `Hunter`: patrols like `Patrol` but switches to chasing when the player
//!   is level with it. A wall or ledge always drops it to idle, chasing or
//!   not; after the wait it turns around and patrols again.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Collidable, ColliderRole};
use super::entity::{Body, EntityId, Facing};
use super::rect::Rect;
use super::tiles::{TileCollision, TileGrid};
use crate::settings::EnemyTuning;

/// Behaviour variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Patrol,
    Sentry,
    Hunter,
}

/// Behaviour state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyState {
    Idle,
    Patrolling,
    Chasing,
}

/// A monster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub body: Body,
    pub kind: EnemyKind,
    /// Bottom centre of the sprite
    pub position: Vec2,
    pub facing: Facing,
    pub state: EnemyState,
    /// Patrol: time left before turning. Hunter: time spent idle so far.
    pub wait_time: f32,
    size: Vec2,
}

impl Enemy {
    pub fn new(id: EntityId, kind: EnemyKind, position: Vec2, frame: Vec2) -> Self {
        let state = match kind {
            EnemyKind::Patrol | EnemyKind::Hunter => EnemyState::Patrolling,
            EnemyKind::Sentry => EnemyState::Idle,
        };
        Self {
            body: Body::new(id, Rect::from_bottom_center(position, frame)),
            kind,
            position,
            facing: Facing::Left,
            state,
            wait_time: 0.0,
            size: frame,
        }
    }

    /// Wall one row up, or no floor, in the column ahead of the leading edge
    pub fn blocked_ahead(&self, grid: &TileGrid) -> bool {
        let dir = self.facing.sign();
        let edge_x = self.position.x + (self.size.x / 2.0).floor() * dir as f32;
        let tile_x = TileGrid::column_at(edge_x) - dir;
        let tile_y = TileGrid::row_at(self.position.y);
        let probe = tile_x + dir;

        grid.classify(probe, tile_y - 1) == TileCollision::Impassable
            || grid.classify(probe, tile_y) == TileCollision::Passable
    }

    /// Player's feet within the chase band of ours
    fn can_see(&self, player: Vec2, tuning: &EnemyTuning) -> bool {
        player.y < self.position.y + tuning.chase_band && player.y > self.position.y - tuning.chase_band
    }

    fn step(&mut self, speed: f32, dt: f32) {
        self.position.x += self.facing.signf() * speed * dt;
        self.body.bounds = Rect::from_bottom_center(self.position, self.size);
    }

    fn spot(&mut self, player: Vec2, tuning: &EnemyTuning) {
        if self.can_see(player, tuning) {
            if self.state != EnemyState::Chasing {
                log::debug!("{:?} spotted the player", self.body.id);
            }
            self.state = EnemyState::Chasing;
            self.facing = Facing::toward(self.position.x, player.x);
        }
    }

    /// Advance one tick. `player` is the player's foot position.
    pub fn update(&mut self, dt: f32, grid: &TileGrid, player: Vec2, tuning: &EnemyTuning) {
        if self.body.flagged_for_removal {
            return;
        }
        match self.kind {
            EnemyKind::Patrol => self.update_patrol(dt, grid, tuning),
            EnemyKind::Sentry => self.update_sentry(dt, grid, player, tuning),
            EnemyKind::Hunter => self.update_hunter(dt, grid, player, tuning),
        }
    }

    fn update_patrol(&mut self, dt: f32, grid: &TileGrid, tuning: &EnemyTuning) {
        if self.wait_time > 0.0 {
            self.wait_time = (self.wait_time - dt).max(0.0);
            if self.wait_time <= 0.0 {
                self.facing = self.facing.reversed();
                self.state = EnemyState::Patrolling;
            }
        } else if self.blocked_ahead(grid) {
            self.wait_time = tuning.max_wait_time;
            self.state = EnemyState::Idle;
        } else {
            self.state = EnemyState::Patrolling;
            self.step(tuning.speed, dt);
        }
    }

    fn update_sentry(&mut self, dt: f32, grid: &TileGrid, player: Vec2, tuning: &EnemyTuning) {
        self.spot(player, tuning);

        if self.state == EnemyState::Idle {
            self.wait_time = (self.wait_time - dt).max(0.0);
        } else if self.blocked_ahead(grid) {
            self.wait_time = tuning.max_wait_time;
            self.state = EnemyState::Idle;
        } else {
            self.step(tuning.chase_speed, dt);
        }
    }

    fn update_hunter(&mut self, dt: f32, grid: &TileGrid, player: Vec2, tuning: &EnemyTuning) {
        self.spot(player, tuning);

        if self.state == EnemyState::Idle {
            self.wait_time += dt;
            if self.wait_time >= tuning.max_wait_time {
                self.wait_time = 0.0;
                self.state = EnemyState::Patrolling;
                self.facing = self.facing.reversed();
            }
        }

        // Applies to chasing too: a hunter never runs off a ledge after the player
        if self.state != EnemyState::Idle && self.blocked_ahead(grid) {
            self.wait_time = 0.0;
            self.state = EnemyState::Idle;
        } else if self.state == EnemyState::Patrolling {
            self.step(tuning.speed, dt);
        } else if self.state == EnemyState::Chasing {
            self.step(tuning.chase_speed, dt);
        }
    }
}

impl Collidable for Enemy {
    fn body(&self) -> &Body {
        &self.body
    }

    fn role(&self) -> ColliderRole {
        ColliderRole::Enemy
    }
}
