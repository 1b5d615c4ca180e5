//! Player controller and physics
//!
//! Commands (move, jump) are latched between ticks and consumed by
//! `apply_physics`. Physics always runs, alive or dead; a dead player just
//! ignores commands and falls.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Collidable, ColliderRole};
use super::entity::{Body, EntityId, Facing};
use super::physics::move_and_collide;
use super::rect::Rect;
use super::tiles::TileGrid;
use crate::approach_zero;
use crate::settings::PlayerTuning;

/// Vertical movement phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionState {
    OnGround,
    /// Moving upward
    Jumping,
    /// Moving downward without support
    Falling,
}

/// What happened during one physics step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhysicsOutcome {
    pub jumped: bool,
    pub landed: bool,
}

/// The player character
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub body: Body,
    /// Bottom centre of the collision box
    pub position: Vec2,
    pub velocity: Vec2,
    pub facing: Facing,
    pub motion: MotionState,
    pub alive: bool,
    pub reached_exit: bool,
    size: Vec2,
    tuning: PlayerTuning,
    /// -1, 0 or 1; cleared after every physics step
    move_input: f32,
    jump_buffer: f32,
    coyote: f32,
    invulnerable_for: f32,
}

impl Player {
    /// `frame` is the sprite frame size; the box is a fraction of it
    pub fn new(id: EntityId, start: Vec2, frame: Vec2, tuning: PlayerTuning) -> Self {
        let size = Vec2::new(
            (frame.x * tuning.bounds_width_factor).round(),
            (frame.y * tuning.bounds_height_factor).round(),
        );
        Self {
            body: Body::new(id, Rect::from_bottom_center(start, size)),
            position: start,
            velocity: Vec2::ZERO,
            facing: Facing::Right,
            motion: MotionState::OnGround,
            alive: true,
            reached_exit: false,
            size,
            tuning,
            move_input: 0.0,
            jump_buffer: 0.0,
            coyote: 0.0,
            invulnerable_for: 0.0,
        }
    }

    /// Bring the player back to life at `start`
    pub fn reset(&mut self, start: Vec2) {
        self.position = start;
        self.velocity = Vec2::ZERO;
        self.motion = MotionState::OnGround;
        self.alive = true;
        self.reached_exit = false;
        self.move_input = 0.0;
        self.jump_buffer = 0.0;
        self.coyote = 0.0;
        self.invulnerable_for = self.tuning.respawn_invulnerability;
        self.sync_bounds();
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn is_on_ground(&self) -> bool {
        self.motion == MotionState::OnGround
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_for > 0.0
    }

    pub fn move_left(&mut self) {
        self.move_input = -1.0;
        self.facing = Facing::Left;
    }

    pub fn move_right(&mut self) {
        self.move_input = 1.0;
        self.facing = Facing::Right;
    }

    /// Request a jump; honoured now or when landing within the buffer window
    pub fn jump(&mut self) {
        if self.alive {
            self.jump_buffer = self.tuning.jump_buffer_time;
        }
    }

    /// Kill the player. Enemy hits are ignored while invulnerable; falling
    /// out of the level is always fatal. Returns false if nothing changed.
    pub fn kill(&mut self, by_enemy: bool) -> bool {
        if !self.alive || (by_enemy && self.is_invulnerable()) {
            return false;
        }
        self.alive = false;
        self.velocity.x = 0.0;
        self.move_input = 0.0;
        self.jump_buffer = 0.0;
        true
    }

    pub fn on_reached_exit(&mut self) {
        self.reached_exit = true;
        self.velocity.x = 0.0;
    }

    fn sync_bounds(&mut self) {
        self.body.bounds = Rect::from_bottom_center(self.position, self.size);
    }

    /// Integrate velocity and resolve against the grid
    pub fn apply_physics(&mut self, dt: f32, grid: &TileGrid) -> PhysicsOutcome {
        let t = &self.tuning;
        let mut outcome = PhysicsOutcome::default();
        let was_on_ground = self.is_on_ground();
        self.invulnerable_for = (self.invulnerable_for - dt).max(0.0);

        let input = if self.alive && !self.reached_exit { self.move_input } else { 0.0 };
        if input != 0.0 {
            self.velocity.x =
                (self.velocity.x + input * t.move_acceleration * dt).clamp(-t.max_move_speed, t.max_move_speed);
        } else {
            self.velocity.x = approach_zero(self.velocity.x, t.friction * dt);
        }

        self.velocity.y = (self.velocity.y + t.gravity * dt).min(t.max_fall_speed);

        self.coyote = if was_on_ground { t.coyote_time } else { (self.coyote - dt).max(0.0) };
        if self.alive && self.jump_buffer > 0.0 && (was_on_ground || self.coyote > 0.0) {
            self.velocity.y = -t.jump_velocity;
            self.jump_buffer = 0.0;
            self.coyote = 0.0;
            outcome.jumped = true;
        }
        self.jump_buffer = (self.jump_buffer - dt).max(0.0);

        let (rect, contacts) = move_and_collide(self.body.bounds, self.velocity * dt, grid);
        if contacts.wall {
            self.velocity.x = 0.0;
        }
        if contacts.ceiling && self.velocity.y < 0.0 {
            self.velocity.y = 0.0;
        }
        if contacts.ground {
            self.velocity.y = 0.0;
        }
        self.body.bounds = rect;
        self.position = rect.bottom_center();

        self.motion = if contacts.ground {
            MotionState::OnGround
        } else if self.velocity.y < 0.0 {
            MotionState::Jumping
        } else {
            MotionState::Falling
        };
        outcome.landed = contacts.ground && !was_on_ground;
        self.move_input = 0.0;
        outcome
    }

    /// True once the top of the box is below the last row
    pub fn fell_out(&self, grid: &TileGrid) -> bool {
        self.body.bounds.top() >= grid.pixel_height()
    }
}

impl Collidable for Player {
    fn body(&self) -> &Body {
        &self.body
    }

    fn role(&self) -> ColliderRole {
        ColliderRole::Player
    }
}
