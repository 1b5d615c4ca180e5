//! Level state and collision reactions
//!
//! `LevelState` is everything a level owns except the collision manager:
//! the grid, the entity lists, score, timer and flags. The collision manager
//! dispatches into it through `CollisionHandler`; reactions only set flags
//! and counters, the owning `Level` purges flagged entities afterwards.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::CollisionHandler;
use super::enemy::Enemy;
use super::entity::{Bullet, Collectible, CollectibleKind, EntityId, ExitMarker, Facing};
use super::player::Player;
use super::tiles::{TileCollision, TileGrid};
use crate::settings::Tuning;

/// Something the HUD or audio side may want to react to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    GemCollected,
    AmmoCollected,
    KeyCollected,
    EnemyKilled,
    /// `by` is the enemy, or `None` for a fall
    PlayerKilled { by: Option<EntityId> },
    PlayerJumped,
    ShotFired,
    /// Score at the moment the player stepped onto the exit
    ExitReached { score: u32 },
    /// Time bonus fully paid out; `score` is final
    LevelComplete { score: u32 },
}

/// Which list an id lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Player,
    Enemy(usize),
    Collectible(usize),
    Bullet(usize),
    Exit,
}

/// Everything a running level owns apart from collision bookkeeping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelState {
    pub tuning: Tuning,
    pub grid: TileGrid,
    /// Player foot position at the start cell
    pub start: Vec2,
    pub player: Player,
    /// Sorted by id
    pub enemies: Vec<Enemy>,
    /// Sorted by id
    pub collectibles: Vec<Collectible>,
    /// Sorted by id
    pub bullets: Vec<Bullet>,
    pub exit: ExitMarker,
    pub score: u32,
    pub ammo: u32,
    pub has_key: bool,
    /// Countdown in seconds, never negative
    pub time_remaining: f32,
    pub reached_exit: bool,
    pub has_game_ended: bool,
    /// Time bonus paid out after reaching the exit
    pub bonus_paid: bool,
    colliding_with_exit: bool,
    events: Vec<GameEvent>,
    next_id: u32,
}

impl LevelState {
    pub fn new(
        tuning: Tuning,
        grid: TileGrid,
        start: Vec2,
        player: Player,
        exit: ExitMarker,
        next_id: u32,
    ) -> Self {
        Self {
            ammo: tuning.collectibles.starting_ammo,
            time_remaining: tuning.level.time_limit,
            tuning,
            grid,
            start,
            player,
            enemies: Vec::new(),
            collectibles: Vec::new(),
            bullets: Vec::new(),
            exit,
            score: 0,
            has_key: false,
            reached_exit: false,
            has_game_ended: false,
            bonus_paid: false,
            colliding_with_exit: false,
            events: Vec::new(),
            next_id,
        }
    }

    /// Allocate a new entity id
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Tile collision kind at a cell, boundary policy included
    pub fn collision_at(&self, col: i32, row: i32) -> TileCollision {
        self.grid.classify(col, row)
    }

    pub fn colliding_with_exit(&self) -> bool {
        self.colliding_with_exit
    }

    pub fn set_colliding_with_exit(&mut self, colliding: bool) {
        self.colliding_with_exit = colliding;
    }

    pub fn notify_gem_collected(&mut self, gem: EntityId) {
        self.score += self.tuning.collectibles.gem_points;
        log::debug!("{gem:?} collected, score {}", self.score);
        self.push_event(GameEvent::GemCollected);
    }

    pub fn notify_ammo_collected(&mut self, ammo: EntityId) {
        self.ammo += self.tuning.collectibles.ammo_per_pickup;
        log::debug!("{ammo:?} collected, {} bullets", self.ammo);
        self.push_event(GameEvent::AmmoCollected);
    }

    pub fn notify_key_collected(&mut self, key: EntityId) {
        self.has_key = true;
        log::debug!("{key:?} collected");
        self.push_event(GameEvent::KeyCollected);
    }

    pub fn notify_enemy_killed(&mut self, enemy: EntityId) {
        log::debug!("{enemy:?} killed");
        self.push_event(GameEvent::EnemyKilled);
    }

    /// `killer` is `None` when the player fell out of the level
    pub fn notify_player_killed(&mut self, killer: Option<EntityId>) {
        if self.reached_exit {
            return;
        }
        if !self.player.kill(killer.is_some()) {
            log::trace!("Kill by {killer:?} ignored");
            return;
        }
        self.has_game_ended = true;
        match killer {
            Some(enemy) => log::info!("Player killed by {enemy:?}"),
            None => log::info!("Player fell out of the level"),
        }
        self.push_event(GameEvent::PlayerKilled { by: killer });
    }

    pub fn notify_exit_reached(&mut self) {
        if self.reached_exit || !self.colliding_with_exit {
            return;
        }
        self.reached_exit = true;
        self.has_game_ended = true;
        self.player.on_reached_exit();
        log::info!(
            "Exit reached with score {} and {:.0}s left",
            self.score,
            self.time_remaining
        );
        self.push_event(GameEvent::ExitReached { score: self.score });
    }

    /// Flag an enemy for removal. False if unknown or already flagged.
    pub fn remove_enemy(&mut self, id: EntityId) -> bool {
        self.enemies
            .iter_mut()
            .find(|e| e.body.id == id)
            .is_some_and(|e| e.body.flag_for_removal())
    }

    pub fn remove_bullet(&mut self, id: EntityId) -> bool {
        self.bullets
            .iter_mut()
            .find(|b| b.body.id == id)
            .is_some_and(|b| b.body.flag_for_removal())
    }

    pub fn remove_collectible(&mut self, id: EntityId) -> bool {
        self.collectibles
            .iter_mut()
            .find(|c| c.body.id == id)
            .is_some_and(|c| c.body.flag_for_removal())
    }

    /// Drop every flagged entity from its list; returns the dropped ids
    pub fn purge_flagged(&mut self) -> Vec<EntityId> {
        let mut dropped = Vec::new();
        self.enemies.retain(|e| keep(e.body.is_live(), e.body.id, &mut dropped));
        self.collectibles.retain(|c| keep(c.body.is_live(), c.body.id, &mut dropped));
        self.bullets.retain(|b| keep(b.body.is_live(), b.body.id, &mut dropped));
        dropped
    }

    /// A new bullet centred on `position`, flying in `direction`
    pub fn make_bullet(&mut self, position: Vec2, direction: Facing) -> Bullet {
        let id = self.next_entity_id();
        Bullet::new(id, position, direction, self.tuning.collectibles.bullet_speed)
    }

    /// Ensure lists are sorted by id for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.enemies.sort_by_key(|e| e.body.id);
        self.collectibles.sort_by_key(|c| c.body.id);
        self.bullets.sort_by_key(|b| b.body.id);
    }

    fn slot_of(&self, id: EntityId) -> Option<Slot> {
        if self.player.body.id == id {
            return Some(Slot::Player);
        }
        if self.exit.body.id == id {
            return Some(Slot::Exit);
        }
        if let Some(i) = self.enemies.iter().position(|e| e.body.id == id) {
            return Some(Slot::Enemy(i));
        }
        if let Some(i) = self.collectibles.iter().position(|c| c.body.id == id) {
            return Some(Slot::Collectible(i));
        }
        self.bullets.iter().position(|b| b.body.id == id).map(Slot::Bullet)
    }

    fn is_flagged(&self, slot: Slot) -> bool {
        match slot {
            Slot::Player => self.player.body.flagged_for_removal,
            Slot::Exit => self.exit.body.flagged_for_removal,
            Slot::Enemy(i) => self.enemies[i].body.flagged_for_removal,
            Slot::Collectible(i) => self.collectibles[i].body.flagged_for_removal,
            Slot::Bullet(i) => self.bullets[i].body.flagged_for_removal,
        }
    }

    fn collect(&mut self, index: usize) {
        let collectible = &mut self.collectibles[index];
        if !collectible.body.flag_for_removal() {
            return;
        }
        let (id, kind) = (collectible.body.id, collectible.kind);
        match kind {
            CollectibleKind::Gem => self.notify_gem_collected(id),
            CollectibleKind::Ammo => self.notify_ammo_collected(id),
            CollectibleKind::Key => self.notify_key_collected(id),
        }
    }

    fn shoot_down(&mut self, enemy: usize, bullet: usize) {
        let enemy_id = self.enemies[enemy].body.id;
        let bullet_id = self.bullets[bullet].body.id;
        self.remove_enemy(enemy_id);
        self.remove_bullet(bullet_id);
        self.notify_enemy_killed(enemy_id);
    }
}

fn keep(live: bool, id: EntityId, dropped: &mut Vec<EntityId>) -> bool {
    if !live {
        dropped.push(id);
    }
    live
}

impl CollisionHandler for LevelState {
    fn on_collision(&mut self, this: EntityId, other: EntityId) {
        let (Some(a), Some(b)) = (self.slot_of(this), self.slot_of(other)) else {
            log::trace!("Collision {this:?} / {other:?} names an entity that is gone");
            return;
        };
        if self.is_flagged(a) || self.is_flagged(b) {
            return;
        }

        match (a, b) {
            (Slot::Enemy(e), Slot::Bullet(bullet)) => self.shoot_down(e, bullet),
            // Enemies walk straight through gems
            (Slot::Enemy(_), Slot::Collectible(_)) => {}
            (Slot::Collectible(c), Slot::Player) => self.collect(c),
            (Slot::Player, Slot::Enemy(e)) => {
                let enemy = self.enemies[e].body.id;
                self.notify_player_killed(Some(enemy));
            }
            (Slot::Player, Slot::Exit) => self.set_colliding_with_exit(true),
            _ => {}
        }
    }

    fn on_collision_exit(&mut self, this: EntityId, former: EntityId) {
        let is_exit_pair = matches!(
            (self.slot_of(this), self.slot_of(former)),
            (Some(Slot::Player), Some(Slot::Exit)) | (Some(Slot::Exit), Some(Slot::Player))
        );
        if is_exit_pair {
            if !self.colliding_with_exit {
                log::trace!("Exit flag already clear");
            }
            self.set_colliding_with_exit(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::enemy::EnemyKind;

    const FRAME: Vec2 = Vec2::splat(64.0);

    fn state() -> LevelState {
        let grid = TileGrid::from_collision_map("......\n......\n######\n").unwrap();
        let start = TileGrid::foot_of(1, 1);
        let tuning = Tuning::default();
        let player = Player::new(EntityId(1), start, FRAME, tuning.player.clone());
        let exit = ExitMarker::at_cell(EntityId(2), 4, 1);
        let mut state = LevelState::new(tuning, grid, start, player, exit, 3);
        let gem = state.next_entity_id();
        state.collectibles.push(Collectible::at_cell(gem, CollectibleKind::Gem, 1, 1));
        let enemy = state.next_entity_id();
        state
            .enemies
            .push(Enemy::new(enemy, EnemyKind::Patrol, TileGrid::foot_of(3, 1), FRAME));
        state
    }

    #[test]
    fn test_gem_collected_once() {
        let mut s = state();
        s.on_collision(EntityId(3), EntityId(1));
        s.on_collision(EntityId(3), EntityId(1));
        assert_eq!(s.score, 30);
        assert_eq!(s.events(), &[GameEvent::GemCollected]);
        assert_eq!(s.purge_flagged(), vec![EntityId(3)]);
        assert!(s.collectibles.is_empty());
    }

    #[test]
    fn test_ammo_and_key_collected_once() {
        let mut s = state();
        let starting = s.ammo;
        let ammo = s.next_entity_id();
        s.collectibles.push(Collectible::at_cell(ammo, CollectibleKind::Ammo, 2, 1));
        let key = s.next_entity_id();
        s.collectibles.push(Collectible::at_cell(key, CollectibleKind::Key, 2, 0));
        assert!(!s.has_key);

        for _ in 0..2 {
            s.on_collision(ammo, EntityId(1));
            s.on_collision(key, EntityId(1));
        }
        assert_eq!(s.ammo, starting + 5);
        assert!(s.has_key);
        assert_eq!(s.score, 0);
        assert_eq!(s.events(), &[GameEvent::AmmoCollected, GameEvent::KeyCollected]);

        let mut dropped = s.purge_flagged();
        dropped.sort();
        assert_eq!(dropped, vec![ammo, key]);
        assert_eq!(s.collectibles.len(), 1);
    }

    #[test]
    fn test_player_side_of_gem_pair_does_nothing() {
        let mut s = state();
        s.on_collision(EntityId(1), EntityId(3));
        assert_eq!(s.score, 0);
        assert!(s.collectibles[0].body.is_live());
    }

    #[test]
    fn test_enemy_kills_player_once() {
        let mut s = state();
        s.on_collision(EntityId(4), EntityId(1));
        assert!(s.player.alive);
        s.on_collision(EntityId(1), EntityId(4));
        s.on_collision(EntityId(1), EntityId(4));
        assert!(!s.player.alive);
        assert!(s.has_game_ended);
        assert_eq!(s.drain_events(), vec![GameEvent::PlayerKilled { by: Some(EntityId(4)) }]);
        assert!(s.events().is_empty());
    }

    #[test]
    fn test_flagged_entities_are_inert() {
        let mut s = state();
        assert!(s.remove_enemy(EntityId(4)));
        assert!(!s.remove_enemy(EntityId(4)));
        s.on_collision(EntityId(1), EntityId(4));
        assert!(s.player.alive);

        assert!(s.remove_collectible(EntityId(3)));
        s.on_collision(EntityId(3), EntityId(1));
        assert_eq!(s.score, 0);
        assert!(s.events().is_empty());
    }

    #[test]
    fn test_bullet_kills_enemy() {
        let mut s = state();
        let bullet = s.make_bullet(TileGrid::foot_of(3, 1), Facing::Right);
        let bullet_id = bullet.body.id;
        s.bullets.push(bullet);

        // Bullet side is left to the enemy
        s.on_collision(bullet_id, EntityId(4));
        assert!(s.enemies[0].body.is_live());

        s.on_collision(EntityId(4), bullet_id);
        assert!(!s.enemies[0].body.is_live());
        assert!(!s.bullets[0].body.is_live());
        assert_eq!(s.events(), &[GameEvent::EnemyKilled]);

        let mut dropped = s.purge_flagged();
        dropped.sort();
        assert_eq!(dropped, vec![EntityId(4), bullet_id]);
        assert!(s.enemies.is_empty() && s.bullets.is_empty());
    }

    #[test]
    fn test_exit_flag_set_and_cleared() {
        let mut s = state();
        s.on_collision(EntityId(2), EntityId(1));
        assert!(!s.colliding_with_exit());
        s.on_collision(EntityId(1), EntityId(2));
        assert!(s.colliding_with_exit());
        s.on_collision_exit(EntityId(2), EntityId(1));
        assert!(!s.colliding_with_exit());
        // Redundant exit is harmless
        s.on_collision_exit(EntityId(1), EntityId(2));
        assert!(!s.colliding_with_exit());
    }

    #[test]
    fn test_exit_reached_needs_contact() {
        let mut s = state();
        s.notify_exit_reached();
        assert!(!s.reached_exit);

        s.set_colliding_with_exit(true);
        s.notify_exit_reached();
        s.notify_exit_reached();
        assert!(s.reached_exit && s.player.reached_exit);
        assert_eq!(s.events(), &[GameEvent::ExitReached { score: 0 }]);
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        let mut s = state();
        s.on_collision(EntityId(99), EntityId(1));
        s.on_collision_exit(EntityId(99), EntityId(1));
        assert!(!s.remove_bullet(EntityId(99)));
        assert!(s.events().is_empty());
    }
}
