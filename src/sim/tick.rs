//! Level construction and the per-frame driver
//!
//! One tick: apply commands, run the collision pass, purge whatever the
//! reactions flagged, then advance the timer and the entities.

use glam::Vec2;

use super::assets::SpriteMetrics;
use super::collision::{Collidable, Collider, CollisionManager};
use super::enemy::Enemy;
use super::entity::{Collectible, EntityId, ExitMarker, Facing};
use super::loader::{LoadError, Spawn, parse_level};
use super::player::Player;
use super::state::{GameEvent, LevelState};
use super::tiles::TileGrid;
use crate::settings::Tuning;

const PLAYER_ID: EntityId = EntityId(1);
const EXIT_ID: EntityId = EntityId(2);
const FIRST_SPAWN_ID: u32 = 3;

/// Commands for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    pub move_left: bool,
    pub move_right: bool,
    pub jump: bool,
    pub shoot: bool,
}

/// A running level: its state plus the collision bookkeeping
#[derive(Debug)]
pub struct Level {
    pub state: LevelState,
    collisions: CollisionManager,
}

impl Level {
    /// Build a level from its text form
    pub fn load(source: &str, tuning: &Tuning, sprites: &dyn SpriteMetrics) -> Result<Self, LoadError> {
        let layout = parse_level(source)?;

        let start = TileGrid::foot_of(layout.start.0, layout.start.1);
        let player = Player::new(PLAYER_ID, start, sprites.frame_size("Player"), tuning.player.clone());
        let exit = ExitMarker::at_cell(EXIT_ID, layout.exit.0, layout.exit.1);
        let mut state = LevelState::new(tuning.clone(), layout.grid, start, player, exit, FIRST_SPAWN_ID);

        for placement in layout.placements {
            let id = state.next_entity_id();
            let (col, row) = (placement.col, placement.row);
            match placement.spawn {
                Spawn::Enemy { kind, sprite } => {
                    let frame = sprites.frame_size(sprite);
                    state.enemies.push(Enemy::new(id, kind, TileGrid::foot_of(col, row), frame));
                }
                Spawn::Collectible(kind) => {
                    state.collectibles.push(Collectible::at_cell(id, kind, col, row));
                }
            }
        }
        state.normalize_order();

        let mut collisions = CollisionManager::new();
        collisions.add(PLAYER_ID);
        collisions.add(EXIT_ID);
        for id in state
            .enemies
            .iter()
            .map(|e| e.body.id)
            .chain(state.collectibles.iter().map(|c| c.body.id))
        {
            collisions.add(id);
        }

        log::info!(
            "Level loaded: {} enemies, {} collectibles, {:.0}s on the clock",
            state.enemies.len(),
            state.collectibles.len(),
            state.time_remaining
        );
        Ok(Self { state, collisions })
    }

    pub fn collisions(&self) -> &CollisionManager {
        &self.collisions
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.state.drain_events()
    }

    /// Final once the time bonus has been paid, or the run ended otherwise
    pub fn is_finished(&self) -> bool {
        self.state.has_game_ended && (!self.state.reached_exit || self.state.bonus_paid)
    }

    /// Every live collidable, in a stable order
    fn snapshot(&self) -> Vec<Collider> {
        let s = &self.state;
        std::iter::once(s.player.collider())
            .chain(s.enemies.iter().map(Collidable::collider))
            .chain(s.collectibles.iter().map(Collidable::collider))
            .chain(s.bullets.iter().map(Collidable::collider))
            .chain(std::iter::once(s.exit.collider()))
            .flatten()
            .collect()
    }

    /// Detect and dispatch this tick's collisions, then drop whatever was
    /// flagged along the way
    pub fn resolve_collisions(&mut self) {
        let snapshot = self.snapshot();
        self.collisions.update(&snapshot, &mut self.state);
        self.purge();
    }

    fn purge(&mut self) {
        for id in self.state.purge_flagged() {
            self.collisions.remove(id);
        }
    }

    /// Put a bullet centred on `position` into play
    pub fn spawn_bullet(&mut self, position: Vec2, direction: Facing) -> EntityId {
        let bullet = self.state.make_bullet(position, direction);
        let id = bullet.body.id;
        self.collisions.add(id);
        self.state.bullets.push(bullet);
        id
    }

    /// Fire from the player's muzzle in the facing direction. Does nothing
    /// without ammo.
    pub fn shoot(&mut self) -> bool {
        let player = &self.state.player;
        if !player.alive || player.reached_exit {
            return false;
        }
        if self.state.ammo == 0 {
            log::debug!("Out of ammo");
            return false;
        }
        let muzzle = player.position - Vec2::new(0.0, self.state.tuning.collectibles.muzzle_height);
        let facing = player.facing;
        self.state.ammo -= 1;
        self.spawn_bullet(muzzle, facing);
        self.state.push_event(GameEvent::ShotFired);
        true
    }

    /// Respawn the player at the start after a death
    pub fn start_new_life(&mut self) {
        let start = self.state.start;
        self.state.player.reset(start);
        self.state.has_game_ended = false;
        log::info!("New life");
    }

    pub fn apply_input(&mut self, input: &TickInput) {
        match (input.move_left, input.move_right) {
            (true, false) => self.state.player.move_left(),
            (false, true) => self.state.player.move_right(),
            _ => {}
        }
        if input.jump {
            self.state.player.jump();
        }
        if input.shoot {
            self.shoot();
        }
    }

    /// Advance everything but input by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        self.resolve_collisions();

        let frozen = !self.state.player.alive || self.state.time_remaining <= 0.0;
        if frozen {
            self.update_player(dt);
        } else if self.state.reached_exit {
            self.pay_time_bonus(dt);
        } else {
            self.update_running(dt);
        }

        let s = &mut self.state;
        s.time_remaining = s.time_remaining.max(0.0);
        if s.reached_exit && s.time_remaining <= 0.0 && !s.bonus_paid {
            s.bonus_paid = true;
            log::info!("Level complete with score {}", s.score);
            s.push_event(GameEvent::LevelComplete { score: s.score });
        }
        self.purge();
    }

    fn update_player(&mut self, dt: f32) {
        let s = &mut self.state;
        if s.player.apply_physics(dt, &s.grid).jumped {
            s.push_event(GameEvent::PlayerJumped);
        }
    }

    fn update_running(&mut self, dt: f32) {
        self.state.time_remaining -= dt;
        if self.state.time_remaining <= 0.0 {
            self.state.has_game_ended = true;
            log::info!("Time ran out");
        }

        self.update_player(dt);
        let s = &mut self.state;
        if s.player.alive && s.player.fell_out(&s.grid) {
            s.notify_player_killed(None);
        }

        let player = s.player.position;
        for enemy in &mut s.enemies {
            enemy.update(dt, &s.grid, player, &s.tuning.enemy);
        }

        for bullet in &mut s.bullets {
            bullet.update(dt);
            if bullet.is_outside(&s.grid) {
                bullet.body.flag_for_removal();
            }
        }

        let unlocked = !s.tuning.level.exit_requires_key || s.has_key;
        if s.player.alive && s.player.is_on_ground() && s.colliding_with_exit() && unlocked {
            s.notify_exit_reached();
        }
    }

    /// Convert remaining seconds into score, a few seconds per tick
    fn pay_time_bonus(&mut self, dt: f32) {
        let s = &mut self.state;
        let seconds = (dt * 100.0).round().min(s.time_remaining.ceil());
        s.time_remaining -= seconds;
        s.score += seconds as u32 * s.tuning.level.points_per_second;
        self.update_player(dt);
    }
}

/// Advance the level by one timestep
pub fn tick(level: &mut Level, input: &TickInput, dt: f32) {
    level.apply_input(input);
    level.update(dt);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::assets::StockSprites;
    use crate::sim::enemy::EnemyKind;
    use crate::sim::entity::CollectibleKind;
    use crate::sim::tiles::TileCollision;

    // Player at column 1, gem at 3, exit at 7
    const CORRIDOR: &str = "\
..........
..........
.1.G...X..
##########
";

    // Patrolling enemy at column 4, nothing else in the way
    const RANGE: &str = "\
..........
..........
.1..A..X..
##########
";

    // A single block to stand on
    const LEDGE: &str = "\
..........
.1.....X..
.#........
";

    const RIGHT: TickInput = TickInput {
        move_left: false,
        move_right: true,
        jump: false,
        shoot: false,
    };

    fn load_with(source: &str, tuning: &Tuning) -> Level {
        Level::load(source, tuning, &StockSprites).unwrap()
    }

    fn load(source: &str) -> Level {
        load_with(source, &Tuning::default())
    }

    #[test]
    fn test_load_registers_everything() {
        let level = load(CORRIDOR);
        assert_eq!(level.state.collectibles.len(), 1);
        assert_eq!(level.state.collectibles[0].kind, CollectibleKind::Gem);
        // Player, exit and gem
        assert_eq!(level.collisions().len(), 3);
        assert_eq!(level.state.collision_at(7, 2), TileCollision::Exit);
        assert_eq!(level.state.collision_at(-1, 0), TileCollision::Impassable);
        assert_eq!(level.state.collision_at(0, 9), TileCollision::Passable);
        assert_eq!(level.state.player.position, TileGrid::foot_of(1, 2));
    }

    #[test]
    fn test_load_errors_propagate() {
        assert_eq!(
            Level::load("1.Z.X\n#####\n", &Tuning::default(), &StockSprites).err(),
            Some(LoadError::UnsupportedTile { ch: 'Z', x: 2, y: 0 })
        );
    }

    #[test]
    fn test_collecting_gem_scores_once() {
        let mut level = load(CORRIDOR);
        let gem = level.state.collectibles[0].body.id;
        let mut gems = 0;
        // Half a second: past the gem, short of the exit
        for _ in 0..30 {
            tick(&mut level, &RIGHT, SIM_DT);
            gems += level
                .drain_events()
                .iter()
                .filter(|e| **e == GameEvent::GemCollected)
                .count();
        }
        assert_eq!(gems, 1);
        assert_eq!(level.state.score, 30);
        assert!(level.state.collectibles.is_empty());
        assert!(!level.collisions().contains(gem));
    }

    #[test]
    fn test_shoot_without_ammo_spawns_nothing() {
        let mut level = load(CORRIDOR);
        level.state.ammo = 0;
        let input = TickInput {
            shoot: true,
            ..Default::default()
        };
        tick(&mut level, &input, SIM_DT);
        assert!(level.state.bullets.is_empty());
        assert_eq!(level.state.ammo, 0);
        assert!(!level.drain_events().contains(&GameEvent::ShotFired));
    }

    #[test]
    fn test_shoot_uses_ammo_and_facing() {
        let mut level = load(CORRIDOR);
        let input = TickInput {
            move_left: true,
            shoot: true,
            ..Default::default()
        };
        level.apply_input(&input);
        assert_eq!(level.state.ammo, 9);
        let bullet = &level.state.bullets[0];
        assert_eq!(bullet.direction, Facing::Left);
        assert_eq!(bullet.position.y, level.state.player.position.y - 25.0);
        assert!(level.collisions().contains(bullet.body.id));
    }

    #[test]
    fn test_bullet_kills_enemy_and_both_leave_the_level() {
        let mut level = load(RANGE);
        let enemy = level.state.enemies[0].body.id;
        assert_eq!(level.state.enemies[0].kind, EnemyKind::Patrol);
        let bullet = level.spawn_bullet(Vec2::new(100.0, 70.0), Facing::Right);

        level.update(0.1);
        assert!((level.state.bullets[0].position.x - 150.0).abs() < 1e-3);
        assert_eq!(level.state.bullets[0].position.y, 70.0);

        // The patrol walked left into the bullet's path
        level.update(SIM_DT);
        assert!(level.state.enemies.is_empty());
        assert!(level.state.bullets.is_empty());
        assert!(!level.collisions().contains(enemy));
        assert!(!level.collisions().contains(bullet));
        assert_eq!(level.drain_events(), vec![GameEvent::EnemyKilled]);
    }

    #[test]
    fn test_bullets_leaving_the_level_are_dropped() {
        let mut level = load(CORRIDOR);
        level.spawn_bullet(Vec2::new(380.0, 20.0), Facing::Right);
        for _ in 0..10 {
            level.update(SIM_DT);
        }
        assert!(level.state.bullets.is_empty());
    }

    #[test]
    fn test_flagged_enemy_is_purged_before_it_can_kill() {
        let mut level = load(RANGE);
        let enemy = level.state.enemies[0].body.id;
        // Park it on the player
        let on_player = level.state.player.position;
        level.state.enemies[0].position = on_player;
        level.state.enemies[0].body.bounds = level.state.player.body.bounds;
        assert!(level.state.remove_enemy(enemy));

        level.update(SIM_DT);
        assert!(level.state.player.alive);
        assert!(level.state.enemies.is_empty());
    }

    #[test]
    fn test_touching_enemy_kills_player() {
        let mut level = load(RANGE);
        level.state.enemies[0].body.bounds = level.state.player.body.bounds;
        level.update(SIM_DT);
        assert!(!level.state.player.alive);
        assert!(level.state.has_game_ended);
        assert!(level.is_finished());
    }

    #[test]
    fn test_exit_reached_then_time_becomes_score() {
        let mut level = load(CORRIDOR);
        let mut left_at_exit = None;
        for _ in 0..200 {
            tick(&mut level, &RIGHT, SIM_DT);
            if level.state.reached_exit {
                left_at_exit = Some(level.state.time_remaining);
                break;
            }
        }
        let left = left_at_exit.expect("player should reach the exit");
        let at_exit = level.state.score;
        assert_eq!(at_exit, 30);
        assert!(level.drain_events().contains(&GameEvent::ExitReached { score: 30 }));

        // Input is ignored from here on
        let x = level.state.player.position.x;
        for _ in 0..100 {
            tick(&mut level, &RIGHT, SIM_DT);
        }
        assert_eq!(level.state.player.position.x, x);
        assert_eq!(level.state.time_remaining, 0.0);
        assert!(level.is_finished());

        let bonus = level.state.score - at_exit;
        assert_eq!(bonus % 5, 0);
        assert!(bonus >= 5 * left.floor() as u32 && bonus <= 5 * (left.ceil() as u32 + 1));
        assert!(
            level
                .drain_events()
                .contains(&GameEvent::LevelComplete { score: level.state.score })
        );
    }

    #[test]
    fn test_locked_exit_flag_set_and_cleared() {
        let mut tuning = Tuning::default();
        tuning.level.exit_requires_key = true;
        let mut level = load_with(CORRIDOR, &tuning);

        let mut touched = false;
        for _ in 0..200 {
            tick(&mut level, &RIGHT, SIM_DT);
            touched |= level.state.colliding_with_exit();
        }
        assert!(touched);
        assert!(!level.state.reached_exit);
        // Walked past the exit to the right wall
        assert!(level.state.player.position.x > 330.0);
        assert!(!level.state.colliding_with_exit());
    }

    #[test]
    fn test_key_unlocks_gated_exit() {
        let mut tuning = Tuning::default();
        tuning.level.exit_requires_key = true;
        let mut level = load_with(
            "\
..........
..........
.1.K...X..
##########
",
            &tuning,
        );

        let mut events = Vec::new();
        for _ in 0..200 {
            tick(&mut level, &RIGHT, SIM_DT);
            events.extend(level.drain_events());
            if level.state.reached_exit {
                break;
            }
        }
        assert!(level.state.has_key);
        assert!(level.state.reached_exit);
        assert_eq!(events.iter().filter(|e| **e == GameEvent::KeyCollected).count(), 1);
        assert!(events.iter().any(|e| matches!(e, GameEvent::ExitReached { .. })));
    }

    #[test]
    fn test_timer_clamps_at_zero() {
        let mut tuning = Tuning::default();
        tuning.level.time_limit = 0.05;
        let mut level = load_with(CORRIDOR, &tuning);
        for _ in 0..10 {
            tick(&mut level, &TickInput::default(), SIM_DT);
        }
        assert_eq!(level.state.time_remaining, 0.0);
        assert!(level.state.has_game_ended);
        assert!(!level.state.reached_exit);
        assert!(level.state.player.alive);
    }

    #[test]
    fn test_falling_out_kills_then_new_life() {
        let mut level = load(LEDGE);
        for _ in 0..300 {
            tick(&mut level, &RIGHT, SIM_DT);
            if !level.state.player.alive {
                break;
            }
        }
        assert!(!level.state.player.alive);
        assert!(
            level
                .drain_events()
                .contains(&GameEvent::PlayerKilled { by: None })
        );

        level.start_new_life();
        assert!(level.state.player.alive);
        assert!(level.state.player.is_invulnerable());
        assert_eq!(level.state.player.position, TileGrid::foot_of(1, 1));
        assert!(!level.state.has_game_ended);
    }

    #[test]
    fn test_jump_emits_event() {
        let mut level = load(CORRIDOR);
        level.update(SIM_DT);
        let input = TickInput {
            jump: true,
            ..Default::default()
        };
        tick(&mut level, &input, SIM_DT);
        assert!(level.drain_events().contains(&GameEvent::PlayerJumped));
    }

    #[test]
    fn test_level_tiles_survive_collision_map_round_trip() {
        let level = load(CORRIDOR);
        let grid = &level.state.grid;
        let copy = TileGrid::from_collision_map(&grid.to_collision_map()).unwrap();
        for row in -1..=grid.height() as i32 {
            for col in -1..=grid.width() as i32 {
                assert_eq!(copy.classify(col, row), grid.classify(col, row));
            }
        }
    }

    #[test]
    fn test_builtin_levels_load() {
        for source in [
            include_str!("../../levels/0.txt"),
            include_str!("../../levels/1.txt"),
            include_str!("../../levels/2.txt"),
        ] {
            let level = load(source);
            assert_eq!(level.state.grid.width(), 20);
            assert_eq!(level.state.grid.height(), 15);
            assert!(!level.state.enemies.is_empty());
        }
    }

    #[test]
    fn test_determinism() {
        let mut a = load(RANGE);
        let mut b = load(RANGE);
        let inputs = [
            RIGHT,
            TickInput {
                jump: true,
                ..RIGHT
            },
            TickInput {
                shoot: true,
                ..Default::default()
            },
            TickInput::default(),
        ];
        for input in inputs.iter().cycle().take(120) {
            tick(&mut a, input, SIM_DT);
            tick(&mut b, input, SIM_DT);
        }
        assert_eq!(a.state.player.position, b.state.player.position);
        assert_eq!(a.state.score, b.state.score);
        assert_eq!(a.state.enemies.len(), b.state.enemies.len());
        assert_eq!(a.drain_events(), b.drain_events());
    }
}
