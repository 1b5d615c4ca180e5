//! A run across levels
//!
//! The session owns everything that outlives a single level: the tuning, the
//! leaderboard and the list of level sources. Levels cycle; after the last
//! one the first comes back.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::highscores::HighScores;
use crate::settings::Tuning;
use crate::sim::{GameEvent, Level, LoadError, SpriteMetrics, StockSprites, TickInput, tick};

pub struct Session {
    tuning: Tuning,
    high_scores: HighScores,
    sprites: Box<dyn SpriteMetrics>,
    levels: Vec<String>,
    level_index: usize,
    level: Level,
}

impl Session {
    /// Start on the first level with stock sprite sizes
    pub fn new(levels: Vec<String>, tuning: Tuning, high_scores: HighScores) -> Result<Self, LoadError> {
        Self::with_sprites(levels, tuning, high_scores, Box::new(StockSprites))
    }

    pub fn with_sprites(
        levels: Vec<String>,
        tuning: Tuning,
        high_scores: HighScores,
        sprites: Box<dyn SpriteMetrics>,
    ) -> Result<Self, LoadError> {
        let first = levels.first().ok_or(LoadError::Empty)?;
        let level = Level::load(first, &tuning, sprites.as_ref())?;
        log::info!("Session started with {} levels", levels.len());
        Ok(Self {
            tuning,
            high_scores,
            sprites,
            levels,
            level_index: 0,
            level,
        })
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn level_mut(&mut self) -> &mut Level {
        &mut self.level
    }

    pub fn level_index(&self) -> usize {
        self.level_index
    }

    pub fn high_scores(&self) -> &HighScores {
        &self.high_scores
    }

    /// Advance the current level one step. Completed levels are recorded on
    /// the leaderboard; the drained events are handed back.
    pub fn tick(&mut self, input: &TickInput, dt: f32) -> Vec<GameEvent> {
        tick(&mut self.level, input, dt);
        let events = self.level.drain_events();
        for event in &events {
            if let GameEvent::LevelComplete { score } = *event {
                self.record_score(score);
            }
        }
        events
    }

    /// Put a score on the leaderboard. Returns its rank if it made it.
    pub fn record_score(&mut self, score: u32) -> Option<usize> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.high_scores.add_score(score, self.level_index, timestamp)
    }

    /// The "continue" button: respawn after a death, move on after a
    /// completed level, retry after running out of time. Anything else is
    /// ignored.
    pub fn continue_game(&mut self) -> Result<(), LoadError> {
        let state = &self.level.state;
        if !state.player.alive {
            self.level.start_new_life();
        } else if state.time_remaining <= 0.0 {
            if state.reached_exit {
                self.load_next_level()?;
            } else {
                self.reload_current_level()?;
            }
        }
        Ok(())
    }

    pub fn load_next_level(&mut self) -> Result<(), LoadError> {
        self.load_level((self.level_index + 1) % self.levels.len())
    }

    pub fn reload_current_level(&mut self) -> Result<(), LoadError> {
        self.load_level(self.level_index)
    }

    fn load_level(&mut self, index: usize) -> Result<(), LoadError> {
        let source = self.levels.get(index).ok_or(LoadError::Empty)?;
        self.level = Level::load(source, &self.tuning, self.sprites.as_ref())?;
        self.level_index = index;
        log::info!("Playing level {index}");
        Ok(())
    }
}
