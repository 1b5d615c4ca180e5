//! Static tile geometry
//!
//! The grid answers two questions for the rest of the simulation: what kind of
//! collision a cell has, and where that cell sits in world space.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::loader::LoadError;
use super::rect::Rect;
use crate::consts::{TILE_HEIGHT, TILE_WIDTH};

/// How a tile reacts to things moving through it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TileCollision {
    /// Empty space; entities move freely
    #[default]
    Passable,
    /// Solid from every direction
    Impassable,
    /// One-way floor: solid only when landed on from above
    Platform,
    /// The level exit; does not block movement
    Exit,
}

impl TileCollision {
    /// Character used in collision maps
    pub fn symbol(self) -> char {
        match self {
            TileCollision::Passable => '.',
            TileCollision::Impassable => '#',
            TileCollision::Platform => '-',
            TileCollision::Exit => 'X',
        }
    }

    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            '.' => Some(TileCollision::Passable),
            '#' => Some(TileCollision::Impassable),
            '-' => Some(TileCollision::Platform),
            'X' => Some(TileCollision::Exit),
            _ => None,
        }
    }
}

/// Opaque visual reference for a tile (sprite sheet name), not used by the
/// simulation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileVisual(pub String);

/// One cell of level geometry
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Tile {
    pub collision: TileCollision,
    pub visual: Option<TileVisual>,
}

impl Tile {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(collision: TileCollision, visual: impl Into<String>) -> Self {
        Self {
            collision,
            visual: Some(TileVisual(visual.into())),
        }
    }
}

/// Fixed-size 2D array of tiles, row-major
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileGrid {
    width: usize,
    height: usize,
    tiles: Vec<Tile>,
}

impl TileGrid {
    /// Build a grid from rows of tiles. Every row must be as long as the first.
    pub fn from_rows(rows: Vec<Vec<Tile>>) -> Result<Self, LoadError> {
        let height = rows.len();
        let width = rows.first().map(Vec::len).ok_or(LoadError::Empty)?;
        if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(LoadError::RaggedRow { row, expected: width, found: r.len() });
        }
        Ok(Self {
            width,
            height,
            tiles: rows.into_iter().flatten().collect(),
        })
    }

    /// Parse a collision-only map written with `TileCollision::symbol` characters
    pub fn from_collision_map(map: &str) -> Result<Self, LoadError> {
        // Only trailing blank lines are dropped; a gap inside the map is a ragged row
        let lines: Vec<&str> = map.trim_end().lines().map(str::trim_end).collect();
        let width = match lines.first() {
            Some(first) => first.chars().count(),
            None => return Err(LoadError::Empty),
        };

        let mut rows = Vec::with_capacity(lines.len());
        for (y, line) in lines.iter().enumerate() {
            let found = line.chars().count();
            if found != width {
                return Err(LoadError::RaggedRow { row: y, expected: width, found });
            }
            let row = line
                .chars()
                .enumerate()
                .map(|(x, c)| {
                    TileCollision::from_symbol(c)
                        .map(|collision| Tile { collision, visual: None })
                        .ok_or(LoadError::UnsupportedTile { ch: c, x, y })
                })
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(row);
        }
        Self::from_rows(rows)
    }

    /// Write the grid back out as a collision map (visuals are dropped)
    pub fn to_collision_map(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for row in self.tiles.chunks(self.width.max(1)) {
            out.extend(row.iter().map(|t| t.collision.symbol()));
            out.push('\n');
        }
        out
    }

    /// Width in tiles
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in tiles
    pub fn height(&self) -> usize {
        self.height
    }

    /// Width in world pixels
    pub fn pixel_width(&self) -> f32 {
        self.width as f32 * TILE_WIDTH
    }

    /// Height in world pixels
    pub fn pixel_height(&self) -> f32 {
        self.height as f32 * TILE_HEIGHT
    }

    pub fn tile(&self, col: i32, row: i32) -> Option<&Tile> {
        if col < 0 || row < 0 || col as usize >= self.width || row as usize >= self.height {
            return None;
        }
        self.tiles.get(row as usize * self.width + col as usize)
    }

    /// Collision kind at a cell. Total over all integers: columns outside the
    /// level are walls, rows above or below it are open air.
    pub fn classify(&self, col: i32, row: i32) -> TileCollision {
        if col < 0 || col as usize >= self.width {
            return TileCollision::Impassable;
        }
        if row < 0 || row as usize >= self.height {
            return TileCollision::Passable;
        }
        self.tiles[row as usize * self.width + col as usize].collision
    }

    /// World-space rectangle of a cell
    pub fn bounds_of(col: i32, row: i32) -> Rect {
        Rect::new(
            col as f32 * TILE_WIDTH,
            row as f32 * TILE_HEIGHT,
            TILE_WIDTH,
            TILE_HEIGHT,
        )
    }

    /// Column containing world x
    #[inline]
    pub fn column_at(x: f32) -> i32 {
        (x / TILE_WIDTH).floor() as i32
    }

    /// Row containing world y
    #[inline]
    pub fn row_at(y: f32) -> i32 {
        (y / TILE_HEIGHT).floor() as i32
    }

    /// Centre of a cell in world space
    pub fn center_of(col: i32, row: i32) -> Vec2 {
        Self::bounds_of(col, row).center()
    }

    /// Bottom-centre of a cell (where spawned entities stand)
    pub fn foot_of(col: i32, row: i32) -> Vec2 {
        Self::bounds_of(col, row).bottom_center()
    }
}
