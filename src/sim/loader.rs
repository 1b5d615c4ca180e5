//! Level file parsing
//!
//! A level file is a rectangle of characters, one per tile:
//!
//! | char | meaning                         |
//! |------|---------------------------------|
//! | `.`  | empty space                     |
//! | `#`  | impassable block                |
//! | `-`  | floating platform               |
//! | `~`  | platform block                  |
//! | `:`  | passable (decorative) block     |
//! | `X`  | exit                            |
//! | `1`  | player start                    |
//! | `G`  | gem                             |
//! | `Q`  | ammo                            |
//! | `K`  | key                             |
//! | `A`  | patrolling monster              |
//! | `B`  | sentry monster (waits, chases)  |
//! | `C`  | hunter monster (patrols, chases)|
//! | `D`  | patrolling monster (alt sprite) |

use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use thiserror::Error;

use super::enemy::EnemyKind;
use super::entity::CollectibleKind;
use super::tiles::{Tile, TileCollision, TileGrid};

/// Seed for picking block variations; constant so every load looks the same
const VARIETY_SEED: u64 = 354_668;

/// Fatal problems found while building a level
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("level file is empty")]
    Empty,
    #[error("row {row} is {found} tiles wide, expected {expected}")]
    RaggedRow { row: usize, expected: usize, found: usize },
    #[error("unsupported tile type character '{ch}' at position {x}, {y}")]
    UnsupportedTile { ch: char, x: usize, y: usize },
    #[error("a level may only have one starting point (second at {x}, {y})")]
    DuplicateStart { x: usize, y: usize },
    #[error("a level may only have one exit (second at {x}, {y})")]
    DuplicateExit { x: usize, y: usize },
    #[error("a level must have a starting point")]
    MissingStart,
    #[error("a level must have an exit")]
    MissingExit,
}

/// Something spawned by a tile character, placed at its cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spawn {
    Enemy { kind: EnemyKind, sprite: &'static str },
    Collectible(CollectibleKind),
}

/// A spawn plus the cell it came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub spawn: Spawn,
    pub col: i32,
    pub row: i32,
}

/// Everything the level file describes, before entities are built
#[derive(Debug, Clone)]
pub struct LevelLayout {
    pub grid: TileGrid,
    /// Cell of the player start
    pub start: (i32, i32),
    /// Cell of the exit
    pub exit: (i32, i32),
    /// Entity spawns in reading order
    pub placements: Vec<Placement>,
}

/// What a single character turns into
enum Cell {
    Tile(Tile),
    Start,
    Exit,
    Spawn(Spawn),
}

fn variety_tile(rng: &mut Pcg32, base: &str, variations: u32, collision: TileCollision) -> Tile {
    let index = rng.random_range(0..variations);
    Tile::new(collision, format!("{base}{index}"))
}

fn parse_cell(c: char, x: usize, y: usize, rng: &mut Pcg32) -> Result<Cell, LoadError> {
    let cell = match c {
        '.' => Cell::Tile(Tile::empty()),
        'X' => Cell::Exit,
        '1' => Cell::Start,
        'G' => Cell::Spawn(Spawn::Collectible(CollectibleKind::Gem)),
        'Q' => Cell::Spawn(Spawn::Collectible(CollectibleKind::Ammo)),
        'K' => Cell::Spawn(Spawn::Collectible(CollectibleKind::Key)),
        '-' => Cell::Tile(Tile::new(TileCollision::Platform, "Platform")),
        'A' => Cell::Spawn(Spawn::Enemy { kind: EnemyKind::Patrol, sprite: "MonsterA" }),
        'B' => Cell::Spawn(Spawn::Enemy { kind: EnemyKind::Sentry, sprite: "MonsterB" }),
        'C' => Cell::Spawn(Spawn::Enemy { kind: EnemyKind::Hunter, sprite: "MonsterC" }),
        'D' => Cell::Spawn(Spawn::Enemy { kind: EnemyKind::Patrol, sprite: "MonsterD" }),
        '~' => Cell::Tile(variety_tile(rng, "BlockB", 2, TileCollision::Platform)),
        ':' => Cell::Tile(variety_tile(rng, "BlockB", 2, TileCollision::Passable)),
        '#' => Cell::Tile(variety_tile(rng, "BlockA", 7, TileCollision::Impassable)),
        _ => return Err(LoadError::UnsupportedTile { ch: c, x, y }),
    };
    Ok(cell)
}

/// Parse a level file into its grid and spawn list
pub fn parse_level(source: &str) -> Result<LevelLayout, LoadError> {
    let lines: Vec<&str> = source.trim_end().lines().map(str::trim_end).collect();
    let width = lines.first().map(|l| l.chars().count()).ok_or(LoadError::Empty)?;

    let mut rng = Pcg32::seed_from_u64(VARIETY_SEED);
    let mut rows = Vec::with_capacity(lines.len());
    let mut start = None;
    let mut exit = None;
    let mut placements = Vec::new();

    for (y, line) in lines.iter().enumerate() {
        let found = line.chars().count();
        if found != width {
            return Err(LoadError::RaggedRow { row: y, expected: width, found });
        }

        let mut row = Vec::with_capacity(width);
        for (x, c) in line.chars().enumerate() {
            let cell = (x as i32, y as i32);
            let tile = match parse_cell(c, x, y, &mut rng)? {
                Cell::Tile(tile) => tile,
                Cell::Start => {
                    if start.is_some() {
                        return Err(LoadError::DuplicateStart { x, y });
                    }
                    start = Some(cell);
                    Tile::empty()
                }
                Cell::Exit => {
                    if exit.is_some() {
                        return Err(LoadError::DuplicateExit { x, y });
                    }
                    exit = Some(cell);
                    Tile::new(TileCollision::Exit, "Exit")
                }
                Cell::Spawn(spawn) => {
                    placements.push(Placement { spawn, col: cell.0, row: cell.1 });
                    Tile::empty()
                }
            };
            row.push(tile);
        }
        rows.push(row);
    }

    let start = start.ok_or(LoadError::MissingStart)?;
    let exit = exit.ok_or(LoadError::MissingExit)?;

    log::info!(
        "Parsed level {}x{} with {} spawns",
        width,
        rows.len(),
        placements.len()
    );

    Ok(LevelLayout {
        grid: TileGrid::from_rows(rows)?,
        start,
        exit,
        placements,
    })
}
