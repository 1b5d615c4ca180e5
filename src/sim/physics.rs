//! Axis-separated movement against the tile grid
//!
//! Movement is split into substeps no larger than half a tile, and each
//! substep moves X first, then Y. Only the leading edge is probed: after a
//! small step the box can only have entered the column (or row) it is moving
//! into.

use glam::Vec2;

use super::rect::Rect;
use super::tiles::{TileCollision, TileGrid};
use crate::consts::{TILE_HEIGHT, TILE_WIDTH};

/// Slack used when mapping box edges to cells, so a box resting exactly on a
/// tile edge does not count as inside the neighbouring cell
const EDGE_EPSILON: f32 = 1e-3;

/// What the moving box ran into during a move
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Contacts {
    /// Landed on an impassable tile or a platform
    pub ground: bool,
    /// Blocked horizontally
    pub wall: bool,
    /// Bumped an impassable tile from below
    pub ceiling: bool,
}

/// Inclusive cell span covered by `[lo, hi)` along one axis
fn span(lo: f32, hi: f32, size: f32) -> (i32, i32) {
    let first = ((lo + EDGE_EPSILON) / size).floor() as i32;
    let last = ((hi - EDGE_EPSILON) / size).floor() as i32;
    (first, last.max(first))
}

fn resolve_x(mut rect: Rect, dx: f32, grid: &TileGrid, contacts: &mut Contacts) -> Rect {
    rect.x += dx;
    if dx == 0.0 {
        return rect;
    }

    let (left, right) = span(rect.left(), rect.right(), TILE_WIDTH);
    let (top, bottom) = span(rect.top(), rect.bottom(), TILE_HEIGHT);
    let col = if dx > 0.0 { right } else { left };

    let blocked = (top..=bottom).any(|row| grid.classify(col, row) == TileCollision::Impassable);
    if blocked {
        let tile = TileGrid::bounds_of(col, top);
        rect.x = if dx > 0.0 { tile.left() - rect.w } else { tile.right() };
        contacts.wall = true;
    }
    rect
}

fn resolve_y(mut rect: Rect, dy: f32, grid: &TileGrid, contacts: &mut Contacts) -> Rect {
    let previous_bottom = rect.bottom();
    rect.y += dy;
    if dy == 0.0 {
        return rect;
    }

    let (left, right) = span(rect.left(), rect.right(), TILE_WIDTH);
    let (top, bottom) = span(rect.top(), rect.bottom(), TILE_HEIGHT);

    if dy > 0.0 {
        let tile_top = TileGrid::bounds_of(left, bottom).top();
        let lands = (left..=right).any(|col| match grid.classify(col, bottom) {
            TileCollision::Impassable => true,
            // One-way: only catches a box that started above the platform
            TileCollision::Platform => previous_bottom <= tile_top + EDGE_EPSILON,
            _ => false,
        });
        if lands {
            rect.y = tile_top - rect.h;
            contacts.ground = true;
        }
    } else {
        let bumps = (left..=right).any(|col| grid.classify(col, top) == TileCollision::Impassable);
        if bumps {
            rect.y = TileGrid::bounds_of(left, top).bottom();
            contacts.ceiling = true;
        }
    }
    rect
}

/// Move `rect` by `delta`, stopping at walls, floors, ceilings and
/// platforms (from above only)
pub fn move_and_collide(rect: Rect, delta: Vec2, grid: &TileGrid) -> (Rect, Contacts) {
    let mut contacts = Contacts::default();

    let steps_x = delta.x.abs() / (TILE_WIDTH / 2.0);
    let steps_y = delta.y.abs() / (TILE_HEIGHT / 2.0);
    let steps = steps_x.max(steps_y).ceil().max(1.0) as u32;
    let step = delta / steps as f32;

    let mut rect = rect;
    for _ in 0..steps {
        if !contacts.wall {
            rect = resolve_x(rect, step.x, grid, &mut contacts);
        }
        if !contacts.ground && !contacts.ceiling {
            rect = resolve_y(rect, step.y, grid, &mut contacts);
        }
    }
    (rect, contacts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(map: &str) -> TileGrid {
        TileGrid::from_collision_map(map).unwrap()
    }

    // 6 wide, 4 tall; floor on row 3, wall in column 4, platform at (1, 1)
    const ROOM: &str = "\
......
.-..#.
....#.
######
";

    fn box_on_floor(x: f32) -> Rect {
        Rect::new(x, 3.0 * TILE_HEIGHT - 30.0, 20.0, 30.0)
    }

    #[test]
    fn test_falls_onto_floor() {
        let g = grid(ROOM);
        let start = Rect::new(90.0, 40.0, 20.0, 30.0);
        let (r, c) = move_and_collide(start, Vec2::new(0.0, 200.0), &g);
        assert!(c.ground);
        assert!((r.bottom() - 3.0 * TILE_HEIGHT).abs() < 1e-3);
    }

    #[test]
    fn test_fast_fall_does_not_tunnel() {
        let g = grid(ROOM);
        let start = Rect::new(90.0, 0.0, 20.0, 30.0);
        // Far more than a tile in a single move
        let (r, c) = move_and_collide(start, Vec2::new(0.0, 1000.0), &g);
        assert!(c.ground);
        assert!((r.bottom() - 96.0).abs() < 1e-3);
    }

    #[test]
    fn test_wall_stops_horizontal_motion() {
        let g = grid(ROOM);
        let start = box_on_floor(120.0);
        let (r, c) = move_and_collide(start, Vec2::new(100.0, 0.0), &g);
        assert!(c.wall);
        assert!((r.right() - 4.0 * TILE_WIDTH).abs() < 1e-3);
    }

    #[test]
    fn test_standing_on_floor_is_not_a_wall() {
        let g = grid(ROOM);
        let (r, c) = move_and_collide(box_on_floor(40.0), Vec2::new(10.0, 0.5), &g);
        assert!(!c.wall);
        assert!(c.ground);
        assert!((r.x - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_level_edges_are_walls() {
        let g = grid(ROOM);
        let (r, c) = move_and_collide(box_on_floor(5.0), Vec2::new(-30.0, 0.0), &g);
        assert!(c.wall);
        assert_eq!(r.x, 0.0);
    }

    #[test]
    fn test_platform_is_one_way() {
        let g = grid(ROOM);
        // From below: passes through the platform at row 1
        let below = Rect::new(45.0, 70.0, 20.0, 20.0);
        let (r, c) = move_and_collide(below, Vec2::new(0.0, -60.0), &g);
        assert!(!c.ceiling);
        assert!((r.y - 10.0).abs() < 1e-3);

        // From above: lands on it
        let above = Rect::new(45.0, 5.0, 20.0, 20.0);
        let (r, c) = move_and_collide(above, Vec2::new(0.0, 40.0), &g);
        assert!(c.ground);
        assert!((r.bottom() - TILE_HEIGHT).abs() < 1e-3);
    }

    #[test]
    fn test_ceiling_bump() {
        let g = grid("#..\n...\n...\n");
        let r = Rect::new(5.0, 50.0, 20.0, 20.0);
        let (r, c) = move_and_collide(r, Vec2::new(0.0, -40.0), &g);
        assert!(c.ceiling);
        assert!((r.top() - TILE_HEIGHT).abs() < 1e-3);
    }

    #[test]
    fn test_falls_out_of_open_bottom() {
        let g = grid("......\n......\n");
        let r = Rect::new(50.0, 10.0, 20.0, 20.0);
        let (r, c) = move_and_collide(r, Vec2::new(0.0, 200.0), &g);
        assert!(!c.ground);
        assert!(r.top() > g.pixel_height());
    }
}
