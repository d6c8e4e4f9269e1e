use engine::{Group, NodeId, Object, ObjectTree, TileGrid, TileGridError};
use tracing::debug;

use super::enemies::{Goomba, Koopa};
use super::player::Player;
use super::tiles::{tile_for_code, CODE_BRICK, CODE_EMPTY, CODE_GROUND, CODE_HIDDEN};
use super::{ACTOR_SIZE, PROP_SPEED};

pub(crate) const TILE_SIZE: f32 = 16.0;

/// World 1-1, one character per tile: `=` ground, `#` brick, `?` hidden
/// block, `.` empty.
const LEVEL_1_1: [&str; 10] = [
    "=......................=",
    "=......................=",
    "=......................=",
    "=......................=",
    "=......................=",
    "=.......####...........=",
    "=............??........=",
    "=......................=",
    "=......................=",
    "==================..====",
];

const GOOMBA_SPEED: f32 = -0.04;
const KOOPA_SPEED: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LevelHandles {
    pub(crate) level: NodeId,
    pub(crate) grid: NodeId,
    pub(crate) player: NodeId,
    pub(crate) goomba: NodeId,
    pub(crate) koopa: NodeId,
}

pub(crate) fn build_level(tree: &mut ObjectTree) -> Result<LevelHandles, TileGridError> {
    let root = tree.root();
    let level = spawn_actor(tree, root, Group, "level_1_1", 0.0, 0.0);
    let grid = spawn_grid(tree, level, &LEVEL_1_1)?;

    let goomba = spawn_actor(tree, level, Goomba::default(), "goomba", 96.0, 128.0);
    tree.set_property(goomba, PROP_SPEED, GOOMBA_SPEED);
    let koopa = spawn_actor(tree, level, Koopa::default(), "koopa", 240.0, 128.0);
    tree.set_property(koopa, PROP_SPEED, KOOPA_SPEED);
    let player = spawn_actor(tree, level, Player::new(), "player", 32.0, 96.0);

    debug!(nodes = tree.len(), "level_built");
    Ok(LevelHandles {
        level,
        grid,
        player,
        goomba,
        koopa,
    })
}

pub(crate) fn spawn_grid(
    tree: &mut ObjectTree,
    parent: NodeId,
    rows: &[&str],
) -> Result<NodeId, TileGridError> {
    let width = rows.first().map_or(0, |row| row.chars().count()) as u32;
    let height = rows.len() as u32;
    let mut grid = TileGrid::new(0, 0, TILE_SIZE);
    grid.load_from_array(width, height, &level_codes(rows), tile_for_code)?;

    let id = tree.spawn(parent, grid);
    tree.set_property(id, "name", "terrain");
    Ok(id)
}

/// Spawns `object` under `parent` as an actor-sized node at `(x, y)`.
pub(crate) fn spawn_actor(
    tree: &mut ObjectTree,
    parent: NodeId,
    object: impl Object,
    name: &str,
    x: f32,
    y: f32,
) -> NodeId {
    let id = tree.spawn(parent, object);
    tree.set_property(id, "name", name);
    tree.set_property(id, "x", x);
    tree.set_property(id, "y", y);
    tree.set_property(id, "width", ACTOR_SIZE);
    tree.set_property(id, "height", ACTOR_SIZE);
    id
}

/// Row-major tile codes. Rows of the wrong length surface as a cell count
/// mismatch when the grid loads them.
fn level_codes(rows: &[&str]) -> Vec<i32> {
    rows.iter()
        .flat_map(|row| row.chars())
        .map(|cell| match cell {
            '=' => CODE_GROUND,
            '#' => CODE_BRICK,
            '?' => CODE_HIDDEN,
            _ => CODE_EMPTY,
        })
        .collect()
}
