mod collision;
mod tile_grid;

pub use collision::{
    dynamic_collision_response, CollisionTag, Resolution, StaticCollider, TileCollision,
    EMBEDDED_NUDGE_PX,
};
pub use tile_grid::{Matrix, Tile, TileGrid, TileGridError, TileSlot};
