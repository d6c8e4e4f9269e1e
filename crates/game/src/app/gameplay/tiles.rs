use engine::{Color, Rect, RenderTarget, Tile, TileCollision, TileSlot};

use super::canvas::{BRICK, GROUND, HIDDEN_BLOCK};

pub(crate) const CODE_EMPTY: i32 = 0;
pub(crate) const CODE_GROUND: i32 = 1;
pub(crate) const CODE_BRICK: i32 = 2;
pub(crate) const CODE_HIDDEN: i32 = 3;

/// Solid terrain drawn with a flat color.
pub(crate) struct SolidTile {
    color: Color,
}

impl Tile for SolidTile {
    fn collision(&self) -> TileCollision {
        TileCollision::Solid
    }

    fn draw(&self, bounds: Rect, target: &mut dyn RenderTarget) {
        target.draw_rect(bounds, self.color);
    }
}

/// Invisible until bumped from below; the player can jump into it but fall
/// through it.
#[derive(Default)]
pub(crate) struct HiddenBlock;

impl Tile for HiddenBlock {
    fn collision(&self) -> TileCollision {
        TileCollision::OneWay
    }

    fn draw(&self, bounds: Rect, target: &mut dyn RenderTarget) {
        target.draw_rect(bounds, HIDDEN_BLOCK);
    }
}

pub(crate) fn tile_for_code(code: i32) -> TileSlot {
    match code {
        CODE_GROUND => Some(Box::new(SolidTile { color: GROUND })),
        CODE_BRICK => Some(Box::new(SolidTile { color: BRICK })),
        CODE_HIDDEN => Some(Box::new(HiddenBlock)),
        _ => None,
    }
}
