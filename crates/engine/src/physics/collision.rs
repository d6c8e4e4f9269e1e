use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

use crate::geometry::{Rect, Vector};

/// Sides of a moving body that touched something during one resolution.
/// Tags from several resolver calls in the same tick are combined with `|`.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CollisionTag(u8);

impl CollisionTag {
    pub const NONE: CollisionTag = CollisionTag(0);
    pub const CEILING: CollisionTag = CollisionTag(1 << 0);
    pub const FLOOR: CollisionTag = CollisionTag(1 << 1);
    pub const LEFT: CollisionTag = CollisionTag(1 << 2);
    pub const RIGHT: CollisionTag = CollisionTag(1 << 3);
    pub const X_AXIS: CollisionTag = CollisionTag(Self::LEFT.0 | Self::RIGHT.0);
    pub const Y_AXIS: CollisionTag = CollisionTag(Self::CEILING.0 | Self::FLOOR.0);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Every bit of `other` is set.
    pub const fn contains(self, other: CollisionTag) -> bool {
        self.0 & other.0 == other.0
    }

    /// At least one bit of `other` is set.
    pub const fn intersects(self, other: CollisionTag) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for CollisionTag {
    type Output = CollisionTag;

    fn bitor(self, rhs: CollisionTag) -> CollisionTag {
        CollisionTag(self.0 | rhs.0)
    }
}

impl BitOrAssign for CollisionTag {
    fn bitor_assign(&mut self, rhs: CollisionTag) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for CollisionTag {
    type Output = CollisionTag;

    fn bitand(self, rhs: CollisionTag) -> CollisionTag {
        CollisionTag(self.0 & rhs.0)
    }
}

impl fmt::Debug for CollisionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(CollisionTag, &str); 4] = [
            (CollisionTag::CEILING, "CEILING"),
            (CollisionTag::FLOOR, "FLOOR"),
            (CollisionTag::LEFT, "LEFT"),
            (CollisionTag::RIGHT, "RIGHT"),
        ];
        if self.is_empty() {
            return f.write_str("NONE");
        }
        let mut first = true;
        for (bit, name) in NAMES {
            if self.contains(bit) {
                if !first {
                    f.write_str(" | ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TileCollision {
    #[default]
    Passable,
    Solid,
    /// Blocks only bodies moving upward.
    OneWay,
}

/// Corrected top-left position of the body plus what it touched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub position: Vector,
    pub tag: CollisionTag,
}

impl Resolution {
    /// The resolved body, given the size it was resolved with.
    pub fn bounds(&self, size: Vector) -> Rect {
        Rect::from_position_size(self.position, size)
    }
}

/// Horizontal nudge applied to a body found sitting inside solid ground.
pub const EMBEDDED_NUDGE_PX: f32 = 2.0;

/// Uniform grid of cells that moving rectangles resolve against.
///
/// Resolution runs two passes. The vertical pass moves the body by its
/// vertical motion only and snaps it out of the first blocking cell found
/// scanning columns left to right and, within a column, rows top to bottom.
/// The horizontal pass then moves the already corrected body sideways and
/// snaps it against solid cells only.
pub trait StaticCollider {
    fn tile_size(&self) -> f32;

    /// Cells outside the grid are [`TileCollision::Passable`].
    fn cell_collision(&self, col: i32, row: i32) -> TileCollision;

    fn collision_response(&self, body: Rect, speed: Vector, delta_ms: f32) -> Resolution {
        let tile_size = self.tile_size();
        let mut position = body.left_top();
        let mut tag = CollisionTag::NONE;

        let vertical = body.moved(Vector::new(0.0, speed.y * delta_ms));
        position.y = vertical.top();
        let (cols, rows) = footprint(vertical, tile_size);
        'columns: for col in cols.0..=cols.1 {
            for row in rows.0..=rows.1 {
                let blocks = match self.cell_collision(col, row) {
                    TileCollision::Solid => true,
                    TileCollision::OneWay => speed.y < 0.0,
                    TileCollision::Passable => false,
                };
                if !blocks {
                    continue;
                }
                let tile = cell_rect(col, row, tile_size);
                if speed.y == 0.0 && vertical.bottom() > tile.top() {
                    position.x += EMBEDDED_NUDGE_PX;
                    tag |= CollisionTag::LEFT;
                } else if speed.y >= 0.0 {
                    position.y = tile.top() - body.height();
                    tag |= CollisionTag::FLOOR;
                } else {
                    position.y = tile.bottom();
                    tag |= CollisionTag::CEILING;
                }
                break 'columns;
            }
        }

        // Stationary bodies are not pushed out of walls sideways.
        if speed.x == 0.0 {
            return Resolution { position, tag };
        }

        let horizontal = Rect::new(
            position.x + speed.x * delta_ms,
            position.y,
            body.width(),
            body.height(),
        );
        position.x = horizontal.left();
        let (cols, rows) = footprint(horizontal, tile_size);
        let moving_right = speed.x > 0.0;
        let mut scan: Box<dyn Iterator<Item = i32>> = if moving_right {
            Box::new(cols.0..=cols.1)
        } else {
            Box::new((cols.0..=cols.1).rev())
        };
        let hit = scan.find_map(|col| {
            (rows.0..=rows.1)
                .any(|row| self.cell_collision(col, row) == TileCollision::Solid)
                .then(|| cell_rect(col, rows.0, tile_size))
        });
        if let Some(tile) = hit {
            if moving_right {
                position.x = tile.left() - body.width();
                tag |= CollisionTag::RIGHT;
            } else {
                position.x = tile.right();
                tag |= CollisionTag::LEFT;
            }
        }

        Resolution { position, tag }
    }
}

/// Resolves `body` against another moving rectangle.
///
/// Contact is attributed to the axis on which the two were apart before the
/// step, preferring the vertical axis so landing on top of something reads
/// as a floor hit. Bodies that already overlapped are pushed out along the
/// axis of least penetration. The returned tag names the side of `body`
/// that made contact.
pub fn dynamic_collision_response(
    body: Rect,
    speed: Vector,
    other: Rect,
    other_speed: Vector,
    delta_ms: f32,
) -> Resolution {
    let moved = body.moved(speed * delta_ms);
    let other_moved = other.moved(other_speed * delta_ms);
    let mut position = moved.left_top();

    let Some(overlap) = moved.intersection(&other_moved) else {
        return Resolution {
            position,
            tag: CollisionTag::NONE,
        };
    };

    let tag = if body.bottom() <= other.top() {
        position.y = other_moved.top() - body.height();
        CollisionTag::FLOOR
    } else if body.top() >= other.bottom() {
        position.y = other_moved.bottom();
        CollisionTag::CEILING
    } else if body.right() <= other.left() {
        position.x = other_moved.left() - body.width();
        CollisionTag::RIGHT
    } else if body.left() >= other.right() {
        position.x = other_moved.right();
        CollisionTag::LEFT
    } else if overlap.width() < overlap.height() {
        if moved.center().x < other_moved.center().x {
            position.x = other_moved.left() - body.width();
            CollisionTag::RIGHT
        } else {
            position.x = other_moved.right();
            CollisionTag::LEFT
        }
    } else if moved.center().y < other_moved.center().y {
        position.y = other_moved.top() - body.height();
        CollisionTag::FLOOR
    } else {
        position.y = other_moved.bottom();
        CollisionTag::CEILING
    };

    Resolution { position, tag }
}

/// Inclusive cell ranges covered by `rect`. Far edges are exclusive, so a
/// body resting flush on a tile does not cover it.
fn footprint(rect: Rect, tile_size: f32) -> ((i32, i32), (i32, i32)) {
    let first_col = (rect.left() / tile_size).floor() as i32;
    let last_col = (rect.right() / tile_size).ceil() as i32 - 1;
    let first_row = (rect.top() / tile_size).floor() as i32;
    let last_row = (rect.bottom() / tile_size).ceil() as i32 - 1;
    ((first_col, last_col), (first_row, last_row))
}

fn cell_rect(col: i32, row: i32, tile_size: f32) -> Rect {
    Rect::new(
        col as f32 * tile_size,
        row as f32 * tile_size,
        tile_size,
        tile_size,
    )
}
