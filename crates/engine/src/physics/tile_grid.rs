use thiserror::Error;

use crate::geometry::{Rect, Vector};
use crate::render::RenderTarget;
use crate::scene::{Node, Object, UpdateCx};

use super::collision::{StaticCollider, TileCollision};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TileGridError {
    #[error("tile count mismatch: expected {expected}, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },
}

/// Row-major 2D storage. Unchecked accessors assert; callers in hot loops
/// test [`Matrix::is_valid`] first.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T> {
    width: u32,
    height: u32,
    cells: Vec<T>,
}

impl<T: Default> Matrix<T> {
    pub fn new(width: u32, height: u32) -> Self {
        Self::from_fn(width, height, |_, _| T::default())
    }
}

impl<T> Matrix<T> {
    pub fn from_fn(width: u32, height: u32, mut cell: impl FnMut(u32, u32) -> T) -> Self {
        let mut cells = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                cells.push(cell(x, y));
            }
        }
        Self {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_valid(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    pub fn get(&self, x: u32, y: u32) -> &T {
        let index = self.index_of(x, y);
        &self.cells[index]
    }

    pub fn get_mut(&mut self, x: u32, y: u32) -> &mut T {
        let index = self.index_of(x, y);
        &mut self.cells[index]
    }

    pub fn set(&mut self, x: u32, y: u32, value: T) {
        *self.get_mut(x, y) = value;
    }

    /// Cells with their coordinates, row by row.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, &T)> {
        let width = self.width.max(1);
        self.cells
            .iter()
            .enumerate()
            .map(move |(index, cell)| (index as u32 % width, index as u32 / width, cell))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.cells.iter_mut()
    }

    fn index_of(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "cell ({x}, {y}) is outside a {}x{} matrix",
            self.width,
            self.height
        );
        y as usize * self.width as usize + x as usize
    }
}

/// One cell's content. Blocks, coins and decorations implement this.
pub trait Tile {
    fn collision(&self) -> TileCollision;

    fn update(&mut self, _delta_ms: f32) {}

    fn draw(&self, _bounds: Rect, _target: &mut dyn RenderTarget) {}
}

pub type TileSlot = Option<Box<dyn Tile>>;

/// Level geometry as a scene object. Its node's position is ignored: the
/// grid is anchored at the world origin.
pub struct TileGrid {
    tile_size: f32,
    tiles: Matrix<TileSlot>,
}

crate::declare_type!(TileGrid);

impl TileGrid {
    /// Panics unless `tile_size` is positive.
    pub fn new(width: u32, height: u32, tile_size: f32) -> Self {
        assert!(tile_size > 0.0, "tile size must be positive, got {tile_size}");
        Self {
            tile_size,
            tiles: Matrix::from_fn(width, height, |_, _| None),
        }
    }

    /// Rebuilds the grid from row-major cell codes. `factory` maps a code to
    /// a tile, or `None` for an empty cell.
    pub fn load_from_array(
        &mut self,
        width: u32,
        height: u32,
        codes: &[i32],
        mut factory: impl FnMut(i32) -> TileSlot,
    ) -> Result<(), TileGridError> {
        let expected = width as usize * height as usize;
        if codes.len() != expected {
            return Err(TileGridError::TileCountMismatch {
                expected,
                actual: codes.len(),
            });
        }
        self.tiles = Matrix::from_fn(width, height, |x, y| {
            factory(codes[y as usize * width as usize + x as usize])
        });
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.tiles.width()
    }

    pub fn height(&self) -> u32 {
        self.tiles.height()
    }

    pub fn is_valid(&self, col: i32, row: i32) -> bool {
        self.tiles.is_valid(col, row)
    }

    pub fn to_map_coordinates(&self, pixel: Vector) -> (i32, i32) {
        (
            (pixel.x / self.tile_size).floor() as i32,
            (pixel.y / self.tile_size).floor() as i32,
        )
    }

    pub fn to_pixel_coordinates(&self, col: i32, row: i32) -> Vector {
        Vector::new(col as f32 * self.tile_size, row as f32 * self.tile_size)
    }

    pub fn tile_rect(&self, col: i32, row: i32) -> Rect {
        Rect::from_position_size(
            self.to_pixel_coordinates(col, row),
            Vector::new(self.tile_size, self.tile_size),
        )
    }

    /// Pixel size of the whole grid.
    pub fn bounds(&self) -> Rect {
        Rect::new(
            0.0,
            0.0,
            self.width() as f32 * self.tile_size,
            self.height() as f32 * self.tile_size,
        )
    }

    pub fn tile(&self, col: u32, row: u32) -> Option<&dyn Tile> {
        self.tiles.get(col, row).as_deref()
    }

    pub fn tile_mut(&mut self, col: u32, row: u32) -> Option<&mut (dyn Tile + 'static)> {
        self.tiles.get_mut(col, row).as_deref_mut()
    }

    pub fn set_tile(&mut self, col: u32, row: u32, tile: TileSlot) {
        self.tiles.set(col, row, tile);
    }

    pub fn take_tile(&mut self, col: u32, row: u32) -> TileSlot {
        self.tiles.get_mut(col, row).take()
    }
}

impl StaticCollider for TileGrid {
    fn tile_size(&self) -> f32 {
        self.tile_size
    }

    fn cell_collision(&self, col: i32, row: i32) -> TileCollision {
        if !self.tiles.is_valid(col, row) {
            return TileCollision::Passable;
        }
        self.tiles
            .get(col as u32, row as u32)
            .as_ref()
            .map_or(TileCollision::Passable, |tile| tile.collision())
    }
}

impl Object for TileGrid {
    fn update(&mut self, cx: &mut UpdateCx<'_>) {
        for tile in self.tiles.iter_mut().flatten() {
            tile.update(cx.delta_ms);
        }
    }

    fn draw(&self, _node: &Node, target: &mut dyn RenderTarget) {
        for (col, row, slot) in self.tiles.iter() {
            if let Some(tile) = slot {
                tile.draw(self.tile_rect(col as i32, row as i32), target);
            }
        }
    }
}
