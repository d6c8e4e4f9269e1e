use std::fmt;

use engine::{Color, Rect, RenderTarget};

pub(crate) const GROUND: Color = Color::rgb(120, 72, 0);
pub(crate) const BRICK: Color = Color::rgb(200, 76, 12);
pub(crate) const HIDDEN_BLOCK: Color = Color::rgb(250, 200, 80);
pub(crate) const PLAYER: Color = Color::rgb(228, 0, 88);
pub(crate) const GOOMBA: Color = Color::rgb(160, 82, 45);
pub(crate) const KOOPA: Color = Color::rgb(0, 168, 0);
pub(crate) const SQUASHED: Color = Color::rgb(90, 90, 90);

const PALETTE: [(Color, char); 7] = [
    (GROUND, '='),
    (BRICK, '#'),
    (HIDDEN_BLOCK, '.'),
    (PLAYER, 'M'),
    (GOOMBA, 'g'),
    (KOOPA, 'k'),
    (SQUASHED, '_'),
];

fn glyph(color: Color) -> char {
    PALETTE
        .iter()
        .find(|(candidate, _)| *candidate == color)
        .map_or('?', |(_, glyph)| *glyph)
}

/// Text render target: one character per `cell` pixels, later draws on top.
pub(crate) struct AsciiCanvas {
    cell: f32,
    cols: usize,
    rows: usize,
    cells: Vec<char>,
}

impl AsciiCanvas {
    pub(crate) fn new(bounds: Rect, cell: f32) -> Self {
        let cols = (bounds.width() / cell).ceil().max(0.0) as usize;
        let rows = (bounds.height() / cell).ceil().max(0.0) as usize;
        Self {
            cell,
            cols,
            rows,
            cells: vec![' '; cols * rows],
        }
    }

    pub(crate) fn row(&self, row: usize) -> String {
        self.cells[row * self.cols..(row + 1) * self.cols]
            .iter()
            .collect()
    }

    fn fill(&mut self, rect: Rect, glyph: char) {
        let first_col = (rect.left() / self.cell).floor().max(0.0) as usize;
        let first_row = (rect.top() / self.cell).floor().max(0.0) as usize;
        let last_col = ((rect.right() / self.cell).ceil().max(0.0) as usize).min(self.cols);
        let last_row = ((rect.bottom() / self.cell).ceil().max(0.0) as usize).min(self.rows);
        for row in first_row..last_row {
            for col in first_col..last_col {
                self.cells[row * self.cols + col] = glyph;
            }
        }
    }
}

impl RenderTarget for AsciiCanvas {
    fn draw_rect(&mut self, rect: Rect, color: Color) {
        self.fill(rect, glyph(color));
    }

    fn draw_sprite(&mut self, _texture: &str, _source: Rect, dest: Rect) {
        self.fill(dest, '?');
    }
}

impl fmt::Display for AsciiCanvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.rows {
            writeln!(f, "{}", self.row(row))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rects_fill_covered_cells_and_clip_to_canvas() {
        let mut canvas = AsciiCanvas::new(Rect::new(0.0, 0.0, 64.0, 32.0), 16.0);
        canvas.draw_rect(Rect::new(0.0, 16.0, 64.0, 16.0), GROUND);
        canvas.draw_rect(Rect::new(20.0, 4.0, 16.0, 16.0), PLAYER);
        canvas.draw_rect(Rect::new(56.0, -40.0, 80.0, 50.0), Color::rgb(1, 2, 3));

        assert_eq!(canvas.row(0), " MM?");
        assert_eq!(canvas.row(1), "=MM=");
        assert_eq!(canvas.to_string(), " MM?\n=MM=\n");
    }
}
