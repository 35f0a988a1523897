//! Canvas — the abstract surface the render state machine draws on.
//!
//! A fixed-size grid of `Cell`s with float-coordinate primitives. Positions
//! arrive in protocol units (one unit per cell), already combined with the
//! current anchor by the caller via `Anchor::place`. Everything clips to the
//! grid; drawing off-canvas is not an error.

use crate::assets::Asset;
use crate::types::{Anchor, Cell, Color};

pub struct Canvas {
    width: u16,
    height: u16,
    cells: Vec<Vec<Cell>>,
}

impl Canvas {
    pub fn new(width: u16, height: u16) -> Self {
        Canvas {
            width,
            height,
            cells: vec![vec![Cell::default(); width as usize]; height as usize],
        }
    }

    /// Recreate the grid at a new size (on terminal resize).
    pub fn resize(&mut self, width: u16, height: u16) {
        *self = Canvas::new(width, height);
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.cells
    }

    pub fn cell(&self, x: u16, y: u16) -> Option<&Cell> {
        self.cells
            .get(y as usize)
            .and_then(|row| row.get(x as usize))
    }

    // -----------------------------------------------------------------------
    // Primitives
    // -----------------------------------------------------------------------

    pub fn clear(&mut self, color: Color) {
        for row in &mut self.cells {
            for cell in row {
                *cell = Cell {
                    ch: ' ',
                    fg: Color::WHITE,
                    bg: color,
                };
            }
        }
    }

    pub fn fill_rect(&mut self, anchor: Anchor, x: f32, y: f32, w: f32, h: f32, color: Color) {
        let (tx, ty) = anchor.place(x, y, w, h);
        self.fill_box(tx, ty, w, h, |cell| {
            cell.ch = ' ';
            cell.bg = color;
        });
    }

    pub fn fill_circle(&mut self, anchor: Anchor, x: f32, y: f32, radius: f32, color: Color) {
        let d = radius * 2.0;
        let (tx, ty) = anchor.place(x, y, d, d);
        let (cx, cy) = (tx + radius, ty + radius);
        let (x0, y0, x1, y1) = clip_box(tx, ty, d, d, self.width, self.height);
        for row in y0..y1 {
            for col in x0..x1 {
                // Test against the cell's midpoint.
                let dx = (col as f32 + 0.5) - cx;
                let dy = (row as f32 + 0.5) - cy;
                if dx * dx + dy * dy <= radius * radius {
                    let cell = &mut self.cells[row][col];
                    cell.ch = ' ';
                    cell.bg = color;
                }
            }
        }
    }

    pub fn draw_text(&mut self, anchor: Anchor, x: f32, y: f32, text: &str, color: Color) {
        let len = text.chars().count() as f32;
        let (tx, ty) = anchor.place(x, y, len, 1.0);
        let row = ty.floor() as i32;
        if row < 0 || row >= i32::from(self.height) {
            return;
        }
        let start = tx.floor() as i32;
        for (i, ch) in text.chars().enumerate() {
            let col = start + i as i32;
            if (0..i32::from(self.width)).contains(&col) {
                let cell = &mut self.cells[row as usize][col as usize];
                cell.ch = ch;
                cell.fg = color;
            }
        }
    }

    /// Composite an asset's cell art at the given position, stretched to
    /// `size` when provided, else at native size.
    pub fn draw_image(
        &mut self,
        anchor: Anchor,
        x: f32,
        y: f32,
        asset: &Asset,
        size: Option<(f32, f32)>,
    ) {
        let (w, h) = size.unwrap_or((asset.width as f32, asset.height as f32));
        let (tx, ty) = anchor.place(x, y, w, h);
        let (glyph, fg) = (asset.glyph, asset.color);
        self.fill_box(tx, ty, w, h, |cell| {
            cell.ch = glyph;
            cell.fg = fg;
        });
    }

    fn fill_box(&mut self, tx: f32, ty: f32, w: f32, h: f32, mut paint: impl FnMut(&mut Cell)) {
        let (x0, y0, x1, y1) = clip_box(tx, ty, w, h, self.width, self.height);
        for row in y0..y1 {
            for col in x0..x1 {
                paint(&mut self.cells[row][col]);
            }
        }
    }
}

/// Clip a float box to grid bounds, returning half-open cell ranges.
fn clip_box(tx: f32, ty: f32, w: f32, h: f32, width: u16, height: u16) -> (usize, usize, usize, usize) {
    if w <= 0.0 || h <= 0.0 {
        return (0, 0, 0, 0);
    }
    let x0 = (tx.floor().max(0.0)) as usize;
    let y0 = (ty.floor().max(0.0)) as usize;
    let x1 = ((tx + w).ceil().clamp(0.0, f32::from(width))) as usize;
    let y1 = ((ty + h).ceil().clamp(0.0, f32::from(height))) as usize;
    (x0, y0, x1.max(x0), y1.max(y0))
}
