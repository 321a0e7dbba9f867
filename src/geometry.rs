use serde::{Deserialize, Serialize};

/// Axis-aligned box in annotation space: origin bottom-left, units are pixels
/// of the image the annotation was made on. Corner order is not guaranteed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[[f64; 2]; 2]", into = "[[f64; 2]; 2]")]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f64 {
        (self.x2 - self.x1).abs()
    }

    pub fn height(&self) -> f64 {
        (self.y2 - self.y1).abs()
    }
}

impl From<[[f64; 2]; 2]> for BoundingBox {
    fn from([[x1, y1], [x2, y2]]: [[f64; 2]; 2]) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

impl From<BoundingBox> for [[f64; 2]; 2] {
    fn from(b: BoundingBox) -> Self {
        [[b.x1, b.y1], [b.x2, b.y2]]
    }
}

/// Rectangle on the rendering surface: origin top-left, `x1 <= x2`, `y1 <= y2`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct PixelRect {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl PixelRect {
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Whether any part of the rect lands on a `width × height` surface.
    pub fn overlaps_surface(&self, width: u32, height: u32) -> bool {
        self.x1 < width as f64 && self.x2 > 0.0 && self.y1 < height as f64 && self.y2 > 0.0
    }
}

impl From<[f64; 4]> for PixelRect {
    fn from([x1, y1, x2, y2]: [f64; 4]) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

impl From<PixelRect> for [f64; 4] {
    fn from(r: PixelRect) -> Self {
        [r.x1, r.y1, r.x2, r.y2]
    }
}

/// Flip a bottom-left-origin box into top-left surface space and order its corners.
///
/// Every element placed on a surface (text fields, logo, table) goes through
/// this one function so their relative positions stay in sync.
pub fn to_pixel_rect(bbox: &BoundingBox, surface_height: f64) -> PixelRect {
    let y1 = surface_height - bbox.y1;
    let y2 = surface_height - bbox.y2;
    PixelRect {
        x1: bbox.x1.min(bbox.x2),
        y1: y1.min(y2),
        x2: bbox.x1.max(bbox.x2),
        y2: y1.max(y2),
    }
}

/// Partition of a rectangle into `rows × cols` equal cells. Row 0 is the top row.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellGrid {
    pub rect: PixelRect,
    pub rows: usize,
    pub cols: usize,
}

impl CellGrid {
    pub fn new(rect: PixelRect, rows: usize, cols: usize) -> Self {
        Self { rect, rows, cols }
    }

    pub fn cell_width(&self) -> f64 {
        self.rect.width() / self.cols as f64
    }

    pub fn cell_height(&self) -> f64 {
        self.rect.height() / self.rows as f64
    }

    // The last edge is pinned to the rect border so float error never opens a
    // gap; neighbouring cells share the exact same edge value.
    fn col_edge(&self, j: usize) -> f64 {
        if j >= self.cols {
            self.rect.x2
        } else {
            self.rect.x1 + j as f64 * self.cell_width()
        }
    }

    fn row_edge(&self, i: usize) -> f64 {
        if i >= self.rows {
            self.rect.y2
        } else {
            self.rect.y1 + i as f64 * self.cell_height()
        }
    }

    pub fn cell(&self, row: usize, col: usize) -> PixelRect {
        PixelRect {
            x1: self.col_edge(col),
            y1: self.row_edge(row),
            x2: self.col_edge(col + 1),
            y2: self.row_edge(row + 1),
        }
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, PixelRect)> + '_ {
        (0..self.rows).flat_map(move |i| (0..self.cols).map(move |j| (i, j, self.cell(i, j))))
    }
}
