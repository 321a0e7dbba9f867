use image::{Rgb, RgbImage};
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Serialize, Serializer};

use crate::config::SynthConfig;
use crate::content::ContentResolver;
use crate::error::Error;
use crate::fonts::FontSet;
use crate::geometry::{BoundingBox, CellGrid, to_pixel_rect};
use crate::render::{INK, PAPER, draw_outline, draw_text_centered};

/// Header combinations a table can be drawn with. Order fixes column order.
pub const HEADER_SETS: &[&[&str]] = &[
    &["produit", "quantité", "prix"],
    &["produit", "prix", "quantité", "total"],
    &["produit", "quantité", "prix", "tax", "total"],
    &["qte", "Description", "prix unitaire", "total"],
    &["description", "qte", "prix net", "prix coutant", "TVA(%)"],
];

/// Fewest body rows a generated table has.
pub const MIN_BODY_ROWS: u32 = 2;
/// Upper bound on body rows never drops below this, however small the region.
pub const MIN_ROW_CAP: u32 = 3;

/// Rows of cell strings. Every row has the same number of cells once validated;
/// when `has_header` is set, row 0 holds the column headers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableData {
    rows: Vec<Vec<String>>,
    has_header: bool,
}

impl TableData {
    pub fn new(rows: Vec<Vec<String>>, has_header: bool) -> Self {
        Self { rows, has_header }
    }

    /// Body rows only, no header row.
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        Self::new(rows, false)
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn has_header(&self) -> bool {
        self.has_header
    }

    pub fn header(&self) -> Option<&[String]> {
        if self.has_header {
            self.rows.first().map(Vec::as_slice)
        } else {
            None
        }
    }

    pub fn body(&self) -> &[Vec<String>] {
        let skip = usize::from(self.has_header).min(self.rows.len());
        &self.rows[skip..]
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn col_count(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// Check the shape is drawable; returns `(rows, cols)`.
    pub fn validate(&self) -> Result<(usize, usize), Error> {
        let cols = self.col_count();
        if cols == 0 {
            return Err(Error::Configuration("table data cannot be empty".into()));
        }
        if let Some((i, row)) = self.rows.iter().enumerate().find(|(_, r)| r.len() != cols) {
            return Err(Error::Configuration(format!(
                "row {i} has {} cells, expected {cols}",
                row.len()
            )));
        }
        Ok((self.rows.len(), cols))
    }
}

impl Serialize for TableData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.rows)
    }
}

/// How cells of one table instance look. Decided once per table.
#[derive(Clone, Debug, PartialEq)]
pub struct CellLayout {
    pub font_size: f32,
    pub border_width: u32,
    pub border_color: Rgb<u8>,
    pub bold_header: bool,
    pub uppercase_header: bool,
}

impl CellLayout {
    /// Black grid, headers as given.
    pub fn plain(config: &SynthConfig) -> Self {
        Self {
            font_size: config.font_size,
            border_width: config.border_width,
            border_color: INK,
            bold_header: false,
            uppercase_header: false,
        }
    }

    pub fn random<R: Rng + ?Sized>(config: &SynthConfig, rng: &mut R) -> Self {
        let uppercase_header = rng.random_bool(config.uppercase_header_probability.clamp(0.0, 1.0));
        let bold_header = rng.random_bool(config.bold_header_probability.clamp(0.0, 1.0));
        let light = rng.random_bool(config.light_border_probability.clamp(0.0, 1.0));
        Self {
            font_size: config.font_size,
            border_width: config.border_width,
            border_color: if light { PAPER } else { INK },
            bold_header,
            uppercase_header,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableState {
    HeadersChosen,
    DataGenerated,
}

/// Synthesizes one line-items table sized to its region. Rendering consumes
/// the synthesizer.
pub struct TableSynthesizer<'a, R> {
    height: f64,
    width: f64,
    headers: Vec<String>,
    resolver: &'a ContentResolver,
    config: &'a SynthConfig,
    rng: R,
    state: TableState,
}

impl<'a, R: Rng> TableSynthesizer<'a, R> {
    pub fn new(
        height: f64,
        width: f64,
        resolver: &'a ContentResolver,
        config: &'a SynthConfig,
        mut rng: R,
    ) -> Self {
        let headers = HEADER_SETS
            .choose(&mut rng)
            .map(|set| set.iter().map(|h| h.to_string()).collect())
            .unwrap_or_default();
        Self::with_headers(headers, height, width, resolver, config, rng)
    }

    pub fn with_headers(
        headers: Vec<String>,
        height: f64,
        width: f64,
        resolver: &'a ContentResolver,
        config: &'a SynthConfig,
        rng: R,
    ) -> Self {
        log::debug!("TABLE {:.1}x{:.1} headers={:?}", width, height, headers);
        Self {
            height,
            width,
            headers,
            resolver,
            config,
            rng,
            state: TableState::HeadersChosen,
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn state(&self) -> TableState {
        self.state
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Most body rows the region takes before rows get thinner than the
    /// configured minimum row height.
    pub fn max_rows(&self) -> u32 {
        let min_h = self.config.min_row_height.max(1) as f64;
        let fit = (self.height.max(0.0) / min_h).floor() as u32;
        fit.max(MIN_ROW_CAP)
    }

    /// Header row followed by a random number of body rows. Each cell is
    /// sampled independently of every other cell.
    pub fn generate_data(&mut self) -> TableData {
        let upper = self.max_rows();
        let row_count = self.rng.random_range(MIN_BODY_ROWS..=upper);
        let mut rows = Vec::with_capacity(row_count as usize + 1);
        rows.push(self.headers.clone());
        for _ in 0..row_count {
            let row: Vec<String> = self
                .headers
                .iter()
                .map(|h| self.resolver.sample_cell(h, &mut self.rng))
                .collect();
            rows.push(row);
        }
        self.state = TableState::DataGenerated;
        TableData::new(rows, true)
    }

    /// Draw the table into `bbox` (annotation space) with a randomly drawn
    /// cell layout. Generates data first when none is given. Returns exactly
    /// what was drawn.
    pub fn render(
        mut self,
        img: &mut RgbImage,
        bbox: &BoundingBox,
        data: Option<TableData>,
        fonts: &FontSet,
    ) -> Result<TableData, Error> {
        let data = match data {
            Some(d) => d,
            None => self.generate_data(),
        };
        let layout = CellLayout::random(self.config, &mut self.rng);
        self.render_with_layout(img, bbox, data, fonts, &layout)
    }

    pub fn render_with_layout(
        mut self,
        img: &mut RgbImage,
        bbox: &BoundingBox,
        mut data: TableData,
        fonts: &FontSet,
        layout: &CellLayout,
    ) -> Result<TableData, Error> {
        // Casing is cosmetic: only the header row changes, body rows stay as sampled.
        if layout.uppercase_header {
            self.headers = self.headers.iter().map(|h| h.to_uppercase()).collect();
            if data.has_header
                && let Some(first) = data.rows.first_mut()
            {
                for cell in first.iter_mut() {
                    *cell = cell.to_uppercase();
                }
            }
        }

        let (rows, cols) = data.validate()?;

        let rect = to_pixel_rect(bbox, img.height() as f64);
        if rect.is_degenerate() {
            return Err(Error::DegenerateRegion);
        }
        let grid = CellGrid::new(rect, rows, cols);

        for (i, row) in data.rows.iter().enumerate() {
            let bold = layout.bold_header && data.has_header && i == 0;
            log::debug!(
                "TABLE row={} y={:.2} cell={:.2}x{:.2} cells={}",
                i,
                grid.cell(i, 0).y1,
                grid.cell_width(),
                grid.cell_height(),
                row.len()
            );
            for (j, text) in row.iter().enumerate() {
                let cell = grid.cell(i, j);
                draw_outline(img, &cell, layout.border_width, layout.border_color);
                draw_text_centered(img, fonts, &cell, text, layout.font_size, bold, INK);
            }
        }

        Ok(data)
    }
}
