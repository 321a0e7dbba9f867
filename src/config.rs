use std::path::PathBuf;

/// Tunables for one synthesis run. Shared read-only by every document of a batch.
#[derive(Clone, Debug)]
pub struct SynthConfig {
    pub font_size: f32, // pixels
    pub border_width: u32,
    /// Rows never get thinner than this many pixels.
    pub min_row_height: u32,
    pub uppercase_header_probability: f64,
    pub bold_header_probability: f64,
    pub light_border_probability: f64,
    /// Surface size (width, height) used when no template image gives one.
    pub surface_size: (u32, u32),
    pub source_lang: String,
    pub target_lang: String,
    pub normalize_currency: bool,
    pub usd_to_eur: f64,
    pub font_family: String,
    /// Explicit font file; skips the directory scan when set.
    pub font_path: Option<PathBuf>,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            font_size: 12.0,
            border_width: 2,
            min_row_height: 20,
            uppercase_header_probability: 0.4,
            bold_header_probability: 0.4,
            light_border_probability: 0.25,
            surface_size: (600, 900),
            source_lang: "en".into(),
            target_lang: "fr".into(),
            normalize_currency: true,
            usd_to_eur: 0.85,
            font_family: "DejaVu Sans".into(),
            font_path: None,
        }
    }
}
