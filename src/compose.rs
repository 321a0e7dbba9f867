use std::path::{Path, PathBuf};

use image::RgbImage;
use rand::Rng;

use crate::annotation::{EntryText, InputRecord, LOGO_KEY, OutputAnnotation, OutputEntry, TABLE_KEY};
use crate::config::SynthConfig;
use crate::content::ContentResolver;
use crate::error::Error;
use crate::fonts::FontSet;
use crate::geometry::to_pixel_rect;
use crate::logo::LogoTransplanter;
use crate::render::{blank_surface, place_field};
use crate::table::TableSynthesizer;
use crate::translate::{CurrencyNormalizer, Translator};

/// A synthesized page and the ground truth of everything drawn on it.
pub struct RenderedInvoice {
    pub image: RgbImage,
    pub annotation: OutputAnnotation,
}

impl RenderedInvoice {
    /// Write the page as JPEG and the annotation as pretty JSON, creating
    /// parent directories as needed.
    pub fn save(&self, image_path: &Path, annotation_path: &Path) -> Result<(), Error> {
        for path in [image_path, annotation_path] {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir)?;
            }
        }
        self.image
            .save_with_format(image_path, image::ImageFormat::Jpeg)?;
        std::fs::write(annotation_path, self.annotation.to_json_pretty()?)?;
        Ok(())
    }
}

/// `out/invoice.jpeg` → `out/invoice.json`
pub fn annotation_path_for(image_path: &Path) -> PathBuf {
    image_path.with_extension("json")
}

/// Draws one document per call: text fields, then the logo, then the table.
pub struct DocumentComposer<'a> {
    config: &'a SynthConfig,
    fonts: &'a FontSet,
    resolver: &'a ContentResolver,
    translator: Option<&'a dyn Translator>,
    currency: Option<CurrencyNormalizer>,
}

impl<'a> DocumentComposer<'a> {
    pub fn new(config: &'a SynthConfig, fonts: &'a FontSet, resolver: &'a ContentResolver) -> Self {
        let currency = config
            .normalize_currency
            .then(|| CurrencyNormalizer::new(config.usd_to_eur));
        Self {
            config,
            fonts,
            resolver,
            translator: None,
            currency,
        }
    }

    pub fn with_translator(mut self, translator: &'a dyn Translator) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn config(&self) -> &SynthConfig {
        self.config
    }

    /// Currency normalization then translation. A failed translation keeps
    /// the normalized source text.
    pub fn prepare_text(&self, text: &str) -> String {
        let text = match &self.currency {
            Some(c) => c.normalize(text),
            None => text.to_string(),
        };
        let Some(translator) = self.translator else {
            return text;
        };
        if text.trim().is_empty() {
            return text;
        }
        match translator.translate(&text, &self.config.source_lang, &self.config.target_lang) {
            Ok(t) => t,
            Err(e) => {
                log::warn!("Translation failed, keeping original text: {e}");
                text
            }
        }
    }

    pub fn compose<R: Rng>(
        &self,
        record: &InputRecord,
        surface_size: (u32, u32),
        logo: Option<&dyn LogoTransplanter>,
        rng: &mut R,
    ) -> Result<RenderedInvoice, Error> {
        let (width, height) = surface_size;
        let mut img = blank_surface(width, height);
        let surface_h = height as f64;
        let mut annotation = OutputAnnotation::new();

        for field in record.fields() {
            if to_pixel_rect(&field.bbox, surface_h).is_degenerate() {
                log::warn!("{}: zero-area box, field skipped", field.id);
                continue;
            }
            let mut field = field.clone();
            field.text = self.prepare_text(&field.text);
            let rect = place_field(&mut img, self.fonts, &field, surface_h, self.config.font_size);
            annotation.insert(
                field.id,
                OutputEntry {
                    bbox: rect,
                    text: EntryText::Text(field.text),
                },
            );
        }

        if let Some(region) = record.logo() {
            match logo {
                Some(transplanter) => match transplanter.transplant(&region.bbox, &mut img) {
                    Ok(rect) => annotation.insert(
                        LOGO_KEY,
                        OutputEntry {
                            bbox: rect,
                            text: EntryText::Text(LOGO_KEY.to_string()),
                        },
                    ),
                    Err(e) => log::warn!("Logo skipped: {e}"),
                },
                None => log::debug!("No logo source, logo skipped"),
            }
        }

        if let Some(region) = record.table() {
            let rect = to_pixel_rect(&region.bbox, surface_h);
            if rect.is_degenerate() {
                log::warn!("{TABLE_KEY}: zero-area region, table skipped");
            } else if !rect.overlaps_surface(width, height) {
                log::warn!(
                    "{TABLE_KEY}: region {:?} lies outside the {width}x{height} page, table skipped",
                    rect
                );
            } else {
                let synth = TableSynthesizer::new(
                    region.bbox.height(),
                    region.bbox.width(),
                    self.resolver,
                    self.config,
                    &mut *rng,
                );
                let data = synth.render(&mut img, &region.bbox, None, self.fonts)?;
                annotation.insert(
                    TABLE_KEY,
                    OutputEntry {
                        bbox: rect,
                        text: EntryText::Table(data),
                    },
                );
            }
        }

        Ok(RenderedInvoice {
            image: img,
            annotation,
        })
    }
}
