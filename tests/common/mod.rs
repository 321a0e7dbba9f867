#![allow(dead_code)]

use image::RgbImage;
use rand::SeedableRng;
use rand::rngs::StdRng;

use invoice_synth::config::SynthConfig;
use invoice_synth::content::{ContentCatalog, ContentResolver};
use invoice_synth::render::PAPER;

pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub fn catalog() -> ContentCatalog {
    ContentCatalog::in_memory([
        ("produit", vec!["Papier A4", "Stylos", "Classeurs", "Webcam HD"]),
        ("quantite", vec!["1", "2", "5", "10"]),
        ("prix", vec!["4.50 €", "12.00 €", "99.90 €"]),
        ("total", vec!["45.00 €", "120.00 €"]),
        ("tax", vec!["20%", "5.5%"]),
        ("ID", vec!["A-001", "B-017"]),
    ])
}

pub fn resolver() -> ContentResolver {
    ContentResolver::new(catalog())
}

pub fn empty_resolver() -> ContentResolver {
    ContentResolver::new(ContentCatalog::empty())
}

pub fn config() -> SynthConfig {
    SynthConfig::default()
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

pub fn is_blank(img: &RgbImage) -> bool {
    img.pixels().all(|p| *p == PAPER)
}

/// Annotation record shaped like the FATURA dataset exports.
pub const SAMPLE_RECORD: &str = r#"{
    "TITLE": {"text": "INVOICE", "bbox": [[250.0, 860.0], [350.0, 880.0]]},
    "DATE": {"text": "Date: 2024-03-01", "bbox": [[400.0, 800.0], [560.0, 815.0]]},
    "TOTAL": {"text": "Total: $100", "bbox": [[400.0, 150.0], [560.0, 170.0]]},
    "LOGO": {"bbox": [[20.0, 880.0], [80.0, 820.0]]},
    "TABLE": [[{"bbox": [[10.0, 220.88], [560.0, 328.88]]}]]
}"#;
