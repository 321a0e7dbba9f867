pub mod annotation;
pub mod batch;
pub mod compose;
pub mod config;
pub mod content;
mod error;
pub mod fonts;
pub mod geometry;
pub mod logo;
pub mod render;
pub mod table;
pub mod translate;

pub use error::Error;

use std::path::Path;
use std::time::Instant;

use rand::Rng;

use annotation::{InputRecord, OutputAnnotation};
use compose::DocumentComposer;
use logo::{LogoTransplanter, TemplateLogo};

/// Synthesize one invoice from an annotation file and write the JPEG page and
/// its JSON ground truth. The template image, when given, fixes the page size
/// and is the logo source.
pub fn synthesize_file<R: Rng>(
    input: &Path,
    template: Option<&Path>,
    output_image: &Path,
    output_annotation: &Path,
    composer: &DocumentComposer,
    rng: &mut R,
) -> Result<OutputAnnotation, Error> {
    let t0 = Instant::now();

    let record = InputRecord::load(input)?;
    let t_parse = t0.elapsed();

    let default_size = composer.config().surface_size;
    let size = match template {
        Some(path) => image::image_dimensions(path).unwrap_or_else(|e| {
            log::warn!("{}: {e}, using {:?}", path.display(), default_size);
            default_size
        }),
        None => default_size,
    };

    let logo_source = match (template, record.logo()) {
        (Some(path), Some(_)) => TemplateLogo::open(path)
            .map_err(|e| log::warn!("Logo source unavailable: {e}"))
            .ok(),
        _ => None,
    };
    let logo_ref = logo_source.as_ref().map(|l| l as &dyn LogoTransplanter);

    let rendered = composer.compose(&record, size, logo_ref, rng)?;
    let t_render = t0.elapsed();

    rendered.save(output_image, output_annotation)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing {}: parse={:.1}ms, render={:.1}ms, write={:.1}ms, total={:.1}ms ({} entries)",
        input.display(),
        t_parse.as_secs_f64() * 1000.0,
        (t_render - t_parse).as_secs_f64() * 1000.0,
        (t_total - t_render).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        rendered.annotation.len(),
    );

    Ok(rendered.annotation)
}
