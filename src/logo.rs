use std::path::Path;

use image::RgbImage;
use image::imageops;

use crate::error::Error;
use crate::geometry::{BoundingBox, PixelRect, to_pixel_rect};

/// Copies the logo region of a source document onto the output surface.
pub trait LogoTransplanter: Send + Sync {
    /// Paste the logo found at `bbox` and return where it landed on `dest`.
    fn transplant(&self, bbox: &BoundingBox, dest: &mut RgbImage) -> Result<PixelRect, Error>;
}

/// Crops logos out of the template image the annotation was made on.
pub struct TemplateLogo {
    template: RgbImage,
}

impl TemplateLogo {
    pub fn new(template: RgbImage) -> Self {
        Self { template }
    }

    pub fn open(path: &Path) -> Result<Self, Error> {
        let img = image::open(path)
            .map_err(|e| Error::MissingResource(format!("template {}: {e}", path.display())))?;
        Ok(Self::new(img.to_rgb8()))
    }

    pub fn template(&self) -> &RgbImage {
        &self.template
    }
}

impl LogoTransplanter for TemplateLogo {
    fn transplant(&self, bbox: &BoundingBox, dest: &mut RgbImage) -> Result<PixelRect, Error> {
        let (tw, th) = self.template.dimensions();
        let src = to_pixel_rect(bbox, th as f64);
        let x = src.x1.max(0.0).floor() as u32;
        let y = src.y1.max(0.0).floor() as u32;
        let x_end = (src.x2.ceil().max(0.0) as u32).min(tw);
        let y_end = (src.y2.ceil().max(0.0) as u32).min(th);
        if x_end <= x || y_end <= y {
            return Err(Error::ExternalService(format!(
                "logo box {:?} lies outside the {}x{} template",
                src, tw, th
            )));
        }

        let logo = imageops::crop_imm(&self.template, x, y, x_end - x, y_end - y).to_image();
        let at = to_pixel_rect(bbox, dest.height() as f64);
        imageops::replace(dest, &logo, at.x1.floor() as i64, at.y1.floor() as i64);
        log::debug!("LOGO pasted {}x{} at ({:.1}, {:.1})", logo.width(), logo.height(), at.x1, at.y1);
        Ok(at)
    }
}
