use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::annotation::FieldAnnotation;
use crate::fonts::FontSet;
use crate::geometry::{PixelRect, to_pixel_rect};

pub const INK: Rgb<u8> = Rgb([0, 0, 0]);
pub const PAPER: Rgb<u8> = Rgb([255, 255, 255]);

pub fn blank_surface(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, PAPER)
}

/// Outline `rect` with a stroke of `width` pixels growing inward, edges inclusive.
pub fn draw_outline(img: &mut RgbImage, rect: &PixelRect, width: u32, color: Rgb<u8>) {
    let x1 = rect.x1.round() as i32;
    let y1 = rect.y1.round() as i32;
    let x2 = rect.x2.round() as i32;
    let y2 = rect.y2.round() as i32;
    for k in 0..width as i32 {
        let w = x2 - x1 - 2 * k + 1;
        let h = y2 - y1 - 2 * k + 1;
        if w <= 0 || h <= 0 {
            break;
        }
        draw_hollow_rect_mut(img, Rect::at(x1 + k, y1 + k).of_size(w as u32, h as u32), color);
    }
}

/// Draw `text` with its ink box centered inside `rect`.
pub fn draw_text_centered(
    img: &mut RgbImage,
    fonts: &FontSet,
    rect: &PixelRect,
    text: &str,
    px: f32,
    bold: bool,
    color: Rgb<u8>,
) {
    let (face, fake_bold) = fonts.face(bold);
    let extent = face.measure(text, px);
    let ink_w = extent.width + if fake_bold { 1.0 } else { 0.0 };
    let x = rect.x1 + (rect.width() - ink_w) / 2.0 - extent.min_x;
    let y = rect.y1 + (rect.height() - extent.height) / 2.0 - extent.min_y;
    face.draw(img, x, y, text, px, color);
    if fake_bold {
        face.draw(img, x + 1.0, y, text, px, color);
    }
}

/// Draw a field's text anchored at the top-left corner of its transformed box
/// and return that box, which is what the output annotation records.
pub fn place_field(
    img: &mut RgbImage,
    fonts: &FontSet,
    field: &FieldAnnotation,
    surface_height: f64,
    px: f32,
) -> PixelRect {
    let rect = to_pixel_rect(&field.bbox, surface_height);
    log::debug!(
        "FIELD {} at ({:.1}, {:.1}) text={:?}",
        field.id,
        rect.x1,
        rect.y1,
        field.text
    );
    fonts.regular.draw(img, rect.x1, rect.y1, &field.text, px, INK);
    rect
}
