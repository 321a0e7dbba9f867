use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use memmap2::Mmap;
use rusttype::{Font, Scale, point};
use ttf_parser::Face;

use crate::config::SynthConfig;
use crate::error::Error;

/// Upright faces by (lowercase family, bold): file and face index inside it.
type FaceIndex = HashMap<(String, bool), (PathBuf, u32)>;

static FACES: OnceLock<FaceIndex> = OnceLock::new();

const FONT_DIRS_ENV: &str = "INVOICE_SYNTH_FONTS";

#[cfg(target_os = "linux")]
const SYSTEM_FONT_DIRS: &[&str] = &["/usr/share/fonts", "/usr/local/share/fonts"];
#[cfg(target_os = "macos")]
const SYSTEM_FONT_DIRS: &[&str] = &[
    "/Library/Fonts",
    "/System/Library/Fonts",
    "/System/Library/Fonts/Supplemental",
];
#[cfg(target_os = "windows")]
const SYSTEM_FONT_DIRS: &[&str] = &["C:\\Windows\\Fonts"];
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
const SYSTEM_FONT_DIRS: &[&str] = &[];

#[cfg(target_os = "linux")]
const USER_FONT_DIR: Option<&str> = Some(".local/share/fonts");
#[cfg(target_os = "macos")]
const USER_FONT_DIR: Option<&str> = Some("Library/Fonts");
#[cfg(not(any(target_os = "linux", target_os = "macos")))]
const USER_FONT_DIR: Option<&str> = None;

/// Search roots in priority order: `$INVOICE_SYNTH_FONTS` entries, `./fonts`
/// next to the dataset, the user font directory, then system directories.
fn font_roots() -> Vec<PathBuf> {
    let from_env = std::env::var_os(FONT_DIRS_ENV)
        .map(|v| std::env::split_paths(&v).collect::<Vec<_>>())
        .unwrap_or_default();
    let user = USER_FONT_DIR.and_then(|rel| {
        std::env::var_os("HOME").map(|home| PathBuf::from(home).join(rel))
    });
    from_env
        .into_iter()
        .filter(|p| !p.as_os_str().is_empty())
        .chain(std::iter::once(PathBuf::from("fonts")))
        .chain(user)
        .chain(SYSTEM_FONT_DIRS.iter().map(PathBuf::from))
        .collect()
}

fn extension_lower(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

fn family_of(face: &Face) -> Option<String> {
    face.names()
        .into_iter()
        .filter(|n| n.name_id == ttf_parser::name_id::FAMILY && n.is_unicode())
        .find_map(|n| n.to_string())
}

/// Index every upright face found in `data`. Italics are never drawn.
fn index_faces(index: &mut FaceIndex, path: &Path, data: &[u8], collection: bool) {
    let count = if collection {
        ttf_parser::fonts_in_collection(data).unwrap_or(1)
    } else {
        1
    };
    for face_index in 0..count {
        let Ok(face) = Face::parse(data, face_index) else {
            continue;
        };
        if face.is_italic() {
            continue;
        }
        let Some(family) = family_of(&face) else {
            continue;
        };
        index
            .entry((family.to_lowercase(), face.is_bold()))
            .or_insert_with(|| (path.to_path_buf(), face_index));
    }
}

/// Walk the font roots once. Earlier roots win when a face appears twice.
fn build_face_index() -> FaceIndex {
    let started = std::time::Instant::now();
    let mut index = FaceIndex::new();
    let mut seen = std::collections::HashSet::new();
    let mut font_files = 0usize;

    let mut pending: std::collections::VecDeque<PathBuf> = font_roots().into();
    while let Some(dir) = pending.pop_front() {
        if !seen.insert(dir.clone()) {
            continue;
        }
        let Ok(listing) = std::fs::read_dir(&dir) else {
            continue;
        };
        for path in listing.flatten().map(|e| e.path()) {
            if path.is_dir() {
                pending.push_back(path);
                continue;
            }
            let ext = extension_lower(&path);
            if !matches!(ext.as_deref(), Some("ttf" | "otf" | "ttc")) {
                continue;
            }
            let Ok(file) = std::fs::File::open(&path) else {
                continue;
            };
            // SAFETY: font files are only read; a concurrent truncation would at
            // worst make parsing fail for that file.
            let Ok(map) = (unsafe { Mmap::map(&file) }) else {
                continue;
            };
            font_files += 1;
            index_faces(&mut index, &path, &map, ext.as_deref() == Some("ttc"));
        }
    }

    log::info!(
        "Font scan: {} dirs, {} files, {} upright faces in {:.1}ms",
        seen.len(),
        font_files,
        index.len(),
        started.elapsed().as_secs_f64() * 1000.0,
    );
    index
}

/// Font file for a family and weight. A missing bold face stays missing so
/// the caller can fake the weight.
fn find_font_file(family: &str, bold: bool) -> Option<(PathBuf, u32)> {
    FACES
        .get_or_init(build_face_index)
        .get(&(family.to_lowercase(), bold))
        .cloned()
}

/// Ink box of a laid-out string relative to its top-left anchor.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TextExtent {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

// Fallback face metrics, in em units.
const FALLBACK_ADVANCE: f32 = 0.6;
const FALLBACK_TOP: f32 = 0.1;
const FALLBACK_GLYPH_H: f32 = 0.7;

pub enum Typeface {
    Outline(Font<'static>),
    /// Fixed-metric face drawing "missing glyph" boxes. Used when no outline
    /// font can be found, and in tests for pixel-stable output.
    Fallback,
}

impl Typeface {
    pub fn from_file(path: &Path, face_index: u32) -> Result<Self, Error> {
        let data = std::fs::read(path).map_err(|e| {
            Error::MissingResource(format!("font {}: {e}", path.display()))
        })?;
        Font::try_from_vec_and_index(data, face_index)
            .map(Typeface::Outline)
            .ok_or_else(|| Error::MissingResource(format!("unparsable font {}", path.display())))
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Typeface::Fallback)
    }

    pub fn measure(&self, text: &str, px: f32) -> TextExtent {
        match self {
            Typeface::Outline(font) => {
                let scale = Scale::uniform(px);
                let ascent = font.v_metrics(scale).ascent;
                let mut bounds: Option<(i32, i32, i32, i32)> = None;
                for g in font.layout(text, scale, point(0.0, ascent)) {
                    let Some(bb) = g.pixel_bounding_box() else {
                        continue;
                    };
                    bounds = Some(match bounds {
                        None => (bb.min.x, bb.min.y, bb.max.x, bb.max.y),
                        Some((x0, y0, x1, y1)) => {
                            (x0.min(bb.min.x), y0.min(bb.min.y), x1.max(bb.max.x), y1.max(bb.max.y))
                        }
                    });
                }
                bounds
                    .map(|(x0, y0, x1, y1)| TextExtent {
                        min_x: x0 as f64,
                        min_y: y0 as f64,
                        width: (x1 - x0) as f64,
                        height: (y1 - y0) as f64,
                    })
                    .unwrap_or_default()
            }
            Typeface::Fallback => {
                let glyphs = text.chars().count();
                if text.trim().is_empty() {
                    return TextExtent::default();
                }
                TextExtent {
                    min_x: 0.0,
                    min_y: (px * FALLBACK_TOP) as f64,
                    width: (glyphs as f32 * px * FALLBACK_ADVANCE) as f64,
                    height: (px * FALLBACK_GLYPH_H) as f64,
                }
            }
        }
    }

    /// Draw `text` with its top-left anchor (left edge, ascender line) at `(x, y)`.
    /// Pixels outside the surface are clipped.
    pub fn draw(&self, img: &mut RgbImage, x: f64, y: f64, text: &str, px: f32, color: Rgb<u8>) {
        match self {
            Typeface::Outline(font) => {
                let scale = Scale::uniform(px);
                let ascent = font.v_metrics(scale).ascent;
                let (w, h) = img.dimensions();
                for g in font.layout(text, scale, point(x as f32, y as f32 + ascent)) {
                    let Some(bb) = g.pixel_bounding_box() else {
                        continue;
                    };
                    g.draw(|gx, gy, coverage| {
                        let px_x = bb.min.x + gx as i32;
                        let px_y = bb.min.y + gy as i32;
                        if px_x < 0 || px_y < 0 || px_x as u32 >= w || px_y as u32 >= h {
                            return;
                        }
                        let dst = img.get_pixel_mut(px_x as u32, px_y as u32);
                        *dst = blend(*dst, color, coverage);
                    });
                }
            }
            Typeface::Fallback => {
                let advance = px * FALLBACK_ADVANCE;
                let inset = (advance * 0.15).max(1.0);
                let top = y as f32 + px * FALLBACK_TOP;
                let glyph_h = (px * FALLBACK_GLYPH_H).round().max(1.0) as u32;
                let glyph_w = (advance - 2.0 * inset).round().max(1.0) as u32;
                for (i, ch) in text.chars().enumerate() {
                    if ch.is_whitespace() {
                        continue;
                    }
                    let gx = x as f32 + i as f32 * advance + inset;
                    let rect = Rect::at(gx.round() as i32, top.round() as i32).of_size(glyph_w, glyph_h);
                    draw_hollow_rect_mut(img, rect, color);
                }
            }
        }
    }
}

fn blend(bg: Rgb<u8>, fg: Rgb<u8>, coverage: f32) -> Rgb<u8> {
    let a = coverage.clamp(0.0, 1.0);
    let mix = |b: u8, f: u8| (b as f32 * (1.0 - a) + f as f32 * a).round() as u8;
    Rgb([mix(bg[0], fg[0]), mix(bg[1], fg[1]), mix(bg[2], fg[2])])
}

/// Regular face plus an optional real bold face.
pub struct FontSet {
    pub regular: Typeface,
    pub bold: Option<Typeface>,
}

impl FontSet {
    pub fn fallback() -> Self {
        Self {
            regular: Typeface::Fallback,
            bold: None,
        }
    }

    /// Resolve fonts from the configuration: an explicit file wins, then the
    /// configured family from the font directories, then the fallback face.
    pub fn load(config: &SynthConfig) -> Self {
        let t0 = std::time::Instant::now();
        if let Some(path) = &config.font_path {
            match Typeface::from_file(path, 0) {
                Ok(regular) => {
                    return Self {
                        regular,
                        bold: None,
                    };
                }
                Err(e) => log::warn!("{e}, searching font directories instead"),
            }
        }

        let load = |bold: bool| {
            find_font_file(&config.font_family, bold)
                .and_then(|(path, idx)| match Typeface::from_file(&path, idx) {
                    Ok(face) => Some(face),
                    Err(e) => {
                        log::warn!("{e}");
                        None
                    }
                })
        };

        let fonts = match load(false) {
            Some(regular) => Self {
                regular,
                bold: load(true),
            },
            None => {
                log::warn!(
                    "Font not found: {}, text will be drawn with placeholder glyph boxes",
                    config.font_family
                );
                Self::fallback()
            }
        };
        log::debug!(
            "FontSet::load: {} bold={} → {:.1}ms",
            config.font_family,
            fonts.bold.is_some(),
            t0.elapsed().as_secs_f64() * 1000.0,
        );
        fonts
    }

    /// Face for the requested weight; the flag is set when bold has to be faked.
    pub fn face(&self, bold: bool) -> (&Typeface, bool) {
        match (&self.bold, bold) {
            (Some(b), true) => (b, false),
            (None, true) => (&self.regular, true),
            _ => (&self.regular, false),
        }
    }
}
