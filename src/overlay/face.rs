//! Glyph sources for caption rendering.
//! A scalable TrueType face via fontdue when a font file can be found,
//! otherwise the built-in 8x8 bitmap face at a fixed size.

use std::path::{Path, PathBuf};

use fontdue::{Font, FontSettings};
use image::{DynamicImage, GenericImage, GenericImageView, Rgba};
use tracing::debug;
use walkdir::WalkDir;

use super::builtin_font;
use super::layout::{FONT_SIZE_FRACTION, GLYPH_WIDTH_FACTOR};

/// Size used with the built-in face when no scalable font loads.
pub const FALLBACK_FONT_SIZE: f32 = 20.0;

/// Pixel extent of one rendered line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineMetrics {
    pub width: u32,
    pub height: u32,
}

pub enum Face {
    Scalable { font: Font, px: f32 },
    Builtin { px: f32 },
}

impl std::fmt::Debug for Face {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Face::Scalable { px, .. } => f.debug_struct("Scalable").field("px", px).finish(),
            Face::Builtin { px } => f.debug_struct("Builtin").field("px", px).finish(),
        }
    }
}

impl Face {
    pub fn builtin(px: f32) -> Self {
        Face::Builtin { px: px.max(1.0) }
    }

    pub fn scalable(font: Font, px: f32) -> Self {
        Face::Scalable { font, px: px.max(1.0) }
    }

    pub fn size(&self) -> f32 {
        match self {
            Face::Scalable { px, .. } | Face::Builtin { px } => *px,
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, Face::Builtin { .. })
    }

    /// Width is the summed advance; height is the inked extent of the line.
    pub fn measure(&self, line: &str) -> LineMetrics {
        match self {
            Face::Scalable { font, px } => {
                let width: f32 = line.chars().map(|ch| font.metrics(ch, *px).advance_width).sum();
                let height = ink_extent(font, *px, line)
                    .map(|(top, bottom)| (top - bottom).max(0) as u32)
                    .unwrap_or(0);
                LineMetrics {
                    width: width.round() as u32,
                    height,
                }
            }
            Face::Builtin { px } => {
                let count = line.chars().count() as u32;
                let (advance, cell) = builtin_cell(*px);
                LineMetrics {
                    width: count * advance,
                    height: if count == 0 { 0 } else { cell },
                }
            }
        }
    }

    /// Draws `line` with its inked top-left at (`x`, `y`).
    pub(crate) fn draw_line(&self, img: &mut DynamicImage, line: &str, x: i32, y: i32, color: Rgba<u8>) {
        match self {
            Face::Scalable { font, px } => {
                let Some((top, _)) = ink_extent(font, *px, line) else {
                    return;
                };
                let baseline = y + top;
                let mut cursor = x as f32;
                for ch in line.chars() {
                    let (metrics, bitmap) = font.rasterize(ch, *px);
                    let gx = cursor.round() as i32 + metrics.xmin;
                    let gy = baseline - (metrics.height as i32 + metrics.ymin);
                    for row in 0..metrics.height {
                        for col in 0..metrics.width {
                            let coverage = bitmap[row * metrics.width + col];
                            if coverage > 0 {
                                blend(img, gx + col as i32, gy + row as i32, color, coverage);
                            }
                        }
                    }
                    cursor += metrics.advance_width;
                }
            }
            Face::Builtin { px } => {
                let (advance, cell) = builtin_cell(*px);
                for (i, ch) in line.chars().enumerate() {
                    let rows = builtin_font::glyph(ch);
                    let ox = x + (i as u32 * advance) as i32;
                    for py in 0..cell {
                        let bits = rows[(py * 8 / cell) as usize];
                        for col in 0..advance {
                            if (bits >> (col * 8 / advance)) & 1 == 1 {
                                blend(img, ox + col as i32, y + py as i32, color, 255);
                            }
                        }
                    }
                }
            }
        }
    }
}

/// (advance, cell height) of the built-in face. The advance follows the
/// average glyph width factor so the wrap estimate fits exactly.
fn builtin_cell(px: f32) -> (u32, u32) {
    let advance = (px * GLYPH_WIDTH_FACTOR).floor().max(1.0) as u32;
    let cell = px.round().max(1.0) as u32;
    (advance, cell)
}

/// Highest glyph top and lowest glyph bottom relative to the baseline (y up).
fn ink_extent(font: &Font, px: f32, line: &str) -> Option<(i32, i32)> {
    let mut extent: Option<(i32, i32)> = None;
    for ch in line.chars() {
        let m = font.metrics(ch, px);
        if m.width == 0 || m.height == 0 {
            continue;
        }
        let top = m.height as i32 + m.ymin;
        let bottom = m.ymin;
        extent = Some(match extent {
            Some((t, b)) => (t.max(top), b.min(bottom)),
            None => (top, bottom),
        });
    }
    extent
}

/// Mixes `color` into the pixel at (`x`, `y`) by `coverage`; out of bounds is ignored.
pub(crate) fn blend(img: &mut DynamicImage, x: i32, y: i32, color: Rgba<u8>, coverage: u8) {
    if x < 0 || y < 0 || x as u32 >= img.width() || y as u32 >= img.height() {
        return;
    }
    let (x, y) = (x as u32, y as u32);
    let under = img.get_pixel(x, y).0;
    let a = coverage as u16;
    let mix = |c: u8, u: u8| ((c as u16 * a + u as u16 * (255 - a)) / 255) as u8;
    let out = Rgba([
        mix(color.0[0], under[0]),
        mix(color.0[1], under[1]),
        mix(color.0[2], under[2]),
        under[3].max(coverage),
    ]);
    img.put_pixel(x, y, out);
}

/// Where to look for the scalable font.
#[derive(Debug, Clone, Default)]
pub struct FontSpec {
    pub file: Option<PathBuf>,
    pub search_system_fonts: bool,
}

/// Caption font size for an image of this width.
pub fn font_size_for_width(image_width: u32) -> f32 {
    (image_width as f32 * FONT_SIZE_FRACTION).floor()
}

/// Resolves the face for one overlay call. Never fails: without a usable
/// scalable font the built-in face at [`FALLBACK_FONT_SIZE`] is returned.
pub fn load_face(spec: &FontSpec, image_width: u32) -> Face {
    if let Some(path) = spec
        .file
        .as_deref()
        .and_then(|file| resolve_font_path(file, spec.search_system_fonts))
    {
        match std::fs::read(&path) {
            Ok(data) => match Font::from_bytes(data, FontSettings::default()) {
                Ok(font) => return Face::scalable(font, font_size_for_width(image_width)),
                Err(e) => debug!("font {} unusable: {}", path.display(), e),
            },
            Err(e) => debug!("font {} unreadable: {}", path.display(), e),
        }
    }

    debug!("no scalable font available, using built-in face at {FALLBACK_FONT_SIZE}px");
    Face::builtin(FALLBACK_FONT_SIZE)
}

/// A font file that exists as given, or (for bare relative names) one with
/// the same file name under the system font directories.
pub fn resolve_font_path(file: &Path, search_system_fonts: bool) -> Option<PathBuf> {
    if file.is_file() {
        return Some(file.to_path_buf());
    }
    if !search_system_fonts || file.is_absolute() {
        return None;
    }

    let wanted = file.file_name()?.to_string_lossy().to_string();
    system_font_dirs()
        .into_iter()
        .filter(|dir| dir.is_dir())
        .find_map(|dir| {
            WalkDir::new(dir)
                .follow_links(true)
                .into_iter()
                .filter_map(Result::ok)
                .find(|entry| {
                    entry.file_type().is_file()
                        && entry.file_name().to_string_lossy().eq_ignore_ascii_case(&wanted)
                })
                .map(|entry| entry.into_path())
        })
}

fn system_font_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    #[cfg(target_os = "windows")]
    {
        let windir = std::env::var("WINDIR").unwrap_or_else(|_| "C:\\Windows".to_string());
        dirs.push(PathBuf::from(windir).join("Fonts"));
        if let Ok(local) = std::env::var("LOCALAPPDATA") {
            dirs.push(PathBuf::from(local).join("Microsoft\\Windows\\Fonts"));
        }
    }

    #[cfg(target_os = "macos")]
    {
        dirs.push(PathBuf::from("/System/Library/Fonts"));
        dirs.push(PathBuf::from("/Library/Fonts"));
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join("Library/Fonts"));
        }
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    {
        dirs.push(PathBuf::from("/usr/share/fonts"));
        dirs.push(PathBuf::from("/usr/local/share/fonts"));
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(&home).join(".fonts"));
            dirs.push(PathBuf::from(&home).join(".local/share/fonts"));
        }
    }

    dirs
}
