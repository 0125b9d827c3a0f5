//! Caption overlay: draws a wrapped, centered caption on a white panel in
//! the lower part of an image.
//!
//! Rendering twice onto the same image draws a second panel; callers own
//! that decision. File overlays are best-effort: [`CaptionOverlay::overlay_file`]
//! never returns an error, it reports an [`OverlayOutcome`].

mod builtin_font;
pub mod face;
pub mod layout;

use std::io::{BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};

use image::{DynamicImage, GenericImage, ImageFormat, ImageReader, Rgba};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
pub use face::{FALLBACK_FONT_SIZE, Face, FontSpec, LineMetrics, font_size_for_width, load_face};
pub use layout::{LaidOutLine, LineLayout, Rect, chars_per_line, wrap_caption};

pub const PANEL_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const TEXT_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);

#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("failed to read image {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("unrecognised image format: {}", .path.display())]
    UnknownFormat { path: PathBuf },
    #[error("failed to decode image {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("failed to encode image {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("failed to write image {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[must_use]
#[derive(Debug)]
pub enum OverlayOutcome {
    /// Caption had nothing to draw; the file was not touched.
    Skipped,
    Applied(LineLayout),
    /// The file was left as it was.
    Failed(OverlayError),
}

impl OverlayOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, OverlayOutcome::Applied(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, OverlayOutcome::Failed(_))
    }
}

#[derive(Debug, Clone, Default)]
pub struct CaptionOverlay {
    font: FontSpec,
}

impl CaptionOverlay {
    pub fn new(font_file: Option<PathBuf>, search_system_fonts: bool) -> Self {
        Self {
            font: FontSpec {
                file: font_file,
                search_system_fonts,
            },
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(Some(cfg.font_file.clone()), cfg.search_system_fonts)
    }

    /// Always renders with the built-in face.
    pub fn builtin_only() -> Self {
        Self::default()
    }

    pub fn face_for(&self, image_width: u32) -> Face {
        load_face(&self.font, image_width)
    }

    /// Draws `caption` onto `image` in place. `None` (image untouched) when
    /// the caption has nothing to draw.
    pub fn render(&self, image: &mut DynamicImage, caption: &str) -> Option<LineLayout> {
        if caption.trim().is_empty() {
            return None;
        }
        let face = self.face_for(image.width());
        render_with_face(image, caption, &face)
    }

    /// Loads `path`, draws the caption and writes it back in the same format.
    pub fn try_overlay_file(&self, path: &Path, caption: &str) -> Result<Option<LineLayout>, OverlayError> {
        if caption.trim().is_empty() {
            return Ok(None);
        }

        let bytes = std::fs::read(path).map_err(|source| OverlayError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|source| OverlayError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let format = reader.format().ok_or_else(|| OverlayError::UnknownFormat {
            path: path.to_path_buf(),
        })?;
        let mut image = reader.decode().map_err(|source| OverlayError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

        let Some(layout) = self.render(&mut image, caption) else {
            return Ok(None);
        };
        save_replacing(&image, path, format)?;
        debug!(
            "overlaid {} line(s) at {}px onto {}",
            layout.line_count(),
            layout.font_size,
            path.display()
        );
        Ok(Some(layout))
    }

    /// Best-effort file overlay; failures are logged and reported, never raised.
    pub fn overlay_file(&self, path: &Path, caption: &str) -> OverlayOutcome {
        match self.try_overlay_file(path, caption) {
            Ok(Some(layout)) => OverlayOutcome::Applied(layout),
            Ok(None) => OverlayOutcome::Skipped,
            Err(e) => {
                warn!("caption overlay skipped: {e}");
                OverlayOutcome::Failed(e)
            }
        }
    }
}

/// Lays out and draws `caption` with an explicit face.
pub fn render_with_face(image: &mut DynamicImage, caption: &str, face: &Face) -> Option<LineLayout> {
    let layout = LineLayout::compute(face, caption, image.width(), image.height())?;
    draw_layout(image, &layout, face);
    Some(layout)
}

/// Panel first, then glyphs on top of it.
pub fn draw_layout(image: &mut DynamicImage, layout: &LineLayout, face: &Face) {
    fill_rect(image, layout.panel, PANEL_COLOR);
    for line in &layout.lines {
        face.draw_line(image, &line.text, line.x, line.y, TEXT_COLOR);
    }
}

fn fill_rect(image: &mut DynamicImage, rect: Rect, color: Rgba<u8>) {
    let x0 = rect.x.max(0) as u32;
    let y0 = rect.y.max(0) as u32;
    let x1 = rect.right().clamp(0, image.width() as i32) as u32;
    let y1 = rect.bottom().clamp(0, image.height() as i32) as u32;
    for y in y0..y1 {
        for x in x0..x1 {
            image.put_pixel(x, y, color);
        }
    }
}

/// Encodes into a sibling temp file and renames it over `path`.
fn save_replacing(image: &DynamicImage, path: &Path, format: ImageFormat) -> Result<(), OverlayError> {
    let write_err = |source: std::io::Error| OverlayError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        image.write_to(&mut writer, format).map_err(|source| OverlayError::Encode {
            path: path.to_path_buf(),
            source,
        })?;
        writer.flush().map_err(write_err)?;
    }
    if let Ok(meta) = std::fs::metadata(path) {
        std::fs::set_permissions(tmp.path(), meta.permissions()).ok();
    }
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
