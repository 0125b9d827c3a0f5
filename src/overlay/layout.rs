//! Caption layout: wrapping, block sizing and placement.
//!
//! The wrap width is a character-count estimate (`width / (size * 0.6)`),
//! not an exact glyph fit. With proportional fonts a line can come out a
//! little narrower or wider than the image allows.

use super::face::Face;

pub const FONT_SIZE_FRACTION: f32 = 0.05;
pub const GLYPH_WIDTH_FACTOR: f32 = 0.6;
pub const LINE_GAP: u32 = 10;
pub const PANEL_PADDING: u32 = 2;
pub const VERTICAL_ANCHOR: f32 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    pub fn center_x(&self) -> f32 {
        self.x as f32 + self.width as f32 / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y as f32 + self.height as f32 / 2.0
    }

    /// Grows the rect by `by` pixels on every side.
    pub fn inflate(&self, by: u32) -> Rect {
        Rect {
            x: self.x - by as i32,
            y: self.y - by as i32,
            width: self.width + 2 * by,
            height: self.height + 2 * by,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaidOutLine {
    pub text: String,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineLayout {
    pub font_size: f32,
    pub lines: Vec<LaidOutLine>,
    /// Bounding box of the text lines.
    pub block: Rect,
    /// Background panel: `block` plus [`PANEL_PADDING`] on each side.
    pub panel: Rect,
}

pub fn chars_per_line(image_width: u32, font_size: f32) -> usize {
    let estimate = image_width as f32 / (font_size * GLYPH_WIDTH_FACTOR);
    if estimate.is_finite() {
        (estimate as usize).max(1)
    } else {
        1
    }
}

/// Greedy word wrap on whitespace, counting chars. Words longer than
/// `max_chars` are split across lines.
pub fn wrap_caption(caption: &str, max_chars: usize) -> Vec<String> {
    let max = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in caption.split_whitespace() {
        let mut rest: Vec<char> = word.chars().collect();
        while !rest.is_empty() {
            let needed = if current_len == 0 {
                rest.len()
            } else {
                current_len + 1 + rest.len()
            };
            if needed <= max {
                if current_len > 0 {
                    current.push(' ');
                    current_len += 1;
                }
                current_len += rest.len();
                current.extend(rest.drain(..));
            } else if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            } else {
                lines.push(rest.drain(..max).collect());
            }
        }
    }

    if current_len > 0 {
        lines.push(current);
    }
    lines
}

impl LineLayout {
    /// Lays out `caption` for an image of the given size. `None` when the
    /// caption has no visible words.
    pub fn compute(face: &Face, caption: &str, image_width: u32, image_height: u32) -> Option<Self> {
        let texts = wrap_caption(caption, chars_per_line(image_width, face.size()));
        if texts.is_empty() {
            return None;
        }

        let metrics: Vec<_> = texts.iter().map(|t| face.measure(t)).collect();
        let gaps = LINE_GAP * (metrics.len() as u32 - 1);
        let block_height = metrics.iter().map(|m| m.height).sum::<u32>() + gaps;
        let block_width = metrics.iter().map(|m| m.width).max().unwrap_or(0);

        let top = (image_height as f32 * VERTICAL_ANCHOR) as i32 - (block_height / 2) as i32;
        let left = (image_width as i32 - block_width as i32) / 2;

        let mut y = top;
        let mut lines = Vec::with_capacity(texts.len());
        for (text, m) in texts.into_iter().zip(metrics) {
            lines.push(LaidOutLine {
                text,
                x: (image_width as i32 - m.width as i32) / 2,
                y,
                width: m.width,
                height: m.height,
            });
            y += (m.height + LINE_GAP) as i32;
        }

        let block = Rect {
            x: left,
            y: top,
            width: block_width,
            height: block_height,
        };

        Some(LineLayout {
            font_size: face.size(),
            lines,
            block,
            panel: block.inflate(PANEL_PADDING),
        })
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}
