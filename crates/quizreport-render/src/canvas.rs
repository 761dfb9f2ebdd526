//! Direct-placement drawing surface over fixed-size pages.
//!
//! Coordinates are millimetres from the top-left corner of a page. Font sizes
//! are points, as in a print layout; [`PT_TO_MM`] converts between the two.

use thiserror::Error;

/// A4 portrait width in millimetres.
pub const PAGE_WIDTH: f64 = 210.0;
/// A4 portrait height in millimetres.
pub const PAGE_HEIGHT: f64 = 297.0;
pub const PAGE_MARGIN: f64 = 20.0;

pub const PT_TO_MM: f64 = 0.352_778;

/// A drawing primitive that could not be produced as requested.
#[derive(Debug, Error, PartialEq)]
pub enum RenderError {
    #[error("corner radius {radius} does not fit a {width}x{height} box")]
    InvalidRadius { radius: f64, width: f64, height: f64 },

    #[error("invalid color {0:?}")]
    InvalidColor(String),
}

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` (the leading `#` is optional, case-insensitive).
    pub fn from_hex(hex: &str) -> Result<Self, RenderError> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(RenderError::InvalidColor(hex.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|_| RenderError::InvalidColor(hex.to_string()))
        };
        Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Parse `hex`, falling back to `fallback` when it is not a color.
    pub fn from_hex_or(hex: &str, fallback: Color) -> Self {
        match Self::from_hex(hex) {
            Ok(color) => color,
            Err(e) => {
                if !hex.is_empty() {
                    tracing::debug!("{e}, using fallback");
                }
                fallback
            }
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// The report's fixed palette.
pub mod palette {
    use super::Color;

    pub const PRIMARY: Color = Color::rgb(0x25, 0x63, 0xeb);
    pub const SECONDARY: Color = Color::rgb(0x7c, 0x3a, 0xed);
    pub const SUCCESS: Color = Color::rgb(0x05, 0x96, 0x69);
    pub const WARNING: Color = Color::rgb(0xd9, 0x77, 0x06);
    pub const ERROR: Color = Color::rgb(0xdc, 0x26, 0x26);
    pub const GRAY_50: Color = Color::rgb(0xf9, 0xfa, 0xfb);
    pub const GRAY_200: Color = Color::rgb(0xe5, 0xe7, 0xeb);
    pub const GRAY_300: Color = Color::rgb(0xd1, 0xd5, 0xdb);
    pub const GRAY_500: Color = Color::rgb(0x6b, 0x72, 0x80);
    pub const GRAY_600: Color = Color::rgb(0x4b, 0x55, 0x63);
    pub const GRAY_700: Color = Color::rgb(0x37, 0x41, 0x51);
    pub const GRAY_900: Color = Color::rgb(0x11, 0x18, 0x27);
    pub const INDIGO_100: Color = Color::rgb(0xe0, 0xe7, 0xff);
}

/// Fill and stroke of a shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paint {
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_width: f64,
    pub opacity: f64,
}

impl Paint {
    pub fn fill(color: Color) -> Self {
        Self {
            fill: Some(color),
            stroke: None,
            stroke_width: 0.0,
            opacity: 1.0,
        }
    }

    pub fn stroke(color: Color, width: f64) -> Self {
        Self {
            fill: None,
            stroke: Some(color),
            stroke_width: width,
            opacity: 1.0,
        }
    }

    pub fn fill_stroke(fill: Color, stroke: Color, width: f64) -> Self {
        Self {
            fill: Some(fill),
            stroke: Some(stroke),
            stroke_width: width,
            opacity: 1.0,
        }
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weight {
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Font {
    /// Size in points.
    pub size: f64,
    pub weight: Weight,
    pub color: Color,
}

impl Font {
    pub fn normal(size: f64, color: Color) -> Self {
        Self {
            size,
            weight: Weight::Normal,
            color,
        }
    }

    pub fn bold(size: f64, color: Color) -> Self {
        Self {
            size,
            weight: Weight::Bold,
            color,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Rect {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        radius: f64,
        paint: Paint,
    },
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
        paint: Paint,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        color: Color,
        width: f64,
    },
    /// Clockwise arc starting at 12 o'clock, `sweep` in radians.
    Arc {
        cx: f64,
        cy: f64,
        r: f64,
        sweep: f64,
        color: Color,
        width: f64,
    },
    /// Text with its baseline at `y`.
    Text {
        x: f64,
        y: f64,
        text: String,
        font: Font,
        anchor: Anchor,
    },
    /// An embedded raster image given as a data URI.
    Image {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        href: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

/// Approximate advance of one character in ems, Helvetica-like metrics.
fn char_advance(c: char) -> f64 {
    match c {
        'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '\'' | '!' | '|' => 0.28,
        ' ' | 'f' | 't' | 'r' | 'I' | '(' | ')' | '[' | ']' | '-' => 0.33,
        'm' | 'w' | 'M' | 'W' | '@' => 0.83,
        c if c.is_ascii_uppercase() => 0.67,
        c if c.is_ascii() => 0.54,
        // Glyphs outside ASCII are mostly pictographs.
        _ => 1.0,
    }
}

/// Width of `text` in millimetres at `size` points.
pub fn text_width(text: &str, size: f64) -> f64 {
    text.chars().map(char_advance).sum::<f64>() * size * PT_TO_MM
}

/// Greedy word-wrap of `text` into lines no wider than `max_width` mm.
///
/// A single word wider than the limit gets a line of its own.
pub fn wrap_text(text: &str, size: f64, max_width: f64) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{current} {word}");
        if text_width(&candidate, size) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Cut `text` to `max` characters, marking the cut with "...".
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

/// A growing list of pages with a vertical cursor on the last one.
#[derive(Debug)]
pub struct Canvas {
    pages: Vec<Page>,
    pub width: f64,
    pub height: f64,
    pub margin: f64,
    /// Vertical position on the current page.
    pub cursor_y: f64,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas {
    /// One empty A4 page with the cursor at the top margin.
    pub fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            width: PAGE_WIDTH,
            height: PAGE_HEIGHT,
            margin: PAGE_MARGIN,
            cursor_y: PAGE_MARGIN,
        }
    }

    /// Width between the side margins.
    pub fn content_width(&self) -> f64 {
        self.width - 2.0 * self.margin
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn into_pages(self) -> Vec<Page> {
        self.pages
    }

    pub fn add_page(&mut self) {
        self.pages.push(Page::default());
        self.cursor_y = self.margin;
    }

    /// Start a new page when `required` mm do not fit above the bottom
    /// margin. Returns whether a break happened.
    pub fn ensure_page_space(&mut self, required: f64) -> bool {
        if self.cursor_y + required > self.height - self.margin {
            self.add_page();
            true
        } else {
            false
        }
    }

    /// Draw on the current page.
    pub fn push(&mut self, op: DrawOp) {
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    /// Draw on page `index` (0-based). Out-of-range indices are ignored.
    pub fn push_to(&mut self, index: usize, op: DrawOp) {
        if let Some(page) = self.pages.get_mut(index) {
            page.ops.push(op);
        }
    }

    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, paint: Paint) {
        self.push(DrawOp::Rect {
            x,
            y,
            w,
            h,
            radius: 0.0,
            paint,
        });
    }

    /// A rectangle with rounded corners, or a plain one when `radius` does
    /// not fit the box.
    pub fn rounded_rect(&mut self, x: f64, y: f64, w: f64, h: f64, radius: f64, paint: Paint) {
        match rounded(x, y, w, h, radius, paint) {
            Ok(op) => self.push(op),
            Err(e) => {
                tracing::warn!("{e}; drawing a plain rectangle");
                self.rect(x, y, w, h, paint);
            }
        }
    }

    pub fn circle(&mut self, cx: f64, cy: f64, r: f64, paint: Paint) {
        self.push(DrawOp::Circle { cx, cy, r, paint });
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, color: Color, width: f64) {
        self.push(DrawOp::Line {
            x1,
            y1,
            x2,
            y2,
            color,
            width,
        });
    }

    pub fn arc(&mut self, cx: f64, cy: f64, r: f64, sweep: f64, color: Color, width: f64) {
        self.push(DrawOp::Arc {
            cx,
            cy,
            r,
            sweep,
            color,
            width,
        });
    }

    pub fn text(&mut self, x: f64, y: f64, text: impl Into<String>, font: Font) {
        self.text_anchored(x, y, text, font, Anchor::Start);
    }

    pub fn text_anchored(
        &mut self,
        x: f64,
        y: f64,
        text: impl Into<String>,
        font: Font,
        anchor: Anchor,
    ) {
        let text = text.into();
        if text.is_empty() {
            return;
        }
        self.push(DrawOp::Text {
            x,
            y,
            text,
            font,
            anchor,
        });
    }

    /// Text centered horizontally on `cx`.
    pub fn text_centered(&mut self, cx: f64, y: f64, text: impl Into<String>, font: Font) {
        self.text_anchored(cx, y, text, font, Anchor::Middle);
    }

    pub fn image(&mut self, x: f64, y: f64, w: f64, h: f64, href: impl Into<String>) {
        self.push(DrawOp::Image {
            x,
            y,
            w,
            h,
            href: href.into(),
        });
    }
}

fn rounded(x: f64, y: f64, w: f64, h: f64, radius: f64, paint: Paint) -> Result<DrawOp, RenderError> {
    if !radius.is_finite() || radius < 0.0 || 2.0 * radius > w || 2.0 * radius > h {
        return Err(RenderError::InvalidRadius {
            radius,
            width: w,
            height: h,
        });
    }
    Ok(DrawOp::Rect {
        x,
        y,
        w,
        h,
        radius,
        paint,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors() {
        assert_eq!(Color::from_hex("#2563eb").unwrap(), palette::PRIMARY);
        assert_eq!(Color::from_hex("2563EB").unwrap(), palette::PRIMARY);
        assert!(Color::from_hex("#fff").is_err());
        assert!(Color::from_hex("#zzzzzz").is_err());
        assert_eq!(Color::from_hex_or("nope", Color::WHITE), Color::WHITE);
        assert_eq!(palette::SUCCESS.to_hex(), "#059669");
    }

    #[test]
    fn page_break_resets_cursor() {
        let mut canvas = Canvas::new();
        canvas.cursor_y = 200.0;
        assert!(!canvas.ensure_page_space(77.0));
        assert_eq!(canvas.page_count(), 1);

        assert!(canvas.ensure_page_space(80.0));
        assert_eq!(canvas.page_count(), 2);
        assert_eq!(canvas.cursor_y, PAGE_MARGIN);
    }

    #[test]
    fn oversized_radius_degrades_to_rect() {
        let mut canvas = Canvas::new();
        canvas.rounded_rect(20.0, 20.0, 4.0, 70.0, 4.0, Paint::fill(Color::BLACK));
        canvas.rounded_rect(20.0, 20.0, 170.0, 70.0, 4.0, Paint::fill(Color::BLACK));
        let radii: Vec<f64> = canvas.pages()[0]
            .ops
            .iter()
            .map(|op| match op {
                DrawOp::Rect { radius, .. } => *radius,
                other => panic!("unexpected op {other:?}"),
            })
            .collect();
        assert_eq!(radii, [0.0, 4.0]);
    }

    #[test]
    fn wrapping_is_greedy() {
        let text = "one two three four five six seven eight nine ten";
        let width = text_width("one two three", 11.0) + 0.01;
        let lines = wrap_text(text, 11.0, width);
        assert_eq!(lines[0], "one two three");
        assert!(lines.iter().all(|l| text_width(l, 11.0) <= width || !l.contains(' ')));
        assert_eq!(lines.join(" "), text);

        assert_eq!(wrap_text("Supercalifragilistic", 11.0, 5.0), ["Supercalifragilistic"]);
        assert!(wrap_text("   ", 11.0, 50.0).is_empty());
    }

    #[test]
    fn truncation_marks_cut() {
        assert_eq!(truncate("Stress", 12), "Stress");
        assert_eq!(truncate("Time Management Skills", 12), "Time Managem...");
    }
}
