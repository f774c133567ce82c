//! Text blocks and shape captions.

use super::ShapeBehavior;
use kurbo::{BezPath, Point, Rect, Shape as KurboShape, Size};
use serde::{Deserialize, Serialize};

/// Horizontal alignment of caption lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// Font weight options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    Light,
    #[default]
    Regular,
    Heavy,
}

impl FontWeight {
    /// Average glyph advance as a fraction of the font size.
    fn char_width_factor(self) -> f64 {
        match self {
            FontWeight::Light => 0.50,
            FontWeight::Regular => 0.55,
            FontWeight::Heavy => 0.60,
        }
    }
}

/// Text attached to a shape (or the whole content of a text block).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Caption {
    pub text: String,
    #[serde(default)]
    pub align: TextAlign,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default)]
    pub font_weight: FontWeight,
}

fn default_font_size() -> f64 {
    Caption::DEFAULT_FONT_SIZE
}

impl Default for Caption {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl Caption {
    pub const DEFAULT_FONT_SIZE: f64 = 20.0;
    pub const LINE_HEIGHT: f64 = 1.2;

    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            align: TextAlign::default(),
            font_size: Self::DEFAULT_FONT_SIZE,
            font_weight: FontWeight::default(),
        }
    }

    pub fn with_align(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }

    pub fn with_font_size(mut self, font_size: f64) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn line_height(&self) -> f64 {
        self.font_size * Self::LINE_HEIGHT
    }

    pub fn char_width(&self) -> f64 {
        self.font_size * self.font_weight.char_width_factor()
    }

    /// Wrap the text into lines no wider than `max_width`.
    ///
    /// Explicit newlines always break. Words longer than a line are split by
    /// character. An empty caption still produces one empty line so the caret
    /// has somewhere to sit.
    pub fn layout(&self, max_width: f64) -> TextLayout {
        let char_width = self.char_width().max(f64::EPSILON);
        let max_chars = ((max_width / char_width).floor() as usize).max(1);

        let mut lines = Vec::new();
        for paragraph in self.text.split('\n') {
            wrap_paragraph(paragraph, max_chars, &mut lines);
        }

        let widest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        TextLayout {
            size: Size::new(
                widest as f64 * char_width,
                lines.len() as f64 * self.line_height(),
            ),
            lines,
            font_size: self.font_size,
            line_height: self.line_height(),
            align: self.align,
            weight: self.font_weight,
        }
    }
}

fn wrap_paragraph(paragraph: &str, max_chars: usize, out: &mut Vec<String>) {
    let mut line = String::new();
    let mut line_len = 0usize;
    for word in paragraph.split(' ') {
        let word_len = word.chars().count();
        let needed = if line_len == 0 { word_len } else { line_len + 1 + word_len };
        if needed <= max_chars {
            if line_len > 0 {
                line.push(' ');
            }
            line.push_str(word);
            line_len = needed;
            continue;
        }
        if line_len > 0 {
            out.push(std::mem::take(&mut line));
            line_len = 0;
        }
        let mut chars = word.chars().peekable();
        while chars.peek().is_some() {
            let chunk: String = chars.by_ref().take(max_chars).collect();
            line_len = chunk.chars().count();
            line = chunk;
            if line_len == max_chars && chars.peek().is_some() {
                out.push(std::mem::take(&mut line));
                line_len = 0;
            }
        }
    }
    out.push(line);
}

/// Result of laying out a caption.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub lines: Vec<String>,
    pub size: Size,
    pub font_size: f64,
    pub line_height: f64,
    pub align: TextAlign,
    pub weight: FontWeight,
}

impl TextLayout {
    /// Baseline origin of each line inside a box of `width` centered on the origin.
    pub fn line_origins(&self, width: f64) -> Vec<Point> {
        let top = -self.size.height / 2.0;
        let char_width = self.font_size * self.weight.char_width_factor();
        self.lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                let line_width = line.chars().count() as f64 * char_width;
                let x = match self.align {
                    TextAlign::Left => -width / 2.0,
                    TextAlign::Center => -line_width / 2.0,
                    TextAlign::Right => width / 2.0 - line_width,
                };
                Point::new(x, top + i as f64 * self.line_height + self.font_size)
            })
            .collect()
    }
}

/// A free-standing block of text. Its content lives in the shape caption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBlock {
    /// Inner padding between the frame and the text.
    #[serde(default = "default_padding")]
    pub padding: f64,
}

fn default_padding() -> f64 {
    TextBlock::DEFAULT_PADDING
}

impl Default for TextBlock {
    fn default() -> Self {
        Self {
            padding: Self::DEFAULT_PADDING,
        }
    }
}

impl TextBlock {
    pub const DEFAULT_PADDING: f64 = 4.0;
    pub const DEFAULT_WIDTH: f64 = 200.0;

    /// Frame height needed to show `caption` at `width`.
    pub fn fit_height(&self, caption: &Caption, width: f64) -> f64 {
        let layout = caption.layout((width - 2.0 * self.padding).max(1.0));
        layout.size.height + 2.0 * self.padding
    }
}

impl ShapeBehavior for TextBlock {
    fn min_size(&self) -> Size {
        Size::new(20.0, 20.0)
    }

    fn local_path(&self, size: Size) -> BezPath {
        Rect::from_center_size(Point::ZERO, size).to_path(0.1)
    }

    fn supports_flip(&self) -> bool {
        true
    }
}
