//! Drawing vocabulary shared by widgets and rasterizers: geometry, colors,
//! the `Surface` trait and a recording `DisplayList`.

use image::Rgba;
use serde::Deserialize;

use crate::font::{FontHandle, TextExtents};

/// Opaque RGBA color, 0-255 per channel.
pub type Color = Rgba<u8>;

/// Widget ink: opaque black.
pub const INK: Color = Rgba([0, 0, 0, 255]);
/// Canvas background: opaque white.
pub const PAPER: Color = Rgba([255, 255, 255, 255]);

/// A position in pixels. Decoded from a two-element JSON array.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(from = "[f32; 2]")]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<[f32; 2]> for Point {
    fn from([x, y]: [f32; 2]) -> Self {
        Self { x, y }
    }
}

/// A size hint in pixels. Zero on an axis means "derive from content".
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(from = "[f32; 2]")]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl From<[f32; 2]> for Size {
    fn from([width, height]: [f32; 2]) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle. Width or height may be zero or negative, in which
/// case the rectangle covers nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Font and em size used for a text operation.
#[derive(Debug, Clone)]
pub struct TextStyle {
    pub font: FontHandle,
    pub size: f32,
}

impl TextStyle {
    pub fn new(font: FontHandle, size: f32) -> Self {
        Self { font, size }
    }
}

/// The primitive operations widget renderers draw with.
pub trait Surface {
    /// Paint `rect` with an opaque `color`, overwriting existing content.
    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Measure `text` as `draw_text` would lay it out.
    fn measure_text(&self, style: &TextStyle, text: &str) -> TextExtents {
        style.font.measure(style.size, text)
    }

    /// Draw `text` with its baseline starting at `origin`.
    fn draw_text(&mut self, style: &TextStyle, origin: Point, color: Color, text: &str);
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    FillRect {
        rect: Rect,
        color: Color,
    },
    Text {
        origin: Point,
        color: Color,
        size: f32,
        text: String,
    },
}

/// A `Surface` that records what was drawn instead of rasterizing it.
#[derive(Debug, Clone, Default)]
pub struct DisplayList {
    commands: Vec<PaintCommand>,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[PaintCommand] {
        &self.commands
    }
}

impl Surface for DisplayList {
    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(PaintCommand::FillRect { rect, color });
    }

    fn draw_text(&mut self, style: &TextStyle, origin: Point, color: Color, text: &str) {
        self.commands.push(PaintCommand::Text {
            origin,
            color,
            size: style.size,
            text: text.to_string(),
        });
    }
}
