//! Rendering pipeline: layout document -> canvas -> PNG.

pub mod layout;
pub mod paint;
pub mod raster;
pub mod widgets;

use std::path::PathBuf;

use log::debug;
use sha2::{Digest, Sha256};

use crate::font::{FontHandle, FontLibrary};
use crate::rendering::layout::LayoutDocument;
use crate::rendering::paint::TextStyle;
use crate::rendering::raster::Canvas;
use crate::{RendererConfig, Result};

/// An encoded frame ready to be sent to the panel host.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub width: u32,
    pub height: u32,
    pub png_data: Vec<u8>,
}

impl RenderedImage {
    /// Hex SHA-256 of the PNG bytes; identical renders share a digest.
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(&self.png_data))
    }
}

enum FontSource {
    /// Resolved through the font library on every render (cached unless
    /// reloading is enabled)
    File(PathBuf),
    Memory(FontHandle),
}

/// Renders layout documents onto fresh canvases.
///
/// Nothing carries over between renders except the font.
pub struct Renderer {
    config: RendererConfig,
    fonts: FontLibrary,
    font: FontSource,
}

impl Renderer {
    /// Validate `config` and load its font. Fails if the font is unusable,
    /// so a session never starts without one.
    pub fn new(config: RendererConfig) -> Result<Self> {
        config.validate()?;
        let mut fonts = FontLibrary::new(config.reload_font);
        fonts.load_font(&config.font_path)?;
        let font = FontSource::File(config.font_path.clone());
        Ok(Self {
            config,
            fonts,
            font,
        })
    }

    /// Build a renderer around an already parsed font; `font_path` and
    /// `reload_font` are ignored.
    pub fn with_font(config: RendererConfig, font: FontHandle) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            fonts: FontLibrary::new(false),
            font: FontSource::Memory(font),
        })
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    fn text_style(&mut self) -> Result<TextStyle> {
        let font = match &self.font {
            FontSource::File(path) => self.fonts.load_font(path)?,
            FontSource::Memory(handle) => handle.clone(),
        };
        Ok(TextStyle::new(font, self.config.font_size))
    }

    /// Paint `doc` onto a blank canvas.
    pub fn render_canvas(&mut self, doc: &LayoutDocument) -> Result<Canvas> {
        let style = self.text_style()?;
        let mut canvas = Canvas::new(self.config.viewport);
        doc.render(&mut canvas, &style)?;
        Ok(canvas)
    }

    /// Paint `doc` and encode the result.
    pub fn render(&mut self, doc: &LayoutDocument) -> Result<RenderedImage> {
        let canvas = self.render_canvas(doc)?;
        let png_data = canvas.encode_png()?;
        let image = RenderedImage {
            width: canvas.width(),
            height: canvas.height(),
            png_data,
        };
        debug!(
            "rendered {} widgets into {} bytes ({})",
            doc.widgets.len(),
            image.png_data.len(),
            image.digest()
        );
        Ok(image)
    }

    /// Decode one request payload and render it.
    pub fn render_payload(&mut self, payload: &[u8]) -> Result<RenderedImage> {
        let doc = LayoutDocument::from_slice(payload)?;
        self.render(&doc)
    }
}
