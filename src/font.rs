//! Font provider: loads a TrueType/OpenType font and answers metric and
//! glyph-layout queries for the rasterizer.
//!
//! Sizes are em sizes in pixels, so a size of `8.0` lays text out the way a
//! typographic 8px font would (one em spans eight pixels).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ab_glyph::{point, Font, FontArc, Glyph, GlyphId, OutlinedGlyph, PxScale, ScaleFont};
use log::{debug, info};

use crate::{Error, Result};

/// Measured extents of a string, relative to the pen origin on the baseline.
///
/// The ink box is the union of the pixel boxes the glyphs rasterize into
/// with the pen at `(0, 0)`, so bearings, `width` and `height` are whole
/// pixels. `advance_width` is exact. `y` grows downwards, so glyphs above the
/// baseline have a negative `y_bearing`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextExtents {
    /// Horizontal offset from the pen origin to the left edge of the ink
    pub x_bearing: f32,
    /// Vertical offset from the baseline to the top edge of the ink
    pub y_bearing: f32,
    /// Width of the ink box
    pub width: f32,
    /// Height of the ink box
    pub height: f32,
    /// Distance the pen moves after drawing the string
    pub advance_width: f32,
}

/// A parsed font, shared read-only between renders.
#[derive(Clone)]
pub struct FontHandle {
    font: FontArc,
    source: Option<PathBuf>,
}

impl std::fmt::Debug for FontHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontHandle")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl FontHandle {
    /// Parse a font from raw file contents.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let font = FontArc::try_from_vec(data)
            .map_err(|e| Error::FontError(format!("Failed to parse font: {}", e)))?;
        Ok(Self { font, source: None })
    }

    /// Read and parse the font file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| {
            Error::FontError(format!("Failed to read font {}: {}", path.display(), e))
        })?;
        let mut handle = Self::from_bytes(data).map_err(|e| match e {
            Error::FontError(msg) => Error::FontError(format!("{} ({})", msg, path.display())),
            other => other,
        })?;
        handle.source = Some(path.to_path_buf());
        Ok(handle)
    }

    /// Path the font was loaded from, if it came from a file.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// `ab_glyph` scales by ascent-to-descent height; convert the em size.
    fn px_scale(&self, size: f32) -> PxScale {
        match self.font.units_per_em() {
            Some(units_per_em) if units_per_em > 0.0 => {
                PxScale::from(size * self.font.height_unscaled() / units_per_em)
            }
            _ => PxScale::from(size),
        }
    }

    /// Position the glyphs of `text` with the pen starting at `origin`
    /// (baseline). Returns the glyphs and the total advance.
    pub(crate) fn layout(&self, size: f32, origin: (f32, f32), text: &str) -> (Vec<Glyph>, f32) {
        let scale = self.px_scale(size);
        let scaled = self.font.as_scaled(scale);
        let mut glyphs = Vec::with_capacity(text.len());
        let mut pen_x = origin.0;
        let mut previous: Option<GlyphId> = None;

        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = previous {
                pen_x += scaled.kern(prev, id);
            }
            glyphs.push(id.with_scale_and_position(scale, point(pen_x, origin.1)));
            pen_x += scaled.h_advance(id);
            previous = Some(id);
        }

        (glyphs, pen_x - origin.0)
    }

    /// Outline a positioned glyph; `None` for glyphs without ink (spaces).
    pub(crate) fn outline(&self, glyph: Glyph) -> Option<OutlinedGlyph> {
        self.font.outline_glyph(glyph)
    }

    /// Measure `text` at `size` without drawing it.
    pub fn measure(&self, size: f32, text: &str) -> TextExtents {
        let (glyphs, advance_width) = self.layout(size, (0.0, 0.0), text);

        let mut ink: Option<(f32, f32, f32, f32)> = None;
        for glyph in glyphs {
            let Some(outlined) = self.outline(glyph) else {
                continue;
            };
            let b = outlined.px_bounds();
            ink = Some(match ink {
                None => (b.min.x, b.min.y, b.max.x, b.max.y),
                Some((x0, y0, x1, y1)) => (
                    x0.min(b.min.x),
                    y0.min(b.min.y),
                    x1.max(b.max.x),
                    y1.max(b.max.y),
                ),
            });
        }

        match ink {
            Some((x0, y0, x1, y1)) => TextExtents {
                x_bearing: x0,
                y_bearing: y0,
                width: x1 - x0,
                height: y1 - y0,
                advance_width,
            },
            None => TextExtents {
                advance_width,
                ..Default::default()
            },
        }
    }
}

/// Owns font acquisition for the process.
///
/// Parsed fonts are cached per path so the file is read once per session.
/// With `reload` set every request re-reads the file, which lets an operator
/// swap the font without restarting the renderer.
#[derive(Debug, Default)]
pub struct FontLibrary {
    reload: bool,
    cache: HashMap<PathBuf, FontHandle>,
}

impl FontLibrary {
    pub fn new(reload: bool) -> Self {
        Self {
            reload,
            cache: HashMap::new(),
        }
    }

    pub fn reloads(&self) -> bool {
        self.reload
    }

    /// Return a handle for the font at `path`, loading it if needed.
    pub fn load_font(&mut self, path: &Path) -> Result<FontHandle> {
        if !self.reload {
            if let Some(handle) = self.cache.get(path) {
                return Ok(handle.clone());
            }
        }

        let handle = FontHandle::load(path)?;
        if self.reload {
            debug!("reloaded font {}", path.display());
        } else {
            info!("loaded font {}", path.display());
        }
        self.cache.insert(path.to_path_buf(), handle.clone());
        Ok(handle)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::FontHandle;

    pub(crate) const FIXTURE_FONT: &[u8] =
        include_bytes!("../tests/fixtures/DejaVuSansMono.ttf");

    pub(crate) fn fixture_font() -> FontHandle {
        FontHandle::from_bytes(FIXTURE_FONT.to_vec()).expect("fixture font parses")
    }

    pub(crate) fn fixture_path() -> std::path::PathBuf {
        std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/DejaVuSansMono.ttf")
    }
}
