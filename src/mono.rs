//! One-bit panel bitmaps for monochrome LCD controllers.
//!
//! The panel is driven as a row of 64-column controller chips, each addressed
//! in 8-row pages where one byte is a vertical strip of eight pixels.

use image::RgbaImage;

use crate::{Error, Result};

/// Columns handled by one controller chip.
pub const CHIP_WIDTH: u32 = 64;
/// Rows packed into one page byte.
pub const PAGE_HEIGHT: u32 = 8;

/// Any pixel darker than full white lights the segment.
const LIT_LUMA_MAX: u8 = 254;

fn luma(r: u8, g: u8, b: u8) -> u8 {
    let y = 0.3 * f32::from(r) + 0.59 * f32::from(g) + 0.11 * f32::from(b);
    y.round().clamp(0.0, 255.0) as u8
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelBitmap {
    width: u32,
    height: u32,
    lit: Vec<bool>,
}

impl PanelBitmap {
    /// Threshold an RGBA frame into lit/unlit segments.
    pub fn from_rgba(image: &RgbaImage) -> Self {
        let lit = image
            .pixels()
            .map(|p| {
                let [r, g, b, _] = p.0;
                luma(r, g, b) <= LIT_LUMA_MAX
            })
            .collect();
        Self {
            width: image.width(),
            height: image.height(),
            lit,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether `(x, y)` is lit; out-of-range coordinates are dark.
    pub fn is_lit(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.lit[(y * self.width + x) as usize]
    }

    pub fn lit_count(&self) -> usize {
        self.lit.iter().filter(|&&l| l).count()
    }

    /// Pack into controller order: chip by chip, page by page, one byte per
    /// column with bit `b` holding row `page * 8 + b`.
    pub fn pack_pages(&self) -> Result<Vec<u8>> {
        if self.width % CHIP_WIDTH != 0 || self.height % PAGE_HEIGHT != 0 {
            return Err(Error::ConfigError(format!(
                "panel of {}x{} does not split into {}-column chips of {}-row pages",
                self.width, self.height, CHIP_WIDTH, PAGE_HEIGHT
            )));
        }

        let mut out = Vec::with_capacity((self.width * self.height / PAGE_HEIGHT) as usize);
        for chip in 0..self.width / CHIP_WIDTH {
            for page in 0..self.height / PAGE_HEIGHT {
                for column in 0..CHIP_WIDTH {
                    let x = chip * CHIP_WIDTH + column;
                    let byte = (0..PAGE_HEIGHT).fold(0u8, |acc, bit| {
                        if self.is_lit(x, page * PAGE_HEIGHT + bit) {
                            acc | (1 << bit)
                        } else {
                            acc
                        }
                    });
                    out.push(byte);
                }
            }
        }
        Ok(out)
    }
}
