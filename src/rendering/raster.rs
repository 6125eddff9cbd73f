//! Raster canvas: a fixed-size RGBA pixel buffer implementing `Surface`.
//!
//! Rectangles cover the pixels whose centers fall inside them. Glyphs are
//! drawn without anti-aliasing so the output stays strictly two-tone, which is
//! what a monochrome LCD panel can show.

use std::io::Cursor;

use image::{ImageFormat, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect as PixelRect;

use crate::rendering::paint::{Color, Point, Rect, Surface, TextStyle, PAPER};
use crate::{Result, Viewport};

/// Minimum glyph coverage for a pixel to be inked.
const COVERAGE_THRESHOLD: f32 = 0.5;

pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    /// Create a blank canvas filled with paper.
    pub fn new(viewport: Viewport) -> Self {
        Self {
            image: RgbaImage::from_pixel(viewport.width, viewport.height, PAPER),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Pixel at `(x, y)`, or `None` outside the canvas.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.image.get_pixel_checked(x, y).copied()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Serialize the buffer as PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let mut out = Cursor::new(Vec::new());
        self.image.write_to(&mut out, ImageFormat::Png)?;
        Ok(out.into_inner())
    }

    /// Decode PNG bytes back into an RGBA buffer.
    pub fn decode_png(bytes: &[u8]) -> Result<RgbaImage> {
        let image = image::load_from_memory_with_format(bytes, ImageFormat::Png)?;
        Ok(image.to_rgba8())
    }

    /// Clip a float rectangle to the integer pixel rectangle it covers.
    fn pixel_rect(&self, rect: Rect) -> Option<PixelRect> {
        if rect.is_empty() {
            return None;
        }
        let (x0, x1) = pixel_span(rect.x, rect.right(), self.width());
        let (y0, y1) = pixel_span(rect.y, rect.bottom(), self.height());
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        let (w, h) = ((x1 - x0) as u32, (y1 - y0) as u32);
        Some(PixelRect::at(x0 as i32, y0 as i32).of_size(w, h))
    }
}

/// Pixels `i` with `start <= i + 0.5 < end`, clamped to `0..limit`.
fn pixel_span(start: f32, end: f32, limit: u32) -> (i64, i64) {
    let clamp = |v: f32| ((v - 0.5).ceil() as i64).clamp(0, i64::from(limit));
    (clamp(start), clamp(end))
}

impl Surface for Canvas {
    fn fill_rect(&mut self, rect: Rect, color: Color) {
        if let Some(px) = self.pixel_rect(rect) {
            draw_filled_rect_mut(&mut self.image, px, color);
        }
    }

    fn draw_text(&mut self, style: &TextStyle, origin: Point, color: Color, text: &str) {
        let (width, height) = (i64::from(self.width()), i64::from(self.height()));
        let (glyphs, _) = style.font.layout(style.size, (origin.x, origin.y), text);

        for glyph in glyphs {
            let Some(outlined) = style.font.outline(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            let (left, top) = (bounds.min.x as i64, bounds.min.y as i64);
            let image = &mut self.image;
            outlined.draw(|gx, gy, coverage| {
                if coverage < COVERAGE_THRESHOLD {
                    return;
                }
                let x = left + i64::from(gx);
                let y = top + i64::from(gy);
                if (0..width).contains(&x) && (0..height).contains(&y) {
                    image.put_pixel(x as u32, y as u32, color);
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::test_support::fixture_font;
    use crate::rendering::paint::INK;

    fn canvas() -> Canvas {
        Canvas::new(Viewport::default())
    }

    fn ink_pixels(c: &Canvas) -> Vec<(u32, u32)> {
        c.image()
            .enumerate_pixels()
            .filter(|(_, _, p)| **p == INK)
            .map(|(x, y, _)| (x, y))
            .collect()
    }

    #[test]
    fn new_canvas_is_blank_paper() {
        let c = canvas();
        assert_eq!((c.width(), c.height()), (256, 64));
        assert!(c.image().pixels().all(|p| *p == PAPER));
        assert_eq!(c.pixel(256, 0), None);
    }

    #[test]
    fn integral_rect_covers_exact_pixels() {
        let mut c = canvas();
        c.fill_rect(Rect::new(10.0, 5.0, 3.0, 2.0), INK);
        let ink = ink_pixels(&c);
        assert_eq!(ink.len(), 6);
        assert!(ink.contains(&(10, 5)));
        assert!(ink.contains(&(12, 6)));
        assert!(!ink.contains(&(13, 5)));
    }

    #[test]
    fn fractional_edges_use_pixel_centers() {
        let mut c = canvas();
        // Centers 93.5..=125.5 lie inside [93.5, 126.0).
        c.fill_rect(Rect::new(93.5, 1.0, 32.5, 6.0), INK);
        assert_eq!(c.pixel(92, 3), Some(PAPER));
        assert_eq!(c.pixel(93, 3), Some(INK));
        assert_eq!(c.pixel(125, 3), Some(INK));
        assert_eq!(c.pixel(126, 3), Some(PAPER));
        assert_eq!(ink_pixels(&c).len(), 33 * 6);
    }

    #[test]
    fn degenerate_rects_paint_nothing() {
        let mut c = canvas();
        c.fill_rect(Rect::new(10.0, 10.0, 0.0, 5.0), INK);
        c.fill_rect(Rect::new(10.0, 10.0, -4.0, 5.0), INK);
        c.fill_rect(Rect::new(10.0, 10.0, 5.0, -1.0), INK);
        c.fill_rect(Rect::new(10.0, 10.0, 0.3, 5.0), INK);
        assert!(ink_pixels(&c).is_empty());
    }

    #[test]
    fn rects_are_clipped_to_the_canvas() {
        let mut c = canvas();
        c.fill_rect(Rect::new(-10.0, -10.0, 1000.0, 1000.0), INK);
        assert_eq!(ink_pixels(&c).len(), 256 * 64);
        let mut c = canvas();
        c.fill_rect(Rect::new(300.0, 0.0, 10.0, 10.0), INK);
        assert!(ink_pixels(&c).is_empty());
    }

    #[test]
    fn fills_overwrite_previous_content() {
        let mut c = canvas();
        c.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), INK);
        c.fill_rect(Rect::new(2.0, 2.0, 2.0, 2.0), PAPER);
        assert_eq!(c.pixel(1, 1), Some(INK));
        assert_eq!(c.pixel(2, 2), Some(PAPER));
    }

    #[test]
    fn text_ink_sits_above_the_baseline() {
        let style = TextStyle::new(fixture_font(), 12.0);
        let mut c = canvas();
        c.draw_text(&style, Point::new(4.0, 20.0), INK, "HELL");
        let ink = ink_pixels(&c);
        assert!(!ink.is_empty());
        let ext = style.font.measure(12.0, "HELL");
        for (x, y) in ink {
            assert!(y < 20, "capital letters do not descend: ({x}, {y})");
            assert!(x >= 4 && (x as f32) < 4.0 + ext.advance_width + 1.0);
        }
    }

    #[test]
    fn text_ink_stays_inside_measured_box() {
        let style = TextStyle::new(fixture_font(), 8.0);
        let mut c = canvas();
        c.draw_text(&style, Point::new(10.0, 30.0), INK, "CPU: 50%");
        let ext = style.font.measure(8.0, "CPU: 50%");
        let (left, top) = (10.0 + ext.x_bearing, 30.0 + ext.y_bearing);
        for (x, y) in ink_pixels(&c) {
            let (x, y) = (x as f32, y as f32);
            assert!(x >= left && x < left + ext.width, "x {x} outside {ext:?}");
            assert!(y >= top && y < top + ext.height, "y {y} outside {ext:?}");
        }
    }

    #[test]
    fn text_is_two_tone() {
        let style = TextStyle::new(fixture_font(), 8.0);
        let mut c = canvas();
        c.draw_text(&style, Point::new(0.0, 10.0), INK, "CPU: 50%");
        assert!(c.image().pixels().all(|p| *p == INK || *p == PAPER));
    }

    #[test]
    fn text_outside_the_canvas_is_clipped() {
        let style = TextStyle::new(fixture_font(), 12.0);
        let mut c = canvas();
        c.draw_text(&style, Point::new(250.0, 90.0), INK, "WWW");
        c.draw_text(&style, Point::new(-40.0, 10.0), INK, "W");
        assert!(ink_pixels(&c).is_empty());
    }

    #[test]
    fn png_round_trip_is_lossless() {
        let style = TextStyle::new(fixture_font(), 8.0);
        let mut c = canvas();
        c.fill_rect(Rect::new(60.0, 0.0, 67.0, 8.0), INK);
        c.draw_text(&style, Point::new(0.0, 20.0), INK, "MEM 12%");
        let png = c.encode_png().unwrap();
        assert_eq!(&png[0..8], b"\x89PNG\r\n\x1a\n");
        let decoded = Canvas::decode_png(&png).unwrap();
        assert_eq!(decoded, *c.image());
    }
}
