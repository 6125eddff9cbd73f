//! Widget renderers: turn one widget descriptor plus its resolved value into
//! `Surface` calls. Geometry lives in pure helpers so it can be checked
//! without a font or a canvas.

use crate::font::TextExtents;
use crate::rendering::layout::{ProgressBarSpec, TextSpec};
use crate::rendering::paint::{Color, Point, Rect, Size, Surface, TextStyle, INK, PAPER};

/// Where a text widget paints, derived from its spec and the measured string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextPlacement {
    /// Effective box: the size hint, with zero axes taken from the extents
    pub size: Size,
    /// Dark plate behind the text when the widget is inverted
    pub plate: Option<Rect>,
    /// Baseline origin for the glyphs
    pub origin: Point,
    pub color: Color,
}

pub fn text_placement(spec: &TextSpec, extents: &TextExtents) -> TextPlacement {
    // Zero means "derive from content"; a larger hint reserves blank padding.
    let width = if spec.size.width != 0.0 {
        spec.size.width
    } else {
        extents.advance_width
    };
    let height = if spec.size.height != 0.0 {
        spec.size.height
    } else {
        extents.height
    };

    let top = spec.origin.y - height;
    let plate = if spec.invert {
        Some(Rect::new(spec.origin.x, top, width, height))
    } else {
        None
    };

    let (origin, color) = if spec.center {
        // Whole pixels only: sub-pixel offsets smear glyphs on a low-res panel.
        let x = (spec.origin.x + (width - extents.advance_width) / 2.0).trunc();
        let y = (spec.origin.y + (height - extents.height) / 2.0).trunc();
        (Point::new(x, y), PAPER)
    } else {
        (spec.origin, INK)
    };

    TextPlacement {
        size: Size::new(width, height),
        plate,
        origin,
        color,
    }
}

/// Paint a text widget showing `text`.
pub fn draw_text<S: Surface + ?Sized>(
    surface: &mut S,
    style: &TextStyle,
    spec: &TextSpec,
    text: &str,
) -> TextPlacement {
    let extents = surface.measure_text(style, text);
    let placement = text_placement(spec, &extents);
    if let Some(plate) = placement.plate {
        surface.fill_rect(plate, INK);
    }
    surface.draw_text(style, placement.origin, placement.color, text);
    placement
}

/// The white "remaining capacity" rectangle of a progress bar.
///
/// The track keeps a 1px border; the fill is right-aligned inside it and
/// shrinks as `progress` grows, so ink advances from the left. `progress` is
/// clamped to `[0, 1]`. Tracks two pixels wide or less produce an empty rect.
pub fn progress_fill(track: Rect, progress: f32) -> Rect {
    let progress = if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 1.0)
    };
    let remaining = 1.0 - progress;
    let inner_width = track.width - 2.0;
    let fill_width = inner_width * remaining;
    Rect::new(
        track.x + 1.0 + inner_width - fill_width,
        track.y + 1.0,
        fill_width,
        track.height - 2.0,
    )
}

/// Paint a progress bar at `progress`.
pub fn draw_progress_bar<S: Surface + ?Sized>(
    surface: &mut S,
    spec: &ProgressBarSpec,
    progress: f32,
) {
    let Point { x, y } = spec.origin;
    let track = Rect::new(x, y, spec.size.width, spec.size.height);
    surface.fill_rect(track, INK);
    surface.fill_rect(progress_fill(track, progress), PAPER);
}
