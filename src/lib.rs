//! LCD status panel renderer
//!
//! Turns declarative layout documents (an ordered list of widgets plus a bag of
//! named values) into PNG frames for small fixed-size displays, and serves them
//! over a length-prefixed request/response stream.
//!
//! # Features
//!
//! - **Two widgets**: text labels (centering, inverted plates, implicit sizing)
//!   and progress bars
//! - **Persistent protocol**: one process renders many frames over stdin/stdout
//! - **Panel output**: rendered frames can be packed into the page layout of a
//!   monochrome LCD controller
//!
//! # Example
//!
//! ```no_run
//! use lcd_renderer::{Renderer, RendererConfig, Viewport};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RendererConfig {
//!     viewport: Viewport { width: 256, height: 64 },
//!     font_path: "fonts/metawatch_8pt.ttf".into(),
//!     ..Default::default()
//! };
//!
//! let mut renderer = Renderer::new(config)?;
//! let image = renderer.render_payload(
//!     br#"{"layout":[{"type":"progressbar","origin":[60,0],"size":[67,8],"value":"cpu"}],
//!          "values":{"cpu":0.5}}"#,
//! )?;
//! println!("{} bytes, sha256 {}", image.png_data.len(), image.digest());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

pub mod error;
pub use error::{Error, Result};

pub mod font;
pub mod mono;
pub mod protocol;
pub mod rendering;

pub use protocol::{FrameReader, FrameWriter, Session, SessionSummary};
pub use rendering::layout::{LayoutDocument, Value, WidgetSpec};
pub use rendering::{RenderedImage, Renderer};

/// Largest request payload accepted by default (16 MiB).
pub const DEFAULT_MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Configuration for a renderer and the session driving it
///
/// The defaults describe the reference panel: a 256x64 display with an 8px
/// bitmap-style font loaded once per process.
///
/// # Examples
///
/// ```
/// let cfg = lcd_renderer::RendererConfig::default();
/// assert_eq!(cfg.viewport.width, 256);
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Canvas dimensions
    pub viewport: Viewport,
    /// TrueType/OpenType font used by every text widget
    pub font_path: PathBuf,
    /// Em size in pixels
    pub font_size: f32,
    /// Requests with a longer length prefix are rejected as framing failures
    pub max_frame_len: usize,
    /// Re-read the font file for every request instead of caching it
    pub reload_font: bool,
    /// What to do when a single request cannot be rendered
    pub failure_policy: FailurePolicy,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            font_path: PathBuf::from("./metawatch_8pt.ttf"),
            font_size: 8.0,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            reload_font: false,
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl RendererConfig {
    /// Reject configurations no render could succeed with.
    pub fn validate(&self) -> Result<()> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(Error::ConfigError(format!(
                "viewport must be non-empty, got {}x{}",
                self.viewport.width, self.viewport.height
            )));
        }
        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            return Err(Error::ConfigError(format!(
                "font size must be a positive number, got {}",
                self.font_size
            )));
        }
        if self.max_frame_len == 0 {
            return Err(Error::ConfigError(
                "maximum frame length must be at least one byte".to_string(),
            ));
        }
        Ok(())
    }
}

/// Viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 256,
            height: 64,
        }
    }
}

/// Handling of requests that fail to decode or resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop the session with the error
    #[default]
    Terminate,
    /// Answer with a zero-length frame and keep serving
    EmptyFrame,
}
