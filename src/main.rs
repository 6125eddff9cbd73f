use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info};

use lcd_renderer::mono::PanelBitmap;
use lcd_renderer::rendering::raster::Canvas;
use lcd_renderer::DEFAULT_MAX_FRAME_LEN;
use lcd_renderer::{protocol, FailurePolicy, LayoutDocument, Renderer, RendererConfig, Viewport};

/// Render JSON layout documents into PNG frames for an LCD status panel
#[derive(Parser, Debug)]
#[command(name = "lcd-renderer", version, about)]
struct Cli {
    /// Font file used for every text widget
    #[arg(long, global = true, default_value = "./metawatch_8pt.ttf")]
    font: PathBuf,

    /// Font em size in pixels
    #[arg(long, global = true, default_value_t = 8.0)]
    font_size: f32,

    /// Canvas width in pixels
    #[arg(long, global = true, default_value_t = 256)]
    width: u32,

    /// Canvas height in pixels
    #[arg(long, global = true, default_value_t = 64)]
    height: u32,

    /// Largest request payload accepted
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_FRAME_LEN)]
    max_frame_bytes: usize,

    /// Re-read the font file for every request
    #[arg(long, global = true)]
    reload_font: bool,

    /// What to do when a request cannot be rendered
    #[arg(long, global = true, value_enum, default_value_t = OnError::Terminate)]
    on_error: OnError,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve length-prefixed frames over stdin/stdout (default)
    Serve,
    /// Render one layout document from a file
    Render {
        /// Layout document (JSON)
        #[arg(short, long)]
        input: PathBuf,
        /// Where to write the PNG
        #[arg(short, long)]
        output: PathBuf,
        /// Also write the packed panel pages
        #[arg(long)]
        packed: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OnError {
    Terminate,
    EmptyFrame,
}

impl From<OnError> for FailurePolicy {
    fn from(value: OnError) -> Self {
        match value {
            OnError::Terminate => FailurePolicy::Terminate,
            OnError::EmptyFrame => FailurePolicy::EmptyFrame,
        }
    }
}

impl Cli {
    fn config(&self) -> RendererConfig {
        RendererConfig {
            viewport: Viewport {
                width: self.width,
                height: self.height,
            },
            font_path: self.font.clone(),
            font_size: self.font_size,
            max_frame_len: self.max_frame_bytes,
            reload_font: self.reload_font,
            failure_policy: self.on_error.into(),
        }
    }
}

fn serve(config: RendererConfig) -> Result<()> {
    info!(
        "serving {}x{} frames with {}",
        config.viewport.width,
        config.viewport.height,
        config.font_path.display()
    );
    let stdin = io::stdin();
    let stdout = io::stdout();
    protocol::serve(config, stdin.lock(), stdout.lock()).context("session failed")?;
    Ok(())
}

fn render_file(
    config: RendererConfig,
    input: PathBuf,
    output: PathBuf,
    packed: Option<PathBuf>,
) -> Result<()> {
    let json = fs::read(&input).with_context(|| format!("reading {}", input.display()))?;
    let doc = LayoutDocument::from_slice(&json)
        .with_context(|| format!("decoding {}", input.display()))?;

    let mut renderer = Renderer::new(config)?;
    let image = renderer.render(&doc)?;
    fs::write(&output, &image.png_data).with_context(|| format!("writing {}", output.display()))?;
    info!("wrote {} ({})", output.display(), image.digest());

    if let Some(path) = packed {
        let pixels = Canvas::decode_png(&image.png_data)?;
        let pages = PanelBitmap::from_rgba(&pixels).pack_pages()?;
        fs::write(&path, pages).with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.config();
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config),
        Command::Render {
            input,
            output,
            packed,
        } => render_file(config, input, output, packed),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        error!("{:#}", e);
        eprintln!("lcd-renderer failed: {:#}", e);
        std::process::exit(1);
    }
}
