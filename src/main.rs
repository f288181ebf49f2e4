use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;

use lumen::app::{run_headless, LumenApp};
use lumen::config::LightingConfig;
use lumen::engine::window::GameWindow;

#[derive(Parser)]
#[command(name = "lumen", about = "Dynamic lights and shadow maps demo")]
struct Args {
    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Overrides the configured shadow map edge length
    #[arg(long)]
    shadow_resolution: Option<u32>,

    /// Lighting config (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run the lighting pipeline without a window or GL context
    #[arg(long)]
    headless: bool,

    /// Frames to simulate; windowed runs stop early when given
    #[arg(long)]
    frames: Option<u64>,

    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "debug" } else { "info" }),
    )
    .init();

    let mut config = match &args.config {
        Some(path) => LightingConfig::from_json_file(path)
            .with_context(|| format!("failed to load lighting config {}", path.display()))?,
        None => LightingConfig::default(),
    };
    if let Some(resolution) = args.shadow_resolution {
        config.shadow_resolution = resolution;
    }
    config.validate().context("invalid lighting config")?;

    if args.headless {
        let report = run_headless(config, args.frames.unwrap_or(600))?;
        log::info!("{report:?}");
        return Ok(());
    }

    let sdl = sdl2::init().map_err(|e| anyhow!(e)).context("failed to init SDL2")?;
    let window = GameWindow::new(&sdl, "Lumen", args.width, args.height)?;
    let mut app = LumenApp::new(config)?;
    app.run(&sdl, &window, args.frames)
}
