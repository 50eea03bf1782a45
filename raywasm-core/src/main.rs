use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use raywasm_core::{HeadlessDisplay, HostConfig, PacedDisplay, Runner};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "raywasm",
    about = "Run a raylib game compiled to WASM (or WAT) and optionally save its last frame."
)]
struct Args {
    /// Guest module (.wasm or .wat)
    wasm: PathBuf,

    /// Name of the drawing target the game renders into
    #[arg(long, default_value = "canvas")]
    target: String,

    /// Viewport width, used when the game asks for a 0-sized window
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Viewport height, used when the game asks for a 0-sized window
    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Stop after this many frames (runs until the game closes its window otherwise)
    #[arg(long, value_name = "N")]
    frames: Option<usize>,

    /// Pace frames against the wall clock instead of stepping as fast as possible
    #[arg(long, action = clap::ArgAction::SetTrue)]
    paced: bool,

    /// Write the final frame to this PNG
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,

    /// Directory guest asset paths resolve against (overrides RAYWASM_ASSET_ROOT)
    #[arg(long, value_name = "DIR")]
    asset_root: Option<PathBuf>,

    /// TTF/OTF used for the default font (overrides RAYWASM_DEFAULT_FONT)
    #[arg(long, value_name = "PATH")]
    font: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = HostConfig::from_env().context("invalid environment")?;
    if let Some(root) = args.asset_root {
        config.asset_root = root;
    }
    if let Some(font) = args.font {
        config.default_font = Some(font);
    }

    let mut runner = if args.paced {
        let refresh_hz = config.refresh_hz;
        Runner::new(
            config,
            PacedDisplay::new(&args.target, args.width, args.height, refresh_hz),
        )?
    } else {
        let interval = config.frame_interval_ms();
        Runner::new(
            config,
            HeadlessDisplay::new(&args.target, args.width, args.height).with_interval_ms(interval),
        )?
    };

    runner
        .start(&args.wasm, &args.target)
        .with_context(|| format!("failed to start {}", args.wasm.display()))?;

    match args.frames {
        Some(frames) => {
            let rendered = runner.run_frames(frames)?;
            info!(rendered, "frame limit reached");
        }
        None => runner.run()?,
    }

    if let Some(out) = args.out {
        let image = runner.snapshot().context(
            "no frame to save: the session has ended or draws through a recording surface",
        )?;
        raywasm_core::assets::write_png(&image, &out)?;
        info!(path = %out.display(), width = image.width, height = image.height, "frame saved");
    }

    Ok(())
}
