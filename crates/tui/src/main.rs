mod app;
mod logo;
mod view;

use anyhow::Result;
use clap::Parser;
use rand::{rngs::StdRng, SeedableRng};
use std::{
    fs::{self, OpenOptions},
    path::PathBuf,
};

use taleweaver_core::{
    config::{self, AppConfig},
    AssetLayout, CardAssets, ImagePool,
};
use tracing::{info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Three random storytelling cards in the terminal.
#[derive(Debug, Parser)]
#[command(name = "taleweaver", version)]
struct Cli {
    /// Configuration file to use instead of the default location.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory with `front/` card images and the static artwork.
    #[arg(long)]
    assets: Option<PathBuf>,
    /// Seed for reproducible deals.
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging()?;

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => {
            config::ensure_default_config()?;
            AppConfig::load()?
        }
    };
    if cli.assets.is_some() {
        config.asset_root = cli.assets;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    let asset_root = config.asset_root.as_deref();
    if let Some(root) = asset_root {
        for path in AssetLayout::new(root).missing_static() {
            warn!(path = %path.display(), "Static asset missing");
        }
    }
    let pool = ImagePool::discover_or_standard(asset_root);
    let assets = CardAssets::for_root(asset_root);
    let rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    info!(
        pool = pool.len(),
        assets = ?config.asset_root,
        seed = ?config.seed,
        "Starting TaleWeaver"
    );

    let mut app = app::TaleWeaverApp::new(pool, assets, rng, config.timings);
    app.run().await
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("taleweaver.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // The terminal is in the alternate screen, so logs only go to the file.
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(std::sync::Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
