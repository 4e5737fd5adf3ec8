use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use lamplight::{Config, RunOptions, Scene};

#[derive(Parser)]
#[command(name = "lamplight", version, about = "Headless progressive path tracer")]
struct Cli {
    /// JSON 설정 파일. 없으면 기본값과 데모 장면
    config: Option<PathBuf>,

    /// 설정 파일의 장면 대신 쓸 JSON 장면
    #[arg(long)]
    scene: Option<PathBuf>,

    #[arg(long, default_value_t = 64)]
    frames: u32,

    #[arg(long, default_value = "lamplight.png")]
    out: PathBuf,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(path) = &cli.scene {
        config.scene = Scene::from_path(path)
            .with_context(|| format!("loading scene {}", path.display()))?;
    }
    if let Some(width) = cli.width {
        config.width = width;
    }
    if let Some(height) = cli.height {
        config.height = height;
    }

    lamplight::run(RunOptions {
        config,
        frames: cli.frames,
        output: cli.out,
    })?;

    Ok(())
}
