//! CLI entry point for wgpu-mbt-gen.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use wgpu_mbt_gen::config::Config;

/// wgpu-mbt-gen — regenerate MoonBit FFI bindings from wgpu-native headers.
#[derive(Parser, Debug)]
#[command(name = "wgpu-mbt-gen", version, about)]
struct Cli {
    /// Path to the wgpu-mbt-gen.toml configuration file.
    #[arg(default_value = "wgpu-mbt-gen.toml")]
    config: PathBuf,

    /// Repo root that config paths are relative to.
    #[arg(short, long, default_value = ".")]
    root: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("wgpu_mbt_gen=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    wgpu_mbt_gen::run(&cli.root, &config)?;
    Ok(())
}
