//! CLI entry point for the symbol-coverage audit.
//!
//! Exit codes: 0 full coverage, 1 missing symbols, 2 input files missing.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use wgpu_mbt_gen::audit;
use wgpu_mbt_gen::config::Config;

/// wgpu-mbt-audit — check that every wgpu* symbol in the headers has a
/// MoonBit extern binding.
#[derive(Parser, Debug)]
#[command(name = "wgpu-mbt-audit", version, about)]
struct Cli {
    /// Path to the wgpu-mbt-gen.toml configuration file.
    #[arg(default_value = "wgpu-mbt-gen.toml")]
    config: PathBuf,

    /// Repo root that config paths are relative to.
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Also list bound symbols that no header mentions.
    #[arg(long)]
    show_extra: bool,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("wgpu_mbt_gen=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    let headers: Vec<PathBuf> = config
        .headers
        .exported
        .iter()
        .chain(config.headers.extras.iter())
        .map(|p| cli.root.join(p))
        .collect();
    let bindings = vec![cli.root.join(&config.output.bindings)];

    let absent = audit::missing_inputs(&headers, &bindings);
    if !absent.is_empty() {
        for p in &absent {
            eprintln!("missing file: {}", p.display());
        }
        return Ok(ExitCode::from(2));
    }

    let report = audit::audit(&headers, &bindings)?;
    let missing = report.missing();

    println!("header symbols: {}", report.header_symbols.len());
    println!("bound symbols:  {}", report.bound_symbols.len());
    println!("missing:        {}", missing.len());
    for s in &missing {
        println!("- {s}");
    }

    if cli.show_extra {
        let extra = report.extra();
        println!("extra:          {}", extra.len());
        for s in &extra {
            println!("+ {s}");
        }
    }

    Ok(if missing.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}
