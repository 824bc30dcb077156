mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let settings = hark_core::Settings {
        engine: cli.engine.clone(),
        language: cli.language.clone(),
        ..hark_core::Settings::default()
    };

    match cli.command {
        Command::Listen { duration, device } => {
            commands::listen(&settings, duration, device, cli.output.as_deref())
        }
        Command::Continuous {
            phrase_limit,
            device,
        } => commands::continuous(&settings, phrase_limit, device, cli.output.as_deref()),
        Command::File { path } => commands::file(&settings, &path, cli.output.as_deref()),
        Command::Devices => commands::devices(),
        Command::Save {
            path,
            duration,
            device,
        } => commands::save(&settings, &path, duration, device),
    }
}
