// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! duckchat - client and local service for the DuckDuckGo AI chat endpoint
//!
//! Entry point for the duckchat CLI application.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use duckchat::cli::{Cli, Commands, ConfigCommands, HeadersCommands};
use duckchat::config::Settings;
use duckchat::error::Result;

#[path = "main/cli_commands.rs"]
mod cli_commands;

use cli_commands::{
    load_settings, run_ask, run_config_init, run_config_show, run_headers_refresh,
    run_headers_show, run_models, run_serve,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(build_env_filter(&cli))
        .init();

    let config_path = cli.config.clone();
    let settings = || load_settings(config_path.as_deref());

    match cli.command {
        Commands::Serve(args) => run_serve(args, settings()?).await,
        Commands::Ask(args) => run_ask(args, settings()?).await,
        Commands::Headers(args) => match args.command {
            HeadersCommands::Refresh => run_headers_refresh(settings()?).await,
            HeadersCommands::Show => run_headers_show(settings()?, &cli.format),
        },
        Commands::Models => run_models(settings()?, &cli.format),
        Commands::Config(args) => match args.command {
            // Init rewrites the file as is, so it skips validation.
            ConfigCommands::Init => run_config_init(
                &config_path.clone().unwrap_or_else(Settings::default_path),
            ),
            ConfigCommands::Show => run_config_show(&settings()?),
        },
    }
}

/// `RUST_LOG` wins when set; otherwise `--log-level`, with `-v` turning on
/// debug output for this crate and the HTTP layer.
fn build_env_filter(cli: &Cli) -> EnvFilter {
    if std::env::var(EnvFilter::DEFAULT_ENV).is_ok() {
        return EnvFilter::from_default_env();
    }

    let level: tracing::Level = cli
        .log_level
        .as_str()
        .parse()
        .unwrap_or(tracing::Level::INFO);
    let mut env_filter = EnvFilter::default().add_directive(level.into());

    let directives: &[&str] = match cli.verbose {
        0 => &[],
        1 => &["duckchat=debug", "tower_http=debug"],
        _ => &["duckchat=trace", "tower_http=trace", "reqwest=debug"],
    };
    for directive in directives {
        if let Ok(parsed) = directive.parse() {
            env_filter = env_filter.add_directive(parsed);
        }
    }

    env_filter
}
