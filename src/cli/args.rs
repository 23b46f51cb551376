// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! CLI argument definitions using Clap
//!
//! Defines all command-line arguments and subcommands for duckchat.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// duckchat - chat with the DuckDuckGo AI chat endpoint
#[derive(Parser, Debug)]
#[command(name = "duckchat")]
#[command(version, about = "Client and HTTP service for the DuckDuckGo AI chat endpoint")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Base log level (RUST_LOG takes precedence)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: LogLevel,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP service
    Serve(ServeArgs),

    /// Ask a single question
    Ask(AskArgs),

    /// Captured header management
    Headers(HeadersArgs),

    /// List available models
    Models,

    /// Settings file management
    Config(ConfigArgs),
}

/// Arguments for the serve subcommand
#[derive(clap::Args, Debug, Default)]
pub struct ServeArgs {
    /// Address to bind (overrides settings)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind (overrides settings)
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Arguments for the ask subcommand
#[derive(clap::Args, Debug)]
pub struct AskArgs {
    /// The question
    pub prompt: String,

    /// Model name or identifier
    #[arg(short, long)]
    pub model: Option<String>,

    /// Print the answer once complete instead of streaming it
    #[arg(long)]
    pub no_stream: bool,
}

/// Arguments for the headers subcommand
#[derive(clap::Args, Debug)]
pub struct HeadersArgs {
    #[command(subcommand)]
    pub command: HeadersCommands,
}

/// Headers subcommands
#[derive(Subcommand, Debug, PartialEq)]
pub enum HeadersCommands {
    /// Capture a new header set and store it
    Refresh,

    /// Show the stored header set
    Show,
}

/// Arguments for the config subcommand
#[derive(clap::Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

/// Config subcommands
#[derive(Subcommand, Debug, PartialEq)]
pub enum ConfigCommands {
    /// Write the settings file with every default filled in
    Init,

    /// Print the effective settings
    Show,
}

/// Base log level
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Output format for listings
#[derive(ValueEnum, Clone, Debug, Default, PartialEq)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Text,

    /// JSON output
    Json,
}
