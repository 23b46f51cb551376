// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use std::io::{self, Write};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::sync::Arc;

use futures::StreamExt;
use reqwest::Client;

use duckchat::auth::manager::load_store;
use duckchat::auth::{CommandHeaderSource, HeaderManager, HeaderRefresher};
use duckchat::chat::{ask_with_refresh, recovery_for, DuckChat, Recovery};
use duckchat::cli::{AskArgs, OutputFormat, ServeArgs};
use duckchat::config::Settings;
use duckchat::error::{DuckError, Result};
use duckchat::models::{self, ModelCatalog};
use duckchat::service::{self, AppState};

/// Load settings from `--config` or the default location and validate them.
pub(super) fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let settings = match path {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };
    settings.validate()?;
    Ok(settings)
}

fn header_source(settings: &Settings) -> Result<Arc<CommandHeaderSource>> {
    let source = CommandHeaderSource::from_command(&settings.headers.refresh_command)?
        .with_timeout(settings.refresh_timeout());
    Ok(Arc::new(source))
}

async fn header_manager(settings: &Settings) -> Result<Arc<HeaderManager>> {
    let manager =
        HeaderManager::load_or_refresh(header_source(settings)?, Some(settings.headers_store_path()))
            .await?;
    Ok(Arc::new(manager))
}

fn load_catalog(settings: &Settings) -> Result<ModelCatalog> {
    let path = settings.catalog_path();
    if models::is_stale(&path, settings.catalog_max_age()) {
        tracing::warn!(
            "model catalog {} is missing or older than {} days; re-run the model scraper",
            path.display(),
            settings.models.max_age_days
        );
    }

    let mut catalog = ModelCatalog::load_from(&path)?;
    if let Some(default_model) = &settings.models.default_model {
        catalog.prefer(default_model)?;
    }
    Ok(catalog)
}

fn http_client(settings: &Settings) -> Result<Client> {
    Ok(Client::builder().timeout(settings.request_timeout()).build()?)
}

/// Run the HTTP service
pub(super) async fn run_serve(args: ServeArgs, settings: Settings) -> Result<()> {
    let host = args.host.unwrap_or_else(|| settings.server.host.clone());
    let port = args.port.unwrap_or(settings.server.port);
    let ip: IpAddr = host
        .parse()
        .map_err(|_| DuckError::Config(format!("invalid bind address: {}", host)))?;

    let catalog = load_catalog(&settings)?;
    let updated_at = models::last_updated(&settings.catalog_path());
    let headers = header_manager(&settings).await?;

    let state = AppState::new(headers, catalog, http_client(&settings)?, settings.chat_url())
        .with_catalog_updated_at(updated_at);

    service::serve(state, SocketAddr::new(ip, port)).await
}

/// Ask one question and print the answer
pub(super) async fn run_ask(args: AskArgs, settings: Settings) -> Result<()> {
    let catalog = load_catalog(&settings)?;
    let model = catalog.resolve_or_default(args.model.as_deref())?;
    let manager = header_manager(&settings).await?;

    let mut duck = DuckChat::with_client(
        http_client(&settings)?,
        settings.chat_url(),
        manager.current().await,
        model,
    );

    if args.no_stream {
        let answer = ask_with_refresh(&mut duck, manager.as_ref(), &args.prompt).await?;
        println!("{}", answer);
        return Ok(());
    }

    let failure = {
        let mut stream = Box::pin(duck.ask_stream(&args.prompt));
        let mut failure = None;
        while let Some(fragment) = stream.next().await {
            match fragment {
                Ok(text) => {
                    print!("{}", text);
                    io::stdout().flush()?;
                }
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
        failure
    };

    match failure {
        None => {}
        Some(e) if recovery_for(&e) == Recovery::RefreshHeaders => {
            tracing::warn!("{}; refreshing headers and retrying once", e);
            let fresh = manager.refreshed_headers(duck.headers()).await?;
            duck.set_headers(fresh);
            print!("{}", duck.resend().await?);
        }
        Some(e) => return Err(e),
    }

    // Always terminate the answer with a newline.
    println!();
    Ok(())
}

/// Capture and store a new header set
pub(super) async fn run_headers_refresh(settings: Settings) -> Result<()> {
    let manager = HeaderManager::new(header_source(&settings)?, Some(settings.headers_store_path()));
    let headers = manager.force_refresh().await?;
    println!(
        "Stored {} headers in {}",
        headers.len(),
        settings.headers_store_path().display()
    );
    Ok(())
}

/// Print the stored header set
pub(super) fn run_headers_show(settings: Settings, format: &OutputFormat) -> Result<()> {
    let path = settings.headers_store_path();
    let Some(headers) = load_store(&path)? else {
        println!("No stored headers at {}", path.display());
        return Ok(());
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&headers)?),
        OutputFormat::Text => {
            for (name, value) in headers.iter() {
                println!("{}: {}", name, value);
            }
        }
    }
    Ok(())
}

/// List the model catalog, default first
pub(super) fn run_models(settings: Settings, format: &OutputFormat) -> Result<()> {
    let catalog = load_catalog(&settings)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(catalog.entries())?);
        }
        OutputFormat::Text => {
            for (i, entry) in catalog.entries().iter().enumerate() {
                let marker = if i == 0 { " (default)" } else { "" };
                println!("{:<28} {}{}", entry.name, entry.id, marker);
            }
        }
    }
    Ok(())
}

/// Write the settings file back with every default filled in. Keys this
/// version does not know about are left in place.
pub(super) fn run_config_init(path: &Path) -> Result<()> {
    let settings = Settings::load_from(path)?;
    settings.save_to(path)?;
    println!("Wrote settings to {}", path.display());
    Ok(())
}

/// Print the effective settings, after env overrides
pub(super) fn run_config_show(settings: &Settings) -> Result<()> {
    let mut effective = settings.clone();
    effective.upstream.chat_url = settings.chat_url();
    println!("{}", serde_json::to_string_pretty(&effective)?);
    Ok(())
}
