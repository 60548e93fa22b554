use std::{path::Path, process::ExitCode, time::Instant};

use clap::Parser;
use modelgate::{AppState, build_app, config::AppConfig, observability};

const DEFAULT_CONFIG_PATH: &str = "modelgate.toml";

/// CLI arguments for modelgate
#[derive(Parser, Debug)]
#[command(version, about = "Model catalog and access resolution service", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to config file (defaults to ./modelgate.toml if it exists, otherwise
    /// built-in defaults)
    #[arg(short, long, global = true)]
    config: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Start the server (default)
    Serve,
    /// Validate the config and build the catalog once
    Check,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match args.command {
        Some(Command::Check) => run_check(args.config.as_deref()).await,
        Some(Command::Serve) | None => run_server(args.config.as_deref()).await,
    }
}

/// Load the explicit config path, or `modelgate.toml` when present, or defaults.
fn load_config(explicit_config_path: Option<&str>) -> Result<AppConfig, String> {
    let path = match explicit_config_path {
        Some(path) => Path::new(path),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Path::new(DEFAULT_CONFIG_PATH),
        None => return Ok(AppConfig::default()),
    };

    AppConfig::from_file(path)
        .map_err(|e| format!("Failed to load config from {}: {}", path.display(), e))
}

async fn run_check(explicit_config_path: Option<&str>) -> ExitCode {
    let config = match load_config(explicit_config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let state = match AppState::new(config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let store = state.model_access.store();
    let started = Instant::now();
    match store.get().await {
        Ok(snapshot) => {
            println!("Config OK");
            println!(
                "Catalog source '{}': {} models built in {:.2?}",
                store.source_name(),
                snapshot.len(),
                started.elapsed()
            );
            let default_count = snapshot
                .models()
                .iter()
                .filter(|m| m.accessible_default)
                .count();
            println!("Accessible without keys: {default_count}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!(
                "Error: catalog source '{}' failed to build: {e}",
                store.source_name()
            );
            ExitCode::FAILURE
        }
    }
}

async fn run_server(explicit_config_path: Option<&str>) -> ExitCode {
    let config = match load_config(explicit_config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = observability::init_tracing(&config.observability) {
        eprintln!("Failed to initialize tracing: {e}");
        return ExitCode::FAILURE;
    }

    if config.observability.metrics.enabled
        && let Err(e) = observability::metrics::init_metrics(&config.observability.metrics)
    {
        tracing::warn!(error = %e, "Failed to initialize metrics");
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config_file = explicit_config_path.unwrap_or(DEFAULT_CONFIG_PATH),
        "Starting modelgate"
    );

    let state = match AppState::new(config.clone()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize application state");
            return ExitCode::FAILURE;
        }
    };

    if config.catalog.warm_on_startup {
        // A failed warm-up is not fatal: the next listing retries the build.
        match state.model_access.store().get().await {
            Ok(snapshot) => {
                tracing::info!(models = snapshot.len(), "Catalog warmed");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Catalog warm-up failed, will retry on first request");
            }
        }
    }

    let app = build_app(&config, state);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(address = %bind_addr, error = %e, "Failed to bind to address");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("Server listening on http://{}", bind_addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server error");
        return ExitCode::FAILURE;
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
