pub mod api;
pub mod config;
pub mod constants;
pub mod db;
pub mod domain;
pub mod entities;
pub mod services;
pub mod state;
pub mod widgets;

use std::sync::Arc;
use tokio::signal;

use anyhow::Context;
pub use config::Config;
use state::SharedState;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let builder = PrometheusBuilder::new();
        let handle = builder
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        info!("Prometheus metrics recorder initialized");
        Some(handle)
    } else {
        None
    };

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let mut log_level = config.general.log_level.clone();
    if config.general.suppress_connection_errors {
        log_level.push_str(",hyper_util=off");
    }

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

    let fmt_layer = tracing_subscriber::fmt::layer();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let (layer, task) = tracing_loki::builder()
            .label("app", "wigtopia")?
            .extra_field("env", "production")?
            .build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        None | Some("serve" | "-s" | "--serve") => run_server(config, prometheus_handle).await,

        Some("init" | "--init") => {
            if Config::create_default_if_missing()? {
                println!("✓ Config file created. Edit config.toml and run again.");
            } else {
                println!("Config file already exists.");
            }
            Ok(())
        }

        Some("create-admin") => {
            if args.len() < 3 {
                println!("Usage: wigtopia create-admin <username>");
                return Ok(());
            }
            cmd_create_admin(&config, &args[2]).await
        }

        Some("help" | "-h" | "--help") => {
            print_help();
            Ok(())
        }

        Some(other) => {
            println!("Unknown command: {}", other);
            println!();
            print_help();
            Ok(())
        }
    }
}

fn print_help() {
    println!("Wigtopia - storefront and back-office server");
    println!();
    println!("USAGE:");
    println!("  wigtopia <COMMAND>");
    println!();
    println!("COMMANDS:");
    println!("  serve                 Run the HTTP server (default)");
    println!("  init                  Create default config file");
    println!("  create-admin <name>   Add an operator account");
    println!("  help                  Show this help message");
    println!();
    println!("CONFIG:");
    println!("  Edit config.toml (or set WIGTOPIA_CONFIG) to configure the");
    println!("  database path, server port, session timeouts and uploads.");
}

async fn cmd_create_admin(config: &Config, username: &str) -> anyhow::Result<()> {
    use crate::db::Store;

    let store = Store::new(&config.general.database_path).await?;

    if store.get_admin_by_username(username).await?.is_some() {
        println!("Admin '{}' already exists.", username);
        return Ok(());
    }

    println!("Password for '{}':", username);
    let mut password = String::new();
    std::io::stdin().read_line(&mut password)?;
    let password = password.trim();

    if password.len() < 8 {
        println!("Password must be at least 8 characters.");
        return Ok(());
    }

    let admin = store
        .create_admin(username, password, &config.security)
        .await?;

    println!("✓ Created admin '{}' (ID: {})", admin.username, admin.id);
    Ok(())
}

async fn run_server(
    config: Config,
    prometheus_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
) -> anyhow::Result<()> {
    info!(
        "Wigtopia v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let shared = Arc::new(SharedState::new(config.clone()).await?);
    let app_state = api::create_app_state(shared, prometheus_handle).await?;

    let app = api::router(app_state);
    let addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let server_handle = tokio::spawn(async move {
        info!("🌐 Web server running at http://{addr}");
        if let Err(e) = axum::serve(listener, app).await {
            error!("Web server error: {}", e);
        }
    });

    info!("Server running. Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(e) => {
            error!("Error listening for shutdown: {}", e);
        }
    }

    server_handle.abort();
    info!("Server stopped");

    Ok(())
}
