use std::sync::Arc;

use clap::Parser;
use color_eyre::{
    Result,
    eyre::{WrapErr, eyre},
};
use textgate::{
    AppState, GracefulShutdown, ReqwestBackendClient, build_router,
    config::{load_config, models::RunMode, validation::GatewayConfigValidator},
    tracing_setup,
};

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Option<Commands>,

    #[clap(short, long, default_value = "textgate.toml")]
    config: String,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Validate configuration file
    Validate {
        /// Configuration file to validate
        #[clap(short, long, default_value = "textgate.toml")]
        config: String,
    },
    /// Initialize a new configuration file
    Init {
        /// Output path for the new config file
        #[clap(short, long, default_value = "textgate.toml")]
        config: String,
    },
    /// Start the gateway server (default)
    Serve {
        /// Configuration file to use
        #[clap(short, long, default_value = "textgate.toml")]
        config: String,
    },
}

const DEFAULT_CONFIG_TEMPLATE: &str = r#"# textgate configuration
listen_addr = "127.0.0.1:8080"
# "development" or "production". Production requires backend.base_url.
mode = "development"

[backend]
# base_url = "http://backend:8000"
request_timeout_secs = 30
ingest_timeout_secs = 120

[limits]
max_json_bytes = 1048576      # 1 MiB
max_upload_bytes = 26214400   # 25 MiB

[log]
level = "info"
json = false
"#;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    let (command, config_path) = match args.command {
        Some(Commands::Validate { config }) => ("validate", config),
        Some(Commands::Init { config }) => ("init", config),
        Some(Commands::Serve { config }) => ("serve", config),
        None => ("serve", args.config),
    };

    match command {
        "validate" => validate_config_command(&config_path),
        "init" => init_config_command(&config_path),
        _ => serve_command(&config_path).await,
    }
}

fn validate_config_command(config_path: &str) -> Result<()> {
    let config = load_config(Some(config_path))
        .wrap_err_with(|| format!("Failed to load configuration from {config_path}"))?;

    GatewayConfigValidator::validate(&config).map_err(|e| eyre!("{e}"))?;

    println!("Configuration {config_path} is valid");
    Ok(())
}

fn init_config_command(config_path: &str) -> Result<()> {
    if std::path::Path::new(config_path).exists() {
        return Err(eyre!(
            "Refusing to overwrite existing configuration file: {config_path}"
        ));
    }
    std::fs::write(config_path, DEFAULT_CONFIG_TEMPLATE)
        .wrap_err_with(|| format!("Failed to write {config_path}"))?;
    println!("Wrote default configuration to {config_path}");
    Ok(())
}

async fn serve_command(config_path: &str) -> Result<()> {
    let config = load_config(Some(config_path))
        .wrap_err_with(|| format!("Failed to load configuration from {config_path}"))?;

    // In production a missing backend URL must fail startup rather than
    // silently default to a loopback address.
    GatewayConfigValidator::validate(&config).map_err(|e| eyre!("{e}"))?;

    if config.mode == RunMode::Production || config.log.json {
        tracing_setup::init_tracing(&config.log.level)?;
    } else {
        tracing_setup::init_console_tracing(&config.log.level)?;
    }

    let config = Arc::new(config);
    let backend_url = config.backend_base_url();
    let backend = Arc::new(
        ReqwestBackendClient::new(&backend_url, config.request_timeout())
            .wrap_err("Failed to create backend client")?,
    );

    tracing::info!(
        listen_addr = %config.listen_addr,
        backend = %backend_url,
        mode = ?config.mode,
        "Starting textgate"
    );

    let app = build_router(AppState::new(backend, config.clone()));

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .wrap_err_with(|| format!("Failed to bind {}", config.listen_addr))?;

    let shutdown = Arc::new(GracefulShutdown::new());
    let mut shutdown_rx = shutdown.subscribe();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            shutdown.run_signal_handler().await;
        });
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
            tracing::info!("Draining in-flight requests");
        })
        .await
        .wrap_err("Server error")?;

    tracing::info!("Shutdown complete");
    Ok(())
}
