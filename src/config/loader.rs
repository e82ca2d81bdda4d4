use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use eyre::{Context, Result};

use crate::config::models::GatewayConfig;

/// Load configuration from an optional file plus `TEXTGATE_*` environment
/// overrides. Supports multiple file formats: TOML, YAML, JSON, etc.
///
/// Environment variables use `__` as the section separator, e.g.
/// `TEXTGATE_BACKEND__BASE_URL` maps to `backend.base_url` and
/// `TEXTGATE_MODE` to `mode`.
pub fn load_config(config_path: Option<&str>) -> Result<GatewayConfig> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        let config_path = Path::new(path);

        // Determine file format based on extension
        let format = match config_path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            Some("json") => FileFormat::Json,
            Some("toml") => FileFormat::Toml,
            Some("ini") => FileFormat::Ini,
            _ => FileFormat::Toml, // Default to TOML
        };

        let path_str = config_path
            .to_str()
            .ok_or_else(|| eyre::eyre!("Invalid UTF-8 path: {}", config_path.display()))?;

        // A missing file is fine when env vars carry the configuration.
        builder = builder.add_source(File::new(path_str, format).required(false));
    }

    let settings = builder
        .add_source(
            Environment::with_prefix("TEXTGATE")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .wrap_err("Failed to build configuration")?;

    let gateway_config: GatewayConfig = settings
        .try_deserialize()
        .wrap_err("Failed to deserialize gateway configuration")?;

    Ok(gateway_config)
}
