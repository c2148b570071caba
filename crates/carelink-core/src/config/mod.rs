//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section; every field carries a serde default so the relay starts with
//! no configuration file at all.

pub mod logging;
pub mod relay;
pub mod server;

use serde::{Deserialize, Serialize};

use self::logging::LoggingConfig;
use self::relay::RelayConfig;
use self::server::ServerConfig;

use crate::error::AppError;
use crate::result::AppResult;

/// Root application configuration.
///
/// Top-level deserialization target for the merged TOML configuration
/// files (default.toml + environment overlay) and environment variables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP/WebSocket server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Relay engine settings.
    #[serde(default)]
    pub relay: RelayConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `CARELINK_`. A bare `PORT`
    /// variable overrides the listening port, for parity with typical
    /// container deployments.
    pub fn load(env: &str) -> AppResult<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("CARELINK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let mut config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        if let Ok(port) = std::env::var("PORT") {
            config.server.port = port
                .parse()
                .map_err(|_| AppError::configuration(format!("Invalid PORT value: {port}")))?;
        }

        Ok(config)
    }
}
