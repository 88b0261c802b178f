//! Layered configuration: compiled defaults, then `logvault.toml`, then
//! `LOGVAULT_*` environment variables (nested keys split on `__`, e.g.
//! `LOGVAULT_API__PORT=9000`).

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Which storage medium backs the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    File,
    Sled,
}

impl Default for BackendKind {
    fn default() -> Self {
        BackendKind::Sled
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Shared secret every API request must present in `x-secret-key`.
    /// Unset means the instance runs open.
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default = "default_io_timeout_ms")]
    pub io_timeout_ms: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_io_timeout_ms() -> u64 {
    5000
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            host: default_host(),
            port: default_port(),
            secret_key: None,
            io_timeout_ms: default_io_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VaultConfig {
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub api: ApiConfig,
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for VaultConfig {
    fn default() -> Self {
        VaultConfig {
            backend: BackendKind::default(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            api: ApiConfig::default(),
        }
    }
}

pub fn load_config(path: Option<&str>) -> Result<VaultConfig, figment::Error> {
    let toml_path = path.unwrap_or("logvault.toml");

    let figment = Figment::from(Serialized::defaults(VaultConfig::default()))
        .merge(Toml::file(toml_path))
        .merge(Env::prefixed("LOGVAULT_").split("__"));

    let mut config: VaultConfig = figment.extract()?;

    if config.data_dir.trim().is_empty() {
        return Err(figment::Error::from("data_dir must be set".to_string()));
    }
    if config.api.port == 0 {
        return Err(figment::Error::from("api.port must be nonzero".to_string()));
    }
    if config.api.io_timeout_ms == 0 {
        return Err(figment::Error::from(
            "api.io_timeout_ms must be nonzero".to_string(),
        ));
    }
    // A blank secret means no auth rather than "everything is rejected".
    if let Some(secret) = &config.api.secret_key {
        if secret.trim().is_empty() {
            config.api.secret_key = None;
        }
    }

    Ok(config)
}
