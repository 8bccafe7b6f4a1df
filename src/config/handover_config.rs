//! Service configuration loaded from TOML
//!
//! All sections are optional; anything missing falls back to the built-in
//! defaults below.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::report::PromptStyle;

/// Environment variable pointing at a config file
pub const CONFIG_ENV_VAR: &str = "HANDOVER_CONFIG";

/// Config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "handover.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HandoverConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address for the HTTP API
    #[serde(default = "default_addr")]
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { addr: default_addr() }
    }
}

fn default_addr() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the sled database
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

impl StorageConfig {
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(crate::storage::DB_FILE_NAME)
    }
}

/// Client side of the report boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Report endpoint URL; defaults to this server's own `/api/v1/report`
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_report_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_words")]
    pub max_words: u32,
    /// Operator name for the report persona
    #[serde(default)]
    pub organization: Option<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: default_report_timeout(),
            max_words: default_max_words(),
            organization: None,
        }
    }
}

fn default_report_timeout() -> u64 {
    90
}

fn default_max_words() -> u32 {
    180
}

impl ReportConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn prompt_style(&self) -> PromptStyle {
        PromptStyle {
            max_words: self.max_words,
            organization: self.organization.clone(),
        }
    }

    /// Configured endpoint, or the local one served at `server_addr`
    pub fn resolve_endpoint(&self, server_addr: &str) -> String {
        match self.endpoint.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => {
                let port = server_addr.rsplit(':').next().unwrap_or("8080");
                format!("http://127.0.0.1:{}/api/v1/report", port)
            }
        }
    }
}

/// Server side of the report boundary: upstream model settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_generator_timeout")]
    pub timeout_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_generator_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_generator_timeout() -> u64 {
    60
}

impl GeneratorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// API key from the configured environment variable, if set and non-blank
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

impl HandoverConfig {
    /// Load configuration using the standard search order:
    /// 1. `$HANDOVER_CONFIG` environment variable
    /// 2. `./handover.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Check every section, collecting all problems.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.server.addr.parse::<std::net::SocketAddr>().is_err() {
            errors.push(format!("server.addr: '{}' is not a socket address", self.server.addr));
        }
        if self.storage.data_dir.as_os_str().is_empty() {
            errors.push("storage.data_dir: must not be empty".to_string());
        }
        if let Some(endpoint) = &self.report.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                errors.push(format!("report.endpoint: '{}' must be an http(s) URL", endpoint));
            }
        }
        if self.report.timeout_secs == 0 {
            errors.push("report.timeout_secs: must be > 0".to_string());
        }
        if self.report.max_words == 0 {
            errors.push("report.max_words: must be > 0".to_string());
        }
        if !self.generator.base_url.starts_with("http://") && !self.generator.base_url.starts_with("https://") {
            errors.push(format!("generator.base_url: '{}' must be an http(s) URL", self.generator.base_url));
        }
        if self.generator.model.trim().is_empty() {
            errors.push("generator.model: must not be empty".to_string());
        }
        if self.generator.api_key_env.trim().is_empty() {
            errors.push("generator.api_key_env: must not be empty".to_string());
        }
        if self.generator.timeout_secs == 0 {
            errors.push("generator.timeout_secs: must be > 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}
