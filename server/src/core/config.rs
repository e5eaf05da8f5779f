use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::utils::retry::{DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_ATTEMPTS};

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_ANALYTICS_TIMEOUT_SECS, DEFAULT_ANALYTICS_URL,
    DEFAULT_HOST, DEFAULT_PORT,
};

// =============================================================================
// File Config Structs (JSON deserialization)
// =============================================================================

/// Server configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ServerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Analytics query service section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AnalyticsFileConfig {
    pub url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_attempts: Option<u32>,
    pub retry_base_delay_ms: Option<u64>,
}

/// Query dispatcher section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DispatchFileConfig {
    pub coalesce: Option<bool>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub server: Option<ServerFileConfig>,
    pub analytics: Option<AnalyticsFileConfig>,
    pub dispatch: Option<DispatchFileConfig>,
    pub debug: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(server) = other.server {
            let current = self.server.get_or_insert_with(ServerFileConfig::default);
            if server.host.is_some() {
                tracing::trace!(host = ?server.host, "Merging server.host");
                current.host = server.host;
            }
            if server.port.is_some() {
                tracing::trace!(port = ?server.port, "Merging server.port");
                current.port = server.port;
            }
        }

        if let Some(analytics) = other.analytics {
            let current = self
                .analytics
                .get_or_insert_with(AnalyticsFileConfig::default);
            if analytics.url.is_some() {
                tracing::trace!(url = ?analytics.url, "Merging analytics.url");
                current.url = analytics.url;
            }
            if analytics.timeout_secs.is_some() {
                current.timeout_secs = analytics.timeout_secs;
            }
            if analytics.max_attempts.is_some() {
                current.max_attempts = analytics.max_attempts;
            }
            if analytics.retry_base_delay_ms.is_some() {
                current.retry_base_delay_ms = analytics.retry_base_delay_ms;
            }
        }

        if let Some(dispatch) = other.dispatch
            && dispatch.coalesce.is_some()
        {
            let current = self.dispatch.get_or_insert_with(DispatchFileConfig::default);
            tracing::trace!(coalesce = ?dispatch.coalesce, "Merging dispatch.coalesce");
            current.coalesce = dispatch.coalesce;
        }

        if other.debug.is_some() {
            self.debug = other.debug;
        }
    }
}

// =============================================================================
// Runtime Config Structs (final merged configuration)
// =============================================================================

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Analytics query service configuration
#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    pub url: String,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub retry_base_delay_ms: u64,
}

/// Query dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub coalesce: bool,
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub analytics: AnalyticsConfig,
    pub dispatch: DispatchConfig,
    pub debug: bool,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.insight/insight.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        // 1. Load from profile dir - skip if not exists
        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        // 2. Load from CLI-specified path OR local directory
        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = resolve_config_path(path);
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        let config = Self::layer(cli, file_config);
        config.validate()?;

        tracing::debug!(config = ?config, "Configuration loaded");
        Ok(config)
    }

    /// Layer configs: defaults -> file config -> CLI/env overrides
    fn layer(cli: &CliConfig, file_config: FileConfig) -> Self {
        let file_server = file_config.server.unwrap_or_default();
        let file_analytics = file_config.analytics.unwrap_or_default();
        let file_dispatch = file_config.dispatch.unwrap_or_default();

        let server = ServerConfig {
            host: cli
                .host
                .clone()
                .or(file_server.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.or(file_server.port).unwrap_or(DEFAULT_PORT),
        };

        let analytics = AnalyticsConfig {
            url: cli
                .analytics_url
                .clone()
                .or(file_analytics.url)
                .unwrap_or_else(|| DEFAULT_ANALYTICS_URL.to_string()),
            timeout_secs: cli
                .analytics_timeout_secs
                .or(file_analytics.timeout_secs)
                .unwrap_or(DEFAULT_ANALYTICS_TIMEOUT_SECS),
            max_attempts: cli
                .analytics_max_attempts
                .or(file_analytics.max_attempts)
                .unwrap_or(DEFAULT_MAX_ATTEMPTS),
            retry_base_delay_ms: file_analytics
                .retry_base_delay_ms
                .unwrap_or(DEFAULT_BASE_DELAY_MS),
        };

        let dispatch = DispatchConfig {
            coalesce: cli.coalesce.or(file_dispatch.coalesce).unwrap_or(true),
        };

        // debug: CLI flag enables, otherwise file config decides
        let debug = cli.debug || file_config.debug.unwrap_or(false);

        Self {
            server,
            analytics,
            dispatch,
            debug,
        }
    }

    /// Validate the configuration for consistency and correctness
    fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            anyhow::bail!("Configuration error: server.host must not be empty");
        }

        // Port 0 would bind to a random port
        if self.server.port == 0 {
            anyhow::bail!("Configuration error: server.port must be greater than 0");
        }

        let url = &self.analytics.url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            anyhow::bail!(
                "Configuration error: analytics.url must start with http:// or https://. Got: {}",
                url
            );
        }

        if self.analytics.timeout_secs == 0 {
            anyhow::bail!("Configuration error: analytics.timeout_secs must be greater than 0");
        }

        if self.analytics.max_attempts == 0 {
            tracing::warn!("analytics.max_attempts is 0, treating as a single attempt");
        }

        if is_all_interfaces(&self.server.host) {
            tracing::warn!(
                host = %self.server.host,
                "Binding to all network interfaces. The query API has no authentication."
            );
        }

        Ok(())
    }
}

/// Get the profile config path (~/.insight/insight.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

/// Resolve a `--config` argument: `~/` expands to the home directory and
/// relative paths are anchored at the working directory
fn resolve_config_path(path: &Path) -> PathBuf {
    let path = match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    };

    if path.is_relative() {
        std::env::current_dir()
            .map(|cwd| cwd.join(&path))
            .unwrap_or(path)
    } else {
        path
    }
}

/// Check if host binds to all network interfaces
pub fn is_all_interfaces(host: &str) -> bool {
    matches!(host, "0.0.0.0" | "::" | "[::]")
}
