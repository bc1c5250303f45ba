//! ---
//! ug_section: "01-core-functionality"
//! ug_subsection: "module"
//! ug_type: "source"
//! ug_scope: "code"
//! ug_description: "Configuration loading and validation for the UrbanGuard runtime."
//! ug_version: "v0.1.0"
//! ug_owner: "tbd"
//! ---
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use tracing::debug;

use crate::logging::LogFormat;

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::StructuredJson
}

fn default_tick_interval() -> Duration {
    Duration::from_millis(3000)
}

fn default_city() -> String {
    "Chennai".to_owned()
}

fn default_history_window() -> usize {
    20
}

fn default_anomaly_retention() -> usize {
    10
}

fn default_notification_limit() -> usize {
    5
}

fn default_api_enabled() -> bool {
    true
}

fn default_api_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_advisor_model() -> String {
    "llama-3.3-70b-versatile".to_owned()
}

fn default_advisor_key_env() -> String {
    "URBANGUARD_ADVISOR_KEY".to_owned()
}

fn default_advisor_temperature() -> f32 {
    0.7
}

fn default_advisor_max_tokens() -> u32 {
    1024
}

fn default_advisor_timeout() -> Duration {
    Duration::from_secs(20)
}

fn default_report_directory() -> PathBuf {
    PathBuf::from("target/reports")
}

/// Primary configuration object for the UrbanGuard runtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub advisor: AdvisorConfig,
    #[serde(default)]
    pub reports: ReportConfig,
}

/// Metadata describing where an [`AppConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    pub config: AppConfig,
    pub source: Option<PathBuf>,
}

impl AppConfig {
    pub const ENV_CONFIG_PATH: &'static str = "URBANGUARD_CONFIG";

    /// Load configuration from disk, respecting the `URBANGUARD_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration together with the effective source path.
    ///
    /// Unlike an explicit `URBANGUARD_CONFIG` path, missing candidates are not an
    /// error: the built-in defaults describe a complete demo deployment.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(&path)?;
                return Ok(LoadedAppConfig {
                    config,
                    source: Some(path),
                });
            }
        }

        for candidate in candidates {
            let path = candidate.as_ref();
            if path.exists() {
                let config = Self::from_path(path)?;
                return Ok(LoadedAppConfig {
                    config,
                    source: Some(path.to_path_buf()),
                });
            }
        }

        debug!(
            inspected = %candidates
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
            "no configuration file found; using defaults"
        );
        let config = AppConfig::default();
        config.validate()?;
        Ok(LoadedAppConfig {
            config,
            source: None,
        })
    }

    fn from_path(path: &Path) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        contents
            .parse::<AppConfig>()
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.simulation.validate()?;
        self.advisor.validate()?;
        Ok(())
    }
}

impl std::str::FromStr for AppConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub file_prefix: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            format: default_log_format(),
            file_prefix: None,
        }
    }
}

/// Parameters of the simulation service and its periodic driver.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_tick_interval", rename = "tick_interval_ms")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub tick_interval: Duration,
    /// Fixed seed for reproducible runs; entropy is used when absent.
    #[serde(default)]
    pub random_seed: Option<u64>,
    #[serde(default = "default_city")]
    pub default_city: String,
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    #[serde(default = "default_anomaly_retention")]
    pub anomaly_retention: usize,
    #[serde(default = "default_notification_limit")]
    pub notification_limit: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval: default_tick_interval(),
            random_seed: None,
            default_city: default_city(),
            history_window: default_history_window(),
            anomaly_retention: default_anomaly_retention(),
            notification_limit: default_notification_limit(),
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval.is_zero() {
            return Err(anyhow!("simulation.tick_interval_ms must be greater than zero"));
        }
        if self.history_window == 0 {
            return Err(anyhow!("simulation.history_window must be greater than zero"));
        }
        if self.anomaly_retention == 0 {
            return Err(anyhow!("simulation.anomaly_retention must be greater than zero"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_enabled")]
    pub enabled: bool,
    #[serde(default = "default_api_listen")]
    pub listen: SocketAddr,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: default_api_enabled(),
            listen: default_api_listen(),
        }
    }
}

/// Connection settings for the external advisory-text service.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorConfig {
    /// Chat-completions endpoint. The offline advisor is used when unset.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_advisor_model")]
    pub model: String,
    /// Name of the environment variable holding the bearer token.
    #[serde(default = "default_advisor_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_advisor_temperature")]
    pub temperature: f32,
    #[serde(default = "default_advisor_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_advisor_timeout", rename = "timeout_ms")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub timeout: Duration,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            model: default_advisor_model(),
            api_key_env: default_advisor_key_env(),
            temperature: default_advisor_temperature(),
            max_tokens: default_advisor_max_tokens(),
            timeout: default_advisor_timeout(),
        }
    }
}

impl AdvisorConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(endpoint) = &self.endpoint {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(anyhow!(
                    "advisor.endpoint '{}' must be an http(s) url",
                    endpoint
                ));
            }
        }
        Ok(())
    }

    /// Resolve the bearer token from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|value| !value.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_report_directory")]
    pub directory: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            directory: default_report_directory(),
        }
    }
}
