//! Service configuration loading and validation.
//!
//! Reads `config/biz-agent.yaml` and resolves environment variables. The
//! resulting [`AppConfig`] is built once at startup and passed explicitly to
//! every component; nothing reads the environment after that.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Relative location of the config file under the project root.
const CONFIG_RELATIVE_PATH: &str = "config/biz-agent.yaml";

/// Env var naming an explicit config file.
const CONFIG_ENV_VAR: &str = "BIZ_AGENT_CONFIG";

// ─── Errors ─────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not find {path}")]
    NotFound { path: String },

    #[error("failed to read {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("failed to parse config: {reason}")]
    Parse { reason: String },

    #[error("missing required config value: {field}")]
    MissingRequired { field: String },

    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: String, reason: String },
}

// ─── Public Types ───────────────────────────────────────────────────────────

/// Sampling parameters for one model pass.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PassSampling {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Tool-calling model endpoint (OpenAI-compatible).
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub base_url: String,
    pub model_name: String,
    #[serde(default)]
    pub api_key: String,
    /// Action-selection call (full catalog attached).
    #[serde(default = "default_first_pass")]
    pub first_pass: PassSampling,
    /// Reply-synthesis call (no tools).
    #[serde(default = "default_second_pass")]
    pub second_pass: PassSampling,
    #[serde(default = "default_model_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_first_pass() -> PassSampling {
    PassSampling {
        temperature: 1.0,
        max_tokens: 2000,
    }
}
fn default_second_pass() -> PassSampling {
    PassSampling {
        temperature: 0.7,
        max_tokens: 1000,
    }
}
fn default_model_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Hosted database through its PostgREST endpoint.
    Postgrest,
    /// Embedded SQLite file (local development).
    Sqlite,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Project URL, e.g. `https://xyz.supabase.co`. Also hosts the auth API.
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub service_key: String,
    /// Public key sent as `apikey` on per-user requests; falls back to
    /// `service_key` when absent.
    #[serde(default)]
    pub anon_key: Option<String>,
    #[serde(default)]
    pub sqlite_path: Option<String>,
    #[serde(default = "default_store_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_store_timeout_secs() -> u64 {
    10
}

impl StoreConfig {
    /// Key sent in the `apikey` header on per-user requests.
    pub fn public_key(&self) -> &str {
        self.anon_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .unwrap_or(&self.service_key)
    }

    /// Resolved SQLite path: configured value or `<data dir>/biz-agent.db`.
    pub fn resolved_sqlite_path(&self) -> String {
        match &self.sqlite_path {
            Some(p) if !p.is_empty() => p.clone(),
            _ => crate::data_dir()
                .join("biz-agent.db")
                .to_string_lossy()
                .into_owned(),
        }
    }
}

/// A fixed bearer token accepted in SQLite mode.
#[derive(Debug, Clone, Deserialize)]
pub struct StaticToken {
    pub token: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub static_tokens: Vec<StaticToken>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Deadline for one chat request, spanning both model calls and all
    /// executor calls.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:8787".to_string()
}
fn default_request_timeout_secs() -> u64 {
    60
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "biz_agent=info,warn".to_string()
}

/// Top-level service configuration (mirrors `config/biz-agent.yaml`).
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub model: ModelConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Reject configs missing values the service cannot run without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require("model.base_url", &self.model.base_url)?;
        require("model.model_name", &self.model.model_name)?;
        require("model.api_key", &self.model.api_key)?;

        if self.server.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "server.request_timeout_secs".into(),
                reason: "must be greater than zero".into(),
            });
        }

        match self.store.backend {
            StoreBackend::Postgrest => {
                require("store.endpoint", &self.store.endpoint)?;
                require("store.service_key", &self.store.service_key)?;
            }
            StoreBackend::Sqlite => {
                if self.auth.static_tokens.is_empty() {
                    return Err(ConfigError::MissingRequired {
                        field: "auth.static_tokens".into(),
                    });
                }
            }
        }
        Ok(())
    }
}

fn require(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::MissingRequired {
            field: field.to_string(),
        });
    }
    Ok(())
}

// ─── Loading ────────────────────────────────────────────────────────────────

/// Locate the config file.
///
/// Checks `BIZ_AGENT_CONFIG` first, then searches upward from `start` for
/// `config/biz-agent.yaml`.
pub fn find_config_path(start: &Path) -> Result<PathBuf, ConfigError> {
    // 1. Check env var
    if let Ok(explicit) = std::env::var(CONFIG_ENV_VAR) {
        let candidate = PathBuf::from(expand_tilde(&explicit));
        if candidate.exists() {
            return Ok(candidate);
        }
        return Err(ConfigError::NotFound {
            path: candidate.display().to_string(),
        });
    }

    // 2. Walk upward from `start`
    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_RELATIVE_PATH);
        if candidate.exists() {
            return Ok(candidate);
        }
        if !dir.pop() {
            break;
        }
    }

    Err(ConfigError::NotFound {
        path: CONFIG_RELATIVE_PATH.into(),
    })
}

/// Load, interpolate, parse and validate the config file.
///
/// String values matching `${VAR_NAME}` or `${VAR_NAME:-default}` are
/// replaced from the environment before parsing.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let config = parse_config(&raw)?;
    config.validate()?;
    Ok(config)
}

/// Interpolate and parse YAML text without validating it.
pub fn parse_config(raw: &str) -> Result<AppConfig, ConfigError> {
    let interpolated = interpolate_env_vars(raw);
    serde_yaml::from_str(&interpolated).map_err(|e| ConfigError::Parse {
        reason: e.to_string(),
    })
}

// ─── Env-var interpolation ──────────────────────────────────────────────────

/// Replace every `${VAR}` and `${VAR:-default}` in `input`. An unset or
/// empty variable takes the default (tilde-expanded), else the empty string.
/// An unterminated `${` is kept literally.
fn interpolate_env_vars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(open) = rest.find("${") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        out.push_str(&lookup(&after[..close]));
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    out
}

fn lookup(expr: &str) -> String {
    let (name, default) = match expr.split_once(":-") {
        Some((name, default)) => (name, Some(default)),
        None => (expr, None),
    };
    match (std::env::var(name.trim()), default) {
        (Ok(value), _) if !value.is_empty() => value,
        (_, Some(default)) => expand_tilde(default),
        (Ok(value), None) => value,
        (Err(_), None) => String::new(),
    }
}

fn expand_tilde(path: &str) -> String {
    match (path.strip_prefix('~'), dirs::home_dir()) {
        (Some(rest), Some(home)) => format!("{}{rest}", home.display()),
        _ => path.to_string(),
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
