//! Configuration loading, validation, and management for LifeChat.
//!
//! Loads configuration from `~/.lifechat/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.lifechat/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// LLM API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// LLM provider used for extraction and replies
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model used by the extraction loop
    #[serde(default = "default_model")]
    pub model: String,

    /// Model used for advice and motivational speeches (defaults to `model`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advice_model: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// IANA timezone all record timestamps are expressed in
    #[serde(default = "default_timezone")]
    pub timezone: String,

    #[serde(default)]
    pub timeouts: TimeoutConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub calendar: CalendarConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "mistral".into()
}
fn default_model() -> String {
    "mistral-large-latest".into()
}
fn default_temperature() -> f32 {
    0.3
}
fn default_max_tokens() -> u32 {
    2048
}
fn default_timezone() -> String {
    "Europe/Berlin".into()
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("advice_model", &self.advice_model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timezone", &self.timezone)
            .field("timeouts", &self.timeouts)
            .field("retry", &self.retry)
            .field("calendar", &self.calendar)
            .field("store", &self.store)
            .field("gateway", &self.gateway)
            .field("providers", &self.providers)
            .finish()
    }
}

/// Deadlines for one chat turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Per LLM request
    #[serde(default = "default_llm_secs")]
    pub llm_secs: u64,

    /// Per adapter call
    #[serde(default = "default_tool_secs")]
    pub tool_secs: u64,

    /// Whole turn, both phases included
    #[serde(default = "default_turn_secs")]
    pub turn_secs: u64,
}

fn default_llm_secs() -> u64 {
    60
}
fn default_tool_secs() -> u64 {
    20
}
fn default_turn_secs() -> u64 {
    180
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            llm_secs: default_llm_secs(),
            tool_secs: default_tool_secs(),
            turn_secs: default_turn_secs(),
        }
    }
}

/// Backoff policy for transient provider failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_retries() -> u32 {
    3
}
fn default_base_delay_ms() -> u64 {
    500
}
fn default_max_delay_ms() -> u64 {
    8_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

/// The function-execution service behind the calendar adapters.
#[derive(Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    #[serde(default = "default_calendar_url")]
    pub base_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Linked account the calendar calls act on behalf of
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,

    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,
}

fn default_calendar_url() -> String {
    "https://api.aci.dev/v1".into()
}
fn default_calendar_id() -> String {
    "primary".into()
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            base_url: default_calendar_url(),
            api_key: None,
            account_id: None,
            calendar_id: default_calendar_id(),
        }
    }
}

impl std::fmt::Debug for CalendarConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalendarConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .field("account_id", &self.account_id)
            .field("calendar_id", &self.calendar_id)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// "sqlite" or "memory"
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// SQLite file; defaults to `~/.lifechat/lifechat.db`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

fn default_store_backend() -> String {
    "sqlite".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// CORS origins; `["*"]` allows any
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_allowed_origins() -> Vec<String> {
    vec!["*".into()]
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.lifechat/config.toml).
    ///
    /// Environment variables take precedence over the file:
    /// - `LIFECHAT_API_KEY`, then `MISTRAL_API_KEY` (LLM key, only if unset)
    /// - `LIFECHAT_PROVIDER`, `LIFECHAT_MODEL`
    /// - `ACI_API_KEY`, `LINKED_ACCOUNT_OWNER_ID` (calendar service)
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = var("LIFECHAT_API_KEY").or_else(|| var("MISTRAL_API_KEY"));
        }
        if let Some(provider) = var("LIFECHAT_PROVIDER") {
            self.provider = provider;
        }
        if let Some(model) = var("LIFECHAT_MODEL") {
            self.model = model;
        }
        if let Some(key) = var("ACI_API_KEY") {
            self.calendar.api_key = Some(key);
        }
        if let Some(owner) = var("LINKED_ACCOUNT_OWNER_ID") {
            self.calendar.account_id = Some(owner);
        }
    }

    pub fn config_dir() -> PathBuf {
        dirs_home().join(".lifechat")
    }

    /// Where the SQLite journal lives.
    pub fn database_path(&self) -> PathBuf {
        match &self.store.path {
            Some(p) => PathBuf::from(p),
            None => Self::config_dir().join("lifechat.db"),
        }
    }

    /// The configured timezone.
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::ValidationError(format!("unknown timezone '{}'", self.timezone)))
    }

    /// Model for advice and motivational speeches.
    pub fn advice_model(&self) -> &str {
        self.advice_model.as_deref().unwrap_or(&self.model)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.temperature < 0.0 || self.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        self.tz()?;

        let t = &self.timeouts;
        if t.llm_secs == 0 || t.tool_secs == 0 || t.turn_secs == 0 {
            return Err(ConfigError::ValidationError("timeouts must be non-zero".into()));
        }

        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(ConfigError::ValidationError(
                "retry.base_delay_ms must not exceed retry.max_delay_ms".into(),
            ));
        }

        if !matches!(self.store.backend.as_str(), "sqlite" | "memory") {
            return Err(ConfigError::ValidationError(format!(
                "unknown store backend '{}'",
                self.store.backend
            )));
        }

        Ok(())
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: default_provider(),
            model: default_model(),
            advice_model: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timezone: default_timezone(),
            timeouts: TimeoutConfig::default(),
            retry: RetryConfig::default(),
            calendar: CalendarConfig::default(),
            store: StoreConfig::default(),
            gateway: GatewayConfig::default(),
            providers: HashMap::new(),
        }
    }
}

fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "mistral");
        assert_eq!(config.model, "mistral-large-latest");
        assert_eq!(config.gateway.port, 8000);
        assert_eq!(config.tz().unwrap(), chrono_tz::Europe::Berlin);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.provider, config.provider);
        assert_eq!(parsed.timeouts.turn_secs, config.timeouts.turn_secs);
        assert_eq!(parsed.calendar.calendar_id, "primary");
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_timezone_rejected() {
        let config = AppConfig {
            timezone: "Mars/Olympus_Mons".into(),
            ..AppConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Mars/Olympus_Mons"));
    }

    #[test]
    fn zero_timeouts_rejected() {
        let mut config = AppConfig::default();
        config.timeouts.tool_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_store_backend_rejected() {
        let mut config = AppConfig::default();
        config.store.backend = "postgres".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.provider, "mistral");
    }

    #[test]
    fn partial_file_keeps_defaults_for_the_rest() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
model = "magistral-medium-2506"
timezone = "America/New_York"

[calendar]
account_id = "owner-42"

[timeouts]
turn_secs = 30
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.model, "magistral-medium-2506");
        assert_eq!(config.tz().unwrap(), chrono_tz::America::New_York);
        assert_eq!(config.calendar.account_id.as_deref(), Some("owner-42"));
        assert_eq!(config.calendar.base_url, "https://api.aci.dev/v1");
        assert_eq!(config.timeouts.turn_secs, 30);
        assert_eq!(config.timeouts.llm_secs, 60);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timeouts = \"soon\"").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        let env: HashMap<&str, &str> = [
            ("MISTRAL_API_KEY", "mk"),
            ("LIFECHAT_MODEL", "mistral-small-latest"),
            ("ACI_API_KEY", "aci"),
            ("LINKED_ACCOUNT_OWNER_ID", "owner"),
        ]
        .into_iter()
        .collect();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.api_key.as_deref(), Some("mk"));
        assert_eq!(config.model, "mistral-small-latest");
        assert_eq!(config.provider, "mistral");
        assert_eq!(config.calendar.api_key.as_deref(), Some("aci"));
        assert_eq!(config.calendar.account_id.as_deref(), Some("owner"));
    }

    #[test]
    fn file_api_key_wins_over_env() {
        let mut config = AppConfig {
            api_key: Some("from-file".into()),
            ..AppConfig::default()
        };
        config.apply_env(|k| (k == "LIFECHAT_API_KEY").then(|| "from-env".to_string()));
        assert_eq!(config.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn debug_redacts_secrets() {
        let mut config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        config.calendar.api_key = Some("aci-secret".into());
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("sk-secret"));
        assert!(!dbg.contains("aci-secret"));
        assert!(dbg.contains("[REDACTED]"));
    }

    #[test]
    fn advice_model_falls_back_to_model() {
        let mut config = AppConfig::default();
        assert_eq!(config.advice_model(), "mistral-large-latest");
        config.advice_model = Some("magistral-medium-2506".into());
        assert_eq!(config.advice_model(), "magistral-medium-2506");
    }

    #[test]
    fn database_path_defaults_under_config_dir() {
        let config = AppConfig::default();
        assert!(config.database_path().ends_with(".lifechat/lifechat.db"));
    }
}
