pub mod advice;
pub mod chat;
pub mod onboard;
pub mod records;
pub mod serve;

use chrono::{Days, NaiveDateTime, NaiveTime, Utc};
use lifechat_config::AppConfig;
use lifechat_core::record::parse_local_timestamp;

/// A `[start, end)` period. Missing bounds default to today in the
/// configured timezone.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct RangeArgs {
    /// Start of the period, e.g. 2025-06-15 or 2025-06-15T08:00
    #[arg(long)]
    pub start: Option<String>,

    /// End of the period (exclusive)
    #[arg(long)]
    pub end: Option<String>,
}

impl RangeArgs {
    pub fn resolve(
        &self,
        config: &AppConfig,
    ) -> Result<(NaiveDateTime, NaiveDateTime), Box<dyn std::error::Error>> {
        let start = match &self.start {
            Some(raw) => parse_local_timestamp(raw)?,
            None => Utc::now()
                .with_timezone(&config.tz()?)
                .date_naive()
                .and_time(NaiveTime::MIN),
        };
        let end = match &self.end {
            Some(raw) => parse_local_timestamp(raw)?,
            None => start
                .checked_add_days(Days::new(1))
                .ok_or("period end is out of range")?,
        };
        if end < start {
            return Err("--end must not be before --start".into());
        }
        Ok((start, end))
    }
}

/// Load config, failing with a readable message.
pub fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    tracing::debug!(?config, "Config loaded");
    Ok(config)
}

/// Fail early when the LLM key is missing.
pub fn require_api_key(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.has_api_key() {
        return Ok(());
    }
    eprintln!();
    eprintln!("  ERROR: No API key configured!");
    eprintln!();
    eprintln!("  Set MISTRAL_API_KEY (or LIFECHAT_API_KEY) in the environment or a .env file,");
    eprintln!(
        "  or add api_key to {}",
        AppConfig::config_dir().join("config.toml").display()
    );
    eprintln!();
    Err("No API key found. See above for setup instructions.".into())
}
