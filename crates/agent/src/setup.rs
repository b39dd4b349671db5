//! Wiring: build the journal and advisor from configuration.

use lifechat_config::AppConfig;
use lifechat_core::event::EventBus;
use lifechat_core::store::RecordStore;
use lifechat_core::{Error, Result};
use lifechat_providers::{LlmGateway, build_from_config};
use lifechat_store::{InMemoryStore, SqliteStore};
use lifechat_tools::default_registry;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::advice::Advisor;
use crate::journal::Journal;
use crate::turn::TurnRunner;

/// Everything the CLI and the HTTP gateway need.
#[derive(Clone)]
pub struct Services {
    pub journal: Arc<Journal>,
    pub advisor: Arc<Advisor>,
    pub event_bus: Arc<EventBus>,
}

fn config_error(e: impl std::fmt::Display) -> Error {
    Error::Config {
        message: e.to_string(),
    }
}

pub async fn build_services(config: &AppConfig) -> Result<Services> {
    let timezone = config.tz().map_err(config_error)?;
    let provider = build_from_config(config).default().ok_or_else(|| {
        config_error(format!("provider '{}' is not available", config.provider))
    })?;
    let llm_timeout = Duration::from_secs(config.timeouts.llm_secs);

    let chat_gateway = LlmGateway::new(provider.clone(), &config.model)
        .with_temperature(config.temperature)
        .with_max_tokens(config.max_tokens)
        .with_timeout(llm_timeout);
    let advice_gateway = LlmGateway::new(provider, config.advice_model())
        .with_temperature(config.temperature)
        .with_max_tokens(config.max_tokens)
        .with_timeout(llm_timeout);

    let store = open_store(config).await?;
    let event_bus = Arc::new(EventBus::default());
    let tools = Arc::new(default_registry(&config.calendar));

    let runner = TurnRunner::new(Arc::new(chat_gateway), tools, event_bus.clone())
        .with_account_id(config.calendar.account_id.clone().unwrap_or_default())
        .with_timezone(timezone)
        .with_tool_timeout(Duration::from_secs(config.timeouts.tool_secs))
        .with_turn_timeout(Duration::from_secs(config.timeouts.turn_secs));

    info!(
        provider = %config.provider,
        model = %config.model,
        store = store.name(),
        timezone = %timezone,
        "Services ready"
    );

    Ok(Services {
        journal: Arc::new(Journal::new(runner, store.clone(), event_bus.clone())),
        advisor: Arc::new(Advisor::new(Arc::new(advice_gateway), store)),
        event_bus,
    })
}

/// Open the configured record store, creating the database directory if needed.
pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn RecordStore>> {
    if config.store.backend == "memory" {
        return Ok(Arc::new(InMemoryStore::new()));
    }

    let path = config.database_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            config_error(format!("cannot create {}: {e}", parent.display()))
        })?;
    }
    let store = SqliteStore::new(&format!("sqlite://{}", path.display())).await?;
    Ok(Arc::new(store))
}
