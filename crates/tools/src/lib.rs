//! Tool adapters for LifeChat.
//!
//! Three adapters are offered to the model: `calendar_insert` and
//! `calendar_list` act on the user's calendar through the function-execution
//! service, `feeling_extract` is a local transform that records a Feeling.
//!
//! Dispatch goes through [`ToolRegistry`], an immutable name → [`Adapter`]
//! map built once at startup.

pub mod calendar;
pub mod calendar_insert;
pub mod calendar_list;
pub mod feeling_extract;

#[cfg(test)]
mod testing;

use std::collections::HashMap;
use std::sync::Arc;
use lifechat_core::provider::ToolDefinition;
use lifechat_core::tool::Tool;

pub use calendar::{AciCalendarClient, CalendarBackend};
pub use calendar_insert::CalendarInsertTool;
pub use calendar_list::CalendarListTool;
pub use feeling_extract::FeelingExtractTool;

/// The closed set of adapters the orchestration loop can dispatch to.
pub enum Adapter {
    CalendarInsert(CalendarInsertTool),
    CalendarList(CalendarListTool),
    FeelingExtract(FeelingExtractTool),
}

impl Adapter {
    pub fn tool(&self) -> &dyn Tool {
        match self {
            Self::CalendarInsert(t) => t,
            Self::CalendarList(t) => t,
            Self::FeelingExtract(t) => t,
        }
    }

    pub fn name(&self) -> &str {
        self.tool().name()
    }

    pub fn definition(&self) -> ToolDefinition {
        self.tool().to_definition()
    }
}

/// Immutable registry of adapters, in declaration order.
pub struct ToolRegistry {
    adapters: Vec<Adapter>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Build a registry. A later adapter with an already-used name replaces
    /// the earlier one.
    pub fn new(adapters: Vec<Adapter>) -> Self {
        let mut kept: Vec<Adapter> = Vec::with_capacity(adapters.len());
        let mut index = HashMap::new();
        for adapter in adapters {
            let name = adapter.name().to_string();
            match index.get(&name).copied() {
                Some(i) => kept[i] = adapter,
                None => {
                    index.insert(name, kept.len());
                    kept.push(adapter);
                }
            }
        }
        Self {
            adapters: kept,
            index,
        }
    }

    /// All three adapters over one calendar backend.
    pub fn with_calendar(backend: Arc<dyn CalendarBackend>, calendar_id: &str) -> Self {
        Self::new(vec![
            Adapter::CalendarInsert(CalendarInsertTool::new(backend.clone(), calendar_id)),
            Adapter::CalendarList(CalendarListTool::new(backend, calendar_id)),
            Adapter::FeelingExtract(FeelingExtractTool),
        ])
    }

    pub fn get(&self, name: &str) -> Option<&Adapter> {
        self.index.get(name).map(|&i| &self.adapters[i])
    }

    /// Tool definitions for the LLM, in a stable order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.adapters.iter().map(Adapter::definition).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.adapters.iter().map(Adapter::name).collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

/// The production registry, backed by the configured calendar service.
pub fn default_registry(config: &lifechat_config::CalendarConfig) -> ToolRegistry {
    let backend = Arc::new(AciCalendarClient::from_config(config));
    ToolRegistry::with_calendar(backend, &config.calendar_id)
}
