//! # LifeChat Core
//!
//! Domain types, traits, and error definitions for the LifeChat journaling
//! backend. It defines the domain model that all other crates implement
//! against. It holds no HTTP, storage or LLM client code; the only piece of
//! tokio it uses is the `sync` broadcast channel behind the event bus.
//!
//! ## Design Philosophy
//!
//! Every collaborator at a system boundary is a trait here: the LLM
//! [`Provider`], the [`Tool`] adapters and the [`RecordStore`]. Implementations
//! live in their respective crates, so the orchestration loop can be driven
//! end-to-end with scripted providers and stub services in tests.

pub mod error;
pub mod event;
pub mod message;
pub mod provider;
pub mod record;
pub mod store;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use event::{DomainEvent, EventBus};
pub use message::{Message, MessageToolCall, Role, Transcript};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolChoice, ToolDefinition};
pub use record::{parse_local_timestamp, Event, Feeling, Record, RecordKind};
pub use store::RecordStore;
pub use tool::{Tool, ToolCall, ToolContext, ToolResult};
