//! LLM provider implementations for LifeChat.
//!
//! All providers implement the `lifechat_core::Provider` trait. The
//! [`LlmGateway`] sits on top and turns one provider exchange into either
//! final text or a list of decoded tool calls.

pub mod llm_gateway;
pub mod openai_compat;
pub mod retry;
pub mod router;

pub use llm_gateway::{Completion, LlmGateway, decode_tool_calls};
pub use openai_compat::OpenAiCompatProvider;
pub use retry::RetryProvider;
pub use router::{ProviderRouter, build_from_config};
