//! # LifeChat Agent
//!
//! The chat-to-record pipeline: the two-phase tool-orchestration loop
//! ([`TurnRunner`]), the calendar [materializer](materialize), the
//! [`Journal`] that persists completed turns, and the [`Advisor`] that turns
//! a period of records into advice.

pub mod activity;
pub mod advice;
pub mod journal;
pub mod materialize;
pub mod prompts;
pub mod setup;
pub mod turn;

#[cfg(test)]
mod test_helpers;

pub use activity::spawn_activity_log;
pub use advice::{Advisor, EMPTY_PERIOD_MESSAGE};
pub use journal::{ChatReply, Journal};
pub use materialize::calendar_payload_to_event;
pub use setup::{Services, build_services, open_store};
pub use turn::{TurnOutcome, TurnRunner};
