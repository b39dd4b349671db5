//! Structured logging of domain events.

use lifechat_core::event::{DomainEvent, EventBus};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Log every event published on `bus` until the bus is dropped.
///
/// The task resolves to the number of events it logged.
pub fn spawn_activity_log(bus: &EventBus) -> JoinHandle<usize> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        let mut logged = 0;
        loop {
            match rx.recv().await {
                Ok(event) => {
                    log_event(&event);
                    logged += 1;
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Activity log fell behind, events dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
        logged
    })
}

fn log_event(event: &DomainEvent) {
    match event {
        DomainEvent::TurnStarted { message_preview, .. } => {
            debug!(preview = %message_preview, "turn started");
        }
        DomainEvent::ToolExecuted {
            tool_name,
            success,
            duration_ms,
            ..
        } => {
            info!(tool = %tool_name, success, duration_ms, "tool executed");
        }
        DomainEvent::TurnCompleted { events, feelings, .. } => {
            info!(events, feelings, "turn completed");
        }
        DomainEvent::TurnFailed { reason, .. } => {
            warn!(reason = %reason, "turn failed");
        }
        DomainEvent::RecordsStored { count, .. } => {
            debug!(count, "records stored");
        }
    }
}
