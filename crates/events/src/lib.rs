#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Event system for async communication in refcheck
//!
//! Library crates report what they are doing by emitting domain events into
//! an unbounded channel. The CLI owns the receiving end and turns events into
//! structured log records or user output.
//!
//! ## Architecture
//!
//! - **Domain-driven events**: events grouped by functional domain (index, upload)
//! - **Unified `EventEmitter` trait**: single, consistent API for all event emissions
//! - **Metadata envelope**: every event travels with an [`EventMeta`] carrying
//!   an id, timestamp, level, source and optional correlation id

pub mod meta;
pub use meta::{EventLevel, EventMeta, EventSource};

pub mod events;
pub use events::{AppEvent, FailureContext, IndexEvent, UploadEvent};

use tokio::sync::mpsc::UnboundedSender;

/// An event together with its metadata envelope
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EventMessage {
    pub meta: EventMeta,
    pub event: AppEvent,
}

impl EventMessage {
    /// Wrap an event with metadata derived from the event itself
    #[must_use]
    pub fn new(event: AppEvent) -> Self {
        let meta = EventMeta::new(event.log_level(), event.event_source());
        Self { meta, event }
    }

    /// Wrap an event and tag it with a correlation id
    #[must_use]
    pub fn correlated(event: AppEvent, correlation_id: impl Into<String>) -> Self {
        let mut message = Self::new(event);
        message.meta = message.meta.with_correlation_id(correlation_id);
        message
    }
}

/// Type alias for event sender
pub type EventSender = UnboundedSender<EventMessage>;

/// Type alias for event receiver
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<EventMessage>;

/// Create a new event channel
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// The unified trait for emitting events throughout refcheck
///
/// Implementors only say where their sender lives; a missing sender turns
/// every emission into a no-op so libraries can run without a listener.
pub trait EventEmitter {
    /// Get the event sender for this emitter
    fn event_sender(&self) -> Option<&EventSender>;

    /// Emit a fully-formed message
    fn emit_message(&self, message: EventMessage) {
        if let Some(sender) = self.event_sender() {
            // Ignore send errors - if receiver is dropped, we just continue
            let _ = sender.send(message);
        }
    }

    /// Emit an event through this emitter
    fn emit(&self, event: AppEvent) {
        self.emit_message(EventMessage::new(event));
    }

    /// Emit an event tagged with a correlation id (e.g. an upload id)
    fn emit_correlated(&self, event: AppEvent, correlation_id: impl Into<String>) {
        self.emit_message(EventMessage::correlated(event, correlation_id));
    }
}

/// Implementation of `EventEmitter` for the raw `EventSender`
impl EventEmitter for EventSender {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(self)
    }
}

/// Implementation for an optional sender, the common shape inside library structs
impl EventEmitter for Option<EventSender> {
    fn event_sender(&self) -> Option<&EventSender> {
        self.as_ref()
    }
}
