//! Event hooks for extraction.
//!
//! Provides an optional, non-intrusive way to observe the extractor.
//! Users can implement [`EventHandler`] to receive these events for
//! metrics, auditing, or debugging UIs. Structured logs go through
//! `tracing` regardless.

use std::sync::Arc;

use crate::diagnostics::Recovery;

/// Events emitted during extraction.
#[derive(Debug, Clone)]
pub enum Event {
    /// A directive block was located in the output.
    MarkerLocated {
        /// Byte offset of `Action:`.
        start: usize,
        /// Byte offset just past the closing fence.
        end: usize,
    },
    /// The extractor recovered locally from malformed content.
    Recovered(Recovery),
    /// A batch extraction finished.
    CallsExtracted {
        /// Number of normalized calls.
        count: usize,
        /// Whether the result reports tools as invoked.
        tools_invoked: bool,
    },
    /// A streaming step confirmed new information.
    StreamUpdate {
        /// Whether prose was emitted.
        prose: bool,
        /// Number of newly confirmed calls.
        calls: usize,
        /// Whether the directive array is still open.
        pending: bool,
        /// Whether earlier calls were withdrawn.
        withdrawn: bool,
    },
}

/// Handler for extraction events.
///
/// ```
/// use llm_toolcall::events::{Event, EventHandler};
///
/// struct PrintHandler;
///
/// impl EventHandler for PrintHandler {
///     fn on_event(&self, event: Event) {
///         if let Event::CallsExtracted { count, .. } = event {
///             println!("{} calls", count);
///         }
///     }
/// }
/// ```
pub trait EventHandler: Send + Sync {
    fn on_event(&self, event: Event);
}

/// Emit an event if a handler is present. No-op otherwise.
pub(crate) fn emit(handler: &Option<Arc<dyn EventHandler>>, event: Event) {
    if let Some(ref h) = handler {
        h.on_event(event);
    }
}

/// An [`EventHandler`] backed by a closure.
///
/// ```
/// use llm_toolcall::events::{Event, FnEventHandler};
/// use std::sync::Arc;
///
/// let handler = Arc::new(FnEventHandler(|event: Event| {
///     if let Event::Recovered(r) = event {
///         eprintln!("recovered: {:?}", r);
///     }
/// }));
/// ```
pub struct FnEventHandler<F: Fn(Event) + Send + Sync>(pub F);

impl<F: Fn(Event) + Send + Sync> EventHandler for FnEventHandler<F> {
    fn on_event(&self, event: Event) {
        (self.0)(event);
    }
}
