//! Event hooks for stage lifecycle and streamed tokens.
//!
//! Entirely optional: the pipeline works without a handler. Front ends
//! implement [`EventHandler`] to drive progress displays or print
//! recommendation tokens as they stream in.

use std::sync::Arc;

/// Events emitted during a pipeline run.
#[derive(Debug, Clone)]
pub enum Event {
    /// A stage has started.
    StageStart {
        /// Stage name (`"search"` or `"recommend"`).
        stage: String,
    },
    /// A token was received during a streaming call.
    Token {
        /// Stage producing the token.
        stage: String,
        /// The token text.
        chunk: String,
    },
    /// The search reply has been parsed.
    ResultsParsed {
        /// Records kept (the placeholder counts as one).
        records: usize,
        /// Records dropped by the parser (overwritten or missing a title).
        dropped: usize,
    },
    /// A stage has finished.
    StageEnd {
        /// Stage name.
        stage: String,
        /// Whether it succeeded.
        ok: bool,
    },
}

/// Handler for pipeline events.
///
/// # Example
///
/// ```
/// use product_recommender::events::{Event, EventHandler};
///
/// struct PrintTokens;
///
/// impl EventHandler for PrintTokens {
///     fn on_event(&self, event: Event) {
///         if let Event::Token { chunk, .. } = event {
///             print!("{}", chunk);
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
pub struct FnEventHandler<F: Fn(Event) + Send + Sync>(pub F);

impl<F: Fn(Event) + Send + Sync> EventHandler for FnEventHandler<F> {
    fn on_event(&self, event: Event) {
        (self.0)(event);
    }
}
