use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{subscriber::Interest, Event, Metadata, Subscriber};
use tracing_subscriber::{layer::Context, registry::LookupSpan, Layer};

use super::{
    level::LogLevel,
    record::{normalize_logger_name, LogRecord},
    state::LoggingState,
};


/// `tracing` layer that routes events through the configurator's logger tree.
///
/// Obtained from [`LoggingConfigurator::layer`](super::LoggingConfigurator::layer).
#[derive(Clone)]
pub struct RoutingLayer {
    state: Arc<Mutex<LoggingState>>,
}

impl RoutingLayer {
    pub(crate) fn new(state: Arc<Mutex<LoggingState>>) -> Self {
        Self { state }
    }
}

impl<S> Layer<S> for RoutingLayer
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn register_callsite(&self, _metadata: &'static Metadata<'static>) -> Interest {
        // Levels change at runtime (`configure`, `watch`), so nothing can be cached.
        Interest::sometimes()
    }

    fn enabled(&self, metadata: &Metadata<'_>, _context: Context<'_, S>) -> bool {
        if !metadata.is_event() {
            return true;
        }

        let logger = normalize_logger_name(metadata.target());
        self.state
            .lock()
            .is_enabled(&logger, LogLevel::from(metadata.level()))
    }

    fn on_event(&self, event: &Event<'_>, context: Context<'_, S>) {
        let function = context
            .event_span(event)
            .map(|span| span.name().to_string());
        let record = LogRecord::from_event(event).with_function(function);

        // Handlers are cloned out so that writing happens without the state lock.
        let handlers = self.state.lock().route(&record.logger, record.level);

        for handler in handlers {
            if let Err(error) = handler.emit(&record) {
                eprintln!(
                    "locker: failed to write a {:?} log record: {error}",
                    handler.kind()
                );
            }
        }
    }
}
