use std::{
    error::Error,
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::{
    field::{Field, Visit},
    Event,
};

use super::level::LogLevel;


/// Maps a `tracing` target onto a dotted logger name (`a::b` becomes `a.b`).
pub fn normalize_logger_name(target: &str) -> String {
    target.replace("::", ".")
}


/// A single event, captured once and rendered by every handler it is routed to.
#[derive(Clone, Debug)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub logger: String,
    pub message: String,
    /// Structured event fields other than the message, in recording order.
    pub fields: Map<String, Value>,
    /// Display form of an `error` field followed by each of its sources.
    pub error_chain: Option<Vec<String>>,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub module_path: Option<String>,
    /// Name of the innermost span around the event; with `#[instrument]` this is the
    /// function being executed.
    pub function: Option<String>,
    pub process: u32,
    /// Small per-process number, assigned to each thread the first time it logs.
    pub thread: u64,
    pub thread_name: Option<String>,
}

impl LogRecord {
    pub fn from_event(event: &Event<'_>) -> Self {
        let metadata = event.metadata();

        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);

        Self {
            timestamp: Utc::now(),
            level: LogLevel::from(metadata.level()),
            logger: normalize_logger_name(metadata.target()),
            message: visitor.message,
            fields: visitor.fields,
            error_chain: visitor.error_chain,
            file: metadata.file().map(str::to_string),
            line: metadata.line(),
            module_path: metadata.module_path().map(str::to_string),
            function: None,
            process: std::process::id(),
            thread: current_thread_id(),
            thread_name: std::thread::current().name().map(str::to_string),
        }
    }

    pub fn with_function(mut self, function: Option<String>) -> Self {
        self.function = function;
        self
    }
}


fn current_thread_id() -> u64 {
    static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

    thread_local! {
        static THREAD_ID: u64 = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);
    }

    THREAD_ID.with(|id| *id)
}


#[derive(Default)]
struct RecordVisitor {
    message: String,
    fields: Map<String, Value>,
    error_chain: Option<Vec<String>>,
}

impl RecordVisitor {
    fn record_value(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = match value {
                Value::String(message) => message,
                other => other.to_string(),
            };
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for RecordVisitor {
    fn record_f64(&mut self, field: &Field, value: f64) {
        let value = serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(value.to_string()));

        self.record_value(field, value);
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_value(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record_value(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record_value(field, Value::from(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_value(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn Error + 'static)) {
        let mut chain = vec![value.to_string()];

        let mut source = value.source();
        while let Some(cause) = source {
            chain.push(cause.to_string());
            source = cause.source();
        }

        self.record_value(field, Value::from(value.to_string()));

        if field.name() == "error" || self.error_chain.is_none() {
            self.error_chain = Some(chain);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record_value(field, Value::String(format!("{value:?}")));
    }
}
