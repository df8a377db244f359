//! Renders [`LogRecord`]s as text lines, console lines and JSON lines.

use chrono::Local;
use owo_colors::OwoColorize;
use serde_json::{Map, Value};

use super::{level::LogLevel, record::LogRecord};


/// Project value written when a record is not tagged with one.
pub const UNKNOWN_PROJECT: &str = "unknown";


fn field_value(value: &Value) -> String {
    match value {
        Value::String(string) => string.clone(),
        other => other.to_string(),
    }
}

fn push_fields(line: &mut String, fields: &Map<String, Value>) {
    for (key, value) in fields {
        line.push(' ');
        line.push_str(key);
        line.push('=');
        line.push_str(&field_value(value));
    }
}

fn push_error_chain(line: &mut String, record: &LogRecord) {
    let Some(chain) = record.error_chain.as_ref() else {
        return;
    };

    for (depth, message) in chain.iter().enumerate() {
        line.push('\n');
        if depth == 0 {
            line.push_str("  Error: ");
        } else {
            line.push_str("    Caused by: ");
        }
        line.push_str(message);
    }
}


/// `2024-03-01 12:00:00 | INFO     | nav | nav.module:42 - message key=value`,
/// with the local time and the error chain (if any) on the following lines.
pub fn format_text(record: &LogRecord, project: Option<&str>) -> String {
    let mut line = format!(
        "{} | {:<8} | {} | {}:{} - {}",
        record.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
        record.level,
        project.unwrap_or(UNKNOWN_PROJECT),
        record.logger,
        record.line.unwrap_or(0),
        record.message,
    );

    push_fields(&mut line, &record.fields);
    push_error_chain(&mut line, record);

    line
}


fn paint_level(level: LogLevel) -> String {
    let padded = format!("{:<5}", level);

    match level {
        LogLevel::Trace => padded.dimmed().to_string(),
        LogLevel::Debug => padded.blue().to_string(),
        LogLevel::Info => padded.green().to_string(),
        LogLevel::Warn => padded.yellow().to_string(),
        LogLevel::Error => padded.red().bold().to_string(),
    }
}

/// Short console line: `12:00:00 INFO  nav.module: message key=value`.
pub fn format_console(record: &LogRecord, colored: bool) -> String {
    let time = record.timestamp.with_timezone(&Local).format("%H:%M:%S").to_string();

    let mut line = if colored {
        format!(
            "{} {} {}: {}",
            time.dimmed(),
            paint_level(record.level),
            record.logger.bold(),
            record.message
        )
    } else {
        format!(
            "{} {:<5} {}: {}",
            time, record.level, record.logger, record.message
        )
    };

    push_fields(&mut line, &record.fields);
    push_error_chain(&mut line, record);

    line
}


/// One JSON object per record, without a trailing newline.
///
/// `static_fields` (at least `project`) are appended after the per-record keys.
pub fn format_json(record: &LogRecord, static_fields: &Map<String, Value>) -> String {
    let mut object = Map::new();

    object.insert(
        "ts".to_string(),
        Value::from(record.timestamp.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()),
    );
    object.insert("level".to_string(), Value::from(record.level.as_str()));
    object.insert("logger".to_string(), Value::from(record.logger.as_str()));
    object.insert("msg".to_string(), Value::from(record.message.as_str()));
    object.insert(
        "pathname".to_string(),
        record.file.as_deref().map(Value::from).unwrap_or(Value::Null),
    );
    object.insert("lineno".to_string(), record.line.map(Value::from).unwrap_or(Value::Null));
    object.insert(
        "func".to_string(),
        record.function.as_deref().map(Value::from).unwrap_or(Value::Null),
    );
    object.insert("process".to_string(), Value::from(record.process));
    object.insert("thread".to_string(), Value::from(record.thread));
    object.insert(
        "thread_name".to_string(),
        record.thread_name.as_deref().map(Value::from).unwrap_or(Value::Null),
    );

    if let Some(chain) = record.error_chain.as_ref() {
        object.insert("exc_info".to_string(), Value::from(chain.join("\nCaused by: ")));
    }

    if !record.fields.is_empty() {
        object.insert("fields".to_string(), Value::Object(record.fields.clone()));
    }

    for (key, value) in static_fields {
        object.insert(key.clone(), value.clone());
    }

    Value::Object(object).to_string()
}
