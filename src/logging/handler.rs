use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::{Map, Value};

use super::{
    console::Console,
    format::{format_console, format_json, format_text, UNKNOWN_PROJECT},
    level::LogLevel,
    record::LogRecord,
    rotation::TimedRotatingFile,
};


/// What a handler writes and where.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    Console,
    TextFile,
    JsonFile,
    /// A text file attached to a single logger by `watch`.
    Watch,
}


/// Shared handle to a rotating file owned by a handler.
#[derive(Clone, Debug)]
pub struct FileHandle {
    file: Arc<Mutex<TimedRotatingFile>>,
}

impl FileHandle {
    pub(crate) fn open(path: &Path, date_prefix: bool, retention_days: u32) -> io::Result<Self> {
        Ok(Self {
            file: Arc::new(Mutex::new(TimedRotatingFile::open(
                path,
                date_prefix,
                retention_days,
            )?)),
        })
    }

    pub fn path(&self) -> PathBuf {
        self.file.lock().path().to_path_buf()
    }

    pub fn rollover_at(&self) -> DateTime<Utc> {
        self.file.lock().rollover_at()
    }

    /// Archives the live file now instead of at the next midnight.
    pub fn force_rollover(&self) -> io::Result<PathBuf> {
        self.file.lock().force_rollover()
    }

    pub fn archives(&self) -> io::Result<Vec<PathBuf>> {
        self.file.lock().archives()
    }

    fn write_line(&self, line: &str) -> io::Result<()> {
        self.file.lock().write_line(line)
    }
}


#[derive(Clone, Debug)]
enum Sink {
    Console(Console),
    Text(FileHandle),
    Json(FileHandle),
}


/// A level-filtered output attached to a logger.
#[derive(Clone, Debug)]
pub(crate) struct Handler {
    kind: HandlerKind,
    level: LogLevel,
    project: Option<String>,
    sink: Sink,
}

impl Handler {
    pub fn console(console: Console, level: LogLevel) -> Self {
        Self {
            kind: HandlerKind::Console,
            level,
            project: None,
            sink: Sink::Console(console),
        }
    }

    pub fn text_file(file: FileHandle, level: LogLevel, project: Option<String>) -> Self {
        Self {
            kind: HandlerKind::TextFile,
            level,
            project,
            sink: Sink::Text(file),
        }
    }

    pub fn json_file(file: FileHandle, level: LogLevel, project: Option<String>) -> Self {
        Self {
            kind: HandlerKind::JsonFile,
            level,
            project,
            sink: Sink::Json(file),
        }
    }

    pub fn watch(file: FileHandle, level: LogLevel, project: String) -> Self {
        Self {
            kind: HandlerKind::Watch,
            level,
            project: Some(project),
            sink: Sink::Text(file),
        }
    }

    pub fn kind(&self) -> HandlerKind {
        self.kind
    }

    pub fn accepts(&self, level: LogLevel) -> bool {
        level >= self.level
    }

    pub fn file(&self) -> Option<&FileHandle> {
        match &self.sink {
            Sink::Text(file) | Sink::Json(file) => Some(file),
            Sink::Console(_) => None,
        }
    }

    pub fn info(&self) -> HandlerInfo {
        HandlerInfo {
            kind: self.kind,
            level: self.level,
            path: self.file().map(FileHandle::path),
        }
    }

    pub fn emit(&self, record: &LogRecord) -> io::Result<()> {
        match &self.sink {
            Sink::Console(console) => {
                console.write_line(&format_console(record, console.is_colored()))
            }
            Sink::Text(file) => file.write_line(&format_text(record, self.project.as_deref())),
            Sink::Json(file) => {
                let mut static_fields = Map::with_capacity(1);
                static_fields.insert(
                    "project".to_string(),
                    Value::from(self.project.as_deref().unwrap_or(UNKNOWN_PROJECT)),
                );

                file.write_line(&format_json(record, &static_fields))
            }
        }
    }
}


/// Read-only description of an attached handler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandlerInfo {
    pub kind: HandlerKind,
    pub level: LogLevel,
    pub path: Option<PathBuf>,
}
