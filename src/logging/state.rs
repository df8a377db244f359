use std::{collections::HashMap, path::PathBuf};

use super::{console::Console, handler::Handler, level::LogLevel};


/// Level of the root logger until `configure` sets one.
pub(crate) const DEFAULT_ROOT_LEVEL: LogLevel = LogLevel::Warn;


#[derive(Debug, Default)]
pub(crate) struct LoggerNode {
    pub level: Option<LogLevel>,
    pub handlers: Vec<Handler>,
}


/// Everything the routing layer consults: the logger tree and the bootstrap bookkeeping.
#[derive(Debug)]
pub(crate) struct LoggingState {
    pub configured: bool,
    pub project: Option<String>,
    pub log_dir: Option<PathBuf>,
    pub root_level: LogLevel,
    pub root_handlers: Vec<Handler>,
    pub loggers: HashMap<String, LoggerNode>,
    pub console: Option<Console>,
}

impl Default for LoggingState {
    fn default() -> Self {
        Self {
            configured: false,
            project: None,
            log_dir: None,
            root_level: DEFAULT_ROOT_LEVEL,
            root_handlers: Vec::new(),
            loggers: HashMap::new(),
            console: None,
        }
    }
}


/// `a.b.c`, `a.b`, `a`: the logger itself followed by its ancestors.
fn lineage(logger: &str) -> impl Iterator<Item = &str> {
    let mut remaining = Some(logger).filter(|logger| !logger.is_empty());

    std::iter::from_fn(move || {
        let current = remaining?;
        remaining = current.rfind('.').map(|index| &current[..index]);
        Some(current)
    })
}


impl LoggingState {
    /// Level of the nearest logger in the lineage that has one, else the root level.
    pub fn effective_level(&self, logger: &str) -> LogLevel {
        lineage(logger)
            .find_map(|name| self.loggers.get(name).and_then(|node| node.level))
            .unwrap_or(self.root_level)
    }

    pub fn is_enabled(&self, logger: &str, level: LogLevel) -> bool {
        level >= self.effective_level(logger)
    }

    /// Handlers that should receive a `level` record from `logger`:
    /// those on the logger and its ancestors, then the root handlers.
    pub fn route(&self, logger: &str, level: LogLevel) -> Vec<Handler> {
        if !self.is_enabled(logger, level) {
            return Vec::new();
        }

        lineage(logger)
            .filter_map(|name| self.loggers.get(name))
            .flat_map(|node| node.handlers.iter())
            .chain(self.root_handlers.iter())
            .filter(|handler| handler.accepts(level))
            .cloned()
            .collect()
    }

    pub fn logger_mut(&mut self, logger: &str) -> &mut LoggerNode {
        self.loggers.entry(logger.to_string()).or_default()
    }
}
