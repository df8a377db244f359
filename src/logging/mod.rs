//! Logging bootstrap built on `tracing`.
//!
//! A [`LoggingConfigurator`] owns a small logger tree (dotted names derived from event
//! targets) with handlers attached to the root or to individual loggers. It becomes
//! active through the [`RoutingLayer`] it hands out:
//!
//! ```no_run
//! use locker::logging::{LoggingConfigurator, LoggingOptions};
//!
//! # fn main() -> locker::error::LoggingResult<()> {
//! let logging = LoggingConfigurator::new();
//! logging.install()?;
//! logging.configure(LoggingOptions::new("nav").json_file(true))?;
//!
//! tracing::info!(target: "nav.module", "ready");
//! # Ok(())
//! # }
//! ```

use std::{
    any::Any,
    backtrace::Backtrace,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Once},
};

use parking_lot::Mutex;
use tracing::{debug, error, trace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    configuration::ResolvableConfigurationWithContext,
    error::{LoggingError, LoggingResult},
};

mod console;
mod format;
mod handler;
mod layer;
mod level;
mod options;
mod record;
mod rotation;
mod state;

pub use console::Console;
pub use format::{format_console, format_json, format_text};
pub use handler::{FileHandle, HandlerInfo, HandlerKind};
pub use layer::RoutingLayer;
pub use level::LogLevel;
pub use options::{
    default_log_root,
    log_dir_for,
    EnvOverrides,
    LoggingOptions,
    ResolvedLoggingOptions,
    WatchOptions,
};
pub use record::{normalize_logger_name, LogRecord};
pub use rotation::TimedRotatingFile;

use self::{handler::Handler, state::LoggingState};


fn create_directory(directory: &Path) -> LoggingResult<PathBuf> {
    fs::create_dir_all(directory).map_err(|error| LoggingError::io(directory, error))?;
    dunce::canonicalize(directory).map_err(|error| LoggingError::io(directory, error))
}

fn open_file(path: &Path, date_prefix: bool, retention_days: u32) -> LoggingResult<FileHandle> {
    FileHandle::open(path, date_prefix, retention_days).map_err(|error| LoggingError::io(path, error))
}


/// Handle to a logging setup. Clones share the same state.
#[derive(Clone, Default)]
pub struct LoggingConfigurator {
    state: Arc<Mutex<LoggingState>>,
    console_override: Option<Console>,
}

impl LoggingConfigurator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `console` instead of stderr when console output is enabled.
    pub fn with_console(mut self, console: Console) -> Self {
        self.console_override = Some(console);
        self
    }

    /// A layer that routes events through this configurator, for composing
    /// your own subscriber or for scoped use with `tracing::subscriber::with_default`.
    pub fn layer(&self) -> RoutingLayer {
        RoutingLayer::new(self.state.clone())
    }

    /// Installs a registry with this configurator's layer as the global default subscriber.
    pub fn install(&self) -> LoggingResult<()> {
        tracing_subscriber::registry()
            .with(self.layer())
            .try_init()
            .map_err(|error| LoggingError::Install(error.to_string()))
    }

    pub fn is_configured(&self) -> bool {
        self.state.lock().configured
    }

    /// [`configure_with_env`](Self::configure_with_env) against the process environment.
    pub fn configure(&self, options: LoggingOptions) -> LoggingResult<()> {
        self.configure_with_env(options, EnvOverrides::from_process())
    }

    /// Attaches the console and file handlers to the root logger.
    ///
    /// Does nothing once configured; call [`reset`](Self::reset) to start over.
    pub fn configure_with_env(
        &self,
        options: LoggingOptions,
        environment: EnvOverrides,
    ) -> LoggingResult<()> {
        if self.is_configured() {
            trace!("Logging is already configured, ignoring configure call.");
            return Ok(());
        }

        let options = options.resolve(environment)?;

        let log_dir = match options.log_dir.as_deref() {
            Some(log_dir) if options.wants_files() => Some(create_directory(log_dir)?),
            other => other.map(Path::to_path_buf),
        };

        let mut handlers = Vec::with_capacity(3);
        let mut console = None;

        if options.console {
            let stream = self.console_override.clone().unwrap_or_else(Console::stderr);
            handlers.push(Handler::console(stream.clone(), options.level));
            console = Some(stream);
        }

        if let (Some(project), Some(log_dir)) = (options.project.as_ref(), log_dir.as_ref()) {
            if options.log_file {
                let file = open_file(
                    &log_dir.join(format!("{project}.log")),
                    options.date_prefix_files,
                    options.retention_days,
                )?;
                handlers.push(Handler::text_file(file, options.level, Some(project.clone())));
            }

            if options.json_file {
                let file = open_file(
                    &log_dir.join(format!("{project}.jsonl")),
                    options.date_prefix_files,
                    options.retention_days,
                )?;
                handlers.push(Handler::json_file(file, options.level, Some(project.clone())));
            }
        }

        {
            let mut state = self.state.lock();
            if state.configured {
                return Ok(());
            }

            state.root_level = options.level;
            for handler in handlers {
                let already_attached = state
                    .root_handlers
                    .iter()
                    .any(|existing| existing.kind() == handler.kind());

                if !already_attached {
                    state.root_handlers.push(handler);
                }
            }

            state.project = options.project.clone();
            state.log_dir = log_dir.clone();
            state.console = console;
            state.configured = true;
        }

        if options.panic_hook {
            install_panic_hook(options.panic_backtrace);
        }

        debug!(
            project = options.project.as_deref().unwrap_or("-"),
            level = %options.level,
            log_dir = %log_dir.as_deref().map(|dir| dir.display().to_string()).unwrap_or_default(),
            console = options.console,
            log_file = options.log_file,
            json_file = options.json_file,
            "Logging configured."
        );

        Ok(())
    }

    /// [`watch_with_env`](Self::watch_with_env) against the process environment.
    pub fn watch(
        &self,
        project: &str,
        module: &str,
        level: LogLevel,
        options: WatchOptions,
    ) -> LoggingResult<PathBuf> {
        self.watch_with_env(project, module, level, options, &EnvOverrides::from_process())
    }

    /// Attaches a dedicated rotating text file to the logger `module`.
    ///
    /// The file lives at `<base>/<module segments>/<project>.<module>.log`, where `<base>` is
    /// the explicit base directory, else `LOG_DIR`, else the default log root. Root handlers
    /// are left alone and records still propagate to them. Watching the same file twice
    /// is a no-op. Returns the path of the live file.
    pub fn watch_with_env(
        &self,
        project: &str,
        module: &str,
        level: LogLevel,
        options: WatchOptions,
        environment: &EnvOverrides,
    ) -> LoggingResult<PathBuf> {
        let module = normalize_logger_name(module);
        let base_dir = match options.base_dir.as_deref() {
            Some(base_dir) if !base_dir.as_os_str().is_empty() => base_dir.to_path_buf(),
            _ => environment.log_dir_for(project, None),
        };

        let module_dir = module
            .split('.')
            .filter(|segment| !segment.is_empty())
            .fold(base_dir, |directory, segment| directory.join(segment));
        let module_dir = create_directory(&module_dir)?;

        let file_path = module_dir.join(format!("{project}.{module}.log"));

        let already_watched = {
            let state = self.state.lock();
            state.loggers.get(&module).is_some_and(|node| {
                node.handlers.iter().any(|handler| {
                    handler.file().map(FileHandle::path).as_deref() == Some(file_path.as_path())
                })
            })
        };

        if already_watched {
            trace!(module = %module, path = %file_path.display(), "Module is already watched.");
            return Ok(file_path);
        }

        let file = open_file(&file_path, options.date_prefix_files, options.retention_days)?;

        {
            let mut state = self.state.lock();
            let node = state.logger_mut(&module);
            node.handlers.push(Handler::watch(file, level, project.to_string()));
            node.level = Some(level);
        }

        debug!(module = %module, path = %file_path.display(), "Watching module.");

        Ok(file_path)
    }

    /// Effective log directory for `project`, see [`EnvOverrides::log_dir_for`].
    pub fn log_dir_for(project: &str, base_dir: Option<&Path>) -> PathBuf {
        log_dir_for(project, base_dir)
    }

    /// The console handle, if console output was enabled by `configure`.
    pub fn console(&self) -> Option<Console> {
        self.state.lock().console.clone()
    }

    pub fn project(&self) -> Option<String> {
        self.state.lock().project.clone()
    }

    pub fn log_dir(&self) -> Option<PathBuf> {
        self.state.lock().log_dir.clone()
    }

    pub fn root_level(&self) -> LogLevel {
        self.state.lock().root_level
    }

    /// The level set directly on `logger`, if any.
    pub fn logger_level(&self, logger: &str) -> Option<LogLevel> {
        self.state
            .lock()
            .loggers
            .get(&normalize_logger_name(logger))
            .and_then(|node| node.level)
    }

    pub fn root_handlers(&self) -> Vec<HandlerInfo> {
        self.state.lock().root_handlers.iter().map(Handler::info).collect()
    }

    pub fn logger_handlers(&self, logger: &str) -> Vec<HandlerInfo> {
        self.state
            .lock()
            .loggers
            .get(&normalize_logger_name(logger))
            .map(|node| node.handlers.iter().map(Handler::info).collect())
            .unwrap_or_default()
    }

    /// The rotating file behind the root handler of `kind`.
    pub fn file_handle(&self, kind: HandlerKind) -> Option<FileHandle> {
        self.state
            .lock()
            .root_handlers
            .iter()
            .find(|handler| handler.kind() == kind)
            .and_then(|handler| handler.file().cloned())
    }

    /// The rotating files attached to `logger` by `watch`.
    pub fn watch_handles(&self, logger: &str) -> Vec<FileHandle> {
        self.state
            .lock()
            .loggers
            .get(&normalize_logger_name(logger))
            .map(|node| node.handlers.iter().filter_map(Handler::file).cloned().collect())
            .unwrap_or_default()
    }

    /// Detaches every handler and returns to the unconfigured state.
    pub fn reset(&self) {
        *self.state.lock() = LoggingState::default();
    }
}


fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}

/// Renders panics through miette (with `fancy_errors`) and logs them on target `panic`.
/// Installed at most once per process.
fn install_panic_hook(capture_backtrace: bool) {
    static PANIC_HOOK: Once = Once::new();

    PANIC_HOOK.call_once(|| {
        #[cfg(feature = "fancy_errors")]
        miette::set_panic_hook();

        let previous_hook = std::panic::take_hook();

        std::panic::set_hook(Box::new(move |info| {
            let message = panic_message(info.payload());
            let location = info
                .location()
                .map(|location| format!("{}:{}", location.file(), location.line()))
                .unwrap_or_default();

            if capture_backtrace {
                let backtrace = Backtrace::force_capture();
                error!(target: "panic", location = %location, backtrace = %backtrace, "Panicked: {message}");
            } else {
                error!(target: "panic", location = %location, "Panicked: {message}");
            }

            previous_hook(info);
        }));
    });
}


#[cfg(test)]
mod tests {
    use tracing_subscriber::prelude::*;

    use super::*;

    fn quiet_options(project: &str, base_dir: &Path) -> LoggingOptions {
        LoggingOptions::new(project)
            .base_dir(base_dir)
            .console(false)
            .panic_hook(false)
    }

    #[test]
    fn configure_is_idempotent() {
        let directory = tempfile::tempdir().unwrap();
        let logging = LoggingConfigurator::new();

        logging
            .configure_with_env(quiet_options("nav", directory.path()), EnvOverrides::empty())
            .unwrap();
        logging
            .configure_with_env(
                quiet_options("other", directory.path()).json_file(true).console(true),
                EnvOverrides::empty(),
            )
            .unwrap();

        let handlers = logging.root_handlers();
        assert_eq!(handlers.len(), 1);
        assert_eq!(handlers[0].kind, HandlerKind::TextFile);
        assert_eq!(logging.project().as_deref(), Some("nav"));
        assert!(logging.console().is_none());
    }

    #[test]
    fn console_only_without_a_project() {
        let logging = LoggingConfigurator::new().with_console(Console::buffer());

        logging
            .configure_with_env(
                LoggingOptions::default().json_file(true).panic_hook(false),
                EnvOverrides::empty(),
            )
            .unwrap();

        let kinds = logging
            .root_handlers()
            .into_iter()
            .map(|handler| handler.kind)
            .collect::<Vec<_>>();

        assert_eq!(kinds, vec![HandlerKind::Console]);
        assert_eq!(logging.log_dir(), None);
        assert!(logging.console().is_some());
    }

    #[test]
    fn records_reach_the_console_at_or_above_the_level() {
        let console = Console::buffer();
        let logging = LoggingConfigurator::new().with_console(console.clone());

        logging
            .configure_with_env(
                LoggingOptions::default().level(LogLevel::Info).panic_hook(false),
                EnvOverrides::empty(),
            )
            .unwrap();

        let subscriber = tracing_subscriber::registry().with(logging.layer());
        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!(target: "nav", "hidden");
            tracing::info!(target: "nav::module", "shown");
        });

        let output = console.contents().unwrap();
        assert!(!output.contains("hidden"));
        assert!(output.contains("INFO  nav.module: shown"), "{output}");
        assert!(logging.console().unwrap().same_as(&console));
    }

    #[test]
    fn reset_returns_to_unconfigured() {
        let logging = LoggingConfigurator::new().with_console(Console::buffer());
        logging
            .configure_with_env(LoggingOptions::default().panic_hook(false), EnvOverrides::empty())
            .unwrap();
        assert!(logging.is_configured());

        logging.reset();
        assert!(!logging.is_configured());
        assert!(logging.root_handlers().is_empty());
        assert_eq!(logging.root_level(), LogLevel::Warn);
    }

    #[test]
    fn watch_sets_the_logger_level_once() {
        let directory = tempfile::tempdir().unwrap();
        let logging = LoggingConfigurator::new();
        let options = WatchOptions::default().base_dir(directory.path());

        let first = logging
            .watch_with_env("nav", "nav.module", LogLevel::Debug, options.clone(), &EnvOverrides::empty())
            .unwrap();
        let second = logging
            .watch_with_env("nav", "nav::module", LogLevel::Debug, options, &EnvOverrides::empty())
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(logging.logger_handlers("nav.module").len(), 1);
        assert_eq!(logging.logger_level("nav.module"), Some(LogLevel::Debug));
        assert!(logging.root_handlers().is_empty());
    }

    #[test]
    fn panic_payloads_become_messages() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42_u8), "Box<dyn Any>");
    }
}
