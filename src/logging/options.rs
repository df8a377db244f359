//! Call-time logging options and their environment overrides.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use super::level::LogLevel;
use crate::{
    configuration::{default_base_data_directory, ResolvableConfigurationWithContext},
    error::LoggingError,
};


/// Snapshot of the environment variables the logging bootstrap honours.
///
/// Tests build one from an explicit map instead of touching the process environment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    variables: HashMap<String, String>,
}

impl EnvOverrides {
    pub const PROJECT: &'static str = "LOG_PROJECT";
    pub const LEVEL: &'static str = "LOG_LEVEL";
    pub const CONSOLE: &'static str = "LOG_CONSOLE";
    pub const JSON: &'static str = "LOG_JSON";
    pub const RETENTION_DAYS: &'static str = "LOG_RETENTION_DAYS";
    pub const DIRECTORY: &'static str = "LOG_DIR";

    const ALL: [&'static str; 6] = [
        Self::PROJECT,
        Self::LEVEL,
        Self::CONSOLE,
        Self::JSON,
        Self::RETENTION_DAYS,
        Self::DIRECTORY,
    ];

    pub fn empty() -> Self {
        Self::default()
    }

    /// Reads the logging variables from the process environment.
    pub fn from_process() -> Self {
        let variables = Self::ALL
            .iter()
            .filter_map(|name| {
                std::env::var(name)
                    .ok()
                    .map(|value| (name.to_string(), value))
            })
            .collect();

        Self { variables }
    }

    pub fn with<K, V>(mut self, name: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// The value of `name`, treating an empty value as unset.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.variables
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    /// `1`, `true`, `yes` and `on` are true, any other value is false.
    pub fn flag(&self, name: &str, default: bool) -> bool {
        match self.variables.get(name) {
            Some(value) => matches!(
                value.trim().to_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            ),
            None => default,
        }
    }

    /// Effective log directory for `project`:
    /// `LOG_DIR` first, then `base_dir`, then the default per-project directory.
    pub fn log_dir_for(&self, project: &str, base_dir: Option<&Path>) -> PathBuf {
        if let Some(directory) = self.get(Self::DIRECTORY) {
            return PathBuf::from(directory);
        }

        match base_dir {
            Some(base_dir) if !base_dir.as_os_str().is_empty() => base_dir.to_path_buf(),
            _ => default_log_root(project),
        }
    }
}


/// `<base data directory>/logs/<project>`.
pub fn default_log_root(project: &str) -> PathBuf {
    default_base_data_directory().join("logs").join(project)
}

/// [`EnvOverrides::log_dir_for`] against the process environment.
pub fn log_dir_for(project: &str, base_dir: Option<&Path>) -> PathBuf {
    EnvOverrides::from_process().log_dir_for(project, base_dir)
}


/// Options for [`LoggingConfigurator::configure`](super::LoggingConfigurator::configure).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingOptions {
    pub project: Option<String>,
    pub level: LogLevel,
    pub base_dir: Option<PathBuf>,
    pub console: bool,
    pub log_file: bool,
    pub json_file: bool,
    pub retention_days: u32,
    /// Render panics through miette's hook and log them as ERROR records.
    pub panic_hook: bool,
    /// Attach a captured backtrace to logged panics.
    pub panic_backtrace: bool,
    /// Name archives `YYYYMMDD.<base>` instead of `<base>.YYYY-MM-DD`.
    pub date_prefix_files: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            project: None,
            level: LogLevel::Info,
            base_dir: None,
            console: true,
            log_file: true,
            json_file: false,
            retention_days: 14,
            panic_hook: true,
            panic_backtrace: false,
            date_prefix_files: true,
        }
    }
}

impl LoggingOptions {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: Some(project.into()),
            ..Self::default()
        }
    }

    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    pub fn console(mut self, enabled: bool) -> Self {
        self.console = enabled;
        self
    }

    pub fn log_file(mut self, enabled: bool) -> Self {
        self.log_file = enabled;
        self
    }

    pub fn json_file(mut self, enabled: bool) -> Self {
        self.json_file = enabled;
        self
    }

    pub fn retention_days(mut self, days: u32) -> Self {
        self.retention_days = days;
        self
    }

    pub fn panic_hook(mut self, enabled: bool) -> Self {
        self.panic_hook = enabled;
        self
    }

    pub fn panic_backtrace(mut self, enabled: bool) -> Self {
        self.panic_backtrace = enabled;
        self
    }

    pub fn date_prefix_files(mut self, enabled: bool) -> Self {
        self.date_prefix_files = enabled;
        self
    }
}


/// [`LoggingOptions`] after environment overrides have been applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedLoggingOptions {
    pub project: Option<String>,
    pub level: LogLevel,
    /// `None` when no project is known (console-only mode).
    pub log_dir: Option<PathBuf>,
    pub console: bool,
    pub log_file: bool,
    pub json_file: bool,
    pub retention_days: u32,
    pub panic_hook: bool,
    pub panic_backtrace: bool,
    pub date_prefix_files: bool,
}

impl ResolvedLoggingOptions {
    pub fn wants_files(&self) -> bool {
        self.log_file || self.json_file
    }
}

impl ResolvableConfigurationWithContext for LoggingOptions {
    type Context = EnvOverrides;
    type Resolved = ResolvedLoggingOptions;
    type Error = LoggingError;

    fn resolve(self, environment: Self::Context) -> Result<Self::Resolved, Self::Error> {
        let project = environment
            .get(EnvOverrides::PROJECT)
            .map(str::to_string)
            .or(self.project)
            .filter(|project| !project.trim().is_empty());

        let level = match environment.get(EnvOverrides::LEVEL) {
            Some(level) => LogLevel::parse(level)?,
            None => self.level,
        };

        let console = environment.flag(EnvOverrides::CONSOLE, self.console);

        let Some(project) = project else {
            // Without a project there is nothing to name files after.
            return Ok(ResolvedLoggingOptions {
                project: None,
                level,
                log_dir: None,
                console,
                log_file: false,
                json_file: false,
                retention_days: self.retention_days,
                panic_hook: self.panic_hook,
                panic_backtrace: self.panic_backtrace,
                date_prefix_files: self.date_prefix_files,
            });
        };

        let json_file = environment.flag(EnvOverrides::JSON, self.json_file);

        let retention_days = match environment.get(EnvOverrides::RETENTION_DAYS) {
            Some(days) => days.trim().parse::<u32>().map_err(|_| {
                LoggingError::InvalidEnvironment {
                    variable: EnvOverrides::RETENTION_DAYS.to_string(),
                    value: days.to_string(),
                }
            })?,
            None => self.retention_days,
        };

        let log_dir = environment.log_dir_for(&project, self.base_dir.as_deref());

        Ok(ResolvedLoggingOptions {
            project: Some(project),
            level,
            log_dir: Some(log_dir),
            console,
            log_file: self.log_file,
            json_file,
            retention_days,
            panic_hook: self.panic_hook,
            panic_backtrace: self.panic_backtrace,
            date_prefix_files: self.date_prefix_files,
        })
    }
}


/// Options for [`LoggingConfigurator::watch`](super::LoggingConfigurator::watch).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WatchOptions {
    pub base_dir: Option<PathBuf>,
    pub date_prefix_files: bool,
    pub retention_days: u32,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            base_dir: None,
            date_prefix_files: true,
            retention_days: 14,
        }
    }
}

impl WatchOptions {
    pub fn base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    pub fn date_prefix_files(mut self, enabled: bool) -> Self {
        self.date_prefix_files = enabled;
        self
    }

    pub fn retention_days(mut self, days: u32) -> Self {
        self.retention_days = days;
        self
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_options_without_environment() {
        let resolved = LoggingOptions::new("nav")
            .base_dir("/tmp/logs")
            .json_file(true)
            .resolve(EnvOverrides::empty())
            .unwrap();

        assert_eq!(resolved.project.as_deref(), Some("nav"));
        assert_eq!(resolved.log_dir, Some(PathBuf::from("/tmp/logs")));
        assert!(resolved.log_file && resolved.json_file && resolved.console);
        assert_eq!(resolved.retention_days, 14);
    }

    #[test]
    fn environment_takes_precedence() {
        let environment = EnvOverrides::empty()
            .with(EnvOverrides::PROJECT, "envproj")
            .with(EnvOverrides::LEVEL, "WARNING")
            .with(EnvOverrides::DIRECTORY, "/var/log/envproj")
            .with(EnvOverrides::JSON, "1")
            .with(EnvOverrides::CONSOLE, "0")
            .with(EnvOverrides::RETENTION_DAYS, "3");

        let resolved = LoggingOptions::default()
            .base_dir("/ignored")
            .resolve(environment)
            .unwrap();

        assert_eq!(resolved.project.as_deref(), Some("envproj"));
        assert_eq!(resolved.level, LogLevel::Warn);
        assert_eq!(resolved.log_dir, Some(PathBuf::from("/var/log/envproj")));
        assert!(resolved.json_file);
        assert!(!resolved.console);
        assert_eq!(resolved.retention_days, 3);
    }

    #[test]
    fn no_project_means_console_only() {
        let environment = EnvOverrides::empty().with(EnvOverrides::JSON, "yes");

        let resolved = LoggingOptions::default()
            .json_file(true)
            .resolve(environment)
            .unwrap();

        assert_eq!(resolved.project, None);
        assert_eq!(resolved.log_dir, None);
        assert!(!resolved.wants_files());
        assert!(resolved.console);
    }

    #[test]
    fn invalid_environment_values_fail() {
        let bad_level = EnvOverrides::empty().with(EnvOverrides::LEVEL, "chatty");
        assert!(matches!(
            LoggingOptions::new("nav").resolve(bad_level),
            Err(LoggingError::InvalidLevel(_))
        ));

        let bad_days = EnvOverrides::empty().with(EnvOverrides::RETENTION_DAYS, "two");
        assert!(matches!(
            LoggingOptions::new("nav").resolve(bad_days),
            Err(LoggingError::InvalidEnvironment { .. })
        ));
    }

    #[test]
    fn log_dir_precedence() {
        let environment = EnvOverrides::empty();
        assert_eq!(
            environment.log_dir_for("nav", Some(Path::new("/explicit"))),
            PathBuf::from("/explicit")
        );
        assert!(environment.log_dir_for("nav", None).ends_with("logs/nav"));

        let environment = environment.with(EnvOverrides::DIRECTORY, "/from/env");
        assert_eq!(
            environment.log_dir_for("nav", Some(Path::new("/explicit"))),
            PathBuf::from("/from/env")
        );
    }
}
