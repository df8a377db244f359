use std::path::PathBuf;

use miette::{Context, Report, Result};
use serde::Deserialize;

use super::base_paths::BasePathsConfiguration;
use crate::{
    configuration::{
        traits::ResolvableConfigurationWithContext,
        utilities::replace_placeholders_in_path,
    },
    logging::{LogLevel, LoggingOptions},
};


fn default_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_retention_days() -> u32 {
    14
}


#[derive(Deserialize, Clone, Debug)]
pub(super) struct UnresolvedLoggingConfiguration {
    #[serde(default)]
    project: Option<String>,

    #[serde(default = "default_level")]
    level: String,

    /// May contain the `{BASE_DATA_DIRECTORY}` placeholder.
    /// Defaults to `{BASE_DATA_DIRECTORY}/logs/<project>`.
    #[serde(default)]
    log_file_output_directory: Option<String>,

    #[serde(default = "default_true")]
    console: bool,

    #[serde(default = "default_true")]
    log_file: bool,

    #[serde(default)]
    json_file: bool,

    #[serde(default = "default_retention_days")]
    retention_days: u32,

    #[serde(default = "default_true")]
    panic_hook: bool,

    #[serde(default)]
    panic_backtrace: bool,

    #[serde(default = "default_true")]
    date_prefix_files: bool,
}

impl Default for UnresolvedLoggingConfiguration {
    fn default() -> Self {
        Self {
            project: None,
            level: default_level(),
            log_file_output_directory: None,
            console: true,
            log_file: true,
            json_file: false,
            retention_days: default_retention_days(),
            panic_hook: true,
            panic_backtrace: false,
            date_prefix_files: true,
        }
    }
}


#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfiguration {
    pub project: Option<String>,

    pub level: LogLevel,

    /// `None` when no project is set and no directory was given.
    pub log_file_output_directory: Option<PathBuf>,

    pub console: bool,

    pub log_file: bool,

    pub json_file: bool,

    pub retention_days: u32,

    pub panic_hook: bool,

    pub panic_backtrace: bool,

    pub date_prefix_files: bool,
}

impl ResolvableConfigurationWithContext for UnresolvedLoggingConfiguration {
    type Resolved = LoggingConfiguration;
    type Context = BasePathsConfiguration;
    type Error = Report;

    fn resolve(self, context: Self::Context) -> Result<Self::Resolved> {
        let level = LogLevel::parse(&self.level).wrap_err("Failed to parse field level")?;

        let log_file_output_directory = match (self.log_file_output_directory, &self.project) {
            (Some(directory), _) => Some(replace_placeholders_in_path(
                directory,
                context.placeholders_map(),
            )),
            (None, Some(project)) => Some(context.project_logs_directory(project)),
            (None, None) => None,
        };


        Ok(Self::Resolved {
            project: self.project,
            level,
            log_file_output_directory,
            console: self.console,
            log_file: self.log_file,
            json_file: self.json_file,
            retention_days: self.retention_days,
            panic_hook: self.panic_hook,
            panic_backtrace: self.panic_backtrace,
            date_prefix_files: self.date_prefix_files,
        })
    }
}

impl LoggingConfiguration {
    /// Call-time options equivalent to this table. `project_override` wins over
    /// the configured project.
    pub fn to_logging_options(&self, project_override: Option<&str>) -> LoggingOptions {
        let mut options = LoggingOptions {
            project: project_override
                .map(str::to_string)
                .or_else(|| self.project.clone()),
            level: self.level,
            base_dir: None,
            console: self.console,
            log_file: self.log_file,
            json_file: self.json_file,
            retention_days: self.retention_days,
            panic_hook: self.panic_hook,
            panic_backtrace: self.panic_backtrace,
            date_prefix_files: self.date_prefix_files,
        };

        // A configured directory only applies to the configured project.
        if project_override.is_none() || project_override == self.project.as_deref() {
            options.base_dir = self.log_file_output_directory.clone();
        }

        options
    }
}
