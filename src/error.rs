//! Error types shared by the configuration vault and the logging bootstrap.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;


/// Errors raised while resolving or mutating configuration files.
#[derive(Debug, Error, Diagnostic)]
pub enum VaultError {
    /// A file, section, key or directory entry does not exist.
    #[error("{what} not found in {location}")]
    #[diagnostic(code(locker::vault::not_found))]
    NotFound { what: String, location: String },

    /// An extension or format tag is not `ini`, `json` or a module config.
    #[error("unsupported configuration format: {0}")]
    #[diagnostic(
        code(locker::vault::unsupported_format),
        help("supported formats are .ini, .json and .py module configs")
    )]
    UnsupportedFormat(String),

    /// A top-level write on an INI-backed file.
    #[error("cannot write {key:?} at the top level of INI file {}", path.display())]
    #[diagnostic(
        code(locker::vault::write_not_allowed),
        help("INI files are only writable through a section, e.g. file.section_mut(\"NAME\")?.set(..)")
    )]
    WriteNotAllowed { key: String, path: PathBuf },

    /// The file exists but its contents could not be loaded.
    #[error("malformed configuration source {}: {reason}", path.display())]
    #[diagnostic(code(locker::vault::malformed_source))]
    MalformedSource { path: PathBuf, reason: String },

    /// Any I/O failure other than "not found".
    #[error("I/O error while reading {}", path.display())]
    #[diagnostic(code(locker::vault::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl VaultError {
    pub(crate) fn not_found(what: impl Into<String>, location: impl Into<String>) -> Self {
        Self::NotFound {
            what: what.into(),
            location: location.into(),
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MalformedSource {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Maps an I/O error on `path` to `NotFound` when the file is missing,
    /// and to `Io` otherwise.
    pub(crate) fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();

        if source.kind() == std::io::ErrorKind::NotFound {
            return Self::not_found(
                format!("file {:?}", path.file_name().unwrap_or_default()),
                path.parent()
                    .map(|parent| parent.display().to_string())
                    .unwrap_or_default(),
            );
        }

        Self::Io { path, source }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}


/// Errors raised by the logging bootstrap.
#[derive(Debug, Error, Diagnostic)]
pub enum LoggingError {
    #[error("invalid log level: {0:?}")]
    #[diagnostic(
        code(locker::logging::invalid_level),
        help("expected one of trace, debug, info, warn (warning), error (critical)")
    )]
    InvalidLevel(String),

    #[error("environment variable {variable} has an invalid value: {value:?}")]
    #[diagnostic(code(locker::logging::invalid_environment))]
    InvalidEnvironment { variable: String, value: String },

    #[error("I/O error on log path {}", path.display())]
    #[diagnostic(code(locker::logging::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to install the global tracing subscriber: {0}")]
    #[diagnostic(code(locker::logging::install))]
    Install(String),
}

impl LoggingError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}


pub type VaultResult<T> = std::result::Result<T, VaultError>;
pub type LoggingResult<T> = std::result::Result<T, LoggingError>;
