//! Named, case-insensitive access to per-user configuration files, and a
//! `tracing`-based logging bootstrap with rotating text and JSON-lines files.
//!
//! - [`vault`]: resolve names against an INI / JSON / module config file or a directory of them.
//! - [`logging`]: [`LoggingConfigurator`] with console, file and per-module outputs.
//! - [`configuration`]: the `locker.toml` settings file and the storage layout.

pub mod configuration;
pub mod error;
pub mod formats;
pub mod logging;
pub mod vault;

pub use error::{LoggingError, VaultError};
pub use logging::{LoggingConfigurator, LoggingOptions};
pub use vault::{Config, Namespace, Vault};
