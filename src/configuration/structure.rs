use std::fs;
use std::path::{Path, PathBuf};

use miette::{Context, IntoDiagnostic, Report, Result};
use serde::Deserialize;
use tracing::debug;

pub use self::base_paths::BasePathsConfiguration;
use self::base_paths::UnresolvedBasePathsConfiguration;
pub use self::logging::LoggingConfiguration;
use self::logging::UnresolvedLoggingConfiguration;
use super::traits::{ResolvableConfiguration, ResolvableConfigurationWithContext};
use super::utilities::get_default_configuration_file_path;

mod base_paths;
mod logging;



#[derive(Deserialize, Debug, Default)]
pub(crate) struct UnresolvedConfiguration {
    /// Base paths.
    #[serde(default)]
    base_paths: UnresolvedBasePathsConfiguration,

    /// Logging-related configuration.
    #[serde(default)]
    logging: UnresolvedLoggingConfiguration,
}


/// The entire configuration.
#[derive(Debug, Clone)]
pub struct Configuration {
    /// This is the file path this `Config` instance was loaded from,
    /// or `None` if the defaults were used.
    pub file_path: Option<PathBuf>,

    /// Base paths
    pub base_paths: BasePathsConfiguration,

    /// Logging-related configuration.
    pub logging: LoggingConfiguration,
}


impl ResolvableConfigurationWithContext for UnresolvedConfiguration {
    type Resolved = Configuration;
    type Context = Option<PathBuf>;
    type Error = Report;

    fn resolve(self, context: Self::Context) -> Result<Self::Resolved> {
        let base_paths = self
            .base_paths
            .resolve()
            .wrap_err("Failed to resolve base_paths table.")?;

        let logging = self
            .logging
            .resolve(base_paths.clone())
            .wrap_err("Failed to resolve logging table.")?;


        Ok(Configuration {
            base_paths,
            file_path: context,
            logging,
        })
    }
}


impl Configuration {
    /// Load the configuration from a specific file path.
    pub fn load_from_path<S: AsRef<Path>>(configuration_file_path: S) -> Result<Self> {
        // Read the configuration file into memory.
        let configuration_string = fs::read_to_string(configuration_file_path.as_ref())
            .into_diagnostic()
            .wrap_err("Could not read configuration file!")?;


        // Parse the string into the `UnresolvedConfiguration` structure and then resolve it.
        let unresolved_configuration =
            toml::from_str::<UnresolvedConfiguration>(&configuration_string)
                .into_diagnostic()
                .wrap_err("Could not load configuration file!")?;


        let configuration_file_path = dunce::canonicalize(configuration_file_path)
            .into_diagnostic()
            .wrap_err("Could not canonicalize configuration file path!")?;

        let resolved_configuration = unresolved_configuration
            .resolve(Some(configuration_file_path))
            .wrap_err("Failed to resolve configuration.")?;

        Ok(resolved_configuration)
    }

    /// Load the configuration from the default path (`~/utilities/locker.toml`),
    /// falling back to the built-in defaults if that file does not exist.
    pub fn load_from_default_path() -> Result<Configuration> {
        let default_path = get_default_configuration_file_path();

        if default_path.is_file() {
            return Configuration::load_from_path(default_path);
        }

        debug!(
            path = %default_path.display(),
            "No configuration file at default path, using defaults."
        );

        Configuration::defaults()
    }

    /// Reads only `[base_paths] base_data_directory_path` from a settings file, without
    /// creating or canonicalizing anything.
    ///
    /// Returns `Ok(None)` when the file does not exist or leaves the key unset.
    pub fn configured_base_data_directory<S: AsRef<Path>>(
        configuration_file_path: S,
    ) -> Result<Option<PathBuf>> {
        let configuration_file_path = configuration_file_path.as_ref();
        if !configuration_file_path.is_file() {
            return Ok(None);
        }

        let configuration_string = fs::read_to_string(configuration_file_path)
            .into_diagnostic()
            .wrap_err("Could not read configuration file!")?;

        let unresolved_configuration =
            toml::from_str::<UnresolvedConfiguration>(&configuration_string)
                .into_diagnostic()
                .wrap_err("Could not load configuration file!")?;

        Ok(unresolved_configuration
            .base_paths
            .base_data_directory_path
            .map(PathBuf::from))
    }

    /// The configuration an empty settings file would produce.
    pub fn defaults() -> Result<Configuration> {
        UnresolvedConfiguration::default()
            .resolve(None)
            .wrap_err("Failed to resolve default configuration.")
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_tables_from_a_file() {
        let directory = tempfile::tempdir().unwrap();
        let base_directory = directory.path().join("utilities");
        let settings_path = directory.path().join("locker.toml");

        fs::write(
            &settings_path,
            format!(
                "[base_paths]\nbase_data_directory_path = {:?}\n\n\
                 [logging]\nproject = \"nav\"\nlevel = \"debug\"\njson_file = true\n",
                base_directory.to_string_lossy()
            ),
        )
        .unwrap();

        let configuration = Configuration::load_from_path(&settings_path).unwrap();
        let base_directory = dunce::canonicalize(base_directory).unwrap();

        assert_eq!(configuration.file_path, Some(dunce::canonicalize(&settings_path).unwrap()));
        assert_eq!(configuration.base_paths.base_data_directory_path, base_directory);
        assert_eq!(configuration.logging.project.as_deref(), Some("nav"));
        assert!(configuration.logging.json_file);
        assert_eq!(
            configuration.logging.log_file_output_directory,
            Some(base_directory.join("logs").join("nav"))
        );
    }

    #[test]
    fn base_directory_is_read_without_resolving() {
        let directory = tempfile::tempdir().unwrap();
        let settings_path = directory.path().join("locker.toml");
        let base_directory = directory.path().join("not-created-yet");

        assert_eq!(Configuration::configured_base_data_directory(&settings_path).unwrap(), None);

        fs::write(&settings_path, "[logging]
project = \"nav\"\n").unwrap();
        assert_eq!(Configuration::configured_base_data_directory(&settings_path).unwrap(), None);

        fs::write(
            &settings_path,
            format!(
                "[base_paths]\nbase_data_directory_path = {:?}\n",
                base_directory.to_string_lossy()
            ),
        )
        .unwrap();
        assert_eq!(
            Configuration::configured_base_data_directory(&settings_path).unwrap(),
            Some(base_directory.clone())
        );
        assert!(!base_directory.exists());

        fs::write(&settings_path, "[base_paths\n").unwrap();
        assert!(Configuration::configured_base_data_directory(&settings_path).is_err());
    }

    #[test]
    fn missing_and_malformed_files_are_errors() {
        let directory = tempfile::tempdir().unwrap();
        assert!(Configuration::load_from_path(directory.path().join("absent.toml")).is_err());

        let settings_path = directory.path().join("broken.toml");
        fs::write(&settings_path, "[logging\nlevel = ").unwrap();
        assert!(Configuration::load_from_path(&settings_path).is_err());
    }
}
