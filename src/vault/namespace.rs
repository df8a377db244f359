use std::{fs, path::PathBuf};

use serde_json::{Map, Value};
use tracing::info;

use super::{Resolved, Vault};
use crate::{
    configuration::{
        default_base_data_directory,
        get_default_configuration_file_path,
        Configuration,
    },
    error::{VaultError, VaultResult},
    formats::ini::{self, IniSection},
};


/// A type that owns a configured path and resolves names against it.
///
/// ```no_run
/// use std::path::PathBuf;
/// use locker::vault::Namespace;
///
/// struct Locker;
///
/// impl Namespace for Locker {
///     fn path() -> PathBuf {
///         PathBuf::from("/srv/locker")
///     }
/// }
///
/// # fn main() -> locker::error::VaultResult<()> {
/// let environment = Locker::get("settings")?.get("ENV")?;
/// # Ok(())
/// # }
/// ```
pub trait Namespace {
    fn path() -> PathBuf;

    fn vault() -> Vault {
        Vault::new(Self::path())
    }

    fn get(name: &str) -> VaultResult<Resolved> {
        Self::vault().get(name)
    }

    fn raw() -> VaultResult<Map<String, Value>> {
        Self::vault().raw()
    }
}


/// The per-user configuration directory, `<base data directory>/config`.
///
/// The base data directory is the one named by `[base_paths]` in the default
/// `locker.toml`, else the built-in default. A settings file that cannot be read
/// or parsed also falls back to the default; load a [`Configuration`] and use
/// [`Config::vault_for`] to have such errors reported.
pub struct Config;

impl Namespace for Config {
    fn path() -> PathBuf {
        Configuration::configured_base_data_directory(get_default_configuration_file_path())
            .ok()
            .flatten()
            .unwrap_or_else(default_base_data_directory)
            .join("config")
    }
}

impl Config {
    /// The configuration directory of an already loaded settings file.
    pub fn vault_for(configuration: &Configuration) -> Vault {
        Vault::new(&configuration.base_paths.config_directory_path)
    }

    /// Writes `<config>/<project>.ini` from `sections`, unless the file already exists.
    ///
    /// The project name is lower-cased with spaces replaced by underscores.
    /// Returns the path of the (new or existing) file.
    pub fn ensure_initialized(project: &str, sections: &[IniSection]) -> VaultResult<PathBuf> {
        Self::ensure_initialized_in(Self::path(), project, sections)
    }

    pub fn ensure_initialized_in<P>(
        config_directory: P,
        project: &str,
        sections: &[IniSection],
    ) -> VaultResult<PathBuf>
    where
        P: Into<PathBuf>,
    {
        let config_directory = config_directory.into();
        let file_name = format!("{}.ini", project.to_lowercase().replace(' ', "_"));
        let config_path = config_directory.join(file_name);

        if config_path.exists() {
            return Ok(config_path);
        }

        fs::create_dir_all(&config_directory)
            .map_err(|error| VaultError::from_io(&config_directory, error))?;
        fs::write(&config_path, ini::write(sections))
            .map_err(|error| VaultError::from_io(&config_path, error))?;

        info!(path = %config_path.display(), "Initialized project configuration file.");

        Ok(config_path)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn paths_section() -> IniSection {
        let mut section = IniSection::new("PATHS");
        section.entries.push(("CONFIG".to_string(), "/tmp/config".to_string()));
        section
    }

    #[test]
    fn writes_once_and_keeps_existing_files() {
        let directory = tempfile::tempdir().unwrap();

        let path = Config::ensure_initialized_in(directory.path(), "My Project", &[paths_section()]).unwrap();
        assert_eq!(path.file_name().unwrap(), "my_project.ini");
        assert!(fs::read_to_string(&path).unwrap().contains("CONFIG = /tmp/config"));

        fs::write(&path, "[PATHS]\nCONFIG = edited\n").unwrap();
        Config::ensure_initialized_in(directory.path(), "My Project", &[paths_section()]).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("edited"));
    }

    #[test]
    fn vault_follows_the_configured_base_directory() {
        let directory = tempfile::tempdir().unwrap();
        let settings_path = directory.path().join("locker.toml");
        fs::write(
            &settings_path,
            format!(
                "[base_paths]\nbase_data_directory_path = {:?}\n",
                directory.path().join("storage").to_string_lossy()
            ),
        )
        .unwrap();

        let configuration = Configuration::load_from_path(&settings_path).unwrap();
        let vault = Config::vault_for(&configuration);

        assert!(vault.path().starts_with(&configuration.base_paths.base_data_directory_path));
        assert!(vault.path().ends_with("storage/config"));

        Config::ensure_initialized_in(vault.path(), "nav", &[paths_section()]).unwrap();
        assert_eq!(
            vault.get("nav").unwrap().get("PATHS").unwrap().get("config").unwrap().as_str(),
            Some("/tmp/config")
        );
    }

    #[test]
    fn written_file_resolves_through_a_vault() {
        let directory = tempfile::tempdir().unwrap();
        Config::ensure_initialized_in(directory.path(), "test", &[paths_section()]).unwrap();

        let value = Vault::new(directory.path())
            .get("TEST")
            .unwrap()
            .get("paths")
            .unwrap()
            .get("config")
            .unwrap();

        assert_eq!(value.as_str(), Some("/tmp/config"));
    }
}
