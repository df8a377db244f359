use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use miette::{miette, Context, IntoDiagnostic, Report, Result};
use serde::Deserialize;

use crate::configuration::{
    traits::ResolvableConfiguration,
    utilities::default_base_data_directory,
};


#[derive(Deserialize, Debug, Default)]
pub(super) struct UnresolvedBasePathsConfiguration {
    #[serde(default)]
    pub(crate) base_data_directory_path: Option<String>,
}

/// The storage layout: a base directory with `config/`, `logs/` and `specific/` inside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasePathsConfiguration {
    pub base_data_directory_path: PathBuf,

    pub config_directory_path: PathBuf,

    pub logs_directory_path: PathBuf,

    pub specific_directory_path: PathBuf,
}

impl ResolvableConfiguration for UnresolvedBasePathsConfiguration {
    type Resolved = BasePathsConfiguration;
    type Error = Report;

    fn resolve(self) -> Result<Self::Resolved> {
        let base_data_directory_path = self
            .base_data_directory_path
            .map(PathBuf::from)
            .unwrap_or_else(default_base_data_directory);

        if base_data_directory_path.exists() && !base_data_directory_path.is_dir() {
            return Err(miette!(
                "Base data directory path exists, but is not a directory!"
            ));
        }

        if !base_data_directory_path.is_dir() {
            std::fs::create_dir_all(&base_data_directory_path)
                .into_diagnostic()
                .wrap_err("Failed to create missing base data directory.")?;
        }


        let base_data_directory_path = dunce::canonicalize(base_data_directory_path)
            .into_diagnostic()
            .wrap_err("Failed to canonicalize base data directory path.")?;


        Ok(BasePathsConfiguration::from_base_directory(
            base_data_directory_path,
        ))
    }
}


impl BasePathsConfiguration {
    pub fn from_base_directory<P>(base_data_directory_path: P) -> Self
    where
        P: Into<PathBuf>,
    {
        let base_data_directory_path = base_data_directory_path.into();

        Self {
            config_directory_path: base_data_directory_path.join("config"),
            logs_directory_path: base_data_directory_path.join("logs"),
            specific_directory_path: base_data_directory_path.join("specific"),
            base_data_directory_path,
        }
    }

    /// Creates the `config/`, `logs/` and `specific/` directories if they are missing.
    pub fn ensure_directories(&self) -> Result<()> {
        for directory in [
            &self.config_directory_path,
            &self.logs_directory_path,
            &self.specific_directory_path,
        ] {
            create_directory_if_missing(directory)?;
        }

        Ok(())
    }

    /// Returns `specific/<name>`, creating it if needed.
    pub fn specific_folder(&self, name: &str) -> Result<PathBuf> {
        let folder = self.specific_directory_path.join(name);
        create_directory_if_missing(&folder)?;

        Ok(folder)
    }

    /// Log directory of `project`: `logs/<project>`.
    pub fn project_logs_directory(&self, project: &str) -> PathBuf {
        self.logs_directory_path.join(project)
    }

    pub fn placeholders_map(&self) -> HashMap<&'static str, String> {
        let mut placeholders_map = HashMap::with_capacity(1);

        placeholders_map.insert(
            "{BASE_DATA_DIRECTORY}",
            self.base_data_directory_path.to_string_lossy().to_string(),
        );

        placeholders_map
    }
}


fn create_directory_if_missing(directory: &Path) -> Result<()> {
    std::fs::create_dir_all(directory)
        .into_diagnostic()
        .wrap_err_with(|| miette!("Failed to create missing directory at {}.", directory.display()))
}
