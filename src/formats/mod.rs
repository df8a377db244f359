//! Source formats a configuration file can be written in.

use std::{fmt, path::Path, str::FromStr};

use crate::error::VaultError;

pub mod ini;
pub mod module;


/// The three recognized configuration formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FileFormat {
    Ini,
    Json,
    /// A source file of literal assignments, see [`module`].
    Module,
}

impl FileFormat {
    /// Recognized extensions for module configs.
    pub const MODULE_EXTENSIONS: &'static [&'static str] = &["py"];

    /// Parses a format tag (`ini`, `json`, `py` or `module`), ignoring case.
    pub fn from_tag(tag: &str) -> Result<Self, VaultError> {
        let tag = tag.trim_start_matches('.').to_ascii_lowercase();

        match tag.as_str() {
            "ini" => Ok(Self::Ini),
            "json" => Ok(Self::Json),
            "module" => Ok(Self::Module),
            other if Self::MODULE_EXTENSIONS.contains(&other) => Ok(Self::Module),
            other => Err(VaultError::UnsupportedFormat(format!("{other:?}"))),
        }
    }

    /// Infers the format from the extension of `path`.
    pub fn from_path<P>(path: P) -> Result<Self, VaultError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();

        match path.extension().and_then(|extension| extension.to_str()) {
            Some(extension) => Self::from_tag(extension).map_err(|_| {
                VaultError::UnsupportedFormat(format!(".{extension} ({})", path.display()))
            }),
            None => Err(VaultError::UnsupportedFormat(format!(
                "no extension ({})",
                path.display()
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Ini => "ini",
            FileFormat::Json => "json",
            FileFormat::Module => "module",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileFormat {
    type Err = VaultError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        Self::from_tag(tag)
    }
}
