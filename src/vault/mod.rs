//! Case-insensitive, named access to configuration files.
//!
//! A [`Vault`] is bound to a path that is either a single configuration file or a
//! directory of them. Every lookup re-reads the filesystem, so values are always
//! fresh; hold on to the returned [`FileProxy`] or [`Section`] when reading many
//! values from the same file.
//!
//! ```no_run
//! use locker::vault::Vault;
//!
//! # fn main() -> locker::error::VaultResult<()> {
//! let vault = Vault::new("/home/user/utilities/config");
//!
//! // `global-config.ini` is reachable as `global_config`.
//! let unc_root = vault.get("global_config")?.get("DISK")?.get("U")?;
//! println!("{}", unc_root.as_str().unwrap_or_default());
//! # Ok(())
//! # }
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    error::{VaultError, VaultResult},
    formats::FileFormat,
};

mod file;
mod folded;
mod namespace;
mod section;
mod value;

pub use file::{Entry, FileProxy};
pub use folded::FoldedMap;
pub use namespace::{Config, Namespace};
pub use section::Section;
pub use value::{normalize_value, strip_quotes, RawTable};


/// An owned lookup result, which can be chained with further lookups.
#[derive(Clone, Debug)]
pub enum Resolved {
    /// A whole file, returned when resolving a name inside a directory.
    File(FileProxy),
    /// An INI section.
    Section(Section),
    /// A value from a JSON or module file, or from a section.
    Value(Value),
}

impl Resolved {
    /// Resolves `key` one level further down.
    ///
    /// Files and sections fold case. Plain JSON objects are indexed by exact key.
    pub fn get(&self, key: &str) -> VaultResult<Resolved> {
        match self {
            Resolved::File(file) => file.get(key).map(Entry::into_resolved),
            Resolved::Section(section) => section.get(key).cloned().map(Resolved::Value),
            Resolved::Value(Value::Object(object)) => object
                .get(key)
                .cloned()
                .map(Resolved::Value)
                .ok_or_else(|| VaultError::not_found(format!("key {key:?}"), "mapping")),
            Resolved::Value(other) => Err(VaultError::not_found(
                format!("key {key:?}"),
                format!("non-mapping value {other}"),
            )),
        }
    }

    pub fn as_file(&self) -> Option<&FileProxy> {
        match self {
            Resolved::File(file) => Some(file),
            _ => None,
        }
    }

    pub fn as_section(&self) -> Option<&Section> {
        match self {
            Resolved::Section(section) => Some(section),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Resolved::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }

    /// Converts any result into a plain value: files become their raw structure,
    /// sections their normalized entries.
    pub fn into_value(self) -> Value {
        match self {
            Resolved::File(file) => Value::Object(file.to_raw()),
            Resolved::Section(section) => Value::Object(section.to_map()),
            Resolved::Value(value) => value,
        }
    }
}


/// Maps a file name to the name it is reachable under inside a directory vault:
/// the extension is dropped, hyphens become underscores, and the result is lower-cased.
pub fn normalize_base_name(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| file_name.to_string());

    stem.replace('-', "_").to_lowercase()
}


/// Resolution strategy bound to a configuration file or directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vault {
    path: PathBuf,
}

impl Vault {
    pub fn new<P>(path: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parses the configured file and returns its raw structure.
    ///
    /// Only works when the vault points at a file; directories give `NotFound`.
    pub fn raw(&self) -> VaultResult<Map<String, Value>> {
        if !self.path.is_file() {
            return Err(VaultError::not_found(
                format!("configuration file {}", self.path.display()),
                "the filesystem",
            ));
        }

        Ok(FileProxy::open(&self.path)?.to_raw())
    }

    /// Resolves `name` against the configured path.
    ///
    /// For a file this is [`FileProxy::get`] on a freshly loaded proxy. For a
    /// directory it returns a freshly loaded [`FileProxy`] for the file whose
    /// normalized base name matches `name` (case-insensitively).
    pub fn get(&self, name: &str) -> VaultResult<Resolved> {
        if self.path.is_file() {
            return FileProxy::open(&self.path)?.into_entry(name);
        }

        if self.path.is_dir() {
            let file_path = self.find_in_directory(name)?;
            if !file_path.is_file() {
                return Err(VaultError::UnsupportedFormat(format!(
                    "{} is not a file",
                    file_path.display()
                )));
            }

            let format = FileFormat::from_path(&file_path)?;

            debug!(
                name,
                path = %file_path.display(),
                "Resolved vault name to a file."
            );

            return FileProxy::load(file_path, format).map(Resolved::File);
        }

        Err(VaultError::not_found(
            format!("{name:?} (vault path {} does not exist)", self.path.display()),
            "the filesystem",
        ))
    }

    /// Lists the `(normalized name, entry name)` pairs of a directory vault,
    /// sorted by entry name. Subdirectories are listed too; resolving one fails
    /// with `UnsupportedFormat`.
    pub fn entries(&self) -> VaultResult<Vec<(String, String)>> {
        let directory = fs::read_dir(&self.path).map_err(|error| VaultError::from_io(&self.path, error))?;

        let mut entry_names = Vec::new();
        for entry in directory {
            let entry = entry.map_err(|error| VaultError::from_io(&self.path, error))?;
            entry_names.push(entry.file_name().to_string_lossy().to_string());
        }

        entry_names.sort();

        Ok(entry_names
            .into_iter()
            .map(|entry_name| (normalize_base_name(&entry_name), entry_name))
            .collect())
    }

    fn find_in_directory(&self, name: &str) -> VaultResult<PathBuf> {
        let wanted = name.to_lowercase();

        // Entries are sorted by name, so on collisions the lexicographically
        // first entry wins.
        self.entries()?
            .into_iter()
            .find(|(normalized, _)| *normalized == wanted)
            .map(|(_, file_name)| self.path.join(file_name))
            .ok_or_else(|| {
                VaultError::not_found(format!("file {name:?}"), self.path.display().to_string())
            })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_names_are_normalized() {
        assert_eq!(normalize_base_name("global-config.ini"), "global_config");
        assert_eq!(normalize_base_name("Feature-Flags.py"), "feature_flags");
        assert_eq!(normalize_base_name("archive.tar.json"), "archive.tar");
        assert_eq!(normalize_base_name("README"), "readme");
    }

    #[test]
    fn resolved_values_chain_into_objects() {
        let resolved = Resolved::Value(serde_json::json!({ "a": { "b": 1 } }));

        assert_eq!(resolved.get("a").unwrap().get("b").unwrap().into_value(), 1);
        assert!(resolved.get("A").unwrap_err().is_not_found());
        assert!(Resolved::Value(Value::from(3)).get("x").unwrap_err().is_not_found());
    }
}
