use std::{
    fs,
    path::{Path, PathBuf},
};

use serde_json::{Map, Value};
use tracing::{debug, trace};

use super::{
    folded::FoldedMap,
    section::Section,
    value::{normalize_value, RawTable},
    Resolved,
};
use crate::{
    error::{VaultError, VaultResult},
    formats::{ini, module, FileFormat},
};


#[derive(Clone, Debug)]
enum Entries {
    Sections(FoldedMap<Section>),
    Values(FoldedMap<Value>),
}


/// A borrowed result of [`FileProxy::get`].
#[derive(Clone, Debug)]
pub enum Entry<'a> {
    Section(&'a Section),
    Value(Value),
}

impl<'a> Entry<'a> {
    pub fn as_section(&self) -> Option<&'a Section> {
        match self {
            Entry::Section(section) => Some(*section),
            Entry::Value(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Entry::Section(_) => None,
            Entry::Value(value) => Some(value),
        }
    }

    pub fn into_resolved(self) -> Resolved {
        match self {
            Entry::Section(section) => Resolved::Section(section.clone()),
            Entry::Value(value) => Resolved::Value(value),
        }
    }
}

/// One configuration file, parsed eagerly when the proxy is built.
///
/// INI files expose their sections as [`Section`]s and cannot be written at the
/// top level. JSON and module files expose their top-level keys as values and
/// accept writes, which are mirrored into the raw table.
#[derive(Clone, Debug)]
pub struct FileProxy {
    path: PathBuf,
    format: FileFormat,
    entries: Entries,
    raw: RawTable,
}

impl FileProxy {
    /// Loads `path`, inferring the format from its extension.
    pub fn open<P>(path: P) -> VaultResult<Self>
    where
        P: AsRef<Path>,
    {
        let format = FileFormat::from_path(path.as_ref())?;
        Self::load(path, format)
    }

    /// Loads `path` with a format tag such as `"ini"`, `"json"` or `"py"`.
    pub fn load_tagged<P>(path: P, format_tag: &str) -> VaultResult<Self>
    where
        P: AsRef<Path>,
    {
        let format = FileFormat::from_tag(format_tag)?;
        Self::load(path, format)
    }

    pub fn load<P>(path: P, format: FileFormat) -> VaultResult<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref().to_path_buf();

        debug!(path = %path.display(), %format, "Loading configuration file.");

        let (entries, raw) = match format {
            FileFormat::Ini => Self::load_ini(&path)?,
            FileFormat::Json => Self::load_json(&path)?,
            FileFormat::Module => Self::load_module(&path)?,
        };

        Ok(Self {
            path,
            format,
            entries,
            raw,
        })
    }

    fn load_ini(path: &Path) -> VaultResult<(Entries, RawTable)> {
        // Anything that keeps the file from being read counts as a missing INI file.
        let contents = fs::read_to_string(path).map_err(|_| {
            VaultError::not_found(format!("INI file {}", path.display()), "the filesystem")
        })?;

        let document =
            ini::parse(&contents).map_err(|error| VaultError::malformed(path, error.to_string()))?;

        let resolved_sections = document.resolved_sections();

        let raw_sections = resolved_sections
            .iter()
            .map(|section| {
                let entries = section
                    .entries
                    .iter()
                    .map(|(key, value)| (key.clone(), Value::String(value.clone())))
                    .collect::<Map<String, Value>>();

                (section.name.clone(), Value::Object(entries))
            })
            .collect::<Map<String, Value>>();

        let raw = RawTable::new(raw_sections);

        let sections = resolved_sections
            .into_iter()
            .map(|section| {
                let proxy = Section::new(section.name.clone(), raw.clone());
                (section.name, proxy)
            })
            .collect();

        Ok((Entries::Sections(sections), raw))
    }

    fn load_json(path: &Path) -> VaultResult<(Entries, RawTable)> {
        let contents = fs::read_to_string(path).map_err(|error| VaultError::from_io(path, error))?;

        let parsed: Value = serde_json::from_str(&contents)
            .map_err(|error| VaultError::malformed(path, error.to_string()))?;

        let Value::Object(object) = parsed else {
            return Err(VaultError::malformed(
                path,
                "top-level JSON value must be an object",
            ));
        };

        Ok(Self::values_from(object))
    }

    fn load_module(path: &Path) -> VaultResult<(Entries, RawTable)> {
        let contents = fs::read_to_string(path).map_err(|error| VaultError::from_io(path, error))?;

        let bindings = module::evaluate(&contents).map_err(|error| {
            VaultError::malformed(path, format!("cannot load module config: {error}"))
        })?;

        Ok(Self::values_from(bindings))
    }

    fn values_from(object: Map<String, Value>) -> (Entries, RawTable) {
        let values = object
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        (Entries::Values(values), RawTable::new(object))
    }


    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Case-insensitive lookup of a top-level entry.
    ///
    /// INI files give the [`Section`] itself; JSON and module files give the value,
    /// with one layer of quotes stripped from strings.
    pub fn get(&self, key: &str) -> VaultResult<Entry<'_>> {
        trace!(key, file = %self.file_name(), "Accessing key.");

        match &self.entries {
            Entries::Sections(sections) => sections
                .get(key)
                .map(Entry::Section)
                .ok_or_else(|| VaultError::not_found(format!("section {key:?}"), self.file_name())),
            Entries::Values(values) => values
                .get(key)
                .map(|value| Entry::Value(normalize_value(value)))
                .ok_or_else(|| VaultError::not_found(format!("key {key:?}"), self.file_name())),
        }
    }

    /// Like [`FileProxy::get`], but always produces a value (sections become objects).
    pub fn value(&self, key: &str) -> VaultResult<Value> {
        match self.get(key)? {
            Entry::Section(section) => Ok(Value::Object(section.to_map())),
            Entry::Value(value) => Ok(value),
        }
    }

    pub fn section(&self, name: &str) -> VaultResult<&Section> {
        match &self.entries {
            Entries::Sections(sections) => sections
                .get(name)
                .ok_or_else(|| VaultError::not_found(format!("section {name:?}"), self.file_name())),
            Entries::Values(_) => Err(VaultError::not_found(
                format!("section {name:?}"),
                format!("{} ({} files have no sections)", self.file_name(), self.format),
            )),
        }
    }

    /// Mutable access to a section; the only way to write into an INI file.
    pub fn section_mut(&mut self, name: &str) -> VaultResult<&mut Section> {
        let file_name = self.file_name();
        let format = self.format;

        match &mut self.entries {
            Entries::Sections(sections) => sections
                .get_mut(name)
                .ok_or_else(|| VaultError::not_found(format!("section {name:?}"), file_name)),
            Entries::Values(_) => Err(VaultError::not_found(
                format!("section {name:?}"),
                format!("{file_name} ({format} files have no sections)"),
            )),
        }
    }

    fn values_mut(&mut self, key: &str) -> VaultResult<&mut FoldedMap<Value>> {
        match &mut self.entries {
            Entries::Sections(_) => Err(VaultError::WriteNotAllowed {
                key: key.to_string(),
                path: self.path.clone(),
            }),
            Entries::Values(values) => Ok(values),
        }
    }

    /// Case-insensitive write of a top-level key.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> VaultResult<()> {
        let value = value.into();
        let written_key = self.values_mut(key)?.set(key, value.clone());

        self.raw.insert(written_key, value);
        Ok(())
    }

    /// Writes under the exact key, without case folding.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> VaultResult<()> {
        let key = key.into();
        let value = value.into();

        self.values_mut(&key)?.insert(key.clone(), value.clone());
        self.raw.insert(key, value);
        Ok(())
    }

    /// Bulk form of [`FileProxy::insert`].
    pub fn update(&mut self, entries: Map<String, Value>) -> VaultResult<()> {
        let first_key = entries.keys().next().cloned().unwrap_or_default();
        let values = self.values_mut(&first_key)?;

        for (key, value) in &entries {
            values.insert(key.clone(), value.clone());
        }

        self.raw.extend(entries);
        Ok(())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        match &self.entries {
            Entries::Sections(sections) => sections.contains_key(key),
            Entries::Values(values) => values.contains_key(key),
        }
    }

    pub fn keys(&self) -> Vec<&str> {
        match &self.entries {
            Entries::Sections(sections) => sections.keys().collect(),
            Entries::Values(values) => values.keys().collect(),
        }
    }

    pub fn len(&self) -> usize {
        match &self.entries {
            Entries::Sections(sections) => sections.len(),
            Entries::Values(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Handle to the structure as parsed, without quote stripping.
    pub fn raw(&self) -> RawTable {
        self.raw.clone()
    }

    /// Copy of [`FileProxy::raw`] as a plain map.
    pub fn to_raw(&self) -> Map<String, Value> {
        self.raw.snapshot()
    }

    /// Consumes the proxy, resolving `key` into an owned result.
    pub fn into_entry(self, key: &str) -> VaultResult<Resolved> {
        self.get(key).map(Entry::into_resolved)
    }
}
