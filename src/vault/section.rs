use serde_json::{Map, Value};

use super::{
    folded::FoldedMap,
    value::{normalize_value, RawTable},
};
use crate::error::{VaultError, VaultResult};


/// One INI section, readable and writable by case-insensitive key.
///
/// The section owns a quote-stripped copy of its values, taken at construction.
/// [`Section::raw`] instead reads the owning file's raw table, so it reflects
/// later changes to that table but not writes made through [`Section::set`].
#[derive(Clone, Debug)]
pub struct Section {
    name: String,
    values: FoldedMap<Value>,
    owner: RawTable,
}

impl Section {
    /// Builds the proxy for `name` out of the owning file's raw table.
    /// A name missing from the table gives an empty section.
    pub fn new(name: impl Into<String>, owner: RawTable) -> Self {
        let name = name.into();

        let values = match owner.get(&name) {
            Some(Value::Object(entries)) => entries
                .iter()
                .map(|(key, value)| (key.clone(), normalize_value(value)))
                .collect(),
            _ => FoldedMap::new(),
        };

        Self {
            name,
            values,
            owner,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, key: &str) -> VaultResult<&Value> {
        self.values
            .get(key)
            .ok_or_else(|| VaultError::not_found(format!("key {key:?}"), format!("section {:?}", self.name)))
    }

    /// Like [`Section::get`], for the common case of a string value.
    pub fn get_str(&self, key: &str) -> VaultResult<&str> {
        let value = self.get(key)?;

        value.as_str().ok_or_else(|| {
            VaultError::not_found(
                format!("string value for key {key:?}"),
                format!("section {:?}", self.name),
            )
        })
    }

    /// Overwrites the matching key in its stored case, or adds `key` as given.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.values.set(key, value.into());
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The live, unnormalized mapping this section was built from.
    pub fn raw(&self) -> Map<String, Value> {
        match self.owner.get(&self.name) {
            Some(Value::Object(entries)) => entries,
            _ => Map::new(),
        }
    }

    /// The proxy's own (normalized, possibly modified) values as a plain map.
    pub fn to_map(&self) -> Map<String, Value> {
        self.values
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }
}


#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn owner() -> RawTable {
        let mut sections = Map::new();
        sections.insert(
            "DISK".to_string(),
            json!({ "U": "\"//smb/structure\"", "Local_Path": "C:/data" }),
        );
        RawTable::new(sections)
    }

    #[test]
    fn reads_fold_case_and_strip_quotes() {
        let section = Section::new("DISK", owner());

        assert_eq!(section.get("U").unwrap(), "//smb/structure");
        assert_eq!(section.get("u").unwrap(), "//smb/structure");
        assert_eq!(section.get_str("local_path").unwrap(), "C:/data");
        assert_eq!(section.get_str("LOCAL_PATH").unwrap(), "C:/data");
    }

    #[test]
    fn missing_key_is_not_found() {
        let section = Section::new("DISK", owner());

        assert!(section.get("missing").unwrap_err().is_not_found());
    }

    #[test]
    fn set_overwrites_original_case_entry() {
        let mut section = Section::new("DISK", owner());

        section.set("local_path", "D:/other");
        section.set("New_Key", "fresh");

        assert_eq!(section.get_str("Local_Path").unwrap(), "D:/other");
        let keys: Vec<_> = section.keys().collect();
        assert_eq!(keys, vec!["U", "Local_Path", "New_Key"]);
    }

    #[test]
    fn raw_is_live_and_unnormalized() {
        let table = owner();
        let mut section = Section::new("DISK", table.clone());

        section.set("U", "changed");
        assert_eq!(section.raw()["U"], json!("\"//smb/structure\""));

        table.insert("DISK", json!({ "U": "replaced" }));
        assert_eq!(section.raw()["U"], json!("replaced"));
        assert_eq!(section.get_str("U").unwrap(), "changed");
    }
}
