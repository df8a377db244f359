//! An insertion-ordered map whose lookups ignore case.

/// Ordered map that keeps keys in their original case but folds case on lookup.
///
/// Every access path (`get`, `get_mut`, `set`, indexing) goes through
/// [`FoldedMap::resolve_key`]: an exact match wins, otherwise the first entry in
/// insertion order whose key is equal under case folding.
#[derive(Clone, Debug, PartialEq)]
pub struct FoldedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for FoldedMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

fn keys_match_folded(left: &str, right: &str) -> bool {
    left.eq_ignore_ascii_case(right) || left.to_uppercase() == right.to_uppercase()
}

impl<V> FoldedMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(stored, _)| stored == key)
            .or_else(|| {
                self.entries
                    .iter()
                    .position(|(stored, _)| keys_match_folded(stored, key))
            })
    }

    /// Returns the original-case key that `key` resolves to.
    pub fn resolve_key(&self, key: &str) -> Option<&str> {
        self.position(key)
            .map(|index| self.entries[index].0.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.position(key).map(|index| &self.entries[index].1)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.position(key)
            .map(move |index| &mut self.entries[index].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Overwrites the entry `key` resolves to (keeping its stored case),
    /// or appends `key` as given. Returns the key that was written.
    pub fn set(&mut self, key: &str, value: V) -> String {
        match self.position(key) {
            Some(index) => {
                self.entries[index].1 = value;
                self.entries[index].0.clone()
            }
            None => {
                self.entries.push((key.to_string(), value));
                key.to_string()
            }
        }
    }

    /// Inserts under the exact key, without case folding.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();

        match self.entries.iter_mut().find(|(stored, _)| *stored == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> FromIterator<(String, V)> for FoldedMap<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl<V> std::ops::Index<&str> for FoldedMap<V> {
    type Output = V;

    fn index(&self, key: &str) -> &Self::Output {
        match self.get(key) {
            Some(value) => value,
            None => panic!("no entry matching {key:?}"),
        }
    }
}
