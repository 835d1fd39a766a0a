//! Name-keyed capability registry
//!
//! Keeps registration order for the documentation snapshot and rejects
//! duplicate names.

use indexmap::IndexMap;

pub(crate) struct Registry<T: ?Sized> {
    kind: &'static str,
    entries: IndexMap<String, Box<T>>,
}

impl<T: ?Sized> Registry<T> {
    /// Creates an empty registry; `kind` names the entries in panic messages
    pub(crate) fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: IndexMap::new(),
        }
    }

    /// Registers an entry
    ///
    /// # Panics
    ///
    /// Panics if the name is already registered.
    pub(crate) fn insert(&mut self, name: String, entry: Box<T>) {
        if self.entries.contains_key(&name) {
            panic!("duplicate {} name: {}", self.kind, name);
        }
        self.entries.insert(name, entry);
    }

    pub(crate) fn get(&self, name: &str) -> Option<&T> {
        self.entries.get(name).map(|entry| &**entry)
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Iterates in registration order
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &T)> + '_ {
        self.entries
            .iter()
            .map(|(name, entry)| (name.as_str(), &**entry))
    }

    pub(crate) fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }
}
