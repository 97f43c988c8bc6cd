use crate::core::{Record, Value};
use crate::naming::{to_natural_case, to_storage_case, to_storage_key};

/// The two synchronized views of an entity's fields.
///
/// `natural` holds keys the way domain code writes them (`createdAt`),
/// `storage` holds the row snapshot keyed the way the store names columns
/// (`created_at`). Every mutation goes through this type so the views cannot
/// drift apart, except right after a row is absorbed, when `storage` may
/// carry columns the natural view has not seen set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    natural: Record,
    storage: Record,
}

impl Properties {
    pub fn new(fields: Record) -> Self {
        let storage = to_storage_case(&fields);
        Self {
            natural: fields,
            storage,
        }
    }

    /// Wraps a row returned by the store; the raw row becomes the snapshot.
    pub fn from_row(row: Record) -> Self {
        Self {
            natural: to_natural_case(&row),
            storage: row,
        }
    }

    pub fn natural(&self) -> &Record {
        &self.natural
    }

    pub fn storage(&self) -> &Record {
        &self.storage
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.natural.keys()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.natural.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.natural.contains_key(name)
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.storage.insert(to_storage_key(name), value.clone());
        self.natural.insert(name, value);
    }

    /// Removes `name` from both views. The storage side drops the translated
    /// key as well as the raw one, so multi-word names leave nothing behind.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let storage_key = to_storage_key(name);
        let removed = self.natural.remove(name);
        let stored = self.storage.remove(&storage_key);
        if storage_key != name {
            self.storage.remove(name);
        }
        removed.or(stored)
    }

    /// Copies every natural field into the storage snapshot.
    pub fn sync_storage(&mut self) {
        for (key, value) in self.natural.iter() {
            self.storage.insert(to_storage_key(key), value.clone());
        }
    }

    /// Takes a fresh row from the store: its columns are mirrored onto the
    /// natural view and it replaces the storage snapshot.
    pub fn absorb_row(&mut self, row: Record) {
        self.natural.merge(&to_natural_case(&row));
        self.storage = row;
    }

    /// Looks a field up by natural name, falling back to the storage snapshot.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.natural
            .get(name)
            .or_else(|| self.storage.get(&to_storage_key(name)))
    }

    pub fn into_natural(self) -> Record {
        self.natural
    }
}
