//! Note model: user content stored against a note type.

use crate::model::record::RecordId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use uuid::Uuid;

pub type NoteId = Uuid;

/// Ordered field-name to value mapping of one note.
///
/// Insertion order is preserved and names are unique. Persisted as a JSON
/// array of `[name, value]` pairs; decoding rejects repeated names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteFields(Vec<(String, String)>);

impl NoteFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    /// Sets `name` in place, or appends it when missing.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.0.iter_mut().find(|(field, _)| field == name) {
            Some((_, current)) => *current = value,
            None => self.0.push((name.to_string(), value)),
        }
    }

    /// Inserts `name` right after `anchor` (or appends). Overwrites the value
    /// when `name` already exists, keeping its position.
    pub fn insert_after(&mut self, anchor: &str, name: &str, value: impl Into<String>) {
        if self.get(name).is_some() {
            self.set(name, value);
            return;
        }
        let entry = (name.to_string(), value.into());
        match self.0.iter().position(|(field, _)| field == anchor) {
            Some(index) => self.0.insert(index + 1, entry),
            None => self.0.push(entry),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(field, _)| field.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for NoteFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Self::new();
        for (name, value) in iter {
            let name: String = name.into();
            fields.set(&name, value);
        }
        fields
    }
}

impl Serialize for NoteFields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for NoteFields {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pairs = Vec::<(String, String)>::deserialize(deserializer)?;
        let mut seen = BTreeSet::new();
        for (name, _) in &pairs {
            if !seen.insert(name.as_str()) {
                return Err(serde::de::Error::custom(format!(
                    "duplicate note field `{name}`"
                )));
            }
        }
        Ok(Self(pairs))
    }
}

/// One note belonging to a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: NoteId,
    pub record_id: RecordId,
    pub fields: NoteFields,
}

impl Note {
    pub fn new(record_id: RecordId, fields: NoteFields) -> Self {
        Self {
            id: Uuid::new_v4(),
            record_id,
            fields,
        }
    }
}
