//! Managed note type (record) and presentation template model.
//!
//! # Invariants
//! - `id` is stable across migrations; steps copy it forward.
//! - `fields` keeps declaration order and holds no duplicate names.
//! - Template `ordinal` values are preserved across template replacement.

use crate::model::metadata::{Metadata, TagError, TemplateTag, VersionTag};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Stable identifier of a note type record.
pub type RecordId = Uuid;

/// Presentation unit attached to a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    /// Position among the record's templates.
    pub ordinal: u32,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Template {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ordinal: 0,
            question: String::new(),
            answer: String::new(),
            metadata: Metadata::new(),
        }
    }

    /// Returns whether this template carries the managed-template marker.
    pub fn is_managed(&self) -> bool {
        TemplateTag::is_present(&self.metadata)
    }
}

/// Schema-carrying note type owned by the record store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedRecord {
    pub id: RecordId,
    /// Unique among note types.
    pub name: String,
    pub fields: Vec<String>,
    pub templates: Vec<Template>,
    pub metadata: Metadata,
}

impl ManagedRecord {
    /// Creates an empty, untagged record with a generated id.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name)
    }

    pub fn with_id(id: RecordId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            fields: Vec::new(),
            templates: Vec::new(),
            metadata: Metadata::new(),
        }
    }

    /// Typed read of the version tag. See `VersionTag::read`.
    pub fn version_tag(&self) -> Result<Option<VersionTag>, TagError> {
        VersionTag::read(&self.metadata)
    }

    pub fn set_version_tag(&mut self, tag: VersionTag) {
        tag.write(&mut self.metadata);
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|field| field == name)
    }

    /// Appends `name` unless a field with that name already exists.
    pub fn add_field(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.has_field(&name) {
            self.fields.push(name);
        }
    }

    /// Inserts `name` right after `anchor`, or appends when `anchor` is absent.
    ///
    /// No-op when the field already exists.
    pub fn insert_field_after(&mut self, anchor: &str, name: impl Into<String>) {
        let name = name.into();
        if self.has_field(&name) {
            return;
        }
        match self.fields.iter().position(|field| field == anchor) {
            Some(index) => self.fields.insert(index + 1, name),
            None => self.fields.push(name),
        }
    }

    /// Indices of templates tagged as managed, in storage order.
    pub fn managed_template_indices(&self) -> Vec<usize> {
        self.templates
            .iter()
            .enumerate()
            .filter(|(_, template)| template.is_managed())
            .map(|(index, _)| index)
            .collect()
    }

    /// Ordinal one past the highest used ordinal, or 0 for a record with no
    /// templates.
    ///
    /// When the highest ordinal is `u32::MAX` the lowest unused ordinal is
    /// returned instead, so the result never collides with a stored one.
    pub fn next_template_ordinal(&self) -> u32 {
        let Some(highest) = self.templates.iter().map(|template| template.ordinal).max() else {
            return 0;
        };
        highest.checked_add(1).unwrap_or_else(|| {
            let used: BTreeSet<u32> = self
                .templates
                .iter()
                .map(|template| template.ordinal)
                .collect();
            // Fewer than u32::MAX templates fit in memory, so a gap exists.
            (0..u32::MAX)
                .find(|ordinal| !used.contains(ordinal))
                .unwrap_or(u32::MAX)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ManagedRecord, Template};
    use crate::model::metadata::TemplateTag;

    #[test]
    fn insert_field_after_keeps_order_and_is_idempotent() {
        let mut record = ManagedRecord::new("Tunes");
        for field in ["Name", "Tune Type", "ABC"] {
            record.add_field(field);
        }

        record.insert_field_after("Name", "Key");
        record.insert_field_after("Name", "Key");
        assert_eq!(record.fields, vec!["Name", "Key", "Tune Type", "ABC"]);

        record.insert_field_after("Missing", "Link");
        assert_eq!(record.fields.last().map(String::as_str), Some("Link"));
    }

    #[test]
    fn next_template_ordinal_follows_highest_ordinal() {
        let mut record = ManagedRecord::new("Tunes");
        assert_eq!(record.next_template_ordinal(), 0);

        let mut first = Template::new("Front");
        first.ordinal = 0;
        let mut second = Template::new("Back");
        second.ordinal = 3;
        record.templates = vec![first, second];
        assert_eq!(record.next_template_ordinal(), 4);
    }

    #[test]
    fn next_template_ordinal_reuses_gap_when_highest_is_max() {
        let mut record = ManagedRecord::new("Tunes");
        let mut first = Template::new("Front");
        first.ordinal = 0;
        let mut last = Template::new("Back");
        last.ordinal = u32::MAX;
        record.templates = vec![first, last];

        assert_eq!(record.next_template_ordinal(), 1);
    }

    #[test]
    fn managed_template_indices_only_lists_tagged_templates() {
        let mut record = ManagedRecord::new("Tunes");
        let mut ours = Template::new("Tune");
        TemplateTag::write(&mut ours.metadata);
        record.templates = vec![Template::new("User"), ours];

        assert_eq!(record.managed_template_indices(), vec![1]);
    }
}
