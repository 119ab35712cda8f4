//! Migration registry: the ordered, gap-free chain of schema steps.
//!
//! # Invariants
//! - Exactly one migration per target version in `1..=latest`.
//! - Every migration steps from `to - 1` to `to`.
//! - The built-in registry is constructed and validated once per process.

use crate::config::MigratorConfig;
use crate::migration::error::{MigrationResult, RegistryError};
use crate::migration::steps;
use crate::model::note::Note;
use crate::model::record::ManagedRecord;
use crate::model::version::SchemaVersion;
use crate::presentation::PresentationBuilder;
use crate::repo::record_store::RecordStore;
use once_cell::sync::OnceCell;
use std::collections::BTreeMap;

static BUILTIN: OnceCell<MigrationRegistry> = OnceCell::new();

/// Read-only collaborators handed to every migration step.
pub struct MigrationContext<'a> {
    pub store: &'a dyn RecordStore,
    pub config: &'a MigratorConfig,
    pub presentation: &'a dyn PresentationBuilder,
}

/// Output of one step: the new record shape and the notes it rewrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStep {
    pub record: ManagedRecord,
    pub notes: Vec<Note>,
}

impl MigrationStep {
    pub fn record_only(record: ManagedRecord) -> Self {
        Self {
            record,
            notes: Vec::new(),
        }
    }
}

/// Pure transform from the `from` shape to the `to` shape. The version-0
/// step receives `None`.
pub type MigrationFn =
    fn(&MigrationContext<'_>, Option<ManagedRecord>) -> MigrationResult<MigrationStep>;

/// One registered schema step.
#[derive(Clone, Copy)]
pub struct Migration {
    pub name: &'static str,
    pub from: SchemaVersion,
    pub to: SchemaVersion,
    pub apply: MigrationFn,
}

impl std::fmt::Debug for Migration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migration")
            .field("name", &self.name)
            .field("from", &self.from)
            .field("to", &self.to)
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct MigrationRegistry {
    migrations: BTreeMap<SchemaVersion, Migration>,
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers and validates a complete chain.
    pub fn build(
        migrations: impl IntoIterator<Item = Migration>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for migration in migrations {
            registry.register(migration)?;
        }
        registry.validate()?;
        Ok(registry)
    }

    /// Returns the process-wide built-in chain.
    ///
    /// # Errors
    /// - Returns the validation error when the built-in chain is malformed.
    pub fn builtin() -> Result<&'static Self, RegistryError> {
        BUILTIN.get_or_try_init(|| Self::build(steps::builtin_migrations()))
    }

    /// Registers one migration keyed by its target version.
    pub fn register(&mut self, migration: Migration) -> Result<(), RegistryError> {
        if self.migrations.contains_key(&migration.to) {
            return Err(RegistryError::DuplicateVersion(migration.to));
        }
        self.migrations.insert(migration.to, migration);
        Ok(())
    }

    /// Checks the gap-free chain invariant.
    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.migrations.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut expected = SchemaVersion::ABSENT.next();
        for (to, migration) in &self.migrations {
            if *to != expected {
                return Err(RegistryError::MissingVersion(expected));
            }
            if migration.from.next() != migration.to {
                return Err(RegistryError::BadSourceVersion {
                    name: migration.name,
                    from: migration.from,
                    to: migration.to,
                });
            }
            expected = expected.next();
        }
        Ok(())
    }

    /// Highest registered target version, or `ABSENT` when empty.
    pub fn latest(&self) -> SchemaVersion {
        self.migrations
            .keys()
            .next_back()
            .copied()
            .unwrap_or(SchemaVersion::ABSENT)
    }

    /// Maps a raw tag value onto a known version in `1..=latest`.
    pub fn known(&self, raw: u64) -> Option<SchemaVersion> {
        let version = SchemaVersion::new(u32::try_from(raw).ok()?);
        self.migrations.contains_key(&version).then_some(version)
    }

    pub fn get(&self, to: SchemaVersion) -> Option<&Migration> {
        self.migrations.get(&to)
    }

    /// Migrations in ascending target order.
    pub fn iter(&self) -> impl Iterator<Item = &Migration> {
        self.migrations.values()
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }
}
