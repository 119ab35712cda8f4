//! Error taxonomy for detection, migration and template sync.
//!
//! Every error is classified as `Fatal` (corruption or broken invariants; the
//! user must resolve it by hand) or `Recoverable` (returned as a value; the
//! caller decides whether to warn or abort).

use crate::model::version::SchemaVersion;
use crate::repo::record_store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type MigrationResult<T> = Result<T, MigrationError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Fatal,
    Recoverable,
}

/// Migration chain configuration errors. Always fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    Empty,
    DuplicateVersion(SchemaVersion),
    BadSourceVersion {
        name: &'static str,
        from: SchemaVersion,
        to: SchemaVersion,
    },
    MissingVersion(SchemaVersion),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "no migrations registered"),
            Self::DuplicateVersion(version) => {
                write!(f, "migration to {version} registered twice")
            }
            Self::BadSourceVersion { name, from, to } => write!(
                f,
                "migration `{name}` goes from {from} to {to}; it must step exactly one version"
            ),
            Self::MissingVersion(version) => write!(f, "missing migration to {version}"),
        }
    }
}

impl Error for RegistryError {}

/// Errors raised while classifying the store's managed record.
#[derive(Debug)]
pub enum DetectionError {
    MultipleManagedRecords(Vec<String>),
    MissingVersionTag {
        name: String,
    },
    CorruptVersionTag {
        name: String,
        raw: String,
    },
    UnknownVersion {
        name: String,
        version: u64,
        latest: SchemaVersion,
    },
    Store(StoreError),
}

impl DetectionError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownVersion { .. } => ErrorSeverity::Recoverable,
            _ => ErrorSeverity::Fatal,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::MultipleManagedRecords(_) => "multiple_managed_records",
            Self::MissingVersionTag { .. } => "missing_version_tag",
            Self::CorruptVersionTag { .. } => "corrupt_version_tag",
            Self::UnknownVersion { .. } => "unknown_version",
            Self::Store(err) => err.code(),
        }
    }
}

impl Display for DetectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MultipleManagedRecords(names) => write!(
                f,
                "found {} managed note types ({}); at most one may exist",
                names.len(),
                names.join(", ")
            ),
            Self::MissingVersionTag { name } => {
                write!(f, "managed note type `{name}` has no version")
            }
            Self::CorruptVersionTag { name, raw } => {
                write!(f, "managed note type `{name}` has corrupt version {raw}")
            }
            Self::UnknownVersion {
                name,
                version,
                latest,
            } => write!(
                f,
                "note type `{name}` is at version {version}, newer than the latest known {latest}"
            ),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DetectionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for DetectionError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Errors raised by the migration driver or by an individual step.
#[derive(Debug)]
pub enum MigrationError {
    /// An unmanaged note type already holds the name we need.
    NameTaken(String),
    /// The driver was about to skip or repeat a version.
    ChainBroken {
        current: SchemaVersion,
        target: SchemaVersion,
    },
    MissingMigration(SchemaVersion),
    /// A step was handed a record shape it cannot migrate.
    UnexpectedInput {
        step: &'static str,
        reason: &'static str,
    },
    Store(StoreError),
}

impl MigrationError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NameTaken(_) => ErrorSeverity::Recoverable,
            _ => ErrorSeverity::Fatal,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::NameTaken(_) => "name_taken",
            Self::ChainBroken { .. } => "migration_chain_broken",
            Self::MissingMigration(_) => "missing_migration",
            Self::UnexpectedInput { .. } => "unexpected_migration_input",
            Self::Store(err) => err.code(),
        }
    }
}

impl Display for MigrationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NameTaken(name) => write!(
                f,
                "note type `{name}` already exists but is not managed; rename it and retry"
            ),
            Self::ChainBroken { current, target } => write!(
                f,
                "migration invariant violated: cannot step from {current} to {target}"
            ),
            Self::MissingMigration(version) => write!(f, "no migration registered to {version}"),
            Self::UnexpectedInput { step, reason } => {
                write!(f, "migration `{step}` rejected its input: {reason}")
            }
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for MigrationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for MigrationError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Errors raised while placing the managed presentation template.
#[derive(Debug)]
pub enum SyncError {
    MultipleManagedTemplates { record: String, count: usize },
    Store(StoreError),
}

impl SyncError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MultipleManagedTemplates { .. } => "multiple_managed_templates",
            Self::Store(err) => err.code(),
        }
    }
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MultipleManagedTemplates { record, count } => write!(
                f,
                "note type `{record}` has {count} managed templates; at most one may exist"
            ),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::MultipleManagedTemplates { .. } => None,
        }
    }
}

impl From<StoreError> for SyncError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}
