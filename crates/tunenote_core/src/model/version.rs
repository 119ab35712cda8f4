//! Schema version numbers and detection results.

use crate::model::record::ManagedRecord;
use std::fmt::{Display, Formatter};

/// Dense, strictly increasing schema version of the managed record.
///
/// `SchemaVersion::ABSENT` (0) is the sentinel for "record does not exist".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SchemaVersion(u32);

impl SchemaVersion {
    pub const ABSENT: Self = Self(0);

    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    pub fn is_absent(self) -> bool {
        self == Self::ABSENT
    }

    /// The version directly after this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl Display for SchemaVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Outcome of version detection.
///
/// The absent sentinel never carries a record; that pairing is encoded in the
/// type rather than checked at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionResult {
    Absent,
    Existing {
        version: SchemaVersion,
        record: ManagedRecord,
    },
}

impl VersionResult {
    pub fn version(&self) -> SchemaVersion {
        match self {
            Self::Absent => SchemaVersion::ABSENT,
            Self::Existing { version, .. } => *version,
        }
    }

    pub fn record(&self) -> Option<&ManagedRecord> {
        match self {
            Self::Absent => None,
            Self::Existing { record, .. } => Some(record),
        }
    }

    pub fn into_parts(self) -> (SchemaVersion, Option<ManagedRecord>) {
        match self {
            Self::Absent => (SchemaVersion::ABSENT, None),
            Self::Existing { version, record } => (version, Some(record)),
        }
    }
}
