//! Version detection for the managed note type.
//!
//! # Responsibility
//! - Find the one record carrying the managed marker.
//! - Classify it as absent, known version, or an error.
//!
//! # Invariants
//! - At most one managed record may exist; more is corruption, never
//!   auto-repaired.
//! - Versions outside `1..=latest` are reported as-is, never clamped.
//! - A record whose name collides with ours but lacks the marker is treated
//!   as absent here; the creation step reports the collision.

use crate::migration::error::DetectionError;
use crate::migration::registry::MigrationRegistry;
use crate::model::metadata::{is_managed, TagError};
use crate::model::record::ManagedRecord;
use crate::model::version::VersionResult;
use crate::repo::record_store::RecordStore;
use log::{debug, error, warn};

pub struct VersionDetector<'a> {
    registry: &'a MigrationRegistry,
}

impl<'a> VersionDetector<'a> {
    pub fn new(registry: &'a MigrationRegistry) -> Self {
        Self { registry }
    }

    /// Detects the managed record and its schema version in `store`.
    pub fn detect(&self, store: &dyn RecordStore) -> Result<VersionResult, DetectionError> {
        let candidates = store.find_by_tag(&is_managed)?;
        let result = self.classify(candidates);

        match &result {
            Ok(found) => debug!(
                "event=note_type_detect module=migration status=ok version={}",
                found.version().get()
            ),
            Err(err @ DetectionError::UnknownVersion { .. }) => warn!(
                "event=note_type_detect module=migration status=error error_code={} error={}",
                err.code(),
                err
            ),
            Err(err) => error!(
                "event=note_type_detect module=migration status=error error_code={} error={}",
                err.code(),
                err
            ),
        }

        result
    }

    /// Classifies an already-filtered set of managed records.
    pub fn classify(
        &self,
        mut candidates: Vec<ManagedRecord>,
    ) -> Result<VersionResult, DetectionError> {
        candidates.retain(|record| is_managed(&record.metadata));
        if candidates.len() > 1 {
            return Err(DetectionError::MultipleManagedRecords(
                candidates.into_iter().map(|record| record.name).collect(),
            ));
        }
        let Some(record) = candidates.pop() else {
            return Ok(VersionResult::Absent);
        };

        let tag = match record.version_tag() {
            Ok(Some(tag)) => tag,
            // Unreachable after the marker filter above.
            Ok(None) => return Ok(VersionResult::Absent),
            Err(TagError::MissingVersion) => {
                return Err(DetectionError::MissingVersionTag { name: record.name });
            }
            Err(TagError::CorruptVersion(raw)) => {
                return Err(DetectionError::CorruptVersionTag {
                    name: record.name,
                    raw,
                });
            }
        };

        match self.registry.known(tag.version) {
            Some(version) => Ok(VersionResult::Existing { version, record }),
            None => Err(DetectionError::UnknownVersion {
                name: record.name,
                version: tag.version,
                latest: self.registry.latest(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::VersionDetector;
    use crate::migration::error::{DetectionError, ErrorSeverity};
    use crate::migration::registry::MigrationRegistry;
    use crate::model::metadata::{Metadata, MANAGED_KEY, VERSION_KEY};
    use crate::model::record::ManagedRecord;
    use crate::model::version::{SchemaVersion, VersionResult};
    use serde_json::{json, Value};

    fn record(name: &str, pairs: &[(&str, Value)]) -> ManagedRecord {
        let mut record = ManagedRecord::new(name);
        record.metadata = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect::<Metadata>();
        record
    }

    fn detector() -> VersionDetector<'static> {
        VersionDetector::new(MigrationRegistry::builtin().expect("built-in registry"))
    }

    #[test]
    fn empty_and_unmanaged_are_absent() {
        assert_eq!(detector().classify(vec![]).unwrap(), VersionResult::Absent);

        let unmanaged = record("AnkiTune", &[("something", json!("or other"))]);
        assert_eq!(
            detector().classify(vec![unmanaged]).unwrap(),
            VersionResult::Absent
        );
    }

    #[test]
    fn known_version_is_paired_with_record() {
        let managed = record(
            "AnkiTune",
            &[(MANAGED_KEY, json!(true)), (VERSION_KEY, json!(1))],
        );
        let result = detector().classify(vec![managed.clone()]).unwrap();
        assert_eq!(
            result,
            VersionResult::Existing {
                version: SchemaVersion::new(1),
                record: managed,
            }
        );
    }

    #[test]
    fn future_and_zero_versions_are_unknown() {
        for raw in [66_u64, 0] {
            let managed = record(
                "AnkiTune",
                &[(MANAGED_KEY, json!(true)), (VERSION_KEY, json!(raw))],
            );
            let err = detector().classify(vec![managed]).unwrap_err();
            assert!(
                matches!(err, DetectionError::UnknownVersion { version, .. } if version == raw)
            );
            assert_eq!(err.severity(), ErrorSeverity::Recoverable);
        }
    }

    #[test]
    fn corruption_is_fatal() {
        let missing = record("AnkiTune", &[(MANAGED_KEY, json!(true))]);
        let err = detector().classify(vec![missing]).unwrap_err();
        assert!(matches!(err, DetectionError::MissingVersionTag { .. }));
        assert_eq!(err.severity(), ErrorSeverity::Fatal);

        let corrupt = record(
            "AnkiTune",
            &[(MANAGED_KEY, json!(true)), (VERSION_KEY, json!("two"))],
        );
        let err = detector().classify(vec![corrupt]).unwrap_err();
        assert!(matches!(err, DetectionError::CorruptVersionTag { .. }));

        let tag = [(MANAGED_KEY, json!(true)), (VERSION_KEY, json!(1))];
        let err = detector()
            .classify(vec![record("A", &tag), record("B", &tag)])
            .unwrap_err();
        assert!(matches!(err, DetectionError::MultipleManagedRecords(names) if names.len() == 2));
    }
}
