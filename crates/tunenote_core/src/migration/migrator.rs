//! Migration driver.
//!
//! # Responsibility
//! - Walk the registry chain from the detected version to a target version.
//! - Commit every step before advancing to the next one.
//!
//! # Invariants
//! - Steps run in strictly increasing order, one version at a time.
//! - A failing step persists nothing; earlier steps stay committed, so a
//!   re-run resumes from the last committed version.
//! - Migrating an already-current record performs no writes.

use crate::config::MigratorConfig;
use crate::migration::error::{MigrationError, MigrationResult};
use crate::migration::registry::{MigrationContext, MigrationRegistry};
use crate::model::record::ManagedRecord;
use crate::model::version::{SchemaVersion, VersionResult};
use crate::presentation::PresentationBuilder;
use crate::repo::record_store::RecordStore;
use log::{debug, error, info, warn};
use std::time::Instant;

pub struct Migrator<'a> {
    registry: &'a MigrationRegistry,
    config: &'a MigratorConfig,
    presentation: &'a dyn PresentationBuilder,
}

impl<'a> Migrator<'a> {
    pub fn new(
        registry: &'a MigrationRegistry,
        config: &'a MigratorConfig,
        presentation: &'a dyn PresentationBuilder,
    ) -> Self {
        Self {
            registry,
            config,
            presentation,
        }
    }

    /// Migrates to the latest known version and returns the final record.
    pub fn migrate(
        &self,
        store: &mut dyn RecordStore,
        detected: VersionResult,
    ) -> MigrationResult<ManagedRecord> {
        let latest = self.registry.latest();
        match self.migrate_to(store, detected, latest)? {
            VersionResult::Existing { record, .. } => Ok(record),
            VersionResult::Absent => Err(MigrationError::MissingMigration(latest.next())),
        }
    }

    /// Migrates up to and including `target`, stopping there.
    ///
    /// Records already at or beyond `target` are returned unchanged.
    ///
    /// # Errors
    /// - `MissingMigration` when `target` is beyond the latest known version.
    /// - `ChainBroken` when the walk would skip or repeat a version.
    /// - Any error a step returns; that step's changes are not persisted.
    pub fn migrate_to(
        &self,
        store: &mut dyn RecordStore,
        detected: VersionResult,
        target: SchemaVersion,
    ) -> MigrationResult<VersionResult> {
        let latest = self.registry.latest();
        if target > latest {
            return Err(MigrationError::MissingMigration(target));
        }

        let (mut current, mut record) = detected.into_parts();
        if current > latest {
            return Err(MigrationError::ChainBroken {
                current,
                target: latest,
            });
        }

        let started_at = Instant::now();
        let from = current;
        info!(
            "event=note_type_migrate module=migration status=start from={} to={}",
            from.get(),
            target.get()
        );

        for migration in self.registry.iter() {
            if migration.to <= current {
                debug!(
                    "event=note_type_migrate_step module=migration status=skip to={}",
                    migration.to.get()
                );
                continue;
            }
            if migration.to > target {
                break;
            }
            if current.next() != migration.to {
                let err = MigrationError::ChainBroken {
                    current,
                    target: migration.to,
                };
                self.log_failure(from, started_at, &err);
                return Err(err);
            }

            let step = {
                let ctx = MigrationContext {
                    store: &*store,
                    config: self.config,
                    presentation: self.presentation,
                };
                (migration.apply)(&ctx, record.take())
            };
            let step = match step {
                Ok(step) => step,
                Err(err) => {
                    self.log_failure(from, started_at, &err);
                    return Err(err);
                }
            };

            if let Err(err) = store.commit_step(&step.record, &step.notes) {
                let err = MigrationError::from(err);
                self.log_failure(from, started_at, &err);
                return Err(err);
            }

            info!(
                "event=note_type_migrate_step module=migration status=ok step={} from={} to={} notes={}",
                migration.name,
                migration.from.get(),
                migration.to.get(),
                step.notes.len()
            );
            current = migration.to;
            record = Some(step.record);
        }

        info!(
            "event=note_type_migrate module=migration status=ok from={} to={} duration_ms={}",
            from.get(),
            current.get(),
            started_at.elapsed().as_millis()
        );

        Ok(match record {
            Some(record) if !current.is_absent() => VersionResult::Existing {
                version: current,
                record,
            },
            _ => VersionResult::Absent,
        })
    }

    fn log_failure(&self, from: SchemaVersion, started_at: Instant, err: &MigrationError) {
        let elapsed = started_at.elapsed().as_millis();
        if matches!(err, MigrationError::NameTaken(_)) {
            warn!(
                "event=note_type_migrate module=migration status=error from={} duration_ms={} error_code={} error={}",
                from.get(),
                elapsed,
                err.code(),
                err
            );
        } else {
            error!(
                "event=note_type_migrate module=migration status=error from={} duration_ms={} error_code={} error={}",
                from.get(),
                elapsed,
                err.code(),
                err
            );
        }
    }
}
