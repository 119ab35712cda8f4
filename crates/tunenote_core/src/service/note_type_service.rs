//! Note type use-case service.
//!
//! # Responsibility
//! - Provide the `ensure_managed` entry point the host calls once per
//!   session: detect, migrate, then sync the presentation template.
//! - Classify failures into blocking and non-blocking for the host.
//!
//! # Invariants
//! - Steps always run in detect -> migrate -> template sync order.
//! - Calling `ensure_managed` again on a current record changes nothing but
//!   the (identical) template save.
//! - No error is guessed past; every failure halts the run.

use crate::config::{ErrorMode, MigratorConfig};
use crate::migration::detector::VersionDetector;
use crate::migration::error::{
    DetectionError, ErrorSeverity, MigrationError, RegistryError, SyncError,
};
use crate::migration::migrator::Migrator;
use crate::migration::registry::MigrationRegistry;
use crate::migration::template_sync::TemplatePresentationSync;
use crate::model::record::ManagedRecord;
use crate::model::version::VersionResult;
use crate::presentation::{PresentationBuilder, TuneCardBuilder};
use crate::repo::record_store::RecordStore;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

const DO_NOT_EDIT_HINT: &str = "Please do not edit the managed note type by hand. \
If you did not modify it, please report a bug.";

/// Failure of the `ensure_managed` pipeline.
#[derive(Debug)]
pub enum EnsureError {
    Registry(RegistryError),
    Detection(DetectionError),
    Migration(MigrationError),
    Sync(SyncError),
}

impl EnsureError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Registry(_) | Self::Sync(_) => ErrorSeverity::Fatal,
            Self::Detection(err) => err.severity(),
            Self::Migration(err) => err.severity(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Registry(_) => "migration_registry_invalid",
            Self::Detection(err) => err.code(),
            Self::Migration(err) => err.code(),
            Self::Sync(err) => err.code(),
        }
    }

    /// Whether the host must block the user on this error.
    ///
    /// Fatal errors always block. Recoverable ones block only in strict mode.
    pub fn is_blocking(&self, mode: ErrorMode) -> bool {
        self.severity() == ErrorSeverity::Fatal || mode == ErrorMode::Strict
    }

    /// Text suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Detection(DetectionError::UnknownVersion { name, .. }) => format!(
                "The note type `{name}` was written by a newer version of this add-on. \
                 Please upgrade the add-on; nothing was changed."
            ),
            Self::Migration(MigrationError::NameTaken(name)) => format!(
                "A note type named `{name}` already exists but is not managed by this add-on. \
                 Please rename it and restart."
            ),
            other => format!("Note type migration failed: {other}. {DO_NOT_EDIT_HINT}"),
        }
    }
}

impl Display for EnsureError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Registry(err) => write!(f, "{err}"),
            Self::Detection(err) => write!(f, "{err}"),
            Self::Migration(err) => write!(f, "{err}"),
            Self::Sync(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EnsureError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Registry(err) => Some(err),
            Self::Detection(err) => Some(err),
            Self::Migration(err) => Some(err),
            Self::Sync(err) => Some(err),
        }
    }
}

impl From<RegistryError> for EnsureError {
    fn from(value: RegistryError) -> Self {
        Self::Registry(value)
    }
}

impl From<DetectionError> for EnsureError {
    fn from(value: DetectionError) -> Self {
        Self::Detection(value)
    }
}

impl From<MigrationError> for EnsureError {
    fn from(value: MigrationError) -> Self {
        Self::Migration(value)
    }
}

impl From<SyncError> for EnsureError {
    fn from(value: SyncError) -> Self {
        Self::Sync(value)
    }
}

/// Detects, migrates and syncs the managed note type in `store`.
///
/// # Side effects
/// - Commits one store write per applied migration step plus one template
///   save.
/// - Emits `note_type_ensure` logging events with duration and status.
pub fn ensure_managed(
    store: &mut dyn RecordStore,
    config: &MigratorConfig,
    presentation: &dyn PresentationBuilder,
) -> Result<ManagedRecord, EnsureError> {
    let started_at = Instant::now();
    info!("event=note_type_ensure module=service status=start");

    let result = run_pipeline(store, config, presentation);
    match &result {
        Ok(record) => info!(
            "event=note_type_ensure module=service status=ok record_id={} duration_ms={}",
            record.id,
            started_at.elapsed().as_millis()
        ),
        Err(err) if err.is_blocking(config.error_mode) => error!(
            "event=note_type_ensure module=service status=error blocking=true duration_ms={} error_code={}",
            started_at.elapsed().as_millis(),
            err.code()
        ),
        Err(err) => warn!(
            "event=note_type_ensure module=service status=error blocking=false duration_ms={} error_code={}",
            started_at.elapsed().as_millis(),
            err.code()
        ),
    }
    result
}

fn run_pipeline(
    store: &mut dyn RecordStore,
    config: &MigratorConfig,
    presentation: &dyn PresentationBuilder,
) -> Result<ManagedRecord, EnsureError> {
    let registry = MigrationRegistry::builtin()?;
    let detected = VersionDetector::new(registry).detect(&*store)?;
    let record = Migrator::new(registry, config, presentation).migrate(store, detected)?;
    let record = TemplatePresentationSync::new(presentation).sync(store, record)?;
    Ok(record)
}

/// Returns whether `record` is managed and already at the latest version.
pub fn is_current_managed(record: &ManagedRecord, registry: &MigrationRegistry) -> bool {
    match VersionDetector::new(registry).classify(vec![record.clone()]) {
        Ok(VersionResult::Existing { version, .. }) => version == registry.latest(),
        _ => false,
    }
}

/// Use-case service owning a record store.
pub struct NoteTypeService<S: RecordStore> {
    store: S,
    config: MigratorConfig,
    presentation: Box<dyn PresentationBuilder>,
}

impl<S: RecordStore> NoteTypeService<S> {
    /// Creates a service using the default tune card presentation.
    pub fn new(store: S, config: MigratorConfig) -> Self {
        Self::with_presentation(store, config, Box::new(TuneCardBuilder))
    }

    pub fn with_presentation(
        store: S,
        config: MigratorConfig,
        presentation: Box<dyn PresentationBuilder>,
    ) -> Self {
        Self {
            store,
            config,
            presentation,
        }
    }

    pub fn config(&self) -> &MigratorConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// See `ensure_managed`.
    pub fn ensure_managed(&mut self) -> Result<ManagedRecord, EnsureError> {
        ensure_managed(&mut self.store, &self.config, self.presentation.as_ref())
    }

    /// Runs detection only.
    pub fn current_version(&self) -> Result<VersionResult, EnsureError> {
        let registry = MigrationRegistry::builtin()?;
        Ok(VersionDetector::new(registry).detect(&self.store)?)
    }
}
