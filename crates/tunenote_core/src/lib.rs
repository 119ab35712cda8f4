//! Note type schema migration engine for TuneNote.
//! This crate owns the lifecycle of the managed tune note type: creating it,
//! migrating it across schema versions and keeping its template current.

pub mod config;
pub mod db;
pub mod logging;
pub mod migration;
pub mod model;
pub mod presentation;
pub mod repo;
pub mod service;

pub use config::{ErrorMode, MigratorConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use migration::detector::VersionDetector;
pub use migration::error::{
    DetectionError, ErrorSeverity, MigrationError, MigrationResult, RegistryError, SyncError,
};
pub use migration::migrator::Migrator;
pub use migration::registry::{
    Migration, MigrationContext, MigrationFn, MigrationRegistry, MigrationStep,
};
pub use migration::template_sync::{TemplatePlacement, TemplatePresentationSync};
pub use model::metadata::{Metadata, TagError, TemplateTag, VersionTag};
pub use model::note::{Note, NoteFields, NoteId};
pub use model::record::{ManagedRecord, RecordId, Template};
pub use model::version::{SchemaVersion, VersionResult};
pub use presentation::{PresentationBuilder, TuneCardBuilder};
pub use repo::record_store::{RecordStore, SqliteRecordStore, StoreError, StoreResult};
pub use service::note_type_service::{
    ensure_managed, is_current_managed, EnsureError, NoteTypeService,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
