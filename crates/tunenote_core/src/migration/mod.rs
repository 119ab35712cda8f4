//! Versioned note type schema migration.
//!
//! # Responsibility
//! - Detect the on-store schema version of the managed note type.
//! - Walk the registered chain of steps up to the latest version.
//! - Keep exactly one managed presentation template on the record.
//!
//! # Invariants
//! - The chain is gap-free and validated before first use.
//! - Each step commits before the next one starts.
//! - Re-running on a current record is a no-op.
//!
//! Data flows one way: `VersionDetector` -> `Migrator` ->
//! `TemplatePresentationSync`.

pub mod detector;
pub mod error;
pub mod migrator;
pub mod registry;
pub mod steps;
pub mod template_sync;
