//! Record store contract and persistence implementation.
//!
//! # Responsibility
//! - Define the narrow store contract the migration engine depends on.
//! - Isolate SQLite query details from migration orchestration.
//!
//! # Invariants
//! - Read paths reject malformed persisted data instead of masking it.
//! - A migration step's record and note writes commit in one transaction.

pub mod record_store;
