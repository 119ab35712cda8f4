//! Domain model for managed note types and their notes.
//!
//! # Responsibility
//! - Define the strongly-typed record shapes the migration engine works on.
//! - Convert the open metadata bag into typed tags right at the boundary.
//!
//! # Invariants
//! - Every record and note is identified by a stable UUID.
//! - A record tagged as managed always carries a parseable version tag;
//!   violations are reported, never defaulted.

pub mod metadata;
pub mod note;
pub mod record;
pub mod version;
