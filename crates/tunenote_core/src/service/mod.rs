//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate detection, migration and template sync into the single
//!   `ensure_managed` entry point.
//! - Keep host/UI layers decoupled from storage details.

pub mod note_type_service;
