//! Built-in note type schema steps.
//!
//! - v1: `Name`, `Tune Type`, `ABC`, `Link`.
//! - v2: `Key` split out of `Tune Type` (`"em reel"` becomes `Key="em"`,
//!   `Tune Type="reel"`).

use crate::migration::error::{MigrationError, MigrationResult};
use crate::migration::registry::{Migration, MigrationContext, MigrationStep};
use crate::model::metadata::VersionTag;
use crate::model::record::ManagedRecord;
use crate::model::version::SchemaVersion;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

pub const FIELD_NAME: &str = "Name";
pub const FIELD_KEY: &str = "Key";
pub const FIELD_TUNE_TYPE: &str = "Tune Type";
pub const FIELD_ABC: &str = "ABC";
pub const FIELD_LINK: &str = "Link";

pub const V1_FIELDS: [&str; 4] = [FIELD_NAME, FIELD_TUNE_TYPE, FIELD_ABC, FIELD_LINK];
pub const V2_FIELDS: [&str; 5] = [FIELD_NAME, FIELD_KEY, FIELD_TUNE_TYPE, FIELD_ABC, FIELD_LINK];

// Tonic A-G, optional accidental, optional mode: `D`, `em`, `Edor`, `F#m`, `Bbmix`.
static MUSICAL_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^[a-g](?:#|b|♯|♭)?(?:m|min|minor|maj|major|dor|dorian|mix|mixolydian|lyd|lydian|phr|phrygian|loc|locrian|aeo|aeolian|ion|ionian)?$",
    )
    .expect("valid musical key regex")
});

/// The built-in chain, in registration order.
pub fn builtin_migrations() -> Vec<Migration> {
    vec![
        Migration {
            name: "create_note_type",
            from: SchemaVersion::ABSENT,
            to: SchemaVersion::new(1),
            apply: create_note_type,
        },
        Migration {
            name: "split_key_from_tune_type",
            from: SchemaVersion::new(1),
            to: SchemaVersion::new(2),
            apply: split_key_from_tune_type,
        },
    ]
}

/// v0 -> v1: creates the managed note type from nothing.
///
/// # Errors
/// - `NameTaken` when an unmanaged note type already uses the configured
///   name. The existing record is left untouched.
fn create_note_type(
    ctx: &MigrationContext<'_>,
    existing: Option<ManagedRecord>,
) -> MigrationResult<MigrationStep> {
    if existing.is_some() {
        return Err(MigrationError::UnexpectedInput {
            step: "create_note_type",
            reason: "a record already exists at version 0",
        });
    }

    let name = ctx.config.note_type_name.as_str();
    if ctx.store.by_name(name)?.is_some() {
        return Err(MigrationError::NameTaken(name.to_string()));
    }

    let mut record = ctx.store.create(name)?;
    for field in V1_FIELDS {
        record.add_field(field);
    }

    // The fresh record gets our template as its only one.
    let mut template = ctx.presentation.build(&record);
    template.ordinal = 0;
    record.templates = vec![template];

    record.set_version_tag(VersionTag::new(1));
    Ok(MigrationStep::record_only(record))
}

/// v1 -> v2: adds `Key` after `Name` and splits existing note values.
fn split_key_from_tune_type(
    ctx: &MigrationContext<'_>,
    existing: Option<ManagedRecord>,
) -> MigrationResult<MigrationStep> {
    let mut record = existing.ok_or(MigrationError::UnexpectedInput {
        step: "split_key_from_tune_type",
        reason: "no record to migrate",
    })?;

    record.insert_field_after(FIELD_NAME, FIELD_KEY);
    record.set_version_tag(VersionTag::new(2));

    let mut notes = ctx.store.notes_of(record.id)?;
    notes.retain(|note| note.fields.get(FIELD_KEY).is_none());
    for note in &mut notes {
        match note.fields.get(FIELD_TUNE_TYPE).map(split_key) {
            Some(Some((key, tune_type))) => {
                note.fields.insert_after(FIELD_NAME, FIELD_KEY, key);
                note.fields.set(FIELD_TUNE_TYPE, tune_type);
            }
            Some(None) | None => note.fields.insert_after(FIELD_NAME, FIELD_KEY, ""),
        }
    }

    debug!(
        "event=note_type_key_split module=migration status=ok notes={}",
        notes.len()
    );
    Ok(MigrationStep { record, notes })
}

/// Splits a leading musical key off a tune type value.
///
/// Returns `None` when the first token does not look like a key; the value
/// is then left exactly as it was.
pub fn split_key(tune_type: &str) -> Option<(String, String)> {
    let trimmed = tune_type.trim();
    let (head, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim_start()),
        None => (trimmed, ""),
    };

    MUSICAL_KEY_RE
        .is_match(head)
        .then(|| (head.to_string(), rest.to_string()))
}
