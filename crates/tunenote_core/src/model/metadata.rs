//! Out-of-band metadata tags.
//!
//! Records and templates carry an open `Metadata` map. The engine reserves a
//! few keys in it and reads them through `VersionTag` and `TemplateTag` so the
//! rest of the crate never touches raw JSON values.

use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Schema-agnostic key/value bag attached to records and templates.
pub type Metadata = Map<String, Value>;

/// Marker key: `true` when the record is managed by this engine.
pub const MANAGED_KEY: &str = "tunenote_nt";
/// Integer schema version of a managed record.
pub const VERSION_KEY: &str = "tunenote_nt_version";
/// Marker key: `true` on the one presentation template we own.
pub const TEMPLATE_KEY: &str = "tunenote_tpl";

/// Typed view over the managed marker and version keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionTag {
    pub version: u64,
}

/// Metadata says "managed" but the version key is unusable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagError {
    MissingVersion,
    CorruptVersion(String),
}

impl Display for TagError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingVersion => write!(f, "managed marker present without `{VERSION_KEY}`"),
            Self::CorruptVersion(raw) => {
                write!(f, "`{VERSION_KEY}` is not a non-negative integer: {raw}")
            }
        }
    }
}

impl Error for TagError {}

impl VersionTag {
    pub fn new(version: u64) -> Self {
        Self { version }
    }

    /// Reads the tag from `metadata`.
    ///
    /// Returns `Ok(None)` for records we do not manage. Only a boolean `true`
    /// marker counts as managed.
    ///
    /// # Errors
    /// - `TagError::MissingVersion` when the marker is set but no version is.
    /// - `TagError::CorruptVersion` when the version is not a non-negative
    ///   integer (JSON number or decimal string).
    pub fn read(metadata: &Metadata) -> Result<Option<Self>, TagError> {
        if !is_marked(metadata, MANAGED_KEY) {
            return Ok(None);
        }

        let raw = metadata.get(VERSION_KEY).ok_or(TagError::MissingVersion)?;
        let version = match raw {
            Value::Number(number) => number.as_u64(),
            Value::String(text) => text.trim().parse::<u64>().ok(),
            _ => None,
        };

        version
            .map(|version| Some(Self { version }))
            .ok_or_else(|| TagError::CorruptVersion(raw.to_string()))
    }

    /// Writes marker and version into `metadata`, keeping unrelated keys.
    pub fn write(&self, metadata: &mut Metadata) {
        metadata.insert(MANAGED_KEY.to_string(), Value::Bool(true));
        metadata.insert(VERSION_KEY.to_string(), Value::from(self.version));
    }
}

/// Typed view over the managed-template marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateTag;

impl TemplateTag {
    pub fn is_present(metadata: &Metadata) -> bool {
        is_marked(metadata, TEMPLATE_KEY)
    }

    pub fn write(metadata: &mut Metadata) {
        metadata.insert(TEMPLATE_KEY.to_string(), Value::Bool(true));
    }
}

/// Returns whether `metadata` carries the managed-record marker.
pub fn is_managed(metadata: &Metadata) -> bool {
    is_marked(metadata, MANAGED_KEY)
}

fn is_marked(metadata: &Metadata, key: &str) -> bool {
    matches!(metadata.get(key), Some(Value::Bool(true)))
}

#[cfg(test)]
mod tests {
    use super::{is_managed, Metadata, TagError, TemplateTag, VersionTag};
    use serde_json::json;

    fn metadata(value: serde_json::Value) -> Metadata {
        value.as_object().cloned().expect("fixture must be an object")
    }

    #[test]
    fn unmanaged_metadata_has_no_tag() {
        let meta = metadata(json!({"something": "or other"}));
        assert_eq!(VersionTag::read(&meta), Ok(None));
        assert!(!is_managed(&meta));
    }

    #[test]
    fn truthy_non_bool_marker_is_not_managed() {
        let meta = metadata(json!({"tunenote_nt": 1, "tunenote_nt_version": 1}));
        assert_eq!(VersionTag::read(&meta), Ok(None));
    }

    #[test]
    fn reads_numeric_and_string_versions() {
        let numeric = metadata(json!({"tunenote_nt": true, "tunenote_nt_version": 2}));
        assert_eq!(VersionTag::read(&numeric), Ok(Some(VersionTag::new(2))));

        let text = metadata(json!({"tunenote_nt": true, "tunenote_nt_version": " 1 "}));
        assert_eq!(VersionTag::read(&text), Ok(Some(VersionTag::new(1))));
    }

    #[test]
    fn missing_or_corrupt_version_is_an_error() {
        let missing = metadata(json!({"tunenote_nt": true}));
        assert_eq!(VersionTag::read(&missing), Err(TagError::MissingVersion));

        for bad in [json!(-1), json!(1.5), json!("v2"), json!(null), json!([1])] {
            let meta = metadata(json!({"tunenote_nt": true, "tunenote_nt_version": bad}));
            assert!(matches!(
                VersionTag::read(&meta),
                Err(TagError::CorruptVersion(_))
            ));
        }
    }

    #[test]
    fn write_preserves_unrelated_keys() {
        let mut meta = metadata(json!({"user_key": "kept"}));
        VersionTag::new(3).write(&mut meta);
        TemplateTag::write(&mut meta);

        assert_eq!(meta["user_key"], "kept");
        assert_eq!(VersionTag::read(&meta), Ok(Some(VersionTag::new(3))));
        assert!(TemplateTag::is_present(&meta));
    }
}
