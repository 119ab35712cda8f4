//! Migration engine configuration.
//!
//! Defaults are overlaid with `TUNENOTE_*` environment variables. Invalid
//! values are logged and ignored.

use log::warn;

pub const DEFAULT_NOTE_TYPE_NAME: &str = "AnkiTune";

const ENV_NOTE_TYPE_NAME: &str = "TUNENOTE_NOTE_TYPE_NAME";
const ENV_HARD_MODE: &str = "TUNENOTE_HARD_MODE";

/// How recoverable errors are surfaced to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Recoverable errors are non-blocking warnings.
    #[default]
    Lenient,
    /// Every error blocks ("hard mode").
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigratorConfig {
    /// Name the managed note type is created under.
    pub note_type_name: String,
    pub error_mode: ErrorMode,
}

impl Default for MigratorConfig {
    fn default() -> Self {
        Self {
            note_type_name: DEFAULT_NOTE_TYPE_NAME.to_string(),
            error_mode: ErrorMode::Lenient,
        }
    }
}

impl MigratorConfig {
    /// Load configuration from environment variables with fallback to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(val) = lookup(ENV_NOTE_TYPE_NAME) {
            let trimmed = val.trim();
            if trimmed.is_empty() {
                warn!("event=config_load module=config status=invalid key={ENV_NOTE_TYPE_NAME}");
            } else {
                config.note_type_name = trimmed.to_string();
            }
        }

        if let Some(val) = lookup(ENV_HARD_MODE) {
            match val.trim().to_ascii_lowercase().as_str() {
                "" | "0" | "false" | "off" | "no" => config.error_mode = ErrorMode::Lenient,
                "1" | "true" | "on" | "yes" => config.error_mode = ErrorMode::Strict,
                _ => warn!("event=config_load module=config status=invalid key={ENV_HARD_MODE}"),
            }
        }

        config
    }
}
