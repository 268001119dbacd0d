use thiserror::Error;

/// Invalid indicator configuration. Raised while parsing the settings JSON.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("settings must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("invalid parameters for `{key}`: {source}")]
    Params {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("`{key}` must be an object, array, boolean or null, got {found}")]
    EntryShape { key: String, found: &'static str },

    #[error("`{key}.{param}` must be >= {min}, got {value}")]
    PeriodTooSmall {
        key: String,
        param: &'static str,
        min: usize,
        value: usize,
    },

    #[error("`{key}.{param}` must be <= {max}, got {value}")]
    PeriodTooLarge {
        key: String,
        param: &'static str,
        max: usize,
        value: usize,
    },

    #[error("`{key}.{param}` must be a positive finite number, got {value}")]
    NonPositive {
        key: String,
        param: &'static str,
        value: f64,
    },

    #[error("`{key}`: {reason}")]
    Invalid { key: String, reason: String },

    #[error("invalid period `{input}`: {reason}")]
    Period { input: String, reason: &'static str },
}

/// Errors surfaced by [`crate::Engine`] operations.
///
/// Data-quality problems in samples are never errors: they are sanitized and logged.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("input columns differ in length: {0}")]
    LengthMismatch(String),

    #[error("engine is not initialized; call initialize() first")]
    NotInitialized,

    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[source] serde_json::Error),
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
