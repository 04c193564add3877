use thiserror::Error;

use crate::flags::FlagKind;

/// Failures raised while validating or persisting community settings.
///
/// Validation variants are turned into reply text at the command boundary.
/// Persistence variants are logged by the store and never reach a user.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("unknown flag `{0}`")]
    UnknownFlag(String),

    #[error("invalid value `{value}` for {kind} flag `{flag}`")]
    InvalidValue {
        flag: String,
        kind: FlagKind,
        value: String,
    },

    #[error("{0} cannot be empty")]
    EmptyInput(&'static str),

    #[error("settings storage I/O failed: {0}")]
    Persistence(#[from] std::io::Error),

    #[error("settings document is malformed: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type SettingsResult<T> = std::result::Result<T, SettingsError>;
