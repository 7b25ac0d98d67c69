use std::fmt;

/// Rejects structurally invalid parser configuration.
///
/// The parser never raises on malformed *input* — ill-formed ASLAN text
/// degrades to literal text or no-ops by design. This error type exists
/// only for the narrower case of misconfiguring the parser itself, before
/// any input has been seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `defaultFieldName` must be non-empty; it is used as a map key.
    EmptyDefaultFieldName,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyDefaultFieldName => {
                write!(f, "defaultFieldName must not be empty")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
