//! Error types for contract compatibility validation

use crate::logging::codes;
use thiserror::Error;

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Contract version rejected by the version gate
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("contract version is missing")]
    Missing,

    #[error("contract version '{version}' is not a semantic version")]
    Unparsable { version: String },

    /// The compiled-in expected version itself failed to parse
    #[error("expected version '{version}' is not a semantic version")]
    UnparsableExpected { version: String },

    #[error("contract major version {actual} is incompatible with expected major version {expected}")]
    MajorMismatch { expected: u64, actual: u64 },
}

impl VersionError {
    pub fn unparsable(version: &str) -> Self {
        Self::Unparsable {
            version: version.to_string(),
        }
    }

    pub fn unparsable_expected(version: &str) -> Self {
        Self::UnparsableExpected {
            version: version.to_string(),
        }
    }

    pub fn major_mismatch(expected: u64, actual: u64) -> Self {
        Self::MajorMismatch { expected, actual }
    }

    pub fn error_code(&self) -> codes::Code {
        match self {
            Self::Missing | Self::Unparsable { .. } | Self::UnparsableExpected { .. } => {
                codes::validation::VERSION_UNPARSABLE
            }
            Self::MajorMismatch { .. } => codes::validation::MAJOR_VERSION_MISMATCH,
        }
    }
}

/// Contract rejected by explicit validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error(transparent)]
    Version(#[from] VersionError),

    #[error("required field {field} is missing")]
    RequiredField { field: &'static str },

    #[error("contract carries {count} custom CA certificates, maximum allowed is {limit}")]
    TooManyCustomCaCerts { count: usize, limit: usize },
}

impl ValidationError {
    pub fn required_field(field: &'static str) -> Self {
        Self::RequiredField { field }
    }

    pub fn too_many_custom_ca_certs(count: usize, limit: usize) -> Self {
        Self::TooManyCustomCaCerts { count, limit }
    }

    pub fn error_code(&self) -> codes::Code {
        match self {
            Self::Version(inner) => inner.error_code(),
            Self::RequiredField { .. } | Self::TooManyCustomCaCerts { .. } => {
                codes::validation::REQUIRED_FIELD_MISSING
            }
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Version(_) => "Version",
            Self::RequiredField { .. } => "RequiredField",
            Self::TooManyCustomCaCerts { .. } => "LimitExceeded",
        }
    }
}
