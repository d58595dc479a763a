use crate::credentials::CredentialError;
use crate::logging::codes;
use crate::script::ScriptError;
use crate::validation::ValidationError;
use thiserror::Error;

/// Contract bytes that are not a JSON contract
///
/// Only the error class and position are kept; serde_json messages can quote
/// the offending value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("contract is not a valid document ({category} error at line {line}, column {column})")]
pub struct DecodeError {
    pub category: &'static str,
    pub line: usize,
    pub column: usize,
}

impl From<serde_json::Error> for DecodeError {
    fn from(error: serde_json::Error) -> Self {
        let category = match error.classify() {
            serde_json::error::Category::Io => "io",
            serde_json::error::Category::Syntax => "syntax",
            serde_json::error::Category::Data => "data",
            serde_json::error::Category::Eof => "eof",
        };
        Self {
            category,
            line: error.line(),
            column: error.column(),
        }
    }
}

/// Pipeline processing errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Contract decoding failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("Contract validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Script compilation failed: {0}")]
    Script(#[from] ScriptError),

    #[error("Credential selection failed: {0}")]
    Credentials(#[from] CredentialError),
}

impl PipelineError {
    pub fn error_code(&self) -> codes::Code {
        match self {
            Self::Decode(_) => codes::contract::DECODE_FAILED,
            Self::Validation(inner) => inner.error_code(),
            Self::Script(inner) => inner.error_code(),
            Self::Credentials(inner) => inner.error_code(),
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
