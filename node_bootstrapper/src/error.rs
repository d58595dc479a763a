use nbc_compiler::logging::codes;
use nbc_compiler::PipelineError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures around the compiler: reading input, writing artifacts, running
/// the script
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("failed to read contract {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("contract {} is {size} bytes, limit is {limit}", .path.display())]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("contract {} is not valid UTF-8", .path.display())]
    Encoding { path: PathBuf },

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to start bootstrap script: {source}")]
    Start {
        #[source]
        source: io::Error,
    },

    #[error("bootstrap script exited with {}", describe_exit(.code))]
    Exit { code: Option<i32> },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (terminated by signal)".to_string(),
    }
}

impl ProvisionError {
    pub fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    pub fn error_code(&self) -> codes::Code {
        match self {
            Self::Read { .. } => codes::provision::CONTRACT_READ_FAILED,
            Self::TooLarge { .. } => codes::provision::CONTRACT_TOO_LARGE,
            Self::Encoding { .. } => codes::provision::INVALID_ENCODING,
            Self::Pipeline(inner) => inner.error_code(),
            Self::Write { .. } => codes::provision::FILE_WRITE_FAILED,
            Self::Start { .. } => codes::provision::SCRIPT_START_FAILED,
            Self::Exit { .. } => codes::provision::SCRIPT_EXIT_NONZERO,
        }
    }

    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Exit { code: Some(code) } if *code != 0 => *code,
            _ => 1,
        }
    }
}
