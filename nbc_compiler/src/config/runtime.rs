// RUNTIME PREFERENCES (operator-facing knobs read from the environment)

use crate::contract::NodeOs;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingPreferences {
    /// Emit JSON lines instead of plain text
    pub use_structured_logging: bool,

    /// Whether console output is enabled at all
    pub enable_console_logging: bool,

    /// Minimum level that reaches the logger
    pub min_log_level: LogLevel,

    /// Always surface security-relevant events (version drift, redaction)
    pub log_security_events: bool,
}

impl Default for LoggingPreferences {
    fn default() -> Self {
        Self {
            use_structured_logging: env::var(env_vars::LOGGING_USE_STRUCTURED)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            enable_console_logging: env::var(env_vars::LOGGING_ENABLE_CONSOLE)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            min_log_level: env::var(env_vars::LOGGING_MIN_LEVEL)
                .ok()
                .and_then(|v| parse_log_level(&v))
                .unwrap_or(LogLevel::Info),
            log_security_events: env::var(env_vars::LOGGING_LOG_SECURITY)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilerPreferences {
    /// Run the required-field check before compiling
    pub validate_required_fields: bool,

    /// OS used for credential paths when the caller does not say
    pub default_node_os: NodeOs,
}

impl Default for CompilerPreferences {
    fn default() -> Self {
        Self {
            validate_required_fields: env::var(env_vars::COMPILER_VALIDATE_REQUIRED_FIELDS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            default_node_os: env::var(env_vars::COMPILER_DEFAULT_NODE_OS)
                .ok()
                .and_then(|v| NodeOs::parse(&v))
                .unwrap_or(NodeOs::Linux),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionPreferences {
    /// Write artifacts but never start the bootstrap script
    pub dry_run: bool,

    /// Where the compiled one-line script is persisted before execution.
    /// Empty disables persistence.
    pub script_path: String,
}

impl Default for ProvisionPreferences {
    fn default() -> Self {
        Self {
            dry_run: env::var(env_vars::PROVISION_DRY_RUN)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            script_path: env::var(env_vars::PROVISION_SCRIPT_PATH)
                .unwrap_or_else(|_| "/opt/azure/containers/cse_cmd.sh".to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Error = 0,
    Warning = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }

    pub fn to_events_log_level(&self) -> crate::logging::events::LogLevel {
        match self {
            LogLevel::Error => crate::logging::events::LogLevel::Error,
            LogLevel::Warning => crate::logging::events::LogLevel::Warning,
            LogLevel::Info => crate::logging::events::LogLevel::Info,
            LogLevel::Debug => crate::logging::events::LogLevel::Debug,
        }
    }
}

/// Parse log level from string (used for environment variables)
pub fn parse_log_level(level: &str) -> Option<LogLevel> {
    match level.to_lowercase().as_str() {
        "error" | "0" => Some(LogLevel::Error),
        "warning" | "warn" | "1" => Some(LogLevel::Warning),
        "info" | "2" => Some(LogLevel::Info),
        "debug" | "3" => Some(LogLevel::Debug),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub logging: LoggingPreferences,
    pub compiler: CompilerPreferences,
    pub provision: ProvisionPreferences,
}

/// Environment variable names for configuration
pub mod env_vars {
    // Logging
    pub const LOGGING_USE_STRUCTURED: &str = "NBC_LOGGING_USE_STRUCTURED";
    pub const LOGGING_ENABLE_CONSOLE: &str = "NBC_LOGGING_ENABLE_CONSOLE";
    pub const LOGGING_MIN_LEVEL: &str = "NBC_LOGGING_MIN_LEVEL";
    pub const LOGGING_LOG_SECURITY: &str = "NBC_LOGGING_LOG_SECURITY";

    // Compiler
    pub const COMPILER_VALIDATE_REQUIRED_FIELDS: &str = "NBC_VALIDATE_REQUIRED_FIELDS";
    pub const COMPILER_DEFAULT_NODE_OS: &str = "NBC_DEFAULT_NODE_OS";

    // Provisioning
    pub const PROVISION_DRY_RUN: &str = "NBC_PROVISION_DRY_RUN";
    pub const PROVISION_SCRIPT_PATH: &str = "NBC_PROVISION_SCRIPT_PATH";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(parse_log_level("error"), Some(LogLevel::Error));
        assert_eq!(parse_log_level("ERROR"), Some(LogLevel::Error));
        assert_eq!(parse_log_level("0"), Some(LogLevel::Error));
        assert_eq!(parse_log_level("warn"), Some(LogLevel::Warning));
        assert_eq!(parse_log_level("warning"), Some(LogLevel::Warning));
        assert_eq!(parse_log_level("info"), Some(LogLevel::Info));
        assert_eq!(parse_log_level("debug"), Some(LogLevel::Debug));
        assert_eq!(parse_log_level("3"), Some(LogLevel::Debug));
        assert_eq!(parse_log_level("verbose"), None);
    }

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Error < LogLevel::Warning);
        assert!(LogLevel::Info < LogLevel::Debug);
        assert_eq!(
            LogLevel::Warning.to_events_log_level(),
            crate::logging::events::LogLevel::Warning
        );
    }

    #[test]
    fn test_env_var_names_are_prefixed() {
        for name in [
            env_vars::LOGGING_MIN_LEVEL,
            env_vars::COMPILER_VALIDATE_REQUIRED_FIELDS,
            env_vars::PROVISION_SCRIPT_PATH,
        ] {
            assert!(name.starts_with("NBC_"));
        }
    }
}
