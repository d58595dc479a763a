//! Forwards coded compiler events into the `log` facade

use nbc_compiler::config::runtime::LoggingPreferences;
use nbc_compiler::logging::{self, LogEvent, LogLevel, Logger, LoggingService};
use std::sync::Arc;

pub const LOG_TARGET: &str = "node_bootstrapper";

#[derive(Debug, Default, Clone, Copy)]
pub struct LogBridge;

impl LogBridge {
    fn level(level: LogLevel) -> log::Level {
        match level {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warning => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
        }
    }
}

impl Logger for LogBridge {
    fn log(&self, event: &LogEvent) {
        let level = Self::level(event.level);
        if !log::log_enabled!(target: LOG_TARGET, level) {
            return;
        }

        let mut line = format!("{} {}", event.code, event.message);
        for (key, value) in &event.context {
            line.push_str(&format!(" {}={}", key, value));
        }
        log::log!(target: LOG_TARGET, level, "{}", line);
    }
}

/// Install the process-wide compiler logger.
///
/// With structured logging preferred, events are written as JSON lines by the
/// compiler's own sink; otherwise they are forwarded to `env_logger`.
pub fn install(preferences: LoggingPreferences) -> Result<(), String> {
    let structured = preferences.use_structured_logging;
    logging::config::init_runtime_preferences(preferences)?;

    if structured {
        logging::init_global_logging()
    } else {
        let service = LoggingService::new(Arc::new(LogBridge), logging::config::get_min_log_level());
        logging::init_global_logging_with_service(Arc::new(service))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nbc_compiler::config::runtime::LogLevel as PreferredLevel;

    #[test]
    fn test_level_mapping() {
        assert_eq!(LogBridge::level(LogLevel::Error), log::Level::Error);
        assert_eq!(LogBridge::level(LogLevel::Warning), log::Level::Warn);
        assert_eq!(LogBridge::level(LogLevel::Debug), log::Level::Debug);
    }

    #[test]
    fn test_install_applies_preferences_once() {
        let preferences = LoggingPreferences {
            use_structured_logging: false,
            enable_console_logging: true,
            min_log_level: PreferredLevel::Debug,
            log_security_events: true,
        };

        install(preferences.clone()).unwrap();
        assert!(logging::debug_enabled());
        assert!(install(preferences).is_err());
    }
}
