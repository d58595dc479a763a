//! Logging configuration: compile-time bounds plus runtime preferences
//!
//! Buffer sizes and the security floor are fixed at build time. Everything
//! else comes from `LoggingPreferences`.

use crate::config::compile_time::logging::{
    LOG_BUFFER_SIZE, MAX_LOG_MESSAGE_LENGTH, SECURITY_MIN_LOG_LEVEL,
};
use crate::config::runtime::LoggingPreferences;
use std::sync::OnceLock;

type EventsLogLevel = crate::logging::events::LogLevel;

static RUNTIME_PREFERENCES: OnceLock<LoggingPreferences> = OnceLock::new();

/// Install runtime preferences; must happen before `init_global_logging`
pub fn init_runtime_preferences(preferences: LoggingPreferences) -> Result<(), String> {
    RUNTIME_PREFERENCES
        .set(preferences)
        .map_err(|_| "Runtime preferences already initialized".to_string())
}

fn get_runtime_preferences() -> LoggingPreferences {
    RUNTIME_PREFERENCES.get().cloned().unwrap_or_default()
}

/// Minimum level; security logging raises an Error-only setting to Warning
/// so version drift and deep-copy fallbacks stay visible.
pub fn get_min_log_level() -> EventsLogLevel {
    let preferences = get_runtime_preferences();
    let user_level = preferences.min_log_level.to_events_log_level();

    if preferences.log_security_events && (user_level as u8) < SECURITY_MIN_LOG_LEVEL {
        security_floor()
    } else {
        user_level
    }
}

fn security_floor() -> EventsLogLevel {
    match SECURITY_MIN_LOG_LEVEL {
        0 => EventsLogLevel::Error,
        1 => EventsLogLevel::Warning,
        2 => EventsLogLevel::Info,
        _ => EventsLogLevel::Debug,
    }
}

pub fn use_structured_logging() -> bool {
    get_runtime_preferences().use_structured_logging
}

pub fn use_console_logging() -> bool {
    get_runtime_preferences().enable_console_logging
}

pub fn get_error_buffer_size() -> usize {
    LOG_BUFFER_SIZE
}

/// Check the compile-time logging bounds are usable
pub fn validate_config() -> Result<(), String> {
    if LOG_BUFFER_SIZE == 0 {
        return Err("log_buffer_size must be greater than zero".to_string());
    }
    if MAX_LOG_MESSAGE_LENGTH < 64 {
        return Err("max_log_message_length must be at least 64".to_string());
    }
    Ok(())
}
