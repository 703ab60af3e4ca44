#![deny(missing_docs)]
//! Shared logging utilities for the query desk workspace.
//!
//! This crate provides the `desk_*` logging macros used by the coordinator,
//! the gateway and the CLI, plus helpers for installing a global logger.

use log::LevelFilter;

/// Environment variable read by [`initialize_for_tests`] to pick a level.
pub const TEST_LOG_ENV: &str = "QUERY_DESK_TEST_LOG";

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! desk_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! desk_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! desk_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! desk_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! desk_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Parses a level name such as `"info"` or `"DEBUG"`.
///
/// Returns `None` for anything `log` does not recognise.
pub fn parse_level(raw: &str) -> Option<LevelFilter> {
    raw.trim().parse::<LevelFilter>().ok()
}

/// Initializes a simple terminal logger for use in tests.
///
/// The level comes from [`TEST_LOG_ENV`] when set, otherwise debug in debug
/// builds and info in release builds. Safely no-ops if another logger has
/// already been installed.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

    let fallback = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let level = std::env::var(TEST_LOG_ENV)
        .ok()
        .and_then(|raw| parse_level(&raw))
        .unwrap_or(fallback);

    // Another test may have installed the logger already.
    let _ = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    );
}
