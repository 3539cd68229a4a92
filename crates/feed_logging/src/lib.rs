#![deny(missing_docs)]
//! Shared logging utilities for the feed harvester workspace.
//!
//! This crate provides the `harvest_*` logging macros used across the
//! codebase, a thread-local harvest tick counter, and a minimal test
//! initializer for the global logger.

use std::cell::Cell;

thread_local! {
    /// Thread-local storage for the current harvest tick.
    static HARVEST_TICK: Cell<u64> = const { Cell::new(0) };
}

/// Sets the harvest tick for the current thread.
/// The automaton calls this once per growth-trigger tick.
pub fn set_harvest_tick(tick: u64) {
    HARVEST_TICK.with(|v| v.set(tick));
}

/// Retrieves the harvest tick for the current thread.
/// Returns 0 before the first tick of the first session.
pub fn harvest_tick() -> u64 {
    HARVEST_TICK.with(|v| v.get())
}

/// Logs a trace-level message prefixed with the current harvest tick.
#[macro_export]
macro_rules! harvest_trace {
    ($($arg:tt)*) => {{
        log::trace!("[tick {}] {}", $crate::harvest_tick(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message prefixed with the current harvest tick.
#[macro_export]
macro_rules! harvest_info {
    ($($arg:tt)*) => {{
        log::info!("[tick {}] {}", $crate::harvest_tick(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message prefixed with the current harvest tick.
#[macro_export]
macro_rules! harvest_debug {
    ($($arg:tt)*) => {{
        log::debug!("[tick {}] {}", $crate::harvest_tick(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message prefixed with the current harvest tick.
#[macro_export]
macro_rules! harvest_warn {
    ($($arg:tt)*) => {{
        log::warn!("[tick {}] {}", $crate::harvest_tick(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message prefixed with the current harvest tick.
#[macro_export]
macro_rules! harvest_error {
    ($($arg:tt)*) => {{
        log::error!("[tick {}] {}", $crate::harvest_tick(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
