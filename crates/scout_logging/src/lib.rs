#![deny(missing_docs)]
//! Shared logging utilities for the scout workspace.
//!
//! This crate provides the `scout_*` logging macros used across the codebase
//! and a minimal test initializer for the global logger. Every message is
//! prefixed with the result page the current thread is working on, so a log
//! of a multi-page crawl reads in page order.

use std::cell::Cell;

thread_local! {
    /// Thread-local storage for the result page being scraped.
    static PAGE: Cell<u32> = const { Cell::new(0) };
}

/// Sets the result page number for the current thread.
/// The runner calls this once at the start of every scrape pass.
pub fn set_page(page: u32) {
    PAGE.with(|v| v.set(page));
}

/// Retrieves the result page number for the current thread.
/// Returns 0 outside of a scrape pass.
pub fn current_page() -> u32 {
    PAGE.with(|v| v.get())
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! scout_trace {
    ($($arg:tt)*) => {{
        log::trace!("[p{}] {}", $crate::current_page(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! scout_debug {
    ($($arg:tt)*) => {{
        log::debug!("[p{}] {}", $crate::current_page(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! scout_info {
    ($($arg:tt)*) => {{
        log::info!("[p{}] {}", $crate::current_page(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! scout_warn {
    ($($arg:tt)*) => {{
        log::warn!("[p{}] {}", $crate::current_page(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! scout_error {
    ($($arg:tt)*) => {{
        log::error!("[p{}] {}", $crate::current_page(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
