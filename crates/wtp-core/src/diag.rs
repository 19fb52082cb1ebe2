//! Leveled diagnostic printing, tagged with a debug header
//!
//! A small stand-in for the kernel-style `printk`-ish debug output this
//! codebase favors elsewhere, adapted so that it is driven entirely by
//! explicit calls (`set_log_level`, `init`) rather than environment
//! variables: the pool's external interface promises no env-var
//! configuration, and this diagnostics facility is part of that surface.
//!
//! # Usage
//!
//! ```ignore
//! use wtp_core::diag::{self, LogLevel};
//!
//! diag::set_log_level(LogLevel::Debug);
//! wdebug!("w3", "picked up {} items", 12);
//! ```

use std::sync::atomic::{AtomicU8, Ordering};

/// Log levels, ordered least to most verbose
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => LogLevel::Off,
            1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Warn as u8);

/// Set the global log level. Affects all subsequent `wtrace!`/`wdebug!`/...
/// calls across every pool and worker in the process.
pub fn set_log_level(level: LogLevel) {
    LOG_LEVEL.store(level as u8, Ordering::Relaxed);
}

/// Read the currently configured log level
pub fn log_level() -> LogLevel {
    LogLevel::from_u8(LOG_LEVEL.load(Ordering::Relaxed))
}

/// Reset diagnostics to their default (`Warn`) level. Mainly useful in tests
/// that want a clean slate regardless of what earlier tests configured.
pub fn init() {
    set_log_level(LogLevel::Warn);
}

#[doc(hidden)]
pub fn enabled(level: LogLevel) -> bool {
    level <= log_level()
}

#[doc(hidden)]
pub fn emit(level: LogLevel, tag: &str, args: std::fmt::Arguments<'_>) {
    let name = match level {
        LogLevel::Off => return,
        LogLevel::Error => "ERROR",
        LogLevel::Warn => "WARN",
        LogLevel::Info => "INFO",
        LogLevel::Debug => "DEBUG",
        LogLevel::Trace => "TRACE",
    };
    eprintln!("[{}] [{}] {}", name, tag, args);
}

/// Emit at `Error` level if enabled
#[macro_export]
macro_rules! werror {
    ($tag:expr, $($arg:tt)*) => {
        if $crate::diag::enabled($crate::diag::LogLevel::Error) {
            $crate::diag::emit($crate::diag::LogLevel::Error, $tag, format_args!($($arg)*));
        }
    };
}

/// Emit at `Warn` level if enabled
#[macro_export]
macro_rules! wwarn {
    ($tag:expr, $($arg:tt)*) => {
        if $crate::diag::enabled($crate::diag::LogLevel::Warn) {
            $crate::diag::emit($crate::diag::LogLevel::Warn, $tag, format_args!($($arg)*));
        }
    };
}

/// Emit at `Info` level if enabled
#[macro_export]
macro_rules! winfo {
    ($tag:expr, $($arg:tt)*) => {
        if $crate::diag::enabled($crate::diag::LogLevel::Info) {
            $crate::diag::emit($crate::diag::LogLevel::Info, $tag, format_args!($($arg)*));
        }
    };
}

/// Emit at `Debug` level if enabled
#[macro_export]
macro_rules! wdebug {
    ($tag:expr, $($arg:tt)*) => {
        if $crate::diag::enabled($crate::diag::LogLevel::Debug) {
            $crate::diag::emit($crate::diag::LogLevel::Debug, $tag, format_args!($($arg)*));
        }
    };
}

/// Emit at `Trace` level if enabled
#[macro_export]
macro_rules! wtrace {
    ($tag:expr, $($arg:tt)*) => {
        if $crate::diag::enabled($crate::diag::LogLevel::Trace) {
            $crate::diag::emit($crate::diag::LogLevel::Trace, $tag, format_args!($($arg)*));
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Error < LogLevel::Warn);
        assert!(LogLevel::Debug < LogLevel::Trace);
    }

    #[test]
    fn test_set_and_read_level() {
        set_log_level(LogLevel::Trace);
        assert_eq!(log_level(), LogLevel::Trace);
        assert!(enabled(LogLevel::Trace));
        init();
        assert_eq!(log_level(), LogLevel::Warn);
        assert!(!enabled(LogLevel::Debug));
    }
}
