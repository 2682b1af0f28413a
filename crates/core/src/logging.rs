//! Centralized logging configuration for the emulator.
//!
//! A process-global, thread-safe configuration holds one verbosity level per
//! subsystem category. The `log()` entry point takes a lazy message closure
//! so that disabled categories cost a single atomic load and nothing else.
//!
//! # Usage
//!
//! ```rust
//! use ricoh_core::logging::{log, LogCategory, LogLevel};
//!
//! log(LogCategory::Cartridge, LogLevel::Warn, || {
//!     format!("CHR ROM truncated: {} bytes available", 4096)
//! });
//! ```

use std::sync::atomic::{AtomicU8, Ordering};

/// Log level for controlling verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    /// Parse a log level from a string (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "off" | "0" => Some(LogLevel::Off),
            "error" | "err" | "1" => Some(LogLevel::Error),
            "warn" | "warning" | "2" => Some(LogLevel::Warn),
            "info" | "3" => Some(LogLevel::Info),
            "debug" | "4" => Some(LogLevel::Debug),
            "trace" | "5" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    fn from_u8(val: u8) -> Self {
        match val {
            1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            5 => LogLevel::Trace,
            _ => LogLevel::Off,
        }
    }
}

/// Log category, one per emulator subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogCategory {
    Cpu,
    Bus,
    Ppu,
    Apu,
    Cartridge,
    Interrupts,
}

impl LogCategory {
    const COUNT: usize = 6;

    fn index(self) -> usize {
        match self {
            LogCategory::Cpu => 0,
            LogCategory::Bus => 1,
            LogCategory::Ppu => 2,
            LogCategory::Apu => 3,
            LogCategory::Cartridge => 4,
            LogCategory::Interrupts => 5,
        }
    }

    fn name(self) -> &'static str {
        match self {
            LogCategory::Cpu => "cpu",
            LogCategory::Bus => "bus",
            LogCategory::Ppu => "ppu",
            LogCategory::Apu => "apu",
            LogCategory::Cartridge => "cart",
            LogCategory::Interrupts => "irq",
        }
    }
}

/// Thread-safe global logging configuration.
///
/// Levels are stored per category as atomics; changing them at runtime takes
/// effect immediately on all threads.
pub struct LogConfig {
    levels: [AtomicU8; LogCategory::COUNT],
}

// Recoverable loader conditions default to visible; everything else is off
// until a host opts in.
const DEFAULT_LEVEL: LogLevel = LogLevel::Warn;

static GLOBAL: LogConfig = LogConfig {
    levels: [
        AtomicU8::new(DEFAULT_LEVEL as u8),
        AtomicU8::new(DEFAULT_LEVEL as u8),
        AtomicU8::new(DEFAULT_LEVEL as u8),
        AtomicU8::new(DEFAULT_LEVEL as u8),
        AtomicU8::new(DEFAULT_LEVEL as u8),
        AtomicU8::new(DEFAULT_LEVEL as u8),
    ],
};

impl LogConfig {
    /// Access the process-global configuration.
    pub fn global() -> &'static LogConfig {
        &GLOBAL
    }

    /// Set the level for a single category.
    pub fn set_level(&self, category: LogCategory, level: LogLevel) {
        self.levels[category.index()].store(level as u8, Ordering::Relaxed);
    }

    /// Set the level for every category at once.
    pub fn set_all(&self, level: LogLevel) {
        for slot in &self.levels {
            slot.store(level as u8, Ordering::Relaxed);
        }
    }

    /// Current level for a category.
    pub fn level(&self, category: LogCategory) -> LogLevel {
        LogLevel::from_u8(self.levels[category.index()].load(Ordering::Relaxed))
    }

    /// Whether a message at `level` for `category` would be emitted.
    pub fn should_log(&self, category: LogCategory, level: LogLevel) -> bool {
        level != LogLevel::Off && level <= self.level(category)
    }
}

/// Emit a log message. The closure is only invoked when the category's
/// configured level admits `level`.
pub fn log<F>(category: LogCategory, level: LogLevel, message: F)
where
    F: FnOnce() -> String,
{
    if LogConfig::global().should_log(category, level) {
        eprintln!("[{}:{:?}] {}", category.name(), level, message());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_ordering() {
        assert!(LogLevel::Error < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Debug);
        assert!(LogLevel::Debug < LogLevel::Trace);
    }

    #[test]
    fn level_parsing() {
        assert_eq!(LogLevel::from_str("warn"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::from_str("TRACE"), Some(LogLevel::Trace));
        assert_eq!(LogLevel::from_str("3"), Some(LogLevel::Info));
        assert_eq!(LogLevel::from_str("bogus"), None);
    }

    #[test]
    fn disabled_category_skips_closure() {
        let config = LogConfig::global();
        config.set_level(LogCategory::Cpu, LogLevel::Off);
        let mut evaluated = false;
        log(LogCategory::Cpu, LogLevel::Error, || {
            evaluated = true;
            String::new()
        });
        assert!(!evaluated);
        config.set_level(LogCategory::Cpu, DEFAULT_LEVEL);
    }
}
