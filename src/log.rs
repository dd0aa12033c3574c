//! Leveled log sink used by the build.
//!
//! The engine reports rebuild reasons and per-asset outcomes through
//! [`BuildLog`] rather than straight to `tracing`, so embedding hosts and tests
//! can capture exactly what was said. [`TracingLog`] is the default sink and
//! forwards everything to the `tracing` facade.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Log message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Verbose,
    Information,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Verbose => write!(f, "verbose"),
            LogLevel::Information => write!(f, "information"),
            LogLevel::Warning => write!(f, "warning"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Sink for build diagnostics.
pub trait BuildLog: Send + Sync {
    fn write(&self, level: LogLevel, message: &str);

    fn verbose(&self, message: &str) {
        self.write(LogLevel::Verbose, message);
    }

    fn information(&self, message: &str) {
        self.write(LogLevel::Information, message);
    }

    fn warning(&self, message: &str) {
        self.write(LogLevel::Warning, message);
    }

    fn error(&self, message: &str) {
        self.write(LogLevel::Error, message);
    }
}

/// Forwards to the `tracing` macros.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl BuildLog for TracingLog {
    fn write(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Verbose => tracing::debug!("{}", message),
            LogLevel::Information => tracing::info!("{}", message),
            LogLevel::Warning => tracing::warn!("{}", message),
            LogLevel::Error => tracing::error!("{}", message),
        }
    }
}

/// Captures messages in memory.
///
/// Clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct MemoryLog {
    lines: Arc<Mutex<Vec<(LogLevel, String)>>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured `(level, message)` pairs in order.
    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Captured messages, without levels.
    pub fn messages(&self) -> Vec<String> {
        self.lines().into_iter().map(|(_, m)| m).collect()
    }

    /// Whether any captured message equals `message`.
    pub fn contains(&self, message: &str) -> bool {
        self.lines().iter().any(|(_, m)| m == message)
    }

    pub fn clear(&self) {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl BuildLog for MemoryLog {
    fn write(&self, level: LogLevel, message: &str) {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).push((level, message.to_string()));
    }
}
