//! Logging boundary for merge diagnostics.
//!
//! The merge engines never format user-facing output beyond building message strings;
//! everything is reported through the [`Log`] trait, which callers provide explicitly
//! (there are no global logger singletons in this crate). [`FacadeLog`] forwards to the
//! `log` crate facade for applications that already configure one.

/// Receiver for merge diagnostics.
///
/// Recoverable merge conflicts are reported here as warnings or errors while the merge
/// proceeds; stage transitions are reported as info. Implementations must not assume any
/// particular message format.
pub trait Log {
    /// Report a stage transition or other informational event.
    fn info(&self, msg: &str);

    /// Report a recoverable conflict that was resolved by policy.
    fn warn(&self, msg: &str);

    /// Report a condition that prevented an optional transformation from being applied.
    fn error(&self, msg: &str);
}

/// [`Log`] implementation forwarding to the `log` crate facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct FacadeLog;

impl Log for FacadeLog {
    fn info(&self, msg: &str) {
        log::info!("{}", msg);
    }

    fn warn(&self, msg: &str) {
        log::warn!("{}", msg);
    }

    fn error(&self, msg: &str) {
        log::error!("{}", msg);
    }
}

/// [`Log`] implementation that discards all messages.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLog;

impl Log for NullLog {
    fn info(&self, _msg: &str) {}
    fn warn(&self, _msg: &str) {}
    fn error(&self, _msg: &str) {}
}

/// Capturing [`Log`] implementation for inspecting emitted diagnostics.
///
/// Primarily useful in tests that assert on warning counts or message content.
#[derive(Debug, Default)]
pub struct MemoryLog {
    messages: std::cell::RefCell<Vec<(LogLevel, String)>>,
}

/// Severity attached to a captured [`MemoryLog`] message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Informational message
    Info,
    /// Recoverable conflict
    Warn,
    /// Rejected transformation
    Error,
}

impl MemoryLog {
    /// Create an empty capture log.
    #[must_use]
    pub fn new() -> Self {
        MemoryLog::default()
    }

    /// All captured messages in emission order.
    #[must_use]
    pub fn messages(&self) -> Vec<(LogLevel, String)> {
        self.messages.borrow().clone()
    }

    /// Captured warning messages in emission order.
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        self.messages
            .borrow()
            .iter()
            .filter(|(level, _)| *level == LogLevel::Warn)
            .map(|(_, msg)| msg.clone())
            .collect()
    }

    /// Captured error messages in emission order.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.messages
            .borrow()
            .iter()
            .filter(|(level, _)| *level == LogLevel::Error)
            .map(|(_, msg)| msg.clone())
            .collect()
    }
}

impl Log for MemoryLog {
    fn info(&self, msg: &str) {
        self.messages
            .borrow_mut()
            .push((LogLevel::Info, msg.to_string()));
    }

    fn warn(&self, msg: &str) {
        self.messages
            .borrow_mut()
            .push((LogLevel::Warn, msg.to_string()));
    }

    fn error(&self, msg: &str) {
        self.messages
            .borrow_mut()
            .push((LogLevel::Error, msg.to_string()));
    }
}
