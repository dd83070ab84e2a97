//! Severity-tagged messages collected during assembly and simulation.
//!
//! The kernel never prints. Everything worth reporting is pushed into a
//! [`MessageHandler`] which the caller drains, and is mirrored as a
//! `tracing` event at the matching level.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// Oldest messages are dropped past this many undrained entries.
pub const MAX_QUEUED_MESSAGES: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Debug,
        Severity::Info,
        Severity::Warning,
        Severity::Error,
        Severity::Fatal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }

    pub fn is_error(self) -> bool {
        self >= Severity::Error
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub severity: Severity,
    pub text: String,
    /// Short machine-readable category, e.g. `connect` or `initialize`.
    pub tag: String,
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tag.is_empty() {
            write!(f, "[{}] {}", self.severity, self.text)
        } else {
            write!(f, "[{}] ({}) {}", self.severity, self.tag, self.text)
        }
    }
}

#[derive(Debug, Default)]
struct Queue {
    pending: VecDeque<Message>,
    emitted: [usize; 5],
    fatal_generation: u64,
}

/// Shared handle to one message queue. Clones push into the same queue.
#[derive(Debug, Clone, Default)]
pub struct MessageHandler {
    inner: Arc<Mutex<Queue>>,
}

impl MessageHandler {
    pub fn new() -> Self {
        Self::default()
    }

    fn queue(&self) -> MutexGuard<'_, Queue> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push(&self, severity: Severity, text: impl Into<String>, tag: impl Into<String>) {
        let message = Message {
            severity,
            text: text.into(),
            tag: tag.into(),
        };
        match severity {
            Severity::Debug => tracing::debug!(tag = %message.tag, "{}", message.text),
            Severity::Info => tracing::info!(tag = %message.tag, "{}", message.text),
            Severity::Warning => tracing::warn!(tag = %message.tag, "{}", message.text),
            Severity::Error | Severity::Fatal => {
                tracing::error!(tag = %message.tag, severity = %severity, "{}", message.text)
            }
        }
        let mut queue = self.queue();
        queue.emitted[severity.slot()] += 1;
        if severity == Severity::Fatal {
            queue.fatal_generation += 1;
        }
        if queue.pending.len() >= MAX_QUEUED_MESSAGES {
            queue.pending.pop_front();
        }
        queue.pending.push_back(message);
    }

    pub fn debug(&self, text: impl Into<String>, tag: impl Into<String>) {
        self.push(Severity::Debug, text, tag);
    }

    pub fn info(&self, text: impl Into<String>, tag: impl Into<String>) {
        self.push(Severity::Info, text, tag);
    }

    pub fn warning(&self, text: impl Into<String>, tag: impl Into<String>) {
        self.push(Severity::Warning, text, tag);
    }

    pub fn error(&self, text: impl Into<String>, tag: impl Into<String>) {
        self.push(Severity::Error, text, tag);
    }

    pub fn fatal(&self, text: impl Into<String>, tag: impl Into<String>) {
        self.push(Severity::Fatal, text, tag);
    }

    /// Number of undrained messages.
    pub fn check_message(&self) -> usize {
        self.queue().pending.len()
    }

    /// Pop the oldest undrained message.
    pub fn get_message(&self) -> Option<Message> {
        self.queue().pending.pop_front()
    }

    pub fn drain(&self) -> Vec<Message> {
        self.queue().pending.drain(..).collect()
    }

    /// Total messages of `severity` pushed since creation, drained or not.
    pub fn emitted(&self, severity: Severity) -> usize {
        self.queue().emitted[severity.slot()]
    }

    /// Count of Fatal messages since creation. Unlike [`emitted`](Self::emitted)
    /// it is never reset, so a run can watch it across `clear`.
    pub fn fatal_generation(&self) -> u64 {
        self.queue().fatal_generation
    }

    pub fn has_errors(&self) -> bool {
        let queue = self.queue();
        queue.emitted[Severity::Error.slot()] + queue.emitted[Severity::Fatal.slot()] > 0
    }

    /// Drop pending messages and reset the per-severity counts.
    pub fn clear(&self) {
        let mut queue = self.queue();
        queue.pending.clear();
        queue.emitted = [0; 5];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_fifo_and_shared_between_clones() {
        let handler = MessageHandler::new();
        let clone = handler.clone();
        handler.info("first", "t");
        clone.warning("second", "t");
        assert_eq!(handler.check_message(), 2);
        assert_eq!(clone.get_message().unwrap().text, "first");
        assert_eq!(handler.get_message().unwrap().severity, Severity::Warning);
        assert!(handler.get_message().is_none());
    }

    #[test]
    fn emitted_counts_survive_draining() {
        let handler = MessageHandler::new();
        handler.error("bad", "connect");
        handler.debug("noise", "");
        assert!(handler.has_errors());
        assert_eq!(handler.drain().len(), 2);
        assert_eq!(handler.check_message(), 0);
        assert_eq!(handler.emitted(Severity::Error), 1);
        assert!(handler.has_errors());
        handler.clear();
        assert!(!handler.has_errors());
    }

    #[test]
    fn fatal_generation_survives_clear() {
        let handler = MessageHandler::new();
        handler.fatal("first", "run");
        handler.clear();
        assert_eq!(handler.emitted(Severity::Fatal), 0);
        assert_eq!(handler.fatal_generation(), 1);
        handler.fatal("second", "run");
        assert_eq!(handler.fatal_generation(), 2);
    }

    #[test]
    fn queue_is_bounded() {
        let handler = MessageHandler::new();
        for i in 0..(MAX_QUEUED_MESSAGES + 5) {
            handler.debug(format!("m{i}"), "");
        }
        assert_eq!(handler.check_message(), MAX_QUEUED_MESSAGES);
        assert_eq!(handler.get_message().unwrap().text, "m5");
    }

    #[test]
    fn display_includes_tag() {
        let msg = Message {
            severity: Severity::Fatal,
            text: "boom".into(),
            tag: "simulate".into(),
        };
        assert_eq!(msg.to_string(), "[fatal] (simulate) boom");
        assert!(Severity::Fatal.is_error());
        assert!(!Severity::Warning.is_error());
    }
}
