//! User-facing notices.
//!
//! Cart operations never hand errors to their callers; failures become one of
//! a fixed set of transient messages routed through a [`Notifier`].

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    AddFailed,
    RemoveFailed,
    UpdateFailed,
    OutOfStock,
}

impl Notice {
    pub fn message(&self) -> &'static str {
        match self {
            Notice::AddFailed => "Error adding product",
            Notice::RemoveFailed => "Error removing product",
            Notice::UpdateFailed => "Error changing product amount",
            Notice::OutOfStock => "Requested amount is out of stock",
        }
    }
}

impl core::fmt::Display for Notice {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.message())
    }
}

/// Sink for notices (a toast area, a status line, a log).
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Logs every notice at `warn`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        tracing::warn!(notice = ?notice, "{}", notice.message());
    }
}

/// Collects notices in memory for later display.
///
/// Clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notices received so far, oldest first.
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Drain the buffer.
    pub fn take(&self) -> Vec<Notice> {
        std::mem::take(
            &mut *self
                .notices
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(notice);
    }
}
