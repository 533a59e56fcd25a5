//! In-process log ring served by the admin logs endpoint.
//!
//! [`LogCaptureLayer`] is installed in the tracing registry next to the fmt
//! layer and copies every formatted event into a bounded [`LogBuffer`].
//! Reading the buffer requires an [`AdminGrant`].

use std::collections::VecDeque;
use std::fmt::{self, Write as _};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

use crate::authz::AdminGrant;

/// Lines kept when no capacity is configured.
pub const DEFAULT_CAPACITY: usize = 1000;

/// One captured log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogLine {
    pub text: String,
}

/// Bounded ring of recent log lines. Cloning shares the ring.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    lines: Arc<Mutex<VecDeque<LogLine>>>,
    capacity: usize,
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl LogBuffer {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Append a line, evicting the oldest when full.
    pub fn push(&self, text: impl Into<String>) {
        let mut lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        if lines.len() == self.capacity {
            lines.pop_front();
        }
        lines.push_back(LogLine { text: text.into() });
    }

    /// Copy of the ring, most recent line first.
    #[must_use]
    pub fn snapshot(&self, _grant: &AdminGrant) -> Vec<LogLine> {
        let lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        lines.iter().rev().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Tracing layer feeding this buffer.
    #[must_use]
    pub fn layer(&self) -> LogCaptureLayer {
        LogCaptureLayer {
            buffer: self.clone(),
        }
    }
}

/// `tracing_subscriber` layer that records events into a [`LogBuffer`].
#[derive(Debug, Clone)]
pub struct LogCaptureLayer {
    buffer: LogBuffer,
}

impl<S: Subscriber> Layer<S> for LogCaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);

        let mut line = format!(
            "{} {:>5} {}: {}",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            metadata.level(),
            metadata.target(),
            visitor.message,
        );
        line.push_str(&visitor.fields);
        self.buffer.push(line);
    }
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={value}", field.name());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.fields, " {}={value:?}", field.name());
        }
    }
}
