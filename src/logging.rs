//! Logging and the user-visible event history
//!
//! `init` installs the tracing subscriber for the process. `EventLog` is the
//! append-only history of parameter changes and fetch outcomes that the UI
//! shows read-only in its "Change History" panel; every entry is also
//! emitted through `tracing`.

use chrono::Utc;
use parking_lot::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging for the process
pub fn init(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Entry severity, mirrored into the rendered line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    Info,
    Error,
}

impl EventLevel {
    fn label(&self) -> &'static str {
        match self {
            EventLevel::Info => "INFO",
            EventLevel::Error => "ERROR",
        }
    }
}

/// Append-only, in-memory event history
#[derive(Debug, Default)]
pub struct EventLog {
    lines: Mutex<Vec<String>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one timestamped line and mirror it to tracing
    pub fn record(&self, level: EventLevel, message: &str) {
        let line = format!(
            "{} - {} - {}",
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
            level.label(),
            message
        );

        match level {
            EventLevel::Info => tracing::info!("{}", message),
            EventLevel::Error => tracing::error!("{}", message),
        }

        self.lines.lock().push(line);
    }

    pub fn info(&self, message: &str) {
        self.record(EventLevel::Info, message);
    }

    pub fn error(&self, message: &str) {
        self.record(EventLevel::Error, message);
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }

    /// Full history, one line per entry, oldest first
    pub fn snapshot(&self) -> String {
        self.lines.lock().join("\n")
    }
}
