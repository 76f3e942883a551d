//! Best-effort gameplay analytics
//!
//! Events fan out to every registered sink. A failing sink is logged and
//! skipped; tracking never fails from the caller's point of view.

use std::collections::{BTreeMap, VecDeque};

use thiserror::Error;

/// Event payload, ordered for stable output
pub type Fields = BTreeMap<String, String>;

/// How many tracked events [`Analytics`] remembers
pub const DEFAULT_HISTORY_LIMIT: usize = 64;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("sink unavailable: {0}")]
    Unavailable(String),
    #[error("sink rejected event: {0}")]
    Rejected(String),
}

/// Destination for tracked events
pub trait AnalyticsSink {
    fn emit(&mut self, event: &str, fields: &Fields) -> Result<(), AnalyticsError>;
}

/// Writes `[analytics] name k=v ...` lines through the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl AnalyticsSink for LogSink {
    fn emit(&mut self, event: &str, fields: &Fields) -> Result<(), AnalyticsError> {
        let mut line = format!("[analytics] {event}");
        for (key, value) in fields {
            line.push(' ');
            line.push_str(key);
            line.push('=');
            line.push_str(value);
        }
        log::info!("{line}");
        Ok(())
    }
}

/// A tracked event as delivered to sinks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedEvent {
    pub name: String,
    pub fields: Fields,
}

/// Analytics hub
pub struct Analytics {
    sinks: Vec<Box<dyn AnalyticsSink>>,
    /// Merged under every event's own fields (run context)
    base_fields: Fields,
    history: VecDeque<TrackedEvent>,
    history_limit: usize,
}

impl Default for Analytics {
    fn default() -> Self {
        let mut analytics = Self::silent();
        analytics.add_sink(Box::new(LogSink));
        analytics
    }
}

impl Analytics {
    /// Hub without any sink; events are only kept in history
    pub fn silent() -> Self {
        Self {
            sinks: Vec::new(),
            base_fields: Fields::new(),
            history: VecDeque::with_capacity(DEFAULT_HISTORY_LIMIT),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    pub fn add_sink(&mut self, sink: Box<dyn AnalyticsSink>) {
        self.sinks.push(sink);
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    pub fn set_base_fields(&mut self, fields: Fields) {
        self.base_fields = fields;
    }

    pub fn set_history_limit(&mut self, limit: usize) {
        self.history_limit = limit;
        while self.history.len() > limit {
            self.history.pop_front();
        }
    }

    /// Track an event; blank names and blank keys are dropped
    pub fn track(&mut self, event: &str, fields: Fields) {
        if event.trim().is_empty() {
            return;
        }

        let mut payload = self.base_fields.clone();
        payload.extend(fields.into_iter().filter(|(key, _)| !key.trim().is_empty()));

        for sink in &mut self.sinks {
            if let Err(e) = sink.emit(event, &payload) {
                log::warn!("analytics sink failure on '{event}': {e}");
            }
        }

        if self.history_limit == 0 {
            return;
        }
        if self.history.len() >= self.history_limit {
            self.history.pop_front();
        }
        self.history.push_back(TrackedEvent {
            name: event.to_string(),
            fields: payload,
        });
    }

    /// Recently tracked events, oldest first
    pub fn history(&self) -> impl Iterator<Item = &TrackedEvent> {
        self.history.iter()
    }

    pub fn count(&self, event: &str) -> usize {
        self.history.iter().filter(|e| e.name == event).count()
    }

    pub fn last(&self, event: &str) -> Option<&TrackedEvent> {
        self.history.iter().rev().find(|e| e.name == event)
    }
}

/// Build a [`Fields`] map from key/value pairs
pub fn fields<const N: usize>(pairs: [(&str, String); N]) -> Fields {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

/// Format a float the same way on every platform
pub fn format_f32(value: f32) -> String {
    format!("{value:.3}")
}
