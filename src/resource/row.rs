//! Rows and row sinks
//!
//! Enumerations stream rows into a [`RowSink`] one at a time and poll
//! [`RowSink::rows_remaining`] after each row. A sink reporting zero
//! remaining rows stops the enumeration without error. Sinks take `&self` so
//! one sink can be shared by enumerations running concurrently for
//! different parents.

use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// A flat mapping from column name to value, in column declaration order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Row(Map<String, Value>);

impl Row {
    pub fn with_capacity(capacity: usize) -> Self {
        Self(Map::with_capacity(capacity))
    }

    pub fn insert(&mut self, column: &str, value: Value) {
        self.0.insert(column.to_string(), value);
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    /// String value of a column, if it holds one
    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.0.get(column).and_then(Value::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

/// Destination for streamed rows
pub trait RowSink: Send + Sync {
    /// Accept one row
    fn stream_row(&self, row: Row);

    /// Rows still wanted; `u64::MAX` when unlimited, zero once the
    /// consumer has enough rows or has been cancelled
    fn rows_remaining(&self) -> u64;
}

/// Cooperative cancellation flag shared between a consumer and enumerations
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

fn remaining(limit: Option<u64>, emitted: u64, stop: &StopSignal) -> u64 {
    if stop.is_stopped() {
        return 0;
    }
    match limit {
        Some(limit) => limit.saturating_sub(emitted),
        None => u64::MAX,
    }
}

/// Collects rows in memory, up to an optional limit
#[derive(Debug, Default)]
pub struct RowCollector {
    rows: Mutex<Vec<Row>>,
    limit: Option<u64>,
    stop: StopSignal,
}

impl RowCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: u64) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// Use `stop` as this collector's cancellation flag
    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().map(|rows| rows.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RowSink for RowCollector {
    fn stream_row(&self, row: Row) {
        let mut rows = self.rows.lock().unwrap_or_else(|p| p.into_inner());
        if self.limit.is_some_and(|limit| rows.len() as u64 >= limit) {
            tracing::trace!("Row limit reached, dropping row");
            return;
        }
        rows.push(row);
    }

    fn rows_remaining(&self) -> u64 {
        remaining(self.limit, self.len() as u64, &self.stop)
    }
}

/// Forwards rows over a channel; a dropped receiver counts as cancellation
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Row>,
    emitted: Arc<AtomicU64>,
    limit: Option<u64>,
    stop: StopSignal,
}

impl ChannelSink {
    pub fn new(limit: Option<u64>) -> (Self, mpsc::UnboundedReceiver<Row>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = Self {
            tx,
            emitted: Arc::new(AtomicU64::new(0)),
            limit,
            stop: StopSignal::new(),
        };
        (sink, rx)
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }
}

impl RowSink for ChannelSink {
    fn stream_row(&self, row: Row) {
        // Claim a slot first so concurrent producers cannot overshoot the limit
        let claimed = self
            .emitted
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| match self.limit {
                Some(limit) if n >= limit => None,
                _ => Some(n + 1),
            });
        if claimed.is_err() {
            tracing::trace!("Row limit reached, dropping row");
            return;
        }

        if self.tx.send(row).is_err() {
            tracing::debug!("Row receiver dropped, stopping");
            self.stop.stop();
        }
    }

    fn rows_remaining(&self) -> u64 {
        if self.tx.is_closed() {
            return 0;
        }
        remaining(self.limit, self.emitted.load(Ordering::SeqCst), &self.stop)
    }
}
