//! Progress notifications from inside the bar loop.
//!
//! A sink is a fire-and-forget observer: it cannot fail the run and it never
//! sees mutable engine state.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::Sender;
use std::sync::Mutex;

/// Snapshot delivered to a progress sink.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Bars processed before this one, as a fraction of the series (0.0..1.0).
    pub fraction: f64,
    pub equity: f64,
    pub timestamp: NaiveDateTime,
}

/// Receives coarse-grained progress updates during a simulation.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

/// Sink that ignores every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&self, _event: &ProgressEvent) {}
}

impl<F> ProgressSink for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn on_progress(&self, event: &ProgressEvent) {
        self(event)
    }
}

/// Forwards events over a channel. A dropped receiver is silently ignored.
#[derive(Debug)]
pub struct ChannelProgress {
    sender: Mutex<Sender<ProgressEvent>>,
}

impl ChannelProgress {
    pub fn new(sender: Sender<ProgressEvent>) -> Self {
        Self {
            sender: Mutex::new(sender),
        }
    }
}

impl ProgressSink for ChannelProgress {
    fn on_progress(&self, event: &ProgressEvent) {
        if let Ok(sender) = self.sender.lock() {
            let _ = sender.send(*event);
        }
    }
}

/// Collects every event in memory.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl ProgressSink for RecordingProgress {
    fn on_progress(&self, event: &ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(*event);
        }
    }
}

/// Reporting stride: roughly every 1% of the series, at least every bar.
pub fn progress_stride(total_bars: usize) -> usize {
    (total_bars / 100).max(1)
}
