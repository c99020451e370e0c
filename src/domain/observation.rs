use chrono::{DateTime, Duration, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of input channels fed to the sequence model.
pub const SEQUENCE_CHANNELS: usize = 6;

/// One hourly reading from the feeder telemetry.
///
/// Historical observations are immutable once recorded; the forecast loop only
/// ever appends synthesized rows, it never edits existing ones.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    pub current_a: f64,
    pub voltage_v: f64,
    pub frequency_hz: f64,
    pub power_factor: f64,
    /// Target channel: the feeder load being forecast.
    pub load_kw: f64,
    pub aux_voltage_v: f64,
}

impl Observation {
    /// Input channels for the sequence model, in training order.
    pub fn sequence_channels(&self) -> [f64; SEQUENCE_CHANNELS] {
        [
            self.current_a,
            self.voltage_v,
            self.frequency_hz,
            self.power_factor,
            self.load_kw,
            self.aux_voltage_v,
        ]
    }

    /// Synthesize the next row of the recursion: a new timestamp and target
    /// value, every non-target channel carried forward unchanged.
    pub fn carried_forward(&self, timestamp: DateTime<Utc>, load_kw: f64) -> Self {
        Self {
            timestamp,
            load_kw,
            ..*self
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("window has {available} observations, {required} required")]
    TooShort { required: usize, available: usize },

    #[error("window is not hourly-contiguous at {timestamp} (gap of {gap_minutes} minutes)")]
    Discontinuous {
        timestamp: DateTime<Utc>,
        gap_minutes: i64,
    },
}

/// Run-local, append-only working window for one forecast run.
///
/// Rows are hourly-spaced and strictly increasing; this is checked once at
/// construction. The window grows by one synthesized row per iteration and is
/// never trimmed - lag and rolling reads only look a bounded distance back, so
/// growth affects memory, not correctness.
#[derive(Debug, Clone)]
pub struct WorkingWindow {
    rows: Vec<Observation>,
}

impl WorkingWindow {
    /// Build a window from a historical slice, validating length and hourly
    /// contiguity up front so no iteration ever sees a malformed window.
    pub fn from_history(rows: Vec<Observation>, min_len: usize) -> Result<Self, WindowError> {
        if rows.len() < min_len {
            return Err(WindowError::TooShort {
                required: min_len,
                available: rows.len(),
            });
        }

        for (prev, next) in rows.iter().tuple_windows() {
            let gap = next.timestamp - prev.timestamp;
            if gap != Duration::hours(1) {
                return Err(WindowError::Discontinuous {
                    timestamp: next.timestamp,
                    gap_minutes: gap.num_minutes(),
                });
            }
        }

        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    /// Latest observation. The constructor guarantees the window is non-empty.
    pub fn last(&self) -> &Observation {
        self.rows
            .last()
            .expect("window validated non-empty at construction")
    }

    /// Append one synthesized observation. Amortized O(1).
    pub fn append(&mut self, obs: Observation) {
        debug_assert_eq!(
            obs.timestamp - self.last().timestamp,
            Duration::hours(1),
            "appended row must extend the window by exactly one hour"
        );
        self.rows.push(obs);
    }
}
