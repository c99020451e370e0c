//! Historical observation source.
//!
//! The cleaned hourly feeder history is a CSV loaded once at startup and held
//! in memory, sorted by timestamp. Forecast runs copy their own slice out of
//! it; the store itself is immutable for the process lifetime.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use std::path::Path;
use tracing::info;

use crate::domain::Observation;

/// Chart responses above this row count are downsampled to daily means.
pub const MAX_CHART_ROWS: usize = 1000;

#[derive(Debug)]
pub struct HistoryStore {
    rows: Vec<Observation>,
}

impl HistoryStore {
    /// Load the cleaned history CSV. Expected header:
    /// `timestamp,current_a,voltage_v,frequency_hz,power_factor,load_kw,aux_voltage_v`
    /// with RFC 3339 timestamps.
    pub fn from_csv(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("opening history {}", path.display()))?;

        let mut rows = Vec::new();
        for (line, record) in reader.deserialize::<Observation>().enumerate() {
            let obs =
                record.with_context(|| format!("parsing history row {}", line + 1))?;
            rows.push(obs);
        }

        let store = Self::from_rows(rows)?;
        info!(
            path = %path.display(),
            rows = store.len(),
            "historical data loaded"
        );
        Ok(store)
    }

    /// Build a store from in-memory rows, sorting by timestamp and rejecting
    /// duplicates.
    pub fn from_rows(mut rows: Vec<Observation>) -> Result<Self> {
        rows.sort_by_key(|o| o.timestamp);
        for pair in rows.windows(2) {
            if pair[1].timestamp <= pair[0].timestamp {
                anyhow::bail!(
                    "duplicate observation timestamp {} in history",
                    pair[1].timestamp
                );
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

    /// The most recent `n` rows, or fewer when the history is shorter. The
    /// engine decides whether what it gets is enough.
    pub fn tail(&self, n: usize) -> &[Observation] {
        let start = self.rows.len().saturating_sub(n);
        &self.rows[start..]
    }

    /// Rows within the inclusive timestamp range. Either bound may be open.
    pub fn range(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Vec<Observation> {
        self.rows
            .iter()
            .filter(|o| start.map_or(true, |s| o.timestamp >= s))
            .filter(|o| end.map_or(true, |e| o.timestamp <= e))
            .copied()
            .collect()
    }
}

/// Collapse hourly rows into one mean observation per calendar day,
/// timestamped at midnight. Used to keep chart payloads bounded.
pub fn daily_means(rows: &[Observation]) -> Vec<Observation> {
    let mut out: Vec<Observation> = Vec::new();
    let mut day_start: Option<DateTime<Utc>> = None;
    let mut bucket: Vec<Observation> = Vec::new();

    for obs in rows {
        let midnight = obs
            .timestamp
            .date_naive()
            .and_time(chrono::NaiveTime::MIN)
            .and_utc();
        if day_start != Some(midnight) {
            if let Some(start) = day_start {
                out.push(mean_of(start, &bucket));
            }
            day_start = Some(midnight);
            bucket.clear();
        }
        bucket.push(*obs);
    }
    if let Some(start) = day_start {
        out.push(mean_of(start, &bucket));
    }

    out
}

fn mean_of(timestamp: DateTime<Utc>, bucket: &[Observation]) -> Observation {
    let n = bucket.len() as f64;
    Observation {
        timestamp,
        current_a: bucket.iter().map(|o| o.current_a).sum::<f64>() / n,
        voltage_v: bucket.iter().map(|o| o.voltage_v).sum::<f64>() / n,
        frequency_hz: bucket.iter().map(|o| o.frequency_hz).sum::<f64>() / n,
        power_factor: bucket.iter().map(|o| o.power_factor).sum::<f64>() / n,
        load_kw: bucket.iter().map(|o| o.load_kw).sum::<f64>() / n,
        aux_voltage_v: bucket.iter().map(|o| o.aux_voltage_v).sum::<f64>() / n,
    }
}

/// Helper shared by tests and fixtures: `n` contiguous hourly rows ending at
/// `end`, loads supplied per row.
pub fn hourly_series(end: DateTime<Utc>, loads: &[f64]) -> Vec<Observation> {
    let n = loads.len() as i64;
    loads
        .iter()
        .enumerate()
        .map(|(i, &load_kw)| Observation {
            timestamp: end - Duration::hours(n - 1 - i as i64),
            current_a: 12.0,
            voltage_v: 231.5,
            frequency_hz: 50.0,
            power_factor: 0.94,
            load_kw,
            aux_voltage_v: 229.8,
        })
        .collect()
}
