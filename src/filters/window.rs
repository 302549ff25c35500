//! Query window resolution

use crate::clock::{BoundedClock, Clock};
use crate::query::QueryExecutor;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

/// Query time range: `start` inclusive, `end` exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Window of length `lookback` whose exclusive end sits one millisecond
    /// past `max_time`, so the last known point is included.
    ///
    /// Returns `None` when either bound falls outside the representable
    /// date range.
    pub fn ending_at(max_time: DateTime<Utc>, lookback: chrono::Duration) -> Option<Self> {
        let end = max_time.checked_add_signed(chrono::Duration::milliseconds(1))?;
        let start = end.checked_sub_signed(lookback)?;
        Some(Self { start, end })
    }
}

/// Resolves the query window from the data source's latest data time
pub struct TimeWindowResolver {
    executor: Arc<dyn QueryExecutor>,
    clock: Arc<dyn Clock>,
    lookback: chrono::Duration,
}

impl TimeWindowResolver {
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self {
            executor,
            clock: Arc::new(BoundedClock::default()),
            lookback: chrono::Duration::days(7),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_lookback(mut self, lookback: chrono::Duration) -> Self {
        self.lookback = lookback;
        self
    }

    /// Resolve the window for a dataset.
    ///
    /// A failed max-data-time lookup, or a max time too close to the end of
    /// the date range to build a window from, falls back to the clock's
    /// current time; the lookup failure is never propagated. Only a lookback
    /// that cannot be applied to the clock either is an error.
    pub async fn resolve(&self, dataset: &str) -> Result<TimeWindow> {
        match self.executor.max_data_time(dataset).await {
            Ok(max_time) => {
                if let Some(window) = TimeWindow::ending_at(max_time, self.lookback) {
                    return Ok(window);
                }
                warn!(
                    dataset = %dataset,
                    max_time = %max_time,
                    "Max data time out of range for the lookback, using current time"
                );
            }
            Err(e) => {
                debug!(
                    "Max data time unavailable for dataset '{}', using current time: {}",
                    dataset, e
                );
            }
        }

        TimeWindow::ending_at(self.clock.now(), self.lookback).ok_or_else(|| {
            Error::Config(format!(
                "lookback of {} days is outside the supported date range",
                self.lookback.num_days()
            ))
        })
    }
}
