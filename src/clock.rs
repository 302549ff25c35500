//! Wall-clock sources
//!
//! The time window resolver falls back to "now" when the data source cannot
//! report its latest data time. The clock is injected so tests can pin it.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of the current wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// A clock that never goes backward.
///
/// If the system clock is adjusted backward (e.g. NTP), the previous
/// high-water mark plus one millisecond is returned instead.
pub struct BoundedClock {
    /// Largest timestamp ever returned (millis)
    high_water_ms: AtomicI64,
}

impl BoundedClock {
    pub fn new() -> Self {
        Self {
            high_water_ms: AtomicI64::new(0),
        }
    }

    /// Returns a monotonically increasing millisecond timestamp.
    pub fn now_millis(&self) -> i64 {
        let wall = Utc::now().timestamp_millis();
        loop {
            let prev = self.high_water_ms.load(Ordering::Acquire);
            let ts = wall.max(prev + 1);
            match self.high_water_ms.compare_exchange_weak(
                prev,
                ts,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return ts,
                Err(_) => continue,
            }
        }
    }
}

impl Default for BoundedClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for BoundedClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.now_millis()).unwrap_or_else(Utc::now)
    }
}

/// A clock pinned to a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_increasing() {
        let clock = BoundedClock::default();
        let mut prev = 0i64;
        for _ in 0..100 {
            let ts = clock.now_millis();
            assert!(ts > prev, "timestamps must be strictly increasing");
            prev = ts;
        }
    }

    #[test]
    fn test_now_returns_valid_datetime() {
        let clock = BoundedClock::default();
        let dt = clock.now();
        // Should be a reasonable time (after 2020)
        assert!(dt.timestamp() > 1_577_836_800, "timestamp should be after 2020");
    }

    #[test]
    fn test_concurrent_monotonicity() {
        use std::sync::Arc;
        let clock = Arc::new(BoundedClock::default());
        let mut handles = vec![];

        for _ in 0..4 {
            let c = clock.clone();
            handles.push(std::thread::spawn(move || {
                let mut prev = 0i64;
                for _ in 0..1000 {
                    let ts = c.now_millis();
                    assert!(ts > prev);
                    prev = ts;
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }
    }

    #[test]
    fn test_fixed_clock() {
        let instant = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        let clock = FixedClock(instant);
        assert_eq!(clock.now(), instant);
        assert_eq!(clock.now(), instant);
    }
}
