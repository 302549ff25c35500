//! Lookup telemetry instruments.

use opentelemetry::global;
use opentelemetry::metrics::{Counter, Histogram};
use opentelemetry::KeyValue;
use std::sync::OnceLock;

struct LookupInstruments {
    lookup_requests: Counter<u64>,
    lookup_duration_seconds: Histogram<f64>,
    dimensions_returned: Histogram<u64>,
}

fn instruments() -> &'static LookupInstruments {
    static INSTRUMENTS: OnceLock<LookupInstruments> = OnceLock::new();
    INSTRUMENTS.get_or_init(|| {
        let meter = global::meter("dimfilters.lookup");
        LookupInstruments {
            lookup_requests: meter
                .u64_counter("dimfilters.lookup.requests")
                .with_description("Dimension filter lookups by outcome")
                .init(),
            lookup_duration_seconds: meter
                .f64_histogram("dimfilters.lookup.duration")
                .with_description("Dimension filter lookup end-to-end latency")
                .with_unit("s")
                .init(),
            dimensions_returned: meter
                .u64_histogram("dimfilters.lookup.dimensions_returned")
                .with_description("Dimensions present in the returned filter map")
                .init(),
        }
    })
}

pub struct LookupMetrics {
    pub outcome: &'static str,
    pub duration_seconds: f64,
    pub dimensions_returned: u64,
}

pub fn record_lookup(metrics: LookupMetrics) {
    let i = instruments();
    let attrs = [KeyValue::new("outcome", metrics.outcome)];

    i.lookup_requests.add(1, &attrs);
    i.lookup_duration_seconds
        .record(metrics.duration_seconds, &attrs);
    i.dimensions_returned
        .record(metrics.dimensions_returned, &attrs);
}
