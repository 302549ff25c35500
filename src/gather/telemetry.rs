//! Gather-path telemetry instruments and recording helpers.

use super::GatherState;
use opentelemetry::global;
use opentelemetry::metrics::{Counter, Histogram};
use opentelemetry::KeyValue;
use std::sync::OnceLock;

struct GatherInstruments {
    subquery_outcomes: Counter<u64>,
    gather_duration_seconds: Histogram<f64>,
}

fn instruments() -> &'static GatherInstruments {
    static INSTRUMENTS: OnceLock<GatherInstruments> = OnceLock::new();
    INSTRUMENTS.get_or_init(|| {
        let meter = global::meter("dimfilters.gather");
        GatherInstruments {
            subquery_outcomes: meter
                .u64_counter("dimfilters.gather.outcomes")
                .with_description("Filter sub-query outcomes")
                .init(),
            gather_duration_seconds: meter
                .f64_histogram("dimfilters.gather.duration")
                .with_description("Wall time of one scatter-gather call")
                .with_unit("s")
                .init(),
        }
    })
}

pub fn record_outcome(outcome: &'static str) {
    instruments()
        .subquery_outcomes
        .add(1, &[KeyValue::new("outcome", outcome)]);
}

pub fn record_gather(state: GatherState, duration_seconds: f64) {
    let state = match state {
        GatherState::Running => "running",
        GatherState::Completed => "completed",
        GatherState::Aborted => "aborted",
    };
    instruments()
        .gather_duration_seconds
        .record(duration_seconds, &[KeyValue::new("state", state)]);
}
