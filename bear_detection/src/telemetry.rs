use opentelemetry::{
    metrics::{Counter, Histogram, MeterProvider},
    KeyValue,
};
use opentelemetry_sdk::metrics::SdkMeterProvider;
use prometheus::Registry;
use std::collections::HashSet;

pub struct Metrics {
    request_counter: Counter<u64>,
    inference_duration: Histogram<u64>,
    bear_detections: Counter<u64>,
    pub registry: Registry,
    _provider: SdkMeterProvider,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();
        let exporter = opentelemetry_prometheus::exporter()
            .with_registry(registry.clone())
            .build()?;

        let provider = SdkMeterProvider::builder().with_reader(exporter).build();
        let meter = provider.meter("bear_detection");

        let request_counter = meter
            .u64_counter("requests_total")
            .with_description("Total number of requests")
            .build();

        let boundaries = generate_boundaries(&[
            (0, 500, 50),
            (500, 2_000, 250),
            (2_000, 10_000, 1_000),
            (10_000, 30_000, 5_000),
        ]);

        let inference_duration = meter
            .u64_histogram("inference_duration_ms")
            .with_boundaries(boundaries)
            .with_description("Duration of inference endpoint calls in milliseconds")
            .build();

        let bear_detections = meter
            .u64_counter("bear_detections_total")
            .with_description("Responses in which the target class was detected")
            .build();

        Ok(Metrics {
            request_counter,
            inference_duration,
            bear_detections,
            registry,
            _provider: provider,
        })
    }

    pub fn record_request(&self, route: &str) {
        let attributes = vec![KeyValue::new("route", route.to_string())];
        self.request_counter.add(1, &attributes);
    }

    pub fn record_inference_duration(&self, duration_ms: u64, route: &str) {
        let attributes = vec![KeyValue::new("route", route.to_string())];
        self.inference_duration.record(duration_ms, &attributes);
    }

    pub fn record_bear_detection(&self, route: &str) {
        let attributes = vec![KeyValue::new("route", route.to_string())];
        self.bear_detections.add(1, &attributes);
    }
}

/// Concatenates `(start, end, step)` ranges into sorted, de-duplicated bucket
/// boundaries.
fn generate_boundaries(ranges: &[(u64, u64, usize)]) -> Vec<f64> {
    let mut seen = HashSet::new();
    ranges
        .iter()
        .flat_map(|&(start, end, step)| (start..=end).step_by(step))
        .filter(|&x| seen.insert(x))
        .map(|x| x as f64)
        .collect()
}
