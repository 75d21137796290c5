//! Query metrics and tracing helpers.
//!
//! Metrics are OpenTelemetry instruments exported through the Prometheus
//! exporter into a private `prometheus::Registry`; [`DriftwoodMetrics::render`]
//! produces the text exposition format for whatever endpoint the application
//! serves.

#[cfg(feature = "metrics")]
use once_cell::sync::Lazy;
#[cfg(feature = "metrics")]
use opentelemetry::metrics::{Counter, Histogram, MeterProvider};
#[cfg(feature = "metrics")]
use opentelemetry_sdk::metrics::SdkMeterProvider;
#[cfg(feature = "metrics")]
use prometheus::{Encoder, Registry, TextEncoder};

#[cfg(feature = "metrics")]
pub static METRICS: Lazy<DriftwoodMetrics> = Lazy::new(DriftwoodMetrics::init);

#[cfg(feature = "metrics")]
pub struct DriftwoodMetrics {
    registry: Registry,
    _provider: SdkMeterProvider,
    pub queries_total: Counter<u64>,
    pub query_errors_total: Counter<u64>,
    pub query_duration: Histogram<f64>,
    pub rows_hydrated_total: Counter<u64>,
}

#[cfg(feature = "metrics")]
impl DriftwoodMetrics {
    pub fn init() -> Self {
        let registry = Registry::new();
        let provider = match opentelemetry_prometheus::exporter()
            .with_registry(registry.clone())
            .build()
        {
            Ok(exporter) => SdkMeterProvider::builder().with_reader(exporter).build(),
            Err(err) => {
                log::warn!("Prometheus exporter unavailable, metrics will not be exported: {err}");
                SdkMeterProvider::builder().build()
            }
        };
        let meter = provider.meter("driftwood");

        let queries_total = meter
            .u64_counter("driftwood_queries_total")
            .with_description("Total statements executed")
            .build();

        let query_errors_total = meter
            .u64_counter("driftwood_query_errors_total")
            .with_description("Statements that returned an error")
            .build();

        let query_duration = meter
            .f64_histogram("driftwood_query_duration_seconds")
            .with_description("Duration of statements")
            .build();

        let rows_hydrated_total = meter
            .u64_counter("driftwood_rows_hydrated_total")
            .with_description("Rows turned into entity instances")
            .build();

        Self {
            registry,
            _provider: provider,
            queries_total,
            query_errors_total,
            query_duration,
            rows_hydrated_total,
        }
    }

    pub fn record_query_duration(&self, elapsed: std::time::Duration) {
        self.queries_total.add(1, &[]);
        self.query_duration.record(elapsed.as_secs_f64(), &[]);
    }

    pub fn record_query_error(&self) {
        self.query_errors_total.add(1, &[]);
    }

    pub fn record_rows_hydrated(&self, rows: u64) {
        self.rows_hydrated_total.add(rows, &[]);
    }

    /// Prometheus text exposition of every driftwood metric
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        if let Err(err) = TextEncoder::new().encode(&self.registry.gather(), &mut buffer) {
            log::warn!("Failed to encode metrics: {err}");
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

/// Span constructors for executor calls
#[cfg(feature = "tracing")]
pub mod tracing_helpers {
    use tracing::{info_span, Span};

    /// Span covering one statement; the SQL is recorded as `db.statement`
    pub fn execute_query_span(sql: &str) -> Span {
        info_span!("driftwood.execute_query", db.system = "sqlite", db.statement = sql)
    }

    /// Span covering a repository save
    pub fn save_entity_span(entity: &str) -> Span {
        info_span!("driftwood.save", entity = entity)
    }
}
