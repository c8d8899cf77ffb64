use std::sync::Arc;

use common_observability::{CounterHandle, GaugeHandle, HistogramHandle, MetricsRegistry, MetricsResult};

use crate::instrumentation::StatusLabel;

pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
pub const ACTIVE_REQUESTS: &str = "active_requests";
pub const DATABASE_QUERY_DURATION_SECONDS: &str = "database_query_duration_seconds";
pub const MEDICINE_SALES_TOTAL: &str = "medicine_sales_total";

pub const REQUEST_DURATION_BUCKETS: &[f64] =
    &[0.0, 0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0];
pub const DB_QUERY_BUCKETS: &[f64] = &[0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0];

/// Instruments recorded by the medicine service. Built once in `main` and shared through `AppState`.
#[derive(Clone)]
pub struct MedicineMetrics {
    registry: Arc<MetricsRegistry>,
    pub http_requests_total: CounterHandle,
    pub http_request_duration_seconds: HistogramHandle,
    pub active_requests: GaugeHandle,
    pub database_query_duration_seconds: HistogramHandle,
    pub medicine_sales_total: CounterHandle,
    pub status_label: StatusLabel,
}

impl MedicineMetrics {
    pub fn new(registry: Arc<MetricsRegistry>, status_label: StatusLabel) -> MetricsResult<Self> {
        let http_requests_total = registry.counter(
            HTTP_REQUESTS_TOTAL,
            "requests",
            "Total number of HTTP requests",
            &["status"],
        )?;
        let http_request_duration_seconds = registry.histogram(
            HTTP_REQUEST_DURATION_SECONDS,
            "seconds",
            "Duration of HTTP requests",
            &["status"],
            REQUEST_DURATION_BUCKETS,
        )?;
        let active_requests = registry.up_down_counter(
            ACTIVE_REQUESTS,
            "requests",
            "Number of requests currently being processed",
            &[],
        )?;
        let database_query_duration_seconds = registry.histogram(
            DATABASE_QUERY_DURATION_SECONDS,
            "seconds",
            "Duration of database queries",
            &["operation"],
            DB_QUERY_BUCKETS,
        )?;
        let medicine_sales_total = registry.counter(
            MEDICINE_SALES_TOTAL,
            "units",
            "Units of medicine sold",
            &["medicine_name"],
        )?;
        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            active_requests,
            database_query_duration_seconds,
            medicine_sales_total,
            status_label,
        })
    }

    pub fn medicine_sold(&self, name: &str, quantity: i32) {
        self.medicine_sales_total.add(u64::try_from(quantity).unwrap_or(0), &[name]);
    }

    pub fn render(&self) -> MetricsResult<String> {
        self.registry.scrape_snapshot()
    }
}
