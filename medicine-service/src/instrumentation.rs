//! Request-level instrumentation: one middleware, one guard per request.

use std::borrow::Cow;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::metrics::MedicineMetrics;

/// Granularity of the `status` label on request metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusLabel {
    /// `2xx`, `3xx`, `4xx`, `5xx`
    #[default]
    Class,
    /// The numeric status code, e.g. `404`.
    Code,
}

impl StatusLabel {
    pub fn tag(self, status: u16) -> Cow<'static, str> {
        match self {
            StatusLabel::Class => Cow::Borrowed(status_class(status)),
            StatusLabel::Code => Cow::Owned(status.to_string()),
        }
    }
}

impl FromStr for StatusLabel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "class" => Ok(StatusLabel::Class),
            "code" => Ok(StatusLabel::Code),
            other => Err(format!("unknown status label mode '{other}' (expected 'class' or 'code')")),
        }
    }
}

/// Informational codes fall through to `2xx`.
pub fn status_class(status: u16) -> &'static str {
    match status {
        500.. => "5xx",
        400..=499 => "4xx",
        300..=399 => "3xx",
        _ => "2xx",
    }
}

/// Live for the duration of one request. Dropping it releases the active gauge and
/// records the outcome; a request that never produced a response counts as `5xx`.
pub struct InFlightRequest {
    metrics: Arc<MedicineMetrics>,
    started: Instant,
    status: Option<StatusCode>,
}

impl InFlightRequest {
    pub fn enter(metrics: Arc<MedicineMetrics>) -> Self {
        metrics.active_requests.add(1, &[]);
        Self { metrics, started: Instant::now(), status: None }
    }

    pub fn complete(mut self, status: StatusCode) {
        self.status = Some(status);
    }
}

impl Drop for InFlightRequest {
    fn drop(&mut self) {
        self.metrics.active_requests.add(-1, &[]);
        let status = match self.status {
            Some(status) => status.as_u16(),
            None => {
                warn!("request ended without a response");
                StatusCode::INTERNAL_SERVER_ERROR.as_u16()
            }
        };
        let tag = self.metrics.status_label.tag(status);
        self.metrics.http_requests_total.add(1, &[tag.as_ref()]);
        self.metrics
            .http_request_duration_seconds
            .record(self.started.elapsed().as_secs_f64(), &[tag.as_ref()]);
    }
}

pub async fn track_requests(
    State(metrics): State<Arc<MedicineMetrics>>,
    req: Request,
    next: Next,
) -> Response {
    let in_flight = InFlightRequest::enter(metrics);
    let response = next.run(req).await;
    in_flight.complete(response.status());
    response
}
