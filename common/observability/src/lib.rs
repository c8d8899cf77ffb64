//! Process-wide metrics registry shared by the service crates.
//!
//! Instruments are created once at startup through [`MetricsRegistry`] and the
//! returned handles are cloned into whatever records into them. Creation is
//! idempotent by name; asking for an existing name with a different shape is a
//! configuration error reported as [`MetricsError::Conflict`].

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use prometheus::core::Collector;
use prometheus::proto;
use prometheus::{
    Encoder, HistogramOpts, HistogramTimer, HistogramVec, IntCounterVec, IntGaugeVec, Opts,
    Registry, TextEncoder,
};
use thiserror::Error;
use tracing::warn;

pub type MetricsResult<T> = Result<T, MetricsError>;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("instrument '{name}' already registered: {reason}")]
    Conflict { name: String, reason: String },
    #[error("histogram '{0}' needs non-empty, finite, strictly ascending buckets")]
    InvalidBuckets(String),
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
    #[error("metrics output was not valid utf-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstrumentKind {
    Counter,
    Histogram,
    UpDownCounter,
}

impl fmt::Display for InstrumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InstrumentKind::Counter => "counter",
            InstrumentKind::Histogram => "histogram",
            InstrumentKind::UpDownCounter => "up/down counter",
        };
        f.write_str(s)
    }
}

#[derive(Clone)]
enum Instrument {
    Counter(CounterHandle),
    Histogram(HistogramHandle, Vec<f64>),
    UpDownCounter(GaugeHandle),
}

impl Instrument {
    fn kind(&self) -> InstrumentKind {
        match self {
            Instrument::Counter(_) => InstrumentKind::Counter,
            Instrument::Histogram(..) => InstrumentKind::Histogram,
            Instrument::UpDownCounter(_) => InstrumentKind::UpDownCounter,
        }
    }

    fn label_names(&self) -> &[String] {
        match self {
            Instrument::Counter(h) => &h.label_names,
            Instrument::Histogram(h, _) => &h.label_names,
            Instrument::UpDownCounter(h) => &h.label_names,
        }
    }
}

/// Monotonic integer counter.
#[derive(Clone)]
pub struct CounterHandle {
    name: String,
    label_names: Vec<String>,
    inner: IntCounterVec,
}

impl CounterHandle {
    /// Adds `amount`; `labels` are values in the order the label names were declared.
    pub fn add(&self, amount: u64, labels: &[&str]) {
        match self.inner.get_metric_with_label_values(labels) {
            Ok(counter) => counter.inc_by(amount),
            Err(err) => warn!(metric = %self.name, ?labels, %err, "dropping counter sample"),
        }
    }

    /// Current value of one series; zero if the series was never touched. Reading never creates it.
    pub fn value(&self, labels: &[&str]) -> u64 {
        find_series(&self.inner, &self.label_names, labels)
            .map(|m| m.get_counter().get_value() as u64)
            .unwrap_or(0)
    }
}

/// Histogram with explicit bucket boundaries (inclusive upper bounds plus `+Inf`).
#[derive(Clone)]
pub struct HistogramHandle {
    name: String,
    label_names: Vec<String>,
    inner: HistogramVec,
}

impl HistogramHandle {
    pub fn record(&self, value: f64, labels: &[&str]) {
        match self.inner.get_metric_with_label_values(labels) {
            Ok(histogram) => histogram.observe(value),
            Err(err) => warn!(metric = %self.name, ?labels, %err, "dropping histogram sample"),
        }
    }

    /// Scoped timer that records the elapsed seconds when dropped.
    pub fn start_timer(&self, labels: &[&str]) -> Option<HistogramTimer> {
        match self.inner.get_metric_with_label_values(labels) {
            Ok(histogram) => Some(histogram.start_timer()),
            Err(err) => {
                warn!(metric = %self.name, ?labels, %err, "histogram timer not started");
                None
            }
        }
    }

    /// Number of observations recorded for one series.
    pub fn sample_count(&self, labels: &[&str]) -> u64 {
        find_series(&self.inner, &self.label_names, labels)
            .map(|m| m.get_histogram().get_sample_count())
            .unwrap_or(0)
    }
}

/// Integer up/down counter; additions are atomic.
#[derive(Clone)]
pub struct GaugeHandle {
    name: String,
    label_names: Vec<String>,
    inner: IntGaugeVec,
}

impl GaugeHandle {
    pub fn add(&self, delta: i64, labels: &[&str]) {
        match self.inner.get_metric_with_label_values(labels) {
            Ok(gauge) => gauge.add(delta),
            Err(err) => warn!(metric = %self.name, ?labels, %err, "dropping gauge delta"),
        }
    }

    pub fn value(&self, labels: &[&str]) -> i64 {
        find_series(&self.inner, &self.label_names, labels)
            .map(|m| m.get_gauge().get_value() as i64)
            .unwrap_or(0)
    }
}

pub struct MetricsRegistry {
    registry: Registry,
    instruments: Mutex<HashMap<String, Instrument>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self { registry: Registry::new(), instruments: Mutex::new(HashMap::new()) }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn counter(&self, name: &str, unit: &str, description: &str, label_names: &[&str]) -> MetricsResult<CounterHandle> {
        let mut instruments = self.instruments.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = instruments.get(name) {
            check_shape(name, existing, InstrumentKind::Counter, label_names)?;
            if let Instrument::Counter(handle) = existing {
                return Ok(handle.clone());
            }
        }
        let inner = IntCounterVec::new(Opts::new(name, help_text(description, unit)), label_names)?;
        self.registry.register(Box::new(inner.clone()))?;
        let handle = CounterHandle { name: name.to_string(), label_names: owned(label_names), inner };
        if label_names.is_empty() {
            handle.add(0, &[]);
        }
        instruments.insert(name.to_string(), Instrument::Counter(handle.clone()));
        Ok(handle)
    }

    pub fn histogram(
        &self,
        name: &str,
        unit: &str,
        description: &str,
        label_names: &[&str],
        buckets: &[f64],
    ) -> MetricsResult<HistogramHandle> {
        validate_buckets(name, buckets)?;
        let mut instruments = self.instruments.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = instruments.get(name) {
            check_shape(name, existing, InstrumentKind::Histogram, label_names)?;
            if let Instrument::Histogram(handle, existing_buckets) = existing {
                if existing_buckets.as_slice() != buckets {
                    return Err(MetricsError::Conflict {
                        name: name.to_string(),
                        reason: format!("bucket boundaries differ ({existing_buckets:?} vs {buckets:?})"),
                    });
                }
                return Ok(handle.clone());
            }
        }
        let opts = HistogramOpts::new(name, help_text(description, unit)).buckets(buckets.to_vec());
        let inner = HistogramVec::new(opts, label_names)?;
        self.registry.register(Box::new(inner.clone()))?;
        let handle = HistogramHandle { name: name.to_string(), label_names: owned(label_names), inner };
        if label_names.is_empty() {
            let _ = handle.inner.get_metric_with_label_values(&[]);
        }
        instruments.insert(name.to_string(), Instrument::Histogram(handle.clone(), buckets.to_vec()));
        Ok(handle)
    }

    pub fn up_down_counter(&self, name: &str, unit: &str, description: &str, label_names: &[&str]) -> MetricsResult<GaugeHandle> {
        let mut instruments = self.instruments.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = instruments.get(name) {
            check_shape(name, existing, InstrumentKind::UpDownCounter, label_names)?;
            if let Instrument::UpDownCounter(handle) = existing {
                return Ok(handle.clone());
            }
        }
        let inner = IntGaugeVec::new(Opts::new(name, help_text(description, unit)), label_names)?;
        self.registry.register(Box::new(inner.clone()))?;
        let handle = GaugeHandle { name: name.to_string(), label_names: owned(label_names), inner };
        if label_names.is_empty() {
            handle.add(0, &[]);
        }
        instruments.insert(name.to_string(), Instrument::UpDownCounter(handle.clone()));
        Ok(handle)
    }

    /// Prometheus text exposition of every registered instrument.
    pub fn scrape_snapshot(&self) -> MetricsResult<String> {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let mut buf = Vec::new();
        encoder.encode(&families, &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self { Self::new() }
}

fn check_shape(name: &str, existing: &Instrument, requested: InstrumentKind, label_names: &[&str]) -> MetricsResult<()> {
    if existing.kind() != requested {
        return Err(MetricsError::Conflict {
            name: name.to_string(),
            reason: format!("registered as {}, requested as {requested}", existing.kind()),
        });
    }
    if existing.label_names().iter().map(String::as_str).ne(label_names.iter().copied()) {
        return Err(MetricsError::Conflict {
            name: name.to_string(),
            reason: format!("label names differ ({:?} vs {label_names:?})", existing.label_names()),
        });
    }
    Ok(())
}

fn validate_buckets(name: &str, buckets: &[f64]) -> MetricsResult<()> {
    let ascending = buckets.windows(2).all(|w| w[0] < w[1]);
    if buckets.is_empty() || !ascending || buckets.iter().any(|b| !b.is_finite()) {
        return Err(MetricsError::InvalidBuckets(name.to_string()));
    }
    Ok(())
}

fn help_text(description: &str, unit: &str) -> String {
    if unit.is_empty() { description.to_string() } else { format!("{description} ({unit})") }
}

/// Looks up an existing series from a collected snapshot, matching label values by name.
fn find_series<C: Collector>(collector: &C, label_names: &[String], labels: &[&str]) -> Option<proto::Metric> {
    if label_names.len() != labels.len() {
        return None;
    }
    collector
        .collect()
        .into_iter()
        .flat_map(|family| family.get_metric().to_vec())
        .find(|metric| {
            label_names.iter().zip(labels).all(|(name, value)| {
                metric
                    .get_label()
                    .iter()
                    .any(|pair| pair.get_name() == name.as_str() && pair.get_value() == *value)
            })
        })
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}
