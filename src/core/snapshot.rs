/// Normalized metric samples exchanged between gateway and dashboard
///
/// A sample serializes flat: `{"t": "14:03:22", "core0": 12.5, "core1": 8.33}`
/// for CPU and `{"t": "14:03:22", "value": 41.07}` for memory and disk.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::prometheus::Series;

pub const VALUE_FIELD: &str = "value";
pub const CORE_PREFIX: &str = "core";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    /// Display timestamp, only meaningful as an axis label
    pub t: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, f64>,
}

impl MetricSample {
    pub fn new(t: impl Into<String>, fields: BTreeMap<String, f64>) -> Self {
        Self { t: t.into(), fields }
    }

    /// Single-field sample used for memory and disk
    pub fn scalar(t: impl Into<String>, value: f64) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(VALUE_FIELD.to_string(), value);
        Self::new(t, fields)
    }

    pub fn value(&self) -> Option<f64> {
        self.fields.get(VALUE_FIELD).copied()
    }

    /// `(field, value)` pairs of every `core*` field
    pub fn cores(&self) -> impl Iterator<Item = (&str, f64)> {
        self.fields
            .iter()
            .filter(|(k, _)| k.starts_with(CORE_PREFIX))
            .map(|(k, v)| (k.as_str(), *v))
    }

    /// Mean of all core fields, 0 when there are none
    pub fn core_average(&self) -> f64 {
        let (sum, count) = self.cores().fold((0.0, 0usize), |(s, n), (_, v)| (s + v, n + 1));
        if count == 0 {
            0.0
        } else {
            sum / count as f64
        }
    }
}

/// Gateway response for one poll: each list holds exactly one fresh sample
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemSnapshot {
    #[serde(default)]
    pub cpu: Vec<MetricSample>,
    #[serde(default)]
    pub memory: Vec<MetricSample>,
    #[serde(default)]
    pub disk: Vec<MetricSample>,
}

impl SystemSnapshot {
    pub fn single(t: &str, cpu: BTreeMap<String, f64>, memory: f64, disk: f64) -> Self {
        Self {
            cpu: vec![MetricSample::new(t, cpu)],
            memory: vec![MetricSample::scalar(t, memory)],
            disk: vec![MetricSample::scalar(t, disk)],
        }
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `core<label>` → busy percent, one entry per series carrying a `cpu` label
pub fn normalize_cpu(series: &[Series]) -> BTreeMap<String, f64> {
    series
        .iter()
        .filter_map(|s| {
            let label = s.label("cpu")?;
            Some((
                format!("{}{}", CORE_PREFIX, label),
                round2(s.number().unwrap_or(0.0)),
            ))
        })
        .collect()
}

/// Value of the first series, 0 when the query returned nothing
pub fn normalize_scalar(series: &[Series]) -> f64 {
    series
        .first()
        .and_then(Series::number)
        .map(round2)
        .unwrap_or(0.0)
}

/// `instance` label of every series, in result order
pub fn instance_labels(series: &[Series]) -> Vec<String> {
    series
        .iter()
        .filter_map(|s| s.label("instance").map(str::to_string))
        .collect()
}
