//! Metric counters, derived snapshots and date ranges

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ops::AddAssign;

/// Summed raw counters for an asset over some period
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RawCounters {
    #[serde(default)]
    pub spend: f64,
    #[serde(default)]
    pub impressions: u64,
    #[serde(default)]
    pub reach: u64,
    #[serde(default)]
    pub clicks: u64,
    #[serde(default)]
    pub results: u64,
}

impl RawCounters {
    /// Check whether the range produced no activity at all
    pub fn is_empty(&self) -> bool {
        self.spend == 0.0 && self.results == 0 && self.impressions == 0
    }
}

impl AddAssign for RawCounters {
    fn add_assign(&mut self, other: Self) {
        self.spend += other.spend;
        self.impressions += other.impressions;
        self.reach += other.reach;
        self.clicks += other.clicks;
        self.results += other.results;
    }
}

/// Derived metrics for one asset over a resolved range
///
/// Serialized field names are the metric names conditions refer to.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub spend: f64,
    pub impressions: u64,
    pub reach: u64,
    pub clicks: u64,
    pub results: u64,
    pub ctr: f64,
    pub cpc: f64,
    pub cpm: f64,
    pub roas: f64,
    pub cost_per_result: f64,
    pub frequency: f64,
}

impl MetricsSnapshot {
    /// Metric names a condition may reference
    pub const FIELDS: [&'static str; 11] = [
        "spend",
        "impressions",
        "reach",
        "clicks",
        "results",
        "ctr",
        "cpc",
        "cpm",
        "roas",
        "cost_per_result",
        "frequency",
    ];

    /// Check if a metric name is a snapshot field
    pub fn has_field(name: &str) -> bool {
        Self::FIELDS.contains(&name)
    }

    /// The snapshot as an evaluation context
    pub fn to_context(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// A labelled, inclusive date range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub label: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl TimeRange {
    pub fn new(label: impl Into<String>, from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            label: label.into(),
            from,
            to,
        }
    }

    /// Check if `date` falls inside the range
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    /// Number of days covered
    pub fn days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }
}
