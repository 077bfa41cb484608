//! Metrics resolution
//!
//! Builds one validated [`MetricsSnapshot`] for an asset:
//!
//! 1. pick the dominant time range label across the rule's conditions
//! 2. sum daily aggregates for days before today, then add the latest
//!    intraday snapshot when the range includes today
//! 3. derive ratios and ROAS
//! 4. run the validation gates

use ads_core::{Asset, AutomationSettings, ConditionGroup, MetricsSnapshot, RawCounters, TimeRange};
use ads_store::{MetricsSource, SalesSource};
use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::clock::{Clock, SystemClock};
use crate::error::{MetricsError, MetricsResult, ValidationFailure};
use crate::time_range;

/// A validated snapshot and the window it covers
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMetrics {
    pub snapshot: MetricsSnapshot,
    pub time_range: TimeRange,
}

/// Resolves validated snapshots from the metrics and sales sources
pub struct MetricsResolver {
    metrics: Arc<dyn MetricsSource>,
    sales: Arc<dyn SalesSource>,
    clock: Arc<dyn Clock>,
    min_results: u64,
    default_time_range: String,
}

impl MetricsResolver {
    pub fn new(
        metrics: Arc<dyn MetricsSource>,
        sales: Arc<dyn SalesSource>,
        settings: &AutomationSettings,
    ) -> Self {
        Self {
            metrics,
            sales,
            clock: Arc::new(SystemClock),
            min_results: settings.min_results,
            default_time_range: settings.default_time_range.clone(),
        }
    }

    /// Use `clock` for "today"
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The window a rule's conditions ask for
    pub fn time_range_for(&self, groups: &[ConditionGroup]) -> MetricsResult<TimeRange> {
        let labels = groups
            .iter()
            .flat_map(|group| group.conditions.iter())
            .filter_map(|condition| condition.time_range.as_deref());
        let label = time_range::dominant_label(labels).unwrap_or(self.default_time_range.as_str());
        time_range::resolve(label, self.clock.today())
    }

    /// Resolve and validate the snapshot for `asset`
    ///
    /// A failed gate returns [`MetricsError::Validation`] carrying the
    /// computed snapshot and range.
    #[instrument(skip(self, asset, groups), fields(asset_id = %asset.id))]
    pub async fn resolve(
        &self,
        asset: &Asset,
        groups: &[ConditionGroup],
    ) -> MetricsResult<ResolvedMetrics> {
        let range = self.time_range_for(groups)?;
        let counters = self.counters(asset, &range).await?;

        let confirmed_sales = if counters.spend > 0.0 {
            self.sales
                .confirmed_sales(&asset.product_id, range.from, range.to)
                .await?
        } else {
            0.0
        };

        let snapshot = derive_snapshot(&counters, confirmed_sales);
        debug!(
            time_range = %range.label,
            spend = snapshot.spend,
            results = snapshot.results,
            roas = snapshot.roas,
            "Resolved metrics"
        );

        let failure = if counters.is_empty() {
            Some(ValidationFailure::NoData)
        } else if counters.results < self.min_results {
            Some(ValidationFailure::InsufficientActivity {
                results: counters.results,
                min_results: self.min_results,
            })
        } else {
            None
        };

        match failure {
            Some(failure) => Err(MetricsError::Validation {
                failure,
                snapshot: Box::new(snapshot),
                time_range: range,
            }),
            None => Ok(ResolvedMetrics {
                snapshot,
                time_range: range,
            }),
        }
    }

    async fn counters(&self, asset: &Asset, range: &TimeRange) -> MetricsResult<RawCounters> {
        let today = self.clock.today();
        let mut total = RawCounters::default();

        if range.from < today {
            let until = range.to.min(today - Duration::days(1));
            total += self
                .metrics
                .historical_totals(&asset.product_id, &asset.id, range.from, until)
                .await?;
        }

        if range.contains(today) {
            if let Some(intraday) = self
                .metrics
                .intraday_snapshot(&asset.product_id, &asset.id, today)
                .await?
            {
                total += intraday;
            }
        }

        Ok(total)
    }
}

/// Derive ratios from raw counters; zero denominators yield 0
///
/// Spend and every ratio are rounded to 2 decimals.
pub fn derive_snapshot(counters: &RawCounters, confirmed_sales: f64) -> MetricsSnapshot {
    let spend = counters.spend;
    let impressions = counters.impressions as f64;
    let clicks = counters.clicks as f64;

    MetricsSnapshot {
        spend: round2(spend),
        impressions: counters.impressions,
        reach: counters.reach,
        clicks: counters.clicks,
        results: counters.results,
        ctr: round2(ratio(clicks, impressions) * 100.0),
        cpc: round2(ratio(spend, clicks)),
        cpm: round2(ratio(spend, impressions) * 1000.0),
        roas: round2(ratio(confirmed_sales, spend)),
        cost_per_result: round2(ratio(spend, counters.results as f64)),
        frequency: round2(ratio(impressions, counters.reach as f64)),
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
