//! Interfaces of the automation loop's external collaborators

use ads_core::{Asset, Credential, HistoryRecord, RawCounters, Rule};
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::StoreResult;

/// Source of automation rules
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Rules with status `active`, optionally limited to one owner
    async fn active_rules(&self, owner_id: Option<&str>) -> StoreResult<Vec<Rule>>;
}

/// Lookup of ad assets
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn asset(&self, asset_id: &str) -> StoreResult<Option<Asset>>;
}

/// Historical and near-real-time metric counters
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Sum of the daily aggregates for `from..=to`
    async fn historical_totals(
        &self,
        product_id: &str,
        asset_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<RawCounters>;

    /// Latest intraday snapshot for `date`, if one was captured
    async fn intraday_snapshot(
        &self,
        product_id: &str,
        asset_id: &str,
        date: NaiveDate,
    ) -> StoreResult<Option<RawCounters>>;
}

/// Sales revenue attributed to products
#[async_trait]
pub trait SalesSource: Send + Sync {
    /// Sum of confirmed sale amounts for `from..=to`
    async fn confirmed_sales(
        &self,
        product_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<f64>;
}

/// Platform credentials by owner
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn credentials(&self, owner_id: &str, kind: &str) -> StoreResult<Vec<Credential>>;
}

/// Append-only audit log
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append(&self, record: &HistoryRecord) -> StoreResult<()>;
}
