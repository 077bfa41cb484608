//! In-memory backend for every collaborator trait

use ads_core::{Asset, Credential, HistoryRecord, RawCounters, Rule};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::StoreResult;
use crate::storage::{Storable, Storage};
use crate::traits::{AssetStore, CredentialStore, HistoryStore, MetricsSource, RuleStore, SalesSource};

/// Daily aggregate for one asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMetrics {
    pub product_id: String,
    pub asset_id: String,
    pub date: NaiveDate,
    #[serde(flatten)]
    pub counters: RawCounters,
}

/// Point-in-time counters for the current day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntradaySnapshot {
    pub product_id: String,
    pub asset_id: String,
    pub date: NaiveDate,
    pub captured_at: DateTime<Utc>,
    #[serde(flatten)]
    pub counters: RawCounters,
}

/// Sale lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    Confirmed,
    Pending,
    Cancelled,
    Refunded,
}

/// One sale of a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub product_id: String,
    pub date: NaiveDate,
    pub amount: f64,
    pub status: SaleStatus,
}

/// Seed data for a [`MemoryStore`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub daily_metrics: Vec<DailyMetrics>,
    #[serde(default)]
    pub intraday: Vec<IntradaySnapshot>,
    #[serde(default)]
    pub sales: Vec<Sale>,
    #[serde(default)]
    pub credentials: Vec<Credential>,
}

impl Storable for Dataset {
    const KEY: &'static str = "budget_autopilot.dataset";
    const VERSION: u32 = 1;
    const MINOR_VERSION: u32 = 1;
}

type AssetKey = (String, String);

/// Concurrent in-memory store
///
/// Implements every collaborator trait. History is kept keyed by record id
/// and listed by execution time, with the id breaking ties.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rules: DashMap<String, Rule>,
    assets: DashMap<String, Asset>,
    daily: DashMap<AssetKey, Vec<DailyMetrics>>,
    intraday: DashMap<AssetKey, Vec<IntradaySnapshot>>,
    sales: DashMap<String, Vec<Sale>>,
    credentials: DashMap<String, Vec<Credential>>,
    history: DashMap<String, HistoryRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store holding `dataset`
    pub fn from_dataset(dataset: Dataset) -> Self {
        let store = Self::new();
        store.import(dataset);
        store
    }

    /// Load the dataset from `storage`; an absent file yields an empty store
    pub async fn load(storage: &Storage) -> StoreResult<Self> {
        let dataset: Dataset = storage.load().await?.unwrap_or_default();
        info!(
            rules = dataset.rules.len(),
            assets = dataset.assets.len(),
            "Loaded automation dataset"
        );
        Ok(Self::from_dataset(dataset))
    }

    /// Add every entry of `dataset`
    pub fn import(&self, dataset: Dataset) {
        for rule in dataset.rules {
            self.insert_rule(rule);
        }
        for asset in dataset.assets {
            self.insert_asset(asset);
        }
        for day in dataset.daily_metrics {
            self.insert_daily(day);
        }
        for snapshot in dataset.intraday {
            self.insert_intraday(snapshot);
        }
        for sale in dataset.sales {
            self.insert_sale(sale);
        }
        for credential in dataset.credentials {
            self.insert_credential(credential);
        }
    }

    pub fn insert_rule(&self, rule: Rule) {
        self.rules.insert(rule.id.clone(), rule);
    }

    pub fn insert_asset(&self, asset: Asset) {
        self.assets.insert(asset.id.clone(), asset);
    }

    pub fn insert_daily(&self, day: DailyMetrics) {
        self.daily
            .entry((day.product_id.clone(), day.asset_id.clone()))
            .or_default()
            .push(day);
    }

    pub fn insert_intraday(&self, snapshot: IntradaySnapshot) {
        self.intraday
            .entry((snapshot.product_id.clone(), snapshot.asset_id.clone()))
            .or_default()
            .push(snapshot);
    }

    pub fn insert_sale(&self, sale: Sale) {
        self.sales.entry(sale.product_id.clone()).or_default().push(sale);
    }

    pub fn insert_credential(&self, credential: Credential) {
        self.credentials
            .entry(credential.owner_id.clone())
            .or_default()
            .push(credential);
    }

    /// All history records, oldest first
    pub fn history(&self) -> Vec<HistoryRecord> {
        let mut records: Vec<HistoryRecord> =
            self.history.iter().map(|entry| entry.value().clone()).collect();
        records.sort_by(|a, b| a.executed_at.cmp(&b.executed_at).then_with(|| a.id.cmp(&b.id)));
        records
    }

    /// History records for one rule, oldest first
    pub fn history_for_rule(&self, rule_id: &str) -> Vec<HistoryRecord> {
        self.history()
            .into_iter()
            .filter(|record| record.rule_id == rule_id)
            .collect()
    }
}

fn asset_key(product_id: &str, asset_id: &str) -> AssetKey {
    (product_id.to_string(), asset_id.to_string())
}

#[async_trait]
impl RuleStore for MemoryStore {
    async fn active_rules(&self, owner_id: Option<&str>) -> StoreResult<Vec<Rule>> {
        let mut rules: Vec<Rule> = self
            .rules
            .iter()
            .filter(|entry| entry.is_active())
            .filter(|entry| owner_id.map_or(true, |owner| entry.owner_id == owner))
            .map(|entry| entry.value().clone())
            .collect();
        rules.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(rules)
    }
}

#[async_trait]
impl AssetStore for MemoryStore {
    async fn asset(&self, asset_id: &str) -> StoreResult<Option<Asset>> {
        Ok(self.assets.get(asset_id).map(|entry| entry.value().clone()))
    }
}

#[async_trait]
impl MetricsSource for MemoryStore {
    #[instrument(skip(self))]
    async fn historical_totals(
        &self,
        product_id: &str,
        asset_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<RawCounters> {
        let mut total = RawCounters::default();
        if let Some(days) = self.daily.get(&asset_key(product_id, asset_id)) {
            for day in days.iter().filter(|day| from <= day.date && day.date <= to) {
                total += day.counters;
            }
        }
        debug!(spend = total.spend, results = total.results, "Summed daily metrics");
        Ok(total)
    }

    #[instrument(skip(self))]
    async fn intraday_snapshot(
        &self,
        product_id: &str,
        asset_id: &str,
        date: NaiveDate,
    ) -> StoreResult<Option<RawCounters>> {
        Ok(self
            .intraday
            .get(&asset_key(product_id, asset_id))
            .and_then(|snapshots| {
                snapshots
                    .iter()
                    .filter(|snapshot| snapshot.date == date)
                    .max_by_key(|snapshot| snapshot.captured_at)
                    .map(|snapshot| snapshot.counters)
            }))
    }
}

#[async_trait]
impl SalesSource for MemoryStore {
    async fn confirmed_sales(
        &self,
        product_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<f64> {
        Ok(self
            .sales
            .get(product_id)
            .map(|sales| {
                sales
                    .iter()
                    .filter(|sale| sale.status == SaleStatus::Confirmed)
                    .filter(|sale| from <= sale.date && sale.date <= to)
                    .map(|sale| sale.amount)
                    .sum()
            })
            .unwrap_or(0.0))
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn credentials(&self, owner_id: &str, kind: &str) -> StoreResult<Vec<Credential>> {
        Ok(self
            .credentials
            .get(owner_id)
            .map(|creds| creds.iter().filter(|c| c.kind == kind).cloned().collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    async fn append(&self, record: &HistoryRecord) -> StoreResult<()> {
        self.history.insert(record.id.clone(), record.clone());
        Ok(())
    }
}
