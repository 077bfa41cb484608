//! In-memory provider for local runs and tests

use ads_core::{AssetType, Credential};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};
use crate::provider::AdProvider;

/// Platform id of the sandbox provider
pub const SANDBOX_PLATFORM: &str = "sandbox";

#[derive(Debug, Default)]
struct SandboxState {
    budgets: DashMap<String, f64>,
    paused: DashMap<String, AssetType>,
    failures: DashMap<String, String>,
    updates: AtomicUsize,
}

/// Provider keeping budgets in memory
///
/// Clones share state, so the instance handed to the registry and the one a
/// test inspects see the same budgets.
#[derive(Debug, Clone, Default)]
pub struct SandboxProvider {
    state: Arc<SandboxState>,
}

impl SandboxProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an asset's budget
    pub fn set_budget(&self, asset_id: impl Into<String>, budget: f64) {
        self.state.budgets.insert(asset_id.into(), budget);
    }

    /// Current budget, if the asset is known
    pub fn budget(&self, asset_id: &str) -> Option<f64> {
        self.state.budgets.get(asset_id).map(|b| *b)
    }

    pub fn is_paused(&self, asset_id: &str) -> bool {
        self.state.paused.contains_key(asset_id)
    }

    /// Make every call for `asset_id` fail with `message`
    pub fn fail_asset(&self, asset_id: impl Into<String>, message: impl Into<String>) {
        self.state.failures.insert(asset_id.into(), message.into());
    }

    /// Number of successful budget updates
    pub fn update_count(&self) -> usize {
        self.state.updates.load(Ordering::SeqCst)
    }

    /// Seed budgets from a credential's `initial_budgets` map
    ///
    /// Budgets already present are left alone.
    pub fn seed_from(&self, credential: &Credential) {
        let Some(Value::Object(initial)) = credential.config.get("initial_budgets") else {
            return;
        };
        for (asset_id, budget) in initial {
            if let Some(budget) = budget.as_f64() {
                self.state.budgets.entry(asset_id.clone()).or_insert(budget);
            }
        }
    }

    fn check(&self, asset_id: &str) -> ProviderResult<()> {
        match self.state.failures.get(asset_id) {
            Some(message) => Err(ProviderError::Request(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AdProvider for SandboxProvider {
    fn platform(&self) -> &str {
        SANDBOX_PLATFORM
    }

    async fn get_budget(&self, asset_id: &str, _asset_type: AssetType) -> ProviderResult<f64> {
        self.check(asset_id)?;
        self.budget(asset_id).ok_or_else(|| ProviderError::AssetNotFound {
            asset_id: asset_id.to_string(),
        })
    }

    async fn update_budget(
        &self,
        asset_id: &str,
        asset_type: AssetType,
        budget: f64,
        budget_type: Option<&str>,
    ) -> ProviderResult<()> {
        self.check(asset_id)?;
        if !self.state.budgets.contains_key(asset_id) {
            return Err(ProviderError::AssetNotFound {
                asset_id: asset_id.to_string(),
            });
        }
        self.state.budgets.insert(asset_id.to_string(), budget);
        self.state.updates.fetch_add(1, Ordering::SeqCst);
        info!(
            asset_id,
            %asset_type,
            budget,
            budget_type = budget_type.unwrap_or("daily"),
            "Sandbox budget updated"
        );
        Ok(())
    }

    async fn pause_asset(&self, asset_id: &str, asset_type: AssetType) -> ProviderResult<()> {
        self.check(asset_id)?;
        self.state.paused.insert(asset_id.to_string(), asset_type);
        debug!(asset_id, %asset_type, "Sandbox asset paused");
        Ok(())
    }
}
