//! The provider contract

use ads_core::AssetType;
use async_trait::async_trait;

use crate::error::ProviderResult;

/// Budget and status operations of one ad platform
///
/// Asset ids are the platform's own ids (`Asset::external_id`).
#[async_trait]
pub trait AdProvider: Send + Sync {
    /// Platform id this provider serves
    fn platform(&self) -> &str;

    /// Whether changes are only logged
    fn is_dry_run(&self) -> bool {
        false
    }

    /// Current budget of an asset
    async fn get_budget(&self, asset_id: &str, asset_type: AssetType) -> ProviderResult<f64>;

    /// Set a new budget
    async fn update_budget(
        &self,
        asset_id: &str,
        asset_type: AssetType,
        budget: f64,
        budget_type: Option<&str>,
    ) -> ProviderResult<()>;

    /// Stop delivery of an asset
    async fn pause_asset(&self, asset_id: &str, asset_type: AssetType) -> ProviderResult<()>;
}
