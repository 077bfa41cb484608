//! Provider wrapper that reads but never writes

use ads_core::AssetType;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::error::ProviderResult;
use crate::provider::AdProvider;

/// Wraps a provider so budget reads go through and changes are only logged
pub struct DryRunProvider {
    inner: Arc<dyn AdProvider>,
}

impl DryRunProvider {
    pub fn new(inner: Arc<dyn AdProvider>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl AdProvider for DryRunProvider {
    fn platform(&self) -> &str {
        self.inner.platform()
    }

    fn is_dry_run(&self) -> bool {
        true
    }

    async fn get_budget(&self, asset_id: &str, asset_type: AssetType) -> ProviderResult<f64> {
        self.inner.get_budget(asset_id, asset_type).await
    }

    async fn update_budget(
        &self,
        asset_id: &str,
        asset_type: AssetType,
        budget: f64,
        budget_type: Option<&str>,
    ) -> ProviderResult<()> {
        info!(
            platform = self.inner.platform(),
            asset_id,
            %asset_type,
            budget,
            budget_type,
            "Dry run: budget update skipped"
        );
        Ok(())
    }

    async fn pause_asset(&self, asset_id: &str, asset_type: AssetType) -> ProviderResult<()> {
        info!(
            platform = self.inner.platform(),
            asset_id,
            %asset_type,
            "Dry run: pause skipped"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::SandboxProvider;

    #[tokio::test]
    async fn test_reads_pass_through_writes_do_not() {
        let sandbox = SandboxProvider::new();
        sandbox.set_budget("cmp-1", 100.0);
        let dry = DryRunProvider::new(Arc::new(sandbox.clone()));

        assert!(dry.is_dry_run());
        assert_eq!(dry.get_budget("cmp-1", AssetType::Campaign).await.unwrap(), 100.0);

        dry.update_budget("cmp-1", AssetType::Campaign, 150.0, Some("daily"))
            .await
            .unwrap();
        dry.pause_asset("cmp-1", AssetType::Campaign).await.unwrap();

        assert_eq!(sandbox.budget("cmp-1"), Some(100.0));
        assert!(!sandbox.is_paused("cmp-1"));
        assert_eq!(sandbox.update_count(), 0);
    }
}
