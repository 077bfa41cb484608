//! Budget action execution

use ads_core::{ActionResult, ActionType, Asset, BudgetAction, ChangeType, MetricsSnapshot};
use ads_providers::AdProvider;
use tracing::{debug, info, instrument, warn};

/// What a budget action should do given the current budget
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BudgetPlan {
    /// The change is below the threshold; leave the budget alone
    Unchanged,
    /// Set the budget to this value
    Change(f64),
}

/// Compute the new budget for an increase or decrease
///
/// Increases are capped at `until_limit`; decreases are floored at it, or at
/// 0 when no limit is set. A budget already past the limit is brought back
/// to it. Returns `None` for non-budget actions and unknown change types.
pub fn plan_budget_change(current: f64, action: &BudgetAction, min_change: f64) -> Option<BudgetPlan> {
    let delta = match &action.change_type {
        ChangeType::Percent => current * action.change_by / 100.0,
        ChangeType::Absolute => action.change_by,
        ChangeType::Unsupported(_) => return None,
    };

    let candidate = match action.action_type {
        ActionType::IncreaseBudget => {
            let raised = current + delta;
            action.until_limit.map_or(raised, |limit| raised.min(limit))
        }
        ActionType::DecreaseBudget => (current - delta).max(action.until_limit.unwrap_or(0.0)),
        _ => return None,
    };

    if (candidate - current).abs() < min_change {
        Some(BudgetPlan::Unchanged)
    } else {
        Some(BudgetPlan::Change((candidate * 100.0).round() / 100.0))
    }
}

/// Executes rule actions against a provider
#[derive(Debug, Clone)]
pub struct ActionExecutor {
    min_budget_change: f64,
}

impl ActionExecutor {
    pub fn new(min_budget_change: f64) -> Self {
        Self { min_budget_change }
    }

    /// Execute one action
    ///
    /// Never fails; provider errors become a failed [`ActionResult`].
    #[instrument(
        skip(self, provider, asset, action, snapshot),
        fields(asset_id = %asset.id, action = %action.action_type, roas = snapshot.roas)
    )]
    pub async fn execute(
        &self,
        provider: &dyn AdProvider,
        asset: &Asset,
        action: &BudgetAction,
        snapshot: &MetricsSnapshot,
    ) -> ActionResult {
        let dry_run = provider.is_dry_run();
        let result = match &action.action_type {
            ActionType::Pause => match provider.pause_asset(&asset.external_id, asset.asset_type).await {
                Ok(()) => {
                    info!("Asset paused");
                    ActionResult::paused()
                }
                Err(e) => ActionResult::failed(ActionType::Pause, e.to_string()),
            },
            ActionType::IncreaseBudget | ActionType::DecreaseBudget => {
                self.change_budget(provider, asset, action).await
            }
            ActionType::Unsupported(name) => {
                warn!(action = %name, "Unsupported action");
                ActionResult::failed(action.action_type.clone(), "unsupported action")
            }
        };

        if let Some(error) = &result.error {
            warn!(error = %error, "Action failed");
        }
        result.with_dry_run(dry_run)
    }

    async fn change_budget(
        &self,
        provider: &dyn AdProvider,
        asset: &Asset,
        action: &BudgetAction,
    ) -> ActionResult {
        let action_type = action.action_type.clone();
        if let ChangeType::Unsupported(name) = &action.change_type {
            warn!(change_type = %name, "Unsupported change type");
            return ActionResult::failed(action_type, format!("unsupported change type: {}", name));
        }

        let current = match provider.get_budget(&asset.external_id, asset.asset_type).await {
            Ok(budget) => budget,
            Err(e) => return ActionResult::failed(action_type, format!("failed to read budget: {}", e)),
        };

        match plan_budget_change(current, action, self.min_budget_change) {
            Some(BudgetPlan::Change(after)) => {
                match provider
                    .update_budget(
                        &asset.external_id,
                        asset.asset_type,
                        after,
                        action.budget_type.as_deref(),
                    )
                    .await
                {
                    Ok(()) => {
                        info!(before = current, after, "Budget updated");
                        ActionResult::changed(action_type, current, after)
                    }
                    Err(e) => ActionResult::failed(action_type, e.to_string()),
                }
            }
            Some(BudgetPlan::Unchanged) => {
                debug!(current, "Budget change below threshold, skipped");
                ActionResult::unchanged(action_type, current)
            }
            None => ActionResult::failed(action_type, "unsupported action"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn increase(change_by: f64, change_type: ChangeType, limit: Option<f64>) -> BudgetAction {
        BudgetAction {
            action_type: ActionType::IncreaseBudget,
            change_by,
            change_type,
            until_limit: limit,
            budget_type: None,
        }
    }

    fn decrease(change_by: f64, change_type: ChangeType, limit: Option<f64>) -> BudgetAction {
        BudgetAction {
            action_type: ActionType::DecreaseBudget,
            ..increase(change_by, change_type, limit)
        }
    }

    #[test]
    fn test_percent_increase() {
        let plan = plan_budget_change(100.0, &increase(10.0, ChangeType::Percent, Some(150.0)), 0.01);
        assert_eq!(plan, Some(BudgetPlan::Change(110.0)));
    }

    #[test]
    fn test_increase_capped_at_limit() {
        let plan = plan_budget_change(145.0, &increase(10.0, ChangeType::Percent, Some(150.0)), 0.01);
        assert_eq!(plan, Some(BudgetPlan::Change(150.0)));
    }

    #[test]
    fn test_tiny_change_is_skipped() {
        let plan = plan_budget_change(100.004, &increase(0.005, ChangeType::Absolute, None), 0.01);
        assert_eq!(plan, Some(BudgetPlan::Unchanged));
    }

    #[test]
    fn test_at_limit_is_skipped() {
        let plan = plan_budget_change(150.0, &increase(10.0, ChangeType::Percent, Some(150.0)), 0.01);
        assert_eq!(plan, Some(BudgetPlan::Unchanged));
    }

    #[test]
    fn test_decrease_floored() {
        let plan = plan_budget_change(50.0, &decrease(25.0, ChangeType::Absolute, Some(40.0)), 0.01);
        assert_eq!(plan, Some(BudgetPlan::Change(40.0)));

        let plan = plan_budget_change(50.0, &decrease(80.0, ChangeType::Absolute, None), 0.01);
        assert_eq!(plan, Some(BudgetPlan::Change(0.0)));
    }

    #[test]
    fn test_budget_past_limit_is_brought_back() {
        let plan = plan_budget_change(200.0, &increase(10.0, ChangeType::Percent, Some(150.0)), 0.01);
        assert_eq!(plan, Some(BudgetPlan::Change(150.0)));

        let plan = plan_budget_change(30.0, &decrease(10.0, ChangeType::Percent, Some(40.0)), 0.01);
        assert_eq!(plan, Some(BudgetPlan::Change(40.0)));
    }

    #[test]
    fn test_unknown_change_type_has_no_plan() {
        let action = increase(20.0, ChangeType::Unsupported("percentage".into()), None);
        assert_eq!(plan_budget_change(100.0, &action, 0.01), None);
    }

    #[test]
    fn test_pause_has_no_budget_plan() {
        assert_eq!(plan_budget_change(100.0, &BudgetAction::pause(), 0.01), None);
    }

    mod against_sandbox {
        use super::*;
        use ads_core::AssetType;
        use ads_providers::{DryRunProvider, ProviderError, ProviderResult, SandboxProvider};
        use async_trait::async_trait;
        use std::sync::Arc;

        /// Reads succeed, writes are rejected
        struct ReadOnlyPlatform;

        #[async_trait]
        impl AdProvider for ReadOnlyPlatform {
            fn platform(&self) -> &str {
                "read-only"
            }

            async fn get_budget(&self, _asset_id: &str, _asset_type: AssetType) -> ProviderResult<f64> {
                Ok(100.0)
            }

            async fn update_budget(
                &self,
                _asset_id: &str,
                _asset_type: AssetType,
                _budget: f64,
                _budget_type: Option<&str>,
            ) -> ProviderResult<()> {
                Err(ProviderError::Request("budget locked".into()))
            }

            async fn pause_asset(&self, _asset_id: &str, _asset_type: AssetType) -> ProviderResult<()> {
                Ok(())
            }
        }

        fn asset() -> Asset {
            Asset {
                id: "asset-1".into(),
                platform: "sandbox".into(),
                external_id: "cmp-1".into(),
                asset_type: AssetType::Campaign,
                product_id: "prod-1".into(),
                owner_id: "owner-1".into(),
            }
        }

        #[test]
        fn test_increase_applied() {
            let sandbox = SandboxProvider::new();
            sandbox.set_budget("cmp-1", 100.0);
            let executor = ActionExecutor::new(0.01);

            let result = tokio_test::block_on(executor.execute(
                &sandbox,
                &asset(),
                &BudgetAction::increase_percent(10.0, Some(150.0)),
                &MetricsSnapshot::default(),
            ));

            assert!(result.success);
            assert_eq!(result.before, Some(100.0));
            assert_eq!(result.after, Some(110.0));
            assert_eq!(result.changed, Some(true));
            assert!(!result.dry_run);
            assert_eq!(sandbox.budget("cmp-1"), Some(110.0));
        }

        #[test]
        fn test_no_op_skips_provider_update() {
            let sandbox = SandboxProvider::new();
            sandbox.set_budget("cmp-1", 100.004);
            let executor = ActionExecutor::new(0.01);
            let action = BudgetAction {
                action_type: ActionType::IncreaseBudget,
                change_by: 0.005,
                change_type: ChangeType::Absolute,
                until_limit: None,
                budget_type: None,
            };

            let result = tokio_test::block_on(executor.execute(
                &sandbox,
                &asset(),
                &action,
                &MetricsSnapshot::default(),
            ));

            assert!(result.success);
            assert_eq!(result.changed, Some(false));
            assert_eq!(sandbox.update_count(), 0);
        }

        #[test]
        fn test_provider_failure_is_reported() {
            let sandbox = SandboxProvider::new();
            sandbox.set_budget("cmp-1", 100.0);
            sandbox.fail_asset("cmp-1", "rate limited");
            let executor = ActionExecutor::new(0.01);

            let result = tokio_test::block_on(executor.execute(
                &sandbox,
                &asset(),
                &BudgetAction::pause(),
                &MetricsSnapshot::default(),
            ));

            assert!(!result.success);
            assert_eq!(result.error.as_deref(), Some("platform request failed: rate limited"));
            assert!(!sandbox.is_paused("cmp-1"));
        }

        #[test]
        fn test_budget_read_failure_fails_action() {
            let sandbox = SandboxProvider::new();
            sandbox.set_budget("cmp-1", 100.0);
            sandbox.fail_asset("cmp-1", "rate limited");
            let executor = ActionExecutor::new(0.01);

            let result = tokio_test::block_on(executor.execute(
                &sandbox,
                &asset(),
                &BudgetAction::increase_percent(10.0, None),
                &MetricsSnapshot::default(),
            ));

            assert!(!result.success);
            assert_eq!(
                result.error.as_deref(),
                Some("failed to read budget: platform request failed: rate limited")
            );
            assert_eq!(result.before, None);
            assert_eq!(sandbox.update_count(), 0);
        }

        #[test]
        fn test_unknown_asset_budget_read_fails() {
            let sandbox = SandboxProvider::new();
            let executor = ActionExecutor::new(0.01);

            let result = tokio_test::block_on(executor.execute(
                &sandbox,
                &asset(),
                &BudgetAction::decrease_percent(10.0, None),
                &MetricsSnapshot::default(),
            ));

            assert!(!result.success);
            assert_eq!(
                result.error.as_deref(),
                Some("failed to read budget: asset not found on platform: cmp-1")
            );
            assert_eq!(sandbox.update_count(), 0);
        }

        #[test]
        fn test_budget_update_failure_fails_action() {
            let executor = ActionExecutor::new(0.01);

            let result = tokio_test::block_on(executor.execute(
                &ReadOnlyPlatform,
                &asset(),
                &BudgetAction::increase_percent(10.0, None),
                &MetricsSnapshot::default(),
            ));

            assert!(!result.success);
            assert_eq!(
                result.error.as_deref(),
                Some("platform request failed: budget locked")
            );
        }

        #[test]
        fn test_unknown_change_type_fails_without_provider_calls() {
            let sandbox = SandboxProvider::new();
            sandbox.set_budget("cmp-1", 100.0);
            let executor = ActionExecutor::new(0.01);
            let action = BudgetAction {
                change_type: ChangeType::Unsupported("percentage".into()),
                ..BudgetAction::increase_percent(20.0, None)
            };

            let result = tokio_test::block_on(executor.execute(
                &sandbox,
                &asset(),
                &action,
                &MetricsSnapshot::default(),
            ));

            assert!(!result.success);
            assert_eq!(
                result.error.as_deref(),
                Some("unsupported change type: percentage")
            );
            assert_eq!(sandbox.budget("cmp-1"), Some(100.0));
            assert_eq!(sandbox.update_count(), 0);
        }

        #[test]
        fn test_unsupported_action() {
            let sandbox = SandboxProvider::new();
            let executor = ActionExecutor::new(0.01);
            let action = BudgetAction {
                action_type: ActionType::Unsupported("duplicate".into()),
                ..BudgetAction::pause()
            };

            let result = tokio_test::block_on(executor.execute(
                &sandbox,
                &asset(),
                &action,
                &MetricsSnapshot::default(),
            ));

            assert!(!result.success);
            assert_eq!(result.error.as_deref(), Some("unsupported action"));
        }

        #[test]
        fn test_dry_run_reads_but_does_not_write() {
            let sandbox = SandboxProvider::new();
            sandbox.set_budget("cmp-1", 100.0);
            let provider = DryRunProvider::new(Arc::new(sandbox.clone()));
            let executor = ActionExecutor::new(0.01);

            let result = tokio_test::block_on(executor.execute(
                &provider,
                &asset(),
                &BudgetAction::increase_percent(10.0, None),
                &MetricsSnapshot::default(),
            ));

            assert!(result.success);
            assert!(result.dry_run);
            assert_eq!(result.after, Some(110.0));
            assert_eq!(sandbox.budget("cmp-1"), Some(100.0));
        }
    }
}
