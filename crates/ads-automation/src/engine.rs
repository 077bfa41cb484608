//! The automation run loop

use ads_core::{
    ActionResult, Asset, AutomationSettings, ExecutionSource, HistoryRecord, OutcomeStatus, Rule,
    RuleOutcome, RunReport,
};
use ads_logic::Evaluator;
use ads_providers::ProviderRegistry;
use ads_store::{
    AssetStore, CredentialStore, HistoryStore, MemoryStore, MetricsSource, RuleStore, SalesSource,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use crate::clock::Clock;
use crate::compiler::compile;
use crate::error::{AutomationError, AutomationResult, MetricsError};
use crate::executor::ActionExecutor;
use crate::lease::AssetLeases;
use crate::resolver::{MetricsResolver, ResolvedMetrics};

/// Stores and sources the loop reads from and writes to
#[derive(Clone)]
pub struct Collaborators {
    pub rules: Arc<dyn RuleStore>,
    pub assets: Arc<dyn AssetStore>,
    pub metrics: Arc<dyn MetricsSource>,
    pub sales: Arc<dyn SalesSource>,
    pub credentials: Arc<dyn CredentialStore>,
    pub history: Arc<dyn HistoryStore>,
}

impl Collaborators {
    /// Every collaborator backed by one [`MemoryStore`]
    pub fn from_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            rules: store.clone(),
            assets: store.clone(),
            metrics: store.clone(),
            sales: store.clone(),
            credentials: store.clone(),
            history: store,
        }
    }

    /// Write history somewhere else
    pub fn with_history(mut self, history: Arc<dyn HistoryStore>) -> Self {
        self.history = history;
        self
    }
}

/// Parameters of one batch invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunRequest {
    /// Only evaluate this owner's rules
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub source: ExecutionSource,
}

impl RunRequest {
    pub fn new(source: ExecutionSource) -> Self {
        Self {
            owner_id: None,
            source,
        }
    }

    pub fn for_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }
}

/// How a rule counts in the report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tally {
    /// Asset did not resolve; not counted
    Unresolved,
    /// Evaluated to a decision
    Processed,
    /// Failed after the asset resolved
    Failed,
}

/// Evaluates active rules and applies their actions
pub struct AutomationEngine {
    stores: Collaborators,
    providers: ProviderRegistry,
    settings: AutomationSettings,
    evaluator: Evaluator,
    resolver: MetricsResolver,
    executor: ActionExecutor,
    leases: AssetLeases,
}

impl AutomationEngine {
    pub fn new(
        stores: Collaborators,
        providers: ProviderRegistry,
        settings: AutomationSettings,
    ) -> Self {
        let providers = if settings.dry_run {
            providers.dry_run(true)
        } else {
            providers
        };
        let resolver = MetricsResolver::new(stores.metrics.clone(), stores.sales.clone(), &settings);
        let executor = ActionExecutor::new(settings.min_budget_change);

        Self {
            stores,
            providers,
            settings,
            evaluator: Evaluator::new(),
            resolver,
            executor,
            leases: AssetLeases::new(),
        }
    }

    /// Use `evaluator` (and its custom operators) for conditions
    pub fn with_evaluator(mut self, evaluator: Evaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Use `clock` for "today"
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.resolver = MetricsResolver::new(
            self.stores.metrics.clone(),
            self.stores.sales.clone(),
            &self.settings,
        )
        .with_clock(clock);
        self
    }

    /// Share leases with another engine in this process
    pub fn with_leases(mut self, leases: AssetLeases) -> Self {
        self.leases = leases;
        self
    }

    pub fn leases(&self) -> &AssetLeases {
        &self.leases
    }

    pub fn settings(&self) -> &AutomationSettings {
        &self.settings
    }

    /// Evaluate every active rule once
    ///
    /// Rules run one after another. Per-rule failures are recorded in the
    /// report; only a failure to load the rule list fails the whole run.
    #[instrument(skip(self, request), fields(source = ?request.source, owner_id = ?request.owner_id))]
    pub async fn run(&self, request: RunRequest) -> RunReport {
        let started = Instant::now();

        let rules = match self.stores.rules.active_rules(request.owner_id.as_deref()).await {
            Ok(rules) => rules,
            Err(e) => {
                error!(error = %e, "Failed to load rules");
                let mut report = RunReport::failed(format!("failed to load rules: {}", e));
                report.execution_time_seconds = started.elapsed().as_secs_f64();
                return report;
            }
        };

        if rules.is_empty() {
            info!("No active rules");
            let mut report = RunReport::empty().with_message("no active rules");
            report.execution_time_seconds = started.elapsed().as_secs_f64();
            return report;
        }

        info!(rules = rules.len(), "Starting automation run");
        let mut report = RunReport::empty();
        for rule in &rules {
            let (tally, outcome) = self.process_rule(rule, request.source).await;
            match tally {
                Tally::Processed => report.rules_processed += 1,
                Tally::Failed => report.errors += 1,
                Tally::Unresolved => {}
            }
            if outcome.actions.iter().any(|action| action.success) {
                report.actions_executed += 1;
            }
            report.results.push(outcome);
        }

        report.message = Some(format!(
            "processed {} rules, {} with actions, {} errors",
            report.rules_processed, report.actions_executed, report.errors
        ));
        report.execution_time_seconds = started.elapsed().as_secs_f64();
        info!(
            processed = report.rules_processed,
            actions = report.actions_executed,
            errors = report.errors,
            seconds = report.execution_time_seconds,
            "Automation run finished"
        );
        report
    }

    #[instrument(skip_all, fields(rule_id = %rule.id))]
    async fn process_rule(&self, rule: &Rule, source: ExecutionSource) -> (Tally, RuleOutcome) {
        let mut outcome = RuleOutcome {
            rule_id: rule.id.clone(),
            rule_name: rule.name.clone(),
            asset_id: rule.asset_id.clone(),
            status: OutcomeStatus::Failed,
            conditions_met: false,
            actions: Vec::new(),
            error: None,
            history_id: None,
        };

        let asset = match self.stores.assets.asset(&rule.asset_id).await {
            Ok(Some(asset)) => asset,
            Ok(None) => {
                let e = AutomationError::AssetNotFound(rule.asset_id.clone());
                warn!(rule_id = %rule.id, error = %e, "Skipping rule");
                outcome.error = Some(e.to_string());
                return (Tally::Unresolved, outcome);
            }
            Err(e) => {
                let e = AutomationError::Store(e);
                warn!(rule_id = %rule.id, error = %e, "Skipping rule");
                outcome.error = Some(e.to_string());
                return (Tally::Unresolved, outcome);
            }
        };

        let mut record = HistoryRecord::new(rule, source);
        let mut tally = match self.evaluate_rule(rule, &asset, &mut record).await {
            Ok(()) => {
                outcome.status = OutcomeStatus::Evaluated;
                Tally::Processed
            }
            Err(e) => {
                if e.is_validation() {
                    info!(rule_id = %rule.id, reason = %e, "Rule skipped");
                } else {
                    error!(rule_id = %rule.id, error = %e, "Rule evaluation failed");
                }
                record.set_error(e.to_string());
                Tally::Failed
            }
        };

        outcome.conditions_met = record.conditions_met;
        outcome.actions = record.action_results.clone();
        outcome.error = record.error_message.clone();

        match self.stores.history.append(&record).await {
            Ok(()) => outcome.history_id = Some(record.id.clone()),
            Err(e) => {
                let e = AutomationError::Store(e);
                error!(rule_id = %rule.id, error = %e, "Failed to write history");
                if outcome.error.is_none() {
                    outcome.error = Some(e.to_string());
                }
                tally = Tally::Failed;
            }
        }

        (tally, outcome)
    }

    async fn evaluate_rule(
        &self,
        rule: &Rule,
        asset: &Asset,
        record: &mut HistoryRecord,
    ) -> AutomationResult<()> {
        let groups = &rule.config.condition_groups;

        let resolved = match self.resolver.resolve(asset, groups).await {
            Ok(resolved) => resolved,
            Err(MetricsError::Validation {
                failure,
                snapshot,
                time_range,
            }) => {
                record.set_metrics(*snapshot, time_range);
                return Err(AutomationError::Validation(failure));
            }
            Err(e) => return Err(e.into()),
        };
        record.set_metrics(resolved.snapshot.clone(), resolved.time_range.clone());

        let compiled = compile(groups, &rule.config.combination_mode, self.evaluator.registry())?;
        let unknown = compiled.unknown_metrics();
        if !unknown.is_empty() {
            warn!(rule_id = %rule.id, metrics = ?unknown, "Conditions reference unknown metrics");
        }

        let evaluation = compiled.evaluate(&self.evaluator, &resolved.snapshot)?;
        if !evaluation.is_clean() {
            debug!(rule_id = %rule.id, diagnostics = ?evaluation.diagnostics, "Evaluation used fallbacks");
        }
        if !evaluation.is_truthy() {
            debug!(rule_id = %rule.id, "Conditions not met");
            return Ok(());
        }

        info!(
            rule_id = %rule.id,
            time_range = %resolved.time_range.label,
            actions = rule.config.actions.len(),
            "Conditions met"
        );
        self.execute_actions(rule, asset, &resolved, record).await
    }

    async fn execute_actions(
        &self,
        rule: &Rule,
        asset: &Asset,
        resolved: &ResolvedMetrics,
        record: &mut HistoryRecord,
    ) -> AutomationResult<()> {
        let actions = &rule.config.actions;
        if actions.is_empty() {
            record.set_actions(Vec::new());
            return Ok(());
        }

        let Some(_lease) = self.leases.try_acquire(&asset.id) else {
            warn!(rule_id = %rule.id, asset_id = %asset.id, "Asset is busy");
            record.set_actions(fail_all(rule, "asset is busy"));
            return Ok(());
        };

        let provider = match self
            .providers
            .resolve(asset, self.stores.credentials.as_ref(), &self.settings.credential_kind)
            .await
        {
            Ok(provider) => provider,
            Err(e) => {
                record.set_actions(fail_all(rule, &e.to_string()));
                return Err(e.into());
            }
        };

        let mut results = Vec::with_capacity(actions.len());
        for action in actions {
            let result = self
                .executor
                .execute(provider.as_ref(), asset, action, &resolved.snapshot)
                .await;
            results.push(result);
        }
        record.set_actions(results);
        Ok(())
    }
}

fn fail_all(rule: &Rule, message: &str) -> Vec<ActionResult> {
    rule.config
        .actions
        .iter()
        .map(|action| ActionResult::failed(action.action_type.clone(), message))
        .collect()
}
