//! Assemble the engine from configuration

use ads_automation::{AutomationEngine, Collaborators};
use ads_config::AppConfig;
use ads_providers::{ProviderRegistry, SandboxProvider};
use ads_store::{FileHistoryStore, MemoryStore, StoreResult, Storage};
use std::sync::Arc;
use tracing::info;

/// The running application's shared pieces
#[derive(Clone)]
pub struct App {
    pub engine: Arc<AutomationEngine>,
    /// Rules, assets, metrics, sales and credentials
    pub store: Arc<MemoryStore>,
    pub sandbox: SandboxProvider,
    pub history: Arc<FileHistoryStore>,
}

/// Load the dataset and build the engine
///
/// The dataset comes from `<storage.root>/.storage/`; history is appended to
/// the configured JSON-lines file.
pub async fn bootstrap(config: &AppConfig) -> StoreResult<App> {
    let storage = Storage::new(&config.storage.root);
    storage.ensure_dir().await?;

    let store = Arc::new(MemoryStore::load(&storage).await?);
    let history = Arc::new(FileHistoryStore::new(config.history_path()));
    let sandbox = SandboxProvider::new();

    let stores = Collaborators::from_memory(store.clone()).with_history(history.clone());
    let providers = ProviderRegistry::with_sandbox(sandbox.clone());
    info!(
        platforms = ?providers.platforms(),
        dry_run = config.automation.dry_run,
        history = %history.path().display(),
        "Automation engine ready"
    );
    let engine = AutomationEngine::new(stores, providers, config.automation.clone());

    Ok(App {
        engine: Arc::new(engine),
        store,
        sandbox,
        history,
    })
}
