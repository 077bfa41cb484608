//! Static platform → provider constructor map

use ads_core::{Asset, Credential};
use ads_store::CredentialStore;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::dry_run::DryRunProvider;
use crate::error::{ProviderError, ProviderResult};
use crate::provider::AdProvider;
use crate::sandbox::{SandboxProvider, SANDBOX_PLATFORM};

/// Builds a provider from the owner's credential for that platform
pub type ProviderFactory =
    Arc<dyn Fn(&Credential) -> ProviderResult<Arc<dyn AdProvider>> + Send + Sync>;

/// Registry of provider constructors keyed by platform id
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    factories: HashMap<String, ProviderFactory>,
    dry_run: bool,
}

impl ProviderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the sandbox platform backed by `sandbox`
    pub fn with_sandbox(sandbox: SandboxProvider) -> Self {
        let mut registry = Self::new();
        registry.register_sandbox(sandbox);
        registry
    }

    /// Wrap every resolved provider in a [`DryRunProvider`] when enabled
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Register a constructor, replacing any previous one for the platform
    pub fn register<F>(&mut self, platform: impl Into<String>, factory: F)
    where
        F: Fn(&Credential) -> ProviderResult<Arc<dyn AdProvider>> + Send + Sync + 'static,
    {
        let platform = platform.into();
        debug!(platform = %platform, "Registering provider");
        self.factories.insert(platform, Arc::new(factory));
    }

    /// Register the sandbox platform; credentials may seed its budgets
    pub fn register_sandbox(&mut self, sandbox: SandboxProvider) {
        self.register(SANDBOX_PLATFORM, move |credential| {
            sandbox.seed_from(credential);
            Ok(Arc::new(sandbox.clone()) as Arc<dyn AdProvider>)
        });
    }

    pub fn contains(&self, platform: &str) -> bool {
        self.factories.contains_key(platform)
    }

    /// Registered platform ids, sorted
    pub fn platforms(&self) -> Vec<String> {
        let mut platforms: Vec<String> = self.factories.keys().cloned().collect();
        platforms.sort();
        platforms
    }

    /// Build the provider for `asset`
    ///
    /// Looks up the platform constructor, then the owner's credentials of
    /// `kind`, and picks the one tagged `ad-{platform}`.
    #[instrument(skip(self, asset, credentials), fields(asset_id = %asset.id, platform = %asset.platform))]
    pub async fn resolve(
        &self,
        asset: &Asset,
        credentials: &dyn CredentialStore,
        kind: &str,
    ) -> ProviderResult<Arc<dyn AdProvider>> {
        let factory = self
            .factories
            .get(&asset.platform)
            .ok_or_else(|| ProviderError::UnknownPlatform {
                platform: asset.platform.clone(),
            })?;

        let expected = asset.credential_tag();
        let candidates = credentials.credentials(&asset.owner_id, kind).await?;
        let credential = candidates
            .iter()
            .find(|c| c.type_tag() == Some(expected.as_str()))
            .ok_or_else(|| {
                warn!(
                    owner_id = %asset.owner_id,
                    expected = %expected,
                    candidates = candidates.len(),
                    "No matching credential"
                );
                ProviderError::MissingCredential {
                    owner_id: asset.owner_id.clone(),
                    expected: expected.clone(),
                }
            })?;

        let provider = factory(credential)?;
        if self.dry_run {
            Ok(Arc::new(DryRunProvider::new(provider)))
        } else {
            Ok(provider)
        }
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("platforms", &self.platforms())
            .field("dry_run", &self.dry_run)
            .finish()
    }
}
