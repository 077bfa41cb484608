//! Ad platform providers
//!
//! The automation loop changes budgets and pauses assets only through the
//! [`AdProvider`] trait. Implementations are registered per platform id in a
//! [`ProviderRegistry`] and constructed from the owner's stored credential
//! whose `type` tag is `ad-{platform}`.

mod dry_run;
mod error;
mod provider;
mod registry;
mod sandbox;

pub use dry_run::DryRunProvider;
pub use error::{ProviderError, ProviderResult};
pub use provider::AdProvider;
pub use registry::{ProviderFactory, ProviderRegistry};
pub use sandbox::SandboxProvider;
