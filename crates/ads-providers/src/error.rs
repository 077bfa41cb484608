//! Provider error types

use ads_store::StoreError;
use thiserror::Error;

/// Errors raised while resolving or calling a provider
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("no provider registered for platform: {platform}")]
    UnknownPlatform { platform: String },

    #[error("no credential of type {expected} for owner {owner_id}")]
    MissingCredential { owner_id: String, expected: String },

    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    #[error("credential lookup failed: {0}")]
    Credentials(#[from] StoreError),

    #[error("asset not found on platform: {asset_id}")]
    AssetNotFound { asset_id: String },

    #[error("platform request failed: {0}")]
    Request(String),
}

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;
