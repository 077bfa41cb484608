//! Ad assets and platform credentials

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Level of the advertising hierarchy an asset lives at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    Campaign,
    Adset,
    Ad,
}

impl AssetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Campaign => "campaign",
            AssetType::Adset => "adset",
            AssetType::Ad => "ad",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An advertising asset a rule is bound to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    /// Platform id used to pick the provider, e.g. `sandbox`
    pub platform: String,
    /// The platform's own id for this asset
    pub external_id: String,
    pub asset_type: AssetType,
    /// Product whose metrics and sales are attributed to this asset
    pub product_id: String,
    pub owner_id: String,
}

impl Asset {
    /// Credential type tag expected for this asset's platform
    pub fn credential_tag(&self) -> String {
        format!("ad-{}", self.platform)
    }
}

/// Stored platform credential
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub id: String,
    pub owner_id: String,
    /// Credential family, e.g. `ad_platform`
    pub kind: String,
    /// Platform-specific blob; carries a `type` tag such as `ad-sandbox`
    #[serde(default)]
    pub config: Value,
}

impl Credential {
    /// The `type` tag embedded in the config blob
    pub fn type_tag(&self) -> Option<&str> {
        self.config.get("type").and_then(Value::as_str)
    }
}
