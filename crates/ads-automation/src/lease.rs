//! In-process per-asset leases
//!
//! A run holds the asset's lease while executing its actions. A second run
//! in the same process reaching the same asset finds it busy instead of
//! applying the same budget change twice.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::trace;

/// Set of assets currently being acted on
#[derive(Debug, Clone, Default)]
pub struct AssetLeases {
    held: Arc<DashMap<String, ()>>,
}

impl AssetLeases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lease for `asset_id`, or `None` if another holder has it
    pub fn try_acquire(&self, asset_id: &str) -> Option<AssetLease> {
        match self.held.entry(asset_id.to_string()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(());
                trace!(asset_id, "Lease acquired");
                Some(AssetLease {
                    held: self.held.clone(),
                    asset_id: asset_id.to_string(),
                })
            }
        }
    }

    pub fn is_held(&self, asset_id: &str) -> bool {
        self.held.contains_key(asset_id)
    }
}

/// A held lease; released on drop
#[derive(Debug)]
pub struct AssetLease {
    held: Arc<DashMap<String, ()>>,
    asset_id: String,
}

impl AssetLease {
    pub fn asset_id(&self) -> &str {
        &self.asset_id
    }
}

impl Drop for AssetLease {
    fn drop(&mut self) {
        self.held.remove(&self.asset_id);
        trace!(asset_id = %self.asset_id, "Lease released");
    }
}
