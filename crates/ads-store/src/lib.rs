//! Collaborator interfaces and storage backends
//!
//! The automation loop talks to rules, assets, metrics, sales, credentials
//! and history only through the traits in this crate. Two backends ship
//! with it:
//!
//! - [`MemoryStore`]: every trait over concurrent maps, seedable from a
//!   versioned JSON dataset in the `.storage/` directory
//! - [`FileHistoryStore`]: append-only JSON-lines history log

mod error;
mod file_history;
mod memory;
pub mod storage;
mod traits;

pub use error::{StoreError, StoreResult};
pub use file_history::FileHistoryStore;
pub use memory::{DailyMetrics, Dataset, IntradaySnapshot, MemoryStore, Sale, SaleStatus};
pub use storage::{Storable, Storage, StorageFile};
pub use traits::{AssetStore, CredentialStore, HistoryStore, MetricsSource, RuleStore, SalesSource};
