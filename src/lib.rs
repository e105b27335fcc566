//! Orphaned-object reconciliation for blob stores backed by a relational
//! index.
//!
//! A cleaning run reads the set of object keys still referenced by a
//! database table, lists the objects physically present under a bucket
//! prefix, and deletes the difference. Per-object deletion failures are
//! reported, not raised; failures reading either set abort the run before
//! anything is deleted.

pub mod config;
pub mod error;
pub mod inventory;
pub mod location;
pub mod reconcile;
pub mod reference;
pub mod runner;

// Re-export commonly used types
pub use config::{CleaningRun, Configuration, DatabaseConfig, StorageConfig};
pub use error::{
    CleanError, ConfigError, DeletionError, ReferenceSourceError, StorageInventoryError,
};
pub use inventory::{ObjectStoreInventory, StorageInventory};
pub use location::{DatabaseLocation, StorageLocation, full_object_key};
pub use reconcile::{Reconciler, RunSummary};
pub use reference::{ReferenceSource, SqlReferenceSource};
pub use runner::{RunError, RunReport, run_all};
