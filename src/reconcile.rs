//! The reconciliation core: diff the storage inventory against the reference
//! set and delete whatever is no longer referenced.
//!
//! The two sets are read close together but without cross-source snapshot
//! isolation; negligible staleness between the reads is an accepted
//! assumption of the design.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{CleanError, DeletionError};
use crate::inventory::StorageInventory;
use crate::location::{DatabaseLocation, StorageLocation};
use crate::reference::ReferenceSource;

/// Outcome of one cleaning run.
///
/// Per-object deletion failures are carried here as data; a run with a
/// non-empty `failed` list still counts as completed.
#[derive(Debug)]
pub struct RunSummary {
    /// Keys still referenced by the database.
    pub referenced: usize,
    /// Keys physically present under the prefix.
    pub inventoried: usize,
    /// Keys present in storage but unreferenced.
    pub orphaned: usize,
    /// Orphans actually deleted.
    pub deleted: usize,
    /// Orphans whose deletion failed.
    pub failed: Vec<DeletionError>,
}

impl RunSummary {
    /// Emit the run's counts and every failed key with its error detail.
    pub fn log(&self) {
        tracing::info!(
            referenced = self.referenced,
            inventoried = self.inventoried,
            orphaned = self.orphaned,
            deleted = self.deleted,
            failed = self.failed.len(),
            "cleaning run complete"
        );
        for failure in &self.failed {
            tracing::error!(
                key = %failure.key,
                error = %failure.source,
                "orphaned object could not be deleted"
            );
        }
    }
}

/// Orchestrates one cleaning run end-to-end.
///
/// Backend handles are passed in explicitly so tests can substitute fakes
/// per run without shared state.
pub struct Reconciler {
    references: Arc<dyn ReferenceSource>,
    storage: Arc<dyn StorageInventory>,
}

impl Reconciler {
    pub fn new(references: Arc<dyn ReferenceSource>, storage: Arc<dyn StorageInventory>) -> Self {
        Self {
            references,
            storage,
        }
    }

    /// Execute one run: read both sets, diff, delete the orphans.
    ///
    /// A failure in either read aborts before anything is deleted.
    /// Re-running immediately after a successful run finds an empty orphan
    /// set, since deleted keys no longer appear in the inventory.
    pub async fn run(
        &self,
        db_location: &DatabaseLocation,
        storage_location: &StorageLocation,
    ) -> Result<RunSummary, CleanError> {
        let referenced = self.references.list_referenced_keys(db_location).await?;
        let inventory = self.storage.list_objects(storage_location).await?;

        let orphans: HashSet<String> = inventory.difference(&referenced).cloned().collect();
        let orphaned = orphans.len();

        tracing::info!(
            schema = %storage_location.schema,
            bucket = %storage_location.bucket,
            prefix = %storage_location.prefix,
            referenced = referenced.len(),
            inventoried = inventory.len(),
            orphaned = orphaned,
            "identified orphaned objects"
        );

        if orphans.is_empty() {
            return Ok(RunSummary {
                referenced: referenced.len(),
                inventoried: inventory.len(),
                orphaned: 0,
                deleted: 0,
                failed: Vec::new(),
            });
        }

        let failed = self.storage.delete_objects(orphans).await;
        let deleted = orphaned - failed.len();

        Ok(RunSummary {
            referenced: referenced.len(),
            inventoried: inventory.len(),
            orphaned,
            deleted,
            failed,
        })
    }
}
