//! Executes every configured cleaning run, isolating failures per run.

use std::sync::Arc;

use uuid::Uuid;

use crate::config::{CleaningRun, Configuration};
use crate::error::{CleanError, ConfigError};
use crate::inventory::ObjectStoreInventory;
use crate::reconcile::{Reconciler, RunSummary};
use crate::reference::SqlReferenceSource;

/// Why a single run failed. Other runs are unaffected either way.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Clean(#[from] CleanError),
}

/// The result of one configured run, successful or not.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    pub run: CleaningRun,
    pub outcome: Result<RunSummary, RunError>,
}

/// Execute all configured cleaning runs sequentially.
///
/// Each run gets a fresh pair of backend handles. A failing run is logged
/// and reported but never prevents later runs from executing.
pub async fn run_all(config: &Configuration) -> Vec<RunReport> {
    let mut reports = Vec::with_capacity(config.cleaning_runs.len());

    for run in &config.cleaning_runs {
        let run_id = Uuid::new_v4();
        tracing::info!(
            run_id = %run_id,
            schema = %run.schema,
            store = %run.store,
            bucket = %run.bucket,
            prefix = %run.prefix,
            "starting cleaning run"
        );

        let outcome = execute_run(config, run).await;
        match &outcome {
            Ok(summary) => summary.log(),
            Err(e) => tracing::error!(run_id = %run_id, error = %e, "cleaning run failed"),
        }

        reports.push(RunReport {
            run_id,
            run: run.clone(),
            outcome,
        });
    }

    reports
}

async fn execute_run(
    config: &Configuration,
    run: &CleaningRun,
) -> Result<RunSummary, RunError> {
    let (db_config, storage_config) = config.resolve(run)?;
    let db_location = run.database_location();
    let storage_location = run.storage_location();

    let references = SqlReferenceSource::new(db_config.clone(), storage_location.prefix.clone());
    let storage = ObjectStoreInventory::connect(storage_config, &storage_location.bucket)
        .map_err(CleanError::Inventory)?;

    let reconciler = Reconciler::new(Arc::new(references), Arc::new(storage));
    let summary = reconciler.run(&db_location, &storage_location).await?;

    Ok(summary)
}
