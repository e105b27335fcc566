//! Error taxonomy for the cleaning job.
//!
//! The two read steps fail with run-fatal errors; per-object deletion
//! failures are data carried in the run summary, never raised.

/// Configuration could not be loaded or references servers that do not exist.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("cleaning run references unknown database server '{0}'")]
    UnknownDatabaseServer(String),

    #[error("cleaning run references unknown storage server '{0}'")]
    UnknownStorageServer(String),
}

/// Reading the authoritative reference set failed.
///
/// Fatal to the current run only; nothing is deleted when this occurs.
#[derive(Debug, thiserror::Error)]
pub enum ReferenceSourceError {
    #[error("unsupported database scheme in DSN '{0}', expected postgres:// or sqlite:")]
    UnsupportedScheme(String),

    #[error("failed to connect to reference database: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("failed to read referenced keys from '{table}': {source}")]
    Query {
        table: String,
        #[source]
        source: sqlx::Error,
    },
}

/// Listing the blob store failed, or the storage backend could not be built.
///
/// Fatal to the current run only; nothing is deleted when this occurs.
#[derive(Debug, thiserror::Error)]
pub enum StorageInventoryError {
    #[error("invalid storage DSN '{dsn}': {reason}")]
    InvalidDsn { dsn: String, reason: String },

    #[error("failed to initialize storage backend: {0}")]
    Connect(#[source] object_store::Error),

    #[error("failed to list objects under '{prefix}': {source}")]
    List {
        prefix: String,
        #[source]
        source: object_store::Error,
    },
}

/// One object failed to delete.
///
/// Non-fatal: collected into the run summary; the run still completes.
#[derive(Debug, thiserror::Error)]
#[error("failed to delete '{key}': {source}")]
pub struct DeletionError {
    pub key: String,
    #[source]
    pub source: object_store::Error,
}

/// The run-fatal union: either read step failed before any deletion.
#[derive(Debug, thiserror::Error)]
pub enum CleanError {
    #[error(transparent)]
    Reference(#[from] ReferenceSourceError),

    #[error(transparent)]
    Inventory(#[from] StorageInventoryError),
}
