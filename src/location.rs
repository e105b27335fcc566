//! Value types identifying where to read references from and where to list
//! objects, plus the key-format convention shared by both sides.
//!
//! Keys are compared as **full object paths**. The reference database stores
//! paths relative to the run's storage prefix, so reference adapters join the
//! prefix onto every value before handing a set to the reconciler. Both sides
//! normalize through [`object_store::path::Path`] so the resulting strings
//! are byte-comparable regardless of stray slashes in configuration.

use object_store::path::Path as ObjectPath;
use serde::{Deserialize, Serialize};

/// Identifies the relational table holding the referenced object keys.
///
/// Carries no connection state; pair it with a `DatabaseConfig` to read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseLocation {
    /// Database schema the store table lives in.
    pub schema: String,
    /// Name of the store table.
    pub store: String,
}

impl DatabaseLocation {
    pub fn new(schema: impl Into<String>, store: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            store: store.into(),
        }
    }
}

/// Identifies the bucket and prefix to inventory.
///
/// Carries no connection state; pair it with a `StorageConfig` to list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageLocation {
    /// Database schema this storage location backs.
    pub schema: String,
    /// Bucket holding the objects.
    pub bucket: String,
    /// Prefix under which all objects of the store live.
    pub prefix: String,
}

impl StorageLocation {
    pub fn new(
        schema: impl Into<String>,
        bucket: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            schema: schema.into(),
            bucket: bucket.into(),
            prefix: prefix.into(),
        }
    }
}

/// Join a prefix-relative key onto the storage prefix, producing the
/// normalized full object path used for set comparison.
pub fn full_object_key(prefix: &str, key: &str) -> String {
    let key = key.trim_start_matches('/');
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        ObjectPath::from(key).to_string()
    } else {
        ObjectPath::from(format!("{prefix}/{key}")).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_object_key_joins_prefix() {
        assert_eq!(
            full_object_key("lab/raw", "sub/file.dat"),
            "lab/raw/sub/file.dat"
        );
    }

    #[test]
    fn test_full_object_key_normalizes_slashes() {
        assert_eq!(full_object_key("lab/raw/", "/file.dat"), "lab/raw/file.dat");
        assert_eq!(full_object_key("/lab/raw", "file.dat"), "lab/raw/file.dat");
        assert_eq!(full_object_key("lab//raw", "file.dat"), "lab/raw/file.dat");
    }

    #[test]
    fn test_full_object_key_empty_prefix() {
        assert_eq!(full_object_key("", "file.dat"), "file.dat");
        assert_eq!(full_object_key("/", "file.dat"), "file.dat");
    }

    #[test]
    fn test_locations_are_plain_values() {
        let db = DatabaseLocation::new("lab", "raw");
        assert_eq!(db, DatabaseLocation::new("lab", "raw"));

        let storage = StorageLocation::new("lab", "lab-bucket", "lab/raw");
        assert_eq!(storage.bucket, "lab-bucket");
        assert_eq!(storage.prefix, "lab/raw");
    }
}
