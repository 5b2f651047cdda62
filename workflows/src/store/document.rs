//! Whole-document reads and writes against a storage key

use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

use crate::errors::WorkflowError;
use crate::storage::backend::StorageBackend;

/// Where a loaded collection came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadSource {
    /// Parsed from durable storage
    Persisted,

    /// Nothing stored under the key; sample data loaded
    SeedMissing,

    /// Stored value did not parse; sample data loaded
    SeedCorrupt { reason: String },

    /// Backend read failed; sample data loaded
    SeedUnreadable { reason: String },
}

impl LoadSource {
    pub fn is_seed(&self) -> bool {
        !matches!(self, LoadSource::Persisted)
    }
}

/// Read and parse the document under `key`, or fall back to `seed()`.
///
/// Never fails: every problem is logged and reported through [`LoadSource`].
pub async fn read_or_seed<T, F>(backend: &dyn StorageBackend, key: &str, seed: F) -> (T, LoadSource)
where
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    match backend.get(key).await {
        Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
            Ok(value) => (value, LoadSource::Persisted),
            Err(e) => {
                warn!("Stored value under '{}' is not valid, using sample data: {}", key, e);
                (
                    seed(),
                    LoadSource::SeedCorrupt {
                        reason: e.to_string(),
                    },
                )
            }
        },
        Ok(None) => (seed(), LoadSource::SeedMissing),
        Err(e) => {
            warn!("Unable to read '{}', using sample data: {}", key, e);
            (
                seed(),
                LoadSource::SeedUnreadable {
                    reason: e.to_string(),
                },
            )
        }
    }
}

/// Serialize `value` and replace the document under `key`
pub async fn write<T: Serialize + ?Sized>(
    backend: &dyn StorageBackend,
    key: &str,
    value: &T,
) -> Result<(), WorkflowError> {
    let raw = serde_json::to_string(value)?;
    backend.set(key, &raw).await
}
