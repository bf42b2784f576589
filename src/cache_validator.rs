use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Integrity-checked wrapper for cached adapter responses.
///
/// The cached payload is stored next to its SHA-256 checksum; an entry whose
/// checksum no longer matches is treated as a cache miss so the adapter is
/// called live again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatedCacheEntry {
    /// The cached value as a JSON string
    pub data: String,
    /// SHA-256 checksum of `data` (hex encoded)
    pub checksum: String,
}

impl ValidatedCacheEntry {
    pub fn new(data: String) -> Self {
        let checksum = Self::compute_checksum(&data);
        Self { data, checksum }
    }

    fn compute_checksum(data: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn is_valid(&self) -> bool {
        Self::compute_checksum(&self.data) == self.checksum
    }

    /// Serializes the entry (data + checksum) for storage in the cache.
    pub fn serialize(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Returns the raw data if the entry parses and its checksum matches.
    pub fn deserialize_and_validate(serialized: &str) -> Option<String> {
        let entry: ValidatedCacheEntry = serde_json::from_str(serialized).ok()?;

        if entry.is_valid() {
            Some(entry.data)
        } else {
            tracing::warn!(
                "Cache validation failed: checksum mismatch. Expected: {}, Data length: {}",
                entry.checksum,
                entry.data.len()
            );
            None
        }
    }

    /// Serializes `value` and wraps it in a checksummed entry string.
    pub fn seal<T: Serialize>(value: &T) -> Option<String> {
        let data = serde_json::to_string(value).ok()?;
        Some(Self::new(data).serialize())
    }

    /// Validates a sealed entry and decodes it back into `T`.
    pub fn open<T: DeserializeOwned>(serialized: &str) -> Option<T> {
        let data = Self::deserialize_and_validate(serialized)?;
        serde_json::from_str(&data).ok()
    }
}
