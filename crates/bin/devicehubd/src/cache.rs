//! Device cache file: a JSON array with one settings record per device.

use std::path::Path;

use devicehub_domain::settings::DeviceSettings;

/// Cache file errors.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// File I/O failure.
    #[error("failed to access device cache")]
    Io(#[from] std::io::Error),
    /// The file is not a JSON array, or a snapshot failed to serialize.
    #[error("device cache is not a JSON array of records")]
    Json(#[from] serde_json::Error),
}

/// Read every record of the cache at `path`. A missing file is an empty
/// cache; records are validated one by one by the registry.
///
/// # Errors
///
/// Returns [`CacheError`] when the file cannot be read or is not an array.
pub async fn load(path: &Path) -> Result<Vec<serde_json::Value>, CacheError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "no device cache yet");
            Ok(Vec::new())
        }
        Err(err) => Err(err.into()),
    }
}

/// Replace the cache at `path` with `records`.
///
/// The snapshot is written next to the cache and renamed over it, so a
/// crash never leaves a truncated file behind.
///
/// # Errors
///
/// Returns [`CacheError`] when the snapshot cannot be written.
pub async fn save(path: &Path, records: &[DeviceSettings]) -> Result<(), CacheError> {
    let bytes = serde_json::to_vec_pretty(records)?;
    let staging = path.with_extension("json.tmp");
    tokio::fs::write(&staging, bytes).await?;
    tokio::fs::rename(&staging, path).await?;
    tracing::debug!(path = %path.display(), devices = records.len(), "device cache saved");
    Ok(())
}
