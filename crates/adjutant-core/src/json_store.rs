//! Atomic whole-file JSON persistence, shared by the JSON-on-disk
//! registries: `adjutant-projects`' Project Registry and
//! `adjutant-session`'s terminal-session registry.
//!
//! Writes go through a temp-file-in-the-same-directory followed by
//! `rename`, which is atomic on the same filesystem — a reader never
//! observes a half-written file.

use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum JsonFileError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("serde: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Read and deserialize `path`, returning `default()` if the file does not
/// exist yet.
pub async fn read_or_default<T>(path: impl AsRef<Path>) -> Result<T, JsonFileError>
where
    T: serde::de::DeserializeOwned + Default,
{
    let path = path.as_ref();
    match tokio::fs::try_exists(path).await? {
        false => Ok(T::default()),
        true => {
            let data = tokio::fs::read_to_string(path).await?;
            Ok(serde_json::from_str(&data)?)
        }
    }
}

/// Serialize `value` and atomically replace the contents of `path`.
///
/// The parent directory is created if missing. The temp file lives in the
/// same directory as `path` so `rename` stays within one filesystem.
pub async fn write_atomic<T>(path: impl AsRef<Path>, value: &T) -> Result<(), JsonFileError>
where
    T: serde::Serialize,
{
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_string_pretty(value)?;

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, json).await?;
    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}
