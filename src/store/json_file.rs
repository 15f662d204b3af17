//! JSON file primitives shared by every store.

use std::io;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

/// Read and deserialize a JSON file, degrading to `None`.
///
/// A missing file is normal (nothing persisted yet). A malformed file
/// is logged and treated as absent so a corrupt store never takes the
/// gateway down.
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read store file");
            return None;
        }
    };

    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Malformed store file, treating as empty");
            None
        }
    }
}

/// Read a JSON file, substituting the type's default when absent.
pub async fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    read_json(path).await.unwrap_or_default()
}

/// Serialize and write a JSON file via temp-file-and-rename.
///
/// The rename makes the replace atomic on the same filesystem, so a
/// concurrent reader sees either the old or the new contents, never a
/// torn write.
pub async fn write_json<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    let content = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let tmp = path.with_extension(format!("tmp-{}", Uuid::new_v4()));
    tokio::fs::write(&tmp, content).await?;
    match tokio::fs::rename(&tmp, path).await {
        Ok(()) => Ok(()),
        Err(e) => {
            let _ = tokio::fs::remove_file(&tmp).await;
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("{name}-{}.json", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_missing_file_reads_as_none() {
        let path = temp_path("missing");
        let read: Option<Vec<String>> = read_json(&path).await;
        assert!(read.is_none());
    }

    #[tokio::test]
    async fn test_malformed_file_reads_as_none() {
        let path = temp_path("malformed");
        tokio::fs::write(&path, "{not json").await.unwrap();
        let read: Option<Vec<String>> = read_json(&path).await;
        assert!(read.is_none());
        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_write_then_read_round_trip() {
        let path = temp_path("round-trip");
        let value = vec!["a".to_string(), "b".to_string()];
        write_json(&path, &value).await.unwrap();
        let read: Vec<String> = read_json_or_default(&path).await;
        assert_eq!(read, value);
        let _ = tokio::fs::remove_file(&path).await;
    }
}
