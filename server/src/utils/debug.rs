//! Debug mode helper for recording analytics queries to JSON lines files

use std::path::Path;
use std::sync::LazyLock;

use chrono::Utc;
use serde::Serialize;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Serializes appends so concurrent queries never interleave lines
static WRITE_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

#[derive(Serialize)]
struct DebugEntry<'a, T: Serialize> {
    timestamp: String,
    data: &'a T,
}

/// Append `data` as one JSON line to `debug_path/filename`.
///
/// Errors are logged and swallowed.
pub async fn write_debug<T: Serialize>(debug_path: &Path, filename: &str, data: &T) {
    let file_path = debug_path.join(filename);
    let entry = DebugEntry {
        timestamp: Utc::now().to_rfc3339(),
        data,
    };

    let json = match serde_json::to_string(&entry) {
        Ok(j) => j,
        Err(e) => {
            tracing::warn!(error = %e, filename, "Failed to serialize debug entry");
            return;
        }
    };

    let _guard = WRITE_LOCK.lock().await;

    let result = async {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)
            .await?;
        file.write_all(json.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;
        Ok::<_, std::io::Error>(())
    }
    .await;

    if let Err(e) = result {
        tracing::warn!(
            error = %e,
            path = %file_path.display(),
            "Failed to write debug entry"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[tokio::test]
    async fn appends_json_lines() {
        let dir = tempfile::tempdir().unwrap();

        write_debug(dir.path(), "queries.jsonl", &json!({ "query": "SELECT 1" })).await;
        write_debug(dir.path(), "queries.jsonl", &json!({ "query": "SELECT 2" })).await;

        let content = std::fs::read_to_string(dir.path().join("queries.jsonl")).unwrap();
        let lines: Vec<Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["data"]["query"], "SELECT 2");
        assert!(lines[0]["timestamp"].is_string());
    }

    #[tokio::test]
    async fn missing_directory_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        write_debug(&missing, "queries.jsonl", &json!({})).await;
        assert!(!missing.exists());
    }
}
