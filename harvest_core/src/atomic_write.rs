use std::path::Path;

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::error::FetchError;

const DIR_MODE: u32 = 0o755;

/// Serializes `value` as 2-space-indented pretty JSON to a `.tmp` sibling of
/// `path`, then renames it into place. Parent directories are created with
/// mode 0755. On any mid-stream error the temp file is abandoned — no
/// cleanup attempt is made, matching spec.md's explicit "best-effort" note.
///
/// Overwrites an existing final path unconditionally; callers gate on
/// existence themselves before calling this.
pub async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), FetchError> {
    if let Some(parent) = path.parent() {
        create_dir_all_0755(parent).await?;
    }

    let tmp_path = tmp_sibling(path);
    let bytes = to_pretty_bytes(value).map_err(FetchError::Decode)?;
    tokio::fs::write(&tmp_path, bytes).await?;
    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}

fn tmp_sibling(path: &Path) -> std::path::PathBuf {
    let mut os_string = path.as_os_str().to_owned();
    os_string.push(".tmp");
    std::path::PathBuf::from(os_string)
}

fn to_pretty_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"  ");
    let mut ser = Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(buf)
}

#[cfg(unix)]
async fn create_dir_all_0755(dir: &Path) -> Result<(), FetchError> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::create_dir_all(dir).await?;
    let perms = std::fs::Permissions::from_mode(DIR_MODE);
    // Best-effort: a concurrent worker may have already set/changed this.
    let _ = tokio::fs::set_permissions(dir, perms).await;
    Ok(())
}

#[cfg(not(unix))]
async fn create_dir_all_0755(dir: &Path) -> Result<(), FetchError> {
    tokio::fs::create_dir_all(dir).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn writes_pretty_two_space_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("record.json");
        write_json(&path, &json!({"a": 1, "b": [1, 2]})).await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(content.contains("  \"a\": 1"));
        assert!(!tmp_sibling(&path).exists());
    }

    #[tokio::test]
    async fn never_exposes_a_partial_file_at_the_final_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("record.json");
        write_json(&path, &json!({"v": 1})).await.unwrap();

        // Second write overwrites, but readers racing the rename only ever
        // see ENOENT, the old full file, or the new full file.
        write_json(&path, &json!({"v": 2})).await.unwrap();
        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["v"], 2);
    }

    #[tokio::test]
    async fn overwrites_existing_final_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("record.json");
        write_json(&path, &json!({"v": "first"})).await.unwrap();
        write_json(&path, &json!({"v": "second"})).await.unwrap();
        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(content.contains("second"));
    }
}
