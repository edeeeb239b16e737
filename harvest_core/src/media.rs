use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::FetchError;
use crate::http_client::HttpFetcher;

const CANONICAL_MEDIA_HOST: &str = "vines.s3.amazonaws.com";
const MEDIA_EXTENSIONS: [&str; 5] = [".mp4", ".jpg", ".jpeg", ".png", ".gif"];

/// Recursively collects every string leaf under `record` that names the
/// canonical media host and ends in a known media extension. Walk order is
/// preserved; duplicates within a single record are not pre-filtered — the
/// downloader dedups globally via `MediaDownloader`'s memo.
pub fn collect_media_urls(record: &Value) -> Vec<String> {
    let mut urls = Vec::new();
    walk(record, &mut urls);
    urls
}

fn walk(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            if s.contains(CANONICAL_MEDIA_HOST) && MEDIA_EXTENSIONS.iter().any(|ext| s.contains(ext)) {
                out.push(s.clone());
            }
        }
        Value::Array(items) => items.iter().for_each(|v| walk(v, out)),
        Value::Object(map) => map.values().for_each(|v| walk(v, out)),
        _ => {}
    }
}

/// Process-wide at-most-once media downloader. The URL memo is a mutex-
/// guarded set; check-and-insert is a single critical section with no I/O
/// inside, per spec.md's shared-state design notes.
pub struct MediaDownloader {
    fetcher: Arc<HttpFetcher>,
    media_root: PathBuf,
    seen: Mutex<HashSet<String>>,
}

impl MediaDownloader {
    pub fn new(fetcher: Arc<HttpFetcher>, media_root: PathBuf) -> Self {
        Self {
            fetcher,
            media_root,
            seen: Mutex::new(HashSet::new()),
        }
    }

    /// Downloads `url` to `media_root/<url path, leading slash stripped>` if
    /// it hasn't been downloaded yet this process and the file doesn't
    /// already exist on disk. Returns `Ok(())` for an already-seen or
    /// already-downloaded URL without making a request.
    pub async fn download(&self, url: &str) -> Result<(), FetchError> {
        {
            let mut seen = self.seen.lock().await;
            if !seen.insert(url.to_string()) {
                return Ok(());
            }
        }

        let local_path = self.local_path_for(url);
        if local_path.exists() {
            return Ok(());
        }

        if let Some(parent) = local_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp_path = {
            let mut s = local_path.as_os_str().to_owned();
            s.push(".tmp");
            PathBuf::from(s)
        };

        let mut file = tokio::fs::File::create(&tmp_path).await?;
        self.fetcher.download_to(url, &mut file).await?;
        drop(file);
        tokio::fs::rename(&tmp_path, &local_path).await?;
        Ok(())
    }

    fn local_path_for(&self, url: &str) -> PathBuf {
        let url_path = reqwest::Url::parse(url)
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| url.to_string());
        let stripped = url_path.strip_prefix('/').unwrap_or(&url_path);
        self.media_root.join(relative_path_components(stripped))
    }
}

/// Joins path segments individually rather than via `Path::from(str)` so
/// that `..`/separators embedded in a single decoded segment can't escape
/// `media_root`.
fn relative_path_components(path: &str) -> PathBuf {
    path.split('/').filter(|seg| !seg.is_empty() && *seg != ".." ).collect::<PathBuf>()
}

pub fn media_root(out_root: &Path) -> PathBuf {
    out_root.join("media")
}
