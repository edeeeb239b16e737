use std::collections::HashSet;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::HarvestError;
use crate::slug_scan::scan_slugs;

/// Recursively walks `root`, feeding every regular file to the Slug Scanner.
/// A non-existent or non-directory root is fatal; walk errors on individual
/// entries (permission denied, broken symlink, ...) are logged and skipped.
pub async fn collect_slugs_from_directory(root: &str) -> Result<HashSet<String>, HarvestError> {
    let root_path = Path::new(root);
    if !root_path.is_dir() {
        return Err(HarvestError::BadInputRoot(root_path.to_path_buf()));
    }

    let mut slugs = HashSet::new();
    for entry in WalkDir::new(root_path) {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                log::warn!("seed_source: walk error under {root}: {err}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let file = match tokio::fs::File::open(path).await {
            Ok(f) => f,
            Err(err) => {
                log::warn!("seed_source: could not open {}: {err}", path.display());
                continue;
            }
        };
        if let Err(err) = scan_slugs(file, &mut slugs).await {
            log::warn!("seed_source: read error on {}: {err}", path.display());
        }
    }
    Ok(slugs)
}
