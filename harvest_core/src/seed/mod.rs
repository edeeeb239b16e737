mod local;
mod object_store;

use std::collections::HashSet;

use crate::error::HarvestError;

/// Dispatches on the input locator's scheme: `s3://bucket/prefix` for an
/// S3/R2-compatible object store, anything else for a local directory walk.
/// Returns the deduplicated slug set; an empty result is the caller's
/// responsibility to treat as fatal (spec.md §6 exit codes).
pub async fn collect_seed_slugs(input: &str) -> Result<HashSet<String>, HarvestError> {
    if let Some(rest) = input.strip_prefix("s3://") {
        object_store::collect_slugs_from_bucket(rest).await
    } else {
        local::collect_slugs_from_directory(input).await
    }
}
