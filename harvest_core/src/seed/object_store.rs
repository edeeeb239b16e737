use std::collections::HashSet;

use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::Client;

use crate::error::HarvestError;
use crate::slug_scan::scan_slugs;

/// Lists objects under `bucket/prefix` on an R2-compatible endpoint
/// (path-style addressing, region `auto`), paginated, and feeds each
/// non-directory key's body to the Slug Scanner. Per-object fetch failures
/// are logged and skipped; the listing itself is not retried.
pub async fn collect_slugs_from_bucket(locator: &str) -> Result<HashSet<String>, HarvestError> {
    let (bucket, prefix) = split_locator(locator)?;
    let client = build_client().await?;

    let mut slugs = HashSet::new();
    let mut continuation_token: Option<String> = None;

    loop {
        let mut request = client.list_objects_v2().bucket(&bucket).prefix(&prefix);
        if let Some(token) = continuation_token.clone() {
            request = request.continuation_token(token);
        }
        let page = request.send().await.map_err(|e| HarvestError::S3(e.into()))?;

        for object in page.contents() {
            let Some(key) = object.key() else { continue };
            if key.ends_with('/') {
                continue; // directory marker, not a seed file
            }
            match client.get_object().bucket(&bucket).key(key).send().await {
                Ok(response) => {
                    let reader = response.body.into_async_read();
                    if let Err(err) = scan_slugs(reader, &mut slugs).await {
                        log::warn!("seed_source: read error on s3://{bucket}/{key}: {err}");
                    }
                }
                Err(err) => {
                    log::warn!("seed_source: fetch failed for s3://{bucket}/{key}: {err}");
                }
            }
        }

        continuation_token = page.next_continuation_token().map(str::to_string);
        if continuation_token.is_none() {
            break;
        }
    }

    Ok(slugs)
}

fn split_locator(locator: &str) -> Result<(String, String), HarvestError> {
    let mut parts = locator.splitn(2, '/');
    let bucket = parts.next().filter(|s| !s.is_empty());
    let prefix = parts.next().unwrap_or("").to_string();
    match bucket {
        Some(bucket) => Ok((bucket.to_string(), prefix)),
        None => Err(HarvestError::BadSeedLocator(format!("s3://{locator}"))),
    }
}

async fn build_client() -> Result<Client, HarvestError> {
    let endpoint = std::env::var("R2_ENDPOINT").map_err(|_| HarvestError::MissingEnv("R2_ENDPOINT"))?;
    let access_key =
        std::env::var("R2_ACCESS_KEY_ID").map_err(|_| HarvestError::MissingEnv("R2_ACCESS_KEY_ID"))?;
    let secret_key = std::env::var("R2_SECRET_ACCESS_KEY")
        .map_err(|_| HarvestError::MissingEnv("R2_SECRET_ACCESS_KEY"))?;

    let credentials = Credentials::new(access_key, secret_key, None, None, "vine-harvest-env");
    let config = aws_sdk_s3::Config::builder()
        .region(Region::new("auto"))
        .endpoint_url(endpoint)
        .credentials_provider(credentials)
        .force_path_style(true)
        .behavior_version(aws_config::BehaviorVersion::latest())
        .build();

    Ok(Client::from_conf(config))
}
