pub mod atomic_write;
pub mod error;
pub mod http_client;
pub mod ids;
pub mod media;
pub mod pipeline;
pub mod post_id;
pub mod rate_gate;
pub mod rewrite;
pub mod seed;
pub mod slug_scan;

use std::path::PathBuf;
use std::sync::Arc;

use error::HarvestError;
use ids::UserId;
use pipeline::{HarvestConfig, HarvestContext};

/// Default rate gate throughput: ~200 requests/second, as spec.md §4.1.
const DEFAULT_PERMITS_PER_SECOND: u32 = 200;

pub struct RunOptions {
    pub input: String,
    pub out_root: PathBuf,
    pub base_profile: String,
    pub base_post: String,
    pub workers: usize,
    pub download_media: bool,
}

#[derive(Default)]
pub struct RunSummary {
    pub slugs_scanned: usize,
    pub users_discovered: usize,
    pub posts_written: u64,
    pub posts_skipped: u64,
    pub profiles_written: u64,
    pub media_downloaded: u64,
    pub item_errors: u64,
    pub errors_network: u64,
    pub errors_http_status: u64,
    pub errors_decode: u64,
    pub errors_disk: u64,
}

/// Runs the full three-stage pipeline: seed extraction, Slug Harvester,
/// User Harvester. Returns a run summary on success; returns `Err` only for
/// the startup-fatal conditions spec.md §6/§7 enumerate (bad input root,
/// empty slug/user set, missing env, output-root creation failure).
pub async fn run(opts: RunOptions) -> Result<RunSummary, HarvestError> {
    tokio::fs::create_dir_all(&opts.out_root)
        .await
        .map_err(|e| HarvestError::CannotCreateOutputRoot(opts.out_root.clone(), e))?;

    log::info!("scanning seed corpus at {}", opts.input);
    let slugs = seed::collect_seed_slugs(&opts.input).await?;
    if slugs.is_empty() {
        return Err(HarvestError::EmptySlugSet);
    }
    log::info!("found {} distinct slugs", slugs.len());

    let config = HarvestConfig {
        base_profile: opts.base_profile,
        base_post: opts.base_post,
        out_root: opts.out_root,
        workers: opts.workers.max(1),
        download_media: opts.download_media,
    };
    let ctx = Arc::new(HarvestContext::new(config, DEFAULT_PERMITS_PER_SECOND));

    let slugs_scanned = slugs.len();
    pipeline::slug_harvester::run(Arc::clone(&ctx), slugs).await;

    let users: std::collections::HashSet<UserId> = {
        let users = ctx.users.lock().await;
        users.clone()
    };
    if users.is_empty() {
        return Err(HarvestError::EmptyUserSet);
    }
    log::info!("discovered {} distinct users", users.len());
    let users_discovered = users.len();

    pipeline::user_harvester::run(Arc::clone(&ctx), users).await;

    Ok(summarize(&ctx, slugs_scanned, users_discovered))
}

fn summarize(ctx: &HarvestContext, slugs_scanned: usize, users_discovered: usize) -> RunSummary {
    use std::sync::atomic::Ordering;
    RunSummary {
        slugs_scanned,
        users_discovered,
        posts_written: ctx.counters.posts_written.load(Ordering::Relaxed),
        posts_skipped: ctx.counters.posts_skipped.load(Ordering::Relaxed),
        profiles_written: ctx.counters.profiles_written.load(Ordering::Relaxed),
        media_downloaded: ctx.counters.media_downloaded.load(Ordering::Relaxed),
        item_errors: ctx.counters.item_errors.load(Ordering::Relaxed),
        errors_network: ctx.counters.errors_network.load(Ordering::Relaxed),
        errors_http_status: ctx.counters.errors_http_status.load(Ordering::Relaxed),
        errors_decode: ctx.counters.errors_decode.load(Ordering::Relaxed),
        errors_disk: ctx.counters.errors_disk.load(Ordering::Relaxed),
    }
}
