use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::atomic_write::write_json;
use crate::ids::UserId;
use crate::media::collect_media_urls;
use crate::pipeline::HarvestContext;
use crate::post_id::extract_post_ids;
use crate::rewrite::rewrite_urls;

/// Fan-out of `ctx.config.workers` workers draining a bounded user-id
/// channel. Per user: ensure the profile is cached on disk, reload it from
/// disk (so enumeration sees exactly the bytes a future run would),
/// enumerate post ids, fetch and persist every missing post, and — when
/// media download is enabled — fetch every referenced media URL. Per-post
/// failures never abort the user; per-user failures never abort the stage.
pub async fn run(ctx: Arc<HarvestContext>, users: HashSet<UserId>) {
    let (tx, rx) = mpsc::channel::<UserId>(ctx.config.workers * 2);

    let producer = tokio::spawn(async move {
        for user in users {
            if tx.send(user).await.is_err() {
                break;
            }
        }
    });

    let rx = Arc::new(tokio::sync::Mutex::new(rx));
    let mut handles = Vec::with_capacity(ctx.config.workers);
    for worker_id in 0..ctx.config.workers {
        let ctx = Arc::clone(&ctx);
        let rx = Arc::clone(&rx);
        handles.push(tokio::spawn(async move {
            loop {
                let user_id = {
                    let mut rx = rx.lock().await;
                    rx.recv().await
                };
                let Some(user_id) = user_id else { break };
                process_user(&ctx, worker_id, &user_id).await;
            }
        }));
    }

    let _ = producer.await;
    for handle in handles {
        let _ = handle.await;
    }
}

async fn process_user(ctx: &HarvestContext, worker_id: usize, user_id: &UserId) {
    if let Err(err) = ensure_profile_cached(ctx, user_id).await {
        log::warn!("worker[{worker_id}] user={user_id}: profile fetch failed: {err}");
        ctx.counters.note_item_error(&err);
        return;
    }

    let profile = match reload_profile(ctx, user_id).await {
        Ok(profile) => profile,
        Err(err) => {
            log::warn!("worker[{worker_id}] user={user_id}: could not reload cached profile: {err}");
            ctx.counters.note_item_error(&err);
            return;
        }
    };

    let post_ids = extract_post_ids(&profile);
    if post_ids.is_empty() {
        log::debug!("worker[{worker_id}] user={user_id}: profile yielded no post ids");
        return;
    }

    for post_id in &post_ids {
        fetch_and_persist_post(ctx, worker_id, user_id, &post_id.0).await;
    }

    if ctx.config.download_media {
        download_user_media(ctx, worker_id, user_id).await;
    }
}

async fn ensure_profile_cached(ctx: &HarvestContext, user_id: &UserId) -> Result<(), crate::error::FetchError> {
    let path = ctx.profile_path(user_id);
    if path.exists() {
        return Ok(());
    }
    let url = format!("{}/{}.json", ctx.config.base_profile, user_id.0);
    let profile = ctx.fetcher.fetch_json(&url).await?;
    let profile = rewrite_urls(profile);
    write_json(&path, &profile).await?;
    ctx.counters.note_profile_written();
    Ok(())
}

async fn reload_profile(ctx: &HarvestContext, user_id: &UserId) -> Result<serde_json::Value, crate::error::FetchError> {
    let path = ctx.profile_path(user_id);
    let bytes = tokio::fs::read(&path).await?;
    serde_json::from_slice(&bytes).map_err(crate::error::FetchError::Decode)
}

async fn fetch_and_persist_post(ctx: &HarvestContext, worker_id: usize, user_id: &UserId, post_id: &str) {
    let url = format!("{}/{}.json", ctx.config.base_post, post_id);
    let record = match ctx.fetcher.fetch_json(&url).await {
        Ok(record) => record,
        Err(err) => {
            log::warn!("worker[{worker_id}] user={user_id} post={post_id}: fetch failed: {err}");
            ctx.counters.note_item_error(&err);
            return;
        }
    };

    let real_post_id = crate::ids::extract_post_id(&record)
        .map(|p| p.0)
        .unwrap_or_else(|| post_id.to_string());

    let path = ctx.post_path(user_id, &real_post_id);
    if path.exists() {
        ctx.counters.note_post_skipped();
        return;
    }

    let record = rewrite_urls(record);
    match write_json(&path, &record).await {
        Ok(()) => ctx.counters.note_post_written(),
        Err(err) => {
            log::warn!("worker[{worker_id}] user={user_id} post={post_id}: write failed: {err}");
            ctx.counters.note_item_error(&err);
        }
    }
}

async fn download_user_media(ctx: &HarvestContext, worker_id: usize, user_id: &UserId) {
    let user_posts_dir = ctx.config.out_root.join("posts").join(&user_id.0);
    let mut entries = match tokio::fs::read_dir(&user_posts_dir).await {
        Ok(entries) => entries,
        Err(_) => return, // nothing was ever written for this user
    };

    while let Ok(Some(entry)) = entries.next_entry().await {
        let Ok(bytes) = tokio::fs::read(entry.path()).await else { continue };
        let Ok(record) = serde_json::from_slice::<serde_json::Value>(&bytes) else { continue };
        for url in collect_media_urls(&record) {
            if let Err(err) = ctx.media.download(&url).await {
                log::warn!("worker[{worker_id}] user={user_id}: media download failed for {url}: {err}");
                ctx.counters.note_item_error(&err);
            } else {
                ctx.counters.note_media_downloaded();
            }
        }
    }
}
