use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::atomic_write::write_json;
use crate::ids::{Slug, UserId};
use crate::pipeline::HarvestContext;
use crate::rewrite::rewrite_urls;

/// Fan-out of `ctx.config.workers` workers draining a bounded slug channel.
/// Per slug: fetch `<basePost>/<slug>.json`, rewrite URLs, extract the
/// owning user and real post id, record the user into the shared set, and
/// persist the post if it isn't already on disk. Failures are logged and
/// the slug is skipped — a worker never aborts on a per-item error.
///
/// After every worker drains, writes `<outRoot>/profiles.json` with the
/// deduplicated user set; a failure there is downgraded to a warning.
pub async fn run(ctx: Arc<HarvestContext>, slugs: HashSet<String>) {
    let (tx, rx) = mpsc::channel::<Slug>(ctx.config.workers * 2);

    let producer = tokio::spawn(async move {
        for slug in slugs {
            if tx.send(Slug(slug)).await.is_err() {
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
                let slug = {
                    let mut rx = rx.lock().await;
                    rx.recv().await
                };
                let Some(slug) = slug else { break };
                process_slug(&ctx, worker_id, &slug).await;
            }
        }));
    }

    let _ = producer.await;
    for handle in handles {
        let _ = handle.await;
    }

    write_profiles_list(&ctx).await;
}

async fn process_slug(ctx: &HarvestContext, worker_id: usize, slug: &Slug) {
    let url = format!(
        "{}/{}.json",
        ctx.config.base_post,
        urlencoding_escape(&slug.0)
    );

    let record = match ctx.fetcher.fetch_json(&url).await {
        Ok(record) => record,
        Err(err) => {
            log::warn!("worker[{worker_id}] slug={}: fetch failed: {err}", slug.0);
            ctx.counters.note_item_error(&err);
            return;
        }
    };

    let record = rewrite_urls(record);

    let Some(user_id) = crate::ids::extract_user_id(&record) else {
        log::debug!("worker[{worker_id}] slug={}: no userId present, skipping", slug.0);
        return;
    };

    let real_post_id = crate::ids::extract_post_id(&record)
        .map(|p| p.0)
        .unwrap_or_else(|| slug.0.clone());

    {
        let mut users = ctx.users.lock().await;
        users.insert(user_id.clone());
    }

    let post_path = ctx.post_path(&user_id, &real_post_id);
    if post_path.exists() {
        ctx.counters.note_post_skipped();
        return;
    }

    match write_json(&post_path, &record).await {
        Ok(()) => ctx.counters.note_post_written(),
        Err(err) => {
            log::warn!(
                "worker[{worker_id}] slug={}: failed writing post {post_path:?}: {err}",
                slug.0
            );
            ctx.counters.note_item_error(&err);
        }
    }
}

async fn write_profiles_list(ctx: &HarvestContext) {
    let users: Vec<String> = {
        let users = ctx.users.lock().await;
        let mut ids: Vec<UserId> = users.iter().cloned().collect();
        ids.sort();
        ids.into_iter().map(|u| u.0).collect()
    };
    let path = ctx.config.out_root.join("profiles.json");
    if let Err(err) = write_json(&path, &users).await {
        log::warn!("failed to write profiles.json: {err} (harvest continues)");
    }
}

fn urlencoding_escape(slug: &str) -> String {
    let mut escaped = String::with_capacity(slug.len());
    for byte in slug.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                escaped.push(byte as char)
            }
            _ => escaped.push_str(&format!("%{byte:02X}")),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_non_alphanumeric_bytes() {
        assert_eq!(urlencoding_escape("abc123"), "abc123");
        assert_eq!(urlencoding_escape("a b"), "a%20b");
    }
}
