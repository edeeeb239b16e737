pub mod slug_harvester;
pub mod user_harvester;

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::FetchError;
use crate::http_client::HttpFetcher;
use crate::ids::UserId;
use crate::media::MediaDownloader;
use crate::rate_gate::RateGate;

/// Run-wide configuration, shared across both harvest stages.
pub struct HarvestConfig {
    pub base_profile: String,
    pub base_post: String,
    pub out_root: PathBuf,
    pub workers: usize,
    pub download_media: bool,
}

/// Everything the worker pools share: the HTTP plumbing, the output root,
/// the per-run counters, and (stage 2 only) the deduplicated user set.
pub struct HarvestContext {
    pub config: HarvestConfig,
    pub fetcher: Arc<HttpFetcher>,
    pub media: Arc<MediaDownloader>,
    pub users: Mutex<std::collections::HashSet<UserId>>,
    pub counters: Counters,
}

#[derive(Default)]
pub struct Counters {
    pub posts_written: AtomicU64,
    pub posts_skipped: AtomicU64,
    pub profiles_written: AtomicU64,
    pub media_downloaded: AtomicU64,
    pub item_errors: AtomicU64,
    pub errors_network: AtomicU64,
    pub errors_http_status: AtomicU64,
    pub errors_decode: AtomicU64,
    pub errors_disk: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

impl HarvestContext {
    pub fn new(config: HarvestConfig, rate_gate_permits_per_second: u32) -> Self {
        let rate_gate = Arc::new(RateGate::new(rate_gate_permits_per_second));
        let fetcher = Arc::new(HttpFetcher::new(rate_gate));
        let media_root = crate::media::media_root(&config.out_root);
        let media = Arc::new(MediaDownloader::new(Arc::clone(&fetcher), media_root));
        Self {
            config,
            fetcher,
            media,
            users: Mutex::new(std::collections::HashSet::new()),
            counters: Counters::default(),
        }
    }

    pub fn post_path(&self, user_id: &UserId, post_id: &str) -> PathBuf {
        self.config
            .out_root
            .join("posts")
            .join(&user_id.0)
            .join(format!("{post_id}.json"))
    }

    pub fn profile_path(&self, user_id: &UserId) -> PathBuf {
        self.config.out_root.join("profiles").join(format!("{}.json", user_id.0))
    }
}

impl Counters {
    pub fn note_post_written(&self) {
        Self::bump(&self.posts_written);
    }
    pub fn note_post_skipped(&self) {
        Self::bump(&self.posts_skipped);
    }
    pub fn note_profile_written(&self) {
        Self::bump(&self.profiles_written);
    }
    pub fn note_media_downloaded(&self) {
        Self::bump(&self.media_downloaded);
    }

    /// Bumps the flat total plus the per-class counter for `err`'s variant,
    /// so the run summary can report "errors by class" alongside the total.
    pub fn note_item_error(&self, err: &FetchError) {
        Self::bump(&self.item_errors);
        match err {
            FetchError::Network(_) => Self::bump(&self.errors_network),
            FetchError::HttpStatus(_) => Self::bump(&self.errors_http_status),
            FetchError::Decode(_) => Self::bump(&self.errors_decode),
            FetchError::Disk(_) => Self::bump(&self.errors_disk),
        }
    }
}
