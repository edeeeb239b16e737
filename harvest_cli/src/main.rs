use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use harvest_core::error::HarvestError;
use harvest_core::RunOptions;
use indicatif::{ProgressBar, ProgressStyle};

/// Archival harvester for a social-video service's public data graph.
#[derive(Parser)]
#[command(name = "vine-harvest", about = "Reconstructs a video-post archive from a seed corpus")]
struct Args {
    /// Local directory, or s3://bucket/prefix, source of seed text.
    #[arg(long, default_value = "vine_tweets")]
    input_dir: String,

    /// Output root.
    #[arg(long, default_value = "vine_archive_harvest")]
    out_dir: PathBuf,

    /// URL stem for profile fetches (no trailing slash).
    #[arg(long, default_value = "https://archive.vine.co/profiles")]
    base_profile: String,

    /// URL stem for post fetches (no trailing slash).
    #[arg(long, default_value = "https://archive.vine.co/posts")]
    base_post: String,

    /// Worker pool size per stage.
    #[arg(long, default_value_t = 128)]
    workers: usize,

    /// Also download referenced media blobs.
    #[arg(long, default_value_t = false)]
    download: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let opts = RunOptions {
        input: args.input_dir,
        out_root: args.out_dir,
        base_profile: args.base_profile,
        base_post: args.base_post,
        workers: args.workers,
        download_media: args.download,
    };

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})").unwrap(),
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(120));
    spinner.set_message("harvesting");

    let result = harvest_core::run(opts).await;
    spinner.finish_and_clear();

    match result {
        Ok(summary) => {
            log::info!(
                "harvest complete: {} slugs scanned, {} users discovered, {} posts written, \
                 {} posts skipped, {} profiles written, {} media downloaded, {} item errors \
                 (network={}, http_status={}, decode={}, disk={})",
                summary.slugs_scanned,
                summary.users_discovered,
                summary.posts_written,
                summary.posts_skipped,
                summary.profiles_written,
                summary.media_downloaded,
                summary.item_errors,
                summary.errors_network,
                summary.errors_http_status,
                summary.errors_decode,
                summary.errors_disk,
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("harvest aborted: {err}");
            ExitCode::from(exit_code_for(&err))
        }
    }
}

fn exit_code_for(err: &HarvestError) -> u8 {
    match err {
        HarvestError::BadInputRoot(_) => 2,
        HarvestError::EmptySlugSet => 3,
        HarvestError::EmptyUserSet => 4,
        HarvestError::MissingEnv(_) => 5,
        HarvestError::CannotCreateOutputRoot(_, _) => 6,
        HarvestError::BadSeedLocator(_) => 7,
        HarvestError::S3(_) => 8,
    }
}
