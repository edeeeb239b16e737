use std::path::PathBuf;

use harvest_core::{run, RunOptions};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn run_options(server: &MockServer, input_dir: PathBuf, out_dir: PathBuf, download: bool) -> RunOptions {
    RunOptions {
        input: input_dir.to_string_lossy().to_string(),
        out_root: out_dir,
        base_profile: format!("{}/profiles", server.uri()),
        base_post: format!("{}/posts", server.uri()),
        workers: 4,
        download_media: download,
    }
}

async fn seed_dir(text: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    tokio::fs::write(dir.path().join("seed.txt"), text).await.unwrap();
    dir
}

fn json_body(v: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(v)
}

/// Scenario A: basic end-to-end resolution from a slug through to both
/// harvest stages, with Stage 3 skipping a post Stage 2 already wrote.
#[tokio::test]
async fn scenario_a_basic_seed_to_user_expansion() {
    let server = MockServer::start().await;
    Mock::given(method("GET")).and(path("/posts/abc123.json"))
        .respond_with(json_body(serde_json::json!({"postIdStr": "77", "userIdStr": "u1"})))
        .mount(&server).await;
    Mock::given(method("GET")).and(path("/profiles/u1.json"))
        .respond_with(json_body(serde_json::json!({"posts": ["77", "88"]})))
        .mount(&server).await;
    Mock::given(method("GET")).and(path("/posts/77.json"))
        .respond_with(json_body(serde_json::json!({"postIdStr": "77", "userIdStr": "u1"})))
        .mount(&server).await;
    Mock::given(method("GET")).and(path("/posts/88.json"))
        .respond_with(json_body(serde_json::json!({"postIdStr": "88", "userIdStr": "u1"})))
        .mount(&server).await;

    let seed = seed_dir("check this out https://vine.co/v/abc123 nice").await;
    let out = tempfile::tempdir().unwrap();

    let summary = run(run_options(&server, seed.path().to_path_buf(), out.path().to_path_buf(), false))
        .await
        .unwrap();

    assert!(out.path().join("profiles/u1.json").exists());
    assert!(out.path().join("posts/u1/77.json").exists());
    assert!(out.path().join("posts/u1/88.json").exists());
    assert!(out.path().join("profiles.json").exists());

    // Stage 2 wrote 77, stage 3 must have skipped it rather than rewriting.
    assert_eq!(summary.posts_written, 2); // 77 (stage 2) + 88 (stage 3)
    assert_eq!(summary.posts_skipped, 1); // 77 skipped by stage 3
}

/// Scenario B: numeric-only id fields resolve to `posts/<userId>/<postId>.json`.
#[tokio::test]
async fn scenario_b_numeric_ids_render_as_integers() {
    let server = MockServer::start().await;
    Mock::given(method("GET")).and(path("/posts/numslug.json"))
        .respond_with(json_body(serde_json::json!({"postId": 42, "userId": 7})))
        .mount(&server).await;
    Mock::given(method("GET")).and(path("/profiles/7.json"))
        .respond_with(json_body(serde_json::json!({"posts": []})))
        .mount(&server).await;

    let seed = seed_dir("vine.co/v/numslug").await;
    let out = tempfile::tempdir().unwrap();

    run(run_options(&server, seed.path().to_path_buf(), out.path().to_path_buf(), false))
        .await
        .unwrap();

    assert!(out.path().join("posts/7/42.json").exists());
}

/// Scenario D: legacy CDN hostnames are rewritten before persistence.
#[tokio::test]
async fn scenario_d_rewrites_legacy_cdn_urls_in_persisted_posts() {
    let server = MockServer::start().await;
    Mock::given(method("GET")).and(path("/posts/clipslug.json"))
        .respond_with(json_body(serde_json::json!({
            "postIdStr": "1", "userIdStr": "u9", "url": "http://v.cdn.vine.co/r/clip.mp4"
        })))
        .mount(&server).await;
    Mock::given(method("GET")).and(path("/profiles/u9.json"))
        .respond_with(json_body(serde_json::json!({"posts": []})))
        .mount(&server).await;

    let seed = seed_dir("vine.co/v/clipslug").await;
    let out = tempfile::tempdir().unwrap();

    run(run_options(&server, seed.path().to_path_buf(), out.path().to_path_buf(), false))
        .await
        .unwrap();

    let content = tokio::fs::read_to_string(out.path().join("posts/u9/1.json")).await.unwrap();
    assert!(content.contains("https://vines.s3.amazonaws.com/r/clip.mp4"));
    assert!(!content.contains("v.cdn.vine.co"));
}

/// Scenario E: two posts referencing the same media URL trigger exactly one
/// download and a single file on disk, when media download is enabled.
#[tokio::test]
async fn scenario_e_media_download_dedups_across_posts() {
    let server = MockServer::start().await;
    Mock::given(method("GET")).and(path("/posts/mediaslug.json"))
        .respond_with(json_body(serde_json::json!({
            "postIdStr": "1", "userIdStr": "um",
            "url": "https://vines.s3.amazonaws.com/r/clip.mp4"
        })))
        .mount(&server).await;
    Mock::given(method("GET")).and(path("/profiles/um.json"))
        .respond_with(json_body(serde_json::json!({"posts": ["1", "2"]})))
        .mount(&server).await;
    Mock::given(method("GET")).and(path("/posts/2.json"))
        .respond_with(json_body(serde_json::json!({
            "postIdStr": "2", "userIdStr": "um",
            "url": "https://vines.s3.amazonaws.com/r/clip.mp4"
        })))
        .mount(&server).await;
    Mock::given(method("GET")).and(path("/r/clip.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"bytes".to_vec()))
        .mount(&server).await;

    let seed = seed_dir("vine.co/v/mediaslug").await;
    let out = tempfile::tempdir().unwrap();

    // um's first post (from the slug) has no media; its second post ("2")
    // references the media url twice over the on-disk record re-scan to
    // exercise global dedup across the user's persisted posts.
    run(run_options(&server, seed.path().to_path_buf(), out.path().to_path_buf(), true))
        .await
        .unwrap();

    assert!(out.path().join("media/r/clip.mp4").exists());
    let requests = server.received_requests().await.unwrap();
    let media_hits = requests.iter().filter(|r| r.url.path() == "/r/clip.mp4").count();
    assert_eq!(media_hits, 1);
}

/// Scenario F: a broken upstream post doesn't abort the run and leaves no
/// file behind for that item, while sibling items still complete.
#[tokio::test]
async fn scenario_f_resilient_to_per_item_http_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET")).and(path("/posts/brokenslug.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server).await;
    Mock::given(method("GET")).and(path("/posts/goodslug.json"))
        .respond_with(json_body(serde_json::json!({"postIdStr": "5", "userIdStr": "ug"})))
        .mount(&server).await;
    Mock::given(method("GET")).and(path("/profiles/ug.json"))
        .respond_with(json_body(serde_json::json!({"posts": []})))
        .mount(&server).await;

    let seed = seed_dir("vine.co/v/brokenslug and vine.co/v/goodslug").await;
    let out = tempfile::tempdir().unwrap();

    let summary = run(run_options(&server, seed.path().to_path_buf(), out.path().to_path_buf(), false))
        .await
        .unwrap();

    assert!(out.path().join("posts/ug/5.json").exists());
    assert!(!out.path().join("posts/broken").exists());
    assert!(summary.item_errors >= 1);
}

/// Re-running the same seed corpus against the same mocked upstream a
/// second time writes no new posts the first run already persisted.
#[tokio::test]
async fn idempotent_rerun_skips_everything_already_on_disk() {
    let server = MockServer::start().await;
    Mock::given(method("GET")).and(path("/posts/rerunslug.json"))
        .respond_with(json_body(serde_json::json!({"postIdStr": "9", "userIdStr": "ur"})))
        .mount(&server).await;
    Mock::given(method("GET")).and(path("/profiles/ur.json"))
        .respond_with(json_body(serde_json::json!({"posts": ["9"]})))
        .mount(&server).await;

    let seed = seed_dir("vine.co/v/rerunslug").await;
    let out = tempfile::tempdir().unwrap();

    let first = run(run_options(&server, seed.path().to_path_buf(), out.path().to_path_buf(), false))
        .await
        .unwrap();
    assert_eq!(first.posts_written, 1);

    let second = run(run_options(&server, seed.path().to_path_buf(), out.path().to_path_buf(), false))
        .await
        .unwrap();
    assert_eq!(second.posts_written, 0);
    assert_eq!(second.posts_skipped, 1);
}
