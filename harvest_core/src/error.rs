use std::path::PathBuf;

/// Startup-fatal errors. Returned out of `run()` and mapped to a process
/// exit code by the CLI; never recovered from mid-pipeline.
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    #[error("input root {0:?} does not exist or is not a directory")]
    BadInputRoot(PathBuf),

    #[error("no slugs found in seed corpus")]
    EmptySlugSet,

    #[error("no users discovered from seed slugs")]
    EmptyUserSet,

    #[error("missing required environment variable {0}")]
    MissingEnv(&'static str),

    #[error("failed to create output root {0:?}: {1}")]
    CannotCreateOutputRoot(PathBuf, #[source] std::io::Error),

    #[error("invalid seed locator {0:?}")]
    BadSeedLocator(String),

    #[error(transparent)]
    S3(#[from] aws_sdk_s3::Error),
}

/// Per-request failure from the HTTP Fetcher. Always handled and logged at
/// the call site; never bubbles out of a worker.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error("could not decode response body as JSON: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("disk error: {0}")]
    Disk(#[from] std::io::Error),
}
