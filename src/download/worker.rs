//! Single-asset download with fixed-backoff retries.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument};

use super::collision::{CollisionResolver, PathClaim};
use super::error::{AssetFailure, DownloadError};
use super::filename::{local_file_name, staging_file_name};
use super::retry::{RetryDecision, RetryPolicy};
use super::source::AssetSource;

/// Result of a finished (downloaded or skipped) asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDownload {
    pub asset_id: String,
    /// Bytes written to disk; zero when skipped.
    pub bytes_written: u64,
    /// Written file, or `None` when the operator chose to skip.
    pub path: Option<PathBuf>,
    /// Attempts used, including the successful one.
    pub attempts: u32,
}

impl AssetDownload {
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        self.path.is_none()
    }
}

enum AttemptResult {
    Written { path: PathBuf, bytes: u64 },
    Skipped,
}

/// State kept across the attempts of one asset.
///
/// Metadata is fetched until one fetch succeeds, and the claimed path is
/// reused, so the operator is asked at most once per asset unless the claim
/// is lost to an outside writer.
#[derive(Default)]
struct AttemptState {
    file_name: Option<String>,
    target: Option<PathClaim>,
}

/// Downloads one asset into a directory, retrying failed attempts.
///
/// Callers are expected to hold a concurrency slot for the whole call.
#[derive(Clone)]
pub struct DownloadWorker {
    source: Arc<dyn AssetSource>,
    resolver: Arc<CollisionResolver>,
    policy: RetryPolicy,
}

impl std::fmt::Debug for DownloadWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadWorker")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl DownloadWorker {
    #[must_use]
    pub fn new(
        source: Arc<dyn AssetSource>,
        resolver: Arc<CollisionResolver>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            source,
            resolver,
            policy,
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Downloads `asset_id` into `dest_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`AssetFailure`] with the last observed error once the retry
    /// policy's attempt budget is spent.
    #[instrument(skip(self, dest_dir), fields(dest_dir = %dest_dir.display()))]
    pub async fn download_one(
        &self,
        asset_id: &str,
        dest_dir: &Path,
    ) -> Result<AssetDownload, AssetFailure> {
        let mut state = AttemptState::default();
        let result = self.attempt_loop(asset_id, dest_dir, &mut state).await;
        if let Some(PathClaim::New(path) | PathClaim::Overwrite(path)) = &state.target {
            self.resolver.release(path).await;
        }
        result
    }

    async fn attempt_loop(
        &self,
        asset_id: &str,
        dest_dir: &Path,
        state: &mut AttemptState,
    ) -> Result<AssetDownload, AssetFailure> {
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            debug!(attempt, "attempting download");

            let error = match self.attempt(asset_id, dest_dir, state).await {
                Ok(AttemptResult::Written { path, bytes }) => {
                    info!(asset_id, path = %path.display(), bytes, "downloaded");
                    return Ok(AssetDownload {
                        asset_id: asset_id.to_string(),
                        bytes_written: bytes,
                        path: Some(path),
                        attempts: attempt,
                    });
                }
                Ok(AttemptResult::Skipped) => {
                    info!(asset_id, file = ?state.file_name, "skipped download");
                    return Ok(AssetDownload {
                        asset_id: asset_id.to_string(),
                        bytes_written: 0,
                        path: None,
                        attempts: attempt,
                    });
                }
                Err(error) => error,
            };

            match self.policy.should_retry(attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next_attempt,
                } => {
                    info!(
                        asset_id,
                        attempt = next_attempt,
                        max_attempts = self.policy.max_attempts(),
                        delay_ms = delay.as_millis(),
                        error = %error,
                        "retrying download"
                    );
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::DoNotRetry { reason } => {
                    debug!(asset_id, %reason, "not retrying download");
                    return Err(AssetFailure {
                        asset_id: asset_id.to_string(),
                        attempts: attempt,
                        last_error: error,
                    });
                }
            }
        }
    }

    async fn attempt(
        &self,
        asset_id: &str,
        dest_dir: &Path,
        state: &mut AttemptState,
    ) -> Result<AttemptResult, DownloadError> {
        let file_name = match &state.file_name {
            Some(name) => name.clone(),
            None => {
                let metadata = self.source.asset_metadata(asset_id).await?;
                let name = local_file_name(&metadata.original_file_name, asset_id);
                state.file_name = Some(name.clone());
                name
            }
        };

        let target = match state.target.clone() {
            Some(target) => target,
            None => {
                let claim = self.resolver.claim(&file_name, dest_dir).await;
                if claim == PathClaim::Skip {
                    return Ok(AttemptResult::Skipped);
                }
                state.target = Some(claim.clone());
                claim
            }
        };

        // Overwrites are staged beside the target and renamed over it, so a
        // failed overwrite never touches the existing file.
        let (path, staging, file) = match target {
            PathClaim::New(path) => match open_new(&path).await {
                Ok(file) => (path, None, file),
                Err(error) => {
                    if matches!(error, DownloadError::PathTaken { .. }) {
                        self.resolver.release(&path).await;
                        state.target = None;
                    }
                    return Err(error);
                }
            },
            PathClaim::Overwrite(path) => {
                let staging = path.with_file_name(staging_file_name(&file_name, asset_id));
                let file = File::create(&staging)
                    .await
                    .map_err(|e| DownloadError::io(staging.clone(), e))?;
                (path, Some(staging), file)
            }
            PathClaim::Skip => return Ok(AttemptResult::Skipped),
        };
        let written = staging.clone().unwrap_or_else(|| path.clone());

        let mut writer = BufWriter::new(file);
        let mut streamed = self.source.stream_original(asset_id, &mut writer).await;
        if streamed.is_ok() {
            if let Err(e) = writer.flush().await {
                streamed = Err(DownloadError::io(written.clone(), e));
            }
        }
        drop(writer);

        if let Some(staging) = &staging {
            if streamed.is_ok() {
                if let Err(e) = tokio::fs::rename(staging, &path).await {
                    streamed = Err(DownloadError::io(path.clone(), e));
                }
            }
        }

        match streamed {
            Ok(bytes) => Ok(AttemptResult::Written { path, bytes }),
            Err(error) => {
                debug!(path = %written.display(), "cleaning up partial file after error");
                let _ = tokio::fs::remove_file(&written).await;
                Err(error)
            }
        }
    }
}

async fn open_new(path: &Path) -> Result<File, DownloadError> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                DownloadError::path_taken(path)
            } else {
                DownloadError::io(path, e)
            }
        })
}
