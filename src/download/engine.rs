//! Download coordinator for concurrent asset downloads.
//!
//! [`DownloadCoordinator`] runs one Tokio task per asset ID. Launches are
//! staggered (`index * launch_stagger`) so the server is not hit by a burst,
//! and a semaphore admits at most `max_concurrent` tasks into the
//! fetch-and-transfer section at once. The two mechanisms are independent:
//! the stagger only delays when a task starts waiting for a slot.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use favorites_core::api::ImmichClient;
//! use favorites_core::download::{CollisionResolver, DownloadCoordinator, StdinPrompt};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(ImmichClient::new("https://photos.example.com", "secret")?);
//! let resolver = Arc::new(CollisionResolver::new(Arc::new(StdinPrompt::new())));
//! let coordinator = DownloadCoordinator::new(3, client, resolver)?;
//! let ids = vec!["asset-1".to_string(), "asset-2".to_string()];
//! let summary = coordinator.run(&ids, Path::new("./favorites")).await?;
//! println!("{} downloaded, {} failed", summary.success_count, summary.failed());
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use indicatif::ProgressBar;
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, info, instrument, warn};

use super::collision::CollisionResolver;
use super::constants::LAUNCH_STAGGER;
use super::error::{AssetFailure, DownloadError};
use super::retry::RetryPolicy;
use super::source::AssetSource;
use super::worker::{AssetDownload, DownloadWorker};

/// Minimum allowed concurrency value.
const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
const MAX_CONCURRENCY: usize = 100;

/// Default number of simultaneous downloads.
pub const DEFAULT_MAX_CONCURRENT: usize = 3;

/// Error type for coordinator operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// The destination is not an existing directory.
    #[error("destination {path} is not an existing directory")]
    MissingDestination {
        /// The rejected destination.
        path: PathBuf,
    },

    /// Semaphore was closed unexpectedly.
    #[error("semaphore closed unexpectedly")]
    SemaphoreClosed,

    /// Some assets could not be downloaded.
    #[error("{failed} of {total} downloads failed")]
    PartialFailure {
        /// Number of failed assets.
        failed: usize,
        /// Number of requested assets.
        total: usize,
    },
}

/// Final result for one requested asset.
#[derive(Debug)]
pub enum DownloadOutcome {
    /// Downloaded, or skipped by the operator (zero bytes, no path).
    Success(AssetDownload),
    /// All attempts failed.
    Failure(AssetFailure),
}

/// Aggregated result of a [`DownloadCoordinator::run`].
///
/// `success_count + failures.len() == total` once the run has returned.
/// Failures are listed in completion order.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub total: usize,
    /// Successful assets, skipped ones included.
    pub success_count: usize,
    /// Successful assets the operator chose to skip.
    pub skipped_count: usize,
    pub bytes_written: u64,
    /// Extra attempts spent across all assets.
    pub retried: u64,
    pub failures: Vec<AssetFailure>,
}

impl RunSummary {
    fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Number of failed assets.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Succeeds only when every asset succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PartialFailure`] when any asset failed; the
    /// per-asset detail stays in [`RunSummary::failures`].
    pub fn ensure_complete(&self) -> Result<(), EngineError> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(EngineError::PartialFailure {
                failed: self.failures.len(),
                total: self.total,
            })
        }
    }

    /// Adds one outcome; returns the success count after recording it.
    fn record(&mut self, outcome: DownloadOutcome) -> usize {
        match outcome {
            DownloadOutcome::Success(download) => {
                self.success_count += 1;
                self.bytes_written += download.bytes_written;
                self.retried += u64::from(download.attempts.saturating_sub(1));
                if download.is_skipped() {
                    self.skipped_count += 1;
                }
            }
            DownloadOutcome::Failure(failure) => {
                self.retried += u64::from(failure.attempts.saturating_sub(1));
                self.failures.push(failure);
            }
        }
        self.success_count
    }
}

/// Bounded worker pool for favorite-asset downloads.
///
/// # Concurrency Model
///
/// - Each asset ID runs in its own Tokio task
/// - Task `i` sleeps `i * launch_stagger` before asking for a slot
/// - A semaphore permit is held only while the worker runs (RAII)
/// - Outcomes are recorded under a lock after the permit is released
/// - One asset's failure never cancels the others
pub struct DownloadCoordinator {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    worker: DownloadWorker,
    launch_stagger: Duration,
    progress: ProgressBar,
}

impl std::fmt::Debug for DownloadCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadCoordinator")
            .field("max_concurrent", &self.max_concurrent)
            .field("launch_stagger", &self.launch_stagger)
            .field("worker", &self.worker)
            .finish_non_exhaustive()
    }
}

impl DownloadCoordinator {
    /// Creates a coordinator admitting `max_concurrent` downloads at a time.
    ///
    /// The resolver (and with it the prompt lock) is shared by every worker
    /// of this coordinator.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConcurrency`] if the value is outside
    /// the valid range (1-100).
    #[instrument(level = "debug", skip(source, resolver))]
    pub fn new(
        max_concurrent: usize,
        source: Arc<dyn AssetSource>,
        resolver: Arc<CollisionResolver>,
    ) -> Result<Self, EngineError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&max_concurrent) {
            return Err(EngineError::InvalidConcurrency {
                value: max_concurrent,
            });
        }

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            worker: DownloadWorker::new(source, resolver, RetryPolicy::default()),
            launch_stagger: LAUNCH_STAGGER,
            progress: ProgressBar::hidden(),
        })
    }

    /// Replaces the retry policy (default: 3 attempts, 2 s apart).
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.worker = self.worker.with_policy(policy);
        self
    }

    /// Replaces the per-index launch delay (default: 100 ms).
    #[must_use]
    pub fn with_launch_stagger(mut self, stagger: Duration) -> Self {
        self.launch_stagger = stagger;
        self
    }

    /// Reports successes on `progress` in addition to tracing events.
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Returns the configured concurrency limit.
    #[must_use]
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Returns the configured retry policy.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        self.worker.retry_policy()
    }

    /// Downloads every asset in `asset_ids` into `dest_dir`.
    ///
    /// Returns once each ID has produced exactly one outcome. Individual
    /// download failures do NOT make this method fail; they are collected in
    /// [`RunSummary::failures`].
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::MissingDestination`] if `dest_dir` is not an
    /// existing directory, and [`EngineError::SemaphoreClosed`] if the limiter
    /// was closed.
    #[instrument(skip(self, asset_ids), fields(dest_dir = %dest_dir.display(), total = asset_ids.len()))]
    pub async fn run(
        &self,
        asset_ids: &[String],
        dest_dir: &Path,
    ) -> Result<RunSummary, EngineError> {
        let is_dir = tokio::fs::metadata(dest_dir)
            .await
            .is_ok_and(|meta| meta.is_dir());
        if !is_dir {
            return Err(EngineError::MissingDestination {
                path: dest_dir.to_path_buf(),
            });
        }

        let total = asset_ids.len();
        info!(total, "starting download of {total} assets");
        self.progress.set_length(total as u64);

        let summary = Arc::new(Mutex::new(RunSummary::new(total)));
        let mut handles = Vec::with_capacity(total);

        for (index, asset_id) in asset_ids.iter().enumerate() {
            let delay = self
                .launch_stagger
                .saturating_mul(u32::try_from(index).unwrap_or(u32::MAX));
            let semaphore = Arc::clone(&self.semaphore);
            let worker = self.worker.clone();
            let summary = Arc::clone(&summary);
            let progress = self.progress.clone();
            let dest_dir = dest_dir.to_path_buf();
            let id = asset_id.clone();

            let handle = tokio::spawn(async move {
                tokio::time::sleep(delay).await;

                let result = {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|_| EngineError::SemaphoreClosed)?;
                    worker.download_one(&id, &dest_dir).await
                };

                let outcome = match result {
                    Ok(download) => DownloadOutcome::Success(download),
                    Err(failure) => {
                        warn!(
                            asset_id = %failure.asset_id,
                            attempts = failure.attempts,
                            error = %failure.last_error,
                            "download failed after all attempts"
                        );
                        DownloadOutcome::Failure(failure)
                    }
                };
                record_outcome(&summary, &progress, outcome, total).await;
                Ok::<(), EngineError>(())
            });
            handles.push((asset_id.clone(), handle));
        }

        debug!(task_count = handles.len(), "waiting for downloads to complete");

        let mut engine_error = None;
        for (asset_id, handle) in handles {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(error)) => engine_error = Some(error),
                Err(join_error) => {
                    warn!(asset_id = %asset_id, error = %join_error, "download task panicked");
                    let failure = AssetFailure {
                        asset_id,
                        attempts: 0,
                        last_error: DownloadError::TaskFailed(join_error.to_string()),
                    };
                    record_outcome(&summary, &self.progress, DownloadOutcome::Failure(failure), total)
                        .await;
                }
            }
        }
        if let Some(error) = engine_error {
            return Err(error);
        }

        let summary = std::mem::take(&mut *summary.lock().await);
        debug_assert_eq!(summary.success_count + summary.failed(), summary.total);

        self.progress.finish_and_clear();
        info!(
            successful = summary.success_count,
            failed = summary.failed(),
            skipped = summary.skipped_count,
            retried = summary.retried,
            bytes = summary.bytes_written,
            "download complete"
        );

        Ok(summary)
    }
}

async fn record_outcome(
    summary: &Mutex<RunSummary>,
    progress: &ProgressBar,
    outcome: DownloadOutcome,
    total: usize,
) {
    let succeeded = matches!(outcome, DownloadOutcome::Success(_));
    let mut summary = summary.lock().await;
    let completed = summary.record(outcome);
    if succeeded {
        progress.set_position(completed as u64);
        info!(completed, total, "Progress: {completed}/{total} assets downloaded");
    }
}
