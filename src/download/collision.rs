//! Collision resolution for download targets.
//!
//! A [`CollisionResolver`] owns one lock shared by every worker of a run. The
//! lock covers both the operator prompt and the set of paths already claimed
//! by in-flight downloads, so:
//!
//! - at most one collision prompt is visible at a time, and
//! - two assets that map to the same filename cannot both see "no collision";
//!   the second one is routed through the prompt.
//!
//! A claim is held until its worker finishes. Overwriting a path another
//! worker still holds waits for that release, so one file never has two
//! writers.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{Mutex, Notify};
use tracing::{debug, info, instrument};

use super::constants::KEEP_BOTH_TIMESTAMP_FORMAT;
use super::filename::keep_both_filename;
use super::prompt::{ChoicePrompt, CollisionChoice};

/// What to do with an asset whose target file already exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollisionDecision {
    /// Write to a new timestamp-prefixed path next to the existing file.
    KeepBoth(PathBuf),
    /// Replace the existing file.
    Overwrite(PathBuf),
    /// Leave the existing file alone and do not download.
    Skip,
}

/// Where a worker may write, as granted by [`CollisionResolver::claim`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathClaim {
    /// A path nobody else holds; create it exclusively.
    New(PathBuf),
    /// An existing path the operator chose to replace.
    Overwrite(PathBuf),
    /// The operator chose not to download.
    Skip,
}

/// Serializes collision prompts and path claims across concurrent workers.
pub struct CollisionResolver {
    prompt: Arc<dyn ChoicePrompt>,
    claimed: Mutex<HashSet<PathBuf>>,
    released: Notify,
}

impl std::fmt::Debug for CollisionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollisionResolver").finish_non_exhaustive()
    }
}

impl CollisionResolver {
    #[must_use]
    pub fn new(prompt: Arc<dyn ChoicePrompt>) -> Self {
        Self {
            prompt,
            claimed: Mutex::new(HashSet::new()),
            released: Notify::new(),
        }
    }

    /// Asks the operator about an existing `dest_dir/filename`.
    ///
    /// Only one call (across all workers sharing this resolver) prompts at a
    /// time. The keep-both path uses the wall-clock time of the decision.
    #[instrument(skip(self, dest_dir), fields(dest_dir = %dest_dir.display()))]
    pub async fn resolve(&self, filename: &str, dest_dir: &Path) -> CollisionDecision {
        let claimed = self.claimed.lock().await;
        self.decide(&claimed, filename, dest_dir).await
    }

    /// Claims a write target for `filename` in `dest_dir`.
    ///
    /// If the plain path is neither on disk nor claimed by another worker it
    /// is granted without prompting. Otherwise the operator decides, and the
    /// resulting path (if any) is claimed before the lock is released.
    #[instrument(skip(self, dest_dir), fields(dest_dir = %dest_dir.display()))]
    pub async fn claim(&self, filename: &str, dest_dir: &Path) -> PathClaim {
        let mut claimed = self.claimed.lock().await;
        let candidate = dest_dir.join(filename);

        if !claimed.contains(&candidate) && !path_exists(&candidate).await {
            claimed.insert(candidate.clone());
            debug!(path = %candidate.display(), "claimed free path");
            return PathClaim::New(candidate);
        }

        match self.decide(&claimed, filename, dest_dir).await {
            CollisionDecision::KeepBoth(path) => {
                claimed.insert(path.clone());
                PathClaim::New(path)
            }
            CollisionDecision::Overwrite(path) => {
                if !claimed.insert(path.clone()) {
                    drop(claimed);
                    debug!(path = %path.display(), "waiting for in-flight writer before overwrite");
                    self.acquire(&path).await;
                }
                PathClaim::Overwrite(path)
            }
            CollisionDecision::Skip => PathClaim::Skip,
        }
    }

    /// Drops a claim so the path can be handed out again.
    pub async fn release(&self, path: &Path) {
        if self.claimed.lock().await.remove(path) {
            self.released.notify_waiters();
        }
    }

    /// Claims `path` once no other worker holds it. Does not prompt.
    async fn acquire(&self, path: &Path) {
        loop {
            let released = self.released.notified();
            tokio::pin!(released);
            released.as_mut().enable();

            if self.claimed.lock().await.insert(path.to_path_buf()) {
                return;
            }
            released.await;
        }
    }

    /// Prompts and builds the decision. Caller holds the lock.
    async fn decide(
        &self,
        claimed: &HashSet<PathBuf>,
        filename: &str,
        dest_dir: &Path,
    ) -> CollisionDecision {
        let answer = self.prompt.ask(filename).await;
        let decision = match CollisionChoice::from_answer(answer.as_deref()) {
            CollisionChoice::KeepBoth => {
                let timestamp = chrono::Local::now()
                    .format(KEEP_BOTH_TIMESTAMP_FORMAT)
                    .to_string();
                CollisionDecision::KeepBoth(
                    keep_both_path(claimed, dest_dir, &timestamp, filename).await,
                )
            }
            CollisionChoice::Overwrite => CollisionDecision::Overwrite(dest_dir.join(filename)),
            CollisionChoice::Skip => CollisionDecision::Skip,
        };
        info!(filename, ?decision, "collision resolved");
        decision
    }
}

async fn keep_both_path(
    claimed: &HashSet<PathBuf>,
    dest_dir: &Path,
    timestamp: &str,
    filename: &str,
) -> PathBuf {
    let mut n = 1;
    loop {
        let path = dest_dir.join(keep_both_filename(timestamp, filename, n));
        if !claimed.contains(&path) && !path_exists(&path).await {
            return path;
        }
        n += 1;
    }
}

// An unreadable path counts as existing so it goes through the prompt.
async fn path_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(true)
}
