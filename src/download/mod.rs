//! Concurrent download core for favorite assets.
//!
//! # Features
//!
//! - Bounded worker pool with staggered task launch
//! - Up to 3 attempts per asset with a fixed 2-second backoff
//! - Interactive keep-both / overwrite / skip on filename collisions, one
//!   prompt at a time
//! - Per-asset outcomes aggregated into a [`RunSummary`]
//!
//! # Layers
//!
//! - [`DownloadCoordinator`] - pool, limiter, aggregation
//! - [`DownloadWorker`] - retry loop and transfer for one asset
//! - [`CollisionResolver`] - prompt lock and path claims
//! - [`AssetSource`] - where metadata and bytes come from

mod collision;
mod constants;
mod engine;
mod error;
mod filename;
mod prompt;
mod retry;
mod source;
mod worker;

pub use collision::{CollisionDecision, CollisionResolver, PathClaim};
pub use constants::{LAUNCH_STAGGER, RETRY_BACKOFF, TRANSFER_TIMEOUT};
pub use engine::{DEFAULT_MAX_CONCURRENT, DownloadCoordinator, DownloadOutcome, EngineError, RunSummary};
pub use error::{AssetFailure, DownloadError};
pub use prompt::{ChoicePrompt, CollisionChoice, StdinPrompt, render_menu};
pub use retry::{DEFAULT_MAX_ATTEMPTS, RetryDecision, RetryPolicy};
pub use source::AssetSource;
pub use worker::{AssetDownload, DownloadWorker};
