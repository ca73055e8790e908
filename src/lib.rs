//! Immich Favorites Core Library
//!
//! Downloads the favorite assets of an Immich album into a local directory.
//!
//! # Architecture
//!
//! - [`api`] - Immich REST client and response types
//! - [`album`] - album listing and operator selection
//! - [`config`] - `.env` and environment configuration
//! - [`download`] - bounded concurrent download engine with retries and
//!   interactive collision handling

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod album;
pub mod api;
pub mod config;
pub mod download;

// Re-export commonly used types
pub use album::{SelectionError, render_album_list, select_album};
pub use api::{AlbumDetail, AlbumSummary, ApiError, AssetMetadata, ImmichClient};
pub use config::{ApiConfig, ConfigError, load_dotenv};
pub use download::{
    AssetFailure, AssetSource, ChoicePrompt, CollisionChoice, CollisionDecision,
    CollisionResolver, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_CONCURRENT, DownloadCoordinator,
    DownloadError, DownloadOutcome, EngineError, PathClaim, RetryPolicy, RunSummary, StdinPrompt,
};
