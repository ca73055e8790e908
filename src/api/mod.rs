//! Immich server access: album listing, album detail, asset metadata, and
//! original-content download.
//!
//! Every request carries the `x-api-key` header. JSON endpoints are decoded
//! into reduced response shapes; the original-content endpoint is
//! streamed through the [`AssetSource`](crate::download::AssetSource) impl.

mod client;
mod error;
mod types;

pub use client::{API_KEY_HEADER, ImmichClient};
pub use error::ApiError;
pub use types::{AlbumAsset, AlbumDetail, AlbumSummary, AssetMetadata};
