//! The seam between the download core and the remote service.

use async_trait::async_trait;
use tokio::io::AsyncWrite;

use super::DownloadError;
use crate::api::{ApiError, AssetMetadata};

/// Provides asset metadata and original content to download workers.
///
/// [`ImmichClient`](crate::api::ImmichClient) is the production implementation.
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Fetches the metadata (notably the original filename) of one asset.
    async fn asset_metadata(&self, asset_id: &str) -> Result<AssetMetadata, ApiError>;

    /// Streams the original content of one asset into `sink`.
    ///
    /// Returns the number of bytes written. The sink is flushed on success.
    async fn stream_original(
        &self,
        asset_id: &str,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64, DownloadError>;
}
