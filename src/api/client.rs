//! HTTP client for the Immich REST API.
//!
//! This module provides the `ImmichClient` struct which authenticates every
//! request with the server API key, decodes the JSON endpoints, and streams
//! asset originals to disk.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, instrument};

use super::error::ApiError;
use super::types::{AlbumDetail, AlbumSummary, AssetMetadata};
use crate::config::ApiConfig;
use crate::download::{AssetSource, DownloadError, TRANSFER_TIMEOUT};

/// Header carrying the Immich API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Connect timeout for all requests (30 seconds).
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Immich API client.
///
/// The client is cheap to clone and reuses its connection pool, so one
/// instance is shared by every download task.
///
/// # Example
///
/// ```no_run
/// use favorites_core::api::ImmichClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ImmichClient::new("https://photos.example.com", "secret")?;
/// for album in client.list_albums().await? {
///     println!("{}", album.album_name);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ImmichClient {
    client: Client,
    base_url: String,
    api_key: String,
    transfer_timeout: Duration,
}

impl ImmichClient {
    /// Creates a client for the server at `base_url`.
    ///
    /// The URL is not validated here; a missing or malformed base URL shows up
    /// as a failed request.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ClientBuild`] if the underlying HTTP client cannot
    /// be constructed.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(ApiError::ClientBuild)?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            transfer_timeout: TRANSFER_TIMEOUT,
        })
    }

    /// Creates a client from loaded configuration.
    ///
    /// # Errors
    ///
    /// See [`ImmichClient::new`].
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        Self::new(config.base_url.clone(), config.api_key.clone())
    }

    /// Overrides the timeout applied to original-content transfers.
    #[must_use]
    pub fn with_transfer_timeout(mut self, timeout: Duration) -> Self {
        self.transfer_timeout = timeout;
        self
    }

    /// Lists all albums visible to the API key.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on network failure, non-200 status, or an
    /// undecodable body.
    #[instrument(skip(self))]
    pub async fn list_albums(&self) -> Result<Vec<AlbumSummary>, ApiError> {
        let url = format!("{}/api/albums", self.base_url);
        self.get_json(&url).await
    }

    /// Fetches one album including its assets.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::IdMismatch`] if the server answers for another album,
    /// and the same errors as [`ImmichClient::list_albums`] otherwise.
    #[instrument(skip(self))]
    pub async fn album_detail(&self, album_id: &str) -> Result<AlbumDetail, ApiError> {
        let url = format!(
            "{}/api/albums/{}",
            self.base_url,
            urlencoding::encode(album_id)
        );
        let album: AlbumDetail = self.get_json(&url).await?;
        if album.id != album_id {
            return Err(ApiError::id_mismatch(album_id, album.id));
        }
        debug!(assets = album.assets.len(), "album detail loaded");
        Ok(album)
    }

    /// Fetches the metadata of one asset.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::IdMismatch`] if the server answers for another asset,
    /// and the same errors as [`ImmichClient::list_albums`] otherwise.
    #[instrument(skip(self))]
    pub async fn asset_info(&self, asset_id: &str) -> Result<AssetMetadata, ApiError> {
        let url = format!(
            "{}/api/assets/{}",
            self.base_url,
            urlencoding::encode(asset_id)
        );
        let asset: AssetMetadata = self.get_json(&url).await?;
        if asset.id != asset_id {
            return Err(ApiError::id_mismatch(asset_id, asset.id));
        }
        Ok(asset)
    }

    async fn send(
        &self,
        url: &str,
        accept: &str,
        timeout: Option<Duration>,
    ) -> Result<reqwest::Response, ApiError> {
        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, accept)
            .header(API_KEY_HEADER, &self.api_key);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(url, e))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(ApiError::http_status(url, status.as_u16()));
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let response = self.send(url, "application/json", None).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::from_reqwest(url, e))?;
        serde_json::from_slice(&body).map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl AssetSource for ImmichClient {
    async fn asset_metadata(&self, asset_id: &str) -> Result<AssetMetadata, ApiError> {
        self.asset_info(asset_id).await
    }

    #[instrument(skip(self, sink))]
    async fn stream_original(
        &self,
        asset_id: &str,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64, DownloadError> {
        let url = format!(
            "{}/api/assets/{}/original",
            self.base_url,
            urlencoding::encode(asset_id)
        );
        let response = self
            .send(&url, "application/octet-stream", Some(self.transfer_timeout))
            .await?;

        let mut stream = response.bytes_stream();
        let mut bytes_written: u64 = 0;

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(|e| ApiError::from_reqwest(url.as_str(), e))?;
            sink.write_all(&chunk)
                .await
                .map_err(|e| DownloadError::transfer(asset_id, e))?;
            bytes_written += chunk.len() as u64;
        }

        sink.flush()
            .await
            .map_err(|e| DownloadError::transfer(asset_id, e))?;

        debug!(bytes = bytes_written, "original streamed");
        Ok(bytes_written)
    }
}
