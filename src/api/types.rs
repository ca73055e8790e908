//! Response shapes for the parts of the Immich API this tool reads.
//!
//! Only the fields the download flow needs are modelled; serde ignores the
//! rest of each payload.

use serde::Deserialize;

/// One entry of `GET /api/albums`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AlbumSummary {
    pub id: String,
    pub album_name: String,
    #[serde(default)]
    pub asset_count: u64,
}

/// Response of `GET /api/albums/{id}`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AlbumDetail {
    pub id: String,
    pub album_name: String,
    #[serde(default)]
    pub assets: Vec<AlbumAsset>,
}

/// An asset as listed inside an album detail response.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AlbumAsset {
    pub id: String,
    #[serde(default)]
    pub original_file_name: String,
    #[serde(default)]
    pub is_favorite: bool,
}

/// Response of `GET /api/assets/{id}`, reduced to what a download needs.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AssetMetadata {
    pub id: String,
    pub original_file_name: String,
}

impl AlbumDetail {
    /// IDs of the favorite assets, in album order. Duplicates are kept.
    #[must_use]
    pub fn favorite_asset_ids(&self) -> Vec<String> {
        self.assets
            .iter()
            .filter(|asset| asset.is_favorite)
            .map(|asset| asset.id.clone())
            .collect()
    }
}
