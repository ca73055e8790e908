//! In-memory asset source and scripted operator for coordinator tests.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use favorites_core::api::{ApiError, AssetMetadata};
use favorites_core::{AssetSource, ChoicePrompt, DownloadError};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::time::Instant;

/// One asset served by [`FakeSource`].
#[derive(Debug, Clone)]
pub struct FakeAsset {
    pub file_name: String,
    pub body: Vec<u8>,
    /// Transfers that fail with a 503 before the body is served.
    pub failures: usize,
    /// Pause between the two halves of the body.
    pub midway_pause: Duration,
}

impl FakeAsset {
    pub fn new(file_name: &str, body: &[u8]) -> Self {
        Self {
            file_name: file_name.to_string(),
            body: body.to_vec(),
            failures: 0,
            midway_pause: Duration::ZERO,
        }
    }

    pub fn failing(mut self, failures: usize) -> Self {
        self.failures = failures;
        self
    }

    pub fn pausing_midway(mut self, pause: Duration) -> Self {
        self.midway_pause = pause;
        self
    }
}

/// Serves assets from memory and records how it was called.
#[derive(Debug, Default)]
pub struct FakeSource {
    assets: HashMap<String, FakeAsset>,
    transfer_delay: Duration,
    metadata_calls: Mutex<HashMap<String, usize>>,
    metadata_entered: Mutex<Vec<(String, Instant)>>,
    transfer_calls: Mutex<HashMap<String, usize>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeSource {
    pub fn new<I>(assets: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, FakeAsset)>,
    {
        Self {
            assets: assets
                .into_iter()
                .map(|(id, asset)| (id.to_string(), asset))
                .collect(),
            ..Self::default()
        }
    }

    pub fn with_transfer_delay(mut self, delay: Duration) -> Self {
        self.transfer_delay = delay;
        self
    }

    pub fn metadata_calls(&self, asset_id: &str) -> usize {
        self.metadata_calls
            .lock()
            .unwrap()
            .get(asset_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn transfer_calls(&self, asset_id: &str) -> usize {
        self.transfer_calls
            .lock()
            .unwrap()
            .get(asset_id)
            .copied()
            .unwrap_or(0)
    }

    /// When each metadata request arrived, in arrival order.
    pub fn metadata_entered(&self) -> Vec<(String, Instant)> {
        self.metadata_entered.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssetSource for FakeSource {
    async fn asset_metadata(&self, asset_id: &str) -> Result<AssetMetadata, ApiError> {
        self.metadata_entered
            .lock()
            .unwrap()
            .push((asset_id.to_string(), Instant::now()));
        *self
            .metadata_calls
            .lock()
            .unwrap()
            .entry(asset_id.to_string())
            .or_default() += 1;
        let url = format!("fake:/api/assets/{asset_id}");
        let asset = self
            .assets
            .get(asset_id)
            .ok_or_else(|| ApiError::http_status(url, 404))?;
        Ok(AssetMetadata {
            id: asset_id.to_string(),
            original_file_name: asset.file_name.clone(),
        })
    }

    async fn stream_original(
        &self,
        asset_id: &str,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64, DownloadError> {
        let call = {
            let mut calls = self.transfer_calls.lock().unwrap();
            let count = calls.entry(asset_id.to_string()).or_default();
            *count += 1;
            *count
        };

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.transfer_delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let url = format!("fake:/api/assets/{asset_id}/original");
        let asset = self
            .assets
            .get(asset_id)
            .ok_or_else(|| ApiError::http_status(url.clone(), 404))?;
        if call <= asset.failures {
            sink.write_all(b"partial")
                .await
                .map_err(|e| DownloadError::transfer(asset_id, e))?;
            return Err(ApiError::http_status(url, 503).into());
        }

        let (head, tail) = asset.body.split_at(asset.body.len() / 2);
        sink.write_all(head)
            .await
            .map_err(|e| DownloadError::transfer(asset_id, e))?;
        if !asset.midway_pause.is_zero() {
            sink.flush()
                .await
                .map_err(|e| DownloadError::transfer(asset_id, e))?;
            tokio::time::sleep(asset.midway_pause).await;
        }
        sink.write_all(tail)
            .await
            .map_err(|e| DownloadError::transfer(asset_id, e))?;
        Ok(asset.body.len() as u64)
    }
}

/// Answers collision prompts from a script and checks they never overlap.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<Option<String>>>,
    asked: Mutex<Vec<String>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl ScriptedPrompt {
    pub fn new<'a, I>(answers: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(|a| Some(a.to_string())).collect()),
            ..Self::default()
        }
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }

    pub fn max_concurrent_prompts(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChoicePrompt for ScriptedPrompt {
    async fn ask(&self, filename: &str) -> Option<String> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        self.asked.lock().unwrap().push(filename.to_string());

        // Give an overlapping prompt the chance to show up.
        tokio::time::sleep(Duration::from_millis(10)).await;

        let answer = self.answers.lock().unwrap().pop_front().flatten();
        self.active.fetch_sub(1, Ordering::SeqCst);
        answer
    }
}

/// True for `YYYYMMDD-HHMMSS-<base>` and `YYYYMMDD-HHMMSS-<n>-<base>`.
pub fn is_keep_both_name(name: &str, base: &str) -> bool {
    let Some(prefix) = name.strip_suffix(base) else {
        return false;
    };
    let bytes = prefix.as_bytes();
    if bytes.len() < 16 {
        return false;
    }
    let stamp_ok = bytes[..8].iter().all(u8::is_ascii_digit)
        && bytes[8] == b'-'
        && bytes[9..15].iter().all(u8::is_ascii_digit)
        && bytes[15] == b'-';
    let rest = &prefix[16..];
    stamp_ok
        && (rest.is_empty()
            || rest
                .strip_suffix('-')
                .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit())))
}

/// Sorted file names in `dir`.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
