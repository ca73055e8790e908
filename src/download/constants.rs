//! Constants for the download module (timeouts, pacing, naming).

use std::time::Duration;

/// Timeout for one original-content transfer (60 seconds).
pub const TRANSFER_TIMEOUT: Duration = Duration::from_secs(60);

/// Delay between task launches; task `i` starts after `i * LAUNCH_STAGGER`.
pub const LAUNCH_STAGGER: Duration = Duration::from_millis(100);

/// Fixed wait between failed attempts of the same asset.
pub const RETRY_BACKOFF: Duration = Duration::from_secs(2);

/// Timestamp layout used to prefix keep-both filenames (`YYYYMMDD-HHMMSS`).
pub const KEEP_BOTH_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";
