//! Local filename derivation for downloaded assets.

use std::path::{Component, Path};

/// Turns a server-provided original filename into a safe single path segment.
///
/// Falls back to `<asset_id>.bin` when nothing usable remains.
pub(crate) fn local_file_name(original: &str, asset_id: &str) -> String {
    let sanitized = sanitize_filename(original);
    if sanitized.trim_matches('_').is_empty() {
        format!("{}.bin", sanitize_filename(asset_id))
    } else {
        sanitized
    }
}

/// Sanitizes filename for filesystem safety.
///
/// Replaces characters that are invalid on common filesystems:
/// / \ : * ? " < > |
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized.replace('.', "_")
    }
}

/// Keep-both name: `<timestamp>-<filename>`, with `-<n>` after the timestamp
/// for the `n`th alternative when the plain form is taken.
pub(crate) fn keep_both_filename(timestamp: &str, filename: &str, n: usize) -> String {
    if n <= 1 {
        format!("{timestamp}-{filename}")
    } else {
        format!("{timestamp}-{n}-{filename}")
    }
}

/// Hidden sibling an overwrite is staged in before it replaces the target.
pub(crate) fn staging_file_name(filename: &str, asset_id: &str) -> String {
    format!(".{filename}.{}.part", sanitize_filename(asset_id))
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}
