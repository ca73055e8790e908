//! Album listing and operator selection.

use std::fmt::Write as _;

use thiserror::Error;

use crate::api::AlbumSummary;

/// Errors from interpreting the operator's album choice.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    /// The server has no albums to choose from.
    #[error("no albums available")]
    NoAlbums,

    /// The answer was not a number.
    #[error("album selection {input:?} is not a number")]
    NotANumber {
        /// The raw answer.
        input: String,
    },

    /// The number does not name a listed album.
    #[error("album index {index} is out of range (0-{max})")]
    OutOfRange {
        /// The requested index.
        index: usize,
        /// The largest valid index.
        max: usize,
    },
}

/// Renders the album list as `[i]  name` lines.
#[must_use]
pub fn render_album_list(albums: &[AlbumSummary]) -> String {
    let mut out = String::new();
    for (index, album) in albums.iter().enumerate() {
        let _ = writeln!(out, "[{index}]  {}", album.album_name);
    }
    out
}

/// Picks the album named by the operator's answer.
///
/// # Errors
///
/// Returns [`SelectionError`] when the answer is not a valid index.
pub fn select_album<'a>(
    albums: &'a [AlbumSummary],
    input: &str,
) -> Result<&'a AlbumSummary, SelectionError> {
    if albums.is_empty() {
        return Err(SelectionError::NoAlbums);
    }
    let trimmed = input.trim();
    let index: usize = trimmed.parse().map_err(|_| SelectionError::NotANumber {
        input: trimmed.to_string(),
    })?;
    albums.get(index).ok_or(SelectionError::OutOfRange {
        index,
        max: albums.len() - 1,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn albums() -> Vec<AlbumSummary> {
        ["Holidays", "Family"]
            .iter()
            .enumerate()
            .map(|(i, name)| AlbumSummary {
                id: format!("alb-{i}"),
                album_name: (*name).to_string(),
                asset_count: 0,
            })
            .collect()
    }

    #[test]
    fn test_render_album_list() {
        assert_eq!(render_album_list(&albums()), "[0]  Holidays\n[1]  Family\n");
    }

    #[test]
    fn test_select_album_by_index() {
        let albums = albums();
        assert_eq!(select_album(&albums, "1\n").unwrap().id, "alb-1");
    }

    #[test]
    fn test_select_album_rejects_bad_input() {
        let albums = albums();
        assert_eq!(
            select_album(&albums, "2"),
            Err(SelectionError::OutOfRange { index: 2, max: 1 })
        );
        assert_eq!(
            select_album(&albums, "first"),
            Err(SelectionError::NotANumber {
                input: "first".to_string()
            })
        );
        assert_eq!(select_album(&[], "0"), Err(SelectionError::NoAlbums));
    }
}
