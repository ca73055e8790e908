//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use favorites_core::DEFAULT_MAX_CONCURRENT;

/// Download the favorite photos and videos of an Immich album.
///
/// Reads `ImmichURL` and `ImmichKey` from the environment or a `.env` file,
/// lists the albums on the server and downloads the favorites of the chosen
/// one.
#[derive(Parser, Debug)]
#[command(name = "immich-favorites")]
#[command(author, version, about)]
pub struct Args {
    /// Directory to download into (prompted for when omitted)
    pub dest_dir: Option<PathBuf>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Maximum concurrent downloads (1-100)
    #[arg(short = 'c', long, default_value_t = DEFAULT_MAX_CONCURRENT as u8, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: u8,
}
