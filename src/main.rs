//! CLI entry point for the Immich favorites downloader.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use favorites_core::{
    AlbumDetail, ApiConfig, CollisionResolver, DownloadCoordinator, ImmichClient, StdinPrompt,
    load_dotenv, render_album_list, select_album,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    load_dotenv().context("error loading .env file")?;
    let config = ApiConfig::from_env();
    debug!(?config, "configuration loaded");
    if config.base_url.is_empty() {
        warn!("ImmichURL is not set; requests will fail");
    }

    let client = Arc::new(ImmichClient::from_config(&config)?);

    let dest_dir = resolve_directory(args.dest_dir)?;
    let album = choose_album(&client).await?;
    let favorites = album.favorite_asset_ids();
    println!(
        "Found {} favorites in album '{}'",
        favorites.len(),
        album.album_name
    );

    let progress = if args.quiet {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(favorites.len() as u64);
        bar.set_style(
            ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar
    };

    let prompt = StdinPrompt::new().with_progress(progress.clone());
    let resolver = Arc::new(CollisionResolver::new(Arc::new(prompt)));
    let coordinator =
        DownloadCoordinator::new(usize::from(args.concurrency), client, resolver)?
            .with_progress(progress);

    let summary = coordinator.run(&favorites, &dest_dir).await?;

    println!(
        "Download complete: {} successful, {} failed",
        summary.success_count,
        summary.failed()
    );
    if !summary.failures.is_empty() {
        println!("Failed downloads:");
        for failure in &summary.failures {
            println!("  {failure}");
        }
    }

    info!(
        total = summary.total,
        succeeded = summary.success_count,
        skipped = summary.skipped_count,
        failed = summary.failed(),
        retried = summary.retried,
        bytes = summary.bytes_written,
        "Download finished"
    );

    Ok(())
}

/// Reads one trimmed line from stdin after printing `label`.
fn read_answer(label: &str) -> Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Uses the positional directory, or asks for one (empty answer = working directory).
fn resolve_directory(arg: Option<PathBuf>) -> Result<PathBuf> {
    let dir = match arg {
        Some(dir) => dir,
        None => {
            let answer = read_answer("Directory to use:\n")?;
            if answer.is_empty() {
                std::env::current_dir().context("could not get working directory")?
            } else {
                PathBuf::from(answer)
            }
        }
    };

    if !dir.is_dir() {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create folder {}", dir.display()))?;
        println!("Created folder: {}", dir.display());
    }
    Ok(dir)
}

async fn choose_album(client: &ImmichClient) -> Result<AlbumDetail> {
    let albums = client.list_albums().await.context("error listing albums")?;
    print!("{}", render_album_list(&albums));

    let answer = read_answer("")?;
    let album = select_album(&albums, &answer)?;
    info!(album = %album.album_name, id = %album.id, "album selected");

    client
        .album_detail(&album.id)
        .await
        .with_context(|| format!("error reading album '{}'", album.album_name))
}
