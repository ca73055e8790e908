//! Operator prompt for local filename collisions.

use std::io::{self, BufRead, Write};

use async_trait::async_trait;
use indicatif::ProgressBar;
use tracing::warn;

/// Asks the operator what to do about an existing file.
///
/// Implementations only show the question and return the raw answer; the
/// [`CollisionResolver`](super::CollisionResolver) serializes calls and
/// interprets the answer.
#[async_trait]
pub trait ChoicePrompt: Send + Sync {
    /// Shows the collision menu for `filename` and returns the operator's
    /// answer, or `None` when nothing could be read.
    async fn ask(&self, filename: &str) -> Option<String>;
}

/// The operator's pick from the collision menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionChoice {
    KeepBoth,
    Overwrite,
    Skip,
}

impl CollisionChoice {
    /// Interprets a raw answer. `3`, or any unrecognised answer, means skip.
    #[must_use]
    pub fn from_answer(answer: Option<&str>) -> Self {
        match answer.map(str::trim) {
            Some("1") => Self::KeepBoth,
            Some("2") => Self::Overwrite,
            Some("3") => Self::Skip,
            other => {
                warn!(answer = ?other, "invalid choice, defaulting to skip download");
                Self::Skip
            }
        }
    }
}

/// Renders the three-option collision menu.
#[must_use]
pub fn render_menu(filename: &str) -> String {
    format!(
        "\nDuplicate file found: {filename}\n\
         Choose an option:\n\
         1. Keep both files (add date prefix to new file)\n\
         2. Overwrite the existing file\n\
         3. (Default) Keep the existing file (skip download)\n\
         Enter your choice (1-3): "
    )
}

/// Prompts on stdout and reads one line from stdin.
///
/// When a progress bar is attached it is suspended while the menu is shown so
/// the two do not overdraw each other.
#[derive(Debug, Default, Clone)]
pub struct StdinPrompt {
    progress: Option<ProgressBar>,
}

impl StdinPrompt {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }
}

fn ask_blocking(filename: &str) -> Option<String> {
    let mut stdout = io::stdout().lock();
    write!(stdout, "{}", render_menu(filename)).ok()?;
    stdout.flush().ok()?;
    drop(stdout);

    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line),
    }
}

#[async_trait]
impl ChoicePrompt for StdinPrompt {
    async fn ask(&self, filename: &str) -> Option<String> {
        let filename = filename.to_string();
        let progress = self.progress.clone();
        tokio::task::spawn_blocking(move || match progress {
            Some(bar) => bar.suspend(|| ask_blocking(&filename)),
            None => ask_blocking(&filename),
        })
        .await
        .ok()
        .flatten()
    }
}
