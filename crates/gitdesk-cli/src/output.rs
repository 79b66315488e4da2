//! Terminal output formatting utilities.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use colored::{ColoredString, Colorize};
use gitdesk_git::{CommitRecord, UpstreamStatus};
use indicatif::{ProgressBar, ProgressStyle};

static QUIET_MODE: AtomicBool = AtomicBool::new(false);

/// Set quiet mode globally. Call once at startup.
pub fn set_quiet(quiet: bool) {
    QUIET_MODE.store(quiet, Ordering::Relaxed);
}

fn is_quiet() -> bool {
    QUIET_MODE.load(Ordering::Relaxed)
}

/// Print a success message (suppressed in quiet mode).
pub fn success(msg: &str) {
    if !is_quiet() {
        println!("{} {}", "✓".green(), msg);
    }
}

/// Print an error message (always prints to stderr).
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a warning message (always prints to stderr).
pub fn warn(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

/// Print an info message (suppressed in quiet mode).
pub fn info(msg: &str) {
    if !is_quiet() {
        println!("{} {}", "→".blue(), msg);
    }
}

/// Print a detail line without prefix (suppressed in quiet mode).
pub fn detail(msg: &str) {
    if !is_quiet() {
        println!("{msg}");
    }
}

/// Print essential machine-readable output (always prints).
///
/// Use for results meant for piping, like JSON or config values.
pub fn essential(msg: &str) {
    println!("{msg}");
}

/// Get a colored branch name with current indicator.
#[must_use]
pub fn branch_name(name: &str, is_current: bool) -> String {
    if is_current {
        format!("{} {}", "▶".cyan(), name.cyan().bold())
    } else {
        format!("  {name}")
    }
}

/// Kind of change a path is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Staged,
    Modified,
    Untracked,
    Conflicted,
}

impl Change {
    const fn label(self) -> &'static str {
        match self {
            Self::Staged => "Staged",
            Self::Modified => "Modified",
            Self::Untracked => "Untracked",
            Self::Conflicted => "Conflicted",
        }
    }

    fn paint(self, text: &str) -> ColoredString {
        match self {
            Self::Staged => text.green(),
            Self::Modified => text.yellow(),
            Self::Untracked => text.dimmed(),
            Self::Conflicted => text.red().bold(),
        }
    }
}

/// Print a titled list of paths; nothing when `paths` is empty.
pub fn change_list(change: Change, paths: &[String]) {
    if paths.is_empty() || is_quiet() {
        return;
    }
    println!("{} ({}):", change.label().bold(), paths.len());
    for path in paths {
        println!("    {}", change.paint(path));
    }
}

/// Ahead/behind summary, e.g. `origin/main 2↑ 1↓`.
#[must_use]
pub fn upstream(status: &UpstreamStatus) -> String {
    let mut text = status.name.dimmed().to_string();
    if status.ahead > 0 {
        text.push_str(&format!(" {}↑", status.ahead).green().to_string());
    }
    if status.behind > 0 {
        text.push_str(&format!(" {}↓", status.behind).yellow().to_string());
    }
    if status.ahead == 0 && status.behind == 0 {
        text.push_str(&" up to date".dimmed().to_string());
    }
    text
}

/// One-line commit summary: short hash, subject, author and date.
#[must_use]
pub fn commit_line(commit: &CommitRecord) -> String {
    format!(
        "{} {} {} {}",
        commit.short_hash.yellow(),
        commit.summary(),
        format!("<{}>", commit.author_name).dimmed(),
        commit.timestamp.format("%Y-%m-%d %H:%M").to_string().dimmed()
    )
}

/// Start a spinner on stderr. Hidden in quiet mode or without a terminal.
#[must_use]
pub fn spinner(msg: &str) -> ProgressBar {
    if is_quiet() || !console::Term::stderr().is_term() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(msg.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// Print a horizontal line (suppressed in quiet mode).
pub fn hr() {
    if !is_quiet() {
        println!("{}", "─".repeat(50).dimmed());
    }
}
