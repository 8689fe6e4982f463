//! Terminal progress for traversals and archive assembly.
//!
//! Both reporters draw nothing when `quiet` is set, so commands can hand
//! them to the library unconditionally.

use flatkit::archive::{AssemblyProgress, EntryFailure};
use flatkit::walk::WalkObserver;
use flatkit::{DownloadStatus, FlattenedFile, RemoteEntry, RepositoryLocation};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::ui;

const MESSAGE_WIDTH: usize = 40;
const TICK: Duration = Duration::from_millis(100);

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-")
}

// ============================================================================
// Traversal
// ============================================================================

/// Spinner showing the directory being listed and the files seen so far
pub struct WalkSpinner {
    bar: ProgressBar,
    label: &'static str,
    files: AtomicU64,
}

impl WalkSpinner {
    pub fn new(label: &'static str, quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new_spinner();
            bar.set_style(spinner_style());
            bar.enable_steady_tick(TICK);
            bar
        };
        bar.set_message(format!("{label}..."));
        Self {
            bar,
            label,
            files: AtomicU64::new(0),
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl WalkObserver for WalkSpinner {
    fn on_directory(&self, location: &RepositoryLocation) {
        let shown = if location.subpath.is_empty() {
            location.repository.clone()
        } else {
            format!("{}/{}", location.repository, location.subpath)
        };
        self.bar.set_message(format!(
            "{} {} ({})",
            self.label,
            ui::truncate_path(&shown, MESSAGE_WIDTH),
            ui::plural(self.files.load(Ordering::Relaxed), "file")
        ));
    }

    fn on_file(&self, _entry: &RemoteEntry) {
        self.files.fetch_add(1, Ordering::Relaxed);
    }
}

// ============================================================================
// Assembly
// ============================================================================

/// Progress bar over archive entries
pub struct AssemblyReporter {
    bar: ProgressBar,
}

impl AssemblyReporter {
    pub fn new(total: usize, quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::hidden())
        } else {
            let bar = ProgressBar::new(total as u64);
            bar.set_style(bar_style());
            bar
        };
        Self { bar }
    }
}

impl AssemblyProgress for AssemblyReporter {
    fn on_status(&self, status: DownloadStatus) {
        log::debug!("Status: {status}");
        match status {
            DownloadStatus::Zipping | DownloadStatus::Preparing => {
                self.bar.set_message(status.label().to_string());
            }
            DownloadStatus::Downloading => {
                self.bar.set_position(self.bar.length().unwrap_or(0));
                self.bar.set_message(status.label().to_string());
            }
            DownloadStatus::Idle => self.bar.finish_and_clear(),
        }
    }

    fn on_entry(&self, index: usize, _total: usize, file: &FlattenedFile) {
        self.bar.set_position(index as u64);
        self.bar
            .set_message(ui::truncate_path(&file.original_path, MESSAGE_WIDTH));
    }

    fn on_failure(&self, failure: &EntryFailure) {
        self.bar.suspend(|| {
            ui::warn(&format!("Skipped {}: {}", failure.original_path, failure.error));
        });
    }
}
