//! Console progress bars for downloads and extraction.

use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;

const DOWNLOAD_TEMPLATE: &str =
    "{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {binary_bytes}/{binary_total_bytes} ({binary_bytes_per_sec}, {eta})";
const DOWNLOAD_SPINNER_TEMPLATE: &str =
    "{spinner} {msg} [{elapsed_precise}] {binary_bytes} ({binary_bytes_per_sec})";
const EXTRACT_TEMPLATE: &str = "{msg} [{bar:40.green/blue}] {pos}/{len} files";

/// Creates progress bars, or hidden ones when progress output is disabled or
/// stdout is not a terminal (CI logs, pipes).
#[derive(Debug, Clone, Copy)]
pub struct Progress {
    enabled: bool,
}

impl Progress {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: enabled && std::io::stdout().is_terminal(),
        }
    }

    pub fn hidden() -> Self {
        Self { enabled: false }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Byte progress for a download. Without a known size a spinner is shown.
    pub fn download(&self, name: &str, size: Option<u64>) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }
        let (pb, template) = match size {
            Some(total) => (ProgressBar::new(total), DOWNLOAD_TEMPLATE),
            None => (ProgressBar::new_spinner(), DOWNLOAD_SPINNER_TEMPLATE),
        };
        pb.set_style(style(template).progress_chars("=> "));
        pb.set_message(name.to_string());
        pb
    }

    /// Per-entry progress for an extraction; the length is set once known.
    pub fn extract(&self, label: &str) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(0);
        pb.set_style(style(EXTRACT_TEMPLATE).progress_chars("=> "));
        pb.set_message(format!("Extracting {}", label));
        pb
    }
}

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template).unwrap_or_else(|_| ProgressStyle::default_bar())
}
