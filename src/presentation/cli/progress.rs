//! Progress reporting for the CLI, via indicatif.

use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};

/// Wraps an indicatif bar sized to a device's byte count, used while
/// streaming a backup or restore record.
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    pub fn for_device(total_bytes: u64, message: &str) -> Self {
        let bar = ProgressBar::new(total_bytes);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                .unwrap()
                .progress_chars("#>-"),
        );
        bar.set_message(message.to_string());
        Self { bar }
    }

    pub fn set_position(&self, bytes: u64) {
        self.bar.set_position(bytes);
    }

    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

pub fn format_bytes(bytes: u64) -> String {
    format_size(bytes, BINARY)
}
