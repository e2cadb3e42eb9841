use std::sync::Mutex;
use std::time::Duration;

use exif_reduction_core::{Operation, Progress};
use indicatif::{ProgressBar, ProgressStyle};

/// Feeds core progress updates into one indicatif bar per pass.
pub struct CliProgress {
    bar: Mutex<Option<(Operation, ProgressBar)>>,
}

impl CliProgress {
    pub fn new() -> Self {
        Self { bar: Mutex::new(None) }
    }

    pub fn update(&self, progress: &Progress) {
        let Ok(mut guard) = self.bar.lock() else { return };

        let stale = guard.as_ref().map_or(true, |(op, _)| *op != progress.operation);
        if stale {
            if let Some((_, old)) = guard.take() {
                old.finish_and_clear();
            }
            *guard = Some((progress.operation, new_bar(progress)));
        }

        if let Some((_, pb)) = guard.as_ref() {
            pb.set_length(progress.total);
            pb.set_position(progress.completed);
            pb.set_message(match progress.eta {
                Some(eta) => format!("{} remaining", format_eta(eta)),
                None => "estimating...".to_string(),
            });
        }
    }

    pub fn finish(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some((_, pb)) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }
}

fn new_bar(progress: &Progress) -> ProgressBar {
    let pb = ProgressBar::new(progress.total);
    let template = format!("  {{spinner:.cyan}} {} [{{bar:30.cyan/dim}}] {{pos}}/{{len}} ({{msg}})", progress.operation);
    if let Ok(style) = ProgressStyle::with_template(&template) {
        pb.set_style(style.progress_chars("━╸─").tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn format_eta(eta: Duration) -> String {
    let secs = eta.as_secs();
    if secs >= 3600 {
        format!("{}h{:02}m", secs / 3600, secs % 3600 / 60)
    } else if secs >= 60 {
        format!("{}m{:02}s", secs / 60, secs % 60)
    } else {
        format!("{secs}s")
    }
}
