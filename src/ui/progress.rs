//! Progress indicators with CI fallback

use super::context::UiContext;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Read;

/// A task spinner with CI fallback
pub struct TaskSpinner {
    spinner: Option<cliclack::ProgressBar>,
    interactive: bool,
}

impl TaskSpinner {
    /// Create a new spinner (shows nothing until started)
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            spinner: None,
            interactive: ctx.use_fancy_output(),
        }
    }

    /// Start the spinner with a message
    pub fn start(&mut self, message: &str) {
        if self.interactive {
            let spinner = cliclack::spinner();
            spinner.start(message);
            self.spinner = Some(spinner);
        } else {
            println!("       {}", message);
        }
    }

    /// Stop with success message
    pub fn stop(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.stop(message);
        } else if self.interactive {
            println!("{} {}", style("✓").green(), message);
        } else {
            println!("       {}", message);
        }
    }

    /// Stop with error message
    pub fn stop_error(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.error(message);
        } else {
            eprintln!(" !     {}", message);
        }
    }
}

/// Byte progress for archive downloads.
///
/// Shows an indicatif bar in interactive mode, nothing extra in CI.
pub struct DownloadProgress {
    bar: Option<ProgressBar>,
}

impl DownloadProgress {
    /// Create a progress indicator; `total` is the content length if known
    pub fn new(interactive: bool, label: &str, total: Option<u64>) -> Self {
        let bar = interactive.then(|| {
            let bar = match total {
                Some(len) => ProgressBar::new(len),
                None => ProgressBar::new_spinner(),
            };
            if let Ok(template) = ProgressStyle::default_bar()
                .template("  {spinner:.green} {prefix}  {bar:24.green/dim} {bytes}/{total_bytes} {elapsed:.dim}")
            {
                bar.set_style(template.progress_chars("━╸─"));
            }
            bar.set_prefix(label.to_string());
            bar
        });
        Self { bar }
    }

    /// Wrap a reader so bytes read advance the bar
    pub fn wrap<R: Read + Send + 'static>(&self, reader: R) -> Box<dyn Read + Send> {
        match self.bar {
            Some(ref bar) => Box::new(bar.wrap_read(reader)),
            None => Box::new(reader),
        }
    }

    /// Finish and clear the bar
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}
