//! UI module for build log narration
//!
//! Uses `cliclack` for styled output in interactive terminals with
//! automatic fallback to plain, greppable lines in CI and build systems.
//!
//! # Example
//!
//! ```rust,ignore
//! use nodepack::ui::{self, UiContext, TaskSpinner};
//!
//! let ctx = UiContext::detect();
//!
//! ui::section(&ctx, "Installing binaries");
//! let mut spinner = TaskSpinner::new(&ctx);
//! spinner.start("Downloading node 0.10.26...");
//! // ... do work ...
//! spinner.stop("node 0.10.26 installed");
//!
//! ui::step_warn_hint(&ctx, "No Procfile", "Add one or a start script");
//! ```

mod context;
mod output;
mod progress;

pub use context::UiContext;
pub use output::{
    intro, key_value, outro_error, outro_success, section, step_info, step_ok, step_ok_detail,
    step_warn, step_warn_hint,
};
pub use progress::{DownloadProgress, TaskSpinner};
