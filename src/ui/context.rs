//! UI context: styled output by hand, plain lines on build machines
//!
//! Builds almost always run without a terminal; the fancy path exists for
//! running nodepack by hand.

use std::io::IsTerminal;

/// Variables whose presence marks a build machine or CI runner.
///
/// `STACK` is exported to every buildpack by the build platform.
const BUILD_MACHINE_VARS: &[&str] = &[
    "STACK",
    "CI",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "CIRCLECI",
    "BUILDKITE",
    "JENKINS_URL",
    "TF_BUILD",
];

/// UI context that determines output behavior
#[derive(Debug, Clone)]
pub struct UiContext {
    interactive: bool,
}

impl UiContext {
    /// Detect from stdout and the process environment
    pub fn detect() -> Self {
        Self::from_env(std::io::stdout().is_terminal(), |name| {
            std::env::var_os(name).is_some()
        })
    }

    /// Decide from a terminal flag and a variable lookup
    pub fn from_env(is_terminal: bool, is_set: impl Fn(&str) -> bool) -> Self {
        let on_build_machine = BUILD_MACHINE_VARS.iter().any(|name| is_set(name));
        Self {
            interactive: is_terminal && !on_build_machine,
        }
    }

    /// Plain output regardless of environment
    pub fn non_interactive() -> Self {
        Self { interactive: false }
    }

    /// Spinners, progress bars and colors
    pub fn use_fancy_output(&self) -> bool {
        self.interactive
    }
}
