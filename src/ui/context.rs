//! Terminal detection for output styling

use std::io::IsTerminal;

/// CI environment indicators
const CI_VARS: &[&str] = &[
    "CI",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "BUILDKITE",
    "TF_BUILD",
];

/// Decides between cliclack log lines and plain `[OK]` style lines
#[derive(Debug, Clone, Copy)]
pub struct UiContext {
    interactive: bool,
}

impl UiContext {
    /// Detect the current environment
    pub fn detect() -> Self {
        let interactive = std::io::stdout().is_terminal()
            && !CI_VARS.iter().any(|var| std::env::var_os(var).is_some());
        Self { interactive }
    }

    /// Plain output regardless of terminal
    pub fn non_interactive() -> Self {
        Self { interactive: false }
    }

    /// Whether to use cliclack decorations
    pub fn use_fancy_output(&self) -> bool {
        self.interactive
    }
}
