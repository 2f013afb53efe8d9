//! Terminal output
//!
//! Uses `cliclack` log lines in interactive terminals and falls back to
//! plain `[OK]`/`[WARN]` lines in CI or when piped.

mod context;
mod output;

pub use context::UiContext;
pub use output::{intro, key_value_status, step_info, step_ok, step_warn_hint};
