//! Sync command - deliver a background sync event

use crate::cli::args::SyncArgs;
use crate::cli::Host;
use crate::error::ShellResult;
use crate::ui::{self, UiContext};
use crate::worker::SyncOutcome;

/// Execute the sync command
pub async fn execute(args: SyncArgs, host: &Host) -> ShellResult<()> {
    let ctx = UiContext::detect();

    match host.manager().handle_sync(&args.tag).await? {
        SyncOutcome::Ignored => {
            ui::step_info(&ctx, &format!("No handler for sync tag {:?}", args.tag));
        }
        SyncOutcome::Refreshed(report) => {
            ui::step_ok(
                &ctx,
                &format!("Refreshed {} external resource(s)", report.cached.len()),
            );
            for skipped in &report.failed {
                ui::step_warn_hint(&ctx, &format!("Skipped {}", skipped.url), &skipped.reason);
            }
        }
    }

    Ok(())
}
