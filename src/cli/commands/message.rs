//! Message command - deliver a control message

use super::activate::show_report;
use crate::cli::args::MessageArgs;
use crate::cli::Host;
use crate::error::ShellResult;
use crate::ui::{self, UiContext};
use crate::worker::MessageOutcome;

/// Execute the message command
pub async fn execute(args: MessageArgs, host: &Host) -> ShellResult<()> {
    let ctx = UiContext::detect();

    match host.manager().handle_message(&args.payload).await? {
        MessageOutcome::Ignored => {
            ui::step_info(&ctx, &format!("Ignored message {:?}", args.payload));
        }
        MessageOutcome::SkipWaiting { activation } => match activation {
            Some(report) => show_report(&ctx, &report),
            None => ui::step_ok(&ctx, "Skip waiting recorded"),
        },
        MessageOutcome::Cleared { partitions } => {
            if partitions.is_empty() {
                ui::step_info(&ctx, "No partitions to clear");
            } else {
                ui::step_ok(
                    &ctx,
                    &format!(
                        "Cleared {} partition(s): {}",
                        partitions.len(),
                        partitions.join(", ")
                    ),
                );
            }
        }
    }

    Ok(())
}
