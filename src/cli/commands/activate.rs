//! Activate command - drop stale partitions and take control

use crate::cli::Host;
use crate::error::ShellResult;
use crate::ui::{self, UiContext};
use crate::worker::ActivateReport;

/// Execute the activate command
pub async fn execute(host: &Host) -> ShellResult<()> {
    let ctx = UiContext::detect();
    let manager = host.manager();
    ui::intro(&ctx, &format!("Activating {}", manager.config().versions.tag));

    let report = manager.activate().await?;
    show_report(&ctx, &report);
    Ok(())
}

pub(crate) fn show_report(ctx: &UiContext, report: &ActivateReport) {
    if report.deleted.is_empty() && report.failed.is_empty() {
        ui::step_info(ctx, "No stale partitions");
    }
    for name in &report.deleted {
        ui::step_ok(ctx, &format!("Deleted {}", name));
    }
    for failed in &report.failed {
        ui::step_warn_hint(
            ctx,
            &format!("Could not delete {}", failed.partition),
            &failed.reason,
        );
    }
    ui::step_ok(ctx, "Activated");
}
