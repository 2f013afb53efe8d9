//! Install command - precache the app shell

use super::activate::show_report;
use crate::cli::Host;
use crate::error::ShellResult;
use crate::ui::{self, UiContext};
use crate::worker::{HostSignal, InstallReport};

/// Execute the install command
///
/// Install asks to skip waiting, so the host activates straight away.
pub async fn execute(host: &Host) -> ShellResult<()> {
    let ctx = UiContext::detect();
    let manager = host.manager();
    ui::intro(&ctx, &format!("Installing {}", manager.config().versions.tag));

    let report = manager.install().await?;
    show_install(&ctx, &report);

    if report.signals.contains(&HostSignal::SkipWaiting) {
        let activation = manager.activate().await?;
        show_report(&ctx, &activation);
    }

    Ok(())
}

fn show_install(ctx: &UiContext, report: &InstallReport) {
    ui::step_ok(
        ctx,
        &format!(
            "Precached {} resource(s) into {}",
            report.cached.len(),
            report.static_partition
        ),
    );

    if !report.external_cached.is_empty() {
        ui::step_ok(
            ctx,
            &format!(
                "Cached {} external resource(s) into {}",
                report.external_cached.len(),
                report.dynamic_partition
            ),
        );
    }

    for skipped in &report.external_failed {
        ui::step_warn_hint(ctx, &format!("Skipped {}", skipped.url), &skipped.reason);
    }
}
