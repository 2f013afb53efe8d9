//! Status command - lifecycle state and retained partitions

use crate::cli::Host;
use crate::error::ShellResult;
use crate::ui::{self, UiContext};
use crate::worker::WorkerPhase;
use chrono::{DateTime, Utc};

/// Execute the status command
pub async fn execute(host: &Host) -> ShellResult<()> {
    let ctx = UiContext::detect();
    let manager = host.manager();
    let state = manager.state();
    let config = manager.config();

    ui::intro(&ctx, "shellcache status");

    ui::key_value_status(&ctx, "Version", &state.version, true);
    ui::key_value_status(
        &ctx,
        "Phase",
        &state.phase.to_string(),
        state.phase == WorkerPhase::Activated,
    );
    let active = manager
        .active()
        .map(|a| a.version)
        .unwrap_or_else(|| "none".to_string());
    ui::key_value_status(&ctx, "Serving", &active, active != "none");
    ui::key_value_status(&ctx, "Origin", config.origin.as_str(), true);
    ui::key_value_status(
        &ctx,
        "Installed",
        &timestamp(state.installed_at),
        state.installed_at.is_some(),
    );
    ui::key_value_status(
        &ctx,
        "Activated",
        &timestamp(state.activated_at),
        state.activated_at.is_some(),
    );
    ui::key_value_status(&ctx, "Skip waiting", &state.skip_waiting.to_string(), true);
    ui::key_value_status(&ctx, "Clients claimed", &state.clients_claimed.to_string(), true);

    println!();
    let existing = manager.store().names().await?;
    for name in config.versions.retained() {
        let present = existing.iter().any(|n| n == name);
        ui::key_value_status(
            &ctx,
            name,
            if present { "present" } else { "missing" },
            present,
        );
    }

    let stale = existing
        .iter()
        .filter(|name| !config.versions.retains(name))
        .count();
    if stale > 0 {
        ui::step_warn_hint(
            &ctx,
            &format!("{} stale partition(s)", stale),
            "Run: shellcache activate",
        );
    }

    Ok(())
}

fn timestamp(at: Option<DateTime<Utc>>) -> String {
    at.map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string())
}
