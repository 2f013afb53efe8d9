//! List command - show cache partitions

use crate::cli::args::{ListArgs, OutputFormat};
use crate::cli::Host;
use crate::error::ShellResult;
use crate::ui::{self, UiContext};
use console::style;
use serde::Serialize;

/// One row of the partition listing
#[derive(Debug, Serialize)]
struct PartitionRow {
    name: String,
    entries: usize,
    retained: bool,
}

/// Execute the list command
pub async fn execute(args: ListArgs, host: &Host) -> ShellResult<()> {
    let manager = host.manager();
    let store = manager.store();
    let versions = &manager.config().versions;

    let mut rows = Vec::new();
    for name in store.names().await? {
        let entries = store.keys(&name).await?.len();
        rows.push(PartitionRow {
            retained: versions.retains(&name),
            name,
            entries,
        });
    }

    if rows.is_empty() {
        match args.format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Plain => {}
            OutputFormat::Table => {
                let ctx = UiContext::detect();
                ui::step_info(&ctx, "No cache partitions");
            }
        }
        return Ok(());
    }

    match args.format {
        OutputFormat::Table => print_table(&rows),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Plain => {
            for row in &rows {
                println!("{}", row.name);
            }
        }
    }

    Ok(())
}

fn print_table(rows: &[PartitionRow]) {
    let ctx = UiContext::detect();
    ui::intro(&ctx, "Partitions");

    println!(
        "{:<32} {:<8} {:<10}",
        style("NAME").bold(),
        style("ENTRIES").bold(),
        style("VERSION").bold()
    );
    println!("{}", "-".repeat(52));

    for row in rows {
        let version = if row.retained {
            style("current").green()
        } else {
            style("stale").dim()
        };
        println!("{:<32} {:<8} {:<10}", row.name, row.entries, version);
    }

    println!();
    println!("{} partition(s)", rows.len());
}
