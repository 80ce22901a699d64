use super::LinkSummary;
use anyhow::{Context, Result};
use colored::*;
use shlink_core::ShellLink;
use tracing::info;

pub fn execute(input: &str, json: bool) -> Result<()> {
    info!("Reading shortcut: {}", input);

    let link = ShellLink::load(input)
        .with_context(|| format!("Failed to decode shell link: {}", input))?;

    if json {
        let summary = LinkSummary::from_link(&link);
        let out = serde_json::to_string_pretty(&summary)
            .with_context(|| "Failed to serialize shell link")?;
        println!("{}", out);
        return Ok(());
    }

    println!("{} {}", "✓".green(), input);
    println!("{}", link);

    for tracker in link.extra_data().iter().filter_map(|b| b.tracker()) {
        let id = tracker.file_identifier();
        if id.timestamp().is_none() {
            println!("{} Tracker droid carries no timestamp", "!".yellow());
        }
    }

    Ok(())
}
