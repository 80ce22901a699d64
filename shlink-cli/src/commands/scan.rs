use super::LinkSummary;
use anyhow::{Context, Result};
use shlink_core::scanner::scan_jump_list_with_stats;
use std::fs;
use tracing::info;

pub fn execute(input: &str, output: Option<&str>, stats_only: bool) -> Result<()> {
    info!("Scanning file: {}", input);

    let data = fs::read(input).with_context(|| format!("Failed to read input file: {}", input))?;

    info!("File size: {} bytes", data.len());

    let (located, stats) = scan_jump_list_with_stats(&data);

    println!("\n=== Scan Results ===");
    println!("Bytes scanned:     {} bytes", stats.bytes_scanned);
    println!("Length matches:    {}", stats.length_matches);
    println!("Signatures:        {}", stats.signature_matches);
    println!("Links found:       {}", stats.links_found);
    println!("Rejected:          {}", stats.rejected);
    println!("Decode failures:   {}", stats.decode_failures);
    println!("Bytes recovered:   {} bytes", stats.bytes_recovered);
    println!("Recovery rate:     {:.2}%", stats.recovery_rate());
    println!();

    if stats_only {
        return Ok(());
    }

    let recovered: Vec<LinkSummary> = located
        .iter()
        .map(|l| LinkSummary::located(&l.link, l.offset, l.size))
        .collect();

    if let Some(output_path) = output {
        let json = serde_json::to_string_pretty(&recovered)
            .with_context(|| "Failed to serialize recovered links")?;

        fs::write(output_path, json)
            .with_context(|| format!("Failed to write output file: {}", output_path))?;

        info!("Recovered links written to: {}", output_path);
    } else {
        println!("=== Recovered Links ===");
        for link in &recovered {
            println!(
                "Link @ offset {}: {} bytes, written {}, {}",
                link.offset.unwrap_or_default(),
                link.size.unwrap_or_default(),
                link.written,
                link.relative_path
                    .as_deref()
                    .or(link.name.as_deref())
                    .unwrap_or("-")
            );
        }
    }

    Ok(())
}
