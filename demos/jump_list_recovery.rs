//! Recover shortcut records from a synthetic jump list

use shlink_core::{encoder::ShellLinkBuilder, scanner::scan_jump_list_with_stats, FileTime};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Shlink Jump List Recovery Example\n");

    // Step 1: Build a container with records separated by unrelated bytes
    println!("Step 1: Building a container with 5 records...");
    let base = 132_500_000_000_000_000u64;
    let mut container = b"DESTLIST-HEADER-BYTES".to_vec();

    for i in 0..5u64 {
        let stamp = FileTime::new(base + i * 10_000_000);
        let encoded = ShellLinkBuilder::new()
            .unicode(true)
            .relative_path(format!("C:\\Users\\me\\Documents\\report-{}.docx", i))
            .working_dir("C:\\Users\\me\\Documents")
            .times(stamp, stamp, stamp)
            .encode()?;
        container.extend_from_slice(&encoded);
        container.extend_from_slice(&[0x4C, 0x00, 0x00, 0x00, 0xFF, 0xFF]);
    }

    // An entry whose timestamps were never filled in
    let blank = ShellLinkBuilder::new().name("blank").encode()?;
    container.extend_from_slice(&blank);

    println!("Container: {} bytes\n", container.len());

    // Step 2: Scan
    println!("Step 2: Scanning...");
    let (found, stats) = scan_jump_list_with_stats(&container);

    println!("Scan Results:");
    println!("  Bytes scanned:      {}", stats.bytes_scanned);
    println!("  Length matches:     {}", stats.length_matches);
    println!("  Signature matches:  {}", stats.signature_matches);
    println!("  Links found:        {}", stats.links_found);
    println!("  Rejected:           {}", stats.rejected);
    println!("  Recovery rate:      {:.1}%\n", stats.recovery_rate());

    for located in &found {
        println!(
            "  @{:>5}: {} ({})",
            located.offset,
            located.link.relative_path().unwrap_or("-"),
            located.link.header().write_time
        );
    }

    Ok(())
}
