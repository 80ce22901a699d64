//! Build a shortcut record, save it, and read it back

use bytes::Bytes;
use shlink_core::{
    blocks::{IdList, ItemId},
    encoder::ShellLinkBuilder,
    FileTime, ShellLink, ShowCommand,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Shlink Basic Create Example\n");

    let now = FileTime::from_system_time(std::time::SystemTime::now());

    // A root-folder entry followed by a drive entry
    let id_list = IdList::new(vec![
        ItemId::new(Bytes::from_static(&[
            0x1F, 0x50, 0xE0, 0x4F, 0xD0, 0x20, 0xEA, 0x3A, 0x69, 0x10, 0xA2, 0xD8, 0x08, 0x00,
            0x2B, 0x30, 0x30, 0x9D,
        ]))?,
        ItemId::new(Bytes::from_static(b"\x2FC:\\\0"))?,
    ]);

    let link = ShellLinkBuilder::new()
        .unicode(true)
        .id_list(id_list)
        .name("Notepad")
        .relative_path("..\\Windows\\notepad.exe")
        .working_dir("C:\\Windows")
        .arguments("readme.txt")
        .icon_location("%SystemRoot%\\system32\\notepad.exe")
        .show_command(ShowCommand::Maximized)
        .times(now, now, now)
        .build();

    println!("Flags after building: 0x{:08X}", link.header().link_flags().as_u32());

    link.save("example_output.lnk")?;
    let loaded = ShellLink::load("example_output.lnk")?;

    println!("\n{}", loaded);
    println!("Round trip identical: {}", loaded == link);
    println!("Use 'shlink dump --input example_output.lnk' to inspect it");

    Ok(())
}
