//! File loading, saving, and construction from filesystem entries

use crate::constants::{FileAttributes, ShowCommand};
use crate::decoder::decode_link;
use crate::encoder::encode_link;
use crate::error::LinkError;
use crate::scanner::scan_jump_list;
use crate::types::{FileTime, ShellLink};
use crate::Result;
use std::fs::{self, File, Metadata};
use std::io::BufReader;
use std::path::Path;

#[cfg(feature = "logging")]
use tracing::debug;

/// Load a single record from a `.lnk` file
pub fn load<P: AsRef<Path>>(path: P) -> Result<ShellLink> {
    let file = File::open(path.as_ref())?;
    let mut reader = BufReader::new(file);
    decode_link(&mut reader)
}

/// Recover every plausible record embedded in a jump list file
///
/// Malformed or truncated data inside the file never fails the call; only
/// reading the file itself can.
pub fn load_jump_list<P: AsRef<Path>>(path: P) -> Result<Vec<ShellLink>> {
    let data = fs::read(path.as_ref())?;
    Ok(scan_jump_list(&data).into_iter().map(|l| l.link).collect())
}

/// Encode `link` and write it to `path`
///
/// Encoding happens before the file is created, so an encoding error leaves
/// no file behind. An interrupted write can still leave a partial file.
pub fn save<P: AsRef<Path>>(link: &ShellLink, path: P) -> Result<()> {
    let encoded = encode_link(link)?;
    fs::write(path.as_ref(), &encoded)?;
    Ok(())
}

/// Copy attributes, timestamps and (for files) size of `target` into the header
///
/// Returns false, leaving the header untouched, when `target` does not exist.
pub fn apply_metadata<P: AsRef<Path>>(link: &mut ShellLink, target: P) -> bool {
    let meta = match fs::metadata(target.as_ref()) {
        Ok(meta) => meta,
        Err(_e) => {
            #[cfg(feature = "logging")]
            debug!("No metadata for {}: {}", target.as_ref().display(), _e);
            return false;
        }
    };

    let mut header = link.header_mut();
    header.file_attributes = attributes_of(&meta);
    header.creation_time = stamp(meta.created());
    header.access_time = stamp(meta.accessed());
    header.write_time = stamp(meta.modified());
    if meta.is_file() {
        header.file_size = (meta.len() & u32::MAX as u64) as u32;
    }
    true
}

/// Build a record pointing at `relative_target`, resolved against `base_dir`
///
/// Fails with [`LinkError::InvalidArgument`] before touching the filesystem
/// when `relative_target` is absolute.
pub fn create_relative<B: AsRef<Path>, T: AsRef<Path>>(
    base_dir: B,
    relative_target: T,
) -> Result<ShellLink> {
    let relative = relative_target.as_ref();
    if relative.is_absolute() || relative.has_root() {
        return Err(LinkError::InvalidArgument(format!(
            "target must be relative to the base directory: {}",
            relative.display()
        )));
    }

    let mut link = ShellLink::new();
    apply_metadata(&mut link, base_dir.as_ref().join(relative));
    link.header_mut().show_command = ShowCommand::Normal;
    link.set_relative_path(relative.to_string_lossy());
    link.set_working_dir(".");
    Ok(link)
}

/// Build a record pointing at `target` by absolute path
///
/// The working directory is the target's parent, or the target itself when
/// it is a directory.
pub fn create_absolute<P: AsRef<Path>>(target: P) -> Result<ShellLink> {
    let full = std::path::absolute(target.as_ref())?;

    let mut link = ShellLink::new();
    let exists = apply_metadata(&mut link, &full);
    link.header_mut().show_command = ShowCommand::Normal;
    link.set_relative_path(full.to_string_lossy());

    let is_dir = exists && link.header().file_attributes.is_directory();
    let working_dir = if is_dir {
        Some(full.as_path())
    } else {
        full.parent()
    };
    if let Some(dir) = working_dir {
        link.set_working_dir(dir.to_string_lossy());
    }
    Ok(link)
}

fn stamp(time: std::io::Result<std::time::SystemTime>) -> FileTime {
    time.map(FileTime::from_system_time).unwrap_or_default()
}

#[cfg(windows)]
fn attributes_of(meta: &Metadata) -> FileAttributes {
    use std::os::windows::fs::MetadataExt;
    FileAttributes::new(meta.file_attributes())
}

#[cfg(not(windows))]
fn attributes_of(meta: &Metadata) -> FileAttributes {
    let mut bits = if meta.is_dir() {
        FileAttributes::DIRECTORY
    } else {
        FileAttributes::NORMAL
    };
    if meta.permissions().readonly() {
        bits = (bits & !FileAttributes::NORMAL) | FileAttributes::READONLY;
    }
    FileAttributes::new(bits)
}

impl ShellLink {
    /// Load a record from a `.lnk` file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        load(path)
    }

    /// Save the record to `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        save(self, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::LinkFlags;
    use tempfile::tempdir;

    #[test]
    fn test_relative_rejects_absolute_target() {
        let td = tempdir().unwrap();
        let absolute = td.path().join("x.txt");
        let err = create_relative(td.path(), &absolute).unwrap_err();
        assert!(matches!(err, LinkError::InvalidArgument(_)));
    }

    #[test]
    fn test_relative_copies_metadata() {
        let td = tempdir().unwrap();
        fs::write(td.path().join("notes.txt"), b"hello world").unwrap();

        let link = create_relative(td.path(), "notes.txt").unwrap();
        assert_eq!(link.relative_path(), Some("notes.txt"));
        assert_eq!(link.working_dir(), Some("."));
        assert_eq!(link.header().file_size, 11);
        assert!(!link.header().write_time.is_unset());
        assert!(!link.header().file_attributes.is_directory());
        assert_eq!(link.header().show_command, ShowCommand::Normal);
    }

    #[test]
    fn test_relative_missing_target_still_builds() {
        let td = tempdir().unwrap();
        let link = create_relative(td.path(), "missing.bin").unwrap();
        assert_eq!(link.header().file_size, 0);
        assert!(link.header().write_time.is_unset());
        assert!(link.header().link_flags().contains(LinkFlags::HAS_RELATIVE_PATH));
    }

    #[test]
    fn test_absolute_file_uses_parent_dir() {
        let td = tempdir().unwrap();
        let target = td.path().join("app.exe");
        fs::write(&target, b"MZ").unwrap();

        let link = create_absolute(&target).unwrap();
        let full = std::path::absolute(&target).unwrap();
        assert_eq!(link.relative_path(), Some(&*full.to_string_lossy()));
        assert_eq!(
            link.working_dir(),
            Some(&*full.parent().unwrap().to_string_lossy())
        );
        assert_eq!(link.header().file_size, 2);
    }

    #[test]
    fn test_absolute_directory_is_its_own_working_dir() {
        let td = tempdir().unwrap();
        let link = create_absolute(td.path()).unwrap();
        let full = std::path::absolute(td.path()).unwrap();
        assert_eq!(link.working_dir(), Some(&*full.to_string_lossy()));
        assert!(link.header().file_attributes.is_directory());
        assert_eq!(link.header().file_size, 0);
    }

    #[test]
    fn test_save_then_load() {
        let td = tempdir().unwrap();
        let path = td.path().join("out.lnk");
        let mut link = ShellLink::new();
        link.set_unicode(true);
        link.set_arguments("/s");
        link.save(&path).unwrap();

        let loaded = ShellLink::load(&path).unwrap();
        assert_eq!(loaded, link);
    }

    #[test]
    fn test_save_encoding_error_leaves_no_file() {
        let td = tempdir().unwrap();
        let path = td.path().join("bad.lnk");
        let mut link = ShellLink::new();
        link.set_name("n".repeat(70_000));
        assert!(link.save(&path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let td = tempdir().unwrap();
        let err = load(td.path().join("nope.lnk")).unwrap_err();
        assert!(matches!(err, LinkError::Io(_)));
    }
}
