//! Core types for Shell Link records

use crate::blocks::{ExtraDataBlock, IdList, LinkInfo};
use crate::constants::{
    FileAttributes, LinkFlags, ShowCommand, FILETIME_TICKS_PER_SEC, FILETIME_UNIX_OFFSET_SECS,
};
use crate::flags::StringField;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::time::SystemTime;

/// Windows FILETIME: 100ns intervals since 1601-01-01 UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct FileTime(u64);

impl FileTime {
    /// 1601-01-01T00:00:00, the value of an unset timestamp
    pub const EPOCH: FileTime = FileTime(0);

    /// Create from raw ticks
    pub const fn new(ticks: u64) -> Self {
        Self(ticks)
    }

    /// Raw ticks
    pub const fn ticks(&self) -> u64 {
        self.0
    }

    /// The reference epoch as a calendar value
    pub fn epoch_datetime() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(1601, 1, 1)
            .and_then(|d| d.and_hms_milli_opt(0, 0, 0, 0))
            .unwrap_or_default()
    }

    /// Convert to a UTC date/time; `None` when chrono cannot represent it
    pub fn checked_datetime(&self) -> Option<DateTime<Utc>> {
        let secs = (self.0 / FILETIME_TICKS_PER_SEC) as i64 - FILETIME_UNIX_OFFSET_SECS;
        let nanos = ((self.0 % FILETIME_TICKS_PER_SEC) * 100) as u32;
        Utc.timestamp_opt(secs, nanos).single()
    }

    /// Convert to a UTC date/time, falling back to the epoch when out of range
    pub fn to_datetime(&self) -> DateTime<Utc> {
        self.checked_datetime()
            .unwrap_or_else(|| Utc.from_utc_datetime(&Self::epoch_datetime()))
    }

    /// Convert from a UTC date/time
    ///
    /// Instants before 1601 clamp to the epoch, instants past the last
    /// representable tick clamp to `u64::MAX`.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        let secs = dt.timestamp() + FILETIME_UNIX_OFFSET_SECS;
        if secs < 0 {
            return Self::EPOCH;
        }
        (secs as u64)
            .checked_mul(FILETIME_TICKS_PER_SEC)
            .and_then(|t| t.checked_add(dt.timestamp_subsec_nanos() as u64 / 100))
            .map_or(Self(u64::MAX), Self)
    }

    /// Convert from a filesystem timestamp
    pub fn from_system_time(time: SystemTime) -> Self {
        Self::from_datetime(DateTime::<Utc>::from(time))
    }

    /// True when the timestamp is zero or the 1601 reference epoch
    pub fn is_unset(&self) -> bool {
        self.0 == 0
            || self.checked_datetime().map(|dt| dt.naive_utc()) == Some(Self::epoch_datetime())
    }
}

impl fmt::Display for FileTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_datetime().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Fixed 76-byte Shell Link header
///
/// The presence bits of the link flags belong to [`ShellLink`] and can only
/// change through its setters; [`Header::set_option`] covers the rest.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Header {
    pub(crate) link_flags: LinkFlags,

    /// Attributes of the link target
    pub file_attributes: FileAttributes,

    /// Target creation time
    pub creation_time: FileTime,

    /// Target last access time
    pub access_time: FileTime,

    /// Target last write time
    pub write_time: FileTime,

    /// Low 32 bits of the target size
    pub file_size: u32,

    /// Icon index within the icon location
    pub icon_index: i32,

    /// Window state for the launched target
    pub show_command: ShowCommand,

    /// Hotkey: low byte virtual key code, high byte modifiers
    pub hotkey: u16,

    /// Reserved, zero when written by the shell
    pub reserved1: u16,

    /// Reserved
    pub reserved2: u32,

    /// Reserved
    pub reserved3: u32,
}

impl Header {
    /// Current link flags
    pub fn link_flags(&self) -> LinkFlags {
        self.link_flags
    }

    /// Set or clear an option bit; presence bits are ignored
    pub fn set_option(&mut self, flag: u32, on: bool) {
        let flag = flag & !LinkFlags::PRESENCE_MASK;
        self.link_flags = self.link_flags.with(flag, on);
    }

    /// Whether strings are stored as UTF-16LE
    pub fn is_unicode(&self) -> bool {
        self.link_flags.is_unicode()
    }

    /// All three timestamps are set and none is the 1601 epoch
    pub fn has_plausible_times(&self) -> bool {
        !self.creation_time.is_unset()
            && !self.access_time.is_unset()
            && !self.write_time.is_unset()
    }

    pub(crate) fn set_link_flags(&mut self, flags: LinkFlags) {
        self.link_flags = flags;
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, ">>Header")?;
        writeln!(
            f,
            "LinkFlags: 0x{:08X} [{}]",
            self.link_flags.as_u32(),
            self.link_flags.names().join(", ")
        )?;
        writeln!(
            f,
            "FileAttributes: 0x{:08X} [{}]",
            self.file_attributes.as_u32(),
            self.file_attributes.names().join(", ")
        )?;
        writeln!(f, "CreationTime: {}", self.creation_time)?;
        writeln!(f, "AccessTime: {}", self.access_time)?;
        writeln!(f, "WriteTime: {}", self.write_time)?;
        writeln!(f, "FileSize: {}", self.file_size)?;
        writeln!(f, "IconIndex: {}", self.icon_index)?;
        writeln!(f, "ShowCommand: {:?}", self.show_command)?;
        write!(f, "HotKey: 0x{:04X}", self.hotkey)
    }
}

/// A complete Shell Link record
///
/// Every setter of an optional field recomputes the matching header bit in
/// the same call, so `header().link_flags()` always agrees with the fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShellLink {
    header: Header,
    id_list: Option<IdList>,
    link_info: Option<LinkInfo>,
    strings: [Option<String>; 5],
    extra_data: Vec<ExtraDataBlock>,
}

impl ShellLink {
    /// Create an empty record: no optional fields, no presence bits
    pub fn new() -> Self {
        Self::default()
    }

    /// The fixed header
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Mutable header access
    ///
    /// The guard may replace the header wholesale; presence bits are derived
    /// from the fields again when it drops.
    pub fn header_mut(&mut self) -> HeaderMut<'_> {
        HeaderMut { link: self }
    }

    /// Identifier chain
    pub fn id_list(&self) -> Option<&IdList> {
        self.id_list.as_ref()
    }

    /// Set or clear the identifier chain
    pub fn set_id_list(&mut self, id_list: Option<IdList>) {
        self.update_flag(LinkFlags::HAS_LINK_TARGET_ID_LIST, &id_list);
        self.id_list = id_list;
    }

    /// Link-target description
    pub fn link_info(&self) -> Option<&LinkInfo> {
        self.link_info.as_ref()
    }

    /// Set or clear the link-target description
    pub fn set_link_info(&mut self, link_info: Option<LinkInfo>) {
        self.update_flag(LinkFlags::HAS_LINK_INFO, &link_info);
        self.link_info = link_info;
    }

    /// One of the flag-gated strings
    pub fn string(&self, field: StringField) -> Option<&str> {
        self.strings[field.index()].as_deref()
    }

    /// Assign a flag-gated string; an empty value clears the field
    pub fn set_string<S: Into<String>>(&mut self, field: StringField, value: S) {
        let value = value.into();
        self.update_flag(field.flag(), value.as_str());
        self.strings[field.index()] = if value.is_empty() { None } else { Some(value) };
    }

    /// Clear a flag-gated string
    pub fn clear_string(&mut self, field: StringField) {
        self.set_string(field, String::new());
    }

    /// Description string
    pub fn name(&self) -> Option<&str> {
        self.string(StringField::Name)
    }

    /// Set the description string
    pub fn set_name<S: Into<String>>(&mut self, value: S) {
        self.set_string(StringField::Name, value);
    }

    /// Path of the target relative to the link
    pub fn relative_path(&self) -> Option<&str> {
        self.string(StringField::RelativePath)
    }

    /// Set the relative path
    pub fn set_relative_path<S: Into<String>>(&mut self, value: S) {
        self.set_string(StringField::RelativePath, value);
    }

    /// Working directory
    pub fn working_dir(&self) -> Option<&str> {
        self.string(StringField::WorkingDir)
    }

    /// Set the working directory
    pub fn set_working_dir<S: Into<String>>(&mut self, value: S) {
        self.set_string(StringField::WorkingDir, value);
    }

    /// Command line arguments
    pub fn arguments(&self) -> Option<&str> {
        self.string(StringField::Arguments)
    }

    /// Set the command line arguments
    pub fn set_arguments<S: Into<String>>(&mut self, value: S) {
        self.set_string(StringField::Arguments, value);
    }

    /// Icon location
    pub fn icon_location(&self) -> Option<&str> {
        self.string(StringField::IconLocation)
    }

    /// Set the icon location
    pub fn set_icon_location<S: Into<String>>(&mut self, value: S) {
        self.set_string(StringField::IconLocation, value);
    }

    /// Extra data blocks in stream order
    pub fn extra_data(&self) -> &[ExtraDataBlock] {
        &self.extra_data
    }

    /// Mutable extra data list; it has no governing flag
    pub fn extra_data_mut(&mut self) -> &mut Vec<ExtraDataBlock> {
        &mut self.extra_data
    }

    /// Append an extra data block
    pub fn push_extra_data(&mut self, block: ExtraDataBlock) {
        self.extra_data.push(block);
    }

    /// Whether strings are written as UTF-16LE
    pub fn is_unicode(&self) -> bool {
        self.header.is_unicode()
    }

    /// Choose UTF-16LE (true) or the legacy 8-bit encoding for strings
    pub fn set_unicode(&mut self, unicode: bool) {
        self.header.set_option(LinkFlags::IS_UNICODE, unicode);
    }

    /// Header option bits combined with presence bits computed from the fields
    pub fn derived_flags(&self) -> LinkFlags {
        let options = self.header.link_flags().as_u32() & !LinkFlags::PRESENCE_MASK;
        let mut flags = LinkFlags::new(options)
            .updated(LinkFlags::HAS_LINK_TARGET_ID_LIST, &self.id_list)
            .updated(LinkFlags::HAS_LINK_INFO, &self.link_info);
        for field in StringField::ALL {
            flags = flags.updated(field.flag(), &self.strings[field.index()]);
        }
        flags
    }

    fn update_flag<T: crate::flags::Presence + ?Sized>(&mut self, flag: u32, value: &T) {
        let flags = self.header.link_flags().updated(flag, value);
        self.header.set_link_flags(flags);
    }

    fn sync_flags(&mut self) {
        let flags = self.derived_flags();
        self.header.set_link_flags(flags);
    }

    /// Replace the header wholesale, keeping presence bits consistent with the fields
    pub(crate) fn install_header(&mut self, header: Header) {
        *self.header_mut() = header;
    }
}

/// Write guard returned by [`ShellLink::header_mut`]
pub struct HeaderMut<'a> {
    link: &'a mut ShellLink,
}

impl Deref for HeaderMut<'_> {
    type Target = Header;

    fn deref(&self) -> &Header {
        &self.link.header
    }
}

impl DerefMut for HeaderMut<'_> {
    fn deref_mut(&mut self) -> &mut Header {
        &mut self.link.header
    }
}

impl Drop for HeaderMut<'_> {
    fn drop(&mut self) {
        self.link.sync_flags();
    }
}

impl fmt::Display for ShellLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.header)?;
        if let Some(id_list) = &self.id_list {
            writeln!(f, "{}", id_list)?;
        }
        if let Some(info) = &self.link_info {
            writeln!(f, "{}", info)?;
        }
        for block in &self.extra_data {
            writeln!(f, "{}", block)?;
        }
        writeln!(f, ">>File")?;
        for field in StringField::ALL {
            writeln!(f, "{}: {}", field.label(), self.string(field).unwrap_or(""))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_new_is_empty() {
        let link = ShellLink::new();
        assert_eq!(link.header().link_flags().as_u32(), 0);
        assert!(link.extra_data().is_empty());
        assert!(link.id_list().is_none());
        assert!(link.name().is_none());
    }

    #[test]
    fn test_name_flag_follows_value() {
        let mut link = ShellLink::new();
        link.set_name("Notepad");
        assert!(link.header().link_flags().contains(LinkFlags::HAS_NAME));
        link.set_name("");
        assert!(!link.header().link_flags().contains(LinkFlags::HAS_NAME));
        assert!(link.name().is_none());
        link.set_name("again");
        assert!(link.header().link_flags().contains(LinkFlags::HAS_NAME));
    }

    #[test]
    fn test_each_string_owns_its_bit() {
        let mut link = ShellLink::new();
        for field in StringField::ALL {
            link.set_string(field, "x");
        }
        assert_eq!(link.header().link_flags().presence(), 0x7C);
        link.clear_string(StringField::WorkingDir);
        assert_eq!(link.header().link_flags().presence(), 0x6C);
    }

    #[test]
    fn test_structured_fields_flags() {
        let mut link = ShellLink::new();
        link.set_link_info(Some(LinkInfo::from_body(Bytes::from_static(&[0u8; 24]))));
        link.set_id_list(Some(IdList::default()));
        assert!(link.header().link_flags().has_link_info());
        assert!(link.header().link_flags().has_id_list());
        link.set_link_info(None);
        assert!(!link.header().link_flags().has_link_info());
    }

    #[test]
    fn test_set_option_cannot_touch_presence() {
        let mut link = ShellLink::new();
        link.header_mut()
            .set_option(LinkFlags::HAS_NAME | LinkFlags::RUN_AS_USER, true);
        let flags = link.header().link_flags();
        assert!(!flags.contains(LinkFlags::HAS_NAME));
        assert!(flags.contains(LinkFlags::RUN_AS_USER));
    }

    #[test]
    fn test_unicode_toggle() {
        let mut link = ShellLink::new();
        link.set_unicode(true);
        assert!(link.is_unicode());
        link.set_unicode(false);
        assert!(!link.is_unicode());
    }

    #[test]
    fn test_header_replacement_keeps_presence_bits() {
        let mut donor = ShellLink::new();
        donor.set_arguments("--donor");
        donor.header_mut().set_option(LinkFlags::RUN_AS_USER, true);

        let mut link = ShellLink::new();
        link.set_name("Calc");
        *link.header_mut() = donor.header().clone();

        let flags = link.header().link_flags();
        assert!(flags.contains(LinkFlags::HAS_NAME));
        assert!(!flags.contains(LinkFlags::HAS_ARGUMENTS));
        assert!(flags.contains(LinkFlags::RUN_AS_USER));
        assert_eq!(flags, link.derived_flags());

        *link.header_mut() = Header::default();
        assert_eq!(link.header().link_flags().as_u32(), LinkFlags::HAS_NAME);
    }

    #[test]
    fn test_header_guard_field_writes() {
        let mut link = ShellLink::new();
        link.set_working_dir("C:\\");
        {
            let mut header = link.header_mut();
            header.file_size = 9;
            header.hotkey = 0x0241;
        }
        assert_eq!(link.header().file_size, 9);
        assert_eq!(link.header().link_flags().presence(), LinkFlags::HAS_WORKING_DIR);
    }

    #[test]
    fn test_filetime_far_future_clamps() {
        let far = Utc.with_ymd_and_hms(200_000, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(FileTime::from_datetime(far), FileTime::new(u64::MAX));
    }

    #[test]
    fn test_filetime_epoch_is_unset() {
        assert!(FileTime::EPOCH.is_unset());
        assert_eq!(FileTime::EPOCH.to_datetime().naive_utc(), FileTime::epoch_datetime());
        assert!(!FileTime::new(132_000_000_000_000_000).is_unset());
    }

    #[test]
    fn test_filetime_unix_epoch() {
        let ft = FileTime::new(116_444_736_000_000_000);
        assert_eq!(ft.to_datetime().timestamp(), 0);
        assert_eq!(FileTime::from_datetime(ft.to_datetime()), ft);
    }

    #[test]
    fn test_display_lists_strings() {
        let mut link = ShellLink::new();
        link.set_arguments("--help");
        let text = link.to_string();
        assert!(text.contains(">>Header"));
        assert!(text.contains("Arguments: --help"));
        assert!(text.contains("HasArguments"));
    }
}
