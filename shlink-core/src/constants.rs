//! Constants and flag vocabularies for the Shell Link format

use serde::{Deserialize, Serialize};

/// Fixed size of the Shell Link header in bytes
pub const HEADER_SIZE: usize = 76;

/// Header size as stored in the first four bytes of every record
pub const HEADER_SIZE_FIELD: u32 = HEADER_SIZE as u32;

/// Link CLSID {00021401-0000-0000-C000-000000000046} in on-disk byte order
pub const LINK_CLSID: [u8; 16] = [
    0x01, 0x14, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0xC0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x46,
];

/// Length field followed by the CLSID: the minimum a scanner must see to
/// recognise a header boundary
pub const SIGNATURE_LEN: usize = 4 + LINK_CLSID.len();

/// Size of the terminal block closing the extra data section
pub const TERMINAL_BLOCK_SIZE: usize = 4;

/// Extra data blocks smaller than this are terminators
pub const MIN_EXTRA_DATA_SIZE: u32 = 4;

/// Largest string length expressible by the u16 character count prefix
pub const MAX_STRING_UNITS: usize = u16::MAX as usize;

/// Difference between the FILETIME epoch (1601-01-01) and the Unix epoch in seconds
pub const FILETIME_UNIX_OFFSET_SECS: i64 = 11_644_473_600;

/// FILETIME ticks per second (100ns intervals)
pub const FILETIME_TICKS_PER_SEC: u64 = 10_000_000;

/// Extra data block signatures
pub mod signatures {
    /// Environment variables location block
    pub const ENVIRONMENT_VARIABLE: u32 = 0xA000_0001;
    /// Console window properties
    pub const CONSOLE: u32 = 0xA000_0002;
    /// Distributed link tracker data
    pub const TRACKER: u32 = 0xA000_0003;
    /// Console code page
    pub const CONSOLE_FE: u32 = 0xA000_0004;
    /// Special folder location
    pub const SPECIAL_FOLDER: u32 = 0xA000_0005;
    /// Darwin (MSI) application identifier
    pub const DARWIN: u32 = 0xA000_0006;
    /// Icon path with environment variables
    pub const ICON_ENVIRONMENT: u32 = 0xA000_0007;
    /// Shim layer name
    pub const SHIM: u32 = 0xA000_0008;
    /// Serialized property store
    pub const PROPERTY_STORE: u32 = 0xA000_0009;
    /// Known folder location
    pub const KNOWN_FOLDER: u32 = 0xA000_000B;
    /// Alternate ID list for Vista and later
    pub const VISTA_AND_ABOVE_ID_LIST: u32 = 0xA000_000C;
}

/// Link flags stored in the header
///
/// The `HAS_*` bits in [`LinkFlags::PRESENCE_MASK`] are owned by the record's
/// optional fields; everything else is a plain option bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkFlags(u32);

impl LinkFlags {
    /// No flags set
    pub const NONE: u32 = 0;

    /// An identifier chain (ItemID list) follows the header
    pub const HAS_LINK_TARGET_ID_LIST: u32 = 0x0000_0001;

    /// A link-target description (LinkInfo) is present
    pub const HAS_LINK_INFO: u32 = 0x0000_0002;

    /// Name string is present
    pub const HAS_NAME: u32 = 0x0000_0004;

    /// Relative path string is present
    pub const HAS_RELATIVE_PATH: u32 = 0x0000_0008;

    /// Working directory string is present
    pub const HAS_WORKING_DIR: u32 = 0x0000_0010;

    /// Arguments string is present
    pub const HAS_ARGUMENTS: u32 = 0x0000_0020;

    /// Icon location string is present
    pub const HAS_ICON_LOCATION: u32 = 0x0000_0040;

    /// Strings are stored as UTF-16LE instead of the legacy code page
    pub const IS_UNICODE: u32 = 0x0000_0080;

    /// LinkInfo is ignored by the shell
    pub const FORCE_NO_LINK_INFO: u32 = 0x0000_0100;

    /// An environment variables block is present
    pub const HAS_EXP_STRING: u32 = 0x0000_0200;

    /// 16-bit target runs in a separate VM
    pub const RUN_IN_SEPARATE_PROCESS: u32 = 0x0000_0400;

    /// A Darwin block is present
    pub const HAS_DARWIN_ID: u32 = 0x0000_1000;

    /// Target runs as a different user
    pub const RUN_AS_USER: u32 = 0x0000_2000;

    /// An icon environment block is present
    pub const HAS_EXP_ICON: u32 = 0x0000_4000;

    /// File system location is represented in the shell namespace
    pub const NO_PIDL_ALIAS: u32 = 0x0000_8000;

    /// A shim block is present
    pub const RUN_WITH_SHIM_LAYER: u32 = 0x0002_0000;

    /// Tracker block is ignored
    pub const FORCE_NO_LINK_TRACK: u32 = 0x0004_0000;

    /// Target properties are collected into the property store
    pub const ENABLE_TARGET_METADATA: u32 = 0x0008_0000;

    /// Environment variables block is ignored
    pub const DISABLE_LINK_PATH_TRACKING: u32 = 0x0010_0000;

    /// Special folder and known folder blocks are ignored
    pub const DISABLE_KNOWN_FOLDER_TRACKING: u32 = 0x0020_0000;

    /// Known folder ID list is not used on load
    pub const DISABLE_KNOWN_FOLDER_ALIAS: u32 = 0x0040_0000;

    /// The target may itself be a link
    pub const ALLOW_LINK_TO_LINK: u32 = 0x0080_0000;

    /// Unaliased target form is stored on save
    pub const UNALIAS_ON_SAVE: u32 = 0x0100_0000;

    /// Target path is taken from the environment block
    pub const PREFER_ENVIRONMENT_PATH: u32 = 0x0200_0000;

    /// Local ID list is kept for UNC targets
    pub const KEEP_LOCAL_ID_LIST_FOR_UNC_TARGET: u32 = 0x0400_0000;

    /// Bits whose value is derived from the presence of an optional field
    pub const PRESENCE_MASK: u32 = Self::HAS_LINK_TARGET_ID_LIST
        | Self::HAS_LINK_INFO
        | Self::HAS_NAME
        | Self::HAS_RELATIVE_PATH
        | Self::HAS_WORKING_DIR
        | Self::HAS_ARGUMENTS
        | Self::HAS_ICON_LOCATION;

    const NAMES: [(u32, &'static str); 25] = [
        (Self::HAS_LINK_TARGET_ID_LIST, "HasLinkTargetIDList"),
        (Self::HAS_LINK_INFO, "HasLinkInfo"),
        (Self::HAS_NAME, "HasName"),
        (Self::HAS_RELATIVE_PATH, "HasRelativePath"),
        (Self::HAS_WORKING_DIR, "HasWorkingDir"),
        (Self::HAS_ARGUMENTS, "HasArguments"),
        (Self::HAS_ICON_LOCATION, "HasIconLocation"),
        (Self::IS_UNICODE, "IsUnicode"),
        (Self::FORCE_NO_LINK_INFO, "ForceNoLinkInfo"),
        (Self::HAS_EXP_STRING, "HasExpString"),
        (Self::RUN_IN_SEPARATE_PROCESS, "RunInSeparateProcess"),
        (Self::HAS_DARWIN_ID, "HasDarwinID"),
        (Self::RUN_AS_USER, "RunAsUser"),
        (Self::HAS_EXP_ICON, "HasExpIcon"),
        (Self::NO_PIDL_ALIAS, "NoPidlAlias"),
        (Self::RUN_WITH_SHIM_LAYER, "RunWithShimLayer"),
        (Self::FORCE_NO_LINK_TRACK, "ForceNoLinkTrack"),
        (Self::ENABLE_TARGET_METADATA, "EnableTargetMetadata"),
        (Self::DISABLE_LINK_PATH_TRACKING, "DisableLinkPathTracking"),
        (Self::DISABLE_KNOWN_FOLDER_TRACKING, "DisableKnownFolderTracking"),
        (Self::DISABLE_KNOWN_FOLDER_ALIAS, "DisableKnownFolderAlias"),
        (Self::ALLOW_LINK_TO_LINK, "AllowLinkToLink"),
        (Self::UNALIAS_ON_SAVE, "UnaliasOnSave"),
        (Self::PREFER_ENVIRONMENT_PATH, "PreferEnvironmentPath"),
        (Self::KEEP_LOCAL_ID_LIST_FOR_UNC_TARGET, "KeepLocalIDListForUNCTarget"),
    ];

    /// Create new flags from a raw value
    pub const fn new(flags: u32) -> Self {
        Self(flags)
    }

    /// Get the raw value
    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    /// Check whether every bit of `flag` is set
    pub const fn contains(&self, flag: u32) -> bool {
        (self.0 & flag) == flag
    }

    /// Return a copy with `flag` set or cleared
    pub const fn with(self, flag: u32, on: bool) -> Self {
        if on {
            Self(self.0 | flag)
        } else {
            Self(self.0 & !flag)
        }
    }

    /// Check whether strings are stored as UTF-16LE
    pub const fn is_unicode(&self) -> bool {
        self.contains(Self::IS_UNICODE)
    }

    /// Check whether an identifier chain follows the header
    pub const fn has_id_list(&self) -> bool {
        self.contains(Self::HAS_LINK_TARGET_ID_LIST)
    }

    /// Check whether a LinkInfo block is present
    pub const fn has_link_info(&self) -> bool {
        self.contains(Self::HAS_LINK_INFO)
    }

    /// Only the presence bits
    pub const fn presence(&self) -> u32 {
        self.0 & Self::PRESENCE_MASK
    }

    /// Names of all known bits that are set, in bit order
    pub fn names(&self) -> Vec<&'static str> {
        Self::NAMES
            .iter()
            .filter(|(bit, _)| self.contains(*bit))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl Default for LinkFlags {
    fn default() -> Self {
        Self(Self::NONE)
    }
}

/// File attribute bits copied from the link target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FileAttributes(u32);

impl FileAttributes {
    /// Read-only file
    pub const READONLY: u32 = 0x0000_0001;
    /// Hidden file
    pub const HIDDEN: u32 = 0x0000_0002;
    /// System file
    pub const SYSTEM: u32 = 0x0000_0004;
    /// Directory
    pub const DIRECTORY: u32 = 0x0000_0010;
    /// Archive bit
    pub const ARCHIVE: u32 = 0x0000_0020;
    /// No other attributes
    pub const NORMAL: u32 = 0x0000_0080;
    /// Temporary file
    pub const TEMPORARY: u32 = 0x0000_0100;
    /// Sparse file
    pub const SPARSE_FILE: u32 = 0x0000_0200;
    /// Reparse point
    pub const REPARSE_POINT: u32 = 0x0000_0400;
    /// Compressed
    pub const COMPRESSED: u32 = 0x0000_0800;
    /// Data not immediately available
    pub const OFFLINE: u32 = 0x0000_1000;
    /// Not indexed by the content indexer
    pub const NOT_CONTENT_INDEXED: u32 = 0x0000_2000;
    /// Encrypted
    pub const ENCRYPTED: u32 = 0x0000_4000;

    const NAMES: [(u32, &'static str); 13] = [
        (Self::READONLY, "ReadOnly"),
        (Self::HIDDEN, "Hidden"),
        (Self::SYSTEM, "System"),
        (Self::DIRECTORY, "Directory"),
        (Self::ARCHIVE, "Archive"),
        (Self::NORMAL, "Normal"),
        (Self::TEMPORARY, "Temporary"),
        (Self::SPARSE_FILE, "SparseFile"),
        (Self::REPARSE_POINT, "ReparsePoint"),
        (Self::COMPRESSED, "Compressed"),
        (Self::OFFLINE, "Offline"),
        (Self::NOT_CONTENT_INDEXED, "NotContentIndexed"),
        (Self::ENCRYPTED, "Encrypted"),
    ];

    /// Create attributes from a raw value
    pub const fn new(bits: u32) -> Self {
        Self(bits)
    }

    /// Get the raw value
    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    /// Check whether every bit of `attr` is set
    pub const fn contains(&self, attr: u32) -> bool {
        (self.0 & attr) == attr
    }

    /// Check the directory bit
    pub const fn is_directory(&self) -> bool {
        self.contains(Self::DIRECTORY)
    }

    /// Names of all known bits that are set
    pub fn names(&self) -> Vec<&'static str> {
        Self::NAMES
            .iter()
            .filter(|(bit, _)| self.contains(*bit))
            .map(|(_, name)| *name)
            .collect()
    }
}

/// Window state for the launched target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ShowCommand {
    /// SW_SHOWNORMAL
    #[default]
    Normal,
    /// SW_SHOWMAXIMIZED
    Maximized,
    /// SW_SHOWMINNOACTIVE
    MinNoActive,
    /// Any other stored value
    Other(u32),
}

impl ShowCommand {
    /// Decode the stored value
    pub const fn from_u32(value: u32) -> Self {
        match value {
            1 => ShowCommand::Normal,
            3 => ShowCommand::Maximized,
            7 => ShowCommand::MinNoActive,
            other => ShowCommand::Other(other),
        }
    }

    /// Value written to the header
    pub const fn as_u32(&self) -> u32 {
        match self {
            ShowCommand::Normal => 1,
            ShowCommand::Maximized => 3,
            ShowCommand::MinNoActive => 7,
            ShowCommand::Other(v) => *v,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_sets_and_clears() {
        let flags = LinkFlags::default().with(LinkFlags::HAS_NAME, true);
        assert!(flags.contains(LinkFlags::HAS_NAME));
        let flags = flags.with(LinkFlags::HAS_NAME, false);
        assert_eq!(flags.as_u32(), 0);
    }

    #[test]
    fn test_presence_mask_excludes_unicode() {
        let flags = LinkFlags::new(LinkFlags::IS_UNICODE | LinkFlags::HAS_ARGUMENTS);
        assert_eq!(flags.presence(), LinkFlags::HAS_ARGUMENTS);
        assert!(flags.is_unicode());
    }

    #[test]
    fn test_flag_names() {
        let flags = LinkFlags::new(LinkFlags::HAS_NAME | LinkFlags::IS_UNICODE);
        assert_eq!(flags.names(), vec!["HasName", "IsUnicode"]);
    }

    #[test]
    fn test_show_command_round_trip() {
        for raw in [1u32, 3, 7, 5] {
            assert_eq!(ShowCommand::from_u32(raw).as_u32(), raw);
        }
        assert_eq!(ShowCommand::from_u32(2), ShowCommand::Other(2));
    }

    #[test]
    fn test_clsid_bytes() {
        assert_eq!(LINK_CLSID[0], 0x01);
        assert_eq!(LINK_CLSID[8], 0xC0);
        assert_eq!(LINK_CLSID[15], 0x46);
        assert_eq!(SIGNATURE_LEN, 20);
    }
}
