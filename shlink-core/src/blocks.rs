//! Self-describing sub-blocks carried by a Shell Link record
//!
//! The record codec treats these as opaque: it only relies on each block's
//! size prefix to know how far to advance. Bodies are kept verbatim so a
//! decoded record re-encodes to the same bytes.

use crate::constants::{signatures, MIN_EXTRA_DATA_SIZE};
use crate::error::{LinkError, ReadContext};
use crate::identifier::Identifier;
use crate::Result;
use byteorder::{LittleEndian, ReadBytesExt};
use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;
use std::io::{Cursor, Read};
use uuid::Uuid;

/// Uniform read/write contract for a size-prefixed block
pub trait Block: Sized {
    /// Number of bytes the block occupies on disk, size prefix included
    fn byte_len(&self) -> usize;

    /// Read one block; `Ok(None)` when the size prefix marks a list terminator
    fn read_from<R: Read>(reader: &mut R) -> Result<Option<Self>>;

    /// Append the block's on-disk form to `buf`
    fn write_to(&self, buf: &mut BytesMut);
}

/// Read exactly `len` bytes without trusting `len` for the allocation
pub(crate) fn read_body<R: Read>(reader: &mut R, len: usize, what: &str) -> Result<Bytes> {
    let mut body = Vec::new();
    reader.take(len as u64).read_to_end(&mut body)?;
    if body.len() != len {
        return Err(LinkError::truncated(what));
    }
    Ok(Bytes::from(body))
}

/// Link-target description (LinkInfo)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LinkInfo {
    body: Bytes,
}

impl LinkInfo {
    /// Wrap the bytes that follow the u32 size prefix
    pub fn from_body(body: Bytes) -> Self {
        Self { body }
    }

    /// Bytes after the size prefix
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// LinkInfoHeaderSize field, when the body is long enough to hold it
    pub fn header_size(&self) -> Option<u32> {
        le_u32(&self.body, 0)
    }

    /// LinkInfoFlags field (volume id / network share bits)
    pub fn flags(&self) -> Option<u32> {
        le_u32(&self.body, 4)
    }
}

impl Block for LinkInfo {
    fn byte_len(&self) -> usize {
        4 + self.body.len()
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Option<Self>> {
        let size = reader.read_u32::<LittleEndian>().context("link info size")?;
        if size < 4 {
            return Err(LinkError::InvalidStructure(format!(
                "LinkInfo size {} is smaller than its own prefix",
                size
            )));
        }
        let body = read_body(reader, size as usize - 4, "link info")?;
        Ok(Some(Self { body }))
    }

    fn write_to(&self, buf: &mut BytesMut) {
        buf.put_u32_le(self.byte_len() as u32);
        buf.put_slice(&self.body);
    }
}

impl fmt::Display for LinkInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, ">>LinkInfo")?;
        write!(f, "Size: {} bytes", self.byte_len())?;
        if let Some(flags) = self.flags() {
            write!(f, ", flags 0x{:08X}", flags)?;
        }
        Ok(())
    }
}

/// One entry of the identifier chain (ItemID)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemId {
    data: Bytes,
}

impl ItemId {
    /// Largest body an entry's u16 size prefix can describe
    pub const MAX_DATA_LEN: usize = u16::MAX as usize - 2;

    /// Create an entry from its shell-defined data
    pub fn new(data: Bytes) -> Result<Self> {
        if data.is_empty() || data.len() > Self::MAX_DATA_LEN {
            return Err(LinkError::InvalidArgument(format!(
                "ItemID data must be 1..={} bytes, got {}",
                Self::MAX_DATA_LEN,
                data.len()
            )));
        }
        Ok(Self { data })
    }

    /// Shell-defined data after the size prefix
    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

impl Block for ItemId {
    fn byte_len(&self) -> usize {
        2 + self.data.len()
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Option<Self>> {
        let size = reader.read_u16::<LittleEndian>().context("item id size")?;
        match size {
            0 => Ok(None),
            1 | 2 => Err(LinkError::InvalidStructure(format!(
                "ItemID size {} leaves no data",
                size
            ))),
            _ => {
                let data = read_body(reader, size as usize - 2, "item id")?;
                Ok(Some(Self { data }))
            }
        }
    }

    fn write_to(&self, buf: &mut BytesMut) {
        buf.put_u16_le(self.byte_len() as u16);
        buf.put_slice(&self.data);
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ">>ItemID: {} bytes", self.byte_len())?;
        if let Some(kind) = self.data.first() {
            write!(f, ", type 0x{:02X}", kind)?;
        }
        Ok(())
    }
}

/// The identifier chain (LinkTargetIDList)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IdList {
    items: Vec<ItemId>,
}

impl IdList {
    /// Build a list from its entries
    pub fn new(items: Vec<ItemId>) -> Self {
        Self { items }
    }

    /// Entries in stream order
    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    /// Append an entry
    pub fn push(&mut self, item: ItemId) {
        self.items.push(item);
    }

    /// Value of the IDListSize field: entries plus the 2-byte terminator
    pub fn list_size(&self) -> usize {
        self.items.iter().map(Block::byte_len).sum::<usize>() + 2
    }
}

impl Block for IdList {
    fn byte_len(&self) -> usize {
        2 + self.list_size()
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Option<Self>> {
        let size = reader.read_u16::<LittleEndian>().context("id list size")?;
        let region = read_body(reader, size as usize, "id list")?;

        let mut cursor = Cursor::new(region.as_ref());
        let mut items = Vec::new();
        loop {
            match ItemId::read_from(&mut cursor) {
                Ok(Some(item)) => items.push(item),
                Ok(None) => break,
                Err(e) if e.is_truncation() => {
                    return Err(LinkError::InvalidStructure(format!(
                        "ItemID entries overrun IDListSize {}",
                        size
                    )));
                }
                Err(e) => return Err(e),
            }
        }

        #[cfg(feature = "logging")]
        if (cursor.position() as usize) < region.len() {
            tracing::warn!(
                "Ignoring {} bytes after the ID list terminator",
                region.len() - cursor.position() as usize
            );
        }

        Ok(Some(Self { items }))
    }

    fn write_to(&self, buf: &mut BytesMut) {
        buf.put_u16_le(self.list_size() as u16);
        for item in &self.items {
            item.write_to(buf);
        }
        buf.put_u16_le(0);
    }
}

impl fmt::Display for IdList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ">>IDList: {} entries", self.items.len())?;
        for item in &self.items {
            write!(f, "\n{}", item)?;
        }
        Ok(())
    }
}

/// Known extra data block types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtraDataKind {
    /// Environment variables target path
    EnvironmentVariable,
    /// Console properties
    Console,
    /// Link tracker data
    Tracker,
    /// Console code page
    ConsoleFe,
    /// Special folder
    SpecialFolder,
    /// Darwin identifier
    Darwin,
    /// Icon environment path
    IconEnvironment,
    /// Shim layer
    Shim,
    /// Property store
    PropertyStore,
    /// Known folder
    KnownFolder,
    /// Vista and above ID list
    VistaAndAboveIdList,
    /// Unrecognised signature
    Unknown(u32),
}

impl ExtraDataKind {
    /// Classify a block signature
    pub const fn from_signature(signature: u32) -> Self {
        match signature {
            signatures::ENVIRONMENT_VARIABLE => ExtraDataKind::EnvironmentVariable,
            signatures::CONSOLE => ExtraDataKind::Console,
            signatures::TRACKER => ExtraDataKind::Tracker,
            signatures::CONSOLE_FE => ExtraDataKind::ConsoleFe,
            signatures::SPECIAL_FOLDER => ExtraDataKind::SpecialFolder,
            signatures::DARWIN => ExtraDataKind::Darwin,
            signatures::ICON_ENVIRONMENT => ExtraDataKind::IconEnvironment,
            signatures::SHIM => ExtraDataKind::Shim,
            signatures::PROPERTY_STORE => ExtraDataKind::PropertyStore,
            signatures::KNOWN_FOLDER => ExtraDataKind::KnownFolder,
            signatures::VISTA_AND_ABOVE_ID_LIST => ExtraDataKind::VistaAndAboveIdList,
            other => ExtraDataKind::Unknown(other),
        }
    }

    /// Block name used in dumps
    pub const fn name(&self) -> &'static str {
        match self {
            ExtraDataKind::EnvironmentVariable => "EnvironmentVariableDataBlock",
            ExtraDataKind::Console => "ConsoleDataBlock",
            ExtraDataKind::Tracker => "TrackerDataBlock",
            ExtraDataKind::ConsoleFe => "ConsoleFEDataBlock",
            ExtraDataKind::SpecialFolder => "SpecialFolderDataBlock",
            ExtraDataKind::Darwin => "DarwinDataBlock",
            ExtraDataKind::IconEnvironment => "IconEnvironmentDataBlock",
            ExtraDataKind::Shim => "ShimDataBlock",
            ExtraDataKind::PropertyStore => "PropertyStoreDataBlock",
            ExtraDataKind::KnownFolder => "KnownFolderDataBlock",
            ExtraDataKind::VistaAndAboveIdList => "VistaAndAboveIDListDataBlock",
            ExtraDataKind::Unknown(_) => "UnknownDataBlock",
        }
    }
}

/// One tail-appended extra data block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraDataBlock {
    signature: u32,
    data: Bytes,
}

impl ExtraDataBlock {
    /// Create a block from its signature and the bytes after it
    pub fn new(signature: u32, data: Bytes) -> Self {
        Self { signature, data }
    }

    /// Block signature
    pub fn signature(&self) -> u32 {
        self.signature
    }

    /// Bytes after the signature
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Classified block type
    pub fn kind(&self) -> ExtraDataKind {
        ExtraDataKind::from_signature(self.signature)
    }

    /// Parse a tracker block; `None` for any other block or a short body
    pub fn tracker(&self) -> Option<TrackerData> {
        if self.signature != signatures::TRACKER {
            return None;
        }
        TrackerData::parse(&self.data)
    }
}

impl Block for ExtraDataBlock {
    fn byte_len(&self) -> usize {
        8 + self.data.len()
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Option<Self>> {
        let size = reader
            .read_u32::<LittleEndian>()
            .context("extra data block size")?;
        if size < MIN_EXTRA_DATA_SIZE {
            return Ok(None);
        }
        if size < 8 {
            return Err(LinkError::InvalidStructure(format!(
                "Extra data block size {} leaves no room for a signature",
                size
            )));
        }
        let signature = reader
            .read_u32::<LittleEndian>()
            .context("extra data signature")?;
        let data = read_body(reader, size as usize - 8, "extra data block")?;
        Ok(Some(Self { signature, data }))
    }

    fn write_to(&self, buf: &mut BytesMut) {
        buf.put_u32_le(self.byte_len() as u32);
        buf.put_u32_le(self.signature);
        buf.put_slice(&self.data);
    }
}

impl fmt::Display for ExtraDataBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, ">>{}", self.kind().name())?;
        write!(
            f,
            "Signature: 0x{:08X}, Size: {} bytes",
            self.signature,
            self.byte_len()
        )?;
        if let Some(tracker) = self.tracker() {
            write!(f, "\n{}", tracker)?;
        }
        Ok(())
    }
}

/// Distributed link tracking data from a tracker block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerData {
    /// NetBIOS name of the machine that last held the target
    pub machine_id: String,
    /// Volume object identifier
    pub droid_volume: Uuid,
    /// File object identifier
    pub droid_file: Uuid,
    /// Volume identifier at creation
    pub birth_volume: Uuid,
    /// File identifier at creation
    pub birth_file: Uuid,
}

impl TrackerData {
    // Length + Version + MachineID + Droid + DroidBirth
    const BODY_LEN: usize = 4 + 4 + 16 + 32 + 32;

    fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < Self::BODY_LEN {
            return None;
        }
        let machine = &data[8..24];
        let end = machine.iter().position(|&b| b == 0).unwrap_or(machine.len());
        let machine_id = machine[..end].iter().map(|&b| b as char).collect();

        let guid = |offset: usize| {
            let mut raw = [0u8; 16];
            raw.copy_from_slice(&data[offset..offset + 16]);
            Uuid::from_bytes_le(raw)
        };

        Some(Self {
            machine_id,
            droid_volume: guid(24),
            droid_file: guid(40),
            birth_volume: guid(56),
            birth_file: guid(72),
        })
    }

    /// Decode the file droid: creation time and MAC address of the creating host
    pub fn file_identifier(&self) -> Identifier {
        Identifier::parse(&self.droid_file.to_string())
    }

    /// Decode the birth file droid
    pub fn birth_identifier(&self) -> Identifier {
        Identifier::parse(&self.birth_file.to_string())
    }
}

impl fmt::Display for TrackerData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "MachineID: {}", self.machine_id)?;
        writeln!(f, "Droid: {} {}", self.droid_volume, self.droid_file)?;
        writeln!(f, "DroidBirth: {} {}", self.birth_volume, self.birth_file)?;
        write!(f, "{}", self.file_identifier())
    }
}

fn le_u32(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode<B: Block>(block: &B) -> BytesMut {
        let mut buf = BytesMut::new();
        block.write_to(&mut buf);
        buf
    }

    #[test]
    fn test_link_info_size_prefix() {
        let info = LinkInfo::from_body(Bytes::from_static(&[0x1C, 0, 0, 0, 1, 0, 0, 0]));
        let buf = encode(&info);
        assert_eq!(&buf[0..4], &12u32.to_le_bytes());
        assert_eq!(info.header_size(), Some(0x1C));
        assert_eq!(info.flags(), Some(1));

        let decoded = LinkInfo::read_from(&mut Cursor::new(&buf[..])).unwrap();
        assert_eq!(decoded, Some(info));
    }

    #[test]
    fn test_link_info_rejects_tiny_size() {
        let raw = 2u32.to_le_bytes();
        let err = LinkInfo::read_from(&mut Cursor::new(&raw[..])).unwrap_err();
        assert!(matches!(err, LinkError::InvalidStructure(_)));
    }

    #[test]
    fn test_link_info_truncated_body() {
        let mut raw = 100u32.to_le_bytes().to_vec();
        raw.extend_from_slice(&[0u8; 10]);
        let err = LinkInfo::read_from(&mut Cursor::new(&raw[..])).unwrap_err();
        assert!(err.is_truncation());
    }

    #[test]
    fn test_id_list_layout() {
        let list = IdList::new(vec![
            ItemId::new(Bytes::from_static(&[0x1F, 0x50])).unwrap(),
            ItemId::new(Bytes::from_static(&[0x2F, 0x43, 0x3A])).unwrap(),
        ]);
        let buf = encode(&list);
        // size prefix: 4 + 5 + terminator 2
        assert_eq!(&buf[0..2], &11u16.to_le_bytes());
        assert_eq!(&buf[buf.len() - 2..], &[0, 0]);
        assert_eq!(buf.len(), list.byte_len());

        let decoded = IdList::read_from(&mut Cursor::new(&buf[..])).unwrap().unwrap();
        assert_eq!(decoded.items().len(), 2);
        assert_eq!(decoded, list);
    }

    #[test]
    fn test_id_list_overrun_is_structural() {
        // IDListSize 4 but the entry claims 10 bytes
        let raw = [4u8, 0, 10, 0, 0xAA, 0xBB];
        let err = IdList::read_from(&mut Cursor::new(&raw[..])).unwrap_err();
        assert!(matches!(err, LinkError::InvalidStructure(_)));
    }

    #[test]
    fn test_item_id_rejects_empty() {
        assert!(ItemId::new(Bytes::new()).is_err());
    }

    #[test]
    fn test_extra_data_terminator() {
        let raw = [0u8; 4];
        let block = ExtraDataBlock::read_from(&mut Cursor::new(&raw[..])).unwrap();
        assert!(block.is_none());
    }

    #[test]
    fn test_extra_data_round_trip() {
        let block = ExtraDataBlock::new(
            signatures::SPECIAL_FOLDER,
            Bytes::from_static(&[1, 2, 3, 4, 5, 6, 7, 8]),
        );
        let buf = encode(&block);
        assert_eq!(buf.len(), 16);
        assert_eq!(&buf[4..8], &0xA000_0005u32.to_le_bytes());
        let decoded = ExtraDataBlock::read_from(&mut Cursor::new(&buf[..]))
            .unwrap()
            .unwrap();
        assert_eq!(decoded.kind(), ExtraDataKind::SpecialFolder);
        assert_eq!(decoded, block);
    }

    #[test]
    fn test_extra_data_without_room_for_signature() {
        let raw = 6u32.to_le_bytes();
        let err = ExtraDataBlock::read_from(&mut Cursor::new(&raw[..])).unwrap_err();
        assert!(matches!(err, LinkError::InvalidStructure(_)));
    }

    #[test]
    fn test_tracker_block() {
        let droid = Uuid::parse_str("6c1fa1ce-1b1f-11e9-9f2a-000c29d6e5a1").unwrap();
        let mut data = Vec::new();
        data.extend_from_slice(&0x58u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        let mut machine = [0u8; 16];
        machine[..7].copy_from_slice(b"desktop");
        data.extend_from_slice(&machine);
        for _ in 0..4 {
            data.extend_from_slice(&droid.to_bytes_le());
        }
        let block = ExtraDataBlock::new(signatures::TRACKER, Bytes::from(data));

        let tracker = block.tracker().unwrap();
        assert_eq!(tracker.machine_id, "desktop");
        assert_eq!(tracker.droid_file, droid);

        let id = tracker.file_identifier();
        assert_eq!(id.mac_address(), "00:0c:29:d6:e5:a1");
        assert_eq!(id.clock_id(), 0x9f2a);
        assert!(id.timestamp().is_some());
    }

    #[test]
    fn test_tracker_rejects_other_signature() {
        let block = ExtraDataBlock::new(signatures::SHIM, Bytes::from(vec![0u8; 88]));
        assert!(block.tracker().is_none());
    }
}
