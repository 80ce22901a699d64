//! Shell Link encoding

use crate::blocks::{Block, ExtraDataBlock, IdList, LinkInfo};
use crate::constants::{
    FileAttributes, LinkFlags, ShowCommand, HEADER_SIZE, HEADER_SIZE_FIELD, LINK_CLSID,
    MAX_STRING_UNITS, TERMINAL_BLOCK_SIZE,
};
use crate::error::LinkError;
use crate::flags::StringField;
use crate::types::{FileTime, Header, ShellLink};
use crate::Result;
use bytes::{BufMut, Bytes, BytesMut};
use std::io::Write;

/// Append the 76-byte header to `buf`, flags written as stored
pub fn encode_header(header: &Header, buf: &mut BytesMut) {
    put_header(header, header.link_flags(), buf);
}

fn put_header(header: &Header, flags: LinkFlags, buf: &mut BytesMut) {
    buf.put_u32_le(HEADER_SIZE_FIELD);
    buf.put_slice(&LINK_CLSID);
    buf.put_u32_le(flags.as_u32());
    buf.put_u32_le(header.file_attributes.as_u32());
    buf.put_u64_le(header.creation_time.ticks());
    buf.put_u64_le(header.access_time.ticks());
    buf.put_u64_le(header.write_time.ticks());
    buf.put_u32_le(header.file_size);
    buf.put_i32_le(header.icon_index);
    buf.put_u32_le(header.show_command.as_u32());
    buf.put_u16_le(header.hotkey);
    buf.put_u16_le(header.reserved1);
    buf.put_u32_le(header.reserved2);
    buf.put_u32_le(header.reserved3);
}

/// Encode a record into bytes
///
/// Layout:
/// 1. Header (76 bytes)
/// 2. Identifier chain, if present
/// 3. LinkInfo, if present
/// 4. Name, relative path, working directory, arguments, icon location,
///    each if present: u16 count of code units, then the characters
/// 5. Extra data blocks, then a 4-byte zero terminator
///
/// The identifier chain precedes LinkInfo because that is where every shell
/// link on disk stores it; the decoder reads the same order, and the jump
/// list scanner depends on matching real files.
///
/// Presence bits in the written flags are derived from the populated fields,
/// never copied from the stored header.
pub fn encode_link(link: &ShellLink) -> Result<Bytes> {
    let unicode = link.is_unicode();
    let mut buf = BytesMut::with_capacity(estimated_len(link));

    put_header(link.header(), link.derived_flags(), &mut buf);

    if let Some(id_list) = link.id_list() {
        if id_list.list_size() > u16::MAX as usize {
            return Err(LinkError::InvalidStructure(format!(
                "ID list of {} bytes exceeds the u16 size prefix",
                id_list.list_size()
            )));
        }
        id_list.write_to(&mut buf);
    }

    if let Some(info) = link.link_info() {
        info.write_to(&mut buf);
    }

    for field in StringField::ALL {
        if let Some(value) = link.string(field) {
            put_string(&mut buf, value, unicode)?;
        }
    }

    for block in link.extra_data() {
        block.write_to(&mut buf);
    }
    buf.put_u32_le(0);

    Ok(buf.freeze())
}

/// Encode a record and write it to `writer`, returning the byte count
///
/// The record is fully encoded before the first write, so an encoding
/// error leaves the writer untouched.
pub fn write_link<W: Write>(link: &ShellLink, writer: &mut W) -> Result<usize> {
    let encoded = encode_link(link)?;
    writer.write_all(&encoded)?;
    Ok(encoded.len())
}

fn put_string(buf: &mut BytesMut, value: &str, unicode: bool) -> Result<()> {
    if unicode {
        let units: Vec<u16> = value.encode_utf16().collect();
        if units.len() > MAX_STRING_UNITS {
            return Err(LinkError::StringTooLong(units.len()));
        }
        buf.put_u16_le(units.len() as u16);
        for unit in units {
            buf.put_u16_le(unit);
        }
    } else {
        let count = value.chars().count();
        if count > MAX_STRING_UNITS {
            return Err(LinkError::StringTooLong(count));
        }
        buf.put_u16_le(count as u16);
        for c in value.chars() {
            buf.put_u8(u8::try_from(c as u32).unwrap_or(b'?'));
        }
    }
    Ok(())
}

fn estimated_len(link: &ShellLink) -> usize {
    let strings: usize = StringField::ALL
        .iter()
        .filter_map(|f| link.string(*f))
        .map(|s| 2 + s.len() * 2)
        .sum();
    HEADER_SIZE
        + link.id_list().map_or(0, Block::byte_len)
        + link.link_info().map_or(0, Block::byte_len)
        + strings
        + link.extra_data().iter().map(Block::byte_len).sum::<usize>()
        + TERMINAL_BLOCK_SIZE
}

/// Builder for constructing records
pub struct ShellLinkBuilder {
    link: ShellLink,
}

impl ShellLinkBuilder {
    /// Start from an empty record
    pub fn new() -> Self {
        Self {
            link: ShellLink::new(),
        }
    }

    /// Store strings as UTF-16LE
    pub fn unicode(mut self, unicode: bool) -> Self {
        self.link.set_unicode(unicode);
        self
    }

    /// Set the description
    pub fn name(mut self, value: impl Into<String>) -> Self {
        self.link.set_name(value);
        self
    }

    /// Set the relative path
    pub fn relative_path(mut self, value: impl Into<String>) -> Self {
        self.link.set_relative_path(value);
        self
    }

    /// Set the working directory
    pub fn working_dir(mut self, value: impl Into<String>) -> Self {
        self.link.set_working_dir(value);
        self
    }

    /// Set the arguments
    pub fn arguments(mut self, value: impl Into<String>) -> Self {
        self.link.set_arguments(value);
        self
    }

    /// Set the icon location
    pub fn icon_location(mut self, value: impl Into<String>) -> Self {
        self.link.set_icon_location(value);
        self
    }

    /// Attach a link-target description
    pub fn link_info(mut self, info: LinkInfo) -> Self {
        self.link.set_link_info(Some(info));
        self
    }

    /// Attach an identifier chain
    pub fn id_list(mut self, id_list: IdList) -> Self {
        self.link.set_id_list(Some(id_list));
        self
    }

    /// Append an extra data block
    pub fn extra_data(mut self, block: ExtraDataBlock) -> Self {
        self.link.push_extra_data(block);
        self
    }

    /// Set the target attributes
    pub fn file_attributes(mut self, attributes: FileAttributes) -> Self {
        self.link.header_mut().file_attributes = attributes;
        self
    }

    /// Set creation, access and write times
    pub fn times(mut self, creation: FileTime, access: FileTime, write: FileTime) -> Self {
        {
            let mut header = self.link.header_mut();
            header.creation_time = creation;
            header.access_time = access;
            header.write_time = write;
        }
        self
    }

    /// Set the target size
    pub fn file_size(mut self, size: u32) -> Self {
        self.link.header_mut().file_size = size;
        self
    }

    /// Set the icon index
    pub fn icon_index(mut self, index: i32) -> Self {
        self.link.header_mut().icon_index = index;
        self
    }

    /// Set the window state
    pub fn show_command(mut self, command: ShowCommand) -> Self {
        self.link.header_mut().show_command = command;
        self
    }

    /// Set the hotkey
    pub fn hotkey(mut self, hotkey: u16) -> Self {
        self.link.header_mut().hotkey = hotkey;
        self
    }

    /// Finish and return the record
    pub fn build(self) -> ShellLink {
        self.link
    }

    /// Finish and encode
    pub fn encode(self) -> Result<Bytes> {
        encode_link(&self.link)
    }
}

impl Default for ShellLinkBuilder {
    fn default() -> Self {
        Self::new()
    }
}
