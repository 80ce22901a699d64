//! Shell Link decoding
//!
//! The header's presence bits are trusted: a part is read only when its bit
//! is set, in the same order the encoder writes them. Every part after the
//! header is sized by its own prefix, so a short stream fails with
//! [`LinkError::Truncated`] naming the part that ran out.

use crate::blocks::{Block, ExtraDataBlock, IdList, LinkInfo};
use crate::constants::{
    FileAttributes, LinkFlags, ShowCommand, HEADER_SIZE, HEADER_SIZE_FIELD, LINK_CLSID,
};
use crate::error::{LinkError, ReadContext};
use crate::flags::StringField;
use crate::types::{FileTime, Header, ShellLink};
use crate::Result;
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};

#[cfg(feature = "logging")]
use tracing::debug;

/// Parse a complete 76-byte header
///
/// Fails with [`LinkError::BadHeaderSize`] or [`LinkError::BadClsid`] when the
/// bytes do not describe a Shell Link header.
pub fn decode_header(buf: &[u8; HEADER_SIZE]) -> Result<Header> {
    read_header(&mut Cursor::new(&buf[..]))
}

fn read_header<R: Read>(reader: &mut R) -> Result<Header> {
    let size = reader.read_u32::<LittleEndian>().context("header size")?;
    if size != HEADER_SIZE_FIELD {
        return Err(LinkError::BadHeaderSize(size));
    }

    let mut clsid = [0u8; 16];
    reader.read_exact(&mut clsid).context("link CLSID")?;
    if clsid != LINK_CLSID {
        return Err(LinkError::BadClsid(clsid));
    }

    let mut rest = [0u8; HEADER_SIZE - 20];
    reader.read_exact(&mut rest).context("header")?;
    let mut cur = Cursor::new(&rest[..]);

    // The buffer is exactly the remaining header, so these reads cannot run short
    let header = Header {
        link_flags: LinkFlags::new(cur.read_u32::<LittleEndian>()?),
        file_attributes: FileAttributes::new(cur.read_u32::<LittleEndian>()?),
        creation_time: FileTime::new(cur.read_u64::<LittleEndian>()?),
        access_time: FileTime::new(cur.read_u64::<LittleEndian>()?),
        write_time: FileTime::new(cur.read_u64::<LittleEndian>()?),
        file_size: cur.read_u32::<LittleEndian>()?,
        icon_index: cur.read_i32::<LittleEndian>()?,
        show_command: ShowCommand::from_u32(cur.read_u32::<LittleEndian>()?),
        hotkey: cur.read_u16::<LittleEndian>()?,
        reserved1: cur.read_u16::<LittleEndian>()?,
        reserved2: cur.read_u32::<LittleEndian>()?,
        reserved3: cur.read_u32::<LittleEndian>()?,
    };

    Ok(header)
}

/// Decode one record from a reader positioned at its first byte
///
/// On error the reader is left wherever the failure happened; the caller
/// should discard it along with the error.
pub fn decode_link<R: Read>(reader: &mut R) -> Result<ShellLink> {
    let header = read_header(reader)?;
    let flags = header.link_flags();
    let unicode = flags.is_unicode();

    let mut link = ShellLink::new();
    link.install_header(header);

    if flags.has_id_list() {
        link.set_id_list(IdList::read_from(reader).context("id list")?);
    }

    if flags.has_link_info() {
        link.set_link_info(LinkInfo::read_from(reader).context("link info")?);
    }

    for field in StringField::ALL {
        if flags.contains(field.flag()) {
            let value = read_string(reader, unicode, field.label())?;
            link.set_string(field, value);
        }
    }

    while let Some(block) = ExtraDataBlock::read_from(reader)? {
        link.push_extra_data(block);
    }

    #[cfg(feature = "logging")]
    debug!(
        "Decoded link: flags 0x{:08X}, {} extra data blocks",
        link.header().link_flags().as_u32(),
        link.extra_data().len()
    );

    Ok(link)
}

/// Read a u16 count of code units followed by the characters
fn read_string<R: Read>(reader: &mut R, unicode: bool, what: &str) -> Result<String> {
    let count = reader.read_u16::<LittleEndian>().context(what)? as usize;
    if unicode {
        let mut raw = vec![0u8; count * 2];
        reader.read_exact(&mut raw).context(what)?;
        let units: Vec<u16> = raw
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Ok(String::from_utf16_lossy(&units))
    } else {
        let mut raw = vec![0u8; count];
        reader.read_exact(&mut raw).context(what)?;
        // legacy strings are treated as ISO-8859-1
        Ok(raw.iter().map(|&b| b as char).collect())
    }
}

/// Decode a record from a byte slice
pub fn decode_link_from_bytes(data: &[u8]) -> Result<ShellLink> {
    let mut cursor = Cursor::new(data);
    decode_link(&mut cursor)
}

/// Decode a record at the start of `data`, returning the number of bytes consumed
///
/// Trailing bytes after the extra data terminator are left untouched, which
/// is what a caller walking a larger buffer needs to advance.
pub fn try_decode_link(data: &[u8]) -> Result<(ShellLink, usize)> {
    let mut cursor = Cursor::new(data);
    let link = decode_link(&mut cursor)?;
    Ok((link, cursor.position() as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{encode_link, ShellLinkBuilder};

    #[test]
    fn test_decode_minimal_link() {
        let encoded = encode_link(&ShellLink::new()).unwrap();
        assert_eq!(encoded.len(), HEADER_SIZE + 4);

        let decoded = decode_link_from_bytes(&encoded).unwrap();
        assert_eq!(decoded, ShellLink::new());
    }

    #[test]
    fn test_decode_bad_header_size() {
        let mut data = vec![0u8; 80];
        data[0] = 75;
        let result = decode_link_from_bytes(&data);
        assert!(matches!(result, Err(LinkError::BadHeaderSize(75))));
    }

    #[test]
    fn test_decode_bad_clsid() {
        let mut data = encode_link(&ShellLink::new()).unwrap().to_vec();
        data[19] = 0x47;
        let result = decode_link_from_bytes(&data);
        assert!(matches!(result, Err(LinkError::BadClsid(_))));
    }

    #[test]
    fn test_decode_empty_input_is_truncation() {
        let err = decode_link_from_bytes(&[]).unwrap_err();
        assert!(err.is_truncation());
    }

    #[test]
    fn test_truncated_string_names_field() {
        let link = ShellLinkBuilder::new()
            .unicode(true)
            .working_dir("C:\\Windows")
            .build();
        let encoded = encode_link(&link).unwrap();

        // cut inside the working directory characters
        let cut = &encoded[..HEADER_SIZE + 6];
        let err = decode_link_from_bytes(cut).unwrap_err();
        assert_eq!(
            err,
            LinkError::Truncated {
                context: "WorkingDirectory".to_string()
            }
        );
    }

    #[test]
    fn test_missing_terminator_is_truncation() {
        let encoded = encode_link(&ShellLink::new()).unwrap();
        let err = decode_link_from_bytes(&encoded[..HEADER_SIZE + 2]).unwrap_err();
        assert!(err.is_truncation());
    }

    #[test]
    fn test_try_decode_reports_consumed() {
        let link = ShellLinkBuilder::new().name("first").build();
        let mut data = encode_link(&link).unwrap().to_vec();
        let record_len = data.len();
        data.extend_from_slice(b"trailing bytes");

        let (decoded, consumed) = try_decode_link(&data).unwrap();
        assert_eq!(consumed, record_len);
        assert_eq!(decoded.name(), Some("first"));
    }

    #[test]
    fn test_header_fields() {
        let mut link = ShellLink::new();
        {
            let mut header = link.header_mut();
            header.file_size = 0x1234_5678;
            header.icon_index = -3;
            header.hotkey = 0x0241;
            header.show_command = ShowCommand::MinNoActive;
            header.creation_time = FileTime::new(1);
        }
        let encoded = encode_link(&link).unwrap();
        let mut raw = [0u8; HEADER_SIZE];
        raw.copy_from_slice(&encoded[..HEADER_SIZE]);

        let header = decode_header(&raw).unwrap();
        assert_eq!(header.file_size, 0x1234_5678);
        assert_eq!(header.icon_index, -3);
        assert_eq!(header.hotkey, 0x0241);
        assert_eq!(header.show_command, ShowCommand::MinNoActive);
        assert_eq!(header.creation_time, FileTime::new(1));
    }

    #[test]
    fn test_legacy_string_latin1() {
        let link = ShellLinkBuilder::new().arguments("caf\u{e9}").build();
        let encoded = encode_link(&link).unwrap();
        // 4 characters, one byte each
        assert_eq!(&encoded[HEADER_SIZE..HEADER_SIZE + 2], &4u16.to_le_bytes());
        assert_eq!(encoded[HEADER_SIZE + 5], 0xE9);

        let decoded = decode_link_from_bytes(&encoded).unwrap();
        assert_eq!(decoded.arguments(), Some("caf\u{e9}"));
    }
}
