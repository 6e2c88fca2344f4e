//! Level-0 LZH container header parsing
//!
//! The header is a fixed little-endian field layout followed by a
//! variable-length filename and the compressed payload. Parsing is pure
//! metadata extraction: the checksum and CRC fields are carried through for
//! the caller but never verified against the payload.

use crate::error::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};

/// Method tag identifying the -lh5- compression scheme.
pub const LH5_METHOD: [u8; 5] = *b"-lh5-";

/// Parsed level-0 LZH header.
///
/// `timestamp`, `file_attrib`, `header_checksum`, and `crc` are passthrough
/// metadata; decoding only consumes `compressed_size` and
/// `decompressed_size`.
#[derive(Debug, Clone)]
pub struct LzhHeader {
    pub header_size: u8,
    pub header_checksum: u8,
    pub method: [u8; 5],
    pub compressed_size: u32,
    pub decompressed_size: u32,
    pub timestamp: u32,
    pub file_attrib: u8,
    pub level: u8,
    pub filename: String,
    pub crc: u16,
}

/// Parse a level-0 LZH header and return it with the compressed payload.
///
/// The payload slice is clamped to the bytes actually present, so a buffer
/// truncated below its declared `compressed_size` still parses; the decoder
/// treats the missing tail as zero bits.
///
/// Rejection is a detection signal, not a hard failure: a caller probing an
/// unknown buffer treats [`Error::InvalidLzhHeader`],
/// [`Error::UnsupportedCompressionMethod`], and
/// [`Error::UnsupportedHeaderLevel`] as "not this format" and takes its
/// alternate path.
///
/// # Errors
///
/// Returns [`Error::InvalidLzhHeader`] if the header size byte is 0.
/// Returns [`Error::UnsupportedCompressionMethod`] if the method tag is not `-lh5-`.
/// Returns [`Error::UnsupportedHeaderLevel`] if the header level is not 0.
/// Returns [`Error::Io`] if the buffer ends inside the header fields.
///
/// [`Error::InvalidLzhHeader`]: crate::Error::InvalidLzhHeader
/// [`Error::UnsupportedCompressionMethod`]: crate::Error::UnsupportedCompressionMethod
/// [`Error::UnsupportedHeaderLevel`]: crate::Error::UnsupportedHeaderLevel
/// [`Error::Io`]: crate::Error::Io
pub fn parse_header(data: &[u8]) -> Result<(LzhHeader, &[u8])> {
    let mut cursor = Cursor::new(data);

    let header_size = cursor.read_u8()?;
    if header_size == 0 {
        return Err(Error::InvalidLzhHeader);
    }
    let header_checksum = cursor.read_u8()?;

    let mut method = [0u8; 5];
    cursor.read_exact(&mut method)?;

    let compressed_size = cursor.read_u32::<LittleEndian>()?;
    let decompressed_size = cursor.read_u32::<LittleEndian>()?;
    let timestamp = cursor.read_u32::<LittleEndian>()?;
    let file_attrib = cursor.read_u8()?;
    let level = cursor.read_u8()?;

    let filename_length = cursor.read_u8()?;
    let mut filename_bytes = vec![0u8; usize::from(filename_length)];
    cursor.read_exact(&mut filename_bytes)?;
    let filename = String::from_utf8_lossy(&filename_bytes).into_owned();

    let crc = cursor.read_u16::<LittleEndian>()?;

    if method != LH5_METHOD {
        return Err(Error::UnsupportedCompressionMethod {
            method: String::from_utf8_lossy(&method).into_owned(),
        });
    }
    if level != 0 {
        return Err(Error::UnsupportedHeaderLevel { level });
    }

    let payload_start = cursor.position() as usize;
    let payload_end = payload_start
        .saturating_add(compressed_size as usize)
        .min(data.len());
    let payload = &data[payload_start..payload_end];

    Ok((
        LzhHeader {
            header_size,
            header_checksum,
            method,
            compressed_size,
            decompressed_size,
            timestamp,
            file_attrib,
            level,
            filename,
            crc,
        },
        payload,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn level0_header(method: &[u8; 5], level: u8, payload: &[u8], decompressed: u32) -> Vec<u8> {
        let name = b"track01.bin";
        let mut data = Vec::new();
        data.push(22 + name.len() as u8); // header_size
        data.push(0x5A); // header_checksum (carried, not verified)
        data.extend_from_slice(method);
        data.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        data.extend_from_slice(&decompressed.to_le_bytes());
        data.extend_from_slice(&0x2B6E_0C83u32.to_le_bytes()); // timestamp
        data.push(0x20); // file_attrib
        data.push(level);
        data.push(name.len() as u8);
        data.extend_from_slice(name);
        data.extend_from_slice(&0xBEEFu16.to_le_bytes()); // crc
        data.extend_from_slice(payload);
        data
    }

    #[test]
    fn parses_all_fields_and_payload() {
        let data = level0_header(&LH5_METHOD, 0, &[1, 2, 3, 4], 100);
        let (header, payload) = parse_header(&data).unwrap();
        assert_eq!(header.method, LH5_METHOD);
        assert_eq!(header.compressed_size, 4);
        assert_eq!(header.decompressed_size, 100);
        assert_eq!(header.timestamp, 0x2B6E_0C83);
        assert_eq!(header.file_attrib, 0x20);
        assert_eq!(header.level, 0);
        assert_eq!(header.filename, "track01.bin");
        assert_eq!(header.header_checksum, 0x5A);
        assert_eq!(header.crc, 0xBEEF);
        assert_eq!(payload, &[1, 2, 3, 4]);
    }

    #[test]
    fn foreign_method_tag_is_not_this_format() {
        let data = level0_header(b"-lh0-", 0, &[0; 8], 8);
        match parse_header(&data) {
            Err(Error::UnsupportedCompressionMethod { method }) => assert_eq!(method, "-lh0-"),
            other => panic!("expected method rejection, got {other:?}"),
        }
    }

    #[test]
    fn nonzero_level_is_rejected() {
        let data = level0_header(&LH5_METHOD, 1, &[], 0);
        assert!(matches!(
            parse_header(&data),
            Err(Error::UnsupportedHeaderLevel { level: 1 })
        ));
    }

    #[test]
    fn zero_header_size_is_rejected() {
        let mut data = level0_header(&LH5_METHOD, 0, &[], 0);
        data[0] = 0;
        assert!(matches!(parse_header(&data), Err(Error::InvalidLzhHeader)));
    }

    #[test]
    fn truncated_header_fields_surface_io_error() {
        let data = level0_header(&LH5_METHOD, 0, &[], 0);
        assert!(matches!(
            parse_header(&data[..10]),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn payload_is_clamped_to_available_bytes() {
        let mut data = level0_header(&LH5_METHOD, 0, &[9; 16], 64);
        data.truncate(data.len() - 8); // half the payload is gone
        let (header, payload) = parse_header(&data).unwrap();
        assert_eq!(header.compressed_size, 16);
        assert_eq!(payload, &[9; 8]);
    }
}
