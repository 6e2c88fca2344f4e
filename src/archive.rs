//! One-shot extraction of an LZH-compressed file
//!
//! Ties the header parser and the -lh5- decoder together for callers that
//! just want the decompressed bytes out of a compressed buffer.

use crate::compression;
use crate::error::Result;
use crate::header::parse_header;

/// Parse the level-0 header in `data` and decompress its payload.
///
/// The declared decompressed size from the header drives decoding; the
/// returned buffer is exactly that long.
///
/// # Errors
///
/// Returns the header rejection errors of [`parse_header`] when `data` is
/// not an -lh5- archive, or [`Error::Lh5DecompressionFailed`] when the
/// payload is corrupt.
///
/// [`parse_header`]: crate::header::parse_header
/// [`Error::Lh5DecompressionFailed`]: crate::Error::Lh5DecompressionFailed
pub fn unpack(data: &[u8]) -> Result<Vec<u8>> {
    let (header, payload) = parse_header(data)?;
    tracing::debug!(
        "unpacking '{}': {} -> {} bytes",
        header.filename,
        header.compressed_size,
        header.decompressed_size
    );
    compression::decompress(payload, header.decompressed_size as usize)
}
