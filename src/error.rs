//! Error types for `unlzh`

use thiserror::Error;

/// The error type for `unlzh` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from reading header fields out of a byte buffer.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== LZH Header Errors ====================
    /// The buffer does not start with a usable LZH header (header size byte is 0).
    #[error("invalid LZH header: header size is 0")]
    InvalidLzhHeader,

    /// The header carries a compression method other than -lh5-.
    #[error("unsupported compression method: {method}")]
    UnsupportedCompressionMethod {
        /// The 5-byte method tag found in the header.
        method: String,
    },

    /// The header level is not the level-0 layout this crate understands.
    #[error("unsupported header level: {level}")]
    UnsupportedHeaderLevel {
        /// The level byte found in the header.
        level: u8,
    },

    // ==================== Decompression Errors ====================
    /// -lh5- decompression failed (corrupt or malformed compressed stream).
    #[error("lh5 decompression failed: {message}")]
    Lh5DecompressionFailed {
        /// Description of what is corrupt.
        message: String,
    },
}

/// A specialized Result type for `unlzh` operations.
pub type Result<T> = std::result::Result<T, Error>;
