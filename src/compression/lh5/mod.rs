//! -lh5- decompression (LZSS matches + canonical Huffman coding).
//!
//! The stream is a sequence of blocks. Each block opens with a 16-bit
//! symbol count followed by three compactly-encoded Huffman tables: an
//! auxiliary table that itself codes the literal/length table, the
//! literal/length table proper, and the match-position table. Decoded
//! symbols are either literal bytes or back-references expanded through an
//! 8 KB circular window that doubles as the output staging area.
//!
//! Decoding runs in window-sized chunks so the window contents always
//! mirror the most recent output; a match interrupted by a chunk boundary
//! resumes exactly where it stopped on the next chunk.

mod bitstream;
mod huffman;

use crate::error::{Error, Result};
use bitstream::BitReader;
use huffman::TreeArena;

/// Dictionary addressing width fixed by the -lh5- method.
const DICBIT: u32 = 13;
/// Window / dictionary size in bytes.
pub const DICSIZ: usize = 1 << DICBIT;
/// Minimum encodable match length.
const THRESHOLD: usize = 3;
/// Maximum encodable match length.
const MAXMATCH: usize = 256;
/// Literal/length alphabet size: 256 literals plus the match-length codes.
const NC: usize = 255 + MAXMATCH + 2 - THRESHOLD;
/// Field width of a literal/length table entry count.
const CBIT: u32 = 9;
/// Position alphabet size.
const NP: usize = DICBIT as usize + 1;
/// Auxiliary alphabet size (code-length codes).
const NT: usize = 16 + 3;
/// Field width of a position table entry count.
const PBIT: u32 = 4;
/// Field width of an auxiliary table entry count.
const TBIT: u32 = 5;
/// Shared length array size for the auxiliary and position tables.
const NPT: usize = NT;
/// Direct-table width for the literal/length table.
const C_TABLE_BITS: u32 = 12;
/// Direct-table width for the auxiliary and position tables.
const PT_TABLE_BITS: u32 = 8;

/// Decompress an -lh5- stream into a freshly allocated buffer.
///
/// `decompressed_size` is the output length declared by the container
/// header; decoding stops the instant that many bytes exist, even in the
/// middle of a match. A compressed buffer shorter than the block structure
/// it encodes is tolerated: missing input reads as zero bits.
///
/// # Errors
/// Returns [`Error::Lh5DecompressionFailed`] if the stream carries a
/// corrupt Huffman table description.
///
/// [`Error::Lh5DecompressionFailed`]: crate::Error::Lh5DecompressionFailed
pub fn decompress(compressed: &[u8], decompressed_size: usize) -> Result<Vec<u8>> {
    let mut output = vec![0u8; decompressed_size];
    let produced = decompress_into(compressed, &mut output, decompressed_size)?;
    output.truncate(produced);
    Ok(output)
}

/// Decompress an -lh5- stream into a caller-provided buffer.
///
/// Produces `min(decompressed_size, output.len())` bytes and returns the
/// count; the decoder never writes past either bound.
///
/// # Errors
/// Returns [`Error::Lh5DecompressionFailed`] if the stream carries a
/// corrupt Huffman table description.
///
/// [`Error::Lh5DecompressionFailed`]: crate::Error::Lh5DecompressionFailed
pub fn decompress_into(
    compressed: &[u8],
    output: &mut [u8],
    decompressed_size: usize,
) -> Result<usize> {
    let target = decompressed_size.min(output.len());
    tracing::debug!(
        "lh5 decompression: {} -> {} bytes",
        compressed.len(),
        target
    );

    let mut decoder = Lh5Decoder::new(compressed);
    let mut produced = 0;
    while produced < target {
        let n = (target - produced).min(DICSIZ);
        decoder.decode_chunk(n)?;
        output[produced..produced + n].copy_from_slice(&decoder.window[..n]);
        produced += n;
    }
    Ok(produced)
}

/// All state for one decode invocation: bit reader, live tables, window,
/// block counter, and the pending-copy cursor that lets a match resume
/// across chunk boundaries. Nothing survives past the invocation.
struct Lh5Decoder<'a> {
    bits: BitReader<'a>,
    blocksize: u32,
    c_len: [u8; NC],
    pt_len: [u8; NPT],
    c_table: [u16; 1 << C_TABLE_BITS],
    pt_table: [u16; 1 << PT_TABLE_BITS],
    arena: TreeArena,
    window: [u8; DICSIZ],
    copy_src: usize,
    copy_remaining: usize,
}

fn corrupt(message: &str) -> Error {
    Error::Lh5DecompressionFailed {
        message: message.to_string(),
    }
}

impl<'a> Lh5Decoder<'a> {
    fn new(compressed: &'a [u8]) -> Self {
        Self {
            bits: BitReader::new(compressed),
            blocksize: 0,
            c_len: [0; NC],
            pt_len: [0; NPT],
            c_table: [0; 1 << C_TABLE_BITS],
            pt_table: [0; 1 << PT_TABLE_BITS],
            arena: TreeArena::new(),
            window: [0; DICSIZ],
            copy_src: 0,
            copy_remaining: 0,
        }
    }

    /// Read the auxiliary or position table: `count` code lengths of 3 bits
    /// each, with an all-ones escape extending the length unary-style, and
    /// an optional special index followed by a 2-bit run of skipped symbols.
    ///
    /// A zero entry count instead assigns one shared symbol value to the
    /// whole direct table.
    fn read_aux_lengths(&mut self, count: usize, width: u32, special: Option<usize>) -> Result<()> {
        let n = usize::from(self.bits.read_bits(width));
        if n == 0 {
            let shared = self.bits.read_bits(width);
            if usize::from(shared) >= count {
                return Err(corrupt("shared table symbol out of range"));
            }
            self.pt_len[..count].fill(0);
            self.pt_table.fill(shared);
            return Ok(());
        }
        if n > count {
            return Err(corrupt("too many code lengths"));
        }

        let mut i = 0;
        while i < n {
            let mut len = u32::from(self.bits.peek(3));
            if len == 7 {
                // unary extension: count the ones following the escape
                let lookahead = self.bits.lookahead();
                let mut mask = 1u16 << (16 - 1 - 3);
                while lookahead & mask != 0 {
                    mask >>= 1;
                    len += 1;
                }
            }
            let consumed = if len < 7 { 3 } else { len - 3 };
            if consumed > bitstream::LOOKAHEAD_BITS {
                return Err(corrupt("code length escape overruns the lookahead"));
            }
            self.bits.consume(consumed);
            self.pt_len[i] = len as u8;
            i += 1;
            if special == Some(i) {
                let mut skip = self.bits.read_bits(2);
                while skip > 0 {
                    if i >= count {
                        return Err(corrupt("skipped symbols overrun the table"));
                    }
                    self.pt_len[i] = 0;
                    i += 1;
                    skip -= 1;
                }
            }
        }
        self.pt_len[i..count].fill(0);

        huffman::build_table(
            count,
            &self.pt_len,
            PT_TABLE_BITS,
            &mut self.pt_table,
            &mut self.arena,
        )
    }

    /// Read the literal/length table, decoding each entry through the
    /// auxiliary table. Symbols 0..=2 are zero-run escapes (a single zero,
    /// a 4-bit count plus 3, or a 9-bit count plus 20); anything above
    /// encodes the entry's code length minus 2.
    fn read_code_lengths(&mut self) -> Result<()> {
        let n = usize::from(self.bits.read_bits(CBIT));
        if n == 0 {
            let shared = self.bits.read_bits(CBIT);
            if usize::from(shared) >= NC {
                return Err(corrupt("shared literal symbol out of range"));
            }
            self.c_len.fill(0);
            self.c_table.fill(shared);
            return Ok(());
        }
        if n > NC {
            return Err(corrupt("too many literal code lengths"));
        }

        let mut i = 0;
        while i < n {
            let code = huffman::lookup(
                &self.pt_table,
                &self.arena,
                NT as u16,
                PT_TABLE_BITS,
                self.bits.lookahead(),
            );
            self.bits.consume(u32::from(self.pt_len[usize::from(code)]));
            if code <= 2 {
                let run = match code {
                    0 => 1,
                    1 => usize::from(self.bits.read_bits(4)) + 3,
                    _ => usize::from(self.bits.read_bits(CBIT)) + 20,
                };
                if i + run > NC {
                    return Err(corrupt("zero run overruns the literal table"));
                }
                self.c_len[i..i + run].fill(0);
                i += run;
            } else {
                self.c_len[i] = (code - 2) as u8;
                i += 1;
            }
        }
        self.c_len[i..].fill(0);

        huffman::build_table(
            NC,
            &self.c_len,
            C_TABLE_BITS,
            &mut self.c_table,
            &mut self.arena,
        )
    }

    /// Decode one literal/length symbol, rebuilding all tables first when
    /// the current block is exhausted.
    fn decode_symbol(&mut self) -> Result<u16> {
        if self.blocksize == 0 {
            self.blocksize = u32::from(self.bits.read_bits(16));
            tracing::debug!("new block: {} symbols", self.blocksize);
            self.read_aux_lengths(NT, TBIT, Some(3))?;
            self.read_code_lengths()?;
            self.read_aux_lengths(NP, PBIT, None)?;
        }
        self.blocksize = self.blocksize.wrapping_sub(1);

        let symbol = huffman::lookup(
            &self.c_table,
            &self.arena,
            NC as u16,
            C_TABLE_BITS,
            self.bits.lookahead(),
        );
        self.bits
            .consume(u32::from(self.c_len[usize::from(symbol)]));
        Ok(symbol)
    }

    /// Decode one match distance: symbol 0 means the previous byte, symbol
    /// `j` otherwise contributes `2^(j-1)` plus `j-1` raw bits.
    fn decode_position(&mut self) -> Result<usize> {
        let symbol = huffman::lookup(
            &self.pt_table,
            &self.arena,
            NP as u16,
            PT_TABLE_BITS,
            self.bits.lookahead(),
        );
        self.bits
            .consume(u32::from(self.pt_len[usize::from(symbol)]));
        if symbol == 0 {
            return Ok(0);
        }
        let extra = self.bits.read_bits(u32::from(symbol) - 1);
        Ok((1 << (symbol - 1)) + usize::from(extra))
    }

    /// Produce exactly `size` bytes (at most the window size) into the
    /// window, resuming a pending match first. Matches copy byte by byte
    /// with both cursors masked into the window, so a source overlapping
    /// the destination re-reads bytes written earlier in the same copy.
    fn decode_chunk(&mut self, size: usize) -> Result<()> {
        debug_assert!(size <= DICSIZ);
        let mut pos = 0;

        while self.copy_remaining > 0 {
            self.copy_remaining -= 1;
            self.window[pos] = self.window[self.copy_src];
            self.copy_src = (self.copy_src + 1) & (DICSIZ - 1);
            pos += 1;
            if pos == size {
                return Ok(());
            }
        }

        loop {
            let symbol = self.decode_symbol()?;
            if symbol <= 255 {
                self.window[pos] = symbol as u8;
                pos += 1;
                if pos == size {
                    return Ok(());
                }
            } else {
                self.copy_remaining = usize::from(symbol) - (256 - THRESHOLD);
                let distance = self.decode_position()?;
                self.copy_src = (pos + DICSIZ - distance - 1) & (DICSIZ - 1);
                while self.copy_remaining > 0 {
                    self.copy_remaining -= 1;
                    self.window[pos] = self.window[self.copy_src];
                    self.copy_src = (self.copy_src + 1) & (DICSIZ - 1);
                    pos += 1;
                    if pos == size {
                        return Ok(());
                    }
                }
            }
        }
    }
}
