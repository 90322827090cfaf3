//! SWAR byte scan primitives.
//!
//! The header terminator loop is hot, and parsing a multi-KB head block one
//! byte at a time costs. Scanning a machine word per step amortizes the
//! branch on every byte down to one branch per word.

const CHUNK_SIZE: usize = size_of::<usize>();
const MSB: usize = usize::from_ne_bytes([0x80; CHUNK_SIZE]);

const fn splat(byte: u8) -> usize {
    usize::from_ne_bytes([byte; CHUNK_SIZE])
}

/// Mask with the high bit set in exactly the zero bytes of `word`.
///
/// Carry-free variant: per-byte sums never cross a byte boundary, so the
/// result is exact on either endianness.
const fn zero_bytes(word: usize) -> usize {
    !(((word & !MSB).wrapping_add(!MSB)) | word | !MSB)
}

/// Index of the first marked byte of a non-zero [`zero_bytes`] mask.
const fn mask_index(mask: usize) -> usize {
    debug_assert!(mask != 0);
    if cfg!(target_endian = "little") {
        (mask.trailing_zeros() / 8) as usize
    } else {
        (mask.leading_zeros() / 8) as usize
    }
}

/// Byte offset of `byte` within one machine word, if present.
#[inline]
pub const fn index_of_byte_in_word(word: usize, byte: u8) -> Option<usize> {
    let hit = zero_bytes(word ^ splat(byte));
    if hit == 0 {
        None
    } else {
        Some(mask_index(hit))
    }
}

/// Minimal offset of the first `\r` or `\n` in `bytes`.
pub fn first_cr_or_lf(bytes: &[u8]) -> Option<usize> {
    const CR: usize = splat(b'\r');
    const LF: usize = splat(b'\n');

    let mut offset = 0;
    let mut rest = bytes;

    while let Some(chunk) = rest.first_chunk::<CHUNK_SIZE>() {
        let word = usize::from_ne_bytes(*chunk);
        let hit = zero_bytes(word ^ CR) | zero_bytes(word ^ LF);

        if hit != 0 {
            return Some(offset + mask_index(hit));
        }

        offset += CHUNK_SIZE;
        rest = &rest[CHUNK_SIZE..];
    }

    let mut i = 0;
    while i < rest.len() {
        if matches!(rest[i], b'\r' | b'\n') {
            return Some(offset + i);
        }
        i += 1;
    }

    None
}
