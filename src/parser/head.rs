use super::simd;

/// Incremental scanner for the blank line that ends a message head.
///
/// The scanner is fed chunk by chunk and never backtracks; a message head
/// split at arbitrary byte boundaries yields the same result as one fed in
/// a single piece. Each line may end with `CRLF` or a bare `LF`; a bare
/// `CR` never ends a line.
///
/// The scanner itself never rejects input. Callers bound the head block
/// size and abort on their own when the scanner has not finished by the
/// cap.
#[derive(Debug)]
pub struct HeadScanner {
    cursor: Cursor,
}

/// Sentinel progress relative to the last consumed byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Cursor {
    /// Inside a field line.
    Ground,
    /// Seen `\r`.
    SeenR,
    /// Seen a complete line terminator `\r\n`.
    SeenRn,
    /// Seen `\r\n\r`.
    SeenRnr,
    /// Seen a complete bare `\n` line terminator.
    SeenN,
    Finished,
}

impl HeadScanner {
    /// Create a new [`HeadScanner`] at the start of a head block.
    pub const fn new() -> Self {
        Self { cursor: Cursor::Ground }
    }

    /// Create a [`HeadScanner`] positioned just after a line terminator.
    ///
    /// A trailer block follows the zero chunk's own `CRLF`, so an empty
    /// trailer section is a single blank line.
    pub const fn at_line_boundary() -> Self {
        Self { cursor: Cursor::SeenRn }
    }

    /// Returns `true` once the end of the head block has been consumed.
    pub const fn is_finished(&self) -> bool {
        matches!(self.cursor, Cursor::Finished)
    }

    /// Consume bytes up to and including the head terminator.
    ///
    /// Returns how many bytes of `bytes` belong to the head block,
    /// terminator included. Feeding a finished scanner is a caller bug.
    pub fn feed(&mut self, bytes: &[u8]) -> usize {
        debug_assert!(!self.is_finished(), "feed on finished scanner");

        let mut i = 0;

        while i < bytes.len() {
            if matches!(self.cursor, Cursor::Ground) {
                // skip ahead to the next byte that can advance the cursor
                match simd::first_cr_or_lf(&bytes[i..]) {
                    Some(at) => i += at,
                    None => return bytes.len(),
                }
            }

            let byte = bytes[i];
            i += 1;

            self.cursor = match (self.cursor, byte) {
                (Cursor::Ground, b'\r') => Cursor::SeenR,
                (Cursor::Ground, b'\n') => Cursor::SeenN,
                (Cursor::SeenR, b'\n') => Cursor::SeenRn,
                (Cursor::SeenR, b'\r') => Cursor::SeenR,
                (Cursor::SeenRn, b'\r') => Cursor::SeenRnr,
                (Cursor::SeenRn, b'\n') => Cursor::Finished,
                (Cursor::SeenRnr, b'\n') => Cursor::Finished,
                (Cursor::SeenRnr, b'\r') => Cursor::SeenR,
                (Cursor::SeenN, b'\n') => Cursor::Finished,
                (Cursor::SeenN, b'\r') => Cursor::SeenRnr,
                (Cursor::Finished, _) => unreachable!(),
                (_, _) => Cursor::Ground,
            };

            if self.is_finished() {
                break;
            }
        }

        i
    }
}

impl Default for HeadScanner {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
