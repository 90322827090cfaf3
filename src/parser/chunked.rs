/// Incremental parser for one `chunk-size [;chunk-ext] CRLF` record.
///
/// The parser is fed chunk by chunk and survives arbitrary byte splits.
/// The size is accumulated as hexadecimal with checked arithmetic; the
/// first digit that would overflow `u64` drives the parser to its sticky
/// invalid state, there is no silent truncation. Extensions introduced by
/// `;` are skipped verbatim. Line terminators may be `CRLF` or bare `LF`.
///
/// For every chunk after the first, [`restart`] re-arms the parser at the
/// suffix states, which consume the `CRLF` trailing the previous chunk
/// body before the next size line begins.
///
/// [`restart`]: ChunkParser::restart
#[derive(Clone, Debug)]
pub struct ChunkParser {
    cursor: Cursor,
    length: u64,
    seen_digit: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Cursor {
    /// Expecting the `CRLF` that trails the previous chunk body.
    Suffix,
    /// Seen the suffix `\r`.
    SuffixR,
    /// Accumulating hexadecimal size digits.
    HeadSize,
    /// Skipping a `;`-introduced extension.
    HeadExt,
    /// Seen the size line `\r`.
    HeadR,
    Finished,
    Invalid,
}

impl ChunkParser {
    /// Create a parser positioned at the first chunk-size line.
    pub const fn new() -> Self {
        Self {
            cursor: Cursor::HeadSize,
            length: 0,
            seen_digit: false,
        }
    }

    /// Re-arm for the next chunk header, suffix `CRLF` first.
    pub fn restart(&mut self) {
        debug_assert!(self.is_finished());
        self.cursor = Cursor::Suffix;
        self.length = 0;
        self.seen_digit = false;
    }

    /// Returns `true` once a complete size line has been consumed.
    pub const fn is_finished(&self) -> bool {
        matches!(self.cursor, Cursor::Finished)
    }

    /// Returns `true` if the input was not valid chunked framing.
    ///
    /// The invalid state is sticky; the enclosing message must be aborted.
    pub const fn is_invalid(&self) -> bool {
        matches!(self.cursor, Cursor::Invalid)
    }

    /// The parsed chunk length, valid once [`is_finished`] returns `true`.
    ///
    /// [`is_finished`]: ChunkParser::is_finished
    pub const fn length(&self) -> u64 {
        self.length
    }

    /// Consume bytes of the chunk header record.
    ///
    /// Returns how many bytes of `bytes` were consumed, the terminating
    /// line feed included. Stops early once finished or invalid.
    pub fn feed(&mut self, bytes: &[u8]) -> usize {
        let mut i = 0;

        while i < bytes.len() {
            if matches!(self.cursor, Cursor::Finished | Cursor::Invalid) {
                break;
            }

            let byte = bytes[i];
            i += 1;

            self.cursor = match self.cursor {
                Cursor::Suffix => match byte {
                    b'\r' => Cursor::SuffixR,
                    b'\n' => Cursor::HeadSize,
                    _ => Cursor::Invalid,
                },
                Cursor::SuffixR => match byte {
                    b'\n' => Cursor::HeadSize,
                    _ => Cursor::Invalid,
                },
                Cursor::HeadSize => match hex_value(byte) {
                    Some(digit) => {
                        match self.length.checked_mul(16).and_then(|n| n.checked_add(digit)) {
                            Some(length) => {
                                self.length = length;
                                self.seen_digit = true;
                                Cursor::HeadSize
                            }
                            None => Cursor::Invalid,
                        }
                    }
                    None if !self.seen_digit => Cursor::Invalid,
                    None => match byte {
                        b';' => Cursor::HeadExt,
                        b'\r' => Cursor::HeadR,
                        b'\n' => Cursor::Finished,
                        _ => Cursor::Invalid,
                    },
                },
                // extension content is never interpreted
                Cursor::HeadExt => match byte {
                    b'\r' => Cursor::HeadR,
                    b'\n' => Cursor::Finished,
                    _ => Cursor::HeadExt,
                },
                Cursor::HeadR => match byte {
                    b'\n' => Cursor::Finished,
                    _ => Cursor::Invalid,
                },
                Cursor::Finished | Cursor::Invalid => unreachable!(),
            };
        }

        i
    }
}

impl Default for ChunkParser {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

const fn hex_value(byte: u8) -> Option<u64> {
    match byte {
        b'0'..=b'9' => Some((byte - b'0') as u64),
        b'a'..=b'f' => Some((byte - b'a' + 10) as u64),
        b'A'..=b'F' => Some((byte - b'A' + 10) as u64),
        _ => None,
    }
}
