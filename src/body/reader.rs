use bytes::BytesMut;

use crate::error::ProtoError;
use crate::io::Transport;
use crate::parser::{ChunkParser, HeadScanner};

/// Response body reader applying the decided framing.
///
/// `read` returns `Ok(0)` only at the legitimate end of the body.
#[derive(Debug)]
pub enum FramedReader {
    /// The message has no body by rule; reads end immediately.
    Empty,
    /// Body delimited by the end of the stream.
    UntilEof { done: bool },
    /// Body of a declared byte length; a stream end before the declared
    /// length is an error.
    Fixed { remaining: u64 },
    /// Hex-length prefixed chunks with optional trailer fields.
    Chunked(ChunkedReader),
}

impl FramedReader {
    /// Reader for a chunked body, trailer block bounded by `trailer_max`.
    pub fn chunked(trailer_max: usize) -> Self {
        Self::Chunked(ChunkedReader::new(trailer_max))
    }

    /// Read body bytes into `dest`.
    pub fn read(&mut self, io: &mut dyn Transport, dest: &mut [u8]) -> Result<usize, ProtoError> {
        match self {
            Self::Empty => Ok(0),
            Self::UntilEof { done } => {
                if *done {
                    return Ok(0);
                }
                let n = io.read(dest)?;
                if n == 0 {
                    *done = true;
                }
                Ok(n)
            }
            Self::Fixed { remaining } => {
                if *remaining == 0 || dest.is_empty() {
                    return Ok(0);
                }
                let want = dest.len().min(usize::try_from(*remaining).unwrap_or(usize::MAX));
                let n = io.read(&mut dest[..want])?;
                if n == 0 {
                    return Err(ProtoError::UnexpectedEof);
                }
                *remaining -= n as u64;
                Ok(n)
            }
            Self::Chunked(reader) => reader.read(io, dest),
        }
    }

    /// Raw trailer block of a finished chunked body, once.
    pub fn take_trailer(&mut self) -> Option<BytesMut> {
        match self {
            Self::Chunked(reader) if matches!(reader.phase, Phase::Done) => {
                let trailer = std::mem::take(&mut reader.trailer);
                (!trailer.is_empty()).then_some(trailer)
            }
            _ => None,
        }
    }
}

// ===== ChunkedReader =====

/// Chunked body reader: alternates between the chunk header parser and raw
/// body reads, then ingests the trailer block after the zero chunk.
#[derive(Debug)]
pub struct ChunkedReader {
    parser: ChunkParser,
    phase: Phase,
    trailer: BytesMut,
    trailer_max: usize,
}

#[derive(Debug)]
enum Phase {
    /// Parsing a `chunk-size [;ext] CRLF` record.
    Header,
    /// Streaming a chunk body.
    Body { remaining: u64 },
    /// Ingesting the trailer block after the zero chunk.
    Trailer(HeadScanner),
    Done,
}

impl ChunkedReader {
    fn new(trailer_max: usize) -> Self {
        Self {
            parser: ChunkParser::new(),
            phase: Phase::Header,
            trailer: BytesMut::new(),
            trailer_max,
        }
    }

    fn read(&mut self, io: &mut dyn Transport, dest: &mut [u8]) -> Result<usize, ProtoError> {
        loop {
            match &mut self.phase {
                Phase::Header => {
                    if io.peek().is_empty() && io.fill()? == 0 {
                        return Err(ProtoError::UnexpectedEof);
                    }

                    let consumed = self.parser.feed(io.peek());
                    io.consume(consumed);

                    if self.parser.is_invalid() {
                        return Err(ProtoError::InvalidChunkedEncoding);
                    }
                    if self.parser.is_finished() {
                        match self.parser.length() {
                            0 => self.phase = Phase::Trailer(HeadScanner::at_line_boundary()),
                            n => self.phase = Phase::Body { remaining: n },
                        }
                    }
                }
                Phase::Body { remaining } => {
                    if dest.is_empty() {
                        return Ok(0);
                    }
                    let want = dest.len().min(usize::try_from(*remaining).unwrap_or(usize::MAX));
                    let n = io.read(&mut dest[..want])?;
                    if n == 0 {
                        return Err(ProtoError::UnexpectedEof);
                    }
                    *remaining -= n as u64;
                    if *remaining == 0 {
                        // the suffix CRLF belongs to the next header record
                        self.parser.restart();
                        self.phase = Phase::Header;
                    }
                    return Ok(n);
                }
                Phase::Trailer(scanner) => {
                    if io.peek().is_empty() && io.fill()? == 0 {
                        return Err(ProtoError::UnexpectedEof);
                    }
                    if self.trailer.len() >= self.trailer_max {
                        return Err(ProtoError::ExceededLimit);
                    }

                    let budget = self.trailer_max - self.trailer.len();
                    let window = io.peek();
                    let window = &window[..window.len().min(budget)];
                    let consumed = scanner.feed(window);
                    self.trailer.extend_from_slice(&window[..consumed]);
                    io.consume(consumed);

                    if scanner.is_finished() {
                        self.phase = Phase::Done;
                        return Ok(0);
                    }
                }
                Phase::Done => return Ok(0),
            }
        }
    }
}
