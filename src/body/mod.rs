//! Message body framing and content coding seams.
//!
//! [`FramedReader`] and [`FramedWriter`] apply the framing the transaction
//! decided on, over the injected transport. Compression is a contract
//! only: [`Encoder`] and [`Decoder`] implementations live outside this
//! crate and are installed through [`Codecs`].

mod reader;
mod writer;

pub use reader::FramedReader;
pub use writer::FramedWriter;

use crate::error::ProtoError;

// ===== Framing =====

/// Message body delimitation, per direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Framing {
    /// No body, or a body delimited by the end of the stream.
    #[default]
    None,
    /// Body of exactly the given byte length.
    Fixed(u64),
    /// Hex-length prefixed chunks, terminated by a zero length chunk and
    /// optional trailer fields.
    Chunked,
}

// ===== Coding =====

/// Content coding applied to a message body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Coding {
    #[default]
    Identity,
    Deflate,
    Gzip,
    Zstd,
}

impl Coding {
    /// Parse a coding token, case-insensitive.
    pub fn from_token(token: &[u8]) -> Option<Self> {
        if token.eq_ignore_ascii_case(b"identity") {
            Some(Self::Identity)
        } else if token.eq_ignore_ascii_case(b"deflate") {
            Some(Self::Deflate)
        } else if token.eq_ignore_ascii_case(b"gzip") || token.eq_ignore_ascii_case(b"x-gzip") {
            Some(Self::Gzip)
        } else if token.eq_ignore_ascii_case(b"zstd") {
            Some(Self::Zstd)
        } else {
            None
        }
    }

    /// Returns the canonical token.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Deflate => "deflate",
            Self::Gzip => "gzip",
            Self::Zstd => "zstd",
        }
    }

    /// Returns `true` for the no-op coding.
    pub const fn is_identity(&self) -> bool {
        matches!(self, Self::Identity)
    }
}

// ===== Codec contracts =====

/// Framed body bytes pulled by a [`Decoder`].
pub trait BodySource {
    /// Read framed body bytes, `Ok(0)` only at end of body.
    fn read(&mut self, dest: &mut [u8]) -> Result<usize, ProtoError>;
}

/// Framed body bytes pushed by an [`Encoder`].
pub trait BodySink {
    /// Write bytes into the body framer, returns how many were accepted.
    fn write(&mut self, bytes: &[u8]) -> Result<usize, ProtoError>;
}

/// Streaming decompressor over a framed body source.
pub trait Decoder {
    /// Pull decompressed bytes, reading compressed input from `src`.
    ///
    /// Returns `Ok(0)` only at end of the decompressed stream.
    fn read(&mut self, src: &mut dyn BodySource, dest: &mut [u8]) -> Result<usize, ProtoError>;
}

/// Streaming compressor in front of a framed body sink.
pub trait Encoder {
    /// Push caller bytes through the compressor into `sink`.
    ///
    /// Returns how many bytes of `bytes` were accepted.
    fn write(&mut self, sink: &mut dyn BodySink, bytes: &[u8]) -> Result<usize, ProtoError>;

    /// Flush buffered state, emitting any final block into `sink`.
    fn finish(&mut self, sink: &mut dyn BodySink) -> Result<(), ProtoError>;
}

/// Installer mapping a negotiated [`Coding`] to codec instances.
///
/// Returning `None` for a non-identity coding fails the transaction with
/// [`ProtoError::DecompressionFailed`].
pub trait Codecs {
    /// Decoder for the response body coding.
    fn decoder(&self, coding: Coding) -> Option<Box<dyn Decoder>>;

    /// Encoder for the request body coding.
    fn encoder(&self, coding: Coding) -> Option<Box<dyn Encoder>>;
}
