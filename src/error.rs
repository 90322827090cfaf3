use std::io;

// ===== ProtoError =====

/// HTTP transaction error.
///
/// Any parsing variant also marks the connection as not reusable, so the
/// pool closes it on release rather than parking it.
#[derive(Debug)]
pub enum ProtoError {
    /// The head block exceeded the configured cap.
    ExceededLimit,
    /// Malformed status line, malformed field line, or unsupported
    /// version.
    HeadersInvalid,
    /// Unknown coding, chunked not last, framing headers supplied
    /// manually, or a body declared on a bodyless method.
    UnsupportedTransferEncoding,
    /// Non-hex chunk size, chunk size overflow, or missing chunk suffix.
    InvalidChunkedEncoding,
    /// Body write past the declared `Content-Length`.
    MessageTooLong,
    /// Finish before the declared `Content-Length` was reached.
    MessageNotComplete,
    /// Body write attempted without body framing.
    NotWritable,
    /// No codec available for the negotiated content coding.
    DecompressionFailed,
    /// The transport ended mid-message.
    UnexpectedEof,
    /// Transport failure.
    Io(io::Error),
}

impl ProtoError {
    const fn message(&self) -> &'static str {
        match self {
            Self::ExceededLimit => "headers exceeded size limit",
            Self::HeadersInvalid => "invalid headers",
            Self::UnsupportedTransferEncoding => "unsupported transfer encoding",
            Self::InvalidChunkedEncoding => "invalid chunked encoding",
            Self::MessageTooLong => "message body longer than declared",
            Self::MessageNotComplete => "message body shorter than declared",
            Self::NotWritable => "message has no writable body",
            Self::DecompressionFailed => "content coding codec unavailable",
            Self::UnexpectedEof => "unexpected end of stream",
            Self::Io(_) => "io error",
        }
    }

    /// Returns `true` when the error poisons the connection for reuse.
    pub const fn is_fatal(&self) -> bool {
        // every error mid-transaction leaves unread or unwritten protocol
        // bytes on the wire
        !matches!(self, Self::NotWritable | Self::MessageTooLong)
    }
}

impl std::error::Error for ProtoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProtoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {err}"),
            _ => f.write_str(self.message()),
        }
    }
}

impl From<io::Error> for ProtoError {
    #[inline]
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}
