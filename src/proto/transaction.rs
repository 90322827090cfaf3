use bytes::{Bytes, BytesMut};

use crate::body::{
    BodySink, BodySource, Codecs, Coding, Decoder, Encoder, FramedReader, FramedWriter, Framing,
};
use crate::error::ProtoError;
use crate::headers::standard::{
    ACCEPT, ACCEPT_ENCODING, CONNECTION, CONTENT_ENCODING, CONTENT_LENGTH, HOST, TE,
    TRANSFER_ENCODING, USER_AGENT,
};
use crate::headers::{HeaderMap, HeaderName, HeaderValue};
use crate::io::Transport;
use crate::log::{debug, trace, warning};
use crate::matches::{is_token, is_value_byte};
use crate::method::Method;
use crate::pool::Connection;
use crate::proto::Options;
use crate::status::StatusCode;

const DEFAULT_HEAD_MAX: usize = 8 * 1024;

const USER_AGENT_LINE: &str = concat!("User-Agent: hato/", env!("CARGO_PKG_VERSION"), "\r\n");

/// Transaction lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Idle,
    RequestHead,
    RequestBody,
    RequestDone,
    ResponseHead,
    ResponseBody,
    Closed,
}

/// One HTTP/1.1 request and response exchange over a borrowed connection.
///
/// The lifecycle is strictly ordered:
///
/// ```not_rust
/// Idle --send()--> RequestBody --write()*--> --finish()--> RequestDone
/// RequestDone --wait()--> ResponseBody --read()*--> --close()--> Closed
/// ```
///
/// Calling an operation outside its state panics; a transaction that
/// returned an error is not resumable. Fatal errors mark the connection
/// as not reusable, so the pool closes it on release instead of parking
/// it.
///
/// A transaction must not be touched by two callers at once; the borrow
/// of the connection enforces this.
pub struct Transaction<'c> {
    conn: &'c mut Connection,
    codecs: Option<&'c dyn Codecs>,
    head_max: usize,
    state: State,

    // request side
    method: Method,
    writer: FramedWriter,
    encoder: Option<Box<dyn Encoder>>,

    // response side
    status: StatusCode,
    reason: Bytes,
    headers: HeaderMap,
    framing: Framing,
    reader: FramedReader,
    decoder: Option<Box<dyn Decoder>>,
    tunnel: bool,
}

impl<'c> Transaction<'c> {
    /// Create an idle transaction over a connection.
    pub fn new(conn: &'c mut Connection) -> Self {
        Self {
            conn,
            codecs: None,
            head_max: DEFAULT_HEAD_MAX,
            state: State::Idle,
            method: Method::GET,
            writer: FramedWriter::NotWritable,
            encoder: None,
            status: StatusCode::OK,
            reason: Bytes::new(),
            headers: HeaderMap::new(),
            framing: Framing::None,
            reader: FramedReader::Empty,
            decoder: None,
            tunnel: false,
        }
    }

    /// Install the codec provider used for negotiated content codings.
    pub fn set_codecs(&mut self, codecs: &'c dyn Codecs) {
        self.codecs = Some(codecs);
    }

    /// Bound the response head block, trailer block included.
    pub fn set_head_limit(&mut self, limit: usize) {
        self.head_max = limit;
    }

    /// Current lifecycle state.
    pub fn state(&self) -> State {
        self.state
    }

    /// Response status code, valid after [`wait`][Transaction::wait].
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response reason phrase, valid after [`wait`][Transaction::wait].
    pub fn reason(&self) -> &[u8] {
        &self.reason
    }

    /// Response headers; chunked trailer fields are appended here once
    /// the body has been read to its end.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Response body framing, valid after [`wait`][Transaction::wait].
    pub fn framing(&self) -> Framing {
        self.framing
    }

    /// Returns `true` after a 2xx response to `CONNECT`; the connection
    /// now carries arbitrary bytes and this crate's involvement ends.
    pub fn is_tunnel(&self) -> bool {
        self.tunnel
    }

    /// Emit the request head.
    ///
    /// Standard headers are filled in unless the caller supplied them;
    /// the framing header is derived from the declared body.
    ///
    /// # Panics
    ///
    /// Panics unless the transaction is idle.
    pub fn send(&mut self, options: &Options<'_>) -> Result<(), ProtoError> {
        assert!(
            matches!(self.state, State::Idle),
            "send on a transaction that already sent"
        );
        self.state = State::RequestHead;

        // framing headers are derived, never caller supplied
        if options.headers.contains_key(TRANSFER_ENCODING)
            || options.headers.contains_key(CONTENT_LENGTH)
        {
            return self.seal(Err(ProtoError::UnsupportedTransferEncoding));
        }
        if !options.method.permits_request_body() && !matches!(options.body, Framing::None) {
            return self.seal(Err(ProtoError::UnsupportedTransferEncoding));
        }
        if matches!(options.coding, Coding::Gzip | Coding::Zstd) {
            // only identity and deflate are writable
            return self.seal(Err(ProtoError::UnsupportedTransferEncoding));
        }
        if !options.coding.is_identity() && !matches!(options.body, Framing::Chunked) {
            return self.seal(Err(ProtoError::UnsupportedTransferEncoding));
        }

        let encoder = if options.coding.is_identity() {
            None
        } else {
            match self.codecs.and_then(|codecs| codecs.encoder(options.coding)) {
                Some(encoder) => Some(encoder),
                None => return self.seal(Err(ProtoError::DecompressionFailed)),
            }
        };

        let result = self.send_inner(options);
        if result.is_ok() {
            self.method = options.method;
            self.encoder = encoder;
            self.writer = match options.body {
                Framing::None => FramedWriter::NotWritable,
                Framing::Fixed(n) => FramedWriter::Fixed { remaining: n },
                Framing::Chunked => FramedWriter::Chunked,
            };
            self.state = State::RequestBody;
            trace!("request head sent, {} {}", options.method, options.target);
        }
        self.seal(result)
    }

    /// Write request body bytes through the declared framing.
    ///
    /// Returns how many bytes of `bytes` were accepted. With an installed
    /// encoder the bytes are compressed into the chunked framer first.
    ///
    /// # Panics
    ///
    /// Panics unless [`send`][Transaction::send] succeeded.
    pub fn write(&mut self, bytes: &[u8]) -> Result<usize, ProtoError> {
        assert!(
            matches!(self.state, State::RequestBody),
            "write outside the request body"
        );

        let Self { conn, writer, encoder, .. } = self;
        let io = conn.transport();
        let result = match encoder {
            Some(encoder) => encoder.write(&mut FramerSink { writer, io }, bytes),
            None => writer.write(io, bytes),
        };
        self.seal(result)
    }

    /// End the request body and flush the transport.
    ///
    /// # Panics
    ///
    /// Panics unless [`send`][Transaction::send] succeeded.
    pub fn finish(&mut self) -> Result<(), ProtoError> {
        assert!(
            matches!(self.state, State::RequestBody),
            "finish outside the request body"
        );

        let result = self.finish_inner();
        if result.is_ok() {
            self.state = State::RequestDone;
        }
        self.seal(result)
    }

    /// Ingest the response head and decide the body framing.
    ///
    /// # Panics
    ///
    /// Panics unless [`finish`][Transaction::finish] succeeded.
    pub fn wait(&mut self) -> Result<(), ProtoError> {
        assert!(
            matches!(self.state, State::RequestDone),
            "wait before the request finished"
        );
        self.state = State::ResponseHead;

        let result = self.wait_inner();
        if result.is_ok() {
            self.state = State::ResponseBody;
            debug!(
                "response {} {:?}, framing {:?}",
                self.status, self.reason, self.framing
            );
        }
        self.seal(result)
    }

    /// Read response body bytes.
    ///
    /// Returns `Ok(0)` only at the legitimate end of the body. With an
    /// installed decoder the framed bytes are decompressed first.
    ///
    /// # Panics
    ///
    /// Panics unless [`wait`][Transaction::wait] succeeded.
    pub fn read(&mut self, dest: &mut [u8]) -> Result<usize, ProtoError> {
        assert!(
            matches!(self.state, State::ResponseBody),
            "read outside the response body"
        );

        let Self { conn, reader, decoder, .. } = self;
        let io = conn.transport();
        let result = match decoder {
            Some(decoder) => decoder.read(&mut FramerSource { reader, io }, dest),
            None => reader.read(io, dest),
        };

        if matches!(result, Ok(0)) {
            // a finished chunked body may carry trailer fields
            if let Some(trailer) = self.reader.take_trailer() {
                let merged = parse_fields(trailer, &mut self.headers);
                return self.seal(merged.map(|()| 0));
            }
        }
        self.seal(result)
    }

    /// End the transaction; the connection borrow is handed back to its
    /// owner on drop, undisposed.
    pub fn close(&mut self) {
        self.state = State::Closed;
        trace!("transaction closed");
    }

    fn seal<T>(&mut self, result: Result<T, ProtoError>) -> Result<T, ProtoError> {
        if let Err(err) = &result {
            if err.is_fatal() {
                warning!("transaction failed: {err}");
                self.conn.set_keep_alive(false);
            }
        }
        result
    }
}

// ===== Request emission =====

impl Transaction<'_> {
    fn send_inner(&mut self, options: &Options<'_>) -> Result<(), ProtoError> {
        let mut head = BytesMut::with_capacity(256);

        head.extend_from_slice(options.method.as_str().as_bytes());
        head.extend_from_slice(b" ");
        head.extend_from_slice(options.target.as_bytes());
        head.extend_from_slice(b" HTTP/1.1\r\n");

        if !options.headers.contains_key(HOST) {
            head.extend_from_slice(b"Host: ");
            head.extend_from_slice(self.conn.host().as_bytes());
            let default_port = if self.conn.tls() { 443 } else { 80 };
            if self.conn.port() != default_port {
                head.extend_from_slice(b":");
                head.extend_from_slice(itoa::Buffer::new().format(self.conn.port()).as_bytes());
            }
            head.extend_from_slice(b"\r\n");
        }
        if !options.headers.contains_key(USER_AGENT) {
            head.extend_from_slice(USER_AGENT_LINE.as_bytes());
        }
        if !options.headers.contains_key(CONNECTION) {
            head.extend_from_slice(b"Connection: keep-alive\r\n");
        }
        if !options.headers.contains_key(ACCEPT) {
            head.extend_from_slice(b"Accept: */*\r\n");
        }
        if !options.headers.contains_key(ACCEPT_ENCODING) {
            head.extend_from_slice(b"Accept-Encoding: gzip, deflate, zstd\r\n");
        }
        if !options.headers.contains_key(TE) {
            head.extend_from_slice(b"TE: gzip, deflate\r\n");
        }

        match options.body {
            Framing::Chunked => {
                head.extend_from_slice(b"Transfer-Encoding: ");
                if !options.coding.is_identity() {
                    head.extend_from_slice(options.coding.as_str().as_bytes());
                    head.extend_from_slice(b", ");
                }
                head.extend_from_slice(b"chunked\r\n");
            }
            Framing::Fixed(n) => {
                head.extend_from_slice(b"Content-Length: ");
                head.extend_from_slice(itoa::Buffer::new().format(n).as_bytes());
                head.extend_from_slice(b"\r\n");
            }
            Framing::None => {}
        }

        for (name, value) in &options.headers {
            if value.is_empty() {
                continue;
            }
            head.extend_from_slice(name.as_str().as_bytes());
            head.extend_from_slice(b": ");
            head.extend_from_slice(value.as_bytes());
            head.extend_from_slice(b"\r\n");
        }
        head.extend_from_slice(b"\r\n");

        if connection_close(&options.headers) {
            self.conn.set_keep_alive(false);
        }

        let io = self.conn.transport();
        io.write_all(&head)?;
        io.flush()?;
        Ok(())
    }

    fn finish_inner(&mut self) -> Result<(), ProtoError> {
        let Self { conn, writer, encoder, .. } = self;
        let io = conn.transport();

        if let Some(mut encoder) = encoder.take() {
            encoder.finish(&mut FramerSink { writer: &mut *writer, io: &mut *io })?;
        }
        writer.finish(io)?;
        io.flush()?;
        Ok(())
    }
}

// ===== Response ingestion =====

impl Transaction<'_> {
    fn wait_inner(&mut self) -> Result<(), ProtoError> {
        let head_max = self.head_max;
        let mut head = BytesMut::new();
        let mut scanner = crate::parser::HeadScanner::new();
        let io = self.conn.transport();

        while !scanner.is_finished() {
            if io.peek().is_empty() && io.fill()? == 0 {
                return Err(ProtoError::UnexpectedEof);
            }
            if head.len() >= head_max {
                return Err(ProtoError::ExceededLimit);
            }

            let budget = head_max - head.len();
            let window = io.peek();
            let window = &window[..window.len().min(budget)];
            let consumed = scanner.feed(window);
            head.extend_from_slice(&window[..consumed]);
            io.consume(consumed);
        }

        // status line first, the rest are field lines
        let Some(line_end) = head.iter().position(|&b| b == b'\n') else {
            return Err(ProtoError::HeadersInvalid);
        };
        let mut status_line = head.split_to(line_end + 1);
        while matches!(status_line.last(), Some(&(b'\r' | b'\n'))) {
            status_line.truncate(status_line.len() - 1);
        }

        let (status, reason) = parse_status_line(&status_line.freeze())?;
        self.status = status;
        self.reason = reason;

        parse_fields(head, &mut self.headers)?;
        self.decide_framing()
    }

    fn decide_framing(&mut self) -> Result<(), ProtoError> {
        if self.method.opens_tunnel() && self.status.is_success() {
            // tunnel mode: headers are delivered, the stream is the
            // caller's from here on and must never be re-served as a
            // fresh HTTP channel
            self.tunnel = true;
            self.framing = Framing::None;
            self.reader = FramedReader::Empty;
            self.conn.set_keep_alive(false);
            return Ok(());
        }

        let mut transfer_coding = Coding::Identity;
        let mut framing = if self.headers.contains_key(TRANSFER_ENCODING) {
            let mut last_chunked = false;
            for value in self.headers.get_all(TRANSFER_ENCODING) {
                for token in value.as_bytes().split(|&b| b == b',') {
                    let token = trim(token);
                    if token.is_empty() {
                        continue;
                    }
                    last_chunked = false;
                    if token.eq_ignore_ascii_case(b"chunked") {
                        last_chunked = true;
                        continue;
                    }
                    let coding = Coding::from_token(token)
                        .ok_or(ProtoError::UnsupportedTransferEncoding)?;
                    if !coding.is_identity() {
                        if !transfer_coding.is_identity() {
                            return Err(ProtoError::UnsupportedTransferEncoding);
                        }
                        transfer_coding = coding;
                    }
                }
            }
            // chunked must be the final coding; Content-Length, if any,
            // is ignored
            if !last_chunked {
                return Err(ProtoError::UnsupportedTransferEncoding);
            }
            Framing::Chunked
        } else if self.headers.contains_key(CONTENT_LENGTH) {
            let mut length = None;
            for value in self.headers.get_all(CONTENT_LENGTH) {
                let parsed =
                    parse_decimal(trim(value.as_bytes())).ok_or(ProtoError::HeadersInvalid)?;
                if length.is_some_and(|len| len != parsed) {
                    return Err(ProtoError::HeadersInvalid);
                }
                length = Some(parsed);
            }
            match length {
                Some(length) => Framing::Fixed(length),
                None => return Err(ProtoError::HeadersInvalid),
            }
        } else {
            Framing::None
        };

        let mut coding = transfer_coding;
        if let Some(value) = self.headers.get(CONTENT_ENCODING) {
            let content_coding = Coding::from_token(trim(value.as_bytes()))
                .ok_or(ProtoError::UnsupportedTransferEncoding)?;
            if !content_coding.is_identity() {
                if !coding.is_identity() {
                    // at most one coding may be active
                    return Err(ProtoError::UnsupportedTransferEncoding);
                }
                coding = content_coding;
            }
        }

        let forced_empty = self.method.suppresses_response_body()
            || self.status.is_informational()
            || matches!(self.status.as_u16(), 204 | 304);

        if forced_empty {
            framing = Framing::None;
            coding = Coding::Identity;
            self.reader = FramedReader::Empty;
        } else {
            self.reader = match framing {
                Framing::None => {
                    // the body runs to the end of the stream, nothing to
                    // reuse afterwards
                    self.conn.set_keep_alive(false);
                    FramedReader::UntilEof { done: false }
                }
                Framing::Fixed(remaining) => FramedReader::Fixed { remaining },
                Framing::Chunked => FramedReader::chunked(self.head_max),
            };
        }
        self.framing = framing;

        self.decoder = if coding.is_identity() {
            None
        } else {
            match self.codecs.and_then(|codecs| codecs.decoder(coding)) {
                Some(decoder) => Some(decoder),
                None => return Err(ProtoError::DecompressionFailed),
            }
        };

        if connection_close(&self.headers) {
            self.conn.set_keep_alive(false);
        }

        Ok(())
    }
}

impl std::fmt::Debug for Transaction<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("state", &self.state)
            .field("status", &self.status)
            .field("framing", &self.framing)
            .finish_non_exhaustive()
    }
}

// ===== Parsing =====

fn parse_status_line(line: &Bytes) -> Result<(StatusCode, Bytes), ProtoError> {
    if !line.starts_with(b"HTTP/1.1 ") {
        return Err(ProtoError::HeadersInvalid);
    }

    let digits = match line.get(9..12).and_then(|digits| digits.first_chunk::<3>()) {
        Some(digits) => digits,
        None => return Err(ProtoError::HeadersInvalid),
    };
    let status = StatusCode::from_digits(digits).ok_or(ProtoError::HeadersInvalid)?;

    let reason = match line.get(12) {
        None => Bytes::new(),
        Some(&b' ') => line.slice(13..),
        Some(_) => return Err(ProtoError::HeadersInvalid),
    };

    Ok((status, reason))
}

/// Parse `name: value` lines into `headers`, blank lines skipped.
///
/// Names are lowercased in place before the block is frozen, so the
/// appended entries share the block's allocation.
fn parse_fields(mut block: BytesMut, headers: &mut HeaderMap) -> Result<(), ProtoError> {
    let mut fields = Vec::new();
    let mut offset = 0;

    while offset < block.len() {
        let Some(nl) = block[offset..].iter().position(|&b| b == b'\n') else {
            return Err(ProtoError::HeadersInvalid);
        };
        let mut end = offset + nl;
        let next = end + 1;
        if end > offset && block[end - 1] == b'\r' {
            end -= 1;
        }

        if end == offset {
            // blank line
            offset = next;
            continue;
        }

        let line = &mut block[offset..end];
        if matches!(line[0], b' ' | b'\t') {
            // obsolete line folding
            return Err(ProtoError::HeadersInvalid);
        }
        let Some(colon) = line.iter().position(|&b| b == b':') else {
            return Err(ProtoError::HeadersInvalid);
        };
        if colon == 0 {
            return Err(ProtoError::HeadersInvalid);
        }

        let (name, value) = line.split_at_mut(colon);
        for byte in name.iter_mut() {
            if !is_token(*byte) {
                return Err(ProtoError::HeadersInvalid);
            }
            byte.make_ascii_lowercase();
        }

        let value = &value[1..];
        let (from, to) = match value.iter().position(|&b| !matches!(b, b' ' | b'\t')) {
            Some(from) => {
                let to = match value.iter().rposition(|&b| !matches!(b, b' ' | b'\t')) {
                    Some(last) => last + 1,
                    None => value.len(),
                };
                (from, to)
            }
            None => (0, 0),
        };
        if value[from..to].iter().any(|&b| !is_value_byte(b)) {
            return Err(ProtoError::HeadersInvalid);
        }

        let value_at = offset + colon + 1;
        fields.push((offset..offset + colon, value_at + from..value_at + to));
        offset = next;
    }

    let shared = block.freeze();
    for (name, value) in fields {
        let name = HeaderName::from_bytes_lowercase(shared.slice(name))
            .map_err(|_| ProtoError::HeadersInvalid)?;
        let value =
            HeaderValue::from_bytes(shared.slice(value)).map_err(|_| ProtoError::HeadersInvalid)?;
        headers.append(name, value);
    }

    Ok(())
}

fn connection_close(headers: &HeaderMap) -> bool {
    headers.get_all(CONNECTION).any(|value| {
        value
            .as_bytes()
            .split(|&b| b == b',')
            .any(|token| trim(token).eq_ignore_ascii_case(b"close"))
    })
}

fn trim(mut bytes: &[u8]) -> &[u8] {
    while let Some((&(b' ' | b'\t'), rest)) = bytes.split_first() {
        bytes = rest;
    }
    while let Some((&(b' ' | b'\t'), rest)) = bytes.split_last() {
        bytes = rest;
    }
    bytes
}

fn parse_decimal(bytes: &[u8]) -> Option<u64> {
    if bytes.is_empty() {
        return None;
    }
    let mut value: u64 = 0;
    for &byte in bytes {
        if !byte.is_ascii_digit() {
            return None;
        }
        value = value
            .checked_mul(10)?
            .checked_add((byte - b'0') as u64)?;
    }
    Some(value)
}

// ===== Codec plumbing =====

/// Framed write path presented to an installed [`Encoder`].
struct FramerSink<'a> {
    writer: &'a mut FramedWriter,
    io: &'a mut dyn Transport,
}

impl BodySink for FramerSink<'_> {
    fn write(&mut self, bytes: &[u8]) -> Result<usize, ProtoError> {
        self.writer.write(self.io, bytes)
    }
}

/// Framed read path presented to an installed [`Decoder`].
struct FramerSource<'a> {
    reader: &'a mut FramedReader,
    io: &'a mut dyn Transport,
}

impl BodySource for FramerSource<'_> {
    fn read(&mut self, dest: &mut [u8]) -> Result<usize, ProtoError> {
        self.reader.read(self.io, dest)
    }
}
