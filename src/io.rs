//! Byte transport seam.
//!
//! The protocol core is I/O-agnostic: it drives any [`Transport`] the
//! caller injects. [`IoBuffer`] is the provided implementation over a
//! blocking [`Read`] + [`Write`] pair, with fixed windows on both
//! directions.

use std::io::{self, Read, Write};

/// Bidirectional buffered byte channel consumed by the protocol core.
///
/// Every read or write side method may block; blocking here is the only
/// suspension point of the whole crate.
pub trait Transport {
    /// Make the readable window non-empty, blocking as needed.
    ///
    /// Returns the window length, `Ok(0)` only at end of stream.
    fn fill(&mut self) -> io::Result<usize>;

    /// Current readable window; may be empty before the first
    /// [`fill`][Transport::fill].
    fn peek(&self) -> &[u8];

    /// Advance the readable window by `n` bytes.
    fn consume(&mut self, n: usize);

    /// Buffered read, at least one byte unless the stream ended.
    fn read(&mut self, dest: &mut [u8]) -> io::Result<usize>;

    /// Buffered write, returns how many bytes were accepted.
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize>;

    /// Drain the write buffer, then the underlying stream.
    fn flush(&mut self) -> io::Result<()>;

    /// Release the transport; no method may be called afterwards.
    fn close(&mut self);

    /// Write the whole of `bytes`.
    fn write_all(&mut self, mut bytes: &[u8]) -> io::Result<()> {
        while !bytes.is_empty() {
            let n = self.write(bytes)?;
            if n == 0 {
                return Err(io::ErrorKind::WriteZero.into());
            }
            bytes = &bytes[n..];
        }
        Ok(())
    }
}

// ===== IoBuffer =====

const READ_CAPACITY: usize = 16 * 1024;
const WRITE_CAPACITY: usize = 16 * 1024;

/// Buffered [`Transport`] over a blocking byte stream.
///
/// Reads land in a fixed window delimited by `[start, end)`; writes
/// accumulate until the buffer fills or [`flush`][Transport::flush] drains
/// it.
pub struct IoBuffer<IO> {
    io: IO,
    rbuf: Box<[u8]>,
    rstart: usize,
    rend: usize,
    wbuf: Vec<u8>,
    wcap: usize,
}

impl<IO> IoBuffer<IO> {
    /// Create [`IoBuffer`] with 16 KiB windows on both directions.
    pub fn new(io: IO) -> Self {
        Self::with_capacity(READ_CAPACITY, WRITE_CAPACITY, io)
    }

    /// Create [`IoBuffer`] with the given window sizes.
    pub fn with_capacity(read: usize, write: usize, io: IO) -> Self {
        Self {
            io,
            rbuf: vec![0; read.max(1)].into_boxed_slice(),
            rstart: 0,
            rend: 0,
            wbuf: Vec::with_capacity(write),
            wcap: write.max(1),
        }
    }

    /// Returns the underlying stream, discarding buffered bytes.
    pub fn into_inner(self) -> IO {
        self.io
    }
}

impl<IO: Read + Write> IoBuffer<IO> {
    fn flush_wbuf(&mut self) -> io::Result<()> {
        if !self.wbuf.is_empty() {
            self.io.write_all(&self.wbuf)?;
            self.wbuf.clear();
        }
        Ok(())
    }
}

impl<IO: Read + Write> Transport for IoBuffer<IO> {
    fn fill(&mut self) -> io::Result<usize> {
        if self.rstart < self.rend {
            return Ok(self.rend - self.rstart);
        }

        self.rstart = 0;
        self.rend = self.io.read(&mut self.rbuf)?;
        Ok(self.rend)
    }

    fn peek(&self) -> &[u8] {
        &self.rbuf[self.rstart..self.rend]
    }

    fn consume(&mut self, n: usize) {
        debug_assert!(n <= self.rend - self.rstart);
        self.rstart += n;
        if self.rstart == self.rend {
            self.rstart = 0;
            self.rend = 0;
        }
    }

    fn read(&mut self, dest: &mut [u8]) -> io::Result<usize> {
        if dest.is_empty() {
            return Ok(0);
        }

        // bypass the window for reads that dwarf it
        if self.rstart == self.rend && dest.len() >= self.rbuf.len() {
            return self.io.read(dest);
        }

        if self.fill()? == 0 {
            return Ok(0);
        }

        let window = &self.rbuf[self.rstart..self.rend];
        let n = window.len().min(dest.len());
        dest[..n].copy_from_slice(&window[..n]);
        self.consume(n);
        Ok(n)
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        if self.wbuf.len() + bytes.len() > self.wcap {
            self.flush_wbuf()?;
        }

        // bypass the buffer for writes that dwarf it
        if bytes.len() >= self.wcap {
            return self.io.write(bytes);
        }

        self.wbuf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_wbuf()?;
        self.io.flush()
    }

    fn close(&mut self) {
        // best effort; the stream itself is released when the owner drops
        let _ = self.flush();
    }
}

impl<IO> std::fmt::Debug for IoBuffer<IO> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IoBuffer")
            .field("read_window", &(self.rend - self.rstart))
            .field("write_buffered", &self.wbuf.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// In-memory blocking stream double.
    struct Duplex {
        input: io::Cursor<Vec<u8>>,
        output: Vec<u8>,
    }

    impl Read for Duplex {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for Duplex {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.output.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn duplex(input: &[u8]) -> IoBuffer<Duplex> {
        IoBuffer::with_capacity(8, 8, Duplex {
            input: io::Cursor::new(input.to_vec()),
            output: Vec::new(),
        })
    }

    #[test]
    fn fill_peek_consume() {
        let mut io = duplex(b"hello world");

        assert_eq!(io.fill().unwrap(), 8);
        assert_eq!(io.peek(), b"hello wo");
        io.consume(5);
        assert_eq!(io.peek(), b" wo");

        // filling with a non-empty window is a no-op
        assert_eq!(io.fill().unwrap(), 3);
        io.consume(3);

        assert_eq!(io.fill().unwrap(), 3);
        assert_eq!(io.peek(), b"rld");
        io.consume(3);
        assert_eq!(io.fill().unwrap(), 0);
    }

    #[test]
    fn read_drains_window_first() {
        let mut io = duplex(b"abcdef");
        io.fill().unwrap();
        io.consume(1);

        let mut dest = [0u8; 4];
        assert_eq!(io.read(&mut dest).unwrap(), 4);
        assert_eq!(&dest, b"bcde");
        assert_eq!(io.read(&mut dest).unwrap(), 1);
        assert_eq!(dest[0], b'f');
        assert_eq!(io.read(&mut dest).unwrap(), 0);
    }

    #[test]
    fn write_buffers_until_flush() {
        let mut io = duplex(b"");

        io.write_all(b"abc").unwrap();
        assert!(io.io.output.is_empty());

        io.flush().unwrap();
        assert_eq!(io.io.output, b"abc");

        // overflowing the window drains it
        io.write_all(b"0123456").unwrap();
        io.write_all(b"89").unwrap();
        assert_eq!(io.io.output, b"abc0123456");
        io.flush().unwrap();
        assert_eq!(io.io.output, b"abc012345689");
    }
}
