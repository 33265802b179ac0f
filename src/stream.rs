//! Stream adapters between caller-owned byte streams and the `png` crate.
//!
//! The decoder side needs `BufRead + Seek`; callers only have to provide
//! `Read + Seek`. The encoder side counts bytes and turns flush failures
//! into [`CodecError::Io`].

use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};

use crate::CodecError;

/// Buffered, seekable read side of a borrowed stream.
pub(crate) struct SourceStream<R> {
    inner: BufReader<R>,
}

impl<R: Read + Seek> SourceStream<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            inner: BufReader::new(inner),
        }
    }

    /// Read until `buf` is full or the stream ends. Returns the byte count.
    pub(crate) fn read_full(&mut self, buf: &mut [u8]) -> Result<usize, CodecError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(CodecError::Io(e)),
            }
        }
        Ok(filled)
    }

    /// Fill `buf` completely; running out of data is an I/O error.
    pub(crate) fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), CodecError> {
        let n = self.read_full(buf)?;
        if n < buf.len() {
            return Err(CodecError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("stream ended after {} of {} bytes", n, buf.len()),
            )));
        }
        Ok(())
    }

    pub(crate) fn skip(&mut self, bytes: u64) -> Result<(), CodecError> {
        let offset = i64::try_from(bytes)
            .map_err(|_| CodecError::bitstream("chunk length overflows stream offset"))?;
        self.inner.seek_relative(offset)?;
        Ok(())
    }

    pub(crate) fn position(&mut self) -> Result<u64, CodecError> {
        Ok(self.inner.stream_position()?)
    }

    pub(crate) fn rewind_to(&mut self, position: u64) -> Result<(), CodecError> {
        self.inner.seek(SeekFrom::Start(position))?;
        Ok(())
    }
}

impl<R: Read> Read for SourceStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Read> BufRead for SourceStream<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.inner.consume(amt)
    }
}

impl<R: Read + Seek> Seek for SourceStream<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

/// Write side of a borrowed stream.
pub(crate) struct SinkStream<W> {
    inner: W,
    written: u64,
}

impl<W: Write> SinkStream<W> {
    pub(crate) fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    pub(crate) fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Flush everything down to the caller's stream.
    pub(crate) fn finish(&mut self) -> Result<(), CodecError> {
        self.inner.flush()?;
        Ok(())
    }
}

impl<W: Write> Write for SinkStream<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
