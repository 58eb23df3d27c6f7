//! Framed text transport beneath the client.
//!
//! The client only needs "send one JSON document, receive one JSON document".
//! [`FrameReader`] and [`FrameWriter`] are that seam; [`LineReader`] and
//! [`LineWriter`] implement it as newline-delimited JSON over any tokio byte
//! stream.

use async_trait::async_trait;
use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, ReadHalf,
    WriteHalf,
};

use crate::error::TransportError;

#[async_trait]
pub trait FrameReader: Send {
    /// Reads the next frame. `Ok(None)` means the peer closed the channel.
    /// After an error for which [`TransportError::is_frame_error`] holds, the
    /// reader must be positioned at the following frame.
    async fn read_frame(&mut self) -> Result<Option<String>, TransportError>;
}

#[async_trait]
pub trait FrameWriter: Send {
    async fn write_frame(&mut self, frame: &str) -> Result<(), TransportError>;
}

pub struct LineReader<R> {
    inner: BufReader<R>,
    buf: Vec<u8>,
    max_frame_bytes: usize,
}

impl<R: AsyncRead + Unpin + Send> LineReader<R> {
    pub fn new(inner: R, max_frame_bytes: usize) -> Self {
        Self { inner: BufReader::new(inner), buf: Vec::new(), max_frame_bytes }
    }

    /// Consumes the rest of the current line, returning how many bytes were
    /// dropped before the terminator.
    async fn skip_line(&mut self) -> Result<usize, TransportError> {
        let mut skipped = 0;
        loop {
            let (consumed, terminated) = {
                let available = self.inner.fill_buf().await?;
                match available.iter().position(|byte| *byte == b'\n') {
                    Some(at) => (at + 1, true),
                    None => (available.len(), false),
                }
            };
            self.inner.consume(consumed);
            if terminated {
                return Ok(skipped + consumed - 1);
            }
            if consumed == 0 {
                return Ok(skipped);
            }
            skipped += consumed;
        }
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> FrameReader for LineReader<R> {
    async fn read_frame(&mut self) -> Result<Option<String>, TransportError> {
        loop {
            self.buf.clear();
            let limit = self.max_frame_bytes as u64 + 1;
            let read = (&mut self.inner).take(limit).read_until(b'\n', &mut self.buf).await?;
            if read == 0 {
                return Ok(None);
            }

            if !self.buf.ends_with(b"\n") && self.buf.len() > self.max_frame_bytes {
                let size = self.buf.len() + self.skip_line().await?;
                return Err(TransportError::FrameTooLarge { size, limit: self.max_frame_bytes });
            }

            let mut line = self.buf.as_slice();
            if let Some(stripped) = line.strip_suffix(b"\n") {
                line = stripped.strip_suffix(b"\r").unwrap_or(stripped);
            }
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            let frame = std::str::from_utf8(line).map_err(|_| TransportError::InvalidUtf8)?;
            log::trace!("line: << {} bytes", frame.len());
            return Ok(Some(frame.to_owned()));
        }
    }
}

pub struct LineWriter<W> {
    inner: W,
}

impl<W: AsyncWrite + Unpin + Send> LineWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> FrameWriter for LineWriter<W> {
    async fn write_frame(&mut self, frame: &str) -> Result<(), TransportError> {
        debug_assert!(!frame.contains('\n'), "frame must be a single line");
        self.inner.write_all(frame.as_bytes()).await?;
        self.inner.write_all(b"\n").await?;
        self.inner.flush().await?;
        log::trace!("line: >> {} bytes", frame.len());
        Ok(())
    }
}

/// Splits a duplex byte stream into a line reader and a line writer.
pub fn split_lines<S>(
    stream: S,
    max_frame_bytes: usize,
) -> (LineReader<ReadHalf<S>>, LineWriter<WriteHalf<S>>)
where
    S: AsyncRead + AsyncWrite + Send,
{
    let (read, write) = tokio::io::split(stream);
    (LineReader::new(read, max_frame_bytes), LineWriter::new(write))
}
