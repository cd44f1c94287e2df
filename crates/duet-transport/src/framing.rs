//! Newline framing over an arbitrary byte stream.
//!
//! A frame is every byte up to (but excluding) a `\n`. Whatever arrives
//! after the last newline is kept in the buffer and becomes the prefix of
//! the next frame, so a frame is never emitted before its newline shows up.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};

/// How much spare capacity to make room for before each socket read.
const READ_CHUNK: usize = 4096;

/// Longest frame accepted, newline excluded (16 MiB).
///
/// A peer that sends more than this without a newline gets an
/// [`InvalidData`](std::io::ErrorKind::InvalidData) error instead of an
/// ever-growing buffer.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Splits a byte stream into newline-terminated frames.
///
/// # Cancel safety
///
/// [`next_frame`](Self::next_frame) is cancel-safe: the only suspension
/// point is a single `read_buf`, and bytes are appended to the internal
/// buffer only after that read completes. Dropping the future (e.g. the
/// losing branch of a `tokio::select!`) never loses data.
#[derive(Debug)]
pub struct FrameReader<R> {
    inner: R,
    buf: Vec<u8>,
    /// Bytes at the front of `buf` already known to contain no newline.
    scanned: usize,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    /// Wraps a reader with an empty frame buffer.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: Vec::new(),
            scanned: 0,
        }
    }

    /// Reads the next complete frame, without its trailing newline.
    ///
    /// Returns `Ok(None)` once the stream reaches end-of-file. An
    /// unterminated fragment still buffered at that point is discarded.
    ///
    /// Fails with `InvalidData` once more than [`MAX_FRAME_LEN`] bytes are
    /// buffered without a newline. The reader is not usable after that.
    pub async fn next_frame(&mut self) -> io::Result<Option<Vec<u8>>> {
        loop {
            if let Some(frame) = self.take_frame() {
                return Ok(Some(frame));
            }
            if self.buf.len() > MAX_FRAME_LEN {
                tracing::warn!(
                    len = self.buf.len(),
                    max = MAX_FRAME_LEN,
                    "frame exceeds maximum length"
                );
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("frame exceeds {MAX_FRAME_LEN} bytes without a newline"),
                ));
            }

            self.buf.reserve(READ_CHUNK);
            let n = self.inner.read_buf(&mut self.buf).await?;
            if n == 0 {
                if !self.buf.is_empty() {
                    tracing::trace!(
                        len = self.buf.len(),
                        "dropping unterminated fragment at end of stream"
                    );
                }
                return Ok(None);
            }
        }
    }

    /// Returns the bytes received but not yet returned as a frame.
    #[cfg(test)]
    fn buffered(&self) -> &[u8] {
        &self.buf
    }

    /// Pops the first complete frame out of the buffer, if there is one.
    fn take_frame(&mut self) -> Option<Vec<u8>> {
        match self.buf[self.scanned..].iter().position(|&b| b == b'\n') {
            Some(offset) => {
                let end = self.scanned + offset;
                let mut frame: Vec<u8> = self.buf.drain(..=end).collect();
                frame.pop();
                self.scanned = 0;
                Some(frame)
            }
            None => {
                self.scanned = self.buf.len();
                None
            }
        }
    }
}
