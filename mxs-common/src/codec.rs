//! Newline-delimited JSON framing
//!
//! Each message is one JSON object followed by `\n`. Writers flush after every
//! message so progress reaches the peer while computation is still running.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Upper bound on a single incoming line when the caller does not pick one
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 4096;

/// Writes one message per line; the only writer for its stream
pub struct FrameWriter<W> {
    inner: W,
    frames_written: usize,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            frames_written: 0,
        }
    }

    /// Serialize, terminate with `\n`, write and flush
    ///
    /// Any I/O failure is reported as [`Error::TransportWrite`].
    pub async fn write_message<T: Serialize>(&mut self, message: &T) -> Result<()> {
        let mut line = serde_json::to_vec(message)
            .map_err(|e| Error::Internal(format!("failed to encode message: {}", e)))?;
        line.push(b'\n');

        self.inner
            .write_all(&line)
            .await
            .map_err(|e| Error::TransportWrite(e.to_string()))?;
        self.inner
            .flush()
            .await
            .map_err(|e| Error::TransportWrite(e.to_string()))?;

        self.frames_written += 1;
        Ok(())
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    /// Flush and shut down the write half
    pub async fn shutdown(&mut self) -> Result<()> {
        self.inner
            .shutdown()
            .await
            .map_err(|e| Error::TransportWrite(e.to_string()))
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Reads one message per line with a per-line size limit
pub struct FrameReader<R> {
    inner: BufReader<R>,
    max_message_bytes: usize,
    line: Vec<u8>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_limit(inner, DEFAULT_MAX_MESSAGE_BYTES)
    }

    pub fn with_limit(inner: R, max_message_bytes: usize) -> Self {
        Self {
            inner: BufReader::new(inner),
            max_message_bytes,
            line: Vec::new(),
        }
    }

    /// Read the next message
    ///
    /// Returns `Ok(None)` on a clean end of stream. A truncated final line,
    /// an oversized line or undecodable JSON is [`Error::ProtocolDecode`].
    pub async fn read_message<T: DeserializeOwned>(&mut self) -> Result<Option<T>> {
        self.line.clear();

        // One extra byte distinguishes "exactly at the limit" from "over it"
        let limit = self.max_message_bytes as u64 + 1;
        let read = (&mut self.inner)
            .take(limit)
            .read_until(b'\n', &mut self.line)
            .await?;

        if read == 0 {
            return Ok(None);
        }

        if self.line.last() != Some(&b'\n') {
            if self.line.len() > self.max_message_bytes {
                return Err(Error::ProtocolDecode(format!(
                    "message exceeds {} bytes",
                    self.max_message_bytes
                )));
            }
            return Err(Error::ProtocolDecode(
                "stream ended in the middle of a message".to_string(),
            ));
        }

        serde_json::from_slice(&self.line)
            .map(Some)
            .map_err(|e| Error::ProtocolDecode(e.to_string()))
    }
}
