//! Length-prefixed framing for session messages.
//!
//! Wire format: `[u32 big-endian length][bincode Message]`. One frame per
//! message, no pipelining assumptions beyond what the session enforces.

use crate::Message;
use bincode::Options;
use std::io;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Upper bound on a single payload. A sensor frame for dozens of carts is a
/// few hundred bytes, so anything near this is garbage.
pub const MAX_FRAME_BYTES: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed frame: {0}")]
    Malformed(#[from] bincode::Error),

    #[error("frame too large: {len} bytes (max {max})")]
    TooLarge { len: usize, max: usize },

    #[error("connection closed by peer")]
    Closed,
}

// Fixed-width little-endian integers, the same layout as `bincode::serialize`.
// A payload must be consumed exactly.
fn wire_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

/// Encodes a message into a complete frame, prefix included. Payloads over
/// `MAX_FRAME_BYTES` are refused, since no reader would accept them.
pub fn encode_message(message: &Message) -> Result<Vec<u8>, CodecError> {
    let payload = wire_options().serialize(message)?;
    if payload.len() > MAX_FRAME_BYTES {
        return Err(CodecError::TooLarge {
            len: payload.len(),
            max: MAX_FRAME_BYTES,
        });
    }
    let len = payload.len() as u32;

    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Decodes a payload (without its prefix). Bytes left over after the
/// message make the whole payload malformed.
pub fn decode_message(payload: &[u8]) -> Result<Message, CodecError> {
    Ok(wire_options().deserialize(payload)?)
}

/// A byte stream speaking the session framing. Owns the underlying stream.
#[derive(Debug)]
pub struct Connection<S> {
    stream: S,
    max_frame_bytes: usize,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self::with_limit(stream, MAX_FRAME_BYTES)
    }

    pub fn with_limit(stream: S, max_frame_bytes: usize) -> Self {
        Self {
            stream,
            max_frame_bytes,
        }
    }

    /// Reads the next message. A clean EOF before the length prefix yields
    /// `CodecError::Closed`; EOF inside a frame is an I/O error.
    pub async fn read_message(&mut self) -> Result<Message, CodecError> {
        let mut len_buf = [0u8; 4];
        match self.stream.read_exact(&mut len_buf).await {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Err(CodecError::Closed),
            Err(e) => return Err(e.into()),
        }

        let len = u32::from_be_bytes(len_buf) as usize;
        if len > self.max_frame_bytes {
            return Err(CodecError::TooLarge {
                len,
                max: self.max_frame_bytes,
            });
        }

        let mut payload = vec![0u8; len];
        self.stream.read_exact(&mut payload).await?;
        decode_message(&payload)
    }

    pub async fn write_message(&mut self, message: &Message) -> Result<(), CodecError> {
        let frame = encode_message(message)?;
        self.stream.write_all(&frame).await?;
        self.stream.flush().await?;
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), CodecError> {
        self.stream.shutdown().await?;
        Ok(())
    }
}
