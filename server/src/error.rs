use shared::codec::CodecError;
use shared::FrameError;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Anything that ends a session early. All variants are fatal to the owning
/// session and to nothing else.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("bad sensor frame: {0}")]
    FrameLength(#[from] FrameError),

    #[error("no frame received within {0:?}")]
    IdleTimeout(Duration),
}

impl SessionError {
    /// True when the peer sent something we could not use, as opposed to the
    /// connection itself failing.
    pub fn is_protocol(&self) -> bool {
        matches!(self, SessionError::Protocol(_) | SessionError::FrameLength(_))
    }
}

impl From<CodecError> for SessionError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Io(e) => SessionError::Transport(e),
            CodecError::Closed => SessionError::Transport(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed by peer",
            )),
            other => SessionError::Protocol(other.to_string()),
        }
    }
}
