use log::{debug, info};
use shared::codec::{CodecError, Connection};
use shared::{ActuatorFrame, FrameError, Message, SensorFrame};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("bad frame: {0}")]
    Frame(#[from] FrameError),

    #[error("unexpected message from server: {0}")]
    UnexpectedMessage(String),

    #[error("server ended the session")]
    ServerClosed,
}

/// One control session seen from the simulator's side.
pub struct ControlClient<S = TcpStream> {
    connection: Connection<S>,
    carts: usize,
    ticks: u64,
}

impl ControlClient<TcpStream> {
    pub async fn connect(addr: &str, carts: usize) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr).await.map_err(CodecError::from)?;
        stream.set_nodelay(true).map_err(CodecError::from)?;
        info!("Connected to {}", addr);
        Ok(Self::from_stream(stream, carts))
    }
}

impl<S> ControlClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn from_stream(stream: S, carts: usize) -> Self {
        Self {
            connection: Connection::new(stream),
            carts,
            ticks: 0,
        }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Sends one tick's readings and waits for the matching forces.
    pub async fn exchange(&mut self, frame: &SensorFrame) -> Result<ActuatorFrame, ClientError> {
        if frame.len() != self.carts {
            return Err(FrameError::LengthMismatch {
                expected: self.carts,
                actual: frame.len(),
            }
            .into());
        }

        self.connection.write_message(&Message::from(frame)).await?;

        match self.connection.read_message().await? {
            Message::Values(values) => {
                let actions = ActuatorFrame::from_values(values, self.carts)?;
                self.ticks += 1;
                debug!("tick {}: {:?}", self.ticks, actions.forces());
                Ok(actions)
            }
            message if message.is_bye() => Err(ClientError::ServerClosed),
            Message::Text(text) => Err(ClientError::UnexpectedMessage(text)),
        }
    }

    /// Sends an informational string. The server logs it and sends nothing back.
    pub async fn send_text(&mut self, text: &str) -> Result<(), ClientError> {
        self.connection
            .write_message(&Message::Text(text.to_string()))
            .await?;
        Ok(())
    }

    /// Ends the session. Returns whether the server acknowledged with `"bye"`.
    pub async fn close(mut self) -> Result<bool, ClientError> {
        self.connection.write_message(&Message::bye()).await?;

        let acknowledged = match self.connection.read_message().await {
            Ok(message) => message.is_bye(),
            Err(CodecError::Closed) => false,
            Err(e) => return Err(e.into()),
        };

        if let Err(e) = self.connection.shutdown().await {
            debug!("shutdown failed: {}", e);
        }
        info!("Session closed after {} ticks", self.ticks);
        Ok(acknowledged)
    }
}
