//! One client's control session.
//!
//! A session owns its connection and a private copy of the configuration.
//! It alternates strictly between reading one sensor frame and writing one
//! actuator frame until the client says `"bye"`, the stream ends, or
//! something goes wrong. Every exit path runs through `close`, which tries
//! to acknowledge with `"bye"` and then releases the connection.

use crate::config::ControlConfig;
use crate::controller::compute_force;
use crate::error::SessionError;
use crate::planner::follow;
use log::{debug, error, info, trace, warn};
use shared::codec::{CodecError, Connection};
use shared::{ActuatorFrame, Message, SensorFrame};
use std::fmt;
use tokio::io::{AsyncRead, AsyncWrite};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingFrame,
    Processing,
    Responding,
    Closing,
}

#[derive(Debug)]
pub enum CloseReason {
    ClientBye,
    EndOfStream,
    Failed(SessionError),
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::ClientBye => write!(f, "client said bye"),
            CloseReason::EndOfStream => write!(f, "end of stream"),
            CloseReason::Failed(e) => write!(f, "{}", e),
        }
    }
}

#[derive(Debug)]
pub struct SessionOutcome {
    pub id: u64,
    /// Actuator frames sent.
    pub ticks: u64,
    pub reason: CloseReason,
    /// Whether the closing `"bye"` made it onto the wire.
    pub acknowledged: bool,
}

/// Computes one tick's forces. The leader cart gets a planned target, every
/// other cart gets `default_target`.
pub fn plan_actions(frame: &SensorFrame, config: &ControlConfig) -> ActuatorFrame {
    let forces = frame
        .carts()
        .iter()
        .enumerate()
        .map(|(index, cart)| {
            // index comes from the frame itself, so `follow` always has a target
            let planned = if index == config.leader {
                follow(frame, index, config.leader_direction, config)
            } else {
                None
            };
            let target = planned.unwrap_or(config.default_target);
            compute_force(cart, target, config)
        })
        .collect();

    ActuatorFrame::new(forces)
}

pub struct Session<S> {
    id: u64,
    connection: Connection<S>,
    config: ControlConfig,
    state: SessionState,
    ticks: u64,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(id: u64, stream: S, config: ControlConfig) -> Self {
        Self {
            id,
            connection: Connection::new(stream),
            config,
            state: SessionState::AwaitingFrame,
            ticks: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Drives the session to completion. Consumes the session, so closing
    /// happens exactly once.
    pub async fn run(mut self) -> SessionOutcome {
        let reason = match self.control_loop().await {
            Ok(reason) => reason,
            Err(e) => {
                if e.is_protocol() {
                    warn!("Session {}: {}", self.id, e);
                } else {
                    error!("Session {}: {}", self.id, e);
                }
                CloseReason::Failed(e)
            }
        };

        self.close(reason).await
    }

    async fn control_loop(&mut self) -> Result<CloseReason, SessionError> {
        loop {
            self.transition(SessionState::AwaitingFrame);

            let values = match self.next_message().await? {
                None => return Ok(CloseReason::EndOfStream),
                Some(message) if message.is_bye() => return Ok(CloseReason::ClientBye),
                Some(Message::Text(text)) => {
                    info!("Session {}: string received: {}", self.id, text);
                    continue;
                }
                Some(Message::Values(values)) => values,
            };

            self.transition(SessionState::Processing);
            let frame = SensorFrame::from_values(&values, self.config.carts)?;
            for (index, cart) in frame.carts().iter().enumerate() {
                debug!(
                    "Session {} < cart[{}]: {} {} {} {}",
                    self.id, index, cart.angle, cart.angle_rate, cart.position, cart.position_rate
                );
            }
            let actions = plan_actions(&frame, &self.config);

            self.transition(SessionState::Responding);
            debug!("Session {} > {:?}", self.id, actions.forces());
            let reply = Message::from(actions);
            self.connection.write_message(&reply).await?;
            self.ticks += 1;
        }
    }

    async fn next_message(&mut self) -> Result<Option<Message>, SessionError> {
        let idle_timeout = self.config.idle_timeout;
        let read = self.connection.read_message();

        let result = match idle_timeout {
            Some(limit) => tokio::time::timeout(limit, read)
                .await
                .map_err(|_| SessionError::IdleTimeout(limit))?,
            None => read.await,
        };

        match result {
            Ok(message) => Ok(Some(message)),
            Err(CodecError::Closed) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn close(mut self, reason: CloseReason) -> SessionOutcome {
        self.transition(SessionState::Closing);
        info!("Session {}: closing down connection ({})", self.id, reason);

        let acknowledged = match self.connection.write_message(&Message::bye()).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Session {}: unable to send bye: {}", self.id, e);
                false
            }
        };

        if let Err(e) = self.connection.shutdown().await {
            debug!("Session {}: shutdown failed: {}", self.id, e);
        }

        info!("Session {} closed after {} ticks", self.id, self.ticks);

        SessionOutcome {
            id: self.id,
            ticks: self.ticks,
            reason,
            acknowledged,
        }
    }

    fn transition(&mut self, next: SessionState) {
        trace!("Session {}: {:?} -> {:?}", self.id, self.state, next);
        self.state = next;
    }
}
