//! TCP listener that turns every accepted connection into its own session task

use crate::config::ControlConfig;
use crate::session::{CloseReason, Session, SessionOutcome};
use log::{error, info, warn};
use std::future::{pending, Future};
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};

/// Accepts connections and hands each one a fresh session.
///
/// The listener is the only thing sessions have in common. Each session
/// gets its own copy of the configuration and its own connection, so a
/// misbehaving client can only ever take down its own session.
pub struct Server {
    listener: TcpListener,
    config: ControlConfig,
    next_session_id: u64,
}

impl Server {
    pub async fn bind(addr: &str, config: ControlConfig) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        Ok(Server {
            listener,
            config,
            next_session_id: 1,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn config(&self) -> &ControlConfig {
        &self.config
    }

    /// Accepts connections forever.
    pub async fn run(self) {
        self.run_until(pending::<()>()).await
    }

    /// Accepts connections until `shutdown` resolves. Sessions already
    /// running are left to finish on their own.
    pub async fn run_until<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!("Waiting for connection");

        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            self.spawn_session(stream, addr);
                        }
                        Err(e) => {
                            error!("Error accepting connection: {}", e);
                            tokio::time::sleep(Duration::from_millis(10)).await;
                        }
                    }
                }
                _ = &mut shutdown => {
                    info!("Server shutting down");
                    break;
                }
            }
        }
    }

    fn spawn_session(&mut self, stream: TcpStream, addr: SocketAddr) {
        let id = self.next_session_id;
        self.next_session_id += 1;

        if let Err(e) = stream.set_nodelay(true) {
            warn!("Session {}: could not disable Nagle: {}", id, e);
        }
        info!("New client accepted from {} (session {})", addr, id);

        let session = Session::new(id, stream, self.config.clone());
        tokio::spawn(async move {
            let outcome: SessionOutcome = session.run().await;
            match &outcome.reason {
                CloseReason::Failed(_) => {
                    warn!("Session {} with {} ended abnormally: {}", id, addr, outcome.reason)
                }
                _ => info!("Session {} with {} ended: {}", id, addr, outcome.reason),
            }
            info!("Session closed. Waiting for new connection...");
        });
    }
}
