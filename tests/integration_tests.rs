//! Integration tests for the control server and client
//!
//! These tests run a real server on an ephemeral port and talk to it over TCP.

use assert_approx_eq::assert_approx_eq;
use client::network::{ClientError, ControlClient};
use serde::Serialize;
use server::config::ControlConfig;
use server::network::Server;
use shared::codec::{CodecError, Connection};
use shared::{CartState, Message, SensorFrame, ANGLE_GAIN};
use std::net::SocketAddr;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct TestServer {
    addr: SocketAddr,
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl TestServer {
    async fn start(config: ControlConfig) -> Self {
        let server = Server::bind("127.0.0.1:0", config).await.unwrap();
        let addr = server.local_addr().unwrap();
        let (stop, stop_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(server.run_until(async {
            let _ = stop_rx.await;
        }));
        Self { addr, stop, handle }
    }

    fn addr(&self) -> String {
        self.addr.to_string()
    }

    async fn stop(self) {
        let _ = self.stop.send(());
        self.handle.await.unwrap();
    }
}

/// END-TO-END CONTROL SCENARIOS
mod scenario_tests {
    use super::*;

    /// Both carts level, cart 1 parked at 2: the leader is steered toward
    /// cart 1 minus the braking buffer, cart 1 toward the default target.
    #[tokio::test]
    async fn two_carts_level() {
        let server = TestServer::start(ControlConfig::default()).await;
        let mut client = ControlClient::connect(&server.addr(), 2).await.unwrap();

        let frame = SensorFrame::from_values(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 2.0, 0.0], 2)
            .unwrap();
        let actions = client.exchange(&frame).await.unwrap();

        assert_eq!(actions.len(), 2);
        assert_approx_eq!(actions.forces()[0], (0.0 - (2.0 - 0.65)) / 2.0);
        assert_approx_eq!(actions.forces()[1], (2.0 - 3.0) / 2.0);

        assert!(client.close().await.unwrap());
        server.stop().await;
    }

    /// The angle term dominates once the poles tilt.
    #[tokio::test]
    async fn tilted_poles() {
        let server = TestServer::start(ControlConfig::default()).await;
        let mut client = ControlClient::connect(&server.addr(), 2).await.unwrap();

        let frame = SensorFrame::new(vec![
            CartState::new(0.1, 0.0, 0.0, 0.0),
            CartState::new(-0.1, 0.0, 3.0, 0.0),
        ]);
        let actions = client.exchange(&frame).await.unwrap();

        // cart 0 stops short of cart 1 at 3 - 0.65; cart 1 sits on its target
        assert_approx_eq!(actions.forces()[0], 0.1 * ANGLE_GAIN + (0.0 - 2.35) / 2.0);
        assert_approx_eq!(actions.forces()[1], -0.1 * ANGLE_GAIN);

        client.close().await.unwrap();
        server.stop().await;
    }

    /// Every frame gets exactly one finite force per cart.
    #[tokio::test]
    async fn many_ticks_with_three_carts() {
        let server = TestServer::start(ControlConfig::with_carts(3)).await;
        let mut client = ControlClient::connect(&server.addr(), 3).await.unwrap();

        for tick in 0..100 {
            let t = tick as f64 * 0.01;
            let frame = SensorFrame::new(vec![
                CartState::new(t.sin() * 0.2, t.cos(), -2.0 + t, 0.1),
                CartState::new(-0.05, 0.0, 0.5, -0.2),
                CartState::new(0.0, 0.3, 2.5 - t, 0.0),
            ]);
            let actions = client.exchange(&frame).await.unwrap();
            assert_eq!(actions.len(), 3);
            assert!(actions.forces().iter().all(|f| f.is_finite()));
        }

        assert_eq!(client.ticks(), 100);
        client.close().await.unwrap();
        server.stop().await;
    }
}

/// SESSION LIFECYCLE TESTS
mod lifecycle_tests {
    use super::*;

    /// Saying bye first gets a bye back and no actuator frame.
    #[tokio::test]
    async fn bye_as_first_message() {
        let server = TestServer::start(ControlConfig::default()).await;
        let stream = TcpStream::connect(server.addr).await.unwrap();
        let mut conn = Connection::new(stream);

        conn.write_message(&Message::bye()).await.unwrap();
        assert_eq!(conn.read_message().await.unwrap(), Message::bye());
        assert!(matches!(conn.read_message().await, Err(CodecError::Closed)));

        server.stop().await;
    }

    /// Informational strings are logged and otherwise ignored.
    #[tokio::test]
    async fn informational_string_keeps_session_open() {
        let server = TestServer::start(ControlConfig::default()).await;
        let mut client = ControlClient::connect(&server.addr(), 2).await.unwrap();

        client.send_text("hello from the rig").await.unwrap();
        let actions = client
            .exchange(&SensorFrame::new(vec![CartState::default(); 2]))
            .await
            .unwrap();
        assert_eq!(actions.len(), 2);

        assert!(client.close().await.unwrap());
        server.stop().await;
    }

    /// A cart count mismatch ends that session only; the listener keeps
    /// accepting.
    #[tokio::test]
    async fn wrong_length_isolated() {
        let server = TestServer::start(ControlConfig::default()).await;

        let mut mismatched = ControlClient::connect(&server.addr(), 3).await.unwrap();
        let frame = SensorFrame::new(vec![CartState::default(); 3]);
        assert!(matches!(
            mismatched.exchange(&frame).await,
            Err(ClientError::ServerClosed)
        ));

        for _ in 0..3 {
            let mut client = ControlClient::connect(&server.addr(), 2).await.unwrap();
            let actions = client
                .exchange(&SensorFrame::new(vec![CartState::default(); 2]))
                .await
                .unwrap();
            assert_eq!(actions.len(), 2);
            client.close().await.unwrap();
        }

        server.stop().await;
    }

    #[derive(Serialize)]
    enum UnknownMessage {
        #[allow(dead_code)]
        Text(String),
        #[allow(dead_code)]
        Values(Vec<f64>),
        Reset { cart: u32 },
    }

    /// A payload with an unknown tag is a protocol error for that session.
    #[tokio::test]
    async fn unknown_message_tag() {
        let server = TestServer::start(ControlConfig::default()).await;

        let mut stream = TcpStream::connect(server.addr).await.unwrap();
        let payload = bincode::serialize(&UnknownMessage::Reset { cart: 0 }).unwrap();
        stream
            .write_all(&(payload.len() as u32).to_be_bytes())
            .await
            .unwrap();
        stream.write_all(&payload).await.unwrap();

        let mut conn = Connection::new(stream);
        assert!(conn.read_message().await.unwrap().is_bye());

        let mut client = ControlClient::connect(&server.addr(), 2).await.unwrap();
        assert!(client
            .exchange(&SensorFrame::new(vec![CartState::default(); 2]))
            .await
            .is_ok());

        server.stop().await;
    }

    /// Dropping the connection without bye is a normal end of stream.
    #[tokio::test]
    async fn abrupt_disconnect() {
        let server = TestServer::start(ControlConfig::default()).await;

        {
            let mut client = ControlClient::connect(&server.addr(), 2).await.unwrap();
            client
                .exchange(&SensorFrame::new(vec![CartState::default(); 2]))
                .await
                .unwrap();
        }

        let mut client = ControlClient::connect(&server.addr(), 2).await.unwrap();
        assert!(client
            .exchange(&SensorFrame::new(vec![CartState::default(); 2]))
            .await
            .is_ok());

        server.stop().await;
    }
}

/// CONCURRENCY TESTS
mod concurrency_tests {
    use super::*;

    /// Sessions running side by side see only their own frames.
    #[tokio::test]
    async fn parallel_sessions() {
        let server = TestServer::start(ControlConfig::default()).await;
        let addr = server.addr();

        let mut tasks = Vec::new();
        for i in 0..8 {
            let addr = addr.clone();
            tasks.push(tokio::spawn(async move {
                let mut client = ControlClient::connect(&addr, 2).await.unwrap();
                let position = i as f64 * 0.25;
                let frame = SensorFrame::new(vec![
                    CartState::at_rest(-4.0),
                    CartState::at_rest(position),
                ]);

                for _ in 0..20 {
                    let actions = client.exchange(&frame).await.unwrap();
                    assert_approx_eq!(actions.forces()[1], (position - 3.0) / 2.0);
                }
                client.close().await.unwrap()
            }));
        }

        for task in tasks {
            assert!(task.await.unwrap());
        }

        server.stop().await;
    }
}
