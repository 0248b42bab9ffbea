//! # Pendulum Control Server Library
//!
//! Control-side counterpart of a simulated cart-pole rig. One or more carts,
//! each balancing a pole, share a bounded track. The simulator streams every
//! cart's readings once per tick over a TCP connection; the server answers
//! each tick with one force per cart before the next readings arrive.
//!
//! ## Control Pipeline
//!
//! For every sensor frame the session runs the same pure pipeline:
//!
//! 1. The **planner** (`planner`) picks a target for the leader cart: the
//!    nearest obstacle ahead of it in its travel direction, cart or track
//!    end, pulled back by a braking buffer.
//! 2. Every other cart gets a fixed default target. Only the leader avoids
//!    collisions.
//! 3. The **controller** (`controller`) turns each cart's angle, angular
//!    rate, position, velocity and target into a force. The angle term
//!    dominates; the tracking term softly brakes near the track ends.
//!
//! ## Sessions
//!
//! Each accepted connection becomes a `session::Session` running in its own
//! task. A session owns its connection and a private copy of the
//! configuration, so nothing mutable is shared between clients. Frames
//! alternate strictly: one actuator frame per sensor frame, no pipelining.
//!
//! A session ends when the client sends `"bye"`, when the stream ends, or
//! on the first transport or protocol error. On every one of those paths
//! the server tries to answer `"bye"` and then releases the connection.
//! Informational strings other than `"bye"` are logged and ignored.
//!
//! ## Module Organization
//!
//! - `config`: per-process settings and their validation
//! - `planner`: leader target selection
//! - `controller`: the feedback law
//! - `session`: per-connection state machine
//! - `network`: TCP accept loop
//! - `error`: session error taxonomy
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ControlConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::bind("0.0.0.0:25533", ControlConfig::default()).await?;
//!
//!     // Accepts clients until Ctrl+C; each one runs in its own task
//!     server
//!         .run_until(async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod network;
pub mod planner;
pub mod session;
