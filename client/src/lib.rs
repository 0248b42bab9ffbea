//! # Pendulum Control Client Library
//!
//! Client side of the control protocol, as spoken by a simulator or a test
//! rig. A `network::ControlClient` connects to the control server, sends one
//! sensor frame per tick and gets back one force per cart.
//!
//! The client does no physics. Whatever drives it is responsible for
//! producing readings and pacing ticks; the server only reacts.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::ControlClient;
//! use shared::{CartState, SensorFrame};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = ControlClient::connect("127.0.0.1:25533", 2).await?;
//!
//!     let frame = SensorFrame::new(vec![CartState::at_rest(0.0), CartState::at_rest(2.0)]);
//!     let actions = client.exchange(&frame).await?;
//!     println!("forces: {:?}", actions.forces());
//!
//!     client.close().await?;
//!     Ok(())
//! }
//! ```

pub mod network;
