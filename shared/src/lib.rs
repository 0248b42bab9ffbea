//! Types and constants shared by the control server and its clients.
//!
//! Both ends of a session must agree on the cart count and the per-cart
//! sensor layout; there is no negotiation on the wire, so the defaults live
//! here and every binary starts from them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod codec;

pub const DEFAULT_PORT: u16 = 25533;
pub const NUM_CARTS: usize = 2;
pub const SENSORS_PER_CART: usize = 4;
pub const TRACK_LIMIT: f64 = 4.8;
pub const CART_WIDTH: f64 = 0.4;
pub const BRAKE_CLEARANCE: f64 = 0.25;
/// Force per radian of pole angle: 10 units at 80 degrees.
pub const ANGLE_GAIN: f64 = 10.0 / (80.0 * 0.01745);
/// Target position for every cart that is not the planned leader.
pub const DEFAULT_TARGET: f64 = 3.0;

/// Sentinel string either side sends to end a session.
pub const BYE: &str = "bye";

/// One message on the wire. The bincode variant index is the payload tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    Text(String),
    Values(Vec<f64>),
}

impl Message {
    pub fn bye() -> Self {
        Message::Text(BYE.to_string())
    }

    pub fn is_bye(&self) -> bool {
        matches!(self, Message::Text(text) if text == BYE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("expected {expected} values, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Readings for a single cart during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CartState {
    pub angle: f64,
    pub angle_rate: f64,
    pub position: f64,
    pub position_rate: f64,
}

impl CartState {
    pub fn new(angle: f64, angle_rate: f64, position: f64, position_rate: f64) -> Self {
        Self {
            angle,
            angle_rate,
            position,
            position_rate,
        }
    }

    /// A level, motionless cart parked at `position`.
    pub fn at_rest(position: f64) -> Self {
        Self::new(0.0, 0.0, position, 0.0)
    }
}

/// Per-tick readings for every cart, in cart index order.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorFrame {
    carts: Vec<CartState>,
}

impl SensorFrame {
    pub fn new(carts: Vec<CartState>) -> Self {
        Self { carts }
    }

    /// Parses the flat wire layout `(angle, angleRate, position, positionRate)`
    /// per cart. Anything other than exactly `4 * cart_count` values is rejected.
    pub fn from_values(values: &[f64], cart_count: usize) -> Result<Self, FrameError> {
        let expected = cart_count * SENSORS_PER_CART;
        if values.len() != expected {
            return Err(FrameError::LengthMismatch {
                expected,
                actual: values.len(),
            });
        }

        let carts = values
            .chunks_exact(SENSORS_PER_CART)
            .map(|chunk| CartState::new(chunk[0], chunk[1], chunk[2], chunk[3]))
            .collect();

        Ok(Self { carts })
    }

    pub fn to_values(&self) -> Vec<f64> {
        self.carts
            .iter()
            .flat_map(|cart| [cart.angle, cart.angle_rate, cart.position, cart.position_rate])
            .collect()
    }

    pub fn carts(&self) -> &[CartState] {
        &self.carts
    }

    pub fn cart(&self, index: usize) -> Option<&CartState> {
        self.carts.get(index)
    }

    pub fn len(&self) -> usize {
        self.carts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.carts.is_empty()
    }
}

/// One force per cart, in cart index order.
#[derive(Debug, Clone, PartialEq)]
pub struct ActuatorFrame {
    forces: Vec<f64>,
}

impl ActuatorFrame {
    pub fn new(forces: Vec<f64>) -> Self {
        Self { forces }
    }

    pub fn from_values(values: Vec<f64>, cart_count: usize) -> Result<Self, FrameError> {
        if values.len() != cart_count {
            return Err(FrameError::LengthMismatch {
                expected: cart_count,
                actual: values.len(),
            });
        }
        Ok(Self { forces: values })
    }

    pub fn forces(&self) -> &[f64] {
        &self.forces
    }

    pub fn len(&self) -> usize {
        self.forces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forces.is_empty()
    }
}

impl From<ActuatorFrame> for Message {
    fn from(frame: ActuatorFrame) -> Self {
        Message::Values(frame.forces)
    }
}

impl From<&SensorFrame> for Message {
    fn from(frame: &SensorFrame) -> Self {
        Message::Values(frame.to_values())
    }
}
