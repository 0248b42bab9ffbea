//! Collision-avoiding target selection for a single cart.
//!
//! The planned cart is assumed to travel in one fixed direction. Its target is
//! the nearest obstacle ahead of it (another cart or the end of the track),
//! pulled back by the braking buffer so it stops short instead of at contact.

use crate::config::ControlConfig;
use shared::SensorFrame;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    /// +1 for rightward travel, -1 for leftward.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Left => -1.0,
            Direction::Right => 1.0,
        }
    }
}

impl From<bool> for Direction {
    fn from(going_right: bool) -> Self {
        if going_right {
            Direction::Right
        } else {
            Direction::Left
        }
    }
}

/// Computes a safe target position for `cart` moving in `direction`.
///
/// The target is the obstacle picked by [`nearest_ahead`] (or the track end
/// when there is none), pulled back by the braking buffer. With nothing ahead
/// the target is `±(track_limit - braking_buffer)`.
///
/// Returns `None` if `cart` is not in the frame.
pub fn follow(
    frame: &SensorFrame,
    cart: usize,
    direction: Direction,
    config: &ControlConfig,
) -> Option<f64> {
    let position = frame.cart(cart)?.position;
    let sign = direction.sign();

    let obstacle = match nearest_ahead(frame, cart, direction, config.track_limit) {
        Some(neighbor) => frame.carts()[neighbor].position,
        None => sign * config.track_limit,
    };

    Some(obstacle - sign * config.braking_buffer())
}

/// Index of the cart `follow` steers around, or `None` when the track end is
/// the nearest obstacle.
///
/// A neighbor counts only if it is strictly ahead and strictly closer than
/// the boundary at `±track_limit`. Neighbors are scanned in ascending index
/// order and only a strictly closer one replaces the current pick, so the
/// lowest index wins a tie. Carts level with or behind the planned cart are
/// ignored.
pub fn nearest_ahead(
    frame: &SensorFrame,
    cart: usize,
    direction: Direction,
    track_limit: f64,
) -> Option<usize> {
    let position = frame.cart(cart)?.position;
    let sign = direction.sign();

    // distance to the track boundary in the travel direction
    let mut min_gap = (sign * track_limit - position).abs();
    let mut nearest = None;

    for (index, other) in frame.carts().iter().enumerate() {
        if index == cart {
            continue;
        }
        let gap = other.position - position;
        if gap * sign > 0.0 && gap.abs() < min_gap {
            min_gap = gap.abs();
            nearest = Some(index);
        }
    }

    nearest
}
