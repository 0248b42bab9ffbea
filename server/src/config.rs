//! Per-process control settings.
//!
//! Every value here must match what the simulator on the other end was
//! built with. Nothing is negotiated; a mismatch shows up as bad control,
//! or as a frame length error when the cart counts differ.

use crate::planner::Direction;
use shared::{
    ANGLE_GAIN, BRAKE_CLEARANCE, CART_WIDTH, DEFAULT_TARGET, NUM_CARTS, TRACK_LIMIT,
};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("cart count must be at least 1")]
    NoCarts,

    #[error("leader index {leader} is out of range for {carts} carts")]
    LeaderOutOfRange { leader: usize, carts: usize },

    #[error("track limit must be positive and finite, got {0}")]
    InvalidTrackLimit(f64),

    #[error("{name} must be non-negative and finite, got {value}")]
    InvalidDistance { name: &'static str, value: f64 },

    #[error("idle timeout must be greater than zero")]
    ZeroIdleTimeout,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ControlConfig {
    /// Number of carts in every session.
    pub carts: usize,
    /// Half-length `L` of the track `[-L, L]`.
    pub track_limit: f64,
    pub cart_width: f64,
    pub brake_clearance: f64,
    pub angle_gain: f64,
    /// Target handed to carts that get no planning.
    pub default_target: f64,
    /// Cart that receives a planned, collision-avoiding target.
    pub leader: usize,
    pub leader_direction: Direction,
    /// How long a session waits for the next frame. `None` waits forever.
    pub idle_timeout: Option<Duration>,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            carts: NUM_CARTS,
            track_limit: TRACK_LIMIT,
            cart_width: CART_WIDTH,
            brake_clearance: BRAKE_CLEARANCE,
            angle_gain: ANGLE_GAIN,
            default_target: DEFAULT_TARGET,
            leader: 0,
            leader_direction: Direction::Right,
            idle_timeout: None,
        }
    }
}

impl ControlConfig {
    pub fn with_carts(carts: usize) -> Self {
        Self {
            carts,
            ..Self::default()
        }
    }

    /// Distance the planner keeps between the leader and whatever it is
    /// approaching.
    pub fn braking_buffer(&self) -> f64 {
        self.brake_clearance + self.cart_width
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.carts == 0 {
            return Err(ConfigError::NoCarts);
        }
        if self.leader >= self.carts {
            return Err(ConfigError::LeaderOutOfRange {
                leader: self.leader,
                carts: self.carts,
            });
        }
        if !self.track_limit.is_finite() || self.track_limit <= 0.0 {
            return Err(ConfigError::InvalidTrackLimit(self.track_limit));
        }
        for (name, value) in [
            ("cart width", self.cart_width),
            ("brake clearance", self.brake_clearance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidDistance { name, value });
            }
        }
        if self.idle_timeout == Some(Duration::ZERO) {
            return Err(ConfigError::ZeroIdleTimeout);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_default_config_is_valid() {
        let config = ControlConfig::default();
        assert_eq!(config.carts, 2);
        assert_eq!(config.leader, 0);
        assert_eq!(config.leader_direction, Direction::Right);
        assert!(config.idle_timeout.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_braking_buffer() {
        let config = ControlConfig::default();
        assert_approx_eq!(config.braking_buffer(), 0.65);
    }

    #[test]
    fn test_rejects_zero_carts() {
        assert_eq!(
            ControlConfig::with_carts(0).validate(),
            Err(ConfigError::NoCarts)
        );
    }

    #[test]
    fn test_rejects_leader_out_of_range() {
        let config = ControlConfig {
            leader: 3,
            ..ControlConfig::with_carts(3)
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::LeaderOutOfRange {
                leader: 3,
                carts: 3
            })
        );
    }

    #[test]
    fn test_rejects_bad_track_limit() {
        for limit in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = ControlConfig {
                track_limit: limit,
                ..ControlConfig::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidTrackLimit(_))
            ));
        }
    }

    #[test]
    fn test_rejects_negative_width() {
        let config = ControlConfig {
            cart_width: -0.1,
            ..ControlConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDistance {
                name: "cart width",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_zero_idle_timeout() {
        let config = ControlConfig {
            idle_timeout: Some(Duration::ZERO),
            ..ControlConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroIdleTimeout));
    }
}
