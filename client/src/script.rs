//! Scripted sensor frames for exercising a control server by hand.

use rand::Rng;
use shared::{CartState, SensorFrame};

pub struct Script {
    positions: Vec<f64>,
    jitter: f64,
}

impl Script {
    pub fn new(positions: Vec<f64>, carts: usize, jitter: f64) -> Result<Self, String> {
        if positions.len() != carts {
            return Err(format!(
                "got {} positions for {} carts",
                positions.len(),
                carts
            ));
        }
        if !jitter.is_finite() || jitter < 0.0 {
            return Err(format!("jitter must be non-negative, got {}", jitter));
        }
        Ok(Self { positions, jitter })
    }

    /// Level, motionless carts at the scripted positions, with pole angles
    /// drawn uniformly from `[-jitter, jitter]`.
    pub fn frame<R: Rng>(&self, rng: &mut R) -> SensorFrame {
        let carts = self
            .positions
            .iter()
            .map(|&position| {
                let angle = if self.jitter > 0.0 {
                    rng.gen_range(-self.jitter..=self.jitter)
                } else {
                    0.0
                };
                CartState::new(angle, 0.0, position, 0.0)
            })
            .collect();
        SensorFrame::new(carts)
    }
}
