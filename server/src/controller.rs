//! Hand-tuned feedback law turning one cart's readings into a force.
//!
//! `force = angle_gain * angle + angle_rate + position_rate + tracking`
//!
//! The angle term dominates. The two rate terms damp oscillation and the
//! tracking term pulls the cart toward its target, switching to a steeper
//! braking slope as the cart nears either end of the track.

use crate::config::ControlConfig;
use shared::CartState;

/// Linear pull toward `target`, overridden near the boundaries.
///
/// Past the target the pull is `(position - target) / 2`, capped by
/// `(track_limit - position) * 3`; short of it the pull is floored by
/// `(track_limit + position) * -3`. This is a soft limit only: the other
/// terms of the law can still push a cart past the boundary.
pub fn tracking_term(position: f64, target: f64, track_limit: f64) -> f64 {
    let offset = position - target;
    if offset > 0.0 {
        (offset / 2.0).min((track_limit - position) * 3.0)
    } else {
        (offset / 2.0).max((track_limit + position) * -3.0)
    }
}

pub fn compute_force(state: &CartState, target: f64, config: &ControlConfig) -> f64 {
    let tracking = tracking_term(state.position, target, config.track_limit);
    config.angle_gain * state.angle + state.angle_rate + state.position_rate + tracking
}
