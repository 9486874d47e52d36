//! Movement trails: compares a project's current axis position against its
//! last recorded snapshot position.

use serde::Serialize;

/// Per-axis movement below this many percentage points is treated as jitter.
pub const NOISE_FLOOR_PCT: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisPosition {
    pub sync: f64,
    pub velocity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trail {
    pub from_sync: f64,
    pub from_velocity: f64,
    pub to_sync: f64,
    pub to_velocity: f64,
}

/// Returns the trail endpoints unchanged, or `None` when there is no prior
/// position or neither axis moved by more than [`NOISE_FLOOR_PCT`].
pub fn delta(current: AxisPosition, previous: Option<AxisPosition>) -> Option<Trail> {
    let previous = previous?;
    let sync_move = (current.sync - previous.sync).abs();
    let velocity_move = (current.velocity - previous.velocity).abs();
    if sync_move <= NOISE_FLOOR_PCT && velocity_move <= NOISE_FLOOR_PCT {
        return None;
    }
    Some(Trail {
        from_sync: previous.sync,
        from_velocity: previous.velocity,
        to_sync: current.sync,
        to_velocity: current.velocity,
    })
}
