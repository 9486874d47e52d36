//! Score engine: pure transformations from raw ratings to plottable metrics.
//!
//! Every function here is total over well-typed input. Ratings are expected
//! in [1,5]; out-of-range input yields out-of-range output deterministically
//! instead of an error, and the write path is responsible for keeping bad
//! ratings out of the store in the first place.

use crate::models::{ProjectEvaluation, Quadrant};
use std::collections::BTreeMap;

/// vision / resonance / context contributions to Strategic Sync.
pub const SYNC_WEIGHTS: (f64, f64, f64) = (0.4, 0.3, 0.3);
/// market / speed / friction contributions to Value Velocity.
pub const VELOCITY_WEIGHTS: (f64, f64, f64) = (0.4, 0.4, 0.2);
/// Rescales a max rating of 5 to a 100% axis.
pub const RATING_SCALE: f64 = 20.0;
/// Canonical quadrant cut on both axes.
pub const DEFAULT_QUADRANT_THRESHOLD: f64 = 60.0;
/// Share handed to every project when no hours are reported at all.
pub const ZERO_HOURS_SHARE_PCT: f64 = 20.0;

pub fn compute_axes(evaluation: &ProjectEvaluation) -> (f64, f64) {
    let (wv, wr, wc) = SYNC_WEIGHTS;
    let (wm, ws, wf) = VELOCITY_WEIGHTS;
    let sync = (f64::from(evaluation.vision_score) * wv
        + f64::from(evaluation.resonance_score) * wr
        + f64::from(evaluation.context_score) * wc)
        * RATING_SCALE;
    let velocity = (f64::from(evaluation.market_score) * wm
        + f64::from(evaluation.speed_score) * ws
        + f64::from(evaluation.friction_score) * wf)
        * RATING_SCALE;
    (sync, velocity)
}

/// Boundary values count as meeting the threshold on both axes, so every
/// (sync, velocity) pair lands in exactly one quadrant.
pub fn classify(sync: f64, velocity: f64, threshold: f64) -> Quadrant {
    match (sync >= threshold, velocity >= threshold) {
        (true, true) => Quadrant::Star,
        (true, false) => Quadrant::Pivot,
        (false, true) => Quadrant::Risk,
        (false, false) => Quadrant::Stop,
    }
}

/// Each project's share of total reported work hours, as a percentage.
/// Falls back to [`ZERO_HOURS_SHARE_PCT`] per project when the total is zero.
pub fn asset_share(projects: &[ProjectEvaluation]) -> BTreeMap<String, f64> {
    let total: f64 = projects.iter().map(|p| p.work_hours).sum();
    projects
        .iter()
        .map(|p| {
            let share = if total > 0.0 {
                p.work_hours / total * 100.0
            } else {
                ZERO_HOURS_SHARE_PCT
            };
            (p.id.clone(), share)
        })
        .collect()
}

/// Monthly profit per reported hour; 0 by convention when no hours are
/// reported so the metric is always displayable.
pub fn return_on_hours(evaluation: &ProjectEvaluation) -> f64 {
    if evaluation.work_hours > 0.0 {
        evaluation.actual_profit / evaluation.work_hours
    } else {
        0.0
    }
}
