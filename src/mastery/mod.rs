//! Mastery model: per-symbol, per-form proficiency with confusion tracking.
//!
//! Contains:
//! - FormMastery - counters and the recent-outcome window for one (symbol, form)
//! - SymbolMastery - four forms plus confusions and derived scores
//! - MasteryStore - the keyed container, the only writer of mastery records

mod form;
mod store;

pub use form::{FormMastery, FormSet, MAX_RECENT_OUTCOMES};
pub(crate) use form::{push_outcome, validate_window};
pub use store::{
    ConfusionPair, ContextualMastery, MasteryStore, PracticeCandidate, SymbolMastery,
};

use chrono::{DateTime, Utc};

const RECENT_WEIGHT: f64 = 0.7;
const OVERALL_WEIGHT: f64 = 0.3;
const RECENCY_HORIZON_HOURS: f64 = 48.0;
const RECENCY_FLOOR: f64 = 0.5;

/// Fractional hours from `earlier` to `now`, never negative.
pub fn hours_since(earlier: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let ms = (now - earlier).num_milliseconds().max(0);
    ms as f64 / 3_600_000.0
}

/// `max(0.5, 1 - hours/48)`: full weight when fresh, floored after two days.
pub fn recency_bonus(last_seen: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (1.0 - hours_since(last_seen, now) / RECENCY_HORIZON_HOURS).max(RECENCY_FLOOR)
}

/// Blend of the recent window and lifetime ratio; recent results dominate.
pub fn blended_accuracy<'a, I>(recent: I, correct: u32, exposures: u32) -> f64
where
    I: ExactSizeIterator<Item = &'a u8>,
{
    if exposures == 0 {
        return 0.0;
    }
    let overall = correct as f64 / exposures as f64;
    let len = recent.len();
    let recent = if len == 0 {
        0.0
    } else {
        recent.map(|&v| v as f64).sum::<f64>() / len as f64
    };
    recent * RECENT_WEIGHT + overall * OVERALL_WEIGHT
}
