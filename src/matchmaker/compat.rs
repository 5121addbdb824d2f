use chrono::{DateTime, Utc};

use crate::modes::GameMode;
use crate::queue::QueueEntry;

/// Rating gap allowed between two freshly queued players.
pub const BASE_RATING_GAP: i64 = 100;

/// Additional gap granted per full relaxation step waited.
pub const GAP_PER_STEP: i64 = 30;

/// Length of one relaxation step.
pub const STEP_SECONDS: i64 = 10;

/// Maximum rating difference admissible after waiting `wait_seconds`. The
/// window only widens with time; this is the sole relaxation mechanism.
pub fn max_rating_gap(wait_seconds: i64) -> i64 {
    BASE_RATING_GAP + GAP_PER_STEP * (wait_seconds.max(0) / STEP_SECONDS)
}

/// Whether two queued players may share a match. Symmetric and reflexive;
/// not transitive, so greedy grouping can leave suboptimal partitions.
pub fn compatible(a: &QueueEntry, b: &QueueEntry, mode: GameMode, now: DateTime<Utc>) -> bool {
    let longest_wait = a.wait(now).num_seconds().max(b.wait(now).num_seconds());
    let gap = i64::from(a.rating - b.rating).abs();
    if gap > max_rating_gap(longest_wait) {
        return false;
    }

    match mode {
        // Both sides either lack the preference or share it.
        GameMode::Fps => match (&a.preferences.region, &b.preferences.region) {
            (Some(ra), Some(rb)) => ra == rb,
            (None, None) => true,
            _ => false,
        },
        GameMode::Chess => match (&a.preferences.time_control, &b.preferences.time_control) {
            (Some(ta), Some(tb)) => ta == tb,
            (None, None) => true,
            _ => false,
        },
        GameMode::Moba | GameMode::Rts => true,
    }
}
