//! Mission lifecycle: `not_started → in_progress → completed`.
//!
//! A completed mission stays completed. Repeat completions of a repeatable
//! mission keep accumulating attempts and XP at `repeat_xp_rate` percent of
//! the base reward; repeats of a non-repeatable mission earn nothing.

use questline_types::catalog::Mission;
use questline_types::progress::{Progress, ProgressStatus};
use questline_types::MAX_STARS;

/// Outcome of a completion, reported back to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    /// XP granted by this completion (not cumulative).
    pub xp_added: u64,
    /// Whether this was the first completion.
    pub first_time: bool,
}

/// Record a start attempt.
pub fn start(progress: &mut Progress, now: u64) {
    progress.attempts = progress.attempts.saturating_add(1);
    if progress.started_at.is_none() {
        progress.started_at = Some(now);
    }
    progress.last_started_at = Some(now);
    if progress.status != ProgressStatus::Completed {
        progress.status = ProgressStatus::InProgress;
    }
}

/// XP a completion is worth given whether the mission was already completed.
pub fn completion_reward(mission: &Mission, already_completed: bool) -> u64 {
    let base = u64::from(mission.xp_reward);
    match (already_completed, mission.repeatable) {
        (false, _) => base,
        (true, false) => 0,
        (true, true) => base * u64::from(mission.repeat_xp_rate) / 100,
    }
}

/// Clamp a caller-reported star count to `0..=3`.
pub fn clamp_stars(stars: i64) -> u8 {
    // bounded by MAX_STARS, fits in u8
    stars.clamp(0, i64::from(MAX_STARS)) as u8
}

/// Record a completion and return the XP it earned.
///
/// The caller applies `xp_added` to the profile via [`crate::xp::add_xp`].
pub fn complete(progress: &mut Progress, mission: &Mission, stars: i64, now: u64) -> Completion {
    let first_time = !progress.completed;
    let xp_added = completion_reward(mission, progress.completed);

    if first_time {
        progress.completed = true;
        progress.completed_at = Some(now);
    }
    progress.status = ProgressStatus::Completed;
    progress.xp_earned = progress.xp_earned.saturating_add(xp_added);
    progress.stars = clamp_stars(stars);

    Completion {
        xp_added,
        first_time,
    }
}
