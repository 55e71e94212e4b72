//! Task attempt tracking.
//!
//! Independent of mission progress and carries no XP side effect.

use questline_types::progress::{ProgressStatus, TaskProgress};

/// Record one submission for a task.
pub fn mark_attempt(progress: &mut TaskProgress, score: i64, completed: bool, now: u64) {
    progress.attempts = progress.attempts.saturating_add(1);
    progress.last_submitted_at = Some(now);
    progress.best_score = progress.best_score.max(score);
    if completed {
        progress.status = ProgressStatus::Completed;
    } else if progress.status == ProgressStatus::NotStarted {
        progress.status = ProgressStatus::InProgress;
    }
}
