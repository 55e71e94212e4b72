//! XP and level rule.
//!
//! `level = xp / 100 + 1`, and a stored level never goes down. This is the
//! only place that assigns `Profile::level`.

use questline_types::profile::Profile;
use questline_types::{START_LEVEL, XP_PER_LEVEL};

/// Level implied by a cumulative XP total.
pub fn level_for_xp(xp: u64) -> u32 {
    let level = xp / XP_PER_LEVEL + u64::from(START_LEVEL);
    u32::try_from(level).unwrap_or(u32::MAX)
}

/// Add `amount` XP to `profile` and raise its level if a threshold was crossed.
///
/// Returns `true` when the level changed.
pub fn add_xp(profile: &mut Profile, amount: u64) -> bool {
    profile.xp = profile.xp.saturating_add(amount);
    let new_level = level_for_xp(profile.xp);
    if new_level > profile.level {
        tracing::debug!(
            user_id = profile.user_id,
            from = profile.level,
            to = new_level,
            "level up"
        );
        profile.level = new_level;
        true
    } else {
        false
    }
}
