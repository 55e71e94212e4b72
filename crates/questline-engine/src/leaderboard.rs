//! Ranking XP totals into leaderboard positions.

use questline_types::UserId;

/// One ranked user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ranked {
    pub user_id: UserId,
    pub xp_total: u64,
    /// 1-based.
    pub position: u32,
}

/// Rank `(user, xp)` totals: highest XP first, ties by ascending user id.
/// Users with no XP are left out. At most `limit` rows are returned.
pub fn rank(totals: impl IntoIterator<Item = (UserId, u64)>, limit: usize) -> Vec<Ranked> {
    let mut rows: Vec<(UserId, u64)> = totals.into_iter().filter(|(_, xp)| *xp > 0).collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    rows.into_iter()
        .take(limit)
        .zip(1u32..)
        .map(|((user_id, xp_total), position)| Ranked {
            user_id,
            xp_total,
            position,
        })
        .collect()
}
