//! Leaderboard snapshot rows.

use serde::{Deserialize, Serialize};

use crate::{TrackId, TypesError, UserId};

/// What a leaderboard ranks over.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardScope {
    #[default]
    Global,
    Track,
    Friends,
}

impl LeaderboardScope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Track => "track",
            Self::Friends => "friends",
        }
    }
}

impl std::str::FromStr for LeaderboardScope {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "global" => Ok(Self::Global),
            "track" => Ok(Self::Track),
            "friends" => Ok(Self::Friends),
            other => Err(TypesError::UnknownVariant {
                kind: "leaderboard scope",
                value: other.to_string(),
            }),
        }
    }
}

/// One ranked row. Unique per (track, user, scope, period_label).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct LeaderboardEntry {
    pub id: i64,
    pub track_id: Option<TrackId>,
    pub user_id: UserId,
    pub scope: LeaderboardScope,
    /// e.g. `all_time`, `weekly_2025W46`, `monthly_2025-11`.
    pub period_label: String,
    pub xp_total: u64,
    pub position: u32,
    pub snapshot_at: u64,
}
