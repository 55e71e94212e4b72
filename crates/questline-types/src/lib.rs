//! # questline-types
//!
//! Shared domain types used across the Questline workspace: the content
//! catalog (tracks, locations, missions, tasks), per-user state (profile,
//! progress, task progress), ranks and leaderboard snapshots.
//!
//! Types that cross the HTTP boundary derive [`ts_rs::TS`] so the frontend
//! can consume generated TypeScript bindings.

pub mod account;
pub mod catalog;
pub mod i18n;
pub mod leaderboard;
pub mod profile;
pub mod progress;

/// Row identifiers (SQLite rowids).
pub type UserId = i64;
pub type TrackId = i64;
pub type LocationId = i64;
pub type MissionId = i64;
pub type TaskId = i64;
pub type ClassRoleId = i64;
pub type RankId = i64;

/// XP needed per level step.
pub const XP_PER_LEVEL: u64 = 100;

/// Level of a fresh profile.
pub const START_LEVEL: u32 = 1;

/// Maximum stars a mission completion can report.
pub const MAX_STARS: u8 = 3;

/// Period label of the lifetime leaderboard.
pub const ALL_TIME_PERIOD: &str = "all_time";

/// Error type for parsing wire values into domain enums.
#[derive(Debug, thiserror::Error)]
pub enum TypesError {
    #[error("unknown {kind}: {value}")]
    UnknownVariant {
        kind: &'static str,
        value: String,
    },
}

pub type Result<T> = std::result::Result<T, TypesError>;

#[cfg(test)]
mod tests {
    #[test]
    fn test_ts_export() {
        // Bindings are written by the per-type `export_bindings_*` tests
        // generated by `#[ts(export)]`.
    }

    #[test]
    #[ignore] // Run manually to generate bindings
    fn export_ts_bindings() {
        use ts_rs::TS;
        let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../bindings");
        std::fs::create_dir_all(&dir).expect("create bindings dir");
        crate::catalog::Mission::export_all_to(&dir).expect("export Mission");
        crate::catalog::Track::export_all_to(&dir).expect("export Track");
        crate::profile::Profile::export_all_to(&dir).expect("export Profile");
        crate::progress::Progress::export_all_to(&dir).expect("export Progress");
        crate::progress::TaskProgress::export_all_to(&dir).expect("export TaskProgress");
        crate::leaderboard::LeaderboardEntry::export_all_to(&dir).expect("export LeaderboardEntry");
    }
}
