//! # questline-engine
//!
//! Progression rules for missions, tasks and XP.
//!
//! Everything here is pure: callers load rows, apply a rule, and persist the
//! mutated values inside their own transaction.
//!
//! ## Modules
//!
//! - [`availability`]: active / level / prerequisite gate shared by listing and actions
//! - [`lifecycle`]: mission start and completion, including repeat XP decay
//! - [`xp`]: the XP → level rule
//! - [`tasks`]: task attempt tracking
//! - [`leaderboard`]: ranking of XP totals into snapshot positions

pub mod availability;
pub mod leaderboard;
pub mod lifecycle;
pub mod tasks;
pub mod xp;

use questline_types::MissionId;

/// Why a mission cannot be started or completed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// Mission is switched off by its authors.
    #[error("mission {mission_id} is inactive")]
    MissionInactive {
        /// The rejected mission.
        mission_id: MissionId,
    },

    /// Profile level is below the mission gate.
    #[error("level {current} is below required level {required}")]
    LevelTooLow {
        /// Mission `min_level`.
        required: u32,
        /// Caller's level.
        current: u32,
    },

    /// Some prerequisite missions are not completed yet.
    #[error("prerequisites not completed: {missing:?}")]
    PrerequisitesNotCompleted {
        /// Prerequisites missing from the completed set, in declaration order.
        missing: Vec<MissionId>,
    },
}

/// Convenience result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
