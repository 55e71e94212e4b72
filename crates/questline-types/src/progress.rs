//! Per-user completion records for missions and mission tasks.

use serde::{Deserialize, Serialize};

use crate::{MissionId, TaskId, TypesError, UserId};

/// Lifecycle status shared by mission and task progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl ProgressStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

impl std::str::FromStr for ProgressStatus {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(Self::NotStarted),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            other => Err(TypesError::UnknownVariant {
                kind: "progress status",
                value: other.to_string(),
            }),
        }
    }
}

/// Progress of one user on one mission. Unique per (user, mission).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct Progress {
    pub id: i64,
    pub user_id: UserId,
    pub mission_id: MissionId,
    pub completed: bool,
    pub status: ProgressStatus,
    /// Incremented on every start.
    pub attempts: u32,
    pub started_at: Option<u64>,
    pub last_started_at: Option<u64>,
    /// Set on the first completion only.
    pub completed_at: Option<u64>,
    /// Cumulative across repeats.
    pub xp_earned: u64,
    /// 0..=3, overwritten on each completion.
    pub stars: u8,
}

impl Progress {
    /// A not-yet-persisted record for a first start/complete.
    pub fn new(user_id: UserId, mission_id: MissionId) -> Self {
        Self {
            user_id,
            mission_id,
            ..Self::default()
        }
    }
}

/// Progress of one user on one mission task. Unique per (user, task).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct TaskProgress {
    pub id: i64,
    pub user_id: UserId,
    pub task_id: TaskId,
    pub status: ProgressStatus,
    pub attempts: u32,
    /// Maximum across submissions.
    pub best_score: i64,
    pub last_submitted_at: Option<u64>,
    /// Last submitted answer payload.
    pub answer: serde_json::Value,
}

impl TaskProgress {
    pub fn new(user_id: UserId, task_id: TaskId) -> Self {
        Self {
            id: 0,
            user_id,
            task_id,
            status: ProgressStatus::NotStarted,
            attempts: 0,
            best_score: 0,
            last_submitted_at: None,
            answer: serde_json::json!({}),
        }
    }
}
