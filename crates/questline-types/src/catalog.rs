//! Content catalog: tracks → locations → missions → tasks, plus ranks.
//!
//! Catalog rows are authored by admins and read-only to learners.

use serde::{Deserialize, Serialize};

use crate::i18n::{LocalizedText, Localized, TextField};
use crate::{LocationId, MissionId, RankId, TaskId, TrackId, TypesError};

/// A learning track (e.g. "Python Path").
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct Track {
    pub id: TrackId,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub title_en: String,
    pub title_ru: String,
    pub description_en: String,
    pub description_ru: String,
    pub tagline_en: String,
    pub tagline_ru: String,
    pub icon_url: String,
    pub banner_url: String,
    pub color_theme: String,
    pub order: i64,
    pub is_active: bool,
    pub is_premium: bool,
    pub default_language: String,
}

impl Localized for Track {
    fn text(&self, field: TextField) -> LocalizedText<'_> {
        match field {
            TextField::Title => LocalizedText::new(&self.title, &self.title_ru, &self.title_en),
            TextField::Description => {
                LocalizedText::new(&self.description, &self.description_ru, &self.description_en)
            }
            TextField::Tagline => LocalizedText::without_base(&self.tagline_ru, &self.tagline_en),
            TextField::Body => LocalizedText::default(),
        }
    }
}

/// A themed world inside a track.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct Location {
    pub id: LocationId,
    /// Legacy rows may have no track.
    pub track_id: Option<TrackId>,
    pub title: String,
    pub description: String,
    pub title_en: String,
    pub title_ru: String,
    pub description_en: String,
    pub description_ru: String,
    pub order: i64,
}

impl Localized for Location {
    fn text(&self, field: TextField) -> LocalizedText<'_> {
        match field {
            TextField::Title => LocalizedText::new(&self.title, &self.title_ru, &self.title_en),
            TextField::Description => {
                LocalizedText::new(&self.description, &self.description_ru, &self.description_en)
            }
            TextField::Tagline | TextField::Body => LocalizedText::default(),
        }
    }
}

/// A completable unit with an XP reward and gating rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct Mission {
    pub id: MissionId,
    pub location_id: LocationId,
    pub title: String,
    pub description: String,
    pub title_en: String,
    pub title_ru: String,
    pub description_en: String,
    pub description_ru: String,
    /// Base reward for the first completion.
    pub xp_reward: u32,
    pub order: i64,
    pub is_active: bool,
    /// Missions that must be completed first. Directed; cycles are not rejected.
    pub prerequisites: Vec<MissionId>,
    pub min_level: u32,
    pub repeatable: bool,
    /// Percentage of `xp_reward` granted on repeat completions.
    pub repeat_xp_rate: u32,
    /// Map node position, percent of the container (0..100).
    pub pos_x: i64,
    pub pos_y: i64,
}

impl Default for Mission {
    fn default() -> Self {
        Self {
            id: 0,
            location_id: 0,
            title: String::new(),
            description: String::new(),
            title_en: String::new(),
            title_ru: String::new(),
            description_en: String::new(),
            description_ru: String::new(),
            xp_reward: 10,
            order: 0,
            is_active: true,
            prerequisites: Vec::new(),
            min_level: 1,
            repeatable: false,
            repeat_xp_rate: 0,
            pos_x: 0,
            pos_y: 0,
        }
    }
}

impl Localized for Mission {
    fn text(&self, field: TextField) -> LocalizedText<'_> {
        match field {
            TextField::Title => LocalizedText::new(&self.title, &self.title_ru, &self.title_en),
            TextField::Description => {
                LocalizedText::new(&self.description, &self.description_ru, &self.description_en)
            }
            TextField::Tagline | TextField::Body => LocalizedText::default(),
        }
    }
}

/// Kind of a mission step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    #[default]
    Story,
    Quiz,
    Code,
    Project,
    Challenge,
}

impl TaskType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Story => "story",
            Self::Quiz => "quiz",
            Self::Code => "code",
            Self::Project => "project",
            Self::Challenge => "challenge",
        }
    }
}

impl std::str::FromStr for TaskType {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "story" => Ok(Self::Story),
            "quiz" => Ok(Self::Quiz),
            "code" => Ok(Self::Code),
            "project" => Ok(Self::Project),
            "challenge" => Ok(Self::Challenge),
            other => Err(TypesError::UnknownVariant {
                kind: "task type",
                value: other.to_string(),
            }),
        }
    }
}

/// An ordered step inside a mission.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct MissionTask {
    pub id: TaskId,
    pub mission_id: MissionId,
    pub order: i64,
    pub task_type: TaskType,
    pub title: String,
    pub title_en: String,
    pub title_ru: String,
    pub body: String,
    pub body_en: String,
    pub body_ru: String,
    /// Free-form payload (quiz questions, starter code, ...).
    pub data: serde_json::Value,
    /// Display-only; not applied to profiles.
    pub xp_reward: u32,
    pub is_required: bool,
    pub estimated_minutes: u32,
    pub is_side_quest: bool,
}

impl Default for MissionTask {
    fn default() -> Self {
        Self {
            id: 0,
            mission_id: 0,
            order: 0,
            task_type: TaskType::Story,
            title: String::new(),
            title_en: String::new(),
            title_ru: String::new(),
            body: String::new(),
            body_en: String::new(),
            body_ru: String::new(),
            data: serde_json::json!({}),
            xp_reward: 0,
            is_required: true,
            estimated_minutes: 5,
            is_side_quest: false,
        }
    }
}

impl Localized for MissionTask {
    fn text(&self, field: TextField) -> LocalizedText<'_> {
        match field {
            TextField::Title => LocalizedText::new(&self.title, &self.title_ru, &self.title_en),
            TextField::Body => LocalizedText::new(&self.body, &self.body_ru, &self.body_en),
            TextField::Description | TextField::Tagline => LocalizedText::default(),
        }
    }
}

/// Display-only tier of the XP ladder.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct Rank {
    pub id: RankId,
    pub slug: String,
    pub title_en: String,
    pub title_ru: String,
    pub description_en: String,
    pub description_ru: String,
    pub min_level: u32,
    pub min_xp: u64,
    pub order: i64,
    pub icon_url: String,
}

impl Localized for Rank {
    fn text(&self, field: TextField) -> LocalizedText<'_> {
        match field {
            TextField::Title => LocalizedText::without_base(&self.title_ru, &self.title_en),
            TextField::Description => {
                LocalizedText::without_base(&self.description_ru, &self.description_en)
            }
            TextField::Tagline | TextField::Body => LocalizedText::default(),
        }
    }
}
