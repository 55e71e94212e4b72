//! Response payloads.
//!
//! Localized fields are resolved against the request language here, once,
//! so domain types never carry a language themselves.

use std::collections::{HashMap, HashSet};

use questline_db::queries::{missions, profiles, progress, tasks, tracks};
use questline_engine::availability;
use questline_types::account::User;
use questline_types::catalog::{Location, Mission, MissionTask, Rank, Track};
use questline_types::i18n::{Language, Localized, TextField};
use questline_types::leaderboard::LeaderboardEntry;
use questline_types::profile::Profile;
use questline_types::progress::{Progress, ProgressStatus, TaskProgress};
use questline_types::{LocationId, MissionId, TrackId, UserId};
use rusqlite::Connection;
use serde::Serialize;

/// Compact track reference embedded in locations and leaderboard rows.
#[derive(Debug, Clone, Serialize)]
pub struct TrackRef {
    pub id: TrackId,
    pub slug: String,
    pub title: String,
    pub color_theme: String,
    pub is_premium: bool,
}

impl TrackRef {
    pub fn new(track: &Track, lang: Language) -> Self {
        Self {
            id: track.id,
            slug: track.slug.clone(),
            title: track.localized_title(lang),
            color_theme: track.color_theme.clone(),
            is_premium: track.is_premium,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    pub id: i64,
    pub mission: MissionId,
    pub task_type: &'static str,
    pub order: i64,
    pub title: String,
    pub title_en: String,
    pub title_ru: String,
    pub body: String,
    pub body_en: String,
    pub body_ru: String,
    pub data: serde_json::Value,
    pub xp_reward: u32,
    pub is_required: bool,
    pub is_side_quest: bool,
    pub estimated_minutes: u32,
    pub language: Language,
}

impl TaskView {
    pub fn new(task: &MissionTask, lang: Language) -> Self {
        Self {
            id: task.id,
            mission: task.mission_id,
            task_type: task.task_type.as_str(),
            order: task.order,
            title: task.localized_title(lang),
            title_en: task.title_en.clone(),
            title_ru: task.title_ru.clone(),
            body: task.localized(TextField::Body, lang),
            body_en: task.body_en.clone(),
            body_ru: task.body_ru.clone(),
            data: task.data.clone(),
            xp_reward: task.xp_reward,
            is_required: task.is_required,
            is_side_quest: task.is_side_quest,
            estimated_minutes: task.estimated_minutes,
            language: lang,
        }
    }
}

/// The caller's progress summary nested in a mission.
#[derive(Debug, Clone, Serialize)]
pub struct UserProgressView {
    pub completed: bool,
    pub status: ProgressStatus,
    pub attempts: u32,
    pub xp_earned: u64,
    pub stars: u8,
    pub completed_at: Option<u64>,
}

impl From<&Progress> for UserProgressView {
    fn from(p: &Progress) -> Self {
        Self {
            completed: p.completed,
            status: p.status,
            attempts: p.attempts,
            xp_earned: p.xp_earned,
            stars: p.stars,
            completed_at: p.completed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PrerequisiteView {
    pub id: MissionId,
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MissionView {
    pub id: MissionId,
    pub location: LocationId,
    pub title: String,
    pub description: String,
    pub title_en: String,
    pub title_ru: String,
    pub description_en: String,
    pub description_ru: String,
    pub xp_reward: u32,
    pub order: i64,
    pub is_active: bool,
    pub min_level: u32,
    pub repeatable: bool,
    pub repeat_xp_rate: u32,
    pub pos_x: i64,
    pub pos_y: i64,
    pub available: bool,
    pub user_progress: Option<UserProgressView>,
    pub prerequisites: Vec<PrerequisiteView>,
    pub tasks: Vec<TaskView>,
    pub language: Language,
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationView {
    pub id: LocationId,
    pub title: String,
    pub description: String,
    pub title_en: String,
    pub title_ru: String,
    pub description_en: String,
    pub description_ru: String,
    pub order: i64,
    pub track: Option<TrackRef>,
    pub missions: Vec<MissionView>,
    pub language: Language,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackView {
    pub id: TrackId,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub title_en: String,
    pub title_ru: String,
    pub description_en: String,
    pub description_ru: String,
    pub tagline: String,
    pub tagline_en: String,
    pub tagline_ru: String,
    pub icon_url: String,
    pub banner_url: String,
    pub color_theme: String,
    pub order: i64,
    pub is_active: bool,
    pub is_premium: bool,
    pub default_language: String,
    pub worlds: Vec<LocationView>,
    pub language: Language,
}

struct Viewer {
    profile: Profile,
    progress: HashMap<MissionId, Progress>,
    completed: HashSet<MissionId>,
}

/// Everything needed to render catalog payloads for one request.
///
/// Loaded in one pass so nested payloads do not query per row.
pub struct CatalogContext {
    lang: Language,
    viewer: Option<Viewer>,
    /// All missions, in display order.
    missions: Vec<Mission>,
    tasks: HashMap<MissionId, Vec<MissionTask>>,
    tracks: HashMap<TrackId, Track>,
}

impl CatalogContext {
    pub fn load(conn: &Connection, viewer: Option<UserId>, lang: Language) -> questline_db::Result<Self> {
        let viewer = match viewer {
            Some(user_id) => {
                let profile = profiles::get(conn, user_id)?;
                let progress: HashMap<MissionId, Progress> = progress::list_for_user(conn, user_id)?
                    .into_iter()
                    .map(|p| (p.mission_id, p))
                    .collect();
                let completed = progress
                    .values()
                    .filter(|p| p.completed)
                    .map(|p| p.mission_id)
                    .collect();
                Some(Viewer {
                    profile,
                    progress,
                    completed,
                })
            }
            None => None,
        };

        let mut by_mission: HashMap<MissionId, Vec<MissionTask>> = HashMap::new();
        for task in tasks::list(conn, None, None)? {
            by_mission.entry(task.mission_id).or_default().push(task);
        }

        let tracks = tracks::list(conn, false)?
            .into_iter()
            .map(|t| (t.id, t))
            .collect();

        Ok(Self {
            lang,
            viewer,
            missions: missions::list(conn, None)?,
            tasks: by_mission,
            tracks,
        })
    }

    pub fn lang(&self) -> Language {
        self.lang
    }

    fn mission_title(&self, id: MissionId) -> String {
        self.missions
            .iter()
            .find(|m| m.id == id)
            .map(|m| m.localized_title(self.lang))
            .unwrap_or_default()
    }

    pub fn mission(&self, mission: &Mission) -> MissionView {
        let lang = self.lang;
        let (available, user_progress) = match &self.viewer {
            Some(viewer) => {
                let available = availability::is_available(mission, &viewer.profile, &viewer.completed);
                let progress = viewer
                    .progress
                    .get(&mission.id)
                    .cloned()
                    .unwrap_or_else(|| Progress::new(viewer.profile.user_id, mission.id));
                (available, Some(UserProgressView::from(&progress)))
            }
            None => (availability::is_available_anonymous(mission), None),
        };

        MissionView {
            id: mission.id,
            location: mission.location_id,
            title: mission.localized_title(lang),
            description: mission.localized_description(lang),
            title_en: mission.title_en.clone(),
            title_ru: mission.title_ru.clone(),
            description_en: mission.description_en.clone(),
            description_ru: mission.description_ru.clone(),
            xp_reward: mission.xp_reward,
            order: mission.order,
            is_active: mission.is_active,
            min_level: mission.min_level,
            repeatable: mission.repeatable,
            repeat_xp_rate: mission.repeat_xp_rate,
            pos_x: mission.pos_x,
            pos_y: mission.pos_y,
            available,
            user_progress,
            prerequisites: mission
                .prerequisites
                .iter()
                .map(|&id| PrerequisiteView {
                    id,
                    title: self.mission_title(id),
                })
                .collect(),
            tasks: self
                .tasks
                .get(&mission.id)
                .map(|tasks| tasks.iter().map(|t| TaskView::new(t, lang)).collect())
                .unwrap_or_default(),
            language: lang,
        }
    }

    pub fn missions(&self) -> Vec<MissionView> {
        self.missions.iter().map(|m| self.mission(m)).collect()
    }

    pub fn location(&self, location: &Location) -> LocationView {
        let lang = self.lang;
        LocationView {
            id: location.id,
            title: location.localized_title(lang),
            description: location.localized_description(lang),
            title_en: location.title_en.clone(),
            title_ru: location.title_ru.clone(),
            description_en: location.description_en.clone(),
            description_ru: location.description_ru.clone(),
            order: location.order,
            track: location
                .track_id
                .and_then(|id| self.tracks.get(&id))
                .map(|t| TrackRef::new(t, lang)),
            missions: self
                .missions
                .iter()
                .filter(|m| m.location_id == location.id)
                .map(|m| self.mission(m))
                .collect(),
            language: lang,
        }
    }

    pub fn track(&self, track: &Track, worlds: &[Location]) -> TrackView {
        let lang = self.lang;
        TrackView {
            id: track.id,
            slug: track.slug.clone(),
            title: track.localized_title(lang),
            description: track.localized_description(lang),
            title_en: track.title_en.clone(),
            title_ru: track.title_ru.clone(),
            description_en: track.description_en.clone(),
            description_ru: track.description_ru.clone(),
            tagline: track.localized(TextField::Tagline, lang),
            tagline_en: track.tagline_en.clone(),
            tagline_ru: track.tagline_ru.clone(),
            icon_url: track.icon_url.clone(),
            banner_url: track.banner_url.clone(),
            color_theme: track.color_theme.clone(),
            order: track.order,
            is_active: track.is_active,
            is_premium: track.is_premium,
            default_language: track.default_language.clone(),
            worlds: worlds
                .iter()
                .filter(|l| l.track_id == Some(track.id))
                .map(|l| self.location(l))
                .collect(),
            language: lang,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressView {
    pub id: i64,
    pub mission: MissionId,
    pub completed: bool,
    pub status: ProgressStatus,
    pub attempts: u32,
    pub xp_earned: u64,
    pub stars: u8,
    pub started_at: Option<u64>,
    pub last_started_at: Option<u64>,
    pub completed_at: Option<u64>,
}

impl From<&Progress> for ProgressView {
    fn from(p: &Progress) -> Self {
        Self {
            id: p.id,
            mission: p.mission_id,
            completed: p.completed,
            status: p.status,
            attempts: p.attempts,
            xp_earned: p.xp_earned,
            stars: p.stars,
            started_at: p.started_at,
            last_started_at: p.last_started_at,
            completed_at: p.completed_at,
        }
    }
}

/// Completion response: the progress row plus the XP delta and the
/// resulting profile totals.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionView {
    #[serde(flatten)]
    pub progress: ProgressView,
    pub xp_added: u64,
    pub profile_xp: u64,
    pub profile_level: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskProgressView {
    pub id: i64,
    pub task: i64,
    pub task_detail: TaskView,
    pub status: ProgressStatus,
    pub attempts: u32,
    pub best_score: i64,
    pub last_submitted_at: Option<u64>,
    pub answer: serde_json::Value,
}

impl TaskProgressView {
    pub fn new(progress: &TaskProgress, task: &MissionTask, lang: Language) -> Self {
        Self {
            id: progress.id,
            task: progress.task_id,
            task_detail: TaskView::new(task, lang),
            status: progress.status,
            attempts: progress.attempts,
            best_score: progress.best_score,
            last_submitted_at: progress.last_submitted_at,
            answer: progress.answer.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RankView {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub title_en: String,
    pub title_ru: String,
    pub description: String,
    pub description_en: String,
    pub description_ru: String,
    pub min_level: u32,
    pub min_xp: u64,
    pub order: i64,
    pub icon_url: String,
    pub language: Language,
}

impl RankView {
    pub fn new(rank: &Rank, lang: Language) -> Self {
        Self {
            id: rank.id,
            slug: rank.slug.clone(),
            title: rank.localized_title(lang),
            title_en: rank.title_en.clone(),
            title_ru: rank.title_ru.clone(),
            description: rank.localized_description(lang),
            description_en: rank.description_en.clone(),
            description_ru: rank.description_ru.clone(),
            min_level: rank.min_level,
            min_xp: rank.min_xp,
            order: rank.order,
            icon_url: rank.icon_url.clone(),
            language: lang,
        }
    }
}

/// Public identity of a leaderboard user.
#[derive(Debug, Clone, Serialize)]
pub struct UserDisplay {
    pub id: UserId,
    pub username: String,
    pub display_name: String,
    pub level: u32,
    pub xp: u64,
}

impl UserDisplay {
    pub fn new(user: &User, profile: Option<&Profile>) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            display_name: user.display().to_string(),
            level: profile.map_or(questline_types::START_LEVEL, |p| p.level),
            xp: profile.map_or(0, |p| p.xp),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardTrack {
    pub id: TrackId,
    pub slug: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardView {
    pub id: i64,
    pub user: UserId,
    pub user_display: UserDisplay,
    pub track: Option<LeaderboardTrack>,
    pub scope: &'static str,
    pub period_label: String,
    pub xp_total: u64,
    pub position: u32,
    pub snapshot_at: u64,
}

impl LeaderboardView {
    pub fn new(entry: &LeaderboardEntry, user: UserDisplay, track: Option<&Track>, lang: Language) -> Self {
        Self {
            id: entry.id,
            user: entry.user_id,
            user_display: user,
            track: track.map(|t| LeaderboardTrack {
                id: t.id,
                slug: t.slug.clone(),
                title: t.localized_title(lang),
            }),
            scope: entry.scope.as_str(),
            period_label: entry.period_label.clone(),
            xp_total: entry.xp_total,
            position: entry.position,
            snapshot_at: entry.snapshot_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub xp: u64,
    pub level: u32,
    pub bio: String,
    pub class_role: Option<i64>,
}

impl From<&Profile> for ProfileView {
    fn from(p: &Profile) -> Self {
        Self {
            xp: p.xp,
            level: p.level,
            bio: p.bio.clone(),
            class_role: p.class_role,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MeProfile {
    pub xp: u64,
    pub level: u32,
    pub bio: String,
}

/// `GET /api/auth/me` payload.
#[derive(Debug, Clone, Serialize)]
pub struct MeView {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub profile: MeProfile,
}

impl MeView {
    pub fn new(user: &User, profile: &Profile) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            profile: MeProfile {
                xp: profile.xp,
                level: profile.level,
                bio: profile.bio.clone(),
            },
        }
    }
}
