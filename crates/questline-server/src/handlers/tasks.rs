//! Mission tasks and the caller's task progress.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use questline_auth::now_secs;
use questline_db::queries::{task_progress, tasks};
use questline_db::DbError;
use questline_engine::tasks::mark_attempt;
use questline_types::catalog::{MissionTask, TaskType};
use questline_types::i18n::Language;
use questline_types::progress::{ProgressStatus, TaskProgress};
use questline_types::{MissionId, TaskId};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use super::patch;
use crate::error::{ApiError, ApiResult};
use crate::extract::{AuthUser, JsonBody, Lang, OptionalJson, StaffUser};
use crate::state::AppStateArc;
use crate::views::{TaskProgressView, TaskView};

#[derive(Debug, Default, Deserialize)]
pub struct TaskFilter {
    pub mission: Option<MissionId>,
    pub task_type: Option<String>,
}

pub async fn list_tasks(
    State(state): State<AppStateArc>,
    Lang(lang): Lang,
    Query(filter): Query<TaskFilter>,
) -> ApiResult<Json<Vec<TaskView>>> {
    let task_type = match filter.task_type.as_deref().filter(|t| !t.is_empty()) {
        None => None,
        Some(raw) => match raw.parse::<TaskType>() {
            Ok(kind) => Some(kind),
            // unknown types match nothing
            Err(_) => return Ok(Json(Vec::new())),
        },
    };
    let conn = state.db().await;
    let rows = tasks::list(&conn, filter.mission, task_type)?;
    Ok(Json(rows.iter().map(|t| TaskView::new(t, lang)).collect()))
}

pub async fn get_task(
    State(state): State<AppStateArc>,
    Lang(lang): Lang,
    Path(id): Path<TaskId>,
) -> ApiResult<Json<TaskView>> {
    let conn = state.db().await;
    let task = tasks::get(&conn, id)?;
    Ok(Json(TaskView::new(&task, lang)))
}

#[derive(Debug, Default, Deserialize)]
pub struct TaskInput {
    pub mission: Option<MissionId>,
    pub task_type: Option<TaskType>,
    pub order: Option<i64>,
    pub title: Option<String>,
    pub title_en: Option<String>,
    pub title_ru: Option<String>,
    pub body: Option<String>,
    pub body_en: Option<String>,
    pub body_ru: Option<String>,
    pub data: Option<Value>,
    pub xp_reward: Option<u32>,
    pub is_required: Option<bool>,
    pub estimated_minutes: Option<u32>,
    pub is_side_quest: Option<bool>,
}

impl TaskInput {
    fn apply(self, task: &mut MissionTask) {
        patch(&mut task.mission_id, self.mission);
        patch(&mut task.task_type, self.task_type);
        patch(&mut task.order, self.order);
        patch(&mut task.title, self.title);
        patch(&mut task.title_en, self.title_en);
        patch(&mut task.title_ru, self.title_ru);
        patch(&mut task.body, self.body);
        patch(&mut task.body_en, self.body_en);
        patch(&mut task.body_ru, self.body_ru);
        patch(&mut task.data, self.data);
        patch(&mut task.xp_reward, self.xp_reward);
        patch(&mut task.is_required, self.is_required);
        patch(&mut task.estimated_minutes, self.estimated_minutes);
        patch(&mut task.is_side_quest, self.is_side_quest);
    }
}

fn map_mission_fk(err: DbError) -> ApiError {
    match err {
        DbError::Constraint(_) => ApiError::field("mission", "Invalid pk - object does not exist."),
        other => other.into(),
    }
}

pub async fn create_task(
    State(state): State<AppStateArc>,
    StaffUser(staff): StaffUser,
    Lang(lang): Lang,
    JsonBody(input): JsonBody<TaskInput>,
) -> ApiResult<(StatusCode, Json<TaskView>)> {
    if input.mission.is_none() {
        return Err(ApiError::field("mission", "This field is required."));
    }
    let mut task = MissionTask::default();
    input.apply(&mut task);

    let conn = state.db().await;
    task.id = tasks::insert(&conn, &task).map_err(map_mission_fk)?;
    info!(task_id = task.id, mission_id = task.mission_id, by = staff.id, "task created");
    Ok((StatusCode::CREATED, Json(TaskView::new(&task, lang))))
}

pub async fn update_task(
    State(state): State<AppStateArc>,
    StaffUser(_staff): StaffUser,
    Lang(lang): Lang,
    Path(id): Path<TaskId>,
    JsonBody(input): JsonBody<TaskInput>,
) -> ApiResult<Json<TaskView>> {
    let conn = state.db().await;
    let mut task = tasks::get(&conn, id)?;
    input.apply(&mut task);
    tasks::update(&conn, &task).map_err(map_mission_fk)?;
    Ok(Json(TaskView::new(&task, lang)))
}

pub async fn delete_task(
    State(state): State<AppStateArc>,
    StaffUser(_staff): StaffUser,
    Path(id): Path<TaskId>,
) -> ApiResult<StatusCode> {
    let conn = state.db().await;
    tasks::delete(&conn, id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Default, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub completed: bool,
    pub answer: Option<Value>,
}

/// Record one attempt at task `id` for the caller.
pub async fn submit(
    State(state): State<AppStateArc>,
    AuthUser(user): AuthUser,
    Lang(lang): Lang,
    Path(id): Path<TaskId>,
    OptionalJson(req): OptionalJson<SubmitRequest>,
) -> ApiResult<Json<TaskProgressView>> {
    let mut conn = state.db().await;
    let tx = conn.transaction()?;
    let task = tasks::get(&tx, id)?;

    let mut row = task_progress::find(&tx, user.id, id)?.unwrap_or_else(|| TaskProgress::new(user.id, id));
    mark_attempt(&mut row, req.score, req.completed, now_secs());
    patch(&mut row.answer, req.answer);
    if row.id == 0 {
        row.id = task_progress::insert(&tx, &row)?;
    } else {
        task_progress::update(&tx, &row)?;
    }
    tx.commit()?;

    debug!(user_id = user.id, task_id = id, attempts = row.attempts, status = row.status.as_str(), "task attempt");
    Ok(Json(TaskProgressView::new(&row, &task, lang)))
}

#[derive(Debug, Default, Deserialize)]
pub struct TaskProgressInput {
    pub task: Option<TaskId>,
    pub status: Option<ProgressStatus>,
    pub attempts: Option<u32>,
    pub best_score: Option<i64>,
    pub answer: Option<Value>,
}

fn existing_task(conn: &Connection, id: TaskId) -> ApiResult<MissionTask> {
    match tasks::get(conn, id) {
        Ok(task) => Ok(task),
        Err(DbError::NotFound(_)) => Err(ApiError::field(
            "task",
            format!("Invalid pk \"{id}\" - object does not exist."),
        )),
        Err(e) => Err(e.into()),
    }
}

fn render(conn: &Connection, row: &TaskProgress, lang: Language) -> ApiResult<TaskProgressView> {
    let task = tasks::get(conn, row.task_id)?;
    Ok(TaskProgressView::new(row, &task, lang))
}

pub async fn list_task_progress(
    State(state): State<AppStateArc>,
    AuthUser(user): AuthUser,
    Lang(lang): Lang,
) -> ApiResult<Json<Vec<TaskProgressView>>> {
    let conn = state.db().await;
    let views = task_progress::list_for_user(&conn, user.id)?
        .iter()
        .map(|row| render(&conn, row, lang))
        .collect::<ApiResult<Vec<_>>>()?;
    Ok(Json(views))
}

pub async fn get_task_progress(
    State(state): State<AppStateArc>,
    AuthUser(user): AuthUser,
    Lang(lang): Lang,
    Path(id): Path<i64>,
) -> ApiResult<Json<TaskProgressView>> {
    let conn = state.db().await;
    let row = task_progress::get(&conn, user.id, id)?;
    Ok(Json(render(&conn, &row, lang)?))
}

pub async fn create_task_progress(
    State(state): State<AppStateArc>,
    AuthUser(user): AuthUser,
    Lang(lang): Lang,
    JsonBody(input): JsonBody<TaskProgressInput>,
) -> ApiResult<(StatusCode, Json<TaskProgressView>)> {
    let Some(task_id) = input.task else {
        return Err(ApiError::field("task", "This field is required."));
    };
    let conn = state.db().await;
    let task = existing_task(&conn, task_id)?;

    let mut row = TaskProgress::new(user.id, task_id);
    patch(&mut row.status, input.status);
    patch(&mut row.attempts, input.attempts);
    patch(&mut row.best_score, input.best_score);
    patch(&mut row.answer, input.answer);
    row.id = task_progress::insert(&conn, &row).map_err(|e| match e {
        DbError::Constraint(_) => {
            ApiError::field("task", "Progress for this task already exists.")
        }
        other => other.into(),
    })?;
    Ok((StatusCode::CREATED, Json(TaskProgressView::new(&row, &task, lang))))
}

pub async fn update_task_progress(
    State(state): State<AppStateArc>,
    AuthUser(user): AuthUser,
    Lang(lang): Lang,
    Path(id): Path<i64>,
    JsonBody(input): JsonBody<TaskProgressInput>,
) -> ApiResult<Json<TaskProgressView>> {
    let conn = state.db().await;
    let mut row = task_progress::get(&conn, user.id, id)?;
    if let Some(task_id) = input.task {
        existing_task(&conn, task_id)?;
        row.task_id = task_id;
    }
    patch(&mut row.status, input.status);
    patch(&mut row.attempts, input.attempts);
    patch(&mut row.best_score, input.best_score);
    patch(&mut row.answer, input.answer);
    task_progress::update(&conn, &row)?;
    Ok(Json(render(&conn, &row, lang)?))
}

pub async fn delete_task_progress(
    State(state): State<AppStateArc>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    let conn = state.db().await;
    task_progress::delete(&conn, user.id, id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use questline_db::queries::tasks;
    use questline_db::seed::{self, DemoContent};
    use questline_types::catalog::{MissionTask, TaskType};
    use serde_json::json;

    use crate::handlers::test_support::Harness;

    struct Fixture {
        h: Harness,
        demo: DemoContent,
        story: i64,
        quiz: i64,
    }

    async fn fixture() -> Fixture {
        let h = Harness::new();
        let (demo, story, quiz) = {
            let conn = h.state.db().await;
            let demo = seed::load_demo_content(&conn).expect("seed");
            let story = tasks::insert(
                &conn,
                &MissionTask {
                    mission_id: demo.intro,
                    order: 1,
                    title_en: "Wake up".into(),
                    title_ru: "Пробуждение".into(),
                    ..MissionTask::default()
                },
            )
            .expect("task");
            let quiz = tasks::insert(
                &conn,
                &MissionTask {
                    mission_id: demo.intro,
                    order: 2,
                    task_type: TaskType::Quiz,
                    title: "Quiz".into(),
                    data: json!({ "question": "2+2?", "options": ["3", "4"] }),
                    ..MissionTask::default()
                },
            )
            .expect("task");
            (demo, story, quiz)
        };
        Fixture { h, demo, story, quiz }
    }

    #[tokio::test]
    async fn test_list_and_filter() {
        let f = fixture().await;
        let (status, body) = f
            .h
            .send(Method::GET, &format!("/api/mission-tasks?mission={}", f.demo.intro), None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<i64> = body
            .as_array()
            .expect("list")
            .iter()
            .map(|t| t["id"].as_i64().expect("id"))
            .collect();
        assert_eq!(ids, vec![f.story, f.quiz]);
        assert_eq!(body[0]["title"], "Пробуждение");

        let (_, body) = f
            .h
            .send(Method::GET, "/api/mission-tasks?task_type=quiz&lang=en", None, None)
            .await;
        assert_eq!(body.as_array().expect("list").len(), 1);
        assert_eq!(body[0]["data"]["question"], "2+2?");

        let (_, body) = f.h.send(Method::GET, "/api/mission-tasks?task_type=essay", None, None).await;
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_missions_nest_tasks() {
        let f = fixture().await;
        let (_, body) = f
            .h
            .send(Method::GET, &format!("/api/missions/{}?lang=en", f.demo.intro), None, None)
            .await;
        assert_eq!(body["tasks"][0]["title"], "Wake up");
        assert_eq!(body["tasks"][1]["task_type"], "quiz");
    }

    #[tokio::test]
    async fn test_submit_tracks_attempts() {
        let f = fixture().await;
        let user = f.h.user("ada", false).await;
        let token = f.h.token(user);
        let uri = format!("/api/mission-tasks/{}/submit", f.quiz);

        let (status, body) = f
            .h
            .send(Method::POST, &uri, Some(&token), Some(json!({ "score": 40, "answer": { "choice": 0 } })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "in_progress");
        assert_eq!(body["attempts"], 1);
        assert_eq!(body["answer"]["choice"], 0);

        let (_, body) = f
            .h
            .send(Method::POST, &uri, Some(&token), Some(json!({ "score": 100, "completed": true })))
            .await;
        assert_eq!(body["status"], "completed");
        assert_eq!(body["best_score"], 100);

        let (_, body) = f
            .h
            .send(Method::POST, &uri, Some(&token), Some(json!({ "score": 10 })))
            .await;
        assert_eq!(body["status"], "completed");
        assert_eq!(body["best_score"], 100);
        assert_eq!(body["attempts"], 3);
        assert_eq!(body["task_detail"]["id"], f.quiz);

        // no XP side effect
        let (_, profile) = f.h.send(Method::GET, "/api/profile", Some(&token), None).await;
        assert_eq!(profile["xp"], 0);
    }

    #[tokio::test]
    async fn test_direct_writes_leave_submission_time_alone() {
        let f = fixture().await;
        let ada = f.h.user("ada", false).await;
        let token = f.h.token(ada);

        let (status, body) = f
            .h
            .send(
                Method::POST,
                "/api/task-progress",
                Some(&token),
                Some(json!({ "task": f.quiz, "attempts": 2 })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["last_submitted_at"].is_null());
        let id = body["id"].as_i64().expect("id");

        let (_, body) = f
            .h
            .send(
                Method::PATCH,
                &format!("/api/task-progress/{id}"),
                Some(&token),
                Some(json!({ "best_score": 5 })),
            )
            .await;
        assert!(body["last_submitted_at"].is_null());
        assert_eq!(body["attempts"], 2);

        let (_, body) = f
            .h
            .send(
                Method::POST,
                &format!("/api/mission-tasks/{}/submit", f.quiz),
                Some(&token),
                Some(json!({ "score": 10 })),
            )
            .await;
        assert_eq!(body["attempts"], 3);
        assert!(body["last_submitted_at"].as_u64().expect("submitted at") > 0);
    }

    #[tokio::test]
    async fn test_task_progress_crud() {
        let f = fixture().await;
        let ada = f.h.user("ada", false).await;
        let bob = f.h.user("bob", false).await;
        let ada_token = f.h.token(ada);
        let bob_token = f.h.token(bob);

        let (status, _) = f
            .h
            .send(Method::POST, "/api/task-progress", None, Some(json!({ "task": f.story })))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = f
            .h
            .send(
                Method::POST,
                "/api/task-progress/",
                Some(&ada_token),
                Some(json!({ "task": f.story, "status": "in_progress" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "in_progress");
        assert_eq!(body["task_detail"]["title"], "Пробуждение");
        let id = body["id"].as_i64().expect("id");

        let (status, _) = f
            .h
            .send(
                Method::POST,
                "/api/task-progress",
                Some(&ada_token),
                Some(json!({ "task": f.story })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = f
            .h
            .send(
                Method::PATCH,
                &format!("/api/task-progress/{id}"),
                Some(&ada_token),
                Some(json!({ "status": "completed", "best_score": 90 })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "completed");
        assert_eq!(body["best_score"], 90);

        let (status, _) = f
            .h
            .send(Method::GET, &format!("/api/task-progress/{id}"), Some(&bob_token), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = f
            .h
            .send(
                Method::PATCH,
                &format!("/api/task-progress/{id}"),
                Some(&bob_token),
                Some(json!({ "status": "not_started" })),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, list) = f.h.send(Method::GET, "/api/task-progress", Some(&ada_token), None).await;
        assert_eq!(list.as_array().expect("list").len(), 1);

        let (status, _) = f
            .h
            .send(Method::DELETE, &format!("/api/task-progress/{id}"), Some(&ada_token), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_task_progress_unknown_task() {
        let f = fixture().await;
        let ada = f.h.user("ada", false).await;
        let token = f.h.token(ada);
        let (status, body) = f
            .h
            .send(Method::POST, "/api/task-progress", Some(&token), Some(json!({ "task": 999 })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["task"].is_array());
    }

    #[tokio::test]
    async fn test_task_admin_writes() {
        let f = fixture().await;
        let admin = f.h.user("admin", true).await;
        let token = f.h.token(admin);
        let (status, body) = f
            .h
            .send(
                Method::POST,
                "/api/mission-tasks",
                Some(&token),
                Some(json!({ "mission": f.demo.gate, "task_type": "code", "title": "Loop" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["estimated_minutes"], 5);
        assert_eq!(body["is_required"], true);

        let (status, _) = f
            .h
            .send(
                Method::POST,
                "/api/mission-tasks",
                Some(&token),
                Some(json!({ "mission": 9999, "title": "Orphan" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let learner = f.h.user("ada", false).await;
        let learner_token = f.h.token(learner);
        let (status, _) = f
            .h
            .send(Method::DELETE, &format!("/api/mission-tasks/{}", f.story), Some(&learner_token), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
