//! Shared in-process harness for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use http_body_util::BodyExt;
use questline_db::queries::{profiles, users};
use questline_db::seed::{self, DemoContent};
use questline_server::config::ServerConfig;
use questline_server::mail::{Mail, MemoryMailer};
use questline_server::routes;
use questline_server::state::{AppState, AppStateArc};
use questline_types::UserId;
use serde_json::{json, Value};
use tower::ServiceExt;

pub const PASSWORD: &str = "correct-horse";

pub struct TestApp {
    pub state: AppStateArc,
    pub mailer: Arc<MemoryMailer>,
}

impl TestApp {
    pub fn new() -> Self {
        let conn = questline_db::open_memory().expect("db");
        let mut config = ServerConfig::default();
        config.auth.jwt_secret = "integration-secret".into();
        let mailer = Arc::new(MemoryMailer::new());
        let state = Arc::new(AppState::new(conn, config, mailer.clone()));
        Self { state, mailer }
    }

    pub async fn seed(&self) -> DemoContent {
        let conn = self.state.db().await;
        seed::load_demo_content(&conn).expect("seed")
    }

    /// Send one request through the full application stack.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = routes::app(self.state.clone())
            .oneshot(request)
            .await
            .expect("response");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, value)
    }

    /// Register through the API and return `(user id, access token)`.
    pub async fn signup(&self, username: &str) -> (UserId, String) {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/register/",
                None,
                Some(json!({ "username": username, "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register {username}: {body}");
        let id = body["id"].as_i64().expect("id");
        let (access, _) = self.login(username, PASSWORD).await;
        (id, access)
    }

    /// Log in and return `(access, refresh)`.
    pub async fn login(&self, username: &str, password: &str) -> (String, String) {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/login/",
                None,
                Some(json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login {username}: {body}");
        (
            body["access"].as_str().expect("access").to_string(),
            body["refresh"].as_str().expect("refresh").to_string(),
        )
    }

    /// Create a staff account directly and return its access token.
    pub async fn admin(&self) -> String {
        {
            let conn = self.state.db().await;
            let hash = questline_auth::password::hash_password(PASSWORD).expect("hash");
            let id = users::insert(
                &conn,
                &users::NewUser {
                    username: "staff",
                    email: "staff@example.com",
                    display_name: "Staff",
                    password_hash: &hash,
                    is_active: true,
                    is_staff: true,
                },
                questline_auth::now_secs(),
            )
            .expect("staff");
            profiles::insert(&conn, id).expect("profile");
        }
        self.login("staff", PASSWORD).await.0
    }

    /// Wait for spawned mail deliveries to land.
    pub async fn mail(&self, count: usize) -> Vec<Mail> {
        for _ in 0..100 {
            if self.mailer.sent().len() >= count {
                break;
            }
            tokio::task::yield_now().await;
        }
        self.mailer.sent()
    }
}

/// Extract `(uid, token)` from a mailed link.
pub fn link_params(mail: &Mail) -> (String, String) {
    let query = mail.body.split_once('?').expect("query").1;
    let mut uid = String::new();
    let mut token = String::new();
    for pair in query.trim().split('&') {
        match pair.split_once('=') {
            Some(("uid", v)) => uid = v.to_string(),
            Some(("token", v)) => token = v.to_string(),
            _ => {}
        }
    }
    (uid, token)
}

pub fn find<'a>(list: &'a Value, id: i64) -> &'a Value {
    list.as_array()
        .expect("list")
        .iter()
        .find(|item| item["id"] == id)
        .expect("item in list")
}
