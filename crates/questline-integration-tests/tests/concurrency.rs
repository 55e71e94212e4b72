//! Integration test: concurrent completions never double-award XP.
//!
//! Completions for the same (user, mission) race on separate tasks; the
//! shared connection lock plus one transaction per action serializes them.

mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_completions_award_once() {
    let app = std::sync::Arc::new(TestApp::new());
    let staff = app.admin().await;
    let demo = app.seed().await;

    let (status, mission) = app
        .send(
            Method::POST,
            "/api/missions",
            Some(&staff),
            Some(json!({ "location": demo.world2, "title": "Arena", "xp_reward": 40 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let arena = mission["id"].as_i64().expect("id");

    let (_, token) = app.signup("racer").await;
    let uri = format!("/api/missions/{arena}/complete");

    let mut handles = Vec::new();
    for _ in 0..8 {
        let app = app.clone();
        let token = token.clone();
        let uri = uri.clone();
        handles.push(tokio::spawn(async move {
            app.send(Method::POST, &uri, Some(&token), None).await
        }));
    }

    let mut awarded = Vec::new();
    for handle in handles {
        let (status, body) = handle.await.expect("join");
        assert_eq!(status, StatusCode::OK);
        awarded.push(body["xp_added"].as_u64().expect("xp"));
    }
    awarded.sort_unstable();
    assert_eq!(awarded.iter().sum::<u64>(), 40);
    assert_eq!(awarded.last(), Some(&40));

    let (_, profile) = app.send(Method::GET, "/api/profile", Some(&token), None).await;
    assert_eq!(profile["xp"], 40);
    let (_, history) = app.send(Method::GET, "/api/progress", Some(&token), None).await;
    assert_eq!(history.as_array().expect("list").len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_repeats_sum_exactly() {
    let app = std::sync::Arc::new(TestApp::new());
    let demo = app.seed().await;
    let (_, token) = app.signup("grinder").await;
    let uri = format!("/api/missions/{}/complete", demo.intro);

    let mut handles = Vec::new();
    for _ in 0..5 {
        let app = app.clone();
        let token = token.clone();
        let uri = uri.clone();
        handles.push(tokio::spawn(async move {
            app.send(Method::POST, &uri, Some(&token), None).await
        }));
    }
    for handle in handles {
        let (status, _) = handle.await.expect("join");
        assert_eq!(status, StatusCode::OK);
    }

    // one first completion plus four repeats at 10%
    let (_, profile) = app.send(Method::GET, "/api/profile", Some(&token), None).await;
    assert_eq!(profile["xp"], 140);
}
