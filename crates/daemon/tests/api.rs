//! End-to-end tests driving the full router against an in-memory database.

use std::net::SocketAddr;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use common::prelude::{Course, CourseCode};
use varsity_daemon::database::Database;
use varsity_daemon::http_server::{self, api::USER_ID_HEADER};
use varsity_daemon::ServiceState;

async fn setup_app() -> Router {
    let db_url = url::Url::parse("sqlite::memory:").unwrap();
    let db = Database::connect(&db_url).await.unwrap();
    db.import_courses(&[
        Course {
            code: CourseCode::parse("CSE220").unwrap(),
            name: "Data Structures".to_string(),
            has_lab: true,
        },
        Course {
            code: CourseCode::parse("MAT120").unwrap(),
            name: "Calculus I".to_string(),
            has_lab: false,
        },
    ])
    .await
    .unwrap();

    let config = http_server::Config::new(SocketAddr::from(([127, 0, 0, 1], 0)));
    http_server::router(config, ServiceState::new(db))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::ACCEPT, "application/json");
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn create_directory(app: &Router, user: &str, body: Value) -> Value {
    let (status, created) = send(app, Method::POST, "/api/v0/directories", Some(user), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    created
}

#[tokio::test]
async fn test_requests_without_identity_are_rejected() {
    let app = setup_app().await;

    let (status, body) = send(&app, Method::GET, "/api/v0/directories", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["msg"].is_string());

    let (status, _) = send(&app, Method::GET, "/api/v0/directories", Some("  "), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_directory_lifecycle() {
    let app = setup_app().await;

    let created = create_directory(
        &app,
        "alice",
        json!({"course_code": "cse220", "visibility": "public", "with_subdirectories": true}),
    )
    .await;
    let root = &created["directory"];
    assert_eq!(root["course_code"], "CSE220");
    assert_eq!(root["title"], "Data Structures");
    assert_eq!(root["visibility"], "public");
    assert_eq!(created["subdirectories"].as_array().unwrap().len(), 2);
    let root_id = root["id"].as_str().unwrap().to_string();

    let (status, listed) = send(&app, Method::GET, "/api/v0/directories?q=cse", Some("bob"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["total"], 1);
    assert_eq!(listed["items"][0]["id"], root_id.as_str());

    let (status, fetched) = send(
        &app,
        Method::GET,
        &format!("/api/v0/directories/{root_id}"),
        Some("bob"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let subs = fetched["subdirectories"].as_array().unwrap();
    assert_eq!(subs.len(), 2);
    assert!(subs.iter().all(|s| s["visibility"] == "public"));

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/v0/directories/{root_id}"),
        Some("bob"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, deleted) = send(
        &app,
        Method::DELETE,
        &format!("/api/v0/directories/{root_id}"),
        Some("alice"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["deleted"]["directories"], 3);

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/v0/directories/{root_id}"),
        Some("alice"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_course_and_duplicate_subdirectory() {
    let app = setup_app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v0/directories",
        Some("alice"),
        Some(json!({"course_code": "XYZ999"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["msg"].as_str().unwrap().contains("XYZ999"));

    let created = create_directory(&app, "alice", json!({"course_code": "CSE220"})).await;
    let root_id = created["directory"]["id"].as_str().unwrap().to_string();

    let sub = json!({"parent_directory_id": root_id, "subdirectory_type": "lab"});
    create_directory(&app, "alice", sub.clone()).await;
    let (status, _) = send(&app, Method::POST, "/api/v0/directories", Some("alice"), Some(sub)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_subdirectory_under_hidden_parent_is_not_found() {
    let app = setup_app().await;

    let private = create_directory(&app, "alice", json!({"course_code": "CSE220"})).await;
    let public = create_directory(
        &app,
        "alice",
        json!({"course_code": "MAT120", "visibility": "public", "title": "Calculus notes"}),
    )
    .await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v0/directories",
        Some("mallory"),
        Some(json!({"parent_directory_id": private["directory"]["id"], "subdirectory_type": "lab"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v0/directories",
        Some("mallory"),
        Some(json!({"parent_directory_id": public["directory"]["id"], "subdirectory_type": "lab"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_validate_reports_catalog_details() {
    let app = setup_app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v0/directories/validate",
        Some("alice"),
        Some(json!({"course_code": "cse220"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
    assert_eq!(body["course_name"], "Data Structures");
    assert_eq!(body["has_lab"], true);

    create_directory(&app, "alice", json!({"course_code": "CSE220"})).await;
    let (_, body) = send(
        &app,
        Method::POST,
        "/api/v0/directories/validate",
        Some("alice"),
        Some(json!({"course_code": "CSE220"})),
    )
    .await;
    assert_eq!(body["valid"], false);

    let (_, body) = send(
        &app,
        Method::POST,
        "/api/v0/directories/validate",
        Some("alice"),
        Some(json!({"course_code": "NOPE1"})),
    )
    .await;
    assert_eq!(body["valid"], false);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_connections_gate_visibility() {
    let app = setup_app().await;

    let created = create_directory(
        &app,
        "alice",
        json!({"course_code": "MAT120", "visibility": "connections"}),
    )
    .await;
    let dir_uri = format!("/api/v0/directories/{}", created["directory"]["id"].as_str().unwrap());

    let (status, _) = send(&app, Method::GET, &dir_uri, Some("bob"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // alice has to exist as a user before bob can find her
    send(&app, Method::GET, "/api/v0/connections", Some("alice"), None).await;

    let (status, sent) = send(
        &app,
        Method::POST,
        "/api/v0/connections/requests",
        Some("bob"),
        Some(json!({"user_id": "alice"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(sent["status"], "sent");
    let request_id = sent["request"]["id"].as_str().unwrap().to_string();

    let (_, incoming) = send(&app, Method::GET, "/api/v0/connections/requests", Some("alice"), None).await;
    assert_eq!(incoming["requests"].as_array().unwrap().len(), 1);
    assert_eq!(incoming["requests"][0]["request"]["sender_id"], "bob");

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/v0/connections/requests/{request_id}/accept"),
        Some("bob"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, accepted) = send(
        &app,
        Method::POST,
        &format!("/api/v0/connections/requests/{request_id}/accept"),
        Some("alice"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(accepted["request"]["status"], "accepted");

    let (status, _) = send(&app, Method::GET, &dir_uri, Some("bob"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, connections) = send(&app, Method::GET, "/api/v0/connections", Some("bob"), None).await;
    assert_eq!(connections["connections"][0]["id"], "alice");

    let (status, _) = send(&app, Method::DELETE, "/api/v0/connections/alice", Some("bob"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::GET, &dir_uri, Some("bob"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, "/api/v0/connections/alice", Some("bob"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_rules_and_voting() {
    let app = setup_app().await;

    let created = create_directory(
        &app,
        "alice",
        json!({"course_code": "CSE220", "visibility": "public", "with_subdirectories": true}),
    )
    .await;
    let root_id = created["directory"]["id"].as_str().unwrap().to_string();
    let lab_id = created["subdirectories"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["subdirectory_type"] == "lab")
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let video = |directory_id: &str| {
        json!({
            "directory_id": directory_id,
            "title": "Linked lists explained",
            "youtube_url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
        })
    };

    let (status, _) = send(&app, Method::POST, "/api/v0/resources", Some("alice"), Some(video(&root_id))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, resource) = send(&app, Method::POST, "/api/v0/resources", Some("bob"), Some(video(&lab_id))).await;
    assert_eq!(status, StatusCode::CREATED, "{resource}");
    assert_eq!(resource["kind"], "youtube");
    let vote_uri = format!("/api/v0/resources/{}/vote", resource["id"].as_str().unwrap());

    let (status, tally) = send(&app, Method::POST, &vote_uri, Some("carol"), Some(json!({"vote": "up"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tally["up"], 1);
    assert_eq!(tally["user_vote"], "up");

    let (_, tally) = send(&app, Method::POST, &vote_uri, Some("carol"), Some(json!({"vote": "down"}))).await;
    assert_eq!(tally["up"], 0);
    assert_eq!(tally["down"], 1);

    let (_, tally) = send(&app, Method::POST, &vote_uri, Some("carol"), Some(json!({"vote": "down"}))).await;
    assert_eq!(tally["down"], 0);
    assert_eq!(tally["user_vote"], Value::Null);

    let (_, listed) = send(
        &app,
        Method::GET,
        &format!("/api/v0/directories/{lab_id}/resources"),
        Some("carol"),
        None,
    )
    .await;
    assert_eq!(listed["resources"].as_array().unwrap().len(), 1);

    let (_, activities) = send(&app, Method::GET, "/api/v0/activities", Some("bob"), None).await;
    assert_eq!(activities["activities"][0]["action"], "resource_uploaded");

    send(&app, Method::POST, &vote_uri, Some("carol"), Some(json!({"vote": "up"}))).await;
    let (status, deleted) = send(
        &app,
        Method::DELETE,
        &format!("/api/v0/directories/{root_id}"),
        Some("alice"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["deleted"]["directories"], 3);
    assert_eq!(deleted["deleted"]["resources"], 1);
    assert_eq!(deleted["deleted"]["votes"], 1);

    let (status, _) = send(&app, Method::POST, &vote_uri, Some("carol"), Some(json!({"vote": "up"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_route_returns_json_not_found() {
    let app = setup_app().await;

    let (status, body) = send(&app, Method::GET, "/api/v0/nothing-here", Some("alice"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["msg"].is_string());
}
