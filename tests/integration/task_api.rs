// Test-specific lint overrides: integration tests use unwrap/expect freely,
// and some pedantic/nursery lints are not appropriate for test code.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::doc_markdown,
    clippy::future_not_send,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::missing_docs_in_private_items
)]

//! Integration tests for the task endpoints.
//!
//! Each test starts a server on an ephemeral port with a seeded user
//! directory and drives it over HTTP with `reqwest`:
//! - authentication failures on missing or unknown identities
//! - creation, validation and assignee expansion
//! - visibility scoping and the listing status summary
//! - status and checklist flows with progress derivation
//! - admin-only update and delete

use std::sync::Arc;

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use taskdeck_proto::task::UserId;
use taskdeck_proto::user::Role;
use taskdeck_server::api::{AppState, start_server, start_server_with_state};
use taskdeck_server::store::TaskStore;
use taskdeck_server::users::{UserDirectory, UserRecord};

const ADMIN: &str = "admin-1";
const ALICE: &str = "alice";
const BOB: &str = "bob";

fn record(id: &str, role: Role) -> UserRecord {
    UserRecord {
        id: UserId::parse(id).unwrap(),
        name: id.to_uppercase(),
        email: format!("{id}@example.com"),
        role,
        profile_image_url: None,
    }
}

/// Starts a server with an admin and two members, returning its base URL.
async fn start() -> String {
    let users = UserDirectory::from_records([
        record(ADMIN, Role::Admin),
        record(ALICE, Role::Member),
        record(BOB, Role::Member),
    ]);
    let state = Arc::new(AppState::new(TaskStore::new(), users));
    let (addr, _handle) = start_server_with_state("127.0.0.1:0", state)
        .await
        .expect("failed to start server");
    format!("http://{addr}")
}

async fn send(
    client: &Client,
    method: reqwest::Method,
    url: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = client.request(method, url);
    if let Some(user) = user {
        req = req.header("x-user-id", user);
    }
    if let Some(body) = body {
        req = req.json(&body);
    }
    let resp = req.send().await.unwrap();
    let status = resp.status();
    let text = resp.text().await.unwrap();
    let value = if text.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    };
    (status, value)
}

async fn create(client: &Client, base: &str, body: Value) -> (StatusCode, Value) {
    send(
        client,
        reqwest::Method::POST,
        &format!("{base}/tasks"),
        Some(ADMIN),
        Some(body),
    )
    .await
}

async fn create_ok(client: &Client, base: &str, body: Value) -> String {
    let (status, value) = create(client, base, body).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {value}");
    value["task"]["_id"].as_str().unwrap().to_string()
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn missing_identity_is_unauthorized() {
    let base = start().await;
    let client = Client::new();

    let (status, body) = send(&client, reqwest::Method::GET, &format!("{base}/tasks"), None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Not authorized, no token");
}

#[tokio::test]
async fn unknown_identity_is_unauthorized() {
    let base = start().await;
    let client = Client::new();

    let (status, body) = send(
        &client,
        reqwest::Method::GET,
        &format!("{base}/tasks"),
        Some("mallory"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Not authorized, user not found");
}

#[tokio::test]
async fn health_needs_no_identity() {
    let (addr, _handle) = start_server("127.0.0.1:0").await.unwrap();
    let client = Client::new();

    let (status, body) = send(&client, reqwest::Method::GET, &format!("http://{addr}/health"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

// =============================================================================
// Create
// =============================================================================

#[tokio::test]
async fn create_derives_progress_and_expands_assignees() {
    let base = start().await;
    let client = Client::new();

    let (status, body) = create(
        &client,
        &base,
        json!({
            "title": "Ship release",
            "priority": "High",
            "assignedTo": [ALICE, BOB],
            "todoChecklist": [
                {"text": "a", "completed": true},
                {"text": "b", "completed": true},
                {"text": "c", "completed": false}
            ]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Task created successfully");
    let task = &body["task"];
    assert_eq!(task["title"], "Ship release");
    assert_eq!(task["priority"], "High");
    assert_eq!(task["progress"], 67);
    assert_eq!(task["status"], "In Progress");
    assert_eq!(task["completedCount"], 2);
    assert_eq!(task["createdBy"], ADMIN);
    assert_eq!(task["assignedTo"][0]["_id"], ALICE);
    assert_eq!(task["assignedTo"][1]["email"], "bob@example.com");
}

#[tokio::test]
async fn create_with_scalar_assignee_is_rejected() {
    let base = start().await;
    let client = Client::new();

    let (status, body) = create(&client, &base, json!({"title": "x", "assignedTo": ALICE})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "assignedTo must be an array of user IDs");
}

#[tokio::test]
async fn create_with_blank_title_is_rejected() {
    let base = start().await;
    let client = Client::new();

    let (status, _) = create(&client, &base, json!({"title": "  ", "assignedTo": [ALICE]})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_by_member_is_allowed() {
    let base = start().await;
    let client = Client::new();

    let (status, body) = send(
        &client,
        reqwest::Method::POST,
        &format!("{base}/tasks"),
        Some(ALICE),
        Some(json!({"title": "Self task", "assignedTo": [ALICE]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["task"]["createdBy"], ALICE);
    assert_eq!(body["task"]["status"], "Pending");
}

#[tokio::test]
async fn malformed_json_body_is_a_client_error() {
    let base = start().await;
    let client = Client::new();

    let resp = client
        .post(format!("{base}/tasks"))
        .header("x-user-id", ADMIN)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn mistyped_body_fields_are_bad_request() {
    let base = start().await;
    let client = Client::new();

    let (status, body) = create(
        &client,
        &base,
        json!({"title": "x", "priority": "Urgent", "assignedTo": [ALICE]}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let id = create_ok(&client, &base, json!({"title": "t", "assignedTo": [ALICE]})).await;
    let (status, _) = send(
        &client,
        reqwest::Method::PUT,
        &format!("{base}/tasks/{id}/checklist"),
        Some(ALICE),
        Some(json!({"items": []})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reopening_completed_task_drops_progress() {
    let base = start().await;
    let client = Client::new();
    let id = create_ok(&client, &base, json!({"title": "t", "assignedTo": [ALICE]})).await;
    let url = format!("{base}/tasks/{id}/status");

    let (_, body) = send(
        &client,
        reqwest::Method::PUT,
        &url,
        Some(ALICE),
        Some(json!({"status": "Completed"})),
    )
    .await;
    assert_eq!(body["task"]["progress"], 100);

    let (status, body) = send(
        &client,
        reqwest::Method::PUT,
        &url,
        Some(ALICE),
        Some(json!({"status": "Pending"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["task"]["status"], "Pending");
    assert_eq!(body["task"]["progress"], 0);
}

// =============================================================================
// Read and list
// =============================================================================

#[tokio::test]
async fn get_by_id_respects_visibility() {
    let base = start().await;
    let client = Client::new();
    let id = create_ok(&client, &base, json!({"title": "t", "assignedTo": [ALICE]})).await;
    let url = format!("{base}/tasks/{id}");

    let (status, body) = send(&client, reqwest::Method::GET, &url, Some(ALICE), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["_id"], id.as_str());

    let (status, _) = send(&client, reqwest::Method::GET, &url, Some(BOB), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn get_unknown_or_malformed_id_is_not_found() {
    let base = start().await;
    let client = Client::new();

    let missing = uuid::Uuid::now_v7();
    let (status, body) = send(
        &client,
        reqwest::Method::GET,
        &format!("{base}/tasks/{missing}"),
        Some(ADMIN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Task not found");

    let (status, _) = send(
        &client,
        reqwest::Method::GET,
        &format!("{base}/tasks/not-a-uuid"),
        Some(ADMIN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_is_scoped_to_assignments_for_members() {
    let base = start().await;
    let client = Client::new();
    create_ok(&client, &base, json!({"title": "a", "assignedTo": [ALICE]})).await;
    create_ok(&client, &base, json!({"title": "b", "assignedTo": [BOB]})).await;
    create_ok(&client, &base, json!({"title": "ab", "assignedTo": [ALICE, BOB]})).await;

    let url = format!("{base}/tasks");
    let (_, admin) = send(&client, reqwest::Method::GET, &url, Some(ADMIN), None).await;
    assert_eq!(admin["tasks"].as_array().unwrap().len(), 3);
    assert_eq!(admin["statusSummary"]["all"], 3);

    let (_, alice) = send(&client, reqwest::Method::GET, &url, Some(ALICE), None).await;
    let titles: Vec<&str> = alice["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["a", "ab"]);
    assert_eq!(alice["statusSummary"]["all"], 2);
}

#[tokio::test]
async fn status_filter_keeps_all_count_unfiltered() {
    let base = start().await;
    let client = Client::new();
    create_ok(&client, &base, json!({"title": "p", "assignedTo": [ALICE]})).await;
    create_ok(
        &client,
        &base,
        json!({
            "title": "c",
            "assignedTo": [ALICE],
            "todoChecklist": [{"text": "done", "completed": true}]
        }),
    )
    .await;

    let (status, body) = send(
        &client,
        reqwest::Method::GET,
        &format!("{base}/tasks?status=Completed"),
        Some(ADMIN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tasks"].as_array().unwrap().len(), 1);
    assert_eq!(body["tasks"][0]["title"], "c");
    assert_eq!(body["statusSummary"]["all"], 2);
    assert_eq!(body["statusSummary"]["completedTasks"], 1);
    assert_eq!(body["statusSummary"]["pendingTasks"], 0);
}

#[tokio::test]
async fn unknown_status_filter_is_a_client_error() {
    let base = start().await;
    let client = Client::new();

    let (status, _) = send(
        &client,
        reqwest::Method::GET,
        &format!("{base}/tasks?status=Archived"),
        Some(ADMIN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Update and delete
// =============================================================================

#[tokio::test]
async fn update_is_admin_only() {
    let base = start().await;
    let client = Client::new();
    let id = create_ok(&client, &base, json!({"title": "old", "assignedTo": [ALICE]})).await;
    let url = format!("{base}/tasks/{id}");

    let (status, _) = send(
        &client,
        reqwest::Method::PUT,
        &url,
        Some(ALICE),
        Some(json!({"title": "hijack"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &client,
        reqwest::Method::PUT,
        &url,
        Some(ADMIN),
        Some(json!({"title": "new", "priority": "Low"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Task updated successfully");
    assert_eq!(body["updatedTask"]["title"], "new");
    assert_eq!(body["updatedTask"]["priority"], "Low");
}

#[tokio::test]
async fn delete_removes_the_task() {
    let base = start().await;
    let client = Client::new();
    let id = create_ok(&client, &base, json!({"title": "gone", "assignedTo": [ALICE]})).await;
    let url = format!("{base}/tasks/{id}");

    let (status, _) = send(&client, reqwest::Method::DELETE, &url, Some(ALICE), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&client, reqwest::Method::DELETE, &url, Some(ADMIN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Task deleted successfully");

    let (status, _) = send(&client, reqwest::Method::GET, &url, Some(ADMIN), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Status and checklist
// =============================================================================

#[tokio::test]
async fn completing_status_completes_checklist() {
    let base = start().await;
    let client = Client::new();
    let id = create_ok(
        &client,
        &base,
        json!({
            "title": "finish",
            "assignedTo": [ALICE],
            "todoChecklist": [{"text": "a"}, {"text": "b"}]
        }),
    )
    .await;

    let (status, body) = send(
        &client,
        reqwest::Method::PUT,
        &format!("{base}/tasks/{id}/status"),
        Some(ALICE),
        Some(json!({"status": "Completed"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Status updated");
    assert_eq!(body["task"]["status"], "Completed");
    assert_eq!(body["task"]["progress"], 100);
    assert!(
        body["task"]["todoChecklist"]
            .as_array()
            .unwrap()
            .iter()
            .all(|item| item["completed"] == true)
    );
}

#[tokio::test]
async fn status_update_by_outsider_is_forbidden() {
    let base = start().await;
    let client = Client::new();
    let id = create_ok(&client, &base, json!({"title": "t", "assignedTo": [ALICE]})).await;

    let (status, body) = send(
        &client,
        reqwest::Method::PUT,
        &format!("{base}/tasks/{id}/status"),
        Some(BOB),
        Some(json!({"status": "In Progress"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Not authorized");
}

#[tokio::test]
async fn checklist_update_moves_status_through_lifecycle() {
    let base = start().await;
    let client = Client::new();
    let id = create_ok(
        &client,
        &base,
        json!({
            "title": "steps",
            "assignedTo": [ALICE],
            "todoChecklist": [{"text": "a"}, {"text": "b"}, {"text": "c"}]
        }),
    )
    .await;
    let url = format!("{base}/tasks/{id}/checklist");

    let (status, body) = send(
        &client,
        reqwest::Method::PUT,
        &url,
        Some(ALICE),
        Some(json!({"todoChecklist": [
            {"text": "a", "completed": true},
            {"text": "b", "completed": false},
            {"text": "c", "completed": false}
        ]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Checklist updated");
    assert_eq!(body["task"]["progress"], 33);
    assert_eq!(body["task"]["status"], "In Progress");

    let (_, body) = send(
        &client,
        reqwest::Method::PUT,
        &url,
        Some(ALICE),
        Some(json!({"todoChecklist": [
            {"text": "a", "completed": true},
            {"text": "b", "completed": true},
            {"text": "c", "completed": true}
        ]})),
    )
    .await;
    assert_eq!(body["task"]["progress"], 100);
    assert_eq!(body["task"]["status"], "Completed");

    let (_, body) = send(
        &client,
        reqwest::Method::PUT,
        &url,
        Some(ALICE),
        Some(json!({"todoChecklist": []})),
    )
    .await;
    assert_eq!(body["task"]["progress"], 0);
    assert_eq!(body["task"]["status"], "Pending");
}

#[tokio::test]
async fn checklist_update_on_missing_task_is_not_found() {
    let base = start().await;
    let client = Client::new();
    let missing = uuid::Uuid::now_v7();

    let (status, _) = send(
        &client,
        reqwest::Method::PUT,
        &format!("{base}/tasks/{missing}/checklist"),
        Some(ADMIN),
        Some(json!({"todoChecklist": []})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
