//! HTTP-level tests for `RestStore` against a mock service.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use serde_json::json;
use tarefas_store_rest::{
    NewSubtaskRow, NewTaskRow, RemoteErrorKind, RestStore, RestStoreError, SubtaskRowPatch, TaskRowPatch,
};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = "test-anon-key-0123456789";

fn task_json(id: &str, title: &str) -> serde_json::Value {
    json!({
        "id": id,
        "user_name": "Ana",
        "solicitante": "Bruno",
        "title": title,
        "comentario": "",
        "porcentagem": 0,
        "backlog": "A fazer",
        "priority": "media",
        "due_date": "2030-01-15",
        "completed": false,
        "created_at": "2025-03-01T12:00:00.123456+00:00",
        "updated_at": "2025-03-01T12:00:00.123456+00:00"
    })
}

async fn store(server: &MockServer) -> RestStore {
    RestStore::new(&server.uri(), KEY).expect("build store")
}

#[tokio::test]
async fn list_tasks_sends_auth_headers_and_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/tasks"))
        .and(header("apikey", KEY))
        .and(header("authorization", format!("Bearer {KEY}").as_str()))
        .and(query_param("order", "created_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            task_json("t2", "Segunda"),
            task_json("t1", "Primeira")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let rows = store(&server).await.list_tasks().await.expect("list tasks");
    let titles: Vec<_> = rows.iter().filter_map(|row| row.title.as_deref()).collect();
    assert_eq!(titles, vec!["Segunda", "Primeira"]);
}

#[tokio::test]
async fn list_subtasks_filters_by_parent_in_creation_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/subtasks"))
        .and(query_param("task_id", "eq.t1"))
        .and(query_param("order", "created_at.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "s1", "task_id": "t1", "title": "A", "completed": false, "created_at": "2025-03-01T12:00:00Z" },
            { "id": "s2", "task_id": "t1", "title": "B", "completed": true, "created_at": "2025-03-01T12:01:00Z" }
        ])))
        .mount(&server)
        .await;

    let rows = store(&server).await.list_subtasks("t1").await.expect("list subtasks");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].title.as_deref(), Some("A"));
    assert_eq!(rows[1].completed, Some(true));
    assert!(rows[0].comentario.is_none());
}

#[tokio::test]
async fn insert_task_requests_representation() {
    let server = MockServer::start().await;
    let new_row = NewTaskRow {
        user_name: "Ana".into(),
        solicitante: "Bruno".into(),
        title: "Nova".into(),
        comentario: String::new(),
        porcentagem: 100,
        backlog: "A fazer".into(),
        priority: "alta".into(),
        due_date: "2030-01-15".into(),
        completed: false,
    };
    Mock::given(method("POST"))
        .and(path("/rest/v1/tasks"))
        .and(header("prefer", "return=representation"))
        .and(body_json(&new_row))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([task_json("t9", "Nova")])))
        .expect(1)
        .mount(&server)
        .await;

    let row = store(&server).await.insert_task(&new_row).await.expect("insert task");
    assert_eq!(row.id.as_deref(), Some("t9"));
}

#[tokio::test]
async fn update_task_sends_only_set_columns() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/tasks"))
        .and(query_param("id", "eq.t1"))
        .and(body_json(json!({ "completed": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([task_json("t1", "Primeira")])))
        .expect(1)
        .mount(&server)
        .await;

    let patch = TaskRowPatch {
        completed: Some(true),
        ..TaskRowPatch::default()
    };
    store(&server).await.update_task("t1", &patch).await.expect("update task");
}

#[tokio::test]
async fn update_without_matching_row_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/subtasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let patch = SubtaskRowPatch {
        completed: Some(true),
        ..SubtaskRowPatch::default()
    };
    let err = store(&server)
        .await
        .update_subtask("missing", &patch)
        .await
        .expect_err("update must fail");
    assert!(matches!(err, RestStoreError::NotFound { table: "subtasks", .. }));
    assert_eq!(err.kind(), RemoteErrorKind::NotFound);
}

#[tokio::test]
async fn api_errors_keep_code_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/tasks"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": "42P01",
            "message": "relation \"public.tasks\" does not exist",
            "details": null,
            "hint": null
        })))
        .mount(&server)
        .await;

    let err = store(&server).await.list_tasks().await.expect_err("list must fail");
    assert_eq!(err.code(), Some("42P01"));
    assert_eq!(err.kind(), RemoteErrorKind::MissingTable);
    assert!(err.to_string().contains("does not exist"));
}

#[tokio::test]
async fn insert_subtask_surfaces_not_null_violation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/subtasks"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": "23502",
            "message": "null value in column \"title\" violates not-null constraint"
        })))
        .mount(&server)
        .await;

    let row = NewSubtaskRow {
        task_id: "t1".into(),
        title: String::new(),
        comentario: String::new(),
        completed: false,
    };
    let err = store(&server).await.insert_subtask(&row).await.expect_err("insert must fail");
    assert_eq!(err.kind(), RemoteErrorKind::MissingRequiredField);
}

#[tokio::test]
async fn plain_text_error_bodies_become_messages() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/tasks"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
        .mount(&server)
        .await;

    let err = store(&server).await.delete_task("t1").await.expect_err("delete must fail");
    let RestStoreError::Api { status, message, .. } = &err else {
        panic!("expected api error, got {err:?}");
    };
    assert_eq!(*status, 401);
    assert_eq!(message, "Invalid API key");
    assert_eq!(err.kind(), RemoteErrorKind::PermissionDenied);
}

#[tokio::test]
async fn delete_subtask_addresses_row_by_id() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/subtasks"))
        .and(query_param("id", "eq.s1"))
        .and(header("Prefer", "return=representation"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": "s1" }])))
        .expect(1)
        .mount(&server)
        .await;

    store(&server).await.delete_subtask("s1").await.expect("delete subtask");
}

#[tokio::test]
async fn delete_with_empty_echo_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/tasks"))
        .and(query_param("id", "eq.ghost"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let err = store(&server).await.delete_task("ghost").await.expect_err("nothing deleted");
    assert!(matches!(&err, RestStoreError::NotFound { table: "tasks", id } if id == "ghost"));
    assert_eq!(err.kind(), RemoteErrorKind::NotFound);
}
