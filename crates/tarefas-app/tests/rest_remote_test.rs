//! Task store driven through the HTTP client against a mock table service.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use serde_json::json;
use tarefas_app::{StoreError, TaskStore};
use tarefas_store_rest::{RemoteErrorKind, RestStore};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = "test-anon-key-0123456789";

fn task_row(id: &str, title: &str) -> serde_json::Value {
    json!({
        "id": id,
        "user_name": "Ana",
        "solicitante": "Bruno",
        "title": title,
        "comentario": null,
        "porcentagem": null,
        "backlog": null,
        "priority": "urgente",
        "due_date": "2025-06-20",
        "completed": false,
        "created_at": "2025-06-01T10:00:00+00:00",
        "updated_at": "2025-06-01T10:00:00+00:00"
    })
}

#[tokio::test]
async fn load_all_hydrates_subtasks_per_task() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([task_row("t1", "Edital")])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/subtasks"))
        .and(query_param("task_id", "eq.t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "s1",
            "task_id": "t1",
            "title": "Revisar",
            "comentario": null,
            "completed": true,
            "created_at": "2025-06-01T10:05:00+00:00"
        }])))
        .mount(&server)
        .await;

    let store = TaskStore::new(RestStore::new(&server.uri(), KEY).unwrap());
    let tasks = store.load_all().await.unwrap();

    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].comentario, "");
    assert_eq!(tasks[0].porcentagem.get(), 0);
    assert_eq!(tasks[0].subtask_progress(), (1, 1));
    assert!(store.last_error().is_none());
}

#[tokio::test]
async fn missing_table_is_classified_and_recorded() {
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

    let store = TaskStore::new(RestStore::new(&server.uri(), KEY).unwrap());
    let err = store.load_all().await.expect_err("table is missing");

    assert_eq!(err.kind(), RemoteErrorKind::MissingTable);
    assert!(err.user_message().contains("script SQL"));
    assert_eq!(store.last_error(), Some(err));
}

#[tokio::test]
async fn malformed_row_is_an_integrity_error() {
    let server = MockServer::start().await;
    let mut row = task_row("t1", "Edital");
    row["priority"] = json!("altissima");
    Mock::given(method("GET"))
        .and(path("/rest/v1/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/subtasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let store = TaskStore::new(RestStore::new(&server.uri(), KEY).unwrap());
    let err = store.load_all().await.expect_err("priority is outside the closed set");
    assert!(matches!(err, StoreError::Mapping(_)));
}
