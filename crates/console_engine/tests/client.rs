use std::time::Duration;

use console_core::{RowKey, SearchQuery, TaskStatus};
use console_engine::{
    ClientSettings, ConsoleBackend, FailureKind, HttpBackend, SearchRequest,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend(server: &MockServer) -> HttpBackend {
    HttpBackend::new(ClientSettings {
        base_url: server.uri(),
        token: Some("secret".to_string()),
        ..ClientSettings::default()
    })
    .expect("valid settings")
}

fn request(offset: usize) -> SearchRequest {
    let query = SearchQuery {
        keywords: vec!["error".to_string()],
        page_size: 2,
        ..SearchQuery::new("nginx")
    };
    SearchRequest::from_query(&query, offset)
}

#[tokio::test]
async fn search_posts_camel_case_body_and_parses_rows() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/logs/search/details"))
        .and(header("authorization", "Bearer secret"))
        .and(body_partial_json(json!({
            "module": "nginx",
            "keywords": ["error"],
            "pageSize": 2,
            "offset": 4
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": "0000",
            "message": "success",
            "data": {
                "success": true,
                "totalCount": 9,
                "columns": ["logId", "message"],
                "rows": [
                    {"logId": "a", "message": "error one"},
                    {"logId": "b", "message": "error two"}
                ]
            }
        })))
        .mount(&server)
        .await;

    let page = backend(&server)
        .search_details(&request(4))
        .await
        .expect("search ok");

    assert_eq!(page.total_count, 9);
    let keys: Vec<_> = page.rows.iter().map(|row| row.key.clone()).collect();
    assert_eq!(keys, vec![RowKey::from("a"), RowKey::from("b")]);
    assert_eq!(page.rows[1].fields["message"], "error two");
}

#[tokio::test]
async fn non_success_envelope_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/logs/search/details"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": "1001",
            "message": "module not found"
        })))
        .mount(&server)
        .await;

    let err = backend(&server)
        .search_details(&request(0))
        .await
        .unwrap_err();

    assert_eq!(
        err.kind,
        FailureKind::Api {
            code: "1001".to_string()
        }
    );
    assert_eq!(err.message, "module not found");
}

#[tokio::test]
async fn unsuccessful_search_result_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/logs/search/details"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": "0000",
            "data": {"success": false, "errorMessage": "bad where clause", "rows": []}
        })))
        .mount(&server)
        .await;

    let err = backend(&server)
        .search_details(&request(0))
        .await
        .unwrap_err();

    assert_eq!(err.message, "bad where clause");
}

#[tokio::test]
async fn http_failure_maps_to_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/logs/search/details"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = backend(&server)
        .search_details(&request(0))
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::HttpStatus(503));
}

#[tokio::test]
async fn malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/logs/search/details"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = backend(&server)
        .search_details(&request(0))
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::Decode);
}

#[tokio::test]
async fn slow_backend_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/logs/search/details"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_json(json!({"code": "0000", "data": {"rows": []}})),
        )
        .mount(&server)
        .await;

    let backend = HttpBackend::new(ClientSettings {
        base_url: server.uri(),
        request_timeout: Duration::from_millis(50),
        ..ClientSettings::default()
    })
    .expect("valid settings");

    let err = backend.search_details(&request(0)).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn process_tasks_are_parsed_latest_first() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/logstash/processes/12/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": "0000",
            "data": [
                {"taskId": "t2", "name": "start", "status": "RUNNING", "progressPercentage": 40.0},
                {"taskId": "t1", "name": "deploy", "status": "COMPLETED"}
            ]
        })))
        .mount(&server)
        .await;

    let tasks = backend(&server).process_tasks(12).await.expect("tasks ok");

    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].task_id, "t2");
    assert_eq!(tasks[0].status, TaskStatus::Running);
    assert_eq!(tasks[0].progress_percentage, Some(40.0));
    assert_eq!(tasks[1].status, TaskStatus::Completed);
}

#[test]
fn invalid_base_url_is_rejected() {
    let err = HttpBackend::new(ClientSettings {
        base_url: "not a url".to_string(),
        ..ClientSettings::default()
    })
    .unwrap_err();

    assert_eq!(err.kind, FailureKind::InvalidUrl);
}
