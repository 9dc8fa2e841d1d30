//! Current API (bearer token) flows.

use super::common::{bearer_client, bearer_client_with, envelope, gzip, TOKEN};
use megaplan_api::client::{entity_ref, ClientConfig, Envelope, QueryParams};
use serde::Deserialize;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

#[derive(Debug, Deserialize)]
struct Task {
    id: String,
    name: String,
}

fn query_contains(fragment: &'static str) -> impl Fn(&Request) -> bool + Send + Sync + 'static {
    move |req: &Request| req.url.query().is_some_and(|q| q.contains(fragment))
}

#[tokio::test]
async fn test_paginated_listing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/task"))
        .and(query_contains("offset%22%3A0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(
            json!([{"id": "1", "name": "One"}, {"id": "2", "name": "Two"}]),
            json!({"count": 3, "limit": 2, "currentPage": 1, "hasMoreNext": true, "hasMorePrev": false}),
        )))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v3/task"))
        .and(query_contains("offset%22%3A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(
            json!([{"id": "3", "name": "Three"}]),
            json!({"count": 3, "limit": 2, "currentPage": 2, "hasMoreNext": false, "hasMorePrev": true}),
        )))
        .mount(&server)
        .await;

    let client = bearer_client(&server);
    let mut names = Vec::new();
    let mut offset = 0;
    loop {
        let page: Envelope<Vec<Task>> = client
            .get_json(
                "/api/v3/task",
                QueryParams::new().with("limit", 2).with("offset", offset),
            )
            .await
            .unwrap();
        offset += page.data.len();
        names.extend(page.data.iter().map(|t| t.name.clone()));
        if !page.next() {
            assert!(page.prev());
            break;
        }
    }

    assert_eq!(names, vec!["One", "Two", "Three"]);
}

#[tokio::test]
async fn test_create_with_entities() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v3/task"))
        .and(header("Authorization", format!("Bearer {}", TOKEN).as_str()))
        .and(|req: &Request| {
            let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap_or_default();
            body == json!({
                "name": "Quarterly report",
                "responsible": {"contentType": "Employee", "id": "1000005"},
                "auditors": [{"contentType": "Employee", "id": "1000006"}]
            })
        })
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(
            json!({"id": "42", "name": "Quarterly report"}),
            json!([]),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = bearer_client(&server);
    let body = QueryParams::new()
        .with("name", "Quarterly report")
        .with_entity("responsible", entity_ref("Employee", "1000005"))
        .with_entity_array("auditors", vec![entity_ref("Employee", "1000006")]);

    let created: Envelope<Task> = client.post_json("/api/v3/task", &body).await.unwrap();
    assert_eq!(created.data.id, "42");
    assert!(!created.next());
}

#[tokio::test]
async fn test_token_rotation() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/currentUser"))
        .and(header("Authorization", "Bearer rotated-token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(envelope(json!({"id": "1"}), json!([]))),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v3/currentUser"))
        .and(header("Authorization", format!("Bearer {}", TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "meta": {"status": 401, "errors": [{"field": null, "message": "Token expired"}]},
            "data": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = bearer_client(&server);
    let err = client
        .get_json::<serde_json::Value>("/api/v3/currentUser", QueryParams::new())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "FIELD: null MESSAGE: Token expired");

    client.set_token("rotated-token").unwrap();
    let me: Envelope<serde_json::Value> = client
        .get_json("/api/v3/currentUser", QueryParams::new())
        .await
        .unwrap();
    assert_eq!(me.data["id"], "1");
}

#[tokio::test]
async fn test_gzip_hint_and_compressed_answer() {
    let server = MockServer::start().await;

    let body = serde_json::to_vec(&envelope(json!({"id": "7", "name": "Zipped"}), json!([]))).unwrap();
    Mock::given(method("GET"))
        .and(path("/api/v3/task/7"))
        .and(header("Accept-Encoding", "gzip"))
        .and(header("X-User-Id", "1000005"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(gzip(&body), "application/json")
                .insert_header("Content-Encoding", "gzip"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = bearer_client_with(
        &server,
        ClientConfig::builder()
            .with_accept_gzip(true)
            .with_user_id(1000005)
            .build(),
    );
    let task: Envelope<Task> = client
        .get_json("/api/v3/task/7", QueryParams::new())
        .await
        .unwrap();
    assert_eq!(task.data.name, "Zipped");
}
