//! Response decoding over the wire: content-type gate, compression and
//! number precision.

use super::common::bearer_client;
use megaplan_api::client::{ErrorKind, Method, QueryParams};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_maintenance_page_is_returned_verbatim() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/task"))
        .respond_with(ResponseTemplate::new(503).set_body_raw("Service Unavailable", "text/html"))
        .mount(&server)
        .await;

    let client = bearer_client(&server);
    let err = client
        .get_json::<serde_json::Value>("/api/v3/task", QueryParams::new())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Service Unavailable");
}

#[tokio::test]
async fn test_unknown_compression_keeps_body() {
    let server = MockServer::start().await;
    let opaque = b"\x1b\x03\x00brotli-bytes".to_vec();

    Mock::given(method("GET"))
        .and(path("/api/v3/task"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(opaque.clone(), "application/json")
                .insert_header("Content-Encoding", "br"),
        )
        .mount(&server)
        .await;

    let client = bearer_client(&server);
    let err = client
        .get_json::<serde_json::Value>("/api/v3/task", QueryParams::new())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "unknown compression method");
    assert!(err.is_unknown_compression());
    assert_eq!(err.compressed_body().map(|b| b.to_vec()), Some(opaque.clone()));

    // The raw response stays readable for a caller-side decoder.
    let mut raw = client.execute(client.get("/api/v3/task")).await.unwrap();
    assert!(raw.decompress().is_err());
    assert_eq!(raw.body().to_vec(), opaque);
    assert_eq!(raw.content_encoding(), Some("br"));
}

#[tokio::test]
async fn test_big_identifiers_survive_decoding() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/deal/1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"meta":{"status":200,"errors":[],"pagination":[]},"data":{"id":98765432109876543210,"price":{"value":12.3400000000000000001}}}"#,
            "application/json; charset=utf-8",
        ))
        .mount(&server)
        .await;

    let client = bearer_client(&server);
    let deal = client
        .send::<serde_json::Value>(client.request(Method::GET, "/api/v3/deal/1"))
        .await
        .unwrap();

    assert_eq!(deal.data["id"].to_string(), "98765432109876543210");
    assert_eq!(
        deal.data["price"]["value"].to_string(),
        "12.3400000000000000001"
    );
    assert_eq!(deal.meta.pagination.count, 0);
    assert!(!deal.next());
}

#[tokio::test]
async fn test_field_errors_with_non_string_values() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v3/task"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "meta": {"status": 400, "errors": [
                {"field": "deadline", "message": {"code": 17, "text": "in the past"}}
            ]},
            "data": null
        })))
        .mount(&server)
        .await;

    let client = bearer_client(&server);
    let err = client
        .post_json::<serde_json::Value, _>("/api/v3/task", &json!({"deadline": null}))
        .await
        .unwrap_err();

    assert!(matches!(err.kind, ErrorKind::Api(ref errors) if errors.len() == 1));
    assert_eq!(
        err.to_string(),
        r#"FIELD: deadline MESSAGE: {"code":17,"text":"in the past"}"#
    );
}
