//! Legacy API flows: login exchange, then signed requests.

use super::common::{legacy_client, ACCESS_ID, SECRET_KEY};
use megaplan_api::auth::{md5_password, Credentials, LoginExchange, AUTHORIZE_PATH, ONE_TIME_KEY_PATH};
use megaplan_api::client::signature::{canonical_string, Signer};
use megaplan_api::client::{LegacyEnvelope, Method, QueryParams};
use serde_json::json;
use wiremock::matchers::{body_string, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn header<'a>(req: &'a Request, name: &str) -> Option<&'a str> {
    req.headers.get(name).and_then(|v| v.to_str().ok())
}

/// Verify `X-Authorization` the way the server does: rebuild the canonical
/// string from the received request and compare digests.
///
/// The mock server reports its own URL as `localhost`, so the signed
/// address comes from the `Host` header the client sent.
fn correctly_signed(req: &Request) -> bool {
    let (Some(date), Some(authorization), Some(host)) = (
        header(req, "date"),
        header(req, "x-authorization"),
        header(req, "host"),
    ) else {
        return false;
    };
    let Ok(method) = Method::from_bytes(req.method.as_str().as_bytes()) else {
        return false;
    };
    let query = req.url.query().map(|q| format!("?{}", q)).unwrap_or_default();
    let Ok(signed_url) = req.url.join(&format!("//{}{}{}", host, req.url.path(), query)) else {
        return false;
    };

    let signer = Signer::new(ACCESS_ID, SECRET_KEY).unwrap();
    let expected = format!(
        "{}:{}",
        ACCESS_ID,
        signer.digest(&canonical_string(&method, date, &signed_url))
    );
    authorization == expected
}

#[tokio::test]
async fn test_login_then_signed_request() {
    let server = MockServer::start().await;
    let password_md5 = md5_password("s3cret");

    Mock::given(method("POST"))
        .and(path(ONE_TIME_KEY_PATH))
        .and(body_string(format!("Login=ivanov&Password={}", password_md5)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": {"code": "ok", "message": null},
            "data": {"OneTimeKey": "otk-1"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(AUTHORIZE_PATH))
        .and(body_string(format!(
            "Login=ivanov&OneTimeKey=otk-1&Password={}",
            password_md5
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": {"code": "ok", "message": null},
            "data": {
                "UserId": 1000001,
                "EmployeeId": 1000005,
                "AccessId": ACCESS_ID,
                "SecretKey": SECRET_KEY
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/BumsTaskApiV01/Task/list.api"))
        .and(correctly_signed)
        .and(|req: &Request| req.url.query() == Some("Limit=5&Status=actual"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": {"code": "ok", "message": null},
            "data": {"tasks": [{"Id": 1000100, "Name": "Signed"}]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let creds = LoginExchange::new(&server.uri())
        .unwrap()
        .login("ivanov", "s3cret")
        .await
        .unwrap();
    assert_eq!(creds.employee_id(), Some(1000005));

    let client = creds.client().unwrap();
    let tasks: LegacyEnvelope<serde_json::Value> = client
        .legacy_get(
            "/BumsTaskApiV01/Task/list.api",
            QueryParams::new()
                .with("Status", "actual")
                .with("Limit", 5)
                .with("Folder", None::<String>),
        )
        .await
        .unwrap();

    assert_eq!(tasks.data["tasks"][0]["Name"], "Signed");
}

#[tokio::test]
async fn test_signed_post_carries_form_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/BumsTaskApiV01/Task/create.api"))
        .and(correctly_signed)
        .and(body_string("Model%5BName%5D=Report&Model%5BResponsible%5D=1000005"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": {"code": "ok", "message": null},
            "data": {"task": {"Id": 1000101}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = legacy_client(&server);
    let created: LegacyEnvelope<serde_json::Value> = client
        .legacy_post(
            "/BumsTaskApiV01/Task/create.api",
            QueryParams::new()
                .with("Model[Name]", "Report")
                .with("Model[Responsible]", 1000005),
        )
        .await
        .unwrap();

    assert_eq!(created.data["task"]["Id"], 1000101);
}

#[tokio::test]
async fn test_legacy_error_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/BumsTaskApiV01/Task/card.api"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": {"code": "error", "message": "Task not found"},
            "data": []
        })))
        .mount(&server)
        .await;

    let client = legacy_client(&server);
    let err = client
        .legacy_get::<serde_json::Value>(
            "/BumsTaskApiV01/Task/card.api",
            QueryParams::new().with("Id", 1),
        )
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Megaplan API status error: Task not found");
}

#[tokio::test]
async fn test_foreign_secret_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/BumsTaskApiV01/Task/list.api"))
        .and(correctly_signed)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": {"code": "ok", "message": null},
            "data": {"tasks": []}
        })))
        .expect(0)
        .mount(&server)
        .await;

    let client = megaplan_api::client::MegaplanClient::new(
        &server.uri(),
        megaplan_api::client::AuthScheme::legacy(ACCESS_ID, "another-secret").unwrap(),
    )
    .unwrap();
    let result = client
        .legacy_get::<serde_json::Value>("/BumsTaskApiV01/Task/list.api", QueryParams::new())
        .await;

    assert!(result.is_err());
}
