use megaplan_api::client::{AuthScheme, ClientConfig, MegaplanClient};
use serde_json::{json, Value};
use wiremock::MockServer;

pub const TOKEN: &str = "integration-token";
pub const ACCESS_ID: &str = "access-id";
pub const SECRET_KEY: &str = "secret-key";

/// Bearer client pointed at the mock server.
pub fn bearer_client(server: &MockServer) -> MegaplanClient {
    bearer_client_with(server, ClientConfig::default())
}

pub fn bearer_client_with(server: &MockServer, config: ClientConfig) -> MegaplanClient {
    MegaplanClient::with_config(&server.uri(), AuthScheme::bearer(TOKEN).unwrap(), config)
        .unwrap()
}

/// Legacy client pointed at the mock server.
pub fn legacy_client(server: &MockServer) -> MegaplanClient {
    MegaplanClient::new(
        &server.uri(),
        AuthScheme::legacy(ACCESS_ID, SECRET_KEY).unwrap(),
    )
    .unwrap()
}

/// A successful current-API envelope around `data`.
pub fn envelope(data: Value, pagination: Value) -> Value {
    json!({
        "meta": {"status": 200, "errors": [], "pagination": pagination},
        "data": data
    })
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}
