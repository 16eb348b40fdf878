//! Integration tests for the per-part download attempt.
//!
//! These tests run `download_part` against a wiremock portal and check both
//! the requests issued and the files left in a temporary output directory.

use std::path::Path;

use dataportal_dl::config::PortalConfig;
use dataportal_dl::portal::{download_part, Credential, DownloadOutcome, FileKind, PortalClient, PortalError};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const AUTH: &str = "Bearer PAT:download-token-01";

fn client_for(server: &MockServer) -> PortalClient {
    let config = PortalConfig {
        base_url: format!("{}/api", server.uri()),
        timeout_secs: 5,
    };
    PortalClient::new(&config, Credential::new("download-token-01").unwrap()).unwrap()
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

async fn mount_part(server: &MockServer, part_id: &str, macro_id: Option<&str>) {
    let relationships = match macro_id {
        Some(id) => json!({ "graphic_macro": { "data": { "id": id, "type": "macros" } } }),
        None => json!({}),
    };
    Mock::given(method("GET"))
        .and(path(format!("/api/parts/{part_id}")))
        .and(header("Authorization", AUTH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": part_id, "type": "parts", "relationships": relationships }
        })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_macro(server: &MockServer, macro_id: &str, name: &str, preview: &str, variants: &[&str]) {
    let variants: Vec<_> = variants.iter().map(|id| json!({ "id": id })).collect();
    Mock::given(method("GET"))
        .and(path(format!("/api/macros/{macro_id}")))
        .and(header("Authorization", AUTH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": macro_id,
                "attributes": { "name": name },
                "relationships": {
                    "preview": { "data": { "id": preview } },
                    "macro_variants": { "data": variants }
                }
            }
        })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_variant(server: &MockServer, variant_id: &str, status: u16, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(format!("/api/download/e3d_data/{variant_id}")))
        .and(header("Authorization", AUTH))
        .respond_with(ResponseTemplate::new(status).set_body_bytes(body.to_vec()))
        .expect(1)
        .mount(server)
        .await;
}

// =============================================================================
// DXF
// =============================================================================

#[tokio::test]
async fn dxf_download_writes_identical_bytes() {
    let server = MockServer::start().await;
    let body: Vec<u8> = vec![0x50, 0x4B, 0x03, 0x04, 0x00, 0xFF, 0x10, 0x7F];
    Mock::given(method("GET"))
        .and(path("/api/download/dxf_data/part/123456"))
        .and(header("Authorization", AUTH))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let out = TempDir::new().unwrap();
    let outcome = download_part(&client_for(&server), "123456", FileKind::Dxf, out.path())
        .await
        .unwrap();

    assert!(outcome.succeeded());
    assert_eq!(outcome.files(), &[out.path().join("part_123456.zip")]);
    assert_eq!(files_in(out.path()), vec!["part_123456.zip"]);
    assert_eq!(std::fs::read(out.path().join("part_123456.zip")).unwrap(), body);
}

#[tokio::test]
async fn dxf_download_overwrites_existing_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/download/dxf_data/part/7"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"new".to_vec()))
        .mount(&server)
        .await;

    let out = TempDir::new().unwrap();
    std::fs::write(out.path().join("part_7.zip"), b"old contents that are longer").unwrap();

    download_part(&client_for(&server), "7", FileKind::Dxf, out.path())
        .await
        .unwrap();

    assert_eq!(std::fs::read(out.path().join("part_7.zip")).unwrap(), b"new");
}

#[tokio::test]
async fn failed_dxf_download_is_a_hard_error_and_writes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/download/dxf_data/part/123"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .expect(1)
        .mount(&server)
        .await;

    let out = TempDir::new().unwrap();
    let err = download_part(&client_for(&server), "123", FileKind::Dxf, out.path())
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(403));
    assert_eq!(err.diagnostics().unwrap().body, "forbidden");
    assert!(files_in(out.path()).is_empty());
}

#[tokio::test]
async fn unwritable_output_is_a_file_write_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/download/dxf_data/part/1"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"data".to_vec()))
        .mount(&server)
        .await;

    let out = TempDir::new().unwrap();
    let missing = out.path().join("does-not-exist");

    let err = download_part(&client_for(&server), "1", FileKind::Dxf, &missing)
        .await
        .unwrap_err();
    assert!(matches!(err, PortalError::FileWrite { .. }));
}

// =============================================================================
// 3D macros
// =============================================================================

#[tokio::test]
async fn part_without_graphic_macro_stops_after_lookup() {
    let server = MockServer::start().await;
    mount_part(&server, "123", None).await;
    Mock::given(method("GET"))
        .and(path_regex("^/api/(macros|download)/.*"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let out = TempDir::new().unwrap();
    let outcome = download_part(&client_for(&server), "123", FileKind::ThreeD, out.path())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        DownloadOutcome::NoGraphicMacro {
            part_id: "123".to_string()
        }
    );
    assert!(!outcome.succeeded());
    assert!(files_in(out.path()).is_empty());
}

#[tokio::test]
async fn non_3d_macro_is_not_downloaded() {
    let server = MockServer::start().await;
    mount_part(&server, "123", Some("m-2d")).await;
    mount_macro(&server, "m-2d", "Breaker_2D", "breaker_2d.ema", &["v1"]).await;
    Mock::given(method("GET"))
        .and(path_regex("^/api/download/.*"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let out = TempDir::new().unwrap();
    let outcome = download_part(&client_for(&server), "123", FileKind::ThreeD, out.path())
        .await
        .unwrap();

    assert!(matches!(outcome, DownloadOutcome::NotThreeD { ref name, .. } if name == "Breaker_2D"));
    assert!(files_in(out.path()).is_empty());
}

#[tokio::test]
async fn partial_variant_success_counts_as_success() {
    let server = MockServer::start().await;
    mount_part(&server, "123", Some("m-3d")).await;
    mount_macro(&server, "m-3d", "Breaker", "SIE.3RV2011_3D.ema", &["v1", "v2", "v3"]).await;
    mount_variant(&server, "v1", 200, b"\x04first").await;
    mount_variant(&server, "v2", 500, b"internal error").await;
    mount_variant(&server, "v3", 200, b"\x04third").await;

    let out = TempDir::new().unwrap();
    let outcome = download_part(&client_for(&server), "123", FileKind::ThreeD, out.path())
        .await
        .unwrap();

    assert!(outcome.succeeded());
    assert_eq!(
        outcome.files(),
        &[out.path().join("macro_v1.e3d"), out.path().join("macro_v3.e3d")]
    );
    assert_eq!(files_in(out.path()), vec!["macro_v1.e3d", "macro_v3.e3d"]);
    assert_eq!(std::fs::read(out.path().join("macro_v3.e3d")).unwrap(), b"\x04third");
}

#[tokio::test]
async fn all_variants_failing_is_a_soft_failure() {
    let server = MockServer::start().await;
    mount_part(&server, "123", Some("m-3d")).await;
    mount_macro(&server, "m-3d", "Breaker_3D", "x.ema", &["v1", "v2"]).await;
    mount_variant(&server, "v1", 404, b"").await;
    mount_variant(&server, "v2", 401, b"").await;

    let out = TempDir::new().unwrap();
    let outcome = download_part(&client_for(&server), "123", FileKind::ThreeD, out.path())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        DownloadOutcome::NoValidVariant {
            macro_id: "m-3d".to_string(),
            attempted: 2
        }
    );
    assert!(files_in(out.path()).is_empty());
}

#[tokio::test]
async fn unauthorized_part_lookup_is_a_hard_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/parts/123"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let out = TempDir::new().unwrap();
    let err = download_part(&client_for(&server), "123", FileKind::ThreeD, out.path())
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn missing_macro_is_not_found() {
    let server = MockServer::start().await;
    mount_part(&server, "123", Some("gone")).await;
    Mock::given(method("GET"))
        .and(path("/api/macros/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let out = TempDir::new().unwrap();
    let err = download_part(&client_for(&server), "123", FileKind::ThreeD, out.path())
        .await
        .unwrap_err();
    assert!(matches!(err, PortalError::NotFound { .. }));
}

#[tokio::test]
async fn unauthorized_macro_lookup_is_a_hard_error() {
    let server = MockServer::start().await;
    mount_part(&server, "123", Some("m-3d")).await;
    Mock::given(method("GET"))
        .and(path("/api/macros/m-3d"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex("^/api/download/.*"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let out = TempDir::new().unwrap();
    let err = download_part(&client_for(&server), "123", FileKind::ThreeD, out.path())
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert!(err.diagnostics().unwrap().url.ends_with("/api/macros/m-3d"));
    assert!(files_in(out.path()).is_empty());
}
