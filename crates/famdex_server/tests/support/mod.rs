//! Shared integration-test server bootstrap helpers.

use axum_test::TestServer;
use famdex_server::{create_app, AppState, Config, Database};
use serde_json::json;
use tempfile::TempDir;

pub(crate) const TEST_ADMIN_TOKEN: &str = "test-admin-token";

pub(crate) fn test_config_for_dir(dir: &TempDir) -> Config {
    Config {
        port: 0,
        db_path: dir
            .path()
            .join("test-db")
            .to_str()
            .expect("db path")
            .to_string(),
        max_upload_size: 10_000_000,
        admin_token: Some(TEST_ADMIN_TOKEN.to_string()),
        cache_ttl_secs: 3_600,
        media_dir: dir
            .path()
            .join("media")
            .to_str()
            .expect("media path")
            .to_string(),
        media_base_url: "/media".to_string(),
    }
}

pub(crate) fn setup_test_server() -> (TestServer, TempDir) {
    let temp_dir = TempDir::new().expect("temp dir");
    let config = test_config_for_dir(&temp_dir);
    let db = Database::new(config.db_path.as_str()).expect("open db");
    let state = AppState::new(config, db);
    let app = create_app(state, false);
    let server = TestServer::new(app).expect("server");
    (server, temp_dir)
}

pub(crate) fn family_payload(slug: &str, name: &str, category: &str) -> serde_json::Value {
    json!({
        "slug": slug,
        "name": name,
        "category": category,
        "description": format!("{} for test catalogs.", name),
        "tags": ["test"],
        "download_url": format!("/files/{}.rfa", slug),
        "file_size_bytes": 2048,
        "versions": ["2023", "2024"],
    })
}
