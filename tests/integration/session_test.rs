//! Session establishment, restore, and nonce refresh.

use super::*;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wp_request_utils::session::{load_storage_state, save_storage_state, Cookie};
use wp_request_utils::{
    Error, RequestUtils, RequestUtilsConfig, RestRequest, SessionPhase, SessionState,
};

#[tokio::test]
async fn test_login_establishes_a_session() {
    init_test_env();
    let server = MockServer::start().await;
    mount_login(&server, 1).await;

    let utils = RequestUtils::setup(config_for(&server)).await.unwrap();

    assert_eq!(utils.phase().await, SessionPhase::Ready);
    let session = utils.session().await.unwrap();
    assert_eq!(session.nonce, NONCE);
    assert_eq!(session.root_url, rest_root(&server));
    assert!(!session.cookies.is_empty());
    assert!(session.has_cookie_prefix("wordpress_logged_in"));
}

#[tokio::test]
async fn test_wrong_password_fails() {
    init_test_env();
    let server = MockServer::start().await;
    mount_login(&server, 0).await;

    let mut config = config_for(&server);
    config.user.password = "hunter2".to_string();

    let err = RequestUtils::setup(config).await.unwrap_err();
    assert!(matches!(err, Error::Authentication(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_first_run_persists_and_second_run_restores() {
    init_test_env();
    let server = MockServer::start().await;
    // Only the first setup may log in.
    mount_login(&server, 1).await;

    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("storage-states").join("admin.json");

    let first = RequestUtils::setup(config_with_state(&server, state_path.clone()))
        .await
        .unwrap();
    let saved = load_storage_state(&state_path).unwrap().unwrap();
    assert_eq!(Some(saved.clone()), first.session().await);

    let second = RequestUtils::setup(config_with_state(&server, state_path))
        .await
        .unwrap();
    assert_eq!(second.phase().await, SessionPhase::Ready);
    assert_eq!(second.session().await, Some(saved));
}

#[tokio::test]
async fn test_restore_performs_no_network_call() {
    init_test_env();
    let server = MockServer::start().await;
    mount_login(&server, 0).await;

    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("admin.json");
    let snapshot = SessionState::new(
        vec![Cookie::new("wordpress_logged_in_abc", "l", "127.0.0.1")],
        "restored",
        rest_root(&server),
    );
    save_storage_state(&state_path, &snapshot).unwrap();

    let utils = RequestUtils::setup(config_with_state(&server, state_path))
        .await
        .unwrap();

    assert_eq!(utils.session().await.unwrap().nonce, "restored");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_snapshot_is_a_configuration_error() {
    init_test_env();
    let server = MockServer::start().await;
    mount_login(&server, 0).await;

    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("admin.json");
    std::fs::write(
        &state_path,
        json!({ "cookies": [], "nonce": "", "rootURL": "" }).to_string(),
    )
    .unwrap();

    let err = RequestUtils::setup(config_with_state(&server, state_path))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Configuration(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_stale_nonce_triggers_one_relogin_and_retry() {
    init_test_env();
    let server = MockServer::start().await;
    mount_login(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/types"))
        .and(header("X-WP-Nonce", "stale"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "code": "rest_cookie_invalid_nonce",
            "message": "Cookie check failed",
            "data": { "status": 403 }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/types"))
        .and(header("X-WP-Nonce", NONCE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "post": { "slug": "post" } })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("admin.json");
    let stale = SessionState::new(
        vec![Cookie::new("wordpress_logged_in_abc", "l", "127.0.0.1")],
        "stale",
        rest_root(&server),
    );
    save_storage_state(&state_path, &stale).unwrap();

    let utils = RequestUtils::setup(config_with_state(&server, state_path.clone()))
        .await
        .unwrap();
    let types = utils.rest(RestRequest::get("/wp/v2/types")).await.unwrap();
    assert_eq!(types["post"]["slug"], "post");

    // The refreshed session replaced the stale snapshot.
    assert_eq!(utils.session().await.unwrap().nonce, NONCE);
    assert_eq!(load_storage_state(&state_path).unwrap().unwrap().nonce, NONCE);
}

/// Mounts `/wp/v2/types` answering a stale nonce with 403 and [`NONCE`]
/// with 200.
async fn mount_types(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/types"))
        .and(header("X-WP-Nonce", "stale"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "code": "rest_cookie_invalid_nonce",
            "message": "Cookie check failed",
            "data": { "status": 403 }
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/types"))
        .and(header("X-WP-Nonce", NONCE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "post": { "slug": "post" } })))
        .mount(server)
        .await;
}

fn stale_snapshot(server: &MockServer, state_path: &std::path::Path) {
    let stale = SessionState::new(
        vec![Cookie::new("wordpress_logged_in_abc", "l", "127.0.0.1")],
        "stale",
        rest_root(server),
    );
    save_storage_state(state_path, &stale).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_stale_nonce_logs_in_once() {
    init_test_env();
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    mount_types(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("admin.json");
    stale_snapshot(&server, &state_path);

    let utils = Arc::new(
        RequestUtils::setup(config_with_state(&server, state_path))
            .await
            .unwrap(),
    );
    let handles: Vec<_> = (0..6)
        .map(|_| {
            let utils = Arc::clone(&utils);
            tokio::spawn(async move { utils.rest(RestRequest::get("/wp/v2/types")).await })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap()["post"]["slug"], "post");
    }

    let logins = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() == "POST" && r.url.path() == "/wp-login.php")
        .count();
    assert_eq!(logins, 1);
    assert_eq!(utils.session().await.unwrap().nonce, NONCE);
}

#[tokio::test]
async fn test_relogin_survives_unwritable_snapshot() {
    init_test_env();
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    mount_types(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("admin.json");
    stale_snapshot(&server, &state_path);

    let utils = RequestUtils::setup(config_with_state(&server, state_path.clone()))
        .await
        .unwrap();
    // A directory in the snapshot's place makes the rename fail.
    std::fs::remove_file(&state_path).unwrap();
    std::fs::create_dir(&state_path).unwrap();

    let types = utils.rest(RestRequest::get("/wp/v2/types")).await.unwrap();
    assert_eq!(types["post"]["slug"], "post");
    assert_eq!(utils.session().await.unwrap().nonce, NONCE);
    assert!(state_path.is_dir());
}

#[tokio::test]
async fn test_rest_error_envelope() {
    init_test_env();
    let server = MockServer::start().await;
    mount_login(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts/999"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": "rest_post_invalid_id",
            "message": "Invalid post ID.",
            "data": { "status": 404 }
        })))
        .mount(&server)
        .await;

    let utils = RequestUtils::setup(config_for(&server)).await.unwrap();
    let err = utils
        .rest(RestRequest::get("/wp/v2/posts/999"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        Error::Server {
            status: 404,
            code: "rest_post_invalid_id".to_string(),
            message: "Invalid post ID.".to_string(),
        }
    );
}

#[tokio::test]
async fn test_unreachable_site_is_a_transport_error() {
    init_test_env();
    let config = RequestUtilsConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        timeout: 2_000,
        ..Default::default()
    };

    let err = RequestUtils::setup(config).await.unwrap_err();
    assert!(err.is_transport(), "got {:?}", err);
}
