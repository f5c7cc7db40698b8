use std::path::Path;
use std::sync::Arc;

use axum_test::TestServer;
use chrono::{Duration, Utc};
use http::{header, HeaderValue, StatusCode};
use landing_api::{auth, create_router, AppState};
use landing_core::{DatabaseConfig, Settings};
use serde_json::json;

fn test_settings(dir: &Path) -> Settings {
    Settings {
        title: "Test CTF".into(),
        database: DatabaseConfig {
            url: "sqlite::memory:".into(),
        },
        session_secret: "integration-test-secret".into(),
        // Check-in window is [start - 24h, start - 1h]; put "now" inside it.
        start_time: Utc::now() + Duration::hours(12),
        scoreboard_dir: dir.join("scoreboard"),
        team_data_dir: dir.join("data"),
        static_dir: dir.join("static"),
        ..Settings::default()
    }
}

async fn test_state(settings: Settings) -> AppState {
    std::fs::create_dir_all(&settings.scoreboard_dir).unwrap();
    std::fs::create_dir_all(&settings.team_data_dir).unwrap();
    std::fs::create_dir_all(&settings.static_dir).unwrap();
    std::fs::write(
        settings.static_dir.join("index.html"),
        "<html>landing</html>",
    )
    .unwrap();

    AppState::new(Arc::new(settings)).await.expect("app state")
}

fn session_header(state: &AppState, team_id: i64) -> HeaderValue {
    let token = auth::issue_token(team_id, &state.settings.session_secret).unwrap();
    HeaderValue::from_str(&format!("{}={token}", auth::SESSION_COOKIE)).unwrap()
}

#[tokio::test]
async fn health_endpoint_returns_ok() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(test_settings(dir.path())).await;
    let server = TestServer::new(create_router(state)).unwrap();

    let resp = server.get("/health").await;
    assert_eq!(resp.status_code(), StatusCode::OK);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["title"], "Test CTF");
}

#[tokio::test]
async fn protected_routes_require_session() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(test_settings(dir.path())).await;
    let server = TestServer::new(create_router(state)).unwrap();

    for (method, path) in [
        ("GET", "/api/account/info"),
        ("GET", "/api/account/vpnconfig"),
        ("POST", "/api/account/checkin"),
        ("POST", "/api/vm/start"),
        ("POST", "/api/vm/reset"),
    ] {
        let resp = match method {
            "GET" => server.get(path).await,
            _ => server.post(path).await,
        };
        assert_eq!(resp.status_code(), StatusCode::UNAUTHORIZED, "{path}");
    }
}

#[tokio::test]
async fn invalid_session_cookie_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(test_settings(dir.path())).await;
    let server = TestServer::new(create_router(state)).unwrap();

    let resp = server
        .get("/api/account/info")
        .add_header(
            header::COOKIE,
            HeaderValue::from_static("landing_session=tampered"),
        )
        .await;
    assert_eq!(resp.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn account_info_reports_team_details() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(test_settings(dir.path())).await;
    let team = state
        .store
        .get_or_update_team(1337, "ENOFLAG", None, Some("DE"))
        .await
        .unwrap();
    let cookie = session_header(&state, team.id);
    let server = TestServer::new(create_router(state)).unwrap();

    let resp = server
        .get("/api/account/info")
        .add_header(header::COOKIE, cookie)
        .await;
    assert_eq!(resp.status_code(), StatusCode::OK);

    let body: serde_json::Value = resp.json();
    assert_eq!(body["teamName"], "ENOFLAG");
    assert_eq!(body["confirmed"], false);
    assert_eq!(body["vpnConfigAvailable"], false);
    assert_eq!(body["internalIpAddress"], format!("10.0.0.{}", team.id));
    assert_eq!(body["vulnboxStatus"], "uninitialized");
    assert!(body["rootPassword"].is_string());
}

#[tokio::test]
async fn check_in_inside_window_confirms_team() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(test_settings(dir.path())).await;
    let team = state
        .store
        .get_or_update_team(1, "early bird", None, None)
        .await
        .unwrap();
    let cookie = session_header(&state, team.id);
    let server = TestServer::new(create_router(state)).unwrap();

    let resp = server
        .post("/api/account/checkin")
        .add_header(header::COOKIE, cookie)
        .await;
    assert_eq!(resp.status_code(), StatusCode::NO_CONTENT);

    let resp = server.get("/api/teams/confirmed").await;
    assert_eq!(resp.status_code(), StatusCode::OK);
    let teams: serde_json::Value = resp.json();
    assert_eq!(teams[0]["name"], "early bird");
    assert_eq!(teams[0]["ctftimeId"], 1);
}

#[tokio::test]
async fn check_in_outside_window_is_forbidden() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = test_settings(dir.path());
    // Window has not opened yet.
    settings.start_time = Utc::now() + Duration::hours(48);
    let state = test_state(settings).await;
    let team = state
        .store
        .get_or_update_team(2, "too early", None, None)
        .await
        .unwrap();
    let cookie = session_header(&state, team.id);
    let server = TestServer::new(create_router(state)).unwrap();

    let resp = server
        .post("/api/account/checkin")
        .add_header(header::COOKIE, cookie)
        .await;
    assert_eq!(resp.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn confirmed_teams_is_empty_without_check_ins() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(test_settings(dir.path())).await;
    state
        .store
        .get_or_update_team(3, "lurker", None, None)
        .await
        .unwrap();
    let server = TestServer::new(create_router(state)).unwrap();

    let resp = server.get("/api/teams/confirmed").await;
    let teams: Vec<serde_json::Value> = resp.json();
    assert!(teams.is_empty());
}

#[tokio::test]
async fn vpn_config_requires_external_address() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(test_settings(dir.path())).await;
    let team = state
        .store
        .get_or_update_team(4, "vpn team", None, None)
        .await
        .unwrap();
    let cookie = session_header(&state, team.id);
    let server = TestServer::new(create_router(state.clone())).unwrap();

    let resp = server
        .get("/api/account/vpnconfig")
        .add_header(header::COOKIE, cookie.clone())
        .await;
    assert_eq!(resp.status_code(), StatusCode::NOT_FOUND);

    // Provision the address and the config template.
    state
        .store
        .set_external_address(team.id, Some("203.0.113.7"))
        .await
        .unwrap();
    let conf_dir = state
        .settings
        .team_data_dir
        .join("teamdata")
        .join(format!("team{}", team.id));
    std::fs::create_dir_all(&conf_dir).unwrap();
    std::fs::write(
        conf_dir.join("client.conf"),
        "client\nremote REMOTE_IP_PLACEHOLDER 1194\n",
    )
    .unwrap();

    let resp = server
        .get("/api/account/vpnconfig")
        .add_header(header::COOKIE, cookie)
        .await;
    assert_eq!(resp.status_code(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"client.conf\""
    );
    let body = resp.text();
    assert!(body.contains("remote 203.0.113.7 1194"));
    assert!(!body.contains("REMOTE_IP_PLACEHOLDER"));
}

#[tokio::test]
async fn login_redirects_to_provider() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = test_settings(dir.path());
    settings.oauth.client_id = "landing-client".into();
    settings.oauth.redirect_url = "http://localhost/api/account/oauth2redirect".into();
    let state = test_state(settings).await;
    let server = TestServer::new(create_router(state)).unwrap();

    let resp = server.get("/api/account/login?redirect_uri=/scoreboard").await;
    assert_eq!(resp.status_code(), StatusCode::SEE_OTHER);

    let location = resp
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(location.starts_with("https://ctftime.org/oauth2/authorize"));
    assert!(location.contains("client_id=landing-client"));
    assert!(location.contains("response_type=code"));

    let cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(cookie.starts_with("landing_oauth_state="));
}

#[tokio::test]
async fn oauth_callback_rejects_bad_state() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(test_settings(dir.path())).await;
    let server = TestServer::new(create_router(state)).unwrap();

    // No state cookie at all.
    let resp = server
        .get("/api/account/oauth2redirect?code=abc&state=nonce:/")
        .await;
    assert_eq!(resp.status_code(), StatusCode::UNAUTHORIZED);

    // Cookie nonce does not match the state parameter.
    let resp = server
        .get("/api/account/oauth2redirect?code=abc&state=nonce:/")
        .add_header(
            header::COOKIE,
            HeaderValue::from_static("landing_oauth_state=other"),
        )
        .await;
    assert_eq!(resp.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn scoreboard_snapshots_are_served_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(test_settings(dir.path())).await;

    let snapshot = json!({
        "currentRound": 7,
        "startTimestamp": "2026-07-18T12:00:00Z",
        "endTimestamp": "2026-07-18T12:01:00Z",
        "roundLength": 60,
        "services": [{"serviceId": 1, "serviceName": "noter"}],
        "teams": []
    });
    std::fs::write(
        state.settings.scoreboard_dir.join("scoreboard.json"),
        snapshot.to_string(),
    )
    .unwrap();
    std::fs::write(
        state.settings.scoreboard_dir.join("scoreboard7.json"),
        snapshot.to_string(),
    )
    .unwrap();
    let server = TestServer::new(create_router(state)).unwrap();

    let resp = server.get("/api/scoreboard/scoreboard.json").await;
    assert_eq!(resp.status_code(), StatusCode::OK);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["currentRound"], 7);

    let resp = server.get("/api/scoreboard/scoreboard7.json").await;
    assert_eq!(resp.status_code(), StatusCode::OK);

    // Unknown rounds and malformed names both 404.
    let resp = server.get("/api/scoreboard/scoreboard8.json").await;
    assert_eq!(resp.status_code(), StatusCode::NOT_FOUND);
    let resp = server.get("/api/scoreboard/scoreboard-1.json").await;
    assert_eq!(resp.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn schedule_reflects_current_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(test_settings(dir.path())).await;

    // A round that ended just now: the next boundary is one round away.
    let snapshot = json!({
        "currentRound": 3,
        "startTimestamp": (Utc::now() - Duration::seconds(60)).to_rfc3339(),
        "endTimestamp": Utc::now().to_rfc3339(),
        "roundLength": 60
    });
    std::fs::write(
        state.settings.scoreboard_dir.join("scoreboard.json"),
        snapshot.to_string(),
    )
    .unwrap();
    let server = TestServer::new(create_router(state)).unwrap();

    let resp = server.get("/api/scoreboard/schedule").await;
    assert_eq!(resp.status_code(), StatusCode::OK);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["currentRound"], 3);
    assert_eq!(body["isCurrentRound"], true);
    let time_left = body["timeLeftSecs"].as_f64().unwrap();
    assert!(time_left > 55.0 && time_left <= 60.0);
}

#[tokio::test]
async fn schedule_without_snapshot_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(test_settings(dir.path())).await;
    let server = TestServer::new(create_router(state)).unwrap();

    let resp = server.get("/api/scoreboard/schedule").await;
    assert_eq!(resp.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn spa_routes_fall_back_to_index() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(test_settings(dir.path())).await;
    let server = TestServer::new(create_router(state)).unwrap();

    let resp = server.get("/registrationclosed").await;
    assert_eq!(resp.status_code(), StatusCode::OK);
    assert!(resp.text().contains("landing"));
}
