//! Integration tests for the gateway: rate limiting, session gates,
//! and the three proxy shapes against mock upstream backends.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use portal_gateway::config::GatewayConfig;
use portal_gateway::http::HttpServer;
use portal_gateway::lifecycle::Shutdown;
use portal_gateway::time::now_millis;

mod common;

fn unique_data_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("portal-gw-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn base_config(dir: &Path, bind: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = bind.to_string();
    config.storage.data_dir = dir.to_string_lossy().into_owned();
    config.timeouts.upstream_secs = 2;
    config
}

async fn start_gateway(config: GatewayConfig, addr: SocketAddr) -> Shutdown {
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    let rx = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    tokio::time::sleep(Duration::from_millis(250)).await;
    shutdown
}

fn write_user_session(dir: &Path, token: &str, username: &str, is_admin: bool) {
    let sessions = serde_json::json!({
        token: {
            "userId": format!("user-{username}"),
            "username": username,
            "email": format!("{username}@example.com"),
            "createdAt": now_millis(),
            "expiresAt": now_millis() + 3_600_000,
            "isAdmin": is_admin
        }
    });
    std::fs::write(dir.join("sessions.json"), sessions.to_string()).unwrap();
}

fn write_admin_session(dir: &Path, token: &str) {
    let sessions = serde_json::json!([
        {"sessionId": token, "expiresAt": now_millis() + 3_600_000}
    ]);
    std::fs::write(dir.join("admin-sessions.json"), sessions.to_string()).unwrap();
}

/// Mock upstream that records every raw request it receives.
async fn start_recording_upstream(addr: SocketAddr, body: &'static str) -> Arc<Mutex<Vec<String>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();
    common::start_mock_upstream(addr, move |raw| {
        log.lock().unwrap().push(raw);
        (200, "application/json".to_string(), body.to_string())
    })
    .await;
    seen
}

#[tokio::test]
async fn test_health_endpoint() {
    let proxy_addr: SocketAddr = "127.0.0.1:28601".parse().unwrap();
    let dir = unique_data_dir();
    let shutdown = start_gateway(base_config(&dir, proxy_addr), proxy_addr).await;

    let res = common::test_client()
        .get(format!("http://{proxy_addr}/health"))
        .send()
        .await
        .expect("Gateway unreachable");

    assert_eq!(res.status(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    shutdown.trigger();
}

#[tokio::test]
async fn test_admin_proxy_injects_token_and_rewrites_host() {
    let upstream_addr: SocketAddr = "127.0.0.1:28611".parse().unwrap();
    let proxy_addr: SocketAddr = "127.0.0.1:28612".parse().unwrap();

    let seen = start_recording_upstream(upstream_addr, r#"{"ok":true}"#).await;

    let dir = unique_data_dir();
    let mut config = base_config(&dir, proxy_addr);
    config.admin_daemon.base_url = format!("http://{upstream_addr}");
    config.admin_daemon.token = "daemon-secret".to_string();
    let shutdown = start_gateway(config, proxy_addr).await;

    let res = common::test_client()
        .get(format!("http://{proxy_addr}/api/admin-proxy/jobs/7?full=1"))
        .send()
        .await
        .expect("Gateway unreachable");

    assert_eq!(res.status(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["ok"], true);

    let raw = seen.lock().unwrap().first().unwrap().to_lowercase();
    assert!(raw.starts_with("get /jobs/7?full=1 "), "prefix must be stripped: {raw}");
    assert!(raw.contains("x-api-key: daemon-secret"), "token must be injected");
    assert!(
        raw.contains(&format!("host: {upstream_addr}")),
        "host must name the upstream"
    );
    assert!(
        !raw.contains(&proxy_addr.to_string()),
        "inbound host must not leak through"
    );

    shutdown.trigger();
}

#[tokio::test]
async fn test_admin_proxy_route_shapes_are_equivalent() {
    let upstream_addr: SocketAddr = "127.0.0.1:28621".parse().unwrap();
    let proxy_addr: SocketAddr = "127.0.0.1:28622".parse().unwrap();

    let seen = start_recording_upstream(upstream_addr, r#"{"ok":true}"#).await;

    let dir = unique_data_dir();
    let mut config = base_config(&dir, proxy_addr);
    config.admin_daemon.base_url = format!("http://{upstream_addr}");
    let shutdown = start_gateway(config, proxy_addr).await;

    let client = common::test_client();
    for prefix in ["/api/admin-proxy", "/api/admin-proxy-proxy"] {
        let res = client
            .get(format!("http://{proxy_addr}{prefix}/library/scan"))
            .send()
            .await
            .expect("Gateway unreachable");
        assert_eq!(res.status(), 200);
    }

    let request_lines: Vec<String> = seen
        .lock()
        .unwrap()
        .iter()
        .map(|raw| raw.lines().next().unwrap().to_string())
        .collect();
    assert_eq!(request_lines.len(), 2);
    assert_eq!(request_lines[0], request_lines[1]);
    assert!(request_lines[0].starts_with("GET /library/scan"));

    shutdown.trigger();
}

#[tokio::test]
async fn test_admin_proxy_relays_upstream_error_status_verbatim() {
    let upstream_addr: SocketAddr = "127.0.0.1:28631".parse().unwrap();
    let proxy_addr: SocketAddr = "127.0.0.1:28632".parse().unwrap();

    common::start_mock_upstream(upstream_addr, |_| {
        (503, "text/plain".to_string(), "maintenance".to_string())
    })
    .await;

    let dir = unique_data_dir();
    let mut config = base_config(&dir, proxy_addr);
    config.admin_daemon.base_url = format!("http://{upstream_addr}");
    let shutdown = start_gateway(config, proxy_addr).await;

    let res = common::test_client()
        .get(format!("http://{proxy_addr}/api/admin-proxy/status"))
        .send()
        .await
        .expect("Gateway unreachable");

    assert_eq!(res.status(), 503, "upstream status must relay verbatim");
    assert_eq!(res.text().await.unwrap(), "maintenance");

    shutdown.trigger();
}

#[tokio::test]
async fn test_admin_proxy_unreachable_names_target() {
    let proxy_addr: SocketAddr = "127.0.0.1:28641".parse().unwrap();

    let dir = unique_data_dir();
    let mut config = base_config(&dir, proxy_addr);
    // Nothing listens here.
    config.admin_daemon.base_url = "http://127.0.0.1:28649".to_string();
    let shutdown = start_gateway(config, proxy_addr).await;

    let res = common::test_client()
        .get(format!("http://{proxy_addr}/api/admin-proxy/status"))
        .send()
        .await
        .expect("Gateway unreachable");

    assert_eq!(res.status(), 500);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["code"], "upstream_unreachable");
    assert!(
        body["message"].as_str().unwrap().contains("admin-daemon"),
        "message must name the target"
    );

    shutdown.trigger();
}

#[tokio::test]
async fn test_named_service_proxy_gates_and_resolves_bindings() {
    let upstream_addr: SocketAddr = "127.0.0.1:28651".parse().unwrap();
    let proxy_addr: SocketAddr = "127.0.0.1:28652".parse().unwrap();

    let seen = start_recording_upstream(upstream_addr, r#"{"service":"ok"}"#).await;

    let dir = unique_data_dir();
    write_admin_session(&dir, "adm-tok");
    let config = base_config(&dir, proxy_addr);
    let shutdown = start_gateway(config, proxy_addr).await;

    let client = common::test_client();

    // No admin session.
    let res = client
        .get(format!("http://{proxy_addr}/api/proxy/librarian"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);

    // Admin session but no binding: 404 before any network call.
    let res = client
        .get(format!("http://{proxy_addr}/api/proxy/unbound-svc"))
        .header("Cookie", "admin_session=adm-tok")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);

    // Bound service forwards.
    std::env::set_var("SERVICE_URL_LIBRARIAN", format!("http://{upstream_addr}"));
    let res = client
        .get(format!("http://{proxy_addr}/api/proxy/librarian?probe=1"))
        .header("Cookie", "admin_session=adm-tok")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["service"], "ok");
    assert_eq!(seen.lock().unwrap().len(), 1, "only the bound request reaches upstream");

    shutdown.trigger();
}

#[tokio::test]
async fn test_media_search_aggregates_partial_failure() {
    let movie_addr: SocketAddr = "127.0.0.1:28661".parse().unwrap();
    let proxy_addr: SocketAddr = "127.0.0.1:28662".parse().unwrap();

    common::start_json_upstream(
        movie_addr,
        r#"{"results":[{"id":1,"title":"Dune"},{"id":2,"title":"Dune Part Two"}]}"#,
    )
    .await;

    let dir = unique_data_dir();
    write_user_session(&dir, "usr-tok", "reader", false);
    let mut config = base_config(&dir, proxy_addr);
    config.indexers.movie = Some(portal_gateway::config::IndexerConfig {
        base_url: format!("http://{movie_addr}/search"),
        api_key: "movie-key".to_string(),
    });
    config.indexers.series = Some(portal_gateway::config::IndexerConfig {
        // Nothing listens here.
        base_url: "http://127.0.0.1:28669/search".to_string(),
        api_key: "series-key".to_string(),
    });
    let shutdown = start_gateway(config, proxy_addr).await;

    let client = common::test_client();

    // Unauthenticated.
    let res = client
        .get(format!("http://{proxy_addr}/api/media/search?query=dune"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);

    // Query too short.
    let res = client
        .get(format!("http://{proxy_addr}/api/media/search?query=d"))
        .header("Cookie", "user_session=usr-tok")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);

    // Movie arm succeeds, series arm fails: 200 with message.
    let res = client
        .get(format!("http://{proxy_addr}/api/media/search?query=dune"))
        .header("Cookie", "user_session=usr-tok")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r["mediaType"] == "movie"));
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("series-indexer"), "message must describe the failed arm");

    shutdown.trigger();
}

#[tokio::test]
async fn test_media_search_type_filter_and_total_failure() {
    let proxy_addr: SocketAddr = "127.0.0.1:28671".parse().unwrap();

    let dir = unique_data_dir();
    write_user_session(&dir, "usr-tok", "reader", false);
    // Neither indexer configured.
    let config = base_config(&dir, proxy_addr);
    let shutdown = start_gateway(config, proxy_addr).await;

    let client = common::test_client();

    // Unknown type value.
    let res = client
        .get(format!("http://{proxy_addr}/api/media/search?query=dune&type=podcast"))
        .header("Cookie", "user_session=usr-tok")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);

    // Every queried arm failing surfaces a combined upstream error.
    let res = client
        .get(format!("http://{proxy_addr}/api/media/search?query=dune"))
        .header("Cookie", "user_session=usr-tok")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 500);
    let body: serde_json::Value = res.json().await.unwrap();
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("movie-indexer"));
    assert!(message.contains("series-indexer"));

    shutdown.trigger();
}

#[tokio::test]
async fn test_verify_invite_and_rate_limit_lockout() {
    let proxy_addr: SocketAddr = "127.0.0.1:28681".parse().unwrap();

    let dir = unique_data_dir();
    std::fs::write(
        dir.join("invites.json"),
        serde_json::json!([{"code": "WELCOME", "active": true, "used": false}]).to_string(),
    )
    .unwrap();
    let config = base_config(&dir, proxy_addr);
    let shutdown = start_gateway(config, proxy_addr).await;

    let client = common::test_client();
    let url = format!("http://{proxy_addr}/api/auth/verify-invite");

    // Valid code, case-insensitively.
    let res = client
        .post(&url)
        .json(&serde_json::json!({"invite_code": "welcome"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["success"], true);

    // Missing field.
    let res = client
        .post(&url)
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);

    // Five failed attempts exhaust the window.
    for _ in 0..5 {
        let res = client
            .post(&url)
            .json(&serde_json::json!({"invite_code": "WRONG"}))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["success"], false);
    }

    // Locked out now, even for a valid code.
    let res = client
        .post(&url)
        .json(&serde_json::json!({"invite_code": "WELCOME"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 429);
    assert!(res.headers().contains_key("retry-after"));
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["code"], "rate_limited");
    assert!(body["retryAfterMinutes"].as_u64().unwrap() > 0);

    shutdown.trigger();
}

#[tokio::test]
async fn test_auth_check_and_logout() {
    let proxy_addr: SocketAddr = "127.0.0.1:28691".parse().unwrap();

    let dir = unique_data_dir();
    write_user_session(&dir, "usr-tok", "reader", false);
    let config = base_config(&dir, proxy_addr);
    let shutdown = start_gateway(config, proxy_addr).await;

    let client = common::test_client();

    let res = client
        .get(format!("http://{proxy_addr}/api/auth/check"))
        .header("Cookie", "user_session=usr-tok")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["username"], "reader");
    assert_eq!(body["userId"], "user-reader");

    let res = client
        .get(format!("http://{proxy_addr}/api/auth/check"))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["authenticated"], false);
    assert!(body.get("username").is_none());

    let res = client
        .post(format!("http://{proxy_addr}/api/auth/logout"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let cookie = res.headers().get("set-cookie").unwrap().to_str().unwrap();
    assert!(cookie.starts_with("user_session="));
    assert!(cookie.contains("Max-Age=0"));

    shutdown.trigger();
}

#[tokio::test]
async fn test_content_issues_admin_gate_and_round_trip() {
    let proxy_addr: SocketAddr = "127.0.0.1:28701".parse().unwrap();

    let dir = unique_data_dir();
    write_user_session(&dir, "usr-tok", "reader", false);
    write_admin_session(&dir, "adm-tok");
    std::fs::write(
        dir.join("content-issues.json"),
        serde_json::json!([
            {"id": "old", "title": "missing cover", "status": "pending", "createdAt": 1000},
            {"id": "new", "title": "wrong edition", "status": "pending", "createdAt": 2000}
        ])
        .to_string(),
    )
    .unwrap();
    let config = base_config(&dir, proxy_addr);
    let shutdown = start_gateway(config, proxy_addr).await;

    let client = common::test_client();
    let url = format!("http://{proxy_addr}/api/admin/content-issues");

    // Anonymous: 401. Plain user: 403.
    assert_eq!(client.get(&url).send().await.unwrap().status(), 401);
    let res = client
        .get(&url)
        .header("Cookie", "user_session=usr-tok")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);

    // Admin list, newest first.
    let res = client
        .get(&url)
        .header("Cookie", "admin_session=adm-tok")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["new", "old"]);

    // Update round-trips.
    let res = client
        .put(&url)
        .header("Cookie", "admin_session=adm-tok")
        .json(&serde_json::json!({"id": "old", "status": "resolved"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let res = client
        .get(&url)
        .header("Cookie", "admin_session=adm-tok")
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    let old = body
        .as_array()
        .unwrap()
        .iter()
        .find(|i| i["id"] == "old")
        .unwrap();
    assert_eq!(old["status"], "resolved");

    // Restricted status set and unknown id.
    let res = client
        .put(&url)
        .header("Cookie", "admin_session=adm-tok")
        .json(&serde_json::json!({"id": "old", "status": "archived"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);

    let res = client
        .put(&url)
        .header("Cookie", "admin_session=adm-tok")
        .json(&serde_json::json!({"id": "ghost", "status": "resolved"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);

    shutdown.trigger();
}

#[tokio::test]
async fn test_legacy_admin_flag_passes_admin_gate() {
    let proxy_addr: SocketAddr = "127.0.0.1:28711".parse().unwrap();

    let dir = unique_data_dir();
    write_user_session(&dir, "boss-tok", "boss", true);
    let config = base_config(&dir, proxy_addr);
    let shutdown = start_gateway(config, proxy_addr).await;

    let res = common::test_client()
        .get(format!("http://{proxy_addr}/api/admin/content-issues"))
        .header("Cookie", "user_session=boss-tok")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    shutdown.trigger();
}
