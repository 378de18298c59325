//! End-to-end API behaviour: session creation, uploads, merge, CORS, and
//! the full record-then-finalize lifecycle.

use super::test_helpers::spawn_server;

#[tokio::test]
async fn session_endpoint_returns_token_and_registers() {
    let server = spawn_server().await;

    let resp = reqwest::get(format!("{}/session", server.base_url))
        .await
        .expect("GET /session");
    assert_eq!(resp.status(), 200);

    let token = resp.text().await.expect("body");
    assert!(!token.is_empty());
    assert!(server.state.registry.lookup(&token).is_some());
    assert_eq!(server.hub.spawn_count(), 1);
}

#[tokio::test]
async fn upload_with_unknown_token_is_404() {
    let server = spawn_server().await;

    let resp = reqwest::Client::new()
        .post(format!("{}/upload?session=bogus&part=0", server.base_url))
        .body(vec![1u8, 2, 3])
        .send()
        .await
        .expect("POST /upload");

    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn upload_without_session_param_is_404() {
    let server = spawn_server().await;

    let resp = reqwest::Client::new()
        .post(format!("{}/upload", server.base_url))
        .body(vec![1u8])
        .send()
        .await
        .expect("POST /upload");

    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn full_lifecycle_upload_three_chunks_then_merge() {
    let server = spawn_server().await;
    let client = reqwest::Client::new();

    let token = reqwest::get(format!("{}/session", server.base_url))
        .await
        .expect("GET /session")
        .text()
        .await
        .expect("token");

    for (part, size) in [(0usize, 1000usize), (1, 1000), (2, 500)] {
        let resp = client
            .post(format!(
                "{}/upload?session={token}&part={part}",
                server.base_url
            ))
            .body(vec![0u8; size])
            .send()
            .await
            .expect("POST /upload");
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.text().await.expect("body"), "ok");
    }

    let resp = client
        .post(format!("{}/merge?session={token}", server.base_url))
        .send()
        .await
        .expect("POST /merge");
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.expect("body"), "merge done");

    let file = server.hub.sole_file().expect("one output file");
    assert_eq!(file.len(), 2500, "file size equals sum of chunk sizes");
    assert_eq!(server.hub.close_count(), 1);

    // The token is gone: a second merge and further uploads both 404.
    let resp = client
        .post(format!("{}/merge?session={token}", server.base_url))
        .send()
        .await
        .expect("second merge");
    assert_eq!(resp.status(), 404);

    let resp = client
        .post(format!("{}/upload?session={token}&part=3", server.base_url))
        .body(vec![0u8; 10])
        .send()
        .await
        .expect("upload after merge");
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn every_response_carries_wildcard_cors_header() {
    let server = spawn_server().await;

    let resp = reqwest::get(format!("{}/session", server.base_url))
        .await
        .expect("GET /session");
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );

    let resp = reqwest::get(format!("{}/no-such-path", server.base_url))
        .await
        .expect("GET unknown path");
    assert_eq!(resp.status(), 404);
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

#[tokio::test]
async fn options_preflight_is_200_on_any_path() {
    let server = spawn_server().await;
    let client = reqwest::Client::new();

    for path in ["/upload", "/merge", "/anything-at-all"] {
        let resp = client
            .request(
                reqwest::Method::OPTIONS,
                format!("{}{path}", server.base_url),
            )
            .send()
            .await
            .expect("OPTIONS");
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers()
                .get("access-control-allow-methods")
                .and_then(|v| v.to_str().ok()),
            Some("GET, POST, OPTIONS")
        );
        assert!(resp.text().await.expect("body").is_empty());
    }

    // Preflights change no state.
    assert!(server.state.registry.is_empty());
}

#[tokio::test]
async fn unknown_route_is_404() {
    let server = spawn_server().await;

    let resp = reqwest::get(format!("{}/definitely-not-real", server.base_url))
        .await
        .expect("GET");
    assert_eq!(resp.status(), 404);
}
