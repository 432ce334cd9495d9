//! Integration tests for the CSRF token lifecycle at the HTTP boundary.

use std::time::Duration;

use serde_json::json;

mod common;

#[tokio::test]
async fn token_rotates_on_every_verified_mutation() {
    let config = common::test_config("127.0.0.1:28495");
    let shutdown = common::start_guard(config).await;
    let client = common::client();

    // bootstrap
    let res = client
        .get("http://127.0.0.1:28495/csrf/token")
        .send()
        .await
        .expect("guard unreachable");
    assert_eq!(res.status(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    let first = body["token"].as_str().unwrap().to_string();

    // verified mutation returns a rotated token
    let res = client
        .post("http://127.0.0.1:28495/api/echo")
        .header("x-csrf-token", &first)
        .json(&json!({ "ping": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let rotated = res.headers()["x-csrf-token"]
        .to_str()
        .unwrap()
        .to_string();
    assert_ne!(rotated, first);

    // replaying the consumed token fails
    let res = client
        .post("http://127.0.0.1:28495/api/echo")
        .header("x-csrf-token", &first)
        .json(&json!({ "ping": 2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "csrf_invalid");

    // the rotated token works
    let res = client
        .post("http://127.0.0.1:28495/api/echo")
        .header("x-csrf-token", &rotated)
        .json(&json!({ "ping": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    shutdown.trigger();
}

#[tokio::test]
async fn mutation_without_token_is_rejected() {
    let config = common::test_config("127.0.0.1:28496");
    let shutdown = common::start_guard(config).await;
    let client = common::client();

    let res = client
        .post("http://127.0.0.1:28496/api/echo")
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "csrf_missing");

    shutdown.trigger();
}

#[tokio::test]
async fn safe_methods_and_exempt_paths_bypass_verification() {
    let config = common::test_config("127.0.0.1:28497");
    let shutdown = common::start_guard(config).await;
    let client = common::client();

    let res = client
        .get("http://127.0.0.1:28497/health")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    // login predates having a session; no token required
    let res = client
        .post("http://127.0.0.1:28497/auth/login")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    shutdown.trigger();
}

#[tokio::test]
async fn expired_token_is_rejected_then_absent() {
    let mut config = common::test_config("127.0.0.1:28498");
    config.csrf.ttl_secs = 1;
    let shutdown = common::start_guard(config).await;
    let client = common::client();

    let res = client
        .get("http://127.0.0.1:28498/csrf/token")
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    let token = body["token"].as_str().unwrap().to_string();

    tokio::time::sleep(Duration::from_millis(1200)).await;

    let res = client
        .post("http://127.0.0.1:28498/api/echo")
        .header("x-csrf-token", &token)
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "csrf_expired");

    // the expiry check purged the record, so the same token now reads as
    // never issued
    let res = client
        .post("http://127.0.0.1:28498/api/echo")
        .header("x-csrf-token", &token)
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "csrf_invalid");

    shutdown.trigger();
}
