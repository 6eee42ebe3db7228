mod common;

use common::{TestApp, TEST_PASSWORD};
use serde_json::{json, Value};

#[tokio::test]
async fn signup_returns_user_and_sets_cookie() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    let client = reqwest::Client::new();
    let response = client
        .post(app.url("/auth/signup"))
        .json(&json!({ "name": "Ada", "email": "Ada@Example.com", "password": TEST_PASSWORD }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 201);
    let cookie = response.headers()["set-cookie"].to_str().unwrap().to_string();
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Strict"));

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert_eq!(body["user"]["xp"], 0);
    assert_eq!(body["user"]["level"], 1);
    assert!(body["user"].get("password_hash").is_none());
    assert!(!body["token"].as_str().unwrap().is_empty());

    app.cleanup().await;
}

#[tokio::test]
async fn duplicate_signup_is_rejected() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let user = app.signup("Grace").await;

    let response = reqwest::Client::new()
        .post(app.url("/auth/signup"))
        .json(&json!({ "name": "Grace", "email": user.email.to_uppercase(), "password": TEST_PASSWORD }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "User already exists");

    app.cleanup().await;
}

#[tokio::test]
async fn signup_validates_input() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let client = reqwest::Client::new();

    for payload in [
        json!({ "name": "", "email": "a@example.com", "password": TEST_PASSWORD }),
        json!({ "name": "A", "email": "not-an-email", "password": TEST_PASSWORD }),
        json!({ "name": "A", "email": "a@example.com", "password": "short" }),
    ] {
        let response = client
            .post(app.url("/auth/signup"))
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400, "payload {}", payload);
    }

    app.cleanup().await;
}

#[tokio::test]
async fn login_checks_password() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let user = app.signup("Linus").await;
    let client = reqwest::Client::new();

    let wrong = client
        .post(app.url("/auth/login"))
        .json(&json!({ "email": user.email, "password": "wrong-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status().as_u16(), 401);
    let body: Value = wrong.json().await.unwrap();
    assert_eq!(body["error"], "Invalid email or password");

    let unknown = client
        .post(app.url("/auth/login"))
        .json(&json!({ "email": "nobody@example.com", "password": TEST_PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status().as_u16(), 401);

    let ok = client
        .post(app.url("/auth/login"))
        .json(&json!({ "email": user.email, "password": TEST_PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(ok.status().as_u16(), 200);
    assert!(ok.headers().get("set-cookie").is_some());
    let body: Value = ok.json().await.unwrap();
    assert_eq!(body["user"]["id"], user.id.as_str());

    app.cleanup().await;
}

#[tokio::test]
async fn me_accepts_cookie_or_bearer() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let user = app.signup("Barbara").await;

    let via_cookie: Value = user
        .client
        .get(app.url("/auth/me"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(via_cookie["id"], user.id.as_str());
    assert_eq!(via_cookie["badges"], json!([]));

    let via_bearer = reqwest::Client::new()
        .get(app.url("/auth/me"))
        .bearer_auth(&user.token)
        .send()
        .await
        .unwrap();
    assert_eq!(via_bearer.status().as_u16(), 200);

    let anonymous = reqwest::Client::new()
        .get(app.url("/auth/me"))
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status().as_u16(), 401);

    let forged = reqwest::Client::new()
        .get(app.url("/auth/me"))
        .bearer_auth("not.a.jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(forged.status().as_u16(), 401);

    app.cleanup().await;
}

#[tokio::test]
async fn logout_clears_session_cookie() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let user = app.signup("Ken").await;

    let response = user.client.post(app.url("/auth/logout")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let cookie = response.headers()["set-cookie"].to_str().unwrap().to_string();
    assert!(cookie.contains("Max-Age=0"));

    let me = user.client.get(app.url("/auth/me")).send().await.unwrap();
    assert_eq!(me.status().as_u16(), 401);

    app.cleanup().await;
}

#[tokio::test]
async fn profile_update_changes_name_and_avatar() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let user = app.signup("Margaret").await;

    let response = user
        .client
        .patch(app.url("/users/me"))
        .json(&json!({ "name": "Margaret H.", "avatar": "https://example.com/m.png" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["name"], "Margaret H.");
    assert_eq!(body["avatar"], "https://example.com/m.png");

    let bad = user
        .client
        .patch(app.url("/users/me"))
        .json(&json!({ "avatar": "not a url" }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status().as_u16(), 400);

    app.cleanup().await;
}

#[tokio::test]
async fn auth_routes_are_rate_limited() {
    let mut config = common::test_config();
    config.rate_limit.auth_attempts = 2;
    let Some(app) = TestApp::spawn_with_config(
        config,
        std::sync::Arc::new(flashcard_service::services::providers::MockTextProvider::new(true)),
    )
    .await
    else {
        return;
    };

    let client = reqwest::Client::new();
    let mut statuses = Vec::new();
    for _ in 0..3 {
        let response = client
            .post(app.url("/auth/login"))
            .json(&json!({ "email": "x@example.com", "password": TEST_PASSWORD }))
            .send()
            .await
            .unwrap();
        statuses.push(response.status().as_u16());
    }

    assert_eq!(statuses, vec![401, 401, 429]);

    app.cleanup().await;
}
