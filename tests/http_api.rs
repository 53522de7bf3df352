mod common;

use std::sync::Arc;

use poem::http::StatusCode;
use poem::test::TestClient;
use poem_blog_api::auth::JwtKeys;
use poem_blog_api::{AppState, build_app};
use serde_json::json;

fn register_body(username: &str) -> serde_json::Value {
    json!({
        "username": username,
        "email": format!("{username}@example.com"),
        "password": "password123",
        "first_name": "Test",
        "last_name": "User",
        "state": "Sofia",
    })
}

#[tokio::test]
async fn register_login_post_and_list() {
    let env = common::setup().await;
    let state = Arc::new(AppState::new(env.db.clone(), JwtKeys::new("http-secret", 3600)));
    let cli = TestClient::new(build_app(state));

    let resp = cli
        .post("/api/auth/register")
        .body_json(&register_body("founder"))
        .send()
        .await;
    resp.assert_status_is_ok();
    let json = resp.json().await;
    json.value().object().get("user").object().get("username").assert_string("founder");
    let register_token = json.value().object().get("token").string().to_string();

    // the token handed out at sign-up is usable right away
    cli.get("/api/notifications/count")
        .header("Authorization", format!("Bearer {register_token}"))
        .send()
        .await
        .assert_status_is_ok();

    let resp = cli
        .post("/api/auth/login")
        .body_json(&json!({ "username": "founder", "password": "password123" }))
        .send()
        .await;
    resp.assert_status_is_ok();
    let token = resp
        .json()
        .await
        .value()
        .object()
        .get("token")
        .string()
        .to_string();

    let resp = cli
        .post("/api/posts")
        .header("Authorization", format!("Bearer {token}"))
        .body_json(&json!({
            "title": "Over the wire",
            "content": "<p>Posted through HTTP</p>",
            "category_name": "General",
            "tag_names": ["web"],
        }))
        .send()
        .await;
    resp.assert_status_is_ok();
    let created = resp.json().await;
    created.value().object().get("short_content").assert_string("Posted through HTTP");
    let id = created.value().object().get("id").i64();

    let resp = cli.get("/api/posts").send().await;
    resp.assert_status_is_ok();
    resp.json().await.value().array().assert_len(1);

    let resp = cli.get(format!("/api/posts/{id}")).send().await;
    resp.assert_status_is_ok();
    let details = resp.json().await;
    details.value().object().get("tags").array().assert_len(1);
    details.value().object().get("is_liked").assert_bool(false);

    let resp = cli
        .post(format!("/api/posts/{id}/like"))
        .header("Authorization", format!("Bearer {token}"))
        .send()
        .await;
    resp.assert_status_is_ok();
    resp.json().await.value().object().get("likes").assert_i64(1);
}

#[tokio::test]
async fn errors_map_to_statuses() {
    let env = common::setup().await;
    let state = Arc::new(AppState::new(env.db.clone(), JwtKeys::new("http-secret", 3600)));
    let cli = TestClient::new(build_app(state));

    let resp = cli.get("/api/posts/999").send().await;
    resp.assert_status(StatusCode::NOT_FOUND);

    let resp = cli
        .post("/api/auth/login")
        .body_json(&json!({ "username": "ghost", "password": "password123" }))
        .send()
        .await;
    resp.assert_status(StatusCode::UNAUTHORIZED);

    cli.post("/api/auth/register")
        .body_json(&register_body("taken"))
        .send()
        .await
        .assert_status_is_ok();
    cli.post("/api/auth/register")
        .body_json(&register_body("taken"))
        .send()
        .await
        .assert_status(StatusCode::CONFLICT);

    let resp = cli
        .get("/api/posts")
        .header("Authorization", "Bearer not-a-token")
        .send()
        .await;
    resp.assert_status(StatusCode::UNAUTHORIZED);

    let resp = cli.get("/api/notifications").send().await;
    resp.assert_status(StatusCode::UNAUTHORIZED);
}
