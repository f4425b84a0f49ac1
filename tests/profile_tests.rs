// tests/profile_tests.rs

use serde_json::Value;
use skill_assessment::{
    config::Config,
    models::skill::{CreateSkillRequest, Difficulty},
    routes,
    state::AppState,
    store::{Store, memory::MemoryStore},
};
use std::sync::Arc;

async fn spawn_app() -> (String, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());

    let config = Config {
        database_url: String::new(),
        jwt_secret: "profile_test_secret".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        port: 0,
        admin_email: None,
        admin_password: None,
    };

    let state = AppState {
        store: store.clone(),
        config,
    };
    let app = routes::create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (address, store)
}

/// Registers a user and returns (email, token).
async fn register_and_login(address: &str, client: &reqwest::Client) -> (String, String) {
    let email = format!("p_{}@example.com", &uuid::Uuid::new_v4().to_string()[..8]);
    let password = "password123";

    client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({"name": "Profile User", "email": email, "password": password}))
        .send()
        .await
        .unwrap();

    let login = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({"email": email, "password": password}))
        .send()
        .await
        .unwrap()
        .json::<Value>()
        .await
        .unwrap();

    (email, login["token"].as_str().unwrap().to_string())
}

async fn seed_skill(store: &MemoryStore, name: &str) -> i64 {
    store
        .create_skill(CreateSkillRequest {
            name: name.to_string(),
            category: "Technical Skills".to_string(),
            description: format!("{} description", name),
            difficulty: Difficulty::Beginner,
        })
        .await
        .unwrap()
        .id
}

async fn put_profile(address: &str, client: &reqwest::Client, token: &str, body: Value) -> reqwest::Response {
    client
        .put(format!("{}/api/profile", address))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_profile_complex_flow() {
    // Arrange
    let (address, store) = spawn_app().await;
    let client = reqwest::Client::new();
    let (email, token) = register_and_login(&address, &client).await;
    let rust = seed_skill(&store, "Rust").await;
    let sql = seed_skill(&store, "SQL").await;

    // 1. Fresh profile
    let me = client
        .get(format!("{}/api/profile", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json::<Value>()
        .await
        .unwrap();
    assert_eq!(me["email"], email);
    assert_eq!(me["name"], "Profile User");
    assert_eq!(me["skills"], serde_json::json!([]));
    assert!(me.get("password").is_none());

    // 2. Partial update: bio is sanitized, skills replaced
    let response = put_profile(
        &address,
        &client,
        &token,
        serde_json::json!({
            "bio": "<b>Backend</b> developer<script>alert(1)</script>",
            "skill_ids": [sql, rust]
        }),
    )
    .await;
    assert_eq!(response.status().as_u16(), 200);
    let me: Value = response.json().await.unwrap();
    assert_eq!(me["bio"], "<b>Backend</b> developer");
    assert_eq!(me["skills"], serde_json::json!(["Rust", "SQL"]));
    // Untouched fields survive
    assert_eq!(me["name"], "Profile User");

    // 3. Replacing the skill set drops the old entries
    let me: Value = put_profile(
        &address,
        &client,
        &token,
        serde_json::json!({ "name": "Renamed", "skill_ids": [rust] }),
    )
    .await
    .json()
    .await
    .unwrap();
    assert_eq!(me["name"], "Renamed");
    assert_eq!(me["skills"], serde_json::json!(["Rust"]));
    assert_eq!(me["bio"], "<b>Backend</b> developer");

    // 4. An empty patch changes nothing
    let me: Value = put_profile(&address, &client, &token, serde_json::json!({}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(me["name"], "Renamed");
}

#[tokio::test]
async fn test_profile_rejects_invalid_updates() {
    let (address, store) = spawn_app().await;
    let client = reqwest::Client::new();
    let (_, token_a) = register_and_login(&address, &client).await;
    let (email_b, _) = register_and_login(&address, &client).await;
    let rust = seed_skill(&store, "Rust").await;

    // Invalid email
    let response = put_profile(&address, &client, &token_a, serde_json::json!({"email": "nope"})).await;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid email format");

    // Email owned by someone else
    let response = put_profile(&address, &client, &token_a, serde_json::json!({"email": email_b})).await;
    assert_eq!(response.status().as_u16(), 409);

    // Blank name
    let response = put_profile(&address, &client, &token_a, serde_json::json!({"name": "  "})).await;
    assert_eq!(response.status().as_u16(), 400);

    // Bad picture URL
    let response = put_profile(
        &address,
        &client,
        &token_a,
        serde_json::json!({"profile_picture": "not a url"}),
    )
    .await;
    assert_eq!(response.status().as_u16(), 400);

    // Unknown skill id: nothing is applied
    let response = put_profile(
        &address,
        &client,
        &token_a,
        serde_json::json!({"name": "Should not stick", "skill_ids": [rust, 9999]}),
    )
    .await;
    assert_eq!(response.status().as_u16(), 404);

    let me = client
        .get(format!("{}/api/profile", address))
        .bearer_auth(&token_a)
        .send()
        .await
        .unwrap()
        .json::<Value>()
        .await
        .unwrap();
    assert_eq!(me["name"], "Profile User");
    assert_eq!(me["skills"], serde_json::json!([]));
}

#[tokio::test]
async fn test_profile_requires_auth() {
    let (address, _) = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/profile", address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 401);
}
