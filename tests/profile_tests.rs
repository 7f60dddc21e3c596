// tests/profile_tests.rs

use std::sync::Arc;

use ielts_mock::{
    config::Config,
    exam::{catalog::StaticQuestionSource, registry::SessionRegistry},
    routes,
    state::AppState,
    storage::MemoryStorage,
};

async fn spawn_app() -> String {
    let config = Config {
        database_url: String::new(),
        jwt_secret: "profile_test_secret".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        cors_origins: Vec::new(),
        question_bank_path: None,
        session_retention_secs: 60,
    };

    let state = AppState {
        storage: Arc::new(MemoryStorage::new()),
        config,
        questions: Arc::new(StaticQuestionSource::builtin()),
        sessions: SessionRegistry::new(),
    };
    let app = routes::create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

async fn register_and_login(
    client: &reqwest::Client,
    address: &str,
    full_name: Option<&str>,
) -> String {
    let email = format!("p_{}@example.com", &uuid::Uuid::new_v4().to_string()[..8]);
    let password = "password123";

    let response = client
        .post(&format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "email": email,
            "password": password,
            "full_name": full_name
        }))
        .send()
        .await
        .expect("Register failed");
    assert_eq!(response.status().as_u16(), 201);

    let login: serde_json::Value = client
        .post(&format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Login failed")
        .json()
        .await
        .expect("Failed to parse login json");

    login["token"].as_str().expect("Token not found").to_string()
}

#[tokio::test]
async fn test_profile_flow() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &address, Some("Aziza Karimova")).await;

    // 1. Profile created at registration with defaults
    let profile: serde_json::Value = client
        .get(&format!("{}/api/profile/me", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(profile["full_name"], "Aziza Karimova");
    assert_eq!(profile["preferred_language"], "en");
    assert_eq!(profile["free_tests_used"], 0);
    assert_eq!(profile["subscription_status"], "free");

    // 2. Update: markup is stripped, language switched
    let response = client
        .put(&format!("{}/api/profile/me", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "full_name": "<b>Aziza</b><script>alert(1)</script>",
            "preferred_language": "uz"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let updated: serde_json::Value = response.json().await.unwrap();
    assert_eq!(updated["full_name"], "Aziza");
    assert_eq!(updated["preferred_language"], "uz");

    // 3. Unsupported language is rejected and nothing changes
    let response = client
        .put(&format!("{}/api/profile/me", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "preferred_language": "fr" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let profile: serde_json::Value = client
        .get(&format!("{}/api/profile/me", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(profile["preferred_language"], "uz");
}

#[tokio::test]
async fn test_profile_name_too_long() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &address, None).await;

    let response = client
        .put(&format!("{}/api/profile/me", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "full_name": "a".repeat(101) }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn test_empty_history_dashboard() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &address, None).await;

    let results: Vec<serde_json::Value> = client
        .get(&format!("{}/api/results", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(results.is_empty());

    let dashboard: serde_json::Value = client
        .get(&format!("{}/api/dashboard", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(dashboard["total_tests"], 0);
    assert_eq!(dashboard["average_score"].as_f64(), Some(0.0));
}
