// tests/api_tests.rs

use std::sync::Arc;

use ielts_mock::{
    config::Config,
    exam::{catalog::StaticQuestionSource, registry::SessionRegistry},
    routes,
    state::AppState,
    storage::MemoryStorage,
};

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app() -> String {
    let config = Config {
        database_url: String::new(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        cors_origins: vec!["http://localhost:5173".to_string()],
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

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

fn unique_email() -> String {
    format!("u_{}@example.com", &uuid::Uuid::new_v4().to_string()[..8])
}

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(&format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn unknown_api_paths_are_404_not_401() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    for path in ["/api/unknown", "/api/exams/reading/unknown", "/api/sessions"] {
        let response = client
            .get(&format!("{}{}", address, path))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status().as_u16(), 404, "path: {}", path);
    }
}

#[tokio::test]
async fn register_works() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email();

    // Act
    let response = client
        .post(&format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "email": email,
            "password": "password123",
            "full_name": "Aziza Karimova"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["email"], email.as_str());
    assert!(body.get("password").is_none(), "Password hash must not leak");
}

#[tokio::test]
async fn register_duplicate_email_conflicts() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email();

    for expected in [201, 409] {
        let response = client
            .post(&format!("{}/api/auth/register", address))
            .json(&serde_json::json!({
                "email": email,
                "password": "password123"
            }))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status().as_u16(), expected);
    }
}

#[tokio::test]
async fn register_fails_validation() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let cases = [
        serde_json::json!({ "email": "not-an-email", "password": "password123" }),
        serde_json::json!({ "email": unique_email(), "password": "123" }),
    ];

    for payload in cases {
        // Act
        let response = client
            .post(&format!("{}/api/auth/register", address))
            .json(&payload)
            .send()
            .await
            .expect("Failed to execute request");

        // Assert
        assert_eq!(response.status().as_u16(), 400, "payload: {}", payload);
    }
}

#[tokio::test]
async fn login_returns_bearer_token() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email();

    client
        .post(&format!("{}/api/auth/register", address))
        .json(&serde_json::json!({ "email": email, "password": "password123" }))
        .send()
        .await
        .expect("Register failed");

    let response = client
        .post(&format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "email": email, "password": "password123" }))
        .send()
        .await
        .expect("Login failed");
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["type"], "Bearer");
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));

    // Wrong password
    let response = client
        .post(&format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "email": email, "password": "wrong-password" }))
        .send()
        .await
        .expect("Login failed");
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn exam_catalog_is_public() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(&format!("{}/api/exams", address))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);

    let exams: Vec<serde_json::Value> = response.json().await.unwrap();
    assert_eq!(exams.len(), 5);

    let reading = exams
        .iter()
        .find(|e| e["exam_type"] == "reading")
        .expect("reading missing from catalog");
    assert_eq!(reading["duration_minutes"], 60);
    assert_eq!(reading["available"], true);

    let full = exams.iter().find(|e| e["exam_type"] == "full").unwrap();
    assert_eq!(full["available"], false);
}

#[tokio::test]
async fn protected_routes_require_token() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let paths = [
        "/api/exams/eligibility",
        "/api/results",
        "/api/dashboard",
        "/api/profile/me",
    ];

    for path in paths {
        let response = client
            .get(&format!("{}{}", address, path))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 401, "path: {}", path);
    }

    let response = client
        .post(&format!("{}/api/exams/reading/sessions", address))
        .header("Authorization", "Bearer not-a-token")
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 401);
}
