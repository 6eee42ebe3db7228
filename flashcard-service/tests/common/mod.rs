//! Shared setup for flashcard-service integration tests.
//!
//! Each test spawns the app on a random port against a throwaway MongoDB
//! database, with a mock AI provider. Tests are skipped when
//! `SKIP_MONGO_TESTS` is set or nothing listens on localhost:27017.

#![allow(dead_code)]

use flashcard_service::config::FlashcardConfig;
use flashcard_service::services::providers::{MockTextProvider, TextProvider};
use flashcard_service::services::metrics::init_metrics;
use flashcard_service::services::MongoDb;
use flashcard_service::startup::Application;
use serde_json::{json, Value};
use std::sync::{Arc, Once};
use std::time::Duration;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "password123";

static METRICS: Once = Once::new();

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub db: MongoDb,
    pub db_name: String,
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub token: String,
    /// Client holding the session cookie.
    pub client: reqwest::Client,
}

async fn mongo_available() -> bool {
    if std::env::var("SKIP_MONGO_TESTS").is_ok() {
        eprintln!("Skipping test: SKIP_MONGO_TESTS is set");
        return false;
    }

    let reachable = tokio::time::timeout(
        Duration::from_millis(500),
        tokio::net::TcpStream::connect("127.0.0.1:27017"),
    )
    .await
    .map(|r| r.is_ok())
    .unwrap_or(false);

    if !reachable {
        eprintln!("Skipping test: MongoDB is not reachable on localhost:27017");
    }
    reachable
}

pub fn test_config() -> FlashcardConfig {
    std::env::set_var("ENVIRONMENT", "test");
    std::env::set_var("GENAI_PROVIDER", "mock");
    std::env::set_var("MONGODB_URI", "mongodb://localhost:27017");

    let mut config = FlashcardConfig::load().expect("Failed to load configuration");
    config.common.port = 0; // Random port for testing
    config.mongodb.database = format!("flashcards_test_{}", Uuid::new_v4().simple());
    config.rate_limit.auth_attempts = 1000;
    config.rate_limit.global_ip_limit = 10_000;
    config
}

impl TestApp {
    /// App with the default mock provider, whose replies are never valid JSON.
    pub async fn spawn() -> Option<Self> {
        Self::spawn_with_provider(Arc::new(MockTextProvider::new(true))).await
    }

    /// App whose AI provider always answers with `response`.
    pub async fn spawn_with_response(response: &str) -> Option<Self> {
        Self::spawn_with_provider(Arc::new(MockTextProvider::with_response(response))).await
    }

    pub async fn spawn_with_provider(provider: Arc<dyn TextProvider>) -> Option<Self> {
        Self::spawn_with_config(test_config(), provider).await
    }

    pub async fn spawn_with_config(
        config: FlashcardConfig,
        provider: Arc<dyn TextProvider>,
    ) -> Option<Self> {
        if !mongo_available().await {
            return None;
        }

        // The recorder is process-global, like in main.
        METRICS.call_once(|| {
            init_metrics().expect("Failed to install metrics recorder");
        });

        let db_name = config.mongodb.database.clone();
        let app = Application::build_with_provider(config, provider)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let db = app.db().clone();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to accept requests
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        Some(TestApp {
            address,
            port,
            db,
            db_name,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub fn cookie_client() -> reqwest::Client {
        reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to build HTTP client")
    }

    /// Sign up a fresh user and return a client carrying its session cookie.
    pub async fn signup(&self, name: &str) -> TestUser {
        let client = Self::cookie_client();
        let email = format!("{}-{}@example.com", name.to_lowercase(), Uuid::new_v4().simple());

        let response = client
            .post(self.url("/auth/signup"))
            .json(&json!({ "name": name, "email": email, "password": TEST_PASSWORD }))
            .send()
            .await
            .expect("Failed to execute signup request");
        assert_eq!(response.status().as_u16(), 201, "signup failed");

        let body: Value = response.json().await.expect("Failed to parse signup body");
        TestUser {
            id: body["user"]["id"].as_str().unwrap().to_string(),
            email,
            token: body["token"].as_str().unwrap().to_string(),
            client,
        }
    }

    /// Create a deck with the given question/answer pairs and return its JSON.
    pub async fn create_deck(&self, user: &TestUser, name: &str, cards: &[(&str, &str)]) -> Value {
        let cards: Vec<Value> = cards
            .iter()
            .map(|(q, a)| json!({ "question": q, "answer": a }))
            .collect();

        let response = user
            .client
            .post(self.url("/decks"))
            .json(&json!({ "name": name, "description": "test deck", "tags": ["test"], "cards": cards }))
            .send()
            .await
            .expect("Failed to execute create deck request");
        assert_eq!(response.status().as_u16(), 201, "deck creation failed");

        response.json().await.expect("Failed to parse deck body")
    }

    pub async fn cleanup(&self) {
        let _ = self.db.client().database(&self.db_name).drop(None).await;
    }
}
