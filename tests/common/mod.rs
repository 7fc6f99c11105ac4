//! Common test utilities for E2E tests

#![allow(dead_code)]

use chirp::{AppState, config};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            database: config::DatabaseConfig { path: db_path },
            thread: config::ThreadConfig { max_depth: 1000 },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        let state = AppState::new(config).await.unwrap();

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        let app = chirp::build_router(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait a bit for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            addr: addr_str,
            state,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Register a user directly in the database
    pub async fn create_user(&self, username: &str, password: &str) -> chirp::data::User {
        let hashed = chirp::auth::hash_password(password).unwrap();
        self.state
            .db
            .insert_user(&chirp::data::NewUser {
                username: username.to_string(),
                password_hash: hashed.hash,
                password_salt: hashed.salt,
            })
            .await
            .unwrap()
    }

    /// POST a tweet and return its JSON body
    pub async fn post_tweet(&self, username: &str, password: &str, content: &str) -> Value {
        let response = self
            .client
            .post(self.url("/tweets"))
            .json(&json!({
                "content": content,
                "credentials": credentials(username, password),
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
        response.json().await.unwrap()
    }

    /// POST a reply and return its JSON body
    pub async fn post_reply(
        &self,
        parent_id: i64,
        username: &str,
        password: &str,
        content: &str,
    ) -> Value {
        let response = self
            .client
            .post(self.url(&format!("/tweets/{}/reply", parent_id)))
            .json(&json!({
                "content": content,
                "credentials": credentials(username, password),
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
        response.json().await.unwrap()
    }
}

/// Credentials body as clients send it
pub fn credentials(username: &str, password: &str) -> Value {
    json!({ "username": username, "password": password })
}

/// Tweet ids of a JSON array of tweets, in response order
pub fn ids(tweets: &Value) -> Vec<i64> {
    tweets
        .as_array()
        .unwrap()
        .iter()
        .map(|tweet| tweet["id"].as_i64().unwrap())
        .collect()
}
