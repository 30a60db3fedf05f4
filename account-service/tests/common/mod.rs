use std::sync::Arc;
use std::sync::Mutex;

use account_service::domain::user::models::EmailAddress;
use account_service::domain::user::ports::PasswordResetMailer;
use account_service::domain::user::service::UserService;
use account_service::inbound::http::router::create_router;
use account_service::outbound::repositories::InMemoryUserRepository;
use account_service::user::errors::MailerError;
use async_trait::async_trait;
use auth::AuthSettings;
use auth::Authenticator;
use auth::HashingSettings;
use auth::TokenCodec;
use serde_json::json;
use serde_json::Value;

pub const TEST_SECRET: &str = "test-secret-key-for-jwt-signing-at-least-32-bytes";

/// Mailer that keeps every reset token it is asked to deliver
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
    /// Tokens sent to `recipient`, oldest first
    pub fn tokens_for(&self, recipient: &str) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(to, _)| to == recipient)
            .map(|(_, token)| token.clone())
            .collect()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl PasswordResetMailer for RecordingMailer {
    async fn send_password_reset(
        &self,
        recipient: &EmailAddress,
        token: &str,
    ) -> Result<(), MailerError> {
        self.sent
            .lock()
            .unwrap()
            .push((recipient.as_str().to_string(), token.to_string()));
        Ok(())
    }
}

/// Test application that spawns a real server
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub api_client: reqwest::Client,
    pub authenticator: Arc<Authenticator>,
    /// Verifier sharing the server's signing key
    pub codec: TokenCodec,
    pub repository: Arc<InMemoryUserRepository>,
    pub mailer: Arc<RecordingMailer>,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let mut settings = AuthSettings::new(TEST_SECRET);
        settings.hashing = HashingSettings {
            memory_cost_kib: 1024,
            iterations: 1,
            parallelism: 1,
        };
        let authenticator =
            Arc::new(Authenticator::from_settings(&settings).expect("Invalid test settings"));
        let codec = TokenCodec::from_settings(&settings).expect("Invalid test settings");

        let repository = Arc::new(InMemoryUserRepository::new());
        let mailer = Arc::new(RecordingMailer::default());
        let user_service = Arc::new(UserService::new(
            Arc::clone(&repository),
            Arc::clone(&mailer),
            Arc::clone(&authenticator),
        ));

        let router = create_router(user_service, Arc::clone(&authenticator));

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            port,
            api_client: reqwest::Client::builder()
                .build()
                .expect("Failed to create reqwest client"),
            authenticator,
            codec,
            repository,
            mailer,
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    /// Helper to make PUT request
    pub fn put(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.put(format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Helper to make PUT request with Bearer token
    pub fn put_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.put(path).bearer_auth(token)
    }

    /// Helper to make DELETE request with Bearer token
    pub fn delete_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.api_client
            .delete(format!("{}{}", self.address, path))
            .bearer_auth(token)
    }

    /// Register an account and return the response body
    pub async fn register(&self, email: &str, password: &str) -> Value {
        let response = self
            .post("/users/register")
            .json(&json!({
                "email": email,
                "password": password
            }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);

        response.json().await.expect("Failed to parse response")
    }

    /// Log in and return the raw response
    pub async fn login(&self, email: &str, password: &str, remember_me: bool) -> reqwest::Response {
        self.post("/users/token")
            .json(&json!({
                "email": email,
                "password": password,
                "remember_me": remember_me
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Log in and return the access token
    pub async fn access_token(&self, email: &str, password: &str, remember_me: bool) -> String {
        let response = self.login(email, password, remember_me).await;
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        let body: Value = response.json().await.expect("Failed to parse response");
        body["data"]["access_token"]
            .as_str()
            .expect("Missing access token")
            .to_string()
    }
}
