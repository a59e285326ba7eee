#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use pickup::config::Config;
use pickup::db::MemoryDatabase;
use pickup::email::{Mailer, OutgoingEmail};
use pickup::routes::{app, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

/// Keeps every delivered email for inspection.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, address: &str) -> Vec<OutgoingEmail> {
        self.sent()
            .into_iter()
            .filter(|email| email.to_address == address)
            .collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn deliver(&self, email: OutgoingEmail) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub db: Arc<MemoryDatabase>,
    pub mailer: Arc<RecordingMailer>,
}

/// A registered, verified user.
pub struct TestUser {
    pub id: String,
    pub email: String,
    pub token: String,
}

impl TestApp {
    pub fn new() -> Self {
        let db = Arc::new(MemoryDatabase::seeded());
        let mailer = Arc::new(RecordingMailer::default());
        let config = Config {
            password_cost: 4,
            ..Config::default()
        };
        let router = app(AppState::new(db.clone(), mailer.clone(), config));

        Self { router, db, mailer }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None, None).await
    }

    pub async fn register(&self, email: &str, first_name: &str) -> (StatusCode, Value) {
        self.request(
            Method::POST,
            "/register",
            None,
            Some(json!({
                "email": email,
                "password": "password123",
                "firstName": first_name,
                "lastName": "Tester",
            })),
        )
        .await
    }

    /// The path of the verification link in the latest welcome email to
    /// `address`.
    pub fn verify_path(&self, address: &str) -> String {
        let welcome = self
            .mailer
            .sent_to(address)
            .into_iter()
            .rev()
            .find(|email| email.subject.starts_with("Welcome"))
            .unwrap();
        let start = welcome.html.find("/verifyEmail/").unwrap();
        let link = &welcome.html[start..];

        link[..link.find('"').unwrap()].to_owned()
    }

    /// Registers and verifies a new user.
    pub async fn user(&self, email: &str, first_name: &str) -> TestUser {
        let (status, body) = self.register(email, first_name).await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);

        let id = body["user"]["id"].as_str().unwrap().to_owned();
        let (status, _) = self
            .request(Method::POST, &self.verify_path(email), None, None)
            .await;
        assert_eq!(status, StatusCode::OK);

        TestUser {
            id,
            email: email.to_owned(),
            token: body["token"].as_str().unwrap().to_owned(),
        }
    }

    /// Creates an event hosted by `host`, returning its id.
    pub async fn event(&self, host: &TestUser, max_players: i64) -> String {
        let (status, body) = self
            .request(
                Method::POST,
                "/event",
                Some(&host.token),
                Some(event_body(max_players)),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);

        body["event"]["id"].as_str().unwrap().to_owned()
    }
}

pub fn event_body(max_players: i64) -> Value {
    json!({
        "title": "Pickup Basketball",
        "description": "Full court runs, next team up.",
        "date": "2099-09-12T18:30:00Z",
        "sport": "Basketball",
        "skillLevel": "Beginner",
        "location": "CRC Courts",
        "coed": true,
        "maxPlayers": max_players,
    })
}

pub fn error(body: &Value) -> &str {
    body["error"].as_str().unwrap_or_default()
}
