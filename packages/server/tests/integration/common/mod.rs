use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ::common::Role;
use ::common::storage::FilesystemUploadStore;
use reqwest::{Client, Method};
use sea_orm::{
    ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait, Set,
};
use serde_json::{Value, json};
use tempfile::TempDir;

use server::config::{
    AppConfig, AuthConfig, CorsConfig, DatabaseConfig, PaymentConfig, ServerConfig, UploadConfig,
};
use server::entity::user;
use server::services::payment::{PaymentError, PaymentGateway, PaymentInit, PaymentRequest};
use server::state::AppState;

pub const PASSWORD: &str = "correct-horse-battery";

pub mod routes {
    pub const SIGNUP: &str = "/api/v1/users/signup";
    pub const LOGIN: &str = "/api/v1/users/login";
    pub const ME: &str = "/api/v1/users/me";
    pub const USERS: &str = "/api/v1/users";
    pub const EVENTS: &str = "/api/v1/events";
    pub const GUESTS: &str = "/api/v1/guests";
    pub const CALENDARS: &str = "/api/v1/calendars";
    pub const OPPORTUNITIES: &str = "/api/v1/opportunities";
    pub const OPPORTUNITY_CATEGORIES: &str = "/api/v1/opportunity-categories";
    pub const NEWS: &str = "/api/v1/news";
    pub const CATEGORIES: &str = "/api/v1/categories";
    pub const REGISTRATIONS: &str = "/api/v1/registrations";
    pub const PAYMENTS: &str = "/api/v1/payments";
    pub const NOTIFICATIONS: &str = "/api/v1/notifications";
    pub const DASHBOARD: &str = "/api/v1/dashboard/stats";

    pub fn user(id: i32) -> String {
        format!("/api/v1/users/{id}")
    }

    pub fn event(id: i32) -> String {
        format!("/api/v1/events/{id}")
    }

    pub fn event_guests(id: i32) -> String {
        format!("/api/v1/events/{id}/guests")
    }

    pub fn guest(id: i32) -> String {
        format!("/api/v1/guests/{id}")
    }

    pub fn opportunity(id: i32) -> String {
        format!("/api/v1/opportunities/{id}")
    }

    pub fn apply(opportunity_id: i32) -> String {
        format!("/api/v1/opportunities/{opportunity_id}/apply")
    }

    pub fn applicants(opportunity_id: i32) -> String {
        format!("/api/v1/opportunities/{opportunity_id}/applicants")
    }

    pub fn applicant(id: i32) -> String {
        format!("/api/v1/applicants/{id}")
    }

    pub fn applicant_status(id: i32) -> String {
        format!("/api/v1/applicants/{id}/status")
    }

    pub fn news(id: i32) -> String {
        format!("/api/v1/news/{id}")
    }

    pub fn category(id: i32) -> String {
        format!("/api/v1/categories/{id}")
    }

    pub fn opportunity_category(id: i32) -> String {
        format!("/api/v1/opportunity-categories/{id}")
    }

    pub fn registration(id: i32) -> String {
        format!("/api/v1/registrations/{id}")
    }

    pub fn notification(id: i32) -> String {
        format!("/api/v1/notifications/{id}")
    }
}

/// Gateway double that accepts every transaction and records what it was asked.
#[derive(Default)]
pub struct StubGateway {
    pub requests: Mutex<Vec<PaymentRequest>>,
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn initialize(&self, request: PaymentRequest) -> Result<PaymentInit, PaymentError> {
        let init = PaymentInit {
            reference: request.tx_ref.clone(),
            checkout_url: Some(format!("https://checkout.test/{}", request.tx_ref)),
        };
        self.requests
            .lock()
            .expect("gateway mutex poisoned")
            .push(request);
        Ok(init)
    }
}

/// A running test server backed by an in-memory SQLite database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
    pub gateway: Arc<StubGateway>,
    uploads: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

/// A signed-up user and their token.
pub struct TestUser {
    pub id: i32,
    pub token: String,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let mut opts = ConnectOptions::new("sqlite::memory:");
        // One connection keeps every query on the same in-memory database.
        opts.max_connections(1).min_connections(1).sqlx_logging(false);
        let db = Database::connect(opts)
            .await
            .expect("Failed to open in-memory database");
        server::database::sync_schema(&db)
            .await
            .expect("Failed to create schema");

        let uploads_dir = tempfile::tempdir().expect("Failed to create upload dir");
        let uploads = FilesystemUploadStore::new(uploads_dir.path().to_path_buf(), 1024 * 1024)
            .await
            .expect("Failed to create upload store");

        let config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                max_connections: 1,
                min_connections: 1,
                connect_timeout_secs: 8,
                sqlx_logging: false,
            },
            auth: AuthConfig {
                jwt_secret: "test-secret-for-integration-tests".to_string(),
                token_ttl_hours: 1,
                trust_token_role: false,
            },
            uploads: UploadConfig {
                dir: uploads_dir.path().to_path_buf(),
                max_file_size: 1024 * 1024,
            },
            payment: PaymentConfig {
                enabled: true,
                base_url: "http://127.0.0.1:9".to_string(),
                secret_key: "test".to_string(),
                currency: "ETB".to_string(),
                callback_url: None,
                return_url: None,
            },
        };

        let gateway = Arc::new(StubGateway::default());
        let state = AppState {
            db: db.clone(),
            config: Arc::new(config),
            uploads: Arc::new(uploads),
            payments: gateway.clone(),
        };

        let app = server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            db,
            gateway,
            uploads: uploads_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut req = self.client.request(method, self.url(path));
        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        let res = req.send().await.expect("Failed to send request");
        TestResponse::from_response(res).await
    }

    pub async fn get(&self, path: &str, token: &str) -> TestResponse {
        self.send(Method::GET, path, None, Some(token)).await
    }

    pub async fn get_anonymous(&self, path: &str) -> TestResponse {
        self.send(Method::GET, path, None, None).await
    }

    pub async fn post(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        self.send(Method::POST, path, Some(body), Some(token)).await
    }

    pub async fn post_anonymous(&self, path: &str, body: &Value) -> TestResponse {
        self.send(Method::POST, path, Some(body), None).await
    }

    pub async fn patch(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        self.send(Method::PATCH, path, Some(body), Some(token)).await
    }

    pub async fn delete(&self, path: &str, token: &str) -> TestResponse {
        self.send(Method::DELETE, path, None, Some(token)).await
    }

    /// Multipart request with a `payload` JSON part plus `(field, file name, content type, bytes)` files.
    pub async fn multipart(
        &self,
        method: Method,
        path: &str,
        payload: &Value,
        files: Vec<(&str, &str, &str, Vec<u8>)>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut form = reqwest::multipart::Form::new().text("payload", payload.to_string());
        for (field, name, mime, bytes) in files {
            let part = reqwest::multipart::Part::bytes(bytes)
                .file_name(name.to_string())
                .mime_str(mime)
                .expect("Failed to set MIME type");
            form = form.part(field.to_string(), part);
        }

        let mut req = self.client.request(method, self.url(path)).multipart(form);
        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        let res = req.send().await.expect("Failed to send multipart request");
        TestResponse::from_response(res).await
    }

    /// Number of files currently stored under an upload category directory.
    pub fn stored_uploads(&self, category: &str) -> usize {
        std::fs::read_dir(self.uploads.path().join(category))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    /// Fetches a raw path such as a stored upload.
    pub async fn get_raw(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request")
    }

    pub async fn signup(&self, name: &str, email: &str, role: &str) -> TestUser {
        let res = self
            .post_anonymous(
                routes::SIGNUP,
                &json!({"name": name, "email": email, "password": PASSWORD, "role": role}),
            )
            .await;
        assert_eq!(res.status, 201, "Signup failed: {}", res.text);
        TestUser {
            id: res.body["user"]["id"].as_i64().expect("user id") as i32,
            token: res.body["token"].as_str().expect("token").to_string(),
        }
    }

    pub async fn organizer(&self, name: &str) -> TestUser {
        self.signup(name, &format!("{}@example.com", name.to_lowercase()), "organizer")
            .await
    }

    pub async fn attendee(&self, name: &str) -> TestUser {
        self.signup(name, &format!("{}@example.com", name.to_lowercase()), "attendee")
            .await
    }

    /// Admins cannot sign up; promote a fresh user directly in the database.
    pub async fn admin(&self) -> TestUser {
        let admin = self.attendee("Admin").await;
        let row = user::Entity::find_by_id(admin.id)
            .one(&self.db)
            .await
            .expect("DB query failed")
            .expect("User not found after signup");
        let mut active: user::ActiveModel = row.into();
        active.role = Set(Role::Admin);
        active.update(&self.db).await.expect("Failed to promote user");
        admin
    }

    pub async fn create_event(&self, token: &str, overrides: Value) -> i32 {
        let mut body = json!({
            "title": "Community Meetup",
            "description": "Monthly meetup",
            "startDateTime": "2099-05-01T18:00:00Z",
            "endDateTime": "2099-05-01T21:00:00Z",
            "location": {"city": "Addis Ababa", "place": "Hub", "lat": 9.03, "lng": 38.74},
            "capacity": 50,
            "category": "tech",
        });
        merge(&mut body, overrides);
        let res = self.post(routes::EVENTS, &body, token).await;
        assert_eq!(res.status, 201, "create_event failed: {}", res.text);
        res.id()
    }

    pub async fn create_guest(&self, event_id: i32, token: &str, name: &str) -> i32 {
        let res = self
            .post(
                &routes::event_guests(event_id),
                &json!({"name": name, "profession": "Speaker"}),
                token,
            )
            .await;
        assert_eq!(res.status, 201, "create_guest failed: {}", res.text);
        res.id()
    }

    pub async fn create_opportunity_category(&self, admin_token: &str, name: &str) -> i32 {
        let res = self
            .post(routes::OPPORTUNITY_CATEGORIES, &json!({"name": name}), admin_token)
            .await;
        assert_eq!(res.status, 201, "create category failed: {}", res.text);
        res.id()
    }

    pub async fn create_opportunity(&self, token: &str, category_id: i32, overrides: Value) -> i32 {
        let mut body = json!({
            "title": "Backend Intern",
            "description": "Build APIs",
            "deadline": "2099-01-01T00:00:00Z",
            "categoryId": category_id,
        });
        merge(&mut body, overrides);
        let res = self.post(routes::OPPORTUNITIES, &body, token).await;
        assert_eq!(res.status, 201, "create_opportunity failed: {}", res.text);
        res.id()
    }
}

/// Shallow-merges the keys of `overrides` into `base`.
pub fn merge(base: &mut Value, overrides: Value) {
    if let (Some(base), Value::Object(overrides)) = (base.as_object_mut(), overrides) {
        base.extend(overrides);
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    pub fn id(&self) -> i32 {
        self.body["id"]
            .as_i64()
            .expect("response body should contain 'id'") as i32
    }
}
