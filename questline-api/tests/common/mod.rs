/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - Test database setup via DATABASE_URL
/// - Test user creation with unique emails/usernames
/// - JWT token generation
/// - Request/response helpers

use axum::body::Body;
use axum::http::{Request, StatusCode};
use questline_api::app::{build_router, AppState};
use questline_api::config::Config;
use questline_shared::auth::jwt;
use questline_shared::auth::password::hash_password;
use questline_shared::db::store::Store;
use questline_shared::models::user::{CreateUser, Role, User};
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub config: Config,
    pub user: User,
    pub token: String,
}

impl TestContext {
    /// Creates a new test context with a fresh user
    pub async fn new() -> anyhow::Result<Self> {
        let config = Config::from_env()?;

        let db = PgPool::connect(&config.database.url).await?;

        // Run migrations (path relative to Cargo.toml, not this file)
        sqlx::migrate!("../migrations").run(&db).await?;

        let user = create_test_user(&db).await?;
        let token = access_token_for(&user, &config)?;

        let state = AppState::new(Store::new(db.clone()), config.clone());
        let app = build_router(state);

        Ok(TestContext {
            db,
            app,
            config,
            user,
            token,
        })
    }

    /// Returns authorization header value for the context's user
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Creates an additional user in the same database
    pub async fn create_user(&self) -> anyhow::Result<(User, String)> {
        let user = create_test_user(&self.db).await?;
        let token = access_token_for(&user, &self.config)?;
        Ok((user, token))
    }

    /// Creates an admin user in the same database
    pub async fn create_admin(&self) -> anyhow::Result<(User, String)> {
        let user = create_test_user(&self.db).await?;
        let user = User::set_role(&self.db, user.id, Role::Admin)
            .await?
            .ok_or_else(|| anyhow::anyhow!("admin user vanished"))?;
        let token = access_token_for(&user, &self.config)?;
        Ok((user, token))
    }

    /// Cleans up test data (cascades to habits, tasks, friendships, ...)
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM users WHERE email LIKE 'test-%@example.com'")
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

fn access_token_for(user: &User, config: &Config) -> anyhow::Result<String> {
    let pair = jwt::issue_token_pair(user.id, user.role, &config.jwt.secret)?;
    Ok(pair.access_token)
}

async fn create_test_user(db: &PgPool) -> anyhow::Result<User> {
    let suffix = Uuid::new_v4().simple().to_string();
    let user = User::create(
        db,
        CreateUser {
            email: format!("test-{suffix}@example.com"),
            // Usernames cap at 30 chars; 8 hex chars is unique enough here
            username: format!("tester_{}", &suffix[..8]),
            password_hash: hash_password(TEST_PASSWORD)?,
            first_name: Some("Test".to_string()),
            last_name: None,
        },
    )
    .await?;

    Ok(user)
}

/// Builds a JSON request with optional bearer token and body
pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");

    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }

    let body = match body {
        Some(json) => Body::from(json.to_string()),
        None => Body::empty(),
    };

    builder.body(body).expect("request should build")
}

/// Sends a request through the router and returns status plus parsed body
pub async fn send(
    app: &axum::Router,
    request: Request<Body>,
) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router call is infallible");

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should collect");

    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };

    (status, json)
}
