//! Application state and router builder.
//!
//! [`AppState`] owns the storage handle, the four business components, and
//! the configuration; everything is constructed once in the entry path and
//! cloned per request. [`build_router`] wires the route groups and the
//! middleware stack.
//!
//! # Example
//!
//! ```no_run
//! use questline_api::{app::{build_router, AppState}, config::Config};
//! use questline_shared::db::store::Store;
//! use sqlx::PgPool;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let pool = PgPool::connect(&config.database.url).await?;
//! let state = AppState::new(Store::new(pool), config);
//! let app = build_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post, put},
    Router,
};
use questline_shared::auth::{jwt, middleware::AuthContext};
use questline_shared::db::store::Store;
use questline_shared::exchange::Exchange;
use questline_shared::friends::Friends;
use questline_shared::ledger::Ledger;
use questline_shared::models::user::Role;
use questline_shared::progress::Progress;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::Config;
use crate::error::ApiError;

/// Shared application state.
///
/// Cloned for each request handler via Axum's `State` extractor; the
/// components and the store share the underlying pool, and the config sits
/// behind an `Arc`, so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Storage handle shared by every component
    pub store: Store,

    /// Points/coins awards for habit and task completion
    pub ledger: Ledger,

    /// Reward catalog and redemption
    pub exchange: Exchange,

    /// Friendship lifecycle
    pub friends: Friends,

    /// Progress aggregation
    pub progress: Progress,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates the application state, constructing each component with its
    /// own clone of the storage handle.
    pub fn new(store: Store, config: Config) -> Self {
        Self {
            ledger: Ledger::new(store.clone()),
            exchange: Exchange::new(store.clone()),
            friends: Friends::new(store.clone()),
            progress: Progress::new(store.clone()),
            store,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware.
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                       # Health check (public)
/// └── /v1/
///     ├── /auth/                    # register, login, refresh (public); me (authed)
///     ├── /rewards                  # GET catalog (public)
///     ├── /users/                   # profile get/put, public profiles (authed)
///     ├── /habits/                  # CRUD + complete (authed)
///     ├── /tasks/, /calendar        # CRUD, range view (authed)
///     ├── /rewards/:id/redeem       # redemption (authed)
///     ├── /progress                 # own progress (authed)
///     ├── /friends/                 # requests, responses, listing, compare (authed)
///     └── /admin/                   # users, stats, catalog management (ADMIN)
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Authentication (per-group JWT layer; admin group adds a role gate)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Public routes: no auth
    let public_routes = Router::new()
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/refresh", post(routes::auth::refresh))
        .route("/rewards", get(routes::rewards::list_rewards));

    // Routes for any authenticated user
    let user_routes = Router::new()
        .route("/auth/me", get(routes::auth::me))
        .route(
            "/users/profile",
            get(routes::users::get_profile).put(routes::users::update_profile),
        )
        .route("/users/:user_id", get(routes::users::get_public_profile))
        .route(
            "/habits",
            get(routes::habits::list_habits).post(routes::habits::create_habit),
        )
        .route(
            "/habits/:habit_id",
            get(routes::habits::get_habit)
                .put(routes::habits::update_habit)
                .delete(routes::habits::delete_habit),
        )
        .route(
            "/habits/:habit_id/complete",
            post(routes::habits::complete_habit),
        )
        .route(
            "/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/tasks/:task_id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/calendar", get(routes::calendar::get_calendar))
        .route("/rewards/:reward_id/redeem", post(routes::rewards::redeem))
        .route("/progress", get(routes::rewards::get_progress))
        .route("/friends", get(routes::friends::list_friends))
        .route("/friends/requests", get(routes::friends::list_requests))
        .route("/friends/request", post(routes::friends::send_request))
        .route(
            "/friends/:friendship_id",
            put(routes::friends::respond_to_request).delete(routes::friends::remove_friend),
        )
        .route(
            "/friends/compare/:friend_id",
            get(routes::friends::compare_progress),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Admin routes: authenticated + admin role
    let admin_routes = Router::new()
        .route("/users", get(routes::admin::list_users))
        .route("/users/:user_id", put(routes::admin::set_user_role))
        .route("/stats", get(routes::admin::get_stats))
        .route("/rewards", post(routes::admin::create_reward))
        .route(
            "/rewards/:reward_id",
            put(routes::admin::update_reward).delete(routes::admin::delete_reward),
        )
        .layer(axum::middleware::from_fn(admin_guard))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let v1_routes = Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .nest("/admin", admin_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// JWT authentication middleware layer.
///
/// Validates the bearer access token and injects an [`AuthContext`] into
/// the request extensions for handlers to extract.
async fn jwt_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = questline_shared::auth::middleware::bearer_token(req.headers())?;

    let claims = jwt::validate_access_token(token, state.jwt_secret())?;

    req.extensions_mut()
        .insert(AuthContext::from_claims(&claims));

    Ok(next.run(req).await)
}

/// Admin gate, layered inside the JWT layer.
///
/// The role comes from the validated token; the match is exhaustive so a
/// new role variant can't silently pass.
async fn admin_guard(req: Request, next: Next) -> Result<Response, ApiError> {
    let auth = req
        .extensions()
        .get::<AuthContext>()
        .copied()
        .ok_or_else(|| ApiError::Unauthorized("Missing credentials".to_string()))?;

    match auth.role {
        Role::Admin => Ok(next.run(req).await),
        Role::User => Err(ApiError::Forbidden(
            "Administrator access required".to_string(),
        )),
    }
}
