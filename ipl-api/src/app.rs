/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use ipl_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = ipl_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::auth::decode_bearer, routes};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, post},
    Router,
};
use ipl_shared::billing::{BillingService, BillingStore, PgBillingStore};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Billing generation and reporting
    pub billing: BillingService,
}

impl AppState {
    /// Creates application state with billing backed by PostgreSQL
    pub fn new(db: PgPool, config: Config) -> Self {
        let store = Arc::new(PgBillingStore::new(db.clone()));
        Self::with_billing_store(db, config, store)
    }

    /// Creates application state with a custom billing store
    pub fn with_billing_store(db: PgPool, config: Config, store: Arc<dyn BillingStore>) -> Self {
        let billing = BillingService::new(store, config.billing.clone());

        Self {
            db,
            config: Arc::new(config),
            billing,
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /api/v1
/// ├── GET /health
/// ├── /billings
/// │   ├── POST /bulk-monthly
/// │   ├── GET  /penghuni
/// │   └── GET  /:id
/// ├── /users
/// │   └── GET /profile/:id
/// ├── /menus
/// │   └── GET /user/:id
/// ├── /master-menus
/// │   ├── POST   /
/// │   ├── GET    /
/// │   ├── GET    /:id
/// │   ├── PUT    /:id
/// │   └── DELETE /:id
/// ├── /role-menus
/// │   ├── POST   /
/// │   ├── GET    /
/// │   ├── GET    /:id
/// │   ├── PUT    /:id
/// │   ├── DELETE /:id
/// │   ├── POST   /:id/master-menus
/// │   ├── DELETE /:id/master-menus/:master_menu_id
/// │   ├── POST   /:id/roles
/// │   └── DELETE /:id/roles/:role_id
/// └── /roles
///     └── GET /:role_id/role-menus
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Bearer token decoding (never rejects)
/// 2. Logging (tower-http TraceLayer)
/// 3. CORS (tower-http CorsLayer)
pub fn build_router(state: AppState) -> Router {
    let billing_routes = Router::new()
        .route("/bulk-monthly", post(routes::billings::create_bulk_monthly))
        .route("/penghuni", get(routes::billings::billing_penghuni))
        .route("/:id", get(routes::billings::get_billing));

    let user_routes = Router::new().route("/profile/:id", get(routes::users::get_user_profile));

    let menu_routes = Router::new().route("/user/:id", get(routes::menus::get_menus_by_user));

    let master_menu_routes = Router::new()
        .route(
            "/",
            post(routes::master_menus::create_master_menu).get(routes::master_menus::list_master_menus),
        )
        .route(
            "/:id",
            get(routes::master_menus::get_master_menu)
                .put(routes::master_menus::update_master_menu)
                .delete(routes::master_menus::delete_master_menu),
        );

    let role_menu_routes = Router::new()
        .route(
            "/",
            post(routes::role_menus::create_role_menu).get(routes::role_menus::list_role_menus),
        )
        .route(
            "/:id",
            get(routes::role_menus::get_role_menu)
                .put(routes::role_menus::update_role_menu)
                .delete(routes::role_menus::delete_role_menu),
        )
        .route(
            "/:id/master-menus",
            post(routes::role_menus::attach_master_menu),
        )
        .route(
            "/:id/master-menus/:master_menu_id",
            delete(routes::role_menus::detach_master_menu),
        )
        .route("/:id/roles", post(routes::role_menus::attach_role))
        .route("/:id/roles/:role_id", delete(routes::role_menus::detach_role));

    let role_routes = Router::new().route(
        "/:role_id/role-menus",
        get(routes::role_menus::get_role_menus_by_role),
    );

    let v1_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/billings", billing_routes)
        .nest("/users", user_routes)
        .nest("/menus", menu_routes)
        .nest("/master-menus", master_menu_routes)
        .nest("/role-menus", role_menu_routes)
        .nest("/roles", role_routes);

    Router::new()
        .nest("/api/v1", v1_routes)
        .fallback(route_not_found)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            decode_bearer,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_is_permissive() {
        // Development mode: permissive CORS
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
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
}

async fn route_not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}
