//! # rolodex_api
//!
//! HTTP API library for Rolodex.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use rolodex_core::auth::cache::{CacheStore, UserCache};
use rolodex_core::auth::jwt::TokenService;
use rolodex_core::auth::repository::UserRepository;
use rolodex_core::auth::resolver::AuthResolver;
use rolodex_core::auth::service::AuthService;
use rolodex_core::email::EmailSender;
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{auth, contacts, health, users};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool.
    pub pool: PgPool,
    /// API configuration.
    pub config: ApiConfig,
    /// Account flows.
    pub auth: AuthService,
    /// Bearer token resolution for protected routes.
    pub resolver: AuthResolver,
}

impl AppState {
    /// Wire the auth components over the given user store, cache backend
    /// and mail sender.
    pub fn new(
        pool: PgPool,
        config: ApiConfig,
        users: Arc<dyn UserRepository>,
        cache_store: Arc<dyn CacheStore>,
        email: Arc<dyn EmailSender>,
    ) -> Self {
        let tokens = Arc::new(TokenService::new(config.token.clone()));
        let cache = UserCache::new(cache_store, config.user_cache_ttl);
        let auth = AuthService::new(users, tokens, cache, email, config.public_base_url.clone());
        let resolver = auth.resolver();
        Self {
            pool,
            config,
            auth,
            resolver,
        }
    }
}

/// Run embedded database migrations.
///
/// Delegates to `rolodex_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    rolodex_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route(routes::GET_API_HEALTHCHECKER, get(health::healthchecker))
        .route(routes::POST_AUTH_REGISTER, post(auth::register_handler))
        .route(routes::POST_AUTH_LOGIN, post(auth::login_handler))
        .route(
            routes::GET_AUTH_CONFIRMED_EMAIL,
            get(auth::confirm_email_handler),
        )
        .route(
            routes::POST_AUTH_REQUEST_EMAIL,
            post(auth::request_email_handler),
        )
        .route(
            routes::POST_AUTH_RESET_PASSWORD_REQUEST,
            post(auth::reset_password_request_handler),
        )
        .route(
            routes::AUTH_RESET_PASSWORD,
            get(auth::check_reset_token_handler).post(auth::reset_password_handler),
        );

    // Protected routes (require auth)
    let protected = Router::new()
        .route(routes::GET_USERS_ME, get(users::me_handler))
        .route(routes::PATCH_USERS_AVATAR, patch(users::update_avatar_handler))
        .route(
            routes::CONTACTS,
            get(contacts::list_handler).post(contacts::create_handler),
        )
        .route(routes::GET_CONTACTS_SEARCH, get(contacts::search_handler))
        .route(
            routes::GET_CONTACTS_BIRTHDAYS,
            get(contacts::birthdays_handler),
        )
        .route(
            routes::CONTACTS_ID,
            get(contacts::get_handler)
                .put(contacts::update_handler)
                .delete(contacts::delete_handler),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
