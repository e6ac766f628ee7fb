use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::clients::GithubModelsClient;
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    InMemoryRevocationStore, RevocationStore, SentimentAnnotator, TokenService,
};

pub mod auth;
mod diaries;
mod error;
pub mod rate_limit;
mod system;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

use rate_limit::RateLimiter;

pub struct AppState {
    pub config: Config,
    pub store: Store,
    pub tokens: TokenService,
    pub revocation: Arc<dyn RevocationStore>,
    pub annotator: Arc<dyn SentimentAnnotator>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    #[must_use]
    pub fn revocation(&self) -> &Arc<dyn RevocationStore> {
        &self.revocation
    }

    #[must_use]
    pub fn annotator(&self) -> &Arc<dyn SentimentAnnotator> {
        &self.annotator
    }

    #[must_use]
    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }
}

pub async fn create_app_state(config: Config) -> anyhow::Result<Arc<AppState>> {
    let annotator: Arc<dyn SentimentAnnotator> =
        Arc::new(GithubModelsClient::new(&config.sentiment));
    create_app_state_with_annotator(config, annotator).await
}

/// State constructor that takes the annotator as a parameter so tests can
/// swap the external service for a canned one.
pub async fn create_app_state_with_annotator(
    config: Config,
    annotator: Arc<dyn SentimentAnnotator>,
) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_url,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let tokens = TokenService::new(
        &config.auth.jwt_secret,
        config.auth.access_token_ttl_seconds,
        config.auth.refresh_token_ttl_seconds,
    );

    let revocation: Arc<dyn RevocationStore> = Arc::new(InMemoryRevocationStore::new());

    let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));

    Ok(Arc::new(AppState {
        config,
        store,
        tokens,
        revocation,
        annotator,
        rate_limiter,
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config().server.cors_allowed_origins.clone();

    // Register and login carry their own, stricter limits instead of the
    // general one.
    let register_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit_register,
        ));

    let login_routes = Router::new()
        .route("/auth/login", post(auth::login))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit_login,
        ));

    let general_routes = Router::new()
        .merge(create_protected_router(state.clone()))
        .route("/auth/refresh", post(auth::refresh))
        .route("/health", get(system::health_check))
        .route("/version", get(system::version))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit_general,
        ));

    let api_router = Router::new()
        .merge(register_routes)
        .merge(login_routes)
        .merge(general_routes)
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api/v1", api_router)
        .fallback(not_found)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::get_current_user))
        .route("/diaries", get(diaries::list_diaries))
        .route("/diaries", post(diaries::create_diary))
        .route("/diaries/stats", get(diaries::get_diary_stats))
        .route("/diaries/{id}", get(diaries::get_diary))
        .route("/diaries/{id}", put(diaries::update_diary))
        .route("/diaries/{id}", delete(diaries::delete_diary))
        .route_layer(middleware::from_fn_with_state(state, auth::require_auth))
}

/// Uniform envelope for routes that do not exist.
async fn not_found() -> ApiError {
    ApiError::NotFound("Resource not found".to_string())
}
