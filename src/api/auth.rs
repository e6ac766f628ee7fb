use axum::{
    Extension, Json,
    extract::{Request, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::services::{Claims, TokenKind, password};

use super::types::{
    AccessTokenDto, LoginRequest, MessageDto, RegisterRequest, TokenPairDto, UserDto,
};
use super::validation::{normalize_email, validate_email, validate_password};
use super::{ApiError, AppState};

// ============================================================================
// Extractor context
// ============================================================================

/// Authenticated user identity, injected into request extensions by
/// `require_auth` and read by handlers through `Extension`.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub id: i32,
}

// ============================================================================
// Middleware
// ============================================================================

/// Authentication middleware for protected routes.
///
/// Validates the bearer token in a fixed order: presence, then signature
/// and expiry, then revocation, then token kind. Each failure keeps its
/// own machine code so a client can tell an expired token from a revoked
/// one.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = authenticate(&state, request.headers(), TokenKind::Access).await?;

    let user_id = claims
        .sub
        .parse::<i32>()
        .map_err(|_| ApiError::InvalidToken)?;

    request.extensions_mut().insert(CurrentUser { id: user_id });
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

/// Shared token validation for the middleware and the refresh endpoint.
async fn authenticate(
    state: &AppState,
    headers: &HeaderMap,
    expected: TokenKind,
) -> Result<Claims, ApiError> {
    let token = extract_bearer_token(headers).ok_or(ApiError::MissingToken)?;

    let claims = state.tokens().decode(&token)?;

    if state.revocation().contains(&claims.jti).await {
        return Err(ApiError::TokenRevoked);
    }

    if claims.kind != expected {
        return Err(ApiError::InvalidToken);
    }

    Ok(claims)
}

/// Extract the token from an `Authorization: Bearer <token>` header.
fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
        && !token.trim().is_empty()
    {
        return Some(token.trim().to_string());
    }

    None
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
/// Create a new account from an email and a policy-conforming password.
pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserDto>), ApiError> {
    let Json(payload) = payload.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

    let email = payload
        .email
        .ok_or_else(|| ApiError::validation("Email is required"))?;
    let password = payload
        .password
        .ok_or_else(|| ApiError::validation("Password is required"))?;

    validate_email(&email)?;
    validate_password(&password)?;

    let email = normalize_email(&email);

    if state.store().get_user_by_email(&email).await?.is_some() {
        return Err(ApiError::EmailExists);
    }

    let password_hash = password::hash_password(&password).await?;

    // Two registrations can race past the existence check; the unique
    // index turns the loser into an EmailExists response.
    let user = state.store().create_user(&email, &password_hash).await?;

    Ok((StatusCode::CREATED, Json(UserDto::from(user))))
}

/// POST /auth/login
/// Exchange valid credentials for an access + refresh token pair.
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenPairDto>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

    let email = payload
        .email
        .ok_or_else(|| ApiError::validation("Email is required"))?;
    let password = payload
        .password
        .ok_or_else(|| ApiError::validation("Password is required"))?;

    validate_email(&email)?;

    let email = normalize_email(&email);

    let Some((user, password_hash)) = state.store().get_user_by_email_with_password(&email).await?
    else {
        return Err(ApiError::InvalidCredentials);
    };

    // A stored hash that cannot be parsed is logged but answered exactly
    // like a wrong password.
    let verified = match password::verify_password(&password, &password_hash).await {
        Ok(valid) => valid,
        Err(e) => {
            tracing::error!("Password verification failed for user {}: {e:#}", user.id);
            false
        }
    };

    if !verified {
        return Err(ApiError::InvalidCredentials);
    }

    let (access_token, refresh_token) = state.tokens().issue_pair(user.id)?;

    tracing::info!("User {} logged in", user.id);

    Ok(Json(TokenPairDto::bearer(access_token, refresh_token)))
}

/// POST /auth/refresh
/// Mint a new access token from a refresh token. Access tokens presented
/// here are rejected as invalid.
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<AccessTokenDto>, ApiError> {
    let claims = authenticate(&state, &headers, TokenKind::Refresh).await?;

    let user_id = claims
        .sub
        .parse::<i32>()
        .map_err(|_| ApiError::InvalidToken)?;

    let access_token = state.tokens().issue(user_id, TokenKind::Access)?;

    Ok(Json(AccessTokenDto::bearer(access_token)))
}

/// POST /auth/logout
/// Revoke the presented access token for the rest of its lifetime.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Json<MessageDto> {
    state
        .revocation()
        .add(&claims.jti, claims.remaining_ttl())
        .await;

    tracing::info!("User {} logged out", claims.sub);

    Json(MessageDto {
        message: "Successfully logged out",
    })
}

/// GET /auth/me
/// Profile of the authenticated user.
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<UserDto>, ApiError> {
    let user = state
        .store()
        .get_user_by_id(current.id)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    Ok(Json(UserDto::from(user)))
}
