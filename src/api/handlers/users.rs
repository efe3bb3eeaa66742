//! Account handlers: sign-up, login and profile operations.

use super::{
    storage::{self, SignupOutcome},
    types::{AuthRequest, TokenResponse, UpdatePasswordRequest, UserResponse},
};
use crate::{
    api::AppState,
    auth::{self, password},
};
use axum::{
    extract::Path,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

// axum handler for user sign-up
#[utoipa::path(
    post,
    path = "/users/sign-up",
    request_body = AuthRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Missing or invalid payload"),
        (status = 409, description = "Username already exists"),
    ),
    tag = "users"
)]
pub async fn sign_up(
    Extension(pool): Extension<PgPool>,
    payload: Option<Json<AuthRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing or invalid payload").into_response();
    };

    match storage::username_taken(&pool, &request.username).await {
        Ok(false) => (),
        Ok(true) => {
            return (StatusCode::CONFLICT, "Username already exists").into_response();
        }
        Err(error) => {
            error!("Failed to check username: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    let password_hash = match password::hash_password(&request.password).await {
        Ok(hash) => hash,
        Err(error) => {
            error!("Failed to hash password: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match storage::insert_user(&pool, &request.username, &password_hash).await {
        Ok(SignupOutcome::Created(user)) => {
            (StatusCode::CREATED, Json(UserResponse::from(user))).into_response()
        }
        // Lost the race against a concurrent sign-up with the same name.
        Ok(SignupOutcome::UsernameTaken) => {
            (StatusCode::CONFLICT, "Username already exists").into_response()
        }
        Err(error) => {
            error!("Failed to insert user: {error}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// axum handler for user login
#[utoipa::path(
    post,
    path = "/users/login",
    request_body = AuthRequest,
    responses(
        (status = 200, description = "Session token", body = TokenResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found"),
    ),
    tag = "users"
)]
pub async fn login(
    Extension(pool): Extension<PgPool>,
    Extension(state): Extension<Arc<AppState>>,
    payload: Option<Json<AuthRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing or invalid payload").into_response();
    };

    let user = match storage::find_by_username(&pool, &request.username).await {
        Ok(Some(user)) => user,
        Ok(None) => return (StatusCode::NOT_FOUND, "User not found").into_response(),
        Err(error) => {
            error!("Failed to load user: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    if !password::verify_password(&request.password, &user.password_hash).await {
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    }

    match state.tokens.issue(&user.username) {
        Ok(access_token) => Json(TokenResponse { access_token }).into_response(),
        Err(error) => {
            error!("Failed to issue token: {error}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// axum handler for the authenticated user's profile
#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Invalid or missing token"),
        (status = 404, description = "User not found"),
    ),
    tag = "users"
)]
pub async fn get_me(
    Extension(pool): Extension<PgPool>,
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let username = match auth::authenticate(&headers, &state.tokens) {
        Ok(username) => username,
        Err(rejection) => return rejection.into_response(),
    };

    match storage::find_by_username(&pool, &username).await {
        Ok(Some(user)) => Json(UserResponse::from(user)).into_response(),
        // The account was deleted after the token was issued.
        Ok(None) => (StatusCode::NOT_FOUND, "User not found").into_response(),
        Err(error) => {
            error!("Failed to load user: {error}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// axum handler for password change
#[utoipa::path(
    patch,
    path = "/users/me",
    request_body = UpdatePasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = UserResponse),
        (status = 401, description = "Invalid or missing token"),
        (status = 404, description = "User not found"),
    ),
    tag = "users"
)]
pub async fn patch_me(
    Extension(pool): Extension<PgPool>,
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    payload: Option<Json<UpdatePasswordRequest>>,
) -> impl IntoResponse {
    let username = match auth::authenticate(&headers, &state.tokens) {
        Ok(username) => username,
        Err(rejection) => return rejection.into_response(),
    };

    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing or invalid payload").into_response();
    };

    let user = match storage::find_by_username(&pool, &username).await {
        Ok(Some(user)) => user,
        Ok(None) => return (StatusCode::NOT_FOUND, "User not found").into_response(),
        Err(error) => {
            error!("Failed to load user: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let password_hash = match password::hash_password(&request.new_password).await {
        Ok(hash) => hash,
        Err(error) => {
            error!("Failed to hash password: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match storage::update_password(&pool, user.id, &password_hash).await {
        Ok(Some(user)) => Json(UserResponse::from(user)).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "User not found").into_response(),
        Err(error) => {
            error!("Failed to update password: {error}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// axum handler for account deletion
#[utoipa::path(
    delete,
    path = "/users/me",
    responses(
        (status = 204, description = "Account deleted"),
        (status = 401, description = "Invalid or missing token"),
        (status = 404, description = "User not found"),
    ),
    tag = "users"
)]
pub async fn delete_me(
    Extension(pool): Extension<PgPool>,
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let username = match auth::authenticate(&headers, &state.tokens) {
        Ok(username) => username,
        Err(rejection) => return rejection.into_response(),
    };

    let user = match storage::find_by_username(&pool, &username).await {
        Ok(Some(user)) => user,
        Ok(None) => return (StatusCode::NOT_FOUND, "User not found").into_response(),
        Err(error) => {
            error!("Failed to load user: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match storage::delete_user(&pool, user.id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => (StatusCode::NOT_FOUND, "User not found").into_response(),
        Err(error) => {
            error!("Failed to delete user: {error}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// axum handler for fetching a user by id
#[utoipa::path(
    get,
    path = "/users/{user_id}",
    params(
        ("user_id" = i64, Path, description = "User id, starting at 1")
    ),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 400, description = "Invalid user id"),
        (status = 401, description = "Invalid or missing token"),
        (status = 404, description = "User not found"),
    ),
    tag = "users"
)]
pub async fn get_user(
    Extension(pool): Extension<PgPool>,
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    Path(user_id): Path<i64>,
) -> impl IntoResponse {
    if let Err(rejection) = auth::authenticate(&headers, &state.tokens) {
        return rejection.into_response();
    }

    if user_id < 1 {
        return (StatusCode::BAD_REQUEST, "Invalid user id").into_response();
    }

    match storage::find_by_id(&pool, user_id).await {
        Ok(Some(user)) => Json(UserResponse::from(user)).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "User not found").into_response(),
        Err(error) => {
            error!("Failed to load user: {error}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
