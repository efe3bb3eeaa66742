//! Email verification handlers: request an OTP, then prove it to attach the
//! email to the authenticated account.

use super::{
    storage::{self, EmailUpdateOutcome},
    types::{OtpRequest, OtpVerifyRequest, UserResponse},
    valid_email,
};
use crate::{
    api::{email::send_otp_email, AppState},
    auth,
    otp::{OTP_MAX, OTP_MIN},
};
use axum::{
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

// axum handler for requesting an email OTP
#[utoipa::path(
    post,
    path = "/users/email/otp",
    request_body = OtpRequest,
    responses(
        (status = 200, description = "OTP sent"),
        (status = 400, description = "Invalid email"),
        (status = 409, description = "Email already exists, or an OTP is already pending"),
    ),
    tag = "email"
)]
pub async fn send_otp(
    Extension(pool): Extension<PgPool>,
    Extension(state): Extension<Arc<AppState>>,
    payload: Option<Json<OtpRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing or invalid payload").into_response();
    };

    if !valid_email(&request.email) {
        return (StatusCode::BAD_REQUEST, "Invalid email").into_response();
    }

    match storage::email_taken(&pool, &request.email).await {
        Ok(false) => (),
        Ok(true) => {
            return (StatusCode::CONFLICT, "Email already exists").into_response();
        }
        Err(error) => {
            error!("Failed to check email: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    // One live code per address; a pending code must expire before a new one
    // can be requested.
    match state.otp.exists(&request.email).await {
        Ok(false) => (),
        Ok(true) => {
            return (StatusCode::CONFLICT, "OTP already exists").into_response();
        }
        Err(error) => {
            error!("Failed to check OTP cache: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    match state.otp.issue(&request.email).await {
        Ok(code) => {
            send_otp_email(state.email.clone(), request.email, code);
            StatusCode::OK.into_response()
        }
        Err(error) => {
            error!("Failed to issue OTP: {error}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// axum handler for verifying an email OTP
#[utoipa::path(
    post,
    path = "/users/email/verify",
    request_body = OtpVerifyRequest,
    responses(
        (status = 200, description = "Email attached", body = UserResponse),
        (status = 400, description = "Invalid email or OTP"),
        (status = 401, description = "Invalid or missing token"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email already exists"),
    ),
    tag = "email"
)]
pub async fn verify_otp(
    Extension(pool): Extension<PgPool>,
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    payload: Option<Json<OtpVerifyRequest>>,
) -> impl IntoResponse {
    let username = match auth::authenticate(&headers, &state.tokens) {
        Ok(username) => username,
        Err(rejection) => return rejection.into_response(),
    };

    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing or invalid payload").into_response();
    };

    if !valid_email(&request.email) {
        return (StatusCode::BAD_REQUEST, "Invalid email").into_response();
    }

    if !(OTP_MIN..=OTP_MAX).contains(&request.otp) {
        return (StatusCode::BAD_REQUEST, "Invalid OTP").into_response();
    }

    match state.otp.validate(&request.email, request.otp).await {
        Ok(true) => (),
        Ok(false) => {
            return (StatusCode::BAD_REQUEST, "Invalid OTP").into_response();
        }
        Err(error) => {
            error!("Failed to validate OTP: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    let user = match storage::find_by_username(&pool, &username).await {
        Ok(Some(user)) => user,
        Ok(None) => return (StatusCode::NOT_FOUND, "User not found").into_response(),
        Err(error) => {
            error!("Failed to load user: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match storage::email_taken(&pool, &request.email).await {
        Ok(false) => (),
        Ok(true) => {
            return (StatusCode::CONFLICT, "Email already exists").into_response();
        }
        Err(error) => {
            error!("Failed to check email: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    match storage::update_email(&pool, user.id, &request.email).await {
        Ok(EmailUpdateOutcome::Updated(user)) => Json(UserResponse::from(user)).into_response(),
        // Lost the race against a concurrent claim of the same address.
        Ok(EmailUpdateOutcome::EmailTaken) => {
            (StatusCode::CONFLICT, "Email already exists").into_response()
        }
        Ok(EmailUpdateOutcome::NotFound) => {
            (StatusCode::NOT_FOUND, "User not found").into_response()
        }
        Err(error) => {
            error!("Failed to update email: {error}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
