//! OpenAPI document served through Swagger UI at `/docs`.

use super::handlers::{health, otp, types, users};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        users::sign_up,
        users::login,
        users::get_me,
        users::patch_me,
        users::delete_me,
        users::get_user,
        otp::send_otp,
        otp::verify_otp,
    ),
    components(schemas(
        types::AuthRequest,
        types::TokenResponse,
        types::UserResponse,
        types::UpdatePasswordRequest,
        types::OtpRequest,
        types::OtpVerifyRequest,
    )),
    tags(
        (name = "health", description = "Service health"),
        (name = "users", description = "Registration, login and profile"),
        (name = "email", description = "Email ownership verification via OTP")
    )
)]
struct ApiDoc;

pub fn doc() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
