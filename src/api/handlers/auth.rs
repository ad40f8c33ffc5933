use crate::api::error::AppError;
use crate::api::middleware::auth::CurrentUser;
use crate::utils::auth::create_jwt;
use crate::utils::password::verify_password;
use axum::{Extension, Json, extract::State, response::AppendHeaders};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Account email.
    pub login: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    #[serde(rename = "auth-token")]
    pub auth_token: String,
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful, token in body and `auth-token` header", body = LoginResponse),
        (status = 400, description = "Invalid login or password")
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<(AppendHeaders<[(&'static str, String); 1]>, Json<LoginResponse>), AppError> {
    // The same generic error regardless of which check failed, so the
    // response does not reveal whether the account exists.
    let user = state
        .user_service
        .find_by_email(&payload.login)
        .await
        .map_err(|_| AppError::InvalidCredentials)?;

    if !verify_password(&payload.password, &user.password_hash) {
        return Err(AppError::InvalidCredentials);
    }

    let token = create_jwt(
        &user.email,
        user.role.as_str(),
        state.config.token_ttl_secs,
        &state.config.jwt_secret,
    )
    .map_err(AppError::Anyhow)?;

    tracing::info!("User {} logged in", user.username);

    Ok((
        AppendHeaders([("auth-token", token.clone())]),
        Json(LoginResponse { auth_token: token }),
    ))
}

#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 200, description = "Logout acknowledged"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("jwt" = [])
    )
)]
pub async fn logout(Extension(current): Extension<CurrentUser>) -> &'static str {
    // Tokens are stateless; there is no server-side revocation list. The
    // client is expected to discard the token.
    tracing::info!("User {} logged out", current.0.username);
    "Success logout"
}
