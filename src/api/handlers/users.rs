use crate::api::error::AppError;
use crate::api::middleware::auth::CurrentUser;
use crate::entities::users::Role;
use axum::{Extension, Json, extract::State};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Deserialize, ToSchema, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 255))]
    pub username: String,
    #[validate(length(min = 1, max = 255))]
    pub password: String,
    #[validate(email(message = "Invalid email format"), length(max = 50))]
    pub email: String,
    /// Optional role name; defaults to `ROLE_USER`.
    pub role: Option<String>,
}

#[derive(Deserialize, ToSchema, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 255))]
    pub username: String,
    #[validate(length(min = 1, max = 255))]
    pub password: String,
    #[validate(email(message = "Invalid email format"), length(max = 50))]
    pub email: String,
}

#[derive(Serialize, ToSchema)]
pub struct UserProfileResponse {
    pub username: String,
    pub email: String,
    pub role: String,
}

#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "User created"),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Username or email already taken")
    )
)]
pub async fn register(
    State(state): State<crate::AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<String, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    let role = match payload.role.as_deref() {
        Some("ROLE_ADMIN") => Role::Admin,
        _ => Role::User,
    };

    let user = state
        .user_service
        .create_user(&payload.username, &payload.password, &payload.email, role)
        .await?;

    Ok(format!("New user {} created", user.username))
}

#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "Current user profile", body = UserProfileResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("jwt" = [])
    )
)]
pub async fn get_profile(
    Extension(current): Extension<CurrentUser>,
) -> Json<UserProfileResponse> {
    let user = current.0;
    Json(UserProfileResponse {
        username: user.username,
        email: user.email,
        role: user.role.as_str().to_string(),
    })
}

#[utoipa::path(
    patch,
    path = "/users/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Username or email already taken")
    ),
    security(
        ("jwt" = [])
    )
)]
pub async fn update_profile(
    State(state): State<crate::AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<String, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    state
        .user_service
        .update_profile(current.0, &payload.username, &payload.password, &payload.email)
        .await?;

    Ok("Profile updated successfully".to_string())
}

#[utoipa::path(
    delete,
    path = "/users/me",
    responses(
        (status = 200, description = "Account deleted"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("jwt" = [])
    )
)]
pub async fn delete_account(
    State(state): State<crate::AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<String, AppError> {
    let user = current.0;

    // Account deletion cascades to the user's files: objects are removed
    // best-effort, rows always.
    let purged = state.file_service.purge_user_files(&user).await?;
    if purged > 0 {
        tracing::info!("Purged {} file(s) for user {}", purged, user.username);
    }

    state.user_service.delete_user(user.id).await?;

    Ok("User deleted successfully".to_string())
}
