use crate::api::error::AppError;
use crate::utils::auth::validate_jwt;
use crate::{AppState, entities::users};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

/// Request-scoped authenticated identity, threaded through handlers as an
/// extension instead of ambient global state.
#[derive(Clone)]
pub struct CurrentUser(pub users::Model);

/// Gate for every protected route: verifies the `auth-token` header and
/// resolves the token subject against the users table before any business
/// logic runs.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get("auth-token")
        .and_then(|h| h.to_str().ok())
        // Some clients send "Bearer <token>", others the bare token.
        .map(|h| h.strip_prefix("Bearer ").unwrap_or(h));

    if let Some(token) = token {
        if let Ok(claims) = validate_jwt(token, &state.config.jwt_secret) {
            let user = users::Entity::find()
                .filter(users::Column::Email.eq(&claims.sub))
                .one(&state.db)
                .await?;

            if let Some(user) = user {
                req.extensions_mut().insert(CurrentUser(user));
                return Ok(next.run(req).await);
            }
        }
    }

    // Rejections render through AppError so 401 carries the same
    // structured body as every other error.
    Err(AppError::Unauthorized(
        "Missing or invalid auth token".to_string(),
    ))
}
