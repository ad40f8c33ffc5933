pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::services::file_service::FileService;
use crate::services::storage::ObjectStorage;
use crate::services::user_service::UserService;
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::auth::login,
        api::handlers::auth::logout,
        api::handlers::users::register,
        api::handlers::users::get_profile,
        api::handlers::users::update_profile,
        api::handlers::users::delete_account,
        api::handlers::files::upload_file,
        api::handlers::files::list_files,
        api::handlers::files::rename_file,
        api::handlers::files::delete_file,
        api::handlers::files::download_file,
    ),
    components(
        schemas(
            api::handlers::auth::LoginRequest,
            api::handlers::auth::LoginResponse,
            api::handlers::users::CreateUserRequest,
            api::handlers::users::UpdateProfileRequest,
            api::handlers::users::UserProfileResponse,
            api::handlers::files::FileDto,
            api::handlers::files::RenameRequest,
        )
    ),
    tags(
        (name = "auth", description = "Authentication endpoints"),
        (name = "users", description = "Account management endpoints"),
        (name = "files", description = "File management endpoints")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub storage: Arc<dyn ObjectStorage>,
    pub file_service: Arc<FileService>,
    pub user_service: Arc<UserService>,
    pub config: AppConfig,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/login", post(api::handlers::auth::login))
        .route("/users", post(api::handlers::users::register))
        .route(
            "/logout",
            post(api::handlers::auth::logout).layer(from_fn_with_state(
                state.clone(),
                api::middleware::auth::auth_middleware,
            )),
        )
        .route(
            "/users/me",
            get(api::handlers::users::get_profile)
                .patch(api::handlers::users::update_profile)
                .delete(api::handlers::users::delete_account)
                .layer(from_fn_with_state(
                    state.clone(),
                    api::middleware::auth::auth_middleware,
                )),
        )
        .route(
            "/file",
            post(api::handlers::files::upload_file)
                .get(api::handlers::files::download_file)
                .put(api::handlers::files::rename_file)
                .delete(api::handlers::files::delete_file)
                .layer(axum::extract::DefaultBodyLimit::max(
                    // multipart overhead on top of the configured cap
                    state.config.max_file_size.saturating_add(10 * 1024 * 1024),
                ))
                .layer(from_fn_with_state(
                    state.clone(),
                    api::middleware::auth::auth_middleware,
                )),
        )
        .route(
            "/list",
            get(api::handlers::files::list_files).layer(from_fn_with_state(
                state.clone(),
                api::middleware::auth::auth_middleware,
            )),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers(Any),
        )
        .with_state(state)
}
