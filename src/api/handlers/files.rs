use crate::api::error::AppError;
use crate::api::middleware::auth::CurrentUser;
use crate::entities::files;
use axum::{
    Extension, Json,
    body::Body,
    extract::{Multipart, Query, State},
    http::{StatusCode, header},
    response::Response,
};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct FileDto {
    pub filename: String,
    pub size: i64,
    #[serde(rename = "editedAt")]
    pub edited_at: String,
}

impl From<files::Model> for FileDto {
    fn from(record: files::Model) -> Self {
        Self {
            filename: record.filename,
            size: record.size,
            edited_at: record.uploaded_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct FilenameQuery {
    pub filename: String,
}

#[derive(Deserialize, ToSchema)]
pub struct RenameRequest {
    pub filename: Option<String>,
}

#[utoipa::path(
    post,
    path = "/file",
    request_body(content = Object, description = "Multipart form with a `file` field", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File stored"),
        (status = 400, description = "Missing or empty file"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("jwt" = [])
    )
)]
pub async fn upload_file(
    State(state): State<crate::AppState>,
    Extension(current): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<StatusCode, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .ok_or_else(|| AppError::InvalidInput("Uploaded file has no filename".to_string()))?;
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Failed to read uploaded file: {}", e)))?
            .to_vec();

        tracing::info!(
            "Uploading file '{}' ({} bytes) for user {}",
            filename,
            data.len(),
            current.0.username
        );

        state
            .file_service
            .upload(&current.0, &filename, data, &content_type)
            .await?;

        return Ok(StatusCode::OK);
    }

    Err(AppError::InvalidInput(
        "Multipart field 'file' is missing".to_string(),
    ))
}

#[utoipa::path(
    get,
    path = "/list",
    params(
        ("limit" = Option<i64>, Query, description = "Maximum number of entries (default 10)")
    ),
    responses(
        (status = 200, description = "Files of the current user, newest first", body = [FileDto]),
        (status = 400, description = "Invalid limit"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("jwt" = [])
    )
)]
pub async fn list_files(
    State(state): State<crate::AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<FileDto>>, AppError> {
    let limit = query.limit.unwrap_or(state.config.default_list_limit);

    let records = state.file_service.list(&current.0, limit).await?;

    Ok(Json(records.into_iter().map(FileDto::from).collect()))
}

#[utoipa::path(
    put,
    path = "/file",
    params(
        ("filename" = String, Query, description = "Current filename")
    ),
    request_body = RenameRequest,
    responses(
        (status = 200, description = "File renamed"),
        (status = 400, description = "Missing/malformed body or blank new name"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "File not found"),
        (status = 409, description = "Target name already exists")
    ),
    security(
        ("jwt" = [])
    )
)]
pub async fn rename_file(
    State(state): State<crate::AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<FilenameQuery>,
    body: Option<Json<RenameRequest>>,
) -> Result<StatusCode, AppError> {
    let new_name = body
        .and_then(|Json(req)| req.filename)
        .ok_or_else(|| AppError::InvalidInput("Malformed rename request".to_string()))?;

    state
        .file_service
        .rename(&current.0, &query.filename, &new_name)
        .await?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    delete,
    path = "/file",
    params(
        ("filename" = String, Query, description = "Filename to delete")
    ),
    responses(
        (status = 200, description = "File deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "File not found")
    ),
    security(
        ("jwt" = [])
    )
)]
pub async fn delete_file(
    State(state): State<crate::AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<FilenameQuery>,
) -> Result<StatusCode, AppError> {
    state.file_service.delete(&current.0, &query.filename).await?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    get,
    path = "/file",
    params(
        ("filename" = String, Query, description = "Filename to download")
    ),
    responses(
        (status = 200, description = "Raw file bytes as attachment"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "File not found")
    ),
    security(
        ("jwt" = [])
    )
)]
pub async fn download_file(
    State(state): State<crate::AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<FilenameQuery>,
) -> Result<Response, AppError> {
    let bytes = state
        .file_service
        .download(&current.0, &query.filename)
        .await?;

    // RFC 5987 filename encoding; the encoded form is pure ASCII.
    let encoded_filename = utf8_percent_encode(&query.filename, NON_ALPHANUMERIC).to_string();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename*=UTF-8''{}", encoded_filename),
        )
        .body(Body::from(bytes))
        .map_err(|e| AppError::Internal(e.to_string()))
}
